use thiserror::Error;

/// Everything the core scheduling loop can fail with.
///
/// Library code returns this type; the binary edge (`main.rs`) is the only
/// place that wraps it in `anyhow` for display.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("watch stream ended unexpectedly: {0}")]
    WatchStreamFatal(String),

    #[error("cluster operation '{operation}' failed: {message}")]
    TransientClusterError { operation: String, message: String },

    #[error("malformed resource quantity '{0}'")]
    MalformedQuantity(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SchedulerError {
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        SchedulerError::TransientClusterError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether the caller should requeue and retry rather than treat this as fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedulerError::TransientClusterError { .. })
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        let err = SchedulerError::transient("bind", "409 conflict");
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "cluster operation 'bind' failed: 409 conflict"
        );
    }

    #[test]
    fn fatal_errors_are_not_retryable() {
        let err = SchedulerError::WatchStreamFatal("connection reset".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_quantity_message_includes_input() {
        let err = SchedulerError::MalformedQuantity("4Xi".into());
        assert_eq!(err.to_string(), "malformed resource quantity '4Xi'");
    }
}
