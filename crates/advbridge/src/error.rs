use thiserror::Error;

/// Failure taxonomy for every public bridge call.
///
/// The bridge never suppresses an interpreter-side error and never returns a
/// placeholder buffer on failure; callers always see one of these variants.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Interpreter start, module import, or callable resolution failed.
    /// The host process cannot operate without the bridge; not retried.
    #[error("bridge initialisation failed: {0}")]
    FatalInit(String),

    /// The call is not permitted in the current lifecycle state, e.g.
    /// re-initialising after the environment was finalized.
    #[error("cannot {operation}: bridge environment is {state}")]
    Lifecycle {
        operation: &'static str,
        state: &'static str,
    },

    /// The active deployment profile did not bind this operation.
    #[error("operation `{operation}` is not bound by the active profile")]
    Unbound { operation: &'static str },

    /// Boundary validation rejected an argument before touching the
    /// interpreter.
    #[error("invalid argument for `{operation}`: {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: &'static str,
    },

    /// The bound callable raised inside the interpreter.
    #[error("`{operation}` raised inside the interpreter: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },

    /// The interpreter returned a value of the wrong shape.
    #[error("`{operation}` returned an unconvertible result: {reason}")]
    Conversion {
        operation: &'static str,
        reason: String,
    },

    /// A pop-style operation found nothing queued. Distinct from a
    /// zero-length buffer, which would be ambiguous with a real payload.
    #[error("no batch is queued")]
    EmptyQueue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_operation_name() {
        let err = BridgeError::Call {
            operation: "perturb",
            message: "ValueError: bad shape".into(),
        };
        let text = err.to_string();
        assert!(text.contains("perturb"));
        assert!(text.contains("ValueError"));
    }

    #[test]
    fn empty_queue_is_its_own_condition() {
        assert!(matches!(BridgeError::EmptyQueue, BridgeError::EmptyQueue));
        assert_eq!(BridgeError::EmptyQueue.to_string(), "no batch is queued");
    }
}
