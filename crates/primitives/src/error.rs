use thiserror::Error;

/// Result alias used by every operator behavior.
pub type OpResult<T> = Result<T, OpError>;

/// Errors surfaced while invoking operator behaviors.
///
/// None of these abort the process; the calling engine decides whether to
/// fall back to another strategy or propagate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
	/// The slot was never populated for this operator.
	#[error("method {method} is not implemented for op {op}")]
	NotImplemented { op: &'static str, method: &'static str },
	/// The slot is populated but cannot serve this request.
	#[error("op {op} does not support {method}: {reason}")]
	Unsupported {
		op: &'static str,
		method: &'static str,
		reason: String,
	},
	/// The operator kind has no registered trait table.
	#[error("no op trait registered for {0}")]
	Unregistered(&'static str),
	/// Inputs violate the operator's contract.
	#[error("invalid input: {0}")]
	InvalidInput(String),
	/// Output attributes could not be inferred.
	#[error("inference failed: {0}")]
	InferenceFailed(String),
}
