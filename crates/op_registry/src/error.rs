use thiserror::Error;

/// Build-phase contract violations.
///
/// These are never recovered: the builder logs them and panics, so a broken
/// registration graph stops the process at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
	/// A slot was set twice on one table.
	#[error("op {op} has duplicate method {method}")]
	DuplicateMethod { op: &'static str, method: &'static str },
	/// `begin` was called again for a name under [`crate::DuplicateNamePolicy::Panic`].
	#[error("op trait {0} registered twice")]
	DuplicateName(&'static str),
	/// One operator kind was associated with two different tables.
	#[error("operator kind {kind} already belongs to op {existing}, cannot associate with op {incoming}")]
	ConflictingAssociation {
		kind: &'static str,
		existing: &'static str,
		incoming: &'static str,
	},
}

/// Errors from configuring the process-wide registry.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid op registry config: {0}")]
	Parse(#[from] toml::de::Error),
	/// The registry was already built or configured.
	#[error("op registry already initialized")]
	AlreadyInitialized,
}

/// Logs a build-phase violation and aborts registration.
#[track_caller]
pub(crate) fn fatal(err: BuildError) -> ! {
	tracing::error!(%err, "op trait registration failed");
	panic!("op registry: {err}");
}
