//! Op-trait registry.
//!
//! Operator kinds carry no behavior of their own. Each kind is associated with
//! an [`OpTrait`]: a named table of thirteen optional method slots covering
//! eager execution, memory planning, graph construction, shape inference,
//! gradients and identity. Dispatch code resolves the table from an instance's
//! [`TypeInfo`](primitives::TypeInfo) and calls the slot it needs.
//!
//! # Lifecycle
//!
//! - Build: registration units declared with [`op_trait_reg!`] run once,
//!   in a deterministic order, against an [`OpTraitDbBuilder`].
//! - Use: the frozen [`OpTraitDb`] is shared as `&'static` and read without
//!   locks.
//!
//! Setting a slot twice, or binding one kind to two tables, stops the process
//! during the build phase. Calling a slot nobody filled returns
//! [`OpError::NotImplemented`](primitives::OpError::NotImplemented).

mod catalog;

pub mod adapter;
pub mod builder;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod fallback;
mod macros;
pub mod meth;
pub mod op_trait;

pub use adapter::IntoVarNodeArray;
pub use builder::{OpTraitDbBuilder, OpTraitRegistry};
pub use config::{DuplicateNamePolicy, OpRegistryConfig, TraversalOrder};
pub use db::{OpTraitDb, OpTraitReg, configure, get_db, is_initialized, set_fallback_policy};
pub use dispatch::OpDefExt;
pub use error::{BuildError, ConfigError};
pub use fallback::{DefaultFallback, FallbackPolicy};
pub use op_trait::OpTrait;
pub use tensil_primitives as primitives;

#[doc(hidden)]
pub mod __private {
	pub use {inventory, paste};
}
