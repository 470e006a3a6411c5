//! The operator definition contract.

use std::any::Any;
use std::sync::Arc;

use crate::error::{OpError, OpResult};
use crate::tensor::{LogicalTensorDesc, MemoryDesc, SmallVector};
use crate::typeinfo::TypeInfo;

/// A parameterized instance of one operator kind.
///
/// Behavior is not attached to this trait. It lives in the op-trait table
/// registered for [`OpDef::dyn_typeinfo`], which keeps operator kinds free to
/// be defined in crates that know nothing about each other.
pub trait OpDef: Any + Send + Sync + std::fmt::Debug + 'static {
	/// Identity of the concrete kind.
	fn dyn_typeinfo(&self) -> TypeInfo {
		TypeInfo::of::<Self>()
	}

	/// Name scope this instance was created under, if any.
	fn scope(&self) -> Option<&str> {
		None
	}
}

impl dyn OpDef {
	/// Returns `true` if the concrete kind is `T`.
	pub fn is<T: OpDef>(&self) -> bool {
		(self as &dyn Any).is::<T>()
	}

	pub fn downcast_ref<T: OpDef>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}

	/// Downcasts to `T`, failing with [`OpError::InvalidInput`] on a kind mismatch.
	pub fn cast_final<T: OpDef>(&self) -> OpResult<&T> {
		self.downcast_ref::<T>().ok_or_else(|| {
			OpError::InvalidInput(format!(
				"expected op {}, got {}",
				TypeInfo::of::<T>().short_name(),
				self.dyn_typeinfo().short_name()
			))
		})
	}
}

/// Eager-vs-traced choice for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
	/// Compute on the host through the default CPU path.
	DefaultCpu,
	/// Launch the operator's own kernel.
	#[default]
	Kernel,
}

/// Inspectable operator parameters, in declaration order.
pub type OpProps = Vec<(&'static str, String)>;

/// Inferred output metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputAttrs {
	pub descs: SmallVector<LogicalTensorDesc>,
	/// `false` when shapes depend on values that are not known yet.
	pub validated: bool,
}

/// Output and workspace placement computed ahead of execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPlan {
	pub outputs: SmallVector<MemoryDesc>,
	pub workspace: SmallVector<MemoryDesc>,
}

/// Gradient graph of one operator.
#[derive(Debug, Clone, Default)]
pub struct BackwardGraphResult {
	/// Operator computing input gradients, or `None` when nothing needs a gradient.
	pub backward: Option<Arc<dyn OpDef>>,
	/// Which forward inputs and outputs must be kept alive for the backward pass.
	pub save_for_backward: Vec<bool>,
	pub input_has_grad: Vec<bool>,
}
