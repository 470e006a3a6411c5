//! Operator-instance helpers routed through the process-wide registry.

use crate::db::get_db;
use crate::op_trait::OpTrait;
use crate::primitives::{OpDef, OpProps, OpResult};

/// Convenience methods on operator instances.
///
/// Each one resolves the table of the instance's kind and calls the matching
/// slot. A kind without a table yields [`crate::primitives::OpError::Unregistered`].
pub trait OpDefExt {
	/// Table registered for the instance's kind.
	fn op_trait(&self) -> OpResult<&'static OpTrait>;

	fn hash_value(&self) -> OpResult<u64>;

	/// Structural equality; instances of different kinds are never equal and
	/// never reach `is_same_st`.
	fn is_same(&self, other: &dyn OpDef) -> OpResult<bool>;

	fn make_name(&self) -> OpResult<String>;

	/// `make_name`, prefixed with the instance's scope as `scope.name`.
	fn display_name(&self) -> OpResult<String>;

	fn props(&self) -> OpResult<OpProps>;

	/// Table name followed by the instance parameters, e.g. `Reduce{axis: 1}`.
	fn describe(&self) -> OpResult<String>;
}

impl OpDefExt for dyn OpDef {
	fn op_trait(&self) -> OpResult<&'static OpTrait> {
		get_db().trait_of(self)
	}

	fn hash_value(&self) -> OpResult<u64> {
		self.op_trait()?.hash.call(self)
	}

	fn is_same(&self, other: &dyn OpDef) -> OpResult<bool> {
		if self.dyn_typeinfo() != other.dyn_typeinfo() {
			return Ok(false);
		}
		self.op_trait()?.is_same_st.call(self, other)
	}

	fn make_name(&self) -> OpResult<String> {
		self.op_trait()?.make_name.call(self)
	}

	fn display_name(&self) -> OpResult<String> {
		let name = self.make_name()?;
		Ok(match self.scope() {
			Some(scope) if !scope.is_empty() => format!("{scope}.{name}"),
			_ => name,
		})
	}

	fn props(&self) -> OpResult<OpProps> {
		self.op_trait()?.props.call(self)
	}

	fn describe(&self) -> OpResult<String> {
		let op = self.op_trait()?;
		let props = op.props.call(self)?;
		let fields: Vec<String> = props.iter().map(|(key, value)| format!("{key}: {value}")).collect();
		Ok(format!("{}{{{}}}", op.name(), fields.join(", ")))
	}
}
