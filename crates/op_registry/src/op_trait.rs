//! The op-trait table.

use crate::catalog::with_op_meths;
use crate::db::get_db;
use crate::meth::*;
use crate::primitives::TypeInfo;

macro_rules! define_op_trait {
	(
		$(
			$(#[$doc:meta])*
			{
				field: $field:ident,
				slot: $slot:ident,
				kind: $kind:ident,
				args: $args:tt,
				ret: $ret:ty $(,)?
			}
		)*
	) => {
		/// Behavior table of one operator kind, or of a group of kinds sharing
		/// semantics.
		///
		/// Slots are public so dispatch code can invoke them directly once a
		/// table is resolved. Tables owned by an [`crate::OpTraitDb`] are only
		/// reachable through shared references and never change after the
		/// registry is built.
		pub struct OpTrait {
			name: &'static str,
			$(
				$(#[$doc])*
				pub $field: $slot,
			)*
		}

		impl OpTrait {
			/// Slot names in declaration order.
			pub const METHODS: &'static [&'static str] = &[$(stringify!($field)),*];

			/// Creates a table with every slot empty.
			pub fn new(name: &'static str) -> Self {
				Self {
					name,
					$($field: $slot::empty(name),)*
				}
			}

			/// Names of the populated slots, in declaration order.
			pub fn implemented_methods(&self) -> Vec<&'static str> {
				let mut out = Vec::with_capacity(Self::METHODS.len());
				$(
					if self.$field.is_set() {
						out.push($slot::NAME);
					}
				)*
				out
			}

			/// Copies every slot that is empty here but set in `defaults`.
			///
			/// Returns the number of slots filled.
			pub(crate) fn fill_unset_from(&mut self, defaults: &OpTrait) -> usize {
				let mut filled = 0;
				$(
					if !self.$field.is_set() && defaults.$field.is_set() {
						self.$field = defaults.$field.rebind(self.name);
						filled += 1;
					}
				)*
				filled
			}
		}
	};
}

with_op_meths!(define_op_trait);

impl OpTrait {
	#[inline]
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns `true` when every slot is populated.
	pub fn is_complete(&self) -> bool {
		self.implemented_methods().len() == Self::METHODS.len()
	}

	/// Looks up a table of the process-wide registry by display name.
	pub fn find_by_name(name: &str) -> Option<&'static OpTrait> {
		get_db().find_by_name(name)
	}

	/// Looks up a table of the process-wide registry by operator kind.
	pub fn find_by_typeinfo(kind: TypeInfo) -> Option<&'static OpTrait> {
		get_db().find_by_typeinfo(kind)
	}

	/// Visits every table of the process-wide registry once.
	pub fn for_each_trait(visitor: impl FnMut(&'static OpTrait)) {
		get_db().for_each_trait(visitor)
	}
}

impl std::fmt::Debug for OpTrait {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OpTrait")
			.field("name", &self.name)
			.field("implemented", &self.implemented_methods())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::primitives::{DispatchMode, OpDef, OpError};

	#[derive(Debug)]
	struct Dummy;

	impl OpDef for Dummy {}

	#[test]
	fn new_table_has_thirteen_empty_slots() {
		let op = OpTrait::new("Dummy");
		assert_eq!(OpTrait::METHODS.len(), 13);
		assert!(op.implemented_methods().is_empty());
		assert!(!op.is_complete());
		assert_eq!(
			op.make_name.call(&Dummy),
			Err(OpError::NotImplemented {
				op: "Dummy",
				method: "make_name",
			})
		);
	}

	#[test]
	fn empty_slot_call_leaves_others_untouched() {
		let mut op = OpTrait::new("Dummy");
		op.hash = HashFunc::from_fn(|_def: &dyn OpDef| 7).rebind("Dummy");
		assert!(op.props.call(&Dummy).is_err());
		assert_eq!(op.hash.call(&Dummy), Ok(7));
		assert_eq!(op.implemented_methods(), vec!["hash"]);
	}

	#[test]
	fn fill_unset_keeps_existing_slots() {
		let mut op = OpTrait::new("Dummy");
		op.make_name = MakeNameFunc::from_fn(|_def: &dyn OpDef| "mine".to_owned()).rebind("Dummy");

		let mut defaults = OpTrait::new("defaults");
		defaults.make_name = MakeNameFunc::from_fn(|_def: &dyn OpDef| "default".to_owned());
		defaults.decide_dispatch_mode = DecideDispatchMode::from_fn(|_def: &dyn OpDef, _inputs: &[_]| DispatchMode::DefaultCpu);

		assert_eq!(op.fill_unset_from(&defaults), 1);
		assert_eq!(op.make_name.call(&Dummy).unwrap(), "mine");
		assert_eq!(op.decide_dispatch_mode.call(&Dummy, &[]), Ok(DispatchMode::DefaultCpu));
		assert_eq!(op.decide_dispatch_mode.op(), "Dummy");
		assert_eq!(op.implemented_methods(), vec!["decide_dispatch_mode", "make_name"]);
	}
}
