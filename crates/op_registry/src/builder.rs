//! Build-phase registration.
//!
//! An [`OpTraitDbBuilder`] is mutated through `&mut` only, so the build phase
//! needs no locking. [`OpTraitDbBuilder::build`] freezes it into an
//! [`OpTraitDb`] that is read-only from then on.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::adapter::IntoVarNodeArray;
use crate::catalog::with_op_meths;
use crate::config::{DuplicateNamePolicy, OpRegistryConfig, TraversalOrder};
use crate::db::OpTraitDb;
use crate::error::{BuildError, fatal};
use crate::fallback::{DefaultFallback, FallbackPolicy};
use crate::meth::*;
use crate::op_trait::OpTrait;
use crate::primitives::{OpDef, TypeInfo};

/// Mutable registry state of the build phase.
pub struct OpTraitDbBuilder {
	traits: Vec<OpTrait>,
	by_name: FxHashMap<&'static str, usize>,
	by_type: FxHashMap<TypeInfo, usize>,
	config: OpRegistryConfig,
	fallback: Arc<dyn FallbackPolicy>,
}

impl Default for OpTraitDbBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl OpTraitDbBuilder {
	pub fn new() -> Self {
		Self::with_config(OpRegistryConfig::default())
	}

	pub fn with_config(config: OpRegistryConfig) -> Self {
		Self {
			traits: Vec::new(),
			by_name: FxHashMap::default(),
			by_type: FxHashMap::default(),
			config,
			fallback: Arc::new(DefaultFallback),
		}
	}

	/// Sets the policy used by [`OpTraitRegistry::fallback`].
	pub fn fallback_policy(mut self, policy: Arc<dyn FallbackPolicy>) -> Self {
		self.fallback = policy;
		self
	}

	pub fn config(&self) -> &OpRegistryConfig {
		&self.config
	}

	/// Number of tables created so far, including replaced ones.
	pub fn len(&self) -> usize {
		self.traits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.traits.is_empty()
	}

	/// Looks up a table under construction.
	pub fn get(&self, name: &str) -> Option<&OpTrait> {
		self.by_name.get(name).map(|&idx| &self.traits[idx])
	}

	/// Creates or resolves the table for `name` and returns a builder over it.
	///
	/// A repeated name is handled by [`OpRegistryConfig::duplicate_name`].
	pub fn begin(&mut self, name: &'static str) -> OpTraitRegistry<'_> {
		let index = match self.by_name.get(name).copied() {
			None => self.push_trait(name),
			Some(existing) => match self.config.duplicate_name {
				DuplicateNamePolicy::Merge => {
					tracing::debug!(op = name, "op trait registered again, merging");
					existing
				}
				DuplicateNamePolicy::Replace => {
					tracing::warn!(op = name, "op trait registered again, replacing name binding");
					self.push_trait(name)
				}
				DuplicateNamePolicy::Panic => fatal(BuildError::DuplicateName(name)),
			},
		};
		tracing::trace!(op = name, index, "begin op trait registration");
		OpTraitRegistry { db: self, index }
	}

	fn push_trait(&mut self, name: &'static str) -> usize {
		let index = self.traits.len();
		self.traits.push(OpTrait::new(name));
		self.by_name.insert(name, index);
		index
	}

	fn bind_type(&mut self, kind: TypeInfo, index: usize) {
		match self.by_type.entry(kind) {
			Entry::Vacant(slot) => {
				slot.insert(index);
				tracing::debug!(op = self.traits[index].name(), kind = kind.name(), "operator kind associated");
			}
			Entry::Occupied(slot) if *slot.get() == index => {}
			Entry::Occupied(slot) => fatal(BuildError::ConflictingAssociation {
				kind: kind.name(),
				existing: self.traits[*slot.get()].name(),
				incoming: self.traits[index].name(),
			}),
		}
	}

	/// Freezes the registry.
	pub fn build(self) -> OpTraitDb {
		let mut order: Vec<usize> = self.by_name.values().copied().collect();
		match self.config.traversal {
			TraversalOrder::Registration => order.sort_unstable(),
			TraversalOrder::ByName => order.sort_unstable_by_key(|&idx| self.traits[idx].name()),
		}
		tracing::debug!(
			traits = order.len(),
			kinds = self.by_type.len(),
			"op trait registry built"
		);
		OpTraitDb::new(self.traits, self.by_name, self.by_type, order)
	}
}

/// Fluent builder over one table.
///
/// Every setter panics if its slot is already set, leaving the first
/// implementation in place.
pub struct OpTraitRegistry<'a> {
	db: &'a mut OpTraitDbBuilder,
	index: usize,
}

macro_rules! define_setters {
	(
		$(
			$(#[$doc:meta])*
			{
				field: $field:ident,
				slot: $slot:ident,
				kind: $kind:ident,
				args: ($($arg:ident : $ty:ty),* $(,)?),
				ret: $ret:ty $(,)?
			}
		)*
	) => {
		impl OpTraitRegistry<'_> {
			$(
				op_setter!($kind, $field, $slot, ($($arg: $ty),*), $ret);
			)*
		}
	};
}

macro_rules! op_setter {
	(adapted, $field:ident, $slot:ident, ($($arg:ident : $ty:ty),*), $ret:ty) => {
		#[doc = concat!("Sets `", stringify!($field), "` from any shape accepted by [`IntoVarNodeArray`].")]
		pub fn $field<F, T>(mut self, func: F) -> Self
		where
			F: Fn($($ty),*) -> T + Send + Sync + 'static,
			T: IntoVarNodeArray,
		{
			let op = self.claim($slot::NAME, |op| op.$field.is_set());
			op.$field.set(Arc::new(move |$($arg: $ty),*| func($($arg),*).into_var_node_array()));
			self
		}
	};
	($kind:ident, $field:ident, $slot:ident, ($($arg:ident : $ty:ty),*), $ret:ty) => {
		#[doc = concat!("Sets `", stringify!($field), "`.")]
		pub fn $field<F>(mut self, func: F) -> Self
		where
			F: Fn($($ty),*) -> crate::catalog::meth_ret!($kind, $ret) + Send + Sync + 'static,
		{
			let op = self.claim($slot::NAME, |op| op.$field.is_set());
			op.$field.set(Arc::new(func));
			self
		}
	};
}

with_op_meths!(define_setters);

impl OpTraitRegistry<'_> {
	pub fn name(&self) -> &'static str {
		self.db.traits[self.index].name()
	}

	/// The table as populated so far.
	pub fn op_trait(&self) -> &OpTrait {
		&self.db.traits[self.index]
	}

	/// Checks the once-per-slot rule and hands out the table for assignment.
	fn claim(&mut self, method: &'static str, is_set: impl FnOnce(&OpTrait) -> bool) -> &mut OpTrait {
		let op = &mut self.db.traits[self.index];
		if is_set(op) {
			fatal(BuildError::DuplicateMethod { op: op.name(), method });
		}
		tracing::trace!(op = op.name(), method, "op method set");
		op
	}

	/// Associates operator kinds with this table.
	pub fn associate(self, kinds: impl IntoIterator<Item = TypeInfo>) -> Self {
		for kind in kinds {
			self.db.bind_type(kind, self.index);
		}
		self
	}

	/// Associates the single kind `T` with this table.
	pub fn associate_type<T: OpDef>(self) -> Self {
		self.associate([TypeInfo::of::<T>()])
	}

	/// Fills every slot that is still empty from the builder's fallback policy.
	///
	/// Slots that are already set are never overwritten.
	pub fn fallback(self) -> Self {
		let policy = Arc::clone(&self.db.fallback);
		let op = &mut self.db.traits[self.index];
		let defaults = policy.defaults(op);
		let filled = op.fill_unset_from(&defaults);
		tracing::debug!(op = op.name(), filled, "op trait fallback installed");
		self
	}
}
