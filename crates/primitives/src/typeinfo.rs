//! Identity tokens for operator kinds.
//!
//! A [`TypeInfo`] is keyed by [`TypeId`], so two tokens for the same concrete
//! type always compare equal no matter which crate produced them. The type
//! name is carried only for diagnostics and never takes part in comparisons.

use std::any::TypeId;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Process-wide unique identity of one concrete operator kind.
#[derive(Clone, Copy)]
pub struct TypeInfo {
	id: TypeId,
	name: &'static str,
}

impl TypeInfo {
	/// Returns the identity of `T`.
	#[inline]
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	/// Returns the underlying [`TypeId`].
	#[inline]
	pub fn type_id(self) -> TypeId {
		self.id
	}

	/// Returns the fully qualified type name.
	#[inline]
	pub fn name(self) -> &'static str {
		self.name
	}

	/// Returns the type name without its module path.
	pub fn short_name(self) -> &'static str {
		let base = self.name.split('<').next().unwrap_or(self.name);
		match base.rfind("::") {
			Some(pos) => &self.name[pos + 2..],
			None => self.name,
		}
	}
}

impl PartialEq for TypeInfo {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl PartialOrd for TypeInfo {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for TypeInfo {
	fn cmp(&self, other: &Self) -> Ordering {
		self.id.cmp(&other.id)
	}
}

impl std::fmt::Debug for TypeInfo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("TypeInfo").field(&self.name).finish()
	}
}

impl std::fmt::Display for TypeInfo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name)
	}
}
