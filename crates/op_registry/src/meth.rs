//! Method slots.
//!
//! A slot holds zero or one implementation of a fixed signature. Calling an
//! empty slot yields [`OpError::NotImplemented`] naming the owning table and
//! the slot; it never no-ops. Implementations are immutable `Arc<dyn Fn>`
//! values, so a populated slot can be called from any number of threads.

use std::sync::Arc;

use crate::catalog::with_op_meths;
use crate::primitives::{OpError, OpResult};

macro_rules! define_meths {
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
		paste::paste! {
			$(
				#[doc = "Implementation signature stored in [`" $slot "`]."]
				pub type [<$slot Fn>] = dyn Fn($($ty),*) -> crate::catalog::meth_ret!($kind, $ret) + Send + Sync;

				$(#[$doc])*
				#[derive(Clone)]
				pub struct $slot {
					op: &'static str,
					func: Option<Arc<[<$slot Fn>]>>,
				}

				impl $slot {
					/// Field name of this slot in [`crate::OpTrait`].
					pub const NAME: &'static str = stringify!($field);

					/// Creates an empty slot owned by `op`.
					pub fn empty(op: &'static str) -> Self {
						Self { op, func: None }
					}

					/// Creates a populated slot that is not yet owned by a table.
					pub fn from_fn<F>(func: F) -> Self
					where
						F: Fn($($ty),*) -> crate::catalog::meth_ret!($kind, $ret) + Send + Sync + 'static,
					{
						Self {
							op: "<detached>",
							func: Some(Arc::new(func)),
						}
					}

					#[inline]
					pub fn is_set(&self) -> bool {
						self.func.is_some()
					}

					/// Name of the table this slot reports in errors.
					#[inline]
					pub fn op(&self) -> &'static str {
						self.op
					}

					/// Invokes the implementation.
					#[inline]
					pub fn call(&self, $($arg: $ty),*) -> OpResult<$ret> {
						match &self.func {
							Some(func) => crate::catalog::meth_call!($kind, func($($arg),*)),
							None => Err(OpError::NotImplemented {
								op: self.op,
								method: Self::NAME,
							}),
						}
					}

					pub(crate) fn set(&mut self, func: Arc<[<$slot Fn>]>) {
						self.func = Some(func);
					}

					/// Shares the implementation under a different owning table.
					pub(crate) fn rebind(&self, op: &'static str) -> Self {
						Self {
							op,
							func: self.func.clone(),
						}
					}
				}

				impl std::fmt::Debug for $slot {
					fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
						let state = if self.is_set() { "set" } else { "empty" };
						write!(f, "{}({}::{})", state, self.op, Self::NAME)
					}
				}
			)*
		}
	};
}

with_op_meths!(define_meths);
