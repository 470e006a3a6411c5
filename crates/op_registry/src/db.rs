//! The frozen registry and the process-wide instance.
//!
//! Registration units are collected with `inventory` from every linked crate
//! and run once, in a deterministic order, behind a [`OnceLock`]. After that
//! barrier the registry is immutable and lookups take no locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use crate::builder::{OpTraitDbBuilder, OpTraitRegistry};
use crate::config::OpRegistryConfig;
use crate::error::ConfigError;
use crate::fallback::FallbackPolicy;
use crate::op_trait::OpTrait;
use crate::primitives::{OpDef, OpError, OpResult, TypeInfo};

/// Read-only mapping from names and operator kinds to their tables.
pub struct OpTraitDb {
	traits: Box<[OpTrait]>,
	by_name: FxHashMap<&'static str, usize>,
	by_type: FxHashMap<TypeInfo, usize>,
	order: Box<[usize]>,
}

impl OpTraitDb {
	pub(crate) fn new(
		traits: Vec<OpTrait>,
		by_name: FxHashMap<&'static str, usize>,
		by_type: FxHashMap<TypeInfo, usize>,
		order: Vec<usize>,
	) -> Self {
		Self {
			traits: traits.into_boxed_slice(),
			by_name,
			by_type,
			order: order.into_boxed_slice(),
		}
	}

	/// Exact-match lookup by display name.
	#[inline]
	pub fn find_by_name(&self, name: &str) -> Option<&OpTrait> {
		self.by_name.get(name).map(|&idx| &self.traits[idx])
	}

	/// Exact-match lookup by operator kind.
	#[inline]
	pub fn find_by_typeinfo(&self, kind: TypeInfo) -> Option<&OpTrait> {
		self.by_type.get(&kind).map(|&idx| &self.traits[idx])
	}

	/// Resolves the table of an operator instance.
	pub fn trait_of(&self, def: &dyn OpDef) -> OpResult<&OpTrait> {
		let kind = def.dyn_typeinfo();
		self.find_by_typeinfo(kind).ok_or(OpError::Unregistered(kind.name()))
	}

	/// Calls `visitor` once per table bound to a name.
	pub fn for_each_trait<'a>(&'a self, mut visitor: impl FnMut(&'a OpTrait)) {
		for op in self.iter() {
			visitor(op);
		}
	}

	/// Tables bound to a name, in traversal order.
	pub fn iter(&self) -> impl Iterator<Item = &OpTrait> + '_ {
		self.order.iter().map(|&idx| &self.traits[idx])
	}

	/// Operator kinds associated with the table currently named `name`,
	/// sorted by type name.
	pub fn types_of(&self, name: &str) -> Vec<TypeInfo> {
		let Some(&idx) = self.by_name.get(name) else {
			return Vec::new();
		};
		let mut kinds: Vec<TypeInfo> = self
			.by_type
			.iter()
			.filter(|&(_, &owner)| owner == idx)
			.map(|(&kind, _)| kind)
			.collect();
		kinds.sort_unstable_by_key(|kind| kind.name());
		kinds
	}

	/// Number of tables bound to a name.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Number of associated operator kinds.
	pub fn kind_count(&self) -> usize {
		self.by_type.len()
	}
}

impl std::fmt::Debug for OpTraitDb {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OpTraitDb")
			.field("traits", &self.iter().map(OpTrait::name).collect::<Vec<_>>())
			.field("kinds", &self.by_type.len())
			.finish()
	}
}

/// A registration unit, submitted with [`crate::op_trait_reg!`].
pub struct OpTraitReg {
	pub name: &'static str,
	/// Module that submitted the unit; breaks ordering ties between units
	/// sharing a name.
	pub module: &'static str,
	pub register: fn(OpTraitRegistry<'_>),
}

impl OpTraitReg {
	pub const fn new(name: &'static str, module: &'static str, register: fn(OpTraitRegistry<'_>)) -> Self {
		Self { name, module, register }
	}
}

inventory::collect!(OpTraitReg);

/// Runs every submitted registration unit against `builder`.
///
/// Link order is arbitrary, so units are sorted by name, then module.
pub fn run_registrations(builder: &mut OpTraitDbBuilder) {
	let mut regs: Vec<&'static OpTraitReg> = inventory::iter::<OpTraitReg>.into_iter().collect();
	regs.sort_by(|a, b| a.name.cmp(b.name).then_with(|| a.module.cmp(b.module)));
	tracing::debug!(count = regs.len(), "running op trait registrations");
	for reg in regs {
		(reg.register)(builder.begin(reg.name));
	}
}

static DB: OnceLock<OpTraitDb> = OnceLock::new();
static BUILD_FAILED: AtomicBool = AtomicBool::new(false);
static CONFIG: OnceLock<OpRegistryConfig> = OnceLock::new();
static FALLBACK: OnceLock<Arc<dyn FallbackPolicy>> = OnceLock::new();

/// Returns the process-wide registry, building it on first use.
///
/// Registration units must not call back into this function.
///
/// # Panics
///
/// Panics when a registration unit violates the build contract. The registry
/// then stays unbuilt, and every later call panics without re-running any
/// unit, even if the first panic was caught.
pub fn get_db() -> &'static OpTraitDb {
	init_once(&DB, &BUILD_FAILED, || {
		let config = CONFIG.get().cloned().unwrap_or_default();
		let mut builder = OpTraitDbBuilder::with_config(config);
		if let Some(policy) = FALLBACK.get() {
			builder = builder.fallback_policy(Arc::clone(policy));
		}
		run_registrations(&mut builder);
		builder.build()
	})
}

/// Marks the build as failed if it unwinds.
struct FailOnUnwind<'a>(&'a AtomicBool);

impl Drop for FailOnUnwind<'_> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			self.0.store(true, Ordering::Release);
		}
	}
}

fn init_once<'a>(
	cell: &'a OnceLock<OpTraitDb>,
	failed: &AtomicBool,
	build: impl FnOnce() -> OpTraitDb,
) -> &'a OpTraitDb {
	if let Some(db) = cell.get() {
		return db;
	}
	if failed.load(Ordering::Acquire) {
		panic!("op registry: an earlier build failed, registry is unavailable");
	}
	cell.get_or_init(|| {
		let _guard = FailOnUnwind(failed);
		build()
	})
}

/// Returns `true` once the process-wide registry has been built.
pub fn is_initialized() -> bool {
	DB.get().is_some()
}

/// Installs the configuration of the process-wide registry.
///
/// Must run before the first lookup and at most once.
pub fn configure(config: OpRegistryConfig) -> Result<(), ConfigError> {
	if is_initialized() {
		return Err(ConfigError::AlreadyInitialized);
	}
	CONFIG.set(config).map_err(|_| ConfigError::AlreadyInitialized)
}

/// Installs the fallback policy of the process-wide registry.
///
/// Must run before the first lookup and at most once.
pub fn set_fallback_policy(policy: Arc<dyn FallbackPolicy>) -> Result<(), ConfigError> {
	if is_initialized() {
		return Err(ConfigError::AlreadyInitialized);
	}
	FALLBACK.set(policy).map_err(|_| ConfigError::AlreadyInitialized)
}
