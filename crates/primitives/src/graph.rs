//! Symbolic graph handles.
//!
//! These are thin, cheaply cloned handles. The graph machinery that owns and
//! schedules them lives outside this workspace; operator behaviors only need
//! stable identities, names and the usable-output view of an operator node.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(1);

/// Ordered sequence of graph variables, the canonical output form of
/// symbolic-graph construction.
pub type VarNodeArray = Vec<VarNode>;

/// Ordered sequence of symbol wrappers.
pub type SymbolVarArray = Vec<SymbolVar>;

#[derive(Debug)]
struct VarNodeData {
	id: u64,
	name: String,
	volatile: bool,
}

/// A variable in a symbolic computation graph.
///
/// Identity is the allocation id: clones compare equal, two variables created
/// with the same name do not.
#[derive(Clone)]
pub struct VarNode(Arc<VarNodeData>);

impl VarNode {
	/// Creates a fresh variable.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_flags(name, false)
	}

	/// Creates a variable whose content is volatile and therefore not usable
	/// as an operator output.
	pub fn volatile(name: impl Into<String>) -> Self {
		Self::with_flags(name, true)
	}

	fn with_flags(name: impl Into<String>, volatile: bool) -> Self {
		Self(Arc::new(VarNodeData {
			id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
			name: name.into(),
			volatile,
		}))
	}

	#[inline]
	pub fn id(&self) -> u64 {
		self.0.id
	}

	#[inline]
	pub fn name(&self) -> &str {
		&self.0.name
	}

	#[inline]
	pub fn is_volatile(&self) -> bool {
		self.0.volatile
	}
}

impl PartialEq for VarNode {
	fn eq(&self, other: &Self) -> bool {
		self.0.id == other.0.id
	}
}

impl Eq for VarNode {}

impl std::hash::Hash for VarNode {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.0.id.hash(state);
	}
}

impl std::fmt::Debug for VarNode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "VarNode({}#{})", self.0.name, self.0.id)
	}
}

/// User-facing wrapper around a [`VarNode`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SymbolVar {
	node: VarNode,
}

impl SymbolVar {
	pub fn new(node: VarNode) -> Self {
		Self { node }
	}

	/// Returns the wrapped graph variable.
	#[inline]
	pub fn node(&self) -> &VarNode {
		&self.node
	}

	pub fn into_node(self) -> VarNode {
		self.node
	}
}

impl From<VarNode> for SymbolVar {
	fn from(node: VarNode) -> Self {
		Self::new(node)
	}
}

/// Unwraps a slice of symbols into graph variables, preserving order.
pub fn to_var_node_array(vars: &[SymbolVar]) -> VarNodeArray {
	vars.iter().map(|v| v.node.clone()).collect()
}

/// A captured operator in a symbolic graph.
#[derive(Debug, Clone)]
pub struct OperatorNode {
	name: String,
	inputs: VarNodeArray,
	outputs: VarNodeArray,
	params: Vec<(&'static str, String)>,
}

impl OperatorNode {
	pub fn new(name: impl Into<String>, inputs: VarNodeArray, outputs: VarNodeArray) -> Self {
		Self {
			name: name.into(),
			inputs,
			outputs,
			params: Vec::new(),
		}
	}

	/// Attaches a serialized operator parameter.
	pub fn with_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
		self.params.push((key, value.into()));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn inputs(&self) -> &[VarNode] {
		&self.inputs
	}

	/// Returns every output, including volatile ones.
	pub fn outputs(&self) -> &[VarNode] {
		&self.outputs
	}

	/// Returns the outputs a consumer may read, in declaration order.
	pub fn usable_output(&self) -> VarNodeArray {
		self.outputs
			.iter()
			.filter(|v| !v.is_volatile())
			.cloned()
			.collect()
	}

	/// Looks up a parameter by key.
	pub fn param(&self, key: &str) -> Option<&str> {
		self.params
			.iter()
			.find(|(k, _)| *k == key)
			.map(|(_, v)| v.as_str())
	}

	pub fn params(&self) -> &[(&'static str, String)] {
		&self.params
	}
}
