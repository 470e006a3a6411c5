//! Output-shape adapter for symbolic-graph construction.
//!
//! `apply_on_var_node` implementations may return whichever shape is natural
//! for them. The builder wraps them so the stored slot always yields a
//! [`VarNodeArray`] in the declared output order. Shapes without an
//! [`IntoVarNodeArray`] impl are rejected at compile time.

use std::sync::Arc;

use crate::primitives::graph::to_var_node_array;
use crate::primitives::{OpResult, OperatorNode, SymbolVar, SymbolVarArray, VarNodeArray};

/// Conversion into the canonical ordered output array.
pub trait IntoVarNodeArray {
	fn into_var_node_array(self) -> OpResult<VarNodeArray>;
}

impl IntoVarNodeArray for VarNodeArray {
	#[inline]
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(self)
	}
}

impl IntoVarNodeArray for SymbolVar {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(vec![self.into_node()])
	}
}

impl IntoVarNodeArray for SymbolVarArray {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(to_var_node_array(&self))
	}
}

impl<const N: usize> IntoVarNodeArray for [SymbolVar; N] {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(self.into_iter().map(SymbolVar::into_node).collect())
	}
}

impl IntoVarNodeArray for &OperatorNode {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(self.usable_output())
	}
}

impl IntoVarNodeArray for Arc<OperatorNode> {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		Ok(self.usable_output())
	}
}

impl<T: IntoVarNodeArray> IntoVarNodeArray for OpResult<T> {
	fn into_var_node_array(self) -> OpResult<VarNodeArray> {
		self?.into_var_node_array()
	}
}
