//! Method catalog shared by the slot types, the table and the builder.
//!
//! This is the single source of truth for slot field names, slot types,
//! implementation signatures and how each slot's result is surfaced:
//! - `infallible`: the implementation returns the value directly.
//! - `fallible`: the implementation returns an `OpResult`.
//! - `adapted`: like `fallible`, but the builder setter accepts any output
//!   shape understood by [`crate::adapter::IntoVarNodeArray`].

macro_rules! with_op_meths {
	($callback:ident) => {
		$callback! {
			/// Builds a portable operator description from a captured graph node.
			{
				field: make_from_op_node,
				slot: OpDefMaker,
				kind: fallible,
				args: (node: &crate::primitives::OperatorNode),
				ret: std::sync::Arc<dyn crate::primitives::OpDef>,
			}
			/// Chooses between the default CPU path and the operator's own kernel.
			{
				field: decide_dispatch_mode,
				slot: DecideDispatchMode,
				kind: infallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::LogicalTensorDesc],
				),
				ret: crate::primitives::DispatchMode,
			}
			/// Runs the operator eagerly on materialized tensors.
			{
				field: apply_on_physical_tensor,
				slot: ApplyOnPhysicalTensor,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::TensorPtr],
				),
				ret: crate::primitives::SmallVector<crate::primitives::TensorPtr>,
			}
			/// Plans output and workspace memory without executing.
			{
				field: infer_output_mem_desc,
				slot: InferOutputMemDesc,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::TensorPtr],
					inputs_mems: &[crate::primitives::MemoryDesc],
				),
				ret: crate::primitives::MemoryPlan,
			}
			/// Executes into pre-allocated outputs and workspace.
			{
				field: execute,
				slot: Execute,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::TensorPtr],
					outputs: &[crate::primitives::TensorPtr],
					workspace: &[crate::primitives::TensorPtr],
				),
				ret: (),
			}
			/// Executes directly over device tensor views.
			{
				field: apply_on_device_tensornd,
				slot: ApplyOnDeviceTensorND,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::DeviceTensorND],
					outputs: &mut crate::primitives::SmallVector<crate::primitives::DeviceTensorND>,
				),
				ret: (),
			}
			/// Extends a symbolic graph; outputs are always the canonical array.
			{
				field: apply_on_var_node,
				slot: ApplyOnVarNode,
				kind: adapted,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::VarNode],
				),
				ret: crate::primitives::VarNodeArray,
			}
			/// Infers output shape and type from input metadata.
			{
				field: infer_output_attrs_fallible,
				slot: InferOutputAttrsFallible,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::LogicalTensorDesc],
				),
				ret: crate::primitives::OutputAttrs,
			}
			/// Builds the gradient graph.
			{
				field: make_backward_graph,
				slot: GradMaker,
				kind: fallible,
				args: (
					def: &dyn crate::primitives::OpDef,
					inputs: &[crate::primitives::LogicalTensorDesc],
					input_requires_grad: &[bool],
					output_has_grad: &[bool],
				),
				ret: crate::primitives::BackwardGraphResult,
			}
			/// Exposes the instance parameters.
			{
				field: props,
				slot: Props,
				kind: infallible,
				args: (def: &dyn crate::primitives::OpDef),
				ret: crate::primitives::OpProps,
			}
			/// Structural hash, used for memoization keys.
			{
				field: hash,
				slot: HashFunc,
				kind: infallible,
				args: (def: &dyn crate::primitives::OpDef),
				ret: u64,
			}
			/// Structural equality of two instances of the same kind.
			{
				field: is_same_st,
				slot: IsSame,
				kind: infallible,
				args: (
					lhs: &dyn crate::primitives::OpDef,
					rhs: &dyn crate::primitives::OpDef,
				),
				ret: bool,
			}
			/// Human-readable instance name.
			{
				field: make_name,
				slot: MakeNameFunc,
				kind: infallible,
				args: (def: &dyn crate::primitives::OpDef),
				ret: String,
			}
		}
	};
}

/// Return type of a stored implementation.
macro_rules! meth_ret {
	(infallible, $ret:ty) => {
		$ret
	};
	(fallible, $ret:ty) => {
		crate::primitives::OpResult<$ret>
	};
	(adapted, $ret:ty) => {
		crate::primitives::OpResult<$ret>
	};
}

/// Lifts an implementation's result into the slot's `OpResult`.
macro_rules! meth_call {
	(infallible, $call:expr) => {
		Ok($call)
	};
	(fallible, $call:expr) => {
		$call
	};
	(adapted, $call:expr) => {
		$call
	};
}

pub(crate) use {meth_call, meth_ret, with_op_meths};
