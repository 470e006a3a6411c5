//! Core types consumed by the op-trait registry: operator definitions,
//! kind identities, symbolic graph handles and tensors.

/// Use-phase error type for operator behaviors.
pub mod error;
/// Symbolic graph handles: variables, symbol wrappers and operator nodes.
pub mod graph;
/// Operator definition trait and behavior result types.
pub mod op;
/// Tensors, layouts and memory descriptors.
pub mod tensor;
/// Process-wide identity tokens for operator kinds.
pub mod typeinfo;

pub use error::{OpError, OpResult};
pub use graph::{OperatorNode, SymbolVar, SymbolVarArray, VarNode, VarNodeArray};
pub use op::{BackwardGraphResult, DispatchMode, MemoryPlan, OpDef, OpProps, OutputAttrs};
pub use smallvec::{SmallVec, smallvec};
pub use tensor::{
	AllocType, CompNode, DType, DeviceKind, DeviceTensorND, LogicalTensorDesc, MemoryDesc,
	SmallVector, Tensor, TensorLayout, TensorPtr, TensorShape,
};
pub use typeinfo::TypeInfo;
