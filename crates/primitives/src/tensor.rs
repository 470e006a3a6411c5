//! Tensors and their metadata.
//!
//! Storage is a flat `f32` buffer behind a lock so that pre-allocated outputs
//! can be filled through shared [`TensorPtr`] handles. The registry only
//! passes these values through; real device runtimes sit behind the same
//! shapes.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::SmallVec;

use crate::error::{OpError, OpResult};

/// Inline-first vector for per-invocation argument lists.
pub type SmallVector<T> = SmallVec<[T; 4]>;

/// Tensor dimensions, outermost first.
pub type TensorShape = SmallVec<[usize; 4]>;

/// Shared handle to a materialized tensor.
pub type TensorPtr = Arc<Tensor>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DType {
	#[default]
	Float32,
	Float16,
	Int32,
	Uint8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceKind {
	#[default]
	Cpu,
	Cuda,
}

/// A computing device together with its ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompNode {
	pub kind: DeviceKind,
	pub index: u32,
}

impl CompNode {
	pub const fn cpu(index: u32) -> Self {
		Self {
			kind: DeviceKind::Cpu,
			index,
		}
	}

	pub const fn cuda(index: u32) -> Self {
		Self {
			kind: DeviceKind::Cuda,
			index,
		}
	}
}

impl std::fmt::Display for CompNode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			DeviceKind::Cpu => write!(f, "cpu{}", self.index),
			DeviceKind::Cuda => write!(f, "gpu{}", self.index),
		}
	}
}

/// Shape and element type of a tensor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TensorLayout {
	pub shape: TensorShape,
	pub dtype: DType,
}

impl TensorLayout {
	pub fn new(shape: &[usize], dtype: DType) -> Self {
		Self {
			shape: SmallVec::from_slice(shape),
			dtype,
		}
	}

	/// Number of elements; a rank-0 layout holds one scalar.
	pub fn total_nr_elems(&self) -> usize {
		self.shape.iter().product()
	}
}

/// Metadata of a tensor that may not be materialized yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogicalTensorDesc {
	pub layout: TensorLayout,
	pub comp_node: CompNode,
}

impl LogicalTensorDesc {
	pub fn new(layout: TensorLayout, comp_node: CompNode) -> Self {
		Self { layout, comp_node }
	}
}

/// How the storage behind a [`MemoryDesc`] is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AllocType {
	/// A fresh allocation owned by the output.
	#[default]
	Unique,
	/// Storage forwarded from the input with the given index.
	Forward(usize),
}

/// Planned placement of one output or workspace buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemoryDesc {
	pub layout: TensorLayout,
	pub offset: usize,
	pub comp_node: CompNode,
	pub alloc: AllocType,
}

/// A materialized tensor.
pub struct Tensor {
	desc: LogicalTensorDesc,
	storage: RwLock<Vec<f32>>,
}

impl Tensor {
	/// Creates a tensor from raw values; the length must match the layout.
	pub fn new(layout: TensorLayout, comp_node: CompNode, data: Vec<f32>) -> OpResult<TensorPtr> {
		if layout.total_nr_elems() != data.len() {
			return Err(OpError::InvalidInput(format!(
				"layout {:?} needs {} elements, got {}",
				layout.shape,
				layout.total_nr_elems(),
				data.len()
			)));
		}
		Ok(Arc::new(Self {
			desc: LogicalTensorDesc::new(layout, comp_node),
			storage: RwLock::new(data),
		}))
	}

	/// Creates an `f32` tensor on `cpu0`.
	pub fn from_vec(shape: &[usize], data: Vec<f32>) -> OpResult<TensorPtr> {
		Self::new(TensorLayout::new(shape, DType::Float32), CompNode::default(), data)
	}

	/// Allocates a zero-filled tensor matching `desc`.
	pub fn zeros(desc: &LogicalTensorDesc) -> TensorPtr {
		Arc::new(Self {
			storage: RwLock::new(vec![0.0; desc.layout.total_nr_elems()]),
			desc: desc.clone(),
		})
	}

	pub fn desc(&self) -> &LogicalTensorDesc {
		&self.desc
	}

	pub fn layout(&self) -> &TensorLayout {
		&self.desc.layout
	}

	pub fn comp_node(&self) -> CompNode {
		self.desc.comp_node
	}

	pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
		self.storage.read()
	}

	pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
		self.storage.write()
	}

	pub fn to_vec(&self) -> Vec<f32> {
		self.storage.read().clone()
	}

	/// Overwrites the contents with `src`, which must have the same element count.
	pub fn copy_from(&self, src: &[f32]) -> OpResult<()> {
		let mut dst = self.storage.write();
		if dst.len() != src.len() {
			return Err(OpError::InvalidInput(format!(
				"copy of {} elements into tensor of {}",
				src.len(),
				dst.len()
			)));
		}
		dst.copy_from_slice(src);
		Ok(())
	}
}

impl std::fmt::Debug for Tensor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tensor")
			.field("shape", &self.desc.layout.shape)
			.field("dtype", &self.desc.layout.dtype)
			.field("comp_node", &format_args!("{}", self.desc.comp_node))
			.finish()
	}
}

/// A device-resident tensor view, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceTensorND {
	pub desc: LogicalTensorDesc,
	pub data: Vec<f32>,
}

impl DeviceTensorND {
	pub fn from_tensor(tensor: &Tensor) -> Self {
		Self {
			desc: tensor.desc().clone(),
			data: tensor.to_vec(),
		}
	}

	pub fn to_tensor(&self) -> OpResult<TensorPtr> {
		Tensor::new(self.desc.layout.clone(), self.desc.comp_node, self.data.clone())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn new_rejects_length_mismatch() {
		let err = Tensor::from_vec(&[2, 2], vec![1.0; 3]).unwrap_err();
		assert!(matches!(err, OpError::InvalidInput(_)));
	}

	#[test]
	fn scalar_layout_has_one_element() {
		assert_eq!(TensorLayout::new(&[], DType::Float32).total_nr_elems(), 1);
		assert_eq!(TensorLayout::new(&[2, 0], DType::Int32).total_nr_elems(), 0);
	}

	#[test]
	fn copy_into_shared_handle() {
		let t = Tensor::from_vec(&[3], vec![0.0; 3]).unwrap();
		let alias = Arc::clone(&t);
		alias.copy_from(&[1.0, 2.0, 3.0]).unwrap();
		assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0]);
		assert!(t.copy_from(&[1.0]).is_err());
	}

	#[test]
	fn device_tensor_round_trips_through_physical() {
		let t = Tensor::new(TensorLayout::new(&[2], DType::Float32), CompNode::cuda(1), vec![4.0, 5.0]).unwrap();
		let dev = DeviceTensorND::from_tensor(&t);
		assert_eq!(dev.desc.comp_node.to_string(), "gpu1");
		let back = dev.to_tensor().unwrap();
		assert_eq!(back.to_vec(), vec![4.0, 5.0]);
		assert_eq!(back.desc(), t.desc());
	}
}
