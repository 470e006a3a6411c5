//! Fallback policies for unset slots.
//!
//! The policy is owned by the registration code that installs it; the
//! builder only asks it for defaults and copies the ones whose slots are
//! still empty.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::meth::*;
use crate::op_trait::OpTrait;
use crate::primitives::{
	DeviceTensorND, DispatchMode, MemoryDesc, MemoryPlan, OpError, OpProps, SmallVector, TensorPtr,
};

/// Supplies default implementations for a table's unset slots.
pub trait FallbackPolicy: Send + Sync + 'static {
	/// Returns a table of defaults for `op`.
	///
	/// `op` reflects the slots set so far, so defaults may be derived from
	/// them. Only slots still empty on `op` are taken from the result.
	fn defaults(&self, op: &OpTrait) -> OpTrait;
}

impl<F> FallbackPolicy for F
where
	F: Fn(&OpTrait) -> OpTrait + Send + Sync + 'static,
{
	fn defaults(&self, op: &OpTrait) -> OpTrait {
		self(op)
	}
}

/// The stock policy.
///
/// - `decide_dispatch_mode` picks [`DispatchMode::Kernel`].
/// - `make_name` returns the table name, `props` is empty.
/// - `hash` and `is_same_st` use the kind identity plus the table's own
///   `props`, when that slot was set.
/// - `execute` and `apply_on_device_tensornd` run `apply_on_physical_tensor`
///   and copy its results out.
/// - `infer_output_mem_desc` lays outputs out from `infer_output_attrs_fallible`.
/// - Anything that cannot be derived answers [`OpError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFallback;

fn unsupported(op: &'static str, method: &'static str) -> OpError {
	OpError::Unsupported {
		op,
		method,
		reason: "no implementation registered and none can be derived".into(),
	}
}

impl FallbackPolicy for DefaultFallback {
	fn defaults(&self, op: &OpTrait) -> OpTrait {
		let name = op.name();
		let mut d = OpTrait::new(name);

		d.make_from_op_node = OpDefMaker::from_fn(move |_node| Err(unsupported(name, OpDefMaker::NAME)));
		d.apply_on_physical_tensor =
			ApplyOnPhysicalTensor::from_fn(move |_def, _inputs| Err(unsupported(name, ApplyOnPhysicalTensor::NAME)));
		d.apply_on_var_node = ApplyOnVarNode::from_fn(move |_def, _inputs| Err(unsupported(name, ApplyOnVarNode::NAME)));
		d.infer_output_attrs_fallible = InferOutputAttrsFallible::from_fn(move |_def, _inputs| {
			Err(unsupported(name, InferOutputAttrsFallible::NAME))
		});
		d.make_backward_graph =
			GradMaker::from_fn(move |_def, _inputs, _requires, _has| Err(unsupported(name, GradMaker::NAME)));

		d.decide_dispatch_mode = DecideDispatchMode::from_fn(|_def, _inputs| DispatchMode::Kernel);
		d.make_name = MakeNameFunc::from_fn(move |_def| name.to_owned());
		d.props = Props::from_fn(|_def| OpProps::new());

		let props = op.props.clone();
		d.hash = HashFunc::from_fn(move |def| {
			let mut hasher = FxHasher::default();
			def.dyn_typeinfo().hash(&mut hasher);
			if let Ok(values) = props.call(def) {
				values.hash(&mut hasher);
			}
			hasher.finish()
		});
		let props = op.props.clone();
		d.is_same_st = IsSame::from_fn(move |lhs, rhs| {
			lhs.dyn_typeinfo() == rhs.dyn_typeinfo() && props.call(lhs).ok() == props.call(rhs).ok()
		});

		if op.apply_on_physical_tensor.is_set() {
			let eager = op.apply_on_physical_tensor.clone();
			d.execute = Execute::from_fn(move |def, inputs, outputs, _workspace| {
				let results = eager.call(def, inputs)?;
				copy_results(&results, outputs)
			});
			let eager = op.apply_on_physical_tensor.clone();
			d.apply_on_device_tensornd = ApplyOnDeviceTensorND::from_fn(move |def, inputs, outputs| {
				let tensors = inputs.iter().map(DeviceTensorND::to_tensor).collect::<Result<Vec<_>, _>>()?;
				let results = eager.call(def, &tensors)?;
				fill_device_views(&results, outputs)
			});
		} else {
			d.execute = Execute::from_fn(move |_def, _inputs, _outputs, _workspace| Err(unsupported(name, Execute::NAME)));
			d.apply_on_device_tensornd = ApplyOnDeviceTensorND::from_fn(move |_def, _inputs, _outputs| {
				Err(unsupported(name, ApplyOnDeviceTensorND::NAME))
			});
		}

		if op.infer_output_attrs_fallible.is_set() {
			let infer = op.infer_output_attrs_fallible.clone();
			d.infer_output_mem_desc = InferOutputMemDesc::from_fn(move |def, inputs, _inputs_mems| {
				let descs: Vec<_> = inputs.iter().map(|t| t.desc().clone()).collect();
				let attrs = infer.call(def, &descs)?;
				if !attrs.validated {
					return Err(OpError::InferenceFailed(format!(
						"output layout of {name} depends on input values"
					)));
				}
				Ok(MemoryPlan {
					outputs: attrs
						.descs
						.into_iter()
						.map(|desc| MemoryDesc {
							layout: desc.layout,
							offset: 0,
							comp_node: desc.comp_node,
							alloc: Default::default(),
						})
						.collect(),
					workspace: Default::default(),
				})
			});
		} else {
			d.infer_output_mem_desc = InferOutputMemDesc::from_fn(move |_def, _inputs, _inputs_mems| {
				Err(unsupported(name, InferOutputMemDesc::NAME))
			});
		}

		d
	}
}

fn check_counts(results: usize, outputs: usize) -> Result<(), OpError> {
	if results != outputs {
		return Err(OpError::InvalidInput(format!(
			"{outputs} outputs allocated for {results} results"
		)));
	}
	Ok(())
}

fn check_sizes(src: usize, dst: usize) -> Result<(), OpError> {
	if src != dst {
		return Err(OpError::InvalidInput(format!(
			"copy of {src} elements into tensor of {dst}"
		)));
	}
	Ok(())
}

/// Copies eager results into pre-allocated outputs.
///
/// Every size is checked before the first write, so a mismatch leaves all
/// outputs untouched.
fn copy_results(results: &[TensorPtr], outputs: &[TensorPtr]) -> Result<(), OpError> {
	check_counts(results.len(), outputs.len())?;
	for (dst, src) in outputs.iter().zip(results) {
		if !Arc::ptr_eq(dst, src) {
			check_sizes(src.read().len(), dst.read().len())?;
		}
	}
	for (dst, src) in outputs.iter().zip(results) {
		if Arc::ptr_eq(dst, src) {
			continue;
		}
		let values = src.read();
		dst.copy_from(&values)?;
	}
	Ok(())
}

/// Writes eager results into the caller's device views, keeping their
/// placement. An empty `outputs` receives fresh views instead.
fn fill_device_views(results: &[TensorPtr], outputs: &mut SmallVector<DeviceTensorND>) -> Result<(), OpError> {
	if outputs.is_empty() {
		outputs.extend(results.iter().map(|t| DeviceTensorND::from_tensor(t)));
		return Ok(());
	}
	check_counts(results.len(), outputs.len())?;
	for (dst, src) in outputs.iter().zip(results) {
		check_sizes(src.read().len(), dst.data.len())?;
	}
	for (dst, src) in outputs.iter_mut().zip(results) {
		dst.data.copy_from_slice(&src.read());
	}
	Ok(())
}
