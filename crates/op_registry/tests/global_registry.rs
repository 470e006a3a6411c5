use std::sync::Arc;

use {
	inventory as _, paste as _, proptest as _, rustc_hash as _, serde as _, tensil_primitives as _,
	thiserror as _, toml as _, tracing as _,
};

use pretty_assertions::assert_eq;
use tensil_op_registry::primitives::{
	BackwardGraphResult, DispatchMode, LogicalTensorDesc, OpDef, OpError, OpProps, OpResult,
	OperatorNode, OutputAttrs, SmallVector, SymbolVar, Tensor, TensorPtr, TypeInfo, VarNode,
	smallvec,
};
use tensil_op_registry::{
	ConfigError, OpDefExt, OpRegistryConfig, OpTrait, configure, get_db, op_trait_reg,
	set_fallback_policy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Add,
	Mul,
}

#[derive(Debug)]
struct Elemwise {
	mode: Mode,
	scope: Option<String>,
}

impl Elemwise {
	fn new(mode: Mode) -> Self {
		Self { mode, scope: None }
	}
}

impl OpDef for Elemwise {
	fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}
}

#[derive(Debug)]
struct Reduce {
	axis: usize,
}

impl OpDef for Reduce {}

#[derive(Debug)]
struct Identity;

impl OpDef for Identity {}

#[derive(Debug)]
struct Unknown;

impl OpDef for Unknown {}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn elemwise_eager(def: &dyn OpDef, inputs: &[TensorPtr]) -> OpResult<SmallVector<TensorPtr>> {
	let op = def.cast_final::<Elemwise>()?;
	let [lhs, rhs] = inputs else {
		return Err(OpError::InvalidInput(format!("elemwise takes 2 inputs, got {}", inputs.len())));
	};
	let (a, b) = (lhs.read(), rhs.read());
	let data = a
		.iter()
		.zip(b.iter())
		.map(|(x, y)| match op.mode {
			Mode::Add => x + y,
			Mode::Mul => x * y,
		})
		.collect();
	Ok(smallvec![Tensor::new(lhs.layout().clone(), lhs.comp_node(), data)?])
}

fn elemwise_props(def: &dyn OpDef) -> OpProps {
	match def.cast_final::<Elemwise>() {
		Ok(op) => vec![("mode", format!("{:?}", op.mode))],
		Err(_) => OpProps::new(),
	}
}

fn elemwise_from_node(node: &OperatorNode) -> OpResult<Arc<dyn OpDef>> {
	let mode = match node.param("mode") {
		Some("add") => Mode::Add,
		Some("mul") => Mode::Mul,
		other => return Err(OpError::InvalidInput(format!("unknown elemwise mode {other:?}"))),
	};
	Ok(Arc::new(Elemwise::new(mode)))
}

op_trait_reg!(Elemwise, [Elemwise], |reg| reg
	.make_from_op_node(elemwise_from_node)
	.apply_on_physical_tensor(elemwise_eager)
	.apply_on_var_node(|_def, inputs: &[VarNode]| {
		SymbolVar::new(VarNode::new(format!("elemwise({})", inputs.len())))
	})
	.props(elemwise_props)
	.make_name(|def| {
		def.cast_final::<Elemwise>()
			.map(|op| format!("{:?}", op.mode).to_lowercase())
			.unwrap_or_else(|_| "elemwise".to_owned())
	})
	.fallback());

op_trait_reg!(Reduce, [Reduce], |reg| reg
	.props(|def| {
		let axis = def.cast_final::<Reduce>().map(|op| op.axis).unwrap_or_default();
		vec![("axis", axis.to_string())]
	})
	.infer_output_attrs_fallible(|_def, inputs: &[LogicalTensorDesc]| {
		Ok(OutputAttrs {
			descs: inputs.iter().take(1).cloned().collect(),
			validated: false,
		})
	})
	.make_backward_graph(|_def, _inputs, input_requires_grad, _output_has_grad| {
		Ok(BackwardGraphResult {
			backward: None,
			save_for_backward: vec![false; input_requires_grad.len()],
			input_has_grad: input_requires_grad.to_vec(),
		})
	})
	.fallback());

op_trait_reg!(Identity, |reg| reg
	.associate_type::<Identity>()
	.decide_dispatch_mode(|_def, _inputs| DispatchMode::DefaultCpu));

#[test]
fn lookups_agree() {
	init_tracing();
	let by_name = OpTrait::find_by_name("Elemwise").unwrap();
	let by_type = OpTrait::find_by_typeinfo(TypeInfo::of::<Elemwise>()).unwrap();
	assert!(std::ptr::eq(by_name, by_type));
	assert!(OpTrait::find_by_name("Conv").is_none());
	assert!(OpTrait::find_by_typeinfo(TypeInfo::of::<Unknown>()).is_none());
	assert_eq!(get_db().types_of("Reduce"), vec![TypeInfo::of::<Reduce>()]);
}

#[test]
fn units_run_in_name_order() {
	let mut names = Vec::new();
	OpTrait::for_each_trait(|op| names.push(op.name()));
	assert_eq!(names, vec!["Elemwise", "Identity", "Reduce"]);
}

#[test]
fn eager_execution_through_the_table() {
	init_tracing();
	let def: Arc<dyn OpDef> = Arc::new(Elemwise::new(Mode::Mul));
	let op = def.op_trait().unwrap();
	let lhs = Tensor::from_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
	let rhs = Tensor::from_vec(&[3], vec![4.0, 5.0, 6.0]).unwrap();

	let out = op.apply_on_physical_tensor.call(&*def, &[lhs.clone(), rhs.clone()]).unwrap();
	assert_eq!(out[0].to_vec(), vec![4.0, 10.0, 18.0]);

	let dst = Tensor::zeros(lhs.desc());
	op.execute.call(&*def, &[lhs, rhs], &[dst.clone()], &[]).unwrap();
	assert_eq!(dst.to_vec(), vec![4.0, 10.0, 18.0]);
	assert_eq!(op.decide_dispatch_mode.call(&*def, &[]), Ok(DispatchMode::Kernel));
}

#[test]
fn graph_round_trip() {
	let node = OperatorNode::new("elemwise", vec![VarNode::new("x")], vec![VarNode::new("y")]).with_param("mode", "add");
	let op = OpTrait::find_by_name("Elemwise").unwrap();
	let def = op.make_from_op_node.call(&node).unwrap();
	assert_eq!(def.cast_final::<Elemwise>().unwrap().mode, Mode::Add);

	let outputs = op.apply_on_var_node.call(&*def, node.inputs()).unwrap();
	assert_eq!(outputs.len(), 1);
	assert_eq!(outputs[0].name(), "elemwise(1)");

	let bad = OperatorNode::new("elemwise", vec![], vec![]).with_param("mode", "pow");
	assert_eq!(
		op.make_from_op_node.call(&bad).unwrap_err(),
		OpError::InvalidInput("unknown elemwise mode Some(\"pow\")".into())
	);
	let unparsed = OperatorNode::new("elemwise", vec![], vec![]);
	assert!(matches!(op.make_from_op_node.call(&unparsed), Err(OpError::InvalidInput(_))));
}

#[test]
fn instance_helpers() {
	let add: Arc<dyn OpDef> = Arc::new(Elemwise::new(Mode::Add));
	let add2: Arc<dyn OpDef> = Arc::new(Elemwise::new(Mode::Add));
	let mul: Arc<dyn OpDef> = Arc::new(Elemwise::new(Mode::Mul));
	let reduce: Arc<dyn OpDef> = Arc::new(Reduce { axis: 1 });

	assert_eq!(add.make_name().unwrap(), "add");
	assert_eq!(add.describe().unwrap(), "Elemwise{mode: Add}");
	assert_eq!(reduce.describe().unwrap(), "Reduce{axis: 1}");
	assert_eq!(reduce.make_name().unwrap(), "Reduce");

	assert_eq!(add.hash_value().unwrap(), add2.hash_value().unwrap());
	assert_ne!(add.hash_value().unwrap(), mul.hash_value().unwrap());
	assert!(add.is_same(&*add2).unwrap());
	assert!(!add.is_same(&*mul).unwrap());
	assert!(!add.is_same(&*reduce).unwrap());

	let scoped: Arc<dyn OpDef> = Arc::new(Elemwise {
		mode: Mode::Mul,
		scope: Some("block1".into()),
	});
	assert_eq!(scoped.display_name().unwrap(), "block1.mul");
	assert_eq!(add.display_name().unwrap(), "add");
	assert_eq!(scoped.props().unwrap(), vec![("mode", "Mul".to_owned())]);
}

#[test]
fn unregistered_kind() {
	let def: &dyn OpDef = &Unknown;
	let expected = OpError::Unregistered(TypeInfo::of::<Unknown>().name());
	assert_eq!(def.op_trait().err(), Some(expected.clone()));
	assert_eq!(def.make_name(), Err(expected.clone()));
	assert_eq!(def.describe(), Err(expected));
}

#[test]
fn slots_without_fallback_stay_unimplemented() {
	let op = OpTrait::find_by_typeinfo(TypeInfo::of::<Identity>()).unwrap();
	assert_eq!(op.implemented_methods(), vec!["decide_dispatch_mode"]);
	assert_eq!(op.decide_dispatch_mode.call(&Identity, &[]), Ok(DispatchMode::DefaultCpu));

	let def: &dyn OpDef = &Identity;
	assert_eq!(
		def.make_name(),
		Err(OpError::NotImplemented {
			op: "Identity",
			method: "make_name",
		})
	);
}

#[test]
fn reduce_paths() {
	let op = OpTrait::find_by_name("Reduce").unwrap();
	let x = Tensor::from_vec(&[4], vec![0.0; 4]).unwrap();

	let err = op.infer_output_mem_desc.call(&Reduce { axis: 0 }, &[x], &[]).unwrap_err();
	assert!(matches!(err, OpError::InferenceFailed(_)), "{err:?}");

	let grad = op.make_backward_graph.call(&Reduce { axis: 0 }, &[], &[true, false], &[true]).unwrap();
	assert!(grad.backward.is_none());
	assert_eq!(grad.input_has_grad, vec![true, false]);

	let err = op.apply_on_physical_tensor.call(&Reduce { axis: 0 }, &[]).unwrap_err();
	assert!(matches!(err, OpError::Unsupported { op: "Reduce", .. }), "{err:?}");
}

#[test]
fn configuration_is_closed_after_first_use() {
	let _ = get_db();
	assert!(matches!(
		configure(OpRegistryConfig::default()),
		Err(ConfigError::AlreadyInitialized)
	));
	assert!(matches!(
		set_fallback_policy(Arc::new(tensil_op_registry::DefaultFallback)),
		Err(ConfigError::AlreadyInitialized)
	));
}

#[test]
fn concurrent_readers_share_tables() {
	let tables: Vec<usize> = std::thread::scope(|s| {
		let handles: Vec<_> = (0..8)
			.map(|_| s.spawn(|| OpTrait::find_by_name("Elemwise").unwrap() as *const OpTrait as usize))
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});
	assert!(tables.windows(2).all(|w| w[0] == w[1]));
}
