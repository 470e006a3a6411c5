//! Registration macro.

/// Declares a registration unit for the process-wide registry.
///
/// The unit calls `begin(stringify!(Name))`, associates the listed operator
/// kinds and then evaluates the body with the builder bound to `reg`. The
/// body must yield the builder back, so setters chain naturally:
///
/// ```ignore
/// op_trait_reg!(Add, [Add], |reg| reg
/// 	.apply_on_physical_tensor(add_eager)
/// 	.fallback());
/// ```
///
/// Units are collected with `inventory` and run once, sorted by name and
/// then by module path, on the first registry lookup.
#[macro_export]
macro_rules! op_trait_reg {
	($name:ident, [$($kind:ty),* $(,)?], |$reg:ident| $body:expr $(,)?) => {
		$crate::__private::paste::paste! {
			fn [<__op_trait_reg_ $name:snake>]($reg: $crate::OpTraitRegistry<'_>) {
				let kinds: &[$crate::primitives::TypeInfo] = &[$($crate::primitives::TypeInfo::of::<$kind>()),*];
				let $reg = $reg.associate(kinds.iter().copied());
				let _: $crate::OpTraitRegistry<'_> = $body;
			}

			$crate::__private::inventory::submit!($crate::OpTraitReg::new(
				stringify!($name),
				module_path!(),
				[<__op_trait_reg_ $name:snake>],
			));
		}
	};
	($name:ident, |$reg:ident| $body:expr $(,)?) => {
		$crate::op_trait_reg!($name, [], |$reg| $body);
	};
}
