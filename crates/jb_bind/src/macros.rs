/// Implements [`Bind`](crate::Bind) for classes, enums and scalars.
///
/// - `class Foo, Bar`: types implementing [`BindClass`](crate::info::BindClass).
/// - `class [T: Bind] Holder<T>`: a generic class, bounds in brackets.
/// - `enum Color`: types implementing [`BindEnum`](crate::info::BindEnum).
/// - `scalar Money`: types converted as a whole by a registered converter.
///
/// # Examples
///
/// ```
/// use jb_bind::{impl_bind, Bind, info::{BindClass, ClassBuilder, TypeKind}};
///
/// struct Holder<T> { value: T }
///
/// impl<T: Bind> BindClass for Holder<T> {
///     fn describe(class: &mut ClassBuilder<Self>) {
///         class.type_param::<T>("T");
///         class.field("value", |h| &h.value, |h| &mut h.value);
///     }
/// }
///
/// impl_bind!(class [T: Bind] Holder<T>);
///
/// struct Money(i64);
/// impl_bind!(scalar Money);
///
/// assert_eq!(Holder::<String>::type_info().kind(), TypeKind::Class);
/// assert_eq!(Money::type_info().kind(), TypeKind::Scalar);
/// ```
#[macro_export]
macro_rules! impl_bind {
    (class [$($generics:tt)*] $ty:ty) => {
        impl<$($generics)*> $crate::Bind for $ty {
            fn type_info() -> $crate::info::TypeInfo {
                $crate::info::TypeInfo::Class($crate::info::ClassInfo::of::<Self>())
            }
        }
    };
    (class $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Bind for $ty {
                fn type_info() -> $crate::info::TypeInfo {
                    $crate::info::TypeInfo::Class($crate::info::ClassInfo::of::<Self>())
                }
            }
        )+
    };
    (enum $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Bind for $ty {
                fn type_info() -> $crate::info::TypeInfo {
                    $crate::info::TypeInfo::Enum($crate::info::EnumInfo::of::<Self>())
                }
            }
        )+
    };
    (scalar $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Bind for $ty {
                fn type_info() -> $crate::info::TypeInfo {
                    $crate::info::TypeInfo::Scalar($crate::info::ScalarInfo::of::<Self>())
                }
            }
        )+
    };
}

/// Submits a class for eager model building by every mapper.
///
/// Classes submitted here are built when [`MapperBuilder::build`] runs, so
/// declaration mistakes fail at start-up instead of on first use.
/// Requires the `auto_register` feature.
///
/// ```ignore
/// jb_bind::submit_class!(my_app::Customer);
/// ```
///
/// [`MapperBuilder::build`]: crate::MapperBuilder::build
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_class {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::__macro_exports::AutoRegistration::new(<$ty as $crate::Bind>::type_info)
        }
    };
}
