use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use jb_utils::TypeIdMap;
use serde_json::Value;

use crate::BindError;
use crate::convert::converter::{invalid, raw_text};
use crate::convert::{Converter, TypedConverter, builtin, typed};
use crate::info::{DynValue, EnumInfo, TypeInfo};

type Matcher = Arc<dyn Fn(&TypeInfo) -> bool + Send + Sync>;

// -----------------------------------------------------------------------------
// Resolution

/// Outcome of a registry lookup.
pub enum Resolution<'a> {
    Converter(&'a dyn Converter),
    /// No converter registered; converted through its declared constants.
    Enum(&'a EnumInfo),
    /// Recursed through the binder: optionals, sequences, maps and classes.
    Structural,
    /// A scalar with no converter.
    Unsupported,
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converter(_) => f.write_str("Converter(..)"),
            Self::Enum(info) => f.debug_tuple("Enum").field(info.ty()).finish(),
            Self::Structural => f.write_str("Structural"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

// -----------------------------------------------------------------------------
// ConverterRegistry

/// Converters by type, resolved by specificity.
///
/// Lookup order: exact type, then the matchers in registration order, then
/// the enum fallback, then structural recursion. Registering a type again
/// replaces the previous converter, built-ins included.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    exact: TypeIdMap<Arc<dyn Converter>>,
    matchers: Vec<(Matcher, Arc<dyn Converter>)>,
}

impl ConverterRegistry {
    /// A registry without any converter.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in converter enabled by cargo features.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        builtin::install(&mut registry);
        registry
    }

    /// Registers `converter` for exactly `T`.
    pub fn insert<T: Any>(&mut self, converter: Arc<dyn Converter>) {
        self.exact.insert_type::<T>(converter);
    }

    pub fn insert_typed<T: Any, C: TypedConverter<T>>(&mut self, converter: C) {
        self.insert::<T>(typed::<T, C>(converter));
    }

    /// Registers `converter` for every type accepted by `matches` that has
    /// no exact converter.
    pub fn push_matcher<F>(&mut self, matches: F, converter: Arc<dyn Converter>)
    where
        F: Fn(&TypeInfo) -> bool + Send + Sync + 'static,
    {
        self.matchers.push((Arc::new(matches), converter));
    }

    #[inline]
    pub fn contains(&self, ty: TypeId) -> bool {
        self.exact.contains(&ty)
    }

    pub fn lookup<'a>(&'a self, info: &'a TypeInfo) -> Resolution<'a> {
        if let Some(converter) = self.exact.get(&info.ty().id()) {
            return Resolution::Converter(&**converter);
        }
        if let Some((_, converter)) = self.matchers.iter().find(|(matches, _)| matches(info)) {
            return Resolution::Converter(&**converter);
        }
        match info {
            TypeInfo::Enum(info) => Resolution::Enum(info),
            TypeInfo::Scalar(_) => Resolution::Unsupported,
            TypeInfo::Optional(_)
            | TypeInfo::Sequence(_)
            | TypeInfo::Map(_)
            | TypeInfo::Class(_) => Resolution::Structural,
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("exact", &self.exact.len())
            .field("matchers", &self.matchers.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Enum fallback

pub(crate) fn enum_to_json(info: &EnumInfo, value: &dyn Any) -> Result<Value, BindError> {
    info.to_wire(value)
        .map(|name| Value::String(name.to_owned()))
        .ok_or_else(|| {
            BindError::conversion("<value>", info.ty().path(), "not a declared constant")
        })
}

/// Exact, case-sensitive match of the wire name.
pub(crate) fn enum_from_json(info: &EnumInfo, json: &Value) -> Result<DynValue, BindError> {
    let text = json
        .as_str()
        .ok_or_else(|| invalid::<str>(json, "an enum constant must be a string"))?;
    info.from_wire(text).ok_or_else(|| {
        BindError::conversion(
            raw_text(json),
            info.ty().path(),
            format!("unknown constant, expected one of {:?}", info.names()),
        )
    })
}

pub(crate) fn unsupported(info: &TypeInfo) -> BindError {
    BindError::conversion(
        "<value>",
        info.ty().path(),
        "no converter registered for this scalar type",
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::convert::{ConvertContext, from_fns};
    use crate::info::{BindEnum, EnumConstant};
    use crate::{Bind, ErrorKind, impl_bind};

    #[derive(Clone, Copy, PartialEq, Debug)]
    enum MyEnum {
        One,
        Two,
        Three,
    }

    impl BindEnum for MyEnum {
        const CONSTANTS: &'static [EnumConstant<Self>] = &[
            EnumConstant::new("ONE", MyEnum::One),
            EnumConstant::new("TWO", MyEnum::Two),
            EnumConstant::new("THREE", MyEnum::Three),
        ];
    }

    impl_bind!(enum MyEnum);

    struct Opaque;
    impl_bind!(scalar Opaque);

    #[test]
    fn lookup_order() {
        let mut registry = ConverterRegistry::with_builtins();
        assert!(matches!(registry.lookup(&i32::type_info()), Resolution::Converter(_)));
        assert!(matches!(registry.lookup(&MyEnum::type_info()), Resolution::Enum(_)));
        assert!(matches!(registry.lookup(&Vec::<i32>::type_info()), Resolution::Structural));
        assert!(matches!(registry.lookup(&Vec::<u8>::type_info()), Resolution::Converter(_)));
        assert!(matches!(registry.lookup(&Opaque::type_info()), Resolution::Unsupported));

        registry.push_matcher(
            |info| info.ty().is::<Opaque>(),
            from_fns::<Opaque, _, _>(|_, _| Ok(json!("opaque")), |_, _| Ok(Opaque)),
        );
        assert!(matches!(registry.lookup(&Opaque::type_info()), Resolution::Converter(_)));
    }

    #[test]
    fn user_converter_replaces_builtin() {
        let mut registry = ConverterRegistry::with_builtins();
        registry.insert::<i32>(from_fns::<i32, _, _>(|v, _| Ok(json!(format!("#{v}"))), |_, _| Ok(0)));
        let info = i32::type_info();
        let Resolution::Converter(converter) = registry.lookup(&info) else {
            panic!("i32 has a converter");
        };
        let cx = ConvertContext::default();
        assert_eq!(converter.to_json(&7_i32, &cx).unwrap(), json!("#7"));
    }

    #[test]
    fn unknown_enum_constant_fails() {
        let TypeInfo::Enum(info) = MyEnum::type_info() else {
            panic!("enum");
        };
        let value = enum_from_json(&info, &json!("TWO")).unwrap();
        assert_eq!(value.downcast_ref::<MyEnum>(), Some(&MyEnum::Two));

        let err = enum_from_json(&info, &json!("UNKNOWN")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("UNKNOWN"));
        assert!(err.to_string().contains("MyEnum"));
        assert!(enum_from_json(&info, &json!("two")).is_err());

        assert_eq!(enum_to_json(&info, &MyEnum::Three).unwrap(), json!("THREE"));
    }
}
