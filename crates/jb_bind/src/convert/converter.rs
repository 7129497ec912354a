use core::any::Any;
use core::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::BindError;
use crate::convert::ConvertContext;
use crate::info::{DynValue, Type};

// -----------------------------------------------------------------------------
// Converter

/// Bidirectional conversion between one Rust type and a JSON value.
///
/// The erased form stored by the registry and by property overrides.
/// Implement [`TypedConverter`] instead and wrap it with [`typed`].
///
/// Converters never see JSON `null`: absent values are handled by the binder.
pub trait Converter: Send + Sync + 'static {
    fn to_json(&self, value: &dyn Any, cx: &ConvertContext) -> Result<Value, BindError>;

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<DynValue, BindError>;
}

/// A [`Converter`] for values of type `T`.
///
/// # Examples
///
/// ```
/// use jb_bind::convert::{typed, ConvertContext, TypedConverter};
/// use jb_bind::BindError;
/// use serde_json::{json, Value};
///
/// struct Cents;
///
/// impl TypedConverter<u64> for Cents {
///     fn to_json(&self, value: &u64, _: &ConvertContext) -> Result<Value, BindError> {
///         Ok(json!(format!("{}.{:02}", value / 100, value % 100)))
///     }
///
///     fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<u64, BindError> {
///         let text = json.as_str().unwrap_or_default().replace('.', "");
///         text.parse().map_err(|_| BindError::conversion(json.to_string(), "u64", "not an amount"))
///     }
/// }
///
/// let converter = typed::<u64, _>(Cents);
/// let cx = ConvertContext::default();
/// assert_eq!(converter.to_json(&1234_u64, &cx).unwrap(), json!("12.34"));
/// let back = converter.from_json(&json!("12.34"), &cx).unwrap();
/// assert_eq!(back.downcast_ref::<u64>(), Some(&1234));
/// ```
pub trait TypedConverter<T: Any>: Send + Sync + 'static {
    fn to_json(&self, value: &T, cx: &ConvertContext) -> Result<Value, BindError>;

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<T, BindError>;
}

// -----------------------------------------------------------------------------
// Erasure

struct Typed<T, C> {
    inner: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any, C: TypedConverter<T>> Converter for Typed<T, C> {
    fn to_json(&self, value: &dyn Any, cx: &ConvertContext) -> Result<Value, BindError> {
        match value.downcast_ref::<T>() {
            Some(value) => self.inner.to_json(value, cx),
            None => Err(BindError::mismatch(&Type::of::<T>())),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<DynValue, BindError> {
        self.inner
            .from_json(json, cx)
            .map(|value| Box::new(value) as DynValue)
    }
}

/// Erases a typed converter.
#[inline]
pub fn typed<T: Any, C: TypedConverter<T>>(converter: C) -> Arc<dyn Converter> {
    Arc::new(Typed {
        inner: converter,
        _marker: PhantomData,
    })
}

struct FnConverter<To, From> {
    to: To,
    from: From,
}

impl<T, To, From> TypedConverter<T> for FnConverter<To, From>
where
    T: Any,
    To: Fn(&T, &ConvertContext) -> Result<Value, BindError> + Send + Sync + 'static,
    From: Fn(&Value, &ConvertContext) -> Result<T, BindError> + Send + Sync + 'static,
{
    #[inline]
    fn to_json(&self, value: &T, cx: &ConvertContext) -> Result<Value, BindError> {
        (self.to)(value, cx)
    }

    #[inline]
    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<T, BindError> {
        (self.from)(json, cx)
    }
}

/// Builds a converter from a pair of closures.
pub fn from_fns<T, To, From>(to: To, from: From) -> Arc<dyn Converter>
where
    T: Any,
    To: Fn(&T, &ConvertContext) -> Result<Value, BindError> + Send + Sync + 'static,
    From: Fn(&Value, &ConvertContext) -> Result<T, BindError> + Send + Sync + 'static,
{
    typed::<T, _>(FnConverter { to, from })
}

// -----------------------------------------------------------------------------
// Helpers shared by the built-ins

/// The text of a scalar, as it appears in an error message.
pub(crate) fn raw_text(json: &Value) -> String {
    match json {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A conversion error for `json` targeting `T`.
pub(crate) fn invalid<T: ?Sized + Any>(json: &Value, reason: impl Into<String>) -> BindError {
    BindError::conversion(raw_text(json), core::any::type_name::<T>(), reason)
}
