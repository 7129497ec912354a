use core::any::Any;
use core::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use jb_stream::{JsonSink, JsonSource, StreamError, ValueSink};
use serde_json::Value;

use crate::binder::{Engine, ReadDriver, WriteDriver};
use crate::info::{Bind, DynValue, Type, TypeRef};
use crate::model::ClassModel;
use crate::resolve::{Bindings, ResolvedType, resolve};
use crate::{BindError, MapperBuilder};

// -----------------------------------------------------------------------------
// Mapper

/// An immutable, configured binding engine.
///
/// A mapper is `Send + Sync`: share it behind an [`Arc`] and call it from
/// any number of threads. Each call obtains its own parser or generator;
/// only the class-model cache is shared.
///
/// # Examples
///
/// ```
/// use jb_bind::{impl_bind, info::{BindClass, ClassBuilder}, Mapper};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl BindClass for Point {
///     fn describe(class: &mut ClassBuilder<Self>) {
///         class.default_constructor();
///         class.field("x", |p| &p.x, |p| &mut p.x);
///         class.field("y", |p| &p.y, |p| &mut p.y);
///     }
/// }
///
/// impl_bind!(class Point);
///
/// let mapper = Mapper::new().unwrap();
/// let json = mapper.write_string(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(json, r#"{"x":1,"y":2}"#);
///
/// let point: Point = mapper.read_str(r#"{"y":5,"x":"4","z":0}"#).unwrap();
/// assert_eq!(point, Point { x: 4, y: 5 });
/// ```
pub struct Mapper {
    engine: Engine,
}

impl Mapper {
    /// A mapper with the default configuration.
    pub fn new() -> Result<Self, BindError> {
        MapperBuilder::new().build()
    }

    #[inline]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    #[inline]
    pub(crate) fn from_engine(engine: Engine) -> Self {
        Self { engine }
    }

    /// The cached model of class `T`, built on first use.
    pub fn class_model<T: Bind>(&self) -> Result<Arc<ClassModel>, BindError> {
        let info = T::type_info();
        let class = info.as_class().ok_or_else(|| {
            BindError::configuration(format!("`{}` is not a class", Type::of::<T>().name()))
        })?;
        self.engine.model(class)
    }

    /// Number of class models built so far.
    pub fn cached_models(&self) -> usize {
        self.engine.models.len()
    }

    // -------------------------------------------------------------------------
    // Write

    /// Writes `value` as compact or pretty JSON text, per configuration.
    pub fn write_string<T: Bind>(&self, value: &T) -> Result<String, BindError> {
        let ty = resolve_root::<T>()?;
        self.write_text(value, &ty)
    }

    /// Writes `value` into `out` through a buffered generator.
    pub fn write_to<T: Bind, W: Write>(&self, value: &T, out: W) -> Result<W, BindError> {
        let ty = resolve_root::<T>()?;
        let mut sink = self.engine.generator.create(out);
        WriteDriver::new(&self.engine, &mut sink).write_root(value, &ty)?;
        Ok(sink.into_inner()?)
    }

    /// Pushes the events of `value` into a caller-supplied sink.
    pub fn write_with<T: Bind>(&self, value: &T, sink: &mut dyn JsonSink) -> Result<(), BindError> {
        let ty = resolve_root::<T>()?;
        WriteDriver::new(&self.engine, sink).write_root(value, &ty)
    }

    /// Converts `value` into a document value.
    pub fn to_value<T: Bind>(&self, value: &T) -> Result<Value, BindError> {
        let ty = resolve_root::<T>()?;
        let mut sink = ValueSink::new();
        WriteDriver::new(&self.engine, &mut sink).write_root(value, &ty)?;
        Ok(sink.into_value()?)
    }

    /// Writes a value whose type is only known at run time.
    pub fn write_dyn(&self, value: &dyn Any, ty: &TypeRef) -> Result<String, BindError> {
        let ty = resolve_declared(ty)?;
        if value.type_id() != ty.ty().id() {
            return Err(BindError::mismatch(ty.ty()).at(""));
        }
        self.write_text(value, &ty)
    }

    fn write_text(&self, value: &dyn Any, ty: &ResolvedType) -> Result<String, BindError> {
        let mut sink = self.engine.generator.create(Vec::new());
        WriteDriver::new(&self.engine, &mut sink).write_root(value, ty)?;
        let bytes = sink.into_inner()?;
        String::from_utf8(bytes)
            .map_err(|e| StreamError::Io(io::Error::new(io::ErrorKind::InvalidData, e)).into())
    }

    // -------------------------------------------------------------------------
    // Read

    /// Reads JSON text as a `T`.
    pub fn read_str<T: Bind>(&self, text: &str) -> Result<T, BindError> {
        let mut source = self.engine.parser.from_str(text)?;
        self.read_with(&mut source)
    }

    pub fn read_slice<T: Bind>(&self, bytes: &[u8]) -> Result<T, BindError> {
        let mut source = self.engine.parser.from_slice(bytes)?;
        self.read_with(&mut source)
    }

    /// Reads the whole content of `reader` as a `T`.
    pub fn read_from<T: Bind, R: Read>(&self, reader: R) -> Result<T, BindError> {
        let mut source = self.engine.parser.from_reader(reader)?;
        self.read_with(&mut source)
    }

    /// Binds a document value to a `T`.
    pub fn from_value<T: Bind>(&self, value: Value) -> Result<T, BindError> {
        let mut source = self.engine.parser.from_value(value);
        self.read_with(&mut source)
    }

    /// Pulls one document from a caller-supplied source.
    pub fn read_with<T: Bind>(&self, source: &mut dyn JsonSource) -> Result<T, BindError> {
        let ty = resolve_root::<T>()?;
        let value = ReadDriver::new(&self.engine, source).read_root(&ty)?;
        value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| BindError::mismatch(ty.ty()).at(""))
    }

    /// Reads a value whose type is only known at run time.
    pub fn read_dyn(&self, text: &str, ty: &TypeRef) -> Result<DynValue, BindError> {
        let ty = resolve_declared(ty)?;
        let mut source = self.engine.parser.from_str(text)?;
        ReadDriver::new(&self.engine, &mut source).read_root(&ty)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("access", &self.engine.settings.access)
            .field("naming", &self.engine.settings.naming)
            .field("version", &self.engine.policy.version())
            .field("skip_null", &self.engine.skip_null)
            .field("registry", &self.engine.registry)
            .finish_non_exhaustive()
    }
}

fn resolve_root<T: Bind>() -> Result<ResolvedType, BindError> {
    resolve_declared(&TypeRef::of::<T>())
}

fn resolve_declared(declared: &TypeRef) -> Result<ResolvedType, BindError> {
    resolve(declared, &Bindings::new()).map_err(|e| BindError::TypeResolution {
        class: declared.to_string(),
        property: "<root>".to_owned(),
        reason: e.to_string(),
    })
}
