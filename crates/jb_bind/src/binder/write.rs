use core::any::Any;

use jb_stream::JsonSink;
use log::trace;

use super::{BindingContext, Engine};
use crate::convert::{Converter, Resolution, enum_to_json, unsupported};
use crate::info::{ClassInfo, TypeInfo};
use crate::resolve::ResolvedType;
use crate::{AccessSide, BindError};

// -----------------------------------------------------------------------------
// WriteDriver

/// Writes one value into a [`JsonSink`].
///
/// Resolution order for every value: the property converter, then the
/// registry (exact type, matchers, enum constants), then structural
/// recursion into optionals, sequences, maps and classes.
pub(crate) struct WriteDriver<'a, 's> {
    engine: &'a Engine,
    cx: BindingContext<'a>,
    sink: &'s mut dyn JsonSink,
}

impl<'a, 's> WriteDriver<'a, 's> {
    pub fn new(engine: &'a Engine, sink: &'s mut dyn JsonSink) -> Self {
        Self {
            engine,
            cx: BindingContext::new(&engine.policy),
            sink,
        }
    }

    /// Writes `value`, a value of type `ty`, as the whole document.
    pub fn write_root(mut self, value: &dyn Any, ty: &ResolvedType) -> Result<(), BindError> {
        self.write(value, ty, None)?;
        self.sink.flush()?;
        Ok(())
    }

    fn write(
        &mut self,
        value: &dyn Any,
        ty: &ResolvedType,
        converter: Option<&dyn Converter>,
    ) -> Result<(), BindError> {
        let engine = self.engine;
        let resolution = match (converter, ty.info()) {
            (Some(converter), info) if !matches!(info, TypeInfo::Optional(_)) => {
                Resolution::Converter(converter)
            }
            (_, info) => engine.registry.lookup(info),
        };

        match resolution {
            Resolution::Converter(converter) => {
                let json = converter
                    .to_json(value, &engine.convert)
                    .map_err(|e| self.cx.locate(e))?;
                self.sink.value(&json)?;
            }
            Resolution::Enum(info) => {
                let json = enum_to_json(info, value).map_err(|e| self.cx.locate(e))?;
                self.sink.value(&json)?;
            }
            Resolution::Unsupported => return Err(self.cx.locate(unsupported(ty.info()))),
            Resolution::Structural => self.write_structure(value, ty, converter)?,
        }
        Ok(())
    }

    fn write_structure(
        &mut self,
        value: &dyn Any,
        ty: &ResolvedType,
        converter: Option<&dyn Converter>,
    ) -> Result<(), BindError> {
        let mismatch = || BindError::mismatch(ty.ty());
        match ty.info() {
            TypeInfo::Optional(info) => match info.get(value) {
                None => Err(self.cx.locate(mismatch())),
                Some(None) => Ok(self.sink.null()?),
                Some(Some(inner)) => self.write(inner, ty.item()?, converter),
            },
            TypeInfo::Sequence(info) => {
                let items = info.items(value).ok_or_else(|| self.cx.locate(mismatch()))?;
                let item_ty = ty.item()?;
                self.sink.start_array()?;
                for (index, item) in items.into_iter().enumerate() {
                    self.cx.push_index(index);
                    self.write(item, item_ty, None)?;
                    self.cx.pop();
                }
                Ok(self.sink.end_array()?)
            }
            TypeInfo::Map(info) => {
                let entries = info.entries(value).ok_or_else(|| self.cx.locate(mismatch()))?;
                let value_ty = ty.map_value()?;
                self.sink.start_object()?;
                for (key, item) in entries {
                    if self.engine.skip_null && is_absent(item, value_ty) {
                        continue;
                    }
                    self.sink.key(key)?;
                    self.cx.push_key(key);
                    self.write(item, value_ty, None)?;
                    self.cx.pop();
                }
                Ok(self.sink.end_object()?)
            }
            TypeInfo::Class(info) => self.write_object(value, info),
            TypeInfo::Scalar(_) | TypeInfo::Enum(_) => Err(self.cx.locate(unsupported(ty.info()))),
        }
    }

    fn write_object(&mut self, value: &dyn Any, info: &ClassInfo) -> Result<(), BindError> {
        let model = self.engine.model(info)?;
        let policy = self.cx.policy();

        self.sink.start_object()?;
        for property in model.readers() {
            if !policy.version_allows(&property.versions) {
                trace!("`{}`: `{}` excluded by version", model.ty().name(), property.wire);
                continue;
            }
            let Some(read) = &property.read else {
                continue;
            };
            let held = read(value).ok_or_else(|| {
                self.cx
                    .locate(BindError::access(model.ty(), property.name, AccessSide::Reader))
            })?;
            let current = held.as_any();

            if self.engine.skip_null && is_absent(current, &property.ty) {
                trace!("`{}`: `{}` is absent", model.ty().name(), property.wire);
                continue;
            }
            if !policy.filter_allows(&property.wire, current) {
                trace!("`{}`: `{}` rejected by filter", model.ty().name(), property.wire);
                continue;
            }

            self.sink.key(&property.wire)?;
            self.cx.push_key(&property.wire);
            self.write(current, &property.ty, property.converter.as_deref())?;
            self.cx.pop();
        }
        Ok(self.sink.end_object()?)
    }
}

/// `true` for an empty optional.
fn is_absent(value: &dyn Any, ty: &ResolvedType) -> bool {
    match ty.info() {
        TypeInfo::Optional(info) => matches!(info.get(value), Some(None)),
        _ => false,
    }
}
