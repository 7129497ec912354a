use jb_stream::{JsonEvent, JsonSource};
use log::trace;

use super::{BindingContext, Engine, event_text, unexpected};
use crate::convert::{Converter, Resolution, enum_from_json, unsupported};
use crate::info::{ClassInfo, CreatorArgs, DynValue, TypeInfo};
use crate::model::{ClassModel, PropertyDescriptor};
use crate::resolve::ResolvedType;
use crate::{AccessSide, BindError};

// -----------------------------------------------------------------------------
// ReadDriver

/// Reads one value from a [`JsonSource`].
///
/// A JSON `null` read for a non-optional target yields `None`: properties
/// keep their current value, map entries are dropped, sequence elements and
/// whole documents fail.
pub(crate) struct ReadDriver<'a, 's> {
    engine: &'a Engine,
    cx: BindingContext<'a>,
    source: &'s mut dyn JsonSource,
}

impl<'a, 's> ReadDriver<'a, 's> {
    pub fn new(engine: &'a Engine, source: &'s mut dyn JsonSource) -> Self {
        Self {
            engine,
            cx: BindingContext::new(&engine.policy),
            source,
        }
    }

    /// Reads the whole document as a value of type `ty`.
    pub fn read_root(mut self, ty: &ResolvedType) -> Result<DynValue, BindError> {
        let first = self.source.expect_event()?;
        match self.read(first, ty, None)? {
            Some(value) => Ok(value),
            None => Err(BindError::conversion(
                "null",
                ty.ty().path(),
                "the document is null but the target is not optional",
            )
            .at("")),
        }
    }

    fn read(
        &mut self,
        first: JsonEvent,
        ty: &ResolvedType,
        converter: Option<&dyn Converter>,
    ) -> Result<Option<DynValue>, BindError> {
        if let TypeInfo::Optional(info) = ty.info() {
            if first == JsonEvent::Null {
                return Ok(Some(info.empty()));
            }
            if !self.engine.registry.contains(ty.ty().id()) {
                let Some(inner) = self.read(first, ty.item()?, converter)? else {
                    return Ok(Some(info.empty()));
                };
                let wrapped = info
                    .wrap(inner)
                    .ok_or_else(|| self.cx.locate(BindError::mismatch(ty.ty())))?;
                return Ok(Some(wrapped));
            }
        }
        if first == JsonEvent::Null {
            return Ok(None);
        }

        let engine = self.engine;
        let resolution = match converter {
            Some(converter) => Resolution::Converter(converter),
            None => engine.registry.lookup(ty.info()),
        };

        match resolution {
            Resolution::Converter(converter) => {
                let json = self.source.value_from(first)?;
                converter
                    .from_json(&json, &engine.convert)
                    .map(Some)
                    .map_err(|e| self.cx.locate(e))
            }
            Resolution::Enum(info) => {
                let json = self.source.value_from(first)?;
                enum_from_json(info, &json)
                    .map(Some)
                    .map_err(|e| self.cx.locate(e))
            }
            Resolution::Unsupported => {
                self.source.skip_from(first)?;
                Err(self.cx.locate(unsupported(ty.info())))
            }
            Resolution::Structural => self.read_structure(first, ty).map(Some),
        }
    }

    fn read_structure(&mut self, first: JsonEvent, ty: &ResolvedType) -> Result<DynValue, BindError> {
        match ty.info() {
            TypeInfo::Sequence(info) => {
                self.expect_start(&first, JsonEvent::StartArray, ty, "expected a JSON array")?;
                let item_ty = ty.item()?;
                let mut items = Vec::new();
                loop {
                    let next = self.source.expect_event()?;
                    if next == JsonEvent::EndArray {
                        break;
                    }
                    self.cx.push_index(items.len());
                    let Some(item) = self.read(next, item_ty, None)? else {
                        return Err(self.cx.locate(BindError::conversion(
                            "null",
                            item_ty.ty().path(),
                            "null element in a sequence of non-optional values",
                        )));
                    };
                    items.push(item);
                    self.cx.pop();
                }
                info.build(items).map_err(|e| self.cx.locate(e))
            }
            TypeInfo::Map(info) => {
                self.expect_start(&first, JsonEvent::StartObject, ty, "expected a JSON object")?;
                let value_ty = ty.map_value()?;
                let mut entries = Vec::new();
                loop {
                    let key = match self.source.expect_event()? {
                        JsonEvent::EndObject => break,
                        JsonEvent::Key(key) => key,
                        other => return Err(unexpected(&other, self.cx.depth())),
                    };
                    let next = self.source.expect_event()?;
                    self.cx.push_key(&key);
                    if let Some(value) = self.read(next, value_ty, None)? {
                        entries.push((key, value));
                    }
                    self.cx.pop();
                }
                info.build(entries).map_err(|e| self.cx.locate(e))
            }
            TypeInfo::Class(info) => {
                self.expect_start(&first, JsonEvent::StartObject, ty, "expected a JSON object")?;
                self.read_object(info)
            }
            TypeInfo::Optional(_) | TypeInfo::Scalar(_) | TypeInfo::Enum(_) => {
                self.source.skip_from(first)?;
                Err(self.cx.locate(unsupported(ty.info())))
            }
        }
    }

    fn expect_start(
        &self,
        first: &JsonEvent,
        expected: JsonEvent,
        ty: &ResolvedType,
        reason: &str,
    ) -> Result<(), BindError> {
        if *first == expected {
            return Ok(());
        }
        let error = BindError::conversion(event_text(first), ty.ty().path(), reason);
        Err(self.cx.locate(error))
    }

    /// Reads the members of an object whose `{` was consumed.
    fn read_object(&mut self, info: &ClassInfo) -> Result<DynValue, BindError> {
        let model = self.engine.model(info)?;
        if model.creator().is_some() {
            return self.read_with_creator(&model);
        }

        let construct = model.constructor().ok_or_else(|| {
            self.cx.locate(BindError::instantiation(
                model.ty().path(),
                "no constructor or creator declared",
            ))
        })?;
        let mut instance = construct();

        while let Some(key) = self.next_key()? {
            let next = self.source.expect_event()?;
            let Some(property) = self.writer(&model, &key) else {
                self.source.skip_from(next)?;
                continue;
            };
            self.cx.push_key(&key);
            if let Some(value) = self.read(next, &property.ty, property.converter.as_deref())? {
                self.store(&model, property, &mut instance, value)?;
            }
            self.cx.pop();
        }
        Ok(instance)
    }

    /// Collects every creator parameter before the single factory call.
    ///
    /// Values for other writable properties are converted during the scan
    /// and stored once the instance exists.
    fn read_with_creator(&mut self, model: &ClassModel) -> Result<DynValue, BindError> {
        let Some(creator) = model.creator() else {
            return Err(self.cx.locate(BindError::instantiation(
                model.ty().path(),
                "no creator declared",
            )));
        };
        let mut params: Vec<Option<DynValue>> = creator.params.iter().map(|_| None).collect();
        let mut deferred = Vec::new();

        while let Some(key) = self.next_key()? {
            let next = self.source.expect_event()?;
            if let Some(index) = creator.position(&key, model.is_case_insensitive()) {
                self.cx.push_key(&key);
                if let Some(value) = self.read(next, &creator.params[index].ty, None)? {
                    params[index] = Some(value);
                }
                self.cx.pop();
            } else if let Some(property) = self.writer(model, &key) {
                self.cx.push_key(&key);
                if let Some(value) = self.read(next, &property.ty, property.converter.as_deref())? {
                    deferred.push((key, property, value));
                }
                self.cx.pop();
            } else {
                self.source.skip_from(next)?;
            }
        }

        let values = params
            .into_iter()
            .zip(&creator.params)
            .map(|(value, param)| {
                let value = value.unwrap_or_else(|| {
                    trace!("`{}`: creator parameter `{}` defaulted", model.ty().name(), param.name);
                    (param.default)()
                });
                (param.name, Some(value))
            })
            .collect();
        let mut args = CreatorArgs::new(*model.ty(), values);
        let mut instance = (creator.invoke)(&mut args).map_err(|e| self.cx.locate(e))?;

        for (key, property, value) in deferred {
            self.cx.push_key(&key);
            self.store(model, property, &mut instance, value)?;
            self.cx.pop();
        }
        Ok(instance)
    }

    /// The next key of the current object, `None` at its end.
    fn next_key(&mut self) -> Result<Option<String>, BindError> {
        match self.source.expect_event()? {
            JsonEvent::EndObject => Ok(None),
            JsonEvent::Key(key) => Ok(Some(key)),
            other => Err(unexpected(&other, self.cx.depth())),
        }
    }

    /// The writer bound to `key`, if any and within the version gate.
    fn writer<'m>(&self, model: &'m ClassModel, key: &str) -> Option<&'m PropertyDescriptor> {
        let Some(property) = model.writer(key) else {
            trace!("`{}`: no property for key `{key}`", model.ty().name());
            return None;
        };
        if !self.cx.policy().version_allows(&property.versions) {
            trace!("`{}`: `{key}` excluded by version", model.ty().name());
            return None;
        }
        Some(property)
    }

    fn store(
        &self,
        model: &ClassModel,
        property: &PropertyDescriptor,
        instance: &mut DynValue,
        value: DynValue,
    ) -> Result<(), BindError> {
        let access = || {
            self.cx
                .locate(BindError::access(model.ty(), property.name, AccessSide::Writer))
        };
        let write = property.write.as_ref().ok_or_else(access)?;
        write(&mut **instance, value).map_err(|_| access())
    }
}
