//! Class models: the cached property tables of a class.
//!
//! A [`ClassModel`] is built once per class and mapper, the first time the
//! class is met, from its [`ClassDecl`] and the declarations of all its
//! ancestors:
//!
//! 1. The leaf type parameters are bound to their natural types.
//! 2. Each `extends` level binds the parent parameters in terms of the child
//!    bindings, and composes the up-cast lenses down to the leaf.
//! 3. Members are collected ancestors first; a descendant member replaces an
//!    ancestor member of the same name and role.
//! 4. Every member type is resolved and checked against its storage type.
//! 5. The access policy picks the reader and writer of every property, and
//!    the naming strategy assigns wire names.

use core::any::TypeId;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use jb_utils::TypeIdMap;
use jb_utils::hash::FixedHashState;
use log::{debug, trace};

use crate::BindError;
use crate::access::{AccessPolicy, Member, Slot};
use crate::convert::{Converter, NumberFormat};
use crate::info::{ClassDecl, ClassInfo, ConstructFn, CreatorFn, DefaultFn, MemberMeta, ReadFn, Type};
use crate::info::{TypeInfo, UpMut, UpRef, WriteFn, chain_mut, chain_ref, lift_read, lift_write};
use crate::naming::{AttributeOrder, NamingStrategy};
use crate::policy::VersionRange;
use crate::resolve::{Bindings, ResolvedType, resolve};

/// Deepest class hierarchy accepted.
const MAX_HIERARCHY: usize = 64;

type PropertyMap = IndexMap<String, Arc<PropertyDescriptor>, FixedHashState>;

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// One side of one bindable property.
///
/// Descriptors listed in [`ClassModel::readers`] carry a read handle, those
/// in [`ClassModel::writers`] a write handle.
pub struct PropertyDescriptor {
    pub(crate) name: &'static str,
    pub(crate) wire: String,
    pub(crate) ty: ResolvedType,
    pub(crate) read: Option<ReadFn>,
    pub(crate) write: Option<WriteFn>,
    pub(crate) versions: VersionRange,
    pub(crate) converter: Option<Arc<dyn Converter>>,
}

impl PropertyDescriptor {
    /// The property identifier, before naming translation.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn wire_name(&self) -> &str {
        &self.wire
    }

    #[inline]
    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    #[inline]
    pub fn versions(&self) -> VersionRange {
        self.versions
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    #[inline]
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("wire", &self.wire)
            .field("ty", &self.ty.ty())
            .field("versions", &self.versions)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// CreatorDescriptor

pub(crate) struct CreatorParam {
    pub name: &'static str,
    pub ty: ResolvedType,
    pub default: DefaultFn,
}

/// The factory of a class and its named parameters.
pub struct CreatorDescriptor {
    pub(crate) invoke: CreatorFn,
    pub(crate) params: Vec<CreatorParam>,
}

impl CreatorDescriptor {
    /// Parameter names, in declaration order.
    pub fn param_names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    /// Index of parameter `key`, exact or ignoring ASCII case.
    pub(crate) fn position(&self, key: &str, case_insensitive: bool) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.name == key)
            .or_else(|| {
                case_insensitive
                    .then(|| self.params.iter().position(|p| p.name.eq_ignore_ascii_case(key)))
                    .flatten()
            })
    }
}

// -----------------------------------------------------------------------------
// ClassModel

/// Settings that shape class models.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModelSettings {
    pub access: AccessPolicy,
    pub naming: NamingStrategy,
    pub order: Option<AttributeOrder>,
}

/// The immutable, cached description of how a class binds.
pub struct ClassModel {
    ty: Type,
    bindings: Bindings,
    readers: PropertyMap,
    writers: PropertyMap,
    case_insensitive: bool,
    constructor: Option<ConstructFn>,
    creator: Option<CreatorDescriptor>,
}

struct Level {
    decl: ClassDecl,
    bindings: Bindings,
    up: Option<UpRef>,
    down: Option<UpMut>,
}

impl ClassModel {
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Type variable bindings of the class itself.
    #[inline]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Properties read from values on write, in emission order.
    pub fn readers(&self) -> impl ExactSizeIterator<Item = &PropertyDescriptor> {
        self.readers.values().map(|p| &**p)
    }

    /// Properties populated on read, in discovery order.
    pub fn writers(&self) -> impl ExactSizeIterator<Item = &PropertyDescriptor> {
        self.writers.values().map(|p| &**p)
    }

    /// Wire names of the readers, in emission order.
    pub fn reader_names(&self) -> Vec<&str> {
        self.readers.keys().map(String::as_str).collect()
    }

    pub fn writer_names(&self) -> Vec<&str> {
        self.writers.keys().map(String::as_str).collect()
    }

    /// The writer bound to JSON key `key`.
    pub fn writer(&self, key: &str) -> Option<&PropertyDescriptor> {
        if let Some(found) = self.writers.get(key) {
            return Some(found);
        }
        if self.case_insensitive {
            return self
                .writers
                .iter()
                .find(|(wire, _)| wire.eq_ignore_ascii_case(key))
                .map(|(_, p)| &**p);
        }
        None
    }

    #[inline]
    pub fn creator(&self) -> Option<&CreatorDescriptor> {
        self.creator.as_ref()
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    #[inline]
    pub(crate) fn constructor(&self) -> Option<&ConstructFn> {
        self.constructor.as_ref()
    }

    #[inline]
    pub(crate) fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub(crate) fn build(info: &ClassInfo, settings: &ModelSettings) -> Result<Self, BindError> {
        let class = *info.ty();
        let mut levels = vec![leaf_level(info.describe())?];

        while let Some(next) = parent_level(&class, levels.len(), levels.last())? {
            levels.push(next);
        }

        let leaf = &mut levels[0];
        let bindings = leaf.bindings.clone();
        let constructor = leaf.decl.constructor.take();
        let creator = match leaf.decl.creator.take() {
            None => None,
            Some(decl) => {
                let mut params = Vec::with_capacity(decl.params.len());
                for param in decl.params {
                    let ty = resolve(&param.ty, &bindings)
                        .map_err(|e| BindError::type_resolution(&class, param.name, e.to_string()))?;
                    params.push(CreatorParam {
                        name: param.name,
                        ty,
                        default: param.default,
                    });
                }
                Some(CreatorDescriptor {
                    invoke: decl.invoke,
                    params,
                })
            }
        };

        let mut slots: IndexMap<&'static str, Slot, FixedHashState> = IndexMap::default();
        for level in levels.into_iter().rev() {
            let owner = level.decl.ty;
            for decl in level.decl.members {
                let ty = resolve(&decl.declared, &level.bindings)
                    .map_err(|e| BindError::type_resolution(&owner, decl.name, e.to_string()))?;
                if *ty.ty() != decl.storage {
                    return Err(BindError::type_resolution(
                        &owner,
                        decl.name,
                        format!(
                            "declared type resolves to `{}` but the member stores `{}`",
                            ty.ty().name(),
                            decl.storage.name()
                        ),
                    ));
                }
                let member = Member {
                    name: decl.name,
                    role: decl.role,
                    visibility: decl.visibility,
                    ty,
                    read: lift(decl.read, &level.up, lift_read),
                    write: lift(decl.write, &level.down, lift_write),
                    view: lift(decl.view, &level.down, lift_write),
                    meta: decl.meta,
                };
                slots.entry(decl.name).or_default().put(member);
            }
        }

        let mut readers = PropertyMap::default();
        let mut writers = PropertyMap::default();
        for (&name, slot) in &slots {
            let meta = slot.meta();
            if meta.ignore {
                trace!("`{}::{name}` is transient", class.name());
                continue;
            }
            let wire = match &meta.rename {
                Some(rename) => rename.clone(),
                None => settings.naming.translate(name),
            };
            let selection = settings.access.select(&class, slot);
            if let Some((member, read)) = selection.reader {
                insert_unique(&class, &mut readers, PropertyDescriptor {
                    name,
                    wire: wire.clone(),
                    ty: member.ty.clone(),
                    read: Some(read),
                    write: None,
                    versions: meta.versions,
                    converter: property_converter(&class, name, &meta, &member.ty)?,
                })?;
            }
            if let Some((member, write)) = selection.writer {
                insert_unique(&class, &mut writers, PropertyDescriptor {
                    name,
                    wire,
                    ty: member.ty.clone(),
                    read: None,
                    write: Some(write),
                    versions: meta.versions,
                    converter: property_converter(&class, name, &meta, &member.ty)?,
                })?;
            }
        }

        if let Some(order) = &settings.order {
            readers.sort_by(|a, _, b, _| order.compare(a, b));
        }

        Ok(Self {
            ty: class,
            bindings,
            readers,
            writers,
            case_insensitive: settings.naming.is_case_insensitive(),
            constructor,
            creator,
        })
    }
}

impl fmt::Debug for ClassModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassModel")
            .field("ty", &self.ty)
            .field("readers", &self.reader_names())
            .field("writers", &self.writer_names())
            .field("creator", &self.creator.as_ref().map(CreatorDescriptor::param_names))
            .finish()
    }
}

fn leaf_level(decl: ClassDecl) -> Result<Level, BindError> {
    let mut bindings = Bindings::new();
    for param in &decl.params {
        let ty = resolve(&param.natural, &Bindings::new())
            .map_err(|e| BindError::type_resolution(&decl.ty, param.name, e.to_string()))?;
        bindings.insert(param.name, ty);
    }
    Ok(Level {
        decl,
        bindings,
        up: None,
        down: None,
    })
}

/// The level above `child`, its parameters bound through the child bindings.
fn parent_level(
    class: &Type,
    depth: usize,
    child: Option<&Level>,
) -> Result<Option<Level>, BindError> {
    let Some(child) = child else {
        return Ok(None);
    };
    let Some(parent) = &child.decl.parent else {
        return Ok(None);
    };
    if depth >= MAX_HIERARCHY {
        return Err(BindError::configuration(format!(
            "class hierarchy of `{class}` is deeper than {MAX_HIERARCHY} levels"
        )));
    }
    let info = (parent.info)();
    let Some(parent_class) = info.as_class() else {
        return Err(BindError::configuration(format!(
            "`{}` extends `{}`, which is not a class",
            child.decl.ty, parent.ty
        )));
    };
    let decl = parent_class.describe();
    if !parent.args.is_empty() && parent.args.len() != decl.params.len() {
        return Err(BindError::type_resolution(
            &child.decl.ty,
            "extends",
            format!(
                "`{}` takes {} type arguments, {} given",
                parent.ty.name(),
                decl.params.len(),
                parent.args.len()
            ),
        ));
    }

    let mut bindings = Bindings::new();
    for (index, param) in decl.params.iter().enumerate() {
        let declared = parent.args.get(index).unwrap_or(&param.natural);
        let ty = resolve(declared, &child.bindings)
            .map_err(|e| BindError::type_resolution(&child.decl.ty, "extends", e.to_string()))?;
        if let Some(natural) = param.natural.info()
            && natural.ty() != ty.ty()
        {
            return Err(BindError::type_resolution(
                &child.decl.ty,
                "extends",
                format!(
                    "`{}` of `{}` bound to `{}` but the parent is `{}`",
                    param.name,
                    parent.ty.name(),
                    ty.ty().name(),
                    natural.ty().name()
                ),
            ));
        }
        bindings.insert(param.name, ty);
    }

    let up = match &child.up {
        None => parent.up.clone(),
        Some(up) => chain_ref(up, &parent.up),
    };
    let down = match &child.down {
        None => parent.up_mut.clone(),
        Some(down) => chain_mut(down, &parent.up_mut),
    };
    Ok(Some(Level {
        decl,
        bindings,
        up: Some(up),
        down: Some(down),
    }))
}

fn lift<H, L>(handle: Option<H>, lens: &Option<L>, apply: fn(&L, H) -> H) -> Option<H> {
    match (handle, lens) {
        (Some(handle), Some(lens)) => Some(apply(lens, handle)),
        (handle, _) => handle,
    }
}

/// The explicit converter of a property, else one built from its number format.
fn property_converter(
    class: &Type,
    name: &str,
    meta: &MemberMeta,
    ty: &ResolvedType,
) -> Result<Option<Arc<dyn Converter>>, BindError> {
    let (Some((pattern, locale)), None) = (&meta.number_format, &meta.converter) else {
        return Ok(meta.converter.clone());
    };
    let format = NumberFormat::new(pattern, locale.as_deref())
        .map_err(|e| BindError::type_resolution(class, name, e.to_string()))?;
    let leaf = match ty.info() {
        TypeInfo::Optional(_) => ty.item()?,
        _ => ty,
    };
    match format.converter_for(leaf.ty()) {
        Some(converter) => Ok(Some(converter)),
        None => Err(BindError::type_resolution(
            class,
            name,
            format!("number format `{pattern}` needs a numeric type, found `{}`", leaf.ty().name()),
        )),
    }
}

fn insert_unique(
    class: &Type,
    map: &mut PropertyMap,
    descriptor: PropertyDescriptor,
) -> Result<(), BindError> {
    if let Some(existing) = map.get(&descriptor.wire) {
        return Err(BindError::configuration(format!(
            "`{}`: properties `{}` and `{}` share the wire name `{}`",
            class.name(),
            existing.name,
            descriptor.name,
            descriptor.wire
        )));
    }
    map.insert(descriptor.wire.clone(), Arc::new(descriptor));
    Ok(())
}

// -----------------------------------------------------------------------------
// ModelCache

/// Class models of one mapper, keyed by type.
///
/// Concurrent first builds of the same class are tolerated: both compute an
/// equivalent model and the last insert wins.
#[derive(Default)]
pub(crate) struct ModelCache {
    models: RwLock<TypeIdMap<Arc<ClassModel>>>,
}

impl ModelCache {
    pub fn get_or_build(
        &self,
        info: &ClassInfo,
        settings: &ModelSettings,
    ) -> Result<Arc<ClassModel>, BindError> {
        let id = info.ty().id();
        match self.get(id) {
            Some(model) => Ok(model),
            None => {
                let model = Arc::new(ClassModel::build(info, settings)?);
                debug!(
                    "built class model of `{}`: {} readers, {} writers{}",
                    info.ty().name(),
                    model.readers.len(),
                    model.writers.len(),
                    if model.creator.is_some() { ", creator" } else { "" }
                );
                self.insert(id, model.clone());
                Ok(model)
            }
        }
    }

    #[inline(never)]
    fn get(&self, id: TypeId) -> Option<Arc<ClassModel>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    #[inline(never)]
    fn insert(&self, id: TypeId, model: Arc<ClassModel>) {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, model);
    }

    pub fn len(&self) -> usize {
        self.models.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessMode;
    use crate::info::{BindClass, ClassBuilder, TypeRef};
    use crate::{Bind, ErrorKind, impl_bind};

    #[derive(Default)]
    struct Base<ID> {
        id: ID,
        note: String,
    }

    impl<ID: Bind + Default> BindClass for Base<ID> {
        fn describe(class: &mut ClassBuilder<Self>) {
            class.type_param::<ID>("ID");
            class.field("id", |b| &b.id, |b| &mut b.id).declared(TypeRef::var("ID"));
            class.field("note", |b| &b.note, |b| &mut b.note);
        }
    }

    impl_bind!(class [ID: Bind + Default] Base<ID>);

    #[derive(Default)]
    struct Leaf {
        base: Base<i64>,
        name: String,
        secret: String,
    }

    impl BindClass for Leaf {
        fn describe(class: &mut ClassBuilder<Self>) {
            class.default_constructor();
            class
                .extends::<Base<i64>>(|l| &l.base, |l| &mut l.base)
                .args([TypeRef::of::<i64>()]);
            class.field("name", |l| &l.name, |l| &mut l.name);
            class.field("note", |l| &l.name, |l| &mut l.name).rename("leafNote");
            class.field("secret", |l| &l.secret, |l| &mut l.secret).ignore();
        }
    }

    impl_bind!(class Leaf);

    fn build<T: Bind>(settings: &ModelSettings) -> Result<ClassModel, BindError> {
        let info = T::type_info();
        ClassModel::build(info.as_class().unwrap(), settings)
    }

    #[test]
    fn ancestors_first_descendant_replaces() {
        let model = build::<Leaf>(&ModelSettings::default()).unwrap();
        assert_eq!(model.reader_names(), vec!["id", "leafNote", "name"]);
        assert_eq!(model.writer_names(), vec!["id", "leafNote", "name"]);
        assert!(model.readers().next().unwrap().ty().ty().is::<i64>());
        assert!(model.has_constructor());
    }

    #[test]
    fn lifted_handles_reach_the_parent() {
        let model = build::<Leaf>(&ModelSettings::default()).unwrap();
        let mut leaf = Leaf::default();
        let id = model.writer("id").unwrap();
        (id.write.as_ref().unwrap())(&mut leaf, Box::new(160883_i64)).unwrap();
        assert_eq!(leaf.base.id, 160883);
        let read = model.readers().next().unwrap().read.as_ref().unwrap();
        let held = read(&leaf).unwrap();
        assert_eq!(held.as_any().downcast_ref::<i64>(), Some(&160883));
    }

    #[test]
    fn ordering_and_naming() {
        let settings = ModelSettings {
            naming: NamingStrategy::UpperCamelCase,
            order: Some(AttributeOrder::reverse()),
            ..ModelSettings::default()
        };
        let model = build::<Leaf>(&settings).unwrap();
        assert_eq!(model.reader_names(), vec!["leafNote", "Name", "Id"]);
        assert_eq!(model.writer_names(), vec!["Id", "leafNote", "Name"]);
    }

    #[test]
    fn case_insensitive_lookup() {
        let settings = ModelSettings {
            naming: NamingStrategy::CaseInsensitive,
            ..ModelSettings::default()
        };
        let model = build::<Leaf>(&settings).unwrap();
        assert_eq!(model.writer("NAME").map(PropertyDescriptor::name), Some("name"));
        let strict = build::<Leaf>(&ModelSettings::default()).unwrap();
        assert!(strict.writer("NAME").is_none());
    }

    #[test]
    fn method_mode_without_accessors_is_empty() {
        let settings = ModelSettings {
            access: AccessPolicy::new(AccessMode::Method),
            ..ModelSettings::default()
        };
        let model = build::<Leaf>(&settings).unwrap();
        assert_eq!(model.readers().len(), 0);
    }

    struct Clash {
        a: String,
        b: String,
    }

    impl BindClass for Clash {
        fn describe(class: &mut ClassBuilder<Self>) {
            class.field("a", |c| &c.a, |c| &mut c.a).rename("x");
            class.field("b", |c| &c.b, |c| &mut c.b).rename("x");
        }
    }

    impl_bind!(class Clash);

    #[test]
    fn duplicate_wire_name_is_configuration_error() {
        let err = build::<Clash>(&ModelSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("`x`"));
    }

    struct Unbound {
        value: String,
    }

    impl BindClass for Unbound {
        fn describe(class: &mut ClassBuilder<Self>) {
            class
                .field("value", |u| &u.value, |u| &mut u.value)
                .declared(TypeRef::var("T"));
        }
    }

    impl_bind!(class Unbound);

    struct Mistyped {
        value: String,
    }

    impl BindClass for Mistyped {
        fn describe(class: &mut ClassBuilder<Self>) {
            class
                .field("value", |u| &u.value, |u| &mut u.value)
                .declared(TypeRef::of::<i32>());
        }
    }

    impl_bind!(class Mistyped);

    #[test]
    fn unresolvable_types_name_class_and_property() {
        let err = build::<Unbound>(&ModelSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeResolution);
        let text = err.to_string();
        assert!(text.contains("Unbound::value"), "{text}");
        assert!(text.contains("`T`"), "{text}");

        let err = build::<Mistyped>(&ModelSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeResolution);
    }

    #[test]
    fn cache_reuses_models() {
        let cache = ModelCache::default();
        let info = Leaf::type_info();
        let settings = ModelSettings::default();
        let a = cache.get_or_build(info.as_class().unwrap(), &settings).unwrap();
        let b = cache.get_or_build(info.as_class().unwrap(), &settings).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
