use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::BindError;
use crate::convert::Converter;
use crate::info::handle::{ConstructFn, HandleMismatch, Held, ReadFn, UpMut, UpRef, WriteFn};
use crate::info::handle::{read_fn, up_mut, up_ref, write_fn};
use crate::info::{Bind, DynValue, Type, TypeInfo, TypeRef};
use crate::policy::VersionRange;

// -----------------------------------------------------------------------------
// BindClass

/// A class: a type bound to a JSON object through its properties.
///
/// Instead of runtime reflection, every class describes its shape once,
/// explicitly, through a [`ClassBuilder`]. The description is turned into a
/// cached class model the first time a mapper meets the type.
///
/// # Examples
///
/// ```
/// use jb_bind::{impl_bind, info::{BindClass, ClassBuilder}, Mapper};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: Option<u32>,
/// }
///
/// impl BindClass for Person {
///     fn describe(class: &mut ClassBuilder<Self>) {
///         class.default_constructor();
///         class.field("name", |p| &p.name, |p| &mut p.name);
///         class.field("age", |p| &p.age, |p| &mut p.age);
///     }
/// }
///
/// impl_bind!(class Person);
///
/// let mapper = Mapper::new().unwrap();
/// let json = mapper.write_string(&Person { name: "Ada".into(), age: None }).unwrap();
/// assert_eq!(json, r#"{"name":"Ada"}"#);
/// ```
pub trait BindClass: Bind + Sized {
    fn describe(class: &mut ClassBuilder<Self>);
}

// -----------------------------------------------------------------------------
// ClassInfo

/// Type-erased entry point to a [`BindClass`] description.
#[derive(Clone)]
pub struct ClassInfo {
    ty: Type,
    describe: fn() -> ClassDecl,
}

impl ClassInfo {
    pub fn of<C: BindClass>() -> Self {
        Self {
            ty: Type::of::<C>(),
            describe: describe_class::<C>,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Runs the class description.
    #[inline]
    pub fn describe(&self) -> ClassDecl {
        (self.describe)()
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo").field("ty", &self.ty).finish()
    }
}

fn describe_class<C: BindClass>() -> ClassDecl {
    let mut builder = ClassBuilder::<C>::new();
    C::describe(&mut builder);
    builder.decl
}

// -----------------------------------------------------------------------------
// Member metadata

/// Who may invoke a member.
///
/// Fields are reachable by field access regardless of their visibility;
/// accessors are only eligible when public, or protected with
/// `accept_protected` enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// What a member contributes to its property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    Field,
    Getter,
    Setter,
}

#[derive(Clone, Default)]
pub(crate) struct MemberMeta {
    pub rename: Option<String>,
    pub ignore: bool,
    pub versions: VersionRange,
    pub converter: Option<Arc<dyn Converter>>,
    pub number_format: Option<(String, Option<String>)>,
}

/// One declared field or accessor, returned by the [`ClassBuilder`] member
/// methods for further configuration.
pub struct MemberDecl {
    pub(crate) name: &'static str,
    pub(crate) role: MemberRole,
    pub(crate) visibility: Visibility,
    pub(crate) storage: Type,
    pub(crate) declared: TypeRef,
    pub(crate) read: Option<ReadFn>,
    pub(crate) write: Option<WriteFn>,
    pub(crate) view: Option<WriteFn>,
    pub(crate) meta: MemberMeta,
}

impl MemberDecl {
    fn new<F: Bind>(name: &'static str, role: MemberRole, visibility: Visibility) -> Self {
        Self {
            name,
            role,
            visibility,
            storage: Type::of::<F>(),
            declared: TypeRef::of::<F>(),
            read: None,
            write: None,
            view: None,
            meta: MemberMeta::default(),
        }
    }

    /// The property identifier.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn role(&self) -> MemberRole {
        self.role
    }

    /// Uses `wire` as JSON key, bypassing the naming strategy.
    pub fn rename(&mut self, wire: impl Into<String>) -> &mut Self {
        self.meta.rename = Some(wire.into());
        self
    }

    pub fn visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.visibility = visibility;
        self
    }

    #[inline]
    pub fn public(&mut self) -> &mut Self {
        self.visibility(Visibility::Public)
    }

    #[inline]
    pub fn protected(&mut self) -> &mut Self {
        self.visibility(Visibility::Protected)
    }

    #[inline]
    pub fn private(&mut self) -> &mut Self {
        self.visibility(Visibility::Private)
    }

    /// Marks the whole property transient: never written, never populated.
    pub fn ignore(&mut self) -> &mut Self {
        self.meta.ignore = true;
        self
    }

    /// Lowest mapper version that includes the property.
    pub fn since(&mut self, version: i32) -> &mut Self {
        self.meta.versions = self.meta.versions.with_min(version);
        self
    }

    /// Highest mapper version that includes the property.
    pub fn until(&mut self, version: i32) -> &mut Self {
        self.meta.versions = self.meta.versions.with_max(version);
        self
    }

    /// Declares the member type in terms of the class type variables.
    ///
    /// The declaration must resolve to the member's Rust type.
    pub fn declared(&mut self, ty: TypeRef) -> &mut Self {
        self.declared = ty;
        self
    }

    /// Converts this property with `converter` instead of the registry.
    pub fn converter(&mut self, converter: Arc<dyn Converter>) -> &mut Self {
        self.meta.converter = Some(converter);
        self
    }

    /// Lays the numeric property out with a decimal pattern such as
    /// `#,##0.00`, in `locale` or else the mapper locale.
    ///
    /// See [`NumberFormat`](crate::convert::NumberFormat) for the pattern
    /// syntax. An explicit [`converter`](Self::converter) takes precedence.
    /// Invalid patterns and non-numeric properties fail the model build.
    pub fn number_format(&mut self, pattern: impl Into<String>, locale: Option<&str>) -> &mut Self {
        self.meta.number_format = Some((pattern.into(), locale.map(str::to_owned)));
        self
    }
}

// -----------------------------------------------------------------------------
// Parent

/// The `extends` declaration of a class.
pub struct Parent {
    pub(crate) ty: Type,
    pub(crate) info: fn() -> TypeInfo,
    pub(crate) args: Vec<TypeRef>,
    pub(crate) up: UpRef,
    pub(crate) up_mut: UpMut,
}

impl Parent {
    /// Binds the parent's type parameters, in order.
    ///
    /// Arguments may refer to the type variables of the declaring class.
    pub fn args(&mut self, args: impl IntoIterator<Item = TypeRef>) -> &mut Self {
        self.args = args.into_iter().collect();
        self
    }
}

// -----------------------------------------------------------------------------
// Creator

pub(crate) type CreatorFn = Arc<dyn Fn(&mut CreatorArgs) -> Result<DynValue, BindError> + Send + Sync>;

pub(crate) type DefaultFn = Arc<dyn Fn() -> DynValue + Send + Sync>;

pub(crate) struct CreatorParamDecl {
    pub name: &'static str,
    pub ty: TypeRef,
    pub default: DefaultFn,
}

/// A factory declaration; add its parameters in order.
pub struct CreatorDecl {
    pub(crate) invoke: CreatorFn,
    pub(crate) params: Vec<CreatorParamDecl>,
}

impl CreatorDecl {
    /// A parameter defaulting to `F::default()` when missing from the document.
    pub fn param<F: Bind + Default>(&mut self, name: &'static str) -> &mut Self {
        self.param_or::<F>(name, F::default)
    }

    /// A parameter defaulting to `default()` when missing from the document.
    pub fn param_or<F: Bind>(&mut self, name: &'static str, default: fn() -> F) -> &mut Self {
        self.params.push(CreatorParamDecl {
            name,
            ty: TypeRef::of::<F>(),
            default: Arc::new(move || Box::new(default()) as DynValue),
        });
        self
    }
}

/// Parameter values handed to a creator.
///
/// Every declared parameter is present: either parsed from the document or
/// produced by its default.
pub struct CreatorArgs {
    class: Type,
    values: Vec<(&'static str, Option<DynValue>)>,
}

impl CreatorArgs {
    pub(crate) fn new(class: Type, values: Vec<(&'static str, Option<DynValue>)>) -> Self {
        Self { class, values }
    }

    /// Takes the value of parameter `name`.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, BindError> {
        let slot = self
            .values
            .iter_mut()
            .find(|(param, _)| *param == name)
            .and_then(|(_, value)| value.take())
            .ok_or_else(|| {
                BindError::instantiation(
                    self.class.path(),
                    format!("creator parameter `{name}` is not declared or already taken"),
                )
            })?;
        slot.downcast::<T>().map(|v| *v).map_err(|_| {
            BindError::instantiation(
                self.class.path(),
                format!(
                    "creator parameter `{name}` is not a `{}`",
                    core::any::type_name::<T>()
                ),
            )
        })
    }
}

// -----------------------------------------------------------------------------
// ClassDecl

pub(crate) struct TypeParam {
    pub name: &'static str,
    pub natural: TypeRef,
}

/// The erased result of [`BindClass::describe`].
pub struct ClassDecl {
    pub(crate) ty: Type,
    pub(crate) params: Vec<TypeParam>,
    pub(crate) parent: Option<Parent>,
    pub(crate) members: Vec<MemberDecl>,
    pub(crate) constructor: Option<ConstructFn>,
    pub(crate) creator: Option<CreatorDecl>,
}

impl ClassDecl {
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Declared type parameter names.
    pub fn type_params(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    pub(crate) fn natural_params(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.natural.clone()).collect()
    }

    #[inline]
    pub fn members(&self) -> &[MemberDecl] {
        &self.members
    }

    #[inline]
    pub fn has_creator(&self) -> bool {
        self.creator.is_some()
    }
}

// -----------------------------------------------------------------------------
// ClassBuilder

/// Collects the description of class `C`.
pub struct ClassBuilder<C> {
    decl: ClassDecl,
    _marker: PhantomData<fn() -> C>,
}

impl<C: BindClass> ClassBuilder<C> {
    fn new() -> Self {
        Self {
            decl: ClassDecl {
                ty: Type::of::<C>(),
                params: Vec::new(),
                parent: None,
                members: Vec::new(),
                constructor: None,
                creator: None,
            },
            _marker: PhantomData,
        }
    }

    fn push(&mut self, member: MemberDecl) -> &mut MemberDecl {
        let index = self.decl.members.len();
        self.decl.members.push(member);
        &mut self.decl.members[index]
    }

    /// Declares type parameter `name`, naturally bound to `F`.
    pub fn type_param<F: Bind>(&mut self, name: &'static str) -> &mut Self {
        self.decl.params.push(TypeParam {
            name,
            natural: TypeRef::of::<F>(),
        });
        self
    }

    /// Declares `P` as parent class, embedded in `C` and reached through
    /// the given lenses. Parent properties are discovered before `C`'s own.
    pub fn extends<P: BindClass>(
        &mut self,
        get: fn(&C) -> &P,
        get_mut: fn(&mut C) -> &mut P,
    ) -> &mut Parent {
        let parent = self.decl.parent.insert(Parent {
            ty: Type::of::<P>(),
            info: P::type_info,
            args: Vec::new(),
            up: up_ref(move |value| value.downcast_ref::<C>().map(|c| get(c) as &dyn Any)),
            up_mut: up_mut(move |value| {
                value
                    .downcast_mut::<C>()
                    .map(|c| get_mut(c) as &mut dyn Any)
            }),
        });
        parent
    }

    /// Declares a field: readable and writable, private by default.
    pub fn field<F: Bind>(
        &mut self,
        name: &'static str,
        get: fn(&C) -> &F,
        get_mut: fn(&mut C) -> &mut F,
    ) -> &mut MemberDecl {
        let mut member = MemberDecl::new::<F>(name, MemberRole::Field, Visibility::Private);
        member.read = Some(borrow_reader(get));
        member.write = Some(replace_writer(get_mut));
        self.push(member)
    }

    /// Declares a getter returning a reference, public by default.
    pub fn getter<F: Bind>(&mut self, name: &'static str, get: fn(&C) -> &F) -> &mut MemberDecl {
        let mut member = MemberDecl::new::<F>(name, MemberRole::Getter, Visibility::Public);
        member.read = Some(borrow_reader(get));
        self.push(member)
    }

    /// Declares a getter computing its value, public by default.
    pub fn getter_value<F: Bind>(&mut self, name: &'static str, get: fn(&C) -> F) -> &mut MemberDecl {
        let mut member = MemberDecl::new::<F>(name, MemberRole::Getter, Visibility::Public);
        member.read = Some(read_fn(move |value| {
            value
                .downcast_ref::<C>()
                .map(|c| Held::Owned(Box::new(get(c))))
        }));
        self.push(member)
    }

    /// Declares a getter of a collection that also exposes a mutable view.
    ///
    /// Under the lenient method access mode the view serves as writer when
    /// the property has no eligible setter.
    pub fn collection_getter<F: Bind>(
        &mut self,
        name: &'static str,
        get: fn(&C) -> &F,
        get_mut: fn(&mut C) -> &mut F,
    ) -> &mut MemberDecl {
        let mut member = MemberDecl::new::<F>(name, MemberRole::Getter, Visibility::Public);
        member.read = Some(borrow_reader(get));
        member.view = Some(replace_writer(get_mut));
        self.push(member)
    }

    /// Declares a setter, public by default.
    pub fn setter<F: Bind>(&mut self, name: &'static str, set: fn(&mut C, F)) -> &mut MemberDecl {
        let mut member = MemberDecl::new::<F>(name, MemberRole::Setter, Visibility::Public);
        member.write = Some(write_fn(move |value, input| {
            let target = value.downcast_mut::<C>().ok_or(HandleMismatch)?;
            let input = input.downcast::<F>().map_err(|_| HandleMismatch)?;
            set(target, *input);
            Ok(())
        }));
        self.push(member)
    }

    /// Uses `make` as no-argument constructor.
    pub fn constructor(&mut self, make: fn() -> C) -> &mut Self {
        self.decl.constructor = Some(Arc::new(move || Box::new(make()) as DynValue));
        self
    }

    /// Uses [`Default`] as no-argument constructor.
    pub fn default_constructor(&mut self) -> &mut Self
    where
        C: Default,
    {
        self.constructor(C::default)
    }

    /// Instantiates the class through `create` once every parameter is known.
    ///
    /// Parameters are matched by name, never translated by the naming strategy.
    pub fn creator(
        &mut self,
        create: fn(&mut CreatorArgs) -> Result<C, BindError>,
    ) -> &mut CreatorDecl {
        self.decl.creator.insert(CreatorDecl {
            invoke: Arc::new(move |args: &mut CreatorArgs| create(args).map(|c| Box::new(c) as DynValue)),
            params: Vec::new(),
        })
    }
}

fn borrow_reader<C: Any, F: Any>(get: fn(&C) -> &F) -> ReadFn {
    read_fn(move |value| {
        value
            .downcast_ref::<C>()
            .map(|c| Held::Borrowed(get(c) as &dyn Any))
    })
}

fn replace_writer<C: Any, F: Any>(get_mut: fn(&mut C) -> &mut F) -> WriteFn {
    write_fn(move |value, input| {
        let target = value.downcast_mut::<C>().ok_or(HandleMismatch)?;
        let input = input.downcast::<F>().map_err(|_| HandleMismatch)?;
        *get_mut(target) = *input;
        Ok(())
    })
}
