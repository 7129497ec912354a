//! Access strategy: which fields and accessors bind a property.
//!
//! Members of one property are grouped in a [`Slot`] (at most one field, one
//! getter and one setter). The [`AccessPolicy`] then picks the reader and the
//! writer of the slot:
//!
//! | mode            | reader                    | writer                                    |
//! |-----------------|---------------------------|-------------------------------------------|
//! | `field`         | field                     | field                                     |
//! | `method`        | eligible getter           | eligible setter, else getter mutable view |
//! | `strict-method` | eligible getter           | eligible setter                           |
//! | `both`          | eligible getter, or field | eligible setter, or field                 |
//!
//! Fields are eligible whatever their visibility. Accessors are eligible when
//! public, or protected with `accept_protected`. Under `both`, a declared but
//! ineligible accessor only falls back to the field with `field_fallback`
//! (off by default).

use core::fmt;
use core::str::FromStr;

use log::warn;

use crate::BindError;
use crate::info::{MemberMeta, MemberRole, ReadFn, Type, Visibility, WriteFn};
use crate::resolve::ResolvedType;

// -----------------------------------------------------------------------------
// AccessMode

/// The access strategy variant, selected once per mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    #[default]
    Field,
    Method,
    StrictMethod,
    Both,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.pad("field"),
            Self::Method => f.pad("method"),
            Self::StrictMethod => f.pad("strict-method"),
            Self::Both => f.pad("both"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "field" => Ok(Self::Field),
            "method" => Ok(Self::Method),
            "strict-method" => Ok(Self::StrictMethod),
            "both" | "field-and-method" => Ok(Self::Both),
            _ => Err(BindError::configuration(format!("unknown access mode `{s}`"))),
        }
    }
}

// -----------------------------------------------------------------------------
// AccessPolicy

/// An [`AccessMode`] plus its visibility toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub mode: AccessMode,
    pub accept_protected: bool,
    pub field_fallback: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            mode: AccessMode::Field,
            accept_protected: false,
            field_fallback: false,
        }
    }
}

impl AccessPolicy {
    #[inline]
    pub fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn eligible(&self, member: &Member) -> bool {
        match member.visibility {
            Visibility::Public => true,
            Visibility::Protected => self.accept_protected,
            Visibility::Private => false,
        }
    }

    /// Picks the reader and writer of `slot`.
    pub(crate) fn select<'a>(&self, class: &Type, slot: &'a Slot) -> Selection<'a> {
        let getter = slot.getter.as_ref().filter(|m| self.eligible(m));
        let setter = slot.setter.as_ref().filter(|m| self.eligible(m));
        let field = slot.field.as_ref();

        let field_reader = || field.and_then(|m| m.read.clone().map(|h| (m, h)));
        let field_writer = || field.and_then(|m| m.write.clone().map(|h| (m, h)));
        let getter_reader = getter.and_then(|m| m.read.clone().map(|h| (m, h)));
        let setter_writer = setter.and_then(|m| m.write.clone().map(|h| (m, h)));
        let view_writer = || getter.and_then(|m| m.view.clone().map(|h| (m, h)));

        let (reader, writer) = match self.mode {
            AccessMode::Field => (field_reader(), field_writer()),
            AccessMode::Method => (getter_reader, setter_writer.or_else(view_writer)),
            AccessMode::StrictMethod => (getter_reader, setter_writer),
            AccessMode::Both => {
                let reader = match (&slot.getter, getter_reader) {
                    (_, Some(chosen)) => Some(chosen),
                    (Some(_), None) if !self.field_fallback => None,
                    _ => field_reader(),
                };
                let writer = match (&slot.setter, setter_writer) {
                    (_, Some(chosen)) => Some(chosen),
                    (Some(_), None) if !self.field_fallback => None,
                    _ => field_writer().or_else(view_writer),
                };
                (reader, writer)
            }
        };

        if let (Some(field), Some((chosen, _))) = (field, &reader)
            && chosen.role != MemberRole::Field
            && chosen.ty.ty() != field.ty.ty()
        {
            warn!(
                "`{}::{}`: accessor of type `{}` shadows field of type `{}`",
                class.name(),
                field.name,
                chosen.ty,
                field.ty,
            );
        }

        Selection { reader, writer }
    }
}

// -----------------------------------------------------------------------------
// Member / Slot

/// A declared member lifted onto the leaf class, its type resolved.
pub(crate) struct Member {
    pub name: &'static str,
    pub role: MemberRole,
    pub visibility: Visibility,
    pub ty: ResolvedType,
    pub read: Option<ReadFn>,
    pub write: Option<WriteFn>,
    pub view: Option<WriteFn>,
    pub meta: MemberMeta,
}

/// All members sharing one property name.
#[derive(Default)]
pub(crate) struct Slot {
    pub field: Option<Member>,
    pub getter: Option<Member>,
    pub setter: Option<Member>,
}

impl Slot {
    /// Stores `member`, replacing a previous member of the same role.
    pub fn put(&mut self, member: Member) {
        let place = match member.role {
            MemberRole::Field => &mut self.field,
            MemberRole::Getter => &mut self.getter,
            MemberRole::Setter => &mut self.setter,
        };
        *place = Some(member);
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        [&self.field, &self.getter, &self.setter]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    /// Property metadata merged across members, field first.
    pub fn meta(&self) -> MemberMeta {
        let mut merged = MemberMeta::default();
        for member in self.members() {
            merged.ignore |= member.meta.ignore;
            merged.versions = merged.versions.intersect(member.meta.versions);
            if merged.rename.is_none() {
                merged.rename.clone_from(&member.meta.rename);
            }
            if merged.converter.is_none() {
                merged.converter.clone_from(&member.meta.converter);
            }
            if merged.number_format.is_none() {
                merged.number_format.clone_from(&member.meta.number_format);
            }
        }
        merged
    }
}

/// The reader and writer picked for one slot.
pub(crate) struct Selection<'a> {
    pub reader: Option<(&'a Member, ReadFn)>,
    pub writer: Option<(&'a Member, WriteFn)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{HandleMismatch, read_fn, write_fn};
    use crate::policy::VersionRange;

    fn member<T: crate::Bind>(role: MemberRole, visibility: Visibility) -> Member {
        let read = read_fn(|_| None);
        let write = write_fn(|_, _| Err(HandleMismatch));
        Member {
            name: "value",
            role,
            visibility,
            ty: ResolvedType::of::<T>().unwrap(),
            read: (role != MemberRole::Setter).then(|| read.clone()),
            write: (role != MemberRole::Getter).then(|| write.clone()),
            view: None,
            meta: MemberMeta::default(),
        }
    }

    fn slot(getter: Option<Visibility>, setter: Option<Visibility>) -> Slot {
        let mut slot = Slot::default();
        slot.put(member::<String>(MemberRole::Field, Visibility::Private));
        if let Some(v) = getter {
            slot.put(member::<String>(MemberRole::Getter, v));
        }
        if let Some(v) = setter {
            slot.put(member::<String>(MemberRole::Setter, v));
        }
        slot
    }

    fn roles(policy: AccessPolicy, slot: &Slot) -> (Option<MemberRole>, Option<MemberRole>) {
        let selection = policy.select(&Type::of::<()>(), slot);
        (
            selection.reader.map(|(m, _)| m.role),
            selection.writer.map(|(m, _)| m.role),
        )
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("strict-method".parse::<AccessMode>().unwrap(), AccessMode::StrictMethod);
        assert_eq!("FIELD_AND_METHOD".parse::<AccessMode>().unwrap(), AccessMode::Both);
        assert!("getter".parse::<AccessMode>().is_err());
    }

    #[test]
    fn both_mode_drops_ineligible_accessors_by_default() {
        let guarded = slot(Some(Visibility::Private), Some(Visibility::Protected));
        let policy = AccessPolicy::new(AccessMode::Both);
        assert!(!policy.field_fallback);
        assert_eq!(roles(policy, &guarded), (None, None));

        let undeclared = slot(None, None);
        assert_eq!(
            roles(policy, &undeclared),
            (Some(MemberRole::Field), Some(MemberRole::Field))
        );
    }

    #[test]
    fn field_mode_ignores_accessors() {
        let slot = slot(Some(Visibility::Public), Some(Visibility::Public));
        let policy = AccessPolicy::new(AccessMode::Field);
        assert_eq!(roles(policy, &slot), (Some(MemberRole::Field), Some(MemberRole::Field)));
    }

    #[test]
    fn visibility_matrix() {
        use MemberRole::{Field, Getter, Setter};
        use Visibility::{Private, Protected, Public};

        let cases = [
            // mode, accept_protected, fallback, getter, setter, expected
            (AccessMode::Method, false, true, Some(Public), Some(Public), (Some(Getter), Some(Setter))),
            (AccessMode::Method, false, true, Some(Protected), Some(Protected), (None, None)),
            (AccessMode::Method, true, true, Some(Protected), Some(Protected), (Some(Getter), Some(Setter))),
            (AccessMode::Method, false, true, None, None, (None, None)),
            (AccessMode::StrictMethod, true, true, Some(Private), Some(Public), (None, Some(Setter))),
            (AccessMode::Both, false, true, Some(Private), None, (Some(Field), Some(Field))),
            (AccessMode::Both, false, false, Some(Private), Some(Protected), (None, None)),
            (AccessMode::Both, false, false, None, Some(Public), (Some(Field), Some(Setter))),
            (AccessMode::Both, true, true, Some(Protected), None, (Some(Getter), Some(Field))),
        ];
        for (mode, accept_protected, field_fallback, getter, setter, expected) in cases {
            let policy = AccessPolicy {
                mode,
                accept_protected,
                field_fallback,
            };
            assert_eq!(
                roles(policy, &slot(getter, setter)),
                expected,
                "{mode} protected={accept_protected} fallback={field_fallback} {getter:?}/{setter:?}"
            );
        }
    }

    #[test]
    fn lenient_method_writes_through_collection_view() {
        let mut slot = Slot::default();
        let mut getter = member::<Vec<String>>(MemberRole::Getter, Visibility::Public);
        getter.view = Some(write_fn(|_, _| Ok(())));
        slot.put(getter);

        let lenient = AccessPolicy::new(AccessMode::Method);
        assert_eq!(roles(lenient, &slot), (Some(MemberRole::Getter), Some(MemberRole::Getter)));
        let strict = AccessPolicy::new(AccessMode::StrictMethod);
        assert_eq!(roles(strict, &slot), (Some(MemberRole::Getter), None));
    }

    #[test]
    fn metadata_merges_across_members() {
        let mut slot = Slot::default();
        let mut field = member::<String>(MemberRole::Field, Visibility::Private);
        field.meta.versions = VersionRange::new(Some(1), Some(5));
        let mut getter = member::<String>(MemberRole::Getter, Visibility::Public);
        getter.meta.rename = Some("first".into());
        getter.meta.versions = VersionRange::new(Some(2), None);
        let mut setter = member::<String>(MemberRole::Setter, Visibility::Public);
        setter.meta.rename = Some("second".into());
        setter.meta.ignore = true;
        slot.put(field);
        slot.put(getter);
        slot.put(setter);

        let meta = slot.meta();
        assert!(meta.ignore);
        assert_eq!(meta.rename.as_deref(), Some("first"));
        assert_eq!(meta.versions, VersionRange::new(Some(2), Some(5)));
    }
}
