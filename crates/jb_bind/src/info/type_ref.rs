use core::fmt;

use crate::info::{Bind, TypeInfo};

// -----------------------------------------------------------------------------
// TypeRef

/// A declared type, as written at a member or `extends` site.
///
/// Either a type variable of the declaring class, or a concrete type
/// with optional explicit type arguments (which may be variables
/// themselves). Empty arguments mean "use the natural arguments".
///
/// # Examples
///
/// ```
/// use jb_bind::info::TypeRef;
///
/// // A field declared as `T`.
/// let t = TypeRef::var("T");
/// assert_eq!(t.var_name(), Some("T"));
///
/// // A field declared as `Vec<T>`.
/// let list = TypeRef::generic::<Vec<i64>>([TypeRef::var("T")]);
/// assert_eq!(list.to_string(), "Vec<i64><T>");
/// ```
#[derive(Clone)]
pub enum TypeRef {
    Var(&'static str),
    Type {
        info: fn() -> TypeInfo,
        args: Vec<TypeRef>,
    },
}

impl TypeRef {
    /// A concrete type with its natural arguments.
    #[inline]
    pub fn of<T: Bind>() -> Self {
        Self::Type {
            info: T::type_info,
            args: Vec::new(),
        }
    }

    /// A type variable.
    #[inline]
    pub const fn var(name: &'static str) -> Self {
        Self::Var(name)
    }

    /// A concrete type with explicit type arguments.
    pub fn generic<T: Bind>(args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Type {
            info: T::type_info,
            args: args.into_iter().collect(),
        }
    }

    /// Returns the variable name if this is a type variable.
    #[inline]
    pub fn var_name(&self) -> Option<&'static str> {
        match self {
            Self::Var(name) => Some(name),
            Self::Type { .. } => None,
        }
    }

    /// The type info of a concrete type.
    #[inline]
    pub fn info(&self) -> Option<TypeInfo> {
        match self {
            Self::Var(_) => None,
            Self::Type { info, .. } => Some(info()),
        }
    }

    /// The explicit arguments.
    #[inline]
    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Var(_) => &[],
            Self::Type { args, .. } => args,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => f.write_str(name),
            Self::Type { info, args } => {
                f.write_str(&info().ty().name())?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        fmt::Display::fmt(arg, f)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
