//! Start-up registration of classes submitted with
//! [`submit_class!`](crate::submit_class).

use crate::info::TypeInfo;

/// One submitted class, collected by `inventory`.
#[doc(hidden)]
pub struct AutoRegistration {
    info: fn() -> TypeInfo,
}

impl AutoRegistration {
    #[inline]
    pub const fn new(info: fn() -> TypeInfo) -> Self {
        Self { info }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

/// Type infos of every submitted class.
#[cfg(feature = "auto_register")]
pub(crate) fn submitted() -> Vec<TypeInfo> {
    inventory::iter::<AutoRegistration>
        .into_iter()
        .map(|registration| (registration.info)())
        .collect()
}

#[cfg(not(feature = "auto_register"))]
#[inline(always)]
pub(crate) fn submitted() -> Vec<TypeInfo> {
    Vec::new()
}
