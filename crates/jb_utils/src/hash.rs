//! A stable hashing state over *foldhash*.
//!
//! Keys hashed here are property names and type ids declared by the program,
//! never document input.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6A62_5F75_7469_6C73);

/// Hasher produced by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state based upon a fixed seed, so that hash results only depend on the input.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use jb_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("firstName");
/// let b = FixedHashState.hash_one("firstName");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}
