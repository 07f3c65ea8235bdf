//! Reversible store.
//!
//! A depth-stamped undo log over an arena of integer scalars and managed
//! arrays. Callers hold copyable handles ([`RevInt`], [`RevVec`]) and
//! mutate through the store, which records the prior value of anything an
//! earlier checkpoint can still observe. [`RevStore::backtrack`] replays
//! the trail in reverse down to a requested depth.
//!
//! # Logging modes
//!
//! - [`LogMode::PerElement`]: the array header (size, high-water mark) is
//!   logged once per depth and individual slots are logged on write, but
//!   only below the high-water mark. Slots above it were never observed by
//!   any checkpoint.
//! - [`LogMode::Bulk`]: the whole live prefix is logged once per depth;
//!   later writes at the same depth are free.
//!
//! # Reference
//! Schulte (1999), "Comparing Trailing and Copying for Constraint Programming"

mod store;

pub use store::{LogMode, RevInt, RevStore, RevVec};
