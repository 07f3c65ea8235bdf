//! Reversible constraint propagation for one chromosome evaluation.
//!
//! - [`Manager`]: owns the [`RevStore`](crate::rev::RevStore), the
//!   per-operation bounds and the resource timelines
//! - [`Timeline`]: reversible reservations of one resource
//! - [`CycleGroups`]: strongly connected components and successor depth

mod cycle;
mod manager;
mod timeline;

pub use cycle::CycleGroups;
pub use manager::{Activity, Manager};
pub use timeline::Timeline;
