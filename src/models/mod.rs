//! Job-shop domain models.
//!
//! An arena of jobs, operations, resources and groups addressed by stable
//! integer ids. The selector chain and the forward construction mutate
//! these objects in place; the [`Dataset`] owns them all.
//!
//! # Domain Mappings
//!
//! | u-jobshop | Manufacturing | Healthcare | Logistics |
//! |-----------|--------------|------------|-----------|
//! | Job | Work Order | Patient Case | Shipment |
//! | JobOp | Routing Step | Procedure | Transport Leg |
//! | Resource | Machine/Crew | Room/Doctor | Truck/Driver |
//! | ResourceGroup | Work Center | Ward | Fleet |
//! | JobGroup | Alternative Routing | Treatment Option | Carrier Option |
//! | Schedule | Production Plan | OR Schedule | Route Plan |

mod dataset;
mod ids;
mod job;
mod operation;
mod requirement;
mod resource;
mod schedule;

pub use dataset::{Dataset, Precedence, Usage};
pub use ids::{JobGroupId, JobId, OpId, ResourceGroupId, ResourceId};
pub use job::{Job, JobGroup};
pub use operation::{
    duration_for, CapPtOption, JobOp, OpStatus, OpType, ScheduledSlot, TimeWindow,
};
pub use requirement::{ResourceGroupRequirement, ResourceRequirement};
pub use resource::{CostRates, Resource, ResourceGroup};
pub use schedule::{Assignment, Schedule};
