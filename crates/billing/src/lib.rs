//! Recurring billing domain module (event-sourced).
//!
//! Plans that periodically turn a fixed item set into an invoice for one
//! customer. The schedule lives here; running it is the caller's concern.

pub mod plan;
pub mod schedule;

pub use plan::{
    CreatePlan, ExpirePlan, PausePlan, PlanCommand, PlanCreated, PlanEvent, PlanExpired,
    PlanItemsUpdated, PlanPaused, PlanResumed, PlanRunRecorded, PlanStatus, RecordRun,
    RecurringPlan, RecurringPlanId, ResumePlan, UpdatePlanItems,
};
pub use schedule::Frequency;
