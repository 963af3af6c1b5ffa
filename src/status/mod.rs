// ABOUTME: Status derivation for migration resources and plans
// ABOUTME: Pure projections over immutable snapshots, recomputed on every refresh

pub mod derive;
pub mod plan;

pub use derive::{current_status, derive_all, derive_status, DerivedStatus, StatusKind};
pub use plan::{plan_counts, plan_status, MigrationType, PlanCounts, PlanStatus};
