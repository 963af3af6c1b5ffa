// ABOUTME: Poll predicates over freshly fetched MigPlans
// ABOUTME: Volume discovery and named-condition checks used by the plan polling sessions

use crate::polling::PollStatus;
use crate::remote::models::MigPlan;

/// Volume discovery settles once the controller has listed volumes on the
/// plan or declared it Ready. A Critical condition ends discovery early.
pub fn volumes_discovered(plan: &MigPlan) -> PollStatus {
    if plan.has_critical_condition() {
        PollStatus::Failure
    } else if !plan.persistent_volumes().is_empty() || plan.has_condition("Ready") {
        PollStatus::Success
    } else {
        PollStatus::Continue
    }
}

/// Succeeds once the plan carries a condition of `condition_type`.
pub fn has_condition(
    condition_type: &'static str,
) -> impl Fn(&MigPlan) -> PollStatus + Send + Sync + 'static {
    move |plan: &MigPlan| {
        if plan.has_condition(condition_type) {
            PollStatus::Success
        } else {
            PollStatus::Continue
        }
    }
}
