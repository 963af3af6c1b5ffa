// ABOUTME: Plan-level status facts and dashboard counts
// ABOUTME: Applies the running/succeeded condition checks at plan granularity

use crate::remote::models::PlanWithMigrations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationType {
    Stage,
    Migration,
}

/// Facts about a plan and its migration history used by the plan views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanStatus {
    pub has_closed_condition: bool,
    pub has_ready_condition: bool,
    pub has_not_ready_condition: bool,
    pub has_prev_migrations: bool,
    pub has_running_migrations: bool,
    pub has_succeeded_stage: bool,
    pub has_succeeded_migration: bool,
    pub has_attempted_migration: bool,
    pub final_migration_complete: bool,
    pub latest_is_failed: bool,
    pub latest_type: Option<MigrationType>,
}

pub fn plan_status(entry: &PlanWithMigrations) -> PlanStatus {
    let plan = &entry.plan;
    if !plan.reports_conditions() {
        return PlanStatus::default();
    }

    let mut status = PlanStatus {
        has_closed_condition: plan.has_condition("Closed"),
        has_ready_condition: plan.has_condition("Ready"),
        has_not_ready_condition: plan.has_critical_condition(),
        ..Default::default()
    };

    let Some(latest) = entry.migrations.first() else {
        return status;
    };

    status.has_prev_migrations = true;
    status.latest_type = Some(if latest.spec.stage {
        MigrationType::Stage
    } else {
        MigrationType::Migration
    });
    status.latest_is_failed = latest.has_condition("Failed");

    status.has_succeeded_stage = entry
        .migrations
        .iter()
        .any(|m| m.spec.stage && m.has_condition("Succeeded"));
    status.has_succeeded_migration = entry
        .migrations
        .iter()
        .any(|m| !m.spec.stage && m.has_condition("Succeeded"));
    status.has_attempted_migration = entry.migrations.iter().any(|m| !m.spec.stage);
    status.final_migration_complete = status.has_succeeded_migration;
    status.has_running_migrations = entry.migrations.iter().any(|m| m.has_condition("Running"));

    status
}

/// Partition of a plan list for the dashboard badges.
#[derive(Debug, Default)]
pub struct PlanCounts<'a> {
    pub not_started: Vec<&'a PlanWithMigrations>,
    pub in_progress: Vec<&'a PlanWithMigrations>,
    pub completed: Vec<&'a PlanWithMigrations>,
}

impl PlanCounts<'_> {
    pub fn total(&self) -> usize {
        self.not_started.len() + self.in_progress.len() + self.completed.len()
    }
}

pub fn plan_counts(plans: &[PlanWithMigrations]) -> PlanCounts<'_> {
    let mut counts = PlanCounts::default();

    for entry in plans {
        if !entry.plan.reports_conditions() {
            counts.not_started.push(entry);
        } else if entry.migrations.iter().any(|m| m.has_condition("Running")) {
            counts.in_progress.push(entry);
        } else if entry
            .migrations
            .iter()
            .any(|m| m.has_condition("Succeeded"))
        {
            counts.completed.push(entry);
        } else {
            counts.not_started.push(entry);
        }
    }

    counts
}
