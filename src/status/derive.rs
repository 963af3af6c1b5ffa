// ABOUTME: Folds a resource snapshot's phase or conditions into one coarse status
// ABOUTME: Fixed per-kind rule table with Running > Failure > Warning > Completed precedence

use std::fmt;

use crate::remote::models::{ResourceSnapshot, ResourceStatus};
use crate::remote::resource::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Running,
    Failure,
    Warning,
    Completed,
}

impl StatusKind {
    /// Label shown next to the status icon.
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Running => "Active",
            StatusKind::Failure => "Failed",
            StatusKind::Warning => "Warning",
            StatusKind::Completed => "Completed",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boolean facts derived from one snapshot plus the status they resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedStatus {
    pub has_warning: bool,
    pub has_failure: bool,
    pub has_completed: bool,
    pub has_running: bool,
    pub current_status: Option<StatusKind>,
}

impl DerivedStatus {
    /// The only constructor: `current_status` always follows from the flags.
    pub fn from_flags(
        has_warning: bool,
        has_failure: bool,
        has_completed: bool,
        has_running: bool,
    ) -> Self {
        Self {
            has_warning,
            has_failure,
            has_completed,
            has_running,
            current_status: current_status(has_warning, has_failure, has_completed, has_running),
        }
    }
}

pub fn current_status(
    has_warning: bool,
    has_failure: bool,
    has_completed: bool,
    has_running: bool,
) -> Option<StatusKind> {
    if has_running {
        Some(StatusKind::Running)
    } else if has_failure {
        Some(StatusKind::Failure)
    } else if has_warning {
        Some(StatusKind::Warning)
    } else if has_completed {
        Some(StatusKind::Completed)
    } else {
        None
    }
}

/// Derive the status of one snapshot. `None` means the kind is not one the
/// console knows how to read, which callers render as "unknown".
pub fn derive_status(snapshot: &ResourceSnapshot) -> Option<DerivedStatus> {
    let kind = snapshot.resource_kind()?;
    Some(derive_for_kind(kind, snapshot.status.as_ref()))
}

pub fn derive_all(snapshots: &[ResourceSnapshot]) -> Vec<Option<DerivedStatus>> {
    snapshots.iter().map(derive_status).collect()
}

fn derive_for_kind(kind: ResourceKind, status: Option<&ResourceStatus>) -> DerivedStatus {
    let Some(status) = status else {
        return DerivedStatus::default();
    };

    match kind {
        ResourceKind::Backup | ResourceKind::Restore | ResourceKind::PodVolumeRestore => {
            DerivedStatus::from_flags(
                status.warning_count() > 0 || status.phase_is("PartiallyFailed"),
                status.error_count() > 0 || status.phase_is("Failed"),
                status.phase_is("Completed"),
                status.phase_is("InProgress"),
            )
        }
        ResourceKind::PodVolumeBackup => DerivedStatus::from_flags(
            status.phase_is("PartiallyFailed"),
            status.phase_is("Failed"),
            status.phase_is("Completed"),
            status.phase_is("InProgress"),
        ),
        ResourceKind::DirectImageMigration
        | ResourceKind::DirectVolumeMigration
        | ResourceKind::DirectImageStreamMigration
        | ResourceKind::Migration
        | ResourceKind::Plan => {
            let conditions = status.conditions();
            DerivedStatus::from_flags(
                conditions.iter().any(|c| c.is_warning_class()),
                conditions.iter().any(|c| c.condition_type == "Failed"),
                conditions
                    .iter()
                    .any(|c| matches!(c.condition_type.as_str(), "Completed" | "Succeeded")),
                conditions.iter().any(|c| c.condition_type == "Running"),
            )
        }
        ResourceKind::DirectVolumeMigrationProgress => {
            let conditions = status.conditions();
            DerivedStatus::from_flags(
                conditions.iter().any(|c| c.is_warning_class()),
                conditions
                    .iter()
                    .any(|c| matches!(c.condition_type.as_str(), "InvalidPod" | "InvalidPodRef")),
                status.phase_is("Succeeded"),
                status.total_progress_percentage.as_deref() != Some("100%"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::models::Condition;
    use serde_json::json;

    fn conditions_snapshot(kind: &str, conditions: Vec<Condition>) -> ResourceSnapshot {
        ResourceSnapshot::new(kind, "obj", Some(ResourceStatus::with_conditions(conditions)))
    }

    fn phase_snapshot(kind: &str, phase: &str) -> ResourceSnapshot {
        ResourceSnapshot::new(kind, "obj", Some(ResourceStatus::with_phase(phase)))
    }

    #[test]
    fn test_partially_failed_backup_is_warning() {
        let status = ResourceStatus {
            phase: Some("PartiallyFailed".to_string()),
            errors: Some(json!([])),
            warnings: Some(json!([])),
            ..Default::default()
        };
        let derived = derive_status(&ResourceSnapshot::new("Backup", "b1", Some(status))).unwrap();
        assert!(derived.has_warning);
        assert!(!derived.has_failure);
        assert_eq!(derived.current_status, Some(StatusKind::Warning));
    }

    #[test]
    fn test_backup_errors_list_is_failure() {
        let status = ResourceStatus {
            phase: Some("Completed".to_string()),
            errors: Some(json!(["volume snapshot failed"])),
            ..Default::default()
        };
        let derived = derive_status(&ResourceSnapshot::new("Restore", "r1", Some(status))).unwrap();
        assert!(derived.has_failure);
        assert!(derived.has_completed);
        assert_eq!(derived.current_status, Some(StatusKind::Failure));
    }

    #[test]
    fn test_pod_volume_backup_ignores_issue_lists() {
        let status = ResourceStatus {
            phase: Some("Completed".to_string()),
            errors: Some(json!(["ignored"])),
            warnings: Some(json!(["ignored"])),
            ..Default::default()
        };
        let derived =
            derive_status(&ResourceSnapshot::new("PodVolumeBackup", "pvb", Some(status))).unwrap();
        assert!(!derived.has_failure);
        assert!(!derived.has_warning);
        assert_eq!(derived.current_status, Some(StatusKind::Completed));
    }

    #[test]
    fn test_failure_beats_completed_for_migration() {
        let snapshot = conditions_snapshot(
            "Migration",
            vec![Condition::new("Succeeded", ""), Condition::new("Failed", "")],
        );
        let derived = derive_status(&snapshot).unwrap();
        assert!(derived.has_failure);
        assert!(derived.has_completed);
        assert_eq!(derived.current_status, Some(StatusKind::Failure));
    }

    #[test]
    fn test_running_dominates_in_every_family() {
        let running_phase = ["Backup", "Restore", "PodVolumeRestore", "PodVolumeBackup"];
        for kind in running_phase {
            let derived = derive_status(&phase_snapshot(kind, "InProgress")).unwrap();
            assert_eq!(derived.current_status, Some(StatusKind::Running), "{}", kind);
        }

        let condition_kinds = [
            "DirectImageMigration",
            "DirectVolumeMigration",
            "DirectImageStreamMigration",
            "Migration",
            "Plan",
        ];
        for kind in condition_kinds {
            let snapshot = conditions_snapshot(
                kind,
                vec![
                    Condition::new("Failed", "Critical"),
                    Condition::new("Succeeded", ""),
                    Condition::new("Running", "Advisory"),
                ],
            );
            let derived = derive_status(&snapshot).unwrap();
            assert!(derived.has_failure && derived.has_warning && derived.has_completed);
            assert_eq!(derived.current_status, Some(StatusKind::Running), "{}", kind);
        }

        let progress = ResourceSnapshot::new(
            "DirectVolumeMigrationProgress",
            "dvmp",
            Some(ResourceStatus {
                phase: Some("Succeeded".to_string()),
                conditions: Some(vec![Condition::new("InvalidPod", "Warn")]),
                total_progress_percentage: Some("40%".to_string()),
                ..Default::default()
            }),
        );
        let derived = derive_status(&progress).unwrap();
        assert_eq!(derived.current_status, Some(StatusKind::Running));
    }

    #[test]
    fn test_progress_at_hundred_percent() {
        let snapshot = ResourceSnapshot::new(
            "DirectVolumeMigrationProgress",
            "dvmp",
            Some(ResourceStatus {
                phase: Some("Succeeded".to_string()),
                total_progress_percentage: Some("100%".to_string()),
                ..Default::default()
            }),
        );
        let derived = derive_status(&snapshot).unwrap();
        assert!(!derived.has_running);
        assert_eq!(derived.current_status, Some(StatusKind::Completed));

        let invalid = ResourceSnapshot::new(
            "DirectVolumeMigrationProgress",
            "dvmp",
            Some(ResourceStatus {
                conditions: Some(vec![Condition::new("InvalidPodRef", "Critical")]),
                total_progress_percentage: Some("100%".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(
            derive_status(&invalid).unwrap().current_status,
            Some(StatusKind::Failure)
        );
    }

    #[test]
    fn test_warning_categories() {
        for category in ["Critical", "Error", "Warn"] {
            let snapshot = conditions_snapshot("Plan", vec![Condition::new("Anything", category)]);
            let derived = derive_status(&snapshot).unwrap();
            assert_eq!(derived.current_status, Some(StatusKind::Warning), "{}", category);
        }
        let advisory = conditions_snapshot("Plan", vec![Condition::new("Ready", "Required")]);
        assert_eq!(derive_status(&advisory).unwrap().current_status, None);
    }

    #[test]
    fn test_missing_data_is_absence() {
        let empty = conditions_snapshot("DirectVolumeMigration", vec![]);
        assert_eq!(derive_status(&empty), Some(DerivedStatus::default()));

        let no_status = ResourceSnapshot::new("Migration", "m", None);
        assert_eq!(derive_status(&no_status), Some(DerivedStatus::default()));

        let phase_only = phase_snapshot("Plan", "Ready");
        assert_eq!(derive_status(&phase_only).unwrap().current_status, None);
    }

    #[test]
    fn test_unknown_kind_does_not_block_the_list() {
        let snapshots = vec![
            phase_snapshot("MigCluster", "Ready"),
            phase_snapshot("Backup", "Completed"),
        ];
        let derived = derive_all(&snapshots);
        assert_eq!(derived[0], None);
        assert_eq!(
            derived[1].map(|d| d.current_status),
            Some(Some(StatusKind::Completed))
        );
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(current_status(true, true, true, true), Some(StatusKind::Running));
        assert_eq!(current_status(true, true, true, false), Some(StatusKind::Failure));
        assert_eq!(current_status(true, false, true, false), Some(StatusKind::Warning));
        assert_eq!(current_status(false, false, true, false), Some(StatusKind::Completed));
        assert_eq!(current_status(false, false, false, false), None);
    }
}
