// ABOUTME: Data structures for migration custom resources and their status blocks
// ABOUTME: Deserialized from API server JSON, unknown fields preserved for write-back

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::resource::ResourceKind;

pub const WARNING_CATEGORIES: [&str; 3] = ["Critical", "Error", "Warn"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type", default)]
    pub condition_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Condition {
    pub fn new(condition_type: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn is_warning_class(&self) -> bool {
        WARNING_CATEGORIES.contains(&self.category.as_str())
    }
}

/// Status block shared by every kind. Older resources carry `phase`,
/// newer ones carry `conditions`, progress objects carry both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Either a list of messages or a plain count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_progress_percentage: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceStatus {
    pub fn with_phase(phase: impl Into<String>) -> Self {
        Self {
            phase: Some(phase.into()),
            ..Default::default()
        }
    }

    pub fn with_conditions(conditions: Vec<Condition>) -> Self {
        Self {
            conditions: Some(conditions),
            ..Default::default()
        }
    }

    pub fn phase_is(&self, phase: &str) -> bool {
        self.phase.as_deref() == Some(phase)
    }

    pub fn conditions(&self) -> &[Condition] {
        self.conditions.as_deref().unwrap_or(&[])
    }

    pub fn has_condition(&self, condition_type: &str) -> bool {
        self.conditions()
            .iter()
            .any(|c| c.condition_type == condition_type)
    }

    pub fn error_count(&self) -> usize {
        issue_count(self.errors.as_ref())
    }

    pub fn warning_count(&self) -> usize {
        issue_count(self.warnings.as_ref())
    }
}

fn issue_count(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
        _ => 0,
    }
}

/// Point-in-time copy of one remote object. The raw kind string is kept so
/// an unrecognized kind still yields a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    pub kind: String,
    pub name: String,
    pub status: Option<ResourceStatus>,
}

impl ResourceSnapshot {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        status: Option<ResourceStatus>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            status,
        }
    }

    /// Build a snapshot from a raw API object. A status block that does not
    /// match the expected shape is treated as absent.
    pub fn from_object(kind: &str, object: &Value) -> Self {
        let name = object
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let status = match object.get("status") {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<ResourceStatus>(raw.clone()) {
                Ok(status) => Some(status),
                Err(e) => {
                    debug!(kind = %kind, name = %name, error = %e, "Ignoring malformed status block");
                    None
                }
            },
        };

        Self::new(kind, name, status)
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        self.kind.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistentVolume {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigPlanSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volumes: Option<Vec<PersistentVolume>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MigPlanSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

impl MigPlan {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(ResourceStatus::conditions)
            .unwrap_or(&[])
    }

    /// True once the controller has written a conditions list, even an empty one.
    pub fn reports_conditions(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some()
    }

    pub fn has_condition(&self, condition_type: &str) -> bool {
        self.conditions()
            .iter()
            .any(|c| c.condition_type == condition_type)
    }

    pub fn has_critical_condition(&self) -> bool {
        self.conditions().iter().any(|c| c.category == "Critical")
    }

    pub fn persistent_volumes(&self) -> &[PersistentVolume] {
        self.spec.persistent_volumes.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigMigrationSpec {
    #[serde(default)]
    pub stage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mig_plan_ref: Option<ObjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigMigration {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MigMigrationSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

impl MigMigration {
    pub fn has_condition(&self, condition_type: &str) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.has_condition(condition_type))
    }

    pub fn plan_name(&self) -> Option<&str> {
        self.spec.mig_plan_ref.as_ref().map(|r| r.name.as_str())
    }
}

/// A plan together with the migrations that reference it, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanWithMigrations {
    pub plan: MigPlan,
    pub migrations: Vec<MigMigration>,
}

impl PlanWithMigrations {
    pub fn new(plan: MigPlan, migrations: Vec<MigMigration>) -> Self {
        Self { plan, migrations }
    }

    /// Attach each migration to the plan it references.
    pub fn group(plans: Vec<MigPlan>, migrations: &[MigMigration]) -> Vec<Self> {
        plans
            .into_iter()
            .map(|plan| {
                let mut owned: Vec<MigMigration> = migrations
                    .iter()
                    .filter(|m| m.plan_name() == Some(plan.name()))
                    .cloned()
                    .collect();
                // RFC 3339 timestamps order lexically
                owned.sort_by(|a, b| {
                    b.metadata
                        .creation_timestamp
                        .cmp(&a.metadata.creation_timestamp)
                });
                Self::new(plan, owned)
            })
            .collect()
    }
}

/// Operator-edited values applied onto a freshly fetched plan before write-back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanValues {
    pub plan_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volumes: Option<Vec<PersistentVolume>>,
}

impl PlanValues {
    pub fn close(plan_name: impl Into<String>) -> Self {
        Self {
            plan_name: plan_name.into(),
            plan_closed: Some(true),
            persistent_volumes: Some(Vec::new()),
        }
    }

    pub fn apply_to(&self, plan: &MigPlan) -> MigPlan {
        let mut updated = plan.clone();
        if let Some(closed) = self.plan_closed {
            updated.spec.closed = Some(closed);
        }
        if let Some(volumes) = &self.persistent_volumes {
            updated.spec.persistent_volumes = Some(volumes.clone());
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_object_with_conditions() {
        let object = json!({
            "metadata": {"name": "dvm-1"},
            "status": {"conditions": [{"type": "Running", "category": "Advisory"}]}
        });
        let snapshot = ResourceSnapshot::from_object("DirectVolumeMigration", &object);
        assert_eq!(snapshot.name, "dvm-1");
        assert_eq!(
            snapshot.resource_kind(),
            Some(ResourceKind::DirectVolumeMigration)
        );
        let status = snapshot.status.expect("status present");
        assert!(status.has_condition("Running"));
    }

    #[test]
    fn test_malformed_status_is_absent() {
        let object = json!({
            "metadata": {"name": "broken"},
            "status": {"conditions": "not-a-list"}
        });
        let snapshot = ResourceSnapshot::from_object("Migration", &object);
        assert!(snapshot.status.is_none());
    }

    #[test]
    fn test_issue_counts_accept_lists_and_numbers() {
        let listed: ResourceStatus =
            serde_json::from_value(json!({"errors": ["a", "b"], "warnings": []})).unwrap();
        assert_eq!(listed.error_count(), 2);
        assert_eq!(listed.warning_count(), 0);

        let counted: ResourceStatus =
            serde_json::from_value(json!({"errors": 0, "warnings": 4})).unwrap();
        assert_eq!(counted.error_count(), 0);
        assert_eq!(counted.warning_count(), 4);
    }

    #[test]
    fn test_plan_round_trip_keeps_unknown_fields() {
        let raw = json!({
            "apiVersion": "migration.openshift.io/v1alpha1",
            "kind": "MigPlan",
            "metadata": {"name": "p1", "uid": "abc", "resourceVersion": "7"},
            "spec": {
                "srcMigClusterRef": {"name": "src"},
                "persistentVolumes": [{"name": "pv-1", "capacity": "1Gi"}]
            },
            "status": {
                "conditions": [
                    {"type": "Ready", "category": "Required"},
                    {"type": "PvsDiscovered", "category": "Required", "durable": true, "items": ["pv-1"]}
                ],
                "observedDigest": "x"
            }
        });
        let plan: MigPlan = serde_json::from_value(raw.clone()).unwrap();
        assert!(plan.has_condition("Ready"));
        assert_eq!(plan.persistent_volumes()[0].name, "pv-1");
        assert_eq!(plan.conditions()[1].extra.get("durable"), Some(&json!(true)));

        let back = serde_json::to_value(&plan).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_close_values_clear_volumes() {
        let mut plan = MigPlan::default();
        plan.metadata = ObjectMeta::named("p1");
        plan.spec.persistent_volumes = Some(vec![PersistentVolume::named("pv-1")]);

        let closed = PlanValues::close("p1").apply_to(&plan);
        assert_eq!(closed.spec.closed, Some(true));
        assert!(closed.persistent_volumes().is_empty());
        // source plan untouched
        assert_eq!(plan.persistent_volumes().len(), 1);
    }

    #[test]
    fn test_group_orders_migrations_newest_first() {
        let plan = MigPlan {
            metadata: ObjectMeta::named("p1"),
            ..Default::default()
        };
        let migration = |name: &str, plan: &str, created: &str| MigMigration {
            metadata: ObjectMeta {
                name: name.to_string(),
                creation_timestamp: Some(created.to_string()),
                ..Default::default()
            },
            spec: MigMigrationSpec {
                mig_plan_ref: Some(ObjectReference {
                    name: plan.to_string(),
                    namespace: None,
                }),
                ..Default::default()
            },
            status: None,
        };
        let migrations = vec![
            migration("old", "p1", "2024-01-01T00:00:00Z"),
            migration("other", "p2", "2024-03-01T00:00:00Z"),
            migration("new", "p1", "2024-02-01T00:00:00Z"),
        ];

        let grouped = PlanWithMigrations::group(vec![plan], &migrations);
        let names: Vec<&str> = grouped[0]
            .migrations
            .iter()
            .map(|m| m.metadata.name.as_str())
            .collect();
        assert_eq!(names, vec!["new", "old"]);
    }
}
