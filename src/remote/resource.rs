// ABOUTME: Resource kinds and REST collection descriptors for the migration API
// ABOUTME: Maps each custom resource kind onto its API group, version and plural

use std::fmt;
use std::str::FromStr;

use crate::error::MigratorError;

pub const MIGRATION_GROUP: &str = "migration.openshift.io";
pub const MIGRATION_VERSION: &str = "v1alpha1";
pub const VELERO_GROUP: &str = "velero.io";
pub const VELERO_VERSION: &str = "v1";

/// Kinds of remote objects whose status the console can derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Backup,
    Restore,
    PodVolumeBackup,
    PodVolumeRestore,
    DirectImageMigration,
    DirectVolumeMigration,
    DirectImageStreamMigration,
    DirectVolumeMigrationProgress,
    Migration,
    Plan,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Backup,
        ResourceKind::Restore,
        ResourceKind::PodVolumeBackup,
        ResourceKind::PodVolumeRestore,
        ResourceKind::DirectImageMigration,
        ResourceKind::DirectVolumeMigration,
        ResourceKind::DirectImageStreamMigration,
        ResourceKind::DirectVolumeMigrationProgress,
        ResourceKind::Migration,
        ResourceKind::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Backup => "Backup",
            ResourceKind::Restore => "Restore",
            ResourceKind::PodVolumeBackup => "PodVolumeBackup",
            ResourceKind::PodVolumeRestore => "PodVolumeRestore",
            ResourceKind::DirectImageMigration => "DirectImageMigration",
            ResourceKind::DirectVolumeMigration => "DirectVolumeMigration",
            ResourceKind::DirectImageStreamMigration => "DirectImageStreamMigration",
            ResourceKind::DirectVolumeMigrationProgress => "DirectVolumeMigrationProgress",
            ResourceKind::Migration => "Migration",
            ResourceKind::Plan => "Plan",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = MigratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MigratorError::Validation(format!("unknown resource kind '{}'", s)))
    }
}

/// A REST collection on the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub group: Option<&'static str>,
    pub version: &'static str,
    pub plural: &'static str,
    pub namespace: Option<String>,
}

impl ResourceDescriptor {
    fn migration(plural: &'static str, namespace: &str) -> Self {
        Self {
            group: Some(MIGRATION_GROUP),
            version: MIGRATION_VERSION,
            plural,
            namespace: Some(namespace.to_string()),
        }
    }

    fn velero(plural: &'static str, namespace: &str) -> Self {
        Self {
            group: Some(VELERO_GROUP),
            version: VELERO_VERSION,
            plural,
            namespace: Some(namespace.to_string()),
        }
    }

    pub fn for_kind(kind: ResourceKind, namespace: &str) -> Self {
        match kind {
            ResourceKind::Backup => Self::velero("backups", namespace),
            ResourceKind::Restore => Self::velero("restores", namespace),
            ResourceKind::PodVolumeBackup => Self::velero("podvolumebackups", namespace),
            ResourceKind::PodVolumeRestore => Self::velero("podvolumerestores", namespace),
            ResourceKind::DirectImageMigration => {
                Self::migration("directimagemigrations", namespace)
            }
            ResourceKind::DirectVolumeMigration => {
                Self::migration("directvolumemigrations", namespace)
            }
            ResourceKind::DirectImageStreamMigration => {
                Self::migration("directimagestreammigrations", namespace)
            }
            ResourceKind::DirectVolumeMigrationProgress => {
                Self::migration("directvolumemigrationprogresses", namespace)
            }
            ResourceKind::Migration => Self::mig_migration(namespace),
            ResourceKind::Plan => Self::mig_plan(namespace),
        }
    }

    pub fn mig_plan(namespace: &str) -> Self {
        Self::migration("migplans", namespace)
    }

    pub fn mig_migration(namespace: &str) -> Self {
        Self::migration("migmigrations", namespace)
    }

    /// Core `PersistentVolume`, cluster scoped.
    pub fn persistent_volume() -> Self {
        Self {
            group: None,
            version: "v1",
            plural: "persistentvolumes",
            namespace: None,
        }
    }

    pub fn collection_path(&self) -> String {
        let mut path = match self.group {
            Some(group) => format!("/apis/{}/{}", group, self.version),
            None => format!("/api/{}", self.version),
        };
        if let Some(namespace) = &self.namespace {
            path.push_str("/namespaces/");
            path.push_str(namespace);
        }
        path.push('/');
        path.push_str(self.plural);
        path
    }

    pub fn item_path(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.collection_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_from_its_name() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("MigCluster".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_plan_paths() {
        let plans = ResourceDescriptor::mig_plan("openshift-migration");
        assert_eq!(
            plans.item_path("plan-a"),
            "/apis/migration.openshift.io/v1alpha1/namespaces/openshift-migration/migplans/plan-a"
        );
    }

    #[test]
    fn test_velero_and_core_paths() {
        let backups = ResourceDescriptor::for_kind(ResourceKind::Backup, "velero");
        assert_eq!(
            backups.collection_path(),
            "/apis/velero.io/v1/namespaces/velero/backups"
        );

        let pvs = ResourceDescriptor::persistent_volume();
        assert_eq!(pvs.item_path("pv-1"), "/api/v1/persistentvolumes/pv-1");
    }
}
