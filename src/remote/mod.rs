// ABOUTME: Remote API module for the migration controller
// ABOUTME: Resource descriptors, custom resource models and the HTTP client

pub mod client;
pub mod models;
pub mod resource;

pub use client::{RemoteClient, ResourceClient};
pub use models::{
    Condition, MigMigration, MigPlan, ObjectMeta, PersistentVolume, PlanValues,
    PlanWithMigrations, ResourceSnapshot, ResourceStatus,
};
pub use resource::{ResourceDescriptor, ResourceKind};
