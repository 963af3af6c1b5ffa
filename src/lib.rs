// ABOUTME: Core of the cluster migration console
// ABOUTME: Status derivation over migration resources plus polling and retry supervision

pub mod config;
pub mod error;
pub mod notify;
pub mod plan;
pub mod polling;
pub mod remote;
pub mod retry;
pub mod status;

pub use config::ConsoleConfig;
pub use error::MigratorError;
pub use notify::{AlertSink, ChannelAlertSink, Notification, TracingAlertSink};
pub use plan::PlanOperations;
pub use polling::{PollConfig, PollHandle, PollOutcome, PollStatus, PollSupervisor};
pub use remote::{RemoteClient, ResourceClient, ResourceKind, ResourceSnapshot};
pub use status::{derive_status, DerivedStatus, StatusKind};
