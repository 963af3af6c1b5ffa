// ABOUTME: Plan operations driven by the console: update, discovery, close and delete
// ABOUTME: Wires the polling supervisor and retry helper to MigPlan reads and writes

pub mod predicates;

use anyhow::{Context, Result};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{ConsoleConfig, PollingConfig};
use crate::error::MigratorError;
use crate::notify::{AlertSink, Notification};
use crate::polling::{PollHandle, PollOutcome, PollSupervisor};
use crate::remote::client::ResourceClient;
use crate::remote::models::{MigMigration, MigPlan, PersistentVolume, PlanValues, PlanWithMigrations};
use crate::remote::resource::ResourceDescriptor;
use crate::retry::{update_with_retry, RetryConfig};

pub fn pv_polling_key(plan_name: &str) -> String {
    format!("pv:{}", plan_name)
}

pub fn plan_status_polling_key(plan_name: &str) -> String {
    format!("plan-status:{}", plan_name)
}

pub fn closed_status_polling_key(plan_name: &str) -> String {
    format!("closed-status:{}", plan_name)
}

async fn fetch_plan<C: ResourceClient + ?Sized>(
    client: &C,
    namespace: &str,
    name: &str,
) -> Result<MigPlan> {
    let object = client
        .get(&ResourceDescriptor::mig_plan(namespace), name)
        .await?;
    serde_json::from_value(object).with_context(|| format!("Failed to parse MigPlan {}", name))
}

pub struct PlanOperations<C: ResourceClient + 'static> {
    client: Arc<C>,
    namespace: String,
    supervisor: PollSupervisor,
    alerts: Arc<dyn AlertSink>,
    polling: PollingConfig,
    retry: RetryConfig,
}

impl<C: ResourceClient + 'static> PlanOperations<C> {
    pub fn new(client: Arc<C>, alerts: Arc<dyn AlertSink>, config: &ConsoleConfig) -> Self {
        Self {
            client,
            namespace: config.api.namespace.clone(),
            supervisor: PollSupervisor::new(alerts.clone()),
            alerts,
            polling: config.polling.clone(),
            retry: config.retry.to_retry_config(),
        }
    }

    pub fn supervisor(&self) -> &PollSupervisor {
        &self.supervisor
    }

    fn plans(&self) -> ResourceDescriptor {
        ResourceDescriptor::mig_plan(&self.namespace)
    }

    pub async fn get_plan(&self, name: &str) -> Result<MigPlan> {
        fetch_plan(self.client.as_ref(), &self.namespace, name).await
    }

    /// All plans with their migrations attached. Objects that do not parse are
    /// skipped so one bad entry does not hide the rest.
    pub async fn list_plans_with_migrations(&self) -> Result<Vec<PlanWithMigrations>> {
        let plans: Vec<MigPlan> = parse_items(self.client.list(&self.plans()).await?, "MigPlan");
        let migrations: Vec<MigMigration> = parse_items(
            self.client
                .list(&ResourceDescriptor::mig_migration(&self.namespace))
                .await?,
            "MigMigration",
        );
        Ok(PlanWithMigrations::group(plans, &migrations))
    }

    async fn try_update_plan(&self, values: &PlanValues) -> Result<MigPlan> {
        let resource = self.plans();
        update_with_retry(
            &self.retry,
            &values.plan_name,
            || self.get_plan(&values.plan_name),
            |plan| values.apply_to(&plan),
            |plan: MigPlan| {
                let client = self.client.clone();
                let resource = resource.clone();
                async move {
                    let body = serde_json::to_value(&plan).context("Failed to serialize MigPlan")?;
                    let written = client.put(&resource, plan.name(), &body).await?;
                    serde_json::from_value::<MigPlan>(written)
                        .context("Failed to parse updated MigPlan")
                }
            },
        )
        .await
    }

    /// Read-modify-write of a plan with bounded retries. On final failure one
    /// error notification is emitted and nothing is returned to apply.
    pub async fn update_plan(&self, values: &PlanValues) -> Result<MigPlan> {
        match self.try_update_plan(values).await {
            Ok(plan) => {
                info!(plan = %values.plan_name, "Plan updated");
                Ok(plan)
            }
            Err(e) => {
                error!(plan = %values.plan_name, error = %e, "Plan update failed");
                self.alerts
                    .alert(Notification::Error("Failed to update plan".to_string()));
                Err(e)
            }
        }
    }

    fn plan_fetcher(
        &self,
        name: &str,
    ) -> impl FnMut() -> BoxFuture<'static, Result<MigPlan>> + Send + 'static {
        let client = self.client.clone();
        let namespace = self.namespace.clone();
        let name = name.to_string();
        move || {
            let client = client.clone();
            let namespace = namespace.clone();
            let name = name.clone();
            async move { fetch_plan(client.as_ref(), &namespace, &name).await }.boxed()
        }
    }

    pub fn start_pv_polling(&self, plan_name: &str) -> Result<PollHandle, MigratorError> {
        self.supervisor.start_polling(
            pv_polling_key(plan_name),
            self.plan_fetcher(plan_name),
            predicates::volumes_discovered,
            self.polling.pv_discovery(),
        )
    }

    pub fn stop_pv_polling(&self, plan_name: &str) -> bool {
        self.supervisor.stop(&pv_polling_key(plan_name))
    }

    /// Poll until the controller has discovered the plan's volumes. A timeout
    /// yields an empty list.
    pub async fn discover_volumes(&self, plan_name: &str) -> Result<Vec<PersistentVolume>> {
        let handle = self.start_pv_polling(plan_name)?;
        match handle.wait().await {
            PollOutcome::Succeeded => {
                let plan = self.get_plan(plan_name).await?;
                Ok(plan.persistent_volumes().to_vec())
            }
            PollOutcome::TimedOut => Ok(Vec::new()),
            PollOutcome::Failed => Err(MigratorError::Migration(format!(
                "PV discovery failed for plan '{}'",
                plan_name
            ))
            .into()),
            PollOutcome::Cancelled => Err(MigratorError::Migration(format!(
                "PV discovery for plan '{}' was cancelled",
                plan_name
            ))
            .into()),
        }
    }

    pub fn start_plan_status_polling(&self, plan_name: &str) -> Result<PollHandle, MigratorError> {
        self.supervisor.start_polling(
            plan_status_polling_key(plan_name),
            self.plan_fetcher(plan_name),
            predicates::has_condition("Ready"),
            self.polling.plan_status(),
        )
    }

    pub fn stop_plan_status_polling(&self, plan_name: &str) -> bool {
        self.supervisor.stop(&plan_status_polling_key(plan_name))
    }

    pub fn start_closed_status_polling(
        &self,
        plan_name: &str,
    ) -> Result<PollHandle, MigratorError> {
        self.supervisor.start_polling(
            closed_status_polling_key(plan_name),
            self.plan_fetcher(plan_name),
            predicates::has_condition("Closed"),
            self.polling.plan_closed(),
        )
    }

    /// Mark the plan closed and start watching for the controller's Closed
    /// condition. The returned handle resolves to `Succeeded` once it appears.
    pub async fn close_plan(&self, plan_name: &str) -> Result<PollHandle> {
        let key = closed_status_polling_key(plan_name);
        if self.supervisor.is_active(&key) {
            warn!(plan = %plan_name, "Close already being watched, skipping close request");
            self.alerts
                .alert(Notification::Error("Plan close already in progress".to_string()));
            return Err(MigratorError::AlreadyPolling(key).into());
        }

        let started = match self.try_update_plan(&PlanValues::close(plan_name)).await {
            Ok(_) => self
                .start_closed_status_polling(plan_name)
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        started.map_err(|e| {
            error!(plan = %plan_name, error = %e, "Plan close request failed");
            self.alerts
                .alert(Notification::Error("Plan close request failed".to_string()));
            e
        })
    }

    /// Close the plan, wait for the close to be confirmed, then delete it.
    /// The delete is never issued unless the Closed condition was observed.
    pub async fn close_and_delete(&self, plan_name: &str) -> Result<()> {
        let handle = self.close_plan(plan_name).await?;

        let outcome = handle.wait().await;
        if outcome != PollOutcome::Succeeded {
            warn!(plan = %plan_name, outcome = ?outcome, "Plan close not confirmed, skipping delete");
            self.alerts
                .alert(Notification::Error("Failed to close plan".to_string()));
            return Err(MigratorError::Migration(format!(
                "plan '{}' was not closed, delete skipped",
                plan_name
            ))
            .into());
        }

        match self.client.delete(&self.plans(), plan_name).await {
            Ok(()) => {
                info!(plan = %plan_name, "Plan closed and deleted");
                self.alerts.alert(Notification::Success(format!(
                    "Successfully removed plan \"{}\"!",
                    plan_name
                )));
                Ok(())
            }
            Err(e) => {
                error!(plan = %plan_name, error = %e, "Plan delete request failed");
                self.alerts
                    .alert(Notification::Error("Plan delete request failed".to_string()));
                Err(e)
            }
        }
    }
}

fn parse_items<T: serde::de::DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(kind = %what, error = %e, "Skipping object that failed to parse");
                None
            }
        })
        .collect()
}

/// Fetch the full PersistentVolume objects for a plan's volumes, usually from
/// the source cluster. Volumes that fail to load are left out.
pub async fn get_pv_resources<C: ResourceClient + ?Sized>(
    client: &C,
    volumes: &[PersistentVolume],
) -> Vec<Value> {
    let resource = ResourceDescriptor::persistent_volume();
    let results = join_all(volumes.iter().map(|pv| client.get(&resource, &pv.name))).await;

    results
        .into_iter()
        .zip(volumes)
        .filter_map(|(result, pv)| match result {
            Ok(object) => Some(object),
            Err(e) => {
                warn!(pv = %pv.name, error = %e, "Failed to fetch persistent volume");
                None
            }
        })
        .collect()
}
