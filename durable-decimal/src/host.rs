//! In-process function host.
//!
//! The host owns the registered activities and orchestrators and runs every
//! scheduled instance as a tokio task. Instance state lives in memory only;
//! there is no replay and no retry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::activity::{Activity, ActivityRegistry};
use crate::config::HostConfig;
use crate::error::{DurableError, DurableResult};
use crate::orchestration::OrchestrationContext;
use crate::serdes::{JsonSerDes, SerDes, SerDesContext};

type OrchestratorFuture = Pin<Box<dyn Future<Output = DurableResult<String>> + Send>>;
type OrchestratorFn = Arc<dyn Fn(OrchestrationContext) -> OrchestratorFuture + Send + Sync>;

/// Lifecycle of an orchestration instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationRuntimeStatus {
    /// Scheduled, not yet picked up
    Pending,
    /// Orchestrator is executing
    Running,
    /// Orchestrator returned a result
    Completed,
    /// Orchestrator returned an error
    Failed,
}

impl OrchestrationRuntimeStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of an instance's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationMetadata {
    /// Instance id
    pub instance_id: String,
    /// Orchestrator name
    pub name: String,
    /// Current status
    pub runtime_status: OrchestrationRuntimeStatus,
    /// When the instance was scheduled
    pub created_time: DateTime<Utc>,
    /// When the status last changed
    pub last_updated_time: DateTime<Utc>,
    /// JSON input, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized_input: Option<String>,
    /// JSON output once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized_output: Option<String>,
    /// Error message once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_details: Option<String>,
}

impl OrchestrationMetadata {
    /// Deserializes the output of a completed instance.
    pub fn read_output<T>(&self) -> DurableResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let context = SerDesContext::new(self.instance_id.clone(), self.instance_id.clone());
        self.serialized_output
            .as_deref()
            .map(|output| JsonSerDes::<T>::new().deserialize(output, &context))
            .transpose()
            .map_err(DurableError::from)
    }
}

/// Registered functions plus the state of every scheduled instance.
pub struct FunctionHost {
    config: HostConfig,
    activities: Arc<ActivityRegistry>,
    orchestrators: HashMap<String, OrchestratorFn>,
    instances: RwLock<HashMap<String, OrchestrationMetadata>>,
}

impl fmt::Debug for FunctionHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut orchestrators: Vec<&str> = self.orchestrators.keys().map(String::as_str).collect();
        orchestrators.sort_unstable();
        f.debug_struct("FunctionHost")
            .field("config", &self.config)
            .field("activities", &self.activities)
            .field("orchestrators", &orchestrators)
            .finish()
    }
}

impl FunctionHost {
    /// Starts building a host.
    pub fn builder(config: HostConfig) -> FunctionHostBuilder {
        FunctionHostBuilder {
            config,
            activities: ActivityRegistry::new(),
            orchestrators: HashMap::new(),
            error: None,
        }
    }

    /// The host's configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Schedules a new instance of orchestrator `name` and returns its id.
    ///
    /// Must be called from within a tokio runtime; the instance runs as a
    /// spawned task.
    pub(crate) async fn start_instance(
        self: &Arc<Self>,
        name: &str,
        serialized_input: Option<String>,
    ) -> DurableResult<String> {
        let orchestrator = self
            .orchestrators
            .get(name)
            .cloned()
            .ok_or_else(|| DurableError::OrchestratorNotFound {
                name: name.to_string(),
            })?;

        let instance_id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        self.instances.write().await.insert(
            instance_id.clone(),
            OrchestrationMetadata {
                instance_id: instance_id.clone(),
                name: name.to_string(),
                runtime_status: OrchestrationRuntimeStatus::Pending,
                created_time: now,
                last_updated_time: now,
                serialized_input: serialized_input.clone(),
                serialized_output: None,
                failure_details: None,
            },
        );

        let host = Arc::clone(self);
        let id = instance_id.clone();
        let ctx = OrchestrationContext::new(id.clone(), Arc::clone(&self.activities))
            .with_input(serialized_input);
        tokio::spawn(async move {
            host.update(&id, |meta| meta.runtime_status = OrchestrationRuntimeStatus::Running)
                .await;

            // A panicking orchestrator arrives as a JoinError and fails the instance.
            let outcome = match tokio::spawn(async move { orchestrator(ctx).await }).await {
                Ok(result) => result,
                Err(join_error) => Err(DurableError::execution(panic_message(join_error))),
            };

            match outcome {
                Ok(output) => {
                    tracing::info!(instance_id = %id, "Orchestration completed");
                    host.update(&id, |meta| {
                        meta.runtime_status = OrchestrationRuntimeStatus::Completed;
                        meta.serialized_output = Some(output);
                    })
                    .await;
                }
                Err(error) => {
                    tracing::error!(instance_id = %id, error = %error, "Orchestration failed");
                    host.update(&id, |meta| {
                        meta.runtime_status = OrchestrationRuntimeStatus::Failed;
                        meta.failure_details = Some(error.to_string());
                    })
                    .await;
                }
            }
        });

        Ok(instance_id)
    }

    /// Current snapshot of an instance.
    pub(crate) async fn instance(&self, instance_id: &str) -> Option<OrchestrationMetadata> {
        self.instances.read().await.get(instance_id).cloned()
    }

    /// Removes a finished instance and returns its last snapshot.
    pub(crate) async fn purge(&self, instance_id: &str) -> DurableResult<OrchestrationMetadata> {
        let mut instances = self.instances.write().await;
        match instances.get(instance_id) {
            None => {
                return Err(DurableError::InstanceNotFound {
                    instance_id: instance_id.to_string(),
                })
            }
            Some(meta) if !meta.runtime_status.is_terminal() => {
                return Err(DurableError::validation(format!(
                    "instance '{instance_id}' is {:?} and cannot be purged until it finishes",
                    meta.runtime_status
                )))
            }
            Some(_) => {}
        }

        instances
            .remove(instance_id)
            .ok_or_else(|| DurableError::InstanceNotFound {
                instance_id: instance_id.to_string(),
            })
    }

    async fn update(&self, instance_id: &str, apply: impl FnOnce(&mut OrchestrationMetadata)) {
        if let Some(meta) = self.instances.write().await.get_mut(instance_id) {
            apply(meta);
            meta.last_updated_time = Utc::now();
        }
    }
}

fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|msg| msg.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            format!("orchestrator panicked: {detail}")
        }
        Err(error) => format!("orchestrator task did not finish: {error}"),
    }
}

/// Collects registrations for a [`FunctionHost`].
pub struct FunctionHostBuilder {
    config: HostConfig,
    activities: ActivityRegistry,
    orchestrators: HashMap<String, OrchestratorFn>,
    error: Option<DurableError>,
}

impl FunctionHostBuilder {
    /// Registers an activity.
    pub fn activity<A>(mut self, activity: A) -> Self
    where
        A: Activity + 'static,
    {
        if let Err(error) = self.activities.register(activity) {
            self.error.get_or_insert(error);
        }
        self
    }

    /// Registers an orchestrator whose output is stored as JSON.
    pub fn orchestrator<O, F, Fut>(mut self, name: impl Into<String>, orchestrator: F) -> Self
    where
        O: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(OrchestrationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DurableResult<O>> + Send + 'static,
    {
        let name = name.into();
        if self.orchestrators.contains_key(&name) {
            self.error.get_or_insert(DurableError::validation(format!(
                "orchestrator '{name}' is already registered"
            )));
            return self;
        }

        let wrapped: OrchestratorFn = Arc::new(move |ctx: OrchestrationContext| -> OrchestratorFuture {
            let instance_id = ctx.instance_id().to_string();
            let context = SerDesContext::new(instance_id.clone(), instance_id);
            let run = orchestrator(ctx);
            Box::pin(async move {
                let output = run.await?;
                Ok(JsonSerDes::<O>::new().serialize(&output, &context)?)
            })
        });
        self.orchestrators.insert(name, wrapped);
        self
    }

    /// Finishes the host, failing on the first registration error.
    pub fn build(self) -> DurableResult<Arc<FunctionHost>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Arc::new(FunctionHost {
            config: self.config,
            activities: Arc::new(self.activities),
            orchestrators: self.orchestrators,
            instances: RwLock::new(HashMap::new()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::say_hello_activity;
    use crate::orchestration::{first, FIRST};

    #[test]
    fn test_builder_rejects_duplicate_orchestrator() {
        let err = FunctionHost::builder(HostConfig::default())
            .orchestrator(FIRST, first)
            .orchestrator(FIRST, first)
            .build()
            .unwrap_err();
        assert!(matches!(err, DurableError::Validation { .. }));
    }

    #[test]
    fn test_builder_rejects_duplicate_activity() {
        let err = FunctionHost::builder(HostConfig::default())
            .activity(say_hello_activity())
            .activity(say_hello_activity())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("SayHello"));
    }

    #[test]
    fn test_runtime_status_terminal() {
        assert!(!OrchestrationRuntimeStatus::Pending.is_terminal());
        assert!(!OrchestrationRuntimeStatus::Running.is_terminal());
        assert!(OrchestrationRuntimeStatus::Completed.is_terminal());
        assert!(OrchestrationRuntimeStatus::Failed.is_terminal());
    }

    #[tokio::test]
    async fn test_start_unknown_orchestrator() {
        let host = FunctionHost::builder(HostConfig::default()).build().unwrap();
        let err = host.start_instance("Missing", None).await.unwrap_err();
        assert!(matches!(err, DurableError::OrchestratorNotFound { name } if name == "Missing"));
    }

    #[tokio::test]
    async fn test_instance_ids_are_32_hex_chars() {
        let host = FunctionHost::builder(HostConfig::default())
            .activity(say_hello_activity())
            .orchestrator(FIRST, first)
            .build()
            .unwrap();

        let id = host.start_instance(FIRST, None).await.unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(host.instance(&id).await.is_some());
    }
}
