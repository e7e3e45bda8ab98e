//! Orchestrations and the context they use to call activities.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::activity::{ActivityContext, ActivityRegistry, SAY_HELLO};
use crate::decimal;
use crate::error::{DurableError, DurableResult};
use crate::record::demonstration_set;
use crate::serdes::{JsonSerDes, SerDes, SerDesContext};

/// Name under which [`first`] is registered.
pub const FIRST: &str = "First";

/// Handle an orchestrator uses to schedule activities.
///
/// Calls are numbered in the order they are made; the number forms the
/// operation id `"{instance_id}:{sequence}"` seen by the activity.
#[derive(Debug, Clone)]
pub struct OrchestrationContext {
    instance_id: String,
    input: Option<String>,
    registry: Arc<ActivityRegistry>,
    sequence: Arc<AtomicU64>,
}

impl OrchestrationContext {
    /// Creates a context for `instance_id` that dispatches into `registry`.
    pub fn new(instance_id: impl Into<String>, registry: Arc<ActivityRegistry>) -> Self {
        Self {
            instance_id: instance_id.into(),
            input: None,
            registry,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attaches the serialized input the instance was scheduled with.
    pub fn with_input(mut self, input: Option<String>) -> Self {
        self.input = input;
        self
    }

    /// Deserializes the instance input, if one was given.
    pub fn get_input<T>(&self) -> DurableResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let context = SerDesContext::new(self.instance_id.clone(), self.instance_id.clone());
        self.input
            .as_deref()
            .map(|input| JsonSerDes::<T>::new().deserialize(input, &context))
            .transpose()
            .map_err(DurableError::from)
    }

    /// The instance this context belongs to.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Number of activity calls made so far.
    pub fn calls_made(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Calls activity `name` with `input` and waits for its result.
    ///
    /// The input is serialized to a payload before dispatch and the result is
    /// deserialized from the activity's payload, exactly as a remote call would.
    pub async fn call_activity<I, O>(&self, name: &str, input: &I) -> DurableResult<O>
    where
        I: Serialize + DeserializeOwned,
        O: Serialize + DeserializeOwned,
    {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let operation_id = format!("{}:{}", self.instance_id, sequence);
        let serdes_ctx = SerDesContext::new(operation_id.clone(), self.instance_id.clone());

        let activity = self
            .registry
            .get(name)
            .ok_or_else(|| DurableError::ActivityNotFound {
                name: name.to_string(),
            })?;

        let payload = JsonSerDes::<I>::new().serialize(input, &serdes_ctx)?;
        tracing::debug!(
            instance_id = %self.instance_id,
            operation_id = %operation_id,
            activity = name,
            payload = %payload,
            "Scheduling activity"
        );

        let activity_ctx = ActivityContext::new(self.instance_id.clone(), operation_id);
        let output = activity
            .run(&payload, &activity_ctx)
            .await
            .map_err(|e| DurableError::ActivityFailed {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(JsonSerDes::<O>::new().deserialize(&output, &serdes_ctx)?)
    }
}

/// Sends each demonstration record to `SayHello`, one after the other, and
/// collects the greetings.
pub async fn first(ctx: OrchestrationContext) -> DurableResult<Vec<String>> {
    tracing::info!(instance_id = %ctx.instance_id(), "Saying hello.");

    let mut outputs = Vec::new();
    for data in demonstration_set() {
        tracing::info!(
            instance_id = %ctx.instance_id(),
            "Sending {} to {}",
            decimal::encode(&data.my_number),
            data.name.as_deref().unwrap_or_default()
        );
        outputs.push(ctx.call_activity::<_, String>(SAY_HELLO, &data).await?);
    }

    Ok(outputs)
}
