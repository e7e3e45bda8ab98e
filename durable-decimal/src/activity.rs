//! Activities: the units of work an orchestration calls.
//!
//! Activities exchange string payloads with the orchestration; the typed
//! adapter built by [`typed_activity`] decodes the input and encodes the output
//! with [`JsonSerDes`], so the record's field-level decimal hooks apply on both
//! sides of the call.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::decimal;
use crate::error::{DurableError, DurableResult};
use crate::record::GreetingData;
use crate::serdes::{JsonSerDes, SerDes, SerDesContext};

/// Name under which [`say_hello`] is registered.
pub const SAY_HELLO: &str = "SayHello";

/// Identifies the call an activity is serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityContext {
    /// The calling orchestration instance
    pub instance_id: String,
    /// `"{instance_id}:{sequence}"` of this call
    pub operation_id: String,
}

impl ActivityContext {
    /// Creates a new ActivityContext.
    pub fn new(instance_id: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            operation_id: operation_id.into(),
        }
    }

    fn serdes_context(&self) -> SerDesContext {
        SerDesContext::new(self.operation_id.clone(), self.instance_id.clone())
    }
}

/// An activity operating on serialized payloads.
#[async_trait]
pub trait Activity: Send + Sync {
    /// The name orchestrations call the activity by.
    fn name(&self) -> &str;

    /// Runs the activity on a serialized input and returns the serialized output.
    async fn run(&self, input: &str, ctx: &ActivityContext) -> DurableResult<String>;
}

type BoxedHandler<I, O> = Box<
    dyn Fn(I, ActivityContext) -> Pin<Box<dyn Future<Output = DurableResult<O>> + Send>>
        + Send
        + Sync,
>;

/// Adapter from a typed async function to an [`Activity`].
pub struct TypedActivity<I, O> {
    name: String,
    handler: BoxedHandler<I, O>,
    serdes_in: JsonSerDes<I>,
    serdes_out: JsonSerDes<O>,
}

impl<I, O> fmt::Debug for TypedActivity<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedActivity")
            .field("name", &self.name)
            .finish()
    }
}

/// Wraps `handler` as an activity registered under `name`.
pub fn typed_activity<I, O, F, Fut>(name: impl Into<String>, handler: F) -> TypedActivity<I, O>
where
    F: Fn(I, ActivityContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DurableResult<O>> + Send + 'static,
{
    TypedActivity {
        name: name.into(),
        handler: Box::new(
            move |input: I, ctx: ActivityContext| -> Pin<Box<dyn Future<Output = DurableResult<O>> + Send>> {
                Box::pin(handler(input, ctx))
            },
        ),
        serdes_in: JsonSerDes::new(),
        serdes_out: JsonSerDes::new(),
    }
}

#[async_trait]
impl<I, O> Activity for TypedActivity<I, O>
where
    I: Serialize + DeserializeOwned + Send + 'static,
    O: Serialize + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &str, ctx: &ActivityContext) -> DurableResult<String> {
        let serdes_ctx = ctx.serdes_context();
        let input = self.serdes_in.deserialize(input, &serdes_ctx)?;
        let output = (self.handler)(input, ctx.clone()).await?;
        Ok(self.serdes_out.serialize(&output, &serdes_ctx)?)
    }
}

/// Activities known to a host, by name.
#[derive(Default)]
pub struct ActivityRegistry {
    activities: HashMap<String, Arc<dyn Activity>>,
}

impl ActivityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an activity. Names must be unique.
    pub fn register<A>(&mut self, activity: A) -> DurableResult<()>
    where
        A: Activity + 'static,
    {
        let name = activity.name().to_string();
        if self.activities.contains_key(&name) {
            return Err(DurableError::validation(format!(
                "activity '{name}' is already registered"
            )));
        }
        self.activities.insert(name, Arc::new(activity));
        Ok(())
    }

    /// Looks up an activity by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Activity>> {
        self.activities.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.activities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("activities", &self.names())
            .finish()
    }
}

/// Greets the record's name and echoes both decimal fields as received.
pub async fn say_hello(data: GreetingData, ctx: ActivityContext) -> DurableResult<String> {
    tracing::info!(
        instance_id = %ctx.instance_id,
        operation_id = %ctx.operation_id,
        name = data.name.as_deref().unwrap_or_default(),
        number1 = %decimal::encode(&data.my_number),
        number2 = %decimal::encode(&data.my_number2),
        "Received greeting values"
    );
    Ok(data.greeting())
}

/// The `SayHello` activity, ready to register.
pub fn say_hello_activity() -> TypedActivity<GreetingData, String> {
    typed_activity(SAY_HELLO, say_hello)
}
