//! Client for scheduling and inspecting orchestration instances, and the
//! HTTP-triggered starter built on it.
//!
//! The starter does no routing of its own: a caller hands it the request's
//! method and URL and gets back the `202 Accepted` check-status response
//! describing where the new instance can be polled or managed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DurableError, DurableResult};
use crate::host::{FunctionHost, OrchestrationMetadata};
use crate::orchestration::FIRST;
use crate::serdes::{JsonSerDes, SerDes, SerDesContext};

const INSTANCES_PATH: [&str; 4] = ["runtime", "webhooks", "durabletask", "instances"];

/// Schedules orchestrations on a [`FunctionHost`] and reports on them.
#[derive(Debug, Clone)]
pub struct DurableClient {
    host: Arc<FunctionHost>,
}

impl DurableClient {
    /// Creates a client for `host`.
    pub fn new(host: Arc<FunctionHost>) -> Self {
        Self { host }
    }

    /// Schedules a new instance of orchestrator `name` and returns its id.
    pub async fn schedule_new_orchestration(
        &self,
        name: &str,
        input: Option<serde_json::Value>,
    ) -> DurableResult<String> {
        let serialized_input = input
            .map(|value| {
                JsonSerDes::<serde_json::Value>::new()
                    .serialize(&value, &SerDesContext::new("input", name))
            })
            .transpose()?;

        self.host.start_instance(name, serialized_input).await
    }

    /// Current status of an instance, or `None` if it was never scheduled.
    pub async fn get_status(&self, instance_id: &str) -> Option<OrchestrationMetadata> {
        self.host.instance(instance_id).await
    }

    /// Deletes the history of a completed or failed instance, the operation
    /// behind `purgeHistoryDeleteUri`. Running instances cannot be purged.
    pub async fn purge_instance(&self, instance_id: &str) -> DurableResult<OrchestrationMetadata> {
        let purged = self.host.purge(instance_id).await?;
        tracing::info!(instance_id = %instance_id, status = ?purged.runtime_status, "Purged instance history");
        Ok(purged)
    }

    /// Polls until the instance reaches a terminal status or `timeout` elapses.
    pub async fn wait_for_completion(
        &self,
        instance_id: &str,
        timeout: Duration,
    ) -> DurableResult<OrchestrationMetadata> {
        let poll_interval = self.host.config().status_poll_interval;

        let wait = async {
            loop {
                let meta = self.get_status(instance_id).await.ok_or_else(|| {
                    DurableError::InstanceNotFound {
                        instance_id: instance_id.to_string(),
                    }
                })?;
                if meta.runtime_status.is_terminal() {
                    return Ok::<_, DurableError>(meta);
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| DurableError::Timeout {
                instance_id: instance_id.to_string(),
            })?
    }

    /// Builds management URIs for `instance_id`, rooted at the origin of `request_url`.
    ///
    /// `{eventName}` and `{text}` are left in place for the caller to fill in.
    pub fn create_http_management_payload(
        &self,
        request_url: &str,
        instance_id: &str,
    ) -> DurableResult<HttpManagementPayload> {
        let mut instance = request_origin(request_url)?;
        instance
            .path_segments_mut()
            .map_err(|()| {
                DurableError::validation(format!("request URL {request_url:?} cannot carry a path"))
            })?
            .clear()
            .extend(INSTANCES_PATH)
            .push(instance_id);

        let config = self.host.config();
        let mut status = instance.clone();
        status
            .query_pairs_mut()
            .append_pair("taskHub", &config.task_hub)
            .append_pair("connection", &config.connection_name);
        let query = status.query().unwrap_or_default();

        Ok(HttpManagementPayload {
            id: instance_id.to_string(),
            send_event_post_uri: format!("{instance}/raiseEvent/{{eventName}}?{query}"),
            terminate_post_uri: format!("{instance}/terminate?reason={{text}}&{query}"),
            purge_history_delete_uri: status.to_string(),
            status_query_get_uri: status.to_string(),
        })
    }

    /// The `202 Accepted` response announcing `instance_id`.
    pub fn create_check_status_response(
        &self,
        request_url: &str,
        instance_id: &str,
    ) -> DurableResult<CheckStatusResponse> {
        let payload = self.create_http_management_payload(request_url, instance_id)?;
        Ok(CheckStatusResponse {
            status_code: 202,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Location".to_string(), payload.status_query_get_uri.clone()),
                ("Retry-After".to_string(), "10".to_string()),
            ],
            body: payload,
        })
    }
}

/// Management URIs for one instance, serialized with camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpManagementPayload {
    /// Instance id
    pub id: String,
    /// GET for the instance status
    pub status_query_get_uri: String,
    /// POST to raise an event, `{eventName}` left as a placeholder
    pub send_event_post_uri: String,
    /// POST to terminate, `{text}` left as a placeholder
    pub terminate_post_uri: String,
    /// DELETE to purge the instance history
    pub purge_history_delete_uri: String,
}

/// The response returned by the HTTP starter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckStatusResponse {
    /// HTTP status code, always 202
    pub status_code: u16,
    /// Response headers in order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: HttpManagementPayload,
}

impl CheckStatusResponse {
    /// Looks up a header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The body as JSON text.
    pub fn body_json(&self) -> DurableResult<String> {
        let context = SerDesContext::new(self.body.id.clone(), self.body.id.clone());
        Ok(JsonSerDes::<HttpManagementPayload>::new().serialize(&self.body, &context)?)
    }
}

/// What the starter needs to know about the incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    /// HTTP method
    pub method: String,
    /// Absolute request URL
    pub url: String,
}

impl StartRequest {
    /// Creates a new StartRequest.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

/// HTTP-triggered starter: schedules a new `First` instance and answers with
/// its check-status response. Accepts `GET` and `POST`.
pub async fn http_start(
    client: &DurableClient,
    request: &StartRequest,
) -> DurableResult<CheckStatusResponse> {
    let method = request.method.to_ascii_uppercase();
    if method != "GET" && method != "POST" {
        return Err(DurableError::validation(format!(
            "method {} is not allowed, use GET or POST",
            request.method
        )));
    }
    // Reject a bad URL before anything is scheduled.
    request_origin(&request.url)?;

    let instance_id = client.schedule_new_orchestration(FIRST, None).await?;
    tracing::info!(instance_id = %instance_id, "Started orchestration with ID = '{}'.", instance_id);

    client.create_check_status_response(&request.url, &instance_id)
}

/// The `http`/`https` origin of `raw`, with path, query and fragment dropped.
fn request_origin(raw: &str) -> DurableResult<Url> {
    let url = Url::parse(raw)
        .map_err(|err| DurableError::validation(format!("invalid request URL {raw:?}: {err}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(DurableError::validation(format!(
            "request URL {raw:?} must use http or https"
        )));
    }

    Url::parse(&url.origin().ascii_serialization())
        .map_err(|err| DurableError::validation(format!("invalid request URL {raw:?}: {err}")))
}
