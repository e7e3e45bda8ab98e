//! Shared fixtures for integration tests.

#![allow(dead_code)] // Not every test file uses every helper

use std::time::Duration;

use durable_decimal::{
    first, say_hello_activity, typed_activity, ActivityContext, DurableClient, DurableError,
    FunctionHost, HostConfig, FIRST,
};

pub const REQUEST_URL: &str = "http://localhost:7071/api/First_HttpStart";
pub const WAIT: Duration = Duration::from_secs(5);

/// Host config polling fast enough for tests.
pub fn test_config() -> HostConfig {
    HostConfig::default().with_status_poll_interval(Duration::from_millis(5))
}

/// A client for a host running `First` with the real `SayHello`.
pub fn first_client() -> DurableClient {
    let host = FunctionHost::builder(test_config())
        .activity(say_hello_activity())
        .orchestrator(FIRST, first)
        .build()
        .unwrap();
    DurableClient::new(host)
}

/// A client for a host whose `SayHello` always fails.
pub fn failing_client() -> DurableClient {
    let host = FunctionHost::builder(test_config())
        .activity(typed_activity(
            "SayHello",
            |_: serde_json::Value, _ctx: ActivityContext| async {
                Err::<String, DurableError>(DurableError::execution("activity unavailable"))
            },
        ))
        .orchestrator(FIRST, first)
        .build()
        .unwrap();
    DurableClient::new(host)
}
