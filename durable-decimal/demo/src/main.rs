//! First orchestration demo
//!
//! Boots a local host, starts `First` the way the HTTP trigger would, prints
//! the check-status payload, then prints the four greetings. Compare
//! `Number1` (string codec) with `Number2` (native JSON number).

use std::env;
use std::time::Duration;

use durable_decimal::{
    first, http_start, say_hello_activity, DurableClient, DurableError, FunctionHost, HostConfig,
    OrchestrationRuntimeStatus, StartRequest, FIRST,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_REQUEST_URL: &str = "http://localhost:7071/api/First_HttpStart";

#[tokio::main]
async fn main() -> Result<(), DurableError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let host = FunctionHost::builder(HostConfig::from_env())
        .activity(say_hello_activity())
        .orchestrator(FIRST, first)
        .build()?;
    let client = DurableClient::new(host);

    let url = env::var("DEMO_REQUEST_URL").unwrap_or_else(|_| DEFAULT_REQUEST_URL.to_string());
    let response = http_start(&client, &StartRequest::new("POST", url)).await?;

    println!("HTTP {}", response.status_code);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    println!("{}", response.body_json()?);

    let done = client
        .wait_for_completion(&response.body.id, Duration::from_secs(30))
        .await?;

    if done.runtime_status == OrchestrationRuntimeStatus::Failed {
        return Err(DurableError::execution(
            done.failure_details.unwrap_or_else(|| "orchestration failed".to_string()),
        ));
    }

    let greetings: Vec<String> = done.read_output()?.unwrap_or_default();
    tracing::info!(instance_id = %done.instance_id, count = greetings.len(), "Orchestration finished");
    for greeting in greetings {
        println!("{greeting}");
    }

    Ok(())
}
