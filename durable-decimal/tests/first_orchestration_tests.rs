//! End-to-end tests: HTTP start, orchestration, activity, status.

mod common;

use common::*;
use durable_decimal::{
    http_start, DurableError, OrchestrationContext, OrchestrationRuntimeStatus, StartRequest,
};

#[tokio::test]
async fn test_http_start_runs_first_to_completion() {
    let client = first_client();
    let response = http_start(&client, &StartRequest::new("GET", REQUEST_URL))
        .await
        .unwrap();

    assert_eq!(response.status_code, 202);
    let done = client.wait_for_completion(&response.body.id, WAIT).await.unwrap();

    assert_eq!(done.name, "First");
    assert_eq!(done.runtime_status, OrchestrationRuntimeStatus::Completed);
    assert!(done.failure_details.is_none());
    assert!(done.last_updated_time >= done.created_time);

    let greetings: Vec<String> = done.read_output().unwrap().unwrap();
    assert_eq!(greetings.len(), 4);
}

#[tokio::test]
async fn test_codec_field_is_exact_for_every_input() {
    let client = first_client();
    let id = client.schedule_new_orchestration("First", None).await.unwrap();
    let done = client.wait_for_completion(&id, WAIT).await.unwrap();
    let greetings: Vec<String> = done.read_output().unwrap().unwrap();

    let expected = [
        ("Carl", "999999999999999999"),
        ("John", "999999999999999999.0"),
        ("Mary", "1.000000000000000000000033288"),
        ("Bob", "2.2"),
    ];
    for (greeting, (name, number)) in greetings.iter().zip(expected) {
        let prefix = format!("Hello {name}! Your values are Number1: {number} Number2: ");
        assert!(greeting.starts_with(&prefix), "{greeting}");
    }
}

#[tokio::test]
async fn test_native_field_loses_precision_where_f64_cannot_hold_it() {
    let client = first_client();
    let id = client.schedule_new_orchestration("First", None).await.unwrap();
    let done = client.wait_for_completion(&id, WAIT).await.unwrap();
    let greetings: Vec<String> = done.read_output().unwrap().unwrap();

    let number2 = |greeting: &str| -> String {
        greeting
            .rsplit("Number2: ")
            .next()
            .unwrap()
            .trim_end_matches('.')
            .to_string()
    };

    assert_ne!(number2(&greetings[0]), "999999999999999999");
    assert_ne!(number2(&greetings[1]), "999999999999999999.0");
    assert_ne!(number2(&greetings[2]), "1.000000000000000000000033288");
    assert_eq!(greetings[3], "Hello Bob! Your values are Number1: 2.2 Number2: 2.2.");
}

#[tokio::test]
async fn test_failing_activity_fails_the_instance() {
    let client = failing_client();
    let id = client.schedule_new_orchestration("First", None).await.unwrap();
    let done = client.wait_for_completion(&id, WAIT).await.unwrap();

    assert_eq!(done.runtime_status, OrchestrationRuntimeStatus::Failed);
    assert!(done.serialized_output.is_none());
    let details = done.failure_details.unwrap();
    assert!(details.contains("SayHello"));
    assert!(details.contains("activity unavailable"));
}

#[tokio::test]
async fn test_unknown_orchestrator_is_rejected() {
    let client = first_client();
    let err = client
        .schedule_new_orchestration("Second", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DurableError::OrchestratorNotFound { .. }));
}

#[tokio::test]
async fn test_status_of_unknown_instance() {
    let client = first_client();
    assert!(client.get_status("0123456789abcdef0123456789abcdef").await.is_none());
}

#[tokio::test]
async fn test_http_start_rejects_relative_url_without_scheduling() {
    let client = first_client();
    let err = http_start(&client, &StartRequest::new("POST", "/api/First_HttpStart"))
        .await
        .unwrap_err();
    assert!(matches!(err, DurableError::Validation { .. }));
}

#[tokio::test]
async fn test_input_is_recorded_and_readable() {
    use durable_decimal::{FunctionHost, DurableClient};

    let host = FunctionHost::builder(test_config())
        .orchestrator("EchoInput", |ctx: OrchestrationContext| async move {
            let input: Option<serde_json::Value> = ctx.get_input()?;
            Ok::<_, DurableError>(input.unwrap_or_default())
        })
        .build()
        .unwrap();
    let client = DurableClient::new(host);

    let id = client
        .schedule_new_orchestration("EchoInput", Some(serde_json::json!({"amount": "2.20"})))
        .await
        .unwrap();
    let done = client.wait_for_completion(&id, WAIT).await.unwrap();

    assert_eq!(done.serialized_input.as_deref(), Some(r#"{"amount":"2.20"}"#));
    let output: serde_json::Value = done.read_output().unwrap().unwrap();
    assert_eq!(output["amount"], "2.20");
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_completion_times_out() {
    use durable_decimal::{FunctionHost, DurableClient};
    use std::time::Duration;

    let host = FunctionHost::builder(test_config())
        .orchestrator("Slow", |_ctx: OrchestrationContext| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, DurableError>(())
        })
        .build()
        .unwrap();
    let client = DurableClient::new(host);

    let id = client.schedule_new_orchestration("Slow", None).await.unwrap();
    let err = client
        .wait_for_completion(&id, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DurableError::Timeout { instance_id } if instance_id == id));
}

async fn crashing(_ctx: OrchestrationContext) -> Result<String, DurableError> {
    panic!("greeting table missing")
}

#[tokio::test]
async fn test_panicking_orchestrator_fails_instance() {
    use durable_decimal::{DurableClient, FunctionHost};

    let host = FunctionHost::builder(test_config())
        .orchestrator("Crashing", crashing)
        .build()
        .unwrap();
    let client = DurableClient::new(host);

    let id = client.schedule_new_orchestration("Crashing", None).await.unwrap();
    let done = client.wait_for_completion(&id, WAIT).await.unwrap();

    assert_eq!(done.runtime_status, OrchestrationRuntimeStatus::Failed);
    let details = done.failure_details.unwrap();
    assert!(details.contains("orchestrator panicked"), "{details}");
    assert!(details.contains("greeting table missing"), "{details}");
}

#[tokio::test]
async fn test_purge_removes_finished_instance() {
    let client = first_client();
    let id = client.schedule_new_orchestration("First", None).await.unwrap();
    client.wait_for_completion(&id, WAIT).await.unwrap();

    let purged = client.purge_instance(&id).await.unwrap();
    assert_eq!(purged.instance_id, id);
    assert_eq!(purged.runtime_status, OrchestrationRuntimeStatus::Completed);
    assert!(client.get_status(&id).await.is_none());

    let err = client.purge_instance(&id).await.unwrap_err();
    assert!(matches!(err, DurableError::InstanceNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_purge_refuses_running_instance() {
    use durable_decimal::{DurableClient, FunctionHost};
    use std::time::Duration;

    let host = FunctionHost::builder(test_config())
        .orchestrator("Slow", |_ctx: OrchestrationContext| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, DurableError>(())
        })
        .build()
        .unwrap();
    let client = DurableClient::new(host);

    let id = client.schedule_new_orchestration("Slow", None).await.unwrap();
    let err = client.purge_instance(&id).await.unwrap_err();
    assert!(matches!(err, DurableError::Validation { .. }));
    assert!(client.get_status(&id).await.is_some());
}
