//! # durable-decimal
//!
//! Precision-preserving decimal serialization for durable orchestrations,
//! with a small in-process host that shows the difference it makes.
//!
//! ## Overview
//!
//! Orchestrations hand their inputs to activities as serialized payloads. A
//! high-precision decimal written as a native JSON number passes through
//! `f64` on the way, which keeps only 15-17 significant digits. The
//! [`decimal`] module provides a codec that writes decimals as invariant,
//! locale-independent strings instead, and serde hooks to attach it to
//! individual fields.
//!
//! The `First` orchestration sends four records to the `SayHello` activity.
//! Each record carries the same value twice: once through the codec
//! (`MyNumber`) and once as a plain JSON number (`MyNumber2`). The greetings
//! that come back show which digits survived.
//!
//! ## The codec
//!
//! ```rust
//! use durable_decimal::decimal::{decode, encode, ParseError};
//! use rust_decimal::Decimal;
//!
//! let value = Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_033_288, 27);
//! let text = encode(&value);
//! assert_eq!(text, "1.000000000000000000000033288");
//! assert_eq!(decode(&text).unwrap(), value);
//!
//! // Scale is kept as written
//! assert_eq!(decode("2.20").unwrap().scale(), 2);
//!
//! // Only `.` separates, nothing groups
//! assert!(matches!(decode("2,2"), Err(ParseError::UnexpectedCharacter { .. })));
//! ```
//!
//! ## Running the orchestration
//!
//! ```rust
//! use durable_decimal::{
//!     first, http_start, say_hello_activity, DurableClient, FunctionHost, HostConfig,
//!     OrchestrationRuntimeStatus, StartRequest, FIRST,
//! };
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), durable_decimal::DurableError> {
//! let host = FunctionHost::builder(HostConfig::default())
//!     .activity(say_hello_activity())
//!     .orchestrator(FIRST, first)
//!     .build()?;
//! let client = DurableClient::new(host);
//!
//! let request = StartRequest::new("POST", "http://localhost:7071/api/First_HttpStart");
//! let response = http_start(&client, &request).await?;
//! assert_eq!(response.status_code, 202);
//!
//! let done = client
//!     .wait_for_completion(&response.body.id, Duration::from_secs(5))
//!     .await?;
//! assert_eq!(done.runtime_status, OrchestrationRuntimeStatus::Completed);
//!
//! let greetings: Vec<String> = done.read_output()?.unwrap_or_default();
//! assert_eq!(greetings.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - [`ParseError`]: a decimal literal that is not in the invariant format.
//! - [`SerDesError`]: a payload that could not be written or read.
//! - [`DurableError`]: everything the host, client and orchestrations report.
//!
//! ## Logging
//!
//! The crate logs through `tracing` with `instance_id` and `operation_id`
//! fields. It never installs a subscriber; binaries do that.
//!
//! ## Module Organization
//!
//! - [`decimal`]: the codec and its serde field hooks
//! - [`serdes`]: payload serialization between stages
//! - [`record`]: the record passed to `SayHello` and the demonstration inputs
//! - [`activity`]: activities and their registry
//! - [`orchestration`]: the orchestration context and the `First` orchestrator
//! - [`host`]: the in-process host running instances
//! - [`client`]: scheduling, status queries and the HTTP starter
//! - [`config`]: host configuration
//! - [`error`]: error types

pub mod activity;
pub mod client;
pub mod config;
pub mod decimal;
pub mod error;
pub mod host;
pub mod orchestration;
pub mod record;
pub mod serdes;

pub use activity::{
    say_hello, say_hello_activity, typed_activity, Activity, ActivityContext, ActivityRegistry,
    TypedActivity, SAY_HELLO,
};
pub use client::{
    http_start, CheckStatusResponse, DurableClient, HttpManagementPayload, StartRequest,
};
pub use config::HostConfig;
pub use decimal::{decimal_string_serdes, DecimalStringSerDes, ParseError};
pub use error::{DurableError, DurableResult};
pub use host::{
    FunctionHost, FunctionHostBuilder, OrchestrationMetadata, OrchestrationRuntimeStatus,
};
pub use orchestration::{first, OrchestrationContext, FIRST};
pub use record::{demonstration_set, GreetingData};
pub use serdes::{custom_serdes, CustomSerDes, JsonSerDes, SerDes, SerDesContext, SerDesError};
