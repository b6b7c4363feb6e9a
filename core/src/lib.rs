//! Sequential REST batch loader.
//!
//! # Overview
//! Turns a batch of in-memory records into an ordered series of HTTP calls
//! against one configured endpoint: every `create` record is POSTed to the
//! base URL, every `update` record is POSTed to `<base>/<id>`, and every
//! `delete` record is DELETEd at `<base>/<id>`. Phases run in that order, one
//! request at a time, and the first failure ends the batch.
//!
//! # Design
//! - `EndpointConfig` is built once from a URL or a descriptor and never
//!   changes; update/delete are enabled by configuring an identifier field.
//! - `RequestBuilder` is pure; the caller-supplied `Transport` is the only I/O
//!   boundary, so the crate carries no HTTP client of its own.
//! - `RestLoader::plan` builds every request synchronously, surfacing
//!   configuration errors before anything is sent; `RestLoader::load` then
//!   executes the plan phase by phase.
//! - No retries, backoff or parallel dispatch. Those belong to the caller or
//!   the transport.

pub mod builder;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod http;
pub mod loader;
pub mod types;

pub use builder::{Operation, RequestBuilder};
pub use endpoint::{EndpointConfig, EndpointDescriptor, EndpointSource};
pub use error::{ConfigError, LoadError, CONFIGURATION_ERROR, STATUS_CODE_ERROR, TRANSPORT_ERROR};
pub use executor::SequentialExecutor;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use loader::{LoadPlan, LoadState, RestLoader};
pub use types::{Batch, BatchResult, Phase, PhaseResult, Record, Records};
