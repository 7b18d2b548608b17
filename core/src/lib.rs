//! Synchronous client for the Rundeck REST API (projects and system ACL
//! policies).
//!
//! # Overview
//! `RundeckClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern).
//! `BlockingClient` pairs it with a `Transport` and exposes one method per
//! operation. With the default `ureq` feature, `UreqTransport` is that
//! transport.
//!
//! # Design
//! - Domain types (`Project`, `AclPolicies`) are separate from the JSON/XML
//!   wire schemas, which stay private to the crate.
//! - The response `Content-Type` (or, failing that, the configured format)
//!   selects the decoder; both paths yield the same `Project`.
//! - A non-matching status is a `TransportError` and is returned unchanged,
//!   except for ACL uploads whose error body lists rejected policies, which
//!   become `Error::PolicyValidation`.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;
pub mod validation;
mod wire;

pub use blocking::BlockingClient;
pub use client::RundeckClient;
pub use config::{ClientConfig, Format};
pub use error::{Error, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{AclPolicies, AclPolicyResource, Project, ProjectConfig};
pub use validation::classify_validation_failure;
