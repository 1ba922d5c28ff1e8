//! Synchronous client core for the Feedly cloud API.
//!
//! # Overview
//! Every endpoint call runs through one pipeline: build an `HttpRequest`,
//! send it through an injected [`Transport`], reject non-2xx statuses, then
//! classify the JSON body as a [`Resource`], a [`Collection`], or a bare
//! [`ApiObject::Success`].
//!
//! # Design
//! - `FeedlrClient` is stateless: it holds an immutable `ClientConfig` and a
//!   transport, so it is safe to share wherever the transport is.
//! - Transport, status and parse failures are all translated into
//!   [`Error`]; [`Error::kind`] gives a flat tag to match on.
//! - Caller input is coerced through [`RequestInput`]. Payloads accept
//!   mappings or sequences, query params only mappings.
//! - The `ureq` feature (on by default) provides [`UreqTransport`]; without
//!   it the crate does no I/O of its own.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod input;
pub mod object;
pub mod transport;

pub use client::{verify_success, FeedlrClient};
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, ErrorResponse, Result};
pub use http::{escape_id, HttpMethod, HttpRequest, HttpResponse, RateLimit};
pub use input::{input_to_params, input_to_payload, Json, Params, Payload, RequestInput};
pub use object::{classify, ApiObject, Collection, Resource};
pub use transport::{Transport, TransportError};

#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
