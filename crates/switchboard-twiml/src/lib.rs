//! Declarative response documents for telephony webhooks.
//!
//! A webhook answers with a document of verbs (`Say`, `Gather`, `Dial`, …)
//! that the provider executes against the live call. This crate models those
//! documents as plain values so call-flow code can be tested by inspecting
//! verbs, and serializes them to XML with `quick-xml`.

mod write;

pub mod error;
pub mod messaging;
pub mod voice;

pub use error::{Error, Result};
pub use messaging::MessagingResponse;
pub use voice::{Gather, Method, Record, Say, Verb, VoiceResponse};

/// Media type providers expect on webhook responses.
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
