//! Messaging response documents.
//!
//! Inbound SMS is always acknowledged with an empty document; forwarding
//! happens out-of-band through the provider's REST API.

use crate::{Result, write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessagingResponse;

impl MessagingResponse {
  pub fn new() -> Self { Self }

  pub fn to_xml(&self) -> Result<String> {
    let mut w = write::document()?;
    write::empty(&mut w, "Response", &[])?;
    write::finish(w)
  }
}
