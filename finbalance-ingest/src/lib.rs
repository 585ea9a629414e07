//! finbalance-ingest: inbound webhook payloads and the low-level text parsers.

pub mod types;
pub mod parsers;

pub use types::{InboundMessage, WebhookPayload, WHATSAPP_JID_SUFFIX};
pub use parsers::parse_amount;
