use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix the gateway appends to individual-chat JIDs
pub const WHATSAPP_JID_SUFFIX: &str = "@s.whatsapp.net";

/// Evolution API `messages.upsert` webhook body, reduced to the fields we
/// read. Every level is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Set by the settings page's "test webhook" button. Any truthy JSON
    /// value counts, not only `true`.
    #[serde(default)]
    pub test: Option<Value>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub key: Option<MessageKey>,
    #[serde(default)]
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(default)]
    pub remote_jid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(default)]
    pub extended_text_message: Option<ExtendedTextMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedTextMessage {
    #[serde(default)]
    pub text: Option<String>,
}

/// Normalized inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    /// Sender number without the JID suffix
    pub sender_phone: Option<String>,
    pub instance_id: Option<String>,
}

impl WebhookPayload {
    pub fn is_test(&self) -> bool {
        self.test.as_ref().is_some_and(truthy)
    }

    /// Message text: plain conversation first, then extended text.
    /// Empty strings count as absent.
    pub fn message_text(&self) -> Option<&str> {
        let message = self.data.as_ref()?.message.as_ref()?;
        non_empty(message.conversation.as_deref()).or_else(|| {
            non_empty(
                message
                    .extended_text_message
                    .as_ref()
                    .and_then(|e| e.text.as_deref()),
            )
        })
    }

    pub fn sender_phone(&self) -> Option<String> {
        let jid = self.data.as_ref()?.key.as_ref()?.remote_jid.as_deref()?;
        let phone = jid.replacen(WHATSAPP_JID_SUFFIX, "", 1);
        if phone.is_empty() { None } else { Some(phone) }
    }

    /// None when the payload carries no message text.
    pub fn inbound(&self) -> Option<InboundMessage> {
        let text = self.message_text()?;
        Some(InboundMessage {
            text: text.to_string(),
            sender_phone: self.sender_phone(),
            instance_id: non_empty(self.instance.as_deref()).map(str::to_string),
        })
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
