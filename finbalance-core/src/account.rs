//! Account-side records the webhook consults: phone links and gateway
//! credentials.

use serde::{Deserialize, Serialize};

/// Links a WhatsApp number to an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
    /// Digits only, as the gateway reports them (no `@s.whatsapp.net`)
    pub phone_number: Option<String>,
    pub full_name: Option<String>,
}

/// Per-user Evolution API settings. Every field is optional because the
/// settings page saves partial forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GatewaySettings {
    pub user_id: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub instance_name: Option<String>,
}

/// Resolved credentials for one outbound send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayCredentials {
    pub base_url: String,
    pub api_key: String,
    pub instance_name: String,
}

impl GatewaySettings {
    /// Usable credentials, or None when the URL or key is missing.
    /// `fallback_instance` fills an empty instance name.
    pub fn credentials(&self, fallback_instance: &str) -> Option<GatewayCredentials> {
        let base_url = non_empty(self.api_url.as_deref())?;
        let api_key = non_empty(self.api_key.as_deref())?;
        let instance_name = non_empty(self.instance_name.as_deref()).unwrap_or(fallback_instance);
        Some(GatewayCredentials {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            instance_name: instance_name.to_string(),
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
