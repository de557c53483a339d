//! Credential bundle parsing and validation.
//!
//! A provisioning submission arrives as a small JSON document written by the
//! installer's app:
//!
//! ```json
//! { "wifi_ssid": "HomeNet", "wifi_password": "…", "api_key": "…",
//!   "conn_timeout": 45 }
//! ```
//!
//! The bundle is built from untrusted input: every field is trimmed and
//! validated before it reaches the state machine, and a rejected submission
//! leaves the machine untouched. Bundles live only as long as the attempt
//! they trigger plus the persist that follows a successful association.

use serde::Deserialize;

pub use crate::error::ProvisioningError;

// ───────────────────────────────────────────────────────────────
// Storage keys (shared with the NVS adapter)
// ───────────────────────────────────────────────────────────────

/// NVS namespace holding the credential set.
pub const CRED_NAMESPACE: &str = "cfg";

pub const KEY_NETWORK_ID: &str = "wifi_ssid";
pub const KEY_SECRET: &str = "wifi_password";
pub const KEY_ACCESS_TOKEN: &str = "api_key";
pub const KEY_TIMEOUT_OVERRIDE: &str = "conn_timeout";

const MAX_SSID_LEN: usize = 32;
const MAX_SECRET_LEN: usize = 64;
const MIN_WPA2_SECRET_LEN: usize = 8;
const MAX_TOKEN_LEN: usize = 64;
/// Accepted range for the per-device connection timeout override (ticks).
const TIMEOUT_OVERRIDE_RANGE: core::ops::RangeInclusive<u32> = 1..=3600;

// ───────────────────────────────────────────────────────────────
// Bundle
// ───────────────────────────────────────────────────────────────

/// A validated set of provisioning credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    pub network_id: heapless::String<32>,
    pub secret: heapless::String<64>,
    pub access_token: heapless::String<64>,
    /// Optional per-device override of `connect_timeout_ticks`.
    pub timeout_override: Option<u32>,
}

/// Raw wire shape of a submission; every field optional so that missing
/// keys surface as typed rejections rather than serde errors.
#[derive(Deserialize)]
struct Submission {
    wifi_ssid: Option<String>,
    wifi_password: Option<String>,
    api_key: Option<String>,
    conn_timeout: Option<u32>,
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_network_id(ssid: &str) -> Result<(), ProvisioningError> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || !is_printable_ascii(ssid) {
        return Err(ProvisioningError::InvalidNetworkId);
    }
    Ok(())
}

fn validate_secret(secret: &str) -> Result<(), ProvisioningError> {
    if secret.is_empty() {
        return Ok(()); // open network
    }
    if secret.len() < MIN_WPA2_SECRET_LEN || secret.len() > MAX_SECRET_LEN {
        return Err(ProvisioningError::InvalidSecret);
    }
    Ok(())
}

fn validate_access_token(token: &str) -> Result<(), ProvisioningError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN || !is_printable_ascii(token) {
        return Err(ProvisioningError::InvalidAccessToken);
    }
    Ok(())
}

impl CredentialBundle {
    /// Parse and validate a raw gateway payload.
    pub fn from_json(payload: &str) -> Result<Self, ProvisioningError> {
        let raw: Submission =
            serde_json::from_str(payload).map_err(|_| ProvisioningError::MalformedPayload)?;

        let network_id = raw.wifi_ssid.ok_or(ProvisioningError::MissingNetworkId)?;
        let secret = raw.wifi_password.ok_or(ProvisioningError::MissingSecret)?;
        let access_token = raw.api_key.ok_or(ProvisioningError::MissingAccessToken)?;

        Self::build(
            network_id.trim(),
            secret.trim(),
            access_token.trim(),
            raw.conn_timeout,
        )
    }

    /// Validate trimmed fields and assemble the bundle.
    pub fn build(
        network_id: &str,
        secret: &str,
        access_token: &str,
        timeout_override: Option<u32>,
    ) -> Result<Self, ProvisioningError> {
        validate_network_id(network_id)?;
        validate_secret(secret)?;
        validate_access_token(access_token)?;

        if let Some(ticks) = timeout_override {
            if !TIMEOUT_OVERRIDE_RANGE.contains(&ticks) {
                return Err(ProvisioningError::InvalidTimeoutOverride);
            }
        }

        let mut bundle = Self {
            network_id: heapless::String::new(),
            secret: heapless::String::new(),
            access_token: heapless::String::new(),
            timeout_override,
        };
        bundle
            .network_id
            .push_str(network_id)
            .map_err(|_| ProvisioningError::InvalidNetworkId)?;
        bundle
            .secret
            .push_str(secret)
            .map_err(|_| ProvisioningError::InvalidSecret)?;
        bundle
            .access_token
            .push_str(access_token)
            .map_err(|_| ProvisioningError::InvalidAccessToken)?;
        Ok(bundle)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
