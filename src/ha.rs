//! High-availability state extraction.
//!
//! The HA state command answers with a `group` element holding `local-info`
//! and `peer-info`. [`extract`] projects the fields automation cares about
//! into a flat [`HaSnapshot`]. Missing data never fails: a device without HA
//! yields a "standalone, unknown" snapshot.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::xml::{ABSENT, NormalizedResponse, XmlValue};

/// Flattened HA status of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HaSnapshot {
    /// True when the response carried a non-empty `group`.
    pub enabled: bool,
    /// `active-passive`, `active-active`, or `standalone` when absent.
    pub mode: String,
    /// Local state, `unknown` when absent.
    pub state: String,
    /// Peer state, `unknown` when absent.
    pub peer_state: String,
    pub running_sync: String,
    /// Appliance-native flag, `"yes"`/`"no"`.
    pub running_sync_enabled: String,
    /// Appliance-native flag, `"yes"`/`"no"`.
    pub preemptive: String,
    pub priority: String,
    /// Peer management address, empty when absent.
    pub peer_address: String,
    /// The folded response data the snapshot was taken from.
    pub raw: XmlValue,
}

/// Projects HA fields out of a normalized HA state response.
pub fn extract(response: &NormalizedResponse) -> HaSnapshot {
    let group = response.data.get("group").unwrap_or(&ABSENT);
    let local = group.get("local-info").unwrap_or(&ABSENT);
    let peer = group.get("peer-info").unwrap_or(&ABSENT);

    HaSnapshot {
        enabled: !group.is_empty(),
        mode: local.str_or("mode", "standalone").to_string(),
        state: local.str_or("state", "unknown").to_string(),
        peer_state: peer.str_or("state", "unknown").to_string(),
        running_sync: local.str_or("running-sync", "unknown").to_string(),
        running_sync_enabled: local.str_or("running-sync-enabled", "no").to_string(),
        preemptive: local.str_or("preemptive", "no").to_string(),
        priority: local.str_or("priority", "0").to_string(),
        peer_address: peer.str_or("mgmt-ip", "").to_string(),
        raw: response.data.clone(),
    }
}

/// Role of a device inside an HA pair, derived from its state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HaRole {
    Active,
    Passive,
    Standalone,
    /// Transitional or unrecognized state (`initial`, `suspended`, ...).
    Other,
}

impl HaRole {
    /// Classifies an HA state string, case-insensitively.
    pub fn from_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "active" | "active-primary" | "primary" => HaRole::Active,
            "passive" | "active-secondary" | "secondary" => HaRole::Passive,
            "" | "standalone" | "disabled" => HaRole::Standalone,
            _ => HaRole::Other,
        }
    }
}

impl HaSnapshot {
    pub fn role(&self) -> HaRole {
        if !self.enabled {
            return HaRole::Standalone;
        }
        HaRole::from_state(&self.state)
    }
}

/// True when `state` denotes the active member of a pair.
pub fn is_active(state: &str) -> bool {
    HaRole::from_state(state) == HaRole::Active
}

/// True when `state` denotes the passive member of a pair.
pub fn is_passive(state: &str) -> bool {
    HaRole::from_state(state) == HaRole::Passive
}

/// True when `state` denotes a device without HA; an empty state counts.
pub fn is_standalone(state: &str) -> bool {
    HaRole::from_state(state) == HaRole::Standalone
}
