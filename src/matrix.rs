//! Upgrade-path validation against a compatibility matrix.
//!
//! Appliances cannot always jump straight from one release train to another;
//! some transitions must step through intermediate `major.minor` trains. The
//! matrix describing this is owned by the caller (usually a YAML document next
//! to the inventory) and passed to every validation call.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{load_document, parse_json, parse_yaml};
use crate::error::PanosError;
use crate::version::{ParsedVersion, compare_strict};

/// Allowed transitions out of one `major.minor` train.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpgradeEntry {
    /// Trains reachable in a single install.
    #[serde(default)]
    pub direct_upgrade_to: BTreeSet<String>,
    /// Trains reachable only through the listed intermediate trains, in order.
    #[serde(default)]
    pub intermediate_required: BTreeMap<String, Vec<String>>,
}

/// Compatibility matrix keyed by the current `major.minor` train.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UpgradeMatrix {
    pub entries: BTreeMap<String, UpgradeEntry>,
}

/// Result of an upgrade-path check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpgradePath {
    pub valid: bool,
    /// Trains to install before the target, in order. Empty for direct paths.
    pub required_intermediates: Vec<String>,
}

impl UpgradePath {
    fn invalid() -> Self {
        Self {
            valid: false,
            required_intermediates: Vec::new(),
        }
    }

    fn direct() -> Self {
        Self {
            valid: true,
            required_intermediates: Vec::new(),
        }
    }
}

impl UpgradeMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for a `major.minor` train.
    pub fn insert(&mut self, major_minor: impl Into<String>, entry: UpgradeEntry) {
        self.entries.insert(major_minor.into(), entry);
    }

    pub fn entry(&self, major_minor: &str) -> Option<&UpgradeEntry> {
        self.entries.get(major_minor)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PanosError> {
        parse_json(text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, PanosError> {
        parse_yaml(text)
    }

    /// Loads a matrix file; `.json` is read as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PanosError> {
        load_document(path.as_ref())
    }
}

/// Checks whether `current` can be upgraded to `target` under `matrix`.
///
/// Same-version requests are trivially valid, downgrades never are. For a
/// real upgrade the current train must be listed in the matrix and the target
/// train must appear either as a direct upgrade or with its intermediates.
pub fn is_upgrade_path_valid(current: &str, target: &str, matrix: &UpgradeMatrix) -> UpgradePath {
    let (Some(current_version), Some(target_version)) =
        (ParsedVersion::parse(current), ParsedVersion::parse(target))
    else {
        debug!("Upgrade path {current} -> {target}: unparseable version");
        return UpgradePath::invalid();
    };

    match compare_strict(current, target) {
        Ok(Ordering::Equal) => return UpgradePath::direct(),
        Ok(Ordering::Greater) => {
            debug!("Upgrade path {current} -> {target}: downgrade rejected");
            return UpgradePath::invalid();
        }
        Ok(Ordering::Less) => {}
        Err(_) => return UpgradePath::invalid(),
    }

    let current_train = current_version.major_minor();
    let target_train = target_version.major_minor();

    let Some(entry) = matrix.entry(&current_train) else {
        debug!("Upgrade path {current} -> {target}: train {current_train} not in matrix");
        return UpgradePath::invalid();
    };

    if entry.direct_upgrade_to.contains(&target_train) {
        return UpgradePath::direct();
    }

    if let Some(hops) = entry.intermediate_required.get(&target_train) {
        return UpgradePath {
            valid: true,
            required_intermediates: hops.clone(),
        };
    }

    debug!("Upgrade path {current} -> {target}: no route from {current_train} to {target_train}");
    UpgradePath::invalid()
}
