// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

/// Client fingerprint carried in the login blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub running_under_wine: bool,

    pub osu_md5: String,
    pub adapters_md5: String,
    pub uninstall_md5: String,
    pub disk_md5: String,

    pub adapters: Vec<String>,
}

impl HardwareInfo {
    /// Splits the adapter field of the login blob. `runningunderwine` means
    /// there are no adapters to report; otherwise the field is a dot-joined
    /// MAC list with a trailing delimiter.
    pub fn parse_adapters(adapters_str: &str) -> Option<(Vec<String>, bool)> {
        let running_under_wine = adapters_str == "runningunderwine";

        let trimmed = adapters_str.strip_suffix('.').unwrap_or(adapters_str);
        let adapters: Vec<String> = trimmed
            .split('.')
            .filter(|adapter| !adapter.is_empty())
            .map(str::to_string)
            .collect();

        if !running_under_wine && adapters.is_empty() {
            return None;
        }

        Some((adapters, running_under_wine))
    }
}

/// One row of the IEEE OUI registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OuiEntry {
    pub registry: String,
    pub assignment: String,
    pub organization_name: String,
    pub organization_address: String,
}
