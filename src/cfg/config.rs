// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Listener identity and port.
    pub server: ServerConfig,
    /// Backing store endpoints. The core never opens these itself; they are
    /// handed to whichever collaborators the binary wires in.
    pub store: StoreConfig,
    /// Login and moderation policy knobs.
    pub policy: PolicyConfig,
    /// Persistent chat channels seeded at startup.
    #[serde(default)]
    pub channels: Vec<ChannelSeed>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    /// Public domain the server answers for.
    pub domain: String,
    /// TCP port for the HTTP listener.
    pub port: u16,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StoreConfig {
    /// DSN of the shared key/value store holding session state.
    pub redis_dsn: String,
    /// DSN of the relational store behind the account repository.
    pub db_dsn: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PolicyConfig {
    /// Clients older than this many days are forced to update at login.
    #[serde(default = "default_client_max_age_days")]
    pub client_max_age_days: i64,
    /// Notification sent when an account is restricted.
    pub restriction_message: String,
    /// Notification sent to frozen accounts. `{time_until_restriction}` is
    /// substituted with a human-readable duration.
    pub frozen_message: String,
}

fn default_client_max_age_days() -> i64 {
    90
}

/// One persistent channel as declared in the config file. Seeded channels are
/// never temp; membership starts empty.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChannelSeed {
    pub name: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub public_read: bool,
    #[serde(default = "default_true")]
    pub public_write: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates invariants on the parsed value.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.server.port != 0, "server.port must be non-zero");
        ensure!(
            !self.server.domain.is_empty(),
            "server.domain must not be empty"
        );
        ensure!(
            self.policy.client_max_age_days >= 1,
            "policy.client_max_age_days must be >= 1"
        );

        for seed in &self.channels {
            ensure!(
                seed.name.starts_with('#'),
                "channel name {:?} must start with '#'",
                seed.name
            );
        }

        Ok(())
    }
}
