// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, ensure};
use dashmap::DashMap;
use tracing::info;

use crate::models::hardware::OuiEntry;

const OUI_CSV_URL: &str = "https://standards-oui.ieee.org/oui/oui.csv";
const OUI_CACHE_MAX_AGE: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// MAC-prefix registry used to sanity-check reported adapters at login.
/// Backed by the IEEE CSV with a 10-day on-disk cache.
pub struct OuiRepository {
    http: reqwest::Client,
    cache_path: PathBuf,
    entries: DashMap<String, OuiEntry>,
}

impl OuiRepository {
    pub fn new<P: AsRef<Path>>(cache_path: P) -> Self {
        OuiRepository {
            http: reqwest::Client::new(),
            cache_path: cache_path.as_ref().to_path_buf(),
            entries: DashMap::new(),
        }
    }

    /// Looks up the first six hex characters of a MAC. `None` means the
    /// prefix is not registered.
    pub async fn fetch_oui(&self, mac: &str) -> Result<Option<OuiEntry>> {
        if self.entries.is_empty() {
            self.update_cache().await?;
        }

        let prefix: String = mac.chars().take(6).collect::<String>().to_uppercase();
        Ok(self.entries.get(&prefix).map(|entry| entry.clone()))
    }

    pub async fn update_cache(&self) -> Result<()> {
        let csv_data = if self.valid_cache_file() {
            tokio::fs::read_to_string(&self.cache_path)
                .await
                .context("failed to read OUI cache file")?
        } else {
            let body = self.download().await?;
            tokio::fs::write(&self.cache_path, &body)
                .await
                .context("failed to write OUI cache file")?;
            body
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_data.as_bytes());

        self.entries.clear();
        for record in reader.records() {
            let record = record.context("malformed OUI csv row")?;
            if record.len() < 4 {
                continue;
            }

            let entry = OuiEntry {
                registry: record[0].to_string(),
                assignment: record[1].to_string(),
                organization_name: record[2].to_string(),
                organization_address: record[3].to_string(),
            };
            self.entries.insert(entry.assignment.clone(), entry);
        }

        info!("loaded {} OUI assignments", self.entries.len());
        Ok(())
    }

    async fn download(&self) -> Result<String> {
        let response = self
            .http
            .get(OUI_CSV_URL)
            .send()
            .await
            .context("failed to fetch OUI csv")?;
        ensure!(
            response.status().is_success(),
            "OUI csv fetch returned {}",
            response.status()
        );

        Ok(response.text().await?)
    }

    fn valid_cache_file(&self) -> bool {
        let Ok(metadata) = std::fs::metadata(&self.cache_path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }

        metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age < OUI_CACHE_MAX_AGE)
    }
}
