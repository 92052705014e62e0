// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static OSU_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^b(?P<date>\d{8})(?:\.(?P<revision>\d))?(?P<stream>beta|cuttingedge|dev|tourney)?$",
    )
    .expect("osu version regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStream {
    Stable,
    Beta,
    Cuttingedge,
    Dev,
    Tourney,
}

impl fmt::Display for ReleaseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStream::Stable => "stable",
            ReleaseStream::Beta => "beta",
            ReleaseStream::Cuttingedge => "cuttingedge",
            ReleaseStream::Dev => "dev",
            ReleaseStream::Tourney => "tourney",
        };
        f.write_str(name)
    }
}

/// Client build identity, e.g. `b20230228.2cuttingedge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsuVersion {
    pub date: NaiveDate,
    pub stream: ReleaseStream,
    pub revision: u8,
}

impl OsuVersion {
    pub fn parse(osu_version: &str) -> Option<Self> {
        let captures = OSU_VERSION.captures(osu_version)?;

        let raw_date = &captures["date"];
        let date = NaiveDate::from_ymd_opt(
            raw_date[0..4].parse().ok()?,
            raw_date[4..6].parse().ok()?,
            raw_date[6..8].parse().ok()?,
        )?;

        let revision = captures
            .name("revision")
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        let stream = match captures.name("stream").map(|m| m.as_str()) {
            Some("beta") => ReleaseStream::Beta,
            Some("cuttingedge") => ReleaseStream::Cuttingedge,
            Some("dev") => ReleaseStream::Dev,
            Some("tourney") => ReleaseStream::Tourney,
            _ => ReleaseStream::Stable,
        };

        Some(OsuVersion {
            date,
            stream,
            revision,
        })
    }
}

impl fmt::Display for OsuVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.date.format("%Y%m%d"))?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if self.stream != ReleaseStream::Stable {
            write!(f, "{}", self.stream)?;
        }
        Ok(())
    }
}
