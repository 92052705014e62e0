// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result, ensure};

/// The decoded tokenless request body:
/// `username\npassword_md5\nversion|utc_offset|display_city|hashes|pm_private`
/// where `hashes` is five colon-separated md5-ish fields with a trailing
/// delimiter.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginData {
    pub username: String,
    pub password_md5: String,
    pub osu_version: String,
    pub utc_offset: i32,
    pub display_city: bool,
    pub pm_private: bool,
    pub osu_path_md5: String,
    pub adapters_str: String,
    pub adapters_md5: String,
    pub uninstall_md5: String,
    pub disk_signature_md5: String,
}

impl LoginData {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body).context("login body is not utf-8")?;

        let mut lines = text.splitn(3, '\n');
        let username = lines.next().context("missing username")?;
        let password_md5 = lines.next().context("missing password")?;
        let client_line = lines.next().context("missing client line")?;

        let fields: Vec<&str> = client_line.trim_end_matches('\n').split('|').collect();
        ensure!(fields.len() == 5, "client line must have 5 fields");

        let client_hashes = fields[3]
            .strip_suffix(':')
            .context("client hashes must end with a delimiter")?;
        let hashes: Vec<&str> = client_hashes.split(':').collect();
        ensure!(hashes.len() == 5, "client hashes must have 5 fields");

        Ok(LoginData {
            username: username.to_string(),
            password_md5: password_md5.to_string(),
            osu_version: fields[0].to_string(),
            utc_offset: fields[1].parse().context("bad utc offset")?,
            display_city: fields[2] == "1",
            pm_private: fields[4] == "1",
            osu_path_md5: hashes[0].to_string(),
            adapters_str: hashes[1].to_string(),
            adapters_md5: hashes[2].to_string(),
            uninstall_md5: hashes[3].to_string(),
            disk_signature_md5: hashes[4].to_string(),
        })
    }
}

/// What the login handshake hands back to the HTTP layer. `token` stays `no`
/// on every failure path, mirroring what clients expect.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub body: Vec<u8>,
    pub token: String,
}

impl LoginResponse {
    pub fn failure(body: Vec<u8>) -> Self {
        LoginResponse {
            body,
            token: "no".to_string(),
        }
    }
}
