// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};

use crate::integration_tests::common::{login_body, seed_account, spawn_server};

const PASSWORD_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

#[tokio::test]
async fn test_index_banner() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();

    let response = client.get(&server.base_url).send().await?;
    assert!(response.status().is_success());
    assert_eq!(response.text().await?, "herbe.rt");
    Ok(())
}

#[tokio::test]
async fn test_non_osu_user_agent_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(&server.base_url)
        .header("User-Agent", "definitely-not-osu")
        .body(Vec::new())
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[tokio::test]
async fn test_login_then_poll_round_trip() -> Result<()> {
    let server = spawn_server().await?;
    seed_account(&server, 1001, "Alice", PASSWORD_MD5)?;

    let client = reqwest::Client::new();

    // tokenless request: the login handshake
    let response = client
        .post(&server.base_url)
        .header("User-Agent", "osu!")
        .body(login_body("Alice", PASSWORD_MD5))
        .send()
        .await?;
    assert!(response.status().is_success());

    let token = response
        .headers()
        .get("cho-token")
        .context("cho-token header missing")?
        .to_str()?
        .to_string();
    assert!(uuid::Uuid::parse_str(&token).is_ok());

    let body = response.bytes().await?;
    // PROTOCOL_VERSION(19) leads the welcome stream
    assert_eq!(&body[..7], &[75, 0, 0, 4, 0, 0, 0]);
    assert_eq!(&body[7..11], &19i32.to_le_bytes());

    // authenticated poll with an empty batch drains the queue
    let response = client
        .post(&server.base_url)
        .header("User-Agent", "osu!")
        .header("osu-token", &token)
        .body(Vec::new())
        .send()
        .await?;
    assert!(response.status().is_success());

    // an unknown token is answered with CHO_RESTART(0)
    let response = client
        .post(&server.base_url)
        .header("User-Agent", "osu!")
        .header("osu-token", "00000000-0000-0000-0000-000000000000")
        .body(Vec::new())
        .send()
        .await?;
    let body = response.bytes().await?;
    assert_eq!(&body[..], &[86, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_login_over_http() -> Result<()> {
    let server = spawn_server().await?;
    seed_account(&server, 1001, "Alice", PASSWORD_MD5)?;

    let client = reqwest::Client::new();
    for expected_token in [true, false] {
        let response = client
            .post(&server.base_url)
            .header("User-Agent", "osu!")
            .body(login_body("Alice", PASSWORD_MD5))
            .send()
            .await?;

        let token = response
            .headers()
            .get("cho-token")
            .context("cho-token header always present")?
            .to_str()?
            .to_string();

        if expected_token {
            assert!(uuid::Uuid::parse_str(&token).is_ok());
        } else {
            assert_eq!(token, "no");
            let body = response.bytes().await?;
            // USER_ID(-1) leads the rejection
            assert_eq!(&body[..11], &[5, 0, 0, 4, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
        }
    }
    Ok(())
}
