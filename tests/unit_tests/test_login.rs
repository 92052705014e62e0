// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use chrono::Utc;
use herbert_rs::{
    models::geolocation::Geolocation,
    server::login::handle_login,
    store::sessions,
};

use crate::unit_tests::{connect_session, split_packets, test_account, test_harness};

fn login_body(username: &str, password_md5: &str, version: &str) -> Vec<u8> {
    format!(
        "{username}\n{password_md5}\n{version}|0|1|abc:runningunderwine:def:ghi:jkl:|0"
    )
    .into_bytes()
}

fn current_version() -> String {
    format!("b{}", Utc::now().date_naive().format("%Y%m%d"))
}

const PASSWORD_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

#[tokio::test]
async fn test_happy_login() -> Result<()> {
    let harness = test_harness().await?;

    let mut account = test_account(1001, "Alice");
    account.password_bcrypt = bcrypt::hash(PASSWORD_MD5, 4)?;
    account.friends = vec![1002];
    harness.accounts.insert(account);

    let response = handle_login(
        &harness.app,
        &login_body("Alice", PASSWORD_MD5, &current_version()),
        Geolocation::default(),
    )
    .await?;

    // a real session token came back
    assert!(uuid::Uuid::parse_str(&response.token).is_ok());

    let packets = split_packets(&response.body);
    let ids: Vec<u16> = packets.iter().map(|(id, _)| *id).collect();

    // exact preamble order: protocol version, user id, privileges
    assert_eq!(&ids[..3], &[75, 5, 71]);
    assert_eq!(packets[0].1, 19i32.to_le_bytes());
    assert_eq!(packets[1].1, 1001i32.to_le_bytes());

    // at least one channel listing, then the end marker before the icon
    let channel_count = ids.iter().filter(|&&id| id == 65).count();
    assert!(channel_count >= 3);
    let end_pos = ids.iter().position(|&id| id == 89).expect("info end");
    assert!(ids[..end_pos].contains(&65));

    // icon, friends, silence, own presence + stats follow
    for expected in [76, 72, 92, 83, 11] {
        assert!(ids.contains(&expected), "missing packet {expected}");
    }

    // final notification with the elapsed-time text
    assert_eq!(*ids.last().expect("non-empty"), 24);

    // the session is registered under all three indices
    assert!(
        sessions::fetch_by_token(&harness.app, &response.token)
            .await?
            .is_some()
    );
    assert_eq!(sessions::session_ids(&harness.app).await?, vec![1001]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_login_rejected() -> Result<()> {
    let harness = test_harness().await?;

    let mut account = test_account(1001, "Alice");
    account.password_bcrypt = bcrypt::hash(PASSWORD_MD5, 4)?;
    connect_session(&harness, &account).await?;

    let response = handle_login(
        &harness.app,
        &login_body("Alice", PASSWORD_MD5, &current_version()),
        Geolocation::default(),
    )
    .await?;

    assert_eq!(response.token, "no");

    let packets = split_packets(&response.body);
    assert_eq!(packets[0].0, 5);
    assert_eq!(packets[0].1, (-1i32).to_le_bytes());
    assert_eq!(packets[1].0, 24); // "You are already logged in!"
    Ok(())
}

#[tokio::test]
async fn test_old_client_forced_update() -> Result<()> {
    let harness = test_harness().await?;

    let response = handle_login(
        &harness.app,
        &login_body("Alice", PASSWORD_MD5, "b20200101"),
        Geolocation::default(),
    )
    .await?;

    assert_eq!(response.token, "no");

    let packets = split_packets(&response.body);
    assert_eq!(packets[0].0, 102); // VERSION_UPDATE_FORCED
    assert_eq!(packets[1].0, 5);
    assert_eq!(packets[1].1, (-2i32).to_le_bytes());
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_rejected() -> Result<()> {
    let harness = test_harness().await?;

    let mut account = test_account(1001, "Alice");
    account.password_bcrypt = bcrypt::hash(PASSWORD_MD5, 4)?;
    harness.accounts.insert(account);

    let response = handle_login(
        &harness.app,
        &login_body("Alice", "11111111111111111111111111111111", &current_version()),
        Geolocation::default(),
    )
    .await?;

    let packets = split_packets(&response.body);
    assert_eq!(packets[0].0, 5);
    assert_eq!(packets[0].1, (-1i32).to_le_bytes());
    Ok(())
}

#[tokio::test]
async fn test_empty_adapters_rejected() -> Result<()> {
    let harness = test_harness().await?;

    let body = format!(
        "Alice\n{PASSWORD_MD5}\n{}|0|1|abc:.:def:ghi:jkl:|0",
        current_version()
    );
    let response =
        handle_login(&harness.app, body.as_bytes(), Geolocation::default()).await?;

    let packets = split_packets(&response.body);
    assert_eq!(packets[0].0, 5);
    assert_eq!(packets[0].1, (-5i32).to_le_bytes());
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_rejected() -> Result<()> {
    let harness = test_harness().await?;

    let response =
        handle_login(&harness.app, b"definitely not a login", Geolocation::default())
            .await?;

    assert_eq!(response.token, "no");
    let packets = split_packets(&response.body);
    assert_eq!(packets[0].0, 5);
    assert_eq!(packets[0].1, (-5i32).to_le_bytes());
    Ok(())
}

#[tokio::test]
async fn test_peer_presence_exchange() -> Result<()> {
    let harness = test_harness().await?;

    connect_session(&harness, &test_account(1002, "Bob")).await?;

    let mut account = test_account(1001, "Alice");
    account.password_bcrypt = bcrypt::hash(PASSWORD_MD5, 4)?;
    harness.accounts.insert(account);

    let response = handle_login(
        &harness.app,
        &login_body("Alice", PASSWORD_MD5, &current_version()),
        Geolocation::default(),
    )
    .await?;

    // Bob's presence and stats are in Alice's welcome stream
    let packets = split_packets(&response.body);
    let bob_presences = packets
        .iter()
        .filter(|(id, payload)| *id == 83 && payload[..4] == 1002i32.to_le_bytes())
        .count();
    assert_eq!(bob_presences, 1);

    // and Alice's presence landed in Bob's queue
    let bob_queue = sessions::dequeue_data(&harness.app, 1002).await?;
    let ids: Vec<u16> = split_packets(&bob_queue).iter().map(|(id, _)| *id).collect();
    assert!(ids.contains(&83));
    assert!(ids.contains(&11));
    Ok(())
}
