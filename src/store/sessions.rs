// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashMap;

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::warn;

use crate::{
    models::{
        account::Account,
        geolocation::Geolocation,
        hardware::HardwareInfo,
        session::{Session, SessionRecord, Status},
        version::OsuVersion,
    },
    packets::server as packets,
    server::context::App,
    utils::{make_safe_name, unix_timestamp},
};

const SESSIONS_HASH: &str = "herbert:sessions";
const SESSION_LIST: &str = "herbert:session_list";

fn queue_key(user_id: i32) -> String {
    format!("herbert:queues:{user_id}")
}

fn queue_lock(user_id: i32) -> String {
    format!("herbert:locks:queues:{user_id}")
}

fn session_lock(user_id: i32) -> String {
    format!("herbert:locks:sessions:{user_id}")
}

async fn hydrate(app: &App, record: SessionRecord) -> Result<Option<Session>> {
    // account fields are never trusted from the record; always rehydrated
    let Some(account) = app.accounts.fetch_by_id(record.id).await? else {
        warn!("session {} has no backing account", record.id);
        return Ok(None);
    };

    Ok(Some(Session::from_record(account, record)))
}

async fn fetch_record(app: &App, key: &str) -> Result<Option<Session>> {
    let Some(raw) = app.kv.hget(SESSIONS_HASH, key).await? else {
        return Ok(None);
    };

    let record: SessionRecord =
        serde_json::from_slice(&raw).context("corrupt session record")?;
    hydrate(app, record).await
}

pub async fn fetch_by_id(app: &App, id: i32) -> Result<Option<Session>> {
    fetch_record(app, &format!("id_{id}")).await
}

pub async fn fetch_by_name(app: &App, name: &str) -> Result<Option<Session>> {
    fetch_record(app, &format!("name_{}", make_safe_name(name))).await
}

pub async fn fetch_by_token(app: &App, token: &str) -> Result<Option<Session>> {
    fetch_record(app, &format!("token_{token}")).await
}

/// Every live session. The three index entries per session are deduplicated
/// by id before hydration.
pub async fn fetch_all(app: &App) -> Result<Vec<Session>> {
    let mut records: HashMap<i32, SessionRecord> = HashMap::new();
    for (_, raw) in app.kv.hgetall(SESSIONS_HASH).await? {
        let record: SessionRecord =
            serde_json::from_slice(&raw).context("corrupt session record")?;
        records.insert(record.id, record);
    }

    let mut sessions = Vec::with_capacity(records.len());
    for record in records.into_values() {
        if let Some(session) = hydrate(app, record).await? {
            sessions.push(session);
        }
    }
    Ok(sessions)
}

/// Builds a fresh session around an account, assigns its token and persists
/// the index entries. The caller announces it to peers separately.
#[allow(clippy::too_many_arguments)]
pub async fn create(
    app: &App,
    account: Account,
    geolocation: Geolocation,
    utc_offset: i32,
    friend_only_dms: bool,
    client_version: OsuVersion,
    hardware: HardwareInfo,
) -> Result<Session> {
    let session = Session {
        account,
        token: uuid::Uuid::new_v4().to_string(),
        geolocation,
        utc_offset,
        login_time: unix_timestamp(),
        status: Status::default(),
        channels: vec![],
        spectators: vec![],
        spectating: None,
        match_id: None,
        friend_only_dms,
        in_lobby: false,
        away_message: None,
        client_version,
        hardware,
        last_np: None,
    };

    write_records(app, &session).await?;
    Ok(session)
}

/// Rewrites the three index entries (id, safe-name, token) under the session
/// lock. Does not notify observers; `update` layers that on top.
pub async fn write_records(app: &App, session: &Session) -> Result<()> {
    let record =
        serde_json::to_vec(&session.record()).context("failed to encode session")?;

    let _guard = app.kv.lock(&session_lock(session.id())).await?;
    for key in [
        format!("id_{}", session.id()),
        format!("name_{}", session.safe_name()),
        format!("token_{}", session.token),
    ] {
        app.kv.hset(SESSIONS_HASH, &key, record.clone()).await?;
    }

    Ok(())
}

/// Persists the session and fans its presence and stats out to the whole
/// session list so observers see the mutation.
pub async fn update(app: &App, session: &Session) -> Result<()> {
    write_records(app, session).await?;

    if !session.is_public() {
        return Ok(());
    }

    let stats = app.stats.fetch(session.id(), session.status.mode).await?;
    let mut data = packets::user_presence(session, &stats);
    data.extend(packets::user_stats(session, &stats));

    enqueue_global(app, &data, &[]).await
}

pub async fn delete(app: &App, session: &Session) -> Result<()> {
    let _guard = app.kv.lock(&session_lock(session.id())).await?;
    for key in [
        format!("id_{}", session.id()),
        format!("name_{}", session.safe_name()),
        format!("token_{}", session.token),
    ] {
        app.kv.hdel(SESSIONS_HASH, &key).await?;
    }
    Ok(())
}

pub async fn add_to_session_list(app: &App, session: &Session) -> Result<()> {
    let _guard = app.kv.lock("herbert:locks:session_list").await?;
    app.kv
        .lpush(SESSION_LIST, &session.id().to_string())
        .await
}

pub async fn remove_from_session_list(app: &App, session: &Session) -> Result<()> {
    let _guard = app.kv.lock("herbert:locks:session_list").await?;
    app.kv.lrem(SESSION_LIST, &session.id().to_string()).await
}

pub async fn session_ids(app: &App) -> Result<Vec<i32>> {
    Ok(app
        .kv
        .lrange(SESSION_LIST)
        .await?
        .iter()
        .filter_map(|raw| raw.parse().ok())
        .collect())
}

/// Appends bytes to one session's outbound queue.
pub async fn enqueue_data(app: &App, user_id: i32, data: &[u8]) -> Result<()> {
    let _guard = app.kv.lock(&queue_lock(user_id)).await?;
    app.kv.append(&queue_key(user_id), data).await
}

/// Drains one session's outbound queue. The read is destructive and atomic
/// under the queue lock.
pub async fn dequeue_data(app: &App, user_id: i32) -> Result<Bytes> {
    let _guard = app.kv.lock(&queue_lock(user_id)).await?;

    let Some(data) = app.kv.get(&queue_key(user_id)).await? else {
        return Ok(Bytes::new());
    };
    app.kv.del(&queue_key(user_id)).await?;

    Ok(Bytes::from(data))
}

/// Appends bytes to every queue in the session list, minus the immune ids.
pub async fn enqueue_global(app: &App, data: &[u8], immune: &[i32]) -> Result<()> {
    for user_id in session_ids(app).await? {
        if immune.contains(&user_id) {
            continue;
        }
        enqueue_data(app, user_id, data).await?;
    }
    Ok(())
}
