// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use chrono::{Duration, Utc};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    models::{
        account::Privileges,
        geolocation::Geolocation,
        hardware::HardwareInfo,
        login::{LoginData, LoginResponse},
        version::OsuVersion,
    },
    packets::server as packets,
    server::context::App,
    store::{channels, sessions},
    utils::{format_time, unix_timestamp},
};

pub const PROTOCOL_VERSION: i32 = 19;

/// Runs the full login handshake for a tokenless request body. Failure paths
/// answer with the negative user-id sentinels the client knows; success
/// returns the welcome byte stream and the fresh session token.
pub async fn handle_login(
    app: &App,
    body: &[u8],
    geolocation: Geolocation,
) -> Result<LoginResponse> {
    let started = Instant::now();

    let Ok(login_data) = LoginData::parse(body) else {
        return Ok(LoginResponse::failure(packets::user_id(-5)));
    };

    let max_age = Duration::days(app.cfg.policy.client_max_age_days);
    let oldest_allowed = Utc::now().date_naive() - max_age;
    let client_version = match OsuVersion::parse(&login_data.osu_version) {
        Some(version) if version.date >= oldest_allowed => version,
        _ => {
            let mut response = packets::version_update_forced();
            response.extend(packets::user_id(-2));
            return Ok(LoginResponse::failure(response));
        },
    };

    let Some((adapters, running_under_wine)) =
        HardwareInfo::parse_adapters(&login_data.adapters_str)
    else {
        return Ok(LoginResponse::failure(packets::user_id(-5)));
    };

    let Some(mut account) = app.accounts.fetch_by_name(&login_data.username).await?
    else {
        return Ok(LoginResponse::failure(packets::user_id(-1)));
    };

    if !app
        .password
        .verify(&login_data.password_md5, &account.password_bcrypt)
        .await?
    {
        return Ok(LoginResponse::failure(packets::user_id(-1)));
    }

    if sessions::fetch_by_id(app, account.id).await?.is_some() {
        let mut response = packets::user_id(-1);
        response.extend(packets::notification("You are already logged in!"));
        return Ok(LoginResponse::failure(response));
    }

    let hardware = HardwareInfo {
        running_under_wine,
        osu_md5: login_data.osu_path_md5.clone(),
        adapters_md5: login_data.adapters_md5.clone(),
        uninstall_md5: login_data.uninstall_md5.clone(),
        disk_md5: login_data.disk_signature_md5.clone(),
        adapters,
    };
    check_adapters(app, &account.name, &hardware).await;

    let mut frozen_note: Option<String> = None;
    if account.freeze_end > 0 {
        let now = unix_timestamp();
        if account.freeze_end <= now {
            // the freeze window lapsed without resolution
            account.privileges.remove(Privileges::USER_PUBLIC);
            app.accounts.update_privileges(&account).await?;
            frozen_note = Some(app.cfg.policy.restriction_message.clone());
        } else {
            frozen_note = Some(app.cfg.policy.frozen_message.replace(
                "{time_until_restriction}",
                &human_duration(account.freeze_end - now),
            ));
        }
    }

    let mut session = sessions::create(
        app,
        account,
        geolocation,
        login_data.utc_offset,
        login_data.pm_private,
        client_version,
        hardware,
    )
    .await?;

    let mut body = packets::protocol_version(PROTOCOL_VERSION);
    body.extend(packets::user_id(session.id()));
    body.extend(packets::bancho_privileges(
        session.bancho_privileges().bits() as i32,
    ));

    for mut channel in channels::fetch_all(app).await? {
        let staff = session.account.is_staff();
        if (channel.hidden || !channel.public_read) && !staff {
            continue;
        }

        body.extend(packets::channel_info(&channel));

        if channel.name != "#lobby" && !channel.temp && !channel.hidden {
            crate::handlers::chat::join_channel(app, &mut session, &mut channel)
                .await?;
        }
    }
    body.extend(packets::channel_info_end());

    if let Some(icon) = app.icons.fetch_random().await? {
        body.extend(packets::menu_icon(&icon));
    }

    body.extend(packets::friends_list(&session.account.friends));
    body.extend(packets::silence_end(session.silence_expire()));

    let own_stats = app.stats.fetch(session.id(), session.status.mode).await?;
    let own_presence = packets::user_presence(&session, &own_stats);
    let own_stats_packet = packets::user_stats(&session, &own_stats);
    body.extend(&own_presence);
    body.extend(&own_stats_packet);

    for other in sessions::fetch_all(app).await? {
        if other.id() == session.id() {
            continue;
        }

        if session.is_public() {
            let mut announce = own_presence.clone();
            announce.extend(&own_stats_packet);
            sessions::enqueue_data(app, other.id(), &announce).await?;
        }

        let other_stats = app.stats.fetch(other.id(), other.status.mode).await?;
        body.extend(packets::user_presence(&other, &other_stats));
        body.extend(packets::user_stats(&other, &other_stats));
    }

    if !session.is_public() {
        body.extend(packets::user_restricted());
    }

    if let Some(note) = frozen_note {
        body.extend(packets::notification(&note));
    }

    if session
        .privileges()
        .contains(Privileges::USER_PENDING_VERIFICATION)
    {
        crate::handlers::session::remove_privilege(
            app,
            &mut session,
            Privileges::USER_PENDING_VERIFICATION,
        )
        .await?;
    }

    sessions::write_records(app, &session).await?;
    sessions::add_to_session_list(app, &session).await?;

    let elapsed = started.elapsed().as_nanos() as u64;
    body.extend(packets::notification(&format!(
        "Welcome to {}!\nLogin took {}.",
        app.cfg.server.domain,
        format_time(elapsed)
    )));

    info!(
        "{} logged in ({}, took {})",
        session.name(),
        session.client_version,
        format_time(elapsed)
    );

    Ok(LoginResponse {
        body,
        token: session.token,
    })
}

/// Adapter MACs whose prefixes the IEEE registry does not know are logged and
/// otherwise ignored.
async fn check_adapters(app: &App, username: &str, hardware: &HardwareInfo) {
    let Some(oui) = &app.oui else {
        return;
    };

    for adapter in &hardware.adapters {
        match oui.fetch_oui(adapter).await {
            Ok(Some(_)) => {},
            Ok(None) => warn!("{username} reported unregistered adapter {adapter}"),
            Err(e) => {
                warn!("OUI lookup failed for {username}: {e}");
                return;
            },
        }
    }
}

fn human_duration(mut seconds: i64) -> String {
    let days = seconds / 86_400;
    seconds %= 86_400;
    let hours = seconds / 3_600;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h")
    } else {
        format!("{}m", (seconds / 60).max(1))
    }
}
