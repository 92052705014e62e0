// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    models::{
        channel::Channel,
        mode::{Mode, Mods},
        multiplayer::{Match, MatchTeam, MatchTeamType, MatchWinCondition, SlotStatus},
        session::Session,
    },
    packets::{
        models::{
            ChangePasswordPacket, ChangeSettingsPacket, ChangeSlotPacket,
            CreateMatchPacket, EmptyPacket, InvitePacket, JoinMatchPacket,
            LockSlotPacket, MatchIdPacket, ScoreUpdatePacket, TransferHostPacket,
        },
        server as packets,
        types::OsuMatch,
    },
    server::{context::App, fanout},
    store::{channels, matches, sessions},
};

async fn fetch_current_match(app: &App, session: &Session) -> Result<Option<Match>> {
    let Some(match_id) = session.match_id else {
        warn!("{} has no current match", session.name());
        return Ok(None);
    };

    let m = matches::fetch_by_id(app, match_id).await?;
    if m.is_none() {
        warn!("{} points at missing match {match_id}", session.name());
    }
    Ok(m)
}

/// Seats the session in the match: the host takes slot 0, everyone else the
/// lowest-index OPEN slot after the password check.
pub async fn join_match(
    app: &App,
    session: &mut Session,
    m: &mut Match,
    password: Option<&str>,
) -> Result<bool> {
    if session.match_id.is_some() {
        warn!(
            "{} tried to join match {} while already in match {:?}",
            session.name(),
            m.id,
            session.match_id
        );
        sessions::enqueue_data(app, session.id(), &packets::match_join_fail()).await?;
        return Ok(false);
    }

    if m.tourney_clients.contains(&session.id()) {
        sessions::enqueue_data(app, session.id(), &packets::match_join_fail()).await?;
        return Ok(false);
    }

    let slot_idx = if session.id() == m.host_id {
        0
    } else {
        if let Some(expected) = &m.password
            && password != Some(expected.as_str())
        {
            sessions::enqueue_data(app, session.id(), &packets::match_join_fail())
                .await?;
            return Ok(false);
        }

        match m.get_next_free_slot_idx() {
            Some(idx) => idx,
            None => {
                sessions::enqueue_data(app, session.id(), &packets::match_join_fail())
                    .await?;
                return Ok(false);
            },
        }
    };

    if let Some(mut match_chat) =
        channels::fetch_by_name(app, &format!("#multi_{}", m.id)).await?
    {
        super::chat::join_channel(app, session, &mut match_chat).await?;
    }

    if session.channels.iter().any(|name| name == "#lobby") {
        super::chat::leave_channel(app, session, "#lobby").await?;
    }

    let slot = &mut m.slots[slot_idx];
    if m.team_type.is_versus() {
        slot.team = MatchTeam::Red;
    }
    slot.status = SlotStatus::NOT_READY;
    slot.session_id = Some(session.id());

    session.match_id = Some(m.id);

    sessions::enqueue_data(app, session.id(), &packets::match_join_success(m)).await?;
    matches::update(app, m, true).await?;

    info!("{} joined match {} ({})", session.name(), m.name, m.id);
    Ok(true)
}

/// Vacates the session's slot. An emptied match is disposed (announced on
/// `#lobby`); otherwise the host role falls to the first occupied slot.
pub async fn leave_match(app: &App, session: &mut Session) -> Result<()> {
    let Some(match_id) = session.match_id else {
        warn!("{} tried to leave a match without being in one", session.name());
        return Ok(());
    };

    let Some(mut m) = matches::fetch_by_id(app, match_id).await? else {
        session.match_id = None;
        return Ok(());
    };

    if let Some(slot) = m.get_slot_mut(session.id()) {
        let new_status = if slot.status == SlotStatus::LOCKED {
            SlotStatus::LOCKED
        } else {
            SlotStatus::OPEN
        };
        slot.reset(new_status);
    }

    super::chat::leave_channel(app, session, &format!("#multi_{match_id}")).await?;

    if m.slots.iter().all(|slot| slot.empty()) {
        info!("disposing match {} ({})", m.name, m.id);
        matches::delete(app, &m).await?;

        if let Some(lobby) = channels::fetch_by_name(app, "#lobby").await? {
            fanout::to_channel(app, &lobby, &packets::dispose_match(m.id)).await?;
        }
    } else {
        if session.id() == m.host_id
            && let Some(new_host) = m
                .slots
                .iter()
                .find(|slot| slot.has_user())
                .and_then(|slot| slot.session_id)
        {
            m.host_id = new_host;
            sessions::enqueue_data(app, new_host, &packets::match_transfer_host())
                .await?;
        }

        m.refs.retain(|&ref_id| ref_id != session.id());
        matches::update(app, &m, true).await?;
    }

    session.match_id = None;

    info!("{} left match {} ({})", session.name(), m.name, m.id);
    Ok(())
}

/// Moves every slot with a map into PLAYING and fires MATCH_START at the
/// room; players without the map are immune and stay seated.
pub async fn start_match(app: &App, m: &mut Match) -> Result<()> {
    let mut missing_map = Vec::new();

    for slot in &mut m.slots {
        if slot.has_user() {
            if slot.status != SlotStatus::NO_MAP {
                slot.status = SlotStatus::PLAYING;
            } else if let Some(session_id) = slot.session_id {
                missing_map.push(session_id);
            }
        }
    }

    m.in_progress = true;
    fanout::to_match(app, m.id, &packets::match_start(m), false, &missing_map).await?;
    matches::update(app, m, true).await
}

pub async fn create_match(
    app: &App,
    session: &mut Session,
    packet: CreateMatchPacket,
) -> Result<()> {
    if session.match_id.is_some() {
        sessions::enqueue_data(app, session.id(), &packets::match_join_fail()).await?;
        return Ok(());
    }

    let data = packet.match_data;
    let match_id = matches::next_match_id(app).await?;

    let mut m = Match::new(
        match_id,
        data.name.clone(),
        session.id(),
        Mods::from_bits_truncate(data.mods),
        Mode::from_vn(data.mode),
    );
    m.password = data.password.clone();
    m.map_id = (data.map_id != -1).then_some(data.map_id);
    m.map_md5 = (!data.map_md5.is_empty()).then(|| data.map_md5.clone());
    m.map_title = (!data.map_name.is_empty()).then(|| data.map_name.clone());
    m.team_type = MatchTeamType::from_u8(data.team_type);
    m.win_condition = MatchWinCondition::from_u8(data.win_condition);
    m.seed = data.seed;

    channels::write_record(app, &Channel::multiplayer(match_id, &m.name)).await?;
    matches::write_record(app, &m).await?;

    info!("{} created match {} ({})", session.name(), m.name, m.id);

    join_match(app, session, &mut m, data.password.as_deref()).await?;
    Ok(())
}

pub async fn join_match_handler(
    app: &App,
    session: &mut Session,
    packet: JoinMatchPacket,
) -> Result<()> {
    let Some(mut m) = matches::fetch_by_id(app, packet.match_id).await? else {
        warn!(
            "{} tried to join non-existent match {}",
            session.name(),
            packet.match_id
        );
        sessions::enqueue_data(app, session.id(), &packets::match_join_fail()).await?;
        return Ok(());
    };

    let password = (!packet.password.is_empty()).then_some(packet.password.as_str());
    join_match(app, session, &mut m, password).await?;
    Ok(())
}

pub async fn part_match(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    leave_match(app, session).await
}

/// Entering the lobby replays every live match so the browser can populate.
pub async fn join_lobby(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    session.in_lobby = true;

    for m in matches::fetch_all(app).await? {
        sessions::enqueue_data(app, session.id(), &packets::new_match(&m)).await?;
    }
    Ok(())
}

pub async fn part_lobby(
    _app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    session.in_lobby = false;
    Ok(())
}

pub async fn change_slot(
    app: &App,
    session: &mut Session,
    packet: ChangeSlotPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    let target_idx = packet.slot_id;
    if !(0..16).contains(&target_idx) {
        warn!("{} requested out-of-range slot {target_idx}", session.name());
        return Ok(());
    }
    let target_idx = target_idx as usize;

    if m.slots[target_idx].status != SlotStatus::OPEN {
        warn!("{} requested a non-open slot", session.name());
        return Ok(());
    }

    let Some(current_idx) = m.get_slot_idx(session.id()) else {
        return Ok(());
    };

    let current = m.slots[current_idx].clone();
    m.slots[target_idx].copy_from(&current);
    m.slots[current_idx].reset(SlotStatus::OPEN);

    matches::update(app, &m, true).await
}

async fn set_own_status(
    app: &App,
    session: &Session,
    status: SlotStatus,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if let Some(slot) = m.get_slot_mut(session.id()) {
        slot.status = status;
    }

    matches::update(app, &m, true).await
}

pub async fn ready(app: &App, session: &mut Session, _packet: EmptyPacket) -> Result<()> {
    set_own_status(app, session, SlotStatus::READY).await
}

pub async fn not_ready(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    set_own_status(app, session, SlotStatus::NOT_READY).await
}

pub async fn no_beatmap(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    set_own_status(app, session, SlotStatus::NO_MAP).await
}

pub async fn has_beatmap(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    set_own_status(app, session, SlotStatus::NOT_READY).await
}

pub async fn lock_slot(
    app: &App,
    session: &mut Session,
    packet: LockSlotPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if session.id() != m.host_id {
        warn!("{} sent host-only lock without being host", session.name());
        return Ok(());
    }

    if !(0..16).contains(&packet.slot_id) {
        return Ok(());
    }
    let slot = &mut m.slots[packet.slot_id as usize];

    if slot.session_id == Some(m.host_id) {
        // the host cannot lock itself out
        return Ok(());
    }

    if slot.status == SlotStatus::LOCKED {
        slot.status = SlotStatus::OPEN;
    } else if slot.status == SlotStatus::OPEN {
        slot.status = SlotStatus::LOCKED;
    } else {
        return Ok(());
    }

    matches::update(app, &m, true).await
}

fn apply_freemod_transition(m: &mut Match, enable: bool) {
    if enable == m.freemod {
        return;
    }

    if enable {
        m.freemod = true;
        for slot in &mut m.slots {
            if slot.has_user() {
                slot.mods = m.mods.difference(Mods::SPEED_MODS);
            }
        }
        m.mods &= Mods::SPEED_MODS;
    } else {
        m.freemod = false;
        let host_mods = m
            .get_host_slot()
            .map(|slot| slot.mods)
            .unwrap_or_else(Mods::empty);
        m.mods &= Mods::SPEED_MODS;
        m.mods |= host_mods;
        for slot in &mut m.slots {
            slot.mods = Mods::empty();
        }
    }
}

fn apply_map_change(m: &mut Match, data: &OsuMatch) {
    if data.map_id == -1 {
        if m.map_id.is_some() {
            m.last_map_id = m.map_id;
        }
        m.map_id = None;
        m.map_md5 = None;
        m.map_title = None;
        m.unready_users(SlotStatus::READY);
    } else {
        if m.map_id != Some(data.map_id) && m.map_id.is_some() {
            m.last_map_id = m.map_id;
        }
        m.map_id = Some(data.map_id);
        m.map_md5 = Some(data.map_md5.clone());
        m.map_title = Some(data.map_name.clone());
    }
}

fn apply_team_type_change(m: &mut Match, new_type: MatchTeamType) {
    if new_type == m.team_type {
        return;
    }

    let team = match new_type {
        MatchTeamType::HeadToHead | MatchTeamType::TagCoop => MatchTeam::Neutral,
        MatchTeamType::TeamVs | MatchTeamType::TagTeamVs => MatchTeam::Red,
    };
    for slot in &mut m.slots {
        if slot.has_user() {
            slot.team = team;
        }
    }

    m.team_type = new_type;
}

pub async fn change_settings(
    app: &App,
    session: &mut Session,
    packet: ChangeSettingsPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if session.id() != m.host_id {
        warn!("{} sent host-only settings change", session.name());
        return Ok(());
    }

    let data = packet.match_data;

    apply_freemod_transition(&mut m, data.freemod);
    apply_map_change(&mut m, &data);
    apply_team_type_change(&mut m, MatchTeamType::from_u8(data.team_type));

    if !data.name.is_empty() {
        m.name = data.name.clone();
    }
    m.win_condition = MatchWinCondition::from_u8(data.win_condition);
    m.mode = Mode::from_vn(data.mode);
    m.seed = data.seed;

    matches::update(app, &m, true).await
}

pub async fn match_start_handler(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if session.id() != m.host_id {
        warn!("{} sent host-only match start", session.name());
        return Ok(());
    }

    start_match(app, &mut m).await
}

/// Relays the raw score frame with the sender's slot index patched in, to
/// everyone still playing.
pub async fn score_update(
    app: &App,
    session: &mut Session,
    packet: ScoreUpdatePacket,
) -> Result<()> {
    let Some(m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    let Some(slot_idx) = m.get_slot_idx(session.id()) else {
        return Ok(());
    };

    let data = packets::match_score_update(&packet.raw.0, slot_idx as u8);
    for slot in &m.slots {
        if slot.status == SlotStatus::PLAYING
            && let Some(session_id) = slot.session_id
            && session_id != session.id()
        {
            sessions::enqueue_data(app, session_id, &data).await?;
        }
    }

    Ok(())
}

pub async fn load_complete(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if let Some(slot) = m.get_slot_mut(session.id()) {
        slot.loaded = true;
    }

    let all_loaded = m
        .slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::PLAYING)
        .all(|slot| slot.loaded);
    if all_loaded {
        fanout::to_match(app, m.id, &packets::match_all_players_loaded(), false, &[])
            .await?;
    }

    matches::write_record(app, &m).await
}

pub async fn complete(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if let Some(slot) = m.get_slot_mut(session.id()) {
        slot.status = SlotStatus::COMPLETE;
    }

    if m.slots.iter().any(|slot| slot.status == SlotStatus::PLAYING) {
        return matches::write_record(app, &m).await;
    }

    // everyone is done: close out the play session
    m.in_progress = false;
    m.unready_users(SlotStatus::COMPLETE);
    for slot in &mut m.slots {
        slot.loaded = false;
        slot.skipped = false;
    }

    fanout::to_match(app, m.id, &packets::match_complete(), false, &[]).await?;
    matches::update(app, &m, true).await
}

pub async fn failed(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    let Some(slot_idx) = m.get_slot_idx(session.id()) else {
        return Ok(());
    };

    let data = packets::match_player_failed(slot_idx as i32);
    for slot in &m.slots {
        if slot.status == SlotStatus::PLAYING
            && let Some(session_id) = slot.session_id
            && session_id != session.id()
        {
            sessions::enqueue_data(app, session_id, &data).await?;
        }
    }

    Ok(())
}

pub async fn skip_request(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if let Some(slot) = m.get_slot_mut(session.id()) {
        slot.skipped = true;
    }

    let skipped_packet = packets::match_player_skipped(session.id());
    for slot in &m.slots {
        if slot.status == SlotStatus::PLAYING
            && let Some(session_id) = slot.session_id
        {
            sessions::enqueue_data(app, session_id, &skipped_packet).await?;
        }
    }

    let all_skipped = m
        .slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::PLAYING)
        .all(|slot| slot.skipped);
    if all_skipped {
        fanout::to_match(app, m.id, &packets::match_skip(), false, &[]).await?;
    }

    matches::write_record(app, &m).await
}

pub async fn transfer_host(
    app: &App,
    session: &mut Session,
    packet: TransferHostPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if session.id() != m.host_id {
        warn!("{} sent host-only transfer", session.name());
        return Ok(());
    }

    if !(0..16).contains(&packet.slot_id) {
        return Ok(());
    }

    let Some(new_host) = m.slots[packet.slot_id as usize].session_id else {
        warn!("{} tried to transfer host to an empty slot", session.name());
        return Ok(());
    };

    m.host_id = new_host;
    sessions::enqueue_data(app, new_host, &packets::match_transfer_host()).await?;
    matches::update(app, &m, true).await
}

pub async fn change_team(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if !m.team_type.is_versus() {
        return Ok(());
    }

    if let Some(slot) = m.get_slot_mut(session.id()) {
        slot.team = match slot.team {
            MatchTeam::Red => MatchTeam::Blue,
            _ => MatchTeam::Red,
        };
    }

    matches::update(app, &m, true).await
}

pub async fn change_password(
    app: &App,
    session: &mut Session,
    packet: ChangePasswordPacket,
) -> Result<()> {
    let Some(mut m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    if session.id() != m.host_id {
        warn!("{} sent host-only password change", session.name());
        return Ok(());
    }

    m.password = packet.match_data.password.clone();
    matches::update(app, &m, true).await
}

pub async fn invite(
    app: &App,
    session: &mut Session,
    packet: InvitePacket,
) -> Result<()> {
    let Some(m) = fetch_current_match(app, session).await? else {
        return Ok(());
    };

    let Some(target) = sessions::fetch_by_id(app, packet.target_id).await? else {
        warn!(
            "{} invited offline user {}",
            session.name(),
            packet.target_id
        );
        return Ok(());
    };

    sessions::enqueue_data(
        app,
        target.id(),
        &packets::match_invite(session, &m, target.name()),
    )
    .await
}

pub async fn tournament_match_info(
    app: &App,
    session: &mut Session,
    packet: MatchIdPacket,
) -> Result<()> {
    let Some(m) = matches::fetch_by_id(app, packet.match_id).await? else {
        return Ok(());
    };

    sessions::enqueue_data(app, session.id(), &packets::update_match(&m, false)).await
}

/// Tourney clients observe the room channel without occupying a slot.
pub async fn tournament_join_channel(
    app: &App,
    session: &mut Session,
    packet: MatchIdPacket,
) -> Result<()> {
    let Some(mut m) = matches::fetch_by_id(app, packet.match_id).await? else {
        return Ok(());
    };

    if m.contains(session.id()) {
        return Ok(());
    }

    if !m.tourney_clients.contains(&session.id()) {
        m.tourney_clients.push(session.id());
        matches::write_record(app, &m).await?;
    }

    if let Some(mut match_chat) =
        channels::fetch_by_name(app, &format!("#multi_{}", m.id)).await?
    {
        super::chat::join_channel(app, session, &mut match_chat).await?;
    }

    Ok(())
}

pub async fn tournament_leave_channel(
    app: &App,
    session: &mut Session,
    packet: MatchIdPacket,
) -> Result<()> {
    if let Some(mut m) = matches::fetch_by_id(app, packet.match_id).await? {
        m.tourney_clients.retain(|&client_id| client_id != session.id());
        matches::write_record(app, &m).await?;
    }

    super::chat::leave_channel(app, session, &format!("#multi_{}", packet.match_id))
        .await
}
