// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use herbert_rs::packets::{reader::PacketReader, types::OsuMatch};

fn sample_match() -> OsuMatch {
    let mut slot_statuses = [1u8; 16];
    slot_statuses[0] = 4; // not ready
    slot_statuses[1] = 8; // ready
    slot_statuses[5] = 2; // locked

    let mut slot_teams = [0u8; 16];
    slot_teams[0] = 2;
    slot_teams[1] = 1;

    OsuMatch {
        id: 17,
        in_progress: false,
        mods: 64,
        name: "cool lobby".to_string(),
        password: Some("sekrit".to_string()),
        map_name: "artist - title [diff]".to_string(),
        map_id: 1_872_396,
        map_md5: "0bc231a99a73c23c9e9a5bf0077d9b9f".to_string(),
        slot_statuses,
        slot_teams,
        slot_user_ids: vec![1001, 1002],
        host_id: 1001,
        mode: 0,
        win_condition: 3,
        team_type: 2,
        freemod: false,
        slot_mods: [0; 16],
        seed: 0,
    }
}

#[test]
fn test_match_wire_identity() {
    let m = sample_match();

    let mut encoded = Vec::new();
    m.serialise_into(&mut encoded, true);

    let mut reader = PacketReader::new(&encoded);
    let decoded = OsuMatch::read_from(&mut reader);
    assert_eq!(reader.remaining(), 0);
    assert_eq!(decoded, m);

    // decoded-then-re-encoded bytes are identical
    let mut re_encoded = Vec::new();
    decoded.serialise_into(&mut re_encoded, true);
    assert_eq!(re_encoded, encoded);
}

#[test]
fn test_match_wire_identity_freemod() {
    let mut m = sample_match();
    m.freemod = true;
    m.slot_mods[0] = 8;
    m.slot_mods[1] = 16 | 64;

    let mut encoded = Vec::new();
    m.serialise_into(&mut encoded, true);

    let mut reader = PacketReader::new(&encoded);
    let decoded = OsuMatch::read_from(&mut reader);
    assert_eq!(decoded, m);
    assert_eq!(decoded.slot_mods, m.slot_mods);
}

#[test]
fn test_password_suppression_placeholder() {
    let m = sample_match();

    let mut with_password = Vec::new();
    m.serialise_into(&mut with_password, true);
    let mut suppressed = Vec::new();
    m.serialise_into(&mut suppressed, false);

    // the suppressed form is shorter but still marks a password as present
    assert!(suppressed.len() < with_password.len());

    let mut reader = PacketReader::new(&suppressed);
    let decoded = OsuMatch::read_from(&mut reader);
    assert_eq!(decoded.password, None);
    assert_eq!(decoded.name, m.name);
    assert_eq!(decoded.slot_user_ids, m.slot_user_ids);

    // no password at all writes a plain empty string
    let mut open = sample_match();
    open.password = None;
    let mut open_encoded = Vec::new();
    open.serialise_into(&mut open_encoded, false);
    let mut reader = PacketReader::new(&open_encoded);
    assert_eq!(OsuMatch::read_from(&mut reader).password, None);
}
