// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::packets::{
    reader::PacketReader,
    writer::{write_string, write_uleb128},
};

/// A value that knows its own wire encoding. Payload models are read by
/// walking their fields' `WireValue` impls in declaration order.
pub trait WireValue: Sized {
    fn read(reader: &mut PacketReader<'_>) -> Self;
    fn write(&self, buffer: &mut Vec<u8>);
}

macro_rules! primitive_wire_value {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(impl WireValue for $ty {
            fn read(reader: &mut PacketReader<'_>) -> Self {
                reader.$read()
            }

            fn write(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(&self.to_le_bytes());
            }
        })*
    };
}

primitive_wire_value! {
    i8 => read_i8,
    u8 => read_u8,
    i16 => read_i16,
    u16 => read_u16,
    i32 => read_i32,
    u32 => read_u32,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
}

impl WireValue for String {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        reader.read_string()
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        write_string(buffer, self);
    }
}

impl WireValue for Vec<i32> {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        reader.read_i32_list()
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&(self.len() as u16).to_le_bytes());
        for value in self {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// `bytes` payload field: consumes the remainder of the packet verbatim.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawBytes(pub Vec<u8>);

impl WireValue for RawBytes {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        RawBytes(reader.read_rest().to_vec())
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.0);
    }
}

/// A chat message in either direction. `target` is a channel or user name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender_name: String,
    pub content: String,
    pub target: String,
    pub sender_id: i32,
}

impl WireValue for Message {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        Message {
            sender_name: reader.read_string(),
            content: reader.read_string(),
            target: reader.read_string(),
            sender_id: reader.read_i32(),
        }
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        write_string(buffer, &self.sender_name);
        write_string(buffer, &self.content);
        write_string(buffer, &self.target);
        buffer.extend_from_slice(&self.sender_id.to_le_bytes());
    }
}

/// Channel listing entry as shown in the client's channel browser.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OsuChannel {
    pub name: String,
    pub topic: String,
    pub player_count: i32,
}

impl WireValue for OsuChannel {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        OsuChannel {
            name: reader.read_string(),
            topic: reader.read_string(),
            player_count: reader.read_i32(),
        }
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        write_string(buffer, &self.name);
        write_string(buffer, &self.topic);
        buffer.extend_from_slice(&self.player_count.to_le_bytes());
    }
}

/// The 29-byte packed score snapshot inside replay bundles; two extra f64s
/// follow when the score-v2 flag is set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScoreFrame {
    pub time: i32,
    pub id: u8,
    pub count300: u16,
    pub count100: u16,
    pub count50: u16,
    pub count_geki: u16,
    pub count_katu: u16,
    pub count_miss: u16,
    pub total_score: i32,
    pub current_combo: u16,
    pub max_combo: u16,
    pub perfect: bool,
    pub current_hp: u8,
    pub tag_byte: u8,
    pub score_v2: bool,
    pub combo_portion: f64,
    pub bonus_portion: f64,
}

impl WireValue for ScoreFrame {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        let mut frame = ScoreFrame {
            time: reader.read_i32(),
            id: reader.read_u8(),
            count300: reader.read_u16(),
            count100: reader.read_u16(),
            count50: reader.read_u16(),
            count_geki: reader.read_u16(),
            count_katu: reader.read_u16(),
            count_miss: reader.read_u16(),
            total_score: reader.read_i32(),
            current_combo: reader.read_u16(),
            max_combo: reader.read_u16(),
            perfect: reader.read_u8() != 0,
            current_hp: reader.read_u8(),
            tag_byte: reader.read_u8(),
            score_v2: reader.read_u8() != 0,
            combo_portion: 0.0,
            bonus_portion: 0.0,
        };

        if frame.score_v2 {
            frame.combo_portion = reader.read_f64();
            frame.bonus_portion = reader.read_f64();
        }

        frame
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.time.to_le_bytes());
        buffer.push(self.id);
        buffer.extend_from_slice(&self.count300.to_le_bytes());
        buffer.extend_from_slice(&self.count100.to_le_bytes());
        buffer.extend_from_slice(&self.count50.to_le_bytes());
        buffer.extend_from_slice(&self.count_geki.to_le_bytes());
        buffer.extend_from_slice(&self.count_katu.to_le_bytes());
        buffer.extend_from_slice(&self.count_miss.to_le_bytes());
        buffer.extend_from_slice(&self.total_score.to_le_bytes());
        buffer.extend_from_slice(&self.current_combo.to_le_bytes());
        buffer.extend_from_slice(&self.max_combo.to_le_bytes());
        buffer.push(self.perfect as u8);
        buffer.push(self.current_hp);
        buffer.push(self.tag_byte);
        buffer.push(self.score_v2 as u8);
        if self.score_v2 {
            buffer.extend_from_slice(&self.combo_portion.to_le_bytes());
            buffer.extend_from_slice(&self.bonus_portion.to_le_bytes());
        }
    }
}

/// A single input sample of a replay stream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplayFrame {
    pub button_state: u8,
    pub taiko_byte: u8,
    pub x: f32,
    pub y: f32,
    pub time: i32,
}

impl WireValue for ReplayFrame {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        ReplayFrame {
            button_state: reader.read_u8(),
            taiko_byte: reader.read_u8(),
            x: reader.read_f32(),
            y: reader.read_f32(),
            time: reader.read_i32(),
        }
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.button_state);
        buffer.push(self.taiko_byte);
        buffer.extend_from_slice(&self.x.to_le_bytes());
        buffer.extend_from_slice(&self.y.to_le_bytes());
        buffer.extend_from_slice(&self.time.to_le_bytes());
    }
}

/// A burst of replay frames plus the score state at that point. The original
/// payload bytes are captured on read so spectator fan-out can forward them
/// without re-encoding.
#[derive(Debug, Default, Clone)]
pub struct ReplayFrameBundle {
    pub raw: Vec<u8>,

    pub extra: i32,
    pub frames: Vec<ReplayFrame>,
    pub action: u8,
    pub score_frame: ScoreFrame,
    pub sequence: u16,
}

impl PartialEq for ReplayFrameBundle {
    fn eq(&self, other: &Self) -> bool {
        // raw is a read-side capture, not part of the value
        self.extra == other.extra
            && self.frames == other.frames
            && self.action == other.action
            && self.score_frame == other.score_frame
            && self.sequence == other.sequence
    }
}

impl WireValue for ReplayFrameBundle {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        let raw = reader.read_rest().to_vec();
        let mut inner = PacketReader::new(&raw);

        let extra = inner.read_i32();
        let count = inner.read_u16();
        let frames = (0..count).map(|_| ReplayFrame::read(&mut inner)).collect();
        let action = inner.read_u8();
        let score_frame = ScoreFrame::read(&mut inner);
        let sequence = inner.read_u16();

        ReplayFrameBundle {
            raw,
            extra,
            frames,
            action,
            score_frame,
            sequence,
        }
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.extra.to_le_bytes());
        buffer.extend_from_slice(&(self.frames.len() as u16).to_le_bytes());
        for frame in &self.frames {
            frame.write(buffer);
        }
        buffer.push(self.action);
        self.score_frame.write(buffer);
        buffer.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

pub const WIRE_SLOTS: usize = 16;

/// The match record as the client sees it. Reading and writing must agree
/// byte-for-byte; the only asymmetry is password suppression on the write
/// side (`#lobby` listings carry a placeholder instead of the password).
#[derive(Debug, Clone, PartialEq)]
pub struct OsuMatch {
    pub id: u16,
    pub in_progress: bool,
    pub mods: u32,
    pub name: String,
    pub password: Option<String>,
    pub map_name: String,
    pub map_id: i32,
    pub map_md5: String,
    pub slot_statuses: [u8; WIRE_SLOTS],
    pub slot_teams: [u8; WIRE_SLOTS],
    /// User ids of occupied slots, in slot order.
    pub slot_user_ids: Vec<i32>,
    pub host_id: i32,
    pub mode: u8,
    pub win_condition: u8,
    pub team_type: u8,
    pub freemod: bool,
    pub slot_mods: [u32; WIRE_SLOTS],
    pub seed: i32,
}

impl Default for OsuMatch {
    fn default() -> Self {
        OsuMatch {
            id: 0,
            in_progress: false,
            mods: 0,
            name: String::new(),
            password: None,
            map_name: String::new(),
            map_id: -1,
            map_md5: String::new(),
            slot_statuses: [1; WIRE_SLOTS],
            slot_teams: [0; WIRE_SLOTS],
            slot_user_ids: vec![],
            host_id: 0,
            mode: 0,
            win_condition: 0,
            team_type: 0,
            freemod: false,
            slot_mods: [0; WIRE_SLOTS],
            seed: 0,
        }
    }
}

const SLOT_STATUS_HAS_USER: u8 = 4 | 8 | 16 | 32 | 64;

impl OsuMatch {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Self {
        let id = reader.read_u16();
        let in_progress = reader.read_i8() != 0;
        let _powerplay = reader.read_i8();
        let mods = reader.read_u32();
        let name = reader.read_string();
        let raw_password = reader.read_string();
        let map_name = reader.read_string();
        let map_id = reader.read_i32();
        let map_md5 = reader.read_string();

        let mut slot_statuses = [0u8; WIRE_SLOTS];
        for status in &mut slot_statuses {
            *status = reader.read_i8() as u8;
        }
        let mut slot_teams = [0u8; WIRE_SLOTS];
        for team in &mut slot_teams {
            *team = reader.read_i8() as u8;
        }

        let slot_user_ids = slot_statuses
            .iter()
            .filter(|&&status| status & SLOT_STATUS_HAS_USER != 0)
            .map(|_| reader.read_i32())
            .collect();

        let host_id = reader.read_i32();
        let mode = reader.read_i8() as u8;
        let win_condition = reader.read_i8() as u8;
        let team_type = reader.read_i8() as u8;
        let freemod = reader.read_i8() != 0;

        let mut slot_mods = [0u32; WIRE_SLOTS];
        if freemod {
            for mods in &mut slot_mods {
                *mods = reader.read_i32() as u32;
            }
        }

        let seed = reader.read_i32();

        OsuMatch {
            id,
            in_progress,
            mods,
            name,
            password: (!raw_password.is_empty()).then_some(raw_password),
            map_name,
            map_id,
            map_md5,
            slot_statuses,
            slot_teams,
            slot_user_ids,
            host_id,
            mode,
            win_condition,
            team_type,
            freemod,
            slot_mods,
            seed,
        }
    }

    pub fn serialise_into(&self, buffer: &mut Vec<u8>, send_password: bool) {
        buffer.extend_from_slice(&self.id.to_le_bytes());
        buffer.push(self.in_progress as u8);
        buffer.push(0); // powerplay
        buffer.extend_from_slice(&self.mods.to_le_bytes());
        write_string(buffer, &self.name);

        match (&self.password, send_password) {
            (Some(password), true) => write_string(buffer, password),
            (Some(_), false) => {
                // existence marker without the secret itself
                buffer.push(0x0b);
                write_uleb128(buffer, 0);
            },
            (None, _) => buffer.push(0x00),
        }

        write_string(buffer, &self.map_name);
        buffer.extend_from_slice(&self.map_id.to_le_bytes());
        write_string(buffer, &self.map_md5);

        for &status in &self.slot_statuses {
            buffer.push(status);
        }
        for &team in &self.slot_teams {
            buffer.push(team);
        }
        for &user_id in &self.slot_user_ids {
            buffer.extend_from_slice(&user_id.to_le_bytes());
        }

        buffer.extend_from_slice(&self.host_id.to_le_bytes());
        buffer.push(self.mode);
        buffer.push(self.win_condition);
        buffer.push(self.team_type);
        buffer.push(self.freemod as u8);

        if self.freemod {
            for &mods in &self.slot_mods {
                buffer.extend_from_slice(&mods.to_le_bytes());
            }
        }

        buffer.extend_from_slice(&self.seed.to_le_bytes());
    }
}

impl WireValue for OsuMatch {
    fn read(reader: &mut PacketReader<'_>) -> Self {
        OsuMatch::read_from(reader)
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        self.serialise_into(buffer, true);
    }
}
