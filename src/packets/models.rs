// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::packets::{
    reader::PacketReader,
    types::{Message, OsuMatch, RawBytes, ReplayFrameBundle, WireValue},
};

/// An incoming payload bound to a typed structure. The schema is the ordered
/// field list itself; `read` walks it with each field's `WireValue` impl.
pub trait PacketPayload: Sized {
    fn read(reader: &mut PacketReader<'_>) -> Self;
}

macro_rules! payload_model {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct $name {
            $(pub $field: $ty,)*
        }

        impl PacketPayload for $name {
            fn read(reader: &mut PacketReader<'_>) -> Self {
                $name {
                    $($field: <$ty as WireValue>::read(reader),)*
                }
            }
        }

        impl $name {
            #[allow(dead_code)]
            pub fn encode(&self) -> Vec<u8> {
                let mut buffer = Vec::new();
                $(<$ty as WireValue>::write(&self.$field, &mut buffer);)*
                buffer
            }
        }
    };
}

payload_model!(ChangeActionPacket {
    action: u8,
    action_text: String,
    map_md5: String,
    mods: u32,
    mode: u8,
    map_id: i32,
});

payload_model!(MessagePacket { message: Message });

payload_model!(LogoutPacket { client_id: i32 });

payload_model!(StartSpectatingPacket { target_id: i32 });

payload_model!(SpectateFramesPacket {
    bundle: ReplayFrameBundle,
});

payload_model!(ChannelPacket { name: String });

payload_model!(FriendPacket { target_id: i32 });

payload_model!(StatsRequestPacket { session_ids: Vec<i32> });

payload_model!(PresenceRequestPacket { session_ids: Vec<i32> });

payload_model!(ToggleDmsPacket { value: i32 });

payload_model!(ReceiveUpdatesPacket { filter: i32 });

payload_model!(AwayMessagePacket { message: Message });

payload_model!(CreateMatchPacket { match_data: OsuMatch });

payload_model!(JoinMatchPacket {
    match_id: i32,
    password: String,
});

payload_model!(ChangeSlotPacket { slot_id: i32 });

payload_model!(LockSlotPacket { slot_id: i32 });

payload_model!(ChangeSettingsPacket { match_data: OsuMatch });

payload_model!(ScoreUpdatePacket { raw: RawBytes });

payload_model!(TransferHostPacket { slot_id: i32 });

payload_model!(ChangePasswordPacket { match_data: OsuMatch });

payload_model!(InvitePacket { target_id: i32 });

payload_model!(MatchIdPacket { match_id: i32 });

/// Packets whose payload is empty (or ignored wholesale).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EmptyPacket;

impl PacketPayload for EmptyPacket {
    fn read(_reader: &mut PacketReader<'_>) -> Self {
        EmptyPacket
    }
}
