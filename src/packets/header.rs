// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use zerocopy::{
    FromBytes as ZFromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U16, U32,
};

pub const HEADER_LEN: usize = 7;

/// The fixed framing prefix of every packet:
/// `u16 id ‖ u8 pad ‖ u32 payload length`, little-endian.
#[repr(C)]
#[derive(Debug, Default, PartialEq, ZFromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct PacketHeader {
    pub id: U16<LittleEndian>,
    pub pad: u8,
    pub length: U32<LittleEndian>,
}

impl PacketHeader {
    pub fn new(id: u16, length: u32) -> Self {
        PacketHeader {
            id: id.into(),
            pad: 0,
            length: length.into(),
        }
    }

    /// Reads a header off the front of `data`. `None` when fewer than seven
    /// bytes remain.
    pub fn parse(data: &[u8]) -> Option<(u16, usize)> {
        let header = PacketHeader::ref_from_bytes(data.get(..HEADER_LEN)?).ok()?;
        Some((header.id.get(), header.length.get() as usize))
    }
}
