//! Display-time environment captured at the tail of every dump.
//!
//! The host hands over a [`RenderState`] borrowed from its own VRAM and
//! register file at the moment a frame is actually rendered. Nothing here
//! holds on to that state beyond the call that encodes it.

use std::fmt;

use crate::command::{write_opcode, write_u16, write_u32};
use crate::{Result, RipError};

pub const TAG_VRAM: [u8; 4] = *b"VRAM";
pub const TAG_DISP: [u8; 4] = *b"DISP";
pub const TAG_TOON: [u8; 4] = *b"TOON";

pub const TEXTURE_MAP_LEN: usize = 4;
pub const TEX_PAL_MAP_LEN: usize = 8;
pub const TOON_TABLE_LEN: usize = 32;

/// The seven VRAM banks that can hold texture or palette data, in dump order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VramBank {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl VramBank {
    pub const ALL: [VramBank; 7] = [
        VramBank::A,
        VramBank::B,
        VramBank::C,
        VramBank::D,
        VramBank::E,
        VramBank::F,
        VramBank::G,
    ];

    /// Size of the bank in bytes.
    pub const fn size(self) -> usize {
        let kib = match self {
            Self::A | Self::B | Self::C | Self::D => 128,
            Self::E => 64,
            Self::F | Self::G => 16,
        };
        kib * 1024
    }

    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
        }
    }
}

/// Total size of all bank contents in a `VRAM` block.
pub const VRAM_BANKS_LEN: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < VramBank::ALL.len() {
        total += VramBank::ALL[i].size();
        i += 1;
    }
    total
};

/// Encoded size of a whole snapshot block, tags included.
pub const SNAPSHOT_LEN: usize = 4
    + (TEXTURE_MAP_LEN + TEX_PAL_MAP_LEN) * 4
    + VRAM_BANKS_LEN
    + 4
    + 4
    + 4
    + TOON_TABLE_LEN * 2;

/// Borrowed contents of every bank, checked against the hardware sizes.
#[derive(Clone, Copy)]
pub struct VramBanks<'a> {
    banks: [&'a [u8]; 7],
}

impl<'a> VramBanks<'a> {
    /// Banks are given in [`VramBank::ALL`] order.
    pub fn new(banks: [&'a [u8]; 7]) -> Result<Self> {
        for (bank, contents) in VramBank::ALL.iter().zip(banks.iter()) {
            if contents.len() != bank.size() {
                return Err(RipError::BankSize {
                    bank: bank.letter(),
                    expected: bank.size(),
                    actual: contents.len(),
                });
            }
        }
        Ok(Self { banks })
    }

    pub fn bank(&self, bank: VramBank) -> &'a [u8] {
        self.banks[bank as usize]
    }
}

impl fmt::Debug for VramBanks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VramBanks")
            .field("bytes", &VRAM_BANKS_LEN)
            .finish()
    }
}

/// Read-only view of the GPU state that governs how a frame is rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub texture_map: [u32; TEXTURE_MAP_LEN],
    pub tex_pal_map: [u32; TEX_PAL_MAP_LEN],
    pub banks: VramBanks<'a>,
    pub disp_cnt: u32,
    pub toon_table: [u16; TOON_TABLE_LEN],
}

fn write_vram(rip: &mut Vec<u8>, state: &RenderState<'_>) {
    write_opcode(rip, TAG_VRAM);
    for entry in state.texture_map {
        write_u32(rip, entry);
    }
    for entry in state.tex_pal_map {
        write_u32(rip, entry);
    }
    for bank in VramBank::ALL {
        rip.extend_from_slice(state.banks.bank(bank));
    }
}

fn write_disp_cnt(rip: &mut Vec<u8>, disp_cnt: u32) {
    write_opcode(rip, TAG_DISP);
    write_u32(rip, disp_cnt);
}

fn write_toon_table(rip: &mut Vec<u8>, toon_table: &[u16; TOON_TABLE_LEN]) {
    write_opcode(rip, TAG_TOON);
    for entry in toon_table {
        write_u16(rip, *entry);
    }
}

/// Appends the `VRAM`, `DISP` and `TOON` blocks, in that order.
pub fn write_snapshot(rip: &mut Vec<u8>, state: &RenderState<'_>) {
    rip.reserve(SNAPSHOT_LEN);
    write_vram(rip, state);
    write_disp_cnt(rip, state.disp_cnt);
    write_toon_table(rip, &state.toon_table);
}
