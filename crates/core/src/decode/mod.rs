//! Reader for finished dumps, used by the `inspect` command and by tests.

use serde::{Deserialize, Serialize};

use crate::{
    command::{
        CommandRecord, Polygon, Vertex, MAGIC, MAGIC_LEN, TAG_POLYGON_ATTR, TAG_QUAD,
        TAG_TEX_PALETTE, TAG_TEX_PARAM, TAG_TRIANGLE,
    },
    snapshot::{
        VramBank, TAG_DISP, TAG_TOON, TAG_VRAM, TEXTURE_MAP_LEN, TEX_PAL_MAP_LEN, TOON_TABLE_LEN,
    },
    Result, RipError,
};

/// Owned copy of the state recorded at the end of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub texture_map: [u32; TEXTURE_MAP_LEN],
    pub tex_pal_map: [u32; TEX_PAL_MAP_LEN],
    /// Bank contents in [`VramBank::ALL`] order.
    pub banks: Vec<Vec<u8>>,
    pub disp_cnt: u32,
    pub toon_table: [u16; TOON_TABLE_LEN],
}

impl Snapshot {
    pub fn bank(&self, bank: VramBank) -> &[u8] {
        &self.banks[bank as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub commands: Vec<CommandRecord>,
    pub snapshot: Snapshot,
}

/// Per-kind command counts and the headline registers of a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub total_bytes: usize,
    pub triangles: usize,
    pub quads: usize,
    pub tex_params: usize,
    pub tex_palettes: usize,
    pub polygon_attrs: usize,
    pub disp_cnt: u32,
    pub texture_map: Vec<u32>,
    pub tex_pal_map: Vec<u32>,
}

impl Artifact {
    pub fn summary(&self, total_bytes: usize) -> ArtifactSummary {
        let mut summary = ArtifactSummary {
            total_bytes,
            disp_cnt: self.snapshot.disp_cnt,
            texture_map: self.snapshot.texture_map.to_vec(),
            tex_pal_map: self.snapshot.tex_pal_map.to_vec(),
            ..Default::default()
        };

        for command in &self.commands {
            match command {
                CommandRecord::Polygon(Polygon::Triangle(_)) => summary.triangles += 1,
                CommandRecord::Polygon(Polygon::Quad(_)) => summary.quads += 1,
                CommandRecord::TexParam(_) => summary.tex_params += 1,
                CommandRecord::TexPalette(_) => summary.tex_palettes += 1,
                CommandRecord::PolygonAttr(_) => summary.polygon_attrs += 1,
            }
        }

        summary
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.bytes.len() - self.offset;
        if remaining < len {
            return Err(RipError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn i16(&mut self) -> Result<i16> {
        self.array().map(i16::from_le_bytes)
    }

    fn i32(&mut self) -> Result<i32> {
        self.array().map(i32::from_le_bytes)
    }

    fn vertex(&mut self) -> Result<Vertex> {
        Ok(Vertex {
            position: [self.i32()?, self.i32()?, self.i32()?],
            color: [self.i32()?, self.i32()?, self.i32()?],
            tex_coords: [self.i16()?, self.i16()?],
        })
    }

    fn is_empty(&self) -> bool {
        self.offset == self.bytes.len()
    }
}

/// Parses a complete dump: header, commands, then exactly one snapshot.
pub fn decode(bytes: &[u8]) -> Result<Artifact> {
    let mut reader = Reader { bytes, offset: 0 };

    if bytes.len() < MAGIC_LEN || bytes[..MAGIC_LEN] != MAGIC {
        return Err(RipError::BadMagic);
    }
    reader.offset = MAGIC_LEN;

    let mut commands = Vec::new();
    loop {
        if reader.is_empty() {
            return Err(RipError::MissingSnapshot);
        }
        let offset = reader.offset;
        let tag: [u8; 4] = reader.array()?;
        let command = match tag {
            TAG_TRIANGLE => CommandRecord::Polygon(Polygon::Triangle([
                reader.vertex()?,
                reader.vertex()?,
                reader.vertex()?,
            ])),
            TAG_QUAD => CommandRecord::Polygon(Polygon::Quad([
                reader.vertex()?,
                reader.vertex()?,
                reader.vertex()?,
                reader.vertex()?,
            ])),
            TAG_TEX_PARAM => CommandRecord::TexParam(reader.u32()?),
            TAG_TEX_PALETTE => CommandRecord::TexPalette(reader.u32()?),
            TAG_POLYGON_ATTR => CommandRecord::PolygonAttr(reader.u32()?),
            TAG_VRAM => break,
            tag => return Err(RipError::UnknownOpcode { offset, tag }),
        };
        commands.push(command);
    }

    let snapshot = read_snapshot(&mut reader)?;
    if !reader.is_empty() {
        return Err(RipError::TrailingBytes(bytes.len() - reader.offset));
    }

    Ok(Artifact { commands, snapshot })
}

// The VRAM tag has already been consumed.
fn read_snapshot(reader: &mut Reader<'_>) -> Result<Snapshot> {
    let mut texture_map = [0u32; TEXTURE_MAP_LEN];
    for entry in &mut texture_map {
        *entry = reader.u32()?;
    }
    let mut tex_pal_map = [0u32; TEX_PAL_MAP_LEN];
    for entry in &mut tex_pal_map {
        *entry = reader.u32()?;
    }

    let mut banks = Vec::with_capacity(VramBank::ALL.len());
    for bank in VramBank::ALL {
        banks.push(reader.take(bank.size())?.to_vec());
    }

    expect_tag(reader, TAG_DISP)?;
    let disp_cnt = reader.u32()?;

    expect_tag(reader, TAG_TOON)?;
    let mut toon_table = [0u16; TOON_TABLE_LEN];
    for entry in &mut toon_table {
        *entry = reader.u16()?;
    }

    Ok(Snapshot {
        texture_map,
        tex_pal_map,
        banks,
        disp_cnt,
        toon_table,
    })
}

fn expect_tag(reader: &mut Reader<'_>, expected: [u8; 4]) -> Result<()> {
    let offset = reader.offset;
    let tag: [u8; 4] = reader.array()?;
    if tag == expected {
        Ok(())
    } else {
        Err(RipError::UnknownOpcode { offset, tag })
    }
}
