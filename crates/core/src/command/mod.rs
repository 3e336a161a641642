use crate::{Result, RipError};

/// Size of the header every dump starts with.
pub const MAGIC_LEN: usize = 24;

/// `melon ripper v2`, NUL padded to [`MAGIC_LEN`] bytes.
pub const MAGIC: [u8; MAGIC_LEN] = *b"melon ripper v2\0\0\0\0\0\0\0\0\0";

pub const TAG_TRIANGLE: [u8; 4] = *b"TRI ";
pub const TAG_QUAD: [u8; 4] = *b"QUAD";
pub const TAG_TEX_PARAM: [u8; 4] = *b"TPRM";
pub const TAG_TEX_PALETTE: [u8; 4] = *b"TPLT";
pub const TAG_POLYGON_ATTR: [u8; 4] = *b"PATR";

/// Encoded size of a single vertex: 6 words plus 2 half-words.
pub const VERTEX_LEN: usize = 6 * 4 + 2 * 2;

/// A vertex as submitted to the geometry engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vertex {
    pub position: [i32; 3],
    pub color: [i32; 3],
    pub tex_coords: [i16; 2],
}

/// A triangle or a quad. The hardware never emits anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polygon {
    Triangle([Vertex; 3]),
    Quad([Vertex; 4]),
}

impl Polygon {
    pub fn vertices(&self) -> &[Vertex] {
        match self {
            Self::Triangle(verts) => verts,
            Self::Quad(verts) => verts,
        }
    }

    pub fn tag(&self) -> [u8; 4] {
        match self {
            Self::Triangle(_) => TAG_TRIANGLE,
            Self::Quad(_) => TAG_QUAD,
        }
    }
}

impl<'a> TryFrom<&'a [Vertex]> for Polygon {
    type Error = RipError;

    fn try_from(verts: &'a [Vertex]) -> Result<Self> {
        match *verts {
            [a, b, c] => Ok(Self::Triangle([a, b, c])),
            [a, b, c, d] => Ok(Self::Quad([a, b, c, d])),
            _ => Err(RipError::VertexCount(verts.len())),
        }
    }
}

/// One command observed on the back buffer, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandRecord {
    Polygon(Polygon),
    TexParam(u32),
    TexPalette(u32),
    PolygonAttr(u32),
}

impl CommandRecord {
    pub fn tag(&self) -> [u8; 4] {
        match self {
            Self::Polygon(poly) => poly.tag(),
            Self::TexParam(_) => TAG_TEX_PARAM,
            Self::TexPalette(_) => TAG_TEX_PALETTE,
            Self::PolygonAttr(_) => TAG_POLYGON_ATTR,
        }
    }
}

impl From<Polygon> for CommandRecord {
    fn from(poly: Polygon) -> Self {
        Self::Polygon(poly)
    }
}

pub fn write_magic(rip: &mut Vec<u8>) {
    rip.extend_from_slice(&MAGIC);
}

pub(crate) fn write_opcode(rip: &mut Vec<u8>, tag: [u8; 4]) {
    rip.extend_from_slice(&tag);
}

pub(crate) fn write_u16(rip: &mut Vec<u8>, value: u16) {
    rip.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(rip: &mut Vec<u8>, value: u32) {
    rip.extend_from_slice(&value.to_le_bytes());
}

fn write_i16(rip: &mut Vec<u8>, value: i16) {
    rip.extend_from_slice(&value.to_le_bytes());
}

fn write_i32(rip: &mut Vec<u8>, value: i32) {
    rip.extend_from_slice(&value.to_le_bytes());
}

fn write_vertex(rip: &mut Vec<u8>, vertex: &Vertex) {
    for component in vertex.position {
        write_i32(rip, component);
    }
    for component in vertex.color {
        write_i32(rip, component);
    }
    for coord in vertex.tex_coords {
        write_i16(rip, coord);
    }
}

/// Appends `record`: its tag, then the payload matching its kind.
pub fn write_command(rip: &mut Vec<u8>, record: &CommandRecord) {
    write_opcode(rip, record.tag());
    match record {
        CommandRecord::Polygon(poly) => {
            for vertex in poly.vertices() {
                write_vertex(rip, vertex);
            }
        }
        CommandRecord::TexParam(word)
        | CommandRecord::TexPalette(word)
        | CommandRecord::PolygonAttr(word) => write_u32(rip, *word),
    }
}

pub fn write_polygon(rip: &mut Vec<u8>, poly: &Polygon) {
    write_command(rip, &CommandRecord::Polygon(*poly));
}

pub fn write_tex_param(rip: &mut Vec<u8>, tex_param: u32) {
    write_command(rip, &CommandRecord::TexParam(tex_param));
}

pub fn write_tex_palette(rip: &mut Vec<u8>, tex_palette: u32) {
    write_command(rip, &CommandRecord::TexPalette(tex_palette));
}

pub fn write_polygon_attr(rip: &mut Vec<u8>, attr: u32) {
    write_command(rip, &CommandRecord::PolygonAttr(attr));
}
