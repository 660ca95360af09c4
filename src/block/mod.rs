//! Frame-level view of a v6 `.rm` file.
//!
//! Past the header, the file is a run of `[u32 body_len][u32 tag][body]`
//! frames. The catch is the frontmatter: a variable-length region with no
//! length prefix sits between the version byte and the first frame, so
//! the only way in is to scan for a recognised tag word.

use crate::internals::binreader::BinReader;

/// The 32-byte ASCII prefix every `.lines` file starts with.
pub(crate) const MAGIC_HEADER: &[u8; 32] = b"reMarkable .lines file, version=";

/// Offset of the one-character format version.
pub(crate) const VERSION_OFFSET: usize = 32;

/// Where the frame scan begins; bytes 33..43 are reserved frontmatter.
pub(crate) const FRAMING_START: usize = 43;

/// `[u32 body_len][u32 tag]`.
const FRAME_HEADER_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tag {
    /// Body starts with the layer id (u32).
    LayerDefinition,
    LayerName,
    LayerInfo,
    /// Body holds one pen stroke.
    LineDefinition,
    /// Typed-text block; recognised so the frontmatter scan can anchor
    /// on it, never decoded.
    TextDefinition,
}

impl Tag {
    pub(crate) fn new(value: u32) -> Option<Self> {
        match value {
            0x01010100 => Some(Self::LayerDefinition),
            0x02020100 => Some(Self::LayerName),
            0x04010100 => Some(Self::LayerInfo),
            0x05020200 => Some(Self::LineDefinition),
            0x07010100 => Some(Self::TextDefinition),
            _ => None,
        }
    }
}

/// One frame, borrowing its body from the input buffer.
pub(crate) struct Block<'a> {
    /// Raw tag word; not every yielded tag is a [`Tag`].
    pub(crate) tag: u32,
    pub(crate) body: &'a [u8],
}

/// Lazy frame iterator over a full `.rm` buffer.
///
/// Termination is always clean: a tail shorter than a frame header, or a
/// `body_len` claiming more bytes than remain, ends the stream without an
/// error. Unrecognised tags are yielded like any other frame.
pub(crate) struct Blocks<'a> {
    reader: BinReader<'a>,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        let mut reader = BinReader::new(buf);
        reader.seek(first_block_offset(buf));

        Self { reader }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.remaining() < FRAME_HEADER_SIZE {
            return None;
        }

        let body_len = self.reader.read_u32().ok()? as usize;
        let tag = self.reader.read_u32().ok()?;
        let body = self.reader.take(body_len).ok()?;

        Some(Block { tag, body })
    }
}

/// Finds the first frame by scanning byte-by-byte from [`FRAMING_START`]
/// for a position whose tag word (at `offset + 4`) is recognised.
///
/// Falls back to [`FRAMING_START`] when nothing matches; the iterator
/// then runs into the short tail and stops on its own.
fn first_block_offset(buf: &[u8]) -> usize {
    let mut offset = FRAMING_START;

    while offset + FRAME_HEADER_SIZE <= buf.len() {
        let tag = u32::from_le_bytes([
            buf[offset + 4],
            buf[offset + 5],
            buf[offset + 6],
            buf[offset + 7],
        ]);

        if Tag::new(tag).is_some() {
            return offset;
        }

        offset += 1;
    }

    FRAMING_START
}
