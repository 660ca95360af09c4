pub mod layer;

use self::layer::{Layer, Line};
use crate::{
    block::{Blocks, Tag, FRAMING_START, MAGIC_HEADER, VERSION_OFFSET},
    internals::binreader::BinReader,
    utils,
};
use linked_hash_map::LinkedHashMap;
use std::{
    fmt::{Display, Formatter},
    fs, io,
    path::Path,
};
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Format(FormatError),
}

/// A byte-level violation of the v6 wire layout.
///
/// Only [`ShortFile`] and [`BadHeader`] abort a decode; the rest surface
/// from inside a single line block and get that block dropped instead.
///
/// [`ShortFile`]: FormatError::ShortFile
/// [`BadHeader`]: FormatError::BadHeader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Input ends before the 43-byte header region does.
    ShortFile { len: usize },
    /// The 32-byte ASCII prefix is not the `.lines` one.
    BadHeader,
    /// A typed read ran past the end of its buffer.
    ShortRead { at: usize, need: usize },
    /// A separator byte was not where the layout puts it.
    BadMagic { at: usize, expected: u8, got: u8 },
    /// A line block with no `0x54` sentinel anywhere in it.
    NoDoneFlag,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error as E;

        match self {
            E::Io(io) => write!(f, "{io}"),
            E::Format(format) => write!(f, "{format}"),
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use FormatError as E;

        match self {
            E::ShortFile { len } => {
                write!(f, "file is {len} bytes long; the v6 header alone needs 43.")
            }
            E::BadHeader => write!(f, "not a 'reMarkable .lines' file."),
            E::ShortRead { at, need } => {
                write!(f, "needed {need} byte(s) at offset {at}, hit end of input.")
            }
            E::BadMagic { at, expected, got } => {
                write!(
                    f,
                    "expected separator {expected:#04x} at offset {at}, got {got:#04x}."
                )
            }
            E::NoDoneFlag => write!(f, "line block has no 0x54 sentinel."),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

impl std::error::Error for Error {}
impl std::error::Error for FormatError {}

/// A fully decoded `.rm` page.
///
/// Produced by one [`from_bytes`] call and immutable afterwards; the
/// struct owns all of its data, so the input buffer can be dropped.
///
/// [`from_bytes`]: Document::from_bytes
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The version character at offset 32, `'6'` in the wild.
    pub version: char,
    /// Layers in first-definition order.
    pub layers: Vec<Layer>,
    /// Line blocks discarded under the recover-locally policy.
    pub dropped_lines: usize,
}

impl Document {
    /// Decodes a v6 `.rm` page from its raw bytes.
    ///
    /// Header problems ([`FormatError::ShortFile`],
    /// [`FormatError::BadHeader`]) fail the whole decode. Anything wrong
    /// inside a single line block only drops that block and bumps
    /// [`dropped_lines`]; unknown tags and truncated tails are skipped
    /// silently, which is how the tablet itself treats them.
    ///
    /// [`dropped_lines`]: Document::dropped_lines
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAMING_START {
            return Err(FormatError::ShortFile { len: bytes.len() }.into());
        }

        if &bytes[..MAGIC_HEADER.len()] != MAGIC_HEADER {
            return Err(FormatError::BadHeader.into());
        }

        let version = char::from(bytes[VERSION_OFFSET]);

        // Insertion order doubles as first-definition order, which is the
        // layer order the output promises.
        let mut layers: LinkedHashMap<u32, Vec<Line>> = LinkedHashMap::new();
        let mut current_layer: Option<u32> = None;
        let mut dropped_lines = 0;

        for block in Blocks::new(bytes) {
            match Tag::new(block.tag) {
                Some(Tag::LayerDefinition) => {
                    let Ok(id) = BinReader::new(block.body).read_u32() else {
                        debug!(len = block.body.len(), "layer definition body too short");
                        continue;
                    };

                    current_layer = Some(id);
                    layers.entry(id).or_insert_with(Vec::new);
                }
                Some(Tag::LineDefinition) => {
                    match Line::new(&mut BinReader::new(block.body)) {
                        Ok(line) => {
                            // A stroke that arrives before any layer
                            // definition has no home and is dropped.
                            if let Some(lines) =
                                current_layer.and_then(|id| layers.get_mut(&id))
                            {
                                lines.push(line);
                            }
                        }
                        Err(err) => {
                            dropped_lines += 1;
                            warn!(%err, "dropping undecodable line block");
                        }
                    }
                }
                Some(Tag::LayerName | Tag::LayerInfo | Tag::TextDefinition) => {}
                None => debug!(tag = block.tag, "skipping unrecognised tag"),
            }
        }

        Ok(Self {
            version,
            layers: layers
                .into_iter()
                .map(|(id, lines)| Layer { id, lines })
                .collect(),
            dropped_lines,
        })
    }

    /// Reads and decodes an `.rm` file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    /// Total stroke count across all layers.
    pub fn line_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.lines.len()).sum()
    }

    /// Total telemetry sample count across all strokes.
    pub fn point_count(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|layer| &layer.lines)
            .map(|line| line.points.len())
            .sum()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let (true, false) = (f.alternate(), cfg!(feature = "tree_view")) {
            panic!("Activate the `tree_view` feature to enable colored output.")
        };

        utils::tree::LayerTree::new(&self.layers).fmt(f)
    }
}
