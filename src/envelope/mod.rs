//! `.rmdoc` envelope reading.
//!
//! An `.rmdoc` bundles one document as a ZIP archive: a `<uuid>.metadata`
//! and a `<uuid>.content` JSON blob, plus one `<uuid>/<page_uuid>.rm`
//! member per page. Only the page bytes are decoded here; the two JSON
//! blobs stay opaque maps for whoever sits downstream.

use crate::doc::{self, Document};
use serde_json::{Map, Value};
use std::{
    fmt::{Display, Formatter},
    fs,
    io::{self, Cursor, Read, Seek},
    path::Path,
};
use tracing::warn;
use zip::{result::ZipError, ZipArchive};

pub type Result<T> = std::result::Result<T, EnvelopeError>;

#[derive(Debug)]
pub enum EnvelopeError {
    Io(io::Error),
    /// The ZIP container itself could not be read.
    Archive(ZipError),
    /// A `.metadata`/`.content` blob is not valid JSON.
    Json(serde_json::Error),
    /// A required archive member is absent.
    MissingEntry(String),
    /// More than one `.metadata` member; the envelope holds one document.
    DuplicateEntry(String),
    /// `content` lists a page with no matching `.rm` member.
    MissingPage(String),
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use EnvelopeError as E;

        match self {
            E::Io(io) => write!(f, "{io}"),
            E::Archive(zip) => write!(f, "unreadable archive: {zip}"),
            E::Json(json) => write!(f, "malformed JSON member: {json}"),
            E::MissingEntry(entry) => write!(f, "'{entry}' entry is missing."),
            E::DuplicateEntry(entry) => {
                write!(f, "'{entry}' names a second document in the envelope.")
            }
            E::MissingPage(page) => {
                write!(f, "page '{page}' is listed in content but has no .rm entry.")
            }
        }
    }
}

impl From<io::Error> for EnvelopeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ZipError> for EnvelopeError {
    fn from(err: ZipError) -> Self {
        Self::Archive(err)
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl std::error::Error for EnvelopeError {}

/// An opened `.rmdoc`.
///
/// Reading the archive happens once, in [`open`]; afterwards the envelope
/// owns every page's bytes and the archive can go away.
///
/// [`open`]: Envelope::open
pub struct Envelope {
    uuid: String,
    metadata: Map<String, Value>,
    content: Map<String, Value>,
    /// `(page_uuid, raw .rm bytes)` in `content` order.
    pages: Vec<(String, Vec<u8>)>,
}

impl Envelope {
    /// Opens an `.rmdoc` from its raw bytes.
    ///
    /// Requires exactly one `.metadata` member, a `.content` member under
    /// the same UUID, and an `.rm` member for every page the content
    /// lists. Page order follows the content JSON, not the archive's
    /// directory order.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut uuid: Option<String> = None;
        for name in archive.file_names() {
            if let Some(prefix) = name.strip_suffix(".metadata") {
                if uuid.is_some() {
                    return Err(EnvelopeError::DuplicateEntry(name.to_owned()));
                }

                uuid = Some(prefix.to_owned());
            }
        }
        let uuid = uuid.ok_or_else(|| EnvelopeError::MissingEntry(".metadata".to_owned()))?;

        let metadata = read_json(&mut archive, &format!("{uuid}.metadata"))?;
        let content = read_json(&mut archive, &format!("{uuid}.content"))?;

        let mut pages = Vec::new();
        for page_uuid in page_order(&content) {
            let member = format!("{uuid}/{page_uuid}.rm");
            let mut file = archive.by_name(&member).map_err(|err| match err {
                ZipError::FileNotFound => EnvelopeError::MissingPage(page_uuid.clone()),
                other => other.into(),
            })?;

            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            pages.push((page_uuid, bytes));
        }

        Ok(Self {
            uuid,
            metadata,
            content,
            pages,
        })
    }

    /// Opens an `.rmdoc` file from disk.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(&fs::read(path)?)
    }

    /// The document UUID shared by the metadata/content pair.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The `.metadata` JSON object, unparsed beyond its map shape.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The `.content` JSON object, unparsed beyond its map shape.
    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// The document's display name, when metadata carries one.
    pub fn visible_name(&self) -> Option<&str> {
        self.metadata.get("visibleName").and_then(Value::as_str)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Raw bytes of one page, looked up by its UUID.
    pub fn page_bytes(&self, page_uuid: &str) -> Option<&[u8]> {
        self.pages
            .iter()
            .find(|(uuid, _)| uuid == page_uuid)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Decodes every page, in `content` order.
    ///
    /// A page that fails to decode travels as the `Err` in its own slot;
    /// it does not abort the rest of the envelope.
    pub fn decode_all(&self) -> Vec<(String, doc::Result<Document>)> {
        self.pages
            .iter()
            .map(|(page_uuid, bytes)| {
                let document = Document::from_bytes(bytes);

                if let Err(err) = &document {
                    warn!(page = %page_uuid, %err, "page failed to decode");
                }

                (page_uuid.clone(), document)
            })
            .collect()
    }
}

fn read_json<R>(archive: &mut ZipArchive<R>, member: &str) -> Result<Map<String, Value>>
where
    R: Read + Seek,
{
    let mut file = archive.by_name(member).map_err(|err| match err {
        ZipError::FileNotFound => EnvelopeError::MissingEntry(member.to_owned()),
        other => other.into(),
    })?;

    let mut buf = String::new();
    file.read_to_string(&mut buf)?;

    Ok(serde_json::from_str(&buf)?)
}

/// Page UUIDs in display order.
///
/// Newer firmware nests the list under `cPages.pages` as objects with an
/// `id`; older content keeps a flat `pages` array of UUID strings. Both
/// shapes appear in the wild, sometimes in the same sync folder.
fn page_order(content: &Map<String, Value>) -> Vec<String> {
    if let Some(Value::Array(pages)) = content.get("pages") {
        return pages
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect();
    }

    if let Some(pages) = content
        .get("cPages")
        .and_then(|c| c.get("pages"))
        .and_then(Value::as_array)
    {
        return pages
            .iter()
            .filter_map(|page| page.get("id").and_then(Value::as_str))
            .map(str::to_owned)
            .collect();
    }

    Vec::new()
}
