//! Shared types for audiodeck.
//!
//! The catalog is the fixed, ordered identifier list the page is built from.
//! Nothing here discovers files; changing the file set means changing the list.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Directory (relative to the page) holding the `.txt` / `.wav` pairs.
pub const DEFAULT_BASE_DIR: &str = "audio";

/// File name offered for the "download all" archive.
pub const ARCHIVE_FILE_NAME: &str = "audio_files.zip";

/// Single folder every archive entry is placed under.
pub const ARCHIVE_FOLDER: &str = "audio";

/// Identifiers shipped with the page: `001` through `012`.
pub const DEFAULT_IDENTIFIERS: &[&str] = &[
    "001", "002", "003", "004", "005", "006", "007", "008", "009", "010", "011", "012",
];

static RE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

// ─── Identifier ────────────────────────────────────────────────────────────

/// Short fixed-format name of one file pair, e.g. `003`.
///
/// Restricted to ASCII alphanumerics, `-` and `_` so `<id>.txt` is always a
/// single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(s: &str) -> Result<Self, String> {
        if RE_IDENTIFIER.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!(
                "invalid identifier '{s}'; expected 1-64 of [A-Za-z0-9_-]"
            ))
        }
    }

    /// Zero-padded three-digit identifier for a 1-based ordinal.
    pub fn ordinal(n: usize) -> Self {
        Self(format!("{n:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this identifier's resource of the given kind.
    pub fn file_name(&self, kind: ResourceKind) -> String {
        format!("{}.{}", self.0, kind.extension())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

// ─── Resources ─────────────────────────────────────────────────────────────

/// The two halves of a file pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Text,
    Audio,
}

impl ResourceKind {
    /// Order in which a pair is visited by the exporter.
    pub const PAIR: [ResourceKind; 2] = [ResourceKind::Text, ResourceKind::Audio];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Audio => "wav",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Audio => "audio/wav",
        }
    }

    /// Kind implied by a file name's extension, if it is one of ours.
    pub fn from_file_name(name: &str) -> Option<(Identifier, Self)> {
        let (stem, ext) = name.rsplit_once('.')?;
        let kind = match ext {
            "txt" => Self::Text,
            "wav" => Self::Audio,
            _ => return None,
        };
        Identifier::parse(stem).ok().map(|id| (id, kind))
    }
}

/// Relative location of one resource: `./<base_dir>/<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    base_dir: String,
    file_name: String,
}

impl ResourcePath {
    pub fn new(base_dir: &str, file_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.trim_matches('/').to_string(),
            file_name: file_name.into(),
        }
    }

    /// Page-relative URL, as bound to `<audio src>`.
    pub fn url(&self) -> String {
        format!("./{}/{}", self.base_dir, self.file_name)
    }

    /// `<base_dir>/<file_name>` without the leading `./`.
    pub fn relative(&self) -> String {
        format!("{}/{}", self.base_dir, self.file_name)
    }

    /// Last path segment; used in user-facing error text.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

// ─── Catalog ───────────────────────────────────────────────────────────────

/// Fixed ordered identifier list plus the directory the pairs live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    base_dir: String,
    identifiers: Vec<Identifier>,
}

impl Default for Catalog {
    fn default() -> Self {
        let identifiers = DEFAULT_IDENTIFIERS
            .iter()
            .map(|s| Identifier(s.to_string()))
            .collect();
        Self {
            base_dir: DEFAULT_BASE_DIR.into(),
            identifiers,
        }
    }
}

impl Catalog {
    /// `base_dir` is stored without leading or trailing `/`, so it always
    /// joins under a root instead of replacing it.
    pub fn new(base_dir: impl Into<String>, identifiers: Vec<Identifier>) -> Self {
        Self {
            base_dir: base_dir.into().trim_matches('/').to_string(),
            identifiers,
        }
    }

    /// `001` ..= `<count>` zero-padded, the layout `prepare` writes.
    pub fn from_count(base_dir: impl Into<String>, count: usize) -> Self {
        Self::new(base_dir, (1..=count).map(Identifier::ordinal).collect())
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.identifiers.contains(id)
    }

    pub fn resource(&self, id: &Identifier, kind: ResourceKind) -> ResourcePath {
        ResourcePath::new(&self.base_dir, id.file_name(kind))
    }

    /// Number of fetches one full export attempts (text + audio per id).
    pub fn total_resources(&self) -> usize {
        self.identifiers.len() * ResourceKind::PAIR.len()
    }
}

// ─── Export status ─────────────────────────────────────────────────────────

/// Observable state of the export control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    Packing,
    Generating,
    Hidden,
}

/// Export control snapshot: what the button shows and whether it is usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatus {
    pub state: ExportState,
    pub percent: u8,
    pub label: String,
    pub disabled: bool,
}

impl ExportStatus {
    pub fn idle() -> Self {
        Self {
            state: ExportState::Idle,
            percent: 0,
            label: crate::page::EXPORT_LABEL.into(),
            disabled: false,
        }
    }

    pub fn hidden() -> Self {
        Self {
            state: ExportState::Hidden,
            percent: 0,
            label: String::new(),
            disabled: true,
        }
    }

    pub fn packing(percent: u8) -> Self {
        Self {
            state: ExportState::Packing,
            percent,
            label: crate::page::packing_label(percent),
            disabled: true,
        }
    }

    pub fn generating() -> Self {
        Self {
            state: ExportState::Generating,
            percent: 100,
            label: crate::page::GENERATING_LABEL.into(),
            disabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_001_to_012() {
        let c = Catalog::default();
        assert_eq!(c.len(), 12);
        assert_eq!(c.identifiers()[0].as_str(), "001");
        assert_eq!(c.identifiers()[11].as_str(), "012");
        assert_eq!(c.total_resources(), 24);
    }

    #[test]
    fn from_count_matches_default_layout() {
        assert_eq!(Catalog::from_count(DEFAULT_BASE_DIR, 12), Catalog::default());
        assert!(Catalog::from_count("audio", 0).is_empty());
    }

    #[test]
    fn base_dir_is_stored_relative() {
        let c = Catalog::new("/clips/", vec![Identifier::ordinal(1)]);
        assert_eq!(c.base_dir(), "clips");
        assert_eq!(
            std::path::Path::new("/srv/deck").join(c.base_dir()),
            std::path::Path::new("/srv/deck/clips")
        );
        assert_eq!(
            c.resource(&Identifier::ordinal(1), ResourceKind::Text).url(),
            "./clips/001.txt"
        );
    }

    #[test]
    fn identifier_rejects_path_segments() {
        assert!(Identifier::parse("003").is_ok());
        assert!(Identifier::parse("take_2-b").is_ok());
        assert!(Identifier::parse("").is_err());
        assert!(Identifier::parse("../etc").is_err());
        assert!(Identifier::parse("a/b").is_err());
        assert!(Identifier::parse(&"9".repeat(65)).is_err());
    }

    #[test]
    fn identifier_deserializes_through_validation() {
        let ok: Identifier = serde_json::from_str("\"007\"").unwrap();
        assert_eq!(ok.as_str(), "007");
        assert!(serde_json::from_str::<Identifier>("\"a b\"").is_err());
    }

    #[test]
    fn resource_paths() {
        let c = Catalog::default();
        let id = Identifier::ordinal(3);
        let text = c.resource(&id, ResourceKind::Text);
        assert_eq!(text.url(), "./audio/003.txt");
        assert_eq!(text.relative(), "audio/003.txt");
        assert_eq!(text.file_name(), "003.txt");
        assert_eq!(c.resource(&id, ResourceKind::Audio).url(), "./audio/003.wav");
    }

    #[test]
    fn kind_from_file_name() {
        let (id, kind) = ResourceKind::from_file_name("010.wav").unwrap();
        assert_eq!(id.as_str(), "010");
        assert_eq!(kind, ResourceKind::Audio);
        assert!(ResourceKind::from_file_name("010.mp3").is_none());
        assert!(ResourceKind::from_file_name("noext").is_none());
        assert!(ResourceKind::from_file_name("..%2f.txt").is_none());
    }

    #[test]
    fn export_status_serializes_camel_case() {
        let json = serde_json::to_value(ExportStatus::packing(42)).unwrap();
        assert_eq!(json["state"], "packing");
        assert_eq!(json["percent"], 42);
        assert_eq!(json["disabled"], true);
        assert_eq!(json["label"], "正在打包... (42%)");
    }
}
