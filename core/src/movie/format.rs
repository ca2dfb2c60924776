//! Movie source identification

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::binary::MAGIC;
use crate::error::MovieError;

/// Extension of the text profile
pub const TEXT_EXTENSION: &str = "irt";
/// Extension of the binary profile
pub const BINARY_EXTENSION: &str = "irb";
/// Extension of script sources
pub const SCRIPT_EXTENSION: &str = "lua";

/// Leading bytes inspected when sniffing a source
const SNIFF_LEN: usize = 64;

/// Kind of input source a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieFormat {
    /// Linear document, JSON text profile
    Text,
    /// Linear document, binary profile
    Binary,
    /// Script that generates input
    Script,
}

impl MovieFormat {
    /// Identify a source from its leading bytes and extension.
    ///
    /// The binary magic wins over everything; then the extension decides;
    /// then a leading `{` marks a text document.
    pub fn detect(path: &Path) -> Result<Self, MovieError> {
        let mut head = Vec::with_capacity(SNIFF_LEN);
        File::open(path)
            .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut head))
            .map_err(|e| MovieError::io(path, e))?;

        Self::from_signature(path, &head).ok_or_else(|| MovieError::UnknownSignature(path.to_path_buf()))
    }

    /// Signature rules without touching the filesystem
    pub fn from_signature(path: &Path, head: &[u8]) -> Option<Self> {
        if head.starts_with(&MAGIC) {
            return Some(Self::Binary);
        }
        if let Some(format) = Self::from_extension(path) {
            return Some(format);
        }
        let first = head.iter().find(|b| !b.is_ascii_whitespace());
        (first == Some(&b'{')).then_some(Self::Text)
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            TEXT_EXTENSION => Some(Self::Text),
            BINARY_EXTENSION => Some(Self::Binary),
            SCRIPT_EXTENSION => Some(Self::Script),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => TEXT_EXTENSION,
            Self::Binary => BINARY_EXTENSION,
            Self::Script => SCRIPT_EXTENSION,
        }
    }

    /// Whether documents of this kind can be persisted
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Script)
    }
}

impl std::fmt::Display for MovieFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Script => "script",
        };
        f.write_str(name)
    }
}
