//! Path to resource resolution.
//!
//! The refactoring engine addresses files and folders by project-relative,
//! `/`-separated paths. This module turns the file-system paths the CLI
//! receives into those handles and enforces that they stay inside the project.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{RopifyError, RopifyResult};

/// What a resource refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Folder,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::File => write!(f, "file"),
            ResourceKind::Folder => write!(f, "folder"),
        }
    }
}

/// A project-relative handle to a file or folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: String,
    kind: ResourceKind,
    exists: bool,
}

impl Resource {
    /// Build a resource from an already project-relative path.
    ///
    /// Engines use this to hand back resources they reported themselves
    /// (for example the file currently defining a symbol).
    pub fn new(path: impl Into<String>, kind: ResourceKind) -> Self {
        Resource {
            path: path.into(),
            kind,
            exists: true,
        }
    }

    /// Project-relative path with `/` separators. The root is `""`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    /// Whether the resource existed on disk when it was resolved.
    pub fn exists(&self) -> bool {
        self.exists
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// Resolve a file-system path to a resource inside `root`.
///
/// `root` must already be canonical. Relative paths are taken relative to the
/// process working directory. A path that does not exist only resolves when
/// `hint` is [`ResourceKind::Folder`], since a module may be moved into a
/// package that does not exist yet.
pub fn resolve_resource(root: &Path, path: &Path, hint: ResourceKind) -> RopifyResult<Resource> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let (canonical, kind, exists) = match std::fs::metadata(&absolute) {
        Ok(metadata) => {
            let kind = if metadata.is_dir() {
                ResourceKind::Folder
            } else {
                ResourceKind::File
            };
            (absolute.canonicalize()?, kind, true)
        }
        Err(_) if hint == ResourceKind::Folder => {
            (canonicalize_existing_prefix(&absolute)?, hint, false)
        }
        Err(_) => {
            return Err(RopifyError::invalid_args(format!(
                "path does not exist: {}",
                path.display()
            )));
        }
    };

    let relative = canonical.strip_prefix(root).map_err(|_| {
        RopifyError::invalid_args(format!(
            "{} is outside the project root {}",
            path.display(),
            root.display()
        ))
    })?;

    Ok(Resource {
        path: to_resource_path(relative)?,
        kind,
        exists,
    })
}

/// Convert a zero-based byte offset into the character offset the engine uses.
///
/// The engine reads source the way Python does: a `coding` cookie in the first
/// two lines picks the codec, data that does not decode falls back to latin-1,
/// and `\r\n` or a lone `\r` become a single `\n`. The returned offset
/// indexes that decoded, newline-normalized text.
pub fn engine_offset(data: &[u8], byte_offset: usize) -> RopifyResult<usize> {
    if byte_offset > data.len() {
        return Err(RopifyError::invalid_args(format!(
            "offset {} is past end of file ({} bytes)",
            byte_offset,
            data.len()
        )));
    }
    let prefix = &data[..byte_offset];
    let codec = coding_cookie(data).map(|name| normalize_codec(&name));

    match codec.as_deref() {
        None | Some("utf8" | "u8" | "utf" | "cp65001") => utf8_offset(data, byte_offset, false),
        Some("utf8sig") => utf8_offset(data, byte_offset, true),
        Some(name) if is_multibyte_codec(name) => Err(RopifyError::invalid_args(format!(
            "byte offsets in {}-encoded files are not supported",
            name
        ))),
        Some(_) => Ok(count_normalized(prefix.iter().copied())),
    }
}

fn utf8_offset(data: &[u8], byte_offset: usize, strip_bom: bool) -> RopifyResult<usize> {
    let Ok(text) = std::str::from_utf8(data) else {
        tracing::debug!("source is not valid UTF-8, counting it as latin-1");
        return Ok(count_normalized(data[..byte_offset].iter().copied()));
    };
    if !text.is_char_boundary(byte_offset) {
        return Err(RopifyError::invalid_args(format!(
            "offset {} falls inside a multi-byte character",
            byte_offset
        )));
    }
    let bom = if strip_bom && text.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    let start = bom.min(byte_offset);
    Ok(count_normalized(text[start..byte_offset].chars()))
}

/// Count characters with `\r\n` taken as one.
fn count_normalized<C: Into<char>>(chars: impl Iterator<Item = C>) -> usize {
    let mut count = 0;
    let mut after_cr = false;
    for c in chars {
        let c = c.into();
        if !(after_cr && c == '\n') {
            count += 1;
        }
        after_cr = c == '\r';
    }
    count
}

/// Find a PEP 263 style `coding[:=] name` declaration in the first two lines.
fn coding_cookie(data: &[u8]) -> Option<String> {
    let head_len = data
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'\n')
        .nth(1)
        .map_or(data.len(), |(index, _)| index);
    let head = &data[..head_len];

    let marker = b"coding";
    let found = head.windows(marker.len()).position(|w| w == marker)?;
    let mut start = found + marker.len();
    if !matches!(head.get(start), Some(b'=' | b':')) {
        return None;
    }
    start += 1;
    while head.get(start).is_some_and(|b| b.is_ascii_whitespace()) {
        start += 1;
    }
    let name: String = head[start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(**b, b'-' | b'_'))
        .map(|b| char::from(*b))
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Lowercase a codec name and drop `-` and `_` so aliases compare equal.
fn normalize_codec(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Codecs where one character may span several bytes.
fn is_multibyte_codec(name: &str) -> bool {
    const PREFIXES: &[&str] = &["utf16", "utf32", "utf7", "iso2022"];
    const NAMES: &[&str] = &[
        "shiftjis", "sjis", "cp932", "mskanji", "eucjp", "gbk", "gb2312", "gb18030", "big5",
        "big5hkscs", "cp950", "cp949", "euckr", "johab", "hz",
    ];
    PREFIXES.iter().any(|prefix| name.starts_with(prefix)) || NAMES.contains(&name)
}

/// Canonicalize the longest existing ancestor and re-append the rest.
fn canonicalize_existing_prefix(path: &Path) -> RopifyResult<PathBuf> {
    let normalized = normalize_lexically(path);
    let mut existing = normalized.as_path();
    let mut missing: Vec<&std::ffi::OsStr> = Vec::new();

    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut result = existing.canonicalize()?;
    for name in missing.iter().rev() {
        result.push(name);
    }
    Ok(result)
}

/// Remove `.` and `..` components without touching the file system.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn to_resource_path(relative: &Path) -> RopifyResult<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            RopifyError::invalid_args(format!("path is not valid UTF-8: {}", relative.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
