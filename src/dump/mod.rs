//! Dump file access: compressed reads, backups and atomic in-place writes.

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> Box<dyn Read + 'a> {
        match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader).unwrap()),
        }
    }

    /// Compress a buffer into the format's encoded form
    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Bzip2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Xz => {
                let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Zstd => zstd::encode_all(data, 0),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Read a whole dump into memory, decompressing when the extension calls for it.
pub fn read_dump(path: &Path) -> anyhow::Result<Vec<u8>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dump file: {}", path.display()))?;

    let compression = Compression::from_path(path);
    let mut reader = compression.wrap_reader(Box::new(BufReader::new(file)));

    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .with_context(|| format!("Failed to read dump file: {}", path.display()))?;

    Ok(data)
}

/// Copy the dump to a sibling path with the suffix appended.
pub fn write_backup(path: &Path, suffix: &str) -> anyhow::Result<PathBuf> {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    let backup = PathBuf::from(name);

    std::fs::copy(path, &backup)
        .with_context(|| format!("Failed to write backup: {}", backup.display()))?;

    Ok(backup)
}

/// Replace the dump's contents atomically, recompressing to match its
/// extension. Returns the number of bytes written to disk.
///
/// The data lands in a temp file in the same directory first and is renamed
/// over the original, so a failed run never leaves a half-written dump.
pub fn replace_dump(path: &Path, data: &[u8]) -> anyhow::Result<u64> {
    let encoded = Compression::from_path(path)
        .compress(data)
        .with_context(|| format!("Failed to compress dump: {}", path.display()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in: {}", dir.display()))?;
    tmp.write_all(&encoded)
        .with_context(|| format!("Failed to write dump: {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("Failed to flush dump: {}", path.display()))?;

    // The rename must not drop the original file's permissions.
    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), metadata.permissions())
            .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to replace dump file: {}", path.display()))?;

    Ok(encoded.len() as u64)
}
