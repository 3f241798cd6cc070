/*!
 * Office Open XML zip package.
 *
 * Every entry is read into memory in archive order. Parts that get
 * rewritten are replaced by name; everything else is written back
 * byte-for-byte with its original compression method.
 */

use std::io::{Cursor, Read, Write};

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
    stored: bool,
}

/// In-memory view of a zip-based office document
#[derive(Debug, Clone)]
pub struct OoxmlPackage {
    entries: Vec<PackageEntry>,
}

/// Most bytes a package may decompress to
pub const MAX_PACKAGE_BYTES: u64 = 256 * 1024 * 1024;

impl OoxmlPackage {
    /// Read every entry of the archive
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        Self::from_bytes_with_limit(bytes, MAX_PACKAGE_BYTES)
    }

    /// Read every entry, failing once the decompressed total passes `limit`.
    ///
    /// Sizes declared by the archive are only checked, never used to allocate.
    pub fn from_bytes_with_limit(bytes: &[u8], limit: u64) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        let mut remaining = limit;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let stored = file.compression() == CompressionMethod::Stored;

            let mut data = Vec::new();
            if !is_dir {
                if file.size() > remaining {
                    return Err(DocumentError::Archive(format!(
                        "{}: declared size {} exceeds the {} byte package limit",
                        name,
                        file.size(),
                        limit
                    )));
                }
                (&mut file)
                    .take(remaining.saturating_add(1))
                    .read_to_end(&mut data)
                    .map_err(|e| DocumentError::Archive(format!("{}: {}", name, e)))?;
                let read = data.len() as u64;
                if read > remaining {
                    return Err(DocumentError::Archive(format!(
                        "{}: package decompresses past {} bytes",
                        name, limit
                    )));
                }
                remaining -= read;
            }
            entries.push(PackageEntry {
                name,
                data,
                is_dir,
                stored,
            });
        }

        debug!("Opened package with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Raw bytes of a part, if present
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name && !e.is_dir)
            .map(|e| e.data.as_slice())
    }

    /// Raw bytes of a part that must exist
    pub fn require_part(&self, name: &str) -> Result<&[u8], DocumentError> {
        self.part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))
    }

    /// Names of all file entries, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str())
    }

    /// Replace the bytes of an existing part, or append a new one
    pub fn replace(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                is_dir: false,
                stored: false,
            }),
        }
    }

    /// Write the package back out as a zip archive
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = if entry.stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
                continue;
            }

            writer.start_file(entry.name.as_str(), options)?;
            writer
                .write_all(&entry.data)
                .map_err(|e| DocumentError::Archive(format!("{}: {}", entry.name, e)))?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
