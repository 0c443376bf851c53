//! Package archive reading
//!
//! Addon packages are gzip-compressed tarballs. Two shapes exist:
//!
//! - Generation 2: `manifest.json` plus a nested `addon.bundle` archive
//!   holding the framework bundle.
//! - Generation 1 (legacy, read-only): `manifest.json` plus the bundle's
//!   files flattened under an `addon/` prefix.
//!
//! [`PackageArchive::bundle`] probes for the nested archive first and falls
//! back to the flattened prefix. Opening an archive reads every entry fully,
//! so corruption anywhere in the container surfaces before any of its
//! contents are trusted.

use brokkr_core::{Error, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tar::Archive;
use tracing::debug;

/// Internal path of the nested framework bundle in a Generation 2 package
pub const BUNDLE_ENTRY: &str = "addon.bundle";

/// Entry prefix holding the bundle files in a Generation 1 package
pub const LEGACY_BUNDLE_PREFIX: &str = "addon/";

/// An opened, fully-verified package archive
#[derive(Debug, Clone)]
pub struct PackageArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl PackageArchive {
    /// Open and verify an archive from disk
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::open_bytes(&bytes)
    }

    /// Open and verify an archive from memory
    pub fn open_bytes(bytes: &[u8]) -> Result<Self> {
        let decoder = GzDecoder::new(Cursor::new(bytes));
        let mut archive = Archive::new(decoder);
        let mut entries = BTreeMap::new();

        let iter = archive.entries().map_err(|err| {
            debug!("archive read failed: {}", err);
            Error::invalid_package("corrupt archive")
        })?;

        for entry in iter {
            let mut entry = entry.map_err(|err| {
                debug!("archive entry failed: {}", err);
                Error::invalid_package("corrupt archive")
            })?;

            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .map_err(|_| Error::invalid_package("non-utf8 entry path"))?
                .to_string_lossy()
                .trim_start_matches("./")
                .to_string();

            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|err| {
                debug!("archive entry read failed: {}", err);
                Error::invalid_package("corrupt archive")
            })?;

            entries.insert(name, data);
        }

        if entries.is_empty() {
            return Err(Error::invalid_package("empty archive"));
        }

        Ok(Self { entries })
    }

    /// Raw bytes of one entry
    pub fn read_binary(&self, internal_path: &str) -> Result<&[u8]> {
        self.entries
            .get(internal_path)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::invalid_package(format!("missing entry: {}", internal_path)))
    }

    /// UTF-8 text of one entry
    pub fn read_text(&self, internal_path: &str) -> Result<String> {
        let bytes = self.read_binary(internal_path)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::invalid_package(format!("non-utf8 entry: {}", internal_path)))
    }

    /// Whether an entry exists
    pub fn contains(&self, internal_path: &str) -> bool {
        self.entries.contains_key(internal_path)
    }

    /// Entry names, sorted
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Open the framework bundle, probing the nested Generation 2 entry
    /// first and falling back to the flattened Generation 1 prefix.
    pub fn bundle(&self) -> Result<PackageArchive> {
        if let Ok(nested) = self.read_binary(BUNDLE_ENTRY) {
            return Self::open_bytes(nested);
        }

        let entries: BTreeMap<String, Vec<u8>> = self
            .entries
            .iter()
            .filter_map(|(name, data)| {
                name.strip_prefix(LEGACY_BUNDLE_PREFIX)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), data.clone()))
            })
            .collect();

        if entries.is_empty() {
            return Err(Error::invalid_package("no framework bundle"));
        }

        Ok(PackageArchive { entries })
    }

    /// Write every entry under `destination`, creating parent directories
    pub fn extract_all(&self, destination: &Path) -> Result<()> {
        for (name, data) in &self.entries {
            let target = destination.join(name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, data)?;
        }
        Ok(())
    }
}

fn append_entry<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data)?;
    Ok(())
}

/// Gzip-compressed tar of a directory's files, entry names relative to it
pub fn pack_dir(dir: &Path) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            Error::invalid_package(format!("unreadable bundle directory: {}", err))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| Error::invalid_package("bundle entry escapes its directory"))?
            .to_string_lossy()
            .replace('\\', "/");
        let data = std::fs::read(entry.path())?;
        append_entry(&mut builder, &name, &data)?;
    }

    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// Assemble a Generation 2 package: `manifest.json` plus the nested bundle
pub fn write_package(manifest_json: &str, bundle: &[u8], destination: &Path) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_entry(&mut builder, "manifest.json", manifest_json.as_bytes())?;
    append_entry(&mut builder, BUNDLE_ENTRY, bundle)?;

    let bytes = builder.into_inner()?.finish()?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(destination, bytes)?;
    Ok(())
}
