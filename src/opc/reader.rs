//! Zip-backed package store

use std::collections::HashSet;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

use flate2::CrcReader;
use flate2::read::DeflateDecoder;
use parking_lot::Mutex;
use zip::{CompressionMethod, ZipArchive};

use super::content_types::ContentTypes;
use super::relationships::{parse_relationships, rels_path_for};
use super::{CONTENT_TYPES_PATH, PackageFile, PackageReader};
use crate::error::{Error, Result};
use crate::model::Relationship;

/// A cursor of its own over a source shared by every part
///
/// The lock is held for one seek and one read only, so several parts can stream
/// from the same archive at once.
struct SharedSource<R> {
    inner: Arc<Mutex<R>>,
    pos: u64,
}

impl<R> Clone for SharedSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            pos: self.pos,
        }
    }
}

impl<R: Read + Seek> SharedSource<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
            pos: 0,
        }
    }

    /// `len` bytes starting at `start`
    fn window(&self, start: u64, len: u64) -> io::Take<Self> {
        Self {
            inner: Arc::clone(&self.inner),
            pos: start,
        }
        .take(len)
    }
}

impl<R: Read + Seek> Read for SharedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.seek(SeekFrom::Start(self.pos))?;
        let n = inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for SharedSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "seek before start of archive")
            })?,
            SeekFrom::End(_) => self.inner.lock().seek(pos)?,
        };
        Ok(self.pos)
    }
}

/// Fails the read that reaches the end of a part whose checksum does not match
struct Checked<R> {
    inner: CrcReader<R>,
    expected: u32,
    name: String,
}

impl<R: Read> Read for Checked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() && self.inner.crc().sum() != self.expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("checksum mismatch in {}", self.name),
            ));
        }
        Ok(n)
    }
}

struct Shared<R> {
    archive: Mutex<ZipArchive<SharedSource<R>>>,
    source: SharedSource<R>,
    /// Absolute names of all entries
    names: HashSet<String>,
    content_types: ContentTypes,
    root_relationships: Vec<Relationship>,
}

impl<R: Read + Seek + Send + 'static> Shared<R> {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.stream(name)?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Reader inflating the entry `name` as it is consumed
    fn stream(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let mut archive = self.archive.lock();
        let mut file = archive
            .by_name(name.trim_start_matches('/'))
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let raw = self.source.window(file.data_start(), file.compressed_size());
        let expected = file.crc32();
        let name = name.to_string();
        match file.compression() {
            CompressionMethod::Stored => Ok(Box::new(Checked {
                inner: CrcReader::new(raw),
                expected,
                name,
            })),
            CompressionMethod::Deflated => Ok(Box::new(Checked {
                inner: CrcReader::new(DeflateDecoder::new(raw)),
                expected,
                name,
            })),
            method => {
                log::trace!("inflating {} ({}) under the archive lock", name, method);
                let mut content = Vec::new();
                file.read_to_end(&mut content)?;
                Ok(Box::new(Cursor::new(content)))
            }
        }
    }

    fn read_string(&self, name: &str) -> Result<String> {
        String::from_utf8(self.read(name)?)
            .map_err(|e| Error::InvalidXml(format!("{}: {}", name, e)))
    }

    fn relationships_of(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels = rels_path_for(part);
        if !self.names.contains(&rels) {
            return Ok(Vec::new());
        }
        parse_relationships(&self.read_string(&rels)?, part)
    }
}

/// An OPC package read from a zip archive
///
/// Parts opened with [`PackageFile::open`] stream from the archive independently and
/// may be read from several threads at once. Stored and deflated entries are
/// inflated as they are read; other compression methods are read into memory.
pub struct Package<R> {
    source: Option<R>,
    shared: Option<Arc<Shared<R>>>,
}

impl<R: Read + Seek + Send + 'static> Package<R> {
    /// Wrap a reader; nothing is read until [`PackageReader::open`]
    pub fn new(reader: R) -> Self {
        Self {
            source: Some(reader),
            shared: None,
        }
    }

    /// Number of entries in the archive, zero before opening
    pub fn len(&self) -> usize {
        self.shared.as_ref().map_or(0, |s| s.names.len())
    }

    /// Returns true if the archive has no entries or is not open
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn file(shared: &Arc<Shared<R>>, name: &str) -> Option<Box<dyn PackageFile>> {
        let name = format!("/{}", name.trim_start_matches('/'));
        if !shared.names.contains(&name) {
            return None;
        }
        let relationships = match shared.relationships_of(&name) {
            Ok(rels) => rels,
            Err(e) => {
                log::debug!("ignoring unreadable relationships of {}: {}", name, e);
                Vec::new()
            }
        };
        let content_type = shared
            .content_types
            .lookup(&name)
            .unwrap_or_default()
            .to_string();
        Some(Box::new(ZipPart {
            shared: Arc::clone(shared),
            name,
            content_type,
            relationships,
        }))
    }
}

impl<R: Read + Seek + Send + 'static> PackageReader for Package<R> {
    fn open(&mut self) -> Result<()> {
        if self.shared.is_some() {
            return Ok(());
        }
        let reader = self
            .source
            .take()
            .ok_or_else(|| Error::MissingFile("package source".to_string()))?;
        let source = SharedSource::new(reader);
        let archive = ZipArchive::new(source.clone())?;
        let names: HashSet<String> = archive
            .file_names()
            .map(|n| format!("/{}", n.trim_start_matches('/')))
            .collect();

        let mut shared = Shared {
            archive: Mutex::new(archive),
            source,
            names,
            content_types: ContentTypes::default(),
            root_relationships: Vec::new(),
        };
        let content_types_path = format!("/{}", CONTENT_TYPES_PATH);
        if shared.names.contains(&content_types_path) {
            shared.content_types = ContentTypes::parse(&shared.read_string(&content_types_path)?)?;
        }
        shared.root_relationships = shared.relationships_of("/")?;
        log::trace!(
            "opened package with {} entries and {} root relationships",
            shared.names.len(),
            shared.root_relationships.len()
        );
        self.shared = Some(Arc::new(shared));
        Ok(())
    }

    fn find_file_from_rel(&self, rel_type: &str) -> Option<Box<dyn PackageFile>> {
        let shared = self.shared.as_ref()?;
        let rel = shared
            .root_relationships
            .iter()
            .find(|r| r.rel_type == rel_type)?;
        Self::file(shared, &rel.path)
    }

    fn find_file_from_name(&self, name: &str) -> Option<Box<dyn PackageFile>> {
        Self::file(self.shared.as_ref()?, name)
    }

    fn relationships(&self) -> &[Relationship] {
        self.shared
            .as_ref()
            .map(|s| s.root_relationships.as_slice())
            .unwrap_or(&[])
    }
}

struct ZipPart<R> {
    shared: Arc<Shared<R>>,
    name: String,
    content_type: String,
    relationships: Vec<Relationship>,
}

impl<R: Read + Seek + Send + 'static> PackageFile for ZipPart<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    fn find_file_from_rel(&self, rel_type: &str) -> Option<Box<dyn PackageFile>> {
        let rel = self.relationships.iter().find(|r| r.rel_type == rel_type)?;
        Package::file(&self.shared, &rel.path)
    }

    fn find_file_from_name(&self, name: &str) -> Option<Box<dyn PackageFile>> {
        Package::file(&self.shared, name)
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.shared.stream(&self.name)
    }
}
