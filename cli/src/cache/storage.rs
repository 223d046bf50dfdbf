use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// On-disk entry metadata; the response body lives next to it in a `.body`
/// file.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    content_type: Option<String>,
    stored_at: DateTime<Utc>,
}

/// A response served out of (or written into) a named cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Directory-per-cache storage: each named cache holds URL-keyed
/// request/response records. Entries are idempotent snapshots, so
/// concurrent writers may race and the last write wins.
#[derive(Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn open(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn entry_stem(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn meta_path(&self, cache: &str, url: &str) -> PathBuf {
        self.root
            .join(cache)
            .join(format!("{}.json", Self::entry_stem(url)))
    }

    fn body_path(&self, cache: &str, url: &str) -> PathBuf {
        self.root
            .join(cache)
            .join(format!("{}.body", Self::entry_stem(url)))
    }

    /// Look up a cached response; a missing or unreadable entry is `None`.
    #[must_use]
    pub fn lookup(&self, cache: &str, url: &str) -> Option<CachedResponse> {
        let raw = std::fs::read_to_string(self.meta_path(cache, url)).ok()?;
        let meta: EntryMeta = match serde_json::from_str(&raw) {
            Ok(meta) => meta,
            Err(err) => {
                debug!(cache, url, error = %err, "discarding unreadable cache entry");
                return None;
            }
        };
        let body = std::fs::read(self.body_path(cache, url)).ok()?;
        Some(CachedResponse {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            body,
        })
    }

    /// Store a response snapshot. The body is written before the metadata so
    /// a torn write never yields a body-less entry.
    pub fn put(&self, cache: &str, response: &CachedResponse) -> io::Result<()> {
        std::fs::create_dir_all(self.root.join(cache))?;
        std::fs::write(self.body_path(cache, &response.url), &response.body)?;
        let meta = EntryMeta {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: Utc::now(),
        };
        std::fs::write(
            self.meta_path(cache, &response.url),
            serde_json::to_string(&meta)?,
        )?;
        Ok(())
    }

    /// Names of every cache directory currently on disk.
    pub fn cache_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete_cache(&self, cache: &str) -> io::Result<()> {
        match std::fs::remove_dir_all(self.root.join(cache)) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Swap a fully-staged cache into place of `target`.
    pub fn promote(&self, staged: &str, target: &str) -> io::Result<()> {
        self.delete_cache(target)?;
        std::fs::rename(self.root.join(staged), self.root.join(target))
    }

    /// Entry count and total byte size of one cache.
    pub fn stats(&self, cache: &str) -> io::Result<(usize, u64)> {
        let dir = self.root.join(cache);
        if !dir.exists() {
            return Ok((0, 0));
        }
        let mut entries = 0usize;
        let mut bytes = 0u64;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            bytes += entry.metadata()?.len();
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                entries += 1;
            }
        }
        Ok((entries, bytes))
    }
}
