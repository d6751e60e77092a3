use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use ferrous_feed_application::ports::FeedSnapshotStore;
use ferrous_feed_domain::{DomainError, FeedGeneration, LevelFeed};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "generation.json";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    generation: u64,
    built_at: DateTime<Utc>,
    domain_count: usize,
    dropped_entries: usize,
    etag: String,
    parts: usize,
    #[serde(default)]
    base_level: u32,
    #[serde(default)]
    levels: Vec<LevelManifest>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LevelManifest {
    level: u32,
    domain_count: usize,
    dropped_entries: usize,
    parts: usize,
}

/// Files the store owns inside its directory, besides the full body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFile {
    Part(usize),
    Level(u32),
    LevelPart(u32, usize),
}

/// Writes each published generation to a directory so a restart can serve
/// the last feed before the first fetch completes.
///
/// Layout: `<prefix>.txt` (full body), `<prefix>-part-<n>.txt` (1-based),
/// `<prefix>-level-<l>.txt` plus `<prefix>-level-<l>-part-<n>.txt` for each
/// security level above the base, and `generation.json`. The manifest is
/// written last and is what `load` trusts.
pub struct FsFeedSnapshotStore {
    dir: PathBuf,
    prefix: String,
}

impl FsFeedSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn body_path(&self) -> PathBuf {
        self.dir.join(format!("{}.txt", self.prefix))
    }

    fn part_path(&self, number: usize) -> PathBuf {
        self.dir.join(format!("{}-part-{number}.txt", self.prefix))
    }

    fn level_path(&self, level: u32) -> PathBuf {
        self.dir.join(format!("{}-level-{level}.txt", self.prefix))
    }

    fn level_part_path(&self, level: u32, number: usize) -> PathBuf {
        self.dir
            .join(format!("{}-level-{level}-part-{number}.txt", self.prefix))
    }

    /// Which of our files `file_name` is, if any.
    fn classify(&self, file_name: &str) -> Option<FeedFile> {
        let rest = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(".txt")?;

        if let Some(number) = rest.strip_prefix("-part-") {
            return number.parse().ok().map(FeedFile::Part);
        }
        let level = rest.strip_prefix("-level-")?;
        match level.split_once("-part-") {
            Some((level, number)) => Some(FeedFile::LevelPart(
                level.parse().ok()?,
                number.parse().ok()?,
            )),
            None => level.parse().ok().map(FeedFile::Level),
        }
    }

    fn is_stale(file: FeedFile, generation: &FeedGeneration) -> bool {
        let level_parts = |level: u32| {
            generation
                .levels
                .iter()
                .find(|l| l.level == level)
                .map(LevelFeed::part_count)
        };
        match file {
            FeedFile::Part(number) => number > generation.part_count(),
            FeedFile::Level(level) => level_parts(level).is_none(),
            FeedFile::LevelPart(level, number) => {
                level_parts(level).map_or(true, |count| number > count)
            }
        }
    }

    async fn remove_stale_files(&self, generation: &FeedGeneration) -> Result<(), DomainError> {
        let mut dir = fs::read_dir(&self.dir).await.map_err(io_error)?;
        while let Some(entry) = dir.next_entry().await.map_err(io_error)? {
            let name = entry.file_name();
            let Some(file) = name.to_str().and_then(|n| self.classify(n)) else {
                continue;
            };
            if Self::is_stale(file, generation) {
                debug!(file = ?entry.path(), "Removing stale feed file");
                fs::remove_file(entry.path()).await.map_err(io_error)?;
            }
        }
        Ok(())
    }

    async fn load_level(&self, manifest: &LevelManifest) -> Result<LevelFeed, DomainError> {
        let body = Bytes::from(
            fs::read(self.level_path(manifest.level))
                .await
                .map_err(io_error)?,
        );
        let mut parts = Vec::with_capacity(manifest.parts);
        for number in 1..=manifest.parts {
            parts.push(Bytes::from(
                fs::read(self.level_part_path(manifest.level, number))
                    .await
                    .map_err(io_error)?,
            ));
        }
        Ok(LevelFeed {
            level: manifest.level,
            body,
            parts,
            domain_count: manifest.domain_count,
            dropped_entries: manifest.dropped_entries,
        })
    }
}

#[async_trait]
impl FeedSnapshotStore for FsFeedSnapshotStore {
    async fn save(&self, generation: &FeedGeneration) -> Result<(), DomainError> {
        fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        write_atomic(&self.body_path(), &generation.body).await?;
        for (i, part) in generation.parts.iter().enumerate() {
            write_atomic(&self.part_path(i + 1), part).await?;
        }
        for level in &generation.levels {
            write_atomic(&self.level_path(level.level), &level.body).await?;
            for (i, part) in level.parts.iter().enumerate() {
                write_atomic(&self.level_part_path(level.level, i + 1), part).await?;
            }
        }
        self.remove_stale_files(generation).await?;

        let manifest = Manifest {
            generation: generation.generation,
            built_at: generation.built_at,
            domain_count: generation.domain_count,
            dropped_entries: generation.dropped_entries,
            etag: generation.etag.clone(),
            parts: generation.part_count(),
            base_level: generation.base_level,
            levels: generation
                .levels
                .iter()
                .map(|l| LevelManifest {
                    level: l.level,
                    domain_count: l.domain_count,
                    dropped_entries: l.dropped_entries,
                    parts: l.part_count(),
                })
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| DomainError::IoError(format!("failed to encode manifest: {e}")))?;
        write_atomic(&self.dir.join(MANIFEST_FILE), &json).await?;

        debug!(generation = generation.generation, dir = ?self.dir, "Feed snapshot written");
        Ok(())
    }

    async fn load(&self) -> Result<Option<FeedGeneration>, DomainError> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let raw = match fs::read(&manifest_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        let manifest: Manifest = serde_json::from_slice(&raw).map_err(|e| {
            DomainError::IoError(format!("corrupt manifest {}: {e}", manifest_path.display()))
        })?;

        let body = Bytes::from(fs::read(self.body_path()).await.map_err(io_error)?);
        let mut parts = Vec::with_capacity(manifest.parts);
        for number in 1..=manifest.parts {
            parts.push(Bytes::from(
                fs::read(self.part_path(number)).await.map_err(io_error)?,
            ));
        }

        if FeedGeneration::compute_etag(manifest.generation, &body) != manifest.etag {
            warn!(generation = manifest.generation, "Snapshot body does not match its manifest; ignoring snapshot");
            return Ok(None);
        }

        let mut levels = Vec::with_capacity(manifest.levels.len());
        for level in &manifest.levels {
            let feed = self.load_level(level).await?;
            if feed.parts.concat() != feed.body[..] {
                warn!(
                    generation = manifest.generation,
                    level = level.level,
                    "Snapshot level parts do not match its body; ignoring snapshot"
                );
                return Ok(None);
            }
            levels.push(feed);
        }

        Ok(Some(FeedGeneration {
            generation: manifest.generation,
            built_at: manifest.built_at,
            body,
            parts,
            domain_count: manifest.domain_count,
            dropped_entries: manifest.dropped_entries,
            etag: manifest.etag,
            base_level: manifest.base_level,
            levels,
        }))
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DomainError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).await.map_err(io_error)?;
    fs::rename(&tmp, path).await.map_err(io_error)
}

fn io_error(e: std::io::Error) -> DomainError {
    DomainError::IoError(e.to_string())
}
