// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};
use smol_str::SmolStr;

use crate::model::{RawChunk, RawChunkIndex, ZoomLevel};

#[derive(Debug)]
pub enum LoadError {
    NotFound { path: String },
    Io { path: String, source: io::Error },
    Json { path: String, source: serde_json::Error },
    Closed,
}

impl LoadError {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } | Self::Json { path, .. } => Some(path),
            Self::Closed => None,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "{path} not found"),
            Self::Io { path, source } => write!(f, "io error reading {path}: {source}"),
            Self::Json { path, source } => write!(f, "json error in {path}: {source}"),
            Self::Closed => f.write_str("loader is closed"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::NotFound { .. } | Self::Closed => None,
        }
    }
}

/// Transport delivering raw bytes for a case-relative path.
pub trait ChunkSource: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// Reads case files from a directory tree.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChunkSource for FsSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send {
        let full = self.root.join(path);
        let path = path.to_owned();
        async move {
            tokio::fs::read(&full).await.map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    LoadError::NotFound { path }
                } else {
                    LoadError::Io { path, source }
                }
            })
        }
    }
}

/// In-memory files with optional per-path latency and failures.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
    delays: BTreeMap<String, Duration>,
    failing: BTreeSet<String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self { files: files.into_iter().collect(), ..Self::default() }
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Delays every fetch whose path starts with `prefix`.
    pub fn delay(&mut self, prefix: impl Into<String>, delay: Duration) {
        self.delays.insert(prefix.into(), delay);
    }

    /// Makes fetches of exactly `path` fail with an io error.
    pub fn fail(&mut self, path: impl Into<String>) {
        self.failing.insert(path.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn delay_for(&self, path: &str) -> Option<Duration> {
        self.delays
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, delay)| *delay)
            .max()
    }
}

impl ChunkSource for MemorySource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay_for(path);
        let result = if self.failing.contains(path) {
            Err(LoadError::Io {
                path: path.to_owned(),
                source: io::Error::other("injected failure"),
            })
        } else {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::NotFound { path: path.to_owned() })
        };
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    case: Option<SmolStr>,
    index: Option<Arc<RawChunkIndex>>,
    chunks: HashMap<String, Arc<RawChunk>>,
    order: VecDeque<String>,
}

/// Case-scoped cache of parsed payloads in front of a [`ChunkSource`].
///
/// Nothing can be fetched until [`LoaderCache::open`] names a case. Closing drops every cached
/// payload, and fetches that complete after a close or a case switch are not cached.
#[derive(Debug)]
pub struct LoaderCache<S> {
    source: S,
    index_file_name: SmolStr,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<S: ChunkSource> LoaderCache<S> {
    pub fn new(source: S, index_file_name: &str, capacity: usize) -> Self {
        Self {
            source,
            index_file_name: SmolStr::new(index_file_name),
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, case: &str) {
        let mut state = self.state();
        *state = CacheState { case: Some(SmolStr::new(case)), ..CacheState::default() };
        debug!("loader opened case {case}");
    }

    pub fn close(&self) {
        let mut state = self.state();
        if let Some(case) = state.case.take() {
            debug!("loader closed case {case}, dropping {} chunks", state.chunks.len());
        }
        *state = CacheState::default();
    }

    pub fn is_open(&self) -> bool {
        self.state().case.is_some()
    }

    pub fn case(&self) -> Option<SmolStr> {
        self.state().case.clone()
    }

    pub fn cached_chunks(&self) -> usize {
        self.state().chunks.len()
    }

    pub fn index_path(&self, case: &str) -> String {
        format!("{case}/{}", self.index_file_name)
    }

    pub fn chunk_path(case: &str, zoom: ZoomLevel, file: &str) -> String {
        format!("{case}/{zoom}/{file}")
    }

    pub async fn fetch_index(&self) -> Result<Arc<RawChunkIndex>, LoadError> {
        let case = {
            let state = self.state();
            if let Some(index) = &state.index {
                return Ok(Arc::clone(index));
            }
            state.case.clone().ok_or(LoadError::Closed)?
        };

        let path = self.index_path(&case);
        let bytes = self.source.fetch(&path).await?;
        let index: RawChunkIndex = serde_json::from_slice(&bytes)
            .map_err(|source| LoadError::Json { path: path.clone(), source })?;
        let index = Arc::new(index);

        let mut state = self.state();
        if state.case.as_deref() != Some(case.as_str()) {
            return Err(LoadError::Closed);
        }
        state.index = Some(Arc::clone(&index));
        Ok(index)
    }

    pub async fn fetch_chunk(
        &self,
        zoom: ZoomLevel,
        file: &str,
    ) -> Result<Arc<RawChunk>, LoadError> {
        let (case, path) = {
            let state = self.state();
            let case = state.case.clone().ok_or(LoadError::Closed)?;
            let path = Self::chunk_path(&case, zoom, file);
            if let Some(chunk) = state.chunks.get(&path) {
                trace!("cache hit {path}");
                return Ok(Arc::clone(chunk));
            }
            (case, path)
        };

        debug!("fetching {path}");
        let bytes = self.source.fetch(&path).await?;
        let chunk: RawChunk = serde_json::from_slice(&bytes)
            .map_err(|source| LoadError::Json { path: path.clone(), source })?;
        let chunk = Arc::new(chunk);

        let mut state = self.state();
        if state.case.as_deref() != Some(case.as_str()) {
            return Err(LoadError::Closed);
        }
        if !state.chunks.contains_key(&path) {
            while state.chunks.len() >= self.capacity {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                state.chunks.remove(&oldest);
            }
            state.order.push_back(path.clone());
            state.chunks.insert(path, Arc::clone(&chunk));
        }
        Ok(chunk)
    }
}
