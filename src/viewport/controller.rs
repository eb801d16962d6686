// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use smol_str::SmolStr;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::frame::{compose_frame, LoadingState, ViewportFrame, ViewportWindow};
use super::window::walk_window;
use crate::config::ViewportConfig;
use crate::layout::{bin_to_column, clamp_bin, column_to_bin};
use crate::model::{Segment, ZoomLevel};
use crate::store::{
    ChunkDescriptor, ChunkIndex, ChunkIndexError, ChunkSource, LoadError, LoaderCache,
    SegmentStore,
};

/// Coordinate space of a requested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSpace {
    /// A bin of the active zoom level.
    Bin,
    /// A base column, independent of the zoom level.
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportUpdate {
    Applied(Arc<ViewportFrame>),
    /// A newer request took over; loaded data was kept but no layout was produced.
    Superseded,
}

impl ViewportUpdate {
    pub fn frame(&self) -> Option<&Arc<ViewportFrame>> {
        match self {
            Self::Applied(frame) => Some(frame),
            Self::Superseded => None,
        }
    }
}

#[derive(Debug)]
pub enum ViewportError {
    NoCaseOpen,
    IndexNotFound { case: String },
    Index(ChunkIndexError),
    Load(LoadError),
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCaseOpen => f.write_str("no case is open"),
            Self::IndexNotFound { case } => write!(f, "case {case:?} has no chunk index"),
            Self::Index(source) => write!(f, "chunk index error: {source}"),
            Self::Load(source) => write!(f, "cannot load chunk index: {source}"),
        }
    }
}

impl std::error::Error for ViewportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Index(source) => Some(source),
            Self::Load(source) => Some(source),
            Self::NoCaseOpen | Self::IndexNotFound { .. } => None,
        }
    }
}

impl From<ChunkIndexError> for ViewportError {
    fn from(source: ChunkIndexError) -> Self {
        Self::Index(source)
    }
}

#[derive(Debug, Clone, Copy)]
enum Highlight {
    Target,
    Clear,
    Keep,
}

#[derive(Debug)]
struct ViewportState {
    generation: u64,
    index: Option<Arc<ChunkIndex>>,
    zoom: ZoomLevel,
    store: SegmentStore,
    /// Chunks whose segments are all in the store, with their bin range.
    loaded: BTreeMap<(ZoomLevel, SmolStr), (u64, u64)>,
    window: ViewportWindow,
    read_ahead_factor: u32,
    loading: LoadingState,
    frame: Option<Arc<ViewportFrame>>,
    highlighted_bin: Option<u64>,
    /// Background load of the margin around the last applied window.
    read_ahead: Option<JoinHandle<Result<usize, ViewportError>>>,
}

impl ViewportState {
    fn reset(&mut self, index: Option<Arc<ChunkIndex>>) {
        self.cancel_read_ahead();
        self.generation += 1;
        self.zoom = index.as_ref().map_or(ZoomLevel::BASE, |index| index.finest_zoom());
        self.index = index;
        self.store.clear();
        self.loaded.clear();
        self.window.begin_bin = 1;
        self.window.end_bin = 1;
        self.window.centre_bin = 1;
        self.loading = LoadingState::Idle;
        self.frame = None;
        self.highlighted_bin = None;
    }

    fn evict_outside(&mut self, zoom: ZoomLevel, low: u64, high: u64) {
        let removed =
            self.store.evict_range(zoom, low, true) + self.store.evict_range(zoom, high, false);
        self.loaded.retain(|(level, _), (first, last)| {
            *level != zoom || (low <= *first && *last <= high)
        });
        if removed > 0 {
            debug!("evicted {removed} segments outside bins {low}..={high} at zoom {zoom}");
        }
    }

    /// Drops every segment and chunk marker of a level other than `zoom`.
    fn sweep_other_levels(&mut self, zoom: ZoomLevel) {
        let swept = self.store.evict_zoom_level(zoom);
        self.loaded.retain(|(level, _), _| *level == zoom);
        if swept > 0 {
            debug!("swept {swept} segments of zoom levels other than {zoom}");
        }
    }

    fn cancel_read_ahead(&mut self) {
        if let Some(task) = self.read_ahead.take() {
            task.abort();
        }
    }

    fn context(&self) -> Result<RequestContext, ViewportError> {
        let index = self.index.clone().ok_or(ViewportError::NoCaseOpen)?;
        Ok(RequestContext { generation: self.generation, index, zoom: self.zoom })
    }
}

/// Snapshot of what a request works against, taken under the lock.
struct RequestContext {
    generation: u64,
    index: Arc<ChunkIndex>,
    zoom: ZoomLevel,
}

#[derive(Debug, Default)]
struct LoadOutcome {
    inserted: usize,
    failed: Vec<String>,
}

/// Loader and viewport state, shared with background read-ahead tasks.
#[derive(Debug)]
struct Shared<S> {
    loader: LoaderCache<S>,
    state: Mutex<ViewportState>,
}

/// Keeps the visible window of a pangenome case in sync with position and zoom requests.
///
/// Every request loads what it needs through the loader cache, commits the data to the segment
/// store, and only lays out a new frame if no newer request started in the meantime. Each applied
/// frame schedules a background load of the read-ahead margin. The state lock is never held
/// across a fetch.
#[derive(Debug)]
pub struct ViewportController<S> {
    shared: Arc<Shared<S>>,
    epoch: AtomicU64,
    frames: watch::Sender<Option<Arc<ViewportFrame>>>,
    auto_read_ahead: bool,
}

impl<S: ChunkSource + 'static> ViewportController<S> {
    pub fn new(source: S, config: &ViewportConfig) -> Self {
        let loader = LoaderCache::new(source, &config.index_file_name, config.cache_capacity);
        Self::with_loader(loader, config)
    }

    pub fn with_loader(loader: LoaderCache<S>, config: &ViewportConfig) -> Self {
        let (frames, _) = watch::channel(None);
        let state = ViewportState {
            generation: 0,
            index: None,
            zoom: ZoomLevel::BASE,
            store: SegmentStore::new(),
            loaded: BTreeMap::new(),
            window: ViewportWindow {
                begin_bin: 1,
                end_bin: 1,
                centre_bin: 1,
                pixels_per_column: config.pixels_per_column.max(1),
                pixels_per_row: config.pixels_per_row.max(1),
                window_width_px: config.window_width_px,
            },
            read_ahead_factor: config.read_ahead_factor,
            loading: LoadingState::Idle,
            frame: None,
            highlighted_bin: None,
            read_ahead: None,
        };
        Self {
            shared: Arc::new(Shared { loader, state: Mutex::new(state) }),
            epoch: AtomicU64::new(0),
            frames,
            auto_read_ahead: config.auto_read_ahead,
        }
    }

    pub fn loader(&self) -> &LoaderCache<S> {
        &self.shared.loader
    }

    /// Loads the case's chunk index and resets the viewport to its finest zoom level.
    pub async fn open_case(&self, case: &str) -> Result<(), ViewportError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.state.lock().await.reset(None);
        self.frames.send_replace(None);
        self.shared.loader.open(case);

        let index = match self.load_index(case).await {
            Ok(index) => index,
            Err(err) => {
                self.shared.loader.close();
                return Err(err);
            }
        };

        let mut state = self.shared.state.lock().await;
        info!(
            "opened case {case}: {} zoom levels, {} paths",
            index.zoom_level_count(),
            index.path_names().len()
        );
        state.reset(Some(index));
        Ok(())
    }

    async fn load_index(&self, case: &str) -> Result<Arc<ChunkIndex>, ViewportError> {
        let raw = self.shared.loader.fetch_index().await.map_err(|err| match err {
            LoadError::NotFound { .. } => ViewportError::IndexNotFound { case: case.to_owned() },
            other => ViewportError::Load(other),
        })?;
        Ok(Arc::new(ChunkIndex::from_raw(&raw)?))
    }

    /// Drops the case, its cached payloads and every loaded segment.
    pub async fn close(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.loader.close();
        self.shared.state.lock().await.reset(None);
        self.frames.send_replace(None);
    }

    pub async fn update_position(
        &self,
        target: u64,
        space: PositionSpace,
        highlight: bool,
    ) -> Result<ViewportUpdate, ViewportError> {
        let highlight = if highlight { Highlight::Target } else { Highlight::Clear };
        self.reposition(target, space, highlight).await
    }

    /// Fetches the read-ahead margin around the current window without re-laying it out.
    ///
    /// Returns how many segments were added to the store.
    pub async fn read_ahead(&self) -> Result<usize, ViewportError> {
        self.shared.read_ahead().await
    }

    /// Waits for the read-ahead scheduled by the last applied frame.
    ///
    /// Returns how many segments it added; zero if none is pending or it was cancelled by a newer
    /// frame.
    pub async fn settle_read_ahead(&self) -> Result<usize, ViewportError> {
        let Some(task) = self.shared.state.lock().await.read_ahead.take() else {
            return Ok(0);
        };
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(0),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }

    /// Switches zoom level, keeping the base column under the window centre.
    pub async fn set_zoom(&self, zoom: ZoomLevel) -> Result<ViewportUpdate, ViewportError> {
        let column = {
            let mut state = self.shared.state.lock().await;
            let index = state.index.clone().ok_or(ViewportError::NoCaseOpen)?;
            index.level(zoom)?;
            let previous = state.zoom;
            let centre = state.window.centre_bin;
            if previous == zoom {
                drop(state);
                return self.reposition(centre, PositionSpace::Bin, Highlight::Keep).await;
            }

            let loaded = state
                .store
                .lookup_by_bin(centre, previous)
                .and_then(|id| state.store.get(id))
                .and_then(|segment| bin_to_column(segment, centre));
            let column = match loaded {
                Some(column) => column,
                None => index.estimate_column_for_bin(previous, centre)?.unwrap_or(
                    centre.saturating_sub(1) * u64::from(previous.bin_width()) + 1,
                ),
            };
            info!("zoom {previous} -> {zoom}, anchored on column {column}");
            state.zoom = zoom;
            state.loading = LoadingState::Loading;
            column
        };

        self.reposition(column, PositionSpace::Column, Highlight::Clear).await
    }

    /// Switches to the `index`-th zoom level, finest first.
    pub async fn set_zoom_index(&self, index: usize) -> Result<ViewportUpdate, ViewportError> {
        let zoom = {
            let state = self.shared.state.lock().await;
            let chunk_index = state.index.as_ref().ok_or(ViewportError::NoCaseOpen)?;
            chunk_index.zoom_level_at(index)?
        };
        self.set_zoom(zoom).await
    }

    pub async fn resize(&self, window_width_px: u32) -> Result<ViewportUpdate, ViewportError> {
        self.regeometry(|window| window.window_width_px = window_width_px).await
    }

    pub async fn set_pixels_per_column(&self, px: u32) -> Result<ViewportUpdate, ViewportError> {
        self.regeometry(|window| window.pixels_per_column = px.max(1)).await
    }

    pub async fn set_pixels_per_row(&self, px: u32) -> Result<ViewportUpdate, ViewportError> {
        self.regeometry(|window| window.pixels_per_row = px.max(1)).await
    }

    /// Moves the window centre by `columns` drawn columns; negative moves left.
    pub async fn shift(&self, columns: i64) -> Result<ViewportUpdate, ViewportError> {
        let centre = self.shared.state.lock().await.window.centre_bin;
        let target = if columns < 0 {
            centre.saturating_sub(columns.unsigned_abs())
        } else {
            centre.saturating_add(columns.unsigned_abs())
        };
        self.reposition(target.max(1), PositionSpace::Bin, Highlight::Keep).await
    }

    pub fn frame(&self) -> Option<Arc<ViewportFrame>> {
        self.frames.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ViewportFrame>>> {
        self.frames.subscribe()
    }

    pub async fn loading_state(&self) -> LoadingState {
        self.shared.state.lock().await.loading
    }

    pub async fn window(&self) -> ViewportWindow {
        self.shared.state.lock().await.window
    }

    pub async fn zoom(&self) -> ZoomLevel {
        self.shared.state.lock().await.zoom
    }

    pub async fn index(&self) -> Option<Arc<ChunkIndex>> {
        self.shared.state.lock().await.index.clone()
    }

    /// Runs `f` against the segment store under the state lock.
    pub async fn with_store<R>(&self, f: impl FnOnce(&SegmentStore) -> R) -> R {
        f(&self.shared.state.lock().await.store)
    }

    async fn regeometry(
        &self,
        change: impl FnOnce(&mut ViewportWindow),
    ) -> Result<ViewportUpdate, ViewportError> {
        let centre = {
            let mut state = self.shared.state.lock().await;
            change(&mut state.window);
            state.window.centre_bin
        };
        self.reposition(centre, PositionSpace::Bin, Highlight::Keep).await
    }

    /// Whether a request may still publish; checked under the state lock.
    fn is_current(&self, state: &ViewportState, ticket: u64, context: &RequestContext) -> bool {
        self.epoch.load(Ordering::SeqCst) == ticket
            && state.generation == context.generation
            && state.zoom == context.zoom
    }

    /// Replaces the pending read-ahead with one around the window just applied.
    fn schedule_read_ahead(&self, state: &mut ViewportState) {
        state.cancel_read_ahead();
        if !self.auto_read_ahead {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            debug!("no tokio runtime; read-ahead not scheduled");
            return;
        };
        let shared = Arc::clone(&self.shared);
        state.read_ahead = Some(runtime.spawn(async move { shared.read_ahead().await }));
    }

    async fn reposition(
        &self,
        target: u64,
        space: PositionSpace,
        highlight: Highlight,
    ) -> Result<ViewportUpdate, ViewportError> {
        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let (context, columns) = {
            let mut state = self.shared.state.lock().await;
            let context = state.context()?;
            state.loading = LoadingState::Loading;
            (context, state.window.columns())
        };
        let zoom = context.zoom;
        let last_bin = context.index.last_bin(zoom)?;
        let mut failed = Vec::new();

        let target_bin = match space {
            PositionSpace::Bin => clamp_bin(target, last_bin),
            PositionSpace::Column => {
                let bin = self.resolve_column(&context, target, &mut failed).await?;
                clamp_bin(bin, last_bin)
            }
        };

        let (low, high) = (target_bin.saturating_sub(columns), target_bin.saturating_add(columns));
        let chunks = context.index.chunks_covering(zoom, low, high)?.to_vec();
        let outcome = self.shared.load_chunks(&context, &chunks).await;
        failed.extend(outcome.failed);

        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        if !self.is_current(state, ticket, &context) {
            debug!("request {ticket} for bin {target_bin} superseded");
            return Ok(ViewportUpdate::Superseded);
        }
        state.loading = LoadingState::Repositioning;
        state.sweep_other_levels(zoom);
        state.highlighted_bin = match highlight {
            Highlight::Target => Some(target_bin),
            Highlight::Clear => None,
            Highlight::Keep => state.highlighted_bin,
        };

        let columns = state.window.columns();
        let layout = state.store.lookup_by_bin(target_bin, zoom).and_then(|target| {
            walk_window(&state.store, target, target_bin, columns, state.window.pixels_per_column)
        });
        let mut frame = match layout {
            Some(layout) => {
                state.window.begin_bin = layout.begin_bin;
                state.window.end_bin = layout.end_bin;
                state.window.centre_bin = target_bin;
                let frame = compose_frame(&mut state.store, &layout, zoom, state.window);

                let reach = u64::from(state.read_ahead_factor) * columns;
                let low = layout.begin_bin.saturating_sub(reach);
                let high = layout.end_bin.saturating_add(reach);
                state.evict_outside(zoom, low, high);
                frame
            }
            None => {
                warn!("bin {target_bin} at zoom {zoom} is not loaded; showing an empty window");
                state.store.clear_placements();
                state.window.begin_bin = target_bin;
                state.window.end_bin = target_bin;
                state.window.centre_bin = target_bin;
                ViewportFrame::empty(zoom, state.window)
            }
        };
        frame.failed_chunks = failed;
        frame.highlighted_bin = state.highlighted_bin;
        frame.loading_state = LoadingState::Idle;

        debug!(
            "window {}..={} at zoom {zoom}: {} segments, {} links",
            state.window.begin_bin,
            state.window.end_bin,
            frame.segments.len(),
            frame.links.len()
        );
        let frame = Arc::new(frame);
        state.loading = LoadingState::Idle;
        state.frame = Some(Arc::clone(&frame));
        self.frames.send_replace(Some(Arc::clone(&frame)));
        self.schedule_read_ahead(state);
        Ok(ViewportUpdate::Applied(frame))
    }

    /// Bin under a base column, loading the chunk that covers it first.
    async fn resolve_column(
        &self,
        context: &RequestContext,
        column: u64,
        failed: &mut Vec<String>,
    ) -> Result<u64, ViewportError> {
        let level = context.index.level(context.zoom)?;
        let column = column.clamp(1, level.last_col().max(1));
        if let Some(chunk) = context.index.chunk_for_column(context.zoom, column)? {
            let outcome = self.shared.load_chunks(context, std::slice::from_ref(chunk)).await;
            failed.extend(outcome.failed);
        }

        let loaded = {
            let state = self.shared.state.lock().await;
            state
                .store
                .lookup_by_column(column, context.zoom)
                .and_then(|id| state.store.get(id))
                .and_then(|segment: &Segment| column_to_bin(segment, column))
        };
        let bin = match loaded {
            Some(bin) => bin,
            None => context.index.estimate_bin_for_column(context.zoom, column)?.unwrap_or(1),
        };
        Ok(bin)
    }
}

impl<S: ChunkSource> Shared<S> {
    async fn read_ahead(&self) -> Result<usize, ViewportError> {
        let (context, low, high) = {
            let state = self.state.lock().await;
            let context = state.context()?;
            let reach = u64::from(state.read_ahead_factor) * state.window.columns();
            let low = state.window.begin_bin.saturating_sub(reach).max(1);
            (context, low, state.window.end_bin.saturating_add(reach))
        };
        let chunks = context.index.chunks_covering(context.zoom, low, high)?.to_vec();
        let outcome = self.load_chunks(&context, &chunks).await;
        if outcome.inserted > 0 {
            debug!("read-ahead added {} segments around bins {low}..={high}", outcome.inserted);
        }
        Ok(outcome.inserted)
    }

    /// Fetches every chunk not loaded yet, concurrently, and commits the results.
    async fn load_chunks(
        &self,
        context: &RequestContext,
        chunks: &[ChunkDescriptor],
    ) -> LoadOutcome {
        let zoom = context.zoom;
        let missing = {
            let state = self.state.lock().await;
            if state.generation != context.generation {
                return LoadOutcome::default();
            }
            chunks
                .iter()
                .filter(|chunk| !state.loaded.contains_key(&(zoom, SmolStr::new(chunk.file()))))
                .collect::<Vec<_>>()
        };
        if missing.is_empty() {
            return LoadOutcome::default();
        }
        debug!("loading {} chunks at zoom {zoom}", missing.len());

        let results = join_all(missing.into_iter().map(|chunk| async move {
            (chunk, self.loader.fetch_chunk(zoom, chunk.file()).await)
        }))
        .await;

        let mut outcome = LoadOutcome::default();
        let mut state = self.state.lock().await;
        if state.generation != context.generation || state.zoom != zoom {
            debug!("dropping {} chunk results for a stale case or zoom level", results.len());
            return outcome;
        }
        for (chunk, result) in results {
            let raw = match result {
                Ok(raw) => raw,
                Err(err) => {
                    warn!("chunk {} failed to load: {err}", chunk.file());
                    outcome.failed.push(chunk.file().to_owned());
                    continue;
                }
            };
            for component in &raw.components {
                match Segment::from_raw(zoom, component) {
                    Ok(segment) => {
                        if state.store.insert(segment).is_new() {
                            outcome.inserted += 1;
                        }
                    }
                    Err(err) => warn!("skipping component of {}: {err}", chunk.file()),
                }
            }
            state
                .loaded
                .insert((zoom, SmolStr::new(chunk.file())), (chunk.first_bin(), chunk.last_bin()));
        }
        outcome
    }
}

#[cfg(test)]
mod tests;
