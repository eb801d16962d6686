// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use smol_str::SmolStr;

use crate::layout::interpolate_bin;
use crate::model::{IdError, RawChunkDescriptor, RawChunkIndex, ZoomLevel};

/// One fetchable chunk file of a zoom level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkDescriptor {
    file: SmolStr,
    first_bin: u64,
    last_bin: u64,
    first_col: u64,
    last_col: u64,
    x: u64,
    visible_columns: u64,
    fasta: Option<SmolStr>,
}

impl ChunkDescriptor {
    fn from_raw(zoom: ZoomLevel, raw: &RawChunkDescriptor) -> Self {
        let width = u64::from(zoom.bin_width());
        let first_col = raw
            .first_col
            .unwrap_or(raw.first_bin.saturating_sub(1).saturating_mul(width).saturating_add(1));
        let last_col = raw.last_col.unwrap_or(raw.last_bin.saturating_mul(width)).max(first_col);
        Self {
            file: SmolStr::new(&raw.file),
            first_bin: raw.first_bin,
            last_bin: raw.last_bin,
            first_col,
            last_col,
            x: raw.x.unwrap_or(first_col.saturating_sub(1)),
            visible_columns: raw
                .visible_columns
                .unwrap_or((last_col - first_col).saturating_add(1)),
            fasta: raw.fasta.as_deref().map(SmolStr::new),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn first_bin(&self) -> u64 {
        self.first_bin
    }

    pub fn last_bin(&self) -> u64 {
        self.last_bin
    }

    pub fn first_col(&self) -> u64 {
        self.first_col
    }

    pub fn last_col(&self) -> u64 {
        self.last_col
    }

    pub fn x(&self) -> u64 {
        self.x
    }

    pub fn visible_columns(&self) -> u64 {
        self.visible_columns
    }

    /// Nucleotide file accompanying the chunk, if the exporter wrote one.
    pub fn fasta(&self) -> Option<&str> {
        self.fasta.as_deref()
    }

    pub fn contains_bin(&self, bin: u64) -> bool {
        (self.first_bin..=self.last_bin).contains(&bin)
    }
}

/// The chunk list of one zoom level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomLevelIndex {
    zoom: ZoomLevel,
    last_bin: u64,
    last_col: u64,
    chunks: Vec<ChunkDescriptor>,
}

impl ZoomLevelIndex {
    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn last_bin(&self) -> u64 {
        self.last_bin
    }

    pub fn last_col(&self) -> u64 {
        self.last_col
    }

    pub fn chunks(&self) -> &[ChunkDescriptor] {
        &self.chunks
    }

    fn covering(
        &self,
        begin: u64,
        end: u64,
        range: impl Fn(&ChunkDescriptor) -> (u64, u64),
    ) -> &[ChunkDescriptor] {
        if begin > end {
            return &[];
        }
        let from = self.chunks.partition_point(|chunk| range(chunk).1 < begin);
        let to = self.chunks.partition_point(|chunk| range(chunk).0 <= end);
        if from >= to {
            return &[];
        }
        &self.chunks[from..to]
    }
}

#[derive(Debug)]
pub enum ChunkIndexError {
    Json(serde_json::Error),
    NoZoomLevels,
    InvalidZoomKey { key: String, source: IdError },
    ZoomLevelNotFound(ZoomLevel),
    ZoomIndexOutOfRange { index: usize, levels: usize },
    NonMonotonic { zoom: ZoomLevel, position: usize },
}

impl fmt::Display for ChunkIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(source) => write!(f, "invalid chunk index json: {source}"),
            Self::NoZoomLevels => f.write_str("chunk index lists no zoom levels"),
            Self::InvalidZoomKey { key, source } => {
                write!(f, "invalid zoom level key {key:?}: {source}")
            }
            Self::ZoomLevelNotFound(zoom) => write!(f, "zoom level {zoom} is not in the index"),
            Self::ZoomIndexOutOfRange { index, levels } => {
                write!(f, "zoom index {index} is out of range for {levels} levels")
            }
            Self::NonMonotonic { zoom, position } => write!(
                f,
                "chunk {position} of zoom level {zoom} does not follow its predecessor"
            ),
        }
    }
}

impl std::error::Error for ChunkIndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(source) => Some(source),
            Self::InvalidZoomKey { source, .. } => Some(source),
            Self::NoZoomLevels
            | Self::ZoomLevelNotFound(_)
            | Self::ZoomIndexOutOfRange { .. }
            | Self::NonMonotonic { .. } => None,
        }
    }
}

/// Immutable, validated view of a case's `bin2file.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkIndex {
    levels: BTreeMap<ZoomLevel, ZoomLevelIndex>,
    path_names: Vec<SmolStr>,
    pangenome_length: Option<u64>,
}

impl ChunkIndex {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ChunkIndexError> {
        let raw: RawChunkIndex = serde_json::from_slice(bytes).map_err(ChunkIndexError::Json)?;
        Self::from_raw(&raw)
    }

    pub fn from_raw(raw: &RawChunkIndex) -> Result<Self, ChunkIndexError> {
        if raw.zoom_levels.is_empty() {
            return Err(ChunkIndexError::NoZoomLevels);
        }

        let mut levels = BTreeMap::new();
        for (key, level) in &raw.zoom_levels {
            let zoom = key
                .parse::<ZoomLevel>()
                .map_err(|source| ChunkIndexError::InvalidZoomKey { key: key.clone(), source })?;

            let chunks = level
                .files
                .iter()
                .map(|descriptor| ChunkDescriptor::from_raw(zoom, descriptor))
                .collect::<Vec<_>>();
            for (position, chunk) in chunks.iter().enumerate() {
                let ordered = chunk.first_bin <= chunk.last_bin
                    && (position == 0 || {
                        let previous = &chunks[position - 1];
                        chunk.first_bin > previous.last_bin && chunk.first_col > previous.last_col
                    });
                if !ordered {
                    return Err(ChunkIndexError::NonMonotonic { zoom, position });
                }
            }

            let last_bin = level
                .last_bin
                .or_else(|| chunks.last().map(ChunkDescriptor::last_bin))
                .unwrap_or(0);
            let last_col = level
                .last_col
                .or_else(|| chunks.last().map(ChunkDescriptor::last_col))
                .unwrap_or(0);
            levels.insert(zoom, ZoomLevelIndex { zoom, last_bin, last_col, chunks });
        }

        Ok(Self {
            levels,
            path_names: raw.path_names.iter().map(SmolStr::new).collect(),
            pangenome_length: raw.pangenome_length,
        })
    }

    /// Zoom levels from finest to coarsest.
    pub fn zoom_levels(&self) -> impl Iterator<Item = ZoomLevel> + '_ {
        self.levels.keys().copied()
    }

    pub fn zoom_level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn zoom_level_at(&self, index: usize) -> Result<ZoomLevel, ChunkIndexError> {
        self.levels.keys().nth(index).copied().ok_or(ChunkIndexError::ZoomIndexOutOfRange {
            index,
            levels: self.levels.len(),
        })
    }

    pub fn finest_zoom(&self) -> ZoomLevel {
        self.levels.keys().next().copied().unwrap_or(ZoomLevel::BASE)
    }

    pub fn level(&self, zoom: ZoomLevel) -> Result<&ZoomLevelIndex, ChunkIndexError> {
        self.levels.get(&zoom).ok_or(ChunkIndexError::ZoomLevelNotFound(zoom))
    }

    pub fn last_bin(&self, zoom: ZoomLevel) -> Result<u64, ChunkIndexError> {
        self.level(zoom).map(ZoomLevelIndex::last_bin)
    }

    pub fn path_names(&self) -> &[SmolStr] {
        &self.path_names
    }

    pub fn pangenome_length(&self) -> Option<u64> {
        self.pangenome_length
    }

    /// Chunks overlapping the inclusive bin range, in order.
    pub fn chunks_covering(
        &self,
        zoom: ZoomLevel,
        begin_bin: u64,
        end_bin: u64,
    ) -> Result<&[ChunkDescriptor], ChunkIndexError> {
        let level = self.level(zoom)?;
        Ok(level.covering(begin_bin, end_bin, |chunk| (chunk.first_bin, chunk.last_bin)))
    }

    /// Chunks overlapping the inclusive base-column range, in order.
    pub fn chunks_covering_columns(
        &self,
        zoom: ZoomLevel,
        begin_col: u64,
        end_col: u64,
    ) -> Result<&[ChunkDescriptor], ChunkIndexError> {
        let level = self.level(zoom)?;
        Ok(level.covering(begin_col, end_col, |chunk| (chunk.first_col, chunk.last_col)))
    }

    /// Position of the first chunk whose range ends at or after `bin`.
    pub fn first_chunk_index_after(
        &self,
        zoom: ZoomLevel,
        bin: u64,
    ) -> Result<usize, ChunkIndexError> {
        Ok(self.level(zoom)?.chunks.partition_point(|chunk| chunk.last_bin < bin))
    }

    pub fn chunk_for_column(
        &self,
        zoom: ZoomLevel,
        column: u64,
    ) -> Result<Option<&ChunkDescriptor>, ChunkIndexError> {
        Ok(self.chunks_covering_columns(zoom, column, column)?.first())
    }

    /// Bin estimate for `column` from the covering chunk's bounds, before the chunk is loaded.
    pub fn estimate_bin_for_column(
        &self,
        zoom: ZoomLevel,
        column: u64,
    ) -> Result<Option<u64>, ChunkIndexError> {
        Ok(self.chunk_for_column(zoom, column)?.map(|chunk| {
            let (first_col, last_col) = (chunk.first_col, chunk.last_col);
            interpolate_bin(chunk.first_bin, chunk.last_bin, first_col, last_col, column)
        }))
    }

    /// Base column estimate for `bin`, the inverse of [`ChunkIndex::estimate_bin_for_column`].
    pub fn estimate_column_for_bin(
        &self,
        zoom: ZoomLevel,
        bin: u64,
    ) -> Result<Option<u64>, ChunkIndexError> {
        let level = self.level(zoom)?;
        let chunk = level.chunks.get(level.chunks.partition_point(|chunk| chunk.last_bin < bin));
        Ok(chunk.filter(|chunk| chunk.contains_bin(bin)).map(|chunk| {
            interpolate_bin(chunk.first_col, chunk.last_col, chunk.first_bin, chunk.last_bin, bin)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{ChunkIndex, ChunkIndexError};
    use crate::model::fixtures::LinearCase;
    use crate::model::ZoomLevel;

    fn zoom(width: u32) -> ZoomLevel {
        ZoomLevel::new(width).expect("zoom")
    }

    fn index() -> ChunkIndex {
        let case = LinearCase::new(&[1, 4], 400, 20, 100, 2);
        ChunkIndex::from_raw(&case.index).expect("index")
    }

    #[test]
    fn levels_are_ordered_finest_first() {
        let index = index();
        assert_eq!(index.zoom_levels().collect::<Vec<_>>(), vec![zoom(1), zoom(4)]);
        assert_eq!(index.finest_zoom(), zoom(1));
        assert_eq!(index.zoom_level_at(1).expect("level"), zoom(4));
        assert!(matches!(
            index.zoom_level_at(2),
            Err(ChunkIndexError::ZoomIndexOutOfRange { index: 2, levels: 2 })
        ));
        assert_eq!(index.last_bin(zoom(4)).expect("last bin"), 100);
        assert_eq!(index.path_names().len(), 2);
    }

    #[test]
    fn covering_returns_every_overlapping_chunk() {
        let index = index();
        let files = |begin, end| {
            index
                .chunks_covering(zoom(1), begin, end)
                .expect("chunks")
                .iter()
                .map(|chunk| chunk.file().to_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(files(1, 1), vec!["chunk0_bin1.json"]);
        assert_eq!(files(100, 101), vec!["chunk0_bin1.json", "chunk1_bin1.json"]);
        assert_eq!(files(150, 380).len(), 3);
        assert!(files(401, 500).is_empty());
        assert!(files(9, 3).is_empty());
        assert_eq!(index.first_chunk_index_after(zoom(1), 201).expect("position"), 2);
    }

    #[test]
    fn column_lookups_use_base_columns() {
        let index = index();
        let chunk = index.chunk_for_column(zoom(4), 120).expect("level").expect("chunk");
        assert_eq!((chunk.first_bin(), chunk.last_bin()), (26, 50));
        assert_eq!(index.estimate_bin_for_column(zoom(4), 101).expect("level"), Some(26));
        assert_eq!(index.estimate_bin_for_column(zoom(4), 200).expect("level"), Some(50));
        assert_eq!(index.estimate_bin_for_column(zoom(4), 9_999).expect("level"), None);
        assert_eq!(index.estimate_column_for_bin(zoom(1), 37).expect("level"), Some(37));
    }

    #[test]
    fn unknown_zoom_is_an_error() {
        let index = index();
        assert!(matches!(
            index.chunks_covering(zoom(16), 1, 10),
            Err(ChunkIndexError::ZoomLevelNotFound(level)) if level == zoom(16)
        ));
    }

    #[test]
    fn construction_validates_the_document() {
        assert!(matches!(
            ChunkIndex::from_json_slice(br#"{"zoom_levels": {}}"#),
            Err(ChunkIndexError::NoZoomLevels)
        ));
        assert!(matches!(
            ChunkIndex::from_json_slice(br#"{"zoom_levels": {"0": {"files": []}}}"#),
            Err(ChunkIndexError::InvalidZoomKey { .. })
        ));
        assert!(matches!(
            ChunkIndex::from_json_slice(b"not json"),
            Err(ChunkIndexError::Json(_))
        ));

        let mut case = LinearCase::new(&[1], 200, 20, 100, 1);
        if let Some(level) = case.index.zoom_levels.get_mut("1") {
            level.files.swap(0, 1);
        }
        assert!(matches!(
            ChunkIndex::from_raw(&case.index),
            Err(ChunkIndexError::NonMonotonic { position: 1, .. })
        ));
    }

    #[test]
    fn derived_descriptor_fields_saturate_at_the_edges() {
        let index = ChunkIndex::from_json_slice(
            br#"{"zoom_levels": {"1": {"files": [
                {"file": "a.json", "first_bin": 1, "last_bin": 4, "first_col": 0, "last_col": 3},
                {"file": "b.json", "first_bin": 5, "last_bin": 18446744073709551615}
            ]}}}"#,
        )
        .expect("index");
        let chunks = index.level(zoom(1)).expect("level").chunks();
        assert_eq!((chunks[0].x(), chunks[0].visible_columns()), (0, 4));
        assert_eq!(chunks[1].first_col(), 5);
        assert_eq!(chunks[1].last_col(), u64::MAX);
        assert_eq!(chunks[1].visible_columns(), u64::MAX - 4);
    }
}
