// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire shapes of the two fetched documents: the chunk index and a chunk file.
//!
//! Field names follow the files produced by the pangenome schematic exporters, which mix
//! `snake_case` and `camelCase`; aliases accept both spellings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw `bin2file.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChunkIndex {
    #[serde(default)]
    pub json_version: Option<u32>,
    #[serde(default)]
    pub pangenome_length: Option<u64>,
    #[serde(default, rename = "pathNames", alias = "path_names")]
    pub path_names: Vec<String>,
    /// Keyed by bin width as a decimal string.
    #[serde(default)]
    pub zoom_levels: BTreeMap<String, RawZoomLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawZoomLevel {
    #[serde(default)]
    pub last_bin: Option<u64>,
    #[serde(default)]
    pub last_col: Option<u64>,
    #[serde(default)]
    pub files: Vec<RawChunkDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChunkDescriptor {
    pub file: String,
    pub first_bin: u64,
    pub last_bin: u64,
    #[serde(default)]
    pub first_col: Option<u64>,
    #[serde(default)]
    pub last_col: Option<u64>,
    /// Column offset of the chunk's left edge, link columns included.
    #[serde(default)]
    pub x: Option<u64>,
    #[serde(default, alias = "visibleColumns")]
    pub visible_columns: Option<u64>,
    #[serde(default)]
    pub fasta: Option<String>,
}

/// Raw chunk file: the components (segments) of one bin range at one zoom level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    #[serde(default)]
    pub first_bin: Option<u64>,
    #[serde(default)]
    pub last_bin: Option<u64>,
    #[serde(default)]
    pub components: Vec<RawComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawComponent {
    pub first_bin: u64,
    pub last_bin: u64,
    #[serde(rename = "firstCol", alias = "first_col")]
    pub first_col: u64,
    #[serde(rename = "lastCol", alias = "last_col")]
    pub last_col: u64,
    #[serde(default, rename = "binsToCols", alias = "bins_to_cols")]
    pub bins_to_cols: Vec<u32>,
    #[serde(default)]
    pub ends: Vec<u32>,
    #[serde(default)]
    pub starts: Vec<u32>,
    #[serde(default)]
    pub matrix: Vec<RawPathEntry>,
    #[serde(default)]
    pub larrivals: Vec<RawLink>,
    #[serde(default)]
    pub ldepartures: Vec<RawLink>,
    #[serde(default)]
    pub rarrivals: Vec<RawLink>,
    #[serde(default)]
    pub rdepartures: Vec<RawLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    pub upstream: u64,
    pub downstream: u64,
    #[serde(default)]
    pub participants: Vec<u32>,
    #[serde(default, rename = "otherSideRight", alias = "other_side_right")]
    pub other_side_right: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPathEntry {
    #[serde(rename = "pathID", alias = "path_id")]
    pub path_id: u32,
    #[serde(default)]
    pub inverted: bool,
    /// Local bin offsets inside the component, parallel to `bin_data`.
    #[serde(rename = "occupiedBins", alias = "occupied_bins")]
    pub occupied_bins: Vec<u32>,
    #[serde(rename = "binData", alias = "bin_data")]
    pub bin_data: Vec<RawBinData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBinData {
    #[serde(default = "default_repeats")]
    pub repeats: f64,
    #[serde(default)]
    pub reversal: f64,
    /// Nucleotide position ranges `[start, end]` of the path inside this bin.
    #[serde(default)]
    pub pos: Vec<[u64; 2]>,
}

fn default_repeats() -> f64 {
    1.0
}
