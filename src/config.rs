// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Viewport geometry and loading knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub pixels_per_column: u32,
    pub pixels_per_row: u32,
    pub window_width_px: u32,
    /// Read-ahead distance on each side, in window widths.
    pub read_ahead_factor: u32,
    /// Load the read-ahead margin in the background after every applied frame.
    pub auto_read_ahead: bool,
    /// Parsed chunk payloads kept by the loader cache.
    pub cache_capacity: usize,
    pub index_file_name: String,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            pixels_per_column: 6,
            pixels_per_row: 5,
            window_width_px: 1200,
            read_ahead_factor: 2,
            auto_read_ahead: true,
            cache_capacity: 256,
            index_file_name: "bin2file.json".to_owned(),
        }
    }
}

impl ViewportConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}
