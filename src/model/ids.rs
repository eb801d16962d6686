// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bin width of a zoom level, in base columns per bin.
///
/// The chunk index keys its levels by this width (`"1"`, `"4"`, `"16"`, ...), so the finest
/// level has the smallest value and `ZoomLevel::BASE` is the column resolution itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoomLevel(u32);

impl ZoomLevel {
    pub const BASE: Self = Self(1);

    pub fn new(bin_width: u32) -> Result<Self, IdError> {
        if bin_width == 0 {
            return Err(IdError::ZeroZoomLevel);
        }
        Ok(Self(bin_width))
    }

    pub fn bin_width(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZoomLevel {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        let width = trimmed.parse::<u32>().map_err(|_| IdError::NotANumber(trimmed.to_owned()))?;
        Self::new(width)
    }
}

/// Row index of an accession/path in the pangenome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(u32);

impl PathId {
    pub fn new(row: u32) -> Self {
        Self(row)
    }

    pub fn row(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a segment: its zoom level and first bin.
///
/// Ordering is by zoom level first, so all segments of one level form a contiguous,
/// bin-sorted range of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub zoom: ZoomLevel,
    pub first_bin: u64,
}

impl SegmentKey {
    pub fn new(zoom: ZoomLevel, first_bin: u64) -> Self {
        Self { zoom, first_bin }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.zoom, self.first_bin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Arrival,
    Departure,
}

impl LinkKind {
    pub fn opposite(self) -> Self {
        match self {
            Self::Arrival => Self::Departure,
            Self::Departure => Self::Arrival,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSide {
    Left,
    Right,
}

impl LinkSide {
    pub fn from_is_right(is_right: bool) -> Self {
        if is_right {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::Right)
    }
}

/// Direction-independent identity of a link column.
///
/// `other_side` names the side of the far segment the link lands on, which disambiguates two
/// links between the same bins drawn on different sides. The derived ordering (kind, then
/// downstream, then upstream) is the column order inside a segment side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub kind: LinkKind,
    pub downstream: u64,
    pub upstream: u64,
    pub other_side: LinkSide,
}

impl LinkKey {
    pub fn new(kind: LinkKind, downstream: u64, upstream: u64, other_side: LinkSide) -> Self {
        Self { kind, downstream, upstream, other_side }
    }

    /// Key of the column at the other end of this link, given the side this column is drawn on.
    pub fn counterpart(self, own_side: LinkSide) -> Self {
        Self {
            kind: self.kind.opposite(),
            downstream: self.downstream,
            upstream: self.upstream,
            other_side: own_side,
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            LinkKind::Arrival => 'a',
            LinkKind::Departure => 'd',
        };
        let side = match self.other_side {
            LinkSide::Left => 'l',
            LinkSide::Right => 'r',
        };
        write!(f, "{prefix}{}-{}{side}", self.downstream, self.upstream)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    NotANumber(String),
    ZeroZoomLevel,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("zoom level key must not be empty"),
            Self::NotANumber(raw) => write!(f, "zoom level key {raw:?} is not a bin width"),
            Self::ZeroZoomLevel => f.write_str("zoom level bin width must be positive"),
        }
    }
}

impl std::error::Error for IdError {}
