// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::ids::{LinkKey, LinkKind, LinkSide, PathId, SegmentKey, ZoomLevel};
use super::link::LinkColumn;
use super::payload::{RawComponent, RawLink, RawPathEntry};

/// Traversal direction of a path through a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

/// One occupied bin of a path, reduced to what decides span boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinSample {
    /// Local bin offset inside the segment (`bin - first_bin`).
    pub offset: u32,
    pub repeat_count: u32,
    pub inverted: bool,
}

impl BinSample {
    pub fn new(offset: u32, repeat_count: u32, inverted: bool) -> Self {
        Self { offset, repeat_count, inverted }
    }
}

/// Occupancy of one path inside one segment, ordered by ascending offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    path_id: PathId,
    direction: Direction,
    samples: Vec<BinSample>,
}

impl PathEntry {
    pub fn new(path_id: PathId, direction: Direction, mut samples: Vec<BinSample>) -> Self {
        samples.sort_by_key(|sample| sample.offset);
        samples.dedup_by_key(|sample| sample.offset);
        Self { path_id, direction, samples }
    }

    pub fn path_id(&self) -> PathId {
        self.path_id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn samples(&self) -> &[BinSample] {
        &self.samples
    }
}

/// Where a segment sits in the current layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub relative_pixel_x: u64,
    pub visible_first_bin: u64,
    pub visible_last_bin: u64,
    pub arrival_visible: bool,
    pub departure_visible: bool,
}

/// A component of the pangenome graph at one zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    key: SegmentKey,
    last_bin: u64,
    first_col: u64,
    last_col: u64,
    bins_to_cols: Vec<u32>,
    bin_col_starts: Vec<u64>,
    bin_col_ends: Vec<u64>,
    left_arrivals: BTreeMap<LinkKey, LinkColumn>,
    left_departures: BTreeMap<LinkKey, LinkColumn>,
    right_arrivals: BTreeMap<LinkKey, LinkColumn>,
    right_departures: BTreeMap<LinkKey, LinkColumn>,
    paths: BTreeMap<PathId, PathEntry>,
    starts: BTreeSet<PathId>,
    ends: BTreeSet<PathId>,
    placement: Option<Placement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    InvertedRange { first_bin: u64, last_bin: u64 },
    TooManyBins { first_bin: u64, last_bin: u64 },
    BinsToColsLength { key: SegmentKey, expected: u64, found: usize },
    SampleLength { key: SegmentKey, path_id: PathId, bins: usize, samples: usize },
    OffsetOutOfRange { key: SegmentKey, path_id: PathId, offset: u32, num_bins: u64 },
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedRange { first_bin, last_bin } => {
                write!(f, "segment range {first_bin}..={last_bin} is inverted")
            }
            Self::TooManyBins { first_bin, last_bin } => {
                write!(f, "segment range {first_bin}..={last_bin} has too many bins")
            }
            Self::BinsToColsLength { key, expected, found } => {
                write!(f, "segment {key}: binsToCols has {found} entries, expected {expected}")
            }
            Self::SampleLength { key, path_id, bins, samples } => write!(
                f,
                "segment {key}: path {path_id} lists {bins} occupied bins but {samples} samples"
            ),
            Self::OffsetOutOfRange { key, path_id, offset, num_bins } => write!(
                f,
                "segment {key}: path {path_id} occupies offset {offset} outside {num_bins} bins"
            ),
        }
    }
}

impl std::error::Error for SegmentError {}

impl Segment {
    /// Validates a raw component and builds the in-memory segment for `zoom`.
    pub fn from_raw(zoom: ZoomLevel, raw: &RawComponent) -> Result<Self, SegmentError> {
        if raw.first_bin > raw.last_bin {
            return Err(SegmentError::InvertedRange {
                first_bin: raw.first_bin,
                last_bin: raw.last_bin,
            });
        }

        let key = SegmentKey::new(zoom, raw.first_bin);
        let num_bins = (raw.last_bin - raw.first_bin)
            .checked_add(1)
            .filter(|bins| usize::try_from(*bins).is_ok())
            .ok_or(SegmentError::TooManyBins { first_bin: raw.first_bin, last_bin: raw.last_bin })?;

        let bins_to_cols = if raw.bins_to_cols.is_empty() {
            vec![zoom.bin_width(); num_bins as usize]
        } else if raw.bins_to_cols.len() as u64 != num_bins {
            return Err(SegmentError::BinsToColsLength {
                key,
                expected: num_bins,
                found: raw.bins_to_cols.len(),
            });
        } else {
            raw.bins_to_cols.clone()
        };

        let mut bin_col_starts = Vec::with_capacity(bins_to_cols.len());
        let mut bin_col_ends = Vec::with_capacity(bins_to_cols.len());
        let mut col = raw.first_col;
        for width in &bins_to_cols {
            let width = u64::from((*width).max(1));
            bin_col_starts.push(col);
            bin_col_ends.push(col + width - 1);
            col += width;
        }

        let mut paths = BTreeMap::new();
        let mut starts = raw.starts.iter().copied().map(PathId::new).collect::<BTreeSet<_>>();
        for entry in &raw.matrix {
            let path = path_entry_from_raw(key, num_bins, entry)?;
            if entry.bin_data.iter().any(|bin| bin.pos.iter().any(|[s, e]| *s == 1 || *e == 1)) {
                starts.insert(path.path_id());
            }
            paths.insert(path.path_id(), path);
        }

        let mut segment = Self {
            key,
            last_bin: raw.last_bin,
            first_col: raw.first_col,
            last_col: raw.last_col,
            bins_to_cols,
            bin_col_starts,
            bin_col_ends,
            left_arrivals: BTreeMap::new(),
            left_departures: BTreeMap::new(),
            right_arrivals: BTreeMap::new(),
            right_departures: BTreeMap::new(),
            paths,
            starts,
            ends: raw.ends.iter().copied().map(PathId::new).collect(),
            placement: None,
        };

        segment.left_arrivals =
            segment.link_group(LinkKind::Arrival, LinkSide::Left, &raw.larrivals);
        segment.left_departures =
            segment.link_group(LinkKind::Departure, LinkSide::Left, &raw.ldepartures);
        segment.right_arrivals =
            segment.link_group(LinkKind::Arrival, LinkSide::Right, &raw.rarrivals);
        segment.right_departures =
            segment.link_group(LinkKind::Departure, LinkSide::Right, &raw.rdepartures);
        segment.assign_link_orders();

        Ok(segment)
    }

    fn link_group(
        &self,
        kind: LinkKind,
        side: LinkSide,
        raw: &[RawLink],
    ) -> BTreeMap<LinkKey, LinkColumn> {
        raw.iter()
            .map(|link| LinkColumn::from_raw(kind, side, link))
            .filter(|column| !column.is_continuation())
            .map(|mut column| {
                column.set_local_col(self.bin_to_column(column.local_bin()));
                (column.key(), column)
            })
            .collect()
    }

    fn assign_link_orders(&mut self) {
        for (order, column) in
            self.left_arrivals.values_mut().chain(self.left_departures.values_mut()).enumerate()
        {
            column.set_order(order as u32);
        }
        for (order, column) in
            self.right_arrivals.values_mut().chain(self.right_departures.values_mut()).enumerate()
        {
            column.set_order(order as u32);
        }
    }

    pub fn key(&self) -> SegmentKey {
        self.key
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.key.zoom
    }

    pub fn first_bin(&self) -> u64 {
        self.key.first_bin
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

    pub fn num_bins(&self) -> u64 {
        self.last_bin - self.key.first_bin + 1
    }

    pub fn bins_to_cols(&self) -> &[u32] {
        &self.bins_to_cols
    }

    pub fn bin_col_starts(&self) -> &[u64] {
        &self.bin_col_starts
    }

    pub fn bin_col_ends(&self) -> &[u64] {
        &self.bin_col_ends
    }

    pub fn contains_bin(&self, bin: u64) -> bool {
        (self.key.first_bin..=self.last_bin).contains(&bin)
    }

    pub fn contains_column(&self, column: u64) -> bool {
        match (self.bin_col_starts.first(), self.bin_col_ends.last()) {
            (Some(first), Some(last)) => (*first..=*last).contains(&column),
            _ => false,
        }
    }

    /// First base column of `bin`, if the bin belongs to this segment.
    pub fn bin_to_column(&self, bin: u64) -> Option<u64> {
        let local = bin.checked_sub(self.key.first_bin)?;
        self.bin_col_starts.get(usize::try_from(local).ok()?).copied()
    }

    pub fn left_arrivals(&self) -> &BTreeMap<LinkKey, LinkColumn> {
        &self.left_arrivals
    }

    pub fn left_departures(&self) -> &BTreeMap<LinkKey, LinkColumn> {
        &self.left_departures
    }

    pub fn right_arrivals(&self) -> &BTreeMap<LinkKey, LinkColumn> {
        &self.right_arrivals
    }

    pub fn right_departures(&self) -> &BTreeMap<LinkKey, LinkColumn> {
        &self.right_departures
    }

    /// Link columns drawn on `side`, in column order.
    pub fn link_columns(&self, side: LinkSide) -> impl Iterator<Item = &LinkColumn> {
        let (arrivals, departures) = match side {
            LinkSide::Left => (&self.left_arrivals, &self.left_departures),
            LinkSide::Right => (&self.right_arrivals, &self.right_departures),
        };
        arrivals.values().chain(departures.values())
    }

    pub fn link_column_count(&self, side: LinkSide) -> u64 {
        let count = match side {
            LinkSide::Left => self.left_arrivals.len() + self.left_departures.len(),
            LinkSide::Right => self.right_arrivals.len() + self.right_departures.len(),
        };
        count as u64
    }

    pub fn link_column(&self, side: LinkSide, key: &LinkKey) -> Option<&LinkColumn> {
        let group = match (side, key.kind) {
            (LinkSide::Left, LinkKind::Arrival) => &self.left_arrivals,
            (LinkSide::Left, LinkKind::Departure) => &self.left_departures,
            (LinkSide::Right, LinkKind::Arrival) => &self.right_arrivals,
            (LinkSide::Right, LinkKind::Departure) => &self.right_departures,
        };
        group.get(key)
    }

    pub fn link_column_mut(&mut self, side: LinkSide, key: &LinkKey) -> Option<&mut LinkColumn> {
        let group = match (side, key.kind) {
            (LinkSide::Left, LinkKind::Arrival) => &mut self.left_arrivals,
            (LinkSide::Left, LinkKind::Departure) => &mut self.left_departures,
            (LinkSide::Right, LinkKind::Arrival) => &mut self.right_arrivals,
            (LinkSide::Right, LinkKind::Departure) => &mut self.right_departures,
        };
        group.get_mut(key)
    }

    pub fn paths(&self) -> &BTreeMap<PathId, PathEntry> {
        &self.paths
    }

    pub fn path(&self, path_id: PathId) -> Option<&PathEntry> {
        self.paths.get(&path_id)
    }

    pub fn starts(&self) -> &BTreeSet<PathId> {
        &self.starts
    }

    pub fn ends(&self) -> &BTreeSet<PathId> {
        &self.ends
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }
}

fn path_entry_from_raw(
    key: SegmentKey,
    num_bins: u64,
    raw: &RawPathEntry,
) -> Result<PathEntry, SegmentError> {
    let path_id = PathId::new(raw.path_id);
    if raw.occupied_bins.len() != raw.bin_data.len() {
        return Err(SegmentError::SampleLength {
            key,
            path_id,
            bins: raw.occupied_bins.len(),
            samples: raw.bin_data.len(),
        });
    }

    let samples = raw
        .occupied_bins
        .iter()
        .zip(&raw.bin_data)
        .map(|(offset, data)| {
            if u64::from(*offset) >= num_bins {
                return Err(SegmentError::OffsetOutOfRange {
                    key,
                    path_id,
                    offset: *offset,
                    num_bins,
                });
            }
            let repeat_count = data.repeats.round().max(0.0) as u32;
            Ok(BinSample::new(*offset, repeat_count, data.reversal > 0.5))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let direction = if raw.inverted { Direction::Reverse } else { Direction::Forward };
    Ok(PathEntry::new(path_id, direction, samples))
}
