// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::model::{BinSample, Direction, PathEntry, Placement, Segment};

/// Maximal span of contiguous occupied bins sharing copy number and inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathRun {
    /// Lowest local offset covered by the run.
    pub start_offset: u32,
    pub length: u32,
    pub repeat_count: u32,
    pub inverted: bool,
    /// First drawn column, relative to the segment's first visible bin.
    pub column: u32,
    pub is_start: bool,
    pub is_end: bool,
    pub is_split: bool,
}

impl PathRun {
    pub fn end_offset(&self) -> u32 {
        self.start_offset + self.length - 1
    }
}

/// Segment bounds and the visible part of them, in bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClip {
    pub segment_first_bin: u64,
    pub segment_last_bin: u64,
    pub view_begin_bin: u64,
    pub view_end_bin: u64,
}

impl RunClip {
    pub fn whole(segment: &Segment) -> Self {
        Self {
            segment_first_bin: segment.first_bin(),
            segment_last_bin: segment.last_bin(),
            view_begin_bin: segment.first_bin(),
            view_end_bin: segment.last_bin(),
        }
    }

    pub fn placed(segment: &Segment, placement: &Placement) -> Self {
        Self {
            segment_first_bin: segment.first_bin(),
            segment_last_bin: segment.last_bin(),
            view_begin_bin: placement.visible_first_bin,
            view_end_bin: placement.visible_last_bin,
        }
    }

    fn visible_offsets(&self) -> Option<(u32, u32)> {
        let begin = self.view_begin_bin.max(self.segment_first_bin);
        let end = self.view_end_bin.min(self.segment_last_bin);
        if begin > end {
            return None;
        }
        let first = u32::try_from(begin - self.segment_first_bin).ok()?;
        let last = u32::try_from(end - self.segment_first_bin).ok()?;
        Some((first, last))
    }

    fn first_bin_visible(&self) -> bool {
        self.view_begin_bin <= self.segment_first_bin
    }

    fn last_bin_visible(&self) -> bool {
        self.view_end_bin >= self.segment_last_bin
    }
}

/// Whether the path begins or terminates inside this segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMarkers {
    pub path_starts: bool,
    pub path_ends: bool,
}

/// Collapses a path's samples into drawable runs, in traversal order.
pub fn encode_runs(
    samples: &[BinSample],
    clip: RunClip,
    direction: Direction,
    markers: RunMarkers,
) -> Vec<PathRun> {
    let Some((first_visible, last_visible)) = clip.visible_offsets() else {
        return Vec::new();
    };

    let visible = samples
        .iter()
        .filter(|sample| (first_visible..=last_visible).contains(&sample.offset));
    let ordered: Vec<&BinSample> = match direction {
        Direction::Forward => visible.collect(),
        Direction::Reverse => visible.rev().collect(),
    };

    let mut runs: Vec<PathRun> = Vec::new();
    let mut previous: Option<&BinSample> = None;
    for sample in ordered {
        let extends = previous.is_some_and(|prev| {
            let contiguous = match direction {
                Direction::Forward => prev.offset + 1 == sample.offset,
                Direction::Reverse => sample.offset + 1 == prev.offset,
            };
            contiguous
                && prev.repeat_count == sample.repeat_count
                && prev.inverted == sample.inverted
        });

        match runs.last_mut() {
            Some(run) if extends => {
                run.length += 1;
                if sample.offset < run.start_offset {
                    run.start_offset = sample.offset;
                    run.column = sample.offset - first_visible;
                }
            }
            _ => runs.push(PathRun {
                start_offset: sample.offset,
                length: 1,
                repeat_count: sample.repeat_count,
                inverted: sample.inverted,
                column: sample.offset - first_visible,
                is_start: false,
                is_end: false,
                is_split: false,
            }),
        }
        previous = Some(sample);
    }

    let (start_visible, end_visible) = match direction {
        Direction::Forward => (clip.first_bin_visible(), clip.last_bin_visible()),
        Direction::Reverse => (clip.last_bin_visible(), clip.first_bin_visible()),
    };
    if markers.path_starts && start_visible {
        if let Some(run) = runs.first_mut() {
            run.is_start = true;
        }
    }
    if markers.path_ends && end_visible {
        if let Some(run) = runs.last_mut() {
            run.is_end = true;
        }
    }
    if clip.segment_first_bin == clip.segment_last_bin {
        for run in &mut runs {
            run.is_split = run.is_start && run.is_end;
        }
    }

    runs
}

/// Runs of one path inside a placed (or whole) segment.
pub fn encode_path(segment: &Segment, entry: &PathEntry, clip: RunClip) -> Vec<PathRun> {
    let markers = RunMarkers {
        path_starts: segment.starts().contains(&entry.path_id()),
        path_ends: segment.ends().contains(&entry.path_id()),
    };
    encode_runs(entry.samples(), clip, entry.direction(), markers)
}
