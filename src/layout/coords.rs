// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{LinkSide, Placement, Segment};

/// First base column of `bin`, or `None` when the bin is outside the segment.
pub fn bin_to_column(segment: &Segment, bin: u64) -> Option<u64> {
    segment.bin_to_column(bin)
}

/// Bin of `segment` whose column range contains `column`.
pub fn column_to_bin(segment: &Segment, column: u64) -> Option<u64> {
    let ends = segment.bin_col_ends();
    let local = ends.partition_point(|end| *end < column);
    let start = *segment.bin_col_starts().get(local)?;
    if start > column {
        return None;
    }
    Some(segment.first_bin() + local as u64)
}

/// Left pixel edge of `bin` in the current layout pass.
///
/// Each visible bin is drawn one column wide, preceded by the segment's left link columns when
/// its arrival side is visible.
pub fn pixel_x_of_bin(
    segment: &Segment,
    placement: &Placement,
    bin: u64,
    pixels_per_column: u32,
) -> Option<u64> {
    if bin < placement.visible_first_bin || bin > placement.visible_last_bin {
        return None;
    }
    let lead = if placement.arrival_visible {
        segment.link_column_count(LinkSide::Left)
    } else {
        0
    };
    let columns = lead + (bin - placement.visible_first_bin);
    Some(placement.relative_pixel_x + columns * u64::from(pixels_per_column))
}

/// Linear column-to-bin estimate across a range whose per-bin widths are not loaded yet.
pub fn interpolate_bin(
    first_bin: u64,
    last_bin: u64,
    first_col: u64,
    last_col: u64,
    column: u64,
) -> u64 {
    if last_col <= first_col || last_bin <= first_bin {
        return first_bin;
    }
    let column = column.clamp(first_col, last_col);
    let ratio = (column - first_col) as f64 / (last_col - first_col) as f64;
    first_bin + (ratio * (last_bin - first_bin) as f64).round() as u64
}

/// Clamps a requested position into `[1, last_bin]`.
pub fn clamp_bin(bin: u64, last_bin: u64) -> u64 {
    bin.clamp(1, last_bin.max(1))
}
