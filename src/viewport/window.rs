// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::{LinkSide, Placement, Segment};
use crate::store::{SegmentId, SegmentStore};

/// One visible segment of a computed window, in left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    pub id: SegmentId,
    pub placement: Placement,
    pub width_in_columns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    pub entries: Vec<WindowEntry>,
    pub begin_bin: u64,
    pub end_bin: u64,
    pub centre_bin: u64,
    pub used_columns: u64,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    first_bin: u64,
    last_bin: u64,
    arrival_visible: bool,
    departure_visible: bool,
}

struct Walk {
    spans: Vec<(SegmentId, Span)>,
    leftover: u64,
}

/// Splits `columns` between the two halves: the left half gets the ceiling, the right half (which
/// starts with the target bin) keeps at least one column.
pub fn split_budget(columns: u64) -> (u64, u64) {
    let left = columns.div_ceil(2);
    let right = columns - left;
    if right == 0 && left > 0 {
        (left - 1, 1)
    } else {
        (left, right)
    }
}

/// Lays out loaded segments around `target_bin`, which must lie in `target`.
///
/// Segments are walked outwards through contiguous neighbours. Link-column groups are taken
/// whole or not at all, and a neighbour is entered only when its link columns and at least one
/// bin fit. Budget one side cannot spend is offered to the other.
pub fn walk_window(
    store: &SegmentStore,
    target: SegmentId,
    target_bin: u64,
    columns: u64,
    pixels_per_column: u32,
) -> Option<WindowLayout> {
    let segment = store.get(target)?;
    if !segment.contains_bin(target_bin) {
        return None;
    }

    let (left_budget, right_budget) = split_budget(columns);
    let mut left = walk_left(store, target, target_bin, left_budget);
    let right = walk_right(store, target, target_bin, right_budget + left.leftover);
    if right.leftover > 0 && left.leftover == 0 {
        left = walk_left(store, target, target_bin, left_budget + right.leftover);
    }

    let mut merged: BTreeMap<SegmentId, Span> = BTreeMap::new();
    let mut order = Vec::new();
    for (id, span) in left.spans.iter().rev().chain(right.spans.iter()) {
        match merged.get_mut(id) {
            Some(existing) => {
                existing.first_bin = existing.first_bin.min(span.first_bin);
                existing.last_bin = existing.last_bin.max(span.last_bin);
                existing.arrival_visible |= span.arrival_visible;
                existing.departure_visible |= span.departure_visible;
            }
            None => {
                merged.insert(*id, *span);
                order.push(*id);
            }
        }
    }

    let ppc = u64::from(pixels_per_column);
    let mut x = 0;
    let mut used_columns = 0;
    let mut entries = Vec::with_capacity(order.len());
    for id in order {
        let (Some(span), Some(segment)) = (merged.get(&id), store.get(id)) else {
            continue;
        };
        let width_in_columns = width_in_columns(segment, span);
        entries.push(WindowEntry {
            id,
            placement: Placement {
                relative_pixel_x: x,
                visible_first_bin: span.first_bin,
                visible_last_bin: span.last_bin,
                arrival_visible: span.arrival_visible,
                departure_visible: span.departure_visible,
            },
            width_in_columns,
        });
        x += width_in_columns * ppc;
        used_columns += width_in_columns;
    }

    let begin_bin = entries.first().map_or(target_bin, |entry| entry.placement.visible_first_bin);
    let end_bin = entries.last().map_or(target_bin, |entry| entry.placement.visible_last_bin);
    Some(WindowLayout { entries, begin_bin, end_bin, centre_bin: target_bin, used_columns })
}

fn width_in_columns(segment: &Segment, span: &Span) -> u64 {
    let left = if span.arrival_visible { segment.link_column_count(LinkSide::Left) } else { 0 };
    let right = if span.departure_visible {
        segment.link_column_count(LinkSide::Right)
    } else {
        0
    };
    left + (span.last_bin - span.first_bin + 1) + right
}

/// Bins strictly before `target_bin`, then leftwards through previous neighbours.
fn walk_left(store: &SegmentStore, target: SegmentId, target_bin: u64, budget: u64) -> Walk {
    let mut spans = Vec::new();
    let mut remaining = budget;
    let mut current = target;

    while let Some(segment) = store.get(current) {
        let is_target = current == target;
        let end_bin = if is_target { target_bin } else { segment.last_bin() };
        let available = if is_target {
            target_bin - segment.first_bin()
        } else {
            segment.num_bins()
        };
        let take = available.min(remaining);
        remaining -= take;

        let first_bin = if is_target { target_bin - take } else { end_bin + 1 - take };
        let group = segment.link_column_count(LinkSide::Left);
        let arrival_visible = take == available && group <= remaining;
        if arrival_visible {
            remaining -= group;
        }
        spans.push((
            current,
            Span { first_bin, last_bin: end_bin, arrival_visible, departure_visible: !is_target },
        ));
        if !arrival_visible {
            break;
        }

        let Some(previous) = store.previous_adjacent(current) else {
            break;
        };
        let Some(neighbour) = store.get(previous) else {
            break;
        };
        let group = neighbour.link_column_count(LinkSide::Right);
        if group + 1 > remaining {
            break;
        }
        remaining -= group;
        current = previous;
    }

    Walk { spans, leftover: remaining }
}

/// `target_bin` and the bins after it, then rightwards through next neighbours.
fn walk_right(store: &SegmentStore, target: SegmentId, target_bin: u64, budget: u64) -> Walk {
    let mut spans = Vec::new();
    let mut remaining = budget;
    let mut current = target;

    while let Some(segment) = store.get(current) {
        let is_target = current == target;
        let first_bin = if is_target { target_bin } else { segment.first_bin() };
        let available = segment.last_bin() - first_bin + 1;
        let take = available.min(remaining);
        remaining -= take;

        let group = segment.link_column_count(LinkSide::Right);
        let departure_visible = take == available && group <= remaining;
        if departure_visible {
            remaining -= group;
        }
        spans.push((
            current,
            Span {
                first_bin,
                last_bin: first_bin + take.max(1) - 1,
                arrival_visible: !is_target,
                departure_visible,
            },
        ));
        if !departure_visible {
            break;
        }

        let Some(next) = store.next_adjacent(current) else {
            break;
        };
        let Some(neighbour) = store.get(next) else {
            break;
        };
        let group = neighbour.link_column_count(LinkSide::Left);
        if group + 1 > remaining {
            break;
        }
        remaining -= group;
        current = next;
    }

    Walk { spans, leftover: remaining }
}
