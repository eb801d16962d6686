// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use super::window::WindowLayout;
use crate::layout::{assign_elevations, encode_path, ArrowLink, PathRun, RunClip};
use crate::model::{
    LinkKey, LinkKind, LinkSide, Participants, PathId, Placement, Segment, SegmentKey, ZoomLevel,
};
use crate::store::SegmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    Idle,
    Loading,
    Repositioning,
}

/// Current window geometry, in bins of the active zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportWindow {
    pub begin_bin: u64,
    pub end_bin: u64,
    pub centre_bin: u64,
    pub pixels_per_column: u32,
    pub pixels_per_row: u32,
    pub window_width_px: u32,
}

impl ViewportWindow {
    pub fn columns(&self) -> u64 {
        (u64::from(self.window_width_px) / u64::from(self.pixels_per_column.max(1))).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRow {
    pub path_id: PathId,
    pub runs: Vec<PathRun>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleSegment {
    pub key: SegmentKey,
    pub relative_pixel_x: u64,
    pub width_in_columns: u64,
    pub visible_first_bin: u64,
    pub visible_last_bin: u64,
    pub arrival_visible: bool,
    pub departure_visible: bool,
    pub rows: Vec<PathRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleLinkColumn {
    pub key: LinkKey,
    pub segment: SegmentKey,
    pub side: LinkSide,
    pub x: u64,
    pub participants: Participants,
}

/// An arrow whose both ends are on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleLink {
    /// Key of the departure column.
    pub key: LinkKey,
    pub departure_x: u64,
    pub arrival_x: u64,
    pub upstream: u64,
    pub downstream: u64,
    pub elevation: u32,
    pub participants: Participants,
}

/// Everything a renderer needs for one layout pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewportFrame {
    pub zoom: ZoomLevel,
    pub window: ViewportWindow,
    pub loading_state: LoadingState,
    pub segments: Vec<VisibleSegment>,
    pub link_columns: Vec<VisibleLinkColumn>,
    pub links: Vec<VisibleLink>,
    pub max_arrow_height: u32,
    pub failed_chunks: Vec<String>,
    pub highlighted_bin: Option<u64>,
}

impl ViewportFrame {
    pub fn empty(zoom: ZoomLevel, window: ViewportWindow) -> Self {
        Self {
            zoom,
            window,
            loading_state: LoadingState::Idle,
            segments: Vec::new(),
            link_columns: Vec::new(),
            links: Vec::new(),
            max_arrow_height: 0,
            failed_chunks: Vec::new(),
            highlighted_bin: None,
        }
    }

    /// Sum of the visible segments' widths.
    pub fn width_in_columns(&self) -> u64 {
        self.segments.iter().map(|segment| segment.width_in_columns).sum()
    }
}

/// Pixel x of a link column given its segment placement.
pub fn link_column_x(
    segment: &Segment,
    placement: &Placement,
    side: LinkSide,
    order: u32,
    pixels_per_column: u32,
) -> u64 {
    let ppc = u64::from(pixels_per_column);
    let offset = match side {
        LinkSide::Left => u64::from(order),
        LinkSide::Right => {
            let left = if placement.arrival_visible {
                segment.link_column_count(LinkSide::Left)
            } else {
                0
            };
            left + (placement.visible_last_bin - placement.visible_first_bin + 1) + u64::from(order)
        }
    };
    placement.relative_pixel_x + offset * ppc
}

/// Builds the frame for a computed window, recording placements and solved elevations on the
/// stored segments.
pub(crate) fn compose_frame(
    store: &mut SegmentStore,
    layout: &WindowLayout,
    zoom: ZoomLevel,
    window: ViewportWindow,
) -> ViewportFrame {
    let ppc = window.pixels_per_column;
    let mut frame = ViewportFrame::empty(zoom, window);
    let mut arrivals: BTreeMap<LinkKey, (u64, LinkSide)> = BTreeMap::new();
    let mut departures: Vec<(LinkKey, LinkSide, u64, Participants)> = Vec::new();

    store.clear_placements();
    for entry in &layout.entries {
        if let Some(segment) = store.get_mut(entry.id) {
            segment.set_placement(Some(entry.placement));
        }
    }

    for entry in &layout.entries {
        let Some(segment) = store.get(entry.id) else {
            warn!("placed segment {} is no longer loaded", entry.id);
            continue;
        };
        let placement = entry.placement;
        let clip = RunClip::placed(segment, &placement);
        let rows = segment
            .paths()
            .values()
            .map(|path| PathRow {
                path_id: path.path_id(),
                runs: encode_path(segment, path, clip),
            })
            .filter(|row| !row.runs.is_empty())
            .collect();
        frame.segments.push(VisibleSegment {
            key: segment.key(),
            relative_pixel_x: placement.relative_pixel_x,
            width_in_columns: entry.width_in_columns,
            visible_first_bin: placement.visible_first_bin,
            visible_last_bin: placement.visible_last_bin,
            arrival_visible: placement.arrival_visible,
            departure_visible: placement.departure_visible,
            rows,
        });

        let sides = [
            (LinkSide::Left, placement.arrival_visible),
            (LinkSide::Right, placement.departure_visible),
        ];
        for (side, visible) in sides {
            if !visible {
                continue;
            }
            for column in segment.link_columns(side) {
                let x = link_column_x(segment, &placement, side, column.order(), ppc);
                let participants = column.participants().iter().copied().collect::<Participants>();
                match column.kind() {
                    LinkKind::Arrival => {
                        arrivals.insert(column.key(), (x, side));
                    }
                    LinkKind::Departure => {
                        departures.push((column.key(), side, x, participants.clone()));
                    }
                }
                frame.link_columns.push(VisibleLinkColumn {
                    key: column.key(),
                    segment: segment.key(),
                    side,
                    x,
                    participants,
                });
            }
        }
    }

    let mut arrows = Vec::new();
    let mut ends = Vec::new();
    for (key, side, departure_x, participants) in departures {
        let Some((arrival_x, arrival_side)) = arrivals.get(&key.counterpart(side)) else {
            continue;
        };
        arrows.push(ArrowLink::new(key, side == LinkSide::Left, *arrival_side == LinkSide::Right));
        ends.push((departure_x, *arrival_x, participants));
    }
    frame.max_arrow_height = assign_elevations(&mut arrows);

    for (arrow, (departure_x, arrival_x, participants)) in arrows.into_iter().zip(ends) {
        write_back_elevation(store, zoom, &arrow);
        frame.links.push(VisibleLink {
            key: arrow.key,
            departure_x,
            arrival_x,
            upstream: arrow.upstream,
            downstream: arrow.downstream,
            elevation: arrow.elevation,
            participants,
        });
    }
    frame
}

fn write_back_elevation(store: &mut SegmentStore, zoom: ZoomLevel, arrow: &ArrowLink) {
    let departure_side = if arrow.inverted_departure { LinkSide::Left } else { LinkSide::Right };
    let arrival_side = if arrow.inverted_arrival { LinkSide::Right } else { LinkSide::Left };
    let ends = [
        (arrow.upstream, departure_side, arrow.key),
        (arrow.downstream, arrival_side, arrow.key.counterpart(departure_side)),
    ];
    for (bin, side, key) in ends {
        let Some(id) = store.lookup_by_bin(bin, zoom) else {
            continue;
        };
        let column = store.get_mut(id).and_then(|segment| segment.link_column_mut(side, &key));
        if let Some(column) = column {
            column.set_elevation(arrow.elevation);
        }
    }
}
