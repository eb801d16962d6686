// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;
use smallvec::SmallVec;

use super::ids::{LinkKey, LinkKind, LinkSide, PathId};
use super::payload::RawLink;

/// Sorted, deduplicated path ids travelling along a link.
pub type Participants = SmallVec<[PathId; 8]>;

/// One drawn column of a link: the departure end in the upstream segment or the arrival end in
/// the downstream segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkColumn {
    key: LinkKey,
    side: LinkSide,
    upstream_bin: u64,
    downstream_bin: u64,
    upstream_col: Option<u64>,
    downstream_col: Option<u64>,
    order: u32,
    elevation: u32,
    participants: Participants,
}

impl LinkColumn {
    pub fn new(
        kind: LinkKind,
        side: LinkSide,
        upstream_bin: u64,
        downstream_bin: u64,
        other_side_on_right: bool,
        participants: impl IntoIterator<Item = PathId>,
    ) -> Self {
        let mut participants = participants.into_iter().collect::<Participants>();
        participants.sort_unstable();
        participants.dedup();

        Self {
            key: LinkKey::new(
                kind,
                downstream_bin,
                upstream_bin,
                LinkSide::from_is_right(other_side_on_right),
            ),
            side,
            upstream_bin,
            downstream_bin,
            upstream_col: None,
            downstream_col: None,
            order: 0,
            elevation: 0,
            participants,
        }
    }

    pub(crate) fn from_raw(kind: LinkKind, side: LinkSide, raw: &RawLink) -> Self {
        Self::new(
            kind,
            side,
            raw.upstream,
            raw.downstream,
            raw.other_side_right,
            raw.participants.iter().copied().map(PathId::new),
        )
    }

    pub fn key(&self) -> LinkKey {
        self.key
    }

    pub fn kind(&self) -> LinkKind {
        self.key.kind
    }

    /// Side of its own segment this column is drawn on.
    pub fn side(&self) -> LinkSide {
        self.side
    }

    pub fn other_side_on_right(&self) -> bool {
        self.key.other_side.is_right()
    }

    pub fn upstream_bin(&self) -> u64 {
        self.upstream_bin
    }

    pub fn downstream_bin(&self) -> u64 {
        self.downstream_bin
    }

    pub fn upstream_col(&self) -> Option<u64> {
        self.upstream_col
    }

    pub fn downstream_col(&self) -> Option<u64> {
        self.downstream_col
    }

    pub(crate) fn set_local_col(&mut self, col: Option<u64>) {
        match self.key.kind {
            LinkKind::Departure => self.upstream_col = col,
            LinkKind::Arrival => self.downstream_col = col,
        }
    }

    /// The bin this column is attached to inside its own segment.
    pub fn local_bin(&self) -> u64 {
        match self.key.kind {
            LinkKind::Departure => self.upstream_bin,
            LinkKind::Arrival => self.downstream_bin,
        }
    }

    /// Sorted `(min, max)` bin interval covered by the link.
    pub fn interval(&self) -> (u64, u64) {
        if self.upstream_bin <= self.downstream_bin {
            (self.upstream_bin, self.downstream_bin)
        } else {
            (self.downstream_bin, self.upstream_bin)
        }
    }

    pub fn span(&self) -> u64 {
        self.upstream_bin.abs_diff(self.downstream_bin)
    }

    /// Whether this end of the link is traversed against the forward strand: a departure drawn
    /// on the left side or an arrival drawn on the right side.
    pub fn is_inverted(&self) -> bool {
        match self.key.kind {
            LinkKind::Departure => self.side == LinkSide::Left,
            LinkKind::Arrival => self.side == LinkSide::Right,
        }
    }

    /// A forward step into the next bin; drawn as plain adjacency, never as a column.
    pub fn is_continuation(&self) -> bool {
        if self.upstream_bin.checked_add(1) != Some(self.downstream_bin) {
            return false;
        }
        match self.key.kind {
            LinkKind::Departure => self.side == LinkSide::Right && !self.other_side_on_right(),
            LinkKind::Arrival => self.side == LinkSide::Left && self.other_side_on_right(),
        }
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    pub fn elevation(&self) -> u32 {
        self.elevation
    }

    pub fn set_elevation(&mut self, elevation: u32) {
        self.elevation = elevation;
    }

    pub fn participants(&self) -> &[PathId] {
        &self.participants
    }
}
