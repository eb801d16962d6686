// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Segment, SegmentKey, ZoomLevel};

/// Arena slot of a loaded segment. Stable until the segment is evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(usize);

impl SegmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Inserted(SegmentId),
    AlreadyPresent(SegmentId),
}

impl Insert {
    pub fn id(self) -> SegmentId {
        match self {
            Self::Inserted(id) | Self::AlreadyPresent(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Loaded segments of every zoom level, keyed by `(zoom, first_bin)`.
#[derive(Debug, Default)]
pub struct SegmentStore {
    slots: Vec<Option<Segment>>,
    free: Vec<usize>,
    by_key: BTreeMap<SegmentKey, SegmentId>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Adds `segment` unless one with the same key is already loaded.
    pub fn insert(&mut self, segment: Segment) -> Insert {
        if let Some(id) = self.by_key.get(&segment.key()) {
            return Insert::AlreadyPresent(*id);
        }

        let key = segment.key();
        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(segment);
                SegmentId(slot)
            }
            None => {
                self.slots.push(Some(segment));
                SegmentId(self.slots.len() - 1)
            }
        };
        self.by_key.insert(key, id);
        Insert::Inserted(id)
    }

    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let segment = self.slots.get_mut(id.0)?.take()?;
        self.by_key.remove(&segment.key());
        self.free.push(id.0);
        Some(segment)
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn id_of(&self, key: SegmentKey) -> Option<SegmentId> {
        self.by_key.get(&key).copied()
    }

    /// Segments of `zoom`, in bin order.
    pub fn iter_zoom(&self, zoom: ZoomLevel) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.by_key
            .range(SegmentKey::new(zoom, 0)..=SegmentKey::new(zoom, u64::MAX))
            .filter_map(|(_, id)| self.get(*id).map(|segment| (*id, segment)))
    }

    /// Segment of `zoom` containing `bin`, if loaded.
    pub fn lookup_by_bin(&self, bin: u64, zoom: ZoomLevel) -> Option<SegmentId> {
        let (_, id) = self
            .by_key
            .range(SegmentKey::new(zoom, 0)..=SegmentKey::new(zoom, bin))
            .next_back()?;
        self.get(*id).filter(|segment| segment.contains_bin(bin)).map(|_| *id)
    }

    /// Segment of `zoom` whose base-column range contains `column`, if loaded.
    pub fn lookup_by_column(&self, column: u64, zoom: ZoomLevel) -> Option<SegmentId> {
        self.iter_zoom(zoom)
            .find(|(_, segment)| segment.contains_column(column))
            .map(|(id, _)| id)
    }

    /// The loaded segment starting right after `id` ends.
    pub fn next_adjacent(&self, id: SegmentId) -> Option<SegmentId> {
        let segment = self.get(id)?;
        let next = segment.last_bin().checked_add(1)?;
        self.id_of(SegmentKey::new(segment.zoom(), next))
    }

    /// The loaded segment ending right before `id` starts.
    pub fn previous_adjacent(&self, id: SegmentId) -> Option<SegmentId> {
        let segment = self.get(id)?;
        let (_, previous) = self
            .by_key
            .range(SegmentKey::new(segment.zoom(), 0)..segment.key())
            .next_back()?;
        self.get(*previous)
            .filter(|candidate| candidate.last_bin() + 1 == segment.first_bin())
            .map(|_| *previous)
    }

    /// Drops segments of `zoom` lying entirely before `boundary` (`from_beginning`) or entirely
    /// after it. Returns how many were removed.
    pub fn evict_range(&mut self, zoom: ZoomLevel, boundary: u64, from_beginning: bool) -> usize {
        let doomed = self
            .iter_zoom(zoom)
            .filter(|(_, segment)| {
                if from_beginning {
                    segment.last_bin() < boundary
                } else {
                    segment.first_bin() > boundary
                }
            })
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }

    /// Drops every segment not belonging to `except`.
    pub fn evict_zoom_level(&mut self, except: ZoomLevel) -> usize {
        let doomed = self
            .by_key
            .iter()
            .filter(|(key, _)| key.zoom != except)
            .map(|(_, id)| *id)
            .collect::<Vec<_>>();
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_key.clear();
    }

    pub fn clear_placements(&mut self) {
        for segment in self.slots.iter_mut().flatten() {
            segment.set_placement(None);
        }
    }
}
