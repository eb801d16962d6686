// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use schematic_viewport::layout::{ArrowLink, PathRun};
use schematic_viewport::model::{
    BinSample, LinkKey, LinkKind, LinkSide, RawBinData, RawComponent, RawLink, RawPathEntry,
    Segment, ZoomLevel,
};
use schematic_viewport::store::SegmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub const ALL: [Case; 3] = [Case::Small, Case::Medium, Case::Large];

    pub fn id(self) -> &'static str {
        match self {
            Case::Small => "small",
            Case::Medium => "medium",
            Case::Large => "large",
        }
    }

    pub fn scale(self) -> usize {
        match self {
            Case::Small => 16,
            Case::Medium => 256,
            Case::Large => 4096,
        }
    }
}

/// xorshift64: irregular but reproducible fixture shapes.
struct Scramble(u64);

impl Scramble {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

/// Arrows over `8 * scale` bins, a quarter of them jumping backwards.
pub fn arrows(case: Case) -> Vec<ArrowLink> {
    let count = case.scale();
    let bins = count as u64 * 8;
    let mut scramble = Scramble::new(0x5eed_0001);
    (0..count)
        .map(|_| {
            let upstream = 1 + scramble.next() % bins;
            let jump = 2 + scramble.next() % 64;
            let backward = scramble.next() % 4 == 0;
            let downstream =
                if backward { upstream.saturating_sub(jump).max(1) } else { upstream + jump };
            let key = LinkKey::new(LinkKind::Departure, downstream, upstream, LinkSide::Left);
            ArrowLink::new(key, false, backward)
        })
        .collect()
}

/// Samples of one path over `16 * scale` bins: about three quarters occupied, with copy-number
/// and strand changes every few bins.
pub fn samples(case: Case) -> Vec<BinSample> {
    let len = case.scale() * 16;
    let mut scramble = Scramble::new(0x5eed_0002);
    (0..len)
        .filter_map(|offset| {
            let roll = scramble.next();
            if roll % 4 == 0 {
                return None;
            }
            let repeat_count = 1 + ((roll >> 8) % 7 == 0) as u32;
            let inverted = (offset / 24) % 5 == 4;
            Some(BinSample::new(offset as u32, repeat_count, inverted))
        })
        .collect()
}

pub fn checksum_runs(runs: &[PathRun]) -> u64 {
    runs.iter().fold(0u64, |acc, run| {
        acc.wrapping_mul(131)
            .wrapping_add(u64::from(run.start_offset))
            .wrapping_mul(131)
            .wrapping_add(u64::from(run.length))
            .wrapping_add(u64::from(run.inverted))
    })
}

pub const SEGMENT_BINS: u64 = 32;

/// `scale` contiguous segments of 32 bins with three fully occupied paths. Every fourth segment
/// jumps from its last bin to the first bin three segments ahead.
pub fn linear_store(case: Case) -> SegmentStore {
    let segments = case.scale() as u64;
    let mut components = (0..segments)
        .map(|index| {
            let first_bin = index * SEGMENT_BINS + 1;
            let last_bin = first_bin + SEGMENT_BINS - 1;
            RawComponent {
                first_bin,
                last_bin,
                first_col: first_bin,
                last_col: last_bin,
                matrix: (0..3).map(full_path).collect(),
                ..RawComponent::default()
            }
        })
        .collect::<Vec<_>>();

    for index in (0..segments.saturating_sub(3)).step_by(4) {
        let upstream = (index + 1) * SEGMENT_BINS;
        let downstream = (index + 3) * SEGMENT_BINS + 1;
        let departure = RawLink {
            upstream,
            downstream,
            participants: vec![0, 2],
            other_side_right: false,
        };
        let arrival = RawLink { other_side_right: true, ..departure.clone() };
        components[index as usize].rdepartures.push(departure);
        components[index as usize + 3].larrivals.push(arrival);
    }

    let mut store = SegmentStore::new();
    for raw in &components {
        store.insert(Segment::from_raw(ZoomLevel::BASE, raw).expect("fixture segment"));
    }
    store
}

fn full_path(path_id: u32) -> RawPathEntry {
    RawPathEntry {
        path_id,
        inverted: path_id == 1,
        occupied_bins: (0..SEGMENT_BINS as u32).collect(),
        bin_data: (0..SEGMENT_BINS)
            .map(|_| RawBinData { repeats: 1.0, reversal: 0.0, pos: Vec::new() })
            .collect(),
    }
}
