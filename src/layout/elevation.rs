// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use crate::model::LinkKey;

/// A drawable arrow whose departure and arrival columns are both visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowLink {
    /// Key of the departure column.
    pub key: LinkKey,
    pub upstream: u64,
    pub downstream: u64,
    /// Departure column sits on the left side of its segment.
    pub inverted_departure: bool,
    /// Arrival column sits on the right side of its segment.
    pub inverted_arrival: bool,
    pub elevation: u32,
}

impl ArrowLink {
    pub fn new(key: LinkKey, inverted_departure: bool, inverted_arrival: bool) -> Self {
        Self {
            key,
            upstream: key.upstream,
            downstream: key.downstream,
            inverted_departure,
            inverted_arrival,
            elevation: 0,
        }
    }

    pub fn span(&self) -> u64 {
        self.upstream.abs_diff(self.downstream)
    }

    fn interval(&self) -> (u64, u64) {
        (self.upstream.min(self.downstream), self.upstream.max(self.downstream))
    }
}

/// Assigns each link the lowest lane not taken by an earlier, intersecting link.
///
/// Links are visited shortest span first (stable on ties), so nested arcs stay below the arcs
/// enclosing them. Returns the highest lane used, or 0 for no links.
pub fn assign_elevations(links: &mut [ArrowLink]) -> u32 {
    let mut order = (0..links.len()).collect::<Vec<_>>();
    order.sort_by_key(|&idx| links[idx].span());

    let mut max_elevation = 0;
    for (position, &current) in order.iter().enumerate() {
        let taken = order[..position]
            .iter()
            .filter(|&&previous| links_intersect(&links[previous], &links[current]))
            .map(|&previous| links[previous].elevation)
            .collect::<BTreeSet<_>>();

        let mut elevation = 0;
        while taken.contains(&elevation) {
            elevation += 1;
        }
        links[current].elevation = elevation;
        max_elevation = max_elevation.max(elevation);
    }
    max_elevation
}

/// Whether two arrows would cross or overlap if drawn at the same lane.
pub fn links_intersect(prev: &ArrowLink, cur: &ArrowLink) -> bool {
    let (prev_start, prev_end) = prev.interval();
    let (cur_start, cur_end) = cur.interval();
    let overlap = (i128::from(prev_end) - i128::from(cur_start))
        * (i128::from(cur_end) - i128::from(prev_start));

    match overlap.signum() {
        1 => true,
        -1 => false,
        _ if prev.span() > 1 || cur.span() > 1 => false,
        _ => adjacent_intersection(prev, cur),
    }
}

/// Tie-break for two short links sharing an endpoint bin.
fn adjacent_intersection(prev: &ArrowLink, cur: &ArrowLink) -> bool {
    let endpoints = [prev.upstream, prev.downstream, cur.upstream, cur.downstream];
    let mut pairs = Vec::new();
    for i in 0..endpoints.len() {
        for j in 0..i {
            if endpoints[i] == endpoints[j] {
                pairs.push((i, j));
            }
        }
    }
    // Two shared pairs short-circuit without inspecting the topology.
    let [(i, j)] = pairs.as_slice() else {
        return true;
    };
    let shared = |idx: usize| *i == idx || *j == idx;

    let (prev_other, prev_left) = if shared(0) {
        (prev.downstream, prev.inverted_departure)
    } else if shared(1) {
        (prev.upstream, !prev.inverted_arrival)
    } else {
        return true;
    };
    let (cur_other, cur_left) = if shared(2) {
        (cur.downstream, cur.inverted_departure)
    } else if shared(3) {
        (cur.upstream, !cur.inverted_arrival)
    } else {
        return true;
    };

    if prev_left == cur_left {
        return false;
    }
    (prev_left && cur_other < prev_other) || (cur_left && cur_other > prev_other)
}

#[cfg(test)]
mod tests {
    use super::{assign_elevations, links_intersect, ArrowLink};
    use crate::model::{LinkKey, LinkKind, LinkSide};

    fn arrow(upstream: u64, downstream: u64) -> ArrowLink {
        ArrowLink::new(
            LinkKey::new(LinkKind::Departure, downstream, upstream, LinkSide::Left),
            false,
            false,
        )
    }

    fn flagged(upstream: u64, downstream: u64, departure: bool, arrival: bool) -> ArrowLink {
        ArrowLink {
            inverted_departure: departure,
            inverted_arrival: arrival,
            ..arrow(upstream, downstream)
        }
    }

    #[test]
    fn overlapping_links_get_distinct_lanes_and_disjoint_ones_reuse_zero() {
        let mut links = vec![arrow(10, 20), arrow(15, 25), arrow(30, 40)];
        let max = assign_elevations(&mut links);
        assert_ne!(links[0].elevation, links[1].elevation);
        assert_eq!(links[2].elevation, 0);
        assert_eq!(max, 1);
    }

    #[test]
    fn empty_input_has_zero_height() {
        assert_eq!(assign_elevations(&mut []), 0);
    }

    #[test]
    fn shorter_links_are_placed_first() {
        let mut links = vec![arrow(1, 50), arrow(10, 12), arrow(20, 22)];
        assign_elevations(&mut links);
        assert_eq!(links[1].elevation, 0);
        assert_eq!(links[2].elevation, 0);
        assert_eq!(links[0].elevation, 1);
    }

    #[test]
    fn backward_links_use_their_sorted_interval() {
        assert!(links_intersect(&arrow(40, 10), &arrow(20, 30)));
        assert!(!links_intersect(&arrow(40, 30), &arrow(20, 10)));
    }

    #[test]
    fn wide_links_touching_at_one_bin_do_not_intersect() {
        assert!(!links_intersect(&arrow(10, 20), &arrow(20, 30)));
    }

    #[test]
    fn adjacent_short_links_follow_the_side_they_touch() {
        // prev leaves bin 6 on the left towards 7, cur enters bin 6 on the left from 5.
        let prev = flagged(6, 7, true, false);
        let cur = flagged(5, 6, false, false);
        assert!(!links_intersect(&prev, &cur));

        // prev leaves bin 6 on the right back to 5, cur enters bin 6 on the left from 7.
        let prev = flagged(6, 5, false, false);
        let cur = flagged(7, 6, false, false);
        assert!(links_intersect(&prev, &cur));

        // A self loop next to a neighbour shares more than one endpoint pair.
        assert!(links_intersect(&flagged(6, 6, false, false), &flagged(6, 7, false, false)));
    }

    #[test]
    fn solver_is_deterministic_and_collision_free() {
        let build = || {
            (0..40u64)
                .map(|i| arrow(1 + (i * 7) % 97, 1 + (i * 13 + 5) % 97))
                .collect::<Vec<_>>()
        };
        let mut first = build();
        let mut second = build();
        assert_eq!(assign_elevations(&mut first), assign_elevations(&mut second));
        assert_eq!(first, second);

        let mut order = (0..first.len()).collect::<Vec<_>>();
        order.sort_by_key(|&idx| first[idx].span());
        for (position, &later) in order.iter().enumerate() {
            for &earlier in &order[..position] {
                if links_intersect(&first[earlier], &first[later]) {
                    assert_ne!(first[earlier].elevation, first[later].elevation);
                }
            }
        }
    }
}
