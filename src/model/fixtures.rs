// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::payload::{
    RawBinData, RawChunk, RawChunkDescriptor, RawChunkIndex, RawComponent, RawLink, RawPathEntry,
    RawZoomLevel,
};

pub(crate) const CASE: &str = "demo";

/// Component whose bins are one zoom-1 column wide, so `first_col == first_bin`.
pub(crate) fn component(first_bin: u64, last_bin: u64) -> RawComponent {
    RawComponent {
        first_bin,
        last_bin,
        first_col: first_bin,
        last_col: last_bin,
        ..RawComponent::default()
    }
}

pub(crate) fn path_entry(path_id: u32, inverted: bool, offsets: &[u32]) -> RawPathEntry {
    RawPathEntry {
        path_id,
        inverted,
        occupied_bins: offsets.to_vec(),
        bin_data: offsets
            .iter()
            .map(|_| RawBinData { repeats: 1.0, reversal: 0.0, pos: Vec::new() })
            .collect(),
    }
}

pub(crate) fn link(
    upstream: u64,
    downstream: u64,
    participants: &[u32],
    other_side_right: bool,
) -> RawLink {
    RawLink { upstream, downstream, participants: participants.to_vec(), other_side_right }
}

/// A linear pangenome: every zoom level tiles `1..=base_columns` with segments of
/// `segment_columns` columns, grouped into chunks of `chunk_columns` columns, each segment fully
/// occupied by `paths` forward paths and chained by plain continuations.
pub(crate) struct LinearCase {
    pub(crate) index: RawChunkIndex,
    pub(crate) chunks: Vec<(String, RawChunk)>,
}

impl LinearCase {
    pub(crate) fn new(
        zooms: &[u32],
        base_columns: u64,
        segment_columns: u64,
        chunk_columns: u64,
        paths: u32,
    ) -> Self {
        let mut index = RawChunkIndex {
            json_version: Some(19),
            pangenome_length: Some(base_columns),
            path_names: (0..paths).map(|path| format!("path{path}")).collect(),
            zoom_levels: BTreeMap::new(),
        };
        let mut chunks = Vec::new();

        for &zoom in zooms {
            let width = u64::from(zoom);
            let last_bin = base_columns / width;
            let segment_bins = (segment_columns / width).max(1);
            let chunk_bins = (chunk_columns / width).max(segment_bins);

            let mut files = Vec::new();
            let mut chunk_first = 1;
            while chunk_first <= last_bin {
                let chunk_last = (chunk_first + chunk_bins - 1).min(last_bin);
                let file = format!("chunk{}_bin{zoom}.json", files.len());

                let mut components = Vec::new();
                let mut first = chunk_first;
                while first <= chunk_last {
                    let last = (first + segment_bins - 1).min(chunk_last);
                    components.push(linear_component(zoom, first, last, last_bin, paths));
                    first = last + 1;
                }

                let first_col = (chunk_first - 1) * width + 1;
                let last_col = chunk_last * width;
                files.push(RawChunkDescriptor {
                    file: file.clone(),
                    first_bin: chunk_first,
                    last_bin: chunk_last,
                    first_col: Some(first_col),
                    last_col: Some(last_col),
                    x: Some(first_col - 1),
                    visible_columns: Some(last_col - first_col + 1),
                    fasta: None,
                });
                chunks.push((
                    format!("{zoom}/{file}"),
                    RawChunk {
                        first_bin: Some(chunk_first),
                        last_bin: Some(chunk_last),
                        components,
                    },
                ));
                chunk_first = chunk_last + 1;
            }

            index.zoom_levels.insert(
                zoom.to_string(),
                RawZoomLevel {
                    last_bin: Some(last_bin),
                    last_col: Some(last_bin * width),
                    files,
                },
            );
        }

        Self { index, chunks }
    }

    /// Serialized files keyed by their fetch path under `case`.
    pub(crate) fn files(&self, case: &str, index_file: &str) -> Vec<(String, Vec<u8>)> {
        let mut files = vec![(
            format!("{case}/{index_file}"),
            serde_json::to_vec(&self.index).expect("index json"),
        )];
        for (path, chunk) in &self.chunks {
            files.push((
                format!("{case}/{path}"),
                serde_json::to_vec(chunk).expect("chunk json"),
            ));
        }
        files
    }
}

fn linear_component(zoom: u32, first: u64, last: u64, last_bin: u64, paths: u32) -> RawComponent {
    let width = u64::from(zoom);
    let offsets = (0..=(last - first) as u32).collect::<Vec<_>>();
    let mut raw = RawComponent {
        first_bin: first,
        last_bin: last,
        first_col: (first - 1) * width + 1,
        last_col: last * width,
        ..RawComponent::default()
    };
    let participants = (0..paths).collect::<Vec<_>>();
    for path in 0..paths {
        let mut entry = path_entry(path, false, &offsets);
        if first == 1 {
            if let Some(data) = entry.bin_data.first_mut() {
                data.pos = vec![[1, width]];
            }
        }
        raw.matrix.push(entry);
    }
    if last == last_bin {
        raw.ends = participants.clone();
    }
    if first > 1 {
        raw.larrivals.push(link(first - 1, first, &participants, true));
    }
    if last < last_bin {
        raw.rdepartures.push(link(last, last + 1, &participants, false));
    }
    raw
}
