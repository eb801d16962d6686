// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Wire payloads are parsed into validated segments, each owning its link columns and the
//! per-path bin occupancy the run encoder collapses.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod link;
pub mod payload;
pub mod segment;

pub use ids::{IdError, LinkKey, LinkKind, LinkSide, PathId, SegmentKey, ZoomLevel};
pub use link::{LinkColumn, Participants};
pub use payload::{
    RawBinData, RawChunk, RawChunkDescriptor, RawChunkIndex, RawComponent, RawLink, RawPathEntry,
    RawZoomLevel,
};
pub use segment::{BinSample, Direction, PathEntry, Placement, Segment, SegmentError};
