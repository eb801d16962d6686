// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Data access for a pangenome case.
//!
//! The chunk index says which files cover a bin range, the loader fetches and caches their
//! payloads through an injected source, and the segment store owns the segments built from them.

pub mod chunk_index;
pub mod loader;
pub mod segments;

pub use chunk_index::{ChunkDescriptor, ChunkIndex, ChunkIndexError, ZoomLevelIndex};
pub use loader::{ChunkSource, FsSource, LoadError, LoaderCache, MemorySource};
pub use segments::{Insert, SegmentId, SegmentStore};
