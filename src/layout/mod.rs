// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pure layout algorithms.
//!
//! Coordinate conversions between bins, columns and pixels, the run encoder that collapses a
//! path's occupancy into drawable spans, and the lane solver for link arrows.

pub mod coords;
pub mod elevation;
pub mod runs;

pub use coords::{bin_to_column, clamp_bin, column_to_bin, interpolate_bin, pixel_x_of_bin};
pub use elevation::{assign_elevations, links_intersect, ArrowLink};
pub use runs::{encode_path, encode_runs, PathRun, RunClip, RunMarkers};
