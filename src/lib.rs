// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Schematic Viewport: windowing, chunk loading and link layout for pangenome schematics.
//!
//! A case is split into per-zoom chunk files described by an index. The [`viewport`] controller
//! decides which chunks to fetch for a requested position, keeps the loaded segments in a
//! [`store::SegmentStore`], walks them into a window that fits the screen and publishes a
//! [`viewport::ViewportFrame`] with per-path runs and lane-assigned link arrows. Drawing is left
//! to the caller.

pub mod config;
pub mod layout;
pub mod model;
pub mod store;
pub mod viewport;
