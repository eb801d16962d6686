// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The visible window: which segments and bins are on screen, and the controller that keeps them
//! loaded as the user moves and zooms.

pub mod controller;
pub mod frame;
pub mod window;

pub use controller::{PositionSpace, ViewportController, ViewportError, ViewportUpdate};
pub use frame::{
    link_column_x, LoadingState, PathRow, ViewportFrame, ViewportWindow, VisibleLink,
    VisibleLinkColumn, VisibleSegment,
};
pub use window::{split_budget, walk_window, WindowEntry, WindowLayout};
