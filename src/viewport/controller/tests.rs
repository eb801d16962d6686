// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::Ordering;
use std::time::Duration;

use rstest::{fixture, rstest};

use super::{PositionSpace, ViewportController, ViewportError, ViewportUpdate};
use crate::config::ViewportConfig;
use crate::model::fixtures::{LinearCase, CASE};
use crate::model::ZoomLevel;
use crate::store::MemorySource;
use crate::viewport::{LoadingState, ViewportFrame};

const INDEX: &str = "bin2file.json";

fn zoom(width: u32) -> ZoomLevel {
    ZoomLevel::new(width).expect("zoom")
}

/// Window of 80 columns at 6 px per column; read-ahead only on request.
fn config() -> ViewportConfig {
    ViewportConfig {
        window_width_px: 480,
        auto_read_ahead: false,
        cache_capacity: 64,
        index_file_name: INDEX.to_owned(),
        ..ViewportConfig::default()
    }
}

/// Zoom 1: 2000 bins in segments of 40 and chunks of 200. Zoom 4: 500 bins, segments of 10,
/// chunks of 50.
fn linear_source() -> MemorySource {
    let case = LinearCase::new(&[1, 4], 2000, 40, 200, 3);
    MemorySource::from_files(case.files(CASE, INDEX))
}

#[fixture]
fn source() -> MemorySource {
    linear_source()
}

async fn opened(source: MemorySource) -> ViewportController<MemorySource> {
    let controller = ViewportController::new(source, &config());
    controller.open_case(CASE).await.expect("open case");
    controller
}

fn applied(update: ViewportUpdate) -> std::sync::Arc<ViewportFrame> {
    match update {
        ViewportUpdate::Applied(frame) => frame,
        ViewportUpdate::Superseded => panic!("expected an applied update"),
    }
}

async fn goto(
    controller: &ViewportController<MemorySource>,
    bin: u64,
) -> std::sync::Arc<ViewportFrame> {
    applied(controller.update_position(bin, PositionSpace::Bin, false).await.expect("update"))
}

#[tokio::test]
async fn requests_need_an_open_case() {
    let controller = ViewportController::new(linear_source(), &config());
    let result = controller.update_position(10, PositionSpace::Bin, false).await;
    assert!(matches!(result, Err(ViewportError::NoCaseOpen)));
    assert!(matches!(controller.read_ahead().await, Err(ViewportError::NoCaseOpen)));
    assert!(controller.frame().is_none());
}

#[tokio::test]
async fn missing_index_is_reported_per_case() {
    let controller = ViewportController::new(linear_source(), &config());
    match controller.open_case("elsewhere").await {
        Err(ViewportError::IndexNotFound { case }) => assert_eq!(case, "elsewhere"),
        other => panic!("expected IndexNotFound, got: {other:?}"),
    }
    assert!(!controller.loader().is_open());
    assert!(controller.index().await.is_none());
}

#[tokio::test]
async fn opening_starts_at_the_finest_zoom() {
    let controller = opened(linear_source()).await;
    assert_eq!(controller.zoom().await, ZoomLevel::BASE);
    assert_eq!(controller.loading_state().await, LoadingState::Idle);
    let index = controller.index().await.expect("index");
    assert_eq!(index.zoom_level_count(), 2);
}

#[tokio::test]
async fn window_is_centred_on_the_requested_bin() {
    let case = LinearCase::new(&[1], 250, 100, 250, 2);
    let controller = opened(MemorySource::from_files(case.files(CASE, INDEX))).await;

    let frame = goto(&controller, 50).await;
    assert_eq!((frame.window.begin_bin, frame.window.end_bin), (10, 89));
    assert_eq!(frame.window.centre_bin, 50);
    assert_eq!(frame.width_in_columns(), 80);
    assert_eq!(frame.loading_state, LoadingState::Idle);
    assert_eq!(frame.segments.len(), 1);
    assert_eq!(frame.segments[0].rows.len(), 2);
}

#[rstest]
#[case(1)]
#[case(37)]
#[case(200)]
#[case(1000)]
#[case(1999)]
#[case(2000)]
#[tokio::test]
async fn window_always_contains_its_centre(source: MemorySource, #[case] bin: u64) {
    let controller = opened(source).await;
    let frame = goto(&controller, bin).await;

    let window = frame.window;
    assert!(window.begin_bin <= bin && bin <= window.end_bin);
    assert_eq!(frame.width_in_columns(), 80);
    for segment in &frame.segments {
        assert!(segment.visible_first_bin >= window.begin_bin);
        assert!(segment.visible_last_bin <= window.end_bin);
    }
}

#[rstest]
#[tokio::test]
async fn positions_are_clamped_into_the_pangenome(source: MemorySource) {
    let controller = opened(source).await;
    let frame = goto(&controller, 9_999).await;
    assert_eq!(frame.window.centre_bin, 2000);
    let frame = goto(&controller, 0).await;
    assert_eq!(frame.window.centre_bin, 1);
}

#[rstest]
#[tokio::test]
async fn repeated_requests_do_not_duplicate_segments(source: MemorySource) {
    let controller = opened(source).await;
    goto(&controller, 300).await;
    let loaded = controller.with_store(|store| store.len()).await;
    let fetches = controller.loader().source().fetch_count();

    goto(&controller, 300).await;
    assert_eq!(controller.with_store(|store| store.len()).await, loaded);
    assert_eq!(controller.loader().source().fetch_count(), fetches);
}

#[rstest]
#[tokio::test]
async fn far_jumps_evict_and_return_trips_hit_the_cache(source: MemorySource) {
    let controller = opened(source).await;
    goto(&controller, 100).await;
    goto(&controller, 1900).await;

    let stale = controller
        .with_store(|store| store.lookup_by_bin(100, ZoomLevel::BASE).is_some())
        .await;
    assert!(!stale);

    let fetches = controller.loader().source().fetch_count();
    let frame = goto(&controller, 100).await;
    assert_eq!(frame.width_in_columns(), 80);
    assert_eq!(controller.loader().source().fetch_count(), fetches);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn a_newer_request_supersedes_a_slow_one(mut source: MemorySource) {
    source.delay(format!("{CASE}/1/chunk9"), Duration::from_millis(100));
    let controller = opened(source).await;

    let slow = controller.update_position(1990, PositionSpace::Bin, false);
    let fast = controller.update_position(100, PositionSpace::Bin, false);
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.expect("slow request"), ViewportUpdate::Superseded);
    let frame = applied(fast.expect("fast request"));
    assert_eq!(frame.window.centre_bin, 100);
    assert_eq!(controller.window().await.centre_bin, 100);
    assert_eq!(controller.frame().expect("current frame").window.centre_bin, 100);

    // The superseded request's data still landed in the store.
    let kept = controller
        .with_store(|store| store.lookup_by_bin(1990, ZoomLevel::BASE).is_some())
        .await;
    assert!(kept);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn a_move_overtaking_a_zoom_change_still_sweeps_the_old_level(mut source: MemorySource) {
    source.delay(format!("{CASE}/4/"), Duration::from_millis(100));
    let controller = opened(source).await;
    goto(&controller, 120).await;

    let zooming = controller.set_zoom(zoom(4));
    let moving = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.loading_state().await, LoadingState::Loading);
        controller.update_position(30, PositionSpace::Bin, false).await
    };
    let (zooming, moving) = tokio::join!(zooming, moving);

    assert_eq!(zooming.expect("zoom"), ViewportUpdate::Superseded);
    let frame = applied(moving.expect("move"));
    assert_eq!(frame.zoom, zoom(4));
    assert_eq!(frame.window.centre_bin, 30);

    let (stale, current) = controller
        .with_store(|store| {
            (store.iter_zoom(ZoomLevel::BASE).count(), store.iter_zoom(zoom(4)).count())
        })
        .await;
    assert_eq!(stale, 0);
    assert!(current > 0);
}

#[tokio::test]
async fn commits_recheck_the_ticket_under_the_lock() {
    let controller = opened(linear_source()).await;
    let ticket = controller.epoch.fetch_add(1, Ordering::SeqCst) + 1;
    let mut state = controller.shared.state.lock().await;
    let context = state.context().expect("context");
    assert!(controller.is_current(&state, ticket, &context));

    // A newer request took its ticket while this one waited for the lock.
    controller.epoch.fetch_add(1, Ordering::SeqCst);
    assert!(!controller.is_current(&state, ticket, &context));

    let ticket = controller.epoch.load(Ordering::SeqCst);
    state.zoom = zoom(4);
    assert!(!controller.is_current(&state, ticket, &context));
}

#[rstest]
#[tokio::test]
async fn failed_chunks_degrade_to_a_clipped_window(mut source: MemorySource) {
    source.fail(format!("{CASE}/1/chunk1_bin1.json"));
    let controller = opened(source).await;

    let frame = goto(&controller, 190).await;
    assert_eq!(frame.failed_chunks, vec!["chunk1_bin1.json".to_owned()]);
    assert_eq!((frame.window.begin_bin, frame.window.end_bin), (121, 200));
    assert_eq!(frame.width_in_columns(), 80);
}

#[rstest]
#[tokio::test]
async fn unloadable_target_yields_an_empty_frame(mut source: MemorySource) {
    source.fail(format!("{CASE}/1/chunk0_bin1.json"));
    let controller = opened(source).await;

    let frame = goto(&controller, 50).await;
    assert!(frame.segments.is_empty());
    assert_eq!(frame.failed_chunks, vec!["chunk0_bin1.json".to_owned()]);
    assert_eq!((frame.window.begin_bin, frame.window.end_bin), (50, 50));
}

#[rstest]
#[tokio::test]
async fn zooming_in_keeps_the_centre_column(source: MemorySource) {
    let controller = opened(source).await;
    applied(controller.set_zoom(zoom(4)).await.expect("zoom out"));
    goto(&controller, 50).await;

    let frame = applied(controller.set_zoom(ZoomLevel::BASE).await.expect("zoom in"));
    assert_eq!(frame.zoom, ZoomLevel::BASE);
    assert_eq!(frame.window.centre_bin, 197);
    let foreign = controller
        .with_store(|store| store.iter_zoom(zoom(4)).count())
        .await;
    assert_eq!(foreign, 0);
}

#[rstest]
#[tokio::test]
async fn zooming_out_lands_within_one_bin(source: MemorySource) {
    let controller = opened(source).await;
    goto(&controller, 198).await;

    let frame = applied(controller.set_zoom_index(1).await.expect("zoom out"));
    assert_eq!(frame.zoom, zoom(4));
    assert_eq!(frame.window.centre_bin, 50);
    let centre_column = (frame.window.centre_bin - 1) * 4 + 1;
    assert!(198 - centre_column < 4);
}

#[rstest]
#[tokio::test]
async fn column_positions_resolve_through_the_loaded_chunk(source: MemorySource) {
    let controller = opened(source).await;
    applied(controller.set_zoom(zoom(4)).await.expect("zoom"));

    let update = controller.update_position(402, PositionSpace::Column, false).await;
    let frame = applied(update.expect("column update"));
    assert_eq!(frame.window.centre_bin, 101);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn column_requests_report_loading_until_the_column_resolves(mut source: MemorySource) {
    source.delay(format!("{CASE}/1/"), Duration::from_millis(100));
    let controller = opened(source).await;

    let update = controller.update_position(402, PositionSpace::Column, false);
    let observed = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.loading_state().await
    };
    let (update, observed) = tokio::join!(update, observed);

    assert_eq!(observed, LoadingState::Loading);
    assert_eq!(applied(update.expect("column update")).window.centre_bin, 402);
    assert_eq!(controller.loading_state().await, LoadingState::Idle);
}

#[rstest]
#[tokio::test]
async fn unknown_zoom_levels_are_rejected(source: MemorySource) {
    let controller = opened(source).await;
    assert!(matches!(controller.set_zoom(zoom(16)).await, Err(ViewportError::Index(_))));
    assert!(matches!(controller.set_zoom_index(2).await, Err(ViewportError::Index(_))));
    assert_eq!(controller.zoom().await, ZoomLevel::BASE);
}

#[rstest]
#[tokio::test]
async fn read_ahead_fills_the_margin_without_moving(source: MemorySource) {
    let controller = opened(source).await;
    let before = goto(&controller, 1000).await;

    let added = controller.read_ahead().await.expect("read ahead");
    assert!(added > 0);
    let covered = controller
        .with_store(|store| store.lookup_by_bin(1000 + 160, ZoomLevel::BASE).is_some())
        .await;
    assert!(covered);
    assert_eq!(controller.frame().expect("frame"), before);
    assert_eq!(controller.read_ahead().await.expect("second read ahead"), 0);
}

#[rstest]
#[tokio::test]
async fn applied_frames_load_the_margin_in_the_background(source: MemorySource) {
    let config = ViewportConfig { auto_read_ahead: true, ..config() };
    let controller = ViewportController::new(source, &config);
    controller.open_case(CASE).await.expect("open case");
    let frame = goto(&controller, 1000).await;

    // Bin 800 sits two window widths left of the window and outside the primary load.
    let added = controller.settle_read_ahead().await.expect("scheduled read ahead");
    assert!(added > 0);
    let covered = controller
        .with_store(|store| store.lookup_by_bin(800, ZoomLevel::BASE).is_some())
        .await;
    assert!(covered);
    assert_eq!(controller.frame().expect("frame"), frame);
    assert_eq!(controller.settle_read_ahead().await.expect("nothing pending"), 0);
    assert_eq!(controller.read_ahead().await.expect("margin already loaded"), 0);

    goto(&controller, 1500).await;
    controller.close().await;
    assert_eq!(controller.settle_read_ahead().await.expect("cancelled by close"), 0);
}

#[rstest]
#[tokio::test]
async fn shifting_moves_and_clamps_the_centre(source: MemorySource) {
    let controller = opened(source).await;
    goto(&controller, 500).await;

    let frame = applied(controller.shift(25).await.expect("shift right"));
    assert_eq!(frame.window.centre_bin, 525);
    let frame = applied(controller.shift(-10_000).await.expect("shift left"));
    assert_eq!(frame.window.centre_bin, 1);
}

#[rstest]
#[tokio::test]
async fn geometry_changes_recompute_and_keep_the_highlight(source: MemorySource) {
    let controller = opened(source).await;
    let frame = applied(
        controller.update_position(700, PositionSpace::Bin, true).await.expect("highlight"),
    );
    assert_eq!(frame.highlighted_bin, Some(700));

    let frame = applied(controller.resize(120).await.expect("resize"));
    assert_eq!(frame.width_in_columns(), 20);
    assert_eq!(frame.window.centre_bin, 700);
    assert_eq!(frame.highlighted_bin, Some(700));

    let frame = applied(controller.set_pixels_per_column(3).await.expect("ppc"));
    assert_eq!(frame.width_in_columns(), 40);
    let frame = applied(controller.set_pixels_per_row(8).await.expect("ppr"));
    assert_eq!(frame.window.pixels_per_row, 8);

    let frame = goto(&controller, 720).await;
    assert_eq!(frame.highlighted_bin, None);
}

#[rstest]
#[tokio::test]
async fn subscribers_see_each_applied_frame(source: MemorySource) {
    let controller = opened(source).await;
    let mut frames = controller.subscribe();
    assert!(frames.borrow_and_update().is_none());

    let frame = goto(&controller, 321).await;
    assert!(frames.has_changed().expect("sender alive"));
    assert_eq!(frames.borrow_and_update().as_ref(), Some(&frame));

    controller.close().await;
    assert!(frames.borrow_and_update().is_none());
    assert!(matches!(
        controller.update_position(1, PositionSpace::Bin, false).await,
        Err(ViewportError::NoCaseOpen)
    ));
}
