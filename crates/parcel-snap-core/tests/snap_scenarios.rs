//! 端到端捕捉场景

use parcel_snap_core::prelude::*;
use std::time::Duration;

fn lot() -> Vec<Shape> {
    vec![Shape::rectangle("lot", Point2::new(0.0, 0.0), Point2::new(10.0, 10.0))]
}

fn engine_with_clock() -> (SnapEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let engine = SnapEngine::with_clock(SnapConfig::default(), clock.clone()).unwrap();
    (engine, clock)
}

#[test]
fn grid_candidates_around_cursor_in_rectangle_corner() {
    let (mut engine, _clock) = engine_with_clock();
    let cursor = Point2::new(0.3, 0.7);
    engine.force_update(&lot(), Some(cursor));

    let matches = engine.find_snap_points_in_radius(cursor, 2.0);
    let mut grid: Vec<(f64, f64)> = matches
        .iter()
        .filter(|m| m.candidate.snap_type == SnapType::Grid)
        .map(|m| (m.candidate.position.x, m.candidate.position.y))
        .collect();
    grid.sort_by(|a, b| a.partial_cmp(b).unwrap());

    assert_eq!(grid, vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)]);

    // 角点同时是端点，端点强度更高，最近点应锁定到真实几何
    let nearest = engine.find_nearest_snap_point(cursor, 2.0).unwrap();
    assert_ne!(nearest.candidate.snap_type, SnapType::Grid);
}

#[test]
fn radius_results_are_sorted_with_strength_ties() {
    let (mut engine, _clock) = engine_with_clock();
    let cursor = Point2::new(0.3, 0.7);
    engine.force_update(&lot(), Some(cursor));

    let matches = engine.find_snap_points_in_radius(cursor, 2.0);
    assert!(!matches.is_empty());
    assert!(matches.iter().all(|m| m.distance <= 2.0));

    for w in matches.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if (a.distance - b.distance).abs() < 1e-12 {
            assert!(a.candidate.strength() >= b.candidate.strength());
        }
    }

    // (0,0) 处端点与网格点重合，端点排在前面
    let at_origin: Vec<_> = matches
        .iter()
        .filter(|m| m.candidate.position == Point2::new(0.0, 0.0))
        .map(|m| m.candidate.snap_type)
        .collect();
    assert_eq!(at_origin, vec![SnapType::Endpoint, SnapType::Grid]);
}

#[test]
fn nearest_is_none_outside_radius() {
    let (mut engine, _clock) = engine_with_clock();
    engine.force_update(&lot(), None);

    assert!(engine.find_nearest_snap_point(Point2::new(50.0, 50.0), 5.0).is_none());

    let m = engine.find_nearest_snap_point(Point2::new(4.0, 0.5), 3.0).unwrap();
    assert!(m.distance <= 3.0);
    // 中点 (5,0) 距离约 1.1，端点 (0,0) 约 4.03 超出半径
    assert_eq!(m.candidate.snap_type, SnapType::Midpoint);
}

#[test]
fn two_updates_within_a_frame_rebuild_once() {
    let (mut engine, clock) = engine_with_clock();
    let shapes = lot();

    engine.update(&shapes, Some(Point2::new(1.0, 1.0)));
    clock.advance(Duration::from_millis(8));
    engine.update(&shapes, Some(Point2::new(2.0, 1.0)));
    assert_eq!(engine.stats().rebuilds, 1);

    engine.force_update(&shapes, Some(Point2::new(3.0, 1.0)));
    assert_eq!(engine.stats().rebuilds, 2);
}

#[test]
fn grid_cache_hit_across_updates_in_same_cell() {
    let (mut engine, clock) = engine_with_clock();
    let shapes = lot();

    engine.update(&shapes, Some(Point2::new(3.2, 3.2)));
    clock.advance(Duration::from_millis(20));
    engine.update(&shapes, Some(Point2::new(3.8, 3.6)));
    clock.advance(Duration::from_millis(20));
    engine.update(&shapes, Some(Point2::new(4.1, 3.6)));

    let stats = engine.stats();
    assert_eq!(stats.rebuilds, 3);
    assert_eq!(stats.grid_generations, 2);
    assert_eq!(stats.grid_cache_entries, 2);
}

#[test]
fn rotated_polygon_and_closed_polyline() {
    let (mut engine, _clock) = engine_with_clock();
    let square = Shape::polygon(
        "sq",
        vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ],
    )
    .with_rotation(Rotation::new(std::f64::consts::FRAC_PI_4, Point2::origin()));
    let triangle = Shape::polyline(
        "tri",
        vec![
            Point2::new(100.0, 0.0),
            Point2::new(140.0, 0.0),
            Point2::new(120.0, 30.0),
            Point2::new(101.0, 1.0),
        ],
    );
    engine.force_update(&[square, triangle], None);

    // 旋转 45° 后角点落在坐标轴上
    let m = engine
        .find_nearest_snap_point(Point2::new(2f64.sqrt(), 0.05), 0.5)
        .unwrap();
    assert_eq!(m.candidate.snap_type, SnapType::Endpoint);
    assert!((m.candidate.position.x - 2f64.sqrt()).abs() < 1e-9);

    // 闭合边 (101,1)->(100,0) 的中点
    let m = engine
        .find_snap_points_in_radius(Point2::new(100.5, 0.5), 0.1)
        .into_iter()
        .find(|m| m.candidate.snap_type == SnapType::Midpoint);
    assert!(m.is_some());
}

#[test]
fn far_cursor_saturating_cells() {
    let (mut engine, _clock) = engine_with_clock();
    let mut shapes = lot();
    shapes.extend((0..12).map(|i| {
        let x = 20.0 + i as f64 * 10.0;
        Shape::line(format!("l{i}"), Point2::new(x, 0.0), Point2::new(x, 1.0))
    }));

    let far = Point2::new(1e20, 0.0);
    assert!(engine.force_update(&shapes, Some(far)));

    // 竖直边在远处光标处给出垂直点，网格点和边投影都超出范围
    let matches = engine.find_snap_points_in_radius(far, 1.0);
    assert!(!matches.is_empty());
    assert!(matches
        .iter()
        .all(|m| m.candidate.snap_type == SnapType::Perpendicular));

    let mut mask = SnapMask::ALL;
    mask.set(SnapType::Perpendicular, false);
    engine.set_active_types(mask);
    assert!(engine.find_nearest_snap_point(far, 1.0).is_none());
    assert!(!engine.snap(far).is_snapped());
    assert!(engine
        .find_nearest_snap_point(Point2::new(-1e20, -1e20), 1.0)
        .is_none());

    // 远处光标不影响正常几何
    assert!(engine.find_nearest_snap_point(Point2::new(0.1, 0.1), 1.0).is_some());
}

#[test]
fn independent_engines_do_not_share_cache() {
    let (mut a, _) = engine_with_clock();
    let (mut b, _) = engine_with_clock();

    a.force_update(&lot(), Some(Point2::new(0.5, 0.5)));
    assert_eq!(a.stats().grid_generations, 1);
    assert_eq!(b.stats().grid_cache_entries, 0);

    b.force_update(&lot(), Some(Point2::new(0.5, 0.5)));
    assert_eq!(b.stats().grid_generations, 1);
}
