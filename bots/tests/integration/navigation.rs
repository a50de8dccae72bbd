// tactical_bots_core/bots/tests/integration/navigation.rs

use proptest::prelude::*;

use tactical_bots_core::core::config::NavigationConfig;
use tactical_bots_core::core::types::{Aabb, Vec2, Vec3};
use tactical_bots_core::systems::ai::pathfinding::{find_path, is_valid_move, PathfindingError, SearchSettings};
use tactical_bots_core::systems::ai::route::{RouteBuilder, RouteError};
use tactical_bots_core::world::nav_grid::{Cell, NavGrid};

const RADIUS: f32 = 0.3;
const SLICE_LOW: f32 = 0.25;
const SLICE_HIGH: f32 = 1.6;

fn grid_with(size: f32, obstacles: &[Aabb]) -> NavGrid {
    let mut grid = NavGrid::new(Vec2::ZERO, Vec2::splat(size), 1.0, RADIUS, SLICE_LOW, SLICE_HIGH);
    grid.rebuild(obstacles);
    grid
}

fn routes_with(size: f32, obstacles: &[Aabb]) -> RouteBuilder {
    RouteBuilder::new(grid_with(size, obstacles), &NavigationConfig::default())
}

fn obstacle_strategy() -> impl Strategy<Value = Aabb> {
    (0.0f32..20.0, 0.0f32..20.0, 0.2f32..4.0, 0.2f32..4.0, prop::bool::ANY).prop_map(|(x, z, w, d, overhead)| {
        let (y0, y1) = if overhead { (2.5, 3.5) } else { (0.0, 2.0) };
        Aabb::new(Vec3::new(x, y0, z), Vec3::new(x + w, y1, z + d))
    })
}

fn all_cells(grid: &NavGrid) -> impl Iterator<Item = Cell> + '_ {
    (0..grid.rows()).flat_map(move |row| (0..grid.cols()).map(move |col| Cell::new(col, row)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn blocked_cells_match_inflated_obstacles(obstacles in prop::collection::vec(obstacle_strategy(), 0..8)) {
        let grid = grid_with(20.0, &obstacles);
        for cell in all_cells(&grid) {
            let (lo, hi) = grid.cell_rect(cell);
            let expected = obstacles
                .iter()
                .filter(|o| o.overlaps_vertical(SLICE_LOW, SLICE_HIGH))
                .any(|o| o.inflated_xz(RADIUS).overlaps_rect_xz(lo, hi));
            prop_assert_eq!(!grid.is_walkable(cell), expected, "cell {:?}", cell);

            let open = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, 1), (1, -1), (-1, -1)]
                .iter()
                .filter(|(dc, dr)| grid.is_walkable(cell.offset(*dc, *dr)))
                .count() as u8;
            prop_assert!(grid.openness(cell) <= 8);
            prop_assert_eq!(grid.openness(cell), open);
        }
    }

    #[test]
    fn paths_are_deterministic_and_valid(
        obstacles in prop::collection::vec(obstacle_strategy(), 0..6),
        start in (0i32..20, 0i32..20),
        goal in (0i32..20, 0i32..20),
    ) {
        let grid = grid_with(20.0, &obstacles);
        let start = Cell::new(start.0, start.1);
        let goal = Cell::new(goal.0, goal.1);
        prop_assume!(grid.is_walkable(start) && grid.is_walkable(goal));

        let settings = SearchSettings::default();
        let first = find_path(&grid, start, goal, &settings);
        let second = find_path(&grid, start, goal, &settings);
        prop_assert_eq!(&first, &second);

        if let Ok(path) = first {
            prop_assert_eq!(path.first().copied(), Some(start));
            prop_assert_eq!(path.last().copied(), Some(goal));
            for pair in path.windows(2) {
                let (dc, dr) = (pair[1].col - pair[0].col, pair[1].row - pair[0].row);
                prop_assert!(dc.abs() <= 1 && dr.abs() <= 1 && (dc, dr) != (0, 0));
                prop_assert!(is_valid_move(&grid, pair[0], dc, dr), "invalid step {:?} -> {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn smoothing_never_adds_points_and_keeps_the_exact_destination(
        obstacles in prop::collection::vec(obstacle_strategy(), 0..6),
        from in (1.0f32..19.0, 1.0f32..19.0),
        to in (1.0f32..19.0, 1.0f32..19.0),
    ) {
        let routes = routes_with(20.0, &obstacles);
        let from = Vec3::new(from.0, 0.0, from.1);
        let to = Vec3::new(to.0, 0.0, to.1);
        let (Ok(raw), Ok(route)) = (routes.raw_route(from, to), routes.find_route(from, to)) else {
            return Ok(());
        };
        prop_assert!(route.len() <= raw.len());
        prop_assert_eq!(route.raw_len, raw.len());
        prop_assert_eq!(route.destination(), Some(to));
    }
}

/// Exact segment vs. rectangle test in XZ, with the rectangle shrunk so that
/// touching an edge or corner does not count.
fn crosses_interior(a: Vec3, b: Vec3, lo: Vec2, hi: Vec2) -> bool {
    let (lo, hi) = (lo + Vec2::splat(1e-3), hi - Vec2::splat(1e-3));
    let origin = Vec2::new(a.x, a.z);
    let dir = Vec2::new(b.x - a.x, b.z - a.z);
    let (mut enter, mut exit) = (0.0f32, 1.0f32);
    for (p, d, min, max) in [(origin.x, dir.x, lo.x, hi.x), (origin.y, dir.y, lo.y, hi.y)] {
        if d.abs() < 1e-9 {
            if p <= min || p >= max {
                return false;
            }
            continue;
        }
        let (t_a, t_b) = ((min - p) / d, (max - p) / d);
        enter = enter.max(t_a.min(t_b));
        exit = exit.min(t_a.max(t_b));
        if enter >= exit {
            return false;
        }
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn smoothed_segments_stay_on_walkable_cells(
        obstacles in prop::collection::vec(obstacle_strategy(), 0..6),
        from in (0.5f32..19.5, 0.5f32..19.5),
        to in (0.5f32..19.5, 0.5f32..19.5),
    ) {
        let routes = routes_with(20.0, &obstacles);
        let grid = routes.grid();
        let from = Vec3::new(from.0, 0.0, from.1);
        let to = Vec3::new(to.0, 0.0, to.1);
        prop_assume!(grid.is_walkable_at(from) && grid.is_walkable_at(to));
        let Ok(route) = routes.find_route(from, to) else {
            return Ok(());
        };
        let blocked: Vec<Cell> = all_cells(grid).filter(|c| !grid.is_walkable(*c)).collect();
        for pair in route.waypoints.windows(2) {
            for cell in &blocked {
                let (lo, hi) = grid.cell_rect(*cell);
                prop_assert!(
                    !crosses_interior(pair[0], pair[1], lo, hi),
                    "{:?} -> {:?} crosses blocked {:?}", pair[0], pair[1], cell
                );
            }
        }
    }
}

#[test]
fn smoothing_does_not_clip_a_blocked_corner() {
    // Pillar filling cell (5, 5) exactly; the straight line from the start to
    // the goal nicks its lower-left corner.
    let pillar = Aabb::new(Vec3::new(5.2, 0.0, 5.2), Vec3::new(5.8, 2.0, 5.8));
    let mut grid = NavGrid::new(Vec2::ZERO, Vec2::splat(10.0), 1.0, 0.0, SLICE_LOW, SLICE_HIGH);
    grid.rebuild(&[pillar]);
    let routes = RouteBuilder::new(grid, &NavigationConfig::default());
    let from = Vec3::new(1.5, 0.0, 8.54);
    let to = Vec3::new(9.54, 0.0, 0.5);
    assert!(!routes.grid().segment_clear(from, to));

    let route = routes.find_route(from, to).expect("open around the pillar");
    let (lo, hi) = routes.grid().cell_rect(Cell::new(5, 5));
    for pair in route.waypoints.windows(2) {
        assert!(!crosses_interior(pair[0], pair[1], lo, hi), "{:?} -> {:?}", pair[0], pair[1]);
    }
}

#[test]
fn start_equal_to_goal_is_a_single_node() {
    let grid = grid_with(10.0, &[]);
    let cell = Cell::new(4, 4);
    assert_eq!(find_path(&grid, cell, cell, &SearchSettings::default()), Ok(vec![cell]));
}

#[test]
fn enclosed_goal_is_unreachable() {
    // Four walls around cell (10, 10) leave it walkable but sealed.
    let walls = [
        Aabb::new(Vec3::new(8.0, 0.0, 8.0), Vec3::new(13.0, 2.0, 9.0)),
        Aabb::new(Vec3::new(8.0, 0.0, 12.0), Vec3::new(13.0, 2.0, 13.0)),
        Aabb::new(Vec3::new(8.0, 0.0, 8.0), Vec3::new(9.0, 2.0, 13.0)),
        Aabb::new(Vec3::new(12.0, 0.0, 8.0), Vec3::new(13.0, 2.0, 13.0)),
    ];
    let grid = grid_with(20.0, &walls);
    let goal = Cell::new(10, 10);
    assert!(grid.is_walkable(goal));
    let result = find_path(&grid, Cell::new(1, 1), goal, &SearchSettings::default());
    assert_eq!(result, Err(PathfindingError::Unreachable));
}

#[test]
fn expansion_cap_is_reported() {
    let grid = grid_with(20.0, &[]);
    let settings = SearchSettings { max_expansions: 5, ..SearchSettings::default() };
    let result = find_path(&grid, Cell::new(0, 0), Cell::new(19, 19), &settings);
    assert!(matches!(result, Err(PathfindingError::ExpansionBudgetExceeded(_))));
}

#[test]
fn open_grid_route_runs_straight_along_x() {
    let routes = routes_with(10.0, &[]);
    let grid = routes.grid();
    let path = find_path(grid, Cell::new(0, 0), Cell::new(9, 0), &SearchSettings::default()).expect("open grid");
    for pair in path.windows(2) {
        assert!(pair[1].col >= pair[0].col, "path went backwards: {:?}", path);
    }

    let from = grid.cell_center(Cell::new(0, 0), 0.0);
    let to = grid.cell_center(Cell::new(9, 0), 0.0);
    let route = routes.find_route(from, to).expect("open grid");
    assert_eq!(route.destination(), Some(to));
    for pair in route.waypoints.windows(2) {
        assert!(pair[1].x > pair[0].x);
    }
    for point in &route.waypoints {
        assert!((point.z - from.z).abs() < 1e-5, "z deviated at {:?}", point);
    }
}

#[test]
fn separated_regions_are_unreachable() {
    let wall = Aabb::new(Vec3::new(9.5, 0.0, 0.0), Vec3::new(10.5, 3.0, 20.0));
    let routes = routes_with(20.0, &[wall]);
    let result = routes.find_route(Vec3::new(3.0, 0.0, 10.0), Vec3::new(17.0, 0.0, 10.0));
    assert_eq!(result, Err(RouteError::Path(PathfindingError::Unreachable)));
}

#[test]
fn ceiling_geometry_does_not_block_movement() {
    let beam = Aabb::new(Vec3::new(0.0, 2.5, 4.0), Vec3::new(10.0, 3.0, 6.0));
    let grid = grid_with(10.0, &[beam]);
    assert_eq!(grid.walkable_count(), grid.cell_count());
}

#[test]
fn nearest_walkable_respects_the_ring_limit() {
    let block = Aabb::new(Vec3::new(2.0, 0.0, 2.0), Vec3::new(18.0, 2.0, 18.0));
    let grid = grid_with(20.0, &[block]);
    let centre = Vec3::new(10.0, 0.0, 10.0);
    assert!(grid.find_nearest_walkable(centre, 3).is_none());
    let found = grid.find_nearest_walkable(centre, 12).expect("edge band is open");
    assert!(grid.is_walkable(found));

    let routes = routes_with(20.0, &[block]);
    assert_eq!(routes.find_route(Vec3::new(1.0, 0.0, 1.0), centre).map(|_| ()), Err(RouteError::SnapFailed(
        tactical_bots_core::systems::ai::route::Endpoint::Destination
    )));
}
