//! End-to-end isochrone scenarios over in-memory tiles.

mod common;

use common::{GraphBuilder, mode_costing, open_node_filter, pedestrian_filter};
use geo::Point;
use isovia::algo::Isochrone;
use isovia::costing::TravelMode;
use isovia::geometry::distance;
use isovia::model::{EdgeUse, Location, PathLocation, access};
use isovia::routing::search;

/// 17x17 lattice of streets with 111 m spacing and diagonals, centered on
/// (0.05, 0.05).
fn lattice_graph() -> common::TestGraph {
    let mut builder = GraphBuilder::new();
    let n = 17usize;
    let spacing = 0.001;
    let base = 0.05 - spacing * (n as f64 - 1.0) / 2.0;

    let mut nodes = vec![vec![0usize; n]; n];
    for (row, row_nodes) in nodes.iter_mut().enumerate() {
        for (col, node) in row_nodes.iter_mut().enumerate() {
            *node = builder.node(base + col as f64 * spacing, base + row as f64 * spacing);
        }
    }
    for row in 0..n {
        for col in 0..n {
            if col + 1 < n {
                builder.connect(nodes[row][col], nodes[row][col + 1]);
            }
            if row + 1 < n {
                builder.connect(nodes[row][col], nodes[row + 1][col]);
            }
            if row + 1 < n && col + 1 < n {
                builder.connect(nodes[row][col], nodes[row + 1][col + 1]);
                builder.connect(nodes[row][col + 1], nodes[row + 1][col]);
            }
        }
    }
    builder.build()
}

fn correlate(graph: &common::TestGraph, location: Location) -> PathLocation {
    let results = search(
        std::slice::from_ref(&location),
        &graph.tiles,
        pedestrian_filter,
        open_node_filter,
    );
    results.get(&location).expect("location correlates").clone()
}

#[test]
fn forward_isochrone_covers_a_disc() {
    let graph = lattice_graph();
    let origin = Point::new(0.05, 0.05);
    let mut origins = vec![correlate(&graph, Location::new(origin.x(), origin.y()))];

    let max_minutes = 10;
    let costing = mode_costing();
    let mut isochrone = Isochrone::new();
    let grid = isochrone.compute(
        &mut origins,
        max_minutes,
        &graph.tiles,
        &costing,
        TravelMode::Pedestrian,
    );

    // 10 minutes at 5 km/h.
    let radius = f64::from(max_minutes) * 60.0 * (5000.0 / 3600.0);
    let mut reachable_checked = 0;
    let mut unreachable_checked = 0;
    for cell in 0..grid.data().len() {
        let d = distance(grid.cell_center(cell), origin);
        let value = grid.value(cell);
        if d < radius * 0.6 {
            assert!(
                value <= max_minutes as f32,
                "cell at {d:.0} m has {value} min"
            );
            reachable_checked += 1;
        } else if d > radius * 1.5 {
            assert_eq!(value, f32::INFINITY, "cell at {d:.0} m is reachable");
            unreachable_checked += 1;
        }
    }
    assert!(reachable_checked > 10);
    assert!(unreachable_checked > 10);

    // Every write was a set-if-less: nothing below zero, nothing between
    // zero and infinity that is not a real time.
    assert!(grid.data().iter().all(|&v| v >= 0.0));
}

#[test]
fn reverse_isochrone_reaches_back_along_the_line() {
    let mut builder = GraphBuilder::new();
    let a = builder.node(0.01, 0.01);
    let b = builder.node(0.011, 0.01);
    let c = builder.node(0.012, 0.01);
    builder.connect(a, b);
    builder.connect(b, c);
    let graph = builder.build();

    let destination = Point::new(0.012, 0.01);
    let mut destinations = vec![correlate(&graph, Location::new(destination.x(), destination.y()))];

    let costing = mode_costing();
    let mut isochrone = Isochrone::new();
    let grid = isochrone.compute_reverse(
        &mut destinations,
        10,
        &graph.tiles,
        &costing,
        TravelMode::Pedestrian,
    );

    let dest_cell = grid.cell(destination).expect("destination is on the grid");
    assert_eq!(grid.value(dest_cell), 0.0);

    // Node `a` is 222 m upstream, under four minutes on foot.
    let start_cell = grid.cell(Point::new(0.01, 0.01)).expect("start is on the grid");
    let value = grid.value(start_cell);
    assert!(value.is_finite());
    assert!(value <= 4.0, "start reached in {value} min");
}

/// Pedestrian + scheduled bus: a stop by the origin, a 2.2 km line no
/// pedestrian edge parallels, and a street on the far side.
fn transit_graph() -> (common::TestGraph, Point<f64>) {
    let mut builder = GraphBuilder::new();
    let s = builder.node(0.05, 0.05);
    let stop_a = builder.stop(0.05, 0.051);
    let stop_b = builder.stop(0.05, 0.071);
    let street = builder.node(0.05, 0.072);
    builder.connect_with(s, stop_a, EdgeUse::TransitConnection, 0, access::ALL);
    builder.connect_with(stop_a, stop_b, EdgeUse::Bus, 7, access::BUS);
    builder.connect_with(stop_b, street, EdgeUse::TransitConnection, 0, access::ALL);
    // 08:05 departure, two-minute ride.
    builder.departure(7, 1, 8 * 3600 + 5 * 60, 120);
    builder.route(1, "op-metro");
    (builder.build(), Point::new(0.05, 0.072))
}

#[test]
fn multimodal_isochrone_rides_the_bus() {
    let (graph, far_street) = transit_graph();

    let mut location = Location::new(0.05, 0.0505);
    location.date_time = Some("2014-01-06T08:00".to_string());
    let mut origins = vec![correlate(&graph, location)];

    let costing = mode_costing();
    let mut isochrone = Isochrone::new();
    let grid = isochrone.compute_multimodal(
        &mut origins,
        15,
        &graph.tiles,
        &costing,
        TravelMode::Pedestrian,
    );

    // 2.3 km away, half an hour on foot, but the bus makes it in well under
    // the budget: walk + wait + ride + walk is about nine minutes.
    let cell = grid.cell(far_street).expect("far street is on the grid");
    let value = grid.value(cell);
    assert!(value.is_finite(), "far street not reached");
    assert!(value > 5.0 && value <= 15.0, "reached in {value} min");
}

#[test]
fn multimodal_without_date_time_returns_an_empty_grid() {
    let (graph, _) = transit_graph();

    let mut origins = vec![correlate(&graph, Location::new(0.05, 0.0505))];

    let costing = mode_costing();
    let mut isochrone = Isochrone::new();
    let grid = isochrone.compute_multimodal(
        &mut origins,
        15,
        &graph.tiles,
        &costing,
        TravelMode::Pedestrian,
    );

    assert!(!grid.data().is_empty());
    assert!(grid.data().iter().all(|&v| v == f32::INFINITY));
}
