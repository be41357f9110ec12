//! Unit tests for the transition geometry

use std::f32::consts::PI;

use egui::{pos2, Pos2};
use float_cmp::approx_eq;

use crate::geometry::{
    arrow_head, distance_to_segment, first_crossing, locate, rank_among, route_edge,
    route_self_loop, segment_intersection, state_rect, Location, Side, BOX_SIZE,
};

fn assert_pos_eq(actual: Pos2, expected: Pos2) {
    assert!(
        approx_eq!(f32, actual.x, expected.x, epsilon = 1e-3)
            && approx_eq!(f32, actual.y, expected.y, epsilon = 1e-3),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn test_segment_intersection_bounded() {
    let p = segment_intersection(pos2(0.0, 0.0), pos2(10.0, 10.0), pos2(0.0, 10.0), pos2(10.0, 0.0));
    assert_pos_eq(p.unwrap(), pos2(5.0, 5.0));

    // Lines would meet, but beyond the end of the first segment
    let p = segment_intersection(pos2(0.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 10.0), pos2(10.0, 0.0));
    assert!(p.is_none());

    // Parallel
    let p = segment_intersection(pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(0.0, 1.0), pos2(10.0, 1.0));
    assert!(p.is_none());
}

#[test]
fn test_first_crossing_finds_arrival_side() {
    let target = state_rect(pos2(200.0, 0.0), false);
    let (side, point) = first_crossing(pos2(0.0, 0.0), pos2(200.0, 0.0), target).unwrap();
    assert_eq!(side, Side::West);
    assert_pos_eq(point, pos2(150.0, 0.0));

    let target = state_rect(pos2(0.0, 300.0), false);
    let (side, point) = first_crossing(pos2(0.0, 0.0), pos2(0.0, 300.0), target).unwrap();
    assert_eq!(side, Side::North);
    assert_pos_eq(point, pos2(0.0, 265.0));
}

#[test]
fn test_route_edge_single() {
    let src = state_rect(pos2(0.0, 0.0), false);
    let dst = state_rect(pos2(200.0, 0.0), false);
    let route = route_edge(src, dst, 0, 1).expect("boxes do not overlap");

    assert_eq!(route.points.len(), 2);
    assert_pos_eq(route.points[0], pos2(0.0, 0.0));
    assert_pos_eq(route.end(), pos2(150.0, 0.0));
    assert_pos_eq(route.label_anchor, pos2(75.0, 0.0));
    assert!(approx_eq!(f32, route.angle, PI, epsilon = 1e-5));

    // Base of the arrowhead sits behind the tip, towards the source
    assert!(route.arrow_head[1].x < 150.0);
    assert!(route.arrow_head[2].x < 150.0);
    assert!(approx_eq!(f32, route.arrow_head[1].y, -route.arrow_head[2].y, epsilon = 1e-3));
}

#[test]
fn test_route_edge_overlapping_boxes() {
    let src = state_rect(pos2(0.0, 0.0), false);
    let dst = state_rect(pos2(50.0, 10.0), false);
    assert!(route_edge(src, dst, 0, 1).is_none());
}

#[test]
fn test_route_edge_parallel_fan_out() {
    let src = state_rect(pos2(0.0, 0.0), false);
    let dst = state_rect(pos2(200.0, 0.0), false);
    let first = route_edge(src, dst, 0, 2).unwrap();
    let second = route_edge(src, dst, 1, 2).unwrap();

    // Arrival on the west face: parallel edges are shifted vertically
    let shift = BOX_SIZE.x / 3.0 - BOX_SIZE.x / 2.0;
    assert_pos_eq(first.end(), pos2(150.0, shift));
    assert_pos_eq(second.end(), pos2(150.0, -shift));
    assert!(first.points.iter().zip(&second.points).all(|(a, b)| a != b));
}

#[test]
fn test_route_edge_reverse_direction_shares_face_offsets() {
    let a = state_rect(pos2(0.0, 0.0), false);
    let b = state_rect(pos2(0.0, 300.0), false);
    let down = route_edge(a, b, 0, 2).unwrap();
    let up = route_edge(b, a, 1, 2).unwrap();

    // Top/bottom faces: horizontal offsets, and the two edges never coincide
    assert!(approx_eq!(f32, down.end().y, 265.0, epsilon = 1e-3));
    assert!(approx_eq!(f32, up.end().y, 35.0, epsilon = 1e-3));
    assert!((down.end().x - up.end().x).abs() > 1.0);
}

#[test]
fn test_rank_among_dedups_and_sorts() {
    assert_eq!(rank_among(5, &[7, 5, 5, 3]), Some((1, 3)));
    assert_eq!(rank_among(3, &[7, 5, 3]), Some((0, 3)));
    assert_eq!(rank_among(4, &[7, 5, 3]), None);
}

#[test]
fn test_self_loop_east_west_mirrored() {
    let c = pos2(100.0, 100.0);
    let east = route_self_loop(c, Location::East);
    let west = route_self_loop(c, Location::West);

    assert_eq!(east.points.len(), 4);
    assert_eq!(west.points.len(), 4);
    for (e, w) in east.points.iter().zip(&west.points) {
        assert!(approx_eq!(f32, e.x - c.x, -(w.x - c.x), epsilon = 1e-4));
        assert!(approx_eq!(f32, e.y, w.y, epsilon = 1e-4));
    }
    assert!(east.points[1..].iter().all(|p| p.x > c.x));
    assert!(west.points[1..].iter().all(|p| p.x < c.x));
    assert!(approx_eq!(f32, east.angle, 0.0, epsilon = 1e-6));
    assert!(approx_eq!(f32, west.angle, PI, epsilon = 1e-6));
}

#[test]
fn test_self_loop_default_is_south() {
    let c = pos2(0.0, 0.0);
    assert_eq!(route_self_loop(c, Location::None), route_self_loop(c, Location::South));

    let north = route_self_loop(c, Location::North);
    assert_pos_eq(north.end(), pos2(-0.25 * BOX_SIZE.x, -0.5 * BOX_SIZE.y));
    assert_pos_eq(north.label_anchor, pos2(0.0, -BOX_SIZE.y));
    assert!(approx_eq!(f32, north.angle, PI / 2.0, epsilon = 1e-6));
}

#[test]
fn test_arrow_head_points_back_along_line() {
    // Line arriving from the left: base corners are to the left of the tip
    let head = arrow_head(pos2(0.0, 0.0), PI);
    assert!(head[1].x < 0.0 && head[2].x < 0.0);
    assert!(approx_eq!(f32, head[1].distance(head[0]), 20.0, epsilon = 1e-3));
    assert!(approx_eq!(f32, head[2].distance(head[0]), 20.0, epsilon = 1e-3));
}

#[test]
fn test_locate_quadrants() {
    let rect = state_rect(pos2(0.0, 0.0), false);
    assert_eq!(locate(rect, pos2(0.0, -30.0)), Location::North);
    assert_eq!(locate(rect, pos2(45.0, 0.0)), Location::East);
    assert_eq!(locate(rect, pos2(0.0, 30.0)), Location::South);
    assert_eq!(locate(rect, pos2(-45.0, 0.0)), Location::West);
    assert_eq!(locate(rect, pos2(500.0, 500.0)), Location::None);
}

#[test]
fn test_location_integer_encoding() {
    for (n, location) in [
        (0u8, Location::None),
        (1, Location::North),
        (2, Location::South),
        (3, Location::East),
        (4, Location::West),
    ] {
        assert_eq!(Location::from(n), location);
        assert_eq!(u8::from(location), n);
    }
    assert_eq!(Location::from(9), Location::None);
}

#[test]
fn test_route_hit_test() {
    let src = state_rect(pos2(0.0, 0.0), false);
    let dst = state_rect(pos2(200.0, 0.0), false);
    let route = route_edge(src, dst, 0, 1).unwrap();
    assert!(route.contains(pos2(100.0, 3.0)));
    assert!(!route.contains(pos2(100.0, 30.0)));
    assert!(approx_eq!(
        f32,
        distance_to_segment(pos2(5.0, 5.0), pos2(0.0, 0.0), pos2(10.0, 0.0)),
        5.0,
        epsilon = 1e-5
    ));
}
