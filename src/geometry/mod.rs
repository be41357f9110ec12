//! Transition Geometry
//! Pure routing functions for drawing transitions: box/line intersection,
//! fan-out of parallel edges, self-loop paths and arrowheads.
//!
//! Canvas coordinates, y grows downward. Nothing in here holds state, so the
//! same inputs always produce the same route.

use std::f32::consts::PI;

use egui::{vec2, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Size of a normal state box
pub const BOX_SIZE: Vec2 = Vec2::new(100.0, 70.0);
/// Size of the initial pseudo-state disk
pub const DISK_SIZE: Vec2 = Vec2::new(15.0, 15.0);
/// Length of the arrowhead sides
pub const ARROW_SIZE: f32 = 20.0;
/// How far from a transition line a click still hits it
pub const HIT_TOLERANCE: f32 = 5.0;

/// Side of a state box a self-loop is attached to.
///
/// Stored as an integer in diagram files (None=0, North=1, South=2, East=3, West=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Location {
    #[default]
    None,
    North,
    South,
    East,
    West,
}

impl From<u8> for Location {
    fn from(value: u8) -> Self {
        match value {
            1 => Location::North,
            2 => Location::South,
            3 => Location::East,
            4 => Location::West,
            _ => Location::None,
        }
    }
}

impl From<Location> for u8 {
    fn from(location: Location) -> Self {
        match location {
            Location::None => 0,
            Location::North => 1,
            Location::South => 2,
            Location::East => 3,
            Location::West => 4,
        }
    }
}

/// Boundary segment of a state box, clockwise from the top edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    North,
    East,
    South,
    West,
}

/// A drawable transition
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Open polyline, departure first, arrival last
    pub points: Vec<Pos2>,
    /// Tip first, then the two base corners
    pub arrow_head: [Pos2; 3],
    /// Where the label text is anchored
    pub label_anchor: Pos2,
    /// Angle of the final segment, used to orient the arrowhead
    pub angle: f32,
    /// Position among the transitions sharing the same pair of states
    pub rank: usize,
    /// Number of transitions sharing the same pair of states (this one included)
    pub siblings: usize,
}

impl Route {
    /// Arrival point (the arrowhead tip)
    pub fn end(&self) -> Pos2 {
        self.arrow_head[0]
    }

    /// Hit test used for picking a transition on the canvas
    pub fn contains(&self, point: Pos2) -> bool {
        let near_line = self
            .points
            .windows(2)
            .any(|seg| distance_to_segment(point, seg[0], seg[1]) <= HIT_TOLERANCE);
        near_line || triangle_contains(&self.arrow_head, point)
    }
}

/// Bounding box of a state centred on `center`
pub fn state_rect(center: Pos2, is_pseudo: bool) -> Rect {
    let size = if is_pseudo { DISK_SIZE } else { BOX_SIZE };
    Rect::from_center_size(center, size)
}

/// Boundary segments of a box in drawing order
pub fn boundary(rect: Rect) -> [(Side, Pos2, Pos2); 4] {
    [
        (Side::North, rect.left_top(), rect.right_top()),
        (Side::East, rect.right_top(), rect.right_bottom()),
        (Side::South, rect.right_bottom(), rect.left_bottom()),
        (Side::West, rect.left_bottom(), rect.left_top()),
    ]
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Intersection point of segments `a1-a2` and `b1-b2`, if it lies on both
pub fn segment_intersection(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> Option<Pos2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = cross(r, s);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let qp = b1 - a1;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// First side of `target` crossed by the segment `from -> to`, with the crossing point
pub fn first_crossing(from: Pos2, to: Pos2, target: Rect) -> Option<(Side, Pos2)> {
    boundary(target)
        .into_iter()
        .find_map(|(side, p1, p2)| segment_intersection(from, to, p1, p2).map(|p| (side, p)))
}

/// Rank of `key` among `siblings` and the sibling count.
///
/// Siblings are deduplicated and sorted first, so every member of a group of
/// parallel transitions gets a distinct rank whatever order they are queried in.
pub fn rank_among<K: Ord + Copy>(key: K, siblings: &[K]) -> Option<(usize, usize)> {
    let mut sorted = siblings.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let rank = sorted.binary_search(&key).ok()?;
    Some((rank, sorted.len()))
}

/// Offset applied to the `rank`-th of `count` parallel edges, spreading them over a box face
pub fn fan_offset(side: Side, rank: usize, count: usize) -> Vec2 {
    let spread = BOX_SIZE.x;
    let shift = (rank + 1) as f32 * spread / (count + 1) as f32 - spread / 2.0;
    match side {
        Side::North | Side::South => vec2(shift, 0.0),
        Side::East | Side::West => vec2(0.0, shift),
    }
}

/// Angle of the segment seen from `tip` towards `tail`, in the convention used by [`arrow_head`]
pub fn line_angle(tip: Pos2, tail: Pos2) -> Option<f32> {
    let d = tail - tip;
    let length = d.length();
    if length <= f32::EPSILON {
        return None;
    }
    let mut angle = (d.x / length).clamp(-1.0, 1.0).acos();
    if d.y >= 0.0 {
        angle = 2.0 * PI - angle;
    }
    Some(angle)
}

/// Isosceles arrowhead anchored at `tip`, base corners at +/-60 degrees from the line
pub fn arrow_head(tip: Pos2, angle: f32) -> [Pos2; 3] {
    let a = angle + PI / 3.0;
    let b = angle + PI - PI / 3.0;
    [
        tip,
        tip + vec2(a.sin(), a.cos()) * ARROW_SIZE,
        tip + vec2(b.sin(), b.cos()) * ARROW_SIZE,
    ]
}

/// Route a transition between two distinct states.
///
/// Returns `None` when the boxes overlap: there is no sensible line to draw.
pub fn route_edge(source: Rect, destination: Rect, rank: usize, siblings: usize) -> Option<Route> {
    if source.intersects(destination) {
        return None;
    }

    let from = source.center();
    let (side, arrival) = first_crossing(from, destination.center(), destination)?;

    let offset = fan_offset(side, rank, siblings);
    let tip = arrival + offset;
    let tail = from + offset;
    let angle = line_angle(tip, tail)?;

    Some(Route {
        points: vec![tail, tip],
        arrow_head: arrow_head(tip, angle),
        label_anchor: tip + (tail - tip) * 0.5,
        angle,
        rank,
        siblings,
    })
}

/// Route a self-loop on the state centred at `center`. `Location::None` draws it south.
pub fn route_self_loop(center: Pos2, location: Location) -> Route {
    let (w, h) = (BOX_SIZE.x, BOX_SIZE.y);
    let (offsets, angle) = match location {
        Location::East => (
            [vec2(0.0, 0.25 * h), vec2(w, 0.25 * h), vec2(w, -0.25 * h), vec2(0.5 * w, -0.25 * h)],
            0.0,
        ),
        Location::West => (
            [vec2(0.0, 0.25 * h), vec2(-w, 0.25 * h), vec2(-w, -0.25 * h), vec2(-0.5 * w, -0.25 * h)],
            PI,
        ),
        Location::North => (
            [vec2(0.25 * w, 0.0), vec2(0.25 * w, -h), vec2(-0.25 * w, -h), vec2(-0.25 * w, -0.5 * h)],
            PI / 2.0,
        ),
        Location::South | Location::None => (
            [vec2(0.25 * w, 0.0), vec2(0.25 * w, h), vec2(-0.25 * w, h), vec2(-0.25 * w, 0.5 * h)],
            -PI / 2.0,
        ),
    };

    let points: Vec<Pos2> = offsets.iter().map(|o| center + *o).collect();
    let tip = points[3];
    let label_anchor = points[1] + (points[2] - points[1]) * 0.5;

    Route {
        arrow_head: arrow_head(tip, angle),
        points,
        label_anchor,
        angle,
        rank: 0,
        siblings: 1,
    }
}

/// Which quadrant of `rect` contains `point`.
///
/// The box is cut into four triangles by its diagonals; each triangle is
/// named after the side it touches.
pub fn locate(rect: Rect, point: Pos2) -> Location {
    let c = rect.center();
    let quadrants = [
        (Location::North, [c, rect.left_top(), rect.right_top()]),
        (Location::East, [c, rect.right_top(), rect.right_bottom()]),
        (Location::South, [c, rect.right_bottom(), rect.left_bottom()]),
        (Location::West, [c, rect.left_bottom(), rect.left_top()]),
    ];
    quadrants
        .iter()
        .find(|(_, triangle)| triangle_contains(triangle, point))
        .map(|(location, _)| *location)
        .unwrap_or(Location::None)
}

/// Inclusive point-in-triangle test
pub fn triangle_contains(triangle: &[Pos2; 3], p: Pos2) -> bool {
    let [a, b, c] = *triangle;
    let d1 = cross(b - a, p - a);
    let d2 = cross(c - b, p - b);
    let d3 = cross(a - c, p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Euclidean distance from `p` to the segment `a-b`
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
