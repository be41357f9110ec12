//! Preview Layout
//! Layered placement of the diagram for the read-only preview window.
//!
//! States are ranked by a breadth-first walk from the initial state; each rank
//! becomes a row (top-to-bottom) or a column (left-to-right). The diagram
//! itself is never touched: the result is a separate [`PreviewLayout`].

use std::collections::{BTreeMap, VecDeque};

use egui::{pos2, vec2, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::diagram::{Diagram, StateKey, TransitionKey};
use crate::dot::preview_label;
use crate::geometry::DISK_SIZE;


/// Graphviz-style distances are given in inches
pub const POINTS_PER_INCH: f32 = 72.0;
/// Diameter of a state circle in the preview
pub const NODE_DIAMETER: f32 = 54.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    TB,
    LR,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    /// Gap between neighbouring states of the same rank
    pub nodesep: f32,
    /// Gap between consecutive ranks
    pub ranksep: f32,
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::TB,
            nodesep: 0.55 * POINTS_PER_INCH,
            ranksep: 0.95 * POINTS_PER_INCH,
            margin: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewNode {
    pub state: StateKey,
    pub id: String,
    pub is_pseudo: bool,
    pub rank: usize,
    pub rect: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewEdge {
    pub transition: TransitionKey,
    /// Clipped to the node outlines; equal for self-loops
    pub start: Pos2,
    pub end: Pos2,
    pub label: String,
    pub label_anchor: Pos2,
    pub is_self_loop: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewLayout {
    pub nodes: Vec<PreviewNode>,
    pub edges: Vec<PreviewEdge>,
    /// Extent of the drawing, margins included
    pub size: Vec2,
}

impl PreviewLayout {
    pub fn node(&self, state: StateKey) -> Option<&PreviewNode> {
        self.nodes.iter().find(|n| n.state == state)
    }
}

/// Rank of every state.
///
/// The pseudo-state (if any) gets rank 0 and the walk starts one rank below
/// it, at the initial state or, without one, at the first state. States the
/// walk never reaches share a final rank.
pub fn ranks(diagram: &Diagram) -> BTreeMap<StateKey, usize> {
    let mut ranks = BTreeMap::new();
    let offset = usize::from(diagram.has_pseudo_state());
    if let Some(pseudo) = diagram.pseudo_state() {
        ranks.insert(pseudo, 0);
    }

    let start = diagram.initial_state().or_else(|| {
        diagram
            .states()
            .find(|(_, s)| !s.is_pseudo())
            .map(|(key, _)| key)
    });

    let mut queue = VecDeque::new();
    if let Some(start) = start {
        ranks.insert(start, offset);
        queue.push_back((start, offset));
    }

    while let Some((state, rank)) = queue.pop_front() {
        for t in diagram.incident_transitions(state) {
            let Some(target) = diagram
                .transition(*t)
                .filter(|tr| tr.source() == state)
                .map(|tr| tr.destination())
            else {
                continue;
            };
            if !ranks.contains_key(&target) {
                ranks.insert(target, rank + 1);
                queue.push_back((target, rank + 1));
            }
        }
    }

    let last = ranks.values().max().map_or(offset, |max| max + 1);
    for (key, _) in diagram.states() {
        ranks.entry(key).or_insert(last);
    }
    ranks
}

/// Place every state and transition for the preview
pub fn layered(diagram: &Diagram, config: &LayoutConfig) -> PreviewLayout {
    let ranks = ranks(diagram);
    let rank_count = ranks.values().max().map_or(0, |max| max + 1);

    let mut rows: Vec<Vec<StateKey>> = vec![Vec::new(); rank_count];
    for (key, rank) in &ranks {
        rows[*rank].push(*key);
    }

    let row_length = |count: usize| {
        count as f32 * NODE_DIAMETER + count.saturating_sub(1) as f32 * config.nodesep
    };
    let widest = rows.iter().map(|row| row_length(row.len())).fold(0.0, f32::max);

    // Positions computed top-to-bottom, swapped afterwards for left-to-right
    let place = |along: f32, across: f32| match config.direction {
        LayoutDirection::TB => pos2(along, across),
        LayoutDirection::LR => pos2(across, along),
    };

    let mut nodes = Vec::new();
    for (rank, row) in rows.iter().enumerate() {
        let first = config.margin + (widest - row_length(row.len())) / 2.0 + NODE_DIAMETER / 2.0;
        let across = config.margin + rank as f32 * (NODE_DIAMETER + config.ranksep) + NODE_DIAMETER / 2.0;
        for (i, key) in row.iter().enumerate() {
            let Some(state) = diagram.state(*key) else {
                continue;
            };
            let center = place(first + i as f32 * (NODE_DIAMETER + config.nodesep), across);
            let size = if state.is_pseudo() {
                DISK_SIZE
            } else {
                Vec2::splat(NODE_DIAMETER)
            };
            nodes.push(PreviewNode {
                state: *key,
                id: state.id().to_string(),
                is_pseudo: state.is_pseudo(),
                rank,
                rect: Rect::from_center_size(center, size),
            });
        }
    }

    let depth = rank_count as f32 * NODE_DIAMETER + rank_count.saturating_sub(1) as f32 * config.ranksep;
    let extent = vec2(widest, depth) + Vec2::splat(2.0 * config.margin);
    let size = match config.direction {
        LayoutDirection::TB => extent,
        LayoutDirection::LR => vec2(extent.y, extent.x),
    };

    let mut layout = PreviewLayout {
        nodes,
        edges: Vec::new(),
        size,
    };
    layout.edges = diagram
        .transitions()
        .filter_map(|(key, t)| {
            let src = layout.node(t.source())?;
            let dst = layout.node(t.destination())?;
            let label = if diagram.is_initial(key) {
                String::new()
            } else {
                preview_label(t.label())
            };
            Some(route_preview_edge(key, src, dst, label, config.direction))
        })
        .collect();
    layout
}

fn route_preview_edge(
    key: TransitionKey,
    src: &PreviewNode,
    dst: &PreviewNode,
    label: String,
    direction: LayoutDirection,
) -> PreviewEdge {
    let (a, b) = (src.rect.center(), dst.rect.center());
    if src.state == dst.state {
        // Loop drawn on the side away from the rank flow
        let radius = src.rect.width() / 2.0;
        let out = match direction {
            LayoutDirection::TB => vec2(1.0, 0.0),
            LayoutDirection::LR => vec2(0.0, 1.0),
        };
        let anchor = a + out * radius;
        return PreviewEdge {
            transition: key,
            start: anchor,
            end: anchor,
            label,
            label_anchor: a + out * (radius * 2.5),
            is_self_loop: true,
        };
    }

    let dir = (b - a).normalized();
    let start = a + dir * (src.rect.width() / 2.0);
    let end = b - dir * (dst.rect.width() / 2.0);
    PreviewEdge {
        transition: key,
        start,
        end,
        label,
        label_anchor: start + (end - start) * 0.5,
        is_self_loop: false,
    }
}
