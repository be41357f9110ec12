//! Unit tests for JSON persistence

use egui::pos2;
use proptest::prelude::*;
use serde_json::Value;

use crate::diagram::{Diagram, PSEUDO_ID};
use crate::error::DiagramError;
use crate::geometry::Location;
use crate::persist::{from_text, to_text, DiagramFile};

#[test]
fn test_to_text_shape() {
    let mut diagram = Diagram::new();
    let s0 = diagram.add_state(pos2(0.0, 0.0), Some("s0")).unwrap();
    let s1 = diagram.add_state(pos2(100.0, 0.0), Some("s1")).unwrap();
    diagram.add_transition(s0, s1, "a/x", Location::None).unwrap();

    let json: Value = serde_json::from_str(&to_text(&diagram).unwrap()).unwrap();
    assert_eq!(json["states"].as_array().unwrap().len(), 2);
    assert_eq!(json["transitions"].as_array().unwrap().len(), 1);

    let t = &json["transitions"][0];
    assert_eq!(t["src_state"], "s0");
    assert_eq!(t["dst_state"], "s1");
    assert_eq!(t["label"], "a/x");
    assert_eq!(t["location"], 0);
    assert_eq!(json["states"][1]["x"], 100.0);
}

#[test]
fn test_unknown_state_reference_is_malformed() {
    let text = r#"{"states":[{"id":"a","x":0,"y":0}],"transitions":[{"src_state":"a","dst_state":"z","label":"","location":0}]}"#;
    assert!(matches!(from_text(text), Err(DiagramError::MalformedDiagram(_))));
}

#[test]
fn test_not_json_is_parse_error() {
    assert!(matches!(from_text("{states: nope"), Err(DiagramError::Parse(_))));
    assert!(matches!(from_text(r#"{"states":[]}"#), Err(DiagramError::Parse(_))));
}

#[test]
fn test_load_pseudo_state_and_locations() {
    let text = r#"{
        "states": [
            {"id": "_init", "x": 10, "y": -100},
            {"id": "idle", "x": 0, "y": 0},
            {"id": "busy", "x": 300, "y": 0}
        ],
        "transitions": [
            {"src_state": "_init", "dst_state": "idle", "label": "", "location": 0},
            {"src_state": "idle", "dst_state": "busy", "label": "start/run", "location": 0},
            {"src_state": "busy", "dst_state": "busy", "label": "tick", "location": 3},
            {"src_state": "busy", "dst_state": "idle", "label": "", "location": 42}
        ]
    }"#;
    let diagram = from_text(text).unwrap();

    assert_eq!(diagram.state_count(), 3);
    let pseudo = diagram.pseudo_state().unwrap();
    assert_eq!(diagram.state(pseudo).unwrap().id(), PSEUDO_ID);
    assert_eq!(diagram.state(pseudo).unwrap().position(), pos2(10.0, -100.0));
    assert_eq!(diagram.initial_state(), diagram.find_state("idle"));

    let locations: Vec<Location> = diagram.transitions().map(|(_, t)| t.location()).collect();
    assert_eq!(
        locations,
        vec![Location::None, Location::None, Location::East, Location::None]
    );
}

#[test]
fn test_load_resets_id_counter() {
    let text = r#"{"states":[{"id":"a","x":0,"y":0},{"id":"b","x":200,"y":0}],"transitions":[]}"#;
    let mut diagram = from_text(text).unwrap();
    let key = diagram.add_state(pos2(0.0, 300.0), None).unwrap();
    assert_eq!(diagram.state(key).unwrap().id(), "2");
}

#[test]
fn test_load_rejects_structural_violations() {
    let duplicate = r#"{"states":[{"id":"a","x":0,"y":0},{"id":"a","x":1,"y":1}],"transitions":[]}"#;
    assert!(matches!(from_text(duplicate), Err(DiagramError::MalformedDiagram(_))));

    let two_pseudo = r#"{"states":[{"id":"_init","x":0,"y":0},{"id":"_init","x":1,"y":1}],"transitions":[]}"#;
    assert!(matches!(from_text(two_pseudo), Err(DiagramError::MalformedDiagram(_))));

    let into_pseudo = r#"{"states":[{"id":"_init","x":0,"y":0},{"id":"a","x":200,"y":0}],
        "transitions":[{"src_state":"a","dst_state":"_init","label":"","location":0}]}"#;
    assert!(matches!(from_text(into_pseudo), Err(DiagramError::MalformedDiagram(_))));
}

#[test]
fn test_out_of_range_position_is_malformed() {
    // 1e39 is a valid JSON number but overflows f32 and could not be saved again
    let text = r#"{"states":[{"id":"a","x":1e39,"y":0.1}],"transitions":[]}"#;
    assert!(matches!(from_text(text), Err(DiagramError::MalformedDiagram(_))));

    let text = r#"{"states":[{"id":"a","x":0.0,"y":-1e300}],"transitions":[]}"#;
    assert!(matches!(from_text(text), Err(DiagramError::MalformedDiagram(_))));

    // Large values that still fit survive a save and reload
    let text = r#"{"states":[{"id":"a","x":1e30,"y":-2.5}],"transitions":[]}"#;
    let diagram = from_text(text).unwrap();
    let reloaded = from_text(&to_text(&diagram).unwrap()).unwrap();
    let (_, state) = reloaded.states().next().unwrap();
    assert_eq!(state.position(), pos2(1e30, -2.5));
}

#[test]
fn test_failed_load_keeps_current_diagram() {
    let mut diagram = Diagram::new();
    diagram.add_state(pos2(0.0, 0.0), Some("keep")).unwrap();

    let bad = r#"{"states":[{"id":"a","x":0,"y":0}],"transitions":[{"src_state":"a","dst_state":"z","label":"","location":0}]}"#;
    assert!(diagram.load_text(bad).is_err());
    assert_eq!(diagram.state_count(), 1);
    assert!(diagram.find_state("keep").is_some());

    diagram.load_text(r#"{"states":[],"transitions":[]}"#).unwrap();
    assert!(diagram.is_empty());
}

#[test]
fn test_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("fsdedit-persist-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("diagram.fsd");

    let mut diagram = Diagram::new();
    let a = diagram.add_state(pos2(0.0, 0.0), Some("a")).unwrap();
    diagram.add_transition(a, a, "again", Location::West).unwrap();
    super::save_file(&diagram, &path).unwrap();

    let loaded = super::load_file(&path).unwrap();
    assert_eq!(DiagramFile::from_diagram(&loaded), DiagramFile::from_diagram(&diagram));
    std::fs::remove_dir_all(&dir).unwrap();

    assert!(matches!(super::load_file(&path), Err(DiagramError::Io(_))));
}

/// A random but valid diagram built through the model operations
fn arb_diagram() -> impl Strategy<Value = Diagram> {
    (
        prop::collection::vec((-500i32..500, -500i32..500), 1..8),
        prop::collection::vec((0usize..8, 0usize..8, "[a-z/]{0,6}", 0u8..5), 0..12),
        prop::option::of(0usize..8),
    )
        .prop_map(|(positions, edges, initial)| {
            let mut diagram = Diagram::new();
            let keys: Vec<_> = positions
                .iter()
                .map(|&(x, y)| diagram.add_state(pos2(x as f32, y as f32), None).unwrap())
                .collect();
            for (src, dst, label, location) in edges {
                let (src, dst) = (keys[src % keys.len()], keys[dst % keys.len()]);
                let location = if src == dst { Location::from(location) } else { Location::None };
                diagram.add_transition(src, dst, label, location).unwrap();
            }
            if let Some(target) = initial {
                let pseudo = diagram.add_pseudo_state(pos2(0.0, -900.0)).unwrap();
                diagram
                    .add_transition(pseudo, keys[target % keys.len()], "", Location::None)
                    .unwrap();
            }
            diagram
        })
}

proptest! {
    #[test]
    fn prop_text_round_trip(diagram in arb_diagram()) {
        let text = to_text(&diagram).unwrap();
        let loaded = from_text(&text).unwrap();
        prop_assert_eq!(DiagramFile::from_diagram(&loaded), DiagramFile::from_diagram(&diagram));
        prop_assert_eq!(loaded.initial_state().is_some(), diagram.initial_state().is_some());
        prop_assert_eq!(to_text(&loaded).unwrap(), text);
    }
}
