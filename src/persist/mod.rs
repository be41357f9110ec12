//! Diagram Persistence
//! JSON text format for saving and loading diagrams.
//!
//! ```json
//! { "states": [{"id": "s0", "x": 0.0, "y": 0.0}],
//!   "transitions": [{"src_state": "_init", "dst_state": "s0", "label": "", "location": 0}] }
//! ```

use std::collections::HashMap;
use std::path::Path;

use egui::pos2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::diagram::{Diagram, StateKey, PSEUDO_ID};
use crate::error::{DiagramError, DiagramResult};
use crate::geometry::Location;

#[cfg(test)]
mod tests;

/// On-disk representation of a diagram
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramFile {
    pub states: Vec<StateRecord>,
    pub transitions: Vec<TransitionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// State id; the pseudo-state is stored as `_init`
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub src_state: String,
    pub dst_state: String,
    pub label: String,
    /// Self-loop side, as an integer 0-4
    pub location: Location,
}

impl DiagramFile {
    /// Snapshot a diagram, states and transitions in creation order
    pub fn from_diagram(diagram: &Diagram) -> Self {
        let id_of = |key: StateKey| {
            diagram
                .state(key)
                .map(|s| s.id().to_string())
                .unwrap_or_default()
        };

        let states = diagram
            .states()
            .map(|(_, s)| StateRecord {
                id: s.id().to_string(),
                x: f64::from(s.position().x),
                y: f64::from(s.position().y),
            })
            .collect();

        let transitions = diagram
            .transitions()
            .map(|(_, t)| TransitionRecord {
                src_state: id_of(t.source()),
                dst_state: id_of(t.destination()),
                label: t.label().to_string(),
                location: t.location(),
            })
            .collect();

        Self { states, transitions }
    }

    /// Rebuild a diagram through the model operations, so every invariant is enforced
    pub fn into_diagram(self) -> DiagramResult<Diagram> {
        let malformed = |e: DiagramError| DiagramError::MalformedDiagram(e.to_string());

        let mut diagram = Diagram::new();
        let mut keys: HashMap<String, StateKey> = HashMap::new();

        for record in &self.states {
            let position = pos2(record.x as f32, record.y as f32);
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err(DiagramError::MalformedDiagram(format!(
                    "state '{}' has an out-of-range position ({}, {})",
                    record.id, record.x, record.y
                )));
            }
            let key = if record.id == PSEUDO_ID {
                diagram.add_pseudo_state(position)
            } else {
                diagram.add_state(position, Some(&record.id))
            }
            .map_err(malformed)?;
            keys.insert(record.id.clone(), key);
        }

        for record in self.transitions {
            let lookup = |id: &str| {
                keys.get(id)
                    .copied()
                    .ok_or_else(|| DiagramError::MalformedDiagram(format!("unknown state id '{}'", id)))
            };
            let source = lookup(&record.src_state)?;
            let destination = lookup(&record.dst_state)?;
            diagram
                .add_transition(source, destination, record.label, record.location)
                .map_err(malformed)?;
        }

        diagram.reset_id_counter(self.states.len());
        diagram.check_invariants().map_err(malformed)?;
        Ok(diagram)
    }
}

/// Serialise a diagram to its JSON text form
pub fn to_text(diagram: &Diagram) -> DiagramResult<String> {
    Ok(serde_json::to_string_pretty(&DiagramFile::from_diagram(diagram))?)
}

/// Parse JSON text into a fresh diagram
pub fn from_text(text: &str) -> DiagramResult<Diagram> {
    let file: DiagramFile = serde_json::from_str(text)?;
    file.into_diagram()
}

pub fn load_file(path: &Path) -> DiagramResult<Diagram> {
    let text = std::fs::read_to_string(path)?;
    let diagram = from_text(&text)?;
    info!(
        "Loaded {} ({} states, {} transitions)",
        path.display(),
        diagram.state_count(),
        diagram.transition_count()
    );
    Ok(diagram)
}

pub fn save_file(diagram: &Diagram, path: &Path) -> DiagramResult<()> {
    std::fs::write(path, to_text(diagram)?)?;
    info!("Saved {}", path.display());
    Ok(())
}

impl Diagram {
    /// Replace this diagram with the one described by `text`.
    ///
    /// On failure the current diagram is left exactly as it was.
    pub fn load_text(&mut self, text: &str) -> DiagramResult<()> {
        *self = from_text(text)?;
        Ok(())
    }

    pub fn to_text(&self) -> DiagramResult<String> {
        to_text(self)
    }
}
