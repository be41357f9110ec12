//! Edit-Mode State Machine
//! Turns pointer gestures on the canvas into diagram mutations.
//!
//! The editor state is the current [`Mode`] (chosen from the toolbar) plus the
//! [`Gesture`] in progress. [`step`] consumes one pointer event and returns the
//! next gesture, mutating the diagram and collecting [`Notification`]s for the
//! surrounding application.

use egui::{Pos2, Vec2};
use log::{debug, warn};

use crate::diagram::{Diagram, Item, StateKey};
use crate::error::{DiagramError, DiagramResult};
use crate::geometry::{self, Location};


/// Editing tool selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    InsertState,
    InsertPseudoState,
    InsertTransition,
    InsertLoopTransition,
    Delete,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Select,
        Mode::InsertState,
        Mode::InsertPseudoState,
        Mode::InsertTransition,
        Mode::InsertLoopTransition,
        Mode::Delete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Select => "Select",
            Mode::InsertState => "State",
            Mode::InsertPseudoState => "Initial transition",
            Mode::InsertTransition => "Transition",
            Mode::InsertLoopTransition => "Self transition",
            Mode::Delete => "Delete",
        }
    }
}

/// Primary-button pointer events in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
}

/// Gesture in progress between a pointer-down and the matching pointer-up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Line being drawn to create a transition. `pending` is the pseudo-state
    /// created by the pointer-down, removed again if the line leads nowhere.
    RubberBand {
        start: Pos2,
        end: Pos2,
        pending: Option<StateKey>,
    },
    /// A state being dragged; `grab` is the pointer offset from its centre
    Dragging { state: StateKey, grab: Vec2 },
}

/// What the application should hear about after an event
#[derive(Debug)]
pub enum Notification {
    /// The diagram changed and has unsaved modifications
    Modified,
    /// An item was picked in select mode
    Selected(Item),
    /// A gesture was refused; shown to the user, nothing changed
    Warning(DiagramError),
}

#[derive(Debug, Default)]
pub struct Editor {
    mode: Mode,
    gesture: Gesture,
    selection: Option<Item>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn selection(&self) -> Option<Item> {
        self.selection
    }

    /// Line to draw while a transition is being dragged out
    pub fn rubber_band(&self) -> Option<(Pos2, Pos2)> {
        match self.gesture {
            Gesture::RubberBand { start, end, .. } => Some((start, end)),
            _ => None,
        }
    }

    /// Switch tool. An unfinished gesture is abandoned.
    pub fn set_mode(&mut self, mode: Mode, diagram: &mut Diagram) -> Vec<Notification> {
        let notifications = self.cancel_gesture(diagram);
        debug!("Mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        notifications
    }

    /// Abandon the current gesture, rolling back a pseudo-state it created
    pub fn cancel_gesture(&mut self, diagram: &mut Diagram) -> Vec<Notification> {
        let mut out = Vec::new();
        if let Gesture::RubberBand {
            pending: Some(pseudo),
            ..
        } = std::mem::take(&mut self.gesture)
        {
            report(diagram.remove_state(pseudo), &mut out);
        }
        out
    }

    /// Forget the selection if it no longer exists (e.g. after a load)
    pub fn sync_selection(&mut self, diagram: &Diagram) {
        let exists = match self.selection {
            Some(Item::State(key)) => diagram.state(key).is_some(),
            Some(Item::Transition(key)) => diagram.transition(key).is_some(),
            None => true,
        };
        if !exists {
            self.selection = None;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Feed one pointer event through the state machine
    pub fn handle(&mut self, diagram: &mut Diagram, event: PointerEvent) -> Vec<Notification> {
        let mut out = Vec::new();
        self.gesture = step(self.mode, self.gesture, event, diagram, &mut out);

        if self.mode == Mode::Select && matches!(event, PointerEvent::Down(_)) {
            self.selection = out.iter().find_map(|n| match n {
                Notification::Selected(item) => Some(*item),
                _ => None,
            });
        }
        self.sync_selection(diagram);
        out
    }
}

/// Record the outcome of a mutation
fn report<T>(result: DiagramResult<T>, out: &mut Vec<Notification>) -> Option<T> {
    match result {
        Ok(value) => {
            out.push(Notification::Modified);
            Some(value)
        }
        Err(e) => {
            warn!("{}", e);
            out.push(Notification::Warning(e));
            None
        }
    }
}

/// The transition function: `(mode, gesture, event) -> gesture`, with diagram edits as effects
pub fn step(
    mode: Mode,
    gesture: Gesture,
    event: PointerEvent,
    diagram: &mut Diagram,
    out: &mut Vec<Notification>,
) -> Gesture {
    // A press while a rubber band is still open means its release was lost
    let gesture = match (event, gesture) {
        (PointerEvent::Down(_), Gesture::RubberBand { pending, .. }) => {
            if let Some(pseudo) = pending {
                report(diagram.remove_state(pseudo), out);
            }
            Gesture::Idle
        }
        (_, gesture) => gesture,
    };

    match (mode, event, gesture) {
        (Mode::InsertState, PointerEvent::Down(p), _) => {
            report(diagram.add_state(p, None), out);
            Gesture::Idle
        }

        (Mode::InsertPseudoState, PointerEvent::Down(p), _) => {
            if diagram.has_pseudo_state() {
                report::<()>(Err(DiagramError::DuplicateInitialTransition), out);
                return Gesture::Idle;
            }
            match report(diagram.add_pseudo_state(p), out) {
                Some(pseudo) => Gesture::RubberBand {
                    start: p,
                    end: p,
                    pending: Some(pseudo),
                },
                None => Gesture::Idle,
            }
        }

        (Mode::InsertTransition, PointerEvent::Down(p), _) => Gesture::RubberBand {
            start: p,
            end: p,
            pending: None,
        },

        (
            Mode::InsertPseudoState | Mode::InsertTransition,
            PointerEvent::Move(p),
            Gesture::RubberBand { start, pending, .. },
        ) => Gesture::RubberBand {
            start,
            end: p,
            pending,
        },

        (
            Mode::InsertPseudoState | Mode::InsertTransition,
            PointerEvent::Up(p),
            Gesture::RubberBand { start, pending, .. },
        ) => {
            finish_rubber_band(start, p, pending, diagram, out);
            Gesture::Idle
        }

        (Mode::InsertLoopTransition, PointerEvent::Down(p), _) => {
            if let Some(key) = diagram.state_at(p) {
                let target = diagram.state(key).filter(|s| !s.is_pseudo()).map(|s| s.rect());
                if let Some(rect) = target {
                    let location = geometry::locate(rect, p);
                    report(diagram.add_transition(key, key, "", location), out);
                }
            }
            Gesture::Idle
        }

        (Mode::Delete, PointerEvent::Down(p), _) => {
            match diagram.item_at(p) {
                Some(Item::Transition(t)) => {
                    report(diagram.remove_transition(t), out);
                }
                Some(Item::State(s)) => {
                    report(diagram.remove_state(s), out);
                }
                None => {}
            }
            Gesture::Idle
        }

        (Mode::Select, PointerEvent::Down(p), _) => match diagram.item_at(p) {
            Some(Item::State(key)) => {
                out.push(Notification::Selected(Item::State(key)));
                let grab = diagram
                    .state(key)
                    .map(|s| p - s.position())
                    .unwrap_or(Vec2::ZERO);
                Gesture::Dragging { state: key, grab }
            }
            Some(item) => {
                out.push(Notification::Selected(item));
                Gesture::Idle
            }
            None => Gesture::Idle,
        },

        (Mode::Select, PointerEvent::Move(p), Gesture::Dragging { state, grab }) => {
            let target = p - grab;
            let moved = diagram
                .state(state)
                .is_some_and(|s| s.position() != target);
            if moved {
                report(diagram.move_state(state, target), out);
            }
            gesture
        }

        (_, PointerEvent::Up(_), _) => Gesture::Idle,

        _ => gesture,
    }
}

/// Resolve the endpoints under both ends of the rubber band and create the transition
fn finish_rubber_band(
    start: Pos2,
    end: Pos2,
    pending: Option<StateKey>,
    diagram: &mut Diagram,
    out: &mut Vec<Notification>,
) {
    let endpoints = match (diagram.state_at(start), diagram.state_at(end)) {
        (Some(src), Some(dst)) if src != dst => Some((src, dst)),
        _ => None,
    };
    let accepted = endpoints.filter(|(src, dst)| {
        let is_pseudo = |k: &StateKey| diagram.state(*k).is_some_and(|s| s.is_pseudo());
        let from_pseudo = is_pseudo(src);
        !is_pseudo(dst) && from_pseudo == pending.is_some()
    });

    if let Some((src, dst)) = accepted {
        if report(diagram.add_transition(src, dst, "", Location::None), out).is_some() {
            return;
        }
    } else {
        debug!("Rubber band from {:?} to {:?} connects nothing, discarded", start, end);
    }

    if let Some(pseudo) = pending {
        report(diagram.remove_state(pseudo), out);
    }
}
