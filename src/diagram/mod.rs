//! Diagram Data Structures
//! States, transitions and the diagram that owns them.
//!
//! The diagram owns every state and transition. Each state keeps a list of
//! the keys of its incident transitions; those lists never own anything and
//! are kept in step with the transition table by every mutation. A mutation
//! either applies completely or returns an error and leaves the diagram as
//! it was.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use egui::{Pos2, Rect};
use log::debug;

use crate::error::{DiagramError, DiagramResult};
use crate::geometry::{self, Location, Route};


/// Reserved id of the initial pseudo-state
pub const PSEUDO_ID: &str = "_init";

/// Handle to a state. Keys are never reused, so they also give creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(u64);

/// Handle to a transition. Keys are never reused, so they also give creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionKey(u64);

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state #{}", self.0)
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition #{}", self.0)
    }
}

/// Something that can be picked on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    State(StateKey),
    Transition(TransitionKey),
}

/// A state of the diagram
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    id: String,
    position: Pos2,
    is_pseudo: bool,
    /// Incident transitions, each listed once (self-loops included)
    transitions: Vec<TransitionKey>,
}

impl State {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Centre of the state on the canvas
    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn is_pseudo(&self) -> bool {
        self.is_pseudo
    }

    /// Box for normal states, small square around the disk for the pseudo-state
    pub fn rect(&self) -> Rect {
        geometry::state_rect(self.position, self.is_pseudo)
    }

    pub fn transitions(&self) -> &[TransitionKey] {
        &self.transitions
    }
}

/// A transition between two states (possibly the same one)
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    source: StateKey,
    destination: StateKey,
    label: String,
    location: Location,
}

impl Transition {
    pub fn source(&self) -> StateKey {
        self.source
    }

    pub fn destination(&self) -> StateKey {
        self.destination
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Side used when drawing a self-loop
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.destination
    }

    /// `guard` and `action` halves of a `guard/action` label
    pub fn guard_action(&self) -> Option<(&str, &str)> {
        split_label(&self.label)
    }
}

/// Split a label on `/`; only labels with exactly one `/` have a guard and an action
pub fn split_label(label: &str) -> Option<(&str, &str)> {
    let mut parts = label.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(guard), Some(action), None) => Some((guard, action)),
        _ => None,
    }
}

/// A complete state diagram
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    states: BTreeMap<StateKey, State>,
    transitions: BTreeMap<TransitionKey, Transition>,
    /// Geometry of every drawable transition, kept current by each mutation
    routes: BTreeMap<TransitionKey, Route>,
    next_key: u64,
    /// Source of generated state ids; reset only when the diagram is replaced
    id_counter: usize,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, including the id counter
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self, key: StateKey) -> Option<&State> {
        self.states.get(&key)
    }

    pub fn transition(&self, key: TransitionKey) -> Option<&Transition> {
        self.transitions.get(&key)
    }

    /// All states, in creation order
    pub fn states(&self) -> impl Iterator<Item = (StateKey, &State)> {
        self.states.iter().map(|(k, s)| (*k, s))
    }

    /// All transitions, in creation order
    pub fn transitions(&self) -> impl Iterator<Item = (TransitionKey, &Transition)> {
        self.transitions.iter().map(|(k, t)| (*k, t))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Look up a state by id
    pub fn find_state(&self, id: &str) -> Option<StateKey> {
        self.states
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(k, _)| *k)
    }

    pub fn has_pseudo_state(&self) -> bool {
        self.pseudo_state().is_some()
    }

    pub fn pseudo_state(&self) -> Option<StateKey> {
        self.states
            .iter()
            .find(|(_, s)| s.is_pseudo)
            .map(|(k, _)| *k)
    }

    /// The transition leaving the pseudo-state, if any
    pub fn initial_transition(&self) -> Option<TransitionKey> {
        let pseudo = self.states.get(&self.pseudo_state()?)?;
        pseudo.transitions.first().copied()
    }

    /// Destination of the initial transition
    pub fn initial_state(&self) -> Option<StateKey> {
        let t = self.initial_transition()?;
        self.transitions.get(&t).map(|t| t.destination)
    }

    pub fn is_initial(&self, key: TransitionKey) -> bool {
        self.transitions
            .get(&key)
            .and_then(|t| self.states.get(&t.source))
            .is_some_and(|s| s.is_pseudo)
    }

    /// Transitions touching `state`, as source or destination
    pub fn incident_transitions(&self, state: StateKey) -> &[TransitionKey] {
        self.states
            .get(&state)
            .map(|s| s.transitions.as_slice())
            .unwrap_or(&[])
    }

    /// Transitions joining the same two states as `key`, in either direction, `key` included
    pub fn siblings(&self, key: TransitionKey) -> Vec<TransitionKey> {
        let Some(t) = self.transitions.get(&key) else {
            return Vec::new();
        };
        let (a, b) = (t.source, t.destination);
        let same_pair = |other: &&TransitionKey| {
            self.transitions.get(*other).is_some_and(|o| {
                (o.source == a && o.destination == b) || (o.source == b && o.destination == a)
            })
        };
        let mut siblings: Vec<TransitionKey> = self
            .incident_transitions(a)
            .iter()
            .chain(self.incident_transitions(b))
            .filter(same_pair)
            .copied()
            .collect();
        siblings.sort_unstable();
        siblings.dedup();
        siblings
    }

    /// Current geometry of a transition; `None` if it cannot be drawn (overlapping states)
    pub fn route(&self, key: TransitionKey) -> Option<&Route> {
        self.routes.get(&key)
    }

    /// Geometry of a transition computed from scratch from the current positions
    pub fn compute_route(&self, key: TransitionKey) -> Option<Route> {
        let t = self.transitions.get(&key)?;
        let src = self.states.get(&t.source)?;
        if t.is_self_loop() {
            return Some(geometry::route_self_loop(src.position, t.location));
        }
        let dst = self.states.get(&t.destination)?;
        let (rank, count) = geometry::rank_among(key, &self.siblings(key))?;
        geometry::route_edge(src.rect(), dst.rect(), rank, count)
    }

    /// Topmost item under `point`: states above transitions, newer above older
    pub fn item_at(&self, point: Pos2) -> Option<Item> {
        let state = self
            .states
            .iter()
            .rev()
            .find(|(_, s)| s.rect().contains(point))
            .map(|(k, _)| Item::State(*k));
        state.or_else(|| {
            self.routes
                .iter()
                .rev()
                .find(|(_, r)| r.contains(point))
                .map(|(k, _)| Item::Transition(*k))
        })
    }

    /// State directly under `point`, ignoring transitions
    pub fn state_at(&self, point: Pos2) -> Option<StateKey> {
        match self.item_at(point)? {
            Item::State(key) => Some(key),
            Item::Transition(_) => None,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a normal state. Without an id, the next free counter value is used.
    pub fn add_state(&mut self, position: Pos2, id: Option<&str>) -> DiagramResult<StateKey> {
        let id = match id {
            Some(id) => {
                self.check_id_available(id, None)?;
                id.to_string()
            }
            None => self.next_generated_id(),
        };
        let key = StateKey(self.fresh_key());
        debug!("Adding state '{}' at {:?}", id, position);
        self.states.insert(
            key,
            State {
                id,
                position,
                is_pseudo: false,
                transitions: Vec::new(),
            },
        );
        Ok(key)
    }

    /// Add the initial pseudo-state; there can only be one
    pub fn add_pseudo_state(&mut self, position: Pos2) -> DiagramResult<StateKey> {
        if self.has_pseudo_state() {
            return Err(DiagramError::DuplicateInitialTransition);
        }
        let key = StateKey(self.fresh_key());
        debug!("Adding pseudo-state at {:?}", position);
        self.states.insert(
            key,
            State {
                id: PSEUDO_ID.to_string(),
                position,
                is_pseudo: true,
                transitions: Vec::new(),
            },
        );
        Ok(key)
    }

    /// Add a transition and register it with its endpoints (once for a self-loop)
    pub fn add_transition(
        &mut self,
        source: StateKey,
        destination: StateKey,
        label: impl Into<String>,
        location: Location,
    ) -> DiagramResult<TransitionKey> {
        self.check_endpoints(source, destination, None)?;

        let key = TransitionKey(self.fresh_key());
        self.transitions.insert(
            key,
            Transition {
                source,
                destination,
                label: label.into(),
                location,
            },
        );
        self.link(key, source, destination);
        debug!("Added {} ({} -> {})", key, source, destination);
        self.reroute_around(&[source, destination]);
        Ok(key)
    }

    /// Remove a state together with every transition touching it
    pub fn remove_state(&mut self, key: StateKey) -> DiagramResult<()> {
        let state = self
            .states
            .get(&key)
            .ok_or_else(|| DiagramError::UnknownState(key.to_string()))?;

        let incident = state.transitions.clone();
        let mut neighbours = Vec::new();
        for t in incident {
            if let Some(removed) = self.unlink(t) {
                neighbours.push(removed.source);
                neighbours.push(removed.destination);
            }
        }
        self.states.remove(&key);
        debug!("Removed {} and its transitions", key);
        self.reroute_around(&neighbours);
        Ok(())
    }

    /// Remove a transition. Removing the initial transition removes the pseudo-state too.
    pub fn remove_transition(&mut self, key: TransitionKey) -> DiagramResult<()> {
        let t = self
            .transitions
            .get(&key)
            .ok_or(DiagramError::UnknownTransition)?;
        let (source, destination) = (t.source, t.destination);

        if self.states.get(&source).is_some_and(|s| s.is_pseudo) {
            return self.remove_state(source);
        }

        self.unlink(key);
        debug!("Removed {}", key);
        self.reroute_around(&[source, destination]);
        Ok(())
    }

    pub fn rewire_source(&mut self, key: TransitionKey, source: StateKey) -> DiagramResult<()> {
        let t = self
            .transitions
            .get(&key)
            .ok_or(DiagramError::UnknownTransition)?;
        let destination = t.destination;
        if self.is_initial(key) && t.source != source {
            return Err(DiagramError::InvariantViolation(
                "the source of the initial transition cannot be changed".to_string(),
            ));
        }
        self.check_endpoints(source, destination, Some(key))?;
        self.relink(key, source, destination);
        Ok(())
    }

    pub fn rewire_destination(&mut self, key: TransitionKey, destination: StateKey) -> DiagramResult<()> {
        let t = self
            .transitions
            .get(&key)
            .ok_or(DiagramError::UnknownTransition)?;
        let source = t.source;
        self.check_endpoints(source, destination, Some(key))?;
        self.relink(key, source, destination);
        Ok(())
    }

    pub fn rename_state(&mut self, key: StateKey, id: &str) -> DiagramResult<()> {
        let state = self
            .states
            .get(&key)
            .ok_or_else(|| DiagramError::UnknownState(key.to_string()))?;
        if state.is_pseudo {
            return Err(DiagramError::InvariantViolation(
                "the initial pseudo-state cannot be renamed".to_string(),
            ));
        }
        self.check_id_available(id, Some(key))?;
        if let Some(state) = self.states.get_mut(&key) {
            debug!("Renaming '{}' to '{}'", state.id, id);
            state.id = id.to_string();
        }
        Ok(())
    }

    pub fn set_label(&mut self, key: TransitionKey, label: impl Into<String>) -> DiagramResult<()> {
        let t = self
            .transitions
            .get_mut(&key)
            .ok_or(DiagramError::UnknownTransition)?;
        t.label = label.into();
        Ok(())
    }

    /// Move a state and reroute everything attached to it
    pub fn move_state(&mut self, key: StateKey, position: Pos2) -> DiagramResult<()> {
        let state = self
            .states
            .get_mut(&key)
            .ok_or_else(|| DiagramError::UnknownState(key.to_string()))?;
        state.position = position;
        self.reroute_around(&[key]);
        Ok(())
    }

    /// Check every structural invariant. Used after bulk loads and by tests.
    pub fn check_invariants(&self) -> DiagramResult<()> {
        fn violation(msg: String) -> DiagramResult<()> {
            Err(DiagramError::InvariantViolation(msg))
        }

        let pseudo: Vec<StateKey> = self
            .states
            .iter()
            .filter(|(_, s)| s.is_pseudo)
            .map(|(k, _)| *k)
            .collect();
        if pseudo.len() > 1 {
            return violation(format!("{} pseudo-states", pseudo.len()));
        }

        let mut ids = BTreeSet::new();
        for (key, state) in &self.states {
            if !state.is_pseudo && (state.id == PSEUDO_ID || !ids.insert(state.id.as_str())) {
                return violation(format!("duplicate or reserved id '{}' on {}", state.id, key));
            }
            for t in &state.transitions {
                match self.transitions.get(t) {
                    Some(tr) if tr.source == *key || tr.destination == *key => {}
                    _ => return violation(format!("{key} lists unrelated {t}")),
                }
            }
        }

        for (key, t) in &self.transitions {
            let (Some(src), Some(dst)) = (self.states.get(&t.source), self.states.get(&t.destination))
            else {
                return violation(format!("{key} references a missing state"));
            };
            let listed = |s: &State| s.transitions.iter().filter(|k| *k == key).count();
            if listed(src) != 1 || listed(dst) != 1 {
                return violation(format!("{key} is not registered once with its endpoints"));
            }
            if dst.is_pseudo {
                return violation(format!("{key} enters the pseudo-state"));
            }
        }

        if let Some(p) = pseudo.first().and_then(|k| self.states.get(k)) {
            if p.transitions.len() > 1 {
                return violation("the pseudo-state has several transitions".to_string());
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn fresh_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn next_generated_id(&mut self) -> String {
        loop {
            let id = self.id_counter.to_string();
            self.id_counter += 1;
            if self.find_state(&id).is_none() {
                return id;
            }
        }
    }

    /// Set the generated-id counter; done once after loading a file
    pub(crate) fn reset_id_counter(&mut self, value: usize) {
        self.id_counter = value;
    }

    fn check_id_available(&self, id: &str, renaming: Option<StateKey>) -> DiagramResult<()> {
        if id == PSEUDO_ID {
            return Err(DiagramError::ReservedId(id.to_string()));
        }
        let taken = self
            .states
            .iter()
            .any(|(k, s)| !s.is_pseudo && s.id == id && Some(*k) != renaming);
        if taken {
            return Err(DiagramError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Endpoint rules shared by creation and rewiring. `replacing` is the
    /// transition being rewired, which does not count against the pseudo-state.
    fn check_endpoints(
        &self,
        source: StateKey,
        destination: StateKey,
        replacing: Option<TransitionKey>,
    ) -> DiagramResult<()> {
        let src = self
            .states
            .get(&source)
            .ok_or_else(|| DiagramError::UnknownState(source.to_string()))?;
        let dst = self
            .states
            .get(&destination)
            .ok_or_else(|| DiagramError::UnknownState(destination.to_string()))?;

        if dst.is_pseudo {
            return Err(DiagramError::InvariantViolation(
                "the initial pseudo-state cannot be the destination of a transition".to_string(),
            ));
        }
        if src.is_pseudo && src.transitions.iter().any(|t| Some(*t) != replacing) {
            return Err(DiagramError::InvariantViolation(
                "the initial pseudo-state already has its transition".to_string(),
            ));
        }
        Ok(())
    }

    fn link(&mut self, key: TransitionKey, source: StateKey, destination: StateKey) {
        if let Some(s) = self.states.get_mut(&source) {
            s.transitions.push(key);
        }
        if destination != source {
            if let Some(d) = self.states.get_mut(&destination) {
                d.transitions.push(key);
            }
        }
    }

    /// Detach a transition from its endpoints and delete it
    fn unlink(&mut self, key: TransitionKey) -> Option<Transition> {
        let t = self.transitions.remove(&key)?;
        for state in [t.source, t.destination] {
            if let Some(s) = self.states.get_mut(&state) {
                s.transitions.retain(|k| *k != key);
            }
        }
        self.routes.remove(&key);
        Some(t)
    }

    fn relink(&mut self, key: TransitionKey, source: StateKey, destination: StateKey) {
        let Some(t) = self.transitions.get(&key) else {
            return;
        };
        let (old_source, old_destination) = (t.source, t.destination);
        for state in [old_source, old_destination] {
            if let Some(s) = self.states.get_mut(&state) {
                s.transitions.retain(|k| *k != key);
            }
        }
        if let Some(t) = self.transitions.get_mut(&key) {
            t.source = source;
            t.destination = destination;
        }
        self.link(key, source, destination);
        debug!("Rewired {} to {} -> {}", key, source, destination);
        self.reroute_around(&[old_source, old_destination, source, destination]);
    }

    /// Recompute the geometry of every transition touching one of `states`
    fn reroute_around(&mut self, states: &[StateKey]) {
        let affected: BTreeSet<TransitionKey> = states
            .iter()
            .flat_map(|s| self.incident_transitions(*s).iter().copied())
            .collect();
        for key in affected {
            match self.compute_route(key) {
                Some(route) => {
                    self.routes.insert(key, route);
                }
                None => {
                    self.routes.remove(&key);
                }
            }
        }
    }
}
