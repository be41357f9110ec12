//! FSD Edit - Finite State Diagram Editor
//! Draw states and transitions on a canvas, save them as JSON, export to Graphviz DOT

pub mod config;
pub mod diagram;
pub mod dot;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod persist;

pub use config::{load_config, AppConfig};
pub use diagram::{Diagram, Item, State, StateKey, Transition, TransitionKey, PSEUDO_ID};
pub use dot::to_dot;
pub use editor::{Editor, Mode, Notification, PointerEvent};
pub use error::{DiagramError, DiagramResult};
pub use geometry::{Location, Route};
pub use layout::{layered, LayoutConfig, LayoutDirection, PreviewLayout};
pub use persist::{from_text, to_text};
