//! Graphviz Export
//! Write-only DOT description of a diagram for external rendering.

use std::borrow::Cow;
use std::path::Path;

use log::info;

use crate::diagram::{split_label, Diagram};
use crate::error::DiagramResult;


/// Fixed graph attributes written at the top of every export
pub const HEADER: [&str; 8] = [
    "layout = dot",
    "rankdir = UD",
    "size = \"8.5,11\"",
    "center = 1",
    "nodesep = \"0.350000\"",
    "ranksep = \"0.400000\"",
    "fontsize = 14",
    "mindist=1.0",
];

/// Padding used around label lines in the on-screen preview
pub const PREVIEW_PAD: &str = "  ";

/// Format a transition label, stacking `guard/action` labels over an underline.
///
/// Only labels with exactly one `/` are split; anything else is returned as is.
/// The underline is as long as the longer half, counted in characters.
pub fn transition_label(label: &str, pad: &str, newline: &str) -> String {
    match split_label(label) {
        Some((guard, action)) => {
            let width = guard.chars().count().max(action.chars().count());
            let underline = "_".repeat(width);
            [guard, underline.as_str(), action]
                .iter()
                .map(|line| format!("{pad}{line}{pad}"))
                .collect::<Vec<_>>()
                .join(newline)
        }
        None => label.to_string(),
    }
}

/// Label as shown in the preview window (real line breaks, padded)
pub fn preview_label(label: &str) -> String {
    transition_label(label, PREVIEW_PAD, "\n")
}

fn is_plain_id(id: &str) -> bool {
    let mut chars = id.chars();
    let identifier = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    let numeral = !id.is_empty() && id.chars().all(|c| c.is_ascii_digit());
    identifier || numeral
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// DOT node id, quoted unless it is a plain identifier or numeral
pub fn quote_id(id: &str) -> Cow<'_, str> {
    if is_plain_id(id) {
        Cow::Borrowed(id)
    } else {
        Cow::Owned(format!("\"{}\"", escape(id)))
    }
}

/// Render the diagram as a DOT digraph: header, then nodes, then edges
pub fn to_dot(diagram: &Diagram) -> String {
    let mut lines: Vec<String> = vec!["digraph main {".to_string()];
    lines.extend(HEADER.iter().map(|attr| attr.to_string()));

    for (_, state) in diagram.states() {
        let id = quote_id(state.id());
        if state.is_pseudo() {
            lines.push(format!("{id} [shape=point]"));
        } else {
            lines.push(format!(
                "{id} [label=\"{}\", shape=circle, style=solid]",
                escape(state.id())
            ));
        }
    }

    for (key, transition) in diagram.transitions() {
        let (Some(src), Some(dst)) = (
            diagram.state(transition.source()),
            diagram.state(transition.destination()),
        ) else {
            continue;
        };
        let edge = format!("{} -> {}", quote_id(src.id()), quote_id(dst.id()));
        if diagram.is_initial(key) {
            lines.push(edge);
        } else {
            // Line breaks become DOT `\n` escapes
            let label = escape(&transition_label(transition.label(), "", "\n"));
            lines.push(format!("{edge} [label=\"{label}\"]"));
        }
    }

    lines.push("}".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn export_file(diagram: &Diagram, path: &Path) -> DiagramResult<()> {
    std::fs::write(path, to_dot(diagram))?;
    info!("Exported DOT to {}", path.display());
    Ok(())
}
