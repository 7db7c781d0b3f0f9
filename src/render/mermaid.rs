// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid projections: a left-to-right flowchart and a C4 system-context diagram.

use crate::model::{DiagramState, Node};

use super::ident::{mermaid_text, MermaidIdents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowShape {
    Rect,
    Round,
    Cylinder,
    Stadium,
}

impl FlowShape {
    fn for_kind(kind: &str) -> Self {
        match kind {
            "database" | "db" | "datastore" | "storage" => Self::Cylinder,
            "person" | "actor" | "user" => Self::Round,
            "queue" | "topic" => Self::Stadium,
            _ => Self::Rect,
        }
    }

    fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            Self::Rect => ("[", "]"),
            Self::Round => ("(", ")"),
            Self::Cylinder => ("[(", ")]"),
            Self::Stadium => ("([", "])"),
        }
    }
}

pub(crate) fn project_flowchart(state: &DiagramState) -> String {
    let idents = MermaidIdents::for_nodes(state.nodes());
    let mut out = String::new();
    out.push_str("flowchart LR\n");

    for node in state.nodes() {
        let (open, close) = FlowShape::for_kind(node.kind()).delimiters();
        out.push_str("  ");
        out.push_str(idents.get(node.id().as_str()));
        out.push_str(open);
        out.push('"');
        out.push_str(&mermaid_text(node.label()));
        out.push('"');
        out.push_str(close);
        out.push('\n');
    }

    for edge in state.edges() {
        out.push_str("  ");
        out.push_str(idents.get(edge.source_id().as_str()));
        match edge.label() {
            Some(label) => {
                out.push_str(" -->|\"");
                out.push_str(&mermaid_text(label));
                out.push_str("\"| ");
            }
            None => out.push_str(" --> "),
        }
        out.push_str(idents.get(edge.target_id().as_str()));
        out.push('\n');
    }

    let pinned = state
        .nodes()
        .iter()
        .filter(|node| state.is_pinned(node.id().as_str()))
        .map(|node| idents.get(node.id().as_str()))
        .collect::<Vec<_>>();
    if !pinned.is_empty() {
        out.push_str("  classDef pinned stroke-width:3px\n");
        out.push_str("  class ");
        out.push_str(&pinned.join(","));
        out.push_str(" pinned\n");
    }

    out
}

fn c4_element(node: &Node) -> &'static str {
    match node.kind() {
        "person" | "actor" | "user" => "Person",
        "database" | "db" | "datastore" | "storage" => "SystemDb",
        "queue" | "topic" => "SystemQueue",
        "external" | "external_system" | "system_ext" => "System_Ext",
        _ => "System",
    }
}

/// C4 system-context view of the same graph.
pub(crate) fn project_context(state: &DiagramState) -> String {
    let idents = MermaidIdents::for_nodes(state.nodes());
    let mut out = String::new();
    out.push_str("C4Context\n");
    out.push_str(&format!("  title System Context (version {})\n", state.version()));

    for node in state.nodes() {
        out.push_str(&format!(
            "  {}({}, \"{}\")\n",
            c4_element(node),
            idents.get(node.id().as_str()),
            mermaid_text(node.label())
        ));
    }

    for edge in state.edges() {
        out.push_str(&format!(
            "  Rel({}, {}, \"{}\")\n",
            idents.get(edge.source_id().as_str()),
            idents.get(edge.target_id().as_str()),
            mermaid_text(edge.label().unwrap_or("uses"))
        ));
    }

    out
}
