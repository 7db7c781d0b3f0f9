// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::model::Node;

fn invalid_ident_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static regex"))
}

fn bare_d2_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// Flowchart keywords that cannot stand alone as a node id.
const MERMAID_RESERVED: &[&str] = &[
    "end",
    "graph",
    "subgraph",
    "flowchart",
    "style",
    "class",
    "classDef",
    "click",
    "linkStyle",
];

/// Keys D2 interprets as attributes at map level; these are always quoted.
const D2_RESERVED: &[&str] = &[
    "shape",
    "label",
    "style",
    "icon",
    "near",
    "direction",
    "width",
    "height",
    "tooltip",
    "link",
    "constraint",
    "class",
    "classes",
    "vars",
    "top",
    "left",
    "layers",
    "scenarios",
    "steps",
];

/// Maps node ids onto identifiers that are valid in Mermaid source.
///
/// Runs of characters outside `[A-Za-z0-9_]` collapse to `_`; a leading digit gets an `n_` prefix.
/// Collisions are resolved by suffixing `_2`, `_3`, ... in node order, so the mapping is a pure
/// function of the node sequence.
#[derive(Debug, Default)]
pub(crate) struct MermaidIdents {
    by_node: HashMap<String, String>,
}

impl MermaidIdents {
    pub(crate) fn for_nodes(nodes: &[Node]) -> Self {
        let mut taken = HashSet::<String>::new();
        let mut by_node = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let base = sanitize(node.id().as_str());
            let mut candidate = base.clone();
            let mut suffix = 2usize;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            taken.insert(candidate.clone());
            by_node.insert(node.id().as_str().to_owned(), candidate);
        }

        Self { by_node }
    }

    pub(crate) fn get<'a>(&'a self, node_id: &'a str) -> &'a str {
        self.by_node.get(node_id).map_or(node_id, String::as_str)
    }
}

fn sanitize(id: &str) -> String {
    let replaced = invalid_ident_chars().replace_all(id, "_");
    let trimmed = replaced.trim_matches('_');
    let base = if trimmed.is_empty() { "node" } else { trimmed };
    if base.starts_with(|c: char| c.is_ascii_digit()) || MERMAID_RESERVED.contains(&base) {
        format!("n_{base}")
    } else {
        base.to_owned()
    }
}

/// Text inside a Mermaid `"..."` string.
pub(crate) fn mermaid_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("#quot;"),
            '\n' => out.push_str("#10;"),
            '\r' => out.push_str("#13;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A D2 map key: bare when it is a plain identifier, quoted otherwise.
pub(crate) fn d2_key(id: &str) -> String {
    let reserved = D2_RESERVED.iter().any(|keyword| keyword.eq_ignore_ascii_case(id));
    if !reserved && bare_d2_key().is_match(id) {
        id.to_owned()
    } else {
        d2_string(id)
    }
}

pub(crate) fn d2_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
