// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use crate::model::{DiagramState, Node};

use super::ident::{d2_key, d2_string};

fn d2_shape(kind: &str) -> Option<&'static str> {
    match kind {
        "person" | "actor" | "user" => Some("person"),
        "database" | "db" | "datastore" => Some("cylinder"),
        "queue" | "topic" => Some("queue"),
        "storage" | "bucket" => Some("stored_data"),
        "cloud" | "external" => Some("cloud"),
        _ => None,
    }
}

fn write_node(out: &mut String, node: &Node) {
    let key = d2_key(node.id().as_str());
    let shape = d2_shape(node.kind());
    let icon = node.icon();

    if shape.is_none() && icon.is_none() {
        let _ = writeln!(out, "{key}: {}", d2_string(node.label()));
        return;
    }

    let _ = writeln!(out, "{key}: {} {{", d2_string(node.label()));
    if let Some(shape) = shape {
        let _ = writeln!(out, "  shape: {shape}");
    }
    if let Some(icon) = icon {
        let _ = writeln!(out, "  icon: {}", d2_string(icon));
    }
    out.push_str("}\n");
}

/// D2 source for the diagram. Layout is left to the D2 engine; positions are not emitted.
pub(crate) fn project_d2(state: &DiagramState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# version {}", state.version());

    for node in state.nodes() {
        write_node(&mut out, node);
    }

    if !state.edges().is_empty() {
        out.push('\n');
    }
    for edge in state.edges() {
        let _ = write!(
            out,
            "{} -> {}",
            d2_key(edge.source_id().as_str()),
            d2_key(edge.target_id().as_str())
        );
        if let Some(label) = edge.label() {
            let _ = write!(out, ": {}", d2_string(label));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::project_d2;
    use crate::model::fixtures::three_tier;

    #[test]
    fn emits_shapes_icons_and_labeled_connections() {
        let d2 = project_d2(&three_tier(3));
        let expected = "\
# version 3
user: \"Customer\" {
  shape: person
}
web: \"Web App\" {
  icon: \"react\"
}
api: \"API\"
db: \"Postgres\" {
  shape: cylinder
}

user -> web: \"uses\"
web -> api
api -> db
";
        assert_eq!(d2, expected);
    }
}
