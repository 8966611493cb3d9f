//! HTML serialization, for inspection and tests.

use super::node::{Node, NodeKind};

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr"];

impl Node {
    /// Serialize this node and its descendants as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    let data = node.read();
    match &data.kind {
        NodeKind::Text(t) => out.push_str(&escape(t, false)),
        NodeKind::Fragment => {
            for child in &data.children {
                write_node(child, out);
            }
        }
        NodeKind::Element(e) => {
            out.push('<');
            out.push_str(&e.tag);
            for (name, value) in &e.attributes {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
            }
            if !e.style.is_empty() {
                let style: Vec<String> = e.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                out.push_str(" style=\"");
                out.push_str(&escape(&style.join("; "), true));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&e.tag.as_str()) {
                return;
            }
            for child in &data.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&e.tag);
            out.push('>');
        }
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
