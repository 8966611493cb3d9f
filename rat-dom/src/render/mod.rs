//! Lays a node tree out as styled terminal lines.
//!
//! The layout is deliberately small: block elements start new lines, inline
//! elements and text flow into the current one, and a handful of utility class
//! names map to terminal styles. Focusable nodes (links, buttons, inputs) are
//! highlighted when they hold focus.

use crate::dom::Node;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const BLOCK_TAGS: &[&str] = &[
    "article", "aside", "body", "dialog", "div", "footer", "form", "h1", "h2", "h3", "h4", "header", "li", "main",
    "nav", "ol", "p", "section", "ul",
];

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "template"];

const INPUT_WIDTH: usize = 24;

/// The rendered lines plus where the focused node ended up.
#[derive(Debug, Default)]
pub struct Layout {
    pub lines: Vec<Line<'static>>,
    /// Index into `lines` of the line holding the focused node.
    pub focus_line: Option<usize>,
}

impl Layout {
    /// Plain text of every line, for assertions and logging.
    pub fn plain(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }
}

/// Whether keyboard focus can land on `node`.
pub fn is_focusable(node: &Node) -> bool {
    matches!(node.tag().as_deref(), Some("a" | "button" | "input" | "textarea")) && !node.has_attribute("disabled")
}

/// Focusable descendants of `root` in document order.
pub fn focusables(root: &Node) -> Vec<Node> {
    root.find_all(|n| is_focusable(n) && !in_skipped_subtree(n))
}

fn in_skipped_subtree(node: &Node) -> bool {
    node.closest(|n| {
        n.has_attribute("hidden") || n.tag().is_some_and(|t| SKIPPED_TAGS.contains(&t.as_str()))
    })
    .is_some()
}

/// Lay out `root` and its descendants.
pub fn layout(root: &Node, focused: Option<&Node>) -> Layout {
    let mut writer = Writer {
        focused,
        lines: Vec::new(),
        current: Vec::new(),
        focus_line: None,
        list_depth: 0,
    };
    writer.walk(root, Style::default());
    writer.break_line();
    Layout {
        lines: writer.lines,
        focus_line: writer.focus_line,
    }
}

/// Terminal style for a space-separated class list.
pub fn class_style(classes: &str) -> Style {
    let mut style = Style::default();
    for class in classes.split_whitespace() {
        style = match class {
            "line-through" => style.add_modifier(Modifier::CROSSED_OUT),
            "font-bold" | "font-semibold" | "title" => style.add_modifier(Modifier::BOLD),
            "italic" => style.add_modifier(Modifier::ITALIC),
            c if c.contains("gray") || c == "muted" => style.fg(Color::DarkGray),
            c if c.contains("red") || c.ends_with("danger") => style.fg(Color::Red),
            c if c.contains("green") || c.ends_with("success") => style.fg(Color::Green),
            c if c.contains("blue") || c.ends_with("primary") => style.fg(Color::Cyan),
            _ => style,
        };
    }
    style
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}

fn input_label(node: &Node, focused: bool) -> (String, bool) {
    match node.attribute("type").as_deref() {
        Some("checkbox") => (if node.checked() { "[x]" } else { "[ ]" }.to_string(), false),
        _ => {
            let value = node.value();
            if value.is_empty() && !focused {
                let placeholder = node.attribute("placeholder").unwrap_or_default();
                (format!("[{placeholder:<width$}]", width = INPUT_WIDTH), true)
            } else {
                let cursor = if focused { "_" } else { "" };
                (format!("[{value}{cursor:<width$}]", width = INPUT_WIDTH.saturating_sub(value.chars().count())), false)
            }
        }
    }
}

struct Writer<'a> {
    focused: Option<&'a Node>,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    focus_line: Option<usize>,
    list_depth: usize,
}

impl Writer<'_> {
    fn push(&mut self, text: String, style: Style) {
        if text.is_empty() {
            return;
        }
        // Leading spaces are noise at the start of a line.
        let text = if self.current.is_empty() { text.trim_start().to_string() } else { text };
        if !text.is_empty() {
            self.current.push(Span::styled(text, style));
        }
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn walk_children(&mut self, node: &Node, style: Style) {
        for child in node.children() {
            self.walk(&child, style);
        }
    }

    fn walk(&mut self, node: &Node, inherited: Style) {
        if node.is_text() {
            self.push(collapse_whitespace(&node.text_content()), inherited);
            return;
        }
        if node.is_fragment() {
            self.walk_children(node, inherited);
            return;
        }
        let Some(tag) = node.tag() else {
            return;
        };
        if SKIPPED_TAGS.contains(&tag.as_str()) || node.has_attribute("hidden") {
            return;
        }

        let focused = self.focused.is_some_and(|f| f == node);
        let mut style = inherited.patch(class_style(&node.class_name()));
        if focused {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let block = BLOCK_TAGS.contains(&tag.as_str());
        if block {
            self.break_line();
        }
        if focused {
            self.focus_line = Some(self.lines.len());
        }

        match tag.as_str() {
            "br" => self.break_line(),
            "hr" => {
                self.break_line();
                self.push("─".repeat(INPUT_WIDTH), style.fg(Color::DarkGray));
                self.break_line();
            }
            "input" => {
                let (label, placeholder) = input_label(node, focused);
                let style = if placeholder { style.fg(Color::DarkGray) } else { style };
                self.push(format!("{label} "), style);
            }
            "button" => {
                let label = collapse_whitespace(&node.text_content());
                let style = if node.has_attribute("disabled") {
                    style.fg(Color::DarkGray)
                } else {
                    style
                };
                self.push(format!("[ {} ]", label.trim()), style);
                self.push(" ".to_string(), inherited);
            }
            "a" => self.walk_children(node, style.add_modifier(Modifier::UNDERLINED)),
            "h1" | "h2" | "h3" => {
                let style = style.add_modifier(Modifier::BOLD);
                let style = if tag == "h1" { style.fg(Color::Cyan) } else { style };
                self.walk_children(node, style);
            }
            "ul" | "ol" => {
                self.list_depth += 1;
                self.walk_children(node, style);
                self.list_depth -= 1;
            }
            "li" => {
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.current.push(Span::styled(format!("{indent}• "), inherited));
                self.walk_children(node, style);
            }
            _ => self.walk_children(node, style),
        }

        if block {
            self.break_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::dom::{el, Attr};

    #[test]
    fn test_blocks_and_inline_flow() {
        let root = el(
            "div",
            [],
            children![
                el("h1", [], children!["Title"]),
                el("p", [], children!["Hello ", el("span", [], children!["world"]), "!"]),
                el("style", [], children![".hidden { display: none }"]),
                el("ul", [], children![el("li", [], children!["one"]), el("li", [], children!["two"])]),
            ],
        );
        let layout = layout(&root, None);
        assert_eq!(layout.plain(), vec!["Title", "Hello world!", "• one", "• two"]);
        assert_eq!(layout.focus_line, None);
    }

    #[test]
    fn test_controls_render_as_labels() {
        let checkbox = el("input", [Attr::attr("type", "checkbox"), Attr::flag("checked", true)], []);
        let field = el("input", [Attr::attr("type", "text"), Attr::attr("placeholder", "What needs to be done?")], []);
        let root = el("form", [], children![checkbox, field.clone(), el("button", [], children!["Add"])]);

        let plain = layout(&root, None).plain();
        assert!(plain[0].starts_with("[x] [What needs to be done?"));
        assert!(plain[0].ends_with("[ Add ] "));

        field.set_value("milk");
        let layout = layout(&root, Some(&field));
        assert!(layout.plain()[0].contains("[milk_"));
        assert_eq!(layout.focus_line, Some(0));
    }

    #[test]
    fn test_focused_node_is_reversed() {
        let link = el("a", [Attr::attr("href", "/todo")], children!["Go"]);
        let root = el("div", [], children![el("p", [], children!["intro"]), el("p", [], children![link.clone()])]);
        let layout = layout(&root, Some(&link));

        assert_eq!(layout.focus_line, Some(1));
        let span = &layout.lines[1].spans[0];
        assert_eq!(span.content, "Go");
        assert!(span.style.add_modifier.contains(Modifier::REVERSED));
        assert!(span.style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_class_styles() {
        let style = class_style("todo-text line-through text-gray-500");
        assert!(style.add_modifier.contains(Modifier::CROSSED_OUT));
        assert_eq!(style.fg, Some(Color::DarkGray));
        assert_eq!(class_style("btn btn-danger").fg, Some(Color::Red));
        assert_eq!(class_style("plain"), Style::default());
    }

    #[test]
    fn test_focusables_in_document_order() {
        let first = el("a", [Attr::attr("href", "/")], children!["home"]);
        let disabled = el("button", [Attr::flag("disabled", true)], children!["nope"]);
        let hidden = el("div", [Attr::flag("hidden", true)], children![el("button", [], children!["secret"])]);
        let last = el("input", [], []);
        let root = el("div", [], children![first.clone(), disabled, hidden, el("p", [], children![last.clone()])]);

        assert_eq!(focusables(&root), vec![first, last]);
    }
}
