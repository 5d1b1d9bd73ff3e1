//! Indented HTML serialization.
//!
//! Every tag and every non-blank text run goes on its own line, indented one
//! space per nesting level. Whitespace-sensitive elements are written
//! verbatim on a single indented line.

use scraper::{ElementRef, Node};

/// Elements whose content is emitted exactly as parsed.
const VERBATIM: [&str; 4] = ["pre", "textarea", "script", "style"];

/// Elements without a closing tag.
const VOID: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Serialize an element and its subtree as indented HTML.
pub fn prettify(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_element(element, 0, &mut out);
    out
}

fn write_element(element: ElementRef<'_>, depth: usize, out: &mut String) {
    let name = element.value().name();

    indent(depth, out);
    if VERBATIM.contains(&name) {
        out.push_str(&element.html());
        out.push('\n');
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push_str(">\n");

    if VOID.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, depth + 1, out);
                }
            }
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    indent(depth + 1, out);
                    escape_text(text, out);
                    out.push('\n');
                }
            }
            Node::Comment(comment) => {
                indent(depth + 1, out);
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->\n");
            }
            _ => {}
        }
    }

    indent(depth, out);
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

fn indent(depth: usize, out: &mut String) {
    out.extend(std::iter::repeat_n(' ', depth));
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
