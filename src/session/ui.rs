//! UI fragments built as node trees, never as interpolated markup.
//!
//! Text and attribute values are escaped once, at serialization.

use super::mode::ScanResult;
use crate::gallery::GalleryItem;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

const VOID_TAGS: &[&str] = &["img", "br", "hr", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, class: &'static str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => escape_into(out, text, false),
            Node::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attrs {
                    let _ = write!(out, " {}=\"", name);
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }

    /// Concatenated text content, like the DOM's `textContent`.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }
}

fn escape_into(out: &mut String, text: &str, in_attr: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            '\'' if in_attr => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn gallery_card(item: &GalleryItem) -> Node {
    let taken = format_timestamp(item.timestamp);
    Element::new("div")
        .class("gallery-item")
        .attr("data-id", item.id.clone())
        .child(
            Element::new("img")
                .class("gallery-image")
                .attr("src", item.image.clone())
                .attr("alt", format!("Captured {}", taken)),
        )
        .child(
            Element::new("div")
                .class("gallery-meta")
                .child(Element::new("span").class("gallery-time").text(taken))
                .child(
                    Element::new("button")
                        .class("gallery-save")
                        .attr("data-id", item.id.clone())
                        .text("Save"),
                )
                .child(
                    Element::new("button")
                        .class("gallery-delete")
                        .attr("data-id", item.id.clone())
                        .text("Delete"),
                ),
        )
        .into()
}

/// Grid of cards in the order given (callers pass newest first).
pub fn gallery_grid<'a>(items: impl IntoIterator<Item = &'a GalleryItem>) -> Node {
    let grid = items
        .into_iter()
        .fold(Element::new("div").class("gallery-grid"), |grid, item| {
            grid.child(gallery_card(item))
        });
    if grid.children().is_empty() {
        return Element::new("div")
            .class("gallery-empty")
            .text("No captured images yet")
            .into();
    }
    grid.into()
}

pub fn result_panel(result: &ScanResult, copy_label: &str) -> Node {
    let mut panel = Element::new("div")
        .class("result")
        .child(Element::new("div").class("result-content").text(result.text.clone()))
        .child(Element::new("button").class("copy").text(copy_label));
    if result.is_link() {
        panel = panel.child(Element::new("button").class("open").text("Open"));
    }
    panel.into()
}
