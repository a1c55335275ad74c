use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::selection::Range;

pub type AttrValue = serde_json::Value;
pub type Attrs = BTreeMap<String, AttrValue>;
pub type ElementKind = String;
pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element("paragraph", vec![Node::text(text)])
    }

    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn void(kind: impl Into<String>) -> Self {
        Node::Void(VoidNode {
            kind: kind.into(),
            attrs: Attrs::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn is_text_block(&self) -> bool {
        self.children
            .iter()
            .any(|n| matches!(n, Node::Text(_) | Node::Void(_)))
    }

    pub fn inline_len(&self) -> usize {
        self.spans().last().map(|s| s.end).unwrap_or(0)
    }

    // Nested elements take no space.
    pub fn spans(&self) -> Vec<InlineSpan<'_>> {
        let mut out = Vec::new();
        let mut cursor = 0usize;
        for (child_ix, node) in self.children.iter().enumerate() {
            let item = match node {
                Node::Text(t) => Inline::Text(t),
                Node::Void(v) => Inline::Void(v),
                Node::Element(_) => continue,
            };
            let start = cursor;
            cursor += item.len();
            out.push(InlineSpan {
                child_ix,
                start,
                end: cursor,
                item,
            });
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: Attrs::default(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

impl From<TextNode> for Node {
    fn from(value: TextNode) -> Self {
        Node::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inline<'a> {
    Text(&'a TextNode),
    Void(&'a VoidNode),
}

impl<'a> Inline<'a> {
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(t) => t.text.len(),
            Inline::Void(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InlineSpan<'a> {
    pub child_ix: usize,
    pub start: usize,
    pub end: usize,
    pub item: Inline<'a>,
}

#[derive(Debug, Clone)]
pub struct TextBlock<'a> {
    pub path: Path,
    pub el: &'a ElementNode,
}

#[derive(Debug, Clone)]
pub struct CoveredSpan<'a> {
    pub block_path: Path,
    pub block: &'a ElementNode,
    pub item: Inline<'a>,
    pub start: usize,
    pub end: usize,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn text_blocks(&self) -> Vec<TextBlock<'_>> {
        fn walk<'a>(nodes: &'a [Node], path: &mut Vec<usize>, out: &mut Vec<TextBlock<'a>>) {
            for (ix, node) in nodes.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };

                path.push(ix);

                if el.is_text_block() {
                    out.push(TextBlock {
                        path: path.clone(),
                        el,
                    });
                } else {
                    walk(&el.children, path, out);
                }

                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), &mut out);
        out
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &ix in rest {
            node = match node {
                Node::Element(el) => el.children.get(ix)?,
                Node::Void(_) | Node::Text(_) => return None,
            };
        }
        Some(node)
    }

    pub fn block(&self, path: &[usize]) -> Option<&ElementNode> {
        match self.node(path)? {
            Node::Element(el) if el.is_text_block() => Some(el),
            _ => None,
        }
    }

    pub(crate) fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node, PathError> {
        let (first, rest) = path
            .split_first()
            .ok_or_else(|| PathError("Empty path".into()))?;
        let len = self.children.len();
        let mut node = self
            .children
            .get_mut(*first)
            .ok_or_else(|| PathError(format!("Path out of bounds at depth 0: {first} >= {len}")))?;
        for (depth, &ix) in rest.iter().enumerate() {
            node = match node {
                Node::Element(el) => {
                    let len = el.children.len();
                    el.children.get_mut(ix).ok_or_else(|| {
                        PathError(format!(
                            "Path out of bounds at depth {}: {ix} >= {len}",
                            depth + 1
                        ))
                    })?
                }
                Node::Void(_) | Node::Text(_) => {
                    return Err(PathError(format!("Non-container node at depth {depth}")));
                }
            };
        }
        Ok(node)
    }

    pub(crate) fn block_mut(&mut self, path: &[usize]) -> Result<&mut ElementNode, PathError> {
        match self.node_mut(path)? {
            Node::Element(el) if el.is_text_block() => Ok(el),
            _ => Err(PathError(format!("No text block at {path:?}"))),
        }
    }

    pub fn covered_spans(&self, range: &Range) -> Vec<CoveredSpan<'_>> {
        let mut out = Vec::new();
        for block in self.text_blocks() {
            if block.path < range.start.path || block.path > range.end.path {
                continue;
            }
            let spans = block.el.spans();
            let total = spans.last().map(|s| s.end).unwrap_or(0);
            let lo = if block.path == range.start.path {
                range.start.offset
            } else {
                0
            };
            let hi = if block.path == range.end.path {
                range.end.offset.min(total)
            } else {
                total
            };
            if lo >= hi {
                continue;
            }
            for span in spans {
                let start = span.start.max(lo);
                let end = span.end.min(hi);
                if start < end {
                    out.push(CoveredSpan {
                        block_path: block.path.clone(),
                        block: block.el,
                        item: span.item,
                        start,
                        end,
                    });
                }
            }
        }
        out
    }

    pub fn attribute_in_ranges<'d>(&'d self, ranges: &[Range], key: &str) -> Option<&'d AttrValue> {
        let mut found: Option<&AttrValue> = None;
        for range in ranges {
            for span in self.covered_spans(range) {
                let Inline::Text(text) = span.item else {
                    continue;
                };
                let value = text.attrs.get(key)?;
                match found {
                    Some(prev) if prev != value => return None,
                    _ => found = Some(value),
                }
            }
        }
        found
    }

    // Text before the caret, or after it at the very start of the block.
    pub fn attribute_at_caret(&self, path: &[usize], offset: usize, key: &str) -> Option<&AttrValue> {
        let block = self.block(path)?;
        let spans = block.spans();
        let span = if offset == 0 {
            spans.iter().find(|s| s.start == 0 && !s.item.is_empty())
        } else {
            spans.iter().find(|s| s.start < offset && offset <= s.end)
        }?;
        match span.item {
            Inline::Text(t) => t.attrs.get(key),
            Inline::Void(_) => None,
        }
    }

    pub(crate) fn normalize(&mut self) {
        fn walk(nodes: &mut [Node]) {
            for node in nodes.iter_mut() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.is_text_block() {
                    normalize_inline_children(&mut el.children);
                } else {
                    walk(&mut el.children);
                }
            }
        }

        walk(&mut self.children);
    }
}

pub(crate) fn normalize_inline_children(children: &mut Vec<Node>) {
    let mut placeholder: Option<Node> = None;
    let mut out: Vec<Node> = Vec::with_capacity(children.len());

    for node in children.drain(..) {
        if let Node::Text(t) = &node {
            if t.text.is_empty() {
                if placeholder.is_none() {
                    placeholder = Some(node);
                }
                continue;
            }
        }
        if let (Some(Node::Text(prev)), Node::Text(next)) = (out.last_mut(), &node) {
            if prev.attrs == next.attrs {
                prev.text.push_str(&next.text);
                continue;
            }
        }
        out.push(node);
    }

    // A block must keep at least one leaf to stay addressable.
    if !out
        .iter()
        .any(|n| matches!(n, Node::Text(_) | Node::Void(_)))
    {
        out.insert(0, placeholder.unwrap_or_else(|| Node::text("")));
    }

    *children = out;
}
