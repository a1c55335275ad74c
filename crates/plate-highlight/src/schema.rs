use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, ElementNode, Inline, TextNode};
use crate::error::RegistryError;
use crate::selection::{Position, Range, Selection};

pub trait Schema: Send + Sync {
    fn check_attribute(&self, parent: &ElementNode, item: Inline<'_>, key: &str) -> bool;

    fn check_attribute_in_selection(
        &self,
        doc: &Document,
        selection: &Selection,
        key: &str,
    ) -> bool {
        if selection.is_collapsed() {
            let Some(range) = selection.first_range() else {
                return false;
            };
            let Some(block) = doc.block(&range.start.path) else {
                return false;
            };
            let typed = TextNode::default();
            return self.check_attribute(block, Inline::Text(&typed), key);
        }

        selection.ranges().iter().any(|range| {
            doc.covered_spans(range)
                .iter()
                .any(|span| self.check_attribute(span.block, span.item, key))
        })
    }

    // Split around disallowed leaves and at block boundaries, in input order.
    fn get_valid_ranges(&self, doc: &Document, ranges: &[Range], key: &str) -> Vec<Range> {
        let mut out = Vec::new();

        for range in ranges {
            let mut current: Option<Range> = None;

            for span in doc.covered_spans(range) {
                if !self.check_attribute(span.block, span.item, key) {
                    if let Some(done) = current.take() {
                        out.push(done);
                    }
                    continue;
                }

                let start = Position::new(span.block_path.clone(), span.start);
                let end = Position::new(span.block_path, span.end);
                let extends = current.as_ref().is_some_and(|cur| cur.end == start);
                if extends {
                    if let Some(cur) = current.as_mut() {
                        cur.end = end;
                    }
                } else if let Some(done) = current.replace(Range { start, end }) {
                    out.push(done);
                }
            }

            if let Some(done) = current.take() {
                out.push(done);
            }
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    // Attributes text directly inside this node may carry.
    #[serde(default)]
    pub text_attributes: Vec<String>,
}

impl NodeSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
            text_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    node_specs: HashMap<String, NodeSpec>,
}

impl NodeSchema {
    pub fn new(specs: impl IntoIterator<Item = NodeSpec>) -> Result<Self, RegistryError> {
        let mut schema = Self::default();
        for spec in specs {
            schema.register(spec)?;
        }
        Ok(schema)
    }

    pub fn core() -> Self {
        let specs = vec![
            NodeSpec::new("paragraph"),
            NodeSpec::new("heading"),
            NodeSpec::new("code_block"),
            NodeSpec::new("blockquote"),
            NodeSpec::new("mention"),
            NodeSpec::new("image"),
        ];
        Self::new(specs).expect("core schema must be valid")
    }

    pub fn register(&mut self, spec: NodeSpec) -> Result<(), RegistryError> {
        if self.node_specs.contains_key(&spec.kind) {
            return Err(RegistryError::DuplicateNodeKind(spec.kind));
        }
        self.node_specs.insert(spec.kind.clone(), spec);
        Ok(())
    }

    pub fn spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.node_specs.get(kind)
    }

    pub fn allow_text_attribute(&mut self, block_kind: &str, key: &str) -> bool {
        let Some(spec) = self.node_specs.get_mut(block_kind) else {
            return false;
        };
        if !spec.text_attributes.iter().any(|a| a == key) {
            spec.text_attributes.push(key.to_string());
        }
        true
    }

    pub fn allow_attribute(&mut self, kind: &str, key: &str) -> bool {
        let Some(spec) = self.node_specs.get_mut(kind) else {
            return false;
        };
        if !spec.attributes.iter().any(|a| a == key) {
            spec.attributes.push(key.to_string());
        }
        true
    }
}

impl Schema for NodeSchema {
    fn check_attribute(&self, parent: &ElementNode, item: Inline<'_>, key: &str) -> bool {
        match item {
            Inline::Text(_) => self
                .node_specs
                .get(&parent.kind)
                .is_some_and(|spec| spec.text_attributes.iter().any(|a| a == key)),
            Inline::Void(v) => self
                .node_specs
                .get(&v.kind)
                .is_some_and(|spec| spec.attributes.iter().any(|a| a == key)),
        }
    }
}
