use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::document::AttrValue;
use crate::selection::{Range, Selection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    SetAttribute {
        range: Range,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<AttrValue>,
    },
}

impl Op {
    pub fn range(&self) -> &Range {
        match self {
            Op::SetAttribute { range, .. } => range,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub(crate) ops: Vec<Op>,
    #[serde(skip)]
    pub(crate) inverse_ops: Vec<Op>,
    #[serde(skip)]
    pub(crate) applied: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) selection_before: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) selection_after: Option<Selection>,
    #[serde(default)]
    pub meta: BatchMeta,
    #[serde(skip)]
    pub(crate) marks: Vec<ApplyMark>,
}

// Batch state before the first apply inside one change block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApplyMark {
    pub(crate) block: u64,
    pub(crate) applied: usize,
    pub(crate) inverse_len: usize,
    pub(crate) selection_before: Option<Selection>,
    pub(crate) selection_after: Option<Selection>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn push(&mut self, op: Op) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn set_attribute(
        &mut self,
        range: Range,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> &mut Self {
        self.push(Op::SetAttribute {
            range,
            key: key.into(),
            value: Some(value.into()),
        })
    }

    pub fn remove_attribute(&mut self, range: Range, key: impl Into<String>) -> &mut Self {
        self.push(Op::SetAttribute {
            range,
            key: key.into(),
            value: None,
        })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn pending(&self) -> &[Op] {
        &self.ops[self.applied.min(self.ops.len())..]
    }

    pub fn inverse_ops(&self) -> &[Op] {
        &self.inverse_ops
    }

    pub fn selection_before(&self) -> Option<&Selection> {
        self.selection_before.as_ref()
    }

    pub fn selection_after(&self) -> Option<&Selection> {
        self.selection_after.as_ref()
    }

    pub(crate) fn mark(&mut self, block: u64) {
        if self.marks.last().is_some_and(|m| m.block == block) {
            return;
        }
        self.marks.push(ApplyMark {
            block,
            applied: self.applied,
            inverse_len: self.inverse_ops.len(),
            selection_before: self.selection_before.clone(),
            selection_after: self.selection_after.clone(),
        });
    }

    // Forgets everything applied since the earliest block that was rolled back.
    pub(crate) fn rewind(&mut self, rolled_back: &HashSet<u64>) {
        let Some(ix) = self.marks.iter().position(|m| rolled_back.contains(&m.block)) else {
            return;
        };
        let Some(mark) = self.marks.drain(ix..).next() else {
            return;
        };
        self.applied = mark.applied;
        self.inverse_ops.truncate(mark.inverse_len);
        self.selection_before = mark.selection_before;
        self.selection_after = mark.selection_after;
    }
}
