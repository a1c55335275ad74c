use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::document::{
    AttrValue, Document, Inline, Node, Path, TextNode, normalize_inline_children,
};
use crate::error::ApplyError;
use crate::ops::{Batch, Op};
use crate::schema::Schema;
use crate::selection::{Range, Selection};

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub version: u64,
    pub ops: usize,
}

pub type ChangeListener = Box<dyn FnMut(&ChangeEvent) + Send>;

pub struct Editor {
    doc: Document,
    selection: Selection,
    schema: Arc<dyn Schema>,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    version: u64,
    listeners: Vec<ChangeListener>,
    next_block: u64,
    rolled_back: HashSet<u64>,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, schema: Arc<dyn Schema>) -> Self {
        let mut editor = Self {
            doc,
            selection,
            schema,
            config: EditorConfig::default().with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            version: 0,
            listeners: Vec::new(),
            next_block: 0,
            rolled_back: HashSet::new(),
        };
        editor.doc.normalize();
        editor
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config.with_defaults();
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn batch(&self) -> Batch {
        Batch::new()
    }

    pub fn begin_changes(&mut self) -> ChangeBlock<'_> {
        ChangeBlock::begin(self)
    }

    pub fn record(&mut self, mut batch: Batch) -> bool {
        batch.rewind(&self.rolled_back);
        let Batch {
            mut inverse_ops,
            selection_before,
            selection_after,
            ..
        } = batch;
        if inverse_ops.is_empty() {
            return false;
        }
        inverse_ops.reverse();

        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before: selection_before.unwrap_or_else(|| self.selection.clone()),
            selection_after: selection_after.unwrap_or_else(|| self.selection.clone()),
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let redo_ops = self.replay(&inverse_ops);
        self.selection = selection_before.clone();
        self.notify(inverse_ops.len());

        self.redo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: redo_ops,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let undo_ops = self.replay(&inverse_ops);
        self.selection = selection_after.clone();
        self.notify(inverse_ops.len());

        self.undo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: undo_ops,
        });
        true
    }

    fn replay(&mut self, ops: &[Op]) -> Vec<Op> {
        let mut inverse: Vec<Op> = Vec::new();
        for op in ops {
            match apply_op_to(&mut self.doc, op) {
                Ok(mut inv) => inverse.append(&mut inv),
                Err(err) => {
                    // Stop mutating further once history no longer matches the document.
                    warn!(%err, "failed to replay history op");
                    break;
                }
            }
        }
        inverse.reverse();
        inverse
    }

    fn notify(&mut self, ops: usize) {
        self.version += 1;
        let event = ChangeEvent {
            version: self.version,
            ops,
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

// Dropping without commit, including during unwind, restores the snapshot taken at begin.
pub struct ChangeBlock<'a> {
    editor: &'a mut Editor,
    id: u64,
    snapshot: Option<(Document, Selection)>,
    records: Vec<Batch>,
    applied_ops: usize,
}

impl<'a> ChangeBlock<'a> {
    fn begin(editor: &'a mut Editor) -> Self {
        editor.next_block += 1;
        let id = editor.next_block;
        let snapshot = Some((editor.doc.clone(), editor.selection.clone()));
        Self {
            editor,
            id,
            snapshot,
            records: Vec::new(),
            applied_ops: 0,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.editor.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.editor.selection
    }

    pub fn schema(&self) -> &dyn Schema {
        self.editor.schema.as_ref()
    }

    pub fn batch(&self) -> Batch {
        self.editor.batch()
    }

    // Returns how many pending ops changed the document. On error the batch is left as it was.
    pub fn apply(&mut self, batch: &mut Batch) -> Result<usize, ApplyError> {
        batch.rewind(&self.editor.rolled_back);

        let start = batch.applied.min(batch.ops.len());
        let mut inverse: Vec<Op> = Vec::new();
        let mut changed = 0;
        for op in &batch.ops[start..] {
            let inv = apply_op_to(&mut self.editor.doc, op)?;
            if !inv.is_empty() {
                changed += 1;
            }
            inverse.extend(inv);
        }

        batch.mark(self.id);
        if batch.selection_before.is_none() {
            batch.selection_before = Some(self.editor.selection.clone());
        }
        batch.inverse_ops.append(&mut inverse);
        batch.applied = batch.ops.len();
        batch.selection_after = Some(self.editor.selection.clone());
        self.applied_ops += changed;
        Ok(changed)
    }

    pub fn record(&mut self, batch: Batch) {
        self.records.push(batch);
    }

    pub fn commit(mut self) -> u64 {
        self.snapshot = None;
        for batch in std::mem::take(&mut self.records) {
            self.editor.record(batch);
        }
        if self.applied_ops > 0 {
            self.editor.notify(self.applied_ops);
            debug!(
                version = self.editor.version,
                ops = self.applied_ops,
                "committed changes"
            );
        }
        self.editor.version
    }
}

impl Drop for ChangeBlock<'_> {
    fn drop(&mut self) {
        let Some((doc, selection)) = self.snapshot.take() else {
            return;
        };
        if self.applied_ops > 0 {
            warn!(ops = self.applied_ops, "rolling back uncommitted changes");
        }
        self.editor.rolled_back.insert(self.id);
        self.editor.doc = doc;
        self.editor.selection = selection;
    }
}

fn apply_op_to(doc: &mut Document, op: &Op) -> Result<Vec<Op>, ApplyError> {
    match op {
        Op::SetAttribute { range, key, value } => {
            set_attribute_in_range(doc, range, key, value.as_ref())
        }
    }
}

fn set_attribute_in_range(
    doc: &mut Document,
    range: &Range,
    key: &str,
    value: Option<&AttrValue>,
) -> Result<Vec<Op>, ApplyError> {
    for position in [&range.start, &range.end] {
        let block = doc
            .block(&position.path)
            .ok_or_else(|| ApplyError::InvalidPath(format!("No text block at {:?}", position.path)))?;
        if position.offset > block.inline_len() {
            return Err(ApplyError::InvalidRange(format!(
                "Offset {} past end of block {:?} ({})",
                position.offset,
                position.path,
                block.inline_len()
            )));
        }
    }
    if range.end < range.start {
        return Err(ApplyError::InvalidRange("Range end before start".into()));
    }

    let paths: Vec<Path> = doc
        .text_blocks()
        .into_iter()
        .map(|b| b.path)
        .filter(|p| p >= &range.start.path && p <= &range.end.path)
        .collect();

    let mut inverse: Vec<Op> = Vec::new();
    for path in paths {
        let el = doc.block_mut(&path)?;
        let lo = if path == range.start.path {
            range.start.offset
        } else {
            0
        };
        let hi = if path == range.end.path {
            range.end.offset
        } else {
            el.inline_len()
        };
        if lo >= hi {
            continue;
        }

        let (children, mut inv) = set_attribute_in_block(&path, &el.children, lo, hi, key, value);
        el.children = children;
        normalize_inline_children(&mut el.children);
        inverse.append(&mut inv);
    }

    Ok(inverse)
}

fn set_attribute_in_block(
    path: &Path,
    children: &[Node],
    lo: usize,
    hi: usize,
    key: &str,
    value: Option<&AttrValue>,
) -> (Vec<Node>, Vec<Op>) {
    let mut out: Vec<Node> = Vec::with_capacity(children.len() + 2);
    let mut inverse: Vec<Op> = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        let len = match node {
            Node::Text(t) => Inline::Text(t).len(),
            Node::Void(v) => Inline::Void(v).len(),
            Node::Element(_) => {
                out.push(node.clone());
                continue;
            }
        };
        let (node_start, node_end) = (cursor, cursor + len);
        cursor = node_end;

        if hi <= node_start || lo >= node_end {
            out.push(node.clone());
            continue;
        }

        match node {
            Node::Void(v) if v.attrs.get(key) == value => out.push(node.clone()),
            Node::Text(t) if t.attrs.get(key) == value => out.push(node.clone()),
            Node::Void(v) => {
                let mut next = v.clone();
                let old = patch_attr(&mut next.attrs, key, value);
                inverse.push(Op::SetAttribute {
                    range: Range::in_block(path.clone(), node_start, node_end),
                    key: key.to_string(),
                    value: old,
                });
                out.push(Node::Void(next));
            }
            Node::Text(t) => {
                let sel_start = clamp_to_char_boundary(&t.text, lo.saturating_sub(node_start));
                let sel_end = clamp_to_char_boundary(&t.text, hi.saturating_sub(node_start));
                if sel_start >= sel_end {
                    out.push(node.clone());
                    continue;
                }

                let prefix = &t.text[..sel_start];
                let middle = &t.text[sel_start..sel_end];
                let suffix = &t.text[sel_end..];

                if !prefix.is_empty() {
                    out.push(Node::Text(TextNode {
                        text: prefix.to_string(),
                        attrs: t.attrs.clone(),
                    }));
                }

                let mut attrs = t.attrs.clone();
                let old = patch_attr(&mut attrs, key, value);
                inverse.push(Op::SetAttribute {
                    range: Range::in_block(
                        path.clone(),
                        node_start + sel_start,
                        node_start + sel_end,
                    ),
                    key: key.to_string(),
                    value: old,
                });
                out.push(Node::Text(TextNode {
                    text: middle.to_string(),
                    attrs,
                }));

                if !suffix.is_empty() {
                    out.push(Node::Text(TextNode {
                        text: suffix.to_string(),
                        attrs: t.attrs.clone(),
                    }));
                }
            }
            Node::Element(_) => {}
        }
    }

    (out, inverse)
}

fn patch_attr(
    attrs: &mut crate::document::Attrs,
    key: &str,
    value: Option<&AttrValue>,
) -> Option<AttrValue> {
    match value {
        Some(value) => attrs.insert(key.to_string(), value.clone()),
        None => attrs.remove(key),
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
