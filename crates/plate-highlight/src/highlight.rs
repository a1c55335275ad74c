use tracing::{debug, trace};

use crate::command::{Command, CommandRegistry, CommandState, ExecuteOptions};
use crate::config::HighlightConfig;
use crate::document::AttrValue;
use crate::editor::Editor;
use crate::error::{ApplyError, RegistryError};
use crate::schema::NodeSchema;

pub const HIGHLIGHT_ATTRIBUTE: &str = "highlight";
pub const REMOVE_HIGHLIGHT_COMMAND: &str = "highlight.remove";

const HIGHLIGHTABLE_BLOCKS: &[&str] = &["paragraph", "heading"];

#[derive(Debug, Clone)]
pub struct HighlightCommand {
    id: String,
    attribute_value: String,
    state: CommandState,
}

impl HighlightCommand {
    pub fn new(attribute_value: impl Into<String>) -> Self {
        let attribute_value = attribute_value.into();
        Self {
            id: format!("highlight.{attribute_value}"),
            attribute_value,
            state: CommandState::default(),
        }
    }

    pub fn attribute_value(&self) -> &str {
        &self.attribute_value
    }

    pub fn is_active(&self) -> bool {
        self.state.value.is_some()
    }
}

impl Command for HighlightCommand {
    fn id(&self) -> &str {
        &self.id
    }

    fn refresh(&mut self, editor: &Editor) {
        let doc = editor.doc();
        let selection = editor.selection();

        let current = selection.attribute(doc, HIGHLIGHT_ATTRIBUTE);
        let active = current.and_then(AttrValue::as_str) == Some(self.attribute_value.as_str());
        self.state.value = active.then(|| AttrValue::String(self.attribute_value.clone()));
        self.state.is_enabled =
            editor
                .schema()
                .check_attribute_in_selection(doc, selection, HIGHLIGHT_ATTRIBUTE);
    }

    fn execute(&self, editor: &mut Editor, options: ExecuteOptions<'_>) -> Result<(), ApplyError> {
        let value = AttrValue::String(self.attribute_value.clone());
        apply_to_valid_ranges(editor, &self.id, Some(&value), options)?;
        Ok(())
    }

    fn state(&self) -> &CommandState {
        &self.state
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoveHighlightCommand {
    state: CommandState,
}

impl RemoveHighlightCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for RemoveHighlightCommand {
    fn id(&self) -> &str {
        REMOVE_HIGHLIGHT_COMMAND
    }

    fn refresh(&mut self, editor: &Editor) {
        let doc = editor.doc();
        let selection = editor.selection();

        self.state.value = selection.attribute(doc, HIGHLIGHT_ATTRIBUTE).cloned();
        self.state.is_enabled =
            editor
                .schema()
                .check_attribute_in_selection(doc, selection, HIGHLIGHT_ATTRIBUTE);
    }

    fn execute(&self, editor: &mut Editor, options: ExecuteOptions<'_>) -> Result<(), ApplyError> {
        apply_to_valid_ranges(editor, REMOVE_HIGHLIGHT_COMMAND, None, options)?;
        Ok(())
    }

    fn state(&self) -> &CommandState {
        &self.state
    }
}

fn apply_to_valid_ranges(
    editor: &mut Editor,
    command_id: &str,
    value: Option<&AttrValue>,
    options: ExecuteOptions<'_>,
) -> Result<usize, ApplyError> {
    if editor.selection().is_collapsed() {
        trace!(command = command_id, "collapsed selection, nothing to do");
        return Ok(0);
    }

    let mut changes = editor.begin_changes();
    let ranges = changes.schema().get_valid_ranges(
        changes.doc(),
        changes.selection().ranges(),
        HIGHLIGHT_ATTRIBUTE,
    );

    let shared = options.batch.is_some();
    let mut owned = None;
    let batch = match options.batch {
        Some(batch) => batch,
        None => owned.insert(changes.batch().source(format!("command:{command_id}"))),
    };

    for range in &ranges {
        match value {
            Some(value) => batch.set_attribute(range.clone(), HIGHLIGHT_ATTRIBUTE, value.clone()),
            None => batch.remove_attribute(range.clone(), HIGHLIGHT_ATTRIBUTE),
        };
    }
    changes.apply(batch)?;

    if let Some(batch) = owned {
        changes.record(batch);
    }
    changes.commit();

    debug!(
        command = command_id,
        ranges = ranges.len(),
        shared_batch = shared,
        "executed highlight command"
    );
    Ok(ranges.len())
}

#[derive(Debug, Clone, Default)]
pub struct HighlightPlugin {
    config: HighlightConfig,
}

impl HighlightPlugin {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }

    pub fn register(
        &self,
        schema: &mut NodeSchema,
        registry: &mut CommandRegistry,
    ) -> Result<(), RegistryError> {
        for kind in HIGHLIGHTABLE_BLOCKS {
            schema.allow_text_attribute(kind, HIGHLIGHT_ATTRIBUTE);
        }

        for option in &self.config.options {
            registry.register(Box::new(HighlightCommand::new(option.model.clone())))?;
        }
        registry.register(Box::new(RemoveHighlightCommand::new()))?;
        Ok(())
    }
}
