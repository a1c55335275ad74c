use std::collections::HashMap;

use crate::document::AttrValue;
use crate::editor::Editor;
use crate::error::{ApplyError, CommandError, RegistryError};
use crate::ops::Batch;

#[derive(Debug, Default)]
pub struct ExecuteOptions<'b> {
    pub batch: Option<&'b mut Batch>,
}

impl<'b> ExecuteOptions<'b> {
    pub fn with_batch(batch: &'b mut Batch) -> Self {
        Self { batch: Some(batch) }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandState {
    pub value: Option<AttrValue>,
    pub is_enabled: bool,
}

pub trait Command: Send + Sync {
    fn id(&self) -> &str;

    fn refresh(&mut self, editor: &Editor);

    fn execute(&self, editor: &mut Editor, options: ExecuteOptions<'_>) -> Result<(), ApplyError>;

    fn state(&self) -> &CommandState;

    fn value(&self) -> Option<&AttrValue> {
        self.state().value.as_ref()
    }

    fn is_enabled(&self) -> bool {
        self.state().is_enabled
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Box<dyn Command>) -> Result<(), RegistryError> {
        let id = command.id().to_string();
        if self.commands.contains_key(&id) {
            return Err(RegistryError::DuplicateCommand(id));
        }
        self.commands.insert(id, command);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Command> {
        self.commands.get(id).map(|c| c.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn refresh_all(&mut self, editor: &Editor) {
        for command in self.commands.values_mut() {
            command.refresh(editor);
        }
    }

    pub fn execute(
        &self,
        id: &str,
        editor: &mut Editor,
        options: ExecuteOptions<'_>,
    ) -> Result<(), CommandError> {
        let Some(command) = self.commands.get(id) else {
            return Err(CommandError::Unknown(id.to_string()));
        };
        command
            .execute(editor, options)
            .map_err(|source| CommandError::Apply {
                id: id.to_string(),
                source,
            })
    }
}
