//! Command registry keyed by (category, command id).

use std::collections::HashMap;
use std::sync::Arc;

use crate::commander::catalog;
use crate::commander::command::{BotCategory, BotCommand, CommandMetadata};
use crate::error::CommandError;

/// Append-only map from (category, command id) to command metadata.
///
/// Built once during startup and handed to the engine, which only reads it.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: Vec<Arc<BotCommand>>,
    index: HashMap<(BotCategory, String), usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the stock catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for command in catalog::builtin_commands() {
            // Catalog entries are unique and valid; a failure here means the
            // table itself is broken.
            if let Err(e) = registry.register(command) {
                tracing::error!("Builtin catalog entry rejected: {}", e);
            }
        }
        tracing::info!("Registered {} builtin bot commands", registry.len());
        registry
    }

    /// Add a command. Fails without modifying the registry when the key is
    /// taken or the metadata is invalid.
    pub fn register(&mut self, command: BotCommand) -> Result<Arc<BotCommand>, CommandError> {
        command.validate()?;
        let key = (command.category, command.command_id.clone());
        if self.index.contains_key(&key) {
            return Err(CommandError::Duplicate {
                category: command.category,
                command_id: command.command_id,
            });
        }
        let command = Arc::new(command);
        self.index.insert(key, self.commands.len());
        self.commands.push(Arc::clone(&command));
        Ok(command)
    }

    pub fn lookup(
        &self,
        category: BotCategory,
        command_id: &str,
    ) -> Result<Arc<BotCommand>, CommandError> {
        self.index
            .get(&(category, command_id.to_string()))
            .map(|&i| Arc::clone(&self.commands[i]))
            .ok_or_else(|| CommandError::NotFound {
                category: category.to_string(),
                command_id: command_id.to_string(),
            })
    }

    /// Lookup by textual category. An unrecognised category is reported as
    /// `NotFound` since nothing can be registered under it.
    pub fn resolve(&self, category: &str, command_id: &str) -> Result<Arc<BotCommand>, CommandError> {
        let parsed = BotCategory::parse(category).map_err(|_| CommandError::NotFound {
            category: category.to_string(),
            command_id: command_id.to_string(),
        })?;
        self.lookup(parsed, command_id)
    }

    pub fn contains(&self, category: BotCategory, command_id: &str) -> bool {
        self.index.contains_key(&(category, command_id.to_string()))
    }

    /// Commands in insertion order, optionally filtered by category.
    pub fn list(&self, category: Option<BotCategory>) -> Vec<CommandMetadata> {
        self.iter()
            .filter(|cmd| category.is_none_or(|c| cmd.category == c))
            .map(|cmd| cmd.metadata())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BotCommand>> {
        self.commands.iter()
    }

    pub fn command_ids(&self, category: BotCategory) -> Vec<String> {
        self.iter()
            .filter(|cmd| cmd.category == category)
            .map(|cmd| cmd.command_id.clone())
            .collect()
    }

    pub fn count(&self, category: BotCategory) -> usize {
        self.iter().filter(|cmd| cmd.category == category).count()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
