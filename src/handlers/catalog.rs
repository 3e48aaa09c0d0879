//! Stock handler that acknowledges the registered commands of a category.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::commander::{BotCategory, CommandRegistry, Parameters};
use crate::error::HandlerError;
use crate::handlers::CategoryHandler;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    inputs: Vec<String>,
}

/// Placeholder behaviour for a category: known command ids return a
/// structured acknowledgement echoing the declared inputs, unknown ids fail.
#[derive(Debug, Clone)]
pub struct CatalogHandler {
    category: BotCategory,
    commands: HashMap<String, Entry>,
}

impl CatalogHandler {
    pub fn from_registry(category: BotCategory, registry: &CommandRegistry) -> Self {
        let commands = registry
            .iter()
            .filter(|cmd| cmd.category == category)
            .map(|cmd| {
                (
                    cmd.command_id.clone(),
                    Entry {
                        name: cmd.name.clone(),
                        inputs: cmd.parameters.clone(),
                    },
                )
            })
            .collect();
        Self { category, commands }
    }

    pub fn category(&self) -> BotCategory {
        self.category
    }

    pub fn supports(&self, command_id: &str) -> bool {
        self.commands.contains_key(command_id)
    }
}

#[async_trait]
impl CategoryHandler for CatalogHandler {
    async fn execute(
        &self,
        command_id: &str,
        parameters: &Parameters,
        context: Option<&Parameters>,
    ) -> Result<Value, HandlerError> {
        let entry = self
            .commands
            .get(command_id)
            .ok_or_else(|| HandlerError::UnknownCommand {
                category: self.category,
                command_id: command_id.to_string(),
            })?;

        let mut inputs = Map::new();
        let mut missing = Vec::new();
        for name in &entry.inputs {
            match parameters.get(name) {
                Some(value) => {
                    inputs.insert(name.clone(), value.clone());
                }
                None => missing.push(name.clone()),
            }
        }

        tracing::debug!("Executed {} command: {}", self.category, command_id);

        Ok(json!({
            "status": "success",
            "action": format!("{command_id}_complete"),
            "category": self.category,
            "command": entry.name,
            "inputs": inputs,
            "missing_inputs": missing,
            "context_provided": context.is_some(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acknowledges_known_commands() {
        let registry = CommandRegistry::builtin();
        let handler = CatalogHandler::from_registry(BotCategory::TradingBots, &registry);

        let mut params = Parameters::new();
        params.insert("portfolio".to_string(), json!({"value": 1000}));
        let out = handler.execute("risk_warden", &params, None).await.unwrap();

        assert_eq!(out["status"], "success");
        assert_eq!(out["action"], "risk_warden_complete");
        assert_eq!(out["category"], "trading_bots");
        assert_eq!(out["inputs"]["portfolio"]["value"], 1000);
        assert_eq!(out["missing_inputs"], json!(["risk_threshold"]));
    }

    #[tokio::test]
    async fn rejects_commands_from_other_categories() {
        let registry = CommandRegistry::builtin();
        let handler = CatalogHandler::from_registry(BotCategory::Chatbots, &registry);
        assert!(!handler.supports("risk_warden"));

        let err = handler
            .execute("risk_warden", &Parameters::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown chatbots command: risk_warden");
    }
}
