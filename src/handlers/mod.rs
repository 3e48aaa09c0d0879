//! Category handlers: the collaborators that perform a command's work.
//!
//! The engine only sees the [`CategoryHandler`] trait. A [`HandlerSet`] maps
//! each of the ten categories to at most one handler; a missing entry is a
//! normal state and makes executions in that category fail with
//! `handler_unavailable`.

mod catalog;

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use self::catalog::CatalogHandler;

use crate::commander::{BotCategory, CommandRegistry, Parameters};
use crate::error::HandlerError;

/// Performs the work for the commands of one category.
#[async_trait]
pub trait CategoryHandler: Send + Sync {
    async fn execute(
        &self,
        command_id: &str,
        parameters: &Parameters,
        context: Option<&Parameters>,
    ) -> Result<Value, HandlerError>;
}

/// Category to handler map, built at startup.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<BotCategory, Arc<dyn CategoryHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`CatalogHandler`] per category, each covering the commands the
    /// registry holds for it.
    pub fn catalog(registry: &CommandRegistry) -> Self {
        let mut set = Self::new();
        for category in BotCategory::ALL {
            set.insert(category, CatalogHandler::from_registry(category, registry));
        }
        set
    }

    pub fn insert<H>(&mut self, category: BotCategory, handler: H) -> &mut Self
    where
        H: CategoryHandler + 'static,
    {
        self.handlers.insert(category, Arc::new(handler));
        self
    }

    pub fn insert_arc(
        &mut self,
        category: BotCategory,
        handler: Arc<dyn CategoryHandler>,
    ) -> &mut Self {
        self.handlers.insert(category, handler);
        self
    }

    pub fn with<H>(mut self, category: BotCategory, handler: H) -> Self
    where
        H: CategoryHandler + 'static,
    {
        self.insert(category, handler);
        self
    }

    pub fn remove(&mut self, category: BotCategory) -> Option<Arc<dyn CategoryHandler>> {
        self.handlers.remove(&category)
    }

    pub fn get(&self, category: BotCategory) -> Option<Arc<dyn CategoryHandler>> {
        self.handlers.get(&category).cloned()
    }

    pub fn is_available(&self, category: BotCategory) -> bool {
        self.handlers.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<_> = self.handlers.keys().collect();
        categories.sort();
        f.debug_struct("HandlerSet")
            .field("categories", &categories)
            .finish()
    }
}

/// Adapts an async closure into a handler.
///
/// ```
/// use botcommander::error::HandlerError;
/// use botcommander::handlers::FnHandler;
/// use serde_json::json;
///
/// let handler = FnHandler::new(|command_id, _params, _ctx| async move {
///     Ok::<_, HandlerError>(json!({ "ran": command_id }))
/// });
/// # let _ = handler;
/// ```
pub struct FnHandler<F, Fut> {
    func: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(String, Parameters, Option<Parameters>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> CategoryHandler for FnHandler<F, Fut>
where
    F: Fn(String, Parameters, Option<Parameters>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn execute(
        &self,
        command_id: &str,
        parameters: &Parameters,
        context: Option<&Parameters>,
    ) -> Result<Value, HandlerError> {
        (self.func)(
            command_id.to_string(),
            parameters.clone(),
            context.cloned(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fn_handler_receives_owned_arguments() {
        let handler = FnHandler::new(|command_id, params, ctx| async move {
            Ok::<_, HandlerError>(json!({
                "command": command_id,
                "params": Value::Object(params),
                "has_context": ctx.is_some(),
            }))
        });

        let mut params = Parameters::new();
        params.insert("x".to_string(), json!(1));
        let out = handler.execute("risk_warden", &params, None).await.unwrap();
        assert_eq!(out["command"], "risk_warden");
        assert_eq!(out["params"]["x"], 1);
        assert_eq!(out["has_context"], false);
    }

    #[test]
    fn catalog_set_covers_every_category() {
        let registry = CommandRegistry::builtin();
        let mut set = HandlerSet::catalog(&registry);
        assert_eq!(set.len(), 10);
        assert!(set.is_available(BotCategory::MetaBots));

        set.remove(BotCategory::MetaBots);
        assert!(!set.is_available(BotCategory::MetaBots));
        assert!(set.get(BotCategory::MetaBots).is_none());
    }
}
