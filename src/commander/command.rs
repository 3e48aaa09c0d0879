//! Command metadata: categories, constraints and retry policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// The ten bot categories commands are grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCategory {
    Chatbots,
    TradingBots,
    SocialMediaBots,
    RpaBots,
    GameBots,
    RedTeamBots,
    ResearchBots,
    CreativeBots,
    PhysicalWorldBots,
    MetaBots,
}

impl BotCategory {
    pub const ALL: [BotCategory; 10] = [
        Self::Chatbots,
        Self::TradingBots,
        Self::SocialMediaBots,
        Self::RpaBots,
        Self::GameBots,
        Self::RedTeamBots,
        Self::ResearchBots,
        Self::CreativeBots,
        Self::PhysicalWorldBots,
        Self::MetaBots,
    ];

    /// Canonical identifier, e.g. `trading_bots`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chatbots => "chatbots",
            Self::TradingBots => "trading_bots",
            Self::SocialMediaBots => "social_media_bots",
            Self::RpaBots => "rpa_bots",
            Self::GameBots => "game_bots",
            Self::RedTeamBots => "red_team_bots",
            Self::ResearchBots => "research_bots",
            Self::CreativeBots => "creative_bots",
            Self::PhysicalWorldBots => "physical_world_bots",
            Self::MetaBots => "meta_bots",
        }
    }

    /// Short form used in directives, e.g. `trading`.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Chatbots => "chat",
            Self::TradingBots => "trading",
            Self::SocialMediaBots => "social_media",
            Self::RpaBots => "rpa",
            Self::GameBots => "game",
            Self::RedTeamBots => "red_team",
            Self::ResearchBots => "research",
            Self::CreativeBots => "creative",
            Self::PhysicalWorldBots => "physical_world",
            Self::MetaBots => "meta",
        }
    }

    /// Human-readable name, e.g. `Trading Bots`.
    pub fn display_name(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse a canonical name or alias. Case-insensitive; `-` and spaces
    /// normalise to `_`.
    pub fn parse(value: &str) -> Result<Self, CommandError> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match normalized.as_str() {
            "chatbots" | "chat" | "chatbot" => Self::Chatbots,
            "trading_bots" | "trading" => Self::TradingBots,
            "social_media_bots" | "social_media" | "social" => Self::SocialMediaBots,
            "rpa_bots" | "rpa" => Self::RpaBots,
            "game_bots" | "game" => Self::GameBots,
            "red_team_bots" | "red_team" => Self::RedTeamBots,
            "research_bots" | "research" => Self::ResearchBots,
            "creative_bots" | "creative" => Self::CreativeBots,
            "physical_world_bots" | "physical_world" | "physical" => Self::PhysicalWorldBots,
            "meta_bots" | "meta" => Self::MetaBots,
            _ => return Err(CommandError::UnknownCategory(value.to_string())),
        };
        Ok(category)
    }
}

impl std::fmt::Display for BotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BotCategory {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Local precondition checked before compliance validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyConstraint {
    HumanOversight,
    AuditTrail,
    RollbackCapability,
}

impl SafetyConstraint {
    pub const ALL: [SafetyConstraint; 3] = [
        Self::HumanOversight,
        Self::AuditTrail,
        Self::RollbackCapability,
    ];
}

/// Declared retry behaviour for a command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        backoff_factor: 1.0,
    };

    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 2.0)
    }
}

/// Immutable description of one invokable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCommand {
    pub category: BotCategory,
    pub command_id: String,
    pub name: String,
    pub description: String,
    /// Expected parameter names. Documentation only; not enforced.
    pub parameters: Vec<String>,
    pub compliance_requirements: BTreeSet<String>,
    /// Seconds.
    pub execution_timeout: u64,
    pub retry_policy: RetryPolicy,
    pub safety_constraints: BTreeSet<SafetyConstraint>,
}

impl BotCommand {
    /// Start a command with builtin defaults: 30s timeout, retry `{3, 2.0}`,
    /// every safety constraint.
    pub fn new(
        category: BotCategory,
        command_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            category,
            command_id: command_id.into(),
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            compliance_requirements: BTreeSet::new(),
            execution_timeout: 30,
            retry_policy: RetryPolicy::default(),
            safety_constraints: SafetyConstraint::ALL.into_iter().collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_compliance<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compliance_requirements = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.execution_timeout = seconds;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_safety<I>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = SafetyConstraint>,
    {
        self.safety_constraints = constraints.into_iter().collect();
        self
    }

    /// Registry key, `<category>:<command_id>`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.category, self.command_id)
    }

    pub fn requires(&self, constraint: SafetyConstraint) -> bool {
        self.safety_constraints.contains(&constraint)
    }

    /// Check the metadata invariants enforced at registration.
    pub fn validate(&self) -> Result<(), CommandError> {
        let invalid = |reason: &str| CommandError::InvalidCommand {
            command_id: self.command_id.clone(),
            reason: reason.to_string(),
        };
        if self.command_id.trim().is_empty() {
            return Err(invalid("command id must not be empty"));
        }
        if self.execution_timeout == 0 {
            return Err(invalid("execution timeout must be > 0"));
        }
        if !self.retry_policy.backoff_factor.is_finite() || self.retry_policy.backoff_factor < 1.0
        {
            return Err(invalid("backoff factor must be >= 1"));
        }
        Ok(())
    }

    pub fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            command_id: self.command_id.clone(),
            category: self.category,
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            compliance_requirements: self.compliance_requirements.iter().cloned().collect(),
            execution_timeout: self.execution_timeout,
            retry_policy: self.retry_policy,
            safety_constraints: self.safety_constraints.iter().copied().collect(),
        }
    }
}

/// Listing view of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub command_id: String,
    pub category: BotCategory,
    pub name: String,
    pub description: String,
    pub parameters: Vec<String>,
    pub compliance_requirements: Vec<String>,
    pub execution_timeout: u64,
    pub retry_policy: RetryPolicy,
    pub safety_constraints: Vec<SafetyConstraint>,
}

/// Per-category summary returned by `list_categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: BotCategory,
    pub display_name: String,
    pub handler_available: bool,
    pub command_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!(
            BotCategory::parse("trading_bots").unwrap(),
            BotCategory::TradingBots
        );
        assert_eq!(BotCategory::parse("trading").unwrap(), BotCategory::TradingBots);
        assert_eq!(BotCategory::parse("Red-Team").unwrap(), BotCategory::RedTeamBots);
        assert_eq!(
            BotCategory::parse(" physical world ").unwrap(),
            BotCategory::PhysicalWorldBots
        );
        assert!(matches!(
            BotCategory::parse("crypto"),
            Err(CommandError::UnknownCategory(_))
        ));
    }

    #[test]
    fn every_category_round_trips_through_both_names() {
        for category in BotCategory::ALL {
            assert_eq!(BotCategory::parse(category.as_str()).unwrap(), category);
            assert_eq!(BotCategory::parse(category.alias()).unwrap(), category);
        }
    }

    #[test]
    fn display_name_is_title_cased() {
        assert_eq!(BotCategory::TradingBots.display_name(), "Trading Bots");
        assert_eq!(BotCategory::Chatbots.display_name(), "Chatbots");
        assert_eq!(
            BotCategory::PhysicalWorldBots.display_name(),
            "Physical World Bots"
        );
    }

    #[test]
    fn validate_rejects_zero_timeout_and_low_backoff() {
        let cmd = BotCommand::new(BotCategory::MetaBots, "bot_god", "Bot God").with_timeout(0);
        assert!(matches!(
            cmd.validate(),
            Err(CommandError::InvalidCommand { .. })
        ));

        let cmd = BotCommand::new(BotCategory::MetaBots, "bot_god", "Bot God")
            .with_retry_policy(RetryPolicy::new(1, 0.5));
        assert!(cmd.validate().is_err());

        let cmd = BotCommand::new(BotCategory::MetaBots, " ", "Blank");
        assert!(cmd.validate().is_err());

        let cmd = BotCommand::new(BotCategory::MetaBots, "bot_god", "Bot God");
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn key_uses_canonical_category() {
        let cmd = BotCommand::new(BotCategory::Chatbots, "empathy_engine", "Empathy Engine");
        assert_eq!(cmd.key(), "chatbots:empathy_engine");
    }
}
