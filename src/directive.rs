//! `// [BOT:<category>:<command_id>, params]` directives embedded in text.
//!
//! Params are either a single JSON object or `key=value` pairs separated by
//! commas. Commas inside quotes, brackets or braces do not split. Each value
//! is decoded as JSON when possible, otherwise kept as a string with
//! surrounding quotes removed.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::commander::{BotCategory, BotCommander, Execution, Parameters};
use crate::error::{DirectiveError, Error};

const HEADER_PATTERN: &str = r"(?i)//\s*\[\s*BOT\s*:\s*([^:\]\r\n]*):";
const KEY_PATTERN: &str = r"^\w+$";

fn header() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(HEADER_PATTERN).ok()).as_ref()
}

fn key_pattern() -> Option<&'static Regex> {
    static KEY: OnceLock<Option<Regex>> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(KEY_PATTERN).ok()).as_ref()
}

/// A directive extracted from text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDirective {
    /// Category as written, lowercased.
    pub category: String,
    pub command: String,
    pub params: Parameters,
    /// The matched `// [BOT:...]` span.
    pub raw_text: String,
    /// 1-based, set by [`find_all`].
    pub line_number: Option<usize>,
}

impl ParsedDirective {
    pub fn bot_category(&self) -> Result<BotCategory, DirectiveError> {
        BotCategory::parse(&self.category).map_err(|_| DirectiveError::InvalidCategory {
            category: self.category.clone(),
            valid: supported_categories().join(", "),
        })
    }
}

/// Parse the first directive in `text`.
pub fn parse(text: &str) -> Result<ParsedDirective, DirectiveError> {
    let regex = header().ok_or(DirectiveError::NotFound)?;
    for captures in regex.captures_iter(text) {
        let (Some(whole), Some(category)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let rest = &text[whole.end()..];
        let Some(close) = closing_bracket(rest) else {
            continue;
        };
        let body = &rest[..close];

        let (command, params_text) = match split_top_level(body).split_first() {
            Some((first, others)) if !others.is_empty() => {
                let offset = first.len() + 1;
                (first.trim().to_string(), body[offset..].trim())
            }
            _ => (body.trim().to_string(), ""),
        };

        return Ok(ParsedDirective {
            category: category.as_str().trim().to_ascii_lowercase(),
            command,
            params: parse_params(params_text)?,
            raw_text: text[whole.start()..whole.end() + close + 1].to_string(),
            line_number: None,
        });
    }
    Err(DirectiveError::NotFound)
}

/// Parse and check the category and command name.
pub fn validate_syntax(text: &str) -> Result<ParsedDirective, DirectiveError> {
    let parsed = parse(text)?;
    parsed.bot_category()?;
    if parsed.command.is_empty() {
        return Err(DirectiveError::EmptyCommand);
    }
    Ok(parsed)
}

/// Every parseable directive in multi-line text, one per line at most.
pub fn find_all(text: &str) -> Vec<ParsedDirective> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| match parse(line) {
            Ok(mut parsed) => {
                parsed.line_number = Some(index + 1);
                Some(parsed)
            }
            Err(DirectiveError::NotFound) => None,
            Err(e) => {
                tracing::warn!("Skipping directive on line {}: {}", index + 1, e);
                None
            }
        })
        .collect()
}

/// Directive category names, one per category.
pub fn supported_categories() -> Vec<&'static str> {
    BotCategory::ALL.iter().map(|c| c.alias()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectiveExample {
    pub category: &'static str,
    pub command: &'static str,
    pub example: &'static str,
    pub description: &'static str,
}

const EXAMPLES: [DirectiveExample; 10] = [
    DirectiveExample {
        category: "chat",
        command: "empathy_engine",
        example: r#"// [BOT:chat:empathy_engine, user_input="Hello", context="support"]"#,
        description: "Detects user frustration and escalates to human",
    },
    DirectiveExample {
        category: "trading",
        command: "risk_warden",
        example: r#"// [BOT:trading:risk_warden, portfolio="crypto", risk_threshold=0.1]"#,
        description: "Auto-sell on drawdown with stablecoin protection",
    },
    DirectiveExample {
        category: "social_media",
        command: "viral_alchemist",
        example: r#"// [BOT:social_media:viral_alchemist, content="product launch", platform="twitter"]"#,
        description: "Analyzes viral potential and generates variants",
    },
    DirectiveExample {
        category: "rpa",
        command: "element_hunter",
        example: r#"// [BOT:rpa:element_hunter, ui_spec="login_form", selectors="auto"]"#,
        description: "Detects UI elements and updates selectors",
    },
    DirectiveExample {
        category: "game",
        command: "anti_detect",
        example: r#"// [BOT:game:anti_detect, game_state="idle", patterns="human_like"]"#,
        description: "Randomizes timing to mimic human behavior",
    },
    DirectiveExample {
        category: "red_team",
        command: "jailbreak_artist",
        example: r#"// [BOT:red_team:jailbreak_artist, ai_model="gpt4", prompts="safety_test"]"#,
        description: "Tests AI safety with prompt injection",
    },
    DirectiveExample {
        category: "research",
        command: "literature_synthesizer",
        example: r#"// [BOT:research:literature_synthesizer, papers="ai_safety", topics="alignment"]"#,
        description: "Analyzes papers and generates literature reviews",
    },
    DirectiveExample {
        category: "creative",
        command: "style_thief",
        example: r#"// [BOT:creative:style_thief, artwork="reference.jpg", style="impressionist"]"#,
        description: "Analyzes artistic style and generates similar art",
    },
    DirectiveExample {
        category: "physical_world",
        command: "drone_scout",
        example: r#"// [BOT:physical_world:drone_scout, area="wildfire_zone", mission="detection"]"#,
        description: "Deploys drone for wildfire detection and emergency response",
    },
    DirectiveExample {
        category: "meta",
        command: "bot_architect",
        example: r#"// [BOT:meta:bot_architect, requirements="automation", constraints="safety"]"#,
        description: "Creates bot specifications and delegation systems",
    },
];

pub fn examples() -> &'static [DirectiveExample] {
    &EXAMPLES
}

impl BotCommander {
    /// Validate a directive and execute it.
    pub async fn execute_directive(&self, text: &str) -> Result<Execution, Error> {
        let parsed = validate_syntax(text)?;
        let execution = self
            .execute_command(&parsed.category, &parsed.command, parsed.params, None)
            .await?;
        Ok(execution)
    }
}

fn parse_params(text: &str) -> Result<Parameters, DirectiveError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Parameters::new());
    }
    if text.starts_with('{') && text.ends_with('}') {
        return serde_json::from_str(text)
            .map_err(|e| DirectiveError::InvalidParameters(e.to_string()));
    }

    let mut params = Parameters::new();
    for pair in split_top_level(text) {
        let Some((key, value)) = pair.split_once('=') else {
            tracing::warn!("Ignoring malformed directive parameter '{}'", pair.trim());
            continue;
        };
        let key = key.trim();
        if !key_pattern().is_some_and(|re| re.is_match(key)) {
            tracing::warn!("Ignoring directive parameter with invalid key '{}'", key);
            continue;
        }
        params.insert(key.to_string(), parse_value(value));
    }
    Ok(params)
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw)
        .unwrap_or_else(|_| Value::String(raw.trim_matches(|c| c == '"' || c == '\'').to_string()))
}

/// Nesting tracker shared by the bracket and comma scanners.
#[derive(Default)]
struct Scanner {
    depth: usize,
    quote: Option<char>,
    escaped: bool,
}

impl Scanner {
    /// Feed one char; returns true when it is structural (outside quotes, at
    /// depth 0 before the char is applied).
    fn step(&mut self, c: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return false;
        }
        let top = self.depth == 0;
        match c {
            '"' | '\'' => self.quote = Some(c),
            '[' | '{' => self.depth += 1,
            ']' | '}' if self.depth > 0 => self.depth -= 1,
            _ => {}
        }
        top
    }
}

/// Byte offset of the `]` closing the directive.
fn closing_bracket(text: &str) -> Option<usize> {
    let mut scanner = Scanner::default();
    text.char_indices()
        .find(|&(_, c)| scanner.step(c) && c == ']')
        .map(|(i, _)| i)
}

/// Split on commas that are not nested or quoted.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut scanner = Scanner::default();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if scanner.step(c) && c == ',' {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_key_value_params() {
        let parsed =
            parse(r#"// [BOT:trading:risk_warden, portfolio="crypto", risk_threshold=0.1]"#)
                .unwrap();
        assert_eq!(parsed.category, "trading");
        assert_eq!(parsed.command, "risk_warden");
        assert_eq!(parsed.params["portfolio"], json!("crypto"));
        assert_eq!(parsed.params["risk_threshold"], json!(0.1));
        assert_eq!(
            parsed.raw_text,
            r#"// [BOT:trading:risk_warden, portfolio="crypto", risk_threshold=0.1]"#
        );
    }

    #[test]
    fn parses_json_object_params() {
        let parsed = parse(
            r#"let x = 1; //[bot: Chat : empathy_engine, {"user_input": "hi", "human_approval": true}] trailing"#,
        )
        .unwrap();
        assert_eq!(parsed.category, "chat");
        assert_eq!(parsed.command, "empathy_engine");
        assert_eq!(parsed.params["human_approval"], json!(true));
        assert!(parsed.raw_text.ends_with("true}]"));
    }

    #[test]
    fn nested_values_do_not_split() {
        let parsed = parse(
            r#"// [BOT:research:literature_synthesizer, papers=["a", "b]"], topics='x, y', depth={"n": 2}, bare=hello]"#,
        )
        .unwrap();
        assert_eq!(parsed.params["papers"], json!(["a", "b]"]));
        assert_eq!(parsed.params["topics"], json!("x, y"));
        assert_eq!(parsed.params["depth"], json!({"n": 2}));
        assert_eq!(parsed.params["bare"], json!("hello"));
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let parsed = parse("// [BOT:meta:bot_architect, oops, bad key=1, ok=true]").unwrap();
        assert_eq!(parsed.params.len(), 1);
        assert_eq!(parsed.params["ok"], json!(true));
    }

    #[test]
    fn invalid_json_object_is_an_error() {
        let err = parse("// [BOT:meta:bot_architect, {not json}]").unwrap_err();
        assert!(matches!(err, DirectiveError::InvalidParameters(_)));
    }

    #[test]
    fn validate_syntax_reports_each_failure() {
        assert_eq!(
            validate_syntax("no directive here").unwrap_err(),
            DirectiveError::NotFound
        );
        assert!(matches!(
            validate_syntax("// [BOT:crypto:moon]").unwrap_err(),
            DirectiveError::InvalidCategory { .. }
        ));
        assert_eq!(
            validate_syntax("// [BOT:chat: , x=1]").unwrap_err(),
            DirectiveError::EmptyCommand
        );
        let ok = validate_syntax("// [BOT:physical_world:drone_scout]").unwrap();
        assert_eq!(ok.bot_category().unwrap(), BotCategory::PhysicalWorldBots);
        assert!(ok.params.is_empty());
    }

    #[test]
    fn find_all_records_line_numbers() {
        let source = "fn main() {}\n// [BOT:game:anti_detect]\n\n  // [BOT:rpa:element_hunter, ui_spec=\"login\"]\n";
        let found = find_all(source);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line_number, Some(2));
        assert_eq!(found[1].line_number, Some(4));
        assert_eq!(found[1].params["ui_spec"], json!("login"));
    }

    #[test]
    fn every_example_validates() {
        assert_eq!(examples().len(), 10);
        assert_eq!(supported_categories().len(), 10);
        for example in examples() {
            let parsed = validate_syntax(example.example).unwrap();
            assert_eq!(parsed.category, example.category);
            assert_eq!(parsed.command, example.command);
        }
    }
}
