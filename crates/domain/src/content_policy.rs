//! Heuristic chat message validation.
//!
//! Length and emptiness are checked first, then an ordered list of
//! [`ContentRule`]s. The first failing check wins. The rules are a
//! best-effort triage of spam and injection-looking text: they are pattern
//! based and easy to evade, so nothing downstream may rely on them as a
//! security boundary.

use chatgate_core::{AppError, AppResult};
use regex::Regex;

use crate::AbuseEventKind;

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

/// Minimum run of one repeated character treated as spam.
pub const SPAM_REPEAT_RUN: usize = 10;

// Keywords match as word prefixes, so inflected or glued forms
// (`DROPTABLE`, `bypassing`, `overrides`) are caught. A lone apostrophe is
// allowed for French prose; only the `' OR x=` shape is flagged.
const DATA_MANIPULATION_PATTERN: &str = r#"(?i)('\s*(or|and)\s+[^\s=]+\s*=|--|;|\*|\bxp_|\bsp_|\b(exec|select|insert|update|delete|drop|create|alter))"#;
const INSTRUCTION_OVERRIDE_PATTERN: &str =
    r"(?i)(\b(ignor|forget|jailbreak|bypass|overrid)|system\s+prompt)";

/// Family a content rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// Repetitive filler text.
    Spam,
    /// Query-language verbs or control sequences.
    DataManipulation,
    /// Attempts to override the assistant's instructions.
    InstructionOverride,
}

impl ContentCategory {
    /// Abuse event kind recorded for a match in this category.
    #[must_use]
    pub fn abuse_kind(&self) -> AbuseEventKind {
        match self {
            Self::Spam => AbuseEventKind::InvalidContent,
            Self::DataManipulation | Self::InstructionOverride => AbuseEventKind::InjectionAttempt,
        }
    }

    /// Description stored on the abuse event.
    #[must_use]
    pub fn abuse_message(&self) -> &'static str {
        match self {
            Self::Spam => "repeated characters pattern detected",
            Self::DataManipulation => "SQL injection pattern detected",
            Self::InstructionOverride => "prompt injection pattern detected",
        }
    }
}

/// How a rule recognises offending text.
#[derive(Debug, Clone)]
pub enum RuleMatcher {
    /// Regular expression searched anywhere in the text.
    Pattern(Regex),
    /// Any single character repeated at least `min_run` times in a row.
    RepeatedCharacter {
        /// Shortest run that matches.
        min_run: usize,
    },
}

impl RuleMatcher {
    /// Compiles a pattern matcher.
    pub fn pattern(source: &str) -> AppResult<Self> {
        Regex::new(source)
            .map(Self::Pattern)
            .map_err(|error| AppError::Validation(format!("invalid content pattern: {error}")))
    }

    /// Returns whether `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(text),
            Self::RepeatedCharacter { min_run } => has_repeated_run(text, *min_run),
        }
    }
}

/// One ordered validation rule.
#[derive(Debug, Clone)]
pub struct ContentRule {
    /// Matcher applied to the message.
    pub matcher: RuleMatcher,
    /// Rule family.
    pub category: ContentCategory,
    /// User-facing rejection reason.
    pub reason: String,
}

impl ContentRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(matcher: RuleMatcher, category: ContentCategory, reason: impl Into<String>) -> Self {
        Self {
            matcher,
            category,
            reason: reason.into(),
        }
    }

    /// Built-in rules in evaluation order.
    pub fn defaults() -> AppResult<Vec<Self>> {
        Ok(vec![
            Self::new(
                RuleMatcher::RepeatedCharacter {
                    min_run: SPAM_REPEAT_RUN,
                },
                ContentCategory::Spam,
                "Message invalide détecté",
            ),
            Self::new(
                RuleMatcher::pattern(DATA_MANIPULATION_PATTERN)?,
                ContentCategory::DataManipulation,
                "Contenu invalide détecté",
            ),
            Self::new(
                RuleMatcher::pattern(INSTRUCTION_OVERRIDE_PATTERN)?,
                ContentCategory::InstructionOverride,
                "Message non autorisé - tentative de contournement détectée",
            ),
        ])
    }
}

/// Why a message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentViolation {
    /// Longer than the configured maximum.
    TooLong,
    /// Empty after trimming.
    Empty,
    /// Matched a rule.
    Rule(ContentCategory),
}

/// Result of validating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentVerdict {
    /// Message may be forwarded.
    Valid,
    /// Message must be rejected.
    Rejected {
        /// User-facing reason.
        reason: String,
        /// Failed check.
        violation: ContentViolation,
    },
}

/// Ordered message validator.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    max_length: usize,
    rules: Vec<ContentRule>,
}

impl ContentValidator {
    /// Creates a validator with the built-in rules.
    pub fn new(max_length: usize) -> AppResult<Self> {
        Ok(Self::with_rules(max_length, ContentRule::defaults()?))
    }

    /// Creates a validator with an explicit rule list.
    #[must_use]
    pub fn with_rules(max_length: usize, rules: Vec<ContentRule>) -> Self {
        Self { max_length, rules }
    }

    /// Appends a rule evaluated after the existing ones.
    #[must_use]
    pub fn push_rule(mut self, rule: ContentRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Maximum accepted length in characters.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Validates one message.
    #[must_use]
    pub fn validate(&self, message: &str) -> ContentVerdict {
        if message.chars().count() > self.max_length {
            return ContentVerdict::Rejected {
                reason: format!("Message trop long (max {} caractères)", self.max_length),
                violation: ContentViolation::TooLong,
            };
        }

        if message.trim().is_empty() {
            return ContentVerdict::Rejected {
                reason: "Le message ne peut pas être vide".to_owned(),
                violation: ContentViolation::Empty,
            };
        }

        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(message))
            .map_or(ContentVerdict::Valid, |rule| ContentVerdict::Rejected {
                reason: rule.reason.clone(),
                violation: ContentViolation::Rule(rule.category),
            })
    }
}

fn has_repeated_run(text: &str, min_run: usize) -> bool {
    if min_run <= 1 {
        return !text.is_empty();
    }

    let mut previous = None;
    let mut run = 0;
    for character in text.chars() {
        if previous == Some(character) {
            run += 1;
        } else {
            previous = Some(character);
            run = 1;
        }
        if run >= min_run {
            return true;
        }
    }

    false
}
