//! Port + response handling for the natural-language extraction service.
//!
//! Provider adapters only move bytes; turning completion text into a
//! [`ParsedExpenseIntent`] and validating it happens here.

use async_trait::async_trait;
use serde_json::Value;

use crate::{errors::Error, Result};

/// Instruction sent as the system message with every extraction request.
pub const SYSTEM_PROMPT: &str = "Extract expense info from message and return JSON like:\n\
{ \"amount\": number, \"category\": string, \"date\": \"today\"|\"yesterday\"|\"3 days ago\" }.\n\
Reply with exactly one JSON object and nothing else.";

/// Sampling temperature for extraction requests.
pub const TEMPERATURE: f32 = 0.1;

/// Completion budget; one small JSON object fits comfortably.
pub const MAX_TOKENS: u32 = 100;

/// Turns a free-text message into structured expense fields.
#[async_trait]
pub trait ExpenseExtractor: Send + Sync {
    /// Fails with [`Error::Extraction`] when the service is unreachable, times out,
    /// answers with an error status, or returns text without a JSON object.
    async fn extract(&self, message: &str) -> Result<ParsedExpenseIntent>;
}

/// Fields pulled out of one message. Never persisted directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedExpenseIntent {
    pub amount: Option<f64>,
    pub category: Option<String>,
    /// Relative date phrase as the model wrote it.
    pub date: Option<String>,
}

/// Why a parsed intent cannot be saved as-is.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationIssue {
    MissingAmount,
    NonPositiveAmount(f64),
    MissingCategory,
}

impl ParsedExpenseIntent {
    /// Read fields from a JSON object. Wrongly typed fields are treated as absent.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(Error::Extraction(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        };

        let amount = obj
            .get("amount")
            .and_then(Value::as_f64)
            .filter(|a| a.is_finite());
        let category = obj
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let date = obj
            .get("date")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string());

        Ok(Self {
            amount,
            category,
            date,
        })
    }

    /// Amount and category if both are usable for a save.
    pub fn validate(&self) -> std::result::Result<(f64, &str), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let amount = match self.amount {
            None => {
                issues.push(ValidationIssue::MissingAmount);
                None
            }
            Some(a) if a <= 0.0 => {
                issues.push(ValidationIssue::NonPositiveAmount(a));
                None
            }
            Some(a) => Some(a),
        };

        let category = self.category.as_deref();
        if category.is_none() {
            issues.push(ValidationIssue::MissingCategory);
        }

        match (amount, category) {
            (Some(a), Some(c)) => Ok((a, c)),
            _ => Err(issues),
        }
    }
}

/// Pull the single JSON object out of a completion and read it.
///
/// Models sometimes wrap the object in prose or code fences, so the outermost
/// `{ ... }` span is parsed.
pub fn parse_completion(text: &str) -> Result<ParsedExpenseIntent> {
    let text = text.trim();
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(Error::Extraction(format!(
            "no JSON object in completion: {}",
            preview(text)
        )));
    };
    if start > end {
        return Err(Error::Extraction(format!(
            "no JSON object in completion: {}",
            preview(text)
        )));
    }

    let json = &text[start..=end];
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Extraction(format!("invalid JSON ({e}): {}", preview(json))))?;
    ParsedExpenseIntent::from_json(&value)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(s: &str) -> String {
    const MAX: usize = 200;
    if s.chars().count() > MAX {
        format!("{}...", s.chars().take(MAX).collect::<String>())
    } else {
        s.to_string()
    }
}
