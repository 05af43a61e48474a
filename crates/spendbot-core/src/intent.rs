use std::sync::OnceLock;

use regex::Regex;

/// What an incoming message asks the bot to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandIntent {
    Help,
    DeleteLast,
    Today,
    Week,
    Month,
    /// `bill for N`: expenses on day N of the current month.
    BillForDay(u32),
    /// Nothing matched; hand the text to the extraction service.
    FreeFormExpense,
}

impl CommandIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::DeleteLast => "delete_last",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::BillForDay(_) => "bill_for_day",
            Self::FreeFormExpense => "free_form_expense",
        }
    }
}

fn bill_for_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"bill for (\d{1,2})").expect("valid bill-for regex"))
}

/// Trim and lowercase raw inbound text before classification.
pub fn normalize_message(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Classify a normalized message.
///
/// Checks run in a fixed order and the first hit wins, so "today's weekly total"
/// is `Today` and "help me with today" is `Help`.
pub fn classify(message: &str) -> CommandIntent {
    if message.contains("help") {
        return CommandIntent::Help;
    }
    if message.contains("delete last") {
        return CommandIntent::DeleteLast;
    }
    if message.contains("today") {
        return CommandIntent::Today;
    }
    if message.contains("week") {
        return CommandIntent::Week;
    }
    if message.contains("month") {
        return CommandIntent::Month;
    }
    if let Some(day) = bill_for_re()
        .captures(message)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        return CommandIntent::BillForDay(day);
    }
    CommandIntent::FreeFormExpense
}
