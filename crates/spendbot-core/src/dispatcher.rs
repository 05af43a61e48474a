//! Message -> reply orchestration.
//!
//! `Dispatcher::handle` is the request boundary: every message produces exactly one
//! reply string and no error escapes it.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use crate::{
    dates,
    domain::{ChatId, ExpenseRecord, MessageRef},
    extraction::{ExpenseExtractor, ParsedExpenseIntent},
    intent::{classify, normalize_message, CommandIntent},
    messaging::port::MessagingPort,
    reports::{self, format_amount},
    store::ExpenseStore,
    Result,
};

/// Reply for any failure caught at the request boundary.
pub const FAILURE_REPLY: &str = "❌ Something went wrong.";

pub struct Dispatcher {
    store: Arc<dyn ExpenseStore>,
    extractor: Arc<dyn ExpenseExtractor>,
    currency: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        extractor: Arc<dyn ExpenseExtractor>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            extractor,
            currency: currency.into(),
        }
    }

    /// Interpret one inbound message and build its reply.
    pub async fn handle(&self, raw: &str, now: NaiveDateTime) -> String {
        match self.try_handle(raw, now).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "message handling failed");
                FAILURE_REPLY.to_string()
            }
        }
    }

    /// Handle `raw` and send the reply to `chat_id`.
    pub async fn respond(
        &self,
        messenger: &dyn MessagingPort,
        chat_id: ChatId,
        raw: &str,
        now: NaiveDateTime,
    ) -> Result<MessageRef> {
        let reply = self.handle(raw, now).await;
        let reply = messenger.capabilities().fit(&reply);
        messenger.send_text(chat_id, &reply).await
    }

    async fn try_handle(&self, raw: &str, now: NaiveDateTime) -> Result<String> {
        let message = normalize_message(raw);
        let intent = classify(&message);
        debug!(intent = intent.name(), "classified message");

        let store = self.store.as_ref();
        match intent {
            CommandIntent::Help => Ok(reports::help()),
            CommandIntent::DeleteLast => reports::delete_last(store).await,
            CommandIntent::Today => reports::today(store, now).await,
            CommandIntent::Week => reports::week(store, now).await,
            CommandIntent::Month => reports::month(store, now).await,
            CommandIntent::BillForDay(day) => reports::bill_for_day(store, now, day).await,
            CommandIntent::FreeFormExpense => self.save_expense(&message, now).await,
        }
    }

    /// Extraction fallback: only expenses dated today are saved.
    async fn save_expense(&self, message: &str, now: NaiveDateTime) -> Result<String> {
        let parsed = self.extractor.extract(message).await?;
        let date = dates::normalize(parsed.date.as_deref().unwrap_or(""), now);
        let is_today = date == now.date();

        let valid = match parsed.validate() {
            Ok(v) => Some(v),
            Err(issues) => {
                debug!(?issues, "extracted expense failed validation");
                None
            }
        };

        match valid {
            Some((amount, category)) if is_today => {
                let record = ExpenseRecord {
                    amount,
                    category: category.to_string(),
                    currency: self.currency.clone(),
                    date: now,
                };
                let id = self.store.insert(&record).await?;
                info!(id = id.0, amount, category, "saved expense");
                Ok(format!(
                    "✅ Saved {}{} for {} on {}",
                    self.currency,
                    format_amount(amount),
                    category,
                    dates::display_date(date)
                ))
            }
            _ => {
                debug!(%date, is_today, "expense parsed but not saved");
                Ok(self.not_saved_reply(&parsed, date))
            }
        }
    }

    fn not_saved_reply(&self, parsed: &ParsedExpenseIntent, date: chrono::NaiveDate) -> String {
        let amount = parsed
            .amount
            .map(format_amount)
            .unwrap_or_else(|| "?".to_string());
        let category = parsed.category.as_deref().unwrap_or("?");
        format!(
            "📝 Parsed: {}{} for {} on {}. Not saved, only today's expenses are saved.",
            self.currency,
            amount,
            category,
            dates::display_date(date)
        )
    }
}
