use chrono::NaiveDateTime;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Store-assigned insertion sequence. Later inserts always get larger ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(pub i64);

/// A single expense as it is written to the store.
///
/// Records are never updated in place; the only mutation is deleting the whole row.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseRecord {
    pub amount: f64,
    pub category: String,
    pub currency: String,
    /// Local wall-clock time of the save.
    pub date: NaiveDateTime,
}

/// An expense read back from the store together with its id.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredExpense {
    pub id: ExpenseId,
    pub record: ExpenseRecord,
}
