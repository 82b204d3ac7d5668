//! Expense primitives.
//!
//! An `Expense` is a single spending record keyed by the chat message that
//! created it: `(msg_id, chat_id, user_id)`. Deleting an expense first marks
//! it with `deleted_at` so it can be restored within a grace window.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Need,
    Want,
    Goal,
}

impl ExpenseKind {
    pub const ALL: [ExpenseKind; 3] = [Self::Need, Self::Want, Self::Goal];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Need => "need",
            Self::Want => "want",
            Self::Goal => "goal",
        }
    }
}

impl TryFrom<&str> for ExpenseKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "need" => Ok(Self::Need),
            "want" => Ok(Self::Want),
            "goal" => Ok(Self::Goal),
            other => Err(EngineError::InvalidValue(format!(
                "invalid expense type: {other}"
            ))),
        }
    }
}

/// The closed set of budgeting categories an expense can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Gifts,
    Health,
    Home,
    Transportation,
    Personal,
    Utilities,
    Travel,
    Debt,
    Other,
    Family,
    Wardrobe,
    Investments,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Self::Food,
        Self::Gifts,
        Self::Health,
        Self::Home,
        Self::Transportation,
        Self::Personal,
        Self::Utilities,
        Self::Travel,
        Self::Debt,
        Self::Other,
        Self::Family,
        Self::Wardrobe,
        Self::Investments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Gifts => "gifts",
            Self::Health => "health",
            Self::Home => "home",
            Self::Transportation => "transportation",
            Self::Personal => "personal",
            Self::Utilities => "utilities",
            Self::Travel => "travel",
            Self::Debt => "debt",
            Self::Other => "other",
            Self::Family => "family",
            Self::Wardrobe => "wardrobe",
            Self::Investments => "investments",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "gifts" => Ok(Self::Gifts),
            "health" => Ok(Self::Health),
            "home" => Ok(Self::Home),
            "transportation" => Ok(Self::Transportation),
            "personal" => Ok(Self::Personal),
            "utilities" => Ok(Self::Utilities),
            "travel" => Ok(Self::Travel),
            "debt" => Ok(Self::Debt),
            "other" => Ok(Self::Other),
            "family" => Ok(Self::Family),
            "wardrobe" => Ok(Self::Wardrobe),
            "investments" => Ok(Self::Investments),
            other => Err(EngineError::InvalidValue(format!(
                "invalid category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub msg_id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub description: String,
    pub kind: Option<ExpenseKind>,
    pub category: Option<Category>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub msg_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub chat_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub amount: f64,
    pub description: String,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date: Date,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            msg_id: ActiveValue::Set(expense.msg_id),
            chat_id: ActiveValue::Set(expense.chat_id),
            user_id: ActiveValue::Set(expense.user_id),
            amount: ActiveValue::Set(expense.amount),
            description: ActiveValue::Set(expense.description.clone()),
            kind: ActiveValue::Set(expense.kind.map(|kind| kind.as_str().to_string())),
            category: ActiveValue::Set(
                expense.category.map(|category| category.as_str().to_string()),
            ),
            date: ActiveValue::Set(expense.date),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
            deleted_at: ActiveValue::Set(expense.deleted_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            msg_id: model.msg_id,
            chat_id: model.chat_id,
            user_id: model.user_id,
            amount: model.amount,
            description: model.description,
            kind: model
                .kind
                .as_deref()
                .map(ExpenseKind::try_from)
                .transpose()?,
            category: model
                .category
                .as_deref()
                .map(Category::try_from)
                .transpose()?,
            date: model.date,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        })
    }
}
