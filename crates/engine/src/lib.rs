use chrono::{Duration, Utc};

pub use error::EngineError;
pub use expenses::{Category, Expense, ExpenseKind};
pub use parser::{ExpenseDraft, ParseError, parse_message};
use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, SqlErr, prelude::*, sea_query::Expr,
};

mod error;
mod expenses;
pub mod parser;

type ResultEngine<T> = Result<T, EngineError>;

/// Upper bound for a recent-expenses listing.
pub const MAX_RECENT: u64 = 50;

/// The expense store. All conditional state changes (delete, restore, purge)
/// are single `UPDATE`/`DELETE` statements so concurrent callers cannot race
/// between a check and a write.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Store a new expense. The identity `(msg_id, chat_id, user_id)` must be
    /// unused, tombstoned rows included. The primary key settles concurrent
    /// creates, so there is no read before the insert.
    pub async fn create_expense(
        &self,
        draft: ExpenseDraft,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
    ) -> ResultEngine<Expense> {
        let now = Utc::now();
        let expense = Expense {
            msg_id,
            chat_id,
            user_id,
            amount: draft.amount,
            description: draft.description,
            kind: draft.kind,
            category: draft.category,
            date: draft.date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await
        {
            Ok(_) => Ok(expense),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EngineError::ExistingKey(format!(
                    "expense {msg_id}/{chat_id}/{user_id}"
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch one expense by identity. Tombstoned rows are hidden unless
    /// `include_deleted` is set.
    pub async fn expense(
        &self,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
        include_deleted: bool,
    ) -> ResultEngine<Option<Expense>> {
        let model = expenses::Entity::find_by_id((msg_id, chat_id, user_id))
            .one(&self.database)
            .await?;

        match model {
            Some(model) if model.deleted_at.is_none() || include_deleted => {
                Ok(Some(Expense::try_from(model)?))
            }
            _ => Ok(None),
        }
    }

    /// Replace the parsed fields of an active expense and bump `updated_at`.
    /// Returns the updated record, or `None` when no active record matches.
    pub async fn update_expense(
        &self,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
        draft: ExpenseDraft,
    ) -> ResultEngine<Option<Expense>> {
        let result = expenses::Entity::update_many()
            .col_expr(expenses::Column::Amount, Expr::value(draft.amount))
            .col_expr(
                expenses::Column::Description,
                Expr::value(draft.description),
            )
            .col_expr(
                expenses::Column::Kind,
                Expr::value(draft.kind.map(|kind| kind.as_str().to_string())),
            )
            .col_expr(
                expenses::Column::Category,
                Expr::value(draft.category.map(|category| category.as_str().to_string())),
            )
            .col_expr(expenses::Column::Date, Expr::value(draft.date))
            .col_expr(expenses::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_null())
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.expense(msg_id, chat_id, user_id, false).await
    }

    /// Set the category of an active expense. Returns whether a row changed.
    pub async fn set_category(
        &self,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
        category: Category,
    ) -> ResultEngine<bool> {
        let result = expenses::Entity::update_many()
            .col_expr(
                expenses::Column::Category,
                Expr::value(Some(category.as_str().to_string())),
            )
            .col_expr(expenses::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_null())
            .exec(&self.database)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Set the type of an active expense. Returns whether a row changed.
    pub async fn set_kind(
        &self,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
        kind: ExpenseKind,
    ) -> ResultEngine<bool> {
        let result = expenses::Entity::update_many()
            .col_expr(
                expenses::Column::Kind,
                Expr::value(Some(kind.as_str().to_string())),
            )
            .col_expr(expenses::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_null())
            .exec(&self.database)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Tombstone an active expense. Returns whether the state changed.
    pub async fn soft_delete(&self, msg_id: i64, chat_id: i64, user_id: i64) -> ResultEngine<bool> {
        let result = expenses::Entity::update_many()
            .col_expr(expenses::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_null())
            .exec(&self.database)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Bring a tombstoned expense back, but only while its tombstone is
    /// younger than `grace`. The window check lives inside the `UPDATE` so a
    /// concurrent purge cannot slip between check and write.
    pub async fn restore(
        &self,
        msg_id: i64,
        chat_id: i64,
        user_id: i64,
        grace: Duration,
    ) -> ResultEngine<bool> {
        let cutoff = Utc::now() - grace;
        let result = expenses::Entity::update_many()
            .col_expr(
                expenses::Column::DeletedAt,
                Expr::value(None::<chrono::DateTime<Utc>>),
            )
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_not_null())
            .filter(expenses::Column::DeletedAt.gte(cutoff))
            .exec(&self.database)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Remove a tombstoned expense for good. A record restored in the
    /// meantime is left alone.
    pub async fn hard_delete(&self, msg_id: i64, chat_id: i64, user_id: i64) -> ResultEngine<bool> {
        let result = expenses::Entity::delete_many()
            .filter(identity(msg_id, chat_id, user_id))
            .filter(expenses::Column::DeletedAt.is_not_null())
            .exec(&self.database)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Most recent active expenses for a chat/user pair, newest date first.
    /// `limit` is clamped to `1..=MAX_RECENT`.
    pub async fn recent_expenses(
        &self,
        chat_id: i64,
        user_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<Expense>> {
        let limit = limit.clamp(1, MAX_RECENT);
        let models = expenses::Entity::find()
            .filter(expenses::Column::ChatId.eq(chat_id))
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::DeletedAt.is_null())
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(Expense::try_from).collect()
    }
}

fn identity(msg_id: i64, chat_id: i64, user_id: i64) -> Condition {
    Condition::all()
        .add(expenses::Column::MsgId.eq(msg_id))
        .add(expenses::Column::ChatId.eq(chat_id))
        .add(expenses::Column::UserId.eq(user_id))
}
