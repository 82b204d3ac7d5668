//! Expenses schema.
//!
//! One table: `expenses`, keyed by the chat message that created the record
//! (`msg_id`, `chat_id`, `user_id`). Soft deletion is a nullable
//! `deleted_at` timestamp.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Expenses {
    Table,
    MsgId,
    ChatId,
    UserId,
    Amount,
    Description,
    Kind,
    Category,
    Date,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::MsgId).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::ChatId).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Amount).double().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::Kind).string())
                    .col(ColumnDef::new(Expenses::Category).string())
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::DeletedAt).timestamp())
                    .primary_key(
                        Index::create()
                            .col(Expenses::MsgId)
                            .col(Expenses::ChatId)
                            .col(Expenses::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-chat_id-user_id-date")
                    .table(Expenses::Table)
                    .col(Expenses::ChatId)
                    .col(Expenses::UserId)
                    .col(Expenses::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        Ok(())
    }
}
