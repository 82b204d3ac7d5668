use chrono::Duration;
use engine::{Category, EngineError, ExpenseKind};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, MessageId, MessageKind, User},
};

use crate::{
    ConfigParameters,
    buttons::{self, ButtonAction},
    ui, undo,
};

/// Default number of rows for `/get` without an argument.
const DEFAULT_RECENT: u64 = 5;

enum Command {
    Start,
    Help,
    Get { arg: Option<String> },
    Delete,
}

fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "get" => Some(Command::Get {
            arg: parts.next().map(str::to_string),
        }),
        "delete" => Some(Command::Delete),
        _ => None,
    }
}

fn is_allowed(cfg: &ConfigParameters, user: Option<&User>) -> bool {
    match (&cfg.allowed_users, user) {
        (Some(allowed), Some(user)) => allowed.contains(&user.id),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn help_text() -> String {
    "Write an expense as: <amount> <description> [category] [type] [date]\n\
     Examples:\n\
     12.5 groceries food need 3/6\n\
     10/3 \"shared dinner\" travel\n\n\
     Amounts accept a fraction (a/b). Types: need, want, goal.\n\
     Dates read as day/month or day/month/year.\n\n\
     /get [n] shows the latest expenses (default 5, max 50).\n\
     /delete removes the expense you reply to.\n\
     Edit a sent message to correct its expense."
        .to_string()
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if !is_allowed(&cfg, Some(from)) {
        tracing::warn!("rejected message from unauthorized user {}", from.id);
        bot.send_message(msg.chat.id, "⛔ Unauthorized.").await?;
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if let Some(cmd) = parse_command(text) {
        return handle_command(&bot, &msg, &cfg, from.id, cmd).await;
    }

    add_expense(&bot, &msg, &cfg, from.id, text).await
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    user_id: UserId,
    cmd: Command,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start | Command::Help => {
            bot.send_message(chat_id, help_text()).await?;
        }
        Command::Get { arg } => {
            let limit = match arg.as_deref() {
                None => DEFAULT_RECENT,
                Some(raw) => match raw.parse::<u64>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        bot.send_message(chat_id, "Please provide a positive number, e.g. /get 5.")
                            .await?;
                        return Ok(());
                    }
                },
            };

            match cfg
                .engine
                .recent_expenses(chat_id.0, user_id.0 as i64, limit)
                .await
            {
                Ok(expenses) if expenses.is_empty() => {
                    bot.send_message(chat_id, "No expenses recorded yet.").await?;
                }
                Ok(expenses) => {
                    bot.send_message(chat_id, ui::format_recent_expenses(&expenses))
                        .await?;
                }
                Err(err) => {
                    tracing::error!("failed to list expenses: {err}");
                    bot.send_message(chat_id, "Something went wrong. Please try again.")
                        .await?;
                }
            }
        }
        Command::Delete => match msg.reply_to_message() {
            Some(target) => {
                delete_expense(bot, cfg, chat_id, target.id, user_id).await?;
            }
            None => {
                bot.send_message(chat_id, "Reply to the expense message you want to delete.")
                    .await?;
            }
        },
    }

    Ok(())
}

async fn add_expense(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    user_id: UserId,
    text: &str,
) -> ResponseResult<()> {
    let draft = match engine::parse_message(text, msg.date) {
        Ok(draft) => draft,
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };

    match cfg
        .engine
        .create_expense(draft, i64::from(msg.id.0), msg.chat.id.0, user_id.0 as i64)
        .await
    {
        Ok(expense) => {
            bot.send_message(msg.chat.id, ui::render_saved_notice(&expense))
                .reply_markup(ui::notice_keyboard(msg.chat.id.0, msg.id.0))
                .await?;
        }
        Err(EngineError::ExistingKey(_)) => {
            bot.send_message(msg.chat.id, "This message is already saved as an expense.")
                .await?;
        }
        Err(err) => {
            tracing::error!("failed to store expense: {err}");
            bot.send_message(msg.chat.id, "Something went wrong. Please try again.")
                .await?;
        }
    }

    Ok(())
}

/// An edited message corrects the expense it originally created.
pub(crate) async fn handle_edited_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if !is_allowed(&cfg, Some(from)) {
        tracing::warn!("rejected edit from unauthorized user {}", from.id);
        bot.send_message(msg.chat.id, "⛔ Unauthorized.").await?;
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if parse_command(text).is_some() {
        return Ok(());
    }

    let reference = match &msg.kind {
        MessageKind::Common(common) => common.edit_date.unwrap_or(msg.date),
        _ => msg.date,
    };

    let draft = match engine::parse_message(text, reference) {
        Ok(draft) => draft,
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };

    match cfg
        .engine
        .update_expense(i64::from(msg.id.0), msg.chat.id.0, from.id.0 as i64, draft)
        .await
    {
        Ok(Some(expense)) => {
            bot.send_message(msg.chat.id, ui::render_saved_notice(&expense))
                .reply_markup(ui::notice_keyboard(msg.chat.id.0, msg.id.0))
                .await?;
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, "No existing expense found to update.")
                .await?;
        }
        Err(err) => {
            tracing::error!("failed to update expense: {err}");
            bot.send_message(msg.chat.id, "Something went wrong. Please try again.")
                .await?;
        }
    }

    Ok(())
}

/// Tombstone an expense and open its restore window.
async fn delete_expense(
    bot: &Bot,
    cfg: &ConfigParameters,
    chat_id: ChatId,
    target: MessageId,
    user_id: UserId,
) -> ResponseResult<()> {
    let deleted = match cfg
        .engine
        .soft_delete(i64::from(target.0), chat_id.0, user_id.0 as i64)
        .await
    {
        Ok(deleted) => deleted,
        Err(err) => {
            tracing::error!("failed to delete expense: {err}");
            bot.send_message(chat_id, "Something went wrong. Please try again.")
                .await?;
            return Ok(());
        }
    };
    if !deleted {
        bot.send_message(chat_id, "Expense record not found.").await?;
        return Ok(());
    }

    let grace = cfg.grace_seconds;
    let notice = bot
        .send_message(chat_id, ui::render_countdown(grace))
        .reply_markup(ui::restore_keyboard(chat_id.0, target.0))
        .await?;

    undo::spawn_countdown(bot.clone(), chat_id, notice.id, target.0, grace);
    undo::spawn_purge(
        bot.clone(),
        cfg.engine.clone(),
        chat_id,
        notice.id,
        target.0,
        user_id.0 as i64,
        grace,
    );

    Ok(())
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        tracing::warn!("rejected callback from unauthorized user {}", q.from.id);
        bot.answer_callback_query(q.id.clone())
            .text("⛔ Unauthorized.")
            .await?;
        return Ok(());
    }

    let Some(action) = q.data.as_deref().and_then(buttons::decode) else {
        tracing::warn!("rejected callback with undecodable payload: {:?}", q.data);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    // Location of the message carrying the button, when Telegram still
    // remembers it.
    let notice = q.message.as_ref().map(|m| (m.chat().id, m.id()));

    match action {
        ButtonAction::Delete {
            chat_id,
            message_id,
        } => {
            bot.answer_callback_query(q.id.clone()).await?;
            if let Some((notice_chat, notice_id)) = notice
                && let Err(err) = bot.delete_message(notice_chat, notice_id).await
            {
                tracing::debug!("failed to remove saved notice: {err}");
            }
            delete_expense(&bot, &cfg, ChatId(chat_id), MessageId(message_id), q.from.id).await?;
        }
        ButtonAction::Restore {
            chat_id,
            message_id,
        } => {
            let grace = Duration::seconds(cfg.grace_seconds as i64);
            match cfg
                .engine
                .restore(i64::from(message_id), chat_id, q.from.id.0 as i64, grace)
                .await
            {
                Ok(true) => {
                    bot.answer_callback_query(q.id.clone()).text("Restored").await?;
                    if let Some((notice_chat, notice_id)) = notice
                        && let Err(err) = bot.delete_message(notice_chat, notice_id).await
                    {
                        tracing::debug!("failed to remove countdown notice: {err}");
                    }
                }
                Ok(false) => {
                    bot.answer_callback_query(q.id.clone())
                        .text("Restore window expired or not allowed.")
                        .await?;
                }
                Err(err) => {
                    tracing::error!("restore failed: {err}");
                    bot.answer_callback_query(q.id.clone())
                        .text("Something went wrong. Please try again.")
                        .await?;
                }
            }
        }
        ButtonAction::EditCategory {
            chat_id,
            message_id,
            value,
        } => {
            edit_field(&bot, &cfg, &q, chat_id, message_id, value, Field::Category).await?;
        }
        ButtonAction::EditType {
            chat_id,
            message_id,
            value,
        } => {
            edit_field(&bot, &cfg, &q, chat_id, message_id, value, Field::Kind).await?;
        }
    }

    Ok(())
}

enum Field {
    Category,
    Kind,
}

async fn edit_field(
    bot: &Bot,
    cfg: &ConfigParameters,
    q: &CallbackQuery,
    chat_id: i64,
    message_id: i32,
    value: Option<String>,
    field: Field,
) -> ResponseResult<()> {
    let notice = q.message.as_ref().map(|m| (m.chat().id, m.id()));

    // No value yet: swap the notice keyboard for the picker.
    let Some(raw) = value else {
        if let Some((notice_chat, notice_id)) = notice {
            let keyboard = match field {
                Field::Category => ui::category_picker(chat_id, message_id),
                Field::Kind => ui::type_picker(chat_id, message_id),
            };
            bot.edit_message_reply_markup(notice_chat, notice_id)
                .reply_markup(keyboard)
                .await?;
        }
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let user_id = q.from.id.0 as i64;
    let changed = match field {
        Field::Category => match Category::try_from(raw.as_str()) {
            Ok(category) => {
                cfg.engine
                    .set_category(i64::from(message_id), chat_id, user_id, category)
                    .await
            }
            Err(_) => {
                tracing::warn!("rejected callback with unknown category: {raw}");
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            }
        },
        Field::Kind => match ExpenseKind::try_from(raw.as_str()) {
            Ok(kind) => {
                cfg.engine
                    .set_kind(i64::from(message_id), chat_id, user_id, kind)
                    .await
            }
            Err(_) => {
                tracing::warn!("rejected callback with unknown type: {raw}");
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            }
        },
    };

    match changed {
        Ok(true) => {
            bot.answer_callback_query(q.id.clone()).text("Saved").await?;
            refresh_notice(bot, cfg, notice, chat_id, message_id, user_id).await;
        }
        Ok(false) => {
            bot.answer_callback_query(q.id.clone())
                .text("Expense record not found.")
                .await?;
        }
        Err(err) => {
            tracing::error!("field edit failed: {err}");
            bot.answer_callback_query(q.id.clone())
                .text("Something went wrong. Please try again.")
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(allowed: Vec<u64>) -> ConfigParameters {
        ConfigParameters {
            allowed_users: (!allowed.is_empty())
                .then(|| allowed.into_iter().map(UserId).collect()),
            engine: engine::Engine::new(sea_orm::DatabaseConnection::default()),
            grace_seconds: 30,
        }
    }

    fn user(id: u64) -> User {
        User {
            id: UserId(id),
            is_bot: false,
            first_name: "test".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn no_allowlist_admits_everyone() {
        let cfg = cfg(Vec::new());
        assert!(is_allowed(&cfg, Some(&user(1))));
        assert!(is_allowed(&cfg, None));
    }

    #[test]
    fn allowlist_rejects_unknown_and_missing_senders() {
        let cfg = cfg(vec![1, 2]);
        assert!(is_allowed(&cfg, Some(&user(2))));
        assert!(!is_allowed(&cfg, Some(&user(3))));
        assert!(!is_allowed(&cfg, None));
    }

    #[test]
    fn commands_parse_with_and_without_mention() {
        assert!(matches!(parse_command("/help"), Some(Command::Help)));
        assert!(matches!(parse_command("/delete"), Some(Command::Delete)));
        assert!(matches!(
            parse_command("/get@quaderno_bot 7"),
            Some(Command::Get { arg: Some(n) }) if n == "7"
        ));
        assert!(matches!(
            parse_command("/get"),
            Some(Command::Get { arg: None })
        ));
        assert!(parse_command("10 coffee").is_none());
        assert!(parse_command("/unknown").is_none());
    }
}

/// Rewrite the saved notice after a field edit so it shows current values.
async fn refresh_notice(
    bot: &Bot,
    cfg: &ConfigParameters,
    notice: Option<(ChatId, MessageId)>,
    chat_id: i64,
    message_id: i32,
    user_id: i64,
) {
    let Some((notice_chat, notice_id)) = notice else {
        return;
    };

    match cfg
        .engine
        .expense(i64::from(message_id), chat_id, user_id, false)
        .await
    {
        Ok(Some(expense)) => {
            let edit = bot
                .edit_message_text(notice_chat, notice_id, ui::render_saved_notice(&expense))
                .reply_markup(ui::notice_keyboard(chat_id, message_id))
                .await;
            if let Err(err) = edit {
                tracing::debug!("notice refresh failed: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => tracing::error!("failed to reload expense: {err}"),
    }
}
