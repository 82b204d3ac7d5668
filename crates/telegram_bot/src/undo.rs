//! Grace-window tasks.
//!
//! A soft delete spawns two independent tasks keyed only by immutable ids
//! and the deadline: one keeps the countdown notice current, one fires the
//! purge when the window closes. Neither is cancelled by a restore; the
//! purge asks the store and a restored record makes it a no-op.

use std::time::Duration;

use teloxide::{
    prelude::*,
    types::{ChatId, MessageId},
};

use crate::ui;

pub(crate) fn spawn_countdown(
    bot: Bot,
    chat: ChatId,
    notice: MessageId,
    target_msg_id: i32,
    grace_seconds: u64,
) {
    tokio::spawn(async move {
        let mut remaining = grace_seconds;
        while remaining > 1 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            remaining -= 1;
            let edit = bot
                .edit_message_text(chat, notice, ui::render_countdown(remaining))
                .reply_markup(ui::restore_keyboard(chat.0, target_msg_id))
                .await;
            if let Err(err) = edit {
                // The notice is gone once the user restores; not a problem.
                tracing::debug!("countdown edit failed: {err}");
            }
        }
    });
}

pub(crate) fn spawn_purge(
    bot: Bot,
    engine: engine::Engine,
    chat: ChatId,
    notice: MessageId,
    target_msg_id: i32,
    user_id: i64,
    grace_seconds: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(grace_seconds)).await;
        match engine
            .hard_delete(i64::from(target_msg_id), chat.0, user_id)
            .await
        {
            Ok(true) => {
                if let Err(err) = bot.edit_message_text(chat, notice, "Deleted.").await {
                    tracing::debug!("final notice edit failed: {err}");
                }
            }
            Ok(false) => {
                tracing::debug!("purge skipped, record was restored or already gone");
            }
            Err(err) => tracing::error!("purge failed: {err}"),
        }
    });
}
