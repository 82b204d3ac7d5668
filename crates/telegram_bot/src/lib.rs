//! Telegram bot.
//!
//! The bot turns plain chat messages into expense records and drives the
//! delete/restore grace window with inline buttons. It talks to the engine
//! directly.

use teloxide::prelude::*;

mod buttons;
mod handlers;
mod ui;
mod undo;

/// Seconds a deleted expense stays restorable.
pub const DEFAULT_GRACE_SECONDS: u64 = 30;

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    engine: engine::Engine,
    grace_seconds: u64,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: engine::Engine,
    grace_seconds: u64,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            engine: self.engine.clone(),
            grace_seconds: self.grace_seconds,
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_edited_message().endpoint(handlers::handle_edited_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Option<engine::Engine>,
    grace_seconds: Option<u64>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// An empty allowlist means everyone is allowed.
    pub fn allowed_users(mut self, allowed_users: Vec<u64>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users.into_iter().map(UserId).collect());
        }
        self
    }

    pub fn engine(mut self, engine: engine::Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn grace_seconds(mut self, grace_seconds: u64) -> BotBuilder {
        self.grace_seconds = Some(grace_seconds);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.is_empty() {
            return Err("telegram token is required".to_string());
        }
        let engine = self
            .engine
            .ok_or_else(|| "an engine is required".to_string())?;

        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            engine,
            grace_seconds: self.grace_seconds.unwrap_or(DEFAULT_GRACE_SECONDS),
        })
    }
}
