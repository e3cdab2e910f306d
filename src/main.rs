//! TeleAuth Telegram Authentication Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::dispatching::UpdateHandler;
use tracing::{error, info, warn};

use TeleAuth::{
    config::Settings,
    database::connection::{create_pool, run_migrations},
    database::repositories::{ChatBindingStore, PgChatBindingRepository},
    handlers::RegistrationFlow,
    models::message::ChatMessage,
    services::{
        account::{AccountLookup, PgAccountLookup},
        channel::{MessageChannel, TelegramChannel},
        code_store::{CodeStore, RedisCodeStore},
        handshake::{HandshakeConfig, HandshakeCoordinator},
        login::LoginService,
    },
    state::{LoginStepMachine, SessionStore},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer alive
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", TeleAuth::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await?;
    run_migrations(&db_pool).await?;

    // Initialize Redis-backed code store
    info!("Connecting to Redis...");
    let store: Arc<dyn CodeStore> = Arc::new(RedisCodeStore::new(settings.redis.clone()).await?);

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);
    let channel: Arc<dyn MessageChannel> = Arc::new(TelegramChannel::new(bot.clone()));

    // Wire up repositories and services
    let bindings: Arc<dyn ChatBindingStore> =
        Arc::new(PgChatBindingRepository::new(db_pool.clone()));
    let accounts: Arc<dyn AccountLookup> = Arc::new(PgAccountLookup::new(db_pool));

    let sessions = SessionStore::from_config(store.clone(), &settings.auth);
    let machine = LoginStepMachine::new(accounts.clone());
    let login = LoginService::new(sessions, machine, bindings.clone(), channel.clone());

    let handshake =
        HandshakeCoordinator::new(store.clone(), HandshakeConfig::from(&settings.auth));
    let registration =
        RegistrationFlow::new(bindings, accounts, handshake, channel, store);

    info!("Setting up bot handlers...");

    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![Arc::new(login), Arc::new(registration)])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook_url) = &settings.bot.webhook_url {
        info!("Webhook URL configured: {}", webhook_url);
        info!("Note: webhook setup not implemented, falling back to polling");
    }

    info!("TeleAuth bot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("TeleAuth bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry().branch(Update::filter_message().endpoint(handle_message))
}

/// Route one inbound message to the login or registration flow
async fn handle_message(
    msg: Message,
    login: Arc<LoginService>,
    registration: Arc<RegistrationFlow>,
) -> HandlerResult {
    let message = match ChatMessage::from_telegram(&msg) {
        Some(message) => message,
        None => return Ok(()),
    };

    let in_login = message.chat_kind.is_private()
        && (message.text == "/login" || login.has_session(message.chat_id).await?);

    let result = if in_login {
        login.handle_input(&message).await
    } else {
        registration.handle(&message).await
    };

    if let Err(e) = result {
        error!(chat_id = message.chat_id, error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}
