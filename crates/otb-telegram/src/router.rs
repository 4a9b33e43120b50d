use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use otb_core::{commands::BotServices, config::Config, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub services: BotServices,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(cfg: Arc<Config>, services: BotServices) -> anyhow::Result<()> {
    let telegram = TelegramMessenger::from_config(&cfg)?;
    let bot = telegram.bot();

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed, starting anyway"),
    }
    tracing::info!(
        subscribers = %cfg.subscribers_file.display(),
        bible = %cfg.bible_xml.display(),
        "storage"
    );

    // Warm the verse cache so the first /quote does not pay for indexing.
    {
        let content = services.content.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = content.warm_verse_cache() {
                tracing::warn!(reason = %e, "verse cache not ready");
            }
        });
    }

    let state = Arc::new(AppState {
        cfg,
        services,
        messenger: Arc::new(telegram),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
