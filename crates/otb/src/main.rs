use std::sync::Arc;

use otb_core::{commands::BotServices, config::Config};

#[tokio::main]
async fn main() -> Result<(), otb_core::Error> {
    otb_core::logging::init("otb")?;

    let cfg = Arc::new(Config::load()?);
    let services = BotServices::from_config(&cfg)?;

    otb_telegram::router::run_polling(cfg, services)
        .await
        .map_err(|e| otb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
