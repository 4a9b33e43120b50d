//! Scheduled newsletter job: compose today's messages and push them to every
//! subscriber. Meant to be run from cron.

use std::process::ExitCode;

use clap::Parser;

use otb_core::{
    commands::BotServices,
    config::Config,
    newsletter::{compose, DispatchStats, NewsletterDispatcher, NewsletterPlan},
};
use otb_telegram::TelegramMessenger;

#[derive(Parser, Debug)]
#[command(
    name = "otb-newsletter",
    version,
    about = "Send the daily Orthodox newsletter to all subscribers"
)]
struct Cli {
    /// Send a random Bible verse
    #[arg(short = 'b', long)]
    bible: bool,
    /// Send a random saint quotation
    #[arg(short = 's', long)]
    saint: bool,
}

impl Cli {
    fn plan(&self) -> NewsletterPlan {
        NewsletterPlan {
            bible: self.bible,
            saint: self.saint,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = otb_core::logging::init("otb-newsletter") {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(cli.plan()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "newsletter run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(plan: NewsletterPlan) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let services = BotServices::from_config(&cfg)?;

    let recipients = services.subscribers.list()?;
    if recipients.is_empty() {
        tracing::info!("no subscribers, nothing to send");
        return Ok(());
    }

    let messages = compose(plan, &services.content, &services.calendar)?;
    let messenger = TelegramMessenger::from_config(&cfg)?;
    let dispatcher = NewsletterDispatcher::new(cfg.newsletter_delay);

    let mut totals = DispatchStats::default();
    for message in &messages {
        tracing::info!(kind = message.kind.label(), "sending newsletter");
        let stats = dispatcher
            .send_to_all(&message.html, &recipients, &messenger)
            .await;
        totals.total += stats.total;
        totals.success += stats.success;
        totals.failed += stats.failed;
    }

    tracing::info!(
        messages = messages.len(),
        total = totals.total,
        success = totals.success,
        failed = totals.failed,
        "newsletter finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_is_the_daily_default() {
        let cli = Cli::try_parse_from(["otb-newsletter"]).unwrap();
        assert!(cli.plan().is_default());
    }

    #[test]
    fn short_and_long_flags() {
        let cli = Cli::try_parse_from(["otb-newsletter", "-b", "--saint"]).unwrap();
        assert_eq!(
            cli.plan(),
            NewsletterPlan {
                bible: true,
                saint: true
            }
        );
        assert!(Cli::try_parse_from(["otb-newsletter", "--weekly"]).is_err());
    }
}
