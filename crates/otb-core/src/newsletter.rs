//! Push newsletter: composition of the daily messages and fan-out to subscribers.

use std::time::Duration;

use tokio::time::sleep;

use crate::{
    bible::VerseUnavailable,
    calendar::HolidayCalendar,
    content::{ContentSelector, SaintQuote},
    domain::{ChatId, Quote},
    formatting,
    messaging::{port::MessagingPort, types::TextFormat},
    utils::truncate_text,
};

/// Spacing between consecutive sends (outbound rate limit).
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl DispatchStats {
    fn record(mut self, delivery: &Delivery) -> Self {
        self.total += 1;
        match delivery {
            Delivery::Sent(_) => self.success += 1,
            Delivery::Failed { .. } => self.failed += 1,
        }
        self
    }
}

/// Outcome of a single send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Sent(ChatId),
    Failed { chat_id: ChatId, reason: String },
}

pub struct NewsletterDispatcher {
    delay: Duration,
}

impl Default for NewsletterDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_DELAY)
    }
}

impl NewsletterDispatcher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Deliver `message` to every recipient in order.
    ///
    /// A failed send is counted and logged; it never stops the remaining sends.
    pub async fn send_to_all(
        &self,
        message: &str,
        recipients: &[ChatId],
        sender: &dyn MessagingPort,
    ) -> DispatchStats {
        if recipients.is_empty() {
            tracing::info!("no subscribers, nothing to send");
            return DispatchStats::default();
        }

        tracing::info!(
            recipients = recipients.len(),
            preview = %truncate_text(message, 40),
            "newsletter dispatch started"
        );

        let mut stats = DispatchStats::default();
        for (i, &chat_id) in recipients.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            let delivery = deliver(sender, chat_id, message).await;
            if let Delivery::Failed { chat_id, reason } = &delivery {
                tracing::warn!(chat_id = chat_id.0, %reason, "newsletter delivery failed");
            }
            stats = stats.record(&delivery);
        }

        tracing::info!(
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            "newsletter dispatch finished"
        );
        stats
    }
}

async fn deliver(sender: &dyn MessagingPort, chat_id: ChatId, message: &str) -> Delivery {
    match sender.send_text(chat_id, message, TextFormat::Html).await {
        Ok(_) => Delivery::Sent(chat_id),
        Err(e) => Delivery::Failed {
            chat_id,
            reason: e.to_string(),
        },
    }
}

// ============== Composition ==============

/// Which content types a newsletter run pushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewsletterPlan {
    pub bible: bool,
    pub saint: bool,
}

impl NewsletterPlan {
    /// No flags means the daily default: holiday (if any) + Bible verse.
    pub fn is_default(&self) -> bool {
        !self.bible && !self.saint
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewsletterKind {
    Holiday,
    DailyVerse,
    Verse,
    Saint,
}

impl NewsletterKind {
    pub fn label(&self) -> &'static str {
        match self {
            NewsletterKind::Holiday => "праздник",
            NewsletterKind::DailyVerse | NewsletterKind::Verse => "цитата из Библии",
            NewsletterKind::Saint => "цитата святого",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsletterMessage {
    pub kind: NewsletterKind,
    pub html: String,
}

/// A verse push was requested but no verse could be produced.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("bible verse required for the newsletter is unavailable: {0}")]
pub struct VerseRequired(pub VerseUnavailable);

/// Build the messages for one run, in send order.
pub fn compose(
    plan: NewsletterPlan,
    content: &ContentSelector,
    calendar: &HolidayCalendar,
) -> Result<Vec<NewsletterMessage>, VerseRequired> {
    let mut out = Vec::new();

    if plan.is_default() {
        match calendar.today() {
            Some(holiday) => out.push(NewsletterMessage {
                kind: NewsletterKind::Holiday,
                html: formatting::holiday_newsletter(&holiday),
            }),
            None => tracing::info!("no holiday today"),
        }
        out.push(verse_message(content, NewsletterKind::DailyVerse)?);
    }

    if plan.bible {
        out.push(verse_message(content, NewsletterKind::Verse)?);
    }

    if plan.saint {
        let quote = match content.random_saint_quotation(None) {
            SaintQuote::Found(q) => q,
            SaintQuote::NotFound { message } => Quote {
                author: None,
                text: message,
            },
        };
        out.push(NewsletterMessage {
            kind: NewsletterKind::Saint,
            html: formatting::newsletter("📿 Цитата святого", &formatting::quote_body(&quote)),
        });
    }

    Ok(out)
}

fn verse_message(
    content: &ContentSelector,
    kind: NewsletterKind,
) -> Result<NewsletterMessage, VerseRequired> {
    let verse = content.try_random_verse().map_err(VerseRequired)?;
    let header = match kind {
        NewsletterKind::DailyVerse => "📖 Ежедневная цитата из Библии",
        _ => "📖 Цитата из Библии",
    };
    Ok(NewsletterMessage {
        kind,
        html: formatting::newsletter(header, &formatting::escape_html(&verse.to_quote_text())),
    })
}
