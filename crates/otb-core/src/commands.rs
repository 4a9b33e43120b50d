//! Chat command parsing and execution, independent of the transport.

use std::sync::Arc;

use crate::{
    bible::VerseSource,
    calendar::HolidayCalendar,
    catalog::{ContentCatalog, CHURCH_SLAVONIC, PRIMARY_LANGUAGE},
    config::Config,
    content::{ContentSelector, SaintQuote},
    domain::ChatId,
    formatting,
    messaging::types::TextFormat,
    picker::RandomPicker,
    subscribers::SubscriberRegistry,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Holiday,
    Pray { slavonic: bool },
    Quote,
    Saint { name: Option<String> },
    Subscribe,
    Unsubscribe,
    Unknown(String),
}

impl BotCommand {
    /// Parse `/cmd@botname args`. Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        let cmd = first
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();

        let command = match cmd.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "holiday" => Self::Holiday,
            "pray" => Self::Pray {
                slavonic: rest.to_lowercase() == CHURCH_SLAVONIC,
            },
            "quote" => Self::Quote,
            "saint" => Self::Saint {
                name: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            _ => Self::Unknown(cmd),
        };
        Some(command)
    }

    /// Commands that may read the verse corpus or search quotations show a
    /// typing indicator while they run.
    pub fn shows_typing(&self) -> bool {
        matches!(self, Self::Quote | Self::Saint { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: TextFormat,
}

impl Reply {
    fn html(text: String) -> Self {
        Self {
            text,
            format: TextFormat::Html,
        }
    }
}

#[derive(Clone)]
pub struct BotServices {
    pub content: Arc<ContentSelector>,
    pub calendar: Arc<HolidayCalendar>,
    pub subscribers: Arc<SubscriberRegistry>,
}

impl BotServices {
    /// Load static content, open the registry and wire the selectors.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let catalog = Arc::new(ContentCatalog::load(
            &cfg.prayers_file,
            &cfg.quotes_file,
            &cfg.holidays_file,
        )?);
        let content = ContentSelector::new(
            catalog.clone(),
            VerseSource::new(cfg.corpus_paths()),
            Arc::new(RandomPicker::from_entropy()),
        );
        Ok(Self {
            content: Arc::new(content),
            calendar: Arc::new(HolidayCalendar::new(catalog)),
            subscribers: Arc::new(SubscriberRegistry::open(&cfg.subscribers_file)?),
        })
    }

    pub fn execute(&self, chat_id: ChatId, command: &BotCommand) -> Result<Reply> {
        let reply = match command {
            BotCommand::Start | BotCommand::Help => {
                self.subscribers.add(chat_id)?;
                Reply::html(formatting::welcome())
            }
            BotCommand::Holiday => {
                let holiday = self.calendar.today();
                Reply::html(formatting::holiday_reply(holiday.as_deref()))
            }
            BotCommand::Pray { slavonic } => {
                let language = if *slavonic {
                    CHURCH_SLAVONIC
                } else {
                    PRIMARY_LANGUAGE
                };
                Reply::html(formatting::prayer(&self.content.random_prayer(language)))
            }
            BotCommand::Quote => Reply::html(formatting::quote(&self.content.random_verse())),
            BotCommand::Saint { name } => {
                match self.content.random_saint_quotation(name.as_deref()) {
                    SaintQuote::Found(q) => Reply::html(formatting::quote(&q)),
                    SaintQuote::NotFound { message } => Reply::html(formatting::saint_not_found(
                        &message,
                        &self.content.list_saint_authors(),
                    )),
                }
            }
            BotCommand::Subscribe => {
                let text = if self.subscribers.add(chat_id)? {
                    "✅ Вы подписались на ежедневные уведомления."
                } else {
                    "Вы уже подписаны на уведомления."
                };
                Reply::html(text.to_string())
            }
            BotCommand::Unsubscribe => {
                let text = if self.subscribers.remove(chat_id)? {
                    "Вы отписались от уведомлений."
                } else {
                    "Вы не были подписаны на уведомления."
                };
                Reply::html(text.to_string())
            }
            BotCommand::Unknown(_) => {
                Reply::html("Неизвестная команда. Список команд: /help".to_string())
            }
        };
        Ok(reply)
    }
}
