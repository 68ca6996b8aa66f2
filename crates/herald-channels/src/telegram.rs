//! Telegram channel adapter.
//!
//! Posts are sent with HTML parse mode (the generator emits HTML markup).
//! Media is delivered by URL; when several media fields are set, photo wins
//! over video and video over document, matching the single-media limit of a
//! Telegram message.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient,
};
use teloxide::RequestError;
use tracing::{debug, warn};
use url::Url;

use crate::{
    channel::Channel,
    error::ChannelError,
    types::{MessageRef, OutboundPost},
};

pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, post: &OutboundPost) -> Result<MessageRef, ChannelError> {
        let recipient = parse_recipient(&post.channel_id)?;
        let markup = button_markup(post)?;

        debug!(channel_id = %post.channel_id, "sending post to Telegram");

        let msg = if let Some(url) = &post.photo_url {
            let mut req = self
                .bot
                .send_photo(recipient, InputFile::url(parse_url(url)?))
                .caption(post.text.clone())
                .parse_mode(ParseMode::Html);
            if let Some(m) = markup {
                req = req.reply_markup(m);
            }
            req.await
        } else if let Some(url) = &post.video_url {
            let mut req = self
                .bot
                .send_video(recipient, InputFile::url(parse_url(url)?))
                .caption(post.text.clone())
                .parse_mode(ParseMode::Html);
            if let Some(m) = markup {
                req = req.reply_markup(m);
            }
            req.await
        } else if let Some(url) = &post.document_url {
            let mut req = self
                .bot
                .send_document(recipient, InputFile::url(parse_url(url)?))
                .caption(post.text.clone())
                .parse_mode(ParseMode::Html);
            if let Some(m) = markup {
                req = req.reply_markup(m);
            }
            req.await
        } else {
            let mut req = self
                .bot
                .send_message(recipient, post.text.clone())
                .parse_mode(ParseMode::Html);
            if let Some(m) = markup {
                req = req.reply_markup(m);
            }
            req.await
        };

        match msg {
            Ok(m) => Ok(MessageRef(m.id.0.to_string())),
            Err(e) => {
                warn!(channel_id = %post.channel_id, error = %e, "Telegram send failed");
                Err(map_error(e))
            }
        }
    }
}

/// Resolve a channel identifier string into a Telegram recipient.
///
/// `@username` addresses a public channel; anything else must be a numeric
/// chat id (e.g. `-1001234567890` for a private channel).
fn parse_recipient(channel_id: &str) -> Result<Recipient, ChannelError> {
    if channel_id.is_empty() {
        return Err(ChannelError::InvalidPayload("empty channel id".into()));
    }
    if channel_id.starts_with('@') {
        return Ok(Recipient::ChannelUsername(channel_id.to_string()));
    }
    channel_id
        .parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| {
            ChannelError::InvalidPayload(format!(
                "channel id must be @username or numeric chat id, got {channel_id:?}"
            ))
        })
}

fn parse_url(raw: &str) -> Result<Url, ChannelError> {
    Url::parse(raw).map_err(|e| ChannelError::InvalidPayload(format!("bad media URL {raw:?}: {e}")))
}

fn button_markup(post: &OutboundPost) -> Result<Option<InlineKeyboardMarkup>, ChannelError> {
    if post.buttons.is_empty() {
        return Ok(None);
    }
    let mut rows = Vec::with_capacity(post.buttons.len());
    for btn in &post.buttons {
        let url = Url::parse(&btn.url).map_err(|e| {
            ChannelError::InvalidPayload(format!("bad button URL {:?}: {e}", btn.url))
        })?;
        rows.push(vec![InlineKeyboardButton::url(btn.label.clone(), url)]);
    }
    Ok(Some(InlineKeyboardMarkup::new(rows)))
}

fn map_error(e: RequestError) -> ChannelError {
    match e {
        RequestError::Network(err) => ChannelError::ConnectionFailed(err.to_string()),
        RequestError::Io(err) => ChannelError::ConnectionFailed(err.to_string()),
        RequestError::RetryAfter(secs) => ChannelError::Timeout {
            ms: secs.duration().as_millis() as u64,
        },
        other => ChannelError::SendFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::LinkButton;

    #[test]
    fn username_recipient_parses() {
        assert!(matches!(
            parse_recipient("@cardio").unwrap(),
            Recipient::ChannelUsername(u) if u == "@cardio"
        ));
    }

    #[test]
    fn numeric_recipient_parses() {
        assert!(matches!(
            parse_recipient("-1001234567890").unwrap(),
            Recipient::Id(ChatId(-1001234567890))
        ));
    }

    #[test]
    fn garbage_recipient_is_rejected() {
        assert!(parse_recipient("not-a-channel").is_err());
        assert!(parse_recipient("").is_err());
    }

    #[test]
    fn buttons_build_one_per_row() {
        let mut post = OutboundPost::text("@c", "hi");
        post.buttons = vec![
            LinkButton {
                label: "Read more".into(),
                url: "https://example.org/a".into(),
            },
            LinkButton {
                label: "Source".into(),
                url: "https://example.org/b".into(),
            },
        ];
        let markup = button_markup(&post).unwrap().unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
    }

    #[test]
    fn bad_button_url_is_invalid_payload() {
        let mut post = OutboundPost::text("@c", "hi");
        post.buttons = vec![LinkButton {
            label: "x".into(),
            url: "not a url".into(),
        }];
        assert!(matches!(
            button_markup(&post),
            Err(ChannelError::InvalidPayload(_))
        ));
    }

    #[test]
    fn transport_classification() {
        assert!(ChannelError::ConnectionFailed("down".into()).is_transport());
        assert!(ChannelError::Timeout { ms: 5000 }.is_transport());
        assert!(!ChannelError::SendFailed("bad html".into()).is_transport());
        assert!(!ChannelError::InvalidPayload("no url".into()).is_transport());
    }
}
