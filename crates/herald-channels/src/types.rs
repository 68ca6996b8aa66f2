use herald_core::types::LinkButton;
use serde::{Deserialize, Serialize};

/// A post to be delivered to an external channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundPost {
    /// Platform-native channel identifier (`@username` or numeric chat id).
    pub channel_id: String,

    /// Text body (HTML markup on Telegram).
    pub text: String,

    /// Optional media, delivered by URL. At most one is used; photo wins
    /// over video, video over document.
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,

    /// Inline URL buttons rendered below the post.
    #[serde(default)]
    pub buttons: Vec<LinkButton>,
}

impl OutboundPost {
    /// Plain text post with no media or buttons.
    pub fn text(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            text: text.into(),
            photo_url: None,
            video_url: None,
            document_url: None,
            buttons: Vec::new(),
        }
    }
}

/// Opaque reference to a delivered message, recorded on task completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl std::fmt::Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
