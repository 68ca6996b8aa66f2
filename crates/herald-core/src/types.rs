use serde::{Deserialize, Serialize};

/// An inline URL button attached below a published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    /// Visible label.
    pub label: String,
    /// Target URL opened when the button is pressed.
    pub url: String,
}

/// One entry of the specialty directory: a topical channel the planner may
/// assign posts to.
///
/// The planner addresses channels by `id` (e.g. `"cardiology"`); everything
/// else is presentation context forwarded to the generator and the reviewer
/// feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    /// Stable lowercase identifier used in plans.
    pub id: String,
    /// Human-readable channel name.
    pub name: String,
    /// Decorative emoji shown in the review feed.
    #[serde(default)]
    pub emoji: String,
    /// Messaging-boundary channel identifier (`@username` or numeric chat id).
    pub channel: String,
    /// Public link to the channel.
    #[serde(default)]
    pub link: String,
}
