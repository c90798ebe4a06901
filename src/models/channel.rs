//! Channel model: the content source owning courses.

use serde::{Deserialize, Serialize};

/// A YouTube channel that publishes courses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub youtube_channel_id: String,
    pub name: String,
    /// Derived from `youtube_channel_id`, never stored.
    #[serde(default)]
    pub url: String,
}

/// Request body for registering a channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub youtube_channel_id: String,
    pub name: String,
}

/// Public URL of a channel.
pub fn channel_url(youtube_channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{}", youtube_channel_id)
}

/// Attach the derived `url` to a fetched channel.
pub fn enrich_channel(channel: Channel) -> Channel {
    Channel {
        url: channel_url(&channel.youtube_channel_id),
        ..channel
    }
}
