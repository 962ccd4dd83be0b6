//! Canonical, schema-independent representation of one timeline item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type assigned by the classifier. Serialized as the snake_case label
/// stored in the `content_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    PostWithMedia,
    PostWithVideo,
    AiDraw,
    Announcement,
    AiRelated,
    Regular,
    #[default]
    Unknown,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        ContentType::Post,
        ContentType::PostWithMedia,
        ContentType::PostWithVideo,
        ContentType::AiDraw,
        ContentType::Announcement,
        ContentType::AiRelated,
        ContentType::Regular,
        ContentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::PostWithMedia => "post_with_media",
            ContentType::PostWithVideo => "post_with_video",
            ContentType::AiDraw => "ai_draw",
            ContentType::Announcement => "announcement",
            ContentType::AiRelated => "ai_related",
            ContentType::Regular => "regular",
            ContentType::Unknown => "unknown",
        }
    }

    /// Map a free-form label (e.g. from the AI service) onto the enum.
    /// Labels outside the enumeration (such as "article") become `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str() == l)
            .unwrap_or(ContentType::Unknown)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which raw response shape a record (or field) was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawShapeKind {
    /// `raw.result.legacy.*`
    Direct,
    /// `tweet.rest_id` / `tweet.legacy.*`
    LegacyWrapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Author {
    pub rest_id: String,
    pub screen_name: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub followers_count: Option<u64>,
    pub friends_count: Option<u64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

impl Image {
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn has_alt(&self) -> bool {
        self.alt_text.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Media {
    pub images: Vec<Image>,
    pub videos: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Flags {
    pub is_retweet: bool,
    pub is_promoted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetRecord {
    pub id: String,
    pub url: String,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub media: Media,
    pub content_type: ContentType,
    pub flags: Flags,
    /// Shape that supplied the id; not part of the record's logical identity.
    pub provenance: RawShapeKind,
}

impl TweetRecord {
    pub fn status_url(screen_name: &str, id: &str) -> String {
        format!("https://x.com/{screen_name}/status/{id}")
    }

    /// Equality ignoring provenance.
    pub fn same_content(&self, other: &TweetRecord) -> bool {
        self.id == other.id
            && self.url == other.url
            && self.author == other.author
            && self.text == other.text
            && self.created_at == other.created_at
            && self.media == other.media
            && self.content_type == other.content_type
            && self.flags == other.flags
    }
}
