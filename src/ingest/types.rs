// src/ingest/types.rs
//! Raw timeline payloads and the timeline capability.
//!
//! A timeline item arrives in one of two shapes. The "direct" shape carries the
//! tweet under `raw.result.legacy`, the "legacy-wrapped" shape under
//! `tweet.rest_id` / `tweet.legacy`. Both may be present at once; consumers walk
//! [`RawTimelineItem::shapes`] in order and take the first non-empty value per field.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::record::RawShapeKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTimelineItem {
    pub raw: Option<DirectEnvelope>,
    pub tweet: Option<LegacyWrappedTweet>,
    pub user: Option<RawUser>,
    #[serde(rename = "promotedMetadata", alias = "promoted_metadata")]
    pub promoted_metadata: Option<serde_json::Value>,
}

// ---- direct shape ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectEnvelope {
    pub result: Option<DirectTweet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectTweet {
    pub legacy: Option<DirectLegacy>,
    pub core: Option<DirectCore>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectLegacy {
    #[serde(rename = "idStr", alias = "id_str")]
    pub id_str: Option<String>,
    #[serde(rename = "fullText", alias = "full_text")]
    pub full_text: Option<String>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(rename = "isRetweet", alias = "is_retweet")]
    pub is_retweet: Option<bool>,
    #[serde(rename = "extendedEntities", alias = "extended_entities")]
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectCore {
    #[serde(rename = "user_results", alias = "userResults")]
    pub user_results: Option<UserResults>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserResults {
    pub result: Option<UserResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserResult {
    #[serde(rename = "rest_id", alias = "restId")]
    pub rest_id: Option<String>,
}

// ---- legacy-wrapped shape ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyWrappedTweet {
    #[serde(rename = "rest_id", alias = "restId")]
    pub rest_id: Option<String>,
    pub legacy: Option<WrappedLegacy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappedLegacy {
    #[serde(rename = "id_str", alias = "idStr")]
    pub id_str: Option<String>,
    #[serde(rename = "fullText", alias = "full_text")]
    pub full_text: Option<String>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(rename = "isRetweet", alias = "is_retweet")]
    pub is_retweet: Option<bool>,
    #[serde(rename = "extendedEntities", alias = "extended_entities")]
    pub extended_entities: Option<ExtendedEntities>,
}

// ---- shared pieces ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedEntities {
    pub media: Vec<RawMedia>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMedia {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "mediaUrlHttps", alias = "media_url_https")]
    pub media_url_https: Option<String>,
    #[serde(rename = "extAltText", alias = "ext_alt_text")]
    pub ext_alt_text: Option<String>,
    #[serde(rename = "videoInfo", alias = "video_info")]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoVariant {
    #[serde(rename = "contentType", alias = "content_type")]
    pub content_type: Option<String>,
    pub bitrate: Option<u64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUser {
    #[serde(rename = "rest_id", alias = "restId")]
    pub rest_id: Option<String>,
    pub legacy: Option<RawUserLegacy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUserLegacy {
    #[serde(rename = "screenName", alias = "screen_name")]
    pub screen_name: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "profileImageUrlHttps", alias = "profile_image_url_https")]
    pub profile_image_url_https: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "followersCount", alias = "followers_count")]
    pub followers_count: Option<u64>,
    #[serde(rename = "friendsCount", alias = "friends_count")]
    pub friends_count: Option<u64>,
    #[serde(rename = "statusesCount", alias = "statuses_count")]
    pub statuses_count: Option<u64>,
    pub location: Option<String>,
}

/// One view of the tweet payload, tagged by shape.
#[derive(Debug, Clone, Copy)]
pub enum RawShape<'a> {
    Direct(&'a DirectTweet),
    LegacyWrapped(&'a LegacyWrappedTweet),
}

/// Tweet-level fields as one shape exposes them. `None`/empty means "not here".
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeFields<'a> {
    pub id: Option<&'a str>,
    pub text: Option<&'a str>,
    pub created_at: Option<&'a str>,
    pub retweet_flag: bool,
    pub media: &'a [RawMedia],
    pub author_rest_id: Option<&'a str>,
}

fn non_empty(s: Option<&String>) -> Option<&str> {
    s.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl<'a> RawShape<'a> {
    pub fn kind(&self) -> RawShapeKind {
        match self {
            RawShape::Direct(_) => RawShapeKind::Direct,
            RawShape::LegacyWrapped(_) => RawShapeKind::LegacyWrapped,
        }
    }

    pub fn fields(&self) -> ShapeFields<'a> {
        match *self {
            RawShape::Direct(t) => {
                let legacy = t.legacy.as_ref();
                ShapeFields {
                    id: legacy.and_then(|l| non_empty(l.id_str.as_ref())),
                    text: legacy.and_then(|l| non_empty(l.full_text.as_ref())),
                    created_at: legacy.and_then(|l| non_empty(l.created_at.as_ref())),
                    retweet_flag: legacy.and_then(|l| l.is_retweet).unwrap_or(false),
                    media: legacy
                        .and_then(|l| l.extended_entities.as_ref())
                        .map(|e| e.media.as_slice())
                        .unwrap_or(&[]),
                    author_rest_id: t
                        .core
                        .as_ref()
                        .and_then(|c| c.user_results.as_ref())
                        .and_then(|u| u.result.as_ref())
                        .and_then(|r| non_empty(r.rest_id.as_ref())),
                }
            }
            RawShape::LegacyWrapped(t) => {
                let legacy = t.legacy.as_ref();
                ShapeFields {
                    id: non_empty(t.rest_id.as_ref())
                        .or_else(|| legacy.and_then(|l| non_empty(l.id_str.as_ref()))),
                    text: legacy.and_then(|l| non_empty(l.full_text.as_ref())),
                    created_at: legacy.and_then(|l| non_empty(l.created_at.as_ref())),
                    retweet_flag: legacy.and_then(|l| l.is_retweet).unwrap_or(false),
                    media: legacy
                        .and_then(|l| l.extended_entities.as_ref())
                        .map(|e| e.media.as_slice())
                        .unwrap_or(&[]),
                    author_rest_id: None,
                }
            }
        }
    }
}

impl RawTimelineItem {
    /// Present shapes in lookup order: direct first, then legacy-wrapped.
    pub fn shapes(&self) -> impl Iterator<Item = RawShape<'_>> {
        let direct = self
            .raw
            .as_ref()
            .and_then(|r| r.result.as_ref())
            .map(RawShape::Direct);
        let wrapped = self.tweet.as_ref().map(RawShape::LegacyWrapped);
        direct.into_iter().chain(wrapped)
    }

    /// First non-empty value of `pick` across shapes, with the shape that supplied it.
    pub fn first_field<'s, T>(
        &'s self,
        pick: impl Fn(ShapeFields<'s>) -> Option<T>,
    ) -> Option<(T, RawShapeKind)> {
        self.shapes()
            .find_map(|shape| pick(shape.fields()).map(|v| (v, shape.kind())))
    }

    pub fn tweet_id(&self) -> Option<&str> {
        self.shapes().find_map(|s| s.fields().id)
    }

    pub fn full_text(&self) -> Option<&str> {
        self.shapes().find_map(|s| s.fields().text)
    }

    pub fn created_at_raw(&self) -> Option<&str> {
        self.shapes().find_map(|s| s.fields().created_at)
    }

    pub fn screen_name(&self) -> Option<&str> {
        self.user_legacy()
            .and_then(|l| non_empty(l.screen_name.as_ref()))
    }

    pub fn user_legacy(&self) -> Option<&RawUserLegacy> {
        self.user.as_ref().and_then(|u| u.legacy.as_ref())
    }

    pub fn is_promoted(&self) -> bool {
        self.promoted_metadata
            .as_ref()
            .is_some_and(|v| !v.is_null())
    }

    /// Best-effort label for logs.
    pub fn label(&self) -> String {
        self.tweet_id().unwrap_or("<no id>").to_string()
    }
}

/// One page returned by the timeline capability.
#[derive(Debug, Clone, Default)]
pub struct TimelinePage {
    pub items: Vec<RawTimelineItem>,
    pub next_cursor: Option<String>,
}

/// User profile as returned by a screen-name lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteUser {
    #[serde(rename = "restId", alias = "rest_id")]
    pub rest_id: Option<String>,
    pub legacy: Option<RawUserLegacy>,
    /// The untouched lookup payload, stored alongside the author row.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[async_trait::async_trait]
pub trait TimelineApi: Send + Sync {
    /// Fetch one page of `subject_id`'s timeline, continuing from `cursor` if given.
    async fn fetch_page(
        &self,
        subject_id: &str,
        cursor: Option<&str>,
    ) -> Result<TimelinePage, FetchError>;

    /// Resolve a profile by handle.
    async fn lookup_user(&self, screen_name: &str) -> Result<RemoteUser, FetchError>;

    fn name(&self) -> &'static str;
}
