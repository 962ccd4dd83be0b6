// src/ingest/normalize.rs
//! Schema normalization: raw timeline item → [`TweetRecord`].

use chrono::{DateTime, Utc};
use std::fmt;

use crate::ingest::types::{RawMedia, RawTimelineItem};
use crate::record::{Author, ContentType, Flags, Image, Media, TweetRecord};

/// Text prefix marking a classic retweet.
pub const RETWEET_PREFIX: &str = "RT @";

/// Upstream timestamp layout, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const TIMELINE_TS_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

const MP4: &str = "video/mp4";

/// Why an item produced no record. Not an error: the caller just skips the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeReject {
    MissingScreenName,
    MissingId,
    MissingCreatedAt,
    InvalidCreatedAt(String),
}

impl fmt::Display for NormalizeReject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeReject::MissingScreenName => f.write_str("missing screen name"),
            NormalizeReject::MissingId => f.write_str("missing tweet id"),
            NormalizeReject::MissingCreatedAt => f.write_str("missing creation time"),
            NormalizeReject::InvalidCreatedAt(s) => write!(f, "unparseable creation time {s:?}"),
        }
    }
}

/// Parse the upstream creation time. Accepts the timeline layout plus RFC 3339 / RFC 2822.
pub fn parse_created_at(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_str(s, TIMELINE_TS_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .or_else(|_| DateTime::parse_from_rfc2822(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Retweet detection: `"RT @"` text prefix OR an explicit upstream flag.
///
/// A quoted tweet whose own text starts with "RT @" is reported as a retweet too.
pub fn is_retweet(item: &RawTimelineItem) -> bool {
    let text = item.full_text().unwrap_or_default();
    text.starts_with(RETWEET_PREFIX) || item.shapes().any(|s| s.fields().retweet_flag)
}

/// Split raw media into images and best-quality video URLs.
pub fn extract_media(media: &[RawMedia]) -> Media {
    let images = media
        .iter()
        .filter(|m| m.kind == "photo")
        .map(|m| Image {
            url: m.media_url_https.clone().unwrap_or_default(),
            alt_text: m.ext_alt_text.clone().filter(|a| !a.is_empty()),
        })
        .collect();

    let videos = media
        .iter()
        .filter(|m| m.kind == "video" || m.kind == "animated_gif")
        .filter_map(best_mp4_variant)
        .collect();

    Media { images, videos }
}

fn best_mp4_variant(m: &RawMedia) -> Option<String> {
    m.video_info
        .as_ref()?
        .variants
        .iter()
        .filter(|v| v.content_type.as_deref() == Some(MP4))
        .filter(|v| v.url.as_deref().is_some_and(|u| !u.is_empty()))
        // max_by_key keeps the last of equal maxima; rev() makes the first one win
        .rev()
        .max_by_key(|v| v.bitrate.unwrap_or(0))
        .and_then(|v| v.url.clone())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the canonical record. `subject_rest_id` is the rest id of the subject
    /// being ingested and takes precedence over ids found in the payload.
    pub fn normalize(
        &self,
        item: &RawTimelineItem,
        subject_rest_id: Option<&str>,
    ) -> Result<TweetRecord, NormalizeReject> {
        let screen_name = item
            .screen_name()
            .ok_or(NormalizeReject::MissingScreenName)?
            .to_string();
        let (id, provenance) = item
            .first_field(|f| f.id)
            .ok_or(NormalizeReject::MissingId)?;
        let id = id.to_string();

        let created_raw = item
            .created_at_raw()
            .ok_or(NormalizeReject::MissingCreatedAt)?;
        let created_at = parse_created_at(created_raw)
            .ok_or_else(|| NormalizeReject::InvalidCreatedAt(created_raw.to_string()))?;

        let media = item
            .first_field(|f| (!f.media.is_empty()).then_some(f.media))
            .map(|(m, _)| extract_media(m))
            .unwrap_or_default();

        let text = item.full_text().unwrap_or_default().to_string();
        let author = self.author(item, &screen_name, subject_rest_id);

        Ok(TweetRecord {
            url: TweetRecord::status_url(&screen_name, &id),
            id,
            author,
            text,
            created_at,
            media,
            content_type: ContentType::Unknown,
            flags: Flags {
                is_retweet: is_retweet(item),
                is_promoted: item.is_promoted(),
            },
            provenance,
        })
    }

    fn author(
        &self,
        item: &RawTimelineItem,
        screen_name: &str,
        subject_rest_id: Option<&str>,
    ) -> Author {
        let user_rest_id = item
            .user
            .as_ref()
            .and_then(|u| u.rest_id.as_deref())
            .filter(|s| !s.is_empty());
        let rest_id = subject_rest_id
            .filter(|s| !s.is_empty())
            .or(user_rest_id)
            .or_else(|| item.shapes().find_map(|s| s.fields().author_rest_id))
            .unwrap_or_default()
            .to_string();

        let legacy = item.user_legacy();
        Author {
            rest_id,
            screen_name: screen_name.to_string(),
            name: legacy.and_then(|l| l.name.clone()),
            avatar_url: legacy.and_then(|l| l.profile_image_url_https.clone()),
            description: legacy.and_then(|l| l.description.clone()),
            followers_count: legacy.and_then(|l| l.followers_count),
            friends_count: legacy.and_then(|l| l.friends_count),
            location: legacy.and_then(|l| l.location.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{VideoInfo, VideoVariant};
    use chrono::TimeZone;

    fn variant(ct: &str, bitrate: Option<u64>, url: &str) -> VideoVariant {
        VideoVariant {
            content_type: Some(ct.into()),
            bitrate,
            url: Some(url.into()),
        }
    }

    #[test]
    fn parses_timeline_timestamp() {
        let dt = parse_created_at("Wed Oct 10 20:19:24 +0000 2018").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap());
        assert!(parse_created_at("2024-05-01T10:00:00Z").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }

    #[test]
    fn picks_highest_bitrate_mp4() {
        let media = vec![RawMedia {
            kind: "video".into(),
            video_info: Some(VideoInfo {
                variants: vec![
                    variant("application/x-mpegURL", None, "https://v/playlist.m3u8"),
                    variant("video/mp4", Some(832_000), "https://v/low.mp4"),
                    variant("video/mp4", Some(2_176_000), "https://v/high.mp4"),
                ],
            }),
            ..Default::default()
        }];
        let m = extract_media(&media);
        assert_eq!(m.videos, vec!["https://v/high.mp4".to_string()]);
        assert!(m.images.is_empty());
    }

    #[test]
    fn gif_without_bitrate_still_selected() {
        let media = vec![RawMedia {
            kind: "animated_gif".into(),
            video_info: Some(VideoInfo {
                variants: vec![variant("video/mp4", None, "https://v/gif.mp4")],
            }),
            ..Default::default()
        }];
        assert_eq!(extract_media(&media).videos, vec!["https://v/gif.mp4"]);
    }

    #[test]
    fn video_without_mp4_is_omitted() {
        let media = vec![RawMedia {
            kind: "video".into(),
            video_info: Some(VideoInfo {
                variants: vec![variant("application/x-mpegURL", None, "https://v/p.m3u8")],
            }),
            ..Default::default()
        }];
        assert!(extract_media(&media).videos.is_empty());
    }
}
