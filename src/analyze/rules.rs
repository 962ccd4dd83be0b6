//! Ordered rule table for classification without AI.
//!
//! Rules are evaluated top-down; the first matching rule decides the content type,
//! otherwise the table's fallback applies. Keyword predicates are case-insensitive.
//! Alphanumeric ASCII keywords must start at a word boundary, so `AI` does not fire
//! on `said` while `update` still matches `updated`; other keywords (emoji, CJK)
//! match as plain substrings.

use regex::Regex;

use crate::record::{ContentType, TweetRecord};

pub const ANNOUNCEMENT_KEYWORDS: &[&str] = &[
    "📢",
    "公告",
    "通知",
    "发布",
    "更新",
    "release",
    "update",
    "announcement",
];

pub const AI_KEYWORDS: &[&str] = &[
    "AI",
    "人工智能",
    "Midjourney",
    "GPT",
    "Machine Learning",
    "机器学习",
];

#[derive(Debug, Clone)]
pub enum Predicate {
    HasImages,
    HasVideos,
    TextMatches(Regex),
}

impl Predicate {
    /// Build a case-insensitive keyword matcher.
    pub fn keywords(words: &[&str]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = words
            .iter()
            .filter(|w| !w.is_empty())
            .map(|w| {
                let escaped = regex::escape(w);
                if w.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
                    format!(r"\b{escaped}")
                } else {
                    escaped
                }
            })
            .collect();
        Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).map(Predicate::TextMatches)
    }

    pub fn matches(&self, record: &TweetRecord) -> bool {
        match self {
            Predicate::HasImages => !record.media.images.is_empty(),
            Predicate::HasVideos => !record.media.videos.is_empty(),
            Predicate::TextMatches(re) => re.is_match(&record.text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub predicate: Predicate,
    pub result: ContentType,
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    name: &'static str,
    rules: Vec<Rule>,
    fallback: ContentType,
}

impl RuleTable {
    pub fn new(name: &'static str, rules: Vec<Rule>, fallback: ContentType) -> Self {
        Self {
            name,
            rules,
            fallback,
        }
    }

    /// images → post_with_media, videos → post_with_video, otherwise post.
    pub fn media() -> Self {
        Self::new(
            "media",
            vec![
                Rule {
                    name: "has_images",
                    predicate: Predicate::HasImages,
                    result: ContentType::PostWithMedia,
                },
                Rule {
                    name: "has_videos",
                    predicate: Predicate::HasVideos,
                    result: ContentType::PostWithVideo,
                },
            ],
            ContentType::Post,
        )
    }

    /// Announcement keywords → announcement, AI keywords → ai_related, otherwise regular.
    pub fn keywords() -> Result<Self, regex::Error> {
        Ok(Self::new(
            "keywords",
            vec![
                Rule {
                    name: "announcement",
                    predicate: Predicate::keywords(ANNOUNCEMENT_KEYWORDS)?,
                    result: ContentType::Announcement,
                },
                Rule {
                    name: "ai_related",
                    predicate: Predicate::keywords(AI_KEYWORDS)?,
                    result: ContentType::AiRelated,
                },
            ],
            ContentType::Regular,
        ))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the decided type and the name of the matching rule (`None` for the fallback).
    pub fn evaluate(&self, record: &TweetRecord) -> (ContentType, Option<&'static str>) {
        self.rules
            .iter()
            .find(|r| r.predicate.matches(record))
            .map(|r| (r.result, Some(r.name)))
            .unwrap_or((self.fallback, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Author, Flags, Image, Media, RawShapeKind};
    use chrono::Utc;

    fn record(text: &str, images: usize, videos: usize) -> TweetRecord {
        TweetRecord {
            id: "1".into(),
            url: TweetRecord::status_url("a", "1"),
            author: Author {
                rest_id: "9".into(),
                screen_name: "a".into(),
                ..Author::default()
            },
            text: text.into(),
            created_at: Utc::now(),
            media: Media {
                images: (0..images)
                    .map(|i| Image {
                        url: format!("https://img/{i}.jpg"),
                        alt_text: None,
                    })
                    .collect(),
                videos: (0..videos).map(|i| format!("https://vid/{i}.mp4")).collect(),
            },
            content_type: ContentType::Unknown,
            flags: Flags::default(),
            provenance: RawShapeKind::Direct,
        }
    }

    #[test]
    fn media_table_first_match_wins() {
        let t = RuleTable::media();
        assert_eq!(t.evaluate(&record("x", 1, 1)).0, ContentType::PostWithMedia);
        assert_eq!(t.evaluate(&record("x", 0, 1)).0, ContentType::PostWithVideo);
        assert_eq!(t.evaluate(&record("x", 0, 0)), (ContentType::Post, None));
    }

    #[test]
    fn keyword_table_is_case_insensitive() {
        let t = RuleTable::keywords().unwrap();
        assert_eq!(
            t.evaluate(&record("New RELEASE today", 0, 0)).0,
            ContentType::Announcement
        );
        assert_eq!(
            t.evaluate(&record("playing with midjourney v6", 0, 0)).0,
            ContentType::AiRelated
        );
        assert_eq!(t.evaluate(&record("📢 big news", 0, 0)).0, ContentType::Announcement);
        assert_eq!(t.evaluate(&record("今天学习人工智能", 0, 0)).0, ContentType::AiRelated);
    }

    #[test]
    fn announcement_outranks_ai() {
        let t = RuleTable::keywords().unwrap();
        let (ct, rule) = t.evaluate(&record("GPT update shipped", 0, 0));
        assert_eq!(ct, ContentType::Announcement);
        assert_eq!(rule, Some("announcement"));
    }

    #[test]
    fn ascii_keywords_anchor_at_word_start() {
        let t = RuleTable::keywords().unwrap();
        assert_eq!(t.evaluate(&record("she said it rained", 0, 0)).0, ContentType::Regular);
        assert_eq!(t.evaluate(&record("an ai model", 0, 0)).0, ContentType::AiRelated);
    }

    #[test]
    fn inflected_announcement_words_still_match() {
        let t = RuleTable::keywords().unwrap();
        assert_eq!(t.evaluate(&record("we updated the docs", 0, 0)).0, ContentType::Announcement);
        assert_eq!(t.evaluate(&record("Releases are out", 0, 0)).0, ContentType::Announcement);
    }
}
