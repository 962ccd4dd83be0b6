// src/refresh.rs
//! Author profile refresh: re-resolve every named author and write the profile back.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::{FetchError, StoreError};
use crate::ingest::types::{RemoteUser, TimelineApi};
use crate::store::{AuthorRow, AuthorUpdate, TweetStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub authors: usize,
    pub updated: usize,
    pub errors: usize,
}

impl fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Refresh complete:")?;
        writeln!(f, "- authors: {}", self.authors)?;
        writeln!(f, "- updated: {}", self.updated)?;
        write!(f, "- errors: {}", self.errors)
    }
}

#[derive(Debug, thiserror::Error)]
enum RefreshFailure {
    #[error("author row has neither screen name nor name")]
    NoHandle,
    #[error(transparent)]
    Lookup(#[from] FetchError),
    #[error("lookup returned an empty profile")]
    EmptyProfile,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct UserRefresher {
    store: Arc<dyn TweetStore>,
    timeline: Arc<dyn TimelineApi>,
    delay: Duration,
}

impl UserRefresher {
    pub fn new(store: Arc<dyn TweetStore>, timeline: Arc<dyn TimelineApi>, delay: Duration) -> Self {
        Self {
            store,
            timeline,
            delay,
        }
    }

    pub async fn run(&self) -> Result<RefreshStats, StoreError> {
        let authors = self.store.list_authors().await?;
        let mut stats = RefreshStats {
            authors: authors.len(),
            ..RefreshStats::default()
        };
        tracing::info!(authors = authors.len(), "refreshing author profiles");

        for (idx, author) in authors.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.delay).await;
            }
            match self.refresh_one(author).await {
                Ok(handle) => {
                    stats.updated += 1;
                    tracing::info!(id = author.id, %handle, "author refreshed");
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::error!(id = author.id, name = ?author.name, error = %e, "author refresh failed");
                }
            }
        }
        Ok(stats)
    }

    async fn refresh_one(&self, author: &AuthorRow) -> Result<String, RefreshFailure> {
        let handle = author
            .screen_name
            .as_deref()
            .or(author.name.as_deref())
            .filter(|h| !h.trim().is_empty())
            .ok_or(RefreshFailure::NoHandle)?;
        let user = self.timeline.lookup_user(handle).await?;
        let update = author_update(&user).ok_or(RefreshFailure::EmptyProfile)?;
        self.store.update_author(author.id, &update).await?;
        Ok(update.screen_name)
    }
}

/// `None` when the lookup carries no rest id or no profile block.
pub fn author_update(user: &RemoteUser) -> Option<AuthorUpdate> {
    let rest_id = user.rest_id.as_deref().filter(|s| !s.is_empty())?;
    let legacy = user.legacy.as_ref()?;
    let screen_name = legacy.screen_name.clone().unwrap_or_default();
    Some(AuthorUpdate {
        rest_id: rest_id.to_string(),
        name: legacy.name.clone().unwrap_or_default(),
        avatar: legacy.profile_image_url_https.clone().unwrap_or_default(),
        profile_url: format!("https://x.com/{screen_name}"),
        screen_name,
        description: legacy.description.clone().unwrap_or_default(),
        location: legacy.location.clone().unwrap_or_default(),
        followers_count: legacy.followers_count.unwrap_or(0),
        following_count: legacy.friends_count.unwrap_or(0),
        tweets_count: legacy.statuses_count.unwrap_or(0),
        raw_data: user.raw.clone(),
        updated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::RawUserLegacy;

    #[test]
    fn update_requires_rest_id_and_profile() {
        let mut user = RemoteUser::default();
        assert!(author_update(&user).is_none());
        user.rest_id = Some("42".into());
        assert!(author_update(&user).is_none());
        user.legacy = Some(RawUserLegacy {
            screen_name: Some("alice".into()),
            friends_count: Some(3),
            ..RawUserLegacy::default()
        });
        let u = author_update(&user).unwrap();
        assert_eq!(u.profile_url, "https://x.com/alice");
        assert_eq!(u.following_count, 3);
    }
}
