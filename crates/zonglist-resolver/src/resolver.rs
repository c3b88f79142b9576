//! Metadata resolver trait.

use async_trait::async_trait;
use zonglist_core::TrackInfo;

use crate::ResolverError;

/// Trait for video metadata sources.
///
/// Implement this trait to plug a search backend into the relay.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Search for candidate tracks matching a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<TrackInfo>, ResolverError>;

    /// Resolve a single video by id.
    async fn lookup(&self, video_id: &str) -> Result<Option<TrackInfo>, ResolverError>;
}

/// Resolver over a fixed catalogue.
///
/// Matches case-insensitively on title or artist. Useful offline and in tests.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    catalogue: Vec<TrackInfo>,
}

impl StaticResolver {
    #[must_use]
    pub const fn new(catalogue: Vec<TrackInfo>) -> Self {
        Self { catalogue }
    }
}

#[async_trait]
impl MetadataResolver for StaticResolver {
    async fn search(&self, query: &str) -> Result<Vec<TrackInfo>, ResolverError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .catalogue
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle) || t.artist.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn lookup(&self, video_id: &str) -> Result<Option<TrackInfo>, ResolverError> {
        Ok(self
            .catalogue
            .iter()
            .find(|t| t.video_id == video_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;

    fn catalogue() -> StaticResolver {
        let track = |id: &str, title: &str, artist: &str| TrackInfo {
            video_id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            thumbnail: String::new(),
            duration: "3:00".to_string(),
        };
        StaticResolver::new(vec![
            track("v1", "Bohemian Rhapsody", "Queen"),
            track("v2", "Under Pressure", "Queen"),
            track("v3", "Heroes", "David Bowie"),
        ])
    }

    #[tokio::test]
    async fn test_search_matches_title_and_artist() {
        let resolver = catalogue();
        assert_eq!(resolver.search("queen").await.unwrap().len(), 2);
        let heroes = resolver.search("HEROES").await.unwrap();
        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].video_id, "v3");
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let results = assert_ok!(catalogue().search("   ").await);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_lookup() {
        let resolver = catalogue();
        assert_eq!(resolver.lookup("v2").await.unwrap().unwrap().title, "Under Pressure");
        assert!(resolver.lookup("nope").await.unwrap().is_none());
    }
}
