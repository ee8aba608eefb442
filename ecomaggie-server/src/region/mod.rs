//! Indonesian administrative region lookup (emsifa-compatible static JSON API)
//!
//! Responses are cached in-process for an hour; the region list changes a few
//! times a decade.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const CACHE_TTL: Duration = Duration::from_secs(3600);

/// One province / regency / district / village
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLevel {
    Provinces,
    Regencies,
    Districts,
    Villages,
}

impl RegionLevel {
    fn path(&self, parent_id: Option<&str>) -> String {
        match (self, parent_id) {
            (Self::Provinces, _) => "provinces.json".to_string(),
            (Self::Regencies, Some(id)) => format!("regencies/{id}.json"),
            (Self::Districts, Some(id)) => format!("districts/{id}.json"),
            (Self::Villages, Some(id)) => format!("villages/{id}.json"),
            (_, None) => String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("invalid region id: {0}")]
    InvalidId(String),
    #[error("region lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

struct CacheEntry {
    regions: Arc<Vec<Region>>,
    expires_at: Instant,
}

/// Region API client with TTL cache
#[derive(Clone)]
pub struct RegionClient {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<DashMap<String, CacheEntry>>,
}

impl RegionClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Children of `parent_id` at `level` (`parent_id` ignored for provinces)
    pub async fn list(&self, level: RegionLevel, parent_id: Option<&str>) -> Result<Arc<Vec<Region>>, RegionError> {
        if level != RegionLevel::Provinces {
            let id = parent_id.unwrap_or_default();
            if !is_valid_id(id) {
                return Err(RegionError::InvalidId(id.to_string()));
            }
        }
        let path = level.path(parent_id);

        if let Some(hit) = self.cached(&path) {
            return Ok(hit);
        }

        let regions: Vec<Region> = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let regions = Arc::new(regions);

        tracing::debug!(path = %path, count = regions.len(), "Region list fetched");
        self.cache.insert(
            path,
            CacheEntry {
                regions: regions.clone(),
                expires_at: Instant::now() + CACHE_TTL,
            },
        );
        Ok(regions)
    }

    fn cached(&self, path: &str) -> Option<Arc<Vec<Region>>> {
        let entry = self.cache.get(path)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.regions.clone());
        }
        drop(entry);
        self.cache.remove(path);
        None
    }

    /// Drop expired entries
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.cache.retain(|_, entry| entry.expires_at > now);
    }
}

/// Region ids are short digit strings ("32", "3273", "3273010")
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 13 && id.bytes().all(|b| b.is_ascii_digit())
}
