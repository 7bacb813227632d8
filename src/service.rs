//! Collaborators the gallery consumes: the network, and the navigation stack
//! it hands results back to.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use crate::{
    api::{ApiTag, ImageDetail, ImageId, ImageRecord, ImageSearchResponse},
    error::FetchError,
    fs_utils::{collect_fixtures, FixtureIndex},
};

#[async_trait]
pub trait FetchService: Send + Sync {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ImageSearchResponse, FetchError>;

    async fn fetch_detail(&self, id: ImageId) -> Result<ImageDetail, FetchError>;
}

/// What the gallery hands to the previous screen when it is left.
#[derive(Debug, Clone, PartialEq)]
pub enum BackPayload {
    Image(ImageRecord),
    Tag(ApiTag),
}

pub trait Navigator: Send + Sync {
    /// Pops the current screen. Fire-and-forget.
    fn back(&self, payload: Option<BackPayload>);
}

/// Serves recorded API responses from a directory of `page-<N>.json` and
/// `detail-<ID>.json` files.
pub struct FixtureService {
    index: FixtureIndex,
    latency: Duration,
}

impl FixtureService {
    pub fn open(root: &Path, recursive: bool) -> anyhow::Result<Self> {
        let index = collect_fixtures(root, recursive)?;
        Ok(Self::new(index))
    }

    pub fn new(index: FixtureIndex) -> Self {
        Self {
            index,
            latency: Duration::ZERO,
        }
    }

    /// Delays every response by a random amount up to `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn index(&self) -> &FixtureIndex {
        &self.index
    }

    async fn simulate_latency(&self) {
        if self.latency.is_zero() {
            return;
        }
        let millis = self.latency.as_millis() as u64;
        let delay = rand::thread_rng().gen_range(0..=millis);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl FetchService for FixtureService {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ImageSearchResponse, FetchError> {
        self.simulate_latency().await;
        let Some(path) = self.index.pages.get(&page) else {
            debug!(page, "no fixture for page, treating as end of results");
            return Ok(ImageSearchResponse::default());
        };
        let bytes = tokio::fs::read(path).await?;
        let mut response: ImageSearchResponse = serde_json::from_slice(&bytes)?;
        if response.images.len() > page_size as usize {
            warn!(
                page,
                page_size,
                recorded = response.images.len(),
                "fixture page is larger than the page size, dropping the rest"
            );
            response.images.truncate(page_size as usize);
        }
        Ok(response)
    }

    async fn fetch_detail(&self, id: ImageId) -> Result<ImageDetail, FetchError> {
        self.simulate_latency().await;
        let path = self.index.details.get(&id).ok_or(FetchError::NotFound(id))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
