#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use xerpi::api::{
    ApiImage, ApiTag, CommentsResponse, ImageDetail, ImageId, ImageRecord, ImageSearchResponse,
};
use xerpi::error::FetchError;
use xerpi::gallery::Gallery;
use xerpi::service::{BackPayload, Navigator};
use xerpi::settings::{GalleryConfig, Settings};

pub fn image(id: u64, mime_type: &str) -> ApiImage {
    ApiImage {
        id: ImageId(id),
        mime_type: mime_type.to_string(),
        score: id as i64,
        width: 640,
        height: 480,
        ..Default::default()
    }
}

pub fn png(id: u64) -> ApiImage {
    image(id, "image/png")
}

pub fn record(id: u64, page: u32, position: u32) -> ImageRecord {
    ImageRecord::new(png(id), page, position)
}

pub fn tag(id: u32, name: &str) -> ApiTag {
    ApiTag {
        id,
        name: name.to_string(),
        images: 10,
        ..Default::default()
    }
}

pub fn detail_for(id: ImageId) -> ImageDetail {
    ImageDetail {
        tags: vec![tag(id.0 as u32, &format!("tag-{id}"))],
        comments: CommentsResponse::default(),
    }
}

/// In-memory fetch service. Page and detail fetches can each be held back
/// behind a gate until the test releases permits.
#[derive(Default)]
pub struct MockService {
    pages: HashMap<u32, Vec<ApiImage>>,
    total: u32,
    failing_pages: Mutex<HashSet<u32>>,
    page_gate: Option<Arc<Semaphore>>,
    detail_gate: Option<Arc<Semaphore>>,
    pub page_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32, images: Vec<ApiImage>) -> Self {
        self.total += images.len() as u32;
        self.pages.insert(page, images);
        self
    }

    pub fn with_page_gate(mut self) -> Self {
        self.page_gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn with_detail_gate(mut self) -> Self {
        self.detail_gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// The next fetch of `page` fails with a network error.
    pub fn fail_page_once(&self, page: u32) {
        self.failing_pages.lock().unwrap().insert(page);
    }

    pub fn release_pages(&self, permits: usize) {
        if let Some(gate) = &self.page_gate {
            gate.add_permits(permits);
        }
    }

    pub fn release_details(&self, permits: usize) {
        if let Some(gate) = &self.detail_gate {
            gate.add_permits(permits);
        }
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

async fn pass_gate(gate: &Option<Arc<Semaphore>>) -> Result<(), FetchError> {
    if let Some(gate) = gate {
        gate.acquire()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .forget();
    }
    Ok(())
}

#[async_trait]
impl xerpi::service::FetchService for MockService {
    async fn fetch_page(&self, page: u32, _page_size: u32) -> Result<ImageSearchResponse, FetchError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(&self.page_gate).await?;
        if self.failing_pages.lock().unwrap().remove(&page) {
            return Err(FetchError::Network(format!("page {page} unavailable")));
        }
        Ok(ImageSearchResponse {
            images: self.pages.get(&page).cloned().unwrap_or_default(),
            total: self.total,
        })
    }

    async fn fetch_detail(&self, id: ImageId) -> Result<ImageDetail, FetchError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(&self.detail_gate).await?;
        Ok(detail_for(id))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub calls: Mutex<Vec<Option<BackPayload>>>,
}

impl RecordingNavigator {
    pub fn calls(&self) -> Vec<Option<BackPayload>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn back(&self, payload: Option<BackPayload>) {
        self.calls.lock().unwrap().push(payload);
    }
}

pub const PAGE_SIZE: u32 = 3;

pub fn test_config() -> GalleryConfig {
    GalleryConfig {
        page_size: PAGE_SIZE,
        remaining_items_threshold: 0,
        ..Default::default()
    }
}

pub fn gallery_with(
    service: &Arc<MockService>,
    navigator: &Arc<RecordingNavigator>,
    config: GalleryConfig,
) -> Gallery {
    Gallery::new(service.clone(), navigator.clone(), config, Settings::default())
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).expect("failed to write fixture");
}
