use thiserror::Error;

use crate::api::ImageId;

/// Failure of a page or detail fetch.
///
/// `Cancelled` is not a failure from the user's point of view: the result was
/// abandoned on purpose and must not be applied.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("image {0} not found")]
    NotFound(ImageId),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("invalid page request: page {page} with page size {page_size}")]
    InvalidPageRequest { page: u32, page_size: u32 },
}
