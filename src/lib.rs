pub mod api;
pub mod error;
pub mod fs_utils;
pub mod gallery;
pub mod ordering;
pub mod service;
pub mod settings;

pub use api::{ImageId, ImageRecord};
pub use error::{FetchError, GalleryError};
pub use gallery::{Gallery, GalleryEvent};
