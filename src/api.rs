//! Records as they arrive from the image-board API.
//!
//! Field names follow the API's snake_case JSON. Every struct tolerates missing
//! fields so that partially populated responses still decode.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ordering::OrderingKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Representations {
    pub thumb: String,
    pub medium: String,
    pub large: String,
    pub full: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiImage {
    pub id: ImageId,
    pub mime_type: String,
    pub format: String,
    pub score: i64,
    pub upvotes: u32,
    pub downvotes: u32,
    pub faves: u32,
    pub comment_count: u32,
    pub width: u32,
    pub height: u32,
    pub tag_ids: Vec<u32>,
    pub tags: Vec<String>,
    pub uploader: Option<String>,
    pub view_url: String,
    pub representations: Representations,
    pub created_at: Option<DateTime<Utc>>,
}

impl ApiImage {
    pub fn is_video(&self) -> bool {
        self.mime_type.contains("video")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSearchResponse {
    pub images: Vec<ApiImage>,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TagCategory {
    Rating,
    Origin,
    Character,
    Species,
    ContentOfficial,
    ContentFanmade,
    Spoiler,
    Oc,
    #[default]
    None,
    Unmapped,
}

impl From<Option<String>> for TagCategory {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            None | Some("") => TagCategory::None,
            Some("rating") => TagCategory::Rating,
            Some("origin") => TagCategory::Origin,
            Some("character") => TagCategory::Character,
            Some("species") => TagCategory::Species,
            Some("content-official") => TagCategory::ContentOfficial,
            Some("content-fanmade") => TagCategory::ContentFanmade,
            Some("spoiler") => TagCategory::Spoiler,
            Some("oc") => TagCategory::Oc,
            Some(_) => TagCategory::Unmapped,
        }
    }
}

impl From<TagCategory> for String {
    fn from(value: TagCategory) -> Self {
        match value {
            TagCategory::Rating => "rating",
            TagCategory::Origin => "origin",
            TagCategory::Character => "character",
            TagCategory::Species => "species",
            TagCategory::ContentOfficial => "content-official",
            TagCategory::ContentFanmade => "content-fanmade",
            TagCategory::Spoiler => "spoiler",
            TagCategory::Oc => "oc",
            TagCategory::None => "",
            TagCategory::Unmapped => "unmapped",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiTag {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub images: u32,
    #[serde(rename = "spoiler_image_url")]
    pub spoiler_image_uri: String,
    pub aliased_to: Option<String>,
    pub aliased_to_id: Option<u32>,
    pub namespace: String,
    pub name_in_namespace: String,
    pub implied_tags: Vec<String>,
    pub implied_tag_ids: Vec<u32>,
    pub category: TagCategory,
}

impl ApiTag {
    /// Display label, e.g. `safe (1204)`.
    pub fn tag_string(&self) -> String {
        format!("{} ({})", self.name, self.images)
    }
}

// Two tags are the same tag at the same usage count; the rest is descriptive.
impl PartialEq for ApiTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.images == other.images
    }
}

impl Eq for ApiTag {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiUser {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub role: String,
    pub description: String,
    pub avatar_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub comment_count: i32,
    pub uploads_count: i32,
    pub post_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiFilter {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub hidden_tag_ids: Vec<u32>,
    pub hidden_tags: Vec<String>,
    pub spoilered_tag_ids: Vec<u32>,
    pub spoilered_tags: Vec<String>,
    pub hidden_complex: String,
    pub spoilered_complex: String,
    pub public: bool,
    pub system: bool,
    pub user_count: u32,
    pub user_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiComment {
    pub id: u32,
    pub image_id: ImageId,
    pub author: String,
    pub avatar: String,
    pub body: String,
    pub user_id: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsResponse {
    pub comments: Vec<ApiComment>,
    pub total: u32,
}

/// Secondary data fetched lazily for the image on screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDetail {
    pub tags: Vec<ApiTag>,
    pub comments: CommentsResponse,
}

/// An image together with where it was found in the search results.
///
/// Cheap to clone; the API payload is shared and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    image: Arc<ApiImage>,
    key: OrderingKey,
}

impl ImageRecord {
    pub fn new(image: ApiImage, page: u32, position: u32) -> Self {
        Self {
            image: Arc::new(image),
            key: OrderingKey { page, position },
        }
    }

    /// Tags a whole search page with its page number and in-page positions.
    pub fn from_page(page: u32, images: Vec<ApiImage>) -> Vec<Self> {
        images
            .into_iter()
            .enumerate()
            .map(|(position, image)| Self::new(image, page, position as u32))
            .collect()
    }

    pub fn id(&self) -> ImageId {
        self.image.id
    }

    pub fn mime_type(&self) -> &str {
        &self.image.mime_type
    }

    pub fn key(&self) -> OrderingKey {
        self.key
    }

    pub fn image(&self) -> &ApiImage {
        &self.image
    }
}
