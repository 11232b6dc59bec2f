//! Represents a camera record — the only entity served by this application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form attributes submitted by the client plus the system-stamped fields.
pub type CameraFields = BTreeMap<String, String>;

/// Display name of the authenticated user who created the record.
pub const CREATED_BY: &str = "createdBy";

/// Identifier of the authenticated user who created the record.
pub const CREATED_BY_ID: &str = "createdById";

/// Public URL of the uploaded image.
pub const IMAGE_URL: &str = "imageUrl";

/// Value stored in `createdBy` when no identity accompanies the request.
pub const ANONYMOUS: &str = "Anonymous";

/// A persisted camera.
///
/// The `id` is assigned by the storage backend when the record is created and
/// never changes afterwards. Every other attribute lives in `fields`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Camera {
    /// Backend-assigned opaque identifier.
    pub id: String,

    /// Attributes, flattened next to `id` when serialized.
    #[serde(flatten)]
    pub fields: CameraFields,
}

impl Camera {
    pub fn new(id: impl Into<String>, fields: CameraFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a single attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn created_by_id(&self) -> Option<&str> {
        self.get(CREATED_BY_ID)
    }

    /// Non-empty image URL, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.get(IMAGE_URL).filter(|url| !url.is_empty())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Records in backend order, at most the requested limit.
    pub cameras: Vec<Camera>,

    /// Cursor for the following page; `None` once the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Strip keys the client is never allowed to set.
///
/// Identifiers are assigned by the backend only, so an `id` field arriving
/// with a submission is discarded before persisting.
pub fn sanitize(mut fields: CameraFields) -> CameraFields {
    fields.remove("id");
    fields
}
