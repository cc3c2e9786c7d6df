use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest image the upload endpoint accepts (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Editable fields of this product, for prefilling an update
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            price: self.price,
            stock_quantity: self.stock_quantity,
            category: self.category.clone().unwrap_or_default(),
            is_active: self.is_active,
        }
    }
}

/// Payload for creating or updating a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock_quantity: i64,
    pub category: String,
    pub is_active: bool,
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: 0.0,
            stock_quantity: 0,
            category: String::new(),
            is_active: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Only image files can be uploaded (got {0})")]
    NotAnImage(String),

    #[error("Image is {size} bytes; the limit is 5MB")]
    TooLarge { size: usize },
}

/// An image file that passed local checks and is ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, UploadError> {
        let content_type = content_type.into();
        if !content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage(content_type));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge { size: bytes.len() });
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    /// Guess an image content type from a file extension
    pub fn content_type_for(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "svg" => Some("image/svg+xml"),
            _ => None,
        }
    }
}
