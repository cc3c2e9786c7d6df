//! Data models for the store backend.
//!
//! - `Product`, `ProductInput`, `ImageUpload`: catalog entries and edits
//! - `Order`, `OrderItem`, `OrderStatus`: customer orders
//! - `Identity`, `RegisterRequest`: the signed-in user

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderItemProduct, OrderStatus, OrderStatusUpdate};
pub use product::{ImageUpload, Product, ProductInput, UploadError, MAX_IMAGE_BYTES};
pub use user::{Identity, RegisterRequest};
