pub mod error;
pub mod types;

pub use error::ShulkerError;
pub use types::{Result, Version};
