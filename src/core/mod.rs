pub mod aggregate;
pub mod dashboard;
pub mod engine;
pub mod export;
pub mod loader;
pub mod schema;
pub mod transform;

pub use crate::domain::model::{Category, Cell, Table};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
