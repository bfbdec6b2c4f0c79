pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::storage::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use core::dashboard::{build_dashboard, DashboardReport, DashboardRequest};
pub use core::engine::{DashboardEngine, DashboardRun};
pub use domain::model::{Category, Cell, Table};
pub use utils::error::{AggregationError, DashboardError, Result};
