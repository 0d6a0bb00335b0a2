pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod export;
pub mod model;
pub mod report;
mod utils;


pub use config::Config;
pub use db::Table;
pub use error::{Error, ErrorType, Result};
pub use export::{Sheet, SheetSummary};
