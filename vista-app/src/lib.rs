//! Vista application: the web page and the terminal command that drive
//! [`vista::analysis::Analyzer`].

pub mod config;
pub mod error;
pub mod server;
pub mod terminal;

pub use error::{AppError, Result};
