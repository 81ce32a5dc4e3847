pub mod args;
mod auth;
pub mod calc;
pub mod commands;
mod config;
mod db;
mod error;
pub mod model;
pub mod resources;
pub mod rotation;
mod server;
pub mod summary;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use model::Amount;
