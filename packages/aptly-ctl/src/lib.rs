pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pubspec;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use pubspec::PubSpec;
