pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod session;
pub mod srs;
pub mod store;

#[cfg(test)]
pub mod testing;
