//! A coop node: a bounded local cache that, on a miss, asks its siblings in
//! order and then the origin, and keeps whatever it fetched.

pub mod cli;
pub mod config;
pub mod metrics;
pub mod node;
pub mod server;
pub mod source;

#[cfg(test)]
mod tests;

pub use node::{PeerNode, Resolution, ResolveError, ServedBy};
pub use server::Server;
