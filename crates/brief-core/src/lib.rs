pub mod chunker;
pub mod client;
pub mod env;
pub mod error;
pub mod extract;
pub mod http;
pub mod provider;
pub mod session;
pub mod summarize;

pub use error::*;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
