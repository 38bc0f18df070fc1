pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod server;
pub mod transport;
pub mod utils;

pub use server::Server;
