// lanboard-api: Async Rust client for the lanboard inventory backend (REST + scan push)

pub mod client;
pub mod error;
pub mod push;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use push::{PushHandle, ReconnectConfig, ScanEvent, ScanEventKind};
pub use transport::TransportConfig;
