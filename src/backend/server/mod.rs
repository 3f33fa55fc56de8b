//! Local development HTTP server.

pub mod mime;
pub mod static_server;

pub use static_server::StaticServer;
