//! Backend of the application.

pub mod fetcher;
pub mod server;
pub mod services;
pub mod utils;

pub use fetcher::AssetFetcher;
pub use server::StaticServer;
