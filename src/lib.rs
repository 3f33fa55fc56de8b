//! Fetches prebuilt FFmpeg.wasm assets from a CDN and serves them locally.

pub mod backend;
