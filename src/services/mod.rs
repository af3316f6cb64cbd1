// Services module for catalog access
pub mod annex;
pub mod catalog;
pub mod downloader;
pub mod github;
