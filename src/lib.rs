pub mod api;
pub mod api_client;
pub mod config;
pub mod domain;
pub mod download;
pub mod file_manager;
pub mod session;
pub mod storage;

pub use api::PortalApi;
pub use api_client::{ApiError, ApiService};
pub use session::Session;
