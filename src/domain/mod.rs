pub mod de;
pub mod models;

pub use models::*;
