pub mod manager;

pub use manager::{ApiResponse, ManagerProxy};
