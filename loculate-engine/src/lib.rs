pub mod capture;
pub mod coordinator;
pub mod panel;
pub mod traits;
