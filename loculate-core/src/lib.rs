pub mod config;
pub mod origins;
pub mod protocol;
pub mod state;
pub mod types;
pub mod units;

// Keep the public surface small and intentional.
pub use config::*;
pub use origins::*;
pub use protocol::*;
pub use state::*;
pub use types::*;
pub use units::*;
