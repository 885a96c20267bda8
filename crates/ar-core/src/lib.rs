pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod listeners;
pub mod platform;
pub mod state;

pub use config::*;
pub use controller::*;
pub use error::{Result, ViewerError};
pub use gesture::*;
pub use listeners::*;
pub use platform::*;
pub use state::*;
