pub mod config;
pub mod controller;
pub mod state;

pub use config::*;
pub use controller::*;
pub use state::*;
