pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod services;
pub mod state;

// Convenient re-exports (so call sites can do `iq_signup::Registry`, etc.)
pub use error::{SignupError, SignupField};
pub use state::registry::{Registry, Repos};
