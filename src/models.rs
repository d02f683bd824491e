pub mod iq_session;
pub mod signup;
pub mod types;
pub mod user;
