mod iq_session;
mod iq_session_db;
mod iq_session_mem;
mod user;
mod user_db;
mod user_mem;

pub use iq_session_db::IqSessionRepository;
pub use iq_session_mem::MemIqSessionRepository;
pub use user_db::UserRepository;
pub use user_mem::MemUserRepository;

pub use iq_session::IqSessionRepo;
pub use user::UserRepo;
