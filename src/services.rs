pub mod moderation;
pub mod password;
mod signup;

pub use moderation::{ModerationChecker, WordlistModerator};
pub use password::PasswordHasher;
pub use signup::{MIN_PASSWORD_LEN, SignupResult, SignupService, parse_leading_int};
