use crate::db::repo::{IqSessionRepo, UserRepo};
use crate::error::{SignupError, SignupField};
use crate::models::signup::{ClientInfo, SignupForm, non_empty};
use crate::models::types::UserId;
use crate::models::user::{NewUser, User, validate_username};
use crate::services::moderation::ModerationChecker;
use crate::services::password::PasswordHasher;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Minimum password length, counted in UTF-16 code units like the browser does
pub const MIN_PASSWORD_LEN: usize = 8;

pub type SignupResult<T> = Result<T, SignupError>;

/// Form fields that passed every local check, before any store is consulted.
struct ValidSignup {
    username: String,
    password: String,
    session_id: String,
    client_iq: i64,
}

pub struct SignupService {
    users: Arc<dyn UserRepo>,
    sessions: Arc<dyn IqSessionRepo>,
    moderation: Arc<dyn ModerationChecker>,
    hasher: PasswordHasher,
    domain: String,
}

impl SignupService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        sessions: Arc<dyn IqSessionRepo>,
        moderation: Arc<dyn ModerationChecker>,
        hasher: PasswordHasher,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            users,
            sessions,
            moderation,
            hasher,
            domain: domain.into(),
        }
    }

    /// Registers a new user from a submitted signup form.
    ///
    /// Checks run in a fixed order and the first failure is returned. The stored
    /// `iq` is always the score held by the session store; the client score is
    /// only compared against it. The IQ session is consumed on success.
    #[instrument(
        skip_all,
        fields(
            username = form.username.as_deref().unwrap_or(""),
            session_id = form.session_id.as_deref().unwrap_or(""),
        )
    )]
    pub async fn signup(&self, form: &SignupForm, client: ClientInfo) -> SignupResult<User> {
        let valid = self.validate(form)?;

        let Some(server_iq) = self.sessions.get_session_score(&valid.session_id).await? else {
            return Err(SignupError::SessionNotFound);
        };

        if i64::from(server_iq) != valid.client_iq {
            return Err(SignupError::IqMismatch);
        }

        if self.users.get_by_username(&valid.username).await?.is_some() {
            return Err(SignupError::UsernameTaken);
        }

        let password_hash = self.hasher.hash_blocking(valid.password).await?;

        // a concurrent signup for the same name fails here with a unique violation -> UsernameTaken
        let user = self
            .users
            .insert_user(NewUser {
                id: UserId::new(),
                username: valid.username,
                password_hash,
                domain: self.domain.clone(),
                iq: server_iq,
                ip: client.ip,
                user_agent: client.user_agent,
            })
            .await?;

        if let Err(e) = self.sessions.delete_session(&valid.session_id).await {
            warn!(error = %e, user_id = %user.id, "failed to delete consumed iq session");
        }

        info!(user_id = %user.id, username = %user.username, iq = user.iq, "user registered");
        Ok(user)
    }

    fn validate(&self, form: &SignupForm) -> SignupResult<ValidSignup> {
        let Some(username) = form.username() else {
            return Err(SignupError::MissingField(SignupField::Username));
        };
        if !validate_username(&username) {
            return Err(SignupError::InvalidUsername);
        }
        if self.moderation.check_hardcore(&username) {
            return Err(SignupError::ModerationRejected);
        }

        let password = non_empty(&form.password).ok_or(SignupError::MissingField(SignupField::Password))?;
        let confirm = non_empty(&form.confirm_password)
            .ok_or(SignupError::MissingField(SignupField::ConfirmPassword))?;
        let session_id = non_empty(&form.session_id).ok_or(SignupError::MissingField(SignupField::SessionId))?;
        let iq_score = non_empty(&form.iq_score).ok_or(SignupError::MissingField(SignupField::IqScore))?;

        if password.encode_utf16().count() < MIN_PASSWORD_LEN {
            return Err(SignupError::PasswordTooShort);
        }
        if password != confirm {
            return Err(SignupError::PasswordMismatch);
        }

        let client_iq = parse_leading_int(iq_score).ok_or(SignupError::InvalidIqFormat)?;

        Ok(ValidSignup {
            username,
            password: password.to_string(),
            session_id: session_id.to_string(),
            client_iq,
        })
    }
}

/// Lenient base-10 parse: skips leading whitespace, takes an optional sign and the
/// leading run of digits, ignores whatever follows. `None` when there are no digits.
/// Out of range values saturate, so they still parse but can never equal a stored score.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let value = rest[..digits].bytes().fold(0i64, |acc, b| {
        let d = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        }
    });

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbResult;
    use crate::db::error::DbError;
    use crate::db::repo::{MemIqSessionRepository, MemUserRepository};
    use crate::services::moderation::WordlistModerator;
    use deadpool_postgres::PoolError;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts store calls so tests can assert that validation never reached them.
    #[derive(Default)]
    struct CountingSessions {
        inner: MemIqSessionRepository,
        lookups: AtomicUsize,
        fail_delete: bool,
    }

    #[async_trait::async_trait]
    impl IqSessionRepo for CountingSessions {
        async fn get_session_score(&self, session_id: &str) -> DbResult<Option<i32>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_session_score(session_id).await
        }

        async fn delete_session(&self, session_id: &str) -> DbResult<()> {
            if self.fail_delete {
                return Err(DbError::Pool(PoolError::Closed));
            }
            self.inner.delete_session(session_id).await
        }
    }

    /// User store that is down, or that always loses the insert race.
    struct BrokenUsers {
        lose_race: bool,
    }

    #[async_trait::async_trait]
    impl UserRepo for BrokenUsers {
        async fn get_by_username(&self, _username: &str) -> DbResult<Option<User>> {
            if self.lose_race {
                return Ok(None);
            }
            Err(DbError::Pool(PoolError::Closed))
        }

        async fn insert_user(&self, _user: NewUser) -> DbResult<User> {
            Err(DbError::UniqueViolation)
        }
    }

    struct Fixture {
        users: Arc<MemUserRepository>,
        sessions: Arc<CountingSessions>,
        service: SignupService,
    }

    fn fixture_with(sessions: CountingSessions) -> Fixture {
        let users = Arc::new(MemUserRepository::new());
        let sessions = Arc::new(sessions);
        sessions.inner.record_score("sess-123", 130);

        let service = SignupService::new(
            users.clone(),
            sessions.clone(),
            Arc::new(WordlistModerator::default()),
            PasswordHasher::new().unwrap(),
            "iq.example.org",
        );

        Fixture {
            users,
            sessions,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CountingSessions::default())
    }

    fn valid_form() -> SignupForm {
        SignupForm {
            username: Some("validuser".into()),
            password: Some("longenough1".into()),
            confirm_password: Some("longenough1".into()),
            session_id: Some("sess-123".into()),
            iq_score: Some("130".into()),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip: "203.0.113.7".into(),
            user_agent: "test-agent".into(),
        }
    }

    async fn rejected(f: &Fixture, form: SignupForm) -> SignupError {
        f.service.signup(&form, client()).await.unwrap_err()
    }

    #[tokio::test]
    async fn valid_signup_stores_server_score_and_consumes_session() {
        let f = fixture();
        let user = f.service.signup(&valid_form(), client()).await.unwrap();

        assert_eq!(user.username, "validuser");
        assert_eq!(user.iq, 130);
        assert_eq!(user.domain, "iq.example.org");
        assert_eq!(user.ip, "203.0.113.7");
        assert_eq!(user.user_agent, "test-agent");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_ne!(user.password_hash, "longenough1");

        let stored = f.users.get_by_username("validuser").await.unwrap().unwrap();
        assert_eq!(stored.iq, 130);
        assert!(!f.sessions.inner.contains("sess-123"));
    }

    #[tokio::test]
    async fn reusing_a_consumed_session_fails() {
        let f = fixture();
        f.service.signup(&valid_form(), client()).await.unwrap();

        let mut form = valid_form();
        form.username = Some("otheruser".into());
        assert!(matches!(rejected(&f, form).await, SignupError::SessionNotFound));
    }

    #[tokio::test]
    async fn username_is_lowercased_before_storing() {
        let f = fixture();
        let mut form = valid_form();
        form.username = Some("ValidUser".into());

        let user = f.service.signup(&form, client()).await.unwrap();
        assert_eq!(user.username, "validuser");
    }

    #[tokio::test]
    async fn missing_fields_in_order() {
        let f = fixture();

        let without = |mutate: &dyn Fn(&mut SignupForm)| {
            let mut form = valid_form();
            mutate(&mut form);
            form
        };

        let cases = [
            (without(&|form| form.username = None), SignupField::Username),
            (without(&|form| form.password = Some(String::new())), SignupField::Password),
            (without(&|form| form.confirm_password = None), SignupField::ConfirmPassword),
            (without(&|form| form.session_id = None), SignupField::SessionId),
            (without(&|form| form.iq_score = Some(String::new())), SignupField::IqScore),
        ];

        for (form, field) in cases {
            match rejected(&f, form).await {
                SignupError::MissingField(got) => assert_eq!(got, field),
                other => panic!("expected missing {field:?}, got {other:?}"),
            }
        }

        assert_eq!(f.sessions.lookups.load(Ordering::SeqCst), 0);
        assert!(f.users.is_empty());
    }

    #[tokio::test]
    async fn username_checks_come_before_password_checks() {
        let f = fixture();

        let form = SignupForm {
            username: Some("no spaces".into()),
            ..Default::default()
        };
        assert!(matches!(rejected(&f, form).await, SignupError::InvalidUsername));

        let form = SignupForm {
            username: Some("sh1tlord".into()),
            ..Default::default()
        };
        assert!(matches!(rejected(&f, form).await, SignupError::ModerationRejected));
    }

    #[tokio::test]
    async fn short_password_is_rejected_even_when_confirmed() {
        let f = fixture();
        let mut form = valid_form();
        form.password = Some("short1".into());
        form.confirm_password = Some("short1".into());

        assert!(matches!(rejected(&f, form).await, SignupError::PasswordTooShort));
    }

    #[tokio::test]
    async fn short_password_wins_over_mismatch() {
        let f = fixture();
        let mut form = valid_form();
        form.password = Some("short".into());

        assert!(matches!(rejected(&f, form).await, SignupError::PasswordTooShort));
    }

    #[tokio::test]
    async fn mismatched_passwords() {
        let f = fixture();
        let mut form = valid_form();
        form.confirm_password = Some("longenough2".into());

        assert!(matches!(rejected(&f, form).await, SignupError::PasswordMismatch));
    }

    #[tokio::test]
    async fn non_numeric_score_never_hits_the_store() {
        let f = fixture();
        let mut form = valid_form();
        form.iq_score = Some("abc".into());

        assert!(matches!(rejected(&f, form).await, SignupError::InvalidIqFormat));
        assert_eq!(f.sessions.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_or_incomplete_session() {
        let f = fixture();
        f.sessions.inner.open_session("sess-open");

        for id in ["sess-missing", "sess-open"] {
            let mut form = valid_form();
            form.session_id = Some(id.into());
            assert!(matches!(rejected(&f, form).await, SignupError::SessionNotFound));
        }
    }

    #[tokio::test]
    async fn score_mismatch_keeps_session_and_inserts_nothing() {
        let f = fixture();
        let mut form = valid_form();
        form.iq_score = Some("131".into());

        assert!(matches!(rejected(&f, form).await, SignupError::IqMismatch));
        assert!(f.sessions.inner.contains("sess-123"));
        assert!(f.users.is_empty());
    }

    #[tokio::test]
    async fn lenient_score_parse_still_matches() {
        let f = fixture();
        let mut form = valid_form();
        form.iq_score = Some(" 130points".into());

        let user = f.service.signup(&form, client()).await.unwrap();
        assert_eq!(user.iq, 130);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let f = fixture();
        f.service.signup(&valid_form(), client()).await.unwrap();
        f.sessions.inner.record_score("sess-456", 130);

        let mut form = valid_form();
        form.session_id = Some("sess-456".into());
        let err = rejected(&f, form).await;

        assert!(matches!(err, SignupError::UsernameTaken));
        assert_eq!(err.status(), 409);
        assert!(f.sessions.inner.contains("sess-456"));
    }

    #[tokio::test]
    async fn lost_insert_race_is_a_conflict() {
        let sessions = Arc::new(MemIqSessionRepository::new());
        sessions.record_score("sess-123", 130);
        let service = SignupService::new(
            Arc::new(BrokenUsers { lose_race: true }),
            sessions,
            Arc::new(WordlistModerator::default()),
            PasswordHasher::new().unwrap(),
            "iq.example.org",
        );

        let err = service.signup(&valid_form(), client()).await.unwrap_err();
        assert!(matches!(err, SignupError::UsernameTaken));
    }

    #[tokio::test]
    async fn store_outage_is_internal() {
        let sessions = Arc::new(MemIqSessionRepository::new());
        sessions.record_score("sess-123", 130);
        let service = SignupService::new(
            Arc::new(BrokenUsers { lose_race: false }),
            sessions,
            Arc::new(WordlistModerator::default()),
            PasswordHasher::new().unwrap(),
            "iq.example.org",
        );

        let err = service.signup(&valid_form(), client()).await.unwrap_err();
        assert!(matches!(err, SignupError::Internal(_)));
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn failed_session_delete_still_succeeds() {
        let f = fixture_with(CountingSessions {
            fail_delete: true,
            ..Default::default()
        });

        let user = f.service.signup(&valid_form(), client()).await.unwrap();
        assert_eq!(user.iq, 130);
        assert!(f.sessions.inner.contains("sess-123"));
    }

    #[test]
    fn leading_int_parse() {
        assert_eq!(parse_leading_int("130"), Some(130));
        assert_eq!(parse_leading_int("  42"), Some(42));
        assert_eq!(parse_leading_int("130abc"), Some(130));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("1e3"), Some(1));
        assert_eq!(parse_leading_int("12.9"), Some(12));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("- 5"), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999999"), Some(i64::MIN));
    }

    #[tokio::test]
    async fn out_of_range_iq_score_is_a_mismatch() {
        let f = fixture();
        let mut form = valid_form();
        form.iq_score = Some("99999999999999999999999".into());

        assert!(matches!(rejected(&f, form).await, SignupError::IqMismatch));
        assert!(f.users.is_empty());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn signup_span_names_user_and_session_but_not_password() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let f = fixture();
        f.service.signup(&valid_form(), client()).await.unwrap();

        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let span = out
            .split("signup{")
            .nth(1)
            .and_then(|rest| rest.split("}:").next())
            .unwrap_or_else(|| panic!("no signup span in: {out}"));
        assert!(span.contains("username") && span.contains("validuser"), "{span}");
        assert!(span.contains("session_id") && span.contains("sess-123"), "{span}");
        assert!(!out.contains("longenough1"), "{out}");
    }
}
