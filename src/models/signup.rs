/// Raw signup form as posted by the browser. Every field is optional so that a
/// missing field ends up as a validation message instead of an extractor rejection.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub session_id: Option<String>,
    pub iq_score: Option<String>,
}

impl SignupForm {
    /// Decodes an `application/x-www-form-urlencoded` body. When a field is repeated
    /// the first value wins; unknown fields are ignored.
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "username" => &mut form.username,
                "password" => &mut form.password,
                "confirmPassword" => &mut form.confirm_password,
                "sessionId" => &mut form.session_id,
                "iqScore" => &mut form.iq_score,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        Ok(form)
    }

    /// Lowercased username, or `None` when absent or empty.
    pub fn username(&self) -> Option<String> {
        non_empty(&self.username).map(str::to_lowercase)
    }
}

/// Where the request came from. Stored on the user row as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

/// Empty form values count as absent.
pub(crate) fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}
