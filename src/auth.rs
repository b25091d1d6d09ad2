//! ==============================================================================
//! auth.rs - dashboard auth gate
//! ==============================================================================
//!
//! purpose:
//!     checks the dashboard login against the configured username/password
//!     and issues a session cookie that later requests carry back.
//!
//! session model:
//!     there is no server-side session table. the cookie value is
//!     "<issued_at>.<hmac>" where hmac = HMAC-SHA256(SECRET_KEY,
//!     "<username>|<issued_at>"). every dashboard request re-validates it,
//!     so state lives only in the request.
//!
//! the cookie has no Max-Age: it dies with the browser session. an
//! optional ttl rejects tokens older than `session_ttl`; tokens issued
//! after "now" are always rejected.
//! there is no logout.
//!
//! relationships:
//!     - used by: server.rs (login and dashboard handlers)
//!     - configured by: config.rs (AuthConfig + required env secrets)
//!
//! ==============================================================================

use std::time::Duration;

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// name of the session cookie
pub const SESSION_COOKIE: &str = "smartbin_session";

#[derive(Clone)]
pub struct AuthGate {
    username: String,
    password: String,
    secret: Vec<u8>,
    session_ttl: Option<Duration>,
}

impl AuthGate {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        secret: impl AsRef<[u8]>,
        session_ttl: Option<Duration>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            secret: secret.as_ref().to_vec(),
            session_ttl,
        }
    }

    /// exact, case-sensitive match against both configured secrets
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        (user_ok & pass_ok).into()
    }

    /// mint a session token for the configured user
    pub fn issue_token(&self) -> String {
        self.issue_token_at(chrono::Utc::now().timestamp())
    }

    fn issue_token_at(&self, issued_at: i64) -> String {
        let mac = self.mac_for(issued_at).finalize().into_bytes();
        format!("{}.{}", issued_at, hex::encode(mac))
    }

    pub fn validate_token(&self, token: &str) -> bool {
        self.validate_token_at(token, chrono::Utc::now().timestamp())
    }

    fn validate_token_at(&self, token: &str, now: i64) -> bool {
        let Some((issued, sig)) = token.split_once('.') else {
            return false;
        };
        let Ok(issued_at) = issued.parse::<i64>() else {
            return false;
        };
        let Ok(sig) = hex::decode(sig) else {
            return false;
        };

        if self.mac_for(issued_at).verify_slice(&sig).is_err() {
            return false;
        }

        // minted in the future: clock moved back or the token is not ours
        if issued_at > now {
            return false;
        }

        match self.session_ttl {
            Some(ttl) => {
                let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                now.saturating_sub(issued_at) <= ttl
            }
            None => true,
        }
    }

    /// true if the request carries a valid session cookie
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        session_token(headers).is_some_and(|token| self.validate_token(token))
    }

    /// Set-Cookie value for a fresh session
    pub fn session_cookie(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.issue_token()
        )
    }

    fn mac_for(&self, issued_at: i64) -> HmacSha256 {
        // hmac accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac key of any size");
        mac.update(self.username.as_bytes());
        mac.update(b"|");
        mac.update(issued_at.to_string().as_bytes());
        mac
    }
}

/// pull the session token out of the Cookie header(s)
fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
}
