//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use rain_advisory_core::UserId;

use crate::supabase::AuthSession;

/// Refresh this long before the provider's stated expiry.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Defines a bearer credential newtype whose `Debug` output is redacted.
macro_rules! redacted_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw token.
            #[must_use]
            pub const fn new(raw: String) -> Self {
                Self(raw)
            }

            /// The raw token, for building request headers.
            #[must_use]
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

redacted_token!(
    /// Short-lived bearer token issued by the session provider.
    AccessToken
);

redacted_token!(
    /// Long-lived token used to obtain a new [`AccessToken`].
    RefreshToken
);

/// Session-stored user identity.
///
/// Holds what the application needs to act on the user's behalf: the
/// identity shown in the UI and the provider tokens used for row-level
/// security on every data read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Provider-issued user ID.
    pub id: UserId,
    /// Email address the user signed in with.
    pub email: String,
    /// Bearer token for data reads.
    pub access_token: AccessToken,
    /// Token for obtaining a new access token.
    pub refresh_token: RefreshToken,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    /// Build the session identity from a provider session.
    ///
    /// `fallback_email` is used when the provider omits the email (e.g. a
    /// refresh response for an account created by phone).
    #[must_use]
    pub fn from_auth_session(
        session: AuthSession,
        fallback_email: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = session
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(|| {
                // An unrepresentable lifetime expires now, which forces a refresh
                Duration::try_seconds(session.expires_in)
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
                    .unwrap_or(now)
            });

        Self {
            id: session.user.id,
            email: session
                .user
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| fallback_email.to_string()),
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at,
        }
    }

    /// Whether the access token should be refreshed before use.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= self.expires_at
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::supabase::AuthUser;

    fn auth_session(expires_at: Option<i64>, email: Option<&str>) -> AuthSession {
        AuthSession {
            access_token: AccessToken::new("access-abc".to_string()),
            refresh_token: RefreshToken::new("refresh-def".to_string()),
            expires_in: 3600,
            expires_at,
            user: AuthUser {
                id: "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11".parse().unwrap(),
                email: email.map(String::from),
            },
        }
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret-jwt".to_string());
        let debug = format!("{token:?}");
        assert_eq!(debug, "AccessToken([REDACTED])");
        assert!(!debug.contains("super-secret-jwt"));
    }

    #[test]
    fn test_current_user_debug_hides_tokens() {
        let now = Utc::now();
        let user = CurrentUser::from_auth_session(auth_session(None, Some("a@b.co")), "", now);
        let debug = format!("{user:?}");
        assert!(!debug.contains("access-abc"));
        assert!(!debug.contains("refresh-def"));
    }

    #[test]
    fn test_expiry_prefers_absolute_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let user = CurrentUser::from_auth_session(
            auth_session(Some(1_700_000_500), Some("farmer@example.com")),
            "typed@example.com",
            now,
        );
        assert_eq!(user.expires_at.timestamp(), 1_700_000_500);
        assert_eq!(user.email, "farmer@example.com");
    }

    #[test]
    fn test_expiry_falls_back_to_lifetime() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let user =
            CurrentUser::from_auth_session(auth_session(None, None), "typed@example.com", now);
        assert_eq!(user.expires_at.timestamp(), 1_700_003_600);
        assert_eq!(user.email, "typed@example.com");
    }

    #[test]
    fn test_unrepresentable_lifetime_expires_immediately() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        for expires_in in [i64::MAX, i64::MAX / 1000] {
            let mut session = auth_session(None, None);
            session.expires_in = expires_in;
            let user = CurrentUser::from_auth_session(session, "", now);
            assert_eq!(user.expires_at, now);
            assert!(user.needs_refresh(now));
        }
    }

    #[test]
    fn test_needs_refresh_within_skew() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let user = CurrentUser::from_auth_session(auth_session(Some(1_700_000_030), None), "", now);
        assert!(user.needs_refresh(now));

        let fresh =
            CurrentUser::from_auth_session(auth_session(Some(1_700_003_600), None), "", now);
        assert!(!fresh.needs_refresh(now));
    }

    #[test]
    fn test_session_round_trips_tokens_through_serde() {
        let now = Utc::now();
        let user = CurrentUser::from_auth_session(auth_session(None, Some("a@b.co")), "", now);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["access_token"], "access-abc");
        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back.refresh_token.expose(), "refresh-def");
    }
}
