//! Defines functions for handling user authentication with cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::{Token, UserID},
};

/// The name of the cookie holding the serialized [Token].
pub const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

fn build_token_cookie(value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .path("/")
        .expires(expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn add_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let token_string = serde_json::to_string(token).map_err(|error| {
        tracing::error!("could not serialize auth token: {error}");
        Error::DateError
    })?;

    Ok(jar.add(build_token_cookie(token_string, token.expires_at)))
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
/// You can use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// # Errors
///
/// Returns [Error::DateError] if the expiry time overflows or cannot be formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::DateError)?;

    add_token(
        jar,
        &Token {
            user_id,
            expires_at,
        },
    )
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read and check the auth token in `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no auth cookie or it could not be decrypted.
/// - [Error::InvalidToken] if the cookie does not hold a token or the token has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidToken)?;

    if token.is_expired_at(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidToken);
    }

    Ok(token)
}

/// Set the expiry of the auth cookie in `jar` to the latest of UTC now
/// plus `duration` and the token's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] or [Error::InvalidToken] if the jar does not hold a valid token.
/// - [Error::DateError] if extending the cookie by `duration` would overflow the date time.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::DateError)?;

    add_token(
        jar,
        &Token {
            user_id: token.user_id,
            expires_at: max(token.expires_at, new_expiry),
        },
    )
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, auth::UserID};

    use super::{
        COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, extend_auth_cookie_duration_if_needed,
        get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[test]
    fn set_cookie_stores_token() {
        let user_id = UserID::new(1);

        let jar = set_auth_cookie(get_jar(), user_id, DEFAULT_COOKIE_DURATION).unwrap();
        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, user_id);
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn missing_cookie_is_an_error() {
        assert_eq!(
            get_token_from_cookies(&get_jar()),
            Err(Error::CookieMissing)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::seconds(-10)).unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::InvalidToken));
    }

    #[test]
    fn can_extend_cookie_duration() {
        let jar = set_auth_cookie(get_jar(), UserID::new(2), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(10)).unwrap();
        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, UserID::new(2));
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(10),
        );
    }

    #[test]
    fn cookie_duration_is_never_shortened() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::days(7)).unwrap();
        let want = get_token_from_cookies(&jar).unwrap().expires_at;

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::seconds(5)).unwrap();

        assert_eq!(get_token_from_cookies(&jar).unwrap().expires_at, want);
    }

    #[test]
    fn invalidate_auth_cookie_succeeds() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = invalidate_auth_cookie(jar);
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(get_token_from_cookies(&jar), Err(Error::InvalidToken));
    }
}
