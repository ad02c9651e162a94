//! Reading and writing the encrypted auth cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    auth::{Token, UserID},
};

/// The name of the cookie holding the serialized [Token].
pub const COOKIE_TOKEN: &str = "token";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

fn build_token_cookie(token: &Token) -> Result<Cookie<'static>, Error> {
    let value = serde_json::to_string(token).map_err(|error| {
        Error::InvalidDateFormat(error.to_string(), token.expires_at.to_string())
    })?;

    Ok(Cookie::build((COOKIE_TOKEN, value))
        .expires(token.expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build())
}

/// Add an auth cookie for `user_id` to the cookie jar that expires after `duration`.
///
/// The expiry is recorded in `local_offset` so that it reads naturally in the logs.
///
/// # Errors
///
/// Returns [Error::InvalidDateFormat] if the expiry could not be computed or serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let now = OffsetDateTime::now_utc().to_offset(local_offset);
    let expires_at = now.checked_add(duration).ok_or_else(|| {
        Error::InvalidDateFormat(
            format!("adding {duration} overflows the date time"),
            now.to_string(),
        )
    })?;

    let cookie = build_token_cookie(&Token {
        user_id,
        expires_at,
    })?;

    Ok(jar.add(cookie))
}

/// Replace the auth cookie with an expired one, which deletes the cookie on the client.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session token from `jar`.
///
/// # Errors
///
/// Returns [Error::CookieMissing] if there is no auth cookie and
/// [Error::InvalidCredentials] if the cookie cannot be read or has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    Ok(token)
}

/// Push the expiry of the auth cookie in `jar` out to `duration` from now,
/// unless it already expires later than that.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let now = OffsetDateTime::now_utc().to_offset(local_offset);
    let new_expiry = now.checked_add(duration).ok_or_else(|| {
        Error::InvalidDateFormat(
            format!("adding {duration} overflows the date time"),
            now.to_string(),
        )
    })?;

    let cookie = build_token_cookie(&Token {
        user_id: token.user_id,
        expires_at: max(token.expires_at, new_expiry),
    })?;

    Ok(jar.add(cookie))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{Error, auth::UserID};

    use super::{
        COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, extend_auth_cookie_duration_if_needed,
        get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        PrivateCookieJar::new(Key::from(&hash))
    }

    fn jakarta() -> UtcOffset {
        UtcOffset::from_hms(7, 0, 0).unwrap()
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[test]
    fn set_then_get_token() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION, jakarta())
            .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, UserID::new(1));
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
        assert_eq!(token.expires_at.offset(), jakarta());
    }

    #[test]
    fn cookie_is_locked_down() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION, jakarta())
            .unwrap();

        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn get_token_from_empty_jar_fails() {
        assert_eq!(get_token_from_cookies(&get_jar()), Err(Error::CookieMissing));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::seconds(-1), jakarta())
            .unwrap();

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn invalidated_cookie_is_rejected() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION, jakarta())
            .unwrap();

        let jar = invalidate_auth_cookie(jar);

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn extend_pushes_expiry_forward() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::seconds(5), jakarta())
            .unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5), jakarta())
            .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
    }

    #[test]
    fn extend_keeps_later_expiry() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::days(7), jakarta())
            .unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5), jakarta())
            .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_date_time_close(token.expires_at, OffsetDateTime::now_utc() + Duration::days(7));
    }
}
