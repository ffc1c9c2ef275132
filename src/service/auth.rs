use crate::{
    config::Config,
    db::{NewUser, UserExt},
    dtos::{GoogleCallbackQueryDto, LoginResponseDto, LoginUserDto, RegisterUserDto},
    error::{ErrorMessage, ServiceError},
    http::IdentityProvider,
    models::{Role, User},
    redisdb::{LOGIN_MAX_ATTEMPTS, LoginAttemptsExt, OAuthStateExt},
    utils::{nonce, password, token},
};

use std::net::IpAddr;

use super::{is_unique_violation, store_error, validate_input};

fn issue_token(user: &User, config: &Config) -> Result<LoginResponseDto, ServiceError> {
    let (access_token, expires_at) = token::create_token(
        &user.identity(),
        config.jwt_secret.as_bytes(),
        config.jwt_expires_in_seconds(),
    )?;

    Ok(LoginResponseDto {
        access_token,
        expires_at,
        role: user.role,
    })
}

/// Create a local account. Self-registered accounts are always Authors.
pub async fn register<S: UserExt>(store: &S, body: &RegisterUserDto) -> Result<User, ServiceError> {
    validate_input(body, "register")?;

    let existing = store
        .get_user_by_email(&body.email)
        .await
        .map_err(|e| store_error("checking email", e))?;
    if existing.is_some() {
        return Err(ErrorMessage::EmailExisted.into());
    }

    let hashed_password = password::hash(&body.password)?;

    let new_user = NewUser {
        full_name: &body.full_name,
        email: &body.email,
        password: &hashed_password,
        role: Role::Author,
    };

    match store.save_user(new_user, &body.full_name).await {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => Err(ErrorMessage::EmailExisted.into()),
        Err(e) => Err(store_error("saving user", e)),
    }
}

/// Count a login request from `ip`; past the limit of the window the
/// request is refused with `TooManyRequests`.
pub async fn check_login_rate<L: LoginAttemptsExt>(
    limiter: &L,
    ip: IpAddr,
) -> Result<(), ServiceError> {
    let attempts = limiter.hit_login_attempts(ip).await.map_err(|e| {
        tracing::error!("RedisDB error, counting login attempts: {}", e);
        ServiceError::Cache(e)
    })?;

    if attempts > LOGIN_MAX_ATTEMPTS {
        tracing::warn!(%ip, attempts, "Login attempt exceeded the limit");
        return Err(ErrorMessage::TooManyRequests.into());
    }

    Ok(())
}

pub async fn login<S: UserExt>(
    store: &S,
    config: &Config,
    body: &LoginUserDto,
) -> Result<LoginResponseDto, ServiceError> {
    validate_input(body, "login")?;

    let user = store
        .get_user_by_email(&body.email)
        .await
        .map_err(|e| store_error("getting user", e))?
        .ok_or(ErrorMessage::UserNotFound)?;

    if user.is_oauth_only() {
        tracing::warn!(email = %user.email, "Password login on a Google-only account");
        return Err(ErrorMessage::MismatchLogin.into());
    }

    if !password::compare(&body.password, &user.password)? {
        return Err(ErrorMessage::InvalidPassword.into());
    }

    issue_token(&user, config)
}

/// First leg of Google sign-in: park a fresh state value and hand back the
/// consent URL that carries it.
pub async fn google_login<C: OAuthStateExt, P: IdentityProvider>(
    cache: &C,
    provider: &P,
    config: &Config,
) -> Result<String, ServiceError> {
    let state = nonce::oauth_state();

    cache
        .save_oauth_state(&state, config.oauth_state_ttl_secs())
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, saving oauth state: {}", e);
            ServiceError::Cache(e)
        })?;

    provider.authorization_url(&state)
}

/// Second leg of Google sign-in.
///
/// The state must have been issued by `google_login` and not used yet; it is
/// consumed before the code is exchanged. Unknown emails become Guest
/// accounts without a local password.
pub async fn google_callback<S: UserExt, C: OAuthStateExt, P: IdentityProvider>(
    store: &S,
    cache: &C,
    provider: &P,
    config: &Config,
    query: &GoogleCallbackQueryDto,
) -> Result<LoginResponseDto, ServiceError> {
    let state = query.state.as_deref().filter(|s| !s.is_empty());
    let code = query.code.as_deref().filter(|c| !c.is_empty());
    let (Some(state), Some(code)) = (state, code) else {
        return Err(ErrorMessage::InvalidExchange.into());
    };

    let stored = cache.take_oauth_state(state).await.map_err(|e| {
        tracing::error!("RedisDB error, taking oauth state: {}", e);
        ServiceError::Cache(e)
    })?;
    if stored.is_none() {
        tracing::warn!("OAuth callback with unknown or used state");
        return Err(ErrorMessage::RedisKeyNotExisted.into());
    }

    let profile = provider.fetch_user_info(code).await?;

    let existing = store
        .get_user_by_email(&profile.email)
        .await
        .map_err(|e| store_error("getting user", e))?;

    let user = match existing {
        Some(user) => user,
        None => {
            let full_name = if profile.name.is_empty() {
                profile.email.as_str()
            } else {
                profile.name.as_str()
            };
            let new_user = NewUser {
                full_name,
                email: &profile.email,
                password: "",
                role: Role::Guest,
            };
            match store.save_user(new_user, full_name).await {
                Ok(user) => {
                    tracing::info!(email = %user.email, "Provisioned guest from Google sign-in");
                    user
                }
                // Lost a race with a concurrent first sign-in for the same email
                Err(e) if is_unique_violation(&e) => store
                    .get_user_by_email(&profile.email)
                    .await
                    .map_err(|e| store_error("getting user", e))?
                    .ok_or(ErrorMessage::UserNotFound)?,
                Err(e) => return Err(store_error("saving user", e)),
            }
        }
    };

    issue_token(&user, config)
}
