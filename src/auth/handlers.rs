use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, OAuthLoginRequest, ProfileResponse, PublicUser,
            RefreshRequest, RegisterRequest, UpdateProfileRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, is_valid_email, verify_password},
        repo::default_role_id,
        repo_types::User,
    },
    error::AppError,
    sheets,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/oauth", post(oauth_login))
        .route("/users/refresh", post(refresh))
        .route("/users/me", get(get_me).put(update_me))
}

fn token_pair(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let role_id = default_role_id(&state.db).await?;
    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash, role_id).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            AppError::Unauthorized("Invalid credentials".into())
        })?;

    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login attempt against oauth-only account");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    User::touch_last_login(&state.db, user.id).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");

    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, user)?))
}

/// The provider pair arrives from an upstream identity provider that has
/// already verified the credential; no re-verification happens here.
#[instrument(skip(state, payload))]
async fn oauth_login(
    State(state): State<AppState>,
    Json(payload): Json<OAuthLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = User::find_by_oauth(&state.db, &payload.provider, &payload.provider_id)
        .await?
        .ok_or_else(|| {
            warn!(provider = %payload.provider, "oauth login for unknown account");
            AppError::Unauthorized("Invalid credentials".into())
        })?;

    User::touch_last_login(&state.db, user.id).await?;
    info!(user_id = %user.id, provider = %payload.provider, "oauth login");

    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(token_pair(&keys, user)?))
}

#[instrument(skip(state))]
async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let sheets = sheets::repo::list_summaries(&state.db, user_id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        plan_tier: user.plan_tier,
        status: user.status,
        created_at: user.created_at,
        last_login: user.last_login,
        sheets,
    }))
}

#[instrument(skip(state, payload))]
async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if User::email_taken(&state.db, &email, Some(user_id)).await? {
                return Err(AppError::Conflict("Email already in use".into()));
            }
            Some(email)
        }
        None => None,
    };

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(AppError::Validation("Password too short".into()));
            }
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        email.as_deref(),
        password_hash.as_deref(),
    )
    .await?
    .ok_or(AppError::UserNotFound)?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}
