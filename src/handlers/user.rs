use bcrypt::{hash, verify};
use crate::extract::JsonBody;
use crate::dtos::non_empty;
use crate::dtos::user::{
    AuthStatusResponse, LoginRequest, LoginResponse, RegisterUserRequest, SessionUser, UserResponse,
};
use crate::dtos::MessageResponse;
use crate::auth::jwt::{sign_token, verify_token};
use crate::auth::session::{clear_session_cookie, session_cookie, token_from_headers};
use crate::error::{is_unique_violation, AppError};
use crate::models::markup_preset::DEFAULT_PRESETS;
use crate::models::user::User;
use axum::{extract::State, http::{header, HeaderMap, StatusCode}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::middleware::auth::AuthContext;
use axum::extract::Extension;
use tracing::{info, instrument, warn};

fn credentials(username: Option<String>, password: Option<String>) -> Result<(String, String), AppError> {
    match (non_empty(username), password.filter(|p| !p.is_empty())) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(AppError::validation("Username and password required")),
    }
}

#[instrument(skip_all)]
pub async fn register_user(
    State(AppState { db_pool, config }): State<AppState>,
    JsonBody(payload): JsonBody<RegisterUserRequest>
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let (username, password) = credentials(payload.username, payload.password)?;
    if password.chars().count() < 6 {
        return Err(AppError::validation("Password must be at least 6 characters"));
    }

    let password_hash = hash(&password, config.bcrypt_cost)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    let mut tx = db_pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password_hash)
         VALUES ($1, $2)
         RETURNING id, username, password_hash, created_at"
    )
    .bind(&username)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            return AppError::conflict("Username already exists");
        }
        AppError::db(e)
    })?;

    // New accounts start with the standard preset ladder
    for (name, markup, is_default) in DEFAULT_PRESETS {
        sqlx::query(
            "INSERT INTO markup_presets (user_id, preset_name, markup_percentage, is_default)
             VALUES ($1, $2, $3, $4)"
        )
        .bind(user.id)
        .bind(name)
        .bind(markup)
        .bind(is_default)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[instrument(skip_all)]
pub async fn login_user(
    State(AppState { db_pool, config }): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>
) -> Result<impl IntoResponse, AppError> {
    let (username, password) = credentials(payload.username, payload.password)?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1"
    )
    .bind(&username)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    let ok = verify(&password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        warn!(%username, "Login failed");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = sign_token(user.id, &user.username, &config.session_secret, config.session_ttl_hours)?;
    let cookie = session_cookie(&token, &config);
    info!(user_id = user.id, "Login successful");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: SessionUser { id: user.id, username: user.username },
            access_token: token,
            token_type: "Bearer",
            expires_in_seconds: config.session_ttl_seconds(),
        }),
    ))
}

pub async fn logout_user(State(AppState { config, .. }): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(&config))],
        Json(MessageResponse::ok("Logout successful")),
    )
}

// Never fails: an absent or stale session just reports unauthenticated.
pub async fn auth_status(
    State(AppState { config, .. }): State<AppState>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let claims = token_from_headers(&headers)
        .and_then(|token| verify_token(&token, &config.session_secret).ok());

    Json(match claims {
        Some(c) => AuthStatusResponse {
            authenticated: true,
            user_id: Some(c.sub),
            username: Some(c.username),
        },
        None => AuthStatusResponse {
            authenticated: false,
            user_id: None,
            username: None,
        },
    })
}

// Authenticated endpoint: returns the user profile from DB using the id in AuthContext
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE id = $1"
    )
    .bind(auth.user_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(user)))
}
