use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRef, State},
    http::{HeaderMap, StatusCode},
    response::AppendHeaders,
    routing::{get, patch, post},
    Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthPayload, ChangePasswordRequest, LoginRequest, RefreshRequest, UpdateAccountRequest},
    forms::FormData,
    model::{
        is_valid_email, normalize_email, normalize_username, DuplicateIdentity, NewUser,
        PublicUser,
    },
    repo::UserStore,
    uploads::{upload_image, AVATAR_FOLDER, COVER_FOLDER},
};
use crate::{
    auth::{
        cookies::{clear_token_cookies, get_cookie, SetCookies, REFRESH_COOKIE_NAME},
        password::{hash_password, verify_password},
        tokens::{issue_tokens, revoke_session, rotate_refresh_token},
        CurrentUser, JwtKeys,
    },
    error::{ApiError, AppResult},
    extract::ApiJson,
    response::{ApiResponse, Empty},
    state::AppState,
};

const ALREADY_EXISTS: &str = "User with email or username already exists";
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

type WithCookies<T> = (AppendHeaders<SetCookies>, ApiResponse<T>);

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
}

pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

fn conflict_or_internal(e: anyhow::Error) -> ApiError {
    if e.is::<DuplicateIdentity>() {
        ApiError::Conflict(ALREADY_EXISTS.into())
    } else {
        ApiError::Internal(e)
    }
}

/// POST /register (multipart: username, email, password, fullName, avatar, coverImage?)
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    mut form: FormData,
) -> AppResult<ApiResponse<PublicUser>> {
    let fields = (
        form.text("username").map(normalize_username),
        form.text("email").map(normalize_email),
        form.text("password").map(str::to_owned),
        form.text("fullName").map(str::to_owned),
    );
    let (Some(username), Some(email), Some(password), Some(full_name)) = fields else {
        warn!("register with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if state
        .users
        .find_by_username_or_email(Some(username.as_str()), Some(email.as_str()))
        .await?
        .is_some()
    {
        warn!(username = %username, email = %email, "identity already registered");
        return Err(ApiError::Conflict(ALREADY_EXISTS.into()));
    }

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::Validation("Avatar file is required".into()))?;
    let avatar = upload_image(state.media.as_ref(), AVATAR_FOLDER, avatar_file)
        .await
        .map_err(|e| {
            error!(error = ?e, "avatar upload failed");
            ApiError::Upload("Failed to upload avatar".into())
        })?;

    // Only the avatar is mandatory; a failed cover upload leaves the field empty.
    let cover_image = match form.take_file("coverImage") {
        Some(file) => match upload_image(state.media.as_ref(), COVER_FOLDER, file).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = ?e, "cover image upload failed; continuing without it");
                None
            }
        },
        None => None,
    };

    let password_hash = hash_password(&password)?;
    let new = NewUser::new(
        &username,
        &email,
        &full_name,
        avatar,
        cover_image,
        password_hash,
    );
    let user = state
        .users
        .create(&new)
        .await
        .map_err(conflict_or_internal)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::new(
        StatusCode::CREATED,
        "User registered successfully",
        user.into(),
    ))
}

/// POST /login { username? | email?, password }
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<WithCookies<AuthPayload>> {
    let username = payload
        .username
        .as_deref()
        .map(normalize_username)
        .filter(|s| !s.is_empty());
    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|s| !s.is_empty());

    if username.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "Username or email is required".into(),
        ));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    let user = state
        .users
        .find_by_username_or_email(username.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| {
            warn!(?username, ?email, "login for unknown user");
            ApiError::NotFound("User does not exist".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid user credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let tokens = issue_tokens(&keys, state.users.as_ref(), user.id).await?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        AppendHeaders(tokens.cookies(&keys)),
        ApiResponse::ok(
            "User logged in successfully",
            AuthPayload {
                user: user.into(),
                tokens,
            },
        ),
    ))
}

/// POST /logout
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<WithCookies<Empty>> {
    revoke_session(state.users.as_ref(), user.id).await?;
    Ok((
        AppendHeaders(clear_token_cookies()),
        ApiResponse::ok("User logged out", Empty::default()),
    ))
}

/// POST /refresh-token; token from the `refreshToken` cookie or `{ refreshToken }`.
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<WithCookies<AuthPayload>> {
    let from_body = serde_json::from_slice::<RefreshRequest>(&body)
        .unwrap_or_default()
        .refresh_token;
    let incoming = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .map(str::to_owned)
        .or(from_body);

    let keys = JwtKeys::from_ref(&state);
    let (user, tokens) =
        rotate_refresh_token(&keys, state.users.as_ref(), incoming.as_deref()).await?;

    Ok((
        AppendHeaders(tokens.cookies(&keys)),
        ApiResponse::ok("Access token refreshed", AuthPayload { user, tokens }),
    ))
}

/// POST /change-password { oldPassword, newPassword }
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<Empty>> {
    if payload.old_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let stored = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !verify_password(&payload.old_password, &stored.password_hash)? {
        warn!(user_id = %user.id, "change password with wrong old password");
        return Err(ApiError::Validation("Invalid old password".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    state.users.update_password(user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(ApiResponse::ok(
        "Password changed successfully",
        Empty::default(),
    ))
}

/// GET /current-user
pub async fn current_user(CurrentUser(user): CurrentUser) -> ApiResponse<PublicUser> {
    ApiResponse::ok("Current user fetched successfully", user)
}

/// PATCH /update-account { fullName, email }
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let full_name = payload.full_name.trim();
    let email = normalize_email(&payload.email);
    if full_name.is_empty() || email.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let updated = state
        .users
        .update_details(user.id, full_name, &email)
        .await
        .map_err(conflict_or_internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "account details updated");
    Ok(ApiResponse::ok(
        "Account details updated successfully",
        updated.into(),
    ))
}

/// PATCH /avatar (multipart: avatar)
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: FormData,
) -> AppResult<ApiResponse<PublicUser>> {
    let file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::Validation("Avatar file is missing".into()))?;
    let url = upload_image(state.media.as_ref(), AVATAR_FOLDER, file)
        .await
        .map_err(|e| {
            error!(error = ?e, "avatar upload failed");
            ApiError::Upload("Error while uploading avatar".into())
        })?;

    let updated = state
        .users
        .update_avatar(user.id, &url)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok(
        "Avatar image updated successfully",
        updated.into(),
    ))
}

/// PATCH /cover-image (multipart: coverImage)
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: FormData,
) -> AppResult<ApiResponse<PublicUser>> {
    let file = form
        .take_file("coverImage")
        .ok_or_else(|| ApiError::Validation("Cover image file is missing".into()))?;
    let url = upload_image(state.media.as_ref(), COVER_FOLDER, file)
        .await
        .map_err(|e| {
            error!(error = ?e, "cover image upload failed");
            ApiError::Upload("Error while uploading cover image".into())
        })?;

    let updated = state
        .users
        .update_cover_image(user.id, &url)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok(
        "Cover image updated successfully",
        updated.into(),
    ))
}
