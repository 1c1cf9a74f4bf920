use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State, get, post};
use time::Duration as TimeDuration;

use crate::auth::guards::Principal;
use crate::auth::jwt::SignedToken;
use crate::auth::responses::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use crate::auth::{AuthError, AuthState};
use crate::models::ApiResponse;
use crate::users::{NewAccount, UserView};

const REFRESH_COOKIE_PATH: &str = "/auth";

pub fn routes() -> Vec<Route> {
    routes![register, login, refresh, logout, me]
}

#[post("/auth/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    payload: Json<NewAccount>,
) -> Result<status::Custom<Json<ApiResponse<UserView>>>, AuthError> {
    let user = state.users.register(payload.into_inner()).await?;
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::new(
            "User registered successfully",
            UserView::from(user),
        )),
    ))
}

#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    cookies: &CookieJar<'_>,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    set_refresh_cookie(cookies, state, &outcome.tokens.refresh_token);

    Ok(Json(LoginResponse {
        access_token: outcome.tokens.access_token.token,
        refresh_token: outcome.tokens.refresh_token.token,
        access_token_expires_at: outcome.tokens.access_token.expires_at,
        refresh_token_expires_at: outcome.tokens.refresh_token.expires_at,
        user_id: outcome.user_id,
        email: outcome.email,
    }))
}

/// Rotate the session. The token is read from the JSON body when present,
/// otherwise from the refresh cookie.
#[post("/auth/refresh", data = "<payload>")]
pub async fn refresh(
    state: &State<AuthState>,
    cookies: &CookieJar<'_>,
    payload: Option<Json<RefreshRequest>>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let presented = match payload {
        Some(body) => body.into_inner().refresh_token,
        None => cookies
            .get(&state.config.refresh_cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AuthError::InvalidToken)?,
    };

    let tokens = state.sessions.refresh(&presented).await?;
    set_refresh_cookie(cookies, state, &tokens.refresh_token);

    Ok(Json(RefreshResponse {
        access_token: tokens.access_token.token,
        refresh_token: tokens.refresh_token.token,
        access_token_expires_at: tokens.access_token.expires_at,
        refresh_token_expires_at: tokens.refresh_token.expires_at,
    }))
}

#[post("/auth/logout")]
pub async fn logout(
    state: &State<AuthState>,
    cookies: &CookieJar<'_>,
    principal: Principal,
) -> Result<Status, AuthError> {
    state.sessions.logout(&principal).await?;
    clear_refresh_cookie(cookies, state);
    Ok(Status::NoContent)
}

#[get("/auth/me")]
pub async fn me(
    state: &State<AuthState>,
    principal: Principal,
) -> Result<Json<UserView>, AuthError> {
    let user = state.users.me(&principal).await?;
    Ok(Json(UserView::from(user)))
}

fn set_refresh_cookie(cookies: &CookieJar<'_>, state: &State<AuthState>, token: &SignedToken) {
    let cookie = Cookie::build((state.config.refresh_cookie_name.clone(), token.token.clone()))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.cookie_secure)
        .max_age(TimeDuration::seconds(state.config.refresh_token_ttl_secs))
        .build();

    cookies.add(cookie);
}

fn clear_refresh_cookie(cookies: &CookieJar<'_>, state: &State<AuthState>) {
    let cookie = Cookie::build((state.config.refresh_cookie_name.clone(), String::new()))
        .path(REFRESH_COOKIE_PATH)
        .removal()
        .build();
    cookies.add(cookie);
}
