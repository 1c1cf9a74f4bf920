//! Account CRUD endpoints. Every handler takes the caller's [`Principal`] and
//! hands it to [`crate::users::UserService`], which makes the authorization
//! decision.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State, delete, get, patch, post};

use crate::auth::{AuthError, AuthState, Principal};
use crate::models::ApiResponse;
use crate::users::{NewAccount, UserChanges, UserView};

type UserRouteResult<T> = Result<Json<ApiResponse<T>>, AuthError>;

pub fn routes() -> Vec<Route> {
    routes![list_users, create_user, get_user, update_user, delete_user]
}

#[get("/users")]
pub async fn list_users(
    state: &State<AuthState>,
    principal: Principal,
) -> UserRouteResult<Vec<UserView>> {
    let users = state.users.find_all(&principal).await?;
    let views = users.into_iter().map(UserView::from).collect();
    Ok(Json(ApiResponse::list("Users retrieved successfully", views)))
}

#[post("/users", data = "<payload>")]
pub async fn create_user(
    state: &State<AuthState>,
    principal: Principal,
    payload: Json<NewAccount>,
) -> Result<status::Custom<Json<ApiResponse<UserView>>>, AuthError> {
    let user = state.users.create(&principal, payload.into_inner()).await?;
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::new(
            "User created successfully",
            UserView::from(user),
        )),
    ))
}

#[get("/users/<id>")]
pub async fn get_user(
    state: &State<AuthState>,
    principal: Principal,
    id: i32,
) -> UserRouteResult<UserView> {
    let user = state.users.find_one(&principal, id).await?;
    Ok(Json(ApiResponse::new(
        "User retrieved successfully",
        UserView::from(user),
    )))
}

#[patch("/users/<id>", data = "<payload>")]
pub async fn update_user(
    state: &State<AuthState>,
    principal: Principal,
    id: i32,
    payload: Json<UserChanges>,
) -> UserRouteResult<UserView> {
    let user = state
        .users
        .update(&principal, id, payload.into_inner())
        .await?;
    Ok(Json(ApiResponse::new(
        "User updated successfully",
        UserView::from(user),
    )))
}

#[delete("/users/<id>")]
pub async fn delete_user(
    state: &State<AuthState>,
    principal: Principal,
    id: i32,
) -> UserRouteResult<()> {
    state.users.remove(&principal, id).await?;
    Ok(Json(ApiResponse::new("User removed successfully", ())))
}
