//! 用户处理器

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};

use super::{
    model::{User, UserFields, UserPatch},
    service::UserService,
};
use crate::core::{
    error::ApiError,
    response::{ApiResponse, ListResponse, MessageResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
}

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<User>>, ApiError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(ListResponse::success(users)))
}

pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let Path(id) = path?;
    let user = state.user_service.get_user(&id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserFields>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let Json(fields) = payload?;
    let user = state.user_service.create_user(fields).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    // 先校验 ID，非法 ID 的请求体不影响结果
    let Path(id) = path?;
    let id = super::service::validate_user_id(&id)?.to_hex();
    let Json(patch) = payload?;
    let user = state.user_service.update_user(&id, patch).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    state.user_service.delete_user(&id).await?;
    Ok(Json(MessageResponse::success("User deleted")))
}
