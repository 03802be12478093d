//! 核心错误处理模块
//!
//! 所有错误路径的状态码和消息只在这里决定。处理器返回 [`ApiError`]，
//! 由 `IntoResponse` 统一生成 `{ success: false, message }` 响应。

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::{error::Error as _, sync::Arc};

use crate::{
    core::{object_id::InvalidObjectId, response::ErrorResponse},
    infrastructure::store::StoreError,
};

pub const SERVER_ERROR: &str = "Server Error";

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid user ID")]
    InvalidIdentifier(#[source] InvalidObjectId),

    #[error("User not found")]
    NotFound,

    #[error("User already exists")]
    DuplicateResource,

    #[error("{0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    MalformedBody(String),

    #[error("{message}")]
    Unclassified {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ApiError {
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
            source: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::DuplicateResource
            | ApiError::ConstraintViolation(_)
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unclassified { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 面向客户端的消息，空消息回退为 "Server Error"
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            SERVER_ERROR.to_string()
        } else {
            message
        }
    }

    /// 完整的诊断信息，包含 source 链
    pub fn diagnostic(&self) -> String {
        let mut detail = format!("{self:?}");
        let mut source = self.source();
        while let Some(cause) = source {
            detail.push_str("\ncaused by: ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

/// 附加在错误响应上的诊断报告，由 `normalize_errors` 中间件记录
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub status: StatusCode,
    pub message: String,
    pub detail: Arc<str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        let report = FailureReport {
            status,
            message: message.clone(),
            detail: self.diagnostic().into(),
        };

        let mut response = (status, Json(ErrorResponse::new(message))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<InvalidObjectId> for ApiError {
    fn from(err: InvalidObjectId) -> Self {
        ApiError::InvalidIdentifier(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(violation) => ApiError::ConstraintViolation(violation.to_string()),
            StoreError::DuplicateEmail(_) => {
                ApiError::ConstraintViolation("Email already exists".to_string())
            }
            other => ApiError::Unclassified {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

/// 路径段无法解码（如非 UTF-8）时不可能是合法 ID
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidIdentifier(InvalidObjectId(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}
