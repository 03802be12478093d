//! 核心中间件模块

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::{any::Any, time::Instant};
use tracing::{error, info};

use crate::{
    core::error::{ApiError, FailureReport, SERVER_ERROR},
    infrastructure::config::Environment,
};

/// 请求日志中间件
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;

    info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        user_agent = user_agent.as_deref().unwrap_or("-"),
        "request handled"
    );

    response
}

/// 错误归一化的最后一站：非生产环境下记录错误的诊断信息。
/// 响应本身已经由 `ApiError` 生成，这里不会改写，也不会失败。
pub async fn normalize_errors(
    State(environment): State<Environment>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    if environment.logs_diagnostics() {
        if let Some(report) = response.extensions().get::<FailureReport>() {
            error!(
                status = report.status.as_u16(),
                message = %report.message,
                detail = %report.detail,
                "request failed"
            );
        }
    }

    response
}

/// `CatchPanicLayer` 的回调，panic 也走统一的错误响应
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let mut response = ApiError::unclassified(SERVER_ERROR).into_response();
    if let Some(report) = response.extensions_mut().get_mut::<FailureReport>() {
        report.detail = format!("handler panicked: {detail}").into();
    }
    response
}

/// 未匹配的路由和方法
pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Route not found" })),
    )
        .into_response()
}
