//! # user-api
//!
//! 基于 Axum 的用户资源 REST API：
//! - `app`：用户模型、服务与处理器
//! - `core`：标识符校验、统一错误响应、响应结构与中间件
//! - `infrastructure`：配置、日志、数据访问层（内存 / PostgreSQL）

pub mod app;
pub mod core;
pub mod infrastructure;

use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    app::users::{self, handler::AppState, service::UserService},
    core::middleware::{handle_panic, normalize_errors, request_logging_middleware, route_not_found},
    infrastructure::{config::Environment, store::UserStore},
};

/// 组装完整的路由。存储句柄由调用方创建并传入，便于测试时替换。
pub fn build_router(store: Arc<dyn UserStore>, environment: Environment) -> Router {
    let state = AppState {
        user_service: UserService::new(store),
    };

    Router::new()
        .nest("/api/users", users::routes())
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(middleware::from_fn_with_state(environment, normalize_errors))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}
