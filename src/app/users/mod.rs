//! 用户资源：模型、服务与处理器

pub mod handler;
pub mod model;
pub mod service;

use axum::{
    routing::{get, MethodRouter},
    Router,
};

use crate::core::middleware::route_not_found;
use handler::AppState;

/// `/api/users` 下的路由，不支持的方法同样返回 "Route not found"
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            with_fallback(get(handler::list_users).post(handler::create_user)),
        )
        .route(
            "/:id",
            with_fallback(
                get(handler::get_user)
                    .put(handler::update_user)
                    .delete(handler::delete_user),
            ),
        )
}

fn with_fallback(router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    router.fallback(route_not_found)
}
