//! 核心层：标识符、错误归一化、响应结构与中间件

pub mod error;
pub mod middleware;
pub mod object_id;
pub mod response;
