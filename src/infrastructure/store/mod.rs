//! 用户集合的数据访问层
//!
//! 处理器只通过 [`UserStore`] 访问数据。实现方负责在写入时执行字段约束
//! （必填、格式、取值范围、email 唯一性）。

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    app::users::model::{ConstraintError, User, UserFields, UserPatch},
    core::object_id::ObjectId,
};

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::MemoryUserStore;
#[cfg(feature = "database")]
pub use postgres::PgUserStore;

/// 数据访问错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// 唯一索引拒绝了写入（通常是并发插入相同 email）
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// 存储里读到了无法还原的文档
    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[cfg(feature = "database")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// `find_all` 的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
}

/// `find_one` 的过滤条件，所有已设置的字段都必须匹配
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserFilter {
    /// email 与写入时一样做小写规范化
    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(email.to_lowercase()),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.name.as_deref().map_or(true, |name| name == user.name)
            && self
                .email
                .as_deref()
                .map_or(true, |email| email.to_lowercase() == user.email)
    }
}

/// `find_by_id_and_update` 的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// true 返回更新后的文档，false 返回更新前的文档
    pub return_updated: bool,
    /// false 时跳过格式和取值范围校验，必填与唯一性仍然生效
    pub validate: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_updated: true,
            validate: true,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_all(&self, sort: Sort) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError>;

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError>;

    async fn create(&self, fields: UserFields) -> Result<User, StoreError>;

    /// 记录不存在时返回 `Ok(None)`
    async fn find_by_id_and_update(
        &self,
        id: &ObjectId,
        patch: UserPatch,
        options: UpdateOptions,
    ) -> Result<Option<User>, StoreError>;

    /// 返回被删除的文档，不存在时返回 `Ok(None)`
    async fn find_by_id_and_delete(&self, id: &ObjectId) -> Result<Option<User>, StoreError>;

    /// 清空集合，返回删除的数量
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// 关闭底层连接，进程退出前调用
    async fn close(&self) {}
}

/// 毫秒精度的时间戳，且严格晚于 `previous`
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().timestamp_millis();
    let millis = match previous {
        Some(previous) => now.max(previous.timestamp_millis() + 1),
        None => now,
    };

    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}
