//! 用户业务服务
//!
//! 每个操作的顺序固定为：校验标识符 → 访问存储 → 返回结果。
//! 任何失败都原样向上返回，由错误归一化统一处理。

use std::sync::Arc;
use tracing::debug;

use super::model::{User, UserFields, UserPatch};
use crate::{
    core::{error::ApiError, object_id::ObjectId},
    infrastructure::store::{Sort, UpdateOptions, UserFilter, UserStore},
};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

/// 校验路径中的用户 ID
pub fn validate_user_id(raw: &str) -> Result<ObjectId, ApiError> {
    Ok(ObjectId::parse(raw)?)
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.find_all(Sort::CreatedAtDesc).await?)
    }

    pub async fn get_user(&self, raw_id: &str) -> Result<User, ApiError> {
        let id = validate_user_id(raw_id)?;
        self.store.find_by_id(&id).await?.ok_or(ApiError::NotFound)
    }

    pub async fn create_user(&self, fields: UserFields) -> Result<User, ApiError> {
        // 没有 email 时跳过预检查，交给存储的必填校验
        if let Some(email) = fields.email.as_deref().filter(|email| !email.is_empty()) {
            if self.store.find_one(&UserFilter::by_email(email)).await?.is_some() {
                debug!(email, "duplicate email rejected by pre-check");
                return Err(ApiError::DuplicateResource);
            }
        }

        Ok(self.store.create(fields).await?)
    }

    pub async fn update_user(&self, raw_id: &str, patch: UserPatch) -> Result<User, ApiError> {
        let id = validate_user_id(raw_id)?;
        self.ensure_exists(&id).await?;

        self.store
            .find_by_id_and_update(&id, patch, UpdateOptions::default())
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn delete_user(&self, raw_id: &str) -> Result<User, ApiError> {
        let id = validate_user_id(raw_id)?;
        self.ensure_exists(&id).await?;

        self.store
            .find_by_id_and_delete(&id)
            .await?
            .ok_or(ApiError::NotFound)
    }

    async fn ensure_exists(&self, id: &ObjectId) -> Result<User, ApiError> {
        self.store.find_by_id(id).await?.ok_or(ApiError::NotFound)
    }
}
