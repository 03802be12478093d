//! 进程内用户集合
//!
//! 未配置数据库时使用，也是 HTTP 测试的默认后端。唯一性检查与写入在同一把写锁内完成。

use async_trait::async_trait;
use std::{cmp::Reverse, collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{next_timestamp, Sort, StoreError, UpdateOptions, UserFilter, UserStore};
use crate::{
    app::users::model::{User, UserFields, UserPatch},
    core::object_id::ObjectId,
};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<ObjectId, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(users: &HashMap<ObjectId, User>, email: &str, except: Option<&ObjectId>) -> bool {
    users
        .values()
        .any(|user| Some(&user.id) != except && user.email == email)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_all(&self, sort: Sort) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();

        match sort {
            Sort::CreatedAtAsc => all.sort_by_key(|user| (user.created_at, user.id)),
            Sort::CreatedAtDesc => all.sort_by_key(|user| Reverse((user.created_at, user.id))),
        }

        debug!(count = all.len(), ?sort, "find_all");
        Ok(all)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        let mut matching: Vec<&User> = users.values().filter(|user| filter.matches(user)).collect();
        // 与集合的自然顺序保持一致：最早插入的优先
        matching.sort_by_key(|user| (user.created_at, user.id));

        Ok(matching.first().map(|user| (*user).clone()))
    }

    async fn create(&self, fields: UserFields) -> Result<User, StoreError> {
        let fields = fields.into_valid(true)?;
        let mut users = self.users.write().await;

        if email_taken(&users, &fields.email, None) {
            return Err(StoreError::DuplicateEmail(fields.email));
        }

        let now = next_timestamp(None);
        let user = User {
            id: ObjectId::new(),
            name: fields.name,
            email: fields.email,
            age: fields.age,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        info!(id = %user.id, "user created");
        Ok(user)
    }

    async fn find_by_id_and_update(
        &self,
        id: &ObjectId,
        patch: UserPatch,
        options: UpdateOptions,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        let Some(existing) = users.get(id).cloned() else {
            return Ok(None);
        };

        let fields = patch.apply_to(&existing).into_valid(options.validate)?;
        if email_taken(&users, &fields.email, Some(id)) {
            return Err(StoreError::DuplicateEmail(fields.email));
        }

        let updated = User {
            name: fields.name,
            email: fields.email,
            age: fields.age,
            updated_at: next_timestamp(Some(existing.updated_at)),
            ..existing.clone()
        };
        users.insert(*id, updated.clone());

        info!(%id, "user updated");
        Ok(Some(if options.return_updated { updated } else { existing }))
    }

    async fn find_by_id_and_delete(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        let removed = self.users.write().await.remove(id);
        if removed.is_some() {
            info!(%id, "user deleted");
        }
        Ok(removed)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let removed = users.len() as u64;
        users.clear();
        Ok(removed)
    }
}
