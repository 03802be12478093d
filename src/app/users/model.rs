//! 用户数据模型

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::LazyLock;
use validator::{Validate, ValidationErrors};

use crate::core::object_id::ObjectId;

/// `local@domain.tld`，只允许 ASCII 单词字符
pub static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
        .expect("email pattern is a valid regex")
});

/// 已持久化的用户文档
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_age")]
    pub age: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 客户端可写字段，既是创建请求体也是写入存储前的校验单元
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct UserFields {
    #[validate(
        required(message = "Name is required"),
        length(min = 1, message = "Name is required")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        regex(path = *EMAIL_PATTERN, message = "Please enter a valid email")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Age is required"),
        range(min = 1.0, message = "Age must be at least 1")
    )]
    pub age: Option<f64>,
}

/// 字段约束校验失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("User validation failed: {0}")]
pub struct ConstraintError(pub String);

/// 三个必填字段都已通过校验的写入集合
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFields {
    pub name: String,
    pub email: String,
    pub age: f64,
}

impl UserFields {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: impl Into<f64>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            age: Some(age.into()),
        }
    }

    /// 写入前的规范化：name 去除首尾空白，email 转小写，空 email 视为缺失
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self
                .email
                .filter(|email| !email.is_empty())
                .map(|email| email.to_lowercase()),
            age: self.age,
        }
    }

    /// 规范化后校验约束。`run_validators` 为 false 时只检查必填字段。
    pub fn into_valid(self, run_validators: bool) -> Result<ValidFields, ConstraintError> {
        let fields = self.normalized();

        if run_validators {
            fields.validate().map_err(describe_violations)?;
        }

        let mut missing = Vec::new();
        if fields.age.is_none() {
            missing.push("age: Age is required");
        }
        if fields.email.is_none() {
            missing.push("email: Email is required");
        }
        if fields.name.is_none() {
            missing.push("name: Name is required");
        }

        match (fields.name, fields.email, fields.age) {
            (Some(name), Some(email), Some(age)) => Ok(ValidFields { name, email, age }),
            _ => Err(ConstraintError(missing.join(", "))),
        }
    }
}

/// 部分更新。字段缺省表示保持不变，显式 `null` 表示清空（随后会触发必填校验）。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserPatch {
    #[serde(default, deserialize_with = "explicit_null")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub age: Option<Option<f64>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }

    /// 在现有文档上叠加补丁，得到待校验的完整字段集合
    pub fn apply_to(&self, user: &User) -> UserFields {
        UserFields {
            name: self.name.clone().unwrap_or_else(|| Some(user.name.clone())),
            email: self.email.clone().unwrap_or_else(|| Some(user.email.clone())),
            age: self.age.unwrap_or(Some(user.age)),
        }
    }
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 整数年龄按整数输出，`30.0` 仍写作 `30`
fn serialize_age<S: Serializer>(age: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if age.fract() == 0.0 && age.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*age as i64)
    } else {
        serializer.serialize_f64(*age)
    }
}

fn describe_violations(errors: ValidationErrors) -> ConstraintError {
    let mut violations: Vec<String> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            errors.first().map(|error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    violations.sort();

    ConstraintError(violations.join(", "))
}
