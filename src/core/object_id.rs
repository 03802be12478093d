//! 资源标识符
//!
//! 用户 ID 采用 12 字节的对象 ID，对外表示为 24 位十六进制字符串：
//! 4 字节秒级时间戳 + 5 字节进程随机值 + 3 字节自增计数器。

use serde::{Serialize, Serializer};
use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU32, Ordering},
        OnceLock,
    },
};

const OBJECT_ID_LEN: usize = 12;
const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// 标识符格式不合法
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed object id: {0:?}")]
pub struct InvalidObjectId(pub String);

/// 12 字节对象 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// 生成新的 ID，同一进程内严格唯一且不会复用
    pub fn new() -> Self {
        let seconds = chrono::Utc::now().timestamp() as u32;
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(seed_counter()))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// 纯语法校验：必须恰好是 24 位十六进制字符，不检查记录是否存在
    pub fn parse(candidate: &str) -> Result<Self, InvalidObjectId> {
        if candidate.len() != OBJECT_ID_LEN * 2 {
            return Err(InvalidObjectId(candidate.to_string()));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(candidate, &mut bytes)
            .map_err(|_| InvalidObjectId(candidate.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

fn process_unique() -> &'static [u8; 5] {
    PROCESS_UNIQUE.get_or_init(|| {
        let entropy = uuid::Uuid::new_v4();
        let mut bytes = [0u8; 5];
        bytes.copy_from_slice(&entropy.as_bytes()[..5]);
        bytes
    })
}

fn seed_counter() -> u32 {
    let entropy = uuid::Uuid::new_v4();
    let b = entropy.as_bytes();
    u32::from_be_bytes([0, b[0], b[1], b[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_round_trip_through_hex() {
        let id = ObjectId::new();
        let hex = id.to_hex();

        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(ObjectId::parse(&hex).unwrap(), id);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<ObjectId> = (0..10_000).map(|_| ObjectId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_parse_accepts_uppercase_hex() {
        let id = ObjectId::parse("507F1F77BCF86CD799439011").unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_parse_rejects_malformed_candidates() {
        for candidate in [
            "",
            "not-a-valid-id",
            "invalidid",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901g",
            "507f1f77-bcf8-6cd7-9943",
        ] {
            assert!(ObjectId::parse(candidate).is_err(), "{candidate} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_multibyte_input_of_matching_length() {
        // 24 字节但不是 24 个十六进制字符
        let candidate = "ééééééééééé00";
        assert_eq!(candidate.len(), 24);
        assert!(ObjectId::parse(candidate).is_err());
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let id = ObjectId::parse("507f1f77bcf86cd799439011").unwrap();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("507f1f77bcf86cd799439011"));
    }
}
