use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 文件列表请求的字段
pub const ITEM_FIELDS: &[&str] = &["id", "name", "size", "modified_at", "type", "item_count"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub item_count: u64,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    File(FileEntry),
    Folder(FolderEntry),
    /// 网页链接等其他类型，列表中不展示
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCollection {
    pub total_count: u64,
    pub entries: Vec<Item>,
}

impl ItemCollection {
    /// 去掉文件和文件夹以外的条目，总数同步扣除
    pub fn files_and_folders(mut self) -> Self {
        let before = self.entries.len();
        self.entries.retain(|item| !matches!(item, Item::Other));
        let dropped = (before - self.entries.len()) as u64;
        self.total_count = self.total_count.saturating_sub(dropped);
        self
    }
}

/// OAuth 令牌接口的响应
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<Value>,
}

/// 一次凭据交换得到的令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangedToken {
    pub access_token: String,
    /// 服务端报告的有效期（秒），无法解析时为 None
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for ExchangedToken {
    fn from(resp: TokenResponse) -> Self {
        ExchangedToken {
            expires_in: lifetime_secs(resp.expires_in.as_ref()),
            access_token: resp.access_token,
        }
    }
}

/// 有效期可能是整数、小数或数字字符串
pub(crate) fn lifetime_secs(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFolder {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_keeps_only_files_and_folders() {
        let raw = json!({
            "total_count": 3,
            "entries": [
                {"type": "folder", "id": "11", "name": "My Statements", "item_count": 2,
                 "modified_at": "2024-03-01T10:00:00-08:00"},
                {"type": "file", "id": "12", "name": "march.pdf", "size": 52311},
                {"type": "web_link", "id": "13", "name": "portal"}
            ],
            "offset": 0,
            "limit": 100
        });

        let listing: ItemCollection = serde_json::from_value(raw).unwrap();
        let listing = listing.files_and_folders();

        assert_eq!(listing.total_count, 2);
        assert_eq!(listing.entries.len(), 2);
        match &listing.entries[0] {
            Item::Folder(folder) => {
                assert_eq!(folder.item_count, 2);
                assert!(folder.modified_at.is_some());
            }
            other => panic!("expected folder, got {other:?}"),
        }
        assert!(matches!(&listing.entries[1], Item::File(f) if f.size == 52311));
    }

    #[test]
    fn lifetime_parsing_is_lenient() {
        assert_eq!(lifetime_secs(Some(&json!(4168))), Some(4168));
        assert_eq!(lifetime_secs(Some(&json!(3599.7))), Some(3599));
        assert_eq!(lifetime_secs(Some(&json!("1800"))), Some(1800));
        assert_eq!(lifetime_secs(Some(&json!("soon"))), None);
        assert_eq!(lifetime_secs(Some(&json!(null))), None);
        assert_eq!(lifetime_secs(None), None);
    }
}
