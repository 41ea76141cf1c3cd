use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::remote::error::{RemoteError, check_response};
use crate::remote::models::{FileEntry, ItemCollection, RemoteFolder, RemoteUser};

const LIST_LIMIT: &str = "1000";

/// 路由层实际用到的远程操作
#[async_trait]
pub trait FolderApi: Send + Sync {
    async fn list_folder_items(
        &self,
        folder_id: &str,
        fields: &[&str],
    ) -> Result<ItemCollection, RemoteError>;

    async fn get_file(&self, file_id: &str, fields: &[&str]) -> Result<FileEntry, RemoteError>;
}

/// 由访问令牌构造客户端
pub trait ClientFactory: Send + Sync {
    fn client(&self, access_token: &str) -> Arc<dyn FolderApi>;
}

#[derive(Clone)]
pub struct BoxClient {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl BoxClient {
    pub fn new(http: reqwest::Client, api_url: &str, access_token: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    pub async fn current_user(&self) -> Result<RemoteUser, RemoteError> {
        let response = self
            .http
            .get(self.url("users/me"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    /// 创建仅供平台访问的应用用户
    pub async fn create_app_user(&self, name: &str) -> Result<RemoteUser, RemoteError> {
        let response = self
            .http
            .post(self.url("users"))
            .bearer_auth(&self.access_token)
            .json(&json!({
                "name": name,
                "is_platform_access_only": true,
                "external_app_user_id": name,
            }))
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    pub async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteFolder, RemoteError> {
        let response = self
            .http
            .post(self.url("folders"))
            .bearer_auth(&self.access_token)
            .json(&json!({ "name": name, "parent": { "id": parent_id } }))
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    pub async fn add_collaboration(
        &self,
        folder_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("collaborations"))
            .bearer_auth(&self.access_token)
            .json(&json!({
                "item": { "type": "folder", "id": folder_id },
                "accessible_by": { "type": "user", "id": user_id },
                "role": role,
            }))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl FolderApi for BoxClient {
    async fn list_folder_items(
        &self,
        folder_id: &str,
        fields: &[&str],
    ) -> Result<ItemCollection, RemoteError> {
        let fields = fields.join(",");
        let response = self
            .http
            .get(self.url(&format!("folders/{folder_id}/items")))
            .bearer_auth(&self.access_token)
            .query(&[("fields", fields.as_str()), ("limit", LIST_LIMIT)])
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    async fn get_file(&self, file_id: &str, fields: &[&str]) -> Result<FileEntry, RemoteError> {
        let fields = fields.join(",");
        let response = self
            .http
            .get(self.url(&format!("files/{file_id}")))
            .bearer_auth(&self.access_token)
            .query(&[("fields", fields.as_str())])
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }
}
