use std::sync::Arc;

use crate::remote::auth::{BoxAuth, Subject};
use crate::remote::client::BoxClient;
use crate::remote::error::RemoteError;

const ROOT_FOLDER_ID: &str = "0";
const STATEMENTS_FOLDER: &str = "My Statements";
const UPLOADS_FOLDER: &str = "Uploads";
const CO_OWNER: &str = "co-owner";

/// 为新注册用户开通远程账户和目录结构
#[derive(Clone)]
pub struct Provisioner {
    auth: Arc<BoxAuth>,
}

impl Provisioner {
    pub fn new(auth: Arc<BoxAuth>) -> Self {
        Self { auth }
    }

    /// 返回新建远程用户的 ID
    pub async fn provision_user(&self, username: &str) -> Result<String, RemoteError> {
        tracing::info!("Creating remote app user for {}", username);

        let service = self
            .auth
            .client_as(Subject::Enterprise(self.auth.enterprise_id()))
            .await?;
        let remote_user = service.create_app_user(username).await?;
        tracing::info!(
            "Created remote app user {} (login: {:?})",
            remote_user.id,
            remote_user.login
        );

        let user_client = self.auth.client_as(Subject::User(&remote_user.id)).await?;
        let root = user_client.create_folder(ROOT_FOLDER_ID, username).await?;
        let statements = user_client.create_folder(&root.id, STATEMENTS_FOLDER).await?;
        let uploads = user_client.create_folder(&statements.id, UPLOADS_FOLDER).await?;
        tracing::info!(
            "Created folder structure root={} statements={} uploads={}",
            root.id,
            statements.id,
            uploads.id
        );

        if let Err(e) = share_with_service(&service, &user_client, &root.id).await {
            // 目录已经建好，协作失败只影响服务账户的访问
            tracing::error!("Failed to add service collaboration on {}: {}", root.id, e);
        }

        Ok(remote_user.id)
    }
}

async fn share_with_service(
    service: &BoxClient,
    user_client: &BoxClient,
    folder_id: &str,
) -> Result<(), RemoteError> {
    let service_user = service.current_user().await?;
    user_client
        .add_collaboration(folder_id, &service_user.id, CO_OWNER)
        .await
}
