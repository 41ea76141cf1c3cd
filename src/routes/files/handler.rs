use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    middleware::CurrentUser,
    remote::models::ITEM_FIELDS,
    utils::success_to_api_response,
};

const ROOT_FOLDER_ID: &str = "0";
const FILE_FIELDS: &[&str] = &["id", "name", "size", "modified_at"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub folder_id: Option<String>,
}

/// 远程条目 ID 都是数字字符串
fn check_item_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("无效的条目ID".to_string()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let folder_id = query
        .folder_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ROOT_FOLDER_ID.to_string());
    check_item_id(&folder_id)?;

    let client = state.tokens.get_valid_client(&current.account).await?;
    let items = client.list_folder_items(&folder_id, ITEM_FIELDS).await?;

    Ok(success_to_api_response(items.files_and_folders()))
}

#[axum::debug_handler]
pub async fn get_file(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_item_id(&file_id)?;

    let client = state.tokens.get_valid_client(&current.account).await?;
    let file = client.get_file(&file_id, FILE_FIELDS).await?;

    Ok(success_to_api_response(file))
}
