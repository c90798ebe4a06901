//! Tag API endpoints for languages, frameworks, tools and fundamentals.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateTagRequest, Tag, TagKind};
use crate::AppState;

fn tag_kind(segment: &str) -> Result<TagKind, AppError> {
    TagKind::from_path(segment)
        .ok_or_else(|| AppError::NotFound(format!("Unknown tag kind {}", segment)))
}

/// GET /api/tags/{kind} - List all tags of a kind.
pub async fn list_tags(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Vec<Tag>> {
    let kind = tag_kind(&kind)?;
    success(state.repo.list_tags(kind).await?)
}

/// POST /api/tags/{kind} - Create a tag.
pub async fn create_tag(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<Tag> {
    let kind = tag_kind(&kind)?;
    success(state.repo.create_tag(kind, &request).await?)
}
