//! Channel API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Channel, CreateChannelRequest};
use crate::AppState;

/// GET /api/channels - List all channels.
pub async fn list_channels(State(state): State<AppState>) -> ApiResult<Vec<Channel>> {
    success(state.repo.list_channels().await?)
}

/// GET /api/channels/{youtube_channel_id} - Get a single channel.
pub async fn get_channel(
    State(state): State<AppState>,
    Path(youtube_channel_id): Path<String>,
) -> ApiResult<Channel> {
    match state.repo.get_channel_by_youtube_id(&youtube_channel_id).await? {
        Some(channel) => success(channel),
        None => Err(AppError::NotFound(format!(
            "Channel {} not found",
            youtube_channel_id
        ))),
    }
}

/// POST /api/channels - Register a channel.
pub async fn create_channel(
    State(state): State<AppState>,
    Json(request): Json<CreateChannelRequest>,
) -> ApiResult<Channel> {
    success(state.repo.create_channel(&request).await?)
}
