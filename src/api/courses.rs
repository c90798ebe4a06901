//! Course API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::db::{parse_search_params, SearchParams};
use crate::errors::AppError;
use crate::models::{Course, CreateCourseRequest};
use crate::AppState;

/// Maximum number of search results allowed per page.
const MAX_SEARCH_LIMIT: u32 = 100;

/// One page of search results and the total match count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub courses: Vec<Course>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// Total match count.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub total: i64,
}

/// Query parameters for the last-updated summary.
#[derive(Debug, Deserialize)]
pub struct LastUpdatedQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

/// Parse query pairs and resolve the locale allow-list.
fn search_params(
    state: &AppState,
    pairs: Vec<(String, String)>,
) -> Result<(SearchParams, Vec<String>), AppError> {
    let mut params = parse_search_params(pairs)?;
    params.options.limit = params.options.limit.min(MAX_SEARCH_LIMIT);

    let locales = params
        .filters
        .locales
        .clone()
        .unwrap_or_else(|| state.config.allowed_locales.clone());

    Ok((params, locales))
}

/// GET /api/courses - List all courses.
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<Course>> {
    success(state.repo.list_courses().await?)
}

/// GET /api/courses/search - Filter, order and paginate courses.
pub async fn search_courses(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<SearchResponse> {
    let (params, locales) = search_params(&state, pairs)?;

    let (courses, total) = state
        .repo
        .search_page(&params.filters, &locales, params.options)
        .await?;

    success(SearchResponse {
        courses,
        total,
        limit: params.options.limit,
        offset: params.options.offset,
    })
}

/// GET /api/courses/count - Count courses matching the filters.
pub async fn count_courses(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<CountResponse> {
    let (params, locales) = search_params(&state, pairs)?;
    let total = state.repo.count_courses(&params.filters, &locales).await?;
    success(CountResponse { total })
}

/// GET /api/courses/{id} - Get a single course.
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Course> {
    success(state.repo.get_course(&id).await?)
}

/// GET /api/courses/youtube/{youtube_course_id} - Look up a course by its
/// YouTube id. `data` is `null` when no course matches.
pub async fn get_course_by_youtube_id(
    State(state): State<AppState>,
    Path(youtube_course_id): Path<String>,
) -> ApiResult<Option<Course>> {
    success(state.repo.get_course_by_youtube_id(&youtube_course_id).await?)
}

/// POST /api/courses - Create a new course.
pub async fn create_course(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> ApiResult<Course> {
    success(state.repo.create_course(&request).await?)
}

/// DELETE /api/courses/{id} - Delete a course.
pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_course(&id).await?;
    success(())
}

/// POST /api/courses/{id}/views - Record one view.
pub async fn increment_view_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Course> {
    success(state.repo.increment_view_count(&id).await?)
}

/// GET /api/courses/last-updated - Relative time since the newest course was
/// added. `data` is `null` while the catalog is empty.
pub async fn last_updated(
    State(state): State<AppState>,
    Query(query): Query<LastUpdatedQuery>,
) -> ApiResult<Option<String>> {
    let locale = query
        .locale
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.config.default_locale.clone());

    success(state.repo.last_updated(&locale).await?)
}
