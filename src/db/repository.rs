//! Database repository for catalog operations.
//!
//! Courses are always returned enriched. Writes that touch several tables run
//! in a transaction.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::query::{fold_case, CourseFilters, CourseQuery, SearchOptions, COURSE_SELECT};
use crate::errors::{AppError, ValidationErrors};
use crate::models::{
    course_type, enrich, enrich_channel, Channel, Course, CourseType, CreateChannelRequest,
    CreateCourseRequest, CreateTagRequest, Tag, TagKind,
};
use crate::relative_time;

/// Maximum bound parameters per tag loading query.
const TAG_LOAD_CHUNK: usize = 500;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    default_locale: String,
}

impl Repository {
    pub fn new(pool: SqlitePool, default_locale: impl Into<String>) -> Self {
        Self {
            pool,
            default_locale: default_locale.into(),
        }
    }

    // ==================== CHANNEL OPERATIONS ====================

    /// List all channels.
    pub async fn list_channels(&self) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query("SELECT id, youtube_channel_id, name FROM channels ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(channel_from_row).collect()
    }

    /// Get a channel by its YouTube identifier.
    pub async fn get_channel_by_youtube_id(
        &self,
        youtube_channel_id: &str,
    ) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query(
            "SELECT id, youtube_channel_id, name FROM channels WHERE youtube_channel_id = ?",
        )
        .bind(youtube_channel_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(channel_from_row).transpose()
    }

    /// Register a channel.
    pub async fn create_channel(
        &self,
        request: &CreateChannelRequest,
    ) -> Result<Channel, AppError> {
        let mut errors = ValidationErrors::new();
        if request.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        if request.youtube_channel_id.trim().is_empty() {
            errors.add("youtube_channel_id", "can't be blank");
        } else if self
            .get_channel_by_youtube_id(&request.youtube_channel_id)
            .await?
            .is_some()
        {
            errors.add("youtube_channel_id", "has already been taken");
        }
        errors.into_result()?;

        let id = uuid::Uuid::new_v4().to_string();
        let result = sqlx::query(
            "INSERT INTO channels (id, youtube_channel_id, name, inserted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.youtube_channel_id)
        .bind(&request.name)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            return Err(taken_or(err, "youtube_channel_id"));
        }

        tracing::info!("Created channel {} ({})", request.name, request.youtube_channel_id);

        Ok(enrich_channel(Channel {
            id,
            youtube_channel_id: request.youtube_channel_id.clone(),
            name: request.name.clone(),
            url: String::new(),
        }))
    }

    // ==================== TAG OPERATIONS ====================

    /// List all tags of a kind.
    pub async fn list_tags(&self, kind: TagKind) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, name FROM {} ORDER BY name",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Tag, AppError> {
                Ok(Tag {
                    id: row.try_get("id")?,
                    kind,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    /// Create a tag of a kind.
    pub async fn create_tag(
        &self,
        kind: TagKind,
        request: &CreateTagRequest,
    ) -> Result<Tag, AppError> {
        let mut errors = ValidationErrors::new();
        if request.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        errors.into_result()?;

        let id = uuid::Uuid::new_v4().to_string();
        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, name, name_folded) VALUES (?, ?, ?)",
            kind.table()
        ))
        .bind(&id)
        .bind(&request.name)
        .bind(fold_case(&request.name))
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            return Err(taken_or(err, "name"));
        }

        Ok(Tag {
            id,
            kind,
            name: request.name.clone(),
        })
    }

    /// Resolve tag names to ids. Names with no matching tag are dropped.
    pub async fn resolve_tags(
        &self,
        kind: TagKind,
        names: &[String],
    ) -> Result<Vec<String>, AppError> {
        let mut conn = self.pool.acquire().await?;
        resolve_tag_ids(&mut conn, kind, names).await
    }

    // ==================== COURSE OPERATIONS ====================

    /// List all courses, most recently published first.
    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let mut qb = QueryBuilder::new(COURSE_SELECT);
        qb.push(" ORDER BY c.published_at DESC, c.id");
        self.fetch_courses(qb).await
    }

    /// Number of courses matching the filters, ignoring pagination.
    pub async fn count_courses(
        &self,
        filters: &CourseFilters,
        locales: &[String],
    ) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await?;
        let query = CourseQuery::from_filters(filters, locales, &self.default_locale);
        count_matching(&mut conn, &query).await
    }

    /// Search courses within the allowed locales.
    ///
    /// Returns one page of matches and the total match count, read from the
    /// same snapshot.
    pub async fn search_page(
        &self,
        filters: &CourseFilters,
        locales: &[String],
        options: SearchOptions,
    ) -> Result<(Vec<Course>, i64), AppError> {
        let query = CourseQuery::from_filters(filters, locales, &self.default_locale);

        // A WAL read transaction sees one snapshot for both statements
        let mut tx = self.pool.begin().await?;
        let courses = fetch_courses(&mut tx, query.clone().paginate(options).select()).await?;
        let total = count_matching(&mut tx, &query).await?;
        tx.commit().await?;

        Ok((courses, total))
    }

    /// Get a course by ID.
    pub async fn get_course(&self, id: &str) -> Result<Course, AppError> {
        let mut qb = QueryBuilder::new(COURSE_SELECT);
        qb.push(" WHERE c.id = ").push_bind(id.to_string());

        self.fetch_courses(qb)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", id)))
    }

    /// Get a course by its YouTube identifier, if it exists.
    pub async fn get_course_by_youtube_id(
        &self,
        youtube_course_id: &str,
    ) -> Result<Option<Course>, AppError> {
        let mut qb = QueryBuilder::new(COURSE_SELECT);
        qb.push(" WHERE c.youtube_course_id = ")
            .push_bind(youtube_course_id.to_string());

        Ok(self.fetch_courses(qb).await?.into_iter().next())
    }

    /// Create a course owned by the channel with the given YouTube identifier.
    pub async fn create_course(&self, request: &CreateCourseRequest) -> Result<Course, AppError> {
        let channel = self
            .get_channel_by_youtube_id(&request.channel_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Channel {} not found", request.channel_id))
            })?;

        let mut errors = ValidationErrors::new();
        if request.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        if request.locale.trim().is_empty() {
            errors.add("locale", "can't be blank");
        }
        if request.youtube_course_id.trim().is_empty() {
            errors.add("youtube_course_id", "can't be blank");
        } else if self.youtube_course_id_taken(&request.youtube_course_id).await? {
            errors.add("youtube_course_id", "has already been taken");
        }
        errors.into_result()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let published_at = request.published_at.unwrap_or(now);
        let kind: CourseType = course_type(&request.youtube_course_id);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"INSERT INTO courses (
                id, name, name_folded, youtube_course_id, course_type, locale,
                published_at, inserted_at, view_count, channel_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)"#,
        )
        .bind(&id)
        .bind(&request.name)
        .bind(fold_case(&request.name))
        .bind(&request.youtube_course_id)
        .bind(kind.as_str())
        .bind(&request.locale)
        .bind(format_timestamp(published_at))
        .bind(format_timestamp(now))
        .bind(&channel.id)
        .execute(&mut *tx)
        .await;

        if let Err(err) = result {
            return Err(taken_or(err, "youtube_course_id"));
        }

        for tag_kind in TagKind::ALL {
            let tag_ids = resolve_tag_ids(&mut tx, tag_kind, request.tag_names(tag_kind)).await?;
            for tag_id in tag_ids {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {} (course_id, {}) VALUES (?, ?)",
                    tag_kind.join_table(),
                    tag_kind.foreign_key()
                ))
                .bind(&id)
                .bind(&tag_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Created {} course {} ({})",
            kind.as_str(),
            request.name,
            request.youtube_course_id
        );

        self.get_course(&id).await
    }

    /// Delete a course and its tag associations.
    pub async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Course {} not found", id)));
        }

        tracing::info!("Deleted course {}", id);
        Ok(())
    }

    /// Atomically add one view and return the updated course.
    pub async fn increment_view_count(&self, id: &str) -> Result<Course, AppError> {
        let result = sqlx::query("UPDATE courses SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Course {} not found", id)));
        }

        self.get_course(id).await
    }

    /// The most recently inserted course, if any.
    pub async fn last_inserted_course(&self) -> Result<Option<Course>, AppError> {
        let mut qb = QueryBuilder::new(COURSE_SELECT);
        qb.push(" ORDER BY c.inserted_at DESC, c.rowid DESC LIMIT 1");

        Ok(self.fetch_courses(qb).await?.into_iter().next())
    }

    /// "Last updated ..." line for the catalog, or `None` while it is empty.
    pub async fn last_updated(&self, locale: &str) -> Result<Option<String>, AppError> {
        let text = self.last_inserted_course().await?.map(|course| {
            relative_time::last_updated_text(course.inserted_at, Utc::now(), locale)
        });
        Ok(text)
    }

    // ==================== HELPERS ====================

    async fn youtube_course_id_taken(&self, youtube_course_id: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM courses WHERE youtube_course_id = ?")
            .bind(youtube_course_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn fetch_courses(
        &self,
        qb: QueryBuilder<'static, Sqlite>,
    ) -> Result<Vec<Course>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_courses(&mut conn, qb).await
    }
}

/// Run a course query, attach tag names and enrich every row.
async fn fetch_courses(
    conn: &mut SqliteConnection,
    mut qb: QueryBuilder<'static, Sqlite>,
) -> Result<Vec<Course>, AppError> {
    let rows = qb.build().fetch_all(&mut *conn).await?;
    let mut courses = rows
        .iter()
        .map(course_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    for chunk in courses.chunks_mut(TAG_LOAD_CHUNK) {
        load_tags(conn, chunk).await?;
    }

    Ok(courses.into_iter().map(enrich).collect())
}

async fn count_matching(
    conn: &mut SqliteConnection,
    query: &CourseQuery,
) -> Result<i64, AppError> {
    let total = query
        .count()
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;
    Ok(total)
}

async fn load_tags(conn: &mut SqliteConnection, courses: &mut [Course]) -> Result<(), AppError> {
    if courses.is_empty() {
        return Ok(());
    }

    for kind in TagKind::ALL {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT j.course_id, t.name FROM {join} j JOIN {table} t ON t.id = j.{fk} WHERE j.course_id IN (",
            join = kind.join_table(),
            table = kind.table(),
            fk = kind.foreign_key(),
        ));
        let mut separated = qb.separated(", ");
        for course in courses.iter() {
            separated.push_bind(course.id.clone());
        }
        separated.push_unseparated(") ORDER BY t.name");

        let rows = qb.build().fetch_all(&mut *conn).await?;

        let mut by_course: HashMap<String, Vec<String>> = HashMap::new();
        for row in &rows {
            by_course
                .entry(row.try_get("course_id")?)
                .or_default()
                .push(row.try_get("name")?);
        }

        for course in courses.iter_mut() {
            if let Some(names) = by_course.remove(&course.id) {
                *course.tags_mut(kind) = names;
            }
        }
    }

    Ok(())
}

/// Look up ids for the given tag names on an open connection.
async fn resolve_tag_ids(
    conn: &mut SqliteConnection,
    kind: TagKind,
    names: &[String],
) -> Result<Vec<String>, AppError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT id FROM {} WHERE name IN (",
        kind.table()
    ));
    let mut separated = qb.separated(", ");
    for name in names {
        separated.push_bind(name.clone());
    }
    separated.push_unseparated(")");

    let ids = qb
        .build_query_scalar::<String>()
        .fetch_all(&mut *conn)
        .await?;

    if ids.len() < names.len() {
        tracing::debug!(
            "Dropped {} unknown {} name(s)",
            names.len() - ids.len(),
            kind.table()
        );
    }

    Ok(ids)
}

/// Map a unique constraint violation to a validation error on `field`.
fn taken_or(err: sqlx::Error, field: &str) -> AppError {
    let unique = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if unique {
        let mut errors = ValidationErrors::new();
        errors.add(field, "has already been taken");
        AppError::Validation(errors)
    } else {
        AppError::from(err)
    }
}

/// Timestamps are stored as second-precision UTC RFC 3339 so that text order
/// is chronological order.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            tracing::error!("Corrupt timestamp in {}: {:?} ({})", column, value, e);
            AppError::Internal(format!("Invalid timestamp in {}", column))
        })
}

// Helper functions for row conversion

fn channel_from_row(row: &SqliteRow) -> Result<Channel, AppError> {
    Ok(enrich_channel(Channel {
        id: row.try_get("id")?,
        youtube_channel_id: row.try_get("youtube_channel_id")?,
        name: row.try_get("name")?,
        url: String::new(),
    }))
}

fn course_from_row(row: &SqliteRow) -> Result<Course, AppError> {
    let course_type: String = row.try_get("course_type")?;
    let published_at: String = row.try_get("published_at")?;
    let inserted_at: String = row.try_get("inserted_at")?;

    Ok(Course {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        youtube_course_id: row.try_get("youtube_course_id")?,
        course_type: CourseType::from_stored(&course_type)?,
        locale: row.try_get("locale")?,
        published_at: parse_timestamp("published_at", &published_at)?,
        inserted_at: parse_timestamp("inserted_at", &inserted_at)?,
        view_count: row.try_get("view_count")?,
        url: String::new(),
        channel: Channel {
            id: row.try_get("channel_id")?,
            youtube_channel_id: row.try_get("youtube_channel_id")?,
            name: row.try_get("channel_name")?,
            url: String::new(),
        },
        languages: Vec::new(),
        frameworks: Vec::new(),
        tools: Vec::new(),
        fundamentals: Vec::new(),
    })
}
