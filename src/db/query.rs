//! Composable course search query.
//!
//! [`CourseQuery`] is an immutable description of a search. Each builder step
//! consumes the query and returns a new one, adding a constraint only when its
//! input is present. Rendering to SQL happens last, in [`CourseQuery::select`]
//! and [`CourseQuery::count`], so both share exactly the same joins and
//! filters.

use sqlx::{QueryBuilder, Sqlite};

use crate::errors::AppError;
use crate::models::TagKind;

/// Default page size for searches.
pub const DEFAULT_LIMIT: u32 = 20;

/// Columns selected for a course together with its channel.
pub(crate) const COURSE_SELECT: &str = r#"SELECT c.id, c.name, c.youtube_course_id, c.course_type,
       c.locale, c.published_at, c.inserted_at, c.view_count,
       ch.id AS channel_id, ch.youtube_channel_id, ch.name AS channel_name
FROM courses c
JOIN channels ch ON ch.id = c.channel_id"#;

const COURSE_COUNT: &str = r#"SELECT COUNT(DISTINCT c.id)
FROM courses c
JOIN channels ch ON ch.id = c.channel_id"#;

/// Pagination options for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: u32,
    pub offset: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Optional search filters. `None` and empty strings add no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilters {
    pub search: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub tool: Option<String>,
    pub fundamentals: Option<String>,
    /// Locale whose courses sort first
    pub locale: Option<String>,
    /// Locale allow-list supplied by the caller
    pub locales: Option<Vec<String>>,
}

impl CourseFilters {
    /// Filter value for a tag kind.
    pub fn tag(&self, kind: TagKind) -> Option<&str> {
        match kind {
            TagKind::Language => self.language.as_deref(),
            TagKind::Framework => self.framework.as_deref(),
            TagKind::Tool => self.tool.as_deref(),
            TagKind::Fundamentals => self.fundamentals.as_deref(),
        }
    }
}

/// Filters and pagination parsed from a string-keyed parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub filters: CourseFilters,
    pub options: SearchOptions,
}

/// Parse search parameters, rejecting any key that is not a known filter or
/// option.
pub fn parse_search_params<I, K, V>(pairs: I) -> Result<SearchParams, AppError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut params = SearchParams::default();

    for (key, value) in pairs {
        let value = value.into();
        match key.as_ref() {
            "search" => params.filters.search = Some(value),
            "language" => params.filters.language = Some(value),
            "framework" => params.filters.framework = Some(value),
            "tool" => params.filters.tool = Some(value),
            "fundamentals" => params.filters.fundamentals = Some(value),
            "locale" => params.filters.locale = Some(value),
            "locales" => {
                params.filters.locales = Some(crate::config::parse_locale_list(&value))
            }
            "limit" => params.options.limit = parse_option("limit", &value)?,
            "offset" => params.options.offset = parse_option("offset", &value)?,
            other => {
                return Err(AppError::InvalidOptions(format!(
                    "Unknown option: {}",
                    other
                )))
            }
        }
    }

    Ok(params)
}

fn parse_option(key: &str, value: &str) -> Result<u32, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::InvalidOptions(format!(
            "Option {} must be a non-negative integer, got {:?}",
            key, value
        ))
    })
}

/// Lowercase a name for case-insensitive matching.
///
/// SQLite `LIKE` only folds ASCII, so names are stored alongside a folded copy
/// in a `name_folded` column and compared against folded input.
pub fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Fold user input, escape `LIKE` wildcards and wrap it for substring matching.
///
/// The pattern is meant for `LIKE ? ESCAPE '\'` against a `name_folded` column.
pub fn like_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for ch in fold_case(input).chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Immutable description of a course search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    locales: Vec<String>,
    name: Option<String>,
    tags: Vec<(TagKind, String)>,
    preferred_locale: Option<String>,
    page: Option<SearchOptions>,
}

impl CourseQuery {
    /// An empty query. With no locales it matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the full search from caller filters.
    pub fn from_filters(filters: &CourseFilters, locales: &[String], default_locale: &str) -> Self {
        let preferred = non_empty(filters.locale.as_deref()).unwrap_or(default_locale);

        let query = TagKind::ALL
            .into_iter()
            .fold(
                Self::new()
                    .in_locales(locales)
                    .matching_name(filters.search.as_deref()),
                |query, kind| query.tagged(kind, filters.tag(kind)),
            )
            .preferring_locale(preferred);

        tracing::debug!(?query, "Composed course query");
        query
    }

    /// Restrict results to the given locales.
    pub fn in_locales(self, locales: &[String]) -> Self {
        Self {
            locales: locales.to_vec(),
            ..self
        }
    }

    /// Case-insensitive substring match on the course name.
    pub fn matching_name(self, search: Option<&str>) -> Self {
        match non_empty(search) {
            Some(search) => Self {
                name: Some(search.to_string()),
                ..self
            },
            None => self,
        }
    }

    /// Require at least one tag of `kind` whose name contains `name`.
    ///
    /// A second filter for the same kind replaces the first.
    pub fn tagged(self, kind: TagKind, name: Option<&str>) -> Self {
        let Some(name) = non_empty(name) else {
            return self;
        };

        let mut tags: Vec<(TagKind, String)> =
            self.tags.into_iter().filter(|(k, _)| *k != kind).collect();
        tags.push((kind, name.to_string()));
        tags.sort_by_key(|(k, _)| TagKind::ALL.iter().position(|a| a == k));

        Self { tags, ..self }
    }

    /// Sort courses in `locale` ahead of the rest.
    pub fn preferring_locale(self, locale: &str) -> Self {
        Self {
            preferred_locale: Some(locale.to_string()),
            ..self
        }
    }

    /// Apply `LIMIT`/`OFFSET` to [`CourseQuery::select`].
    pub fn paginate(self, options: SearchOptions) -> Self {
        Self {
            page: Some(options),
            ..self
        }
    }

    /// Drop pagination.
    pub fn unbounded(self) -> Self {
        Self { page: None, ..self }
    }

    /// Render the row query: filtered, de-duplicated, ordered, paginated.
    pub fn select(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(COURSE_SELECT);
        self.push_joins(&mut qb);
        self.push_filters(&mut qb);

        // Tag joins fan out to one row per matching tag
        qb.push(" GROUP BY c.id ORDER BY ");
        if let Some(locale) = &self.preferred_locale {
            qb.push("(c.locale = ")
                .push_bind(locale.clone())
                .push(") DESC, ");
        }
        qb.push("c.published_at DESC, c.id");

        if let Some(page) = self.page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(page.limit))
                .push(" OFFSET ")
                .push_bind(i64::from(page.offset));
        }

        qb
    }

    /// Render the count query over the same filters, ignoring pagination.
    pub fn count(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(COURSE_COUNT);
        self.push_joins(&mut qb);
        self.push_filters(&mut qb);
        qb
    }

    fn push_joins(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        for (kind, _) in &self.tags {
            let alias = kind.alias();
            qb.push(format!(
                " JOIN {join} {alias}_j ON {alias}_j.course_id = c.id JOIN {table} {alias} ON {alias}.id = {alias}_j.{fk}",
                join = kind.join_table(),
                table = kind.table(),
                fk = kind.foreign_key(),
            ));
        }
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        if self.locales.is_empty() {
            qb.push(" WHERE 1 = 0");
        } else {
            qb.push(" WHERE c.locale IN (");
            let mut separated = qb.separated(", ");
            for locale in &self.locales {
                separated.push_bind(locale.clone());
            }
            separated.push_unseparated(")");
        }

        if let Some(name) = &self.name {
            qb.push(" AND c.name_folded LIKE ")
                .push_bind(like_pattern(name))
                .push(" ESCAPE '\\'");
        }

        for (kind, name) in &self.tags {
            qb.push(format!(" AND {}.name_folded LIKE ", kind.alias()))
                .push_bind(like_pattern(name))
                .push(" ESCAPE '\\'");
        }
    }
}
