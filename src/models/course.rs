//! Course model: a cataloged video or playlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{enrich_channel, Channel, TagKind};
use crate::errors::AppError;

/// Whether a course points at a single video or a playlist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Video,
    Playlist,
}

impl CourseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Video => "video",
            CourseType::Playlist => "playlist",
        }
    }

    /// Decode a stored type. Anything other than `video` or `playlist` means
    /// the row was written outside this service.
    pub fn from_stored(s: &str) -> Result<Self, AppError> {
        match s {
            "video" => Ok(CourseType::Video),
            "playlist" => Ok(CourseType::Playlist),
            other => {
                tracing::error!("Corrupt course row: unknown course type {:?}", other);
                Err(AppError::Internal(format!("Unknown course type: {}", other)))
            }
        }
    }
}

/// Derive the course type from its YouTube identifier.
pub fn course_type(youtube_course_id: &str) -> CourseType {
    if youtube_course_id.starts_with("PL") {
        CourseType::Playlist
    } else {
        CourseType::Video
    }
}

/// Public URL for a course.
pub fn generate_url(course_type: CourseType, youtube_course_id: &str) -> String {
    match course_type {
        CourseType::Video => format!("https://www.youtube.com/video/{}", youtube_course_id),
        CourseType::Playlist => {
            format!("https://www.youtube.com/playlist?list={}", youtube_course_id)
        }
    }
}

/// A course in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub youtube_course_id: String,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub locale: String,
    pub published_at: DateTime<Utc>,
    pub inserted_at: DateTime<Utc>,
    pub view_count: i64,
    /// Derived from `course_type` and `youtube_course_id`, never stored.
    #[serde(default)]
    pub url: String,
    pub channel: Channel,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub fundamentals: Vec<String>,
}

impl Course {
    /// Tag names of the given kind.
    pub fn tags_mut(&mut self, kind: TagKind) -> &mut Vec<String> {
        match kind {
            TagKind::Language => &mut self.languages,
            TagKind::Framework => &mut self.frameworks,
            TagKind::Tool => &mut self.tools,
            TagKind::Fundamentals => &mut self.fundamentals,
        }
    }
}

/// Attach derived fields to a fetched course and its channel.
pub fn enrich(course: Course) -> Course {
    Course {
        url: generate_url(course.course_type, &course.youtube_course_id),
        channel: enrich_channel(course.channel),
        ..course
    }
}

/// Request body for creating a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    /// YouTube identifier of the owning channel
    pub channel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub youtube_course_id: String,
    #[serde(default)]
    pub locale: String,
    /// Defaults to the insertion time when omitted
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub fundamentals: Vec<String>,
}

impl CreateCourseRequest {
    /// Tag names requested for the given kind.
    pub fn tag_names(&self, kind: TagKind) -> &[String] {
        match kind {
            TagKind::Language => &self.languages,
            TagKind::Framework => &self.frameworks,
            TagKind::Tool => &self.tools,
            TagKind::Fundamentals => &self.fundamentals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_course(youtube_course_id: &str) -> Course {
        Course {
            id: "c1".to_string(),
            name: "Intro to Rust".to_string(),
            youtube_course_id: youtube_course_id.to_string(),
            course_type: course_type(youtube_course_id),
            locale: "en".to_string(),
            published_at: Utc::now(),
            inserted_at: Utc::now(),
            view_count: 0,
            url: String::new(),
            channel: Channel {
                id: "ch1".to_string(),
                youtube_channel_id: "UCrust".to_string(),
                name: "Rust".to_string(),
                url: String::new(),
            },
            languages: vec![],
            frameworks: vec![],
            tools: vec![],
            fundamentals: vec![],
        }
    }

    #[test]
    fn test_course_type_from_prefix() {
        assert_eq!(course_type("PLfoo"), CourseType::Playlist);
        assert_eq!(course_type("xyz"), CourseType::Video);
        // Prefix match is case sensitive
        assert_eq!(course_type("plfoo"), CourseType::Video);
    }

    #[test]
    fn test_generate_url() {
        assert_eq!(
            generate_url(CourseType::Video, "abc123"),
            "https://www.youtube.com/video/abc123"
        );
        assert_eq!(
            generate_url(CourseType::Playlist, "PLxyz"),
            "https://www.youtube.com/playlist?list=PLxyz"
        );
    }

    #[test]
    fn test_enrich_fills_course_and_channel_urls() {
        let course = enrich(create_test_course("PLxyz"));
        assert_eq!(course.url, "https://www.youtube.com/playlist?list=PLxyz");
        assert_eq!(course.channel.url, "https://www.youtube.com/channel/UCrust");
    }

    #[test]
    fn test_stored_type_must_be_known() {
        assert_eq!(CourseType::from_stored("video").ok(), Some(CourseType::Video));
        assert_eq!(
            CourseType::from_stored("playlist").ok(),
            Some(CourseType::Playlist)
        );
        assert!(matches!(
            CourseType::from_stored("short"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_course_serializes_type_field() {
        let json = serde_json::to_value(enrich(create_test_course("abc123"))).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["youtubeCourseId"], "abc123");
        assert_eq!(json["url"], "https://www.youtube.com/video/abc123");
    }
}
