//! Integration tests for the course catalog backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool, "en"));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            default_locale: "en".to_string(),
            allowed_locales: vec!["en".to_string(), "fr".to_string()],
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    /// Seed a channel and a few tags.
    async fn seed(&self) {
        let (status, _) = self
            .post(
                "/api/channels",
                json!({ "youtubeChannelId": "UCrust", "name": "Rust Channel" }),
            )
            .await;
        assert_eq!(status, 200);

        for (kind, name) in [
            ("languages", "Rust"),
            ("frameworks", "Axum"),
            ("tools", "Cargo"),
            ("fundamentals", "Testing"),
        ] {
            let (status, _) = self
                .post(&format!("/api/tags/{}", kind), json!({ "name": name }))
                .await;
            assert_eq!(status, 200);
        }
    }

    async fn create_course(
        &self,
        name: &str,
        youtube_id: &str,
        locale: &str,
        published_at: &str,
    ) -> Value {
        let (status, body) = self
            .post(
                "/api/courses",
                json!({
                    "channelId": "UCrust",
                    "name": name,
                    "youtubeCourseId": youtube_id,
                    "locale": locale,
                    "publishedAt": published_at,
                    "languages": ["Rust"],
                    "frameworks": ["Axum"]
                }),
            )
            .await;
        assert_eq!(status, 200, "{body}");
        body["data"].clone()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_course_crud() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    // Create course
    let course = fixture
        .create_course("Rust Playlist", "PLabc", "en", "2024-01-01T00:00:00Z")
        .await;
    let course_id = course["id"].as_str().unwrap().to_string();
    assert_eq!(course["type"], "playlist");
    assert_eq!(course["url"], "https://www.youtube.com/playlist?list=PLabc");
    assert_eq!(course["channel"]["url"], "https://www.youtube.com/channel/UCrust");
    assert_eq!(course["languages"], json!(["Rust"]));
    assert_eq!(course["viewCount"], 0);

    // Get by id
    let (status, body) = fixture.get(&format!("/api/courses/{}", course_id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Rust Playlist");

    // Get by YouTube id
    let (status, body) = fixture.get("/api/courses/youtube/PLabc").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], course_id.as_str());

    // List
    let (status, body) = fixture.get("/api/courses").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/courses/{}", course_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = fixture.get(&format!("/api/courses/{}", course_id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_by_youtube_id_absent_is_null() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/courses/youtube/missing").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_create_course_errors() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    // Unknown channel
    let (status, body) = fixture
        .post(
            "/api/courses",
            json!({ "channelId": "UCnope", "name": "x", "youtubeCourseId": "x", "locale": "en" }),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Field validation
    let (status, body) = fixture
        .post(
            "/api/courses",
            json!({ "channelId": "UCrust", "name": "", "youtubeCourseId": "x" }),
        )
        .await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["name"].is_array());
    assert!(body["error"]["details"]["locale"].is_array());
    assert!(body["error"]["details"]["youtube_course_id"].is_null());
}

#[tokio::test]
async fn test_create_course_with_unknown_tag() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, body) = fixture
        .post(
            "/api/courses",
            json!({
                "channelId": "UCrust",
                "name": "Mystery",
                "youtubeCourseId": "vid42",
                "locale": "en",
                "languages": ["Rust", "Brainfuck"],
                "tools": ["Cargo"]
            }),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["languages"], json!(["Rust"]));
    assert_eq!(body["data"]["tools"], json!(["Cargo"]));
    assert_eq!(body["data"]["type"], "video");
}

#[tokio::test]
async fn test_search_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    fixture
        .create_course("Rust en français", "fr1", "fr", "2024-03-01T00:00:00Z")
        .await;
    fixture
        .create_course("Learn Rust", "en1", "en", "2024-01-01T00:00:00Z")
        .await;
    fixture
        .create_course("Advanced Rust", "en2", "en", "2024-02-01T00:00:00Z")
        .await;
    fixture
        .create_course("Rust auf Deutsch", "de1", "de", "2024-04-01T00:00:00Z")
        .await;

    // Default allow-list is en, fr; default locale en sorts first
    let (status, body) = fixture.get("/api/courses/search?search=RUST").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["limit"], 20);
    let names: Vec<_> = body["data"]["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Advanced Rust", "Learn Rust", "Rust en français"]);

    // Preferred locale and explicit allow-list
    let (_, body) = fixture
        .get("/api/courses/search?locale=de&locales=en,de&limit=1")
        .await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["courses"][0]["name"], "Rust auf Deutsch");

    // Tag filter
    let (_, body) = fixture
        .get("/api/courses/search?language=rust&framework=axum&tool=cargo")
        .await;
    assert_eq!(body["data"]["total"], 0);

    // Count
    let (status, body) = fixture
        .get("/api/courses/count?search=advanced&limit=1&offset=5")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_search_rejects_unknown_options() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/courses/search?page=2").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_OPTIONS");

    let (status, _) = fixture.get("/api/courses/search?limit=lots").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_increment_view_count() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let course = fixture
        .create_course("Learn Rust", "en1", "en", "2024-01-01T00:00:00Z")
        .await;
    let id = course["id"].as_str().unwrap();

    let (status, body) = fixture
        .post(&format!("/api/courses/{}/views", id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["viewCount"], 1);
    assert_eq!(body["data"]["url"], "https://www.youtube.com/video/en1");

    let (status, body) = fixture.post("/api/courses/nope/views", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_last_updated() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/courses/last-updated").await;
    assert_eq!(status, 200);
    assert!(body["data"].is_null());

    fixture.seed().await;
    fixture
        .create_course("Learn Rust", "en1", "en", "2024-01-01T00:00:00Z")
        .await;

    let (_, body) = fixture.get("/api/courses/last-updated").await;
    assert_eq!(body["data"], "Last updated just now");

    let (_, body) = fixture.get("/api/courses/last-updated?locale=es").await;
    assert_eq!(body["data"], "Última actualización justo ahora");
}

#[tokio::test]
async fn test_channels_and_tags() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, body) = fixture.get("/api/channels/UCrust").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Rust Channel");

    let (status, _) = fixture.get("/api/channels/UCmissing").await;
    assert_eq!(status, 404);

    let (status, body) = fixture.get("/api/tags/languages").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["name"], "Rust");
    assert_eq!(body["data"][0]["kind"], "language");

    let (status, body) = fixture.post("/api/tags/languages", json!({ "name": "Rust" })).await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["details"]["name"][0], "has already been taken");

    let (status, _) = fixture.get("/api/tags/colors").await;
    assert_eq!(status, 404);
}
