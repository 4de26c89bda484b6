//! Integration tests for the library backend.

use std::path::Path;
use std::sync::Arc;

use reqwest::{Client, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::TokenService;
use crate::config::{Config, Environment};
use crate::services::LibraryService;
use crate::store::Stores;
use crate::{create_router, AppState};

const TEST_SECRET: &str = "integration-secret";

fn seed_books() -> Value {
    json!([
        {
            "id": "1",
            "title": "The Hobbit",
            "author": "J.R.R. Tolkien",
            "year": 1937,
            "genre": "Fantasy",
            "isbn": "978-0547928227",
            "addedDate": "2023-03-14T10:00:00Z"
        },
        {
            "id": "2",
            "title": "Beloved",
            "author": "Toni Morrison",
            "year": 1987,
            "genre": "Fiction",
            "isbn": "978-1400033416",
            "description": "A Pulitzer Prize-winning novel.",
            "addedDate": "2024-01-02T09:30:00Z"
        }
    ])
}

fn write_data_files(dir: &Path) {
    std::fs::write(dir.join("users.json"), json!({ "users": [] }).to_string()).unwrap();
    std::fs::write(
        dir.join("books.json"),
        json!({ "books": seed_books() }).to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("events.json"), json!({ "events": [] }).to_string()).unwrap();
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write_data_files(temp_dir.path());

        let config = Config {
            environment: Environment::Development,
            jwt_secret: Some(TEST_SECRET.to_string()),
            token_ttl_secs: TokenService::DEFAULT_TTL_SECS,
            data_dir: temp_dir.path().to_path_buf(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            allowed_origins: Vec::new(),
        };

        let tokens = Arc::new(TokenService::new(TEST_SECRET, config.token_ttl_secs));
        let stores = Stores::load(&config.data_dir)
            .await
            .expect("Failed to load stores");
        let library = Arc::new(LibraryService::new(stores, tokens.clone()));

        let state = AppState {
            library,
            tokens,
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
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn data_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(name)).unwrap()
    }

    async fn register(&self, email: &str, password: &str, role: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password, "role": role }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Register an account with the given role and return a token for it.
    async fn token_for(&self, role: &str) -> String {
        let email = format!("{}@library.test", role);
        let resp = self.register(&email, "secret1", role).await;
        assert_eq!(resp.status(), 201);

        let resp = self.login(&email, "secret1").await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Herbert",
        "year": 1965,
        "genre": "SciFi",
        "isbn": "123"
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(format!("{}/health", fixture.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_register_login_and_list_seeded_books() {
    let fixture = TestFixture::new().await;

    let resp = fixture.register("a@x.com", "secret1", "member").await;
    assert_eq!(resp.status(), 201);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["email"], "a@x.com");
    assert_eq!(user["role"], "member");
    assert!(user["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    let resp = fixture.login("a@x.com", "secret1").await;
    assert_eq!(resp.status(), 200);
    let login: Value = resp.json().await.unwrap();
    assert_eq!(login["role"], "member");
    let token = login["token"].as_str().unwrap();

    let resp = fixture.get("/books", token).await;
    assert_eq!(resp.status(), 200);
    let books: Value = resp.json().await.unwrap();
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["The Hobbit", "Beloved"]);
}

#[tokio::test]
async fn test_admin_book_lifecycle() {
    let fixture = TestFixture::new().await;
    let token = fixture.token_for("admin").await;

    let resp = fixture
        .client
        .post(fixture.url("/books"))
        .bearer_auth(&token)
        .json(&dune())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["year"], 1965);
    assert!(created["addedDate"].is_string());

    let resp = fixture.get(&format!("/books/{}", id), &token).await;
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched, created);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/books/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.get(&format!("/books/{}", id), &token).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_non_admin_cannot_create_book() {
    let fixture = TestFixture::new().await;

    for role in ["member", "staff"] {
        let token = fixture.token_for(role).await;

        let resp = fixture
            .client
            .post(fixture.url("/books"))
            .bearer_auth(&token)
            .json(&dune())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        let resp = fixture.get("/books", &token).await;
        let books: Value = resp.json().await.unwrap();
        assert_eq!(books, seed_books());
    }
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let fixture = TestFixture::new().await;
    fixture.register("a@x.com", "secret1", "member").await;

    let resp = fixture.login("a@x.com", "wrong-password").await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body.get("token").is_none());
    assert_eq!(body["error"], "Invalid email or password");

    let resp = fixture.login("nobody@x.com", "secret1").await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/books"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authorization header missing");

    let resp = fixture
        .client
        .get(fixture.url("/events"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture.get("/stats/user-roles", "not.a.token").await;
    assert_eq!(resp.status(), 401);

    // Signed with another secret
    let foreign = TokenService::new("some-other-secret", 3600)
        .issue("1", crate::models::Role::Admin)
        .unwrap();
    let resp = fixture.get("/books", &foreign).await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let fixture = TestFixture::new().await;

    let resp = fixture.register("a@x.com", "secret1", "member").await;
    assert_eq!(resp.status(), 201);

    let resp = fixture.register("a@x.com", "another1", "staff").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Email already exists");

    let resp = fixture.register("b@x.com", "123", "member").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "\"password\" length must be at least 6 characters long"
    );

    let resp = fixture.register("not-an-email", "secret1", "member").await;
    assert_eq!(resp.status(), 400);

    let resp = fixture.register("c@x.com", "secret1", "librarian").await;
    assert_eq!(resp.status(), 400);

    // Only the first registration was stored
    let token = fixture.login("a@x.com", "secret1").await;
    let token: Value = token.json().await.unwrap();
    let resp = fixture
        .get("/stats/user-roles", token["token"].as_str().unwrap())
        .await;
    let roles: Value = resp.json().await.unwrap();
    assert_eq!(roles, json!({ "member": 1 }));
}

#[tokio::test]
async fn test_update_book() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;
    let member = fixture.token_for("member").await;

    let resp = fixture
        .client
        .put(fixture.url("/books/1"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "The Hobbit, or There and Back Again", "image": "https://covers.example.org/hobbit.jpg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["id"], "1");
    assert_eq!(updated["title"], "The Hobbit, or There and Back Again");
    assert_eq!(updated["author"], "J.R.R. Tolkien");
    assert_eq!(updated["image"], "https://covers.example.org/hobbit.jpg");

    let resp = fixture
        .client
        .put(fixture.url("/books/1"))
        .bearer_auth(&admin)
        .json(&json!({ "year": "nineteen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "\"year\" must be a number");

    let resp = fixture
        .client
        .put(fixture.url("/books/999"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .put(fixture.url("/books/1"))
        .bearer_auth(&member)
        .json(&json!({ "title": "Defaced" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture.get("/books/1", &member).await;
    let book: Value = resp.json().await.unwrap();
    assert_eq!(book, updated);
}

#[tokio::test]
async fn test_delete_twice_returns_not_found() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;

    let first = fixture
        .client
        .delete(fixture.url("/books/2"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    for _ in 0..2 {
        let resp = fixture
            .client
            .delete(fixture.url("/books/2"))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_event_crud() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;
    let staff = fixture.token_for("staff").await;

    let resp = fixture
        .client
        .post(fixture.url("/events"))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Summer reading kickoff",
            "date": "2999-06-21T10:00",
            "location": "Children's corner",
            "description": "Games and prizes",
            "image": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let event: Value = resp.json().await.unwrap();
    let id = event["id"].as_str().unwrap().to_string();
    assert_eq!(event["isUpcoming"], true);
    assert!(event.get("image").is_none());

    let resp = fixture
        .client
        .post(fixture.url("/events"))
        .bearer_auth(&staff)
        .json(&json!({ "title": "x", "date": "2999-01-01", "location": "y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/events/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "location": "Main hall" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["location"], "Main hall");
    assert_eq!(updated["title"], "Summer reading kickoff");

    let resp = fixture.get("/events", &staff).await;
    let events: Value = resp.json().await.unwrap();
    assert_eq!(events.as_array().unwrap().len(), 1);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/events/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.get(&format!("/events/{}", id), &staff).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_stats_endpoints() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;
    let member = fixture.token_for("member").await;

    let resp = fixture.get("/stats/monthly-books", &member).await;
    assert_eq!(resp.status(), 200);
    let per_year: Value = resp.json().await.unwrap();
    assert_eq!(per_year, json!({ "2023": 1, "2024": 1 }));

    let resp = fixture.get("/stats/user-roles", &admin).await;
    assert_eq!(resp.status(), 200);
    let roles: Value = resp.json().await.unwrap();
    assert_eq!(roles, json!({ "admin": 1, "member": 1 }));
}

#[tokio::test]
async fn test_mutations_are_written_to_disk() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;

    let users = fixture.data_file("users.json");
    assert!(users.contains("admin@library.test"));
    assert!(!users.contains("secret1"));

    let resp = fixture
        .client
        .post(fixture.url("/books"))
        .bearer_auth(&admin)
        .json(&dune())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let books: Value = serde_json::from_str(&fixture.data_file("books.json")).unwrap();
    let titles: Vec<&str> = books["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["The Hobbit", "Beloved", "Dune"]);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let fixture = TestFixture::new().await;
    let admin = fixture.token_for("admin").await;

    let resp = fixture
        .client
        .post(fixture.url("/books"))
        .bearer_auth(&admin)
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = fixture
        .client
        .post(fixture.url("/books"))
        .bearer_auth(&admin)
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_json_404() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/shelves"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Endpoint not found");
}
