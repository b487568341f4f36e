use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sitecraft_api::auth::encode_token;
use sitecraft_api::config::AppConfig;
use sitecraft_api::{app, build_default_state};
use sitecraft_core::store::{MemoryStore, Store};
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestApp {
    base: String,
    client: reqwest::Client,
    token: String,
}

impl TestApp {
    async fn spawn() -> Self {
        let config = AppConfig::local(SECRET);
        let state = build_default_state(Store::Memory(MemoryStore::new()), config)
            .await
            .unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            token: encode_token(SECRET, "editor@example.com", "editor", Duration::hours(1)).unwrap(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(&format!("/v1/admin{path}")))
            .bearer_auth(&self.token)
    }

    async fn create_page(&self, body: Value) -> Value {
        let resp = self
            .admin(reqwest::Method::POST, "/pages")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn patch_page(&self, id: &str, body: Value) -> Value {
        let resp = self
            .admin(reqwest::Method::PATCH, &format!("/pages/{id}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }
}

#[tokio::test]
async fn health_reports_memory_backend() {
    let app = TestApp::spawn().await;
    let body: Value = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn admin_routes_require_a_builder_role() {
    let app = TestApp::spawn().await;

    let anonymous = app.client.get(app.url("/v1/admin/pages")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let body: Value = anonymous.json().await.unwrap();
    assert_eq!(body["error"]["type"], "unauthorized");

    let forged = app
        .client
        .get(app.url("/v1/admin/pages"))
        .bearer_auth(encode_token("other-secret", "x", "admin", Duration::hours(1)).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let viewer = app
        .client
        .get(app.url("/v1/admin/pages"))
        .bearer_auth(encode_token(SECRET, "v@example.com", "viewer", Duration::hours(1)).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(viewer.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_rejects_taken_and_malformed_slugs() {
    let app = TestApp::spawn().await;
    let page = app.create_page(json!({ "title": "Roofing", "slug": "roofing" })).await;
    assert_eq!(page["status"], "draft");
    assert_eq!(page["pageType"], "landing");

    let taken = app
        .admin(reqwest::Method::POST, "/pages")
        .json(&json!({ "title": "Roofing again", "slug": "roofing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(taken.status(), StatusCode::CONFLICT);

    let malformed = app
        .admin(reqwest::Method::POST, "/pages")
        .json(&json!({ "title": "Bad", "slug": "Bad Slug!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: Value = malformed.json().await.unwrap();
    assert_eq!(body["error"]["type"], "validationError");
    assert_eq!(body["error"]["fields"][0]["field"], "slug");

    let not_json = app
        .admin(reqwest::Method::POST, "/pages")
        .header("content-type", "application/json")
        .body("{ nope")
        .send()
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrongly_typed_fields_are_reported_per_field() {
    let app = TestApp::spawn().await;

    let wrong_type = app
        .admin(reqwest::Method::POST, "/pages")
        .json(&json!({ "title": 5, "slug": "ok" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let body: Value = wrong_type.json().await.unwrap();
    assert_eq!(body["error"]["type"], "validationError");
    assert_eq!(body["error"]["fields"][0]["field"], "title");

    let missing = app
        .admin(reqwest::Method::POST, "/pages")
        .json(&json!({ "title": "No slug" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"]["fields"][0]["field"], "slug");
}

#[tokio::test]
async fn publishing_records_the_last_draft_as_a_revision() {
    let app = TestApp::spawn().await;
    let page = app.create_page(json!({ "title": "Draft title", "slug": "gutters" })).await;
    let id = page["id"].as_str().unwrap();

    let published = app
        .patch_page(id, json!({ "title": "Live title", "status": "published" }))
        .await;
    assert_eq!(published["status"], "published");
    assert!(published["publishedAt"].is_string());

    let revisions: Value = app
        .admin(reqwest::Method::GET, &format!("/pages/{id}/revisions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let revisions = revisions.as_array().unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0]["message"], "Auto-snapshot before publish");
    assert_eq!(revisions[0]["snapshot"]["title"], "Draft title");
    assert_eq!(revisions[0]["snapshot"]["status"], "draft");
}

#[tokio::test]
async fn restore_brings_back_revision_content() {
    let app = TestApp::spawn().await;
    let page = app.create_page(json!({ "title": "Original", "slug": "siding" })).await;
    let id = page["id"].as_str().unwrap();

    let revision: Value = app
        .admin(reqwest::Method::POST, &format!("/pages/{id}/revisions"))
        .json(&json!({ "message": "before rewrite" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rev_id = revision["id"].as_str().unwrap();

    app.patch_page(id, json!({ "title": "Rewritten" })).await;

    let diff: Value = app
        .admin(reqwest::Method::GET, &format!("/pages/{id}/revisions/{rev_id}/diff"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let diff = diff["diff"].as_str().unwrap();
    assert!(diff.contains("-  \"title\": \"Original\""));
    assert!(diff.contains("+  \"title\": \"Rewritten\""));

    let restored: Value = app
        .admin(reqwest::Method::POST, &format!("/pages/{id}/revisions/{rev_id}/restore"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(restored["title"], "Original");

    let unlabelled = app
        .admin(reqwest::Method::POST, &format!("/pages/{id}/revisions"))
        .send()
        .await
        .unwrap();
    assert_eq!(unlabelled.status(), StatusCode::CREATED);

    let other = app.create_page(json!({ "title": "Other", "slug": "other" })).await;
    let other_id = other["id"].as_str().unwrap();
    let foreign = app
        .admin(
            reqwest::Method::POST,
            &format!("/pages/{other_id}/revisions/{rev_id}/restore"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn drafts_are_public_only_through_a_preview_token() {
    let app = TestApp::spawn().await;
    let page = app
        .create_page(json!({
            "title": "Decks",
            "slug": "services/decks",
            "blocks": [
                { "id": Uuid::new_v4(), "type": "hero", "props": { "headline": "Decks" } },
                { "id": Uuid::new_v4(), "type": "faq", "props": {}, "meta": { "hidden": true } }
            ]
        }))
        .await;
    let id = page["id"].as_str().unwrap();
    let public_url = app.url("/v1/public/pages/services/decks");

    let hidden = app.client.get(&public_url).send().await.unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);
    let missing = app
        .client
        .get(app.url("/v1/public/pages/nowhere"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let hidden_body: Value = hidden.json().await.unwrap();
    let missing_body: Value = missing.json().await.unwrap();
    assert_eq!(hidden_body, missing_body);

    let link: Value = app
        .admin(reqwest::Method::POST, &format!("/pages/{id}/preview-token"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(link["slug"], "services/decks");
    assert_eq!(link["expiresIn"], 900);
    let token = link["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);

    let preview = app
        .client
        .get(&public_url)
        .query(&[("previewToken", token)])
        .send()
        .await
        .unwrap();
    assert_eq!(preview.status(), StatusCode::OK);
    assert_eq!(preview.headers()["cache-control"], "no-store");
    assert_eq!(preview.headers()["x-robots-tag"], "noindex");
    let body: Value = preview.json().await.unwrap();
    assert_eq!(body["isPreview"], true);
    assert_eq!(body["document"]["blocks"].as_array().unwrap().len(), 1);

    let wrong = app
        .client
        .get(&public_url)
        .query(&[("previewToken", "not-a-token")])
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);

    app.patch_page(id, json!({ "status": "published" })).await;
    let live = app.client.get(&public_url).send().await.unwrap();
    assert_eq!(live.status(), StatusCode::OK);
    assert!(live.headers().get("x-robots-tag").is_none());
    let body: Value = live.json().await.unwrap();
    assert_eq!(body["isPreview"], false);
}

#[tokio::test]
async fn block_registry_endpoints() {
    let app = TestApp::spawn().await;

    let blocks: Value = app
        .admin(reqwest::Method::GET, "/blocks?search=HERO")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blocks[0]["key"], "hero");

    let grouped: Value = app
        .admin(reqwest::Method::GET, "/blocks?grouped=true")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(grouped.as_array().unwrap().iter().all(|c| c["category"].is_string()));

    let created = app
        .admin(reqwest::Method::POST, "/blocks")
        .json(&json!({ "key": "price_table", "name": "Price table" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let system = app
        .admin(reqwest::Method::DELETE, "/blocks/hero")
        .send()
        .await
        .unwrap();
    assert_eq!(system.status(), StatusCode::FORBIDDEN);

    let custom = app
        .admin(reqwest::Method::DELETE, "/blocks/price_table")
        .send()
        .await
        .unwrap();
    assert_eq!(custom.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn warnings_flag_an_empty_page() {
    let app = TestApp::spawn().await;
    let page = app.create_page(json!({ "title": "Empty", "slug": "empty" })).await;
    let id = page["id"].as_str().unwrap();

    let body: Value = app
        .admin(reqwest::Method::GET, &format!("/pages/{id}/warnings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let warnings: Vec<&str> = body["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(warnings.contains(&"Missing headline: add a hero headline or a rich text block."));
    assert!(warnings.contains(&"Missing meta description."));

    let draft: Value = app
        .admin(reqwest::Method::POST, "/pages/validate")
        .json(&json!({
            "title": "Draft",
            "blocks": [{ "id": Uuid::new_v4(), "type": "cta_band", "props": { "href": "javascript:alert(1)" } }]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(draft["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w.as_str().unwrap().contains("invalid link")));
}
