use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use workstream_api::config::AppConfig;
use workstream_auth::{SessionClaims, NO_ROLE};

const SECRET: &str = "black-box-secret";
const PASSWORD: &str = "correct horse battery staple";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory storage, ephemeral port.
        let mut config = AppConfig::in_memory(SECRET);
        config.password_cost = Some(4);
        let app = workstream_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, username: &str, password: &str) -> String {
        let res = self.login(username, password).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Provision a tenant through the public endpoint and log its owner in.
    async fn tenant(&self, company: &str) -> TestTenant {
        let owner = format!("owner-{}", uuid::Uuid::now_v7().simple());
        let res = self
            .client
            .post(self.url("/tenants"))
            .json(&json!({
                "tenant": {
                    "company_name": company,
                    "contact_email": format!("ops@{}.example", company.to_lowercase()),
                },
                "owner": { "username": owner, "password": PASSWORD },
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        let id = body["tenant"]["id"].as_i64().unwrap();
        let token = self.token_for(&owner, PASSWORD).await;
        TestTenant { id, owner, token }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct TestTenant {
    id: i64,
    owner: String,
    token: String,
}

fn claims(tenant_id: Option<i64>, role_id: &str, exp_offset: ChronoDuration) -> SessionClaims {
    let now = Utc::now();
    SessionClaims {
        sub: "mallory".into(),
        user_id: "999".into(),
        role: "Owner".into(),
        tenant_id: tenant_id.map(|id| id.to_string()),
        role_id: Some(role_id.to_string()),
        iss: "workstream".into(),
        aud: "workstream-api".into(),
        iat: (now - ChronoDuration::hours(1)).timestamp(),
        exp: (now + exp_offset).timestamp(),
        jti: uuid::Uuid::now_v7().to_string(),
    }
}

fn mint_jwt(secret: &str, claims: &SessionClaims) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

async fn id_of(res: reqwest::Response) -> i64 {
    let body: Value = res.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_require_a_token() {
    let server = TestServer::spawn().await;
    for path in ["/whoami", "/customers", "/roles", "/permissions", "/tenants/current"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(error_code(res).await, "unauthenticated");
    }
}

#[tokio::test]
async fn forged_expired_and_incomplete_tokens_are_rejected() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;

    let other_secret = mint_jwt("some-other-secret", &claims(Some(tenant.id), "1", ChronoDuration::minutes(10)));
    let expired = mint_jwt(SECRET, &claims(Some(tenant.id), "1", ChronoDuration::minutes(-10)));
    let no_tenant = mint_jwt(SECRET, &claims(None, "1", ChronoDuration::minutes(10)));

    for token in [other_secret, expired, no_tenant] {
        let res = server.get("/whoami", &token).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(res).await, "unauthenticated");
    }
}

#[tokio::test]
async fn guest_token_is_authenticated_but_holds_no_permission() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;
    let guest = mint_jwt(SECRET, &claims(Some(tenant.id), NO_ROLE, ChronoDuration::minutes(10)));

    let res = server.get("/whoami", &guest).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["role_id"].is_null());

    let res = server.get("/customers", &guest).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "forbidden");
}

#[tokio::test]
async fn login_issues_a_token_for_the_owner() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;

    let res = server.get("/whoami", &tenant.token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], tenant.owner.as_str());
    assert_eq!(body["role_name"], "Owner");
    assert_eq!(body["scope"]["tenant_id"], tenant.id);

    let res = server.get("/tenants/current", &tenant.token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["company_name"], "Alpha");

    let res = server.login(&tenant.owner, "wrong password").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = server.login("nobody-by-that-name", PASSWORD).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provisioning_rejects_bad_input_and_duplicate_owners() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;

    let res = server
        .client
        .post(server.url("/tenants"))
        .json(&json!({
            "tenant": { "company_name": "Beta", "contact_email": "not-an-email" },
            "owner": { "username": "beta-owner", "password": PASSWORD },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");

    let res = server
        .client
        .post(server.url("/tenants"))
        .json(&json!({
            "tenant": { "company_name": "Beta", "contact_email": "ops@beta.example" },
            "owner": { "username": tenant.owner, "password": PASSWORD },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn customers_are_isolated_between_tenants() {
    let server = TestServer::spawn().await;
    let a = server.tenant("Alpha").await;
    let b = server.tenant("Beta").await;

    let res = server
        .post("/customers", &a.token, json!({ "name": "Acme", "email": "buyer@acme.example" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = id_of(res).await;
    let path = format!("/customers/{id}");

    assert_eq!(server.get(&path, &a.token).await.status(), StatusCode::OK);

    // Another tenant sees nothing, not even a 403.
    assert_eq!(server.get(&path, &b.token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        server.put(&path, &b.token, json!({ "name": "Hijacked" })).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(server.delete(&path, &b.token).await.status(), StatusCode::NOT_FOUND);
    let listed: Value = server.get("/customers", &b.token).await.json().await.unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 0);

    let res = server.get(&path, &a.token).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Acme");

    assert_eq!(server.delete(&path, &a.token).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.get(&path, &a.token).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_grants_decide_access() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;

    let roles: Value = server.get("/roles", &tenant.token).await.json().await.unwrap();
    let user_role = roles["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "User")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let res = server
        .post(
            "/users",
            &tenant.token,
            json!({ "username": "clerk", "password": PASSWORD, "role_id": user_role }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("credential_hash").is_none());

    let clerk = server.token_for("clerk", PASSWORD).await;
    assert_eq!(server.get("/customers", &clerk).await.status(), StatusCode::FORBIDDEN);

    let role_path = format!("/roles/{user_role}");
    let res = server
        .put(&role_path, &tenant.token, json!({ "permission_names": ["NoSuchPermission"] }))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(res).await, "permission_not_found");

    let res = server
        .put(&role_path, &tenant.token, json!({ "permission_names": ["CustomerManagement"] }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["permission_names"], json!(["CustomerManagement"]));

    // Grants are read on every request, so the existing token picks them up.
    assert_eq!(server.get("/customers", &clerk).await.status(), StatusCode::OK);
    assert_eq!(server.get("/orders", &clerk).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.get("/roles", &clerk).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn roles_of_another_tenant_cannot_be_used() {
    let server = TestServer::spawn().await;
    let a = server.tenant("Alpha").await;
    let b = server.tenant("Beta").await;

    let res = server
        .post("/roles", &a.token, json!({ "name": "Sales", "permission_names": ["OrderManagement"] }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let role = id_of(res).await;

    assert_eq!(
        server.get(&format!("/roles/{role}"), &b.token).await.status(),
        StatusCode::NOT_FOUND
    );
    let res = server
        .post(
            "/users",
            &b.token,
            json!({ "username": "intruder", "password": PASSWORD, "role_id": role }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .post("/roles", &a.token, json!({ "name": "Sales", "permission_names": [] }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn inventory_stock_and_orders_flow() {
    let server = TestServer::spawn().await;
    let a = server.tenant("Alpha").await;
    let b = server.tenant("Beta").await;

    let res = server
        .post(
            "/inventory/items",
            &a.token,
            json!({ "name": "Blue Widget", "description": "small", "price_cents": 1250 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let item = id_of(res).await;

    let found: Value = server
        .get("/inventory/items/search?name=widget", &a.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found["items"].as_array().unwrap().len(), 1);
    let found: Value = server
        .get("/inventory/items/search?name=widget", &b.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found["items"].as_array().unwrap().len(), 0);

    let res = server
        .post(
            "/stock",
            &a.token,
            json!({
                "inventory_item_id": item,
                "quantity": 40,
                "manufacturing_date": "2026-01-01",
                "expiration_date": "2027-01-01",
                "batch_number": "B-001",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inventory_item_name"], "Blue Widget");
    let stock = body["id"].as_i64().unwrap();

    let res = server
        .put(&format!("/stock/{stock}"), &a.token, json!({ "expiration_date": "2025-06-01" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        server.get(&format!("/stock/{stock}"), &b.token).await.status(),
        StatusCode::NOT_FOUND
    );
    let listed: Value = server
        .get(&format!("/inventory/items/{item}/stock"), &a.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let customer = id_of(
        server
            .post("/customers", &a.token, json!({ "name": "Acme", "email": "buyer@acme.example" }))
            .await,
    )
    .await;

    // Another tenant's customer is invisible to order creation.
    let res = server.post("/orders", &b.token, json!({ "customer_id": customer })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.post("/orders", &a.token, json!({ "customer_id": customer })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    let order = body["id"].as_i64().unwrap();

    let lines = format!("/orders/{order}/items");
    let res = server
        .post(&lines, &a.token, json!({ "inventory_item_id": item, "quantity": 3 }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["price_cents"], 1250);

    let res = server
        .post(&lines, &b.token, json!({ "inventory_item_id": item, "quantity": 1 }))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .put(&format!("/orders/{order}"), &a.token, json!({ "status": "shipped" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get(&format!("/orders/{order}"), &a.token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "shipped");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    assert_eq!(
        server.get(&format!("/orders/{order}"), &b.token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn deleting_a_tenant_removes_its_accounts() {
    let server = TestServer::spawn().await;
    let a = server.tenant("Alpha").await;
    let b = server.tenant("Beta").await;

    assert_eq!(server.delete("/tenants/current", &a.token).await.status(), StatusCode::NO_CONTENT);

    assert_eq!(server.login(&a.owner, PASSWORD).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        server.get("/tenants/current", &a.token).await.status(),
        StatusCode::NOT_FOUND
    );

    assert_eq!(server.get("/tenants/current", &b.token).await.status(), StatusCode::OK);
    assert_eq!(server.login(&b.owner, PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn permission_catalog_is_readable_by_any_session() {
    let server = TestServer::spawn().await;
    let tenant = server.tenant("Alpha").await;
    let guest = mint_jwt(SECRET, &claims(Some(tenant.id), NO_ROLE, ChronoDuration::minutes(10)));

    let res = server.get("/permissions", &guest).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let first = body["items"][0]["id"].as_i64().unwrap();

    assert_eq!(
        server.get(&format!("/permissions/{first}"), &guest).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        server.get("/permissions/987654", &guest).await.status(),
        StatusCode::NOT_FOUND
    );
}
