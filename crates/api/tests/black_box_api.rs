use std::collections::HashMap;

use assetdesk_auth::{JwtClaims, Role};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _storage: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        let storage = tempfile::tempdir().expect("failed to create storage dir");
        let storage_path = storage.path().to_string_lossy().to_string();

        let vars: HashMap<&str, String> = HashMap::from([
            ("JWT_SECRET", JWT_SECRET.to_string()),
            ("ADMIN_USER", "admin".to_string()),
            ("ADMIN_PASS", "admin-pass".to_string()),
            ("USER_USER", "viewer".to_string()),
            ("USER_PASS", "viewer-pass".to_string()),
            ("ENABLE_SERVER_STORAGE", "true".to_string()),
            ("STORAGE_PATH", storage_path),
        ]);
        let config = assetdesk_api::ApiConfig::from_lookup(|k| vars.get(k).cloned())
            .expect("valid test config");
        assert!(config.database.is_none(), "tests run against the in-memory backend");

        // Same router as prod, bound to an ephemeral port.
        let (app, _services) = assetdesk_api::app::build_app(&config)
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
            handle,
            _storage: storage,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(username: &str, role: Role) -> String {
    let claims = JwtClaims::new(username, None, role, Utc::now(), ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_item(client: &reqwest::Client, server: &TestServer, token: &str, sku: &str, stock: i64) -> Value {
    let res = client
        .post(server.url("/api/inventory"))
        .bearer_auth(token)
        .json(&json!({ "sku": sku, "name": format!("{sku} part"), "category": "STORAGE", "stock": stock, "minStock": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_and_storage_status_are_public() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/storage/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["enabled"], true);
    assert_eq!(body["gitBackup"], false);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/assets")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(server.url("/api/assets"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_usable_token() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "admin-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "admin");
    let token = body["token"].as_str().unwrap().to_string();

    let res = client
        .get(server.url("/api/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
    assert!(body["userId"].is_string());
}

#[tokio::test]
async fn read_only_role_cannot_mutate() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt("admin", Role::admin());
    let viewer = mint_jwt("viewer", Role::user());

    let item = create_item(&client, &server, &admin, "SSD-1TB", 10).await;
    let id = item["id"].as_str().unwrap();

    let res = client
        .post(server.url(&format!("/api/inventory/{id}/move")))
        .bearer_auth(&viewer)
        .json(&json!({ "type": "OUT", "qty": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = client
        .post(server.url("/api/assets"))
        .bearer_auth(&viewer)
        .json(&json!({ "assetTag": "LT-1", "name": "Laptop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reads are fine.
    let res = client
        .get(server.url(&format!("/api/inventory/{id}")))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 10);
}

#[tokio::test]
async fn movement_lifecycle_updates_stock_and_history() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin", Role::admin());

    let item = create_item(&client, &server, &token, "RAM-16G", 10).await;
    let id = item["id"].as_str().unwrap();

    let res = client
        .post(server.url(&format!("/api/inventory/{id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "IN", "qty": 5, "ref": "PO-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 15);

    let res = client
        .post(server.url(&format!("/api/inventory/{id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "ADJUST", "qty": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 7);

    // OUT beyond stock: rejected, stock unchanged.
    let res = client
        .post(server.url(&format!("/api/inventory/{id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "OUT", "qty": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_state");

    let res = client
        .post(server.url(&format!("/api/inventory/{id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "OUT", "qty": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url(&format!("/api/inventory/{id}/movements")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let movements = body["movements"].as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0]["type"], "ADJUST");
    assert_eq!(movements[1]["type"], "IN");
    assert_eq!(movements[1]["ref"], "PO-1");
    assert_eq!(movements[1]["createdBy"], "admin");

    let res = client
        .get(server.url(&format!("/api/inventory/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 7);
}

#[tokio::test]
async fn linked_out_movement_is_audited_on_both_entities() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin", Role::admin());

    let res = client
        .post(server.url("/api/assets"))
        .bearer_auth(&token)
        .json(&json!({ "assetTag": "SRV-01", "name": "Rack server", "type": "SERVER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let asset: Value = res.json().await.unwrap();
    let asset_id = asset["id"].as_str().unwrap();

    let item = create_item(&client, &server, &token, "NIC-10G", 4).await;
    let item_id = item["id"].as_str().unwrap();

    let res = client
        .post(server.url(&format!("/api/inventory/{item_id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "OUT", "qty": 1, "ref": "INC-42", "targetAssetId": asset_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url(&format!("/api/activity?entityType=ASSET&entityId={asset_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs[0]["action"], "ASSET_MOVE");
    assert_eq!(logs[0]["meta"]["qty"], 1);
    assert_eq!(logs[0]["meta"]["ref"], "INC-42");
    assert_eq!(logs[1]["action"], "ASSET_CREATE");

    let res = client
        .get(server.url(&format!("/api/activity?entityType=INVENTORY&entityId={item_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs[0]["action"], "INVENTORY_MOVE");
    assert_eq!(logs[0]["meta"]["stockBefore"], 4);
    assert_eq!(logs[0]["meta"]["stockAfter"], 3);
    assert_eq!(logs[0]["meta"]["targetAssetId"], asset_id);

    // Missing target asset: not found, nothing applied.
    let res = client
        .post(server.url(&format!("/api/inventory/{item_id}/move")))
        .bearer_auth(&token)
        .json(&json!({ "type": "OUT", "qty": 1, "targetAssetId": uuid::Uuid::now_v7() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_and_duplicates_map_to_client_errors() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt("admin", Role::admin());

    let res = client
        .get(server.url("/api/inventory/not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    create_item(&client, &server, &token, "DUP-1", 1).await;
    let res = client
        .post(server.url("/api/inventory"))
        .bearer_auth(&token)
        .json(&json!({ "sku": "DUP-1", "name": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn diagrams_round_trip_through_file_storage() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt("admin", Role::admin());
    let viewer = mint_jwt("viewer", Role::user());

    let res = client
        .post(server.url("/api/diagrams"))
        .bearer_auth(&admin)
        .json(&json!({ "id": "rack_a", "name": "Rack A", "cells": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], "rack_a");

    let res = client
        .get(server.url("/api/diagrams"))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: Value = res.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Rack A");

    let res = client
        .delete(server.url("/api/diagrams/rack_a"))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url("/api/diagrams/rack_a"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url("/api/diagrams/rack_a"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
