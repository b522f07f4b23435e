//! End-to-end API coverage against a mock HTTP server

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seva_client::{
    ApiClient, ClientConfigBuilder, ClientError, CredentialStore, HttpTransport,
    MemoryCredentialStore, ReqwestTransport, Sender, ACCESS_TOKEN_KEY, CACHED_USER_KEY,
    REFRESH_TOKEN_KEY,
};

fn client_for(server_uri: &str, store: &Arc<MemoryCredentialStore>) -> ApiClient {
    let config = ClientConfigBuilder::new()
        .api_base_url(format!("{}/api/v1", server_uri))
        .timeout_secs(5)
        .build()
        .unwrap();

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config).unwrap());
    let credentials: Arc<dyn CredentialStore> = store.clone();
    ApiClient::with_parts(config, transport, credentials)
}

fn user_json(email: &str) -> serde_json::Value {
    json!({
        "id": "7b1c9a6e-90cc-4a70-a1e9-6d2a93c65f10",
        "email": email,
        "full_name": "Edna Walker",
        "role": "elder",
        "is_active": true,
        "is_verified": true,
        "created_at": "2025-01-04T10:30:00Z",
        "last_login_at": "2025-02-10T08:00:00Z",
        "profile": null
    })
}

fn message_json(session: &str, content: &str, sender: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "session_id": session,
        "user_id": "7b1c9a6e-90cc-4a70-a1e9-6d2a93c65f10",
        "content": content,
        "sender": sender,
        "sentiment_score": null,
        "sentiment_label": null,
        "health_signals": [],
        "tokens_used": 42,
        "created_at": "2025-02-10T08:01:00Z",
        "metadata": {}
    })
}

#[tokio::test]
async fn test_login_persists_token_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({
            "email": "edna@example.com",
            "password": "hunter2hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&server.uri(), &store);

    let pair = client
        .auth()
        .login("edna@example.com", "hunter2hunter2")
        .await
        .unwrap();

    assert_eq!(pair.token_type, "bearer");
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).await.unwrap(),
        Some("a1".to_string())
    );
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).await.unwrap(),
        Some("r1".to_string())
    );
}

#[tokio::test]
async fn test_register_decodes_created_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json("edna@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&server.uri(), &store);

    let user = client
        .auth()
        .register("edna@example.com", "hunter2hunter2", "Edna Walker")
        .await
        .unwrap();

    assert_eq!(user.email, "edna@example.com");
    assert_eq!(user.role, "elder");
    // Registration alone does not create a session.
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("Authorization", "Bearer stale_a"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"refresh_token": "old_r"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_a",
            "refresh_token": "new_r",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("Authorization", "Bearer new_a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("edna@example.com")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.set(ACCESS_TOKEN_KEY, "stale_a").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "old_r").await.unwrap();
    let client = client_for(&server.uri(), &store);

    let user = client.auth().me().await.unwrap();

    assert_eq!(user.email, "edna@example.com");
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).await.unwrap(),
        Some("new_a".to_string())
    );
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).await.unwrap(),
        Some("new_r".to_string())
    );
    // Successful fetch caches the user for offline fallback.
    assert!(store.get(CACHED_USER_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Could not validate credentials"
            })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Invalid refresh token"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.set(ACCESS_TOKEN_KEY, "stale_a").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "bad_r").await.unwrap();
    store.set(CACHED_USER_KEY, "{}").await.unwrap();
    let client = client_for(&server.uri(), &store);

    let err = client.auth().me().await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired(_)));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(CACHED_USER_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_me_falls_back_to_cached_user_when_server_unreachable() {
    // Bind an ephemeral port, then drop the listener so the address refuses
    // connections.
    let dead_uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let store = Arc::new(MemoryCredentialStore::new());
    store.set(ACCESS_TOKEN_KEY, "a1").await.unwrap();
    store
        .set(
            CACHED_USER_KEY,
            &user_json("edna@example.com").to_string(),
        )
        .await
        .unwrap();
    let client = client_for(&dead_uri, &store);

    let user = client.auth().me().await.unwrap();
    assert_eq!(user.email, "edna@example.com");
}

#[tokio::test]
async fn test_logout_clears_credentials_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Internal server error"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.set(ACCESS_TOKEN_KEY, "a1").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "r1").await.unwrap();
    store.set(CACHED_USER_KEY, "{}").await.unwrap();
    let client = client_for(&server.uri(), &store);

    client.auth().logout().await.unwrap();

    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(CACHED_USER_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_chat_send_and_session_listing() {
    let server = MockServer::start().await;
    let session_id = "95c4f1b2-6a1a-4a9b-b7a3-36b0dc2ff8aa";

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/send"))
        .and(header("Authorization", "Bearer a1"))
        .and(body_json(json!({"message": "Good morning"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": session_id,
            "user_message": message_json(session_id, "Good morning", "user"),
            "ai_message": message_json(session_id, "Good morning, Edna!", "ai")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/chat/sessions"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [{
                "id": session_id,
                "user_id": "7b1c9a6e-90cc-4a70-a1e9-6d2a93c65f10",
                "title": "Morning check-in",
                "started_at": "2025-02-10T08:00:00Z",
                "ended_at": null,
                "message_count": 2,
                "is_active": true,
                "metadata": {}
            }],
            "total": 1,
            "page": 1,
            "page_size": 20
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/chat/sessions/{}", session_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": session_id,
            "user_id": "7b1c9a6e-90cc-4a70-a1e9-6d2a93c65f10",
            "title": "Morning check-in",
            "started_at": "2025-02-10T08:00:00Z",
            "ended_at": null,
            "message_count": 2,
            "is_active": true,
            "metadata": {},
            "messages": [
                message_json(session_id, "Good morning", "user"),
                message_json(session_id, "Good morning, Edna!", "ai")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/chat/sessions/{}", session_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Session deleted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.set(ACCESS_TOKEN_KEY, "a1").await.unwrap();
    let client = client_for(&server.uri(), &store);
    let id: Uuid = session_id.parse().unwrap();

    let reply = client.chat().send("Good morning", None).await.unwrap();
    assert_eq!(reply.user_message.sender, Sender::User);
    assert_eq!(reply.ai_message.sender, Sender::Ai);
    assert_eq!(reply.ai_message.content, "Good morning, Edna!");

    let page = client.chat().sessions(1, 20).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.sessions[0].title.as_deref(), Some("Morning check-in"));

    let detail = client.chat().session(id).await.unwrap();
    assert_eq!(detail.session.id, id);
    assert_eq!(detail.messages.len(), 2);

    client.chat().delete_session(id).await.unwrap();
}

#[tokio::test]
async fn test_message_validation_rejects_before_any_network_call() {
    let store = Arc::new(MemoryCredentialStore::new());
    // Nothing is listening here; validation must fail first.
    let client = client_for("http://127.0.0.1:1", &store);

    let err = client.chat().send("   ", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let oversized = "x".repeat(5001);
    let err = client.chat().send(&oversized, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_health_targets_server_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "seva-backend",
            "version": "0.1.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&server.uri(), &store);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service.as_deref(), Some("seva-backend"));
}
