use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use mercato_api::auth::AppStateInner;
use mercato_api::routes;
use mercato_db::Database;

fn app() -> axum::Router {
    let db = Database::open_in_memory().unwrap();
    routes::router(Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
    }))
}

/// Send a JSON request and return (status, parsed body).
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns (token, user_id).
async fn register(app: &axum::Router, email: &str, role: &str) -> (String, String) {
    let mut body = json!({
        "email": email,
        "password": "hunter2hunter2",
        "role": role,
        "first_name": "Ada",
        "last_name": "Lovelace",
    });
    if role == "vendor" {
        body["business_name"] = json!("Ada's Workshop");
        body["city"] = json!("Luxembourg");
        body["vat_number"] = json!("LU00000001");
    }

    let (status, resp) = send(app, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {resp}");
    let token = resp["data"]["token"].as_str().unwrap().to_string();
    let user_id = resp["data"]["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Creates a draft listing as the given vendor and returns its id.
async fn create_listing(app: &axum::Router, vendor_token: &str, title: &str) -> String {
    let (status, resp) = send(
        app,
        "POST",
        "/api/listings",
        Some(vendor_token),
        Some(json!({ "title": title, "description": "Fresh bread daily", "city": "Luxembourg" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create listing failed: {resp}");
    assert_eq!(resp["data"]["listing"]["status"], "draft");
    resp["data"]["listing"]["id"].as_str().unwrap().to_string()
}

async fn set_status(
    app: &axum::Router,
    token: &str,
    uri: &str,
    status_value: &str,
) -> (StatusCode, Value) {
    send(app, "PATCH", uri, Some(token), Some(json!({ "status": status_value }))).await
}

#[tokio::test]
async fn health_works_unauthenticated() {
    let app = app();
    let (status, resp) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "success");
}

#[tokio::test]
async fn register_login_profile_roundtrip() {
    let app = app();
    let (token, user_id) = register(&app, "ada@example.com", "customer").await;

    let (status, resp) = send(&app, "GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["user"]["id"], user_id.as_str());
    assert_eq!(resp["data"]["user"]["role"], "customer");

    let (status, resp) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(resp["data"]["token"].as_str().is_some());

    // Wrong password
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No token
    let (status, _) = send(&app, "GET", "/api/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = app();
    register(&app, "dup@example.com", "customer").await;

    let (status, resp) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "dup@example.com",
            "password": "hunter2hunter2",
            "role": "customer",
            "first_name": null,
            "last_name": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["status"], "error");
}

#[tokio::test]
async fn vendor_registration_requires_business_name() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "shop@example.com",
            "password": "hunter2hunter2",
            "role": "vendor",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_approval_makes_it_public() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;
    let (admin, _) = register(&app, "admin@example.com", "admin").await;

    let id = create_listing(&app, &vendor, "Corner Bakery").await;

    // Draft listings are invisible publicly
    let (_, resp) = send(&app, "GET", "/api/listings", None, None).await;
    assert_eq!(resp["results"], 0);
    let (status, _) = send(&app, "GET", &format!("/api/listings/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Vendor submits for review
    let (status, resp) = set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["data"]["listing"]["status"], "submitted");

    // Still not public
    let (_, resp) = send(&app, "GET", "/api/listings", None, None).await;
    assert_eq!(resp["results"], 0);

    // Admin approves
    let (status, resp) =
        set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "active").await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["data"]["listing"]["status"], "active");

    // Now public, both list and single fetch
    let (_, resp) = send(&app, "GET", "/api/listings", None, None).await;
    assert_eq!(resp["results"], 1);
    assert_eq!(resp["data"]["listings"][0]["title"], "Corner Bakery");
    assert_eq!(resp["data"]["listings"][0]["business_name"], "Ada's Workshop");

    let (status, resp) = send(&app, "GET", &format!("/api/listings/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["listing"]["title"], "Corner Bakery");
}

#[tokio::test]
async fn rejected_listing_stays_private_and_can_be_resubmitted() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;
    let (admin, _) = register(&app, "admin@example.com", "admin").await;

    let id = create_listing(&app, &vendor, "Shady Shop").await;
    set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;

    let (status, _) =
        set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "rejected").await;
    assert_eq!(status, StatusCode::OK);

    // Absent from public results, visible to the vendor with its status
    let (_, resp) = send(&app, "GET", "/api/listings", None, None).await;
    assert_eq!(resp["results"], 0);
    let (_, resp) = send(&app, "GET", "/api/listings/vendor/my-listings", Some(&vendor), None).await;
    assert_eq!(resp["data"]["listings"][0]["status"], "rejected");

    // Vendor edits and explicitly resubmits
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/listings/{id}"),
        Some(&vendor),
        Some(json!({ "title": "Honest Shop", "status": "submitted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, resp) = send(&app, "GET", "/api/listings/vendor/my-listings", Some(&vendor), None).await;
    assert_eq!(resp["data"]["listings"][0]["status"], "submitted");
    assert_eq!(resp["data"]["listings"][0]["title"], "Honest Shop");
}

#[tokio::test]
async fn invalid_status_moves_are_rejected() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;
    let (admin, _) = register(&app, "admin@example.com", "admin").await;

    let id = create_listing(&app, &vendor, "Shop").await;

    // Vendor cannot self-activate
    let (status, _) = set_status(&app, &vendor, &format!("/api/listings/{id}"), "active").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Admin cannot moderate a draft
    let (status, _) =
        set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "active").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Admin can only set active or rejected
    set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;
    let (status, _) =
        set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "draft").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown status string
    let (status, _) =
        set_status(&app, &vendor, &format!("/api/listings/{id}"), "published").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeating_the_current_status_is_a_no_op() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;

    let id = create_listing(&app, &vendor, "Shop").await;
    set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;

    // Echoing the status back changes nothing and succeeds
    let (status, resp) = set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["data"]["listing"]["status"], "submitted");

    // A request with no fields at all is still a validation error
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/listings/{id}"),
        Some(&vendor),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_writes_enforce_role_and_ownership() {
    let app = app();
    let (vendor_a, _) = register(&app, "a@example.com", "vendor").await;
    let (vendor_b, _) = register(&app, "b@example.com", "vendor").await;
    let (customer, _) = register(&app, "c@example.com", "customer").await;

    let id = create_listing(&app, &vendor_a, "A's Shop").await;

    // Unauthenticated and non-vendor creates
    let (status, _) = send(&app, "POST", "/api/listings", None, Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) =
        send(&app, "POST", "/api/listings", Some(&customer), Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Another vendor cannot edit or delete someone else's listing
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/listings/{id}"),
        Some(&vendor_b),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        send(&app, "DELETE", &format!("/api/listings/{id}"), Some(&vendor_b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin listing view is admin-only
    let (status, _) = send(&app, "GET", "/api/listings/admin/all", Some(&vendor_a), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner deletes
    let (status, _) =
        send(&app, "DELETE", &format!("/api/listings/{id}"), Some(&vendor_a), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, resp) = send(&app, "GET", "/api/listings/vendor/my-listings", Some(&vendor_a), None).await;
    assert_eq!(resp["results"], 0);
}

#[tokio::test]
async fn messaging_scenario_inbox_read_and_count() {
    let app = app();
    let (customer, customer_id) = register(&app, "customer@example.com", "customer").await;
    let (vendor, vendor_id) = register(&app, "vendor@example.com", "vendor").await;
    let (third, _) = register(&app, "third@example.com", "customer").await;

    let listing = create_listing(&app, &vendor, "Bakery").await;

    let (status, resp) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&customer),
        Some(json!({
            "recipient_id": vendor_id,
            "listing_id": listing,
            "subject": "Opening hours",
            "content": "Are you open on Sundays?",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    let message_id = resp["data"]["message"]["id"].as_str().unwrap().to_string();
    assert_eq!(resp["data"]["message"]["read"], false);

    // Vendor's inbox holds the message with sender and listing context
    let (_, resp) = send(&app, "GET", "/api/messages/inbox", Some(&vendor), None).await;
    assert_eq!(resp["results"], 1);
    let msg = &resp["data"]["messages"][0];
    assert_eq!(msg["read"], false);
    assert_eq!(msg["sender_id"], customer_id.as_str());
    assert_eq!(msg["sender_email"], "customer@example.com");
    assert_eq!(msg["listing_title"], "Bakery");

    // Sender sees it under sent, not inbox
    let (_, resp) = send(&app, "GET", "/api/messages/sent", Some(&customer), None).await;
    assert_eq!(resp["results"], 1);
    let (_, resp) = send(&app, "GET", "/api/messages/inbox", Some(&customer), None).await;
    assert_eq!(resp["results"], 0);

    let (_, resp) = send(&app, "GET", "/api/messages/unread-count", Some(&vendor), None).await;
    assert_eq!(resp["data"]["unread_count"], 1);

    // Only the recipient can mark it read
    let uri = format!("/api/messages/{message_id}/read");
    let (status, _) = send(&app, "PATCH", &uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "PATCH", &uri, Some(&third), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = send(&app, "PATCH", &uri, Some(&vendor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["message"]["read"], true);

    let (_, resp) = send(&app, "GET", "/api/messages/unread-count", Some(&vendor), None).await;
    assert_eq!(resp["data"]["unread_count"], 0);

    // Marking again is a visible no-op
    let (status, _) = send(&app, "PATCH", &uri, Some(&vendor), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, resp) = send(&app, "GET", "/api/messages/unread-count", Some(&vendor), None).await;
    assert_eq!(resp["data"]["unread_count"], 0);
}

#[tokio::test]
async fn conversation_is_scoped_between_two_users() {
    let app = app();
    let (alice, alice_id) = register(&app, "alice@example.com", "customer").await;
    let (bob, bob_id) = register(&app, "bob@example.com", "customer").await;
    let (_carol, carol_id) = register(&app, "carol@example.com", "customer").await;

    for (from, to, text) in [
        (&alice, &bob_id, "hey bob"),
        (&bob, &alice_id, "hey alice"),
        (&alice, &carol_id, "hey carol"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/messages",
            Some(from),
            Some(json!({ "recipient_id": to, "content": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, resp) = send(
        &app,
        "GET",
        &format!("/api/messages/conversation/{bob_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["results"], 2);
    assert_eq!(resp["data"]["messages"][0]["content"], "hey bob");
    assert_eq!(resp["data"]["messages"][1]["content"], "hey alice");
}

#[tokio::test]
async fn message_validation_and_access() {
    let app = app();
    let (alice, alice_id) = register(&app, "alice@example.com", "customer").await;
    let (bob, bob_id) = register(&app, "bob@example.com", "customer").await;
    let (carol, _) = register(&app, "carol@example.com", "customer").await;

    // Empty content and self-messaging
    let (status, _) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&alice),
        Some(json!({ "recipient_id": bob_id, "content": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&alice),
        Some(json!({ "recipient_id": alice_id, "content": "note to self" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown recipient
    let (status, _) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&alice),
        Some(json!({
            "recipient_id": "99999999-9999-9999-9999-999999999999",
            "content": "anyone there?",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A real message is visible only to its two parties
    let (_, resp) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&alice),
        Some(json!({ "recipient_id": bob_id, "content": "secret" })),
    )
    .await;
    let id = resp["data"]["message"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", &format!("/api/messages/{id}"), Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &format!("/api/messages/{id}"), Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The recipient may delete it outright
    let (status, _) = send(&app, "DELETE", &format!("/api/messages/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/messages/{id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_are_idempotent_and_per_user() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;
    let (admin, _) = register(&app, "admin@example.com", "admin").await;
    let (a, _) = register(&app, "a@example.com", "customer").await;
    let (b, _) = register(&app, "b@example.com", "customer").await;

    let id = create_listing(&app, &vendor, "Bakery").await;
    set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;
    set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "active").await;

    let uri = format!("/api/favorites/{id}");

    // Double add leaves exactly one favorite
    let (status, _) = send(&app, "POST", &uri, Some(&a), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", &uri, Some(&a), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, resp) = send(&app, "GET", "/api/favorites", Some(&a), None).await;
    assert_eq!(resp["results"], 1);
    assert_eq!(resp["data"]["favorites"][0]["title"], "Bakery");

    // B never favorited it
    let (_, resp) = send(&app, "GET", &format!("{uri}/check"), Some(&b), None).await;
    assert_eq!(resp["data"]["is_favorited"], false);
    let (_, resp) = send(&app, "GET", "/api/favorites", Some(&b), None).await;
    assert_eq!(resp["results"], 0);

    // Removing a non-favorite succeeds quietly
    let (status, _) = send(&app, "DELETE", &uri, Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);

    // Favorites are customer-only
    let (status, _) = send(&app, "POST", &uri, Some(&vendor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown listing
    let (status, _) = send(
        &app,
        "POST",
        "/api/favorites/99999999-9999-9999-9999-999999999999",
        Some(&a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn categories_are_public() {
    let app = app();
    let (status, resp) = send(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(resp["results"].as_u64().unwrap() > 0);
    let names: Vec<&str> = resp["data"]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Plumber"));
}

#[tokio::test]
async fn vendor_profile_requires_vendor_role() {
    let app = app();
    let (vendor, vendor_user_id) = register(&app, "vendor@example.com", "vendor").await;
    let (customer, _) = register(&app, "customer@example.com", "customer").await;

    let (status, resp) = send(&app, "GET", "/api/vendors/profile", Some(&vendor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["vendor"]["business_name"], "Ada's Workshop");
    assert_eq!(resp["data"]["vendor"]["user_id"], vendor_user_id.as_str());

    let (status, _) = send(&app, "GET", "/api/vendors/profile", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_search_filters_apply() {
    let app = app();
    let (vendor, _) = register(&app, "vendor@example.com", "vendor").await;
    let (admin, _) = register(&app, "admin@example.com", "admin").await;

    for title in ["Corner Bakery", "Pipe Masters"] {
        let id = create_listing(&app, &vendor, title).await;
        set_status(&app, &vendor, &format!("/api/listings/{id}"), "submitted").await;
        set_status(&app, &admin, &format!("/api/listings/admin/{id}/status"), "active").await;
    }

    let (_, resp) = send(&app, "GET", "/api/listings?search=Bakery", None, None).await;
    assert_eq!(resp["results"], 1);
    assert_eq!(resp["data"]["listings"][0]["title"], "Corner Bakery");

    let (_, resp) = send(&app, "GET", "/api/listings?city=Luxembourg", None, None).await;
    assert_eq!(resp["results"], 2);

    let (_, resp) = send(&app, "GET", "/api/listings?city=Berlin", None, None).await;
    assert_eq!(resp["results"], 0);
}
