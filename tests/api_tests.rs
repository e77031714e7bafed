mod common;

use loyalty::config::RewardMode;
use reqwest::StatusCode;
use serde_json::json;

// ── Service info ────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn root_reports_counts() {
    let app = common::spawn_app().await;

    let (body, status) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "loyalty");
    assert_eq!(body["status"], "online");
    assert_eq!(body["users"], 2);
    assert_eq!(body["visits"], 0);
}

// ── Registration & login ────────────────────────────────────────

#[tokio::test]
async fn register_returns_user_id_and_qr_token() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("new@test.com", "secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["userId"].is_string());
    assert!(body["qrToken"].is_string());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = common::spawn_app().await;
    app.register("dup@test.com", "secret123").await;

    let (body, status) = app.register("  DUP@test.com ", "other").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = common::spawn_app().await;

    let (body, status) = app.post("/api/register", json!({ "email": "x@test.com" }), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, status) = app.post("/api/login", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_returns_tokens_and_visit_count() {
    let app = common::spawn_app().await;
    app.register("ana@test.com", "secret123").await;

    let (body, status) = app.login("ana@test.com", "secret123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert!(body["qrToken"].is_string());
    assert_eq!(body["user"]["username"], "ana");
    assert_eq!(body["user"]["role"], "client");
    assert_eq!(body["user"]["visits"], 0);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = common::spawn_app().await;
    app.register("ana@test.com", "secret123").await;

    let (wrong, status) = app.login("ana@test.com", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (unknown, status) = app.login("ghost@test.com", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["error"], unknown["error"]);
}

// ── Scans & rewards ─────────────────────────────────────────────

#[tokio::test]
async fn fifth_visit_unlocks_and_sixth_starts_a_new_cycle() {
    let app = common::spawn_app().await;
    let (session, qr) = app.client("loyal@test.com").await;

    for _ in 0..3 {
        app.scan(&qr).await;
    }
    let (body, status) = app.scan(&qr).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visits"], 4);
    assert_eq!(body["progress"]["current"], 4);
    assert_eq!(body["progress"]["total"], 5);
    assert_eq!(body["progress"]["percentage"], 80.0);
    assert!(body["reward"].is_null());

    let (body, status) = app.get("/api/dashboard", Some(&session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVisits"], 4);
    assert_eq!(body["progress"]["current"], 4);
    assert_eq!(body["progress"]["percentage"], 80.0);
    assert_eq!(body["visits"].as_array().unwrap().len(), 4);

    let (body, _) = app.scan(&qr).await;
    assert_eq!(body["visits"], 5);
    assert_eq!(body["message"], "Visit #5 recorded");
    assert_eq!(body["reward"], "Free haircut earned!");
    assert_eq!(body["client"]["email"], "loyal@test.com");

    let (body, _) = app.scan(&qr).await;
    assert_eq!(body["visits"], 6);
    assert_eq!(body["progress"]["current"], 1);
    assert!(body["reward"].is_null());
}

#[tokio::test]
async fn repeated_scan_id_is_not_counted_twice() {
    let app = common::spawn_app().await;
    let (_, qr) = app.client("tap@test.com").await;

    let payload = json!({ "qrToken": qr, "scanId": "tap-1" });
    let (first, _) = app.post("/api/scan", payload.clone(), None).await;
    let (second, status) = app.post("/api/scan", payload, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["duplicate"], false);
    assert_eq!(second["duplicate"], true);
    assert_eq!(second["visits"], 1);
}

#[tokio::test]
async fn scan_rejects_missing_and_session_tokens() {
    let app = common::spawn_app().await;
    let (session, _) = app.client("mix@test.com").await;

    let (body, status) = app.post("/api/scan", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "QR code is required");

    let (body, status) = app.scan(&session).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid QR code");

    let (_, status) = app.scan("garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Dashboard ───────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_requires_a_session_token() {
    let app = common::spawn_app().await;
    let (_, qr) = app.client("dash@test.com").await;

    let (body, status) = app.get("/api/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (_, status) = app.get("/api/dashboard", Some(&qr)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.get("/api/dashboard", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_shows_progress_and_recent_visits() {
    let app = common::spawn_app().await;
    let (session, qr) = app.client("dash@test.com").await;
    for _ in 0..2 {
        app.scan(&qr).await;
    }

    let (body, status) = app.get("/api/dashboard", Some(&session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVisits"], 2);
    assert_eq!(body["progress"]["percentage"], 40.0);
    assert_eq!(body["progress"]["nextReward"], "Free haircut");
    assert_eq!(body["visits"].as_array().unwrap().len(), 2);
    assert_eq!(body["user"]["email"], "dash@test.com");
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_reject_clients() {
    let app = common::spawn_app().await;
    let (session, _) = app.client("plain@test.com").await;

    let (body, status) = app.get("/api/admin/users", Some(&session)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (_, status) = app.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_users_with_stats() {
    let app = common::spawn_app().await;
    let (_, qr) = app.client("busy@test.com").await;
    for _ in 0..5 {
        app.scan(&qr).await;
    }
    let admin = app.admin_token().await;

    let (body, status) = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalUsers"], 3);
    assert_eq!(body["stats"]["totalVisits"], 5);
    assert_eq!(body["stats"]["activeUsers"], 3);
    assert_eq!(body["stats"]["rewardsGiven"], 1);

    let busy = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "busy@test.com")
        .unwrap();
    assert_eq!(busy["visitsCount"], 5);
    assert!(busy["lastVisit"].is_string());
}

async fn promote_to_admin(app: &common::TestApp, admin: &str, email: &str) -> (String, String) {
    let (body, _) = app.register(email, "secret123").await;
    let user_id = body["userId"].as_str().unwrap().to_string();
    let (_, status) = app
        .patch(&format!("/api/admin/users/{user_id}"), json!({ "role": "admin" }), admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (body, _) = app.login(email, "secret123").await;
    (user_id, body["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn deactivated_admin_loses_access_immediately() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (second_id, second) = promote_to_admin(&app, &admin, "second@test.com").await;

    let (_, status) = app.get("/api/admin/users", Some(&second)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .patch(&format!("/api/admin/users/{second_id}"), json!({ "isActive": false }), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.get("/api/admin/users", Some(&second)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (_, status) = app
        .patch("/api/admin/users/00000000-0000-0000-0000-000000000000", json!({ "isActive": false }), &second)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn demoted_admin_is_forbidden_with_old_token() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;
    let (second_id, second) = promote_to_admin(&app, &admin, "second@test.com").await;

    let (_, status) = app
        .patch(&format!("/api/admin/users/{second_id}"), json!({ "role": "client" }), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.get("/api/admin/users", Some(&second)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn deactivated_user_cannot_log_in() {
    let app = common::spawn_app().await;
    let (body, _) = app.register("gone@test.com", "secret123").await;
    let user_id = body["userId"].as_str().unwrap().to_string();
    let admin = app.admin_token().await;

    let (body, status) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            json!({ "isActive": false }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isActive"], false);

    let (body, status) = app.login("gone@test.com", "secret123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn admin_update_validates_target() {
    let app = common::spawn_app().await;
    let admin = app.admin_token().await;

    let (_, status) = app
        .patch("/api/admin/users/not-a-uuid", json!({ "isActive": false }), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (_, status) = app
        .patch(&format!("/api/admin/users/{missing}"), json!({ "isActive": false }), &admin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn persisted_rewards_are_claimed_once() {
    let app = common::spawn_with(RewardMode::Persisted).await;
    let (session, qr) = app.client("claim@test.com").await;
    for _ in 0..5 {
        app.scan(&qr).await;
    }

    let (body, _) = app.get("/api/dashboard", Some(&session)).await;
    let rewards = body["rewards"].as_array().unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0]["claimed"], false);
    let reward_id = rewards[0]["id"].as_str().unwrap().to_string();

    let admin = app.admin_token().await;
    let path = format!("/api/admin/rewards/{reward_id}/claim");
    let (body, status) = app.post(&path, json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reward"]["claimed"], true);

    let (body, status) = app.post(&path, json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reward already claimed");
}
