mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{signup_body, TestServer};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["store"], "memory");
    Ok(())
}

#[tokio::test]
async fn signup_hides_the_password_hash() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .post(server.api("/auth/signup"))
        .json(&signup_body("Info@Anadolu.example.com", true, false))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], 1200);
    assert_eq!(body["data"]["email"], "info@anadolu.example.com");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicate_email_and_bad_forms() -> Result<()> {
    let server = TestServer::start().await?;
    server.signup_and_login("dup@example.com", true, false).await?;

    let duplicate = server
        .client
        .post(server.api("/auth/signup"))
        .json(&signup_body("DUP@example.com", false, true))
        .send()
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let body = duplicate.json::<Value>().await?;
    assert_eq!(body["message"], "email already exists");

    let mut bad = signup_body("new@example.com", true, false);
    bad["password_again"] = json!("something-else");
    bad["company_type"] = json!("Holding");
    let invalid = server
        .client
        .post(server.api("/auth/signup"))
        .json(&bad)
        .send()
        .await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body = invalid.json::<Value>().await?;
    assert_eq!(body["message"], "form validation error");
    assert!(body["field_errors"]["password_again"].is_string());
    assert!(body["field_errors"]["company_type"].is_string());
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() -> Result<()> {
    let server = TestServer::start().await?;
    server.signup_and_login("login@example.com", true, false).await?;

    let res = server
        .client
        .post(server.api("/auth/login"))
        .json(&json!({"email": "login@example.com", "password": "wrong-horse"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "email or password is incorrect");
    Ok(())
}

#[tokio::test]
async fn logout_invalidates_the_access_token() -> Result<()> {
    let server = TestServer::start().await?;
    let tokens = server.signup_and_login("out@example.com", true, false).await?;
    let access = tokens["access_token"].as_str().unwrap_or_default().to_string();

    let logout = server
        .client
        .delete(server.api("/auth/logout"))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(logout.status(), StatusCode::OK);

    // The JWT is still well-formed and unexpired, but its session is gone
    let reuse = server
        .client
        .get(server.api("/supplier/products/1"))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);

    let again = server
        .client
        .delete(server.api("/auth/logout"))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_old_refresh_token_dies() -> Result<()> {
    let server = TestServer::start().await?;
    let tokens = server.signup_and_login("rotate@example.com", true, false).await?;
    let refresh = tokens["refresh_token"].as_str().unwrap_or_default().to_string();

    let first = server
        .client
        .post(server.api("/auth/token/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::OK);
    let rotated = first.json::<Value>().await?;
    let new_access = rotated["data"]["access_token"].as_str().unwrap_or_default().to_string();
    assert!(!new_access.is_empty());

    let reuse = server
        .client
        .post(server.api("/auth/token/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await?;
    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);

    let listing = server
        .client
        .get(server.api("/supplier/products/1"))
        .bearer_auth(&new_access)
        .send()
        .await?;
    assert_eq!(listing.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn capability_gates_each_surface() -> Result<()> {
    let server = TestServer::start().await?;
    let supplier = server.token("supplier@example.com", true, false).await?;

    let denied = server
        .client
        .get(server.api("/constructor/constructions/1"))
        .bearer_auth(&supplier)
        .send()
        .await?;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let body = denied.json::<Value>().await?;
    assert_eq!(body["error_code"], 1305);

    let missing = server
        .client
        .get(server.api("/supplier/products/1"))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = server
        .client
        .get(server.api("/supplier/products/1"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
