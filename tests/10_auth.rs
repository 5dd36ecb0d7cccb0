mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use uuid::Uuid;
use workdesk_api::auth::{issue_token, Claims};

#[tokio::test]
async fn health_endpoint_is_public() -> Result<()> {
    let app = common::TestApp::new()?;
    let res = app.request(Method::GET, "/health", None, None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.data()["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let app = common::TestApp::new()?;
    let res = app.request(Method::GET, "/", None, None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "workdesk-api");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_rejected() -> Result<()> {
    let app = common::TestApp::new()?;

    for uri in ["/api/tasks", "/api/contacts", "/api/dashboard/summary", "/api/analytics"] {
        let res = app.request(Method::GET, uri, None, None).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(res.body["error"], true);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert_eq!(res.body["message"], "No token, authorization denied");
    }
    Ok(())
}

#[tokio::test]
async fn forged_or_expired_tokens_are_rejected() -> Result<()> {
    let app = common::TestApp::new()?;

    let forged = issue_token("some-other-secret", &Claims::new(Uuid::new_v4(), None, 1))?;
    let res = app.request(Method::GET, "/api/tasks", Some(&forged), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Token is not valid");

    let mut claims = Claims::new(Uuid::new_v4(), None, 1);
    claims.exp = chrono::Utc::now().timestamp() - 7200;
    let expired = issue_token(common::SECRET, &claims)?;
    let res = app.request(Method::GET, "/api/tasks", Some(&expired), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.request(Method::GET, "/api/tasks", Some("not-a-jwt"), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_the_api() -> Result<()> {
    let app = common::TestApp::new()?;
    let user = app.user()?;

    let res = app.get(&user, "/api/tasks").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data(), &serde_json::json!([]));
    Ok(())
}
