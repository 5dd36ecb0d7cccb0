mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn empty_account_yields_zeroed_bundles() -> Result<()> {
    let app = common::TestApp::new()?;
    let user = app.user()?;

    let res = app.get(&user, "/api/analytics").await?;
    assert_eq!(res.status, StatusCode::OK);

    let data = res.data();
    assert_eq!(data["taskAnalytics"]["totalTasks"], 0);
    assert_eq!(data["taskAnalytics"]["completionRate"].as_f64(), Some(0.0));
    assert_eq!(data["contactAnalytics"]["companyCounts"], json!([]));
    assert_eq!(data["salesAnalytics"]["totalValue"].as_f64(), Some(0.0));
    assert_eq!(data["salesAnalytics"]["stageCounts"], json!([]));
    Ok(())
}

#[tokio::test]
async fn bundles_reflect_only_the_callers_data() -> Result<()> {
    let app = common::TestApp::new()?;
    let user = app.user()?;
    let other = app.user()?;

    for status in ["Completed", "Pending", "Pending", "Pending"] {
        app.create(&user, "/api/tasks", json!({ "title": "t", "dueDate": "2030-01-01", "status": status }))
            .await?;
    }
    app.create(&other, "/api/tasks", json!({ "title": "x", "dueDate": "2030-01-01", "status": "Completed" }))
        .await?;
    app.create(
        &user,
        "/api/contacts",
        json!({ "firstName": "A", "lastName": "B", "email": "nocompany@example.com", "phone": "1" }),
    )
    .await?;
    app.create(
        &user,
        "/api/sales-opportunities",
        json!({
            "title": "Deal",
            "stage": "Negotiation",
            "value": 999.5,
            "expectedCloseDate": "2030-05-05",
            "priority": "Medium"
        }),
    )
    .await?;

    let res = app.get(&user, "/api/analytics").await?;
    let data = res.data();

    let tasks = &data["taskAnalytics"];
    assert_eq!(tasks["totalTasks"], 4);
    assert_eq!(tasks["completedTasks"], 1);
    assert_eq!(tasks["completionRate"].as_f64(), Some(25.0));
    assert_eq!(tasks["ownerDistribution"], json!([{ "key": user.id.to_string(), "count": 4 }]));

    let contacts = &data["contactAnalytics"];
    assert_eq!(contacts["totalContacts"], 1);
    assert_eq!(contacts["companyCounts"], json!([{ "key": null, "count": 1 }]));

    let sales = &data["salesAnalytics"];
    assert_eq!(sales["totalValue"].as_f64(), Some(999.5));
    assert_eq!(sales["stageCounts"], json!([{ "key": "Negotiation", "count": 1 }]));
    assert_eq!(sales["priorityCounts"], json!([{ "key": "Medium", "count": 1 }]));
    Ok(())
}

#[tokio::test]
async fn sales_outage_degrades_to_empty_bundle() -> Result<()> {
    let app = common::TestApp::with_store(Arc::new(common::SalesOutage::new()), common::test_config())?;
    let user = app.user()?;

    for status in ["Completed", "Pending"] {
        app.create(&user, "/api/tasks", json!({ "title": "t", "dueDate": "2030-01-01", "status": status }))
            .await?;
    }
    app.create(
        &user,
        "/api/contacts",
        json!({ "firstName": "A", "lastName": "B", "email": "outage@example.com", "phone": "1", "company": "Acme" }),
    )
    .await?;

    let res = app.get(&user, "/api/analytics").await?;
    assert_eq!(res.status, StatusCode::OK);

    let data = res.data();
    assert_eq!(data["salesAnalytics"], json!({}));
    assert_eq!(data["taskAnalytics"]["totalTasks"], 2);
    assert_eq!(data["taskAnalytics"]["completionRate"].as_f64(), Some(50.0));
    assert_eq!(data["contactAnalytics"]["companyCounts"], json!([{ "key": "Acme", "count": 1 }]));

    let res = app.get(&user, "/api/analytics/sales-pipeline-summary").await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn value_totals_past_decimal_range_do_not_crash() -> Result<()> {
    let app = common::TestApp::new()?;
    let user = app.user()?;

    for title in ["Big", "Bigger"] {
        app.create(
            &user,
            "/api/sales-opportunities",
            json!({
                "title": title,
                "stage": "Prospect",
                "value": 5e28,
                "expectedCloseDate": "2030-05-05",
                "priority": "High"
            }),
        )
        .await?;
    }

    let res = app.get(&user, "/api/analytics").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["salesAnalytics"], json!({}));
    assert_eq!(res.data()["taskAnalytics"]["totalTasks"], 0);

    let res = app.get(&user, "/api/analytics/sales-pipeline-summary").await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["code"], "INTERNAL_SERVER_ERROR");

    // The server is still answering
    let res = app.get(&user, "/api/sales-opportunities").await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
