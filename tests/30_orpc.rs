mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn unknown_procedure_is_500_with_name() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, body) = server.call("rooms.explode", None, json!({})).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Procedure rooms.explode not found");

    Ok(())
}

#[tokio::test]
async fn dotted_path_dispatches_too() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/orpc/rooms.getAll"))
        .json(&json!({ "limit": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?.is_array());

    Ok(())
}

#[tokio::test]
async fn procedure_table_is_public() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/orpc")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert!(body
        .as_array()
        .expect("array")
        .iter()
        .any(|p| p["name"] == "dashboard.summary" && p["access"] == "staff"));

    Ok(())
}

#[tokio::test]
async fn staff_procedures_need_a_session() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, _) = server.call("dashboard.summary", None, json!({})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.call("dashboard.summary", Some("not-a-jwt"), json!({})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
