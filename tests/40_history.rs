mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use payroll_api::auth::Role;

use common::{send, TestServer};

/// Worker plus a "Bonus" action; returns `(token, workers_id, actions_id)`.
async fn seed(server: &TestServer) -> Result<(String, i64, i64)> {
    let token = server.token_for("editor", Role::Editor).await?;
    let body = server.worker_body(&token).await?;
    let res = send(server.post("/workers", Some(&token), body)).await?;
    anyhow::ensure!(res.status == StatusCode::CREATED, "worker create failed: {:?}", res.body);
    let worker = res.id()?;
    let action = server.create_reference(&token, "actions", "Bonus").await?;
    Ok((token, worker, action))
}

fn event(workers_id: i64, actions_id: i64, sum: Value) -> Value {
    json!({ "workers_id": workers_id, "actions_id": actions_id, "sum": sum })
}

#[tokio::test]
async fn event_crud_round_trip() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;

    let mut body = event(worker, action, json!(1500.25));
    body["date"] = json!("2024-03-01");
    let res = send(server.post("/list", Some(&token), body)).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    let id = res.id()?;
    assert_eq!(res.body["data"]["sum"], 1500.25);
    assert_eq!(res.body["data"]["action_name"], "Bonus");
    assert_eq!(res.body["data"]["worker_full_name"], "Petrova Anna Sergeevna");

    let path = format!("/list/{}", id);
    let res = send(server.put(&path, Some(&token), event(worker, action, json!("99.5")))).await?;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    // Omitted date keeps the stored one
    assert_eq!(res.body["data"]["date"], "2024-03-01");
    assert_eq!(res.body["data"]["sum"], 99.5);

    let res = send(server.delete(&path, Some(&token))).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(server.get(&path, Some(&token))).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), "HISTORY_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn history_alias_serves_the_same_events() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;

    let res = send(server.post("/history", Some(&token), event(worker, action, json!(10)))).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    // Date defaults to today
    assert!(res.body["data"]["date"].is_string());

    let res = send(server.get("/list", Some(&token))).await?;
    assert_eq!(res.body["count"], 1);
    let res = send(server.get("/history/count", Some(&token))).await?;
    assert_eq!(res.body["count"], 1);
    Ok(())
}

#[tokio::test]
async fn missing_references_are_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;

    let res = send(server.post("/list", Some(&token), event(777, action, json!(5)))).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), "WORKER_NOT_FOUND");

    // Worker is checked before the action
    let res = send(server.post("/list", Some(&token), event(777, 888, json!(5)))).await?;
    assert_eq!(res.code(), "WORKER_NOT_FOUND");

    let res = send(server.post("/list", Some(&token), event(worker, 888, json!(5)))).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), "ACTION_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn event_payload_is_validated() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;

    let res = send(server.post("/list", Some(&token), json!({ "workers_id": worker }))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "MISSING_FIELDS");
    assert_eq!(res.body["missingFields"], json!(["actions_id", "sum"]));

    let mut body = event(worker, action, json!(-1));
    body["date"] = json!("2024-13-40");
    let res = send(server.post("/list", Some(&token), body)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["sum"].is_string());
    assert!(res.body["field_errors"]["date"].is_string());
    Ok(())
}

#[tokio::test]
async fn worker_and_action_in_use_cannot_be_deleted() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;
    let admin = server.token_for("boss", Role::Admin).await?;

    let res = send(server.post("/list", Some(&token), event(worker, action, json!(1)))).await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = send(server.delete(&format!("/workers/{}", worker), Some(&token))).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), "FOREIGN_KEY_CONSTRAINT");

    let res = send(server.delete(&format!("/api/actions/{}", action), Some(&admin))).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn readers_cannot_record_events() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, worker, action) = seed(&server).await?;
    let reader = server.token_for("reader", Role::User).await?;

    let res = send(server.get("/list", Some(&reader))).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(server.post("/list", Some(&reader), event(worker, action, json!(1)))).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), "INSUFFICIENT_PERMISSIONS");
    Ok(())
}

#[tokio::test]
async fn sum_beyond_column_precision_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, worker, action) = seed(&server).await?;

    let res = send(server.post("/list", Some(&token), event(worker, action, json!("1e12")))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["sum"].is_string());

    // Sub-cent amounts are rounded to the stored scale
    let res = send(server.post("/list", Some(&token), event(worker, action, json!("10.005")))).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["sum"], 10.01);
    Ok(())
}
