// Runs the HTTP round trips against PgStore. Needs DATABASE_URL pointing at a
// disposable Postgres database; skipped when it is unset.

mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use payroll_api::auth::password::legacy_digest;
use payroll_api::auth::{Role, StoredHash};
use payroll_api::config::AppConfig;
use payroll_api::database::{DatabaseManager, Store, UserStore};

use common::{send, TestServer, PASSWORD};

async fn postgres_server() -> Result<Option<TestServer>> {
    let Some(url) = common::postgres_url() else {
        eprintln!("DATABASE_URL not set; skipping postgres tests");
        return Ok(None);
    };

    let mut config = AppConfig::development().database;
    config.url = Some(url);
    config.max_connections = 5;
    config.auto_migrate = true;

    let store: Arc<dyn Store> = DatabaseManager::open_store(&config).await?;
    // Second run proves the schema statements are idempotent
    store.migrate().await?;

    Ok(Some(common::spawn_server_on(store).await?))
}

#[tokio::test]
async fn postgres_round_trips() -> Result<()> {
    let Some(server) = postgres_server().await? else {
        return Ok(());
    };
    let suffix = common::unique_suffix();

    let token = server.token_for(&format!("pg_editor_{}", suffix), Role::Editor).await?;
    let admin = server.token_for(&format!("pg_admin_{}", suffix), Role::Admin).await?;

    // Reference tables: case-insensitive uniqueness with the self-exclusion binding
    let position_name = format!("Pos-{}", suffix);
    let position = server.create_reference(&token, "positions", &position_name).await?;
    let res = send(server.post("/api/positions", Some(&token), json!({ "name": position_name.to_uppercase() }))).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), "DUPLICATE_NAME");
    let res = send(server.put(
        &format!("/api/positions/{}", position),
        Some(&token),
        json!({ "name": position_name.to_lowercase() }),
    ))
    .await?;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);

    let gender = server.create_reference(&token, "genders", &format!("Gen-{}", suffix)).await?;
    let prof = server.create_reference(&token, "professions", &format!("Prof-{}", suffix)).await?;
    let education = server.create_reference(&token, "education", &format!("Edu-{}", suffix)).await?;
    let action = server.create_reference(&token, "actions", &format!("Act-{}", suffix)).await?;

    // Workers: NUMERIC decode, joined names, FK constraint mapped to its field
    let mut body = json!({
        "name": "Anna",
        "fam": "Petrova",
        "gender_id": gender,
        "prof_id": prof,
        "position_id": position,
        "education_id": education,
        "salary": "52000.50",
        "date_hired": "2020-01-15"
    });
    let res = send(server.post("/workers", Some(&token), body.clone())).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    let worker = res.id()?;
    assert_eq!(res.body["data"]["salary"], 52000.5);
    assert_eq!(res.body["data"]["position_name"], position_name.to_lowercase());
    assert_eq!(res.body["data"]["date_hired"], "2020-01-15");

    body["position_id"] = json!(i64::MAX);
    let res = send(server.post("/workers", Some(&token), body.clone())).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert!(res.body["field_errors"]["position_id"].is_string(), "{:?}", res.body);

    body["position_id"] = json!(position);
    body["salary"] = json!("9999999999.99");
    let res = send(server.put(&format!("/workers/{}", worker), Some(&token), body)).await?;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);

    // History: date defaults on insert and is kept by COALESCE on update
    let res = send(server.post(
        "/list",
        Some(&token),
        json!({ "workers_id": worker, "actions_id": action, "sum": 150.75 }),
    ))
    .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    let event = res.id()?;
    let created_date = res.body["data"]["date"].clone();
    assert!(created_date.is_string());
    assert_eq!(res.body["data"]["worker_full_name"], "Petrova Anna");

    let res = send(server.put(
        &format!("/list/{}", event),
        Some(&token),
        json!({ "workers_id": worker, "actions_id": action, "sum": "99.5" }),
    ))
    .await?;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    assert_eq!(res.body["data"]["date"], created_date);
    assert_eq!(res.body["data"]["sum"], 99.5);

    // Referenced rows are protected by the database constraints
    let res = send(server.delete(&format!("/workers/{}", worker), Some(&token))).await?;
    assert_eq!(res.code(), "FOREIGN_KEY_CONSTRAINT");
    let res = send(server.delete(&format!("/api/actions/{}", action), Some(&admin))).await?;
    assert_eq!(res.code(), "FOREIGN_KEY_CONSTRAINT");

    // Clean up in dependency order
    assert_eq!(send(server.delete(&format!("/list/{}", event), Some(&token))).await?.status, StatusCode::OK);
    assert_eq!(send(server.delete(&format!("/workers/{}", worker), Some(&token))).await?.status, StatusCode::OK);
    for path in [
        format!("/api/positions/{}", position),
        format!("/api/professions/{}", prof),
        format!("/api/education/{}", education),
        format!("/api/genders/{}", gender),
        format!("/api/actions/{}", action),
    ] {
        let res = send(server.delete(&path, Some(&admin))).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", path);
        assert_eq!(send(server.get(&path, Some(&admin))).await?.status, StatusCode::NOT_FOUND);
    }
    Ok(())
}

#[tokio::test]
async fn postgres_legacy_hash_upgrade() -> Result<()> {
    let Some(server) = postgres_server().await? else {
        return Ok(());
    };
    let username = format!("pg_legacy_{}", common::unique_suffix());
    server.insert_user(&username, legacy_digest(PASSWORD), Role::User).await?;

    let res = server.login(&username, "WrongPass1").await?;
    assert_eq!(res.code(), "INVALID_CREDENTIALS");

    let res = server.login(&username, PASSWORD).await?;
    assert_eq!(res.status, StatusCode::OK);

    let stored = server
        .store
        .find_user_by_username(&username)
        .await?
        .expect("user exists");
    assert!(!StoredHash::parse(&stored.password_hash)?.needs_upgrade());
    Ok(())
}
