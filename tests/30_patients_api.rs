mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_and_list_patients_in_order() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.login(&client).await?;

    let mut ids = Vec::new();
    for name in ["Ana", "Bia", "Caio"] {
        let res = client
            .post(server.url("/patients"))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "address": "Rua das Flores, 1" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = res.json::<Value>().await?;
        assert_eq!(body["data"]["name"], name);
        ids.push(body["data"]["id"].as_u64().expect("numeric id"));
    }
    assert_eq!(ids, vec![1, 2, 3]);

    // Trailing slash works like the legacy routes
    let body = client
        .get(server.url("/patients/"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Ana", "Bia", "Caio"]);
    Ok(())
}

#[tokio::test]
async fn blank_name_is_rejected_without_consuming_an_id() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.login(&client).await?;

    let res = client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&json!({ "name": "  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["field_errors"]["name"].is_string(), "{}", body);

    let body = client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ana" }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(body["data"]["id"], 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_health_card_is_a_conflict() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.login(&client).await?;

    let patient = json!({ "name": "Ana", "health_card_number": "898 0001 2345 6789" });
    let res = client.post(server.url("/patients")).bearer_auth(&token).json(&patient).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.post(server.url("/patients")).bearer_auth(&token).json(&patient).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn show_patient_by_id() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.login(&client).await?;

    client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ana" }))
        .send()
        .await?;

    let res = client.get(server.url("/patients/1")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["name"], "Ana");

    let res = client.get(server.url("/patients/2")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(server.url("/patients/abc")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
