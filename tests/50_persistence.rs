mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn records_survive_a_restart_and_ids_continue() -> Result<()> {
    let client = reqwest::Client::new();

    let data_file = {
        let server = common::TestServer::start().await?;
        let token = server.login(&client).await?;

        for name in ["Ana", "Bia"] {
            let res = client
                .post(server.url("/patients"))
                .bearer_auth(&token)
                .json(&json!({ "name": name }))
                .send()
                .await?;
            assert_eq!(res.status(), StatusCode::CREATED);
        }
        let res = client
            .post(server.url("/deliveries"))
            .bearer_auth(&token)
            .json(&json!({ "patient_id": 2 }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);

        server.data_file.clone()
    };

    // The document on disk has both collections and the counters
    let document: Value = serde_json::from_str(&std::fs::read_to_string(&data_file)?)?;
    assert_eq!(document["patients"].as_array().map(Vec::len), Some(2));
    assert_eq!(document["deliveries"].as_array().map(Vec::len), Some(1));
    assert_eq!(document["counters"]["patients"], 2);
    assert_eq!(document["counters"]["deliveries"], 1);

    let server = common::TestServer::start_with_data_file(&data_file).await?;
    let token = server.login(&client).await?;

    let body = client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Caio" }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(body["data"]["id"], 3);

    let body = client
        .get(server.url("/deliveries"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(body["data"][0]["patient_id"], 2);
    Ok(())
}
