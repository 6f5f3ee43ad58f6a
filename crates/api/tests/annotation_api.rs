//! Integration tests for annotation submission and label-scoped views.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, send_json};
use sqlx::PgPool;

fn annotation(username: &str, entity: &str, value: i64, weight: f64) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "entity_type": "company",
        "entity": entity,
        "label": "B2C",
        "value": value,
        "weight": weight,
        "context": { "text": format!("about {entity}") },
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upsert_creates_and_overwrites(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("u1", "acme.com", 1, 1.0),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    assert_eq!(first["data"]["value"], 1);
    assert_eq!(first["data"]["username"], "u1");

    let response = send_json(
        app,
        Method::POST,
        "/api/v1/annotations",
        &annotation("u1", "acme.com", -1, 2.0),
    )
    .await;
    let second = body_json(response).await;
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["value"], -1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn out_of_range_value_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app,
        Method::POST,
        "/api/v1/annotations",
        &annotation("u1", "acme.com", 5, 1.0),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bulk_rejects_whole_batch_on_bad_entry(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations/bulk",
        &serde_json::json!({
            "annotations": [
                annotation("u1", "acme.com", 1, 1.0),
                annotation("u1", "fox.com", 9, 1.0),
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was written.
    let response = get(app, "/api/v1/labels/B2C/annotations").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn aggregate_respects_weights_and_tie_break(pool: PgPool) {
    let app = common::build_test_app(pool);

    for (user, value, weight) in [("u1", 1, 1.0), ("u2", 1, 1.0), ("u3", 1, 1.0)] {
        send_json(
            app.clone(),
            Method::POST,
            "/api/v1/annotations",
            &annotation(user, "acme.com", value, weight),
        )
        .await;
    }
    send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("expert", "acme.com", -1, 100.0),
    )
    .await;

    let response = get(app.clone(), "/api/v1/labels/B2C/aggregate").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["value"], -1);
    assert_eq!(rows[0]["weight"], 103.0);

    // A tie obeys the knob.
    send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("u4", "tie.com", 1, 2.0),
    )
    .await;
    send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("u5", "tie.com", -1, 2.0),
    )
    .await;
    let response = get(app, "/api/v1/labels/B2C/aggregate?tie_break=negative").await;
    let json = body_json(response).await;
    let tie = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["entity"] == "tie.com")
        .unwrap()
        .clone();
    assert_eq!(tie["value"], -1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn kappa_matrix_has_unit_diagonal(pool: PgPool) {
    let app = common::build_test_app(pool);

    for entity in ["acme.com", "fox.com"] {
        send_json(
            app.clone(),
            Method::POST,
            "/api/v1/annotations",
            &annotation("u1", entity, 1, 1.0),
        )
        .await;
        send_json(
            app.clone(),
            Method::POST,
            "/api/v1/annotations",
            &annotation("u2", entity, 1, 1.0),
        )
        .await;
    }

    let response = get(app, "/api/v1/labels/B2C/kappa").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["usernames"], serde_json::json!(["u1", "u2"]));
    assert_eq!(json["data"]["values"][0][0], 1.0);
    assert_eq!(json["data"]["values"][0][1], 1.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn annotation_listing_resolves_agreement_links(pool: PgPool) {
    let app = common::build_test_app(pool);

    for (user, entity, value) in [
        ("u1", "acme.com", 1),
        ("u1", "fox.com", -1),
        ("u2", "acme.com", -1),
    ] {
        send_json(
            app.clone(),
            Method::POST,
            "/api/v1/annotations",
            &annotation(user, entity, value, 1.0),
        )
        .await;
    }

    let response = get(app.clone(), "/api/v1/labels/B2C/kappa").await;
    let json = body_json(response).await;
    let link = &json["data"]["links"][0];
    assert_eq!(link["users"], serde_json::json!(["u1", "u2"]));

    // Follow the link: each user's judgment of the shared entity.
    for (user, value) in [("u1", 1), ("u2", -1)] {
        let response = get(
            app.clone(),
            &format!("/api/v1/labels/B2C/annotations?username={user}&entity=acme.com"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let rows = json["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], user);
        assert_eq!(rows[0]["entity"], "acme.com");
        assert_eq!(rows[0]["value"], value);
    }

    // Username alone keeps every entity the user touched.
    let response = get(app, "/api/v1/labels/B2C/annotations?username=u1").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn patterns_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app.clone(),
        Method::PUT,
        "/api/v1/labels/B2C/patterns",
        &serde_json::json!({ "patterns": ["web shop", "checkout"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/api/v1/labels/B2C/patterns").await;
    let json = body_json(response).await;
    assert_eq!(json["data"], serde_json::json!(["web shop", "checkout"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn training_data_export_counts_records(pool: PgPool) {
    let app = common::build_test_app(pool);

    send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("u1", "acme.com", 1, 1.0),
    )
    .await;
    send_json(
        app.clone(),
        Method::POST,
        "/api/v1/annotations",
        &annotation("u1", "fox.com", -1, 1.0),
    )
    .await;

    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/v1/labels/B2C/training-data",
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["record_count"], 2);
    assert_eq!(json["data"]["dropped_count"], 0);

    // The export registered model version 1 and is owned by it.
    let response = get(app.clone(), "/api/v1/labels/B2C/models").await;
    let models = body_json(response).await;
    assert_eq!(models["data"].as_array().unwrap().len(), 1);
    assert_eq!(models["data"][0]["version"], 1);
    assert_eq!(json["data"]["model_id"], models["data"][0]["id"]);

    let path = json["data"]["output_path"].as_str().unwrap().to_string();
    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains(r#""labels":{"B2C":"#));

    let response = get(app, "/api/v1/labels/B2C/training-data").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_aggregate_cannot_be_exported(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = send_json(
        app,
        Method::POST,
        "/api/v1/labels/B2C/training-data",
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
