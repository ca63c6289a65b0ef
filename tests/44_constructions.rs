mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;
use teklif_api::database::FeatureScope;
use teklif_api::types::{CategoryId, FeatureId, FeatureType};

struct Catalog {
    root: CategoryId,
    leaf: CategoryId,
    floors: FeatureId,
}

// Yapı -> Konut -> Apartman
async fn seed(server: &TestServer) -> Catalog {
    let root = server
        .catalog
        .seed_category(FeatureScope::Construction, "Yapı", None)
        .await;
    let mid = server
        .catalog
        .seed_category(FeatureScope::Construction, "Konut", Some(root.id))
        .await;
    let residential = server
        .catalog
        .seed_category(FeatureScope::Construction, "Apartman", Some(mid.id))
        .await;
    let floors = server
        .catalog
        .seed_feature(
            FeatureScope::Construction,
            residential.id,
            "floors",
            FeatureType::Integer,
            true,
        )
        .await;
    Catalog {
        root: root.id,
        leaf: residential.id,
        floors: floors.id,
    }
}

fn construction_body(category: CategoryId, floors: FeatureId, floors_value: &str) -> Value {
    json!({
        "name": "Kuzey Konutları",
        "construction_category_id": category,
        "geographic_region": "Marmara",
        "province": "İstanbul",
        "district": "Sarıyer",
        "stage": "Temel",
        "start": "2024 - 3.Çeyrek",
        "end": "2026 - 1.Çeyrek",
        "cost_of_project": 1250000.456,
        "land_area": 5400.0,
        "Construction_zone": 3200.5,
        "construction_images": [{"remote_link": "https://cdn.example.com/site.png"}],
        "construction_features": [{"feature_id": floors, "value": floors_value}]
    })
}

#[tokio::test]
async fn construction_lifecycle_for_owner() -> Result<()> {
    let server = TestServer::start().await?;
    let Catalog { root, leaf: category, floors } = seed(&server).await;
    let token = server.token("builder@example.com", false, true).await?;

    let created = server
        .client
        .post(server.api("/constructor/construction"))
        .bearer_auth(&token)
        .json(&construction_body(category, floors, "12"))
        .send()
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = created.json::<Value>().await?;
    assert_eq!(body["code"], 800);
    assert_eq!(body["data"]["cost_of_project"], "1250000.46");
    let id = body["data"]["id"].as_i64().unwrap_or_default();

    let updated = server
        .client
        .put(server.api(&format!("/constructor/construction/{id}")))
        .bearer_auth(&token)
        .json(&json!({"stage": "Kaba", "land_area": 6000.129}))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = updated.json::<Value>().await?;
    assert_eq!(body["data"]["stage"], "Kaba");
    assert_eq!(body["data"]["land_area"], "6000.13");

    let listed: Value = server
        .client
        .get(server.api(&format!("/constructor/constructions/{root}")))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));

    let deleted = server
        .client
        .delete(server.api(&format!("/constructor/construction/{id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = server
        .client
        .get(server.api(&format!("/constructor/construction/{id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn construction_rejects_bad_input() -> Result<()> {
    let server = TestServer::start().await?;
    let Catalog { leaf: category, floors, .. } = seed(&server).await;
    let token = server.token("careful@example.com", false, true).await?;

    let mut negative = construction_body(category, floors, "12");
    negative["land_area"] = json!(-1.0);
    negative["start"] = json!("Q3 2024");
    let res = server
        .client
        .post(server.api("/constructor/construction"))
        .bearer_auth(&token)
        .json(&negative)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error_code"], 900);
    assert!(body["field_errors"]["land_area"].is_string());
    assert!(body["field_errors"]["start"].is_string());

    let res = server
        .client
        .post(server.api("/constructor/construction"))
        .bearer_auth(&token)
        .json(&construction_body(category, floors, "twelve"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error_code"], 901);
    assert_eq!(body["message"], "construction feature is wrong type");

    let res = server
        .client
        .post(server.api("/constructor/construction"))
        .bearer_auth(&token)
        .body("{not json")
        .header("content-type", "application/json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn constructions_are_private_to_their_company() -> Result<()> {
    let server = TestServer::start().await?;
    let Catalog { leaf: category, floors, .. } = seed(&server).await;
    let owner = server.token("owner@example.com", false, true).await?;
    let other = server.token("other@example.com", true, true).await?;

    let created: Value = server
        .client
        .post(server.api("/constructor/construction"))
        .bearer_auth(&owner)
        .json(&construction_body(category, floors, "4"))
        .send()
        .await?
        .json()
        .await?;
    let id = created["data"]["id"].as_i64().unwrap_or_default();

    let peek = server
        .client
        .get(server.api(&format!("/constructor/construction/{id}")))
        .bearer_auth(&other)
        .send()
        .await?;
    assert_eq!(peek.status(), StatusCode::NOT_FOUND);
    let body = peek.json::<Value>().await?;
    assert_eq!(body["error_code"], 902);

    let delete = server
        .client
        .delete(server.api(&format!("/constructor/construction/{id}")))
        .bearer_auth(&other)
        .send()
        .await?;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let features: Value = server
        .client
        .get(server.api(&format!("/constructor/feature/{category}")))
        .bearer_auth(&other)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(features["data"][0]["name"], "floors");
    assert_eq!(features["data"][0]["is_required"], true);
    Ok(())
}
