use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hotel_core::{build_store, HotelSearch, WordIndex};
use hotel_server::build_app;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn fixture_app() -> Router {
    let dir = tempdir().unwrap();
    let hotels = dir.path().join("hotels.json");
    fs::write(
        &hotels,
        r#"{ "sr": [ {
            "f": "Example Hotel - Downtown",
            "id": "100",
            "ll": { "lat": "37.78", "lng": "-122.41" },
            "ad": "1 Market St",
            "ci": "San Francisco",
            "pr": "CA",
            "c": "USA"
        } ] }"#,
    )
    .unwrap();

    let reviews = dir.path().join("reviews");
    fs::create_dir_all(&reviews).unwrap();
    fs::write(
        reviews.join("a.json"),
        r#"{ "reviewDetails": { "reviewCollection": { "review": [
            {
                "hotelId": 100,
                "reviewId": "reviewA",
                "ratingOverall": 4,
                "title": "",
                "reviewText": "great pool great staff",
                "userNickname": "guest",
                "reviewSubmissionTime": "2020-01-01T00:00:00Z"
            },
            {
                "hotelId": 100,
                "reviewId": "reviewB",
                "ratingOverall": 2,
                "title": "",
                "reviewText": "great location",
                "userNickname": "",
                "reviewSubmissionTime": "2021-06-15T00:00:00Z"
            }
        ] } } }"#,
    )
    .unwrap();

    let store = build_store(Some(&hotels), Some(&reviews), 2).unwrap();
    let words = WordIndex::build(&store, 2);
    build_app(Arc::new(HotelSearch::new(store, words)))
}

async fn get_json(app: Router, uri: &str) -> Value {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: Router, uri: &str, body: Value) -> Value {
    let req = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn hotel_endpoint_returns_metadata_and_derived_fields() {
    let body = get_json(fixture_app(), "/hotel/100").await;
    assert_eq!(body["name"], "Example Hotel - Downtown");
    assert_eq!(body["city"], "San Francisco");
    assert_eq!(body["averageRating"], 3.0);
    assert_eq!(
        body["link"],
        "expedia.com/San-Francisco-Hotels-Example-Hotel.h100.Hotel-Information"
    );
}

#[tokio::test]
async fn unknown_hotel_is_an_explicit_absence() {
    let body = get_json(fixture_app(), "/hotel/9999").await;
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn reviews_endpoint_lists_most_recent_first() {
    let body = get_json(fixture_app(), "/hotel/100/reviews").await;
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["reviewId"], "reviewB");
    assert_eq!(reviews[0]["datePosted"], "2021-06-15");
    assert_eq!(reviews[0]["userNickname"], "Anonymous");
    assert_eq!(reviews[1]["reviewId"], "reviewA");
}

#[tokio::test]
async fn reviews_endpoint_honors_limit() {
    let body = get_json(fixture_app(), "/hotel/100/reviews?limit=1").await;
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn word_endpoint_orders_by_count_then_recency() {
    let body = get_json(fixture_app(), "/word/great").await;
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    // reviewA says "great" twice, so it outranks the newer reviewB
    assert_eq!(reviews[0]["reviewId"], "reviewA");
    assert_eq!(reviews[1]["reviewId"], "reviewB");
}

#[tokio::test]
async fn posted_reviews_reach_the_store_but_not_the_word_index() {
    let app = fixture_app();

    let posted = post_json(
        app.clone(),
        "/reviews",
        json!({
            "hotelId": 100,
            "reviewId": "reviewC",
            "ratingOverall": 5,
            "reviewText": "spotless and great",
            "userNickname": "newcomer",
            "reviewSubmissionTime": "2024-05-05T12:00:00Z"
        }),
    )
    .await;
    assert_eq!(posted["success"], true);

    let listed = get_json(app.clone(), "/hotel/100/reviews").await;
    let reviews = listed["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0]["reviewId"], "reviewC");

    // rebuild-only indexing: the new body never reaches findWord
    let spotless = get_json(app.clone(), "/word/spotless").await;
    assert!(spotless["reviews"].as_array().unwrap().is_empty());
    let great = get_json(app, "/word/great").await;
    assert_eq!(great["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_endpoint_answers() {
    let resp = fixture_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
