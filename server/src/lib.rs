use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use hotel_core::ingest::parse_submission_date;
use hotel_core::{HotelSearch, Review};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// A review supplied over the write path. Field names match the review
/// feed so clients can replay feed records unchanged.
#[derive(Deserialize)]
pub struct ReviewInput {
    #[serde(rename = "hotelId")]
    pub hotel_id: u64,
    #[serde(rename = "reviewId")]
    pub review_id: String,
    #[serde(default, rename = "ratingOverall")]
    pub rating_overall: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "reviewText")]
    pub text: String,
    #[serde(default, rename = "userNickname")]
    pub username: String,
    #[serde(default, rename = "reviewSubmissionTime")]
    pub submitted: Option<String>,
}

/// Routes layered over the read/query façade. Everything is read-only
/// except `POST /reviews`, which reaches the primary store only; the
/// word index always reflects the initial build.
pub fn build_app(search: Arc<HotelSearch>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/hotels", get(hotels_handler))
        .route("/hotel/:id", get(hotel_handler))
        .route("/hotel/:id/reviews", get(reviews_handler))
        .route("/word/:word", get(word_handler))
        .route("/reviews", post(add_review_handler))
        .with_state(search)
        .layer(cors)
}

async fn hotels_handler(State(search): State<Arc<HotelSearch>>) -> Json<Value> {
    Json(json!({ "hotelIds": search.hotel_ids() }))
}

async fn hotel_handler(
    State(search): State<Arc<HotelSearch>>,
    Path(id): Path<u64>,
) -> Json<Value> {
    match search.hotel(id) {
        Some(hotel) => Json(json!({
            "hotelId": hotel.id,
            "name": hotel.name,
            "latitude": hotel.latitude,
            "longitude": hotel.longitude,
            "street": hotel.address.street,
            "city": hotel.address.city,
            "state": hotel.address.state,
            "country": hotel.address.country,
            "averageRating": search.average_rating(id),
            "link": search.hotel_link(id),
        })),
        None => Json(json!({ "error": "not found" })),
    }
}

async fn reviews_handler(
    State(search): State<Arc<HotelSearch>>,
    Path(id): Path<u64>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    if !search.contains_hotel(id) {
        return Json(json!({ "error": "not found" }));
    }
    let reviews: Vec<Value> = search
        .reviews(id, params.limit)
        .iter()
        .map(|r| review_json(r))
        .collect();
    Json(json!({ "hotelId": id, "reviews": reviews }))
}

async fn word_handler(
    State(search): State<Arc<HotelSearch>>,
    Path(word): Path<String>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let reviews: Vec<Value> = search
        .reviews_with_word(&word, params.limit)
        .iter()
        .map(|r| review_json(r))
        .collect();
    Json(json!({ "word": word, "reviews": reviews }))
}

async fn add_review_handler(
    State(search): State<Arc<HotelSearch>>,
    Json(input): Json<ReviewInput>,
) -> Json<Value> {
    let username = if input.username.trim().is_empty() {
        "Anonymous".to_string()
    } else {
        input.username
    };
    let review_id = input.review_id.clone();
    search.upsert_review(Review {
        hotel_id: input.hotel_id,
        review_id: input.review_id,
        rating_overall: input.rating_overall,
        title: input.title,
        text: input.text,
        username,
        date_posted: input.submitted.as_deref().and_then(parse_submission_date),
    });
    Json(json!({ "success": true, "reviewId": review_id }))
}

fn review_json(review: &Review) -> Value {
    json!({
        "reviewId": review.review_id,
        "hotelId": review.hotel_id,
        "ratingOverall": review.rating_overall,
        "title": review.title,
        "reviewText": review.text,
        "userNickname": review.username,
        "datePosted": review.date_posted.map(|d| {
            format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
        }),
    })
}
