use crate::model::{Address, Hotel, Review};
use crate::pool::{PendingTasks, WorkerPool};
use crate::store::HotelStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;
use walkdir::WalkDir;

/// Build the primary store from the hotels metadata document and the
/// review-file tree, parsing review files on a pool of `threads` workers.
///
/// An unopenable reviews root or hotels file (or an unparseable hotels
/// document) is fatal and returned as an error. A single bad review file
/// only loses that file's reviews.
pub fn build_store(
    hotels_file: Option<&Path>,
    reviews_root: Option<&Path>,
    threads: usize,
) -> Result<Arc<HotelStore>> {
    let store = Arc::new(HotelStore::new());
    let mut workers = None;

    if let Some(root) = reviews_root {
        fs::read_dir(root)
            .with_context(|| format!("could not open reviews directory {}", root.display()))?;

        let pool = WorkerPool::new(threads);
        let pending = PendingTasks::new();
        let mut dispatched = 0usize;

        // The traversal itself stays on this thread; only per-file
        // parsing goes to the pool.
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let path = path.to_path_buf();
            let store = Arc::clone(&store);
            let guard = pending.register();
            pool.execute(move || {
                let _guard = guard;
                match parse_review_file(&path) {
                    Ok(reviews) => store.merge_reviews(reviews),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), %err, "skipping review file");
                    }
                }
            });
            dispatched += 1;
        }

        tracing::debug!(files = dispatched, "review parse tasks dispatched");
        workers = Some((pool, pending));
    }

    if let Some(path) = hotels_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not open hotels file {}", path.display()))?;
        let hotels = parse_hotels(&text)
            .with_context(|| format!("could not parse hotels file {}", path.display()))?;
        tracing::debug!(hotels = hotels.len(), "hotel metadata parsed");
        store.merge_hotels(hotels);
    }

    if let Some((pool, pending)) = workers {
        pending.wait();
        drop(pool);
    }

    tracing::info!(
        hotels = store.len(),
        reviews = store.review_count(),
        "primary store built"
    );
    Ok(store)
}

/// Read and deserialize one review file into a private, identity-deduped
/// set, without touching shared state.
fn parse_review_file(path: &Path) -> Result<HashSet<Review>> {
    let text = fs::read_to_string(path)?;
    parse_reviews(&text)
}

fn parse_reviews(text: &str) -> Result<HashSet<Review>> {
    let file: ReviewFile = serde_json::from_str(text)?;
    Ok(file
        .details
        .collection
        .review
        .into_iter()
        .map(Review::from)
        .collect())
}

fn parse_hotels(text: &str) -> Result<Vec<Hotel>> {
    let file: HotelsFile = serde_json::from_str(text)?;
    Ok(file.sr.into_iter().map(Hotel::from).collect())
}

// Review documents arrive nested under a fixed envelope:
// reviewDetails.reviewCollection.review[].

#[derive(Deserialize)]
struct ReviewFile {
    #[serde(rename = "reviewDetails")]
    details: ReviewDetails,
}

#[derive(Deserialize)]
struct ReviewDetails {
    #[serde(rename = "reviewCollection")]
    collection: ReviewCollection,
}

#[derive(Deserialize)]
struct ReviewCollection {
    #[serde(default)]
    review: Vec<RawReview>,
}

#[derive(Deserialize)]
struct RawReview {
    #[serde(default, rename = "hotelId", deserialize_with = "lenient_u64")]
    hotel_id: u64,
    #[serde(default, rename = "reviewId")]
    review_id: String,
    #[serde(default, rename = "ratingOverall", deserialize_with = "lenient_i32")]
    rating_overall: i32,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "reviewText")]
    text: String,
    #[serde(default, rename = "userNickname")]
    username: String,
    #[serde(default, rename = "reviewSubmissionTime")]
    submitted: Option<String>,
}

impl From<RawReview> for Review {
    fn from(raw: RawReview) -> Self {
        let username = if raw.username.trim().is_empty() {
            "Anonymous".to_string()
        } else {
            raw.username
        };
        Review {
            hotel_id: raw.hotel_id,
            review_id: raw.review_id,
            rating_overall: raw.rating_overall,
            title: raw.title,
            text: raw.text,
            username,
            date_posted: raw.submitted.as_deref().and_then(parse_submission_date),
        }
    }
}

// The hotels document is an object with one "sr" array; field names are
// the source feed's abbreviations (f = name, ad = street, ci = city,
// pr = state/province, c = country). Numeric fields often arrive as
// JSON strings.

#[derive(Deserialize)]
struct HotelsFile {
    #[serde(default)]
    sr: Vec<RawHotel>,
}

#[derive(Deserialize)]
struct RawHotel {
    #[serde(default)]
    f: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default)]
    ll: RawCoords,
    #[serde(default)]
    ad: String,
    #[serde(default)]
    ci: String,
    #[serde(default)]
    pr: String,
    #[serde(default)]
    c: String,
}

#[derive(Default, Deserialize)]
struct RawCoords {
    #[serde(default, deserialize_with = "lenient_f64")]
    lat: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    lng: f64,
}

impl From<RawHotel> for Hotel {
    fn from(raw: RawHotel) -> Self {
        Hotel {
            name: raw.f,
            id: raw.id,
            latitude: raw.ll.lat,
            longitude: raw.ll.lng,
            address: Address {
                street: raw.ad,
                city: raw.ci,
                state: raw.pr,
                country: raw.c,
            },
        }
    }
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date from the leading `YYYY-MM-DD` of an ISO-8601 timestamp;
/// anything unparseable degrades to no date.
pub fn parse_submission_date(raw: &str) -> Option<Date> {
    Date::parse(raw.get(..10)?, DATE_FORMAT).ok()
}

// A numeric field in the feed may be a number, a string-wrapped number,
// or junk; junk degrades to the default rather than failing the record.

fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_i32<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(|i| i32::try_from(i).unwrap_or(0))
            .or_else(|| n.as_f64().map(|f| f as i32))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
