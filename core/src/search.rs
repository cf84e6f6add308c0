use crate::model::{Hotel, Review};
use crate::store::HotelStore;
use crate::wordindex::WordIndex;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
}

/// Read-only query façade over the primary store and the word index.
/// Every operation takes only read locks and is safe for any number of
/// concurrent callers once the build phase has completed.
#[derive(Clone)]
pub struct HotelSearch {
    store: Arc<HotelStore>,
    words: Arc<WordIndex>,
}

impl HotelSearch {
    pub fn new(store: Arc<HotelStore>, words: Arc<WordIndex>) -> Self {
        Self { store, words }
    }

    pub fn contains_hotel(&self, id: u64) -> bool {
        self.store.contains_hotel(id)
    }

    pub fn hotel(&self, id: u64) -> Option<Hotel> {
        self.store.find_hotel(id)
    }

    /// A hotel's reviews, date descending then review id ascending,
    /// optionally truncated to `limit`.
    pub fn reviews(&self, id: u64, limit: Option<usize>) -> Vec<Arc<Review>> {
        let mut reviews = self.store.find_reviews(id);
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        reviews
    }

    /// Mean of the hotel's overall ratings; absent when it has none.
    pub fn average_rating(&self, id: u64) -> Option<f64> {
        let reviews = self.store.find_reviews(id);
        if reviews.is_empty() {
            return None;
        }
        let sum: i64 = reviews.iter().map(|r| i64::from(r.rating_overall)).sum();
        Some(sum as f64 / reviews.len() as f64)
    }

    /// Canonical outbound link for a hotel: the name is cut at the first
    /// " - " separator, stripped of non-alphanumerics, and hyphenated.
    pub fn hotel_link(&self, id: u64) -> Option<String> {
        let hotel = self.hotel(id)?;
        let name = match hotel.name.find(" - ") {
            Some(idx) => hotel.name[..idx].trim(),
            None => hotel.name.as_str(),
        };
        let name = NON_WORD.replace_all(name, "").replace(' ', "-");
        let city = hotel.address.city.replace(' ', "-");
        Some(format!(
            "expedia.com/{city}-Hotels-{name}.h{id}.Hotel-Information"
        ))
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains_word(&word.to_lowercase())
    }

    /// Reviews containing `word` (case-insensitive), occurrence count
    /// descending then date descending, optionally truncated to `limit`.
    pub fn reviews_with_word(&self, word: &str, limit: Option<usize>) -> Vec<Arc<Review>> {
        let mut reviews = self.words.find_word(&word.to_lowercase());
        if let Some(limit) = limit {
            reviews.truncate(limit);
        }
        reviews
    }

    /// Every hotel id, in store (textual) order.
    pub fn hotel_ids(&self) -> Vec<u64> {
        self.store.hotel_ids()
    }

    /// Accept a newly created review from a collaborator. The word index
    /// is not updated; it only ever reflects the initial build.
    pub fn add_review(&self, review: Review) {
        self.store.add_review(review);
    }

    /// Accept an edited review from a collaborator, replacing any
    /// existing review with the same id.
    pub fn upsert_review(&self, review: Review) {
        self.store.upsert_review(review);
    }

    /// Write the flat diagnostic dump to `path`.
    pub fn write_dump(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("could not open dump file {}", path.display()))?;
        self.store
            .write_dump(BufWriter::new(file))
            .with_context(|| format!("could not write dump file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Address;
    use time::macros::date;

    fn search_with(hotels: Vec<Hotel>, reviews: Vec<Review>) -> HotelSearch {
        let store = Arc::new(HotelStore::new());
        store.merge_hotels(hotels);
        store.merge_reviews(reviews.into_iter().collect());
        let words = WordIndex::build(&store, 2);
        HotelSearch::new(store, words)
    }

    fn hotel(id: u64, name: &str, city: &str) -> Hotel {
        Hotel {
            name: name.to_string(),
            id,
            latitude: 0.0,
            longitude: 0.0,
            address: Address {
                street: "1 Main St".to_string(),
                city: city.to_string(),
                state: "CA".to_string(),
                country: "USA".to_string(),
            },
        }
    }

    fn review(hotel_id: u64, review_id: &str, rating: i32, body: &str, day: time::Date) -> Review {
        Review {
            hotel_id,
            review_id: review_id.to_string(),
            rating_overall: rating,
            title: String::new(),
            text: body.to_string(),
            username: "guest".to_string(),
            date_posted: Some(day),
        }
    }

    #[test]
    fn average_rating_is_absent_without_reviews() {
        let search = search_with(vec![hotel(1, "Solo Inn", "Reno")], vec![]);
        assert_eq!(search.average_rating(1), None);
    }

    #[test]
    fn average_rating_is_the_mean() {
        let search = search_with(
            vec![hotel(1, "Solo Inn", "Reno")],
            vec![
                review(1, "a", 5, "", date!(2020 - 01 - 01)),
                review(1, "b", 2, "", date!(2020 - 01 - 02)),
            ],
        );
        assert_eq!(search.average_rating(1), Some(3.5));
    }

    #[test]
    fn link_truncates_name_and_hyphenates() {
        let search = search_with(
            vec![hotel(100, "Example Hotel - Downtown", "San Francisco")],
            vec![],
        );
        assert_eq!(
            search.hotel_link(100).unwrap(),
            "expedia.com/San-Francisco-Hotels-Example-Hotel.h100.Hotel-Information"
        );
    }

    #[test]
    fn link_strips_punctuation() {
        let search = search_with(vec![hotel(7, "St. Mark's Inn & Suites", "Boise")], vec![]);
        assert_eq!(
            search.hotel_link(7).unwrap(),
            "expedia.com/Boise-Hotels-St-Marks-Inn--Suites.h7.Hotel-Information"
        );
    }

    #[test]
    fn link_is_absent_for_unknown_or_metadata_less_hotels() {
        let search = search_with(vec![], vec![review(9, "r", 3, "", date!(2020 - 01 - 01))]);
        assert_eq!(search.hotel_link(9), None);
        assert_eq!(search.hotel_link(12345), None);
    }

    #[test]
    fn word_lookup_is_case_insensitive_and_bounded() {
        let search = search_with(
            vec![],
            vec![
                review(1, "a", 5, "great pool great staff", date!(2020 - 01 - 01)),
                review(1, "b", 4, "great location", date!(2021 - 06 - 15)),
            ],
        );
        assert!(search.contains_word("GREAT"));
        let hits = search.reviews_with_word("Great", None);
        assert_eq!(hits.len(), 2);
        let bounded = search.reviews_with_word("great", Some(1));
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].review_id, "a");
    }

    #[test]
    fn added_reviews_reach_the_store_but_not_the_word_index() {
        let search = search_with(
            vec![],
            vec![review(1, "a", 5, "spotless lobby", date!(2020 - 01 - 01))],
        );
        search.add_review(review(1, "b", 4, "spotless rooms", date!(2022 - 02 - 02)));

        assert_eq!(search.reviews(1, None).len(), 2);
        // rebuild-only indexing: the new body is invisible to findWord
        let hits = search.reviews_with_word("spotless", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].review_id, "a");
    }
}
