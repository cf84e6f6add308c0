use crate::model::{Hotel, Review};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};
use std::sync::Arc;

/// One primary-store slot: hotel metadata, if any has arrived, plus the
/// hotel's review set. Reviews arriving before (or without) metadata is a
/// valid, permanent state.
#[derive(Default)]
pub struct HotelEntry {
    pub hotel: Option<Hotel>,
    pub reviews: HashSet<Arc<Review>>,
}

/// Primary store: hotel id -> ([`HotelEntry`]). Keys are the id's base-10
/// text, so iteration follows textual order ("10" sorts before "9"), which
/// is the order the diagnostic dump is written in.
///
/// Writers (merge steps) take the write lock for the duration of one merge
/// only; once the build completes, any number of readers may proceed
/// concurrently under the read lock.
#[derive(Default)]
pub struct HotelStore {
    inner: RwLock<BTreeMap<String, HotelEntry>>,
}

impl HotelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parse task's private result into the store under a single
    /// write-lock acquisition. A review whose id is already present is
    /// left untouched.
    pub fn merge_reviews(&self, reviews: HashSet<Review>) {
        let mut inner = self.inner.write();
        for review in reviews {
            let entry = inner.entry(review.hotel_id.to_string()).or_default();
            entry.reviews.insert(Arc::new(review));
        }
    }

    /// Insert-or-update the metadata half of each hotel's entry, keeping
    /// any review set already merged for that id. Later metadata wins.
    pub fn merge_hotels(&self, hotels: Vec<Hotel>) {
        let mut inner = self.inner.write();
        for hotel in hotels {
            let entry = inner.entry(hotel.id.to_string()).or_default();
            entry.hotel = Some(hotel);
        }
    }

    /// Add a single review supplied by a collaborator after the build.
    /// No-op when a review with the same id already exists. The word
    /// index is never updated through this path.
    pub fn add_review(&self, review: Review) {
        let mut inner = self.inner.write();
        let entry = inner.entry(review.hotel_id.to_string()).or_default();
        entry.reviews.insert(Arc::new(review));
    }

    /// Replace-by-identity variant of [`add_review`](Self::add_review),
    /// used by the review-editing surface.
    pub fn upsert_review(&self, review: Review) {
        let mut inner = self.inner.write();
        let entry = inner.entry(review.hotel_id.to_string()).or_default();
        entry.reviews.replace(Arc::new(review));
    }

    pub fn contains_hotel(&self, id: u64) -> bool {
        self.inner.read().contains_key(id.to_string().as_str())
    }

    pub fn find_hotel(&self, id: u64) -> Option<Hotel> {
        self.inner
            .read()
            .get(id.to_string().as_str())
            .and_then(|entry| entry.hotel.clone())
    }

    /// Snapshot of a hotel's reviews, date descending then review id
    /// ascending. Empty for unknown ids.
    pub fn find_reviews(&self, id: u64) -> Vec<Arc<Review>> {
        let mut reviews: Vec<Arc<Review>> = match self.inner.read().get(id.to_string().as_str()) {
            Some(entry) => entry.reviews.iter().cloned().collect(),
            None => return Vec::new(),
        };
        reviews.sort_unstable();
        reviews
    }

    /// Every hotel id in store (textual) order.
    pub fn hotel_ids(&self) -> Vec<u64> {
        self.inner
            .read()
            .keys()
            .filter_map(|key| key.parse().ok())
            .collect()
    }

    /// Snapshots of every non-empty review set, in store order. Input to
    /// the word-index builder.
    pub fn review_sets(&self) -> Vec<Vec<Arc<Review>>> {
        self.inner
            .read()
            .values()
            .filter(|entry| !entry.reviews.is_empty())
            .map(|entry| entry.reviews.iter().cloned().collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn review_count(&self) -> usize {
        self.inner.read().values().map(|e| e.reviews.len()).sum()
    }

    /// Flat diagnostic dump: every hotel (when metadata exists) followed by
    /// its reviews in the ordering invariant, in store order.
    pub fn write_dump<W: Write>(&self, mut out: W) -> io::Result<()> {
        let inner = self.inner.read();
        for entry in inner.values() {
            if let Some(hotel) = &entry.hotel {
                write!(out, "\n********************\n{hotel}\n")?;
            }
            let mut reviews: Vec<&Arc<Review>> = entry.reviews.iter().collect();
            reviews.sort_unstable();
            for review in reviews {
                write!(out, "--------------------\n{review}\n")?;
            }
        }
        Ok(())
    }
}
