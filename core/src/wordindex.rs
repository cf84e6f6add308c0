use crate::model::Review;
use crate::pool::{PendingTasks, WorkerPool};
use crate::store::HotelStore;
use crate::tokenizer::tokenize;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// How many per-hotel review sets one tally task takes. Tuning constant
/// only; results are identical for any value.
const SETS_PER_BATCH: usize = 8;

/// Occurrence count -> reviews with that count. The outer map iterates
/// count-descending via `Reverse`; the inner set iterates date-descending
/// (review id ascending on ties) via `Review`'s ordering.
type Buckets = BTreeMap<Reverse<u32>, BTreeSet<Arc<Review>>>;

/// One task's private tally: word -> (review -> occurrences in its body).
type LocalCounts = HashMap<String, HashMap<Arc<Review>, u32>>;

/// Inverted index from normalized word to the reviews containing it,
/// bucketed by per-review occurrence count. Built once after the primary
/// store is complete; read-locked thereafter.
#[derive(Default)]
pub struct WordIndex {
    inner: RwLock<HashMap<String, Buckets>>,
}

impl WordIndex {
    /// Tokenize every review body in `store` across a pool of `threads`
    /// workers and return the completed index. Blocks until every batch
    /// task has merged.
    pub fn build(store: &HotelStore, threads: usize) -> Arc<WordIndex> {
        let index = Arc::new(WordIndex::default());
        let sets = store.review_sets();
        let batches = sets.chunks(SETS_PER_BATCH).count();

        let pool = WorkerPool::new(threads);
        let pending = PendingTasks::new();
        for batch in sets.chunks(SETS_PER_BATCH) {
            let batch = batch.to_vec();
            let index = Arc::clone(&index);
            let guard = pending.register();
            pool.execute(move || {
                let _guard = guard;
                index.merge(tally(&batch));
            });
        }
        pending.wait();
        drop(pool);

        tracing::debug!(words = index.len(), batches, "word index built");
        index
    }

    /// Fold one task's tally in under a single write-lock acquisition.
    /// Counts combine additively per (word, review), re-bucketing each
    /// review by its updated total.
    fn merge(&self, local: LocalCounts) {
        let mut inner = self.inner.write();
        for (word, per_review) in local {
            let buckets = inner.entry(word).or_default();
            for (review, count) in per_review {
                let total = count + take_existing(buckets, &review);
                buckets.entry(Reverse(total)).or_default().insert(review);
            }
        }
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.inner.read().contains_key(word)
    }

    /// Reviews containing `word`, highest occurrence count first, most
    /// recent first within a count. Empty for unknown words.
    pub fn find_word(&self, word: &str) -> Vec<Arc<Review>> {
        match self.inner.read().get(word) {
            Some(buckets) => buckets
                .values()
                .flat_map(|set| set.iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Count word occurrences per review over one batch of review sets,
/// touching no shared state.
fn tally(batch: &[Vec<Arc<Review>>]) -> LocalCounts {
    let mut counts = LocalCounts::new();
    for set in batch {
        for review in set {
            for token in tokenize(&review.text) {
                *counts
                    .entry(token)
                    .or_default()
                    .entry(Arc::clone(review))
                    .or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Pull `review` out of whichever bucket currently holds it and return its
/// previous count, so a re-merge lands in the combined bucket.
fn take_existing(buckets: &mut Buckets, review: &Arc<Review>) -> u32 {
    let mut hit = None;
    for (count, set) in buckets.iter_mut() {
        if set.remove(review) {
            hit = Some((*count, set.is_empty()));
            break;
        }
    }
    match hit {
        Some((count, emptied)) => {
            if emptied {
                buckets.remove(&count);
            }
            count.0
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn review(id: &str, body: &str, day: time::Date) -> Arc<Review> {
        Arc::new(Review {
            hotel_id: 1,
            review_id: id.to_string(),
            rating_overall: 5,
            title: String::new(),
            text: body.to_string(),
            username: "guest".to_string(),
            date_posted: Some(day),
        })
    }

    #[test]
    fn buckets_order_by_count_then_recency() {
        let index = WordIndex::default();
        let twice = review("a", "great pool great staff", date!(2020 - 01 - 01));
        let once = review("b", "great location", date!(2021 - 06 - 15));
        index.merge(tally(&[vec![Arc::clone(&twice), Arc::clone(&once)]]));

        let hits = index.find_word("great");
        let ids: Vec<&str> = hits.iter().map(|r| r.review_id.as_str()).collect();
        // count 2 beats count 1 despite the older date
        assert_eq!(ids, vec!["a", "b"]);

        let pool_hits = index.find_word("pool");
        assert_eq!(pool_hits.len(), 1);
        assert_eq!(pool_hits[0].review_id, "a");
    }

    #[test]
    fn recency_breaks_ties_within_a_bucket() {
        let index = WordIndex::default();
        let older = review("x", "quiet street", date!(2018 - 03 - 03));
        let newer = review("y", "quiet garden", date!(2022 - 04 - 04));
        index.merge(tally(&[vec![older, newer]]));

        let ids: Vec<String> = index
            .find_word("quiet")
            .iter()
            .map(|r| r.review_id.clone())
            .collect();
        assert_eq!(ids, vec!["y", "x"]);
    }

    #[test]
    fn merge_is_additive_and_rebuckets() {
        let index = WordIndex::default();
        let r = review("a", "breakfast", date!(2020 - 01 - 01));

        let mut first = LocalCounts::new();
        first
            .entry("breakfast".to_string())
            .or_default()
            .insert(Arc::clone(&r), 1);
        index.merge(first);

        let mut second = LocalCounts::new();
        second
            .entry("breakfast".to_string())
            .or_default()
            .insert(Arc::clone(&r), 2);
        index.merge(second);

        let hits = index.find_word("breakfast");
        assert_eq!(hits.len(), 1);

        let inner = index.inner.read();
        let buckets = inner.get("breakfast").unwrap();
        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains_key(&Reverse(3)));
    }

    #[test]
    fn unknown_words_are_empty_not_errors() {
        let index = WordIndex::default();
        assert!(!index.contains_word("anything"));
        assert!(index.find_word("anything").is_empty());
    }

    #[test]
    fn stopwords_and_short_tokens_never_index() {
        let index = WordIndex::default();
        let r = review("a", "it was so ok", date!(2020 - 01 - 01));
        index.merge(tally(&[vec![r]]));
        assert!(!index.contains_word("it"));
        assert!(!index.contains_word("was"));
        assert!(!index.contains_word("ok"));
        assert!(index.is_empty());
    }
}
