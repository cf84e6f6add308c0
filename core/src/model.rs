use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use time::Date;

/// Street address of a hotel. Owned by exactly one [`Hotel`]; every field
/// may be empty when the source document omitted it.
#[derive(Debug, Clone, Default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}, {}", self.street, self.city, self.state)
    }
}

/// Hotel metadata. Created once per id and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Hotel {
    pub name: String,
    /// Numeric id, up to ~10 decimal digits, unique across the dataset.
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Address,
}

impl fmt::Display for Hotel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}\n{}", self.name, self.id, self.address)
    }
}

/// A single hotel review.
///
/// Equality and hashing follow review identity alone (`review_id`);
/// ordering is date posted descending, review id ascending on ties. A
/// missing date sorts as the minimum possible date.
#[derive(Debug, Clone)]
pub struct Review {
    pub hotel_id: u64,
    pub review_id: String,
    pub rating_overall: i32,
    pub title: String,
    pub text: String,
    pub username: String,
    pub date_posted: Option<Date>,
}

impl Review {
    /// Title and body joined with a space, skipping whichever is blank.
    pub fn full_text(&self) -> String {
        match (self.title.trim().is_empty(), self.text.trim().is_empty()) {
            (true, true) => String::new(),
            (true, false) => self.text.clone(),
            (false, true) => self.title.clone(),
            (false, false) => format!("{} {}", self.title, self.text),
        }
    }
}

impl PartialEq for Review {
    fn eq(&self, other: &Self) -> bool {
        self.review_id == other.review_id
    }
}

impl Eq for Review {}

impl Hash for Review {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.review_id.hash(state);
    }
}

impl Ord for Review {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .date_posted
            .cmp(&self.date_posted)
            .then_with(|| self.review_id.cmp(&other.review_id))
    }
}

impl PartialOrd for Review {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Review by {} on ", self.username)?;
        match self.date_posted {
            Some(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())?,
            None => write!(f, "unknown")?,
        }
        write!(
            f,
            "\nRating: {}\nReviewId: {}\n{}\n{}",
            self.rating_overall, self.review_id, self.title, self.text
        )
    }
}
