use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Tokens shorter than this never reach the index.
const MIN_TOKEN_LEN: usize = 3;

lazy_static! {
    static ref NON_LETTER: Regex = Regex::new(r"[^a-zA-Z' ]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","your","yours","yourself","yourselves",
            "he","him","his","himself","she","her","hers","herself","it","its","itself",
            "they","them","their","theirs","themselves","what","which","who","whom","this","that","these","those",
            "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
            "a","an","the","and","but","if","or","because","as","until","while",
            "of","at","by","for","with","about","against","between","into","through","during","before","after",
            "above","below","to","from","up","down","in","out","on","off","over","under",
            "again","further","then","once","here","there","when","where","why","how",
            "all","any","both","each","few","more","most","other","some","such",
            "no","nor","not","only","own","same","so","than","too","very",
            "s","t","can","will","just","don","should","now"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Tokenize review text: everything outside letters, apostrophes, and
/// spaces becomes a space, then lowercase, split on whitespace, and drop
/// short tokens and stopwords. Duplicates are preserved so callers can
/// count occurrences.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned = NON_LETTER.replace_all(text, " ").to_lowercase();
    cleaned
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !is_stopword(t))
        .map(str::to_owned)
        .collect()
}
