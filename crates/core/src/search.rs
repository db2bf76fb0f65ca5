//! Word normalization for catalog search.
//!
//! Mirrors the parts of `PostgreSQL`'s `english` text search configuration
//! that matter for product names: the same stopword list, and the suffix
//! folding of the Snowball stemmer's plural and trailing-`y` steps. The full
//! stemmer goes further (`vintage` becomes `vintag`), so the database can
//! match a few derived forms this module keeps apart; its results are the
//! reference.

/// The `english.stop` list shipped with `PostgreSQL`.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now",
];

/// Whether a lowercased word is ignored by search.
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

const fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Fold plural and trailing-`y` suffixes of a lowercased word.
///
/// `shirts` and `shirt` both become `shirt`; `accessories` and `accessory`
/// both become `accessori`.
#[must_use]
pub fn stem(word: &str) -> String {
    let mut stemmed = if let Some(base) = word.strip_suffix("sses") {
        format!("{base}ss")
    } else if let Some(base) = word.strip_suffix("ies").or_else(|| word.strip_suffix("ied")) {
        if base.chars().count() > 1 {
            format!("{base}i")
        } else {
            format!("{base}ie")
        }
    } else if word.ends_with("us") || word.ends_with("ss") {
        word.to_owned()
    } else if let Some(base) = word.strip_suffix('s') {
        // Drop the `s` only if a vowel appears before the letter preceding it.
        let mut head = base.chars();
        head.next_back();
        if head.any(is_vowel) {
            base.to_owned()
        } else {
            word.to_owned()
        }
    } else {
        word.to_owned()
    };

    // A final `y` after a consonant that is not the first letter becomes `i`.
    let chars: Vec<char> = stemmed.chars().collect();
    if let [.., before, 'y'] = chars.as_slice()
        && chars.len() > 2
        && !is_vowel(*before)
    {
        stemmed.pop();
        stemmed.push('i');
    }
    stemmed
}

/// Lowercased alphanumeric words of `text`, stopwords removed.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !is_stopword(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_folding() {
        assert_eq!(stem("shirts"), stem("shirt"));
        assert_eq!(stem("dresses"), "dress");
        assert_eq!(stem("accessories"), stem("accessory"));
        assert_eq!(stem("ties"), "tie");
        assert_eq!(stem("gas"), "gas");
        assert_eq!(stem("corpus"), "corpus");
        assert_eq!(stem("silk"), "silk");
    }

    #[test]
    fn test_final_y() {
        assert_eq!(stem("cry"), "cri");
        assert_eq!(stem("by"), "by");
        assert_eq!(stem("say"), "say");
    }

    #[test]
    fn test_words_skip_stopwords() {
        let found: Vec<String> = words("The Jacket, and THE boots!").collect();
        assert_eq!(found, vec!["jacket", "boots"]);
        assert!(is_stopword("the"));
        assert!(!is_stopword("denim"));
    }
}
