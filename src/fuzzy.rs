//! Approximate string similarity for search ranking
//!
//! Scores are in `[0.0, 1.0]`. The measure is a Dice coefficient over
//! character bigrams, case-insensitive, with substring containment treated
//! as a full match so that literal queries ("invoice") always outrank
//! near-misses. Good enough for ranking subjects and senders; not a
//! linguistic distance.

/// Similarity between a search term and a candidate string
pub fn similarity(term: &str, candidate: &str) -> f64 {
    let term = normalize(term);
    let candidate = normalize(candidate);
    if term.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if candidate.contains(&term) || term.contains(&candidate) {
        return 1.0;
    }

    let term_bigrams = bigrams(&term);
    let candidate_bigrams = bigrams(&candidate);
    if term_bigrams.is_empty() || candidate_bigrams.is_empty() {
        // Single-character inputs have no bigrams; fall back to equality,
        // which the containment check above already handled.
        return 0.0;
    }

    let mut remaining = candidate_bigrams;
    let mut matches = 0usize;
    for gram in &term_bigrams {
        if let Some(index) = remaining.iter().position(|other| other == gram) {
            remaining.swap_remove(index);
            matches += 1;
        }
    }

    (2.0 * matches as f64) / (term_bigrams.len() + matches + remaining.len()) as f64
}

/// Best similarity of a term against a message's subject and sender
pub fn best_score(term: &str, subject: &str, sender: &str) -> f64 {
    similarity(term, subject).max(similarity(term, sender))
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn bigrams(text: &str) -> Vec<[char; 2]> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|pair| [pair[0], pair[1]]).collect()
}

#[cfg(test)]
mod tests {
    use super::{best_score, similarity};

    #[test]
    fn identical_and_contained_strings_score_one() {
        assert_eq!(similarity("invoice", "invoice"), 1.0);
        assert_eq!(similarity("invoice", "Re: Invoice #4411 overdue"), 1.0);
        assert_eq!(similarity("Quarterly Report Q3", "report"), 1.0);
    }

    #[test]
    fn near_miss_scores_between_zero_and_one() {
        let score = similarity("invoce", "invoice");
        assert!(score > 0.5, "typo should stay close: {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(similarity("invoice", "zzqx") < 0.1);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(similarity("", "anything"), 0.0);
        assert_eq!(similarity("anything", ""), 0.0);
        assert_eq!(similarity("  ", "anything"), 0.0);
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert_eq!(similarity("INVOICE", "invoice"), 1.0);
    }

    #[test]
    fn best_score_takes_stronger_field() {
        let by_sender = best_score("alice", "weekly sync notes", "alice@example.com");
        assert_eq!(by_sender, 1.0);
        let by_subject = best_score("sync", "weekly sync notes", "bob@example.com");
        assert_eq!(by_subject, 1.0);
    }

    #[test]
    fn scores_order_closer_matches_first() {
        let close = similarity("status report", "status reports");
        let far = similarity("status report", "re: lunch друзья");
        assert!(close > far);
    }
}
