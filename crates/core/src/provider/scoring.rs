//! Match scoring and candidate selection.

use std::sync::Arc;

use super::{Candidate, SearchFingerprint};

const TITLE_MATCH: u32 = 60;
const YEAR_MATCH: u32 = 30;
const RELEASE_MENTIONS_TITLE: u32 = 10;

/// Score provider metadata against a fingerprint.
///
/// Used by the provider adapters to implement
/// [`SubtitleCandidate::match_score`](super::SubtitleCandidate::match_score).
pub fn score_release(
    fingerprint: &SearchFingerprint,
    title: Option<&str>,
    year: Option<u32>,
    release: Option<&str>,
) -> u32 {
    let wanted = simplify(&fingerprint.title);
    let mut score = 0;

    if let Some(title) = title {
        if !wanted.is_empty() && simplify(title) == wanted {
            score += TITLE_MATCH;
        }
    }

    if let (Some(a), Some(b)) = (fingerprint.year, year) {
        if a == b {
            score += YEAR_MATCH;
        }
    }

    if let Some(release) = release {
        if !wanted.is_empty() && simplify(release).contains(&wanted) {
            score += RELEASE_MENTIONS_TITLE;
        }
    }

    score
}

/// Pick the highest scoring candidate.
///
/// Candidates that cannot score themselves count as 0 and stay eligible.
/// Ties go to the earliest candidate, so the result follows provider order.
pub fn select_best(candidates: &[Candidate], fingerprint: &SearchFingerprint) -> Option<Candidate> {
    let mut best: Option<(&Candidate, u32)> = None;

    for candidate in candidates {
        let score = candidate.match_score(fingerprint).unwrap_or(0);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }

    best.map(|(candidate, _)| Arc::clone(candidate))
}

/// Lowercase, keep alphanumerics, collapse everything else to single spaces.
fn simplify(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageTag;
    use crate::testing::MockCandidate;

    fn fingerprint() -> SearchFingerprint {
        SearchFingerprint::new("The Matrix", Some(1999), "/movies/matrix.mkv")
    }

    #[test]
    fn test_score_release() {
        let fp = fingerprint();
        assert_eq!(
            score_release(&fp, Some("the matrix"), Some(1999), Some("The.Matrix.1999.1080p")),
            100
        );
        assert_eq!(score_release(&fp, Some("The Matrix"), Some(2003), None), 60);
        assert_eq!(score_release(&fp, Some("Matrix Reloaded"), Some(1999), None), 30);
        assert_eq!(score_release(&fp, None, None, None), 0);
    }

    #[test]
    fn test_score_release_without_year() {
        let fp = SearchFingerprint::new("Heat", None, "/movies/heat.mkv");
        assert_eq!(score_release(&fp, Some("Heat"), Some(1995), None), 60);
    }

    #[test]
    fn test_select_best_highest_score() {
        let candidates: Vec<Candidate> = vec![
            MockCandidate::new("a", LanguageTag::english()).with_score(10).into_candidate(),
            MockCandidate::new("b", LanguageTag::english()).with_score(90).into_candidate(),
            MockCandidate::new("c", LanguageTag::english()).with_score(50).into_candidate(),
        ];
        let best = select_best(&candidates, &fingerprint()).unwrap();
        assert_eq!(best.id(), "b");
    }

    #[test]
    fn test_select_best_first_seen_wins_ties() {
        let candidates: Vec<Candidate> = vec![
            MockCandidate::new("first", LanguageTag::english()).with_score(40).into_candidate(),
            MockCandidate::new("second", LanguageTag::english()).with_score(40).into_candidate(),
        ];
        assert_eq!(select_best(&candidates, &fingerprint()).unwrap().id(), "first");
    }

    #[test]
    fn test_select_best_unscored_counts_as_zero() {
        let candidates: Vec<Candidate> = vec![
            MockCandidate::new("unscored", LanguageTag::english()).into_candidate(),
            MockCandidate::new("zero", LanguageTag::english()).with_score(0).into_candidate(),
        ];
        assert_eq!(select_best(&candidates, &fingerprint()).unwrap().id(), "unscored");

        let candidates: Vec<Candidate> = vec![
            MockCandidate::new("unscored", LanguageTag::english()).into_candidate(),
            MockCandidate::new("scored", LanguageTag::english()).with_score(1).into_candidate(),
        ];
        assert_eq!(select_best(&candidates, &fingerprint()).unwrap().id(), "scored");
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&[], &fingerprint()).is_none());
    }
}
