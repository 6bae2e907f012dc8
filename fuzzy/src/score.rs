//! Scoring a single candidate against a query.
//!
//! Weights:
//!
//! | Tier        | Component                                   | Points            |
//! |-------------|---------------------------------------------|-------------------|
//! | substring   | density, `1000 * query_len / path_len`      | 0..=1000          |
//! | substring   | start position                              | `-10` per char    |
//! | substring   | match starts on a word boundary             | `+250`            |
//! | subsequence | matched character on a word boundary        | `+80` each        |
//! | subsequence | matched character right after the previous  | `+40` each        |
//! | subsequence | unmatched characters inside the span        | `-3` each         |
//! | subsequence | start position                              | `-1` per char, capped at 100 |
//!
//! A word boundary is the first character, any character after `/`, `_`, `-`,
//! `.` or a space, an uppercase letter after a lowercase one, or a digit after
//! a letter.

use std::cmp::Ordering;

const DENSITY_SCALE: i64 = 1000;
const SUBSTRING_START_PENALTY: i64 = 10;
const SUBSTRING_BOUNDARY_BONUS: i64 = 250;
const BOUNDARY_BONUS: i64 = 80;
const ADJACENT_BONUS: i64 = 40;
const GAP_PENALTY: i64 = 3;
const MAX_LEADING_PENALTY: i64 = 100;

/// How a query matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    /// The query characters appear in order with gaps.
    Subsequence,

    /// The query appears contiguously.
    Substring,
}

/// Relevance of a match. Compares by tier first, then points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Score {
    pub kind: MatchKind,
    pub points: i64,
}


impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.points.cmp(&other.points))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A query prepared once per keystroke and scored against many candidates.
#[derive(Debug, Clone)]
pub struct Query {
    folded: Vec<char>,
}

impl Query {
    pub fn new(query: &str) -> Self {
        Self {
            folded: query.chars().map(fold).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Score `candidate`, returning the matched character positions, or
    /// `None` if the query is not a subsequence of it.
    ///
    /// An empty query matches everything with zero points.
    pub fn score(&self, candidate: &str) -> Option<(Score, Vec<usize>)> {
        if self.folded.is_empty() {
            return Some((
                Score {
                    kind: MatchKind::Substring,
                    points: 0,
                },
                Vec::new(),
            ));
        }

        let original: Vec<char> = candidate.chars().collect();
        let folded: Vec<char> = original.iter().copied().map(fold).collect();

        let last = self.forward_end(&folded)?;
        Some(
            self.best_substring(&original, &folded)
                .unwrap_or_else(|| self.subsequence(&original, &folded, last)),
        )
    }

    /// Index of the last matched character of the leftmost greedy match.
    fn forward_end(&self, folded: &[char]) -> Option<usize> {
        let mut needle = self.folded.iter().peekable();
        for (i, c) in folded.iter().enumerate() {
            if needle.next_if_eq(&c).is_some() && needle.peek().is_none() {
                return Some(i);
            }
        }
        None
    }

    fn best_substring(&self, original: &[char], folded: &[char]) -> Option<(Score, Vec<usize>)> {
        let len = self.folded.len();
        let density = DENSITY_SCALE * len as i64 / folded.len() as i64;

        let start = folded
            .windows(len)
            .enumerate()
            .filter(|(_, window)| *window == self.folded.as_slice())
            .map(|(start, _)| start)
            // Ties go to the earliest start.
            .max_by_key(|&start| (substring_points(original, start, density), -(start as i64)))?;

        Some((
            Score {
                kind: MatchKind::Substring,
                points: substring_points(original, start, density),
            },
            (start..start + len).collect(),
        ))
    }

    /// Tightest alignment ending at `last`, found by walking backwards.
    fn subsequence(&self, original: &[char], folded: &[char], last: usize) -> (Score, Vec<usize>) {
        let mut positions = vec![0; self.folded.len()];
        let mut needle = self.folded.len();
        for i in (0..=last).rev() {
            if needle == 0 {
                break;
            }
            if folded[i] == self.folded[needle - 1] {
                needle -= 1;
                positions[needle] = i;
            }
        }

        let start = positions[0];
        let span = (last - start + 1) as i64;
        let boundaries = positions
            .iter()
            .filter(|&&i| is_boundary(original, i))
            .count() as i64;
        let adjacent = positions.windows(2).filter(|pair| pair[1] == pair[0] + 1).count() as i64;

        let points = BOUNDARY_BONUS * boundaries + ADJACENT_BONUS * adjacent
            - GAP_PENALTY * (span - positions.len() as i64)
            - (start as i64).min(MAX_LEADING_PENALTY);

        (
            Score {
                kind: MatchKind::Subsequence,
                points,
            },
            positions,
        )
    }
}

fn substring_points(original: &[char], start: usize, density: i64) -> i64 {
    let boundary = if is_boundary(original, start) {
        SUBSTRING_BOUNDARY_BONUS
    } else {
        0
    };
    density - SUBSTRING_START_PENALTY * start as i64 + boundary
}

/// Whether the character at `i` starts a word.
fn is_boundary(chars: &[char], i: usize) -> bool {
    let Some(prev) = i.checked_sub(1).map(|p| chars[p]) else {
        return true;
    };
    let current = chars[i];
    matches!(prev, '/' | '_' | '-' | '.' | ' ')
        || (prev.is_lowercase() && current.is_uppercase())
        || (prev.is_alphabetic() && current.is_ascii_digit())
}

/// Simple case folding that keeps one char per char, so positions line up
/// with the original string.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn score(query: &str, candidate: &str) -> Option<(Score, Vec<usize>)> {
        Query::new(query).score(candidate)
    }

    #[test]
    fn test_non_subsequence_does_not_match() {
        assert_eq!(score("xyz", "src/components"), None);
        assert_eq!(score("mocp", "components"), None);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let (score, positions) = score("SRC", "src/Lib").unwrap();

        assert_eq!(score.kind, MatchKind::Substring);
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(Query::new("lib").score("src/Lib").is_some());
    }

    #[test]
    fn test_substring_positions_and_points() {
        let (score, positions) = score("comp", "src/components").unwrap();

        assert_eq!(positions, vec![4, 5, 6, 7]);
        // density 4000 / 14 = 285, start 4 costs 40, boundary after '/' earns 250.
        assert_eq!(score.points, 285 - 40 + 250);
    }

    #[test]
    fn test_substring_prefers_boundary_occurrence() {
        // "app" occurs mid-word at 1 and on a boundary at 8.
        let (_, positions) = score("app", "mapping/app").unwrap();

        assert_eq!(positions, vec![8, 9, 10]);
    }

    #[test]
    fn test_substring_always_beats_subsequence() {
        let (contiguous, _) = score("abc", "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzabc").unwrap();
        let (scattered, _) = score("abc", "a/b/c").unwrap();

        assert_eq!(contiguous.kind, MatchKind::Substring);
        assert_eq!(scattered.kind, MatchKind::Subsequence);
        assert!(contiguous.points < scattered.points);
        assert!(contiguous > scattered);
    }

    #[test]
    fn test_subsequence_uses_tightest_window() {
        // Greedy matching would start at the first 's'.
        let (_, positions) = score("sc", "s/x/src/core").unwrap();

        assert_eq!(positions, vec![4, 6]);
    }

    #[test]
    fn test_subsequence_rewards_word_boundaries() {
        let (boundary, _) = score("uc", "user_config").unwrap();
        let (middle, _) = score("uc", "unicorn").unwrap();

        assert!(boundary > middle);
    }

    #[test]
    fn test_case_transition_is_a_boundary() {
        let (camel, _) = score("fb", "fooBar").unwrap();
        let (flat, _) = score("fb", "foobar").unwrap();

        assert!(camel > flat);
    }

    #[test]
    fn test_tighter_clusters_score_higher() {
        let (tight, _) = score("ab", "a_b").unwrap();
        let (loose, _) = score("ab", "a_xxxxxxxxb").unwrap();

        assert!(tight > loose);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let (score, positions) = score("", "anything").unwrap();

        assert_eq!(score.points, 0);
        assert!(positions.is_empty());
    }
}
