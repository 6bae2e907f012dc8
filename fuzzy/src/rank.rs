//! Ranking candidates against a query.

use crate::score::{Query, Score};

/// A candidate that matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Position of the candidate in the ranked slice.
    pub index: usize,

    /// Relevance score.
    pub score: Score,

    /// Matched character positions (char indices) for highlighting.
    pub positions: Vec<usize>,
}

/// Rank `candidates` against `query`, best first, keeping at most `limit`.
///
/// Candidates that do not contain the query as a subsequence are dropped.
/// Equal scores are ordered by shorter path, then lexically, then by original
/// position. An empty query keeps the original order.
pub fn rank<T: AsRef<str>>(candidates: &[T], query: &str, limit: usize) -> Vec<FuzzyMatch> {
    let query = Query::new(query);
    if query.is_empty() {
        return candidates
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(index, candidate)| {
                let (score, positions) = query.score(candidate.as_ref())?;
                Some(FuzzyMatch {
                    index,
                    score,
                    positions,
                })
            })
            .collect();
    }

    let mut matches: Vec<(usize, FuzzyMatch)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let candidate = candidate.as_ref();
            let (score, positions) = query.score(candidate)?;
            Some((
                candidate.chars().count(),
                FuzzyMatch {
                    index,
                    score,
                    positions,
                },
            ))
        })
        .collect();

    matches.sort_by(|(a_len, a), (b_len, b)| {
        b.score
            .cmp(&a.score)
            .then_with(|| a_len.cmp(b_len))
            .then_with(|| candidates[a.index].as_ref().cmp(candidates[b.index].as_ref()))
            .then_with(|| a.index.cmp(&b.index))
    });

    matches.truncate(limit);
    matches.into_iter().map(|(_, m)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ranked<'a>(candidates: &[&'a str], query: &str, limit: usize) -> Vec<&'a str> {
        rank(candidates, query, limit)
            .into_iter()
            .map(|m| candidates[m.index])
            .collect()
    }

    fn is_subsequence(query: &str, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let mut chars = candidate.chars();
        query.to_lowercase().chars().all(|q| chars.any(|c| c == q))
    }

    #[test]
    fn test_empty_query_keeps_scan_order() {
        let candidates = ["zeta", "alpha", "mid/beta", "gamma"];

        assert_eq!(ranked(&candidates, "", 3), vec!["zeta", "alpha", "mid/beta"]);
        assert_eq!(ranked(&candidates, "", 10), candidates.to_vec());
    }

    #[test]
    fn test_src_comp_scenario() {
        let candidates = ["src/components/ui", "src/components/auth", "tests/components"];

        let result = ranked(&candidates, "src/comp", 10);

        assert_eq!(result, vec!["src/components/ui", "src/components/auth"]);
    }

    #[test]
    fn test_components_ranks_prefix_paths_first() {
        let candidates = ["tests/components", "src/components/ui", "src/components/auth"];

        let result = ranked(&candidates, "components", 10);

        // Density outweighs a slightly later start.
        assert_eq!(
            result,
            vec!["tests/components", "src/components/ui", "src/components/auth"]
        );
    }

    #[test]
    fn test_only_subsequence_matches_are_returned() {
        let candidates = [
            "src/components/ui",
            "docs/guides",
            "crates/core/src",
            "scripts",
            "assets/icons",
            "Source/Code",
        ];

        for query in ["sc", "src", "cs", "oc", "SRC", "ui", "zz", "s/c"] {
            let result = ranked(&candidates, query, 100);
            for candidate in &candidates {
                assert_eq!(
                    result.contains(candidate),
                    is_subsequence(query, candidate),
                    "query {query:?} candidate {candidate:?}"
                );
            }
        }
    }

    #[test]
    fn test_ties_break_on_length_then_lexical() {
        // Identical scores: "b/x" and "a/x" tie on length, lexical decides.
        let candidates = ["b/x", "a/x", "a/x"];

        let result = rank(&candidates, "x", 10);

        let indices: Vec<usize> = result.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 2, 0]);
    }

    #[test]
    fn test_limit_truncates() {
        let candidates: Vec<String> = (0..50).map(|i| format!("dir{i}")).collect();

        assert_eq!(rank(&candidates, "dir", 7).len(), 7);
        assert_eq!(rank(&candidates, "", 7).len(), 7);
        assert!(rank(&candidates, "dir", 0).is_empty());
    }

    #[test]
    fn test_rank_is_deterministic() {
        let candidates = ["a/b/c", "abc", "a_b_c", "xaxbxc", "cba", "A/B/C"];

        assert_eq!(rank(&candidates, "abc", 10), rank(&candidates, "abc", 10));
    }

    #[test]
    fn test_rank_output_is_sorted_by_score() {
        let candidates = ["lib/src", "src", "source", "s/r/c", "tests/src/x"];

        let result = rank(&candidates, "src", 10);

        assert_eq!(candidates[result[0].index], "src");
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
