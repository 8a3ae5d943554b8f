//! Parsing for the human-rendered R4/R5 register strings on an oracle
//! transaction's first output.
//!
//! R4 renders as `[seed, seed, ...]`, a flat list of 8-hex-char seeds. R5
//! renders as `[[box, box], [box], ...]`, a list of box-id lists, one
//! sub-list per seed it is covered by (offset by one, see
//! [`seed_for_r5_index`]). Both are pure string grammars; kept as free
//! functions per spec.md §9 DESIGN NOTES ("treat parsing as a pure function
//! with a clearly specified grammar").

/// Parse a rendered `[a, b, c]` string into its comma-separated elements,
/// trimming the surrounding brackets and whitespace.
pub fn parse_flat_list(rendered: &str) -> Vec<String> {
    let trimmed = rendered.trim().trim_start_matches('[').trim_end_matches(']');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a rendered `[[a, b], [c]]` string into a list of lists.
///
/// The grammar splits on `],` to find sub-list boundaries, then strips any
/// remaining `[`/`]` from each piece before splitting on `,`.
pub fn parse_nested_list(rendered: &str) -> Vec<Vec<String>> {
    let trimmed = rendered.trim();
    let inner = trimmed
        .strip_prefix('[')
        .unwrap_or(trimmed)
        .strip_suffix(']')
        .unwrap_or(trimmed);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner
        .split("],")
        .map(|chunk| {
            let cleaned = chunk.trim().trim_start_matches('[').trim_end_matches(']');
            if cleaned.is_empty() {
                Vec::new()
            } else {
                cleaned
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
        })
        .collect()
}

/// The seed that settles bets under R5 position `i` is `R4[i+1]` — the R4
/// list is offset by one because its head element names the current tx, not
/// a covered box (spec.md §4.5 Stage B). Returns `None` when `i+1` is out of
/// range for `r4`, meaning no seed has been published yet for that bucket.
pub fn seed_for_r5_index<'a>(r4: &'a [String], i: usize) -> Option<&'a str> {
    r4.get(i + 1).map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_list() {
        assert_eq!(
            parse_flat_list("[a1b2c3d4, e5f6a7b8]"),
            vec!["a1b2c3d4".to_string(), "e5f6a7b8".to_string()]
        );
    }

    #[test]
    fn parses_empty_flat_list() {
        assert!(parse_flat_list("[]").is_empty());
    }

    #[test]
    fn parses_nested_list() {
        assert_eq!(
            parse_nested_list("[[BOX1, BOX2], [BOX3]]"),
            vec![
                vec!["BOX1".to_string(), "BOX2".to_string()],
                vec!["BOX3".to_string()],
            ]
        );
    }

    #[test]
    fn parses_single_element_nested_list() {
        assert_eq!(
            parse_nested_list("[[BOX1]]"),
            vec![vec!["BOX1".to_string()]]
        );
    }

    #[test]
    fn seed_offset_by_one() {
        let r4 = vec!["_".to_string(), "a1b2c3d4".to_string()];
        assert_eq!(seed_for_r5_index(&r4, 0), Some("a1b2c3d4"));
        assert_eq!(seed_for_r5_index(&r4, 1), None);
    }
}
