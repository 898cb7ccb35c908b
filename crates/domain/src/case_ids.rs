use std::sync::LazyLock;

use regex::Regex;

static CASE_ID_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9][0-9,\s]*)\]").expect("case id pattern"));

/// Extract test-case ids embedded in a test title.
///
/// Every bracketed, comma-or-whitespace-separated run of digits contributes,
/// left-to-right across multiple bracket groups. Duplicates are preserved.
/// A title with no bracketed digit group yields an empty list; such tests are
/// excluded from publishing rather than treated as errors.
pub fn extract_case_ids(title: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    for group in CASE_ID_GROUPS.captures_iter(title) {
        for run in group[1].split(|c: char| !c.is_ascii_digit()) {
            if run.is_empty() {
                continue;
            }
            if let Ok(id) = run.parse::<u32>() {
                ids.push(id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_id() {
        assert_eq!(extract_case_ids("Login [101]"), vec![101]);
    }

    #[test]
    fn comma_separated_ids_keep_order() {
        assert_eq!(extract_case_ids("Checkout [12, 34]"), vec![12, 34]);
    }

    #[test]
    fn whitespace_separated_ids() {
        assert_eq!(extract_case_ids("Search [7 8 9]"), vec![7, 8, 9]);
    }

    #[test]
    fn multiple_bracket_groups_left_to_right() {
        assert_eq!(
            extract_case_ids("[1] first then [2,3] second"),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn duplicates_are_not_deduplicated() {
        assert_eq!(extract_case_ids("[5] retry of [5]"), vec![5, 5]);
    }

    #[test]
    fn no_bracketed_digits_yields_empty() {
        assert!(extract_case_ids("a title without ids").is_empty());
        assert!(extract_case_ids("tagged [smoke] only").is_empty());
    }

    #[test]
    fn mixed_bracket_content_is_ignored() {
        assert_eq!(extract_case_ids("[smoke] run [42]"), vec![42]);
    }
}
