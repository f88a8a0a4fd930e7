//! Page range expressions
//!
//! Parses user input like `"1, 3-5, 8"` (1-based, inclusive) into zero-based
//! page indices. Parsing is permissive: tokens that do not parse or fall
//! outside the document are dropped instead of failing the whole expression.

use std::collections::BTreeSet;

/// Ascending, duplicate-free list of zero-based page indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection(Vec<usize>);

impl PageSelection {
    /// Build a selection from arbitrary indices (sorted and deduplicated)
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let set: BTreeSet<usize> = indices.into_iter().collect();
        Self(set.into_iter().collect())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

/// Parse outcome including the tokens that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeReport {
    pub selection: PageSelection,
    /// Non-empty tokens that contributed no page (unparseable or out of bounds)
    pub rejected: Vec<String>,
}

/// Parse a page range expression against a document of `total_pages` pages
///
/// Never fails. An empty result means nothing in the expression was usable
/// and must be reported to the user before attempting an extraction.
pub fn parse_page_range(expression: &str, total_pages: usize) -> PageSelection {
    parse_page_range_report(expression, total_pages).selection
}

/// Same as [`parse_page_range`], but also lists every rejected token
pub fn parse_page_range_report(expression: &str, total_pages: usize) -> RangeReport {
    let mut pages = BTreeSet::new();
    let mut rejected = Vec::new();

    for part in expression.split(',') {
        let token = part.trim();
        if token.is_empty() {
            continue;
        }

        let bounds = match token.split_once('-') {
            Some((start, end)) => parse_bound(start).zip(parse_bound(end)),
            None => parse_bound(token).map(|page| (page, page)),
        };
        // Clamp before enumerating so "1-4000000000" stays cheap
        let span = bounds
            .map(|(start, end)| (start.max(1), end.min(total_pages as u64)))
            .filter(|(first, last)| first <= last);

        match span {
            Some((first, last)) => {
                for page in first..=last {
                    pages.insert(page as usize - 1);
                }
            }
            None => {
                log::debug!(
                    "Dropping page range token {token:?} (document has {total_pages} pages)"
                );
                rejected.push(token.to_string());
            }
        }
    }

    RangeReport {
        selection: PageSelection(pages.into_iter().collect()),
        rejected,
    }
}

/// Default expression covering a whole document, e.g. `"1-12"`
pub fn default_range_expression(total_pages: usize) -> String {
    match total_pages {
        0 => String::new(),
        1 => "1".to_string(),
        n => format!("1-{n}"),
    }
}

fn parse_bound(text: &str) -> Option<u64> {
    let text = text.trim();
    // u64::from_str accepts a leading '+', which is not part of the syntax
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_range() {
        assert_eq!(parse_page_range("1-3", 10).into_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_reversed_range_is_empty() {
        assert!(parse_page_range("5-3", 10).is_empty());
    }

    #[test]
    fn test_parse_drops_invalid_tokens() {
        assert_eq!(parse_page_range("1, abc, 3", 10).into_vec(), vec![0, 2]);
    }

    #[test]
    fn test_parse_empty_expression() {
        assert!(parse_page_range("", 10).is_empty());
    }

    #[test]
    fn test_parse_complex_expression() {
        assert_eq!(
            parse_page_range("1, 3-5, 8", 10).into_vec(),
            vec![0, 2, 3, 4, 7]
        );
    }

    #[test]
    fn test_parse_deduplicates_and_sorts() {
        assert_eq!(
            parse_page_range("8, 2-4, 3, 1-2", 10).into_vec(),
            vec![0, 1, 2, 3, 7]
        );
    }

    #[test]
    fn test_parse_clamps_to_document() {
        assert_eq!(parse_page_range("4-9", 5).into_vec(), vec![3, 4]);
        assert!(parse_page_range("0", 5).is_empty());
        assert!(parse_page_range("6", 5).is_empty());
    }

    #[test]
    fn test_parse_huge_range_is_cheap() {
        let selection = parse_page_range("2-18446744073709551615", 3);
        assert_eq!(selection.into_vec(), vec![1, 2]);
    }

    #[test]
    fn test_parse_rejects_negative_and_open_ranges() {
        assert!(parse_page_range("-3", 10).is_empty());
        assert!(parse_page_range("3-", 10).is_empty());
        assert!(parse_page_range("+2", 10).is_empty());
        assert!(parse_page_range("1-3-5", 10).is_empty());
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        assert_eq!(
            parse_page_range("  2 ,\t4 - 5 ,", 10).into_vec(),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_report_lists_rejected_tokens() {
        let report = parse_page_range_report("1, abc, 3, 40, 2-1", 10);
        assert_eq!(report.selection.into_vec(), vec![0, 2]);
        assert_eq!(report.rejected, vec!["abc", "40", "2-1"]);
    }

    #[test]
    fn test_report_does_not_flag_duplicates() {
        let report = parse_page_range_report("1-3, 2", 10);
        assert_eq!(report.selection.into_vec(), vec![0, 1, 2]);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_default_range_expression() {
        assert_eq!(default_range_expression(0), "");
        assert_eq!(default_range_expression(1), "1");
        assert_eq!(default_range_expression(12), "1-12");
        assert_eq!(
            parse_page_range(&default_range_expression(12), 12).len(),
            12
        );
    }

    #[test]
    fn test_selection_from_indices() {
        let selection = PageSelection::from_indices([4, 1, 4, 0]);
        assert_eq!(selection.as_slice(), &[0, 1, 4]);
    }

    proptest! {
        #[test]
        fn prop_selection_is_sorted_unique_and_in_bounds(
            expression in "[0-9 ,\\-a-c]{0,40}",
            total in 0usize..50,
        ) {
            let selection = parse_page_range(&expression, total).into_vec();
            prop_assert!(selection.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert!(selection.iter().all(|&page| page < total));
        }

        #[test]
        fn prop_every_listed_page_is_selected(
            pages in proptest::collection::vec(1usize..30, 0..10),
            total in 1usize..30,
        ) {
            let expression = pages
                .iter()
                .map(|page| page.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let selection = parse_page_range(&expression, total);
            for page in pages.iter().filter(|&&page| page <= total) {
                prop_assert!(selection.as_slice().contains(&(page - 1)));
            }
        }
    }
}
