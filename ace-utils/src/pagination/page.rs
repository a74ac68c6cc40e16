//! Pure pagination math.

/// Compute the number of pages for a paginated list.
pub fn total_pages(item_count: usize, per_page: usize) -> usize {
    item_count.div_ceil(per_page.max(1))
}

/// Clamp a requested one-based page into a valid range.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Return start/end indices for a one-based page window.
pub fn page_window(total_items: usize, per_page: usize, page: usize) -> (usize, usize) {
    let safe_per_page = per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(safe_per_page);
    let end = start.saturating_add(safe_per_page).min(total_items);
    (start.min(total_items), end)
}

/// Parse a one-based page argument.
///
/// Returns `Some(page)` when the value is valid (`>= 1`), otherwise `None`.
/// A missing argument means the first page.
pub fn parse_one_based_page(raw: Option<&str>) -> Option<usize> {
    match raw {
        Some(value) => value.parse::<usize>().ok().filter(|page| *page >= 1),
        None => Some(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_the_ceiling() {
        assert_eq!(total_pages(250, 100), 3);
        assert_eq!(total_pages(200, 100), 2);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(0, 100), 0);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn windows_stay_in_bounds() {
        assert_eq!(page_window(250, 100, 1), (0, 100));
        assert_eq!(page_window(250, 100, 3), (200, 250));
        assert_eq!(page_window(250, 100, 9), (250, 250));
    }

    #[test]
    fn page_arguments() {
        assert_eq!(parse_one_based_page(None), Some(1));
        assert_eq!(parse_one_based_page(Some("4")), Some(4));
        assert_eq!(parse_one_based_page(Some("0")), None);
        assert_eq!(parse_one_based_page(Some("two")), None);
        assert_eq!(clamp_page(7, 3), 3);
        assert_eq!(clamp_page(0, 0), 1);
    }
}
