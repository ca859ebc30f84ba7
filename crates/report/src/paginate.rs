//! Pagination primitives
//!
//! Everything here is pure: positions are values passed in and returned, so
//! pagination decisions can be tested without building pages or rendering.
//!
//! - `Cursor`: next free vertical offset on a page
//! - `SafeArea`: the region between the header and footer bands
//! - `paginate_rows`: split pre-measured table rows into page segments
//! - `balance_two_columns`: split a list into a left and a right column

use std::ops::Range;

use crate::config::LayoutConfig;

/// Tolerance for floating point comparisons on millimetre values
pub const EPSILON: f64 = 1e-6;

/// Position of the next free line: page index and offset from the page top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

impl Cursor {
    pub fn new(page: usize, y: f64) -> Self {
        Self { page, y }
    }

    pub fn advanced(self, dy: f64) -> Self {
        Self {
            page: self.page,
            y: self.y + dy,
        }
    }
}

/// Page region available to flowing content, in mm from the page's top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SafeArea {
    /// Safe area of a `width` x `height` page under the configured margins and bands
    pub fn for_page(config: &LayoutConfig, width: f64, height: f64) -> Self {
        let margin = config.page.margin_mm;
        Self {
            left: margin,
            top: margin + config.header_band_mm,
            width: (width - 2.0 * margin).max(0.0),
            height: (height - 2.0 * margin - config.header_band_mm - config.footer_band_mm)
                .max(0.0),
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Space left below the cursor
    pub fn remaining(&self, cursor: Cursor) -> f64 {
        (self.bottom() - cursor.y).max(0.0)
    }

    pub fn fits(&self, cursor: Cursor, height: f64) -> bool {
        cursor.y + height <= self.bottom() + EPSILON
    }
}

/// How a table's rows are distributed over pages
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    /// The first segment does not fit where the cursor is and must open a new page
    pub starts_on_fresh_page: bool,
    /// One row range per page; every segment is drawn under a repeated header row
    pub segments: Vec<Range<usize>>,
}

/// Distribute rows over pages.
///
/// `first_capacity` is the space left on the current page, `page_capacity`
/// the height of a fresh safe area. Rows fill greedily; a segment always takes
/// at least one row so the table makes progress even if a row exceeds the page.
/// A segment left holding a single row is topped up with the last row of the
/// previous segment whenever both fit together under the header.
pub fn paginate_rows(
    heights: &[f64],
    header_height: f64,
    first_capacity: f64,
    page_capacity: f64,
) -> TablePlan {
    let Some(&first) = heights.first() else {
        return TablePlan {
            starts_on_fresh_page: false,
            segments: Vec::new(),
        };
    };

    let starts_on_fresh_page = header_height + first > first_capacity + EPSILON;
    let mut capacity = if starts_on_fresh_page {
        page_capacity
    } else {
        first_capacity
    };

    let mut segments = Vec::new();
    let mut start = 0;
    while start < heights.len() {
        let end = greedy_end(heights, start, header_height, capacity);
        segments.push(start..end);
        start = end;
        capacity = page_capacity;
    }

    avoid_orphans(&mut segments, heights, header_height, page_capacity);

    tracing::debug!(
        rows = heights.len(),
        pages = segments.len(),
        fresh = starts_on_fresh_page,
        "Paginated table rows"
    );

    TablePlan {
        starts_on_fresh_page,
        segments,
    }
}

fn greedy_end(heights: &[f64], start: usize, header_height: f64, capacity: f64) -> usize {
    let mut used = header_height;
    let mut end = start;
    while end < heights.len() && used + heights[end] <= capacity + EPSILON {
        used += heights[end];
        end += 1;
    }
    // Forced progress on rows taller than the page
    end.max(start + 1)
}

/// One-row lookahead: a single stranded row pulls the previous segment's last
/// row forward. Repeats until stable; boundaries only move backwards, so it ends.
fn avoid_orphans(
    segments: &mut [Range<usize>],
    heights: &[f64],
    header_height: f64,
    page_capacity: f64,
) {
    loop {
        let mut changed = false;
        for i in 1..segments.len() {
            let (prev, current) = (&segments[i - 1], &segments[i]);
            if current.len() != 1 || prev.len() < 2 {
                continue;
            }
            let pair = header_height + heights[prev.end - 1] + heights[current.start];
            if pair <= page_capacity + EPSILON {
                segments[i - 1].end -= 1;
                segments[i].start -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// A list split into two columns
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSplit {
    pub left: Range<usize>,
    pub right: Range<usize>,
    /// Height of the taller column
    pub height: f64,
}

impl ColumnSplit {
    /// Number of items placed; the rest continue on the next page
    pub fn placed(&self) -> usize {
        self.right.end
    }
}

/// Split items into two columns within `budget` vertical space.
///
/// The left column fills greedily up to half the list's stacked height (or
/// the tallest item, if larger); the remainder overflows into the right
/// column up to the budget. Greedy and simple rather than optimal. At least
/// one item is always placed.
pub fn balance_two_columns(heights: &[f64], gap: f64, budget: f64) -> ColumnSplit {
    let stacked = stack_height(heights, gap);
    let tallest = heights.iter().cloned().fold(0.0, f64::max);
    let target = (stacked / 2.0).max(tallest).min(budget);

    let (left_end, left_height) = fill(heights, 0, gap, target);
    let (right_end, right_height) = fill(heights, left_end, gap, budget);

    ColumnSplit {
        left: 0..left_end,
        right: left_end..right_end,
        height: left_height.max(right_height),
    }
}

fn stack_height(heights: &[f64], gap: f64) -> f64 {
    let sum: f64 = heights.iter().sum();
    sum + gap * heights.len().saturating_sub(1) as f64
}

/// Fill from `start` while the column stays within `limit`.
fn fill(heights: &[f64], start: usize, gap: f64, limit: f64) -> (usize, f64) {
    let mut used = 0.0;
    let mut end = start;
    while end < heights.len() {
        let add = heights[end] + if end > start { gap } else { 0.0 };
        if used + add > limit + EPSILON {
            break;
        }
        used += add;
        end += 1;
    }
    if start == 0 && end == 0 && !heights.is_empty() {
        return (1, heights[0]);
    }
    (end, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_area_excludes_bands() {
        let config = LayoutConfig::default();
        let area = SafeArea::for_page(&config, 210.0, 297.0);
        assert_eq!(area.left, 15.0);
        assert_eq!(area.top, 27.0);
        assert_eq!(area.width, 180.0);
        assert_eq!(area.bottom(), 297.0 - 15.0 - 10.0);
        assert!(area.fits(Cursor::new(0, 260.0), 12.0));
        assert!(!area.fits(Cursor::new(0, 260.0), 12.1));
    }

    #[test]
    fn test_rows_fill_greedily() {
        let plan = paginate_rows(&[10.0; 7], 5.0, 100.0, 35.0);
        assert!(!plan.starts_on_fresh_page);
        assert_eq!(plan.segments, vec![0..7]);

        // Two rows on the partial page, three per fresh page, last pair kept together
        let plan = paginate_rows(&[10.0; 9], 5.0, 25.0, 35.0);
        assert_eq!(plan.segments, vec![0..2, 2..5, 5..7, 7..9]);
    }

    #[test]
    fn test_orphan_pulls_previous_row() {
        // Greedy gives 0..3 then a lone row 3; pulling row 2 forward avoids it
        let plan = paginate_rows(&[10.0; 4], 5.0, 35.0, 35.0);
        assert_eq!(plan.segments, vec![0..2, 2..4]);
    }

    #[test]
    fn test_orphan_kept_when_pair_does_not_fit() {
        let plan = paginate_rows(&[10.0, 10.0, 10.0, 30.0], 5.0, 35.0, 35.0);
        assert_eq!(plan.segments, vec![0..3, 3..4]);
    }

    #[test]
    fn test_single_row_table_is_not_split() {
        let plan = paginate_rows(&[10.0], 5.0, 100.0, 100.0);
        assert_eq!(plan.segments, vec![0..1]);
    }

    #[test]
    fn test_table_moves_to_fresh_page_when_first_row_does_not_fit() {
        let plan = paginate_rows(&[10.0, 10.0], 5.0, 12.0, 100.0);
        assert!(plan.starts_on_fresh_page);
        assert_eq!(plan.segments, vec![0..2]);
    }

    #[test]
    fn test_oversized_rows_still_progress() {
        let plan = paginate_rows(&[80.0, 80.0], 5.0, 50.0, 50.0);
        assert_eq!(plan.segments, vec![0..1, 1..2]);
    }

    #[test]
    fn test_empty_table() {
        let plan = paginate_rows(&[], 5.0, 50.0, 50.0);
        assert!(plan.segments.is_empty());
    }

    #[test]
    fn test_balance_two_columns_even_split() {
        let split = balance_two_columns(&[5.0; 6], 0.0, 100.0);
        assert_eq!(split.left, 0..3);
        assert_eq!(split.right, 3..6);
        assert_eq!(split.height, 15.0);
    }

    #[test]
    fn test_balance_two_columns_tall_first_item() {
        let split = balance_two_columns(&[15.0, 5.0, 5.0, 5.0], 0.0, 100.0);
        assert_eq!(split.left, 0..1);
        assert_eq!(split.right, 1..4);
        assert_eq!(split.height, 15.0);
    }

    #[test]
    fn test_balance_two_columns_overflow_continues() {
        let split = balance_two_columns(&[10.0; 10], 1.0, 32.0);
        assert_eq!(split.left, 0..3);
        assert_eq!(split.right, 3..6);
        assert_eq!(split.placed(), 6);
    }
}
