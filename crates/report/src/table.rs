//! Table geometry: column widths and row heights
//!
//! Widths are solved in integer hundredths of a millimetre so the columns
//! always sum to the available width exactly. Row heights are measured from
//! wrapped cell text and clamped; clamped rows carry truncated lines so the
//! renderer never draws outside the row.

use crate::config::ColumnSpec;
use crate::metrics;

/// Width solver resolution: 1/100 mm
pub const UNITS_PER_MM: f64 = 100.0;

/// A table column as seen by the width solver
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub min_width_mm: f64,
    pub weight: f64,
    /// Shave order on overflow; lower is shaved first, `None` is rigid
    pub flex_priority: Option<u8>,
}

impl From<&ColumnSpec> for Column {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            label: spec.label.clone(),
            min_width_mm: spec.min_width_mm,
            weight: spec.weight,
            flex_priority: spec.flex_priority,
        }
    }
}

fn to_units(mm: f64) -> u64 {
    if mm.is_finite() && mm > 0.0 {
        (mm * UNITS_PER_MM).round() as u64
    } else {
        0
    }
}

/// Solve column widths in solver units.
///
/// 1. Each column gets `max(min, weight * available)`.
/// 2. On overflow: if even the minimums do not fit, all minimums are scaled
///    by one factor, floored at `absolute_min`. Otherwise flexible columns are
///    shaved toward their minimums in priority order, then rigid columns from
///    the right.
/// 3. Leftover width goes to the last column.
///
/// The result always sums to `available` exactly.
pub fn solve_width_units(columns: &[Column], available: u64, absolute_min: u64) -> Vec<u64> {
    if columns.is_empty() {
        return Vec::new();
    }

    let mins: Vec<u64> = columns.iter().map(|c| to_units(c.min_width_mm)).collect();
    let mut widths: Vec<u64> = columns
        .iter()
        .zip(&mins)
        .map(|(column, &min)| {
            let weight = if column.weight.is_finite() {
                column.weight.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let target = (weight * available as f64).floor() as u64;
            target.max(min)
        })
        .collect();

    let total: u64 = widths.iter().sum();
    if total > available {
        let min_total: u64 = mins.iter().sum();
        if min_total > available {
            let factor = available as f64 / min_total as f64;
            for (width, &min) in widths.iter_mut().zip(&mins) {
                *width = ((min as f64 * factor).floor() as u64).max(absolute_min);
            }
            // Absolute floors may still overflow on very narrow tables
            shave_widest(&mut widths, available);
        } else {
            shave_flexible(columns, &mut widths, &mins, total - available);
        }
    }

    let total: u64 = widths.iter().sum();
    if total < available {
        if let Some(last) = widths.last_mut() {
            *last += available - total;
        }
    }
    widths
}

/// Remove `excess` units, taking from flexible columns first.
fn shave_flexible(columns: &[Column], widths: &mut [u64], mins: &[u64], mut excess: u64) {
    let mut order: Vec<usize> = (0..columns.len())
        .filter(|&i| columns[i].flex_priority.is_some())
        .collect();
    order.sort_by_key(|&i| (columns[i].flex_priority, i));
    order.extend(
        (0..columns.len())
            .rev()
            .filter(|&i| columns[i].flex_priority.is_none()),
    );

    for i in order {
        if excess == 0 {
            break;
        }
        let spare = widths[i].saturating_sub(mins[i]);
        let cut = spare.min(excess);
        widths[i] -= cut;
        excess -= cut;
    }
}

/// Reduce the widest column one unit at a time until the total fits.
fn shave_widest(widths: &mut [u64], available: u64) {
    let mut total: u64 = widths.iter().sum();
    while total > available {
        let widest = widths
            .iter()
            .enumerate()
            .max_by_key(|(i, w)| (**w, std::cmp::Reverse(*i)))
            .map(|(i, _)| i);
        match widest {
            Some(i) if widths[i] > 0 => {
                widths[i] -= 1;
                total -= 1;
            }
            _ => break,
        }
    }
}

/// Solve column widths in millimetres.
pub fn solve_widths(columns: &[Column], available_mm: f64, absolute_min_mm: f64) -> Vec<f64> {
    solve_width_units(columns, to_units(available_mm), to_units(absolute_min_mm))
        .into_iter()
        .map(|units| units as f64 / UNITS_PER_MM)
        .collect()
}

/// Typography and limits for measuring rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStyle {
    pub font_size: u8,
    pub line_height: f64,
    pub padding: f64,
    pub min_height: f64,
    pub max_height: f64,
}

/// A row after wrapping and height measurement
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredRow {
    /// Wrapped lines per cell, already truncated to the row height
    pub cells: Vec<Vec<String>>,
    pub height: f64,
    pub bold: bool,
    /// True when content was cut at the height clamp
    pub clipped: bool,
}

/// Measure one row: `max(min_height, tallest cell)`, clamped to `max_height`.
pub fn measure_row(cells: &[String], widths: &[f64], style: &RowStyle, bold: bool) -> MeasuredRow {
    let mut wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(text, &width)| {
            let inner = (width - 2.0 * style.padding).max(1.0);
            metrics::wrap(text, inner, style.font_size, bold)
        })
        .collect();

    let tallest = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    let natural = tallest as f64 * style.line_height + 2.0 * style.padding;
    let height = natural.max(style.min_height).min(style.max_height);

    let clipped = natural > style.max_height;
    if clipped {
        let room = style.max_height - 2.0 * style.padding;
        let max_lines = ((room / style.line_height).floor() as usize).max(1);
        for lines in &mut wrapped {
            lines.truncate(max_lines);
        }
        tracing::debug!(
            natural_mm = natural,
            clamp_mm = style.max_height,
            "Row clipped at height clamp"
        );
    }

    MeasuredRow {
        cells: wrapped,
        height,
        bold,
        clipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(min: f64, weight: f64, flex: Option<u8>) -> Column {
        Column {
            label: "c".to_string(),
            min_width_mm: min,
            weight,
            flex_priority: flex,
        }
    }

    fn style() -> RowStyle {
        RowStyle {
            font_size: 8,
            line_height: 3.7,
            padding: 1.5,
            min_height: 7.0,
            max_height: 20.0,
        }
    }

    #[test]
    fn test_weights_fill_available_width() {
        let columns = vec![column(10.0, 0.25, None), column(10.0, 0.75, None)];
        let widths = solve_width_units(&columns, 20_000, 600);
        assert_eq!(widths, vec![5_000, 15_000]);
    }

    #[test]
    fn test_leftover_goes_to_last_column() {
        let columns = vec![column(10.0, 0.3, None), column(10.0, 0.3, None)];
        let widths = solve_width_units(&columns, 10_001, 600);
        assert_eq!(widths[0], 3_000);
        assert_eq!(widths.iter().sum::<u64>(), 10_001);
    }

    #[test]
    fn test_flexible_columns_shaved_first() {
        // Weighted widths overflow: 60 + 50 + 40 > 100, minimums still fit
        let columns = vec![
            column(60.0, 0.1, None),
            column(10.0, 0.5, Some(1)),
            column(10.0, 0.4, Some(2)),
        ];
        let widths = solve_width_units(&columns, 10_000, 600);
        assert_eq!(widths.iter().sum::<u64>(), 10_000);
        assert_eq!(widths[0], 6_000);
        // Priority 1 shaved to its minimum before priority 2 is touched
        assert_eq!(widths[1], 1_000);
        assert_eq!(widths[2], 3_000);
    }

    #[test]
    fn test_minimums_scaled_when_they_cannot_fit() {
        let columns = vec![column(60.0, 0.5, None), column(60.0, 0.5, None)];
        let widths = solve_width_units(&columns, 6_000, 600);
        assert_eq!(widths, vec![3_000, 3_000]);
    }

    #[test]
    fn test_absolute_floor_never_overflows() {
        let columns: Vec<Column> = (0..5).map(|_| column(30.0, 0.2, None)).collect();
        // Five columns at a 6 mm floor cannot fit 20 mm; total must still match
        let widths = solve_width_units(&columns, 2_000, 600);
        assert_eq!(widths.iter().sum::<u64>(), 2_000);
    }

    #[test]
    fn test_measure_row_uses_tallest_cell() {
        let cells = vec![
            "short".to_string(),
            "a considerably longer cell that must wrap over several lines".to_string(),
        ];
        let row = measure_row(&cells, &[30.0, 30.0], &style(), false);
        assert!(row.cells[1].len() > 1);
        let expected = row.cells[1].len() as f64 * 3.7 + 3.0;
        assert!((row.height - expected.max(7.0)).abs() < 1e-9);
        assert!(!row.clipped);
    }

    #[test]
    fn test_measure_row_minimum_height() {
        let row = measure_row(&["x".to_string()], &[30.0], &style(), false);
        assert_eq!(row.height, 7.0);
    }

    #[test]
    fn test_measure_row_clips_pathological_content() {
        let text = "word ".repeat(400);
        let row = measure_row(&[text], &[20.0], &style(), false);
        assert!(row.clipped);
        assert_eq!(row.height, 20.0);
        let drawn = row.cells[0].len() as f64 * 3.7 + 3.0;
        assert!(drawn <= 20.0);
    }
}
