//! Table geometry analysis.
//!
//! HTML tables declare widths and spans per cell, and the declarations are
//! routinely inconsistent. The analyzer reconciles them into one ascending
//! column-boundary sequence, deriving each cell's column span from how many
//! boundaries its width covers. When the declarations cannot be reconciled
//! the table degrades to explicit `<col>` markup if present, or to no column
//! metadata at all; analysis is total and never errors.

use std::collections::HashMap;

use crate::dom::{SourceDom, SourceId};

/// Position tolerance when comparing boundary positions.
const TOLERANCE: f64 = 1e-6;

/// Width used for a cell with no usable declaration.
const DEFAULT_CELL_WIDTH: f64 = 100.0;

/// Result of analyzing one table.
#[derive(Debug, Default)]
pub struct TableGeometry {
    /// Column widths, left to right. Empty when no metadata could be
    /// derived.
    pub columns: Vec<f64>,
    /// Derived column span per cell. Empty when analysis fell back to
    /// declared markup; the builder then uses `colspan` attributes as-is.
    pub cell_spans: HashMap<SourceId, u32>,
}

/// Analyze a `<table>` element.
///
/// `cell_width` supplies a cell's resolved width in absolute units, if it
/// has one; unusable widths fall back to 100 units.
pub fn analyze_table(
    dom: &SourceDom,
    table: SourceId,
    cell_width: impl Fn(SourceId) -> Option<f64>,
) -> TableGeometry {
    let mut analysis = Analysis::default();

    for (_, rows) in row_groups(dom, table) {
        // Row spans never cross a row-group boundary.
        analysis.spans.fill(0);
        for row in rows {
            match analysis.analyze_row(dom, row, &cell_width) {
                Some(row_width) => analysis.max_row_width = analysis.max_row_width.max(row_width),
                None => {
                    log::debug!("table geometry not analyzable, using declared markup");
                    return fallback_geometry(dom, table);
                }
            }
            for span in &mut analysis.spans {
                *span = span.saturating_sub(1);
            }
        }
    }

    analysis.into_geometry()
}

#[derive(Debug, Default)]
struct Analysis {
    /// Ascending column start positions.
    starts: Vec<f64>,
    /// Remaining row-span claim per boundary, parallel to `starts`.
    spans: Vec<u32>,
    max_row_width: f64,
    cell_spans: HashMap<SourceId, u32>,
}

impl Analysis {
    /// Place one row's cells. Returns the row width, or `None` when a cell
    /// cannot be fit without colliding with an active row span.
    fn analyze_row(
        &mut self,
        dom: &SourceDom,
        row: SourceId,
        cell_width: &impl Fn(SourceId) -> Option<f64>,
    ) -> Option<f64> {
        let mut cursor = 0.0f64;
        let mut index = 0usize;

        for cell in dom
            .children(row)
            .filter(|&c| matches!(dom.tag_name(c), Some("td" | "th")))
        {
            // Skip boundaries still claimed by a prior row's span.
            while index < self.starts.len() && self.spans[index] > 0 {
                index += 1;
                if index < self.starts.len() {
                    cursor = self.starts[index];
                } else {
                    // Claimed through the last known boundary; there is no
                    // position left to place this cell at.
                    return None;
                }
            }

            // Ensure a boundary exists at the cursor.
            if index == self.starts.len() {
                self.starts.push(cursor);
                self.spans.push(0);
            } else if (self.starts[index] - cursor).abs() > TOLERANCE {
                if cursor < self.starts[index] {
                    self.starts.insert(index, cursor);
                    self.spans.insert(index, 0);
                } else {
                    return None;
                }
            }

            let width = match cell_width(cell) {
                Some(w) if w > 0.0 && w.is_finite() => w,
                _ => DEFAULT_CELL_WIDTH,
            };
            let end = cursor + width;

            // Boundaries consumed by this cell's width. A consumed boundary
            // claimed by a prior row's span is a collision.
            let mut next = index + 1;
            while next < self.starts.len() && self.starts[next] < end - TOLERANCE {
                if self.spans[next] > 0 {
                    return None;
                }
                next += 1;
            }
            if next < self.starts.len() && (self.starts[next] - end).abs() > TOLERANCE {
                // The cell ends between boundaries; split the column there.
                self.starts.insert(next, end);
                self.spans.insert(next, 0);
            }

            let col_span = (next - index) as u32;
            self.cell_spans.insert(cell, col_span.max(1));

            let row_span = dom
                .attr(cell, "rowspan")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);
            if row_span > 1 {
                for span in &mut self.spans[index..next] {
                    *span = (*span).max(row_span);
                }
            }

            cursor = end;
            index = next;
        }

        Some(cursor)
    }

    fn into_geometry(self) -> TableGeometry {
        if self.starts.is_empty() {
            return TableGeometry::default();
        }

        let mut boundaries = self.starts;
        boundaries.push(self.max_row_width);
        for pair in boundaries.windows(2) {
            // Non-ascending boundaries mean the analysis itself is broken,
            // not that the input was irregular.
            assert!(
                pair[0] < pair[1],
                "column boundaries not strictly ascending: {boundaries:?}"
            );
        }

        let columns = boundaries.windows(2).map(|w| w[1] - w[0]).collect();
        TableGeometry {
            columns,
            cell_spans: self.cell_spans,
        }
    }
}

/// Rows of the table grouped by `<thead>`/`<tbody>`/`<tfoot>`; consecutive
/// bare `<tr>` children form one implicit group with no group element.
pub(crate) fn row_groups(
    dom: &SourceDom,
    table: SourceId,
) -> Vec<(Option<SourceId>, Vec<SourceId>)> {
    let mut groups: Vec<(Option<SourceId>, Vec<SourceId>)> = Vec::new();
    let mut implicit: Option<usize> = None;

    for child in dom.children(table) {
        match dom.tag_name(child) {
            Some("thead" | "tbody" | "tfoot") => {
                implicit = None;
                let rows: Vec<_> = dom
                    .children(child)
                    .filter(|&r| dom.tag_name(r) == Some("tr"))
                    .collect();
                if !rows.is_empty() {
                    groups.push((Some(child), rows));
                }
            }
            Some("tr") => {
                let (_, group) = match implicit {
                    Some(i) => &mut groups[i],
                    None => {
                        groups.push((None, Vec::new()));
                        implicit = Some(groups.len() - 1);
                        groups.last_mut().unwrap()
                    }
                };
                group.push(child);
            }
            _ => {}
        }
    }

    groups
}

/// Column widths from explicit `<col>`/`<colgroup>` markup, one column per
/// `<col>`.
fn fallback_geometry(dom: &SourceDom, table: SourceId) -> TableGeometry {
    let mut columns = Vec::new();

    for child in dom.children(table) {
        match dom.tag_name(child) {
            Some("col") => columns.push(col_width(dom, child)),
            Some("colgroup") => {
                let cols: Vec<_> = dom
                    .children(child)
                    .filter(|&c| dom.tag_name(c) == Some("col"))
                    .collect();
                if cols.is_empty() {
                    columns.push(col_width(dom, child));
                } else {
                    for col in cols {
                        columns.push(col_width(dom, col));
                    }
                }
            }
            _ => {}
        }
    }

    TableGeometry {
        columns,
        cell_spans: HashMap::new(),
    }
}

fn col_width(dom: &SourceDom, col: SourceId) -> f64 {
    dom.attr(col, "width")
        .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        .filter(|w| *w > 0.0 && w.is_finite())
        .unwrap_or(DEFAULT_CELL_WIDTH)
}
