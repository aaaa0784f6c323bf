//! Deterministic synthetic data generator.
//!
//! Cell values are pure functions of their coordinates, so populating a
//! chunk twice writes identical data and chunk loads are idempotent.

use crate::types::Cell;

/// Number of rows per chunk, the atomic unit of background loading.
pub const CHUNK_SIZE: u32 = 1_000;

/// Deterministic value for a single cell.
///
/// Cycles through five display patterns keyed by `(row + col) % 5` so the
/// demo grid looks varied without storing anything extra.
#[must_use]
pub fn cell_value(row_index: u32, column_index: u32) -> String {
    match (row_index + column_index) % 5 {
        0 => format!("Cell-{row_index}-{column_index}"),
        1 => format!("R{row_index}C{column_index}"),
        2 => (u64::from(row_index) * u64::from(column_index)).to_string(),
        3 => format!("Data {row_index}"),
        _ => format!("Col {column_index}"),
    }
}

/// Chunk index owning a given row.
#[must_use]
pub fn chunk_for_row(row_index: u32) -> u32 {
    row_index / CHUNK_SIZE
}

/// Number of chunks needed to cover `total_rows`.
#[must_use]
pub fn total_chunks(total_rows: u32) -> u32 {
    total_rows.div_ceil(CHUNK_SIZE)
}

/// First row of a chunk.
#[must_use]
pub fn chunk_start_row(chunk_index: u32) -> u32 {
    chunk_index * CHUNK_SIZE
}

/// One-past-the-last row of a chunk, clamped to `total_rows` for the
/// final partial chunk.
#[must_use]
pub fn chunk_end_row(chunk_index: u32, total_rows: u32) -> u32 {
    ((chunk_index + 1) * CHUNK_SIZE).min(total_rows)
}

/// Generate every cell of a chunk: rows
/// `[chunk_index * 1000, min((chunk_index + 1) * 1000, total_rows))` times
/// all columns.
#[must_use]
pub fn generate_chunk(chunk_index: u32, total_rows: u32, total_columns: u32) -> Vec<Cell> {
    let start = chunk_start_row(chunk_index);
    let end = chunk_end_row(chunk_index, total_rows);
    let mut cells = Vec::with_capacity(((end - start) * total_columns) as usize);
    for row in start..end {
        for col in 0..total_columns {
            cells.push(Cell {
                row_index: row,
                column_index: col,
                value: cell_value(row, col),
                is_loaded: false,
            });
        }
    }
    cells
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_cell_value_deterministic() {
        assert_eq!(cell_value(500, 50), cell_value(500, 50));
        assert_eq!(cell_value(0, 0), "Cell-0-0");
        assert_eq!(cell_value(0, 1), "R0C1");
        assert_eq!(cell_value(1, 1), "1");
        assert_eq!(cell_value(3, 0), "Data 3");
        assert_eq!(cell_value(0, 4), "Col 4");
    }

    #[test]
    fn test_cell_value_product_does_not_overflow() {
        // 99_999 * 99 exceeds u32::MAX on larger grids if computed in u32
        let value = cell_value(99_997, 100_000);
        assert_eq!(value, (99_997u64 * 100_000u64).to_string());
    }

    #[test_case(0, 0; "first row")]
    #[test_case(999, 0; "last row of chunk zero")]
    #[test_case(1000, 1; "first row of chunk one")]
    #[test_case(500, 0; "mid chunk")]
    #[test_case(99_999, 99; "last row of grid")]
    fn test_chunk_for_row(row: u32, expected: u32) {
        assert_eq!(chunk_for_row(row), expected);
    }

    #[test_case(100_000, 100; "exact multiple")]
    #[test_case(100_001, 101; "one row over")]
    #[test_case(999, 1; "less than one chunk")]
    #[test_case(1, 1; "single row")]
    fn test_total_chunks(total_rows: u32, expected: u32) {
        assert_eq!(total_chunks(total_rows), expected);
    }

    #[test]
    fn test_generate_chunk_full() {
        let cells = generate_chunk(0, 100_000, 10);
        assert_eq!(cells.len(), 1000 * 10);
        assert_eq!(cells[0].row_index, 0);
        assert_eq!(cells[0].column_index, 0);
        let last = cells.last().unwrap();
        assert_eq!(last.row_index, 999);
        assert_eq!(last.column_index, 9);
        assert!(cells.iter().all(|c| !c.is_loaded));
    }

    #[test]
    fn test_generate_chunk_clamps_final_partial_chunk() {
        // 2500 rows -> chunk 2 covers rows 2000..2500 only
        let cells = generate_chunk(2, 2_500, 4);
        assert_eq!(cells.len(), 500 * 4);
        assert_eq!(cells[0].row_index, 2000);
        assert_eq!(cells.last().unwrap().row_index, 2499);
    }

    #[test]
    fn test_generate_chunk_matches_cell_value() {
        let cells = generate_chunk(1, 10_000, 3);
        for cell in &cells {
            assert_eq!(cell.value, cell_value(cell.row_index, cell.column_index));
        }
    }
}
