//! The status overlay as a character grid.
//!
//! The overlay is not a separate text pass. The first [`TEXT_INSTANCES`]
//! instances of the cube draw call are turned into screen cells by the vertex
//! shader, which reads this grid to pick a glyph per cell. The grid is
//! 128 columns by 5 rows; row 0 is the bottom line of the window and row 4 is
//! pinned to the top.
//!
//! Static labels are written once at init. Volatile fields are rewritten
//! every frame by [`StatusGrid::compose_frame`], except the "current" rates,
//! which only change when the timer's anti-blink signal allows it.
//!
//! [`TEXT_INSTANCES`]: crate::config::TEXT_INSTANCES

use crate::{
    config::{STATUS_COLUMNS, STATUS_ROWS, STATUS_WORDS},
    timer::{CycleCounter, Timer},
};

/// Row pinned to the top of the window; holds the controls.
const ROW_CONTROLS: usize = 4;
const ROW_SECONDS: usize = 3;
const ROW_COUNT: usize = 2;
const ROW_AVERAGE: usize = 1;
const ROW_CURRENT: usize = 0;

const COL_INFO: usize = 1;
const COL_FRAME_LABELS: usize = 60;
const COL_FRAME_VALUES: usize = 73;
const COL_BUS_LABELS: usize = 90;
const COL_BUS_VALUES: usize = 112;
const COL_LOAD_LABEL: usize = 1;
const COL_LOAD_VALUE: usize = 36;
const COL_DEPTH_LABEL: usize = 52;
const COL_DEPTH_VALUE: usize = 82;

const LABELS: [(usize, usize, &str); 10] = [
    (ROW_SECONDS, COL_FRAME_LABELS, "Seconds"),
    (ROW_COUNT, COL_FRAME_LABELS, "Frames"),
    (ROW_AVERAGE, COL_FRAME_LABELS, "FPS average"),
    (ROW_CURRENT, COL_FRAME_LABELS, "FPS current"),
    (ROW_SECONDS, COL_BUS_LABELS, "Bus traffic seconds"),
    (ROW_COUNT, COL_BUS_LABELS, "Megabytes"),
    (ROW_AVERAGE, COL_BUS_LABELS, "MBPS average"),
    (ROW_CURRENT, COL_BUS_LABELS, "MBPS current"),
    (ROW_CONTROLS, COL_LOAD_LABEL, "GPU load instances (up/down keys)"),
    (ROW_CONTROLS, COL_DEPTH_LABEL, "Depth test (left/right keys)"),
];

/// Only the low seven bits of a cell select a glyph.
const GLYPH_MASK: u8 = 0x7F;

/// Fixed grid of character cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusGrid {
    cells: [[u8; STATUS_COLUMNS]; STATUS_ROWS],
}

impl StatusGrid {
    /// A grid of blanks.
    pub fn new() -> Self {
        Self {
            cells: [[b' '; STATUS_COLUMNS]; STATUS_ROWS],
        }
    }

    /// Writes `text` starting at `(row, col)`. Text running past the end of the
    /// row is dropped, as is a row outside the grid.
    pub fn write(&mut self, row: usize, col: usize, text: &str) {
        let Some(line) = self.cells.get_mut(row) else {
            return;
        };
        let Some(tail) = line.get_mut(col..) else {
            return;
        };
        for (cell, byte) in tail.iter_mut().zip(text.bytes()) {
            *cell = byte;
        }
    }

    /// The text of one row, trailing blanks included, or `None` for a row
    /// outside the grid.
    pub fn row(&self, row: usize) -> Option<String> {
        let line = self.cells.get(row)?;
        Some(line.iter().map(|&b| char::from(b & GLYPH_MASK)).collect())
    }

    /// Glyph indices packed four to a word, first cell in the low byte, rows
    /// in order from the bottom.
    pub fn pack(&self) -> [u32; STATUS_WORDS] {
        let mut words = [0u32; STATUS_WORDS];
        let cells = self.cells.iter().flatten();
        for (i, &cell) in cells.enumerate() {
            words[i / 4] |= u32::from(cell & GLYPH_MASK) << ((i % 4) * 8);
        }
        words
    }

    /// Writes the metric names and the control hints.
    pub fn write_labels(&mut self) {
        for (row, col, text) in LABELS {
            self.write(row, col, text);
        }
    }

    /// Writes up to four identification lines (vendor, renderer, version,
    /// shading language) downwards from row 3. Lines are clipped so they do
    /// not run into the metric labels.
    pub fn write_adapter_info<S: AsRef<str>>(&mut self, lines: &[S]) {
        let width = COL_FRAME_LABELS - COL_INFO - 1;
        let rows = (ROW_CURRENT..=ROW_SECONDS).rev();
        for (row, line) in rows.zip(lines) {
            let clipped: String = line.as_ref().chars().filter(char::is_ascii).take(width).collect();
            self.write(row, COL_INFO, &clipped);
        }
    }

    /// Rewrites the volatile fields after a frame has been presented.
    ///
    /// Also closes the frame on `timer` and opens the next one, so it must be
    /// called exactly once per frame.
    pub fn compose_frame<C: CycleCounter>(
        &mut self,
        timer: &mut Timer<C>,
        load: u32,
        depth_test: bool,
        mbps_current: f64,
    ) {
        self.write(ROW_CONTROLS, COL_LOAD_VALUE, &format!("{load:<13}"));
        let depth = if depth_test { "ON" } else { "OFF" };
        self.write(ROW_CONTROLS, COL_DEPTH_VALUE, &format!("{depth:<6}"));

        self.write(ROW_SECONDS, COL_BUS_VALUES, &fixed2(timer.transfer_seconds()));
        self.write(ROW_COUNT, COL_BUS_VALUES, &fixed2(timer.megabytes_count()));
        self.write(ROW_AVERAGE, COL_BUS_VALUES, &fixed2(timer.average_mbps()));
        if timer.anti_blink_mbps() {
            self.write(ROW_CURRENT, COL_BUS_VALUES, &fixed2(mbps_current));
        }

        self.write(ROW_SECONDS, COL_FRAME_VALUES, &fixed1(timer.performance_seconds()));
        let frames = timer.frames_count();
        self.write(ROW_COUNT, COL_FRAME_VALUES, &format!("{frames} "));
        if frames > 0 {
            let fps_average = timer.average_fps();
            let fps_current = timer.stop_frame();
            self.write(ROW_AVERAGE, COL_FRAME_VALUES, &fixed1(fps_average));
            if timer.anti_blink_fps() {
                self.write(ROW_CURRENT, COL_FRAME_VALUES, &fixed1(fps_current));
            }
        }
        timer.start_frame();
    }
}

impl Default for StatusGrid {
    fn default() -> Self {
        Self::new()
    }
}

// Trailing blanks erase the tail of a previous, longer value.
fn fixed1(value: f64) -> String {
    format!("{value:.1}    ")
}

fn fixed2(value: f64) -> String {
    format!("{value:.2}    ")
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::timer::Calibration;

    #[derive(Clone, Default)]
    struct Ticks(Rc<Cell<u64>>);

    impl CycleCounter for Ticks {
        fn cycles(&self) -> u64 {
            self.0.get()
        }
    }

    fn line(grid: &StatusGrid, row: usize) -> String {
        grid.row(row).unwrap()
    }

    #[test]
    fn rows_outside_the_grid_read_as_none() {
        let mut grid = StatusGrid::new();
        grid.write(STATUS_ROWS, 0, "nowhere");
        assert!(grid.row(STATUS_ROWS - 1).is_some());
        assert_eq!(grid.row(STATUS_ROWS), None);
        assert_eq!(grid.row(usize::MAX), None);
    }

    #[test]
    fn writes_are_clipped_to_the_row() {
        let mut grid = StatusGrid::new();
        grid.write(0, 125, "abcdef");
        grid.write(9, 0, "nowhere");
        grid.write(1, 500, "nowhere");
        assert!(line(&grid, 0).ends_with("abc"));
        assert_eq!(line(&grid, 1).trim(), "");
        assert_eq!(line(&grid, 1).len(), STATUS_COLUMNS);
    }

    #[test]
    fn packs_four_glyphs_per_word_low_byte_first() {
        let mut grid = StatusGrid::new();
        grid.write(0, 0, "ABCD");
        grid.write(4, 124, "wxyz");
        let words = grid.pack();
        assert_eq!(words[0], u32::from_le_bytes(*b"ABCD"));
        assert_eq!(words[1], u32::from_le_bytes(*b"    "));
        assert_eq!(words[STATUS_WORDS - 1], u32::from_le_bytes(*b"wxyz"));
    }

    #[test]
    fn glyphs_are_seven_bit() {
        let mut grid = StatusGrid::new();
        grid.cells[2][5] = 0xC1;
        let words = grid.pack();
        let word = words[(2 * STATUS_COLUMNS + 5) / 4];
        assert_eq!((word >> 8) & 0xFF, 0x41);
    }

    #[test]
    fn labels_sit_at_their_columns() {
        let mut grid = StatusGrid::new();
        grid.write_labels();
        assert_eq!(&line(&grid, 3)[60..67], "Seconds");
        assert_eq!(&line(&grid, 0)[90..102], "MBPS current");
        assert_eq!(&line(&grid, 4)[1..34], "GPU load instances (up/down keys)");
        assert_eq!(&line(&grid, 4)[52..80], "Depth test (left/right keys)");
    }

    #[test]
    fn adapter_info_fills_rows_downwards_and_is_clipped() {
        let mut grid = StatusGrid::new();
        let long = "x".repeat(200);
        grid.write_adapter_info(&["Vendor", "Renderer", "Version", long.as_str()]);
        assert_eq!(&line(&grid, 3)[1..7], "Vendor");
        assert_eq!(&line(&grid, 2)[1..9], "Renderer");
        assert_eq!(&line(&grid, 1)[1..8], "Version");
        assert_eq!(line(&grid, 0).trim_end().len(), COL_FRAME_LABELS - 1);
    }

    #[test]
    fn current_rates_refresh_only_on_anti_blink() {
        let ticks = Ticks::default();
        let mut timer = Timer::with_calibration(ticks.clone(), Calibration::from_frequency(1000.0));
        let mut grid = StatusGrid::new();
        timer.reset_statistics();

        // First frame: nothing drawn yet, so no frame rates.
        grid.compose_frame(&mut timer, 1000, true, 12.5);
        assert_eq!(&line(&grid, 4)[36..40], "1000");
        assert_eq!(&line(&grid, 4)[82..84], "ON");
        assert_eq!(&line(&grid, 2)[73..75], "0 ");
        assert_eq!(line(&grid, 0)[112..].trim(), "");
        assert_eq!(line(&grid, 1)[73..90].trim(), "");
        assert_eq!(line(&grid, 1)[112..].trim(), "0.00");
        assert_eq!(line(&grid, 3)[112..].trim(), "0.00");

        ticks.0.set(600);
        grid.compose_frame(&mut timer, 30000, false, 7.25);
        assert_eq!(&line(&grid, 4)[36..41], "30000");
        assert_eq!(&line(&grid, 4)[82..85], "OFF");
        assert_eq!(line(&grid, 0)[112..].trim(), "7.25");
        assert_eq!(line(&grid, 0)[73..80].trim(), "1.7");
        assert_eq!(line(&grid, 3)[73..80].trim(), "0.6");

        // Within the half second: current values stay, averages move.
        ticks.0.set(700);
        grid.compose_frame(&mut timer, 30000, false, 99.0);
        assert_eq!(line(&grid, 0)[112..].trim(), "7.25");
        assert_eq!(line(&grid, 0)[73..80].trim(), "1.7");
        assert_eq!(&line(&grid, 2)[73..75], "2 ");
        assert_eq!(timer.frames_count(), 3);
    }

    #[test]
    fn bus_average_reads_zero_after_a_reset() {
        let ticks = Ticks::default();
        let mut timer = Timer::with_calibration(ticks.clone(), Calibration::from_frequency(1000.0));
        let mut grid = StatusGrid::new();
        timer.reset_statistics();

        timer.start_transfer();
        ticks.0.set(250);
        timer.stop_transfer(1_048_576);
        grid.compose_frame(&mut timer, 1000, true, 4.0);
        assert_eq!(line(&grid, 1)[112..].trim(), "4.00");

        timer.reset_statistics();
        grid.compose_frame(&mut timer, 1000, true, 4.0);
        assert_eq!(line(&grid, 1)[112..].trim(), "0.00");
        assert!(!line(&grid, 1).contains("NaN"));
    }
}
