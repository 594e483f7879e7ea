// src/gfx/text.rs

//! Debug text overlay: a character grid laid over the backbuffer.
//!
//! The grid uses fixed 8x16 pixel cells. Each cell stores a character and a
//! [`TextAttr`]. `print` understands a small ANSI-style colour escape,
//! `ESC[<fg>;<bg>m`, where either number may be omitted to keep the current
//! nibble, and `ESC[m` / `ESC[0m` restores the attribute the call started with.

use crate::color::TextAttr;
use log::trace;

/// Width of one text cell in pixels.
pub const CELL_WIDTH: u32 = 8;
/// Height of one text cell in pixels.
pub const CELL_HEIGHT: u32 = 16;

const ESC: char = '\x1b';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCell {
    pub ch: char,
    pub attr: TextAttr,
}

impl TextCell {
    /// A space on a transparent background; painters skip it.
    pub const BLANK: TextCell = TextCell {
        ch: ' ',
        attr: TextAttr(0),
    };

    pub fn is_blank(&self) -> bool {
        self.ch == ' ' && !self.attr.has_background()
    }
}

impl Default for TextCell {
    fn default() -> Self {
        TextCell::BLANK
    }
}

/// A span of cells on one row sharing the same attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub col: u16,
    pub row: u16,
    pub attr: TextAttr,
    pub text: String,
}

/// A pre-built rectangle of cells, blitted with [`DebugText::image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextImage {
    width: u16,
    height: u16,
    cells: Vec<TextCell>,
}

impl TextImage {
    /// Builds an image from text lines, all in `attr`. Short lines are padded
    /// with blanks; the image is as wide as the longest line.
    pub fn from_lines(lines: &[&str], attr: TextAttr) -> Self {
        let width = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .min(u16::MAX as usize) as u16;
        let height = lines.len().min(u16::MAX as usize) as u16;
        let mut cells = vec![TextCell::BLANK; width as usize * height as usize];
        for (y, line) in lines.iter().enumerate().take(height as usize) {
            for (x, ch) in line.chars().enumerate().take(width as usize) {
                if ch != ' ' {
                    cells[y * width as usize + x] = TextCell { ch, attr };
                }
            }
        }
        TextImage {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Recolours every non-blank cell whose character is `ch`.
    pub fn tint(&mut self, ch: char, attr: TextAttr) {
        for cell in self.cells.iter_mut().filter(|c| c.ch == ch) {
            cell.attr = attr;
        }
    }

    fn cell(&self, x: u16, y: u16) -> TextCell {
        self.cells[y as usize * self.width as usize + x as usize]
    }
}

/// The debug text grid of one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugText {
    cols: u16,
    rows: u16,
    cells: Vec<TextCell>,
}

impl DebugText {
    pub fn new(cols: u16, rows: u16) -> Self {
        DebugText {
            cols,
            rows,
            cells: vec![TextCell::BLANK; cols as usize * rows as usize],
        }
    }

    /// A grid covering a `width` x `height` pixel surface.
    pub fn for_surface(width: u32, height: u32) -> Self {
        let (cols, rows) = Self::grid_size(width, height);
        Self::new(cols, rows)
    }

    /// Character grid dimensions for a surface size.
    pub fn grid_size(width: u32, height: u32) -> (u16, u16) {
        let cols = (width / CELL_WIDTH).min(u16::MAX as u32) as u16;
        let rows = (height / CELL_HEIGHT).min(u16::MAX as u32) as u16;
        (cols, rows)
    }

    /// Resizes the grid for a new surface size, clearing it.
    pub fn resize_for_surface(&mut self, width: u32, height: u32) {
        let (cols, rows) = Self::grid_size(width, height);
        if (cols, rows) != (self.cols, self.rows) {
            trace!(
                "Debug text grid resized {}x{} -> {}x{}",
                self.cols,
                self.rows,
                cols,
                rows
            );
        }
        *self = Self::new(cols, rows);
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn clear(&mut self) {
        self.cells.fill(TextCell::BLANK);
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<TextCell> {
        if x < self.cols && y < self.rows {
            Some(self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Writes `text` starting at cell (`x`, `y`). Characters past the right
    /// edge are dropped; a newline continues at column `x` of the next row.
    pub fn print(&mut self, x: u16, y: u16, attr: TextAttr, text: &str) {
        let mut current = attr;
        let mut col = x;
        let mut row = y;
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                ESC if chars.peek() == Some(&'[') => {
                    chars.next();
                    let mut params = String::new();
                    let mut terminated = false;
                    for c in chars.by_ref() {
                        if c == 'm' {
                            terminated = true;
                            break;
                        }
                        params.push(c);
                    }
                    if !terminated {
                        trace!("Unterminated colour escape in debug text: {:?}", params);
                        break;
                    }
                    current = apply_escape(current, attr, &params);
                }
                '\n' => {
                    col = x;
                    row = row.saturating_add(1);
                }
                _ => {
                    if col < self.cols && row < self.rows {
                        let idx = self.index(col, row);
                        self.cells[idx] = TextCell { ch, attr: current };
                    }
                    col = col.saturating_add(1);
                }
            }
        }
    }

    /// Copies `image` with its top-left corner at cell (`x`, `y`), clipped
    /// to the grid.
    pub fn image(&mut self, x: u16, y: u16, image: &TextImage) {
        for iy in 0..image.height() {
            let row = y as u32 + iy as u32;
            if row >= self.rows as u32 {
                break;
            }
            for ix in 0..image.width() {
                let col = x as u32 + ix as u32;
                if col >= self.cols as u32 {
                    break;
                }
                let idx = self.index(col as u16, row as u16);
                self.cells[idx] = image.cell(ix, iy);
            }
        }
    }

    /// The characters of one row with trailing blanks removed.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.rows {
            return String::new();
        }
        let start = self.index(0, y);
        let line: String = self.cells[start..start + self.cols as usize]
            .iter()
            .map(|c| c.ch)
            .collect();
        line.trim_end().to_string()
    }

    /// Same-attribute spans of row `y`, skipping blank cells.
    pub fn runs(&self, y: u16) -> Vec<TextRun> {
        let mut runs: Vec<TextRun> = Vec::new();
        if y >= self.rows {
            return runs;
        }
        let mut open = false;
        for x in 0..self.cols {
            let cell = self.cells[self.index(x, y)];
            if cell.is_blank() {
                open = false;
                continue;
            }
            match runs.last_mut() {
                Some(run) if open && run.attr == cell.attr => run.text.push(cell.ch),
                _ => {
                    runs.push(TextRun {
                        col: x,
                        row: y,
                        attr: cell.attr,
                        text: cell.ch.to_string(),
                    });
                    open = true;
                }
            }
        }
        runs
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.cols as usize + x as usize
    }
}

/// Applies the parameters of one `ESC[...m` sequence.
fn apply_escape(current: TextAttr, base: TextAttr, params: &str) -> TextAttr {
    let params = params.trim();
    let Some((fg, bg)) = params.split_once(';') else {
        return match params {
            "" | "0" => base,
            fg => match fg.parse::<u8>() {
                Ok(fg) => current.with_fg(fg),
                Err(_) => current,
            },
        };
    };
    let mut attr = current;
    if let Ok(fg) = fg.trim().parse::<u8>() {
        attr = attr.with_fg(fg);
    }
    if let Ok(bg) = bg.trim().parse::<u8>() {
        attr = attr.with_bg(bg);
    }
    attr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_follows_cell_size() {
        let text = DebugText::for_surface(1024, 768);
        assert_eq!((text.cols(), text.rows()), (128, 48));
        let text = DebugText::for_surface(7, 15);
        assert_eq!((text.cols(), text.rows()), (0, 0));
    }

    #[test]
    fn print_clips_at_the_right_edge() {
        let mut text = DebugText::new(5, 2);
        text.print(2, 0, TextAttr::DEFAULT, "abcdef");
        assert_eq!(text.row_text(0), "  abc");
        text.print(0, 5, TextAttr::DEFAULT, "off grid");
        assert_eq!(text.row_text(1), "");
    }

    #[test]
    fn escapes_change_and_restore_colours() {
        let mut text = DebugText::new(16, 1);
        text.print(0, 0, TextAttr::DEFAULT, "a\x1b[9;mb\x1b[;4mc\x1b[0md");
        assert_eq!(text.row_text(0), "abcd");
        assert_eq!(text.cell(0, 0).unwrap().attr, TextAttr(0x0f));
        assert_eq!(text.cell(1, 0).unwrap().attr, TextAttr(0x09));
        assert_eq!(text.cell(2, 0).unwrap().attr, TextAttr(0x49));
        assert_eq!(text.cell(3, 0).unwrap().attr, TextAttr(0x0f));
    }

    #[test]
    fn escape_parameters_tolerate_spaces() {
        let mut text = DebugText::new(8, 1);
        text.print(0, 0, TextAttr::DEFAULT, "\x1b[; 3m  \x1b[m ");
        assert_eq!(text.cell(0, 0).unwrap().attr, TextAttr(0x3f));
        assert_eq!(text.cell(1, 0).unwrap().attr, TextAttr(0x3f));
        assert!(text.cell(2, 0).unwrap().is_blank());
    }

    #[test]
    fn runs_split_on_attribute_and_blanks() {
        let mut text = DebugText::new(20, 1);
        text.print(0, 0, TextAttr::DEFAULT, "ab\x1b[12;mcd  ef");
        let runs = text.runs(0);
        assert_eq!(runs.len(), 3);
        assert_eq!((runs[0].col, runs[0].text.as_str()), (0, "ab"));
        assert_eq!((runs[1].col, runs[1].text.as_str()), (2, "cd"));
        assert_eq!(runs[1].attr, TextAttr(0x0c));
        assert_eq!((runs[2].col, runs[2].text.as_str()), (6, "ef"));
    }

    #[test]
    fn image_blits_with_clipping() {
        let image = TextImage::from_lines(&["xy", "z"], TextAttr(0x02));
        assert_eq!((image.width(), image.height()), (2, 2));
        let mut text = DebugText::new(3, 3);
        text.image(2, 1, &image);
        assert_eq!(text.row_text(1), "  x");
        assert_eq!(text.row_text(2), "  z");
        assert_eq!(text.cell(2, 1).unwrap().attr, TextAttr(0x02));
    }
}
