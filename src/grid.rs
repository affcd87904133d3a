/// Fixed-size row-major grid. Writes outside the bounds are dropped, so the
/// dimensions never change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Grid<T: Copy> {
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub(crate) fn new(w: usize, h: usize, fill: T) -> Self {
        Self {
            w,
            h,
            cells: vec![fill; w * h],
        }
    }

    fn idx(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(y * self.w + x)
    }

    /// Returns whether the cell was inside the grid.
    pub(crate) fn set(&mut self, x: i64, y: i64, c: T) -> bool {
        match self.idx(x, y) {
            Some(i) => {
                self.cells[i] = c;
                true
            }
            None => false,
        }
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() panics on zero, and a zero-width grid has no visible rows anyway
        self.cells.chunks(self.w.max(1)).take(self.h)
    }
}

/// Two-character terminal cell used by the sky chart.
pub(crate) type Pair = [char; 2];

pub(crate) const BLANK: Pair = [' ', ' '];

pub(crate) fn pair(glyph: char) -> Pair {
    [' ', glyph]
}

impl Grid<Pair> {
    /// Writes `text` two characters per cell starting at column `x`. A trailing
    /// odd character is padded with a space.
    pub(crate) fn write_pairs(&mut self, x: i64, y: i64, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        for (i, chunk) in chars.chunks(2).enumerate() {
            let cell = [chunk[0], chunk.get(1).copied().unwrap_or(' ')];
            self.set(x + i as i64, y, cell);
        }
    }

    pub(crate) fn render(&self) -> String {
        self.rows()
            .map(|row| row.iter().flat_map(|c| c.iter()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Grid<char> {
    pub(crate) fn write_str(&mut self, x: i64, y: i64, s: &str) {
        for (i, ch) in s.chars().enumerate() {
            if !self.set(x + i as i64, y, ch) && x + i as i64 >= 0 {
                break;
            }
        }
    }

    pub(crate) fn render(&self) -> String {
        self.rows()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
