//! Square ASCII sky chart.
//!
//! Bodies are placed on the border ring of a `2*size` square centered on the
//! observer. Every ring cell owns the arc of bearings between its predecessor
//! and itself, and a body is drawn on the cell whose arc contains its bearing.

use crate::grid::{pair, Grid, Pair, BLANK};

/// Characters per label; a label spans `LABEL_WIDTH / 2` cells.
const LABEL_WIDTH: usize = 24;
const LABEL_CELLS: i64 = (LABEL_WIDTH / 2) as i64;
const NAME_CHARS: usize = 5;
const BODY_MARK: Pair = [' ', 'X'];
const OBSERVER_MARK: &str = " you <3 ";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub(crate) enum ChartError {
    #[error("invalid grid size {0} (must be positive)")]
    InvalidGridSize(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Axis {
    /// Right ascension
    Ra,
    /// Declination
    Dec,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlanetPosition {
    pub(crate) name: String,
    pub(crate) ra_deg: f64,
    pub(crate) dec_deg: f64,
    /// Millions of kilometres, one decimal.
    pub(crate) distance_mkm: f64,
}

impl PlanetPosition {
    pub(crate) fn new(name: &str, ra_deg: f64, dec_deg: f64, distance_km: f64) -> Self {
        Self {
            name: name.to_string(),
            ra_deg,
            dec_deg,
            distance_mkm: (distance_km / 1e5).round() / 10.0,
        }
    }

    pub(crate) fn bearing(&self, axis: Axis) -> f64 {
        let deg = match axis {
            Axis::Ra => self.ra_deg,
            Axis::Dec => self.dec_deg,
        };
        normalize_deg(deg)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ChartOptions {
    pub(crate) size: i64,
    pub(crate) axis: Axis,
    pub(crate) pad: usize,
    pub(crate) vpad: usize,
    pub(crate) horizontal_empty: char,
    pub(crate) vertical_empty: char,
    pub(crate) observer_marker: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PerimeterCell {
    pub(crate) x: i64,
    pub(crate) y: i64,
    pub(crate) bearing: f64,
}

pub(crate) fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Angle of `(x, y)` from the +y axis toward +x, in `[0, 360)`.
pub(crate) fn bearing_of(x: i64, y: i64) -> f64 {
    normalize_deg((x as f64).atan2(y as f64).to_degrees())
}

/// The `8 * size` points at Chebyshev radius `size`, sorted by bearing.
///
/// Each edge is half-open and the bottom and left edges run backwards, so the
/// four edges tile the ring without repeating a corner.
pub(crate) fn perimeter(size: i64) -> Vec<PerimeterCell> {
    let mut cells = Vec::with_capacity((8 * size.max(0)) as usize);
    let mut push = |x: i64, y: i64| cells.push(PerimeterCell { x, y, bearing: bearing_of(x, y) });
    for i in -size..size {
        push(i, -size);
        push(-i, size);
    }
    for i in -size..size {
        push(size, i);
        push(-size, -i);
    }
    // sort_by is stable
    cells.sort_by(|a, b| a.bearing.total_cmp(&b.bearing));
    cells
}

/// Whether `bearing` falls in the arc `[from, to)`, walking up from `from` and
/// wrapping through 360 when `from > to`.
fn arc_contains(from: f64, to: f64, bearing: f64) -> bool {
    if from <= to {
        from <= bearing && bearing < to
    } else {
        bearing >= from || bearing < to
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Justify {
    Left,
    Right,
    Center,
}

/// Labels already stacked above the top edge and below the bottom edge.
#[derive(Default)]
struct Stacking {
    above: i64,
    below: i64,
}

fn label_text(claimants: &[&PlanetPosition]) -> String {
    let first = claimants[0];
    let name: String = first.name.chars().take(NAME_CHARS).collect();
    let mut label = format!("{}, {:.1} mkm away", name, first.distance_mkm);
    if claimants.len() > 1 {
        label.push_str(&format!(" +{}", claimants.len() - 1));
    }
    label.chars().take(LABEL_WIDTH).collect()
}

fn justify(label: &str, how: Justify) -> String {
    match how {
        Justify::Left => format!("{:<w$}", label, w = LABEL_WIDTH),
        Justify::Right => format!("{:>w$}", label, w = LABEL_WIDTH),
        Justify::Center => format!("{:^w$}", label, w = LABEL_WIDTH),
    }
}

/// Renders `planets` into a chart of `size*2+vpad*2` rows by `size*2+pad*2`
/// two-character cells.
pub(crate) fn render(planets: &[PlanetPosition], opts: &ChartOptions) -> Result<String, ChartError> {
    if opts.size <= 0 {
        return Err(ChartError::InvalidGridSize(opts.size));
    }
    let size = opts.size;
    let pad = opts.pad as i64;
    let vpad = opts.vpad as i64;

    let bearings: Vec<f64> = planets.iter().map(|p| p.bearing(opts.axis)).collect();
    let ring = perimeter(size);
    let mut canvas = Grid::new((size * 2 + pad * 2) as usize, (size * 2 + vpad * 2) as usize, BLANK);
    let mut stack = Stacking::default();
    // closing cell on the bottom-right corner; a body claiming the corner overwrites it
    canvas.set(size * 2 + pad, size * 2 + vpad, pair(opts.horizontal_empty));

    for (i, cell) in ring.iter().enumerate() {
        let prev = ring[(i + ring.len() - 1) % ring.len()].bearing;
        let tx = cell.x + size + pad;
        let ty = cell.y + size;
        let top = ty == 0;
        let bottom = ty == size * 2;

        let claimants: Vec<&PlanetPosition> = planets
            .iter()
            .zip(&bearings)
            .filter(|&(_, &b)| arc_contains(prev, cell.bearing, b))
            .map(|(p, _)| p)
            .collect();

        if claimants.is_empty() {
            let glyph = if top || bottom { opts.horizontal_empty } else { opts.vertical_empty };
            canvas.set(tx, ty + vpad, pair(glyph));
            continue;
        }

        canvas.set(tx, ty + vpad, BODY_MARK);

        let row = ty
            + vpad
            + if bottom {
                stack.below += 1;
                stack.below
            } else if top {
                stack.above += 1;
                -stack.above
            } else {
                0
            };

        let (start, how) = if tx - pad == size * 2 {
            (tx + 2, Justify::Left)
        } else if tx - pad == 0 {
            // the span [tx-14, tx+2) is wider than a label; anchor at its start
            (tx - LABEL_CELLS - 2, Justify::Right)
        } else {
            (tx - LABEL_CELLS / 2, Justify::Center)
        };
        canvas.write_pairs(start, row, &justify(&label_text(&claimants), how));
    }

    if opts.observer_marker {
        canvas.write_pairs(size + pad - 1, size + vpad, OBSERVER_MARK);
    }

    Ok(canvas.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn opts(size: i64, pad: usize, vpad: usize) -> ChartOptions {
        ChartOptions {
            size,
            axis: Axis::Ra,
            pad,
            vpad,
            horizontal_empty: '.',
            vertical_empty: '.',
            observer_marker: false,
        }
    }

    fn at(ra: f64, name: &str, distance_km: f64) -> PlanetPosition {
        PlanetPosition::new(name, ra, 0.0, distance_km)
    }

    /// Planets claimed per ring cell, reproducing the sweep's arc ownership.
    fn claims(planets: &[PlanetPosition], size: i64) -> Vec<usize> {
        let ring = perimeter(size);
        (0..ring.len())
            .map(|i| {
                let prev = ring[(i + ring.len() - 1) % ring.len()].bearing;
                planets
                    .iter()
                    .filter(|p| arc_contains(prev, ring[i].bearing, p.bearing(Axis::Ra)))
                    .count()
            })
            .collect()
    }

    #[test]
    fn perimeter_has_8_size_distinct_points() {
        for size in 1..12 {
            let ring = perimeter(size);
            assert_eq!(ring.len(), (8 * size) as usize);
            let unique: HashSet<(i64, i64)> = ring.iter().map(|c| (c.x, c.y)).collect();
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|c| c.x.abs().max(c.y.abs()) == size));
        }
    }

    #[test]
    fn perimeter_is_sorted_and_in_range() {
        let ring = perimeter(6);
        assert!(ring.windows(2).all(|w| w[0].bearing <= w[1].bearing));
        assert!(ring.iter().all(|c| (0.0..360.0).contains(&c.bearing)));
        assert_eq!(ring[0].bearing, 0.0);
        assert_eq!((ring[0].x, ring[0].y), (0, 6));
    }

    #[test]
    fn bearing_is_measured_from_positive_y_toward_positive_x() {
        assert_eq!(bearing_of(0, 1), 0.0);
        assert_relative_eq!(bearing_of(1, 0), 90.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_of(0, -1), 180.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_of(-1, 0), 270.0, epsilon = 1e-9);
        assert_relative_eq!(bearing_of(1, 1), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_bearings_wrap_into_range() {
        let p = PlanetPosition::new("moon", 10.0, -30.0, 384_400.0);
        assert_eq!(p.bearing(Axis::Dec), 330.0);
        assert_eq!(p.bearing(Axis::Ra), 10.0);
        assert_eq!(normalize_deg(-1e-20), 0.0);
    }

    #[test]
    fn distance_is_rounded_to_one_decimal_of_a_million_km() {
        let p = PlanetPosition::new("venus", 0.0, 0.0, 149_597_870.7);
        assert_eq!(p.distance_mkm, 149.6);
    }

    #[test]
    fn rejects_non_positive_size() {
        assert_eq!(render(&[], &opts(0, 2, 1)), Err(ChartError::InvalidGridSize(0)));
        assert_eq!(render(&[], &opts(-3, 2, 1)), Err(ChartError::InvalidGridSize(-3)));
    }

    #[test]
    fn dimensions_do_not_depend_on_planets() {
        let planets: Vec<_> = (0..20).map(|i| at(i as f64 * 17.0, "saturn", 1.4e9)).collect();
        for set in [&planets[..0], &planets[..3], &planets[..]] {
            let out = render(set, &opts(4, 3, 2)).unwrap();
            let lines: Vec<&str> = out.lines().collect();
            assert_eq!(lines.len(), 4 * 2 + 2 * 2);
            assert!(lines.iter().all(|l| l.chars().count() == (4 * 2 + 3 * 2) * 2));
        }
    }

    #[test]
    fn empty_chart_with_observer_marker() {
        let mut o = opts(3, 2, 1);
        o.observer_marker = true;
        let out = render(&[], &o).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| l.chars().count() == 20));
        assert!(!out.contains('X'));
        assert!(!out.contains("mkm"));
        assert_eq!(&lines[4][8..16], " you <3 ");
        // the closing cell is the ring's bottom-right corner
        assert_eq!(out.matches(" .").count(), 8 * 3);
        assert_eq!(&lines[7][16..18], " .");
    }

    #[test]
    fn empty_chart_uses_edge_specific_glyphs() {
        let mut o = opts(2, 1, 1);
        o.horizontal_empty = '-';
        o.vertical_empty = '|';
        let out = render(&[], &o).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], " ".repeat(12));
        assert_eq!(lines[1], "   - - - - -");
        assert_eq!(lines[2], "   |       |");
        assert_eq!(lines[3], "   |       |");
        assert_eq!(lines[5], "   - - - - -");
    }

    #[test]
    fn bearing_zero_attaches_to_first_cell_past_zero() {
        let venus = at(0.0, "venus", 149.6e6);
        let o = opts(5, 14, 3);
        let ring = perimeter(5);
        let counts = claims(std::slice::from_ref(&venus), 5);
        let hit = counts.iter().position(|&n| n == 1).unwrap();
        let smallest_positive = ring.iter().position(|c| c.bearing > 0.0).unwrap();
        assert_eq!(hit, smallest_positive);

        let out = render(&[venus], &o).unwrap();
        assert_eq!(out.matches('X').count(), 1);
        assert!(out.contains("venus, 149.6 mkm away"));
    }

    #[test]
    fn every_planet_is_claimed_exactly_once() {
        let size = 4;
        let mut planets: Vec<_> = perimeter(size).iter().map(|c| at(c.bearing, "edge", 1e8)).collect();
        planets.extend([0.0, 359.999, 180.0, 45.0, 12.3].iter().map(|&b| at(b, "misc", 1e8)));
        let counts = claims(&planets, size);
        assert_eq!(counts.iter().sum::<usize>(), planets.len());
    }

    #[test]
    fn bearing_on_a_cell_falls_to_the_next_cell() {
        let size = 3;
        let ring = perimeter(size);
        let planets = vec![at(ring[4].bearing, "a", 1e8), at(ring[4].bearing, "b", 1e8)];
        let counts = claims(&planets, size);
        assert_eq!(counts[4], 0);
        assert_eq!(counts[5], 2);
    }

    #[test]
    fn shared_cell_label_counts_extra_bodies() {
        let planets = vec![at(91.0, "jupiter", 7.0e8), at(91.5, "saturn", 1.5e9)];
        let out = render(&planets, &opts(4, 14, 2)).unwrap();
        assert_eq!(out.matches('X').count(), 1);
        assert!(out.contains("jupit, 700.0 mkm away +1"));
        assert!(!out.contains("satur"));
    }

    #[test]
    fn labels_are_truncated_to_24_characters() {
        let planets = vec![at(91.0, "mercury", 1.0e11), at(91.2, "venus", 1e8), at(91.4, "mars", 1e8)];
        let full = format!("{}, {:.1} mkm away +2", "mercu", 100_000.0);
        assert!(full.chars().count() > LABEL_WIDTH);
        let out = render(&planets, &opts(4, 14, 2)).unwrap();
        let cut: String = full.chars().take(LABEL_WIDTH).collect();
        assert!(out.contains(&cut));
        assert!(!out.contains(&full));
    }

    #[test]
    fn right_edge_label_is_left_justified_beside_the_mark() {
        // bearing just below 90 lands on the (size, 0) cell of the right edge
        let out = render(&[at(89.0, "mars", 2.0e8)], &opts(4, 14, 2)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let row = lines[4 + 2];
        let mark = 2 * (4 + 4 + 14);
        assert_eq!(&row[mark..mark + 2], " X");
        assert!(row[mark + 4..].starts_with("mars, 200.0 mkm away"));
    }

    #[test]
    fn left_edge_label_is_right_justified_and_keeps_the_mark() {
        let out = render(&[at(269.0, "mars", 2.0e8)], &opts(4, 14, 2)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let row = lines[4 + 2];
        assert_eq!(&row[..24], "    mars, 200.0 mkm away");
        assert_eq!(&row[24..28], "    ");
        assert_eq!(&row[28..30], " X");
    }

    #[test]
    fn top_and_bottom_labels_stack_outward() {
        // bearings near 180 sit on the top edge, near 0 on the bottom edge
        let planets = vec![
            at(170.0, "aaaaa", 1e8),
            at(188.0, "bbbbb", 1e8),
            at(5.0, "ccccc", 1e8),
            at(352.0, "ddddd", 1e8),
        ];
        let out = render(&planets, &opts(6, 14, 4)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let row_of = |s: &str| lines.iter().position(|l| l.contains(s)).unwrap();
        let top = [row_of("aaaaa"), row_of("bbbbb")];
        let bottom = [row_of("ccccc"), row_of("ddddd")];
        assert_eq!({ let mut t = top; t.sort(); t }, [2, 3]);
        assert_eq!({ let mut b = bottom; b.sort(); b }, [17, 18]);
    }

    #[test]
    fn body_on_the_bottom_right_corner_keeps_its_mark() {
        let ring = perimeter(4);
        let corner = ring.iter().position(|c| (c.x, c.y) == (4, 4)).unwrap();
        let counts = claims(&[at(40.0, "venus", 1e8)], 4);
        assert_eq!(counts[corner], 1);

        let mut o = opts(4, 14, 3);
        o.horizontal_empty = '-';
        let out = render(&[at(40.0, "venus", 1e8)], &o).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let col = 2 * (4 * 2 + 14);
        assert_eq!(&lines[4 * 2 + 3][col..col + 2], " X");
        assert_eq!(out.matches('X').count(), 1);
        assert!(out.contains("venus, 100.0 mkm away"));
    }

    #[test]
    fn render_is_deterministic() {
        let planets = vec![at(12.0, "mars", 2e8), at(250.0, "venus", 1e8)];
        let mut o = opts(5, 14, 3);
        o.observer_marker = true;
        assert_eq!(render(&planets, &o).unwrap(), render(&planets, &o).unwrap());
    }
}
