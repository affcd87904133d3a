use crate::grid::Grid;

const POINT: char = '*';

fn label(v: f64, unit: &str) -> String {
    format!("{v:.1}{unit}")
}

/// Plots `values` as a connected line `width` columns wide and `height` rows
/// tall, with a title above and a labelled y axis on the left.
pub(crate) fn line_chart(values: &[f64], width: usize, height: usize, title: &str, y_unit: &str) -> String {
    let width = width.max(2);
    let height = height.max(2);

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if values.is_empty() {
        (lo, hi) = (0.0, 0.0);
    }
    if hi - lo < 1e-12 {
        lo -= 1.0;
        hi += 1.0;
    }

    let mid_row = (height - 1) / 2;
    let labels = [
        (0, label(hi, y_unit)),
        (mid_row, label(hi - (hi - lo) * mid_row as f64 / (height - 1) as f64, y_unit)),
        (height - 1, label(lo, y_unit)),
    ];
    let label_w = labels.iter().map(|(_, l)| l.chars().count()).max().unwrap_or(0);
    let x0 = label_w as i64 + 2;

    let mut grid = Grid::new(label_w + 2 + width, height + 1, ' ');
    for (row, text) in &labels {
        grid.write_str((label_w - text.chars().count()) as i64, *row as i64, text);
    }
    for row in 0..height {
        grid.set(x0 - 1, row as i64, '|');
    }
    grid.set(x0 - 1, height as i64, '+');
    for c in 0..width {
        grid.set(x0 + c as i64, height as i64, '-');
    }

    let row_of = |v: f64| ((hi - v) / (hi - lo) * (height - 1) as f64).round() as i64;
    let value_at = |c: usize| -> f64 {
        if values.len() == 1 {
            return values[0];
        }
        let x = c as f64 * (values.len() - 1) as f64 / (width - 1) as f64;
        let i = (x.floor() as usize).min(values.len() - 2);
        let u = x - i as f64;
        values[i] + (values[i + 1] - values[i]) * u
    };

    if !values.is_empty() {
        let mut last: Option<i64> = None;
        for c in 0..width {
            let r = row_of(value_at(c));
            let (a, b) = match last {
                Some(p) if p < r => (p + 1, r),
                Some(p) if p > r => (r, p - 1),
                _ => (r, r),
            };
            for row in a..=b {
                grid.set(x0 + c as i64, row, POINT);
            }
            last = Some(r);
        }
    }

    format!("{title}\n{}", grid.render())
}
