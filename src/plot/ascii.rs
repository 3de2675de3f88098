//! ASCII plotting of the daily sales trend for terminal output.
//!
//! Fixed-size character grid, deterministic output:
//! - daily totals: `o`
//! - connecting line: `-`

use crate::report::DailyTotal;

/// Render the daily totals as a `width` x `height` grid with a range header.
pub fn render_daily_trend(daily: &[DailyTotal], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some(origin) = daily.first().map(|d| d.date) else {
        return "Plot: no data\n".to_string();
    };
    let points: Vec<(f64, f64)> = daily
        .iter()
        .map(|d| ((d.date - origin).num_days() as f64, d.total))
        .collect();

    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let (y_min, y_max) = y_range(&points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so the markers overlay it.
    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|&(x, y)| (map_x(x, x_max, width), map_y(y, y_min, y_max, height)))
        .collect();
    for pair in cells.windows(2) {
        draw_line(&mut grid, pair[0], pair[1], '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let last = daily.last().map(|d| d.date).unwrap_or(origin);
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{origin}, {last}] | sales=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let u = (x / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest value).
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

/// Bresenham line; only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn plot_golden_snapshot_small() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 10, d).unwrap();
        let daily = vec![
            DailyTotal { date: day(1), total: 100.0 },
            DailyTotal { date: day(2), total: 110.0 },
        ];

        let txt = render_daily_trend(&daily, 10, 5);
        let expected = concat!(
            "Plot: dates=[2025-10-01, 2025-10-02] | sales=[99.50, 110.50]\n",
            "        -o\n",
            "      --\n",
            "    --\n",
            "  --\n",
            "o-\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_series_renders_a_notice() {
        assert_eq!(render_daily_trend(&[], 40, 10), "Plot: no data\n");
    }

    #[test]
    fn flat_series_still_plots() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 10, d).unwrap();
        let daily: Vec<DailyTotal> = (1..=3).map(|d| DailyTotal { date: day(d), total: 50.0 }).collect();
        let txt = render_daily_trend(&daily, 20, 5);
        let markers: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(markers, 3);
    }
}
