use std::collections::BTreeMap;

use crate::content::{PageContent, Rect, Segment, TextSpan};
use crate::extract::stream::join_spans;
use crate::extract::{LatticeSettings, Table};

/// An axis-aligned rule: `pos` is y for horizontal rules, x for vertical;
/// `start..end` is the extent along the other axis
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ruling {
    pos: f64,
    start: f64,
    end: f64,
}

/// Cell boundaries of one ruled table
#[derive(Debug, Clone, PartialEq)]
struct Grid {
    /// Left to right
    xs: Vec<f64>,
    /// Top to bottom
    ys: Vec<f64>,
}

/// Find tables outlined by ruling lines
pub fn detect_tables(page: &PageContent, settings: &LatticeSettings) -> Vec<Table> {
    let (horizontal, vertical) = collect_rulings(page, settings);
    if horizontal.len() < 2 || vertical.len() < 2 {
        return Vec::new();
    }

    let mut grids: Vec<Grid> = connected_components(&horizontal, &vertical, settings.join_tolerance)
        .into_iter()
        .filter_map(|(hs, vs)| Grid::from_rulings(&hs, &vs, settings.snap_tolerance))
        .collect();
    grids.sort_by(|a, b| b.ys[0].total_cmp(&a.ys[0]).then(a.xs[0].total_cmp(&b.xs[0])));

    grids.iter().filter_map(|grid| grid.fill(&page.spans)).collect()
}

fn collect_rulings(page: &PageContent, settings: &LatticeSettings) -> (Vec<Ruling>, Vec<Ruling>) {
    let bars = page.bars.iter().flat_map(|bar| bar_to_segments(bar, settings.line_thickness));

    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for seg in page.segments.iter().copied().chain(bars) {
        if seg.length() < settings.min_segment_length {
            continue;
        }
        if seg.is_horizontal(settings.snap_tolerance) {
            horizontal.push(Ruling {
                pos: (seg.y0 + seg.y1) / 2.0,
                start: seg.x0.min(seg.x1),
                end: seg.x0.max(seg.x1),
            });
        } else if seg.is_vertical(settings.snap_tolerance) {
            vertical.push(Ruling {
                pos: (seg.x0 + seg.x1) / 2.0,
                start: seg.y0.min(seg.y1),
                end: seg.y0.max(seg.y1),
            });
        }
    }

    (
        merge_rulings(horizontal, settings.snap_tolerance, settings.join_tolerance),
        merge_rulings(vertical, settings.snap_tolerance, settings.join_tolerance),
    )
}

/// Thin filled bars are rules drawn as rectangles; anything thicker is a
/// shaded box whose outline still bounds cells
fn bar_to_segments(bar: &Rect, line_thickness: f64) -> Vec<Segment> {
    let mid_x = (bar.x0 + bar.x1) / 2.0;
    let mid_y = (bar.y0 + bar.y1) / 2.0;

    if bar.height() <= line_thickness && bar.width() >= bar.height() {
        vec![Segment::new(bar.x0, mid_y, bar.x1, mid_y)]
    } else if bar.width() <= line_thickness {
        vec![Segment::new(mid_x, bar.y0, mid_x, bar.y1)]
    } else {
        bar.edges().to_vec()
    }
}

/// Join collinear pieces that overlap or nearly touch
fn merge_rulings(mut rulings: Vec<Ruling>, snap: f64, join: f64) -> Vec<Ruling> {
    rulings.sort_by(|a, b| a.pos.total_cmp(&b.pos).then(a.start.total_cmp(&b.start)));

    // Bands of nearly equal position
    let mut bands: Vec<Vec<Ruling>> = Vec::new();
    for ruling in rulings {
        match bands.last_mut() {
            Some(band) if ruling.pos - band[0].pos <= snap => band.push(ruling),
            _ => bands.push(vec![ruling]),
        }
    }

    let mut merged = Vec::new();
    for mut band in bands {
        let pos = band.iter().map(|r| r.pos).sum::<f64>() / band.len() as f64;
        band.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut current: Option<Ruling> = None;
        for r in band {
            current = match current {
                Some(mut c) if r.start <= c.end + join => {
                    c.end = c.end.max(r.end);
                    Some(c)
                }
                Some(c) => {
                    merged.push(c);
                    Some(Ruling { pos, ..r })
                }
                None => Some(Ruling { pos, ..r }),
            };
        }
        merged.extend(current);
    }

    merged
}

fn crosses(h: &Ruling, v: &Ruling, tolerance: f64) -> bool {
    v.pos >= h.start - tolerance
        && v.pos <= h.end + tolerance
        && h.pos >= v.start - tolerance
        && h.pos <= v.end + tolerance
}

/// Group rulings that touch into separate structures
fn connected_components(
    horizontal: &[Ruling],
    vertical: &[Ruling],
    tolerance: f64,
) -> Vec<(Vec<Ruling>, Vec<Ruling>)> {
    let offset = horizontal.len();
    let mut parent: Vec<usize> = (0..offset + vertical.len()).collect();

    for (i, h) in horizontal.iter().enumerate() {
        for (j, v) in vertical.iter().enumerate() {
            if crosses(h, v, tolerance) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, offset + j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, (Vec<Ruling>, Vec<Ruling>)> = BTreeMap::new();
    for (i, h) in horizontal.iter().enumerate() {
        groups.entry(find(&mut parent, i)).or_default().0.push(*h);
    }
    for (j, v) in vertical.iter().enumerate() {
        groups.entry(find(&mut parent, offset + j)).or_default().1.push(*v);
    }

    groups.into_values().collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Sorted positions with near-duplicates averaged together
fn distinct_positions(mut values: Vec<f64>, snap: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for v in values {
        match clusters.last_mut() {
            Some(cluster) if v - cluster[0] <= snap => cluster.push(v),
            _ => clusters.push(vec![v]),
        }
    }

    clusters
        .into_iter()
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

impl Grid {
    fn from_rulings(horizontal: &[Ruling], vertical: &[Ruling], snap: f64) -> Option<Grid> {
        let xs = distinct_positions(vertical.iter().map(|r| r.pos).collect(), snap);
        let mut ys = distinct_positions(horizontal.iter().map(|r| r.pos).collect(), snap);
        ys.reverse();

        if xs.len() < 2 || ys.len() < 2 {
            return None;
        }
        if (xs.len() - 1) * (ys.len() - 1) < 2 {
            return None;
        }
        Some(Grid { xs, ys })
    }

    fn cell_of(&self, span: &TextSpan) -> Option<(usize, usize)> {
        let (cx, cy) = (span.center_x(), span.center_y());
        let col = self.xs.windows(2).position(|w| cx >= w[0] && cx < w[1])?;
        let row = self.ys.windows(2).position(|w| cy <= w[0] && cy > w[1])?;
        Some((row, col))
    }

    /// Place spans in cells by their centre; `None` when no text lands
    fn fill(&self, spans: &[TextSpan]) -> Option<Table> {
        let mut cells: Vec<Vec<Vec<TextSpan>>> = vec![vec![Vec::new(); self.xs.len() - 1]; self.ys.len() - 1];

        let mut placed = 0;
        for span in spans.iter().filter(|s| !s.text.trim().is_empty()) {
            if let Some((row, col)) = self.cell_of(span) {
                cells[row][col].push(span.clone());
                placed += 1;
            }
        }
        if placed == 0 {
            return None;
        }

        let rows = cells
            .into_iter()
            .map(|row| row.into_iter().map(join_spans).collect())
            .collect();
        Some(Table::from_rows(rows))
    }
}
