/// Template matching implementation
///
/// Zero-mean normalized cross-correlation (ZNCC) over grayscale frames. Window
/// means and energies come from integral images, so only the cross term is
/// evaluated per template pixel.
///
/// Small searches score every position. Larger ones run coarse-to-fine: the
/// frame and template are halved until the search fits the exhaustive budget,
/// the coarsest level is scored in full, and only the neighbourhoods of its
/// peaks are rescored on each finer level. Reported scores always come from
/// the full-resolution images.
use super::types::{Match, Point, ScoreMap};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image};
use rayon::prelude::*;

/// Default minimum Manhattan separation between two reported matches
pub const DEFAULT_MIN_SEPARATION: u32 = 20;

/// Windows with less energy than this are treated as flat and score 0
const FLAT_EPSILON: f64 = 1e-6;

/// Positions x template pixels scored in full before a pyramid is used
const EXHAUSTIVE_BUDGET: u64 = 4_000_000;

/// Smallest template side allowed on a coarse level
const MIN_COARSE_SIDE: u32 = 6;

const MAX_LEVELS: usize = 4;

/// Coarse peaks carried down to full resolution
const MAX_CANDIDATES: usize = 32;

/// Search radius around a peak projected onto the next finer level
const REFINE_RADIUS: u32 = 2;

/// Coarse scores run lower than full-resolution ones for the same spot
const COARSE_MARGIN: f32 = 0.3;

/// Template matcher producing single-best and de-duplicated multi matches
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    min_separation: u32,
}

impl TemplateMatcher {
    /// Create a matcher with the given de-duplication separation (pixels, L1)
    pub fn new(min_separation: u32) -> Self {
        Self { min_separation }
    }

    /// Correlation score for every position the template fits in the frame.
    ///
    /// Returns `None` when the template is empty or larger than the frame.
    /// Scores are clamped to `[0, 1]`; anti-correlation counts as no match.
    pub fn score_map(&self, frame: &GrayImage, template: &GrayImage) -> Option<ScoreMap> {
        Scorer::new(frame, template).map(|scorer| scorer.map())
    }

    /// Best-scoring location regardless of threshold
    pub fn best_match(&self, frame: &GrayImage, template: &GrayImage) -> Option<Match> {
        let depth = pyramid_depth(frame.dimensions(), template.dimensions())?;
        if depth == 0 {
            let map = self.score_map(frame, template)?;
            return best_in_map(&map, template.width(), template.height());
        }

        let mut best: Option<(Point, f32)> = None;
        for (point, score) in coarse_to_fine(frame, template, depth, 0.0) {
            if best.is_none_or(|(_, max)| score > max) {
                best = Some((point, score));
            }
        }
        best.map(|(point, score)| Match::new(point, template.width(), template.height(), score))
    }

    /// Centre of the best match if its score is at least `threshold`
    pub fn find_best(
        &self,
        frame: &GrayImage,
        template: &GrayImage,
        threshold: f32,
    ) -> Option<Point> {
        self.best_match(frame, template)
            .filter(|m| m.passes(threshold))
            .map(|m| m.center)
    }

    /// Centres of every location scoring at least `threshold`, de-duplicated
    pub fn find_all(&self, frame: &GrayImage, template: &GrayImage, threshold: f32) -> Vec<Point> {
        let (tpl_w, tpl_h) = template.dimensions();
        let centers = match pyramid_depth(frame.dimensions(), (tpl_w, tpl_h)) {
            None => return Vec::new(),
            Some(0) => match self.score_map(frame, template) {
                Some(map) => centers_above(&map, tpl_w, tpl_h, threshold),
                None => return Vec::new(),
            },
            Some(depth) => {
                let floor = (threshold - COARSE_MARGIN).max(0.0);
                coarse_to_fine(frame, template, depth, floor)
                    .into_iter()
                    .filter(|&(_, score)| score >= threshold)
                    .map(|(p, _)| Point::new(p.x + tpl_w / 2, p.y + tpl_h / 2))
                    .collect()
            }
        };
        dedupe(centers, self.min_separation)
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SEPARATION)
    }
}

/// Number of halvings applied before scoring, `None` when the template does not fit.
///
/// Zero means the full-resolution search is already within budget.
pub fn pyramid_depth(frame: (u32, u32), template: (u32, u32)) -> Option<usize> {
    let ((mut fw, mut fh), (mut tw, mut th)) = (frame, template);
    if tw == 0 || th == 0 || tw > fw || th > fh {
        return None;
    }

    let mut depth = 0;
    while depth < MAX_LEVELS
        && search_cost(fw, fh, tw, th) > EXHAUSTIVE_BUDGET
        && tw / 2 >= MIN_COARSE_SIDE
        && th / 2 >= MIN_COARSE_SIDE
    {
        (fw, fh, tw, th) = (fw / 2, fh / 2, tw / 2, th / 2);
        depth += 1;
    }
    Some(depth)
}

fn search_cost(fw: u32, fh: u32, tw: u32, th: u32) -> u64 {
    u64::from(fw - tw + 1) * u64::from(fh - th + 1) * u64::from(tw) * u64::from(th)
}

fn halve(image: &GrayImage) -> GrayImage {
    imageops::resize(image, image.width() / 2, image.height() / 2, FilterType::Triangle)
}

/// Full-resolution top-left positions scored around the surviving coarse peaks
fn coarse_to_fine(
    frame: &GrayImage,
    template: &GrayImage,
    depth: usize,
    floor: f32,
) -> Vec<(Point, f32)> {
    let mut levels: Vec<(GrayImage, GrayImage)> = Vec::with_capacity(depth);
    for l in 0..depth {
        let (f, t) = match l {
            0 => (halve(frame), halve(template)),
            _ => (halve(&levels[l - 1].0), halve(&levels[l - 1].1)),
        };
        levels.push((f, t));
    }
    let level = |l: usize| match l {
        0 => (frame, template),
        _ => (&levels[l - 1].0, &levels[l - 1].1),
    };

    let (coarse_frame, coarse_template) = level(depth);
    let Some(coarse) = Scorer::new(coarse_frame, coarse_template) else {
        return Vec::new();
    };
    let mut seeds = peaks(&coarse.map(), floor, MAX_CANDIDATES);
    log::trace!("🔍 {} coarse peaks at level {}", seeds.len(), depth);

    for l in (1..depth).rev() {
        let (f, t) = level(l);
        let Some(scorer) = Scorer::new(f, t) else {
            return Vec::new();
        };
        seeds = seeds
            .into_iter()
            .filter_map(|p| scorer.best_near(Point::new(p.x * 2, p.y * 2), REFINE_RADIUS))
            .map(|(p, _)| p)
            .collect();
        seeds.sort_by_key(|p| (p.y, p.x));
        seeds.dedup();
    }

    let Some(scorer) = Scorer::new(frame, template) else {
        return Vec::new();
    };
    let mut scored: Vec<(Point, f32)> = seeds
        .iter()
        .flat_map(|p| scorer.around(Point::new(p.x * 2, p.y * 2), REFINE_RADIUS))
        .collect();
    scored.sort_by_key(|(p, _)| (p.y, p.x));
    scored.dedup_by_key(|(p, _)| *p);
    scored
}

/// Local maxima scoring at least `floor`, strongest first, at most `limit`
fn peaks(map: &ScoreMap, floor: f32, limit: usize) -> Vec<Point> {
    let (w, h) = map.dimensions();
    let mut found: Vec<(Point, f32)> = map
        .enumerate_pixels()
        .filter(|&(_, _, pixel)| pixel[0] > 0.0 && pixel[0] >= floor)
        .filter(|&(x, y, pixel)| {
            let (x0, y0) = (x.saturating_sub(1), y.saturating_sub(1));
            let (x1, y1) = ((x + 1).min(w - 1), (y + 1).min(h - 1));
            (y0..=y1).all(|ny| (x0..=x1).all(|nx| map.get_pixel(nx, ny)[0] <= pixel[0]))
        })
        .map(|(x, y, pixel)| (Point::new(x, y), pixel[0]))
        .collect();
    // Stable sort keeps row-major order among equal scores
    found.sort_by(|a, b| b.1.total_cmp(&a.1));
    found.truncate(limit);
    found.into_iter().map(|(p, _)| p).collect()
}

/// ZNCC scorer for one frame/template pair
struct Scorer<'a> {
    frame: &'a GrayImage,
    sums: Image<Luma<u64>>,
    squares: Image<Luma<u64>>,
    centered: Vec<f64>,
    tpl_energy: f64,
    tpl_w: u32,
    tpl_h: u32,
    out_w: u32,
    out_h: u32,
}

impl<'a> Scorer<'a> {
    fn new(frame: &'a GrayImage, template: &GrayImage) -> Option<Self> {
        let (frame_w, frame_h) = frame.dimensions();
        let (tpl_w, tpl_h) = template.dimensions();
        if tpl_w == 0 || tpl_h == 0 || tpl_w > frame_w || tpl_h > frame_h {
            return None;
        }

        let n = f64::from(tpl_w * tpl_h);
        let tpl_mean = template.pixels().map(|p| f64::from(p[0])).sum::<f64>() / n;
        let centered: Vec<f64> = template
            .pixels()
            .map(|p| f64::from(p[0]) - tpl_mean)
            .collect();
        let tpl_energy: f64 = centered.iter().map(|v| v * v).sum();

        Some(Self {
            frame,
            sums: integral_image::<_, u64>(frame),
            squares: integral_squared_image::<_, u64>(frame),
            centered,
            tpl_energy,
            tpl_w,
            tpl_h,
            out_w: frame_w - tpl_w + 1,
            out_h: frame_h - tpl_h + 1,
        })
    }

    fn score(&self, x: u32, y: u32) -> f32 {
        // A flat template correlates with nothing
        if self.tpl_energy <= FLAT_EPSILON {
            return 0.0;
        }
        let n = f64::from(self.tpl_w * self.tpl_h);
        let sum = window_sum(&self.sums, x, y, self.tpl_w, self.tpl_h) as f64;
        let sq = window_sum(&self.squares, x, y, self.tpl_w, self.tpl_h) as f64;
        let energy = sq - sum * sum / n;
        if energy <= FLAT_EPSILON {
            return 0.0;
        }

        let raw = self.frame.as_raw();
        let stride = self.frame.width() as usize;
        let (x, y, tw) = (x as usize, y as usize, self.tpl_w as usize);
        let mut cross = 0.0;
        for j in 0..self.tpl_h as usize {
            let start = (y + j) * stride + x;
            let frame_row = &raw[start..start + tw];
            let tpl_row = &self.centered[j * tw..(j + 1) * tw];
            cross += frame_row
                .iter()
                .zip(tpl_row)
                .map(|(&f, &t)| f64::from(f) * t)
                .sum::<f64>();
        }

        (cross / (energy * self.tpl_energy).sqrt()).clamp(0.0, 1.0) as f32
    }

    fn map(&self) -> ScoreMap {
        let mut scores = vec![0f32; (self.out_w * self.out_h) as usize];
        scores
            .par_chunks_mut(self.out_w as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, slot) in row.iter_mut().enumerate() {
                    *slot = self.score(x as u32, y as u32);
                }
            });
        ImageBuffer::from_raw(self.out_w, self.out_h, scores)
            .unwrap_or_else(|| ImageBuffer::new(self.out_w, self.out_h))
    }

    /// Scores of every valid position within `radius` (Chebyshev) of `center`
    fn around(&self, center: Point, radius: u32) -> Vec<(Point, f32)> {
        let x0 = center.x.saturating_sub(radius).min(self.out_w - 1);
        let y0 = center.y.saturating_sub(radius).min(self.out_h - 1);
        let x1 = (center.x + radius).min(self.out_w - 1);
        let y1 = (center.y + radius).min(self.out_h - 1);
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| Point::new(x, y)))
            .map(|p| (p, self.score(p.x, p.y)))
            .collect()
    }

    /// Highest-scoring position near `center`; ties keep row-major order
    fn best_near(&self, center: Point, radius: u32) -> Option<(Point, f32)> {
        let mut best: Option<(Point, f32)> = None;
        for (point, score) in self.around(center, radius) {
            if best.is_none_or(|(_, max)| score > max) {
                best = Some((point, score));
            }
        }
        best
    }
}

/// Sum of the `w`x`h` window at (x, y) from a zero-padded integral image
fn window_sum(integral: &Image<Luma<u64>>, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let a = integral.get_pixel(x, y)[0];
    let b = integral.get_pixel(x + w, y)[0];
    let c = integral.get_pixel(x, y + h)[0];
    let d = integral.get_pixel(x + w, y + h)[0];
    (a + d) - (b + c)
}

/// Highest score in the map; ties keep the first position in row-major order
pub fn best_in_map(map: &ScoreMap, template_width: u32, template_height: u32) -> Option<Match> {
    let mut best: Option<(u32, u32, f32)> = None;
    for (x, y, pixel) in map.enumerate_pixels() {
        let score = pixel[0];
        if best.is_none_or(|(_, _, max)| score > max) {
            best = Some((x, y, score));
        }
    }
    best.map(|(x, y, score)| Match::new(Point::new(x, y), template_width, template_height, score))
}

/// Centre points of all positions scoring at least `threshold`
pub fn centers_above(
    map: &ScoreMap,
    template_width: u32,
    template_height: u32,
    threshold: f32,
) -> Vec<Point> {
    map.enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] >= threshold)
        .map(|(x, y, _)| Point::new(x + template_width / 2, y + template_height / 2))
        .collect()
}

/// Collapse clusters of nearby hits into one representative each.
///
/// Points are visited top-to-bottom, left-to-right; a point is kept only if
/// its Manhattan distance to every kept point exceeds `min_separation`.
pub fn dedupe(mut points: Vec<Point>, min_separation: u32) -> Vec<Point> {
    points.sort_by_key(|p| (p.y, p.x));
    let mut kept: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if kept.iter().all(|k| k.manhattan(&point) > min_separation) {
            kept.push(point);
        }
    }
    kept
}

/// Drop candidates lying within `radius` (Manhattan, inclusive) of any marker
pub fn exclude_near(candidates: &[Point], markers: &[Point], radius: u32) -> Vec<Point> {
    candidates
        .iter()
        .copied()
        .filter(|c| markers.iter().all(|m| m.manhattan(c) > radius))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::{Duration, Instant};

    fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        ImageBuffer::from_fn(width, height, |_, _| Luma([rng.r#gen::<u8>()]))
    }

    /// Smooth blob texture, closer to UI art than white noise
    fn blobs(width: u32, height: u32, seed: u64) -> GrayImage {
        let cells = noise((width / 8).max(2), (height / 8).max(2), seed);
        imageops::resize(&cells, width, height, FilterType::Triangle)
    }

    fn paste(frame: &mut GrayImage, patch: &GrayImage, x: u32, y: u32) {
        image::imageops::replace(frame, patch, i64::from(x), i64::from(y));
    }

    fn map_from(width: u32, height: u32, cells: &[(u32, u32, f32)]) -> ScoreMap {
        let mut map: ScoreMap = ImageBuffer::new(width, height);
        for &(x, y, score) in cells {
            map.put_pixel(x, y, Luma([score]));
        }
        map
    }

    #[test]
    fn test_exact_copy_scores_one_at_its_position() {
        let matcher = TemplateMatcher::default();
        let template = noise(10, 10, 7);
        let mut frame = GrayImage::from_pixel(80, 60, Luma([40]));
        paste(&mut frame, &template, 33, 21);

        let best = matcher.best_match(&frame, &template).unwrap();
        assert_eq!(best.top_left, Point::new(33, 21));
        assert_eq!(best.center, Point::new(38, 26));
        assert!(best.confidence > 0.999, "got {}", best.confidence);
    }

    #[test]
    fn test_template_larger_than_frame() {
        let matcher = TemplateMatcher::default();
        let frame = noise(8, 8, 1);
        let template = noise(9, 4, 2);
        assert!(matcher.score_map(&frame, &template).is_none());
        assert!(matcher.find_best(&frame, &template, 0.0).is_none());
        assert!(matcher.find_all(&frame, &template, 0.0).is_empty());
    }

    #[test]
    fn test_flat_template_never_matches() {
        let matcher = TemplateMatcher::default();
        let frame = noise(30, 30, 3);
        let template = GrayImage::from_pixel(5, 5, Luma([200]));
        assert!(matcher.find_best(&frame, &template, 0.1).is_none());
    }

    #[test]
    fn test_flat_frame_region_scores_zero() {
        let matcher = TemplateMatcher::default();
        let frame = GrayImage::from_pixel(30, 30, Luma([90]));
        let template = noise(6, 6, 4);
        let map = matcher.score_map(&frame, &template).unwrap();
        assert!(map.pixels().all(|p| p[0] == 0.0));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let map = map_from(5, 5, &[(2, 3, 0.8), (4, 0, 0.5)]);
        let best = best_in_map(&map, 4, 4).unwrap();
        assert!(best.passes(0.8));
        assert!(!best.passes(0.8001));
        assert_eq!(best.center, Point::new(4, 5));
    }

    #[test]
    fn test_best_tie_keeps_first_in_row_major_order() {
        let map = map_from(6, 6, &[(5, 1, 0.9), (1, 4, 0.9), (0, 1, 0.9)]);
        let best = best_in_map(&map, 2, 2).unwrap();
        assert_eq!(best.top_left, Point::new(0, 1));
    }

    #[test]
    fn test_find_best_respects_threshold() {
        let matcher = TemplateMatcher::default();
        let template = noise(10, 10, 11);
        let mut frame = GrayImage::from_pixel(60, 60, Luma([10]));
        paste(&mut frame, &template, 5, 5);

        assert_eq!(matcher.find_best(&frame, &template, 0.8), Some(Point::new(10, 10)));
        let other = noise(10, 10, 12);
        assert_eq!(matcher.find_best(&frame, &other, 0.8), None);
    }

    #[test]
    fn test_cluster_collapses_to_one_point() {
        let cells: Vec<(u32, u32, f32)> = (10..13)
            .flat_map(|y| (20..23).map(move |x| (x, y, 0.95)))
            .collect();
        let map = map_from(40, 40, &cells);
        let points = dedupe(centers_above(&map, 6, 6, 0.9), DEFAULT_MIN_SEPARATION);
        assert_eq!(points, vec![Point::new(23, 13)]);
    }

    #[test]
    fn test_dedupe_keeps_separation() {
        let mut rng = StdRng::seed_from_u64(99);
        let points: Vec<Point> = (0..300)
            .map(|_| Point::new(rng.gen_range(0..200), rng.gen_range(0..200)))
            .collect();
        let kept = dedupe(points, 20);
        assert!(!kept.is_empty());
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.manhattan(b) > 20, "{a} and {b} too close");
            }
        }
    }

    #[test]
    fn test_dedupe_order_is_top_to_bottom_left_to_right() {
        let points = vec![Point::new(90, 50), Point::new(10, 50), Point::new(50, 5)];
        assert_eq!(
            dedupe(points, 20),
            vec![Point::new(50, 5), Point::new(10, 50), Point::new(90, 50)]
        );
    }

    #[test]
    fn test_find_all_reports_each_occurrence_once() {
        let matcher = TemplateMatcher::default();
        let template = noise(10, 10, 21);
        let mut frame = GrayImage::from_pixel(120, 90, Luma([128]));
        let spots = [(5, 5), (60, 8), (20, 60), (95, 70)];
        for &(x, y) in &spots {
            paste(&mut frame, &template, x, y);
        }

        let found = matcher.find_all(&frame, &template, 0.8);
        assert_eq!(found.len(), spots.len());
        for &(x, y) in &spots {
            let truth = Point::new(x + 5, y + 5);
            assert!(
                found.iter().any(|p| p.manhattan(&truth) <= 1),
                "missing occurrence near {truth}: {found:?}"
            );
        }
    }

    #[test]
    fn test_exclude_near_markers() {
        let candidates = [Point::new(100, 100), Point::new(400, 100), Point::new(100, 400)];
        let markers = [Point::new(150, 150), Point::new(400, 249)];
        // (100,100)->(150,150) = 100 removed; (400,100)->(400,249) = 149 removed
        assert_eq!(exclude_near(&candidates, &markers, 150), vec![Point::new(100, 400)]);
    }

    #[test]
    fn test_exclude_near_boundary_and_no_markers() {
        let candidates = [Point::new(0, 0), Point::new(0, 300)];
        assert_eq!(exclude_near(&candidates, &[], 150), candidates.to_vec());

        let markers = [Point::new(150, 0)];
        assert_eq!(exclude_near(&candidates, &markers, 150), vec![Point::new(0, 300)]);
    }

    #[test]
    fn test_pyramid_depth() {
        assert_eq!(pyramid_depth((160, 120), (10, 10)), Some(0));
        assert_eq!(pyramid_depth((1280, 720), (80, 40)), Some(2));
        // Coarse templates never shrink below the minimum side
        assert_eq!(pyramid_depth((1280, 720), (11, 11)), Some(0));
        assert_eq!(pyramid_depth((40, 40), (41, 10)), None);
    }

    #[test]
    fn test_emulator_sized_match_is_fast_and_exact() {
        let matcher = TemplateMatcher::default();
        let template = blobs(80, 40, 5);
        let mut frame = blobs(1280, 720, 6);
        paste(&mut frame, &template, 517, 263);

        let started = Instant::now();
        let best = matcher.best_match(&frame, &template).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(best.top_left, Point::new(517, 263));
        assert_eq!(best.center, Point::new(557, 283));
        assert!(best.confidence > 0.99, "got {}", best.confidence);
        assert!(elapsed < Duration::from_secs(3), "one lookup took {elapsed:?}");
    }

    #[test]
    fn test_emulator_sized_find_all() {
        let matcher = TemplateMatcher::default();
        let template = blobs(80, 40, 31);
        let mut frame = blobs(1280, 720, 32);
        let spots = [(40, 30), (611, 75), (300, 402), (1101, 655)];
        for &(x, y) in &spots {
            paste(&mut frame, &template, x, y);
        }

        let found = matcher.find_all(&frame, &template, 0.8);
        assert_eq!(found.len(), spots.len(), "{found:?}");
        for &(x, y) in &spots {
            let truth = Point::new(x + 40, y + 20);
            // Smooth art scores high a pixel or two off; any of those is a hit
            assert!(
                found.iter().any(|p| p.manhattan(&truth) <= 4),
                "missing occurrence near {truth}: {found:?}"
            );
        }

        let absent = blobs(80, 40, 33);
        assert_eq!(matcher.find_best(&frame, &absent, 0.8), None);
    }
}
