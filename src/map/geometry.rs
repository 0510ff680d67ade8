use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    // i64 keeps the error term from overflowing on far-apart endpoints
    let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);
    loop {
        canvas.set(x as i32, y as i32);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang-Barsky clip of segment `a`-`b` to `[0, max_x] x [0, max_y]`.
/// `None` when the segment misses the box or has a non-finite end.
pub fn clip_segment(a: (f64, f64), b: (f64, f64), max_x: f64, max_y: f64) -> Option<((f64, f64), (f64, f64))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Line doubled one dot right and one dot down
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Outline of a polygon given in dot coordinates; the ring is closed
/// implicitly. Edges are clipped to the canvas before rasterizing.
pub fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], thick: bool) {
    let Some(&last) = ring.last() else {
        return;
    };
    let max_x = canvas.pixel_width().saturating_sub(1) as f64;
    let max_y = canvas.pixel_height().saturating_sub(1) as f64;

    let mut prev = last;
    for &point in ring {
        if let Some(((x0, y0), (x1, y1))) = clip_segment(prev, point, max_x, max_y) {
            let (x0, y0) = (x0.round() as i32, y0.round() as i32);
            let (x1, y1) = (x1.round() as i32, y1.round() as i32);
            if thick {
                draw_thick_line(canvas, x0, y0, x1, y1);
            } else {
                draw_line(canvas, x0, y0, x1, y1);
            }
        }
        prev = point;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert!((0..10).all(|x| canvas.is_set(x, 0)));
        assert!(!canvas.is_set(0, 1));
    }

    #[test]
    fn test_diagonal_line_hits_both_ends() {
        let mut canvas = BrailleCanvas::new(4, 4);
        draw_line(&mut canvas, 7, 15, 0, 0);
        assert!(canvas.is_set(7, 15));
        assert!(canvas.is_set(0, 0));
    }

    #[test]
    fn test_ring_is_closed() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_ring(&mut canvas, &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)], false);
        // Closing edge from (0, 6) back to (0, 0)
        assert!((0..=6).all(|y| canvas.is_set(0, y)));
        assert!(!canvas.is_set(3, 3));
    }

    #[test]
    fn test_thick_ring_spills_inward() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_ring(&mut canvas, &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)], true);
        assert!(canvas.is_set(1, 3));
        assert!(canvas.is_set(3, 1));
    }

    #[test]
    fn test_far_endpoints_do_not_overflow() {
        let mut canvas = BrailleCanvas::new(2, 1);
        draw_line(&mut canvas, i32::MIN, 0, i32::MIN + 3, 2);
        assert!((0..4).all(|x| (0..4).all(|y| !canvas.is_set(x, y))));
    }

    #[test]
    fn test_clip_segment_to_box() {
        let clipped = clip_segment((-4.0, 2.0), (12.0, 2.0), 7.0, 3.0).unwrap();
        assert_eq!(clipped, ((0.0, 2.0), (7.0, 2.0)));

        assert!(clip_segment((-5.0, -5.0), (-1.0, 10.0), 7.0, 3.0).is_none());
        assert!(clip_segment((0.0, f64::NAN), (1.0, 1.0), 7.0, 3.0).is_none());
        assert_eq!(clip_segment((1.0, 1.0), (2.0, 2.0), 7.0, 3.0), Some(((1.0, 1.0), (2.0, 2.0))));
    }

    #[test]
    fn test_huge_ring_only_draws_visible_edges() {
        let mut canvas = BrailleCanvas::new(4, 2);
        // Square far larger than the canvas whose left edge crosses it
        draw_ring(&mut canvas, &[(2.0, -1e12), (1e12, -1e12), (1e12, 1e12), (2.0, 1e12)], false);
        assert!((0..8).all(|y| canvas.is_set(2, y)));
        assert!(!canvas.is_set(5, 3));
    }
}
