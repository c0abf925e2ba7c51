use serde::{Deserialize, Serialize};

/// Axis-aligned box, `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Overlap on both axes. Touching edges count as a collision.
#[inline]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.x <= b.right() && b.x <= a.right() && a.y <= b.bottom() && b.y <= a.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_intersect_both_ways() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(intersects(&a, &b));
        assert!(intersects(&b, &a));
    }

    #[test]
    fn touching_edges_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(intersects(&a, &Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(intersects(&a, &Rect::new(0.0, 10.0, 5.0, 5.0)));
        assert!(intersects(&a, &Rect::new(10.0, 10.0, 5.0, 5.0)));
    }

    #[test]
    fn separated_on_one_axis_does_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!intersects(&a, &Rect::new(10.5, 0.0, 5.0, 5.0)));
        assert!(!intersects(&a, &Rect::new(0.0, -6.0, 5.0, 5.0)));
    }

    #[test]
    fn containment_collides() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(40.0, 40.0, 5.0, 10.0);
        assert!(intersects(&outer, &inner));
        assert!(intersects(&inner, &outer));
    }
}
