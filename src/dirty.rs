use crate::geometry::Rect;

/// How a view turns accumulated damage into repaint requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaintPolicy {
    /// Repaint only the accumulated rectangles.
    DirtyTiles,
    /// Any change repaints the whole canvas.
    WholeCanvas,
}

/// A repaint request handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repaint {
    Regions(Vec<Rect>),
    Full,
}

/// Accumulates regions needing repaint between flushes.
#[derive(Debug, Default)]
pub struct DirtyRegions {
    rects: Vec<Rect>,
    full: bool,
}

impl DirtyRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, rect: Rect) {
        if self.full || rect.is_empty() {
            return;
        }
        // Skip exact repeats (hover in/out of the same tile).
        if !self.rects.contains(&rect) {
            self.rects.push(rect);
        }
    }

    pub fn mark_all(&mut self) {
        self.full = true;
        self.rects.clear();
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.rects.is_empty()
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Drain everything accumulated so far. The set is empty afterwards.
    pub fn take(&mut self, policy: RepaintPolicy) -> Option<Repaint> {
        if self.is_empty() {
            return None;
        }
        let repaint = if self.full || policy == RepaintPolicy::WholeCanvas {
            Repaint::Full
        } else {
            Repaint::Regions(std::mem::take(&mut self.rects))
        };
        self.rects.clear();
        self.full = false;
        Some(repaint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_drains_completely() {
        let mut d = DirtyRegions::new();
        d.mark(Rect::new(0, 0, 10, 10));
        d.mark(Rect::new(10, 0, 10, 10));
        assert_eq!(
            d.take(RepaintPolicy::DirtyTiles),
            Some(Repaint::Regions(vec![
                Rect::new(0, 0, 10, 10),
                Rect::new(10, 0, 10, 10)
            ]))
        );
        assert!(d.is_empty());
        assert_eq!(d.take(RepaintPolicy::DirtyTiles), None);
    }

    #[test]
    fn whole_canvas_policy_collapses_to_full() {
        let mut d = DirtyRegions::new();
        d.mark(Rect::new(0, 0, 10, 10));
        assert_eq!(d.take(RepaintPolicy::WholeCanvas), Some(Repaint::Full));
        assert!(d.is_empty());
    }

    #[test]
    fn mark_all_overrides_regions() {
        let mut d = DirtyRegions::new();
        d.mark(Rect::new(0, 0, 10, 10));
        d.mark_all();
        d.mark(Rect::new(5, 5, 10, 10));
        assert!(d.rects().is_empty());
        assert_eq!(d.take(RepaintPolicy::DirtyTiles), Some(Repaint::Full));
    }

    #[test]
    fn duplicates_and_empty_rects_ignored() {
        let mut d = DirtyRegions::new();
        d.mark(Rect::new(0, 0, 10, 10));
        d.mark(Rect::new(0, 0, 10, 10));
        d.mark(Rect::new(3, 3, 0, 5));
        assert_eq!(d.rects().len(), 1);
    }
}
