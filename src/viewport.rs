use crate::geometry::{Point, Rect, Size};

/// Derived geometry of one view: where the content is, how big the canvas
/// is, and which part of the canvas is on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Bounding rect of all tiles, padding included.
    bounding: Rect,
    content: Size,
    canvas: Size,
    /// Visible part of the canvas, in map coordinates.
    window: Rect,
    scale: f32,
    /// The window has been shown against earlier content, so a rebase has
    /// something to keep on screen.
    anchored: bool,
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            bounding: Rect::ZERO,
            content: Size::ZERO,
            canvas: size,
            window: Rect::from_origin(Point::ZERO, size),
            scale: 1.0,
            anchored: false,
        }
    }

    pub fn bounding(&self) -> Rect {
        self.bounding
    }

    pub fn content(&self) -> Size {
        self.content
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Take a fresh bounding rect.
    ///
    /// Map views grow the canvas to hold the content and never shrink it
    /// below the window. Scaled views keep the canvas at window size and
    /// shrink the content to fit instead.
    pub fn fit(&mut self, bounding: Rect, scaled: bool) {
        self.anchored = !self.bounding.is_empty();
        self.bounding = bounding;
        self.content = bounding.size();
        let viewport = self.window.size();
        if scaled {
            self.canvas = viewport;
            self.scale = fit_scale(viewport, self.content);
        } else {
            self.canvas = self.content.max(viewport);
            self.scale = 1.0;
        }
        self.window = self.window.with_origin(self.clamp_origin(self.window.origin()));
    }

    /// The content was moved by `delta` so its top-left sits at the origin;
    /// move the window along so the same content stays on screen. The first
    /// fit has nothing on screen yet and leaves the window where it is.
    pub fn rebase(&mut self, delta: Point) {
        self.bounding = self.bounding.translated(delta);
        if self.anchored {
            let moved = self.window.origin().saturating_add(delta);
            self.window = self.window.with_origin(self.clamp_origin(moved));
        }
    }

    /// Change the on-screen size. The caller refits afterwards.
    pub fn resize(&mut self, size: Size) {
        self.window = Rect::from_origin(self.window.origin(), size);
    }

    /// Clamp each axis independently to `[0, canvas - window]`.
    pub fn clamp_origin(&self, origin: Point) -> Point {
        clamp_to(origin, self.window.size(), self.canvas)
    }

    /// Pan by `delta`. Returns true if the window actually moved.
    pub fn move_by(&mut self, delta: Point) -> bool {
        self.move_to(self.window.origin().saturating_add(delta))
    }

    /// Put the window's top-left at `origin` (clamped). Returns true if the
    /// window actually moved.
    pub fn move_to(&mut self, origin: Point) -> bool {
        let clamped = self.clamp_origin(origin);
        if clamped == self.window.origin() {
            return false;
        }
        self.window = self.window.with_origin(clamped);
        true
    }

    /// Screen point to map point.
    pub fn to_map(&self, screen: Point) -> Point {
        screen.saturating_add(self.window.origin())
    }

    /// Screen point of a scaled view to unscaled map point.
    pub fn unscale(&self, screen: Point) -> Point {
        if self.scale <= 0.0 {
            return screen;
        }
        Point::new(
            (screen.x as f32 / self.scale).round() as i32,
            (screen.y as f32 / self.scale).round() as i32,
        )
    }
}

/// Scale that fits `content` into `canvas` on the tighter axis.
pub fn fit_scale(canvas: Size, content: Size) -> f32 {
    let longest = content.width.max(content.height);
    if longest <= 0 {
        return 1.0;
    }
    canvas.width.min(canvas.height) as f32 / longest as f32
}

/// Clamp a window origin so a `window` sized rect stays inside `area`.
/// A window larger than the area pins to 0.
pub fn clamp_to(origin: Point, window: Size, area: Size) -> Point {
    Point::new(
        origin.x.clamp(0, (area.width - window.width).max(0)),
        origin.y.clamp(0, (area.height - window.height).max(0)),
    )
}

/// Origin of a `window` sized rect centred on `center`, clamped to `area`.
pub fn centered_window(center: Point, window: Size, area: Size) -> Point {
    let origin = Point::new(
        center.x.saturating_sub(window.width / 2),
        center.y.saturating_sub(window.height / 2),
    );
    clamp_to(origin, window, area)
}
