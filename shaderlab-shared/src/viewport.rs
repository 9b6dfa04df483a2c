/// Pixel rectangle a pass draws into, origin at the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Full-canvas viewport.
    pub fn full(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width over height, or 1.0 for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width <= 0 || self.height <= 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn left_half(&self) -> Self {
        Self::new(self.x, self.y, self.width / 2, self.height)
    }

    /// Right half; takes the odd column when the width is odd.
    pub fn right_half(&self) -> Self {
        let left = self.width / 2;
        Self::new(self.x + left, self.y, self.width - left, self.height)
    }

    /// Pixel area, zero when empty.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }
}
