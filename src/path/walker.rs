use crate::{BinaryImage, PointI32};

/// Walks the crack boundary of a 4-connected pixel cluster, yielding the pixel corners
/// where the boundary changes direction.
///
/// Corners are in pixel corner coordinates: pixel `(x, y)` spans `(x, y)..(x+1, y+1)`.
/// The first and the last item are both `start`, so a complete walk is a closed ring.
/// When `clockwise`, set pixels stay on the right hand side (in a top-left origin frame),
/// otherwise on the left. At a saddle the walker turns towards the pixel it is following,
/// so diagonally touching pixels are never joined.
pub struct PathWalker<'a> {
    image: &'a BinaryImage,
    start: PointI32,
    curr: PointI32,
    dir: Option<u32>,
    clockwise: bool,
    first: bool,
    moved: bool,
    done: bool,
    stuck: bool,
    steps: usize,
    max_steps: usize,
}

impl<'a> PathWalker<'a> {
    pub fn new(image: &'a BinaryImage, start: PointI32, clockwise: bool) -> Self {
        Self {
            image,
            start,
            curr: start,
            dir: None,
            clockwise,
            first: true,
            moved: false,
            done: false,
            stuck: false,
            steps: 0,
            // every crack edge of the grid at most once
            max_steps: 2 * (image.width + 1) * (image.height + 1),
        }
    }

    /// Whether the walk stopped before returning to `start`.
    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn dir_vec(dir: u32) -> PointI32 {
        match dir {
            0 => PointI32 { x:  0, y: -1 },
            2 => PointI32 { x:  1, y:  0 },
            4 => PointI32 { x:  0, y:  1 },
            _ => PointI32 { x: -1, y:  0 },
        }
    }

    /// The pixels on the (right, left) hand side of the edge leaving a corner towards `dir`.
    pub fn side_vecs(dir: u32) -> (PointI32, PointI32) {
        match dir {
            0 => (PointI32 { x:  0, y: -1 }, PointI32 { x: -1, y: -1 }),
            2 => (PointI32 { x:  0, y:  0 }, PointI32 { x:  0, y: -1 }),
            4 => (PointI32 { x: -1, y:  0 }, PointI32 { x:  0, y:  0 }),
            _ => (PointI32 { x: -1, y: -1 }, PointI32 { x: -1, y:  0 }),
        }
    }

    pub fn ahead_of(curr: PointI32, dir: u32) -> PointI32 {
        curr + Self::dir_vec(dir)
    }

    fn is_boundary(&self, dir: u32) -> bool {
        let (right, left) = Self::side_vecs(dir);
        let right = self.image.get_pixel_at_safe(self.curr + right);
        let left = self.image.get_pixel_at_safe(self.curr + left);
        if self.clockwise {
            right && !left
        } else {
            left && !right
        }
    }

    fn choose(&self) -> Option<u32> {
        let order = match self.dir {
            None => [0, 2, 4, 6],
            Some(d) if self.clockwise => [(d + 2) % 8, d, (d + 6) % 8, (d + 4) % 8],
            Some(d) => [(d + 6) % 8, d, (d + 2) % 8, (d + 4) % 8],
        };
        order.iter().copied().find(|&k| self.is_boundary(k))
    }
}

impl Iterator for PathWalker<'_> {
    type Item = PointI32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.first {
            self.first = false;
            return Some(self.start);
        }
        loop {
            if self.steps > self.max_steps {
                self.stuck = true;
                self.done = true;
                return None;
            }
            let go = match self.choose() {
                Some(go) => go,
                None => {
                    self.stuck = true;
                    self.done = true;
                    return None;
                }
            };
            if self.moved && self.dir != Some(go) {
                self.moved = false;
                return Some(self.curr);
            }
            self.dir = Some(go);
            self.curr = Self::ahead_of(self.curr, go);
            self.steps += 1;
            self.moved = true;
            if self.curr == self.start {
                self.done = true;
                return Some(self.start);
            }
        }
    }
}
