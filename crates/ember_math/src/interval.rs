/// A closed range of ray parameters or coordinates.
///
/// An interval with `min > max` is empty. [`Interval::EMPTY`] and
/// [`Interval::UNIVERSE`] use infinities so that unions and slab tests work
/// without special cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// A universe interval (contains everything).
    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };

    /// Create an interval from explicit bounds. The bounds are taken as given,
    /// so `new(1.0, 0.0)` is empty.
    #[inline]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Create the interval spanning two endpoints given in any order.
    #[inline]
    pub fn from_endpoints(a: f32, b: f32) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    /// Smallest interval enclosing both `a` and `b`.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Inclusive membership test.
    #[inline]
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Exclusive membership test, used to reject hits exactly on the bounds.
    #[inline]
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Clamp `x` into the interval. Does not panic on an empty interval.
    #[inline]
    pub fn clamp(&self, x: f32) -> f32 {
        if x < self.min {
            self.min
        } else if x > self.max {
            self.max
        } else {
            x
        }
    }

    /// Pad the interval by `delta / 2` on each side.
    pub fn expand(&self, delta: f32) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Shift both bounds by `displacement`.
    pub fn add_scalar(&self, displacement: f32) -> Interval {
        Interval::new(self.min + displacement, self.max + displacement)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::EMPTY
    }
}
