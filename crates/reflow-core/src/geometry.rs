/// A point in page space (PDF user space, origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 2D affine transform `[a b c d e f]`.
///
/// Maps a point as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`, the same
/// layout PDF uses for the `cm` and `Tm` operands.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Build a transform from a `[a, b, c, d, e, f]` operand array.
    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Compose with `other` applied first, in the local frame set up by `self`.
    ///
    /// This is the `cm` rule: after `q 2 0 0 2 0 0 cm 1 0 0 1 10 20 cm`
    /// the effective transform is `scale(2).multiply(&translate(10, 20))`,
    /// which places the local origin at (20, 40).
    pub fn multiply(&self, other: &Transform) -> Transform {
        let (o, s) = (other, self);
        Transform {
            a: o.a * s.a + o.b * s.c,
            b: o.a * s.b + o.b * s.d,
            c: o.c * s.a + o.d * s.c,
            d: o.c * s.b + o.d * s.d,
            e: o.e * s.a + o.f * s.c + s.e,
            f: o.e * s.b + o.f * s.d + s.f,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub fn translate_x(&self) -> f64 {
        self.e
    }

    pub fn translate_y(&self) -> f64 {
        self.f
    }

    /// Length of the transformed x unit vector.
    pub fn scaling_factor_x(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Length of the transformed y unit vector.
    pub fn scaling_factor_y(&self) -> f64 {
        self.c.hypot(self.d)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}
