// Keep imports minimal; everything here is plain f32 arithmetic shared by host kernels.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

/// Tolerance used when comparing coordinates that went through a trig round trip.
pub const EPS_COORD: f32 = 1.0e-5;

/// Three-component float vector used for coordinates, cell sizes and unit vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
    #[must_use]
    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }
    #[must_use]
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
    #[must_use]
    pub fn normalized(self) -> Self {
        let l = self.length();
        if l == 0.0 {
            self
        } else {
            self * (1.0 / l)
        }
    }
    /// Drop the third component.
    #[must_use]
    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
    /// Largest absolute component-wise difference, handy for tolerance checks.
    #[must_use]
    pub fn max_abs_diff(self, o: Self) -> f32 {
        (self.x - o.x).abs().max((self.y - o.y).abs()).max((self.z - o.z).abs())
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Two-component float vector, used for positions inside a 2D grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    /// Extend with a third component.
    #[must_use]
    pub fn extend(self, z: f32) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Multi-dimensional cell index (column, row, layer). Signed so neighbour
/// arithmetic can step below zero before wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Index3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Index3 {
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Geographic (lon, lat, r) to cartesian. Longitude in `[0, 2π)`, latitude in
/// `[-π/2, π/2]`, radius in the third component.
#[inline]
#[must_use]
pub fn geo_to_cart(geo: Vec3) -> Vec3 {
    let (slon, clon) = geo.x.sin_cos();
    let (slat, clat) = geo.y.sin_cos();
    Vec3::new(geo.z * clon * clat, geo.z * slon * clat, geo.z * slat)
}

/// Cartesian to geographic (lon, lat, r). Longitude is mapped into `[0, 2π)`.
/// At the origin the result is all zeros; at the poles longitude is 0.
#[inline]
#[must_use]
pub fn cart_to_geo(cart: Vec3) -> Vec3 {
    let r = cart.length();
    if r == 0.0 {
        return Vec3::ZERO;
    }
    let polar = (cart.z / r).clamp(-1.0, 1.0).acos();
    Vec3::new(wrap_longitude(cart.y.atan2(cart.x)), FRAC_PI_2 - polar, r)
}

/// Map any angle into `[0, 2π)`.
#[inline]
#[must_use]
pub fn wrap_longitude(lon: f32) -> f32 {
    let w = lon.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if w >= TAU {
        0.0
    } else {
        w
    }
}

/// Longitude of the antipodal meridian, i.e. the one reached by walking over a pole.
#[inline]
#[must_use]
pub fn antipodal_longitude(lon: f32) -> f32 {
    wrap_longitude(lon + PI)
}
