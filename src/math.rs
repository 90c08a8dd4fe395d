use std::f32::consts::{LN_2, LOG2_E, PI};
use std::mem::size_of;
use std::ops::{Add, Mul, Sub};

/// The minimum number of bits required to store a positive integer in binary, or 0 for a non-positive integer.
#[inline(always)]
pub(crate) fn ilog(x: u32) -> u32 {
    (size_of::<u32>() * 8) as u32 - x.leading_zeros()
}

/// Lets range-coder code call `.ilog()` directly on the value being measured.
pub(crate) trait Log {
    /// See [`ilog`].
    fn ilog(&self) -> u32;
}

impl Log for u32 {
    #[inline(always)]
    fn ilog(&self) -> u32 {
        ilog(*self)
    }
}

/// Integer square root (floor), used to validate ambisonics channel counts
/// (`channels == (order+1)^2 [+ non-diegetic pair]`).
#[inline(always)]
pub(crate) fn isqrt(x: u32) -> u32 {
    if x == 0 {
        return 0;
    }
    let mut r = (x as f64).sqrt() as u32;
    while r.saturating_mul(r) > x {
        r -= 1;
    }
    while (r + 1).saturating_mul(r + 1) <= x {
        r += 1;
    }
    r
}

/// Fast version for log2.
#[inline(always)]
pub(crate) fn fast_log2(x: f32) -> f32 {
    x.ln() * LOG2_E
}

/// Fast version for exp2.
#[inline(always)]
pub(crate) fn fast_exp2(x: f32) -> f32 {
    (x * LN_2).exp()
}

/// Fast version for atan2.
#[allow(clippy::excessive_precision)]
#[inline(always)]
pub(crate) fn fast_atan2(x: f32, y: f32) -> f32 {
    const A: f32 = 0.43157974;
    const B: f32 = 0.67848403;
    const C: f32 = 0.08595542;
    const E: f32 = PI / 2.0;

    let x2 = x * x;
    let y2 = y * y;

    // For very small values, we don't care about the answer, so we can just return 0.
    if x2 + y2 < 1e-18 {
        return 0.0;
    }

    if x2 < y2 {
        let den = (y2 + B * x2) * (y2 + C * x2);
        -x * y * (y2 + A * x2) / den + (if y < 0.0 { -E } else { E })
    } else {
        let den = (x2 + B * y2) * (x2 + C * y2);
        x * y * (x2 + A * y2) / den + (if y < 0.0 { -E } else { E })
            - (if x * y < 0.0 { -E } else { E })
    }
}

/// This is a cos() approximation designed to be bit-exact on any platform. Bit exactness
/// with this approximation is important because it has an impact on the bit allocation.
#[inline(always)]
pub(crate) fn bitexact_cos(x: i16) -> i16 {
    let x2 = i32::from(x) * i32::from(x);
    let y = ((x2 + 4096) >> 13) as i16;
    1 + (32767 - y) + frac_mul16(y, -7651 + frac_mul16(y, 8277 + frac_mul16(-626, y)))
}

/// This is designed to be bit-exact on any platform.
#[inline(always)]
pub(crate) fn bitexact_log2tan(isin: i32, icos: i32) -> i32 {
    let ls = ilog(isin as u32) as i32;
    let lc = ilog(icos as u32) as i32;

    let icos = (icos << (15 - lc)) as i16;
    let isin = (isin << (15 - ls)) as i16;

    let a = i32::from(frac_mul16(isin, frac_mul16(isin, -2597) + 7932));
    let b = i32::from(frac_mul16(icos, frac_mul16(icos, -2597) + 7932));
    (ls - lc) * (1 << 11) + a - b
}

#[inline(always)]
fn frac_mul16(rhs: i16, lhs: i16) -> i16 {
    let x = i32::from(rhs) * i32::from(lhs);
    ((16384 + x) >> 15) as i16
}

/// Custom complex number implementation.
#[derive(Clone, Copy, Default, Debug)]
pub(crate) struct Complex {
    pub(crate) r: f32,
    pub(crate) i: f32,
}

impl std::ops::Sub<Complex> for Complex {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            r: self.r - rhs.r,
            i: self.i - rhs.i,
        }
    }
}

impl std::ops::Add<Complex> for Complex {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Complex) -> Self::Output {
        Self::Output {
            r: self.r + rhs.r,
            i: self.i + rhs.i,
        }
    }
}

impl std::ops::AddAssign for Complex {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.r += rhs.r;
        self.i += rhs.i;
    }
}

impl std::ops::Mul<Complex> for Complex {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        // (a+bi)(c+di) = (acâˆ’bd) + (ad+bc)i
        let r = self.r * rhs.r - self.i * rhs.i;
        let i = self.r * rhs.i + self.i * rhs.r;
        Self::Output { r, i }
    }
}

impl std::ops::MulAssign<Complex> for Complex {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Complex) {
        let tmp = self.r;

        self.r *= rhs.r;
        self.r -= self.i * rhs.i;

        self.i *= rhs.r;
        self.i += tmp * rhs.i;
    }
}

impl std::ops::Mul<f32> for Complex {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: f32) -> Self::Output {
        let r = self.r * rhs;
        let i = self.i * rhs;
        Self::Output { r, i }
    }
}

impl std::ops::MulAssign<f32> for Complex {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: f32) {
        self.r = self.r * rhs;
        self.i = self.i * rhs;
    }
}
