//! Element types accepted by the multiplication kernels.
//!
//! `Scalar` bundles the arithmetic the kernels need together with two static
//! capabilities used for kernel selection: whether the type has a packed SIMD
//! representation (`SIMD_ENABLED`) and whether values own heap storage
//! (`RESIZABLE`, e.g. arbitrary precision integers).

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use num_bigint::BigInt;
use num_complex::Complex;
use num_traits::{One, Zero};
use wide::{f32x8, f64x4};

/// A fixed-width register of `LANES` elements.
///
/// `load` and `store` operate on the first `LANES` elements of the slice; the
/// caller guarantees the slice is long enough.
pub trait Packed<T>: Sized + Clone {
    const LANES: usize;

    fn splat(value: &T) -> Self;
    fn load(src: &[T]) -> Self;
    fn store(self, dst: &mut [T]);
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
}

/// Numeric element of a sparse or dense operand.
pub trait Scalar:
    Clone
    + PartialEq
    + Debug
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    type Packed: Packed<Self>;

    /// A packed representation with hardware add/mul exists.
    const SIMD_ENABLED: bool;
    /// Values are heap-backed; unrolled kernels would only add temporaries.
    const RESIZABLE: bool;

    /// Complex conjugate (identity for real types).
    fn conj(&self) -> Self;

    /// True for the value a freshly reset matrix holds.
    fn is_default(&self) -> bool {
        self.is_zero()
    }
}

/// Single-lane fallback for element types without SIMD support.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane<T>(pub T);

impl<T: Scalar> Packed<T> for Lane<T> {
    const LANES: usize = 1;

    fn splat(value: &T) -> Self {
        Lane(value.clone())
    }
    fn load(src: &[T]) -> Self {
        Lane(src[0].clone())
    }
    fn store(self, dst: &mut [T]) {
        dst[0] = self.0;
    }
    fn add(self, rhs: Self) -> Self {
        Lane(self.0 + rhs.0)
    }
    fn sub(self, rhs: Self) -> Self {
        Lane(self.0 - rhs.0)
    }
    fn mul(self, rhs: Self) -> Self {
        Lane(self.0 * rhs.0)
    }
}

impl Packed<f64> for f64x4 {
    const LANES: usize = 4;

    fn splat(value: &f64) -> Self {
        f64x4::splat(*value)
    }
    fn load(src: &[f64]) -> Self {
        f64x4::new([src[0], src[1], src[2], src[3]])
    }
    fn store(self, dst: &mut [f64]) {
        dst[..4].copy_from_slice(&self.to_array());
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Packed<f32> for f32x8 {
    const LANES: usize = 8;

    fn splat(value: &f32) -> Self {
        f32x8::splat(*value)
    }
    fn load(src: &[f32]) -> Self {
        f32x8::new([
            src[0], src[1], src[2], src[3], src[4], src[5], src[6], src[7],
        ])
    }
    fn store(self, dst: &mut [f32]) {
        dst[..8].copy_from_slice(&self.to_array());
    }
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }
    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }
}

impl Scalar for f64 {
    type Packed = f64x4;
    const SIMD_ENABLED: bool = true;
    const RESIZABLE: bool = false;

    fn conj(&self) -> Self {
        *self
    }
}

impl Scalar for f32 {
    type Packed = f32x8;
    const SIMD_ENABLED: bool = true;
    const RESIZABLE: bool = false;

    fn conj(&self) -> Self {
        *self
    }
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                type Packed = Lane<$t>;
                const SIMD_ENABLED: bool = false;
                const RESIZABLE: bool = false;

                fn conj(&self) -> Self {
                    *self
                }
            }
        )*
    };
}

impl_scalar_int!(i32, i64);

impl Scalar for Complex<f64> {
    type Packed = Lane<Complex<f64>>;
    const SIMD_ENABLED: bool = false;
    const RESIZABLE: bool = false;

    fn conj(&self) -> Self {
        Complex::new(self.re, -self.im)
    }
}

impl Scalar for Complex<f32> {
    type Packed = Lane<Complex<f32>>;
    const SIMD_ENABLED: bool = false;
    const RESIZABLE: bool = false;

    fn conj(&self) -> Self {
        Complex::new(self.re, -self.im)
    }
}

impl Scalar for BigInt {
    type Packed = Lane<BigInt>;
    const SIMD_ENABLED: bool = false;
    const RESIZABLE: bool = true;

    fn conj(&self) -> Self {
        self.clone()
    }
}

/// Number of lanes in the packed representation of `T`.
pub const fn lanes<T: Scalar>() -> usize {
    <T::Packed as Packed<T>>::LANES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_f64_matches_scalar_arithmetic() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [0.5, -1.0, 2.0, 0.25];
        let v = <f64x4 as Packed<f64>>::splat(&2.0);
        let x = <f64x4 as Packed<f64>>::load(&a[..]);
        let y = <f64x4 as Packed<f64>>::load(&b[..]);
        let r = Packed::add(Packed::mul(v, x), y);
        let mut out = [0.0; 4];
        Packed::store(r, &mut out[..]);
        assert_eq!(out, [2.5, 3.0, 8.0, 8.25]);
    }

    #[test]
    fn capabilities_per_type() {
        assert!(f64::SIMD_ENABLED && !f64::RESIZABLE);
        assert_eq!(lanes::<f32>(), 8);
        assert_eq!(lanes::<i64>(), 1);
        assert!(!Complex::<f64>::SIMD_ENABLED);
        assert!(BigInt::RESIZABLE);
        let z = Complex::new(1.0, 2.0);
        assert_eq!(Scalar::conj(&z), Complex::new(1.0, -2.0));
    }
}
