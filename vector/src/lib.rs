extern crate num;
extern crate serde;

use num::traits::Inv;
use num::traits::{NumAssign, NumOps, NumRef};
use num::Float;
use num::Num;
use num::NumCast;
use std::fmt;
use std::fmt::{Debug, Display, LowerExp};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

mod serialization;

pub trait Field
where
    Self: Num,
    Self: Mul<Self, Output = Self>,
    Self: MulAssign<Self>,
    Self: AddAssign<Self>,
    Self: SubAssign<Self>,
    Self: DivAssign<Self>,
    Self: Div<Self, Output = Self>,
    Self: Add<Self, Output = Self>,
    Self: Sub<Self, Output = Self>,
    Self: Neg<Output = Self>,
    Self: Inv<Output = Self>,
    Self: Sum<Self>,
    Self: PartialEq,
    Self: Copy,
    Self: Default,
    Self: Debug,
    Self: Display,
{
}

pub trait RealNumberLike
where
    Self: Field,
    Self: Num,
    Self: NumCast,
    Self: Float,
    Self: NumAssign,
    Self: NumOps,
    Self: NumRef,
{
}

impl Field for f32 {}
impl Field for f64 {}

impl RealNumberLike for f64 {}
impl RealNumberLike for f32 {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LorentzVector<T: Field> {
    pub t: T,
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Field> Default for LorentzVector<T> {
    fn default() -> LorentzVector<T> {
        LorentzVector {
            t: T::default(),
            x: T::default(),
            y: T::default(),
            z: T::default(),
        }
    }
}

impl<T: Field> Display for LorentzVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(t:{}, x:{}, y:{}, z:{})",
            self.t, self.x, self.y, self.z
        )
    }
}

impl<T: Field + LowerExp> LowerExp for LorentzVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(t:{:e}, x:{:e}, y:{:e}, z:{:e})",
            self.t, self.x, self.y, self.z
        )
    }
}

impl<T: Field> LorentzVector<T> {
    #[inline]
    pub fn new() -> LorentzVector<T> {
        LorentzVector::default()
    }

    #[inline]
    pub fn from_args(t: T, x: T, y: T, z: T) -> LorentzVector<T> {
        LorentzVector { t, x, y, z }
    }

    #[inline]
    pub fn square(&self) -> T {
        self.t * self.t - self.x * self.x - self.y * self.y - self.z * self.z
    }

    #[inline]
    pub fn dot(&self, other: &LorentzVector<T>) -> T {
        self.t * other.t - self.x * other.x - self.y * other.y - self.z * other.z
    }

    #[inline]
    pub fn spatial_squared(&self) -> T {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn spatial_dot(&self, other: &LorentzVector<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn pt2(&self) -> T {
        self.x * self.x + self.y * self.y
    }
}

impl<T: Field + Float> LorentzVector<T> {
    #[inline]
    pub fn spatial_distance(&self) -> T {
        self.spatial_squared().sqrt()
    }

    #[inline]
    pub fn pt(&self) -> T {
        self.pt2().sqrt()
    }

    /// Invariant mass, negative for space-like vectors.
    #[inline]
    pub fn mass(&self) -> T {
        let m2 = self.square();
        if m2 < T::zero() {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    #[inline]
    pub fn cos_theta(&self) -> T {
        self.z / self.spatial_distance()
    }

    #[inline]
    pub fn phi(&self) -> T {
        self.y.atan2(self.x)
    }

    #[inline]
    pub fn pseudo_rapidity(&self) -> T {
        (self.z / self.pt()).asinh()
    }

    /// Longitudinal boost parameterised by `gamma` and `beta * gamma`.
    #[inline]
    pub fn boost_z(&self, gamma: T, beta_gamma: T) -> LorentzVector<T> {
        LorentzVector {
            t: gamma * self.t + beta_gamma * self.z,
            x: self.x,
            y: self.y,
            z: gamma * self.z + beta_gamma * self.t,
        }
    }

    /// Boost a vector given in the rest frame of `frame` (of mass `mass`)
    /// into the frame where `frame` is measured.
    pub fn boost_from_rest_frame(&self, frame: &LorentzVector<T>, mass: T) -> LorentzVector<T> {
        let pp = self.spatial_dot(frame);
        let factor = pp / (mass * (frame.t + mass)) + self.t / mass;
        LorentzVector {
            t: (self.t * frame.t + pp) / mass,
            x: self.x + frame.x * factor,
            y: self.y + frame.y * factor,
            z: self.z + frame.z * factor,
        }
    }

    /// Inverse of `boost_from_rest_frame`.
    pub fn boost_to_rest_frame(&self, frame: &LorentzVector<T>, mass: T) -> LorentzVector<T> {
        let pp = self.spatial_dot(frame);
        let factor = pp / (mass * (frame.t + mass)) - self.t / mass;
        LorentzVector {
            t: (self.t * frame.t - pp) / mass,
            x: self.x + frame.x * factor,
            y: self.y + frame.y * factor,
            z: self.z + frame.z * factor,
        }
    }

    #[inline]
    pub fn rotate_y(&self, cos: T, sin: T) -> LorentzVector<T> {
        LorentzVector {
            t: self.t,
            x: cos * self.x + sin * self.z,
            y: self.y,
            z: -sin * self.x + cos * self.z,
        }
    }

    #[inline]
    pub fn rotate_z(&self, cos: T, sin: T) -> LorentzVector<T> {
        LorentzVector {
            t: self.t,
            x: cos * self.x - sin * self.y,
            y: sin * self.x + cos * self.y,
            z: self.z,
        }
    }
}

impl<'a, T: Field> Neg for &'a LorentzVector<T> {
    type Output = LorentzVector<T>;

    #[inline]
    fn neg(self) -> LorentzVector<T> {
        LorentzVector {
            t: -self.t,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl<T: Field> Neg for LorentzVector<T> {
    type Output = LorentzVector<T>;

    #[inline]
    fn neg(self) -> LorentzVector<T> {
        -&self
    }
}

macro_rules! impl_componentwise {
    ($tr:ident, $f:ident, $op:tt, $tr_assign:ident, $f_assign:ident) => {
        impl<'a, T: Field> $tr<&'a LorentzVector<T>> for &'a LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: &'a LorentzVector<T>) -> LorentzVector<T> {
                LorentzVector {
                    t: self.t $op other.t,
                    x: self.x $op other.x,
                    y: self.y $op other.y,
                    z: self.z $op other.z,
                }
            }
        }

        impl<'a, T: Field> $tr<LorentzVector<T>> for &'a LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: LorentzVector<T>) -> LorentzVector<T> {
                self $op &other
            }
        }

        impl<'a, T: Field> $tr<&'a LorentzVector<T>> for LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: &'a LorentzVector<T>) -> LorentzVector<T> {
                &self $op other
            }
        }

        impl<T: Field> $tr<LorentzVector<T>> for LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: LorentzVector<T>) -> LorentzVector<T> {
                &self $op &other
            }
        }

        impl<'a, T: Field> $tr_assign<&'a LorentzVector<T>> for LorentzVector<T> {
            #[inline]
            fn $f_assign(&mut self, other: &'a LorentzVector<T>) {
                *self = &*self $op other;
            }
        }

        impl<T: Field> $tr_assign<LorentzVector<T>> for LorentzVector<T> {
            #[inline]
            fn $f_assign(&mut self, other: LorentzVector<T>) {
                *self = &*self $op &other;
            }
        }
    };
}

impl_componentwise!(Add, add, +, AddAssign, add_assign);
impl_componentwise!(Sub, sub, -, SubAssign, sub_assign);

macro_rules! impl_scalar {
    ($tr:ident, $f:ident, $op:tt, $tr_assign:ident, $f_assign:ident) => {
        impl<'a, T: Field> $tr<T> for &'a LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: T) -> LorentzVector<T> {
                LorentzVector {
                    t: self.t $op other,
                    x: self.x $op other,
                    y: self.y $op other,
                    z: self.z $op other,
                }
            }
        }

        impl<T: Field> $tr<T> for LorentzVector<T> {
            type Output = LorentzVector<T>;

            #[inline]
            fn $f(self, other: T) -> LorentzVector<T> {
                &self $op other
            }
        }

        impl<T: Field> $tr_assign<T> for LorentzVector<T> {
            #[inline]
            fn $f_assign(&mut self, other: T) {
                *self = &*self $op other;
            }
        }
    };
}

impl_scalar!(Mul, mul, *, MulAssign, mul_assign);
impl_scalar!(Div, div, /, DivAssign, div_assign);

impl<T: Field> Sum for LorentzVector<T> {
    fn sum<I: Iterator<Item = LorentzVector<T>>>(iter: I) -> LorentzVector<T> {
        iter.fold(LorentzVector::default(), |acc, p| acc + p)
    }
}

impl<T: Field> Index<usize> for LorentzVector<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        match index {
            0 => &self.t,
            1 => &self.x,
            2 => &self.y,
            3 => &self.z,
            _ => panic!("Index is not between 0 and 3"),
        }
    }
}

impl<T: Field> IndexMut<usize> for LorentzVector<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        match index {
            0 => &mut self.t,
            1 => &mut self.x,
            2 => &mut self.y,
            3 => &mut self.z,
            _ => panic!("Index is not between 0 and 3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LorentzVector;
    use approx::assert_relative_eq;

    #[test]
    fn rest_frame_boosts_are_inverse() {
        let frame = LorentzVector::<f64>::from_args(50.0, 3.0, -4.0, 30.0);
        let mass = frame.square().sqrt();
        let p = LorentzVector::from_args(7.0, 1.0, 2.0, -3.0);

        let rest = p.boost_to_rest_frame(&frame, mass);
        let back = rest.boost_from_rest_frame(&frame, mass);
        for i in 0..4 {
            assert_relative_eq!(back[i], p[i], max_relative = 1e-12);
        }
        assert_relative_eq!(rest.square(), p.square(), max_relative = 1e-12);

        let frame_at_rest = frame.boost_to_rest_frame(&frame, mass);
        assert_relative_eq!(frame_at_rest.t, mass, max_relative = 1e-12);
        assert!(frame_at_rest.spatial_distance() < 1e-10);
    }

    #[test]
    fn longitudinal_boost_keeps_mass_and_pt() {
        let p = LorentzVector::from_args(10.0, 2.0, 1.0, 5.0);
        let (gamma, beta_gamma) = (1.25f64, 0.75f64);
        let q = p.boost_z(gamma, beta_gamma);
        assert_relative_eq!(q.square(), p.square(), max_relative = 1e-12);
        assert_relative_eq!(q.pt(), p.pt());
        assert_relative_eq!(q.t, 1.25 * 10.0 + 0.75 * 5.0);
    }

    #[test]
    fn rotations_preserve_length() {
        let p = LorentzVector::from_args(3.0, 1.0, 0.0, 0.0);
        let (c, s) = (0.6, 0.8);
        let q = p.rotate_z(c, s);
        assert_relative_eq!(q.x, 0.6);
        assert_relative_eq!(q.y, 0.8);
        let r = q.rotate_y(c, s);
        assert_relative_eq!(r.spatial_distance(), 1.0, max_relative = 1e-14);
        assert_relative_eq!(r.z, -0.8 * 0.6);
    }

    #[test]
    fn angular_helpers() {
        let p = LorentzVector::from_args(5.0, 3.0, 0.0, 4.0);
        assert_relative_eq!(p.cos_theta(), 0.8);
        assert_relative_eq!(p.phi(), 0.0);
        assert_relative_eq!(p.pseudo_rapidity(), (4.0f64 / 3.0).asinh());
        assert_relative_eq!(LorentzVector::from_args(1.0, 0.0, 0.0, 2.0).mass(), -3f64.sqrt());
    }

    #[test]
    fn serializes_as_a_sequence() {
        let p = LorentzVector::from_args(1.5, -2.0, 0.25, 8.0);
        let text = serde_yaml::to_string(&p).unwrap();
        let components: Vec<f64> = serde_yaml::from_str(&text).unwrap();
        assert_eq!(components, vec![1.5, -2.0, 0.25, 8.0]);
    }
}
