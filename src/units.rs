//! Strongly typed electrical quantities.
//!
//! Only the three quantities the RC core needs are modeled. Multiplying a
//! [`Resistance`] by a [`Capacitance`] yields a [`Delay`], which is the whole
//! of the Elmore arithmetic.

use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::math::Scalar;

/// Unit marker for quantities.
pub trait Unit: Copy + Default + fmt::Debug {
    /// SI symbol used when formatting.
    const SYMBOL: &'static str;
}

/// Ohm (Ω).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Ohm;
/// Farad (F).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Farad;
/// Second (s).
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Second;

impl Unit for Ohm {
    const SYMBOL: &'static str = "Ω";
}
impl Unit for Farad {
    const SYMBOL: &'static str = "F";
}
impl Unit for Second {
    const SYMBOL: &'static str = "s";
}

/// Scalar value tagged with a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Quantity<U: Unit> {
    value: Scalar,
    unit: PhantomData<U>,
}

/// Resistance in ohms.
pub type Resistance = Quantity<Ohm>;
/// Capacitance in farads.
pub type Capacitance = Quantity<Farad>;
/// Elapsed time in seconds.
pub type Delay = Quantity<Second>;

impl<U: Unit> Quantity<U> {
    /// Wraps a raw SI value.
    #[must_use]
    pub const fn new(value: Scalar) -> Self {
        Self {
            value,
            unit: PhantomData,
        }
    }

    /// Zero of this unit.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0)
    }

    /// Raw SI value.
    #[must_use]
    pub const fn value(self) -> Scalar {
        self.value
    }
}

impl<U: Unit> Add for Quantity<U> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value)
    }
}

impl<U: Unit> AddAssign for Quantity<U> {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
    }
}

impl<U: Unit> Sub for Quantity<U> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.value - rhs.value)
    }
}

impl<U: Unit> Mul<Scalar> for Quantity<U> {
    type Output = Self;

    fn mul(self, rhs: Scalar) -> Self {
        Self::new(self.value * rhs)
    }
}

impl<U: Unit> Sum for Quantity<U> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl Mul<Capacitance> for Resistance {
    type Output = Delay;

    fn mul(self, rhs: Capacitance) -> Delay {
        Delay::new(self.value * rhs.value)
    }
}

impl<U: Unit> fmt::Display for Quantity<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_si(self.value), U::SYMBOL)
    }
}

/// Formats `value` with an engineering SI prefix (`1.0000k`, `372.0000p`).
#[must_use]
pub fn format_si(value: Scalar) -> String {
    const PREFIXES: [(Scalar, &str); 9] = [
        (1e12, "T"),
        (1e9, "G"),
        (1e6, "M"),
        (1e3, "k"),
        (1.0, ""),
        (1e-3, "m"),
        (1e-6, "u"),
        (1e-9, "n"),
        (1e-12, "p"),
    ];
    let magnitude = value.abs();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return format!("{value:.4}");
    }
    for (scale, prefix) in PREFIXES {
        if magnitude >= scale {
            return format!("{:.4}{prefix}", value / scale);
        }
    }
    format!("{:.4}f", value / 1e-15)
}
