//! Weightsets: the semirings weighting labels, transitions and polynomials.
//!
//! Each supported semiring is a zero-sized type implementing [`Semiring`] over
//! its native value type. [`WeightSet`] is the runtime choice among them (as
//! selected by a context descriptor) and dispatches to the concrete semiring
//! over the dynamic [`Weight`] value.
//!
//! | descriptor | semiring    | `+`   | `*` | star                         |
//! |------------|-------------|-------|-----|------------------------------|
//! | `b`        | Boolean     | or    | and | always `1`                   |
//! | `z`        | integers    | +     | ×   | only `0* = 1`                |
//! | `q`        | rationals   | +     | ×   | `1/(1-w)` when `abs(w) < 1`  |
//! | `r`        | reals       | +     | ×   | `1/(1-w)` when `abs(w) < 1`  |
//! | `zmin`     | min-plus    | min   | +   | `0` when `w ≥ 0`             |
//! | `zmax`     | max-plus    | max   | +   | `0` when `w ≤ 0`             |
//! | `expressionset<…>` | expressions | sum | product | `E*`              |

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::{Error, Result};
use crate::expression::{Exp, ExpNode, ExpressionSet};

/// A semiring `(S, +, *, 0, 1)` with a partial star.
pub trait Semiring {
    type Value: Clone + PartialEq;

    /// Additive identity.
    fn zero(&self) -> Self::Value;

    /// Multiplicative identity.
    fn one(&self) -> Self::Value;

    fn add(&self, lhs: &Self::Value, rhs: &Self::Value) -> Self::Value;

    fn mul(&self, lhs: &Self::Value, rhs: &Self::Value) -> Self::Value;

    /// Kleene star `1 + w + w² + ...`, when it converges in this semiring.
    fn star(&self, value: &Self::Value) -> Result<Self::Value>;

    /// Left quotient: `x` such that `lhs * x = rhs`, if it exists.
    fn ldiv(&self, lhs: &Self::Value, rhs: &Self::Value) -> Option<Self::Value>;

    /// Subtraction, for semirings that are rings.
    fn sub(&self, _lhs: &Self::Value, _rhs: &Self::Value) -> Option<Self::Value> {
        None
    }

    /// Greatest common divisor of two weights.
    fn gcd(&self, _lhs: &Self::Value, _rhs: &Self::Value) -> Self::Value {
        self.one()
    }

    fn is_zero(&self, value: &Self::Value) -> bool {
        *value == self.zero()
    }

    fn is_one(&self, value: &Self::Value) -> bool {
        *value == self.one()
    }

    fn is_commutative(&self) -> bool {
        true
    }

    fn parse(&self, text: &str) -> Result<Self::Value>;
}

fn bad_weight(text: &str, kind: &str) -> Error {
    Error::syntax(0..text.chars().count().max(1), format!("invalid {} weight: {:?}", kind, text))
}

fn not_starable(value: impl fmt::Display) -> Error {
    Error::NotStarable {
        weight: value.to_string(),
    }
}

// ─── Concrete semirings ────────────────────────────────────────────────────────

/// The Boolean semiring `({0, 1}, or, and)`.
#[derive(Debug, Copy, Clone, Default)]
pub struct Boolean;

impl Semiring for Boolean {
    type Value = bool;

    fn zero(&self) -> bool {
        false
    }
    fn one(&self) -> bool {
        true
    }
    fn add(&self, lhs: &bool, rhs: &bool) -> bool {
        *lhs || *rhs
    }
    fn mul(&self, lhs: &bool, rhs: &bool) -> bool {
        *lhs && *rhs
    }
    fn star(&self, _value: &bool) -> Result<bool> {
        Ok(true)
    }
    fn ldiv(&self, lhs: &bool, rhs: &bool) -> Option<bool> {
        if *lhs {
            Some(*rhs)
        } else {
            None
        }
    }
    fn parse(&self, text: &str) -> Result<bool> {
        match text.trim() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(bad_weight(text, "Boolean")),
        }
    }
}

/// The ring of integers, with arbitrary precision.
#[derive(Debug, Copy, Clone, Default)]
pub struct Integers;

impl Semiring for Integers {
    type Value = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::zero()
    }
    fn one(&self) -> BigInt {
        BigInt::one()
    }
    fn add(&self, lhs: &BigInt, rhs: &BigInt) -> BigInt {
        lhs + rhs
    }
    fn mul(&self, lhs: &BigInt, rhs: &BigInt) -> BigInt {
        lhs * rhs
    }
    fn star(&self, value: &BigInt) -> Result<BigInt> {
        if value.is_zero() {
            Ok(BigInt::one())
        } else {
            Err(not_starable(value))
        }
    }
    fn ldiv(&self, lhs: &BigInt, rhs: &BigInt) -> Option<BigInt> {
        if lhs.is_zero() {
            return None;
        }
        let (q, r) = rhs.div_rem(lhs);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }
    fn sub(&self, lhs: &BigInt, rhs: &BigInt) -> Option<BigInt> {
        Some(lhs - rhs)
    }
    fn gcd(&self, lhs: &BigInt, rhs: &BigInt) -> BigInt {
        lhs.gcd(rhs)
    }
    fn parse(&self, text: &str) -> Result<BigInt> {
        text.trim().parse::<BigInt>().map_err(|_| bad_weight(text, "integer"))
    }
}

/// A rational number in lowest terms, with a positive denominator.
pub type Rational = BigRational;

/// The field of rationals.
#[derive(Debug, Copy, Clone, Default)]
pub struct Rationals;

impl Semiring for Rationals {
    type Value = Rational;

    fn zero(&self) -> Rational {
        Rational::zero()
    }
    fn one(&self) -> Rational {
        Rational::one()
    }
    fn add(&self, lhs: &Rational, rhs: &Rational) -> Rational {
        lhs + rhs
    }
    fn mul(&self, lhs: &Rational, rhs: &Rational) -> Rational {
        lhs * rhs
    }
    fn star(&self, value: &Rational) -> Result<Rational> {
        if value.abs() < Rational::one() {
            Ok((Rational::one() - value).recip())
        } else {
            Err(not_starable(value))
        }
    }
    fn ldiv(&self, lhs: &Rational, rhs: &Rational) -> Option<Rational> {
        if lhs.is_zero() {
            None
        } else {
            Some(rhs / lhs)
        }
    }
    fn sub(&self, lhs: &Rational, rhs: &Rational) -> Option<Rational> {
        Some(lhs - rhs)
    }
    fn parse(&self, text: &str) -> Result<Rational> {
        let text = text.trim();
        let (num, den) = match text.split_once('/') {
            Some((n, d)) => (n, d),
            None => (text, "1"),
        };
        let num = num.trim().parse::<BigInt>().map_err(|_| bad_weight(text, "rational"))?;
        let den = den.trim().parse::<BigInt>().map_err(|_| bad_weight(text, "rational"))?;
        if den.is_zero() {
            return Err(bad_weight(text, "rational"));
        }
        Ok(Rational::new(num, den))
    }
}

/// The field of reals, approximated by `f64`.
#[derive(Debug, Copy, Clone, Default)]
pub struct Reals;

/// Map `-0.0` to `0.0` so that equality and hashing agree.
fn canonical_f64(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

impl Semiring for Reals {
    type Value = f64;

    fn zero(&self) -> f64 {
        0.0
    }
    fn one(&self) -> f64 {
        1.0
    }
    fn add(&self, lhs: &f64, rhs: &f64) -> f64 {
        canonical_f64(lhs + rhs)
    }
    fn mul(&self, lhs: &f64, rhs: &f64) -> f64 {
        canonical_f64(lhs * rhs)
    }
    fn star(&self, value: &f64) -> Result<f64> {
        if value.abs() < 1.0 {
            Ok(1.0 / (1.0 - value))
        } else {
            Err(not_starable(value))
        }
    }
    fn ldiv(&self, lhs: &f64, rhs: &f64) -> Option<f64> {
        if *lhs == 0.0 {
            None
        } else {
            Some(canonical_f64(rhs / lhs))
        }
    }
    fn sub(&self, lhs: &f64, rhs: &f64) -> Option<f64> {
        Some(canonical_f64(lhs - rhs))
    }
    fn parse(&self, text: &str) -> Result<f64> {
        let text = text.trim();
        if let Some((n, d)) = text.split_once('/') {
            let n: f64 = n.trim().parse().map_err(|_| bad_weight(text, "real"))?;
            let d: f64 = d.trim().parse().map_err(|_| bad_weight(text, "real"))?;
            return Ok(canonical_f64(n / d));
        }
        text.parse::<f64>()
            .map(canonical_f64)
            .map_err(|_| bad_weight(text, "real"))
    }
}

/// Tropical semiring over the integers: `(Z ∪ {∞}, min, +)` or `(Z ∪ {-∞}, max, +)`.
///
/// The infinite element (the semiring zero) is represented by `None`.
#[derive(Debug, Copy, Clone)]
pub struct Tropical {
    pub max: bool,
}

impl Tropical {
    pub const MIN: Tropical = Tropical { max: false };
    pub const MAX: Tropical = Tropical { max: true };
}

impl Semiring for Tropical {
    type Value = Option<i64>;

    fn zero(&self) -> Option<i64> {
        None
    }
    fn one(&self) -> Option<i64> {
        Some(0)
    }
    fn add(&self, lhs: &Option<i64>, rhs: &Option<i64>) -> Option<i64> {
        match (lhs, rhs) {
            (None, x) | (x, None) => *x,
            (Some(a), Some(b)) => Some(if self.max { *a.max(b) } else { *a.min(b) }),
        }
    }
    fn mul(&self, lhs: &Option<i64>, rhs: &Option<i64>) -> Option<i64> {
        match (lhs, rhs) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        }
    }
    fn star(&self, value: &Option<i64>) -> Result<Option<i64>> {
        match value {
            None => Ok(Some(0)),
            Some(v) if (!self.max && *v >= 0) || (self.max && *v <= 0) => Ok(Some(0)),
            Some(v) => Err(not_starable(v)),
        }
    }
    fn ldiv(&self, lhs: &Option<i64>, rhs: &Option<i64>) -> Option<Option<i64>> {
        match (lhs, rhs) {
            (None, _) => None,
            (Some(_), None) => Some(None),
            (Some(a), Some(b)) => Some(Some(b - a)),
        }
    }
    fn parse(&self, text: &str) -> Result<Option<i64>> {
        match text.trim() {
            "oo" | "∞" if !self.max => Ok(None),
            "-oo" | "-∞" if self.max => Ok(None),
            t => t
                .parse::<i64>()
                .map(Some)
                .map_err(|_| bad_weight(text, "tropical")),
        }
    }
}

// ─── Dynamic weights ───────────────────────────────────────────────────────────

/// A weight of any supported semiring.
///
/// The owning [`WeightSet`] determines which variant is valid; mixing variants
/// of different weightsets is a logic error.
#[derive(Debug, Clone)]
pub enum Weight {
    Bool(bool),
    Int(BigInt),
    Rat(Rational),
    Real(f64),
    Tropical(Option<i64>),
    Exp(Exp),
}

impl Weight {
    fn rank(&self) -> u8 {
        match self {
            Weight::Bool(_) => 0,
            Weight::Int(_) => 1,
            Weight::Rat(_) => 2,
            Weight::Real(_) => 3,
            Weight::Tropical(_) => 4,
            Weight::Exp(_) => 5,
        }
    }

    /// Whether this weight is the zero of its semiring.
    pub fn is_zero(&self) -> bool {
        match self {
            Weight::Bool(b) => !b,
            Weight::Int(i) => i.is_zero(),
            Weight::Rat(q) => q.is_zero(),
            Weight::Real(x) => *x == 0.0,
            Weight::Tropical(t) => t.is_none(),
            Weight::Exp(e) => matches!(**e, ExpNode::Zero),
        }
    }

    /// Whether this weight is the one of its semiring.
    pub fn is_one(&self) -> bool {
        match self {
            Weight::Bool(b) => *b,
            Weight::Int(i) => i.is_one(),
            Weight::Rat(q) => q.is_one(),
            Weight::Real(x) => *x == 1.0,
            Weight::Tropical(t) => *t == Some(0),
            Weight::Exp(e) => matches!(**e, ExpNode::One),
        }
    }
}

impl PartialEq for Weight {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Weight {}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Weight::Bool(a), Weight::Bool(b)) => a.cmp(b),
            (Weight::Int(a), Weight::Int(b)) => a.cmp(b),
            (Weight::Rat(a), Weight::Rat(b)) => a.cmp(b),
            (Weight::Real(a), Weight::Real(b)) => canonical_f64(*a).total_cmp(&canonical_f64(*b)),
            (Weight::Tropical(a), Weight::Tropical(b)) => a.cmp(b),
            (Weight::Exp(a), Weight::Exp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Weight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Weight::Bool(b) => b.hash(state),
            Weight::Int(i) => i.hash(state),
            Weight::Rat(q) => q.hash(state),
            Weight::Real(x) => canonical_f64(*x).to_bits().hash(state),
            Weight::Tropical(t) => t.hash(state),
            Weight::Exp(e) => e.hash(state),
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Weight::Int(i) => write!(f, "{}", i),
            Weight::Rat(q) => write!(f, "{}", q),
            Weight::Real(x) => write!(f, "{}", x),
            Weight::Tropical(Some(v)) => write!(f, "{}", v),
            Weight::Tropical(None) => write!(f, "oo"),
            Weight::Exp(e) => write!(f, "{}", crate::printer::format_exp(e, crate::printer::Format::Text)),
        }
    }
}

/// The runtime selection of a semiring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeightSet {
    B,
    Z,
    Q,
    R,
    Zmin,
    Zmax,
    /// Rational expressions over a (nested) context, used as weights.
    Expressions(Box<ExpressionSet>),
}

/// Apply `$body` to the concrete semiring and native values of matching weights.
macro_rules! dispatch2 {
    ($self:expr, $lhs:expr, $rhs:expr, |$ws:ident, $a:ident, $b:ident| $body:expr, $wrap:expr) => {
        match ($self, $lhs, $rhs) {
            (WeightSet::B, Weight::Bool($a), Weight::Bool($b)) => {
                let $ws = Boolean;
                $wrap($body, Weight::Bool)
            }
            (WeightSet::Z, Weight::Int($a), Weight::Int($b)) => {
                let $ws = Integers;
                $wrap($body, Weight::Int)
            }
            (WeightSet::Q, Weight::Rat($a), Weight::Rat($b)) => {
                let $ws = Rationals;
                $wrap($body, Weight::Rat)
            }
            (WeightSet::R, Weight::Real($a), Weight::Real($b)) => {
                let $ws = Reals;
                $wrap($body, Weight::Real)
            }
            (WeightSet::Zmin, Weight::Tropical($a), Weight::Tropical($b)) => {
                let $ws = Tropical::MIN;
                $wrap($body, Weight::Tropical)
            }
            (WeightSet::Zmax, Weight::Tropical($a), Weight::Tropical($b)) => {
                let $ws = Tropical::MAX;
                $wrap($body, Weight::Tropical)
            }
            (ws, a, b) => unreachable!("weights {} and {} do not belong to {}", a, b, ws),
        }
    };
}

fn wrap_value<T>(value: T, f: fn(T) -> Weight) -> Weight {
    f(value)
}

fn wrap_option<T>(value: Option<T>, f: fn(T) -> Weight) -> Option<Weight> {
    value.map(f)
}

impl WeightSet {
    /// Parse a weightset name: `b`, `z`, `q`, `r`, `zmin`, `zmax` (case-insensitive).
    ///
    /// Expression weightsets are parsed by the context descriptor parser.
    pub fn from_name(name: &str) -> Option<WeightSet> {
        match name.trim().to_ascii_lowercase().as_str() {
            "b" => Some(WeightSet::B),
            "z" => Some(WeightSet::Z),
            "q" => Some(WeightSet::Q),
            "r" => Some(WeightSet::R),
            "zmin" => Some(WeightSet::Zmin),
            "zmax" => Some(WeightSet::Zmax),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, WeightSet::B)
    }

    /// Whether `star` is total on this weightset.
    pub fn is_always_starable(&self) -> bool {
        matches!(self, WeightSet::B | WeightSet::Expressions(_))
    }

    /// The smallest weightset both `self` and `other` embed into.
    pub fn join(&self, other: &WeightSet) -> Option<WeightSet> {
        fn numeric_rank(ws: &WeightSet) -> Option<u8> {
            match ws {
                WeightSet::B => Some(0),
                WeightSet::Z => Some(1),
                WeightSet::Q => Some(2),
                WeightSet::R => Some(3),
                _ => None,
            }
        }
        if self == other {
            return Some(self.clone());
        }
        match (numeric_rank(self), numeric_rank(other)) {
            (Some(a), Some(b)) => Some(if a >= b { self.clone() } else { other.clone() }),
            _ => None,
        }
    }

    /// Whether every weight of `self` has a canonical image in `other`.
    pub fn embeds_into(&self, other: &WeightSet) -> bool {
        match other {
            WeightSet::Expressions(rs) => self == other || self.embeds_into(rs.context().weightset()),
            _ => self.join(other).as_ref() == Some(other),
        }
    }

    pub fn from_bool(&self, value: bool) -> Weight {
        if value {
            self.one()
        } else {
            self.zero()
        }
    }

    pub fn from_int(&self, value: i64) -> Weight {
        match self {
            WeightSet::B => Weight::Bool(value != 0),
            WeightSet::Z => Weight::Int(BigInt::from(value)),
            WeightSet::Q => Weight::Rat(Rational::from_integer(BigInt::from(value))),
            WeightSet::R => Weight::Real(value as f64),
            WeightSet::Zmin | WeightSet::Zmax => Weight::Tropical(Some(value)),
            WeightSet::Expressions(rs) => Weight::Exp(rs.lweight(&rs.context().weightset().from_int(value), &rs.one())),
        }
    }

    /// `w^n`.
    pub fn power(&self, value: &Weight, n: usize) -> Weight {
        let mut res = self.one();
        for _ in 0..n {
            res = self.mul(&res, value);
        }
        res
    }

    /// Whether `value` is a weight of this weightset.
    pub fn contains(&self, value: &Weight) -> bool {
        matches!(
            (self, value),
            (WeightSet::B, Weight::Bool(_))
                | (WeightSet::Z, Weight::Int(_))
                | (WeightSet::Q, Weight::Rat(_))
                | (WeightSet::R, Weight::Real(_))
                | (WeightSet::Zmin, Weight::Tropical(_))
                | (WeightSet::Zmax, Weight::Tropical(_))
                | (WeightSet::Expressions(_), Weight::Exp(_))
        )
    }
}

impl Semiring for WeightSet {
    type Value = Weight;

    fn zero(&self) -> Weight {
        match self {
            WeightSet::B => Weight::Bool(Boolean.zero()),
            WeightSet::Z => Weight::Int(Integers.zero()),
            WeightSet::Q => Weight::Rat(Rationals.zero()),
            WeightSet::R => Weight::Real(Reals.zero()),
            WeightSet::Zmin => Weight::Tropical(Tropical::MIN.zero()),
            WeightSet::Zmax => Weight::Tropical(Tropical::MAX.zero()),
            WeightSet::Expressions(rs) => Weight::Exp(rs.zero()),
        }
    }

    fn one(&self) -> Weight {
        match self {
            WeightSet::B => Weight::Bool(Boolean.one()),
            WeightSet::Z => Weight::Int(Integers.one()),
            WeightSet::Q => Weight::Rat(Rationals.one()),
            WeightSet::R => Weight::Real(Reals.one()),
            WeightSet::Zmin => Weight::Tropical(Tropical::MIN.one()),
            WeightSet::Zmax => Weight::Tropical(Tropical::MAX.one()),
            WeightSet::Expressions(rs) => Weight::Exp(rs.one()),
        }
    }

    fn add(&self, lhs: &Weight, rhs: &Weight) -> Weight {
        if let (WeightSet::Expressions(rs), Weight::Exp(a), Weight::Exp(b)) = (self, lhs, rhs) {
            return Weight::Exp(rs.add(a, b));
        }
        dispatch2!(self, lhs, rhs, |ws, a, b| ws.add(a, b), wrap_value)
    }

    fn mul(&self, lhs: &Weight, rhs: &Weight) -> Weight {
        if let (WeightSet::Expressions(rs), Weight::Exp(a), Weight::Exp(b)) = (self, lhs, rhs) {
            return Weight::Exp(rs.mul(a, b));
        }
        dispatch2!(self, lhs, rhs, |ws, a, b| ws.mul(a, b), wrap_value)
    }

    fn star(&self, value: &Weight) -> Result<Weight> {
        match (self, value) {
            (WeightSet::B, Weight::Bool(v)) => Boolean.star(v).map(Weight::Bool),
            (WeightSet::Z, Weight::Int(v)) => Integers.star(v).map(Weight::Int),
            (WeightSet::Q, Weight::Rat(v)) => Rationals.star(v).map(Weight::Rat),
            (WeightSet::R, Weight::Real(v)) => Reals.star(v).map(Weight::Real),
            (WeightSet::Zmin, Weight::Tropical(v)) => Tropical::MIN.star(v).map(Weight::Tropical),
            (WeightSet::Zmax, Weight::Tropical(v)) => Tropical::MAX.star(v).map(Weight::Tropical),
            (WeightSet::Expressions(rs), Weight::Exp(e)) => Ok(Weight::Exp(rs.star(e))),
            (ws, v) => Err(Error::incompatible(ws, format!("weight {}", v))),
        }
    }

    fn ldiv(&self, lhs: &Weight, rhs: &Weight) -> Option<Weight> {
        if let WeightSet::Expressions(_) = self {
            return None;
        }
        dispatch2!(self, lhs, rhs, |ws, a, b| ws.ldiv(a, b), wrap_option)
    }

    fn sub(&self, lhs: &Weight, rhs: &Weight) -> Option<Weight> {
        if let WeightSet::Expressions(_) = self {
            return None;
        }
        dispatch2!(self, lhs, rhs, |ws, a, b| ws.sub(a, b), wrap_option)
    }

    fn gcd(&self, lhs: &Weight, rhs: &Weight) -> Weight {
        if let WeightSet::Expressions(_) = self {
            return self.one();
        }
        dispatch2!(self, lhs, rhs, |ws, a, b| ws.gcd(a, b), wrap_value)
    }

    fn is_zero(&self, value: &Weight) -> bool {
        value.is_zero()
    }

    fn is_one(&self, value: &Weight) -> bool {
        value.is_one()
    }

    fn is_commutative(&self) -> bool {
        !matches!(self, WeightSet::Expressions(_))
    }

    fn parse(&self, text: &str) -> Result<Weight> {
        match self {
            WeightSet::B => Boolean.parse(text).map(Weight::Bool),
            WeightSet::Z => Integers.parse(text).map(Weight::Int),
            WeightSet::Q => Rationals.parse(text).map(Weight::Rat),
            WeightSet::R => Reals.parse(text).map(Weight::Real),
            WeightSet::Zmin => Tropical::MIN.parse(text).map(Weight::Tropical),
            WeightSet::Zmax => Tropical::MAX.parse(text).map(Weight::Tropical),
            WeightSet::Expressions(rs) => rs.parse(text).map(Weight::Exp),
        }
    }
}

impl fmt::Display for WeightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightSet::B => write!(f, "b"),
            WeightSet::Z => write!(f, "z"),
            WeightSet::Q => write!(f, "q"),
            WeightSet::R => write!(f, "r"),
            WeightSet::Zmin => write!(f, "zmin"),
            WeightSet::Zmax => write!(f, "zmax"),
            WeightSet::Expressions(rs) => write!(f, "expressionset<{}>", rs.context()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Weight {
        Weight::Int(BigInt::from(v))
    }

    fn rat(n: i64, d: i64) -> Weight {
        Weight::Rat(Rational::new(BigInt::from(n), BigInt::from(d)))
    }

    #[test]
    fn test_rational_normalization() {
        let q = Rational::new(BigInt::from(4), BigInt::from(-6));
        assert_eq!(q.numer(), &BigInt::from(-2));
        assert_eq!(q.denom(), &BigInt::from(3));
        assert_eq!(q.to_string(), "-2/3");
        assert_eq!(Rational::new(BigInt::from(0), BigInt::from(-5)).to_string(), "0");
    }

    #[test]
    fn test_boolean() {
        let ws = WeightSet::B;
        assert_eq!(ws.add(&Weight::Bool(true), &Weight::Bool(false)), Weight::Bool(true));
        assert_eq!(ws.mul(&Weight::Bool(true), &Weight::Bool(false)), Weight::Bool(false));
        assert_eq!(ws.star(&Weight::Bool(true)).unwrap(), Weight::Bool(true));
        assert_eq!(ws.parse("1").unwrap(), Weight::Bool(true));
        assert!(ws.parse("2").is_err());
    }

    #[test]
    fn test_integers() {
        let ws = WeightSet::Z;
        assert_eq!(ws.add(&int(2), &int(3)), int(5));
        assert_eq!(ws.mul(&int(2), &int(3)), int(6));
        assert_eq!(ws.star(&int(0)).unwrap(), int(1));
        assert!(matches!(ws.star(&int(-1)), Err(Error::NotStarable { .. })));
        assert_eq!(ws.ldiv(&int(2), &int(4)), Some(int(2)));
        assert_eq!(ws.ldiv(&int(2), &int(3)), None);
        assert_eq!(ws.ldiv(&int(0), &int(3)), None);
        assert_eq!(ws.gcd(&int(4), &int(6)), int(2));
        assert_eq!(ws.gcd(&int(-4), &int(6)), int(2));
        assert_eq!(ws.parse("-12").unwrap(), int(-12));
    }

    #[test]
    fn test_rationals() {
        let ws = WeightSet::Q;
        assert_eq!(ws.add(&rat(1, 2), &rat(1, 3)), rat(5, 6));
        assert_eq!(ws.star(&rat(1, 2)).unwrap(), rat(2, 1));
        assert_eq!(ws.star(&rat(-1, 2)).unwrap(), rat(2, 3));
        assert!(ws.star(&rat(1, 1)).is_err());
        assert_eq!(ws.parse("3/6").unwrap(), rat(1, 2));
        assert_eq!(ws.parse("2/-4").unwrap(), rat(-1, 2));
        assert!(ws.parse("1/0").is_err());
        assert_eq!(ws.ldiv(&rat(2, 1), &rat(1, 1)), Some(rat(1, 2)));
        assert_eq!(rat(3, 2).to_string(), "3/2");
    }

    #[test]
    fn test_reals() {
        let ws = WeightSet::R;
        assert_eq!(ws.star(&Weight::Real(0.5)).unwrap(), Weight::Real(2.0));
        assert!(ws.star(&Weight::Real(-1.0)).is_err());
        assert_eq!(ws.parse(".5").unwrap(), Weight::Real(0.5));
        assert_eq!(Weight::Real(2.0).to_string(), "2");
        assert_eq!(Weight::Real(-0.0), Weight::Real(0.0));
        assert_eq!(Weight::Real(-0.0).cmp(&Weight::Real(0.0)), Ordering::Equal);
        let hash = |w: &Weight| {
            use std::collections::hash_map::DefaultHasher;
            let mut h = DefaultHasher::new();
            w.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&Weight::Real(-0.0)), hash(&Weight::Real(0.0)));
        assert!(Weight::Real(-1.0) < Weight::Real(-0.0));
    }

    #[test]
    fn test_tropical() {
        let min = WeightSet::Zmin;
        let w = |v| Weight::Tropical(Some(v));
        assert_eq!(min.add(&w(3), &w(-1)), w(-1));
        assert_eq!(min.mul(&w(3), &w(-1)), w(2));
        assert_eq!(min.add(&min.zero(), &w(4)), w(4));
        assert!(min.mul(&min.zero(), &w(4)).is_zero());
        assert_eq!(min.star(&w(2)).unwrap(), w(0));
        assert!(min.star(&w(-3)).is_err());

        let max = WeightSet::Zmax;
        assert_eq!(max.add(&w(3), &w(-1)), w(3));
        assert!(max.star(&w(1)).is_err());
        assert_eq!(max.star(&w(-1)).unwrap(), w(0));
        assert_eq!(min.parse("oo").unwrap(), min.zero());
    }

    #[test]
    fn test_expressions_from_int() {
        let ctx = crate::context::Context::parse("lal_char(ab), expressionset<lal_char(xy), q>").unwrap();
        let ws = ctx.weightset();
        assert_eq!(ws.from_int(3), ws.parse("<3>\\e").unwrap());
        assert_eq!(ws.from_int(1), ws.one());
        assert_eq!(ws.from_int(0), ws.zero());
    }

    #[test]
    fn test_join() {
        assert_eq!(WeightSet::B.join(&WeightSet::Q), Some(WeightSet::Q));
        assert_eq!(WeightSet::R.join(&WeightSet::Z), Some(WeightSet::R));
        assert_eq!(WeightSet::Zmin.join(&WeightSet::Z), None);
        assert!(WeightSet::Z.embeds_into(&WeightSet::Q));
        assert!(!WeightSet::Q.embeds_into(&WeightSet::Z));
    }

    #[test]
    fn test_power() {
        assert_eq!(WeightSet::Z.power(&int(3), 3), int(27));
        assert_eq!(WeightSet::Z.power(&int(3), 0), int(1));
    }
}
