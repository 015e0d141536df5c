//! Integers with an explicit small/long distinction
//!
//! `Small` holds anything in the signed 32-bit range. `Long` is arbitrary
//! precision and sticky: once an operand is long the result stays long,
//! whatever its magnitude. Results of operations on two small operands are
//! narrowed back to `Small` when they fit.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use super::value::Exception;

/// Largest magnitude, in bits, that shifts and powers may produce
pub const MAX_BITS: u64 = 1 << 24;

/// Guest integer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Int {
    Small(i32),
    Long(BigInt),
}

impl Int {
    /// `Small` when the value fits in 32 bits, `Long` otherwise
    pub fn narrow(value: BigInt) -> Int {
        match value.to_i32() {
            Some(n) => Int::Small(n),
            None => Int::Long(value),
        }
    }

    fn from_i64(value: i64) -> Int {
        match i32::try_from(value) {
            Ok(n) => Int::Small(n),
            Err(_) => Int::Long(BigInt::from(value)),
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Int::Long(_))
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Int::Small(n) => BigInt::from(*n),
            Int::Long(n) => n.clone(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Int::Small(n) => Some(i64::from(*n)),
            Int::Long(n) => n.to_i64(),
        }
    }

    /// Value as an index or slice bound, saturating at the i64 range
    pub fn to_index(&self) -> i64 {
        self.to_i64().unwrap_or(if self.is_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Int::Small(n) => *n == 0,
            Int::Long(n) => n.is_zero(),
        }
    }

    /// Bits needed for the magnitude
    pub fn bits(&self) -> u64 {
        match self {
            Int::Small(n) => u64::from(32 - n.unsigned_abs().leading_zeros()),
            Int::Long(n) => n.bits(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Int::Small(n) => *n < 0,
            Int::Long(n) => n.is_negative(),
        }
    }

    /// Numeric comparison, ignoring longness
    pub fn cmp_value(&self, other: &Int) -> Ordering {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => a.cmp(b),
            _ => self.to_bigint().cmp(&other.to_bigint()),
        }
    }

    pub fn add(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::from_i64(i64::from(*a) + i64::from(*b)),
            _ => Int::Long(self.to_bigint() + other.to_bigint()),
        }
    }

    pub fn sub(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::from_i64(i64::from(*a) - i64::from(*b)),
            _ => Int::Long(self.to_bigint() - other.to_bigint()),
        }
    }

    pub fn mul(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::from_i64(i64::from(*a) * i64::from(*b)),
            _ => Int::Long(self.to_bigint() * other.to_bigint()),
        }
    }

    /// Floor division: the quotient rounds toward negative infinity
    pub fn div(&self, other: &Int) -> Result<Int, Exception> {
        if other.is_zero() {
            return Err(Exception::zero_division("integer division or modulo"));
        }
        Ok(match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::from_i64(Integer::div_floor(&i64::from(*a), &i64::from(*b))),
            _ => Int::Long(Integer::div_floor(&self.to_bigint(), &other.to_bigint())),
        })
    }

    /// Floor modulo: the result has the sign of the divisor
    pub fn rem(&self, other: &Int) -> Result<Int, Exception> {
        if other.is_zero() {
            return Err(Exception::zero_division("integer division or modulo"));
        }
        Ok(match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::from_i64(Integer::mod_floor(&i64::from(*a), &i64::from(*b))),
            _ => Int::Long(Integer::mod_floor(&self.to_bigint(), &other.to_bigint())),
        })
    }

    pub fn pow(&self, other: &Int) -> Result<Int, Exception> {
        if other.is_negative() {
            return Err(Exception::value_error("integer to the negative power"));
        }
        let exponent = other
            .to_i64()
            .and_then(|e| u32::try_from(e).ok())
            .ok_or_else(|| Exception::overflow_error("exponent too large"))?;
        let base_bits = self.bits();
        if base_bits > 1 && (base_bits - 1).saturating_mul(u64::from(exponent)) > MAX_BITS {
            return Err(Exception::overflow_error("integer power result too large"));
        }
        let result = self.to_bigint().pow(exponent);
        Ok(if self.is_long() || other.is_long() {
            Int::Long(result)
        } else {
            Int::narrow(result)
        })
    }

    pub fn shl(&self, other: &Int) -> Result<Int, Exception> {
        let count = shift_count(other)?;
        if self.is_zero() {
            return Ok(self.clone().sticky(other));
        }
        if self.bits().saturating_add(count as u64) > MAX_BITS {
            return Err(Exception::overflow_error("left shift result too large"));
        }
        Ok(match self {
            Int::Small(a) if count <= 32 => Int::from_i64(i64::from(*a) << count),
            Int::Small(a) => Int::narrow(BigInt::from(*a) << count),
            Int::Long(a) => Int::Long(a << count),
        }
        .sticky(other))
    }

    /// Arithmetic shift; negative values round toward negative infinity
    pub fn shr(&self, other: &Int) -> Result<Int, Exception> {
        let count = shift_count(other)?;
        Ok(match self {
            Int::Small(a) => Int::Small(a >> count.min(31)),
            Int::Long(a) => Int::Long(a >> count),
        }
        .sticky(other))
    }

    pub fn bitand(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::Small(a & b),
            _ => Int::Long(self.to_bigint() & other.to_bigint()),
        }
    }

    pub fn bitor(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::Small(a | b),
            _ => Int::Long(self.to_bigint() | other.to_bigint()),
        }
    }

    pub fn bitxor(&self, other: &Int) -> Int {
        match (self, other) {
            (Int::Small(a), Int::Small(b)) => Int::Small(a ^ b),
            _ => Int::Long(self.to_bigint() ^ other.to_bigint()),
        }
    }

    /// Negation; the most negative small integer promotes
    pub fn neg(&self) -> Int {
        match self {
            Int::Small(n) => match n.checked_neg() {
                Some(m) => Int::Small(m),
                None => Int::Long(-BigInt::from(*n)),
            },
            Int::Long(n) => Int::Long(-n),
        }
    }

    pub fn abs(&self) -> Int {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    /// `~x == -x - 1`, keeping the operand's kind
    pub fn invert(&self) -> Int {
        match self {
            Int::Small(n) => Int::Small(!n),
            Int::Long(n) => Int::Long(-n - 1),
        }
    }

    /// Promote to long if `other` is long
    fn sticky(self, other: &Int) -> Int {
        match self {
            Int::Small(n) if other.is_long() => Int::Long(BigInt::from(n)),
            int => int,
        }
    }
}

fn shift_count(count: &Int) -> Result<usize, Exception> {
    if count.is_negative() {
        return Err(Exception::value_error("negative shift count"));
    }
    count
        .to_i64()
        .and_then(|c| usize::try_from(c).ok())
        .ok_or_else(|| Exception::overflow_error("shift count too large"))
}

impl From<i32> for Int {
    fn from(n: i32) -> Self {
        Int::Small(n)
    }
}

impl From<i64> for Int {
    fn from(n: i64) -> Self {
        Int::from_i64(n)
    }
}

impl From<usize> for Int {
    fn from(n: usize) -> Self {
        match i32::try_from(n) {
            Ok(n) => Int::Small(n),
            Err(_) => Int::Long(BigInt::from(n)),
        }
    }
}

/// Decimal digits, with an `L` suffix for long integers
impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int::Small(n) => write!(f, "{}", n),
            Int::Long(n) => write!(f, "{}L", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(n: i64) -> Int {
        Int::Long(BigInt::from(n))
    }

    #[test]
    fn test_add_promotes_on_overflow() {
        assert_eq!(Int::Small(i32::MAX).add(&Int::Small(1)), long(2147483648));
        assert_eq!(Int::Small(i32::MIN).sub(&Int::Small(1)), long(-2147483649));
        assert_eq!(Int::Small(i32::MIN).add(&Int::Small(1)), Int::Small(-2147483647));
    }

    #[test]
    fn test_long_is_sticky() {
        assert_eq!(long(1).sub(&Int::Small(2)), long(-1));
        assert_eq!(Int::Small(1).add(&long(2)), long(3));
        assert_eq!(Int::Small(1).shl(&long(2)).unwrap(), long(4));
    }

    #[test]
    fn test_floor_division() {
        let q = |a: i32, b: i32| Int::Small(a).div(&Int::Small(b)).unwrap();
        let r = |a: i32, b: i32| Int::Small(a).rem(&Int::Small(b)).unwrap();
        assert_eq!(q(-1, 3), Int::Small(-1));
        assert_eq!(r(-1, 3), Int::Small(2));
        assert_eq!(q(1, -3), Int::Small(-1));
        assert_eq!(r(1, -3), Int::Small(-2));
        assert_eq!(Int::Small(i32::MIN).div(&Int::Small(-1)).unwrap(), long(2147483648));
    }

    #[test]
    fn test_division_by_zero() {
        let err = Int::Small(1).div(&Int::Small(0)).unwrap_err();
        assert_eq!(&*err.kind, "ZeroDivisionError");
        assert!(long(1).rem(&long(0)).is_err());
    }

    #[test]
    fn test_shifts() {
        assert_eq!(Int::Small(1).shl(&Int::Small(10)).unwrap(), Int::Small(1024));
        assert!(Int::Small(1).shl(&Int::Small(100)).unwrap().is_long());
        assert_eq!(Int::Small(-256).shr(&Int::Small(40)).unwrap(), Int::Small(-1));
        let err = Int::Small(1).shl(&Int::Small(-1)).unwrap_err();
        assert_eq!(&*err.kind, "ValueError");
    }

    #[test]
    fn test_result_size_caps() {
        let err = Int::Small(1).shl(&long(100_000_000)).unwrap_err();
        assert_eq!(&*err.kind, "OverflowError");
        assert_eq!(Int::Small(0).shl(&long(100_000_000)).unwrap(), long(0));

        let err = Int::Small(2).pow(&Int::Small(100_000_000)).unwrap_err();
        assert_eq!(&*err.kind, "OverflowError");
        assert_eq!(Int::Small(-1).pow(&Int::Small(100_000_001)).unwrap(), Int::Small(-1));
        assert_eq!(Int::Small(2).pow(&Int::Small(100)).unwrap().bits(), 101);
    }

    #[test]
    fn test_unary() {
        assert_eq!(Int::Small(i32::MIN).neg(), long(2147483648));
        assert_eq!(Int::Small(3).invert(), Int::Small(-4));
        assert_eq!(long(3).invert(), long(-4));
        assert_eq!(Int::Small(-5).abs(), Int::Small(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Int::Small(-7).to_string(), "-7");
        assert_eq!(long(42).to_string(), "42L");
    }
}
