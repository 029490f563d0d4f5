// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::DecimalError;

mod column;
pub use column::{DecimalArray, DecimalArrayBuilder};

/// Default ceiling on total decimal digits. Deployments inject their own
/// ceiling through `EngineConfig::max_numeric_precision`.
pub const DEFAULT_MAX_NUMERIC_PRECISION: u32 = 1024;

/// Fixed-point shape: `precision` total significant digits, `scale` of them
/// after the decimal point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecimalShape {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalShape {
    pub fn validate(&self) -> Result<(), DecimalError> {
        if self.scale > self.precision {
            return Err(DecimalError::InvalidShape {
                precision: self.precision,
                scale: self.scale,
            });
        }
        Ok(())
    }

    pub fn validate_against(&self, max_precision: u32) -> Result<(), DecimalError> {
        self.validate()?;
        if self.precision < 1 || self.precision > max_precision {
            return Err(DecimalError::PrecisionOutOfRange {
                precision: self.precision,
                max_precision,
            });
        }
        Ok(())
    }

    /// Componentwise widening of two shapes. Never narrows either input.
    pub fn reconcile_max(self, other: DecimalShape) -> DecimalShape {
        DecimalShape {
            precision: self.precision.max(other.precision),
            scale: self.scale.max(other.scale),
        }
    }
}

impl fmt::Display for DecimalShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decimal({}, {})", self.precision, self.scale)
    }
}

/// Compute 10^exp as an unscaled coefficient factor.
pub fn pow10(exp: u32) -> BigInt {
    BigInt::from(10).pow(exp)
}

/// Number of decimal digits in the magnitude of `value`; zero counts as one digit.
pub fn digits10(value: &BigInt) -> u32 {
    if value.is_zero() {
        return 1;
    }
    value.magnitude().to_str_radix(10).len() as u32
}

/// Number of decimal digits needed to represent `value`.
/// For example:
///   1     -> 1
///   10    -> 2
///   12345 -> 5
/// Returns 0 for 0; callers exclude that case before asking.
pub fn digits10_u64(mut value: u64) -> u32 {
    let mut digits = 0;
    while value > 0 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// Integer division with ROUND_HALF_UP: ties carry away from zero.
pub fn div_round(dividend: &BigInt, divisor: &BigInt) -> BigInt {
    debug_assert!(!divisor.is_zero());

    let mut q = dividend / divisor;
    let r = dividend % divisor;

    if r.is_zero() {
        return q;
    }

    // case 1: |b| is odd. if [|b|/2] < |r|, then add carry; otherwise add 0.
    // case 2: |b| is even. if [|b|/2] <= |r|, then add carry; otherwise add 0.
    // carry depends on sign of a^b.
    let abs_b = divisor.abs();
    let abs_r = r.abs();
    let threshold = (&abs_b + BigInt::one()) / BigInt::from(2);

    if abs_r.cmp(&threshold) != Ordering::Less {
        let carry = if dividend.is_negative() != divisor.is_negative() {
            -BigInt::one()
        } else {
            BigInt::one()
        };
        q += carry;
    }

    q
}

/// Change the scale of an unscaled coefficient without losing information.
/// Scaling down that would drop non-zero digits is an error, never a
/// silent truncation.
pub fn rescale(unscaled: &BigInt, from_scale: u32, to_scale: u32) -> Result<BigInt, DecimalError> {
    match to_scale.cmp(&from_scale) {
        Ordering::Equal => Ok(unscaled.clone()),
        Ordering::Greater => Ok(unscaled * pow10(to_scale - from_scale)),
        Ordering::Less => {
            let factor = pow10(from_scale - to_scale);
            if (unscaled % &factor).is_zero() {
                Ok(unscaled / &factor)
            } else {
                Err(DecimalError::InexactRescale {
                    from: from_scale,
                    to: to_scale,
                })
            }
        }
    }
}

/// Render an unscaled coefficient at the given scale as `-12.34` text.
pub fn format_decimal(unscaled: &BigInt, scale: u32) -> String {
    if scale == 0 {
        return unscaled.to_string();
    }

    let unscaled_str = unscaled.magnitude().to_str_radix(10);
    let scale_usize = scale as usize;

    if unscaled_str.len() <= scale_usize {
        let padded = format!("{:0>width$}", unscaled_str, width = scale_usize);
        if unscaled.is_negative() {
            format!("-0.{}", padded)
        } else {
            format!("0.{}", padded)
        }
    } else {
        let split_pos = unscaled_str.len() - scale_usize;
        let integer_part = &unscaled_str[..split_pos];
        let fractional_part = &unscaled_str[split_pos..];
        if unscaled.is_negative() {
            format!("-{}.{}", integer_part, fractional_part)
        } else {
            format!("{}.{}", integer_part, fractional_part)
        }
    }
}

/// Parse `-12.34` text into an unscaled coefficient at the given scale.
/// Fractional digits beyond the scale must be zero; the parse is exact.
pub fn parse_decimal(text: &str, scale: u32) -> Result<BigInt, DecimalError> {
    let invalid = |reason: &str| DecimalError::InvalidLiteral {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid("unexpected character"));
    }

    let scale_usize = scale as usize;
    let (kept, dropped) = if frac_part.len() > scale_usize {
        frac_part.split_at(scale_usize)
    } else {
        (frac_part, "")
    };
    if dropped.bytes().any(|b| b != b'0') {
        return Err(invalid("more fractional digits than the scale holds"));
    }

    let mut digits = String::with_capacity(int_part.len() + scale_usize);
    digits.push_str(int_part);
    digits.push_str(kept);
    for _ in kept.len()..scale_usize {
        digits.push('0');
    }
    if digits.is_empty() {
        digits.push('0');
    }

    let mut value = digits
        .parse::<BigInt>()
        .map_err(|_| invalid("unparsable digits"))?;
    if negative {
        value = -value;
    }
    Ok(value)
}

/// A single fixed-point value: unscaled coefficient plus shape. Construction
/// checks the coefficient fits the shape's precision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
    unscaled: BigInt,
    shape: DecimalShape,
}

impl Decimal {
    pub fn try_new(unscaled: BigInt, shape: DecimalShape) -> Result<Self, DecimalError> {
        shape.validate()?;
        let digits = digits10(&unscaled);
        if digits > shape.precision {
            return Err(DecimalError::ValueOutOfRange {
                digits,
                precision: shape.precision,
                scale: shape.scale,
            });
        }
        Ok(Self { unscaled, shape })
    }

    pub fn from_str_exact(text: &str, shape: DecimalShape) -> Result<Self, DecimalError> {
        let unscaled = parse_decimal(text, shape.scale)?;
        Self::try_new(unscaled, shape)
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn shape(&self) -> DecimalShape {
        self.shape
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(&self.unscaled, self.shape.scale))
    }
}
