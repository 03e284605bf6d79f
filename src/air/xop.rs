// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Operator tags for `apply_operator`/`apply_operator_bi32` (§6).

use crate::error::RuntimeError;
use crate::value::Value;

/// Unary/binary/ternary operator tag. Lowering and execution must agree on
/// this encoding — it is what travels through `Uparam`'s byte view in
/// `apply_operator`'s solidified form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Xop {
    Pos,
    Neg,
    Notb,
    Notl,
    Inc,
    Dec,
    Unset,
    Countof,
    Typeof,
    Sqrt,
    Isnan,
    Isinf,
    Abs,
    Sign,
    Round,
    Floor,
    Ceil,
    Trunc,
    Iround,
    Ifloor,
    Iceil,
    Itrunc,
    Random,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Andb,
    Orb,
    Xorb,
    Sll,
    Sla,
    Srl,
    Sra,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpGt,
    CmpLte,
    CmpGte,
    Cmp3way,
    Assign,
    Fma,
}

impl Xop {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_u8(b: u8) -> Option<Self> {
        use Xop::*;
        const TABLE: [Xop; 44] = [
            Pos, Neg, Notb, Notl, Inc, Dec, Unset, Countof, Typeof, Sqrt, Isnan, Isinf, Abs, Sign,
            Round, Floor, Ceil, Trunc, Iround, Ifloor, Iceil, Itrunc, Random, Add, Sub, Mul, Div,
            Mod, Andb, Orb, Xorb, Sll, Sla, Srl, Sra, CmpEq, CmpNe, CmpLt, CmpGt, CmpLte, CmpGte,
            Cmp3way, Assign, Fma,
        ];
        if (b as usize) < TABLE.len() {
            Some(TABLE[b as usize])
        } else {
            None
        }
    }

    #[must_use]
    pub const fn arity(self) -> u8 {
        use Xop::*;
        match self {
            Pos | Neg | Notb | Notl | Inc | Dec | Unset | Countof | Typeof | Sqrt | Isnan
            | Isinf | Abs | Sign | Round | Floor | Ceil | Trunc | Iround | Ifloor | Iceil
            | Itrunc | Random => 1,
            Fma => 3,
            _ => 2,
        }
    }
}

/// Apply a binary numeric/comparison operator to two already-evaluated
/// values. Full operator semantics belong to the (out-of-scope) value
/// model; this implements only the arithmetic/comparison subset the
/// executor itself needs to dispatch correctly for `apply_operator_bi32`'s
/// integer fast path and for driving control-flow comparisons in tests.
pub fn apply_binary(op: Xop, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let (Value::Integer(a), Value::Integer(b)) = (lhs, rhs) else {
        return Err(RuntimeError::new(
            format!("operator {op:?} requires integer operands"),
            Value::Null,
        ));
    };
    let result = match op {
        Xop::Add => Value::Integer(a.wrapping_add(*b)),
        Xop::Sub => Value::Integer(a.wrapping_sub(*b)),
        Xop::Mul => Value::Integer(a.wrapping_mul(*b)),
        Xop::Div => {
            if *b == 0 {
                return Err(RuntimeError::new("division by zero", Value::Null));
            }
            Value::Integer(a / b)
        }
        Xop::Mod => {
            if *b == 0 {
                return Err(RuntimeError::new("division by zero", Value::Null));
            }
            Value::Integer(a % b)
        }
        Xop::Andb => Value::Integer(a & b),
        Xop::Orb => Value::Integer(a | b),
        Xop::Xorb => Value::Integer(a ^ b),
        Xop::CmpEq => Value::Boolean(a == b),
        Xop::CmpNe => Value::Boolean(a != b),
        Xop::CmpLt => Value::Boolean(a < b),
        Xop::CmpGt => Value::Boolean(a > b),
        Xop::CmpLte => Value::Boolean(a <= b),
        Xop::CmpGte => Value::Boolean(a >= b),
        Xop::Cmp3way => Value::Integer(i64::from(match a.cmp(b) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        })),
        other => {
            return Err(RuntimeError::new(
                format!("operator {other:?} is not supported on integers"),
                Value::Null,
            ));
        }
    };
    Ok(result)
}

#[cfg(test)]
mod xop_test {
    use super::*;

    #[test]
    fn round_trip_through_byte() {
        for b in 0..44u8 {
            let op = Xop::from_u8(b).unwrap();
            assert_eq!(op.as_u8(), b);
        }
    }

    #[test]
    fn out_of_range_byte_rejected() {
        assert!(Xop::from_u8(200).is_none());
    }

    #[test]
    fn add_wraps() {
        let r = apply_binary(Xop::Add, &Value::Integer(1), &Value::Integer(2)).unwrap();
        assert!(matches!(r, Value::Integer(3)));
    }

    #[test]
    fn div_by_zero_errors() {
        assert!(apply_binary(Xop::Div, &Value::Integer(1), &Value::Integer(0)).is_err());
    }
}
