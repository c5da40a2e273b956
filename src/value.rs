//! Three-valued and five-valued logic algebras
//!
//! `Value3` is used by the event-driven simulator. `Value5` adds the
//! discrepancy symbols D and D̄ used by PODEM, the D-algorithm and DFS.

use std::fmt;
use std::ops::Not;

/// A value in the three-valued algebra {0, 1, X}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Value3 {
    /// Logic zero
    Zero,
    /// Logic one
    One,
    /// Unknown
    #[default]
    X,
}

impl Value3 {
    /// Build a Value3 from a boolean
    pub fn from_bool(b: bool) -> Self {
        if b {
            Value3::One
        } else {
            Value3::Zero
        }
    }

    /// Returns the boolean value, if known
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value3::Zero => Some(false),
            Value3::One => Some(true),
            Value3::X => None,
        }
    }

    fn and2(a: Value3, b: Value3) -> Value3 {
        use Value3::*;
        match (a, b) {
            (Zero, _) | (_, Zero) => Zero,
            (X, _) | (_, X) => X,
            (One, One) => One,
        }
    }

    fn or2(a: Value3, b: Value3) -> Value3 {
        use Value3::*;
        match (a, b) {
            (One, _) | (_, One) => One,
            (X, _) | (_, X) => X,
            (Zero, Zero) => Zero,
        }
    }

    fn xor2(a: Value3, b: Value3) -> Value3 {
        use Value3::*;
        match (a, b) {
            (X, _) | (_, X) => X,
            (a, b) => Value3::from_bool(a.as_bool().unwrap() != b.as_bool().unwrap()),
        }
    }

    /// Fold AND across an arbitrary number of fanins
    pub fn and(vals: impl IntoIterator<Item = Value3>) -> Value3 {
        vals.into_iter().fold(Value3::One, Value3::and2)
    }

    /// Fold OR across an arbitrary number of fanins
    pub fn or(vals: impl IntoIterator<Item = Value3>) -> Value3 {
        vals.into_iter().fold(Value3::Zero, Value3::or2)
    }

    /// Fold XOR across an arbitrary number of fanins
    pub fn xor(vals: impl IntoIterator<Item = Value3>) -> Value3 {
        vals.into_iter().fold(Value3::Zero, Value3::xor2)
    }
}

impl Not for Value3 {
    type Output = Value3;
    fn not(self) -> Value3 {
        match self {
            Value3::Zero => Value3::One,
            Value3::One => Value3::Zero,
            Value3::X => Value3::X,
        }
    }
}

impl fmt::Display for Value3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value3::Zero => write!(f, "0"),
            Value3::One => write!(f, "1"),
            Value3::X => write!(f, "X"),
        }
    }
}

/// A value in the five-valued algebra {0, 1, X, D, D̄} used for fault propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Value5 {
    /// Logic zero in both good and faulty circuit
    Zero,
    /// Logic one in both good and faulty circuit
    One,
    /// Unknown
    #[default]
    X,
    /// 1 in the good circuit, 0 in the faulty circuit
    D,
    /// 0 in the good circuit, 1 in the faulty circuit
    DBar,
}

impl Value5 {
    /// Good-circuit projection: D behaves as 1, D̄ as 0
    pub fn good(&self) -> Option<bool> {
        match self {
            Value5::Zero | Value5::DBar => Some(false),
            Value5::One | Value5::D => Some(true),
            Value5::X => None,
        }
    }

    /// Faulty-circuit projection: D behaves as 0, D̄ as 1
    pub fn faulty(&self) -> Option<bool> {
        match self {
            Value5::Zero | Value5::D => Some(false),
            Value5::One | Value5::DBar => Some(true),
            Value5::X => None,
        }
    }

    /// True for D or D̄, a node that currently exhibits a discrepancy
    pub fn is_discrepancy(&self) -> bool {
        matches!(self, Value5::D | Value5::DBar)
    }

    fn from_projections(good: bool, faulty: bool) -> Value5 {
        match (good, faulty) {
            (false, false) => Value5::Zero,
            (true, true) => Value5::One,
            (true, false) => Value5::D,
            (false, true) => Value5::DBar,
        }
    }

    /// AND of two five-valued inputs (controlling value 0)
    pub fn and2(a: Value5, b: Value5) -> Value5 {
        Value5::controlling2(a, b, false, false)
    }

    /// OR of two five-valued inputs (controlling value 1)
    pub fn or2(a: Value5, b: Value5) -> Value5 {
        Value5::controlling2(a, b, true, false)
    }

    /// NAND of two five-valued inputs
    pub fn nand2(a: Value5, b: Value5) -> Value5 {
        Value5::controlling2(a, b, false, true)
    }

    /// NOR of two five-valued inputs
    pub fn nor2(a: Value5, b: Value5) -> Value5 {
        Value5::controlling2(a, b, true, true)
    }

    /// Generic controlling-value gate evaluation, folded pairwise.
    ///
    /// `control` is the controlling input value (false for AND/NAND, true for OR/NOR);
    /// `invert` negates the whole output (true for NAND/NOR).
    fn controlling2(a: Value5, b: Value5, control: bool, invert: bool) -> Value5 {
        Value5::controlling(std::iter::once(a).chain(std::iter::once(b)), control, invert)
    }

    /// Fold a controlling-value gate (AND/OR/NAND/NOR) across any number of fanins
    pub fn controlling(vals: impl IntoIterator<Item = Value5>, control: bool, invert: bool) -> Value5 {
        let mut saw_x = false;
        let mut any_d = false;
        let mut any_dbar = false;
        for v in vals {
            match v {
                Value5::X => saw_x = true,
                _ => {
                    if v.good() == Some(control) && v.faulty() == Some(control) {
                        // a concrete input at the controlling value forces the output
                        return Value5::from_bool(control != invert);
                    }
                    if v == Value5::D {
                        any_d = true;
                    } else if v == Value5::DBar {
                        any_dbar = true;
                    }
                }
            }
        }
        if any_d && any_dbar {
            // one input forces the controlling value in the faulty circuit and the
            // other in the good circuit: the output is masked to the controlling value
            return Value5::from_bool(control != invert);
        }
        if saw_x {
            return Value5::X;
        }
        if any_d {
            return if invert { Value5::DBar } else { Value5::D };
        }
        if any_dbar {
            return if invert { Value5::D } else { Value5::DBar };
        }
        // every input was concrete and equal to the non-controlling value
        Value5::from_bool(control == invert)
    }

    /// Fold XOR across any number of five-valued fanins
    pub fn xor(vals: impl IntoIterator<Item = Value5>) -> Value5 {
        let mut good_ones = 0usize;
        let mut faulty_ones = 0usize;
        for v in vals {
            match (v.good(), v.faulty()) {
                (Some(g), Some(fl)) => {
                    if g {
                        good_ones += 1;
                    }
                    if fl {
                        faulty_ones += 1;
                    }
                }
                _ => return Value5::X,
            }
        }
        Value5::from_projections(good_ones % 2 == 1, faulty_ones % 2 == 1)
    }
}

impl Not for Value5 {
    type Output = Value5;
    fn not(self) -> Value5 {
        match self {
            Value5::Zero => Value5::One,
            Value5::One => Value5::Zero,
            Value5::X => Value5::X,
            Value5::D => Value5::DBar,
            Value5::DBar => Value5::D,
        }
    }
}

impl fmt::Display for Value5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value5::Zero => write!(f, "0"),
            Value5::One => write!(f, "1"),
            Value5::X => write!(f, "X"),
            Value5::D => write!(f, "D"),
            Value5::DBar => write!(f, "D'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value3_and_or_xor() {
        assert_eq!(Value3::and([Value3::One, Value3::One]), Value3::One);
        assert_eq!(Value3::and([Value3::One, Value3::Zero]), Value3::Zero);
        assert_eq!(Value3::and([Value3::One, Value3::X]), Value3::X);
        assert_eq!(Value3::or([Value3::Zero, Value3::X]), Value3::X);
        assert_eq!(Value3::or([Value3::One, Value3::X]), Value3::One);
        assert_eq!(Value3::xor([Value3::One, Value3::One]), Value3::Zero);
        assert_eq!(Value3::xor([Value3::One, Value3::Zero]), Value3::One);
    }

    #[test]
    fn test_value3_not() {
        assert_eq!(!Value3::Zero, Value3::One);
        assert_eq!(!Value3::X, Value3::X);
    }

    #[test]
    fn test_value5_and_propagates_d() {
        // AND: any 0 forces 0, D propagates through a 1
        assert_eq!(Value5::and2(Value5::D, Value5::One), Value5::D);
        assert_eq!(Value5::and2(Value5::D, Value5::Zero), Value5::Zero);
        assert_eq!(Value5::and2(Value5::D, Value5::X), Value5::X);
    }

    #[test]
    fn test_value5_and_masks_on_dbar() {
        // A DBar (0/1) input on AND forces the output to 0 regardless of a D
        assert_eq!(Value5::and2(Value5::D, Value5::DBar), Value5::Zero);
    }

    #[test]
    fn test_value5_nand_inverts() {
        assert_eq!(Value5::nand2(Value5::D, Value5::One), Value5::DBar);
    }

    #[test]
    fn test_value5_xor_parity() {
        // D (1/0) xor D (1/0): good = 1^1=0, faulty = 0^0=0 -> Zero
        assert_eq!(Value5::xor([Value5::D, Value5::D]), Value5::Zero);
        // D xor DBar: good=1^0=1, faulty=0^1=1 -> One
        assert_eq!(Value5::xor([Value5::D, Value5::DBar]), Value5::One);
        // D xor One: good=1^1=0, faulty=0^1=1 -> DBar
        assert_eq!(Value5::xor([Value5::D, Value5::One]), Value5::DBar);
    }

    #[test]
    fn test_value5_not() {
        assert_eq!(!Value5::D, Value5::DBar);
        assert_eq!(!Value5::X, Value5::X);
    }
}
