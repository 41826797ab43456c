//! EQUAL/NOT_EQUAL/GREATER_THAN[_EQUAL]/AND/OR/BW_AND/BW_OR/BANG.
//!
//! `AND`/`OR` are strict — both operands are always popped, never
//! short-circuited. Surface-level short-circuit is the compiler's job
//! (lowered to conditional jumps before this bytecode exists); this VM must
//! not "optimize" these opcodes. `BW_AND`/`BW_OR` dispatch to the same
//! `op_and`/`op_or` handlers — unlike the rest of the bitwise family, they
//! are non-trapping aliases of the logical opcodes rather than reserved
//! slots.

use super::error::VmResult;
use super::Vm;
use crate::value::Value;

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

impl Vm {
    pub(super) fn op_and(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(Value::parse_bool(left.is_truthy() && right.is_truthy()))
    }

    pub(super) fn op_or(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(Value::parse_bool(left.is_truthy() || right.is_truthy()))
    }

    /// Unknown-type pairs push `FALSE` — per the chosen resolution of the
    /// source's `NOT_EQUAL` asymmetry bug, `op_not_equal` does not share
    /// this helper's fallback.
    fn values_equal(left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                numeric(left) == numeric(right)
            }
            (Value::Str(l), Value::Str(r)) => l.length == r.length && l.bytes == r.bytes,
            _ => false,
        }
    }

    pub(super) fn op_equal(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(Value::parse_bool(Self::values_equal(&left, &right)))
    }

    /// `NOT_EQUAL` on an unknown-type pair pushes `TRUE`, the complement of
    /// `EQUAL`'s `FALSE` on the same pair, so the two opcodes never agree on
    /// an incomparable pair.
    pub(super) fn op_not_equal(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let known_pair = matches!(
            (&left, &right),
            (Value::Boolean(_), Value::Boolean(_))
                | (Value::Null, Value::Null)
                | (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_))
                | (Value::Str(_), Value::Str(_))
        );
        let result = if known_pair {
            !Self::values_equal(&left, &right)
        } else {
            true
        };
        self.push(Value::parse_bool(result))
    }

    pub(super) fn op_greater_than(&mut self) -> VmResult<()> {
        self.compare("GREATER_THAN", |o| o == std::cmp::Ordering::Greater)
    }

    pub(super) fn op_greater_than_equal(&mut self) -> VmResult<()> {
        self.compare("GREATER_THAN_EQUAL", |o| o != std::cmp::Ordering::Less)
    }

    fn compare(&mut self, op: &'static str, accept: impl Fn(std::cmp::Ordering) -> bool) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let ordering = match (&left, &right) {
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                numeric(&left).unwrap().partial_cmp(&numeric(&right).unwrap())
            }
            (Value::Str(l), Value::Str(r)) => Some(l.bytes.cmp(&r.bytes)),
            _ => None,
        };
        match ordering {
            Some(ordering) => self.push(Value::parse_bool(accept(ordering))),
            None => Err(super::VmError::TypeError {
                op,
                left: left.type_name(),
                right: Some(right.type_name()),
            }),
        }
    }

    pub(super) fn op_bang(&mut self) -> VmResult<()> {
        let operand = self.pop()?;
        let result = match operand {
            Value::Boolean(b) => !b,
            Value::Null => true,
            _ => false,
        };
        self.push(Value::parse_bool(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;

    fn vm_with(values: &[Value]) -> Vm {
        let mut vm = Vm::new(Bytecode::new(vec![], vec![]));
        for v in values {
            vm.push(v.clone()).unwrap();
        }
        vm
    }

    #[test]
    fn equal_on_unknown_type_pair_is_false() {
        let mut vm = vm_with(&[Value::NULL, Value::new_integer(1)]);
        vm.op_equal().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(false)));
    }

    #[test]
    fn not_equal_on_unknown_type_pair_is_true() {
        let mut vm = vm_with(&[Value::NULL, Value::new_integer(1)]);
        vm.op_not_equal().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn equal_compares_mixed_int_float_numerically() {
        let mut vm = vm_with(&[Value::new_integer(2), Value::new_float(2.0)]);
        vm.op_equal().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn equal_short_circuits_on_string_length() {
        let mut vm = vm_with(&[Value::new_string("ab"), Value::new_string("abc")]);
        vm.op_equal().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(false)));
    }

    #[test]
    fn and_is_strict_not_short_circuit() {
        let mut vm = vm_with(&[Value::FALSE, Value::TRUE]);
        vm.op_and().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(false)));
    }

    #[test]
    fn greater_than_numeric() {
        let mut vm = vm_with(&[Value::new_integer(5), Value::new_integer(3)]);
        vm.op_greater_than().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn greater_than_lexicographic_strings() {
        let mut vm = vm_with(&[Value::new_string("b"), Value::new_string("a")]);
        vm.op_greater_than().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn bang_true_is_false() {
        let mut vm = vm_with(&[Value::TRUE]);
        vm.op_bang().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(false)));
    }

    #[test]
    fn bang_null_is_true() {
        let mut vm = vm_with(&[Value::NULL]);
        vm.op_bang().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(true)));
    }

    #[test]
    fn bang_other_is_false() {
        let mut vm = vm_with(&[Value::new_integer(5)]);
        vm.op_bang().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Boolean(false)));
    }
}
