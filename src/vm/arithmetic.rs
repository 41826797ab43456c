//! ADD/SUB/MUL/DIV/MOD.
//!
//! All five pop the right operand first, then the left — operands are
//! pushed in source order, so the right-hand side ends up on top.

use super::error::{VmError, VmResult};
use super::Vm;
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Vm {
    fn pop_numeric_pair(&mut self, op: &'static str) -> VmResult<(Numeric, Numeric)> {
        let right = self.pop()?;
        let left = self.pop()?;
        let numeric = |v: &Value| match v {
            Value::Integer(i) => Some(Numeric::Int(*i)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            _ => None,
        };
        match (numeric(&left), numeric(&right)) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(VmError::TypeError {
                op,
                left: left.type_name(),
                right: Some(right.type_name()),
            }),
        }
    }

    pub(super) fn op_add(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => Value::new_integer(l.wrapping_add(*r)),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                Value::new_float(left.to_double() + right.to_double())
            }
            (Value::Str(_), Value::Str(_)) => return Err(VmError::Unimplemented("ADD(string, string)")),
            _ => {
                return Err(VmError::TypeError {
                    op: "ADD",
                    left: left.type_name(),
                    right: Some(right.type_name()),
                })
            }
        };
        self.push(result)
    }

    pub(super) fn op_sub(&mut self) -> VmResult<()> {
        match self.pop_numeric_pair("SUB")? {
            (Numeric::Int(l), Numeric::Int(r)) => self.push(Value::new_integer(l.wrapping_sub(r))),
            (l, r) => self.push(Value::new_float(to_f64(l) - to_f64(r))),
        }
    }

    pub(super) fn op_mul(&mut self) -> VmResult<()> {
        match self.pop_numeric_pair("MUL")? {
            (Numeric::Int(l), Numeric::Int(r)) => self.push(Value::new_integer(l.wrapping_mul(r))),
            (l, r) => self.push(Value::new_float(to_f64(l) * to_f64(r))),
        }
    }

    pub(super) fn op_div(&mut self) -> VmResult<()> {
        match self.pop_numeric_pair("DIV")? {
            (Numeric::Int(_), Numeric::Int(0)) => Err(VmError::DivisionByZero),
            (Numeric::Int(l), Numeric::Int(r)) => self.push(Value::new_integer(l.wrapping_div(r))),
            (l, r) => self.push(Value::new_float(to_f64(l) / to_f64(r))),
        }
    }

    pub(super) fn op_mod(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Integer(_), Value::Integer(0)) => Err(VmError::DivisionByZero),
            (Value::Integer(l), Value::Integer(r)) => self.push(Value::new_integer(l.wrapping_rem(*r))),
            _ => Err(VmError::TypeError {
                op: "MOD",
                left: left.type_name(),
                right: Some(right.type_name()),
            }),
        }
    }

    /// Prefix negation. Exactly one push per execution on every path,
    /// success or error.
    pub(super) fn op_minus(&mut self) -> VmResult<()> {
        let operand = self.pop()?;
        match operand {
            Value::Integer(i) => self.push(Value::new_integer(-i)),
            Value::Float(f) => self.push(Value::new_float(-f)),
            other => Err(VmError::TypeError {
                op: "MINUS",
                left: other.type_name(),
                right: None,
            }),
        }
    }
}

fn to_f64(n: Numeric) -> f64 {
    match n {
        Numeric::Int(i) => i as f64,
        Numeric::Float(f) => f,
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
    fn add_integers() {
        let mut vm = vm_with(&[Value::new_integer(2), Value::new_integer(3)]);
        vm.op_add().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Integer(5)));
    }

    #[test]
    fn add_mixed_int_float_widens_to_float() {
        let mut vm = vm_with(&[Value::new_integer(2), Value::new_float(0.5)]);
        vm.op_add().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Float(f) if f == 2.5));
    }

    #[test]
    fn div_by_zero_traps() {
        let mut vm = vm_with(&[Value::new_integer(1), Value::new_integer(0)]);
        assert_eq!(vm.op_div().unwrap_err(), VmError::DivisionByZero);
    }

    #[test]
    fn div_truncates_toward_zero() {
        let mut vm = vm_with(&[Value::new_integer(-7), Value::new_integer(2)]);
        vm.op_div().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Integer(-3)));
    }

    #[test]
    fn mod_by_zero_traps() {
        let mut vm = vm_with(&[Value::new_integer(1), Value::new_integer(0)]);
        assert_eq!(vm.op_mod().unwrap_err(), VmError::DivisionByZero);
    }

    #[test]
    fn add_string_pair_is_unimplemented() {
        let mut vm = vm_with(&[Value::new_string("a"), Value::new_string("b")]);
        assert!(matches!(vm.op_add().unwrap_err(), VmError::Unimplemented(_)));
    }

    #[test]
    fn add_unsupported_type_traps() {
        let mut vm = vm_with(&[Value::NULL, Value::new_integer(1)]);
        assert!(matches!(vm.op_add().unwrap_err(), VmError::TypeError { .. }));
    }

    #[test]
    fn minus_negates_integer() {
        let mut vm = vm_with(&[Value::new_integer(7)]);
        vm.op_minus().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Integer(-7)));
    }

    #[test]
    fn minus_negates_float() {
        let mut vm = vm_with(&[Value::new_float(1.5)]);
        vm.op_minus().unwrap();
        assert!(matches!(vm.pop().unwrap(), Value::Float(f) if f == -1.5));
    }

    #[test]
    fn minus_on_non_numeric_traps() {
        let mut vm = vm_with(&[Value::NULL]);
        assert!(matches!(vm.op_minus().unwrap_err(), VmError::TypeError { .. }));
    }
}
