//! CONST, CLOSURE, CURRENT_CLOSURE, and the four binding-slot opcodes
//! (globals/locals/free variables).
//!
//! `SET_GLOBAL`/`SET_LOCAL` deliberately do not pop: the assigned value
//! stays on top of the stack as the expression's result, the same way
//! `GET_GLOBAL`/`GET_LOCAL` push rather than move. A following `POP`
//! discards it when the assignment is used as a statement.

use super::error::{VmError, VmResult};
use super::Vm;
use crate::value::Value;
use std::rc::Rc;

impl Vm {
    pub(super) fn op_const(&mut self) -> VmResult<()> {
        let index = self.read_u16();
        let value = self
            .consts
            .get(index as usize)
            .cloned()
            .ok_or(VmError::InvalidConstant(index))?;
        self.push(value)
    }

    pub(super) fn op_closure(&mut self) -> VmResult<()> {
        let const_index = self.read_u16();
        let num_free = self.read_u8();

        let func = match self.consts.get(const_index as usize) {
            Some(Value::Function(func)) => func.clone(),
            Some(other) => {
                return Err(VmError::TypeError {
                    op: "CLOSURE",
                    left: other.type_name(),
                    right: None,
                })
            }
            None => return Err(VmError::InvalidConstant(const_index)),
        };

        let mut free = vec![Value::NULL; num_free as usize];
        for i in (0..num_free as usize).rev() {
            free[i] = self.pop()?;
        }

        self.push(Value::new_closure(func, free))
    }

    pub(super) fn op_current_closure(&mut self) -> VmResult<()> {
        let closure = Rc::clone(&self.current_frame().closure);
        self.push(Value::Closure(closure))
    }

    pub(super) fn op_get_global(&mut self) -> VmResult<()> {
        let index = self.read_u16();
        let value = self
            .globals
            .get(index as usize)
            .cloned()
            .ok_or(VmError::InvalidGlobal(index))?;
        self.push(value)
    }

    pub(super) fn op_set_global(&mut self) -> VmResult<()> {
        let index = self.read_u16();
        let value = self.peek()?.clone();
        let slot = self
            .globals
            .get_mut(index as usize)
            .ok_or(VmError::InvalidGlobal(index))?;
        *slot = value;
        Ok(())
    }

    pub(super) fn op_get_local(&mut self) -> VmResult<()> {
        let index = self.read_u8();
        let slot = self.current_frame().base_ptr + index as usize;
        self.push(self.stack[slot].clone())
    }

    pub(super) fn op_set_local(&mut self) -> VmResult<()> {
        let index = self.read_u8();
        let slot = self.current_frame().base_ptr + index as usize;
        let value = self.peek()?.clone();
        self.stack[slot] = value;
        Ok(())
    }

    pub(super) fn op_get_free(&mut self) -> VmResult<()> {
        let index = self.read_u8();
        let value = self
            .current_frame()
            .closure
            .free
            .get(index as usize)
            .cloned()
            .ok_or(VmError::TypeError {
                op: "GET_FREE",
                left: "out-of-range free index",
                right: None,
            })?;
        self.push(value)
    }
}
