//! JUMP/JUMP_NOT_TRUTHY/CALL/RETURN/RETURN_VALUE.
//!
//! Jump targets are absolute offsets into the current function's code
//! (`ip = p`), not relative displacements — `Frame::ip` already plays the
//! role of `start + offset` since a frame's instruction cursor is an index
//! into its own `Function::code`, whose start is always `0`.

use super::error::{VmError, VmResult};
use super::Vm;
use crate::frame::Frame;
use crate::value::Value;

impl Vm {
    pub(super) fn op_jump(&mut self) {
        let target = self.read_u16();
        self.current_frame_mut().ip = target as usize;
    }

    pub(super) fn op_jump_not_truthy(&mut self) -> VmResult<()> {
        let target = self.read_u16();
        let condition = self.pop()?;
        if !condition.is_truthy() {
            self.current_frame_mut().ip = target as usize;
        }
        Ok(())
    }

    pub(super) fn op_call(&mut self) -> VmResult<()> {
        let num_args = self.read_u8();
        let callee_index = self.sp - 1 - num_args as usize;
        let callee = self.stack[callee_index].clone();

        let closure = match callee {
            Value::Closure(closure) => closure,
            Value::Builtin(_) => return Err(VmError::Unimplemented("GET_BUILTIN")),
            other => return Err(VmError::NotCallable(other.type_name())),
        };

        if closure.func.num_params != num_args as u16 {
            return Err(VmError::ArityMismatch {
                expected: closure.func.num_params,
                got: num_args,
            });
        }

        let base_ptr = self.sp - num_args as usize;
        self.push_frame(Frame::new(closure.clone(), base_ptr))?;
        self.sp = base_ptr + closure.func.num_locals as usize;
        Ok(())
    }

    pub(super) fn op_return(&mut self) -> VmResult<()> {
        let frame = self.pop_frame();
        self.sp = frame.base_ptr - 1;
        self.push(Value::NULL)
    }

    pub(super) fn op_return_value(&mut self) -> VmResult<()> {
        let result = self.pop()?;
        let frame = self.pop_frame();
        self.sp = frame.base_ptr - 1;
        self.push(result)
    }
}
