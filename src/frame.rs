//! A single call frame: the closure being executed, its instruction
//! pointer, and where its locals begin on the value stack.

use crate::value::Closure;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Frame {
    pub closure: Rc<Closure>,
    /// Index of the next instruction to execute within `closure.func.code`.
    pub ip: usize,
    /// Stack index one below this frame's first local — locals and
    /// parameters are addressed as `base_ptr + index`.
    pub base_ptr: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_ptr: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_ptr,
        }
    }

    #[inline]
    pub fn instructions(&self) -> &[u8] {
        &self.closure.func.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Function;

    #[test]
    fn new_frame_starts_at_instruction_zero() {
        let func = Rc::new(Function {
            code: Rc::from(vec![0u8, 1, 2].into_boxed_slice()),
            num_locals: 0,
            num_params: 0,
        });
        let closure = Rc::new(Closure {
            func,
            free: Default::default(),
        });
        let frame = Frame::new(closure, 3);
        assert_eq!(frame.ip, 0);
        assert_eq!(frame.base_ptr, 3);
        assert_eq!(frame.instructions(), &[0, 1, 2]);
    }
}
