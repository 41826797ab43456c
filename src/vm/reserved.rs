//! Trap opcodes: reserved slots that are part of the public encoding but
//! have no execution-time implementation in this crate. Each reaches its
//! dispatch target and turns into `VmError::Unimplemented` rather than
//! silently doing nothing.

use super::error::VmError;
use crate::opcode::Opcode;

impl super::Vm {
    pub(super) fn op_reserved(&self, op: Opcode) -> VmError {
        VmError::Unimplemented(op.mnemonic_upper())
    }
}
