//! Bytecode opcodes and their operand encoding.
//!
//! Opcodes are a single byte (`CONST` is `0`, `POP` is `44`). `HALT` is a
//! terminator one past the last real opcode rather than part of the
//! positional table, so it gets discriminant `45` here.

use smallvec::SmallVec;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Const = 0,
    True = 1,
    False = 2,
    Null = 3,
    List = 4,
    Map = 5,
    Closure = 6,
    CurrentClosure = 7,

    Add = 8,
    Sub = 9,
    Mul = 10,
    Div = 11,
    Mod = 12,

    BwAnd = 13,
    BwOr = 14,
    BwXor = 15,
    BwNot = 16,
    BwLshift = 17,
    BwRshift = 18,

    And = 19,
    Or = 20,
    Equal = 21,
    NotEqual = 22,
    GreaterThan = 23,
    GreaterThanEqual = 24,

    Minus = 25,
    Bang = 26,
    Index = 27,

    Call = 28,
    ConcurrentCall = 29,
    Return = 30,
    ReturnValue = 31,

    Jump = 32,
    JumpNotTruthy = 33,

    Dot = 34,
    Define = 35,
    GetGlobal = 36,
    SetGlobal = 37,
    GetLocal = 38,
    SetLocal = 39,

    GetBuiltin = 40,
    GetFree = 41,
    LoadModule = 42,
    Interpolate = 43,

    Pop = 44,

    /// Execution terminator. Not part of the positional opcode table above;
    /// see module doc.
    Halt = 45,
}

pub const OPCODE_COUNT: usize = Opcode::Halt as usize + 1;

/// Byte-width of a single decoded operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandWidth {
    U8,
    U16,
}

impl OperandWidth {
    fn size(self) -> usize {
        match self {
            OperandWidth::U8 => 1,
            OperandWidth::U16 => 2,
        }
    }
}

impl Opcode {
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Some(match byte {
            0 => Opcode::Const,
            1 => Opcode::True,
            2 => Opcode::False,
            3 => Opcode::Null,
            4 => Opcode::List,
            5 => Opcode::Map,
            6 => Opcode::Closure,
            7 => Opcode::CurrentClosure,
            8 => Opcode::Add,
            9 => Opcode::Sub,
            10 => Opcode::Mul,
            11 => Opcode::Div,
            12 => Opcode::Mod,
            13 => Opcode::BwAnd,
            14 => Opcode::BwOr,
            15 => Opcode::BwXor,
            16 => Opcode::BwNot,
            17 => Opcode::BwLshift,
            18 => Opcode::BwRshift,
            19 => Opcode::And,
            20 => Opcode::Or,
            21 => Opcode::Equal,
            22 => Opcode::NotEqual,
            23 => Opcode::GreaterThan,
            24 => Opcode::GreaterThanEqual,
            25 => Opcode::Minus,
            26 => Opcode::Bang,
            27 => Opcode::Index,
            28 => Opcode::Call,
            29 => Opcode::ConcurrentCall,
            30 => Opcode::Return,
            31 => Opcode::ReturnValue,
            32 => Opcode::Jump,
            33 => Opcode::JumpNotTruthy,
            34 => Opcode::Dot,
            35 => Opcode::Define,
            36 => Opcode::GetGlobal,
            37 => Opcode::SetGlobal,
            38 => Opcode::GetLocal,
            39 => Opcode::SetLocal,
            40 => Opcode::GetBuiltin,
            41 => Opcode::GetFree,
            42 => Opcode::LoadModule,
            43 => Opcode::Interpolate,
            44 => Opcode::Pop,
            45 => Opcode::Halt,
            _ => return None,
        })
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Operand widths, in encoding order, for each opcode's immediate
    /// arguments.
    pub fn operand_widths(self) -> &'static [OperandWidth] {
        use OperandWidth::*;
        match self {
            Opcode::Const
            | Opcode::Jump
            | Opcode::JumpNotTruthy
            | Opcode::GetGlobal
            | Opcode::SetGlobal => &[U16],

            Opcode::Closure => &[U16, U8],

            Opcode::Call
            | Opcode::ConcurrentCall
            | Opcode::GetLocal
            | Opcode::SetLocal
            | Opcode::GetFree
            | Opcode::GetBuiltin => &[U8],

            _ => &[],
        }
    }

    /// Upper-snake-case mnemonic (`"BW_AND"`, `"GET_BUILTIN"`, ...), used in
    /// trap diagnostics.
    pub fn mnemonic_upper(self) -> &'static str {
        match self {
            Opcode::Const => "CONST",
            Opcode::True => "TRUE",
            Opcode::False => "FALSE",
            Opcode::Null => "NULL",
            Opcode::List => "LIST",
            Opcode::Map => "MAP",
            Opcode::Closure => "CLOSURE",
            Opcode::CurrentClosure => "CURRENT_CLOSURE",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::BwAnd => "BW_AND",
            Opcode::BwOr => "BW_OR",
            Opcode::BwXor => "BW_XOR",
            Opcode::BwNot => "BW_NOT",
            Opcode::BwLshift => "BW_LSHIFT",
            Opcode::BwRshift => "BW_RSHIFT",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Equal => "EQUAL",
            Opcode::NotEqual => "NOT_EQUAL",
            Opcode::GreaterThan => "GREATER_THAN",
            Opcode::GreaterThanEqual => "GREATER_THAN_EQUAL",
            Opcode::Minus => "MINUS",
            Opcode::Bang => "BANG",
            Opcode::Index => "INDEX",
            Opcode::Call => "CALL",
            Opcode::ConcurrentCall => "CONCURRENT_CALL",
            Opcode::Return => "RETURN",
            Opcode::ReturnValue => "RETURN_VALUE",
            Opcode::Jump => "JUMP",
            Opcode::JumpNotTruthy => "JUMP_NOT_TRUTHY",
            Opcode::Dot => "DOT",
            Opcode::Define => "DEFINE",
            Opcode::GetGlobal => "GET_GLOBAL",
            Opcode::SetGlobal => "SET_GLOBAL",
            Opcode::GetLocal => "GET_LOCAL",
            Opcode::SetLocal => "SET_LOCAL",
            Opcode::GetBuiltin => "GET_BUILTIN",
            Opcode::GetFree => "GET_FREE",
            Opcode::LoadModule => "LOAD_MODULE",
            Opcode::Interpolate => "INTERPOLATE",
            Opcode::Pop => "POP",
            Opcode::Halt => "HALT",
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Const => "const",
            Opcode::True => "true",
            Opcode::False => "false",
            Opcode::Null => "null",
            Opcode::List => "list",
            Opcode::Map => "map",
            Opcode::Closure => "closure",
            Opcode::CurrentClosure => "current_closure",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::BwAnd => "bw_and",
            Opcode::BwOr => "bw_or",
            Opcode::BwXor => "bw_xor",
            Opcode::BwNot => "bw_not",
            Opcode::BwLshift => "bw_lshift",
            Opcode::BwRshift => "bw_rshift",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Equal => "equal",
            Opcode::NotEqual => "not_equal",
            Opcode::GreaterThan => "greater_than",
            Opcode::GreaterThanEqual => "greater_than_equal",
            Opcode::Minus => "minus",
            Opcode::Bang => "bang",
            Opcode::Index => "index",
            Opcode::Call => "call",
            Opcode::ConcurrentCall => "concurrent_call",
            Opcode::Return => "return",
            Opcode::ReturnValue => "return_value",
            Opcode::Jump => "jump",
            Opcode::JumpNotTruthy => "jump_not_truthy",
            Opcode::Dot => "dot",
            Opcode::Define => "define",
            Opcode::GetGlobal => "get_global",
            Opcode::SetGlobal => "set_global",
            Opcode::GetLocal => "get_local",
            Opcode::SetLocal => "set_local",
            Opcode::GetBuiltin => "get_builtin",
            Opcode::GetFree => "get_free",
            Opcode::LoadModule => "load_module",
            Opcode::Interpolate => "interpolate",
            Opcode::Pop => "pop",
            Opcode::Halt => "halt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Errors raised while encoding or decoding a single instruction. Recoverable
/// — these are compile-time, not execution traps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// `read_operands` ran out of bytes decoding an operand.
    UnexpectedEnd { op: Opcode, wanted: usize, have: usize },
    /// `make_instruction` was given a different operand count than the
    /// opcode's definition calls for.
    WrongOperandCount { op: Opcode, expected: usize, got: usize },
    /// An operand value did not fit the declared width.
    OperandOutOfRange { op: Opcode, index: usize, value: u32, width: OperandWidth },
    InvalidOpcodeByte(u8),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::UnexpectedEnd { op, wanted, have } => write!(
                f,
                "{}: expected {} more operand bytes, have {}",
                op, wanted, have
            ),
            EncodingError::WrongOperandCount { op, expected, got } => write!(
                f,
                "{}: expected {} operands, got {}",
                op, expected, got
            ),
            EncodingError::OperandOutOfRange { op, index, value, width } => write!(
                f,
                "{}: operand {} value {} does not fit {:?}",
                op, index, value, width
            ),
            EncodingError::InvalidOpcodeByte(b) => write!(f, "invalid opcode byte 0x{:02x}", b),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Encode one instruction: opcode byte followed by its operands, each
/// written big-endian at the width `Opcode::operand_widths` declares.
pub fn make_instruction(op: Opcode, operands: &[u32]) -> Result<Vec<u8>, EncodingError> {
    let widths = op.operand_widths();
    if operands.len() != widths.len() {
        return Err(EncodingError::WrongOperandCount {
            op,
            expected: widths.len(),
            got: operands.len(),
        });
    }

    let mut out = Vec::with_capacity(1 + widths.iter().map(|w| w.size()).sum::<usize>());
    out.push(op.to_byte());
    for (i, (&value, &width)) in operands.iter().zip(widths.iter()).enumerate() {
        match width {
            OperandWidth::U8 => {
                let b = u8::try_from(value).map_err(|_| EncodingError::OperandOutOfRange {
                    op,
                    index: i,
                    value,
                    width,
                })?;
                out.push(b);
            }
            OperandWidth::U16 => {
                let v = u16::try_from(value).map_err(|_| EncodingError::OperandOutOfRange {
                    op,
                    index: i,
                    value,
                    width,
                })?;
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
    Ok(out)
}

/// Decode the operands of `op` from `bytes` (which must *not* include the
/// opcode byte itself — it starts right after it). Returns the decoded
/// operands plus the number of bytes consumed.
///
/// Inverse of `make_instruction`: `read_operands(op,
/// &make_instruction(op, operands)[1..]) == Ok((operands, consumed))`.
pub fn read_operands(
    op: Opcode,
    bytes: &[u8],
) -> Result<(SmallVec<[u32; 2]>, usize), EncodingError> {
    let widths = op.operand_widths();
    let mut operands = SmallVec::new();
    let mut offset = 0;
    for &width in widths {
        let size = width.size();
        if bytes.len() < offset + size {
            return Err(EncodingError::UnexpectedEnd {
                op,
                wanted: size,
                have: bytes.len() - offset,
            });
        }
        let value = match width {
            OperandWidth::U8 => bytes[offset] as u32,
            OperandWidth::U16 => u16::from_be_bytes([bytes[offset], bytes[offset + 1]]) as u32,
        };
        operands.push(value);
        offset += size;
    }
    Ok((operands, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(op: Opcode, operands: &[u32]) {
        let encoded = make_instruction(op, operands).expect("encode");
        assert_eq!(encoded[0], op.to_byte());
        let (decoded, consumed) = read_operands(op, &encoded[1..]).expect("decode");
        assert_eq!(decoded.as_slice(), operands);
        assert_eq!(consumed, encoded.len() - 1);
    }

    #[test]
    fn roundtrip_u16_operand() {
        roundtrip(Opcode::Const, &[65535]);
        roundtrip(Opcode::Jump, &[0]);
        roundtrip(Opcode::GetGlobal, &[258]);
    }

    #[test]
    fn roundtrip_u8_operand() {
        roundtrip(Opcode::GetLocal, &[0]);
        roundtrip(Opcode::Call, &[255]);
    }

    #[test]
    fn roundtrip_closure_two_operands() {
        roundtrip(Opcode::Closure, &[12, 3]);
    }

    #[test]
    fn roundtrip_no_operands() {
        roundtrip(Opcode::Add, &[]);
        roundtrip(Opcode::Pop, &[]);
        roundtrip(Opcode::Halt, &[]);
    }

    #[test]
    fn wrong_operand_count_is_an_encoding_error() {
        assert!(make_instruction(Opcode::Const, &[]).is_err());
        assert!(make_instruction(Opcode::Add, &[1]).is_err());
    }

    #[test]
    fn operand_out_of_range_is_an_encoding_error() {
        assert!(make_instruction(Opcode::GetLocal, &[256]).is_err());
    }

    #[test]
    fn truncated_operand_is_an_encoding_error() {
        assert!(read_operands(Opcode::Const, &[0x01]).is_err());
    }

    #[test]
    fn from_byte_rejects_out_of_range() {
        assert!(Opcode::from_byte(200).is_none());
        assert!(Opcode::from_byte(Opcode::Halt.to_byte()).is_some());
    }

    #[test]
    fn opcode_positions_match_the_spec_table() {
        assert_eq!(Opcode::Const.to_byte(), 0);
        assert_eq!(Opcode::Pop.to_byte(), 44);
        assert_eq!(Opcode::Halt.to_byte(), 45);
    }
}
