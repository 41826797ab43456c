//! The VM's value model.
//!
//! A closed set of variants with per-kind payloads — a tagged union, not a
//! class hierarchy. `Boolean`/`Null` are the two canonical singleton shapes:
//! `Value::TRUE`/`Value::FALSE`/`Value::NULL` are the only constructors for
//! them, so value-equality on these variants already behaves as identity
//! equality (there is exactly one inhabitant of each).

use smallvec::SmallVec;
use std::rc::Rc;

/// An immutable, length-prefixed byte string.
///
/// `length` is kept alongside `bytes` so equality checks can short-circuit
/// on a length mismatch before touching the byte contents.
#[derive(Debug)]
pub struct Str {
    pub bytes: Vec<u8>,
    pub length: usize,
}

impl Str {
    pub fn new(bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        Self { bytes, length }
    }
}

/// Compiled code for a function body: raw instruction bytes plus the shape
/// the VM needs to set up a call frame for it.
#[derive(Debug)]
pub struct Function {
    pub code: Rc<[u8]>,
    pub num_locals: u16,
    pub num_params: u16,
}

/// A `Function` paired with the values it captured as free variables at the
/// point the enclosing `CLOSURE` instruction executed. Captures are almost
/// always a handful of values, so `free` is a `SmallVec` to skip the heap
/// allocation in the common case.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<Function>,
    pub free: SmallVec<[Value; 4]>,
}

/// A tagged value flowing through the stack, constant pool, globals, and
/// closure free-variable arrays.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Str(Rc<Str>),
    Function(Rc<Function>),
    Closure(Rc<Closure>),
    /// Reference to a host-provided builtin by registry index. Resolution at
    /// execution time is reserved (`GET_BUILTIN` traps).
    Builtin(u16),
    /// Placeholder for reference/property l-value semantics (e.g. a future
    /// `DOT`/`INDEX` store target). Every pop path runs `unwrap` on its
    /// result so introducing real l-value behavior later does not require
    /// touching every opcode.
    GetSetter(Rc<Value>),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);
    pub const NULL: Value = Value::Null;

    pub fn new_integer(i: i64) -> Value {
        Value::Integer(i)
    }

    pub fn new_float(f: f64) -> Value {
        Value::Float(f)
    }

    pub fn new_string(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Str(Rc::new(Str::new(bytes.into())))
    }

    pub fn new_function(code: impl Into<Rc<[u8]>>, num_params: u16, num_locals: u16) -> Value {
        Value::Function(Rc::new(Function {
            code: code.into(),
            num_params,
            num_locals,
        }))
    }

    pub fn new_closure(func: Rc<Function>, free: Vec<Value>) -> Value {
        Value::Closure(Rc::new(Closure {
            func,
            free: SmallVec::from_vec(free),
        }))
    }

    /// One of the two canonical `Boolean` singletons, selected by `predicate`.
    pub fn parse_bool(predicate: bool) -> Value {
        if predicate {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    /// `Boolean` is truthy iff it is `TRUE`; `Integer`/`Float` are truthy iff
    /// nonzero (`NaN` is truthy, since `NaN != 0.0`); `Null` is always falsy;
    /// every other kind is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Null => false,
            _ => true,
        }
    }

    /// Widen an `Integer` or `Float` to `f64`. Caller must guard the type —
    /// undefined for any other variant.
    pub fn to_double(&self) -> f64 {
        match self {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            other => panic!("to_double called on non-numeric value: {}", other.type_name()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::Null => "Null",
            Value::Str(_) => "String",
            Value::Function(_) => "Function",
            Value::Closure(_) => "Closure",
            Value::Builtin(_) => "Builtin",
            Value::GetSetter(_) => "GetSetter",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Str(s) => write!(f, "{}", String::from_utf8_lossy(&s.bytes)),
            Value::Function(_) => write!(f, "<function>"),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Builtin(idx) => write!(f, "<builtin {}>", idx),
            Value::GetSetter(_) => write!(f, "<getsetter>"),
        }
    }
}

/// Identity `unwrap` hook for l-value placeholders. Every VM pop path routes
/// through this so that giving `GetSetter` real dereference semantics later
/// does not require touching every opcode.
pub fn unwrap(v: Value) -> Value {
    match v {
        Value::GetSetter(inner) => Rc::unwrap_or_clone(inner),
        other => other,
    }
}
