use std::fmt;
use std::os::raw::{c_int, c_uint};

use crate::platform::LibraryKind;

/// Foreign value categories used to describe an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Void,
    I32,
    U32,
    I64,
    U64,
    ISize,
    F64,
    Pointer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Void => "void",
            ValueKind::I32 => "i32",
            ValueKind::U32 => "u32",
            ValueKind::I64 => "i64",
            ValueKind::U64 => "u64",
            ValueKind::ISize => "isize",
            ValueKind::F64 => "f64",
            ValueKind::Pointer => "pointer",
        })
    }
}

/// Maps a Rust FFI type to its [`ValueKind`].
pub trait NativeValue {
    const KIND: ValueKind;
}

impl NativeValue for () {
    const KIND: ValueKind = ValueKind::Void;
}

impl NativeValue for c_int {
    const KIND: ValueKind = ValueKind::I32;
}

impl NativeValue for c_uint {
    const KIND: ValueKind = ValueKind::U32;
}

impl NativeValue for i64 {
    const KIND: ValueKind = ValueKind::I64;
}

impl NativeValue for u64 {
    const KIND: ValueKind = ValueKind::U64;
}

impl NativeValue for isize {
    const KIND: ValueKind = ValueKind::ISize;
}

impl NativeValue for f64 {
    const KIND: ValueKind = ValueKind::F64;
}

impl<T> NativeValue for *mut T {
    const KIND: ValueKind = ValueKind::Pointer;
}

impl<T> NativeValue for *const T {
    const KIND: ValueKind = ValueKind::Pointer;
}

/// Declared shape of one bound entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSignature {
    pub name: &'static str,
    pub library: LibraryKind,
    pub params: &'static [ValueKind],
    pub result: ValueKind,
}

impl fmt::Display for SymbolSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.result)
    }
}
