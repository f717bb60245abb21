//! Decoded CIL method bodies.
//!
//! Bodies are stored already disassembled: every instruction carries its mnemonic and an
//! [`Operand`] whose metadata references have been turned into [`TypeReference`],
//! [`MethodReference`] and [`FieldReference`] values. The linker only cares about those
//! references, plus the local variable types and the caught types of exception handlers.

use crate::metadata::{
    members::{FieldReference, MemberReference},
    method::{ExceptionHandler, MethodReference},
    typesystem::TypeReference,
};

/// The operand of a decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Integer constant (`ldc.i4`, `ldc.i8`, ...)
    Immediate(i64),
    /// Floating point constant (`ldc.r4`, `ldc.r8`)
    Float(f64),
    /// User string (`ldstr`)
    String(String),
    /// Branch target offset
    Target(u64),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
    /// Switch table with multiple signed branch offsets
    Switch(Vec<i32>),
    /// `InlineType` (`newarr`, `box`, `castclass`, ...)
    Type(TypeReference),
    /// `InlineMethod` (`call`, `callvirt`, `newobj`, `ldftn`, ...)
    Method(MethodReference),
    /// `InlineField` (`ldfld`, `stsfld`, ...)
    Field(FieldReference),
    /// `InlineTok` (`ldtoken`)
    Token(MemberReference),
}

impl Operand {
    /// Returns a formatted string representation of the operand.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Immediate(value) => Some(value.to_string()),
            Operand::Float(value) => Some(value.to_string()),
            Operand::String(value) => Some(format!("{value:?}")),
            Operand::Target(t) => Some(format!("0x{t:08X}")),
            Operand::Local(l) => Some(format!("V_{l}")),
            Operand::Argument(a) => Some(format!("A_{a}")),
            Operand::Switch(targets) => Some(format!("switch({})", targets.len())),
            Operand::Type(reference) => Some(reference.to_string()),
            Operand::Method(reference) => Some(reference.to_string()),
            Operand::Field(reference) => Some(reference.to_string()),
            Operand::Token(reference) => Some(reference.to_string()),
        }
    }
}

/// A single decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the instruction from the start of the body
    pub offset: u64,
    /// Human-readable instruction mnemonic (e.g., "add", "ldloc.s", "ret")
    pub mnemonic: &'static str,
    /// The operand data for this instruction
    pub operand: Operand,
}

/// Describes one method that has been compiled to CIL bytecode.
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Maximum number of items on the operand stack
    pub max_stack: usize,
    /// Flag, indicating to call default constructor on all local variables
    pub is_init_local: bool,
    /// Types of the local variables
    pub locals: Vec<TypeReference>,
    /// A list of exception handlers this method has
    pub exception_handlers: Vec<ExceptionHandler>,
    /// The decoded instruction stream
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Returns true if the body has no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
