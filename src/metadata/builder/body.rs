//! Method body builder for decoded CIL.
//!
//! [`MethodBodyBuilder`] emits already decoded instructions: operands are references, not
//! tokens, and offsets are computed from the standard operand sizes so exception handler
//! ranges line up with the instruction stream.

use crate::metadata::{
    members::{FieldReference, MemberReference},
    method::{
        ExceptionHandler, HandlerKind, Instruction, MethodBody, MethodReference, Operand,
    },
    typesystem::TypeReference,
};

/// Builder for creating method body implementations.
///
/// # Examples
///
/// ```rust
/// use dotlink::metadata::{builder::MethodBodyBuilder, typesystem::CilPrimitiveKind};
///
/// let body = MethodBodyBuilder::new()
///     .local(CilPrimitiveKind::I4.into())
///     .ldc_i4(1)
///     .ret()
///     .build();
/// assert_eq!(body.locals.len(), 1);
/// assert_eq!(body.instructions[1].offset, 5);
/// ```
#[derive(Debug, Clone)]
pub struct MethodBodyBuilder {
    max_stack: usize,
    init_locals: bool,
    locals: Vec<TypeReference>,
    instructions: Vec<Instruction>,
    exception_handlers: Vec<ExceptionHandler>,
    offset: u64,
}

impl Default for MethodBodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodBodyBuilder {
    /// Create a new method body builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_stack: 8,
            init_locals: true,
            locals: Vec::new(),
            instructions: Vec::new(),
            exception_handlers: Vec::new(),
            offset: 0,
        }
    }

    /// Set the maximum stack depth.
    #[must_use]
    pub fn max_stack(mut self, stack_size: usize) -> Self {
        self.max_stack = stack_size;
        self
    }

    /// Add a local variable to the method.
    #[must_use]
    pub fn local(mut self, local_type: TypeReference) -> Self {
        self.locals.push(local_type);
        self
    }

    /// Wraps everything emitted so far in a `try` block with a typed `catch` handler
    /// starting at the current offset.
    #[must_use]
    pub fn catch(mut self, exception_type: TypeReference) -> Self {
        let try_length = u32::try_from(self.offset).unwrap_or(u32::MAX);
        self.exception_handlers.push(ExceptionHandler {
            kind: HandlerKind::Catch(exception_type),
            try_range: 0..try_length,
            handler_range: try_length..try_length,
        });
        self
    }

    /// Wraps everything emitted so far in a `try` block with a `finally` handler
    #[must_use]
    pub fn finally(mut self) -> Self {
        let try_length = u32::try_from(self.offset).unwrap_or(u32::MAX);
        self.exception_handlers.push(ExceptionHandler {
            kind: HandlerKind::Finally,
            try_range: 0..try_length,
            handler_range: try_length..try_length,
        });
        self
    }

    fn emit(mut self, mnemonic: &'static str, operand: Operand, size: u64) -> Self {
        self.instructions.push(Instruction {
            offset: self.offset,
            mnemonic,
            operand,
        });
        self.offset += size;
        self
    }

    /// `nop`
    #[must_use]
    pub fn nop(self) -> Self {
        self.emit("nop", Operand::None, 1)
    }

    /// `ret`
    #[must_use]
    pub fn ret(self) -> Self {
        self.emit("ret", Operand::None, 1)
    }

    /// `pop`
    #[must_use]
    pub fn pop(self) -> Self {
        self.emit("pop", Operand::None, 1)
    }

    /// `ldarg.0`
    #[must_use]
    pub fn ldarg_0(self) -> Self {
        self.emit("ldarg.0", Operand::None, 1)
    }

    /// `ldnull`
    #[must_use]
    pub fn ldnull(self) -> Self {
        self.emit("ldnull", Operand::None, 1)
    }

    /// `ldc.i4`
    #[must_use]
    pub fn ldc_i4(self, value: i32) -> Self {
        self.emit("ldc.i4", Operand::Immediate(i64::from(value)), 5)
    }

    /// `ldstr`
    #[must_use]
    pub fn ldstr(self, value: &str) -> Self {
        self.emit("ldstr", Operand::String(value.to_string()), 5)
    }

    /// `ldloc.s`
    #[must_use]
    pub fn ldloc(self, index: u16) -> Self {
        self.emit("ldloc.s", Operand::Local(index), 2)
    }

    /// `stloc.s`
    #[must_use]
    pub fn stloc(self, index: u16) -> Self {
        self.emit("stloc.s", Operand::Local(index), 2)
    }

    /// `call`
    #[must_use]
    pub fn call(self, method: impl Into<MethodReference>) -> Self {
        self.emit("call", Operand::Method(method.into()), 5)
    }

    /// `callvirt`
    #[must_use]
    pub fn callvirt(self, method: impl Into<MethodReference>) -> Self {
        self.emit("callvirt", Operand::Method(method.into()), 5)
    }

    /// `newobj`
    #[must_use]
    pub fn newobj(self, constructor: impl Into<MethodReference>) -> Self {
        self.emit("newobj", Operand::Method(constructor.into()), 5)
    }

    /// `ldftn`
    #[must_use]
    pub fn ldftn(self, method: impl Into<MethodReference>) -> Self {
        self.emit("ldftn", Operand::Method(method.into()), 6)
    }

    /// `ldfld`
    #[must_use]
    pub fn ldfld(self, field: impl Into<FieldReference>) -> Self {
        self.emit("ldfld", Operand::Field(field.into()), 5)
    }

    /// `stfld`
    #[must_use]
    pub fn stfld(self, field: impl Into<FieldReference>) -> Self {
        self.emit("stfld", Operand::Field(field.into()), 5)
    }

    /// `ldsfld`
    #[must_use]
    pub fn ldsfld(self, field: impl Into<FieldReference>) -> Self {
        self.emit("ldsfld", Operand::Field(field.into()), 5)
    }

    /// `stsfld`
    #[must_use]
    pub fn stsfld(self, field: impl Into<FieldReference>) -> Self {
        self.emit("stsfld", Operand::Field(field.into()), 5)
    }

    /// `ldtoken`
    #[must_use]
    pub fn ldtoken(self, member: MemberReference) -> Self {
        self.emit("ldtoken", Operand::Token(member), 5)
    }

    /// `newarr`
    #[must_use]
    pub fn newarr(self, element: TypeReference) -> Self {
        self.emit("newarr", Operand::Type(element), 5)
    }

    /// `castclass`
    #[must_use]
    pub fn castclass(self, target: TypeReference) -> Self {
        self.emit("castclass", Operand::Type(target), 5)
    }

    /// `isinst`
    #[must_use]
    pub fn isinst(self, target: TypeReference) -> Self {
        self.emit("isinst", Operand::Type(target), 5)
    }

    /// `box`
    #[must_use]
    pub fn box_(self, value_type: TypeReference) -> Self {
        self.emit("box", Operand::Type(value_type), 5)
    }

    /// `initobj`
    #[must_use]
    pub fn initobj(self, value_type: TypeReference) -> Self {
        self.emit("initobj", Operand::Type(value_type), 6)
    }

    /// Finishes the body
    #[must_use]
    pub fn build(self) -> MethodBody {
        MethodBody {
            max_stack: self.max_stack,
            is_init_local: self.init_locals,
            locals: self.locals,
            exception_handlers: self.exception_handlers,
            instructions: self.instructions,
        }
    }
}
