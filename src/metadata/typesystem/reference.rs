use std::fmt;

use crate::metadata::{token::Token, typesystem::CilPrimitiveKind};

/// A reference to a type as it appears in a signature, an operand or an attribute.
///
/// Definitions inside the model are referenced by token, everything else by the name of the
/// assembly that is expected to define it. Type specifications (arrays, pointers, generic
/// instances, ...) wrap their element type and are peeled by the marker before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    /// A `TypeDef` loaded into the model
    Definition(Token),
    /// A type named by scope and full name (`Namespace.Outer/Inner`)
    External {
        /// Name of the assembly expected to define the type
        scope: String,
        /// Namespace-qualified name, nested types separated with `/`
        full_name: String,
    },
    /// A built-in type encoded with a single element type byte
    Primitive(CilPrimitiveKind),
    /// `GENERICINST` - a generic type closed over its arguments
    GenericInstance {
        /// The open generic type
        element: Box<TypeReference>,
        /// One argument per generic parameter of `element`
        arguments: Vec<TypeReference>,
    },
    /// `SZARRAY` (rank 1) or `ARRAY`
    Array {
        /// Type of the array elements
        element: Box<TypeReference>,
        /// Number of dimensions
        rank: u32,
    },
    /// `PTR` - unmanaged pointer
    Pointer(Box<TypeReference>),
    /// `BYREF` - managed reference
    ByRef(Box<TypeReference>),
    /// `PINNED` local
    Pinned(Box<TypeReference>),
    /// `CMOD_REQD` / `CMOD_OPT`
    Modified {
        /// The modifier type (e.g. `IsVolatile`)
        modifier: Box<TypeReference>,
        /// `modreq` if true, `modopt` otherwise
        required: bool,
        /// The modified type
        element: Box<TypeReference>,
    },
    /// `VAR` - generic parameter of the enclosing type
    Var(u32),
    /// `MVAR` - generic parameter of the enclosing method
    MVar(u32),
}

impl TypeReference {
    /// Reference to a type defined in the model
    #[must_use]
    pub fn definition(token: Token) -> Self {
        TypeReference::Definition(token)
    }

    /// Reference to a type by assembly name and full name
    pub fn external(scope: impl Into<String>, full_name: impl Into<String>) -> Self {
        TypeReference::External {
            scope: scope.into(),
            full_name: full_name.into(),
        }
    }

    /// A single dimensional, zero based array of `element`
    #[must_use]
    pub fn sz_array(element: TypeReference) -> Self {
        TypeReference::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// `element` closed over `arguments`
    #[must_use]
    pub fn generic_instance(element: TypeReference, arguments: Vec<TypeReference>) -> Self {
        TypeReference::GenericInstance {
            element: Box::new(element),
            arguments,
        }
    }

    /// A managed reference to `element`
    #[must_use]
    pub fn by_ref(element: TypeReference) -> Self {
        TypeReference::ByRef(Box::new(element))
    }

    /// An unmanaged pointer to `element`
    #[must_use]
    pub fn pointer(element: TypeReference) -> Self {
        TypeReference::Pointer(Box::new(element))
    }

    /// Returns the innermost element type, with every specification peeled off.
    ///
    /// For a generic instance this is the open generic type, for `int[]*&` it is `int`.
    #[must_use]
    pub fn element(&self) -> &TypeReference {
        let mut current = self;
        loop {
            current = match current {
                TypeReference::GenericInstance { element, .. }
                | TypeReference::Array { element, .. }
                | TypeReference::Modified { element, .. }
                | TypeReference::Pointer(element)
                | TypeReference::ByRef(element)
                | TypeReference::Pinned(element) => element,
                _ => return current,
            };
        }
    }

    /// Returns true for `VAR` and `MVAR`
    #[must_use]
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self, TypeReference::Var(_) | TypeReference::MVar(_))
    }

    /// Returns true if this reference is an array of any rank
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeReference::Array { .. })
    }

    /// Returns the definition token when this is a plain reference to a loaded type
    #[must_use]
    pub fn as_definition(&self) -> Option<Token> {
        match self {
            TypeReference::Definition(token) => Some(*token),
            _ => None,
        }
    }

    /// Replaces generic parameters with the given arguments.
    ///
    /// `VAR n` is looked up in `type_args`, `MVAR n` in `method_args`. Parameters without a
    /// matching argument are left in place.
    #[must_use]
    pub fn substitute(
        &self,
        type_args: &[TypeReference],
        method_args: &[TypeReference],
    ) -> TypeReference {
        let recurse = |inner: &TypeReference| Box::new(inner.substitute(type_args, method_args));

        match self {
            TypeReference::Var(index) => type_args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeReference::MVar(index) => method_args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeReference::GenericInstance { element, arguments } => {
                TypeReference::GenericInstance {
                    element: recurse(element),
                    arguments: arguments
                        .iter()
                        .map(|argument| argument.substitute(type_args, method_args))
                        .collect(),
                }
            }
            TypeReference::Array { element, rank } => TypeReference::Array {
                element: recurse(element),
                rank: *rank,
            },
            TypeReference::Pointer(element) => TypeReference::Pointer(recurse(element)),
            TypeReference::ByRef(element) => TypeReference::ByRef(recurse(element)),
            TypeReference::Pinned(element) => TypeReference::Pinned(recurse(element)),
            TypeReference::Modified {
                modifier,
                required,
                element,
            } => TypeReference::Modified {
                modifier: modifier.clone(),
                required: *required,
                element: recurse(element),
            },
            TypeReference::Definition(_)
            | TypeReference::External { .. }
            | TypeReference::Primitive(_) => self.clone(),
        }
    }
}

impl From<Token> for TypeReference {
    fn from(token: Token) -> Self {
        TypeReference::Definition(token)
    }
}

impl From<CilPrimitiveKind> for TypeReference {
    fn from(kind: CilPrimitiveKind) -> Self {
        TypeReference::Primitive(kind)
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Definition(token) => write!(f, "typedef({token})"),
            TypeReference::External { scope, full_name } => write!(f, "[{scope}]{full_name}"),
            TypeReference::Primitive(kind) => write!(f, "{}", kind.full_name()),
            TypeReference::GenericInstance { element, arguments } => {
                write!(f, "{element}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ">")
            }
            TypeReference::Array { element, rank } => {
                write!(f, "{element}[")?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeReference::Pointer(element) => write!(f, "{element}*"),
            TypeReference::ByRef(element) => write!(f, "{element}&"),
            TypeReference::Pinned(element) => write!(f, "{element} pinned"),
            TypeReference::Modified {
                modifier,
                required,
                element,
            } => {
                let kind = if *required { "modreq" } else { "modopt" };
                write!(f, "{element} {kind}({modifier})")
            }
            TypeReference::Var(index) => write!(f, "!{index}"),
            TypeReference::MVar(index) => write!(f, "!!{index}"),
        }
    }
}
