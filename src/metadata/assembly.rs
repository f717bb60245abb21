//! Assemblies and modules.

use crate::metadata::{customattributes::CustomAttribute, token::Token};

/// An assembly loaded into the model
#[derive(Debug, Clone)]
pub struct AssemblyDef {
    /// Token
    pub token: Token,
    /// Simple name (`mscorlib`, `System.Xml`, ...)
    pub name: String,
    /// Modules of the assembly, the manifest module first
    pub modules: Vec<Token>,
    /// Custom attributes attached to the assembly
    pub custom_attributes: Vec<CustomAttribute>,
}

/// A module of an assembly
#[derive(Debug, Clone)]
pub struct ModuleDef {
    /// Token
    pub token: Token,
    /// File name of the module
    pub name: String,
    /// Owning assembly
    pub assembly: Token,
    /// Top level types; nested types are reachable through their enclosing type
    pub types: Vec<Token>,
    /// Custom attributes attached to the module
    pub custom_attributes: Vec<CustomAttribute>,
}
