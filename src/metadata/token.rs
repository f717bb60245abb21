use std::fmt;
use std::hash::{Hash, Hasher};

use strum::{Display, EnumIter};

/// Metadata tables whose rows can be nodes of the reachability graph.
///
/// The discriminants are the ECMA-335 table ids, so a [`Token`] built from one of these
/// carries the same table byte a real metadata token would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (0x00)
    Module = 0x00,
    /// `TypeDef` table (0x02)
    TypeDef = 0x02,
    /// `Field` table (0x04)
    Field = 0x04,
    /// `MethodDef` table (0x06)
    MethodDef = 0x06,
    /// `Event` table (0x14)
    Event = 0x14,
    /// `Property` table (0x17)
    Property = 0x17,
    /// `Assembly` table (0x20)
    Assembly = 0x20,
    /// `GenericParam` table (0x2A)
    GenericParam = 0x2A,
}

impl TableId {
    /// Maps a raw table byte back to the table, if it is one the model stores.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(TableId::Module),
            0x02 => Some(TableId::TypeDef),
            0x04 => Some(TableId::Field),
            0x06 => Some(TableId::MethodDef),
            0x14 => Some(TableId::Event),
            0x17 => Some(TableId::Property),
            0x20 => Some(TableId::Assembly),
            0x2A => Some(TableId::GenericParam),
            _ => None,
        }
    }
}

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// Inside a [`crate::metadata::MetadataModel`] rows are numbered across all loaded
/// assemblies, so a token is a unique node identity for the whole link session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token for the 1-based `row` of `table`
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token((u32::from(table as u8) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the table this token points into, if it is a known node table
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_u8(self.table())
    }

    /// Returns true if the token points into `table`
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table as u8
    }

    /// Interprets the token as a graph node
    #[must_use]
    pub fn node(&self) -> Option<Node> {
        if self.row() == 0 {
            return None;
        }

        Some(match self.table_id()? {
            TableId::Assembly => Node::Assembly(*self),
            TableId::Module => Node::Module(*self),
            TableId::TypeDef => Node::Type(*self),
            TableId::MethodDef => Node::Method(*self),
            TableId::Field => Node::Field(*self),
            TableId::GenericParam => Node::GenericParameter(*self),
            TableId::Property => Node::Property(*self),
            TableId::Event => Node::Event(*self),
        })
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// A node of the metadata reachability graph.
///
/// Every variant wraps the token of the definition it stands for; the variant is implied by
/// the token's table, see [`Token::node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// An assembly definition
    Assembly(Token),
    /// A module of an assembly
    Module(Token),
    /// A type definition
    Type(Token),
    /// A method definition
    Method(Token),
    /// A field definition
    Field(Token),
    /// A generic parameter of a type or method
    GenericParameter(Token),
    /// A property definition
    Property(Token),
    /// An event definition
    Event(Token),
}

impl Node {
    /// The token identifying this node
    #[must_use]
    pub fn token(&self) -> Token {
        match *self {
            Node::Assembly(token)
            | Node::Module(token)
            | Node::Type(token)
            | Node::Method(token)
            | Node::Field(token)
            | Node::GenericParameter(token)
            | Node::Property(token)
            | Node::Event(token) => token,
        }
    }
}

impl From<Node> for Token {
    fn from(node: Node) -> Self {
        node.token()
    }
}
