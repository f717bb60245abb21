//! Parser for reflection-format type names.
//!
//! Custom attribute arguments of type `System.Type` are stored as the string
//! `Type.AssemblyQualifiedName` would produce, e.g.
//!
//! ```text
//! Ns.Outer+Inner`1[[System.Int32, mscorlib]][], MyAssembly, Version=1.0.0.0
//! ```
//!
//! Nested types are separated with `+`, generic arguments are listed in brackets (each one
//! optionally assembly qualified in its own brackets) and array/pointer/by-ref suffixes follow.
//! Special characters can be escaped with a backslash.

use std::fmt;

use crate::Result;

/// Type specification suffix of a [`TypeName`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameModifier {
    /// `[]`
    SzArray,
    /// `[,]`, `[*]`, ... with the given rank
    Array(u32),
    /// `*`
    Pointer,
    /// `&`
    ByRef,
}

/// A parsed reflection type name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeName {
    /// Namespace of the outermost type, may be empty
    pub namespace: String,
    /// Name of the outermost type
    pub name: String,
    /// Names of nested types, outermost first
    pub nested: Vec<String>,
    /// Generic arguments, in declaration order
    pub generic_arguments: Vec<TypeName>,
    /// Specification suffixes, innermost first
    pub modifiers: Vec<TypeNameModifier>,
    /// Display name of the assembly the type lives in, if qualified
    pub assembly: Option<String>,
}

impl TypeName {
    /// Parses a reflection-format type name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the string is not a well-formed type name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotlink::metadata::typesystem::TypeName;
    ///
    /// let name = TypeName::parse("System.Collections.Generic.List`1[[System.String, mscorlib]]")?;
    /// assert_eq!(name.full_name(), "System.Collections.Generic.List`1");
    /// assert_eq!(name.generic_arguments[0].assembly_name(), Some("mscorlib"));
    /// # Ok::<(), dotlink::Error>(())
    /// ```
    pub fn parse(input: &str) -> Result<TypeName> {
        let mut parser = TypeNameParser {
            input: input.chars().collect(),
            position: 0,
        };

        let name = parser.parse_type(true)?;
        parser.skip_whitespace();
        if parser.position != parser.input.len() {
            return Err(malformed_error!(
                "Unexpected '{}' at offset {} in type name '{}'",
                parser.input[parser.position],
                parser.position,
                input
            ));
        }
        Ok(name)
    }

    /// Metadata full name of the element type, nested types separated with `/`
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut full_name = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        };

        for nested in &self.nested {
            full_name.push('/');
            full_name.push_str(nested);
        }
        full_name
    }

    /// Simple name of the qualifying assembly, without version, culture or key token
    #[must_use]
    pub fn assembly_name(&self) -> Option<&str> {
        self.assembly
            .as_deref()
            .and_then(|assembly| assembly.split(',').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())?;
        if !self.generic_arguments.is_empty() {
            write!(f, "<")?;
            for (index, argument) in self.generic_arguments.iter().enumerate() {
                if index > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{argument}")?;
            }
            write!(f, ">")?;
        }
        for modifier in &self.modifiers {
            match modifier {
                TypeNameModifier::SzArray => write!(f, "[]")?,
                TypeNameModifier::Array(rank) => {
                    write!(f, "[")?;
                    for _ in 1..*rank {
                        write!(f, ",")?;
                    }
                    write!(f, "]")?;
                }
                TypeNameModifier::Pointer => write!(f, "*")?,
                TypeNameModifier::ByRef => write!(f, "&")?,
            }
        }
        Ok(())
    }
}

struct TypeNameParser {
    input: Vec<char>,
    position: usize,
}

impl TypeNameParser {
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.position += 1;
                Ok(())
            }
            Some(c) => Err(malformed_error!(
                "Expected '{}' but found '{}' at offset {}",
                expected,
                c,
                self.position
            )),
            None => Err(malformed_error!(
                "Expected '{}' but reached end of type name",
                expected
            )),
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let mut identifier = String::new();

        while let Some(c) = self.peek() {
            match c {
                '+' | ',' | '[' | ']' | '*' | '&' => break,
                '\\' => {
                    let escaped = self.peek_at(1).ok_or_else(|| {
                        malformed_error!("Dangling escape at end of type name")
                    })?;
                    identifier.push(escaped);
                    self.position += 2;
                }
                _ => {
                    identifier.push(c);
                    self.position += 1;
                }
            }
        }

        let identifier = identifier.trim_end().to_string();
        if identifier.is_empty() {
            return Err(malformed_error!(
                "Missing type name at offset {}",
                self.position
            ));
        }
        Ok(identifier)
    }

    fn parse_type(&mut self, allow_assembly: bool) -> Result<TypeName> {
        let qualified = self.parse_identifier()?;
        let (namespace, name) = match qualified.rfind('.') {
            Some(split) => (
                qualified[..split].to_string(),
                qualified[split + 1..].to_string(),
            ),
            None => (String::new(), qualified),
        };

        let mut type_name = TypeName {
            namespace,
            name,
            ..TypeName::default()
        };

        while self.peek() == Some('+') {
            self.position += 1;
            type_name.nested.push(self.parse_identifier()?);
        }

        if self.is_generic_argument_list() {
            type_name.generic_arguments = self.parse_generic_arguments()?;
        }

        self.parse_modifiers(&mut type_name.modifiers)?;

        self.skip_whitespace();
        if allow_assembly && self.peek() == Some(',') {
            self.position += 1;
            type_name.assembly = Some(self.parse_assembly_name()?);
        }

        Ok(type_name)
    }

    /// A `[` opens a generic argument list unless it starts an array suffix (`[]`, `[,]`, `[*]`)
    fn is_generic_argument_list(&self) -> bool {
        if self.peek() != Some('[') {
            return false;
        }

        let mut offset = 1;
        while self.peek_at(offset).is_some_and(char::is_whitespace) {
            offset += 1;
        }
        !matches!(self.peek_at(offset), Some(']' | ',' | '*') | None)
    }

    fn parse_generic_arguments(&mut self) -> Result<Vec<TypeName>> {
        self.expect('[')?;
        let mut arguments = Vec::new();

        loop {
            self.skip_whitespace();
            let argument = if self.peek() == Some('[') {
                self.position += 1;
                let argument = self.parse_type(true)?;
                self.expect(']')?;
                argument
            } else {
                self.parse_type(false)?
            };
            arguments.push(argument);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.position += 1,
                Some(']') => {
                    self.position += 1;
                    return Ok(arguments);
                }
                _ => {
                    return Err(malformed_error!(
                        "Unterminated generic argument list at offset {}",
                        self.position
                    ))
                }
            }
        }
    }

    fn parse_modifiers(&mut self, modifiers: &mut Vec<TypeNameModifier>) -> Result<()> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('*') => {
                    self.position += 1;
                    modifiers.push(TypeNameModifier::Pointer);
                }
                Some('&') => {
                    self.position += 1;
                    modifiers.push(TypeNameModifier::ByRef);
                }
                Some('[') if !self.is_generic_argument_list() => {
                    self.position += 1;
                    let mut rank = 1;
                    let mut bounded = false;
                    loop {
                        self.skip_whitespace();
                        match self.peek() {
                            Some(',') => rank += 1,
                            Some('*') => bounded = true,
                            Some(']') => break,
                            _ => {
                                return Err(malformed_error!(
                                    "Invalid array specification at offset {}",
                                    self.position
                                ))
                            }
                        }
                        self.position += 1;
                    }
                    self.position += 1;

                    modifiers.push(if rank == 1 && !bounded {
                        TypeNameModifier::SzArray
                    } else {
                        TypeNameModifier::Array(rank)
                    });
                }
                _ => return Ok(()),
            }
        }
    }

    /// The assembly display name runs up to the bracket closing the enclosing argument
    fn parse_assembly_name(&mut self) -> Result<String> {
        let mut assembly = String::new();
        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }
            if c == '\\' {
                if let Some(escaped) = self.peek_at(1) {
                    assembly.push(escaped);
                    self.position += 2;
                    continue;
                }
            }
            assembly.push(c);
            self.position += 1;
        }

        let assembly = assembly.trim().to_string();
        if assembly.is_empty() {
            return Err(malformed_error!("Empty assembly name in type name"));
        }
        Ok(assembly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names() {
        let name = TypeName::parse("System.String").unwrap();
        assert_eq!(name.namespace, "System");
        assert_eq!(name.name, "String");
        assert_eq!(name.assembly, None);

        let name = TypeName::parse("Global").unwrap();
        assert_eq!(name.namespace, "");
        assert_eq!(name.full_name(), "Global");
    }

    #[test]
    fn test_nested_and_assembly() {
        let name = TypeName::parse(
            "Outer.Space.Type+Inner+Deepest, My.Assembly, Version=1.0.0.0, Culture=neutral",
        )
        .unwrap();
        assert_eq!(name.full_name(), "Outer.Space.Type/Inner/Deepest");
        assert_eq!(name.assembly_name(), Some("My.Assembly"));
        assert_eq!(
            name.assembly.as_deref(),
            Some("My.Assembly, Version=1.0.0.0, Culture=neutral")
        );
    }

    #[test]
    fn test_generic_arguments() {
        let name = TypeName::parse(
            "System.Collections.Generic.Dictionary`2[[System.String, mscorlib],[Foo.Bar, Lib]], mscorlib",
        )
        .unwrap();
        assert_eq!(name.generic_arguments.len(), 2);
        assert_eq!(name.generic_arguments[0].full_name(), "System.String");
        assert_eq!(name.generic_arguments[1].assembly_name(), Some("Lib"));
        assert_eq!(name.assembly_name(), Some("mscorlib"));

        let name = TypeName::parse("List`1[Foo.Bar]").unwrap();
        assert_eq!(name.generic_arguments[0].full_name(), "Foo.Bar");
        assert_eq!(name.generic_arguments[0].assembly, None);
    }

    #[test]
    fn test_modifiers() {
        let name = TypeName::parse("System.Int32[][,]*&").unwrap();
        assert_eq!(
            name.modifiers,
            vec![
                TypeNameModifier::SzArray,
                TypeNameModifier::Array(2),
                TypeNameModifier::Pointer,
                TypeNameModifier::ByRef,
            ]
        );
        assert_eq!(name.to_string(), "System.Int32[][,]*&");

        let name = TypeName::parse("Foo[*]").unwrap();
        assert_eq!(name.modifiers, vec![TypeNameModifier::Array(1)]);

        let name = TypeName::parse("List`1[[System.Byte, mscorlib]][]").unwrap();
        assert_eq!(name.generic_arguments.len(), 1);
        assert_eq!(name.modifiers, vec![TypeNameModifier::SzArray]);
    }

    #[test]
    fn test_escapes() {
        let name = TypeName::parse(r"Odd\+Name\,Here").unwrap();
        assert_eq!(name.name, "Odd+Name,Here");
        assert!(name.nested.is_empty());
    }

    #[test]
    fn test_malformed() {
        for input in ["", "Foo+", "List`1[[System.String", "Foo[,x]", "Foo, ", "Foo]"] {
            assert!(
                matches!(TypeName::parse(input), Err(crate::Error::Malformed { .. })),
                "{input} should not parse"
            );
        }
    }
}
