//! A small structural model of Java types, enough to compare actual argument types against
//! formal parameter types.

use std::fmt;

use smol_str::SmolStr;

use crate::ResolutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "boolean" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "short" => PrimitiveType::Short,
            "char" => PrimitiveType::Char,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Qualified name of the wrapper class.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        Some(match name {
            "java.lang.Boolean" => PrimitiveType::Boolean,
            "java.lang.Byte" => PrimitiveType::Byte,
            "java.lang.Short" => PrimitiveType::Short,
            "java.lang.Character" => PrimitiveType::Char,
            "java.lang.Integer" => PrimitiveType::Int,
            "java.lang.Long" => PrimitiveType::Long,
            "java.lang.Float" => PrimitiveType::Float,
            "java.lang.Double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// Identity or widening primitive conversion (JLS 5.1.2).
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        use PrimitiveType::*;

        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<TypeRef>),
    Super(Box<TypeRef>),
}

/// A Java type as seen by the resolver.
///
/// Class names are kept as written; a [`crate::TypeEnv`] decides how simple names map to
/// qualified ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Class { name: SmolStr, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
    TypeVar(SmolStr),
    Wildcard(WildcardBound),
    /// The type of the `null` literal.
    Null,
    /// A type the host could not attribute. Never assignable to or from anything.
    Error,
}

impl TypeRef {
    pub fn class(name: impl Into<SmolStr>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<SmolStr>, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args,
        }
    }

    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRef::Error)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Parse Java type syntax such as `int`, `java.util.List<? extends Number>`, `String[]`.
    ///
    /// Every identifier is read as a class name; use [`TypeRef::parse_in`] to declare type
    /// variables.
    pub fn parse(text: &str) -> Result<TypeRef, ResolutionError> {
        Self::parse_in(text, &[])
    }

    /// Like [`TypeRef::parse`], reading the names in `type_vars` as type variables.
    pub fn parse_in(text: &str, type_vars: &[&str]) -> Result<TypeRef, ResolutionError> {
        let mut parser = Parser::new(text, type_vars);
        let ty = parser.parse_type()?;
        parser.expect_eof()?;
        Ok(ty)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(component) => write!(f, "{component}[]"),
            TypeRef::TypeVar(name) => f.write_str(name),
            TypeRef::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            TypeRef::Wildcard(WildcardBound::Extends(bound)) => write!(f, "? extends {bound}"),
            TypeRef::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {bound}"),
            TypeRef::Null => f.write_str("null"),
            TypeRef::Error => f.write_str("<error>"),
        }
    }
}

/// Split a parameter list such as `int, Map<K,V>, String...` at top-level commas.
///
/// The returned flag is true when the last parameter is a varargs parameter; its type is
/// returned as an array.
pub(crate) fn parse_param_list(
    text: &str,
    type_vars: &[&str],
) -> Result<(Vec<TypeRef>, bool), ResolutionError> {
    let mut parser = Parser::new(text, type_vars);
    let mut params = Vec::new();
    let mut varargs = false;

    parser.skip_ws();
    if parser.is_eof() {
        return Ok((params, false));
    }

    loop {
        if varargs {
            return Err(parser.error("varargs parameter must be last"));
        }
        let mut ty = parser.parse_type()?;
        if parser.consume_str("...") {
            ty = TypeRef::array_of(ty);
            varargs = true;
        }
        params.push(ty);
        if !parser.consume_char(',') {
            break;
        }
    }
    parser.expect_eof()?;
    Ok((params, varargs))
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    type_vars: &'a [&'a str],
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, type_vars: &'a [&'a str]) -> Self {
        Self {
            text,
            pos: 0,
            type_vars,
        }
    }

    fn error(&self, message: &str) -> ResolutionError {
        ResolutionError::Malformed(format!("{message} at offset {} in `{}`", self.pos, self.text))
    }

    fn rest(&self) -> &'a str {
        let text = self.text;
        &text[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn consume_char(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn consume_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect_eof(&mut self) -> Result<(), ResolutionError> {
        self.skip_ws();
        if self.is_eof() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing tokens"))
        }
    }

    fn parse_ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        let mut chars = self.rest().char_indices();
        let (_, first) = chars.next()?;
        if !is_ident_start(first) {
            return None;
        }

        let mut end = start + first.len_utf8();
        for (idx, ch) in chars {
            if !is_ident_part(ch) {
                break;
            }
            end = start + idx + ch.len_utf8();
        }
        self.pos = end;
        let text = self.text;
        Some(&text[start..end])
    }

    fn parse_type(&mut self) -> Result<TypeRef, ResolutionError> {
        let mut ty = if self.consume_char('?') {
            self.parse_wildcard()?
        } else {
            self.parse_non_wildcard()?
        };

        while self.consume_char('[') {
            if !self.consume_char(']') {
                return Err(self.error("expected `]`"));
            }
            if matches!(ty, TypeRef::Wildcard(_)) {
                return Err(self.error("wildcards cannot be array components"));
            }
            ty = TypeRef::array_of(ty);
        }
        Ok(ty)
    }

    fn parse_wildcard(&mut self) -> Result<TypeRef, ResolutionError> {
        let checkpoint = self.pos;
        let bound = match self.parse_ident() {
            Some("extends") => WildcardBound::Extends(Box::new(self.parse_bound()?)),
            Some("super") => WildcardBound::Super(Box::new(self.parse_bound()?)),
            Some(_) => return Err(self.error("expected `extends` or `super` after `?`")),
            None => {
                self.pos = checkpoint;
                WildcardBound::Unbounded
            }
        };
        Ok(TypeRef::Wildcard(bound))
    }

    fn parse_bound(&mut self) -> Result<TypeRef, ResolutionError> {
        let bound = self.parse_type()?;
        if matches!(bound, TypeRef::Wildcard(_)) || bound.is_primitive() {
            return Err(self.error("invalid wildcard bound"));
        }
        Ok(bound)
    }

    fn parse_non_wildcard(&mut self) -> Result<TypeRef, ResolutionError> {
        let Some(first) = self.parse_ident() else {
            return Err(self.error("expected a type"));
        };

        if let Some(primitive) = PrimitiveType::from_keyword(first) {
            return Ok(TypeRef::Primitive(primitive));
        }
        if first == "null" {
            return Ok(TypeRef::Null);
        }

        let mut name = first.to_owned();
        loop {
            // `...` is a varargs suffix, not a qualifier.
            if self.rest().trim_start().starts_with("...") {
                break;
            }
            let checkpoint = self.pos;
            if !self.consume_char('.') {
                break;
            }
            let Some(segment) = self.parse_ident() else {
                self.pos = checkpoint;
                return Err(self.error("expected identifier after `.`"));
            };
            name.push('.');
            name.push_str(segment);
        }

        let args = if self.consume_char('<') {
            self.parse_type_args()?
        } else {
            Vec::new()
        };

        if args.is_empty() && self.type_vars.contains(&name.as_str()) {
            return Ok(TypeRef::TypeVar(name.into()));
        }
        Ok(TypeRef::Class {
            name: name.into(),
            args,
        })
    }

    fn parse_type_args(&mut self) -> Result<Vec<TypeRef>, ResolutionError> {
        let mut args = Vec::new();
        // Diamond.
        if self.consume_char('>') {
            return Ok(args);
        }
        loop {
            let arg = self.parse_type()?;
            if arg.is_primitive() {
                return Err(self.error("primitive types cannot be type arguments"));
            }
            args.push(arg);
            if self.consume_char('>') {
                return Ok(args);
            }
            if !self.consume_char(',') {
                return Err(self.error("unterminated type argument list (missing `>`)"));
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

fn is_ident_part(ch: char) -> bool {
    ch == '$' || unicode_ident::is_xid_continue(ch)
}
