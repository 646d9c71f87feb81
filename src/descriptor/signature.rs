//! Generic signatures (JVMS §4.7.9.1): parsing, rendering and class renaming.
//!
//! Inner classes appear in signatures as `Louter<TT;>.Inner;`. Renaming them
//! needs the binary name `outer$Inner`, so the remapper resolves the full
//! name and writes back only the part after the mapped outer name.

use std::fmt;

use crate::error::{RemapError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeSignature {
    /// One of `BCDFIJSZ`, or `V` in return position.
    Base(char),
    Array(Box<TypeSignature>),
    Class(ClassTypeSignature),
    TypeVariable(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Internal name of the outermost class, package included.
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
    /// `.Inner<..>` segments, innermost last.
    pub inner: Vec<SimpleClassTypeSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeArgument {
    /// `*`
    Any,
    Exact(TypeSignature),
    /// `+T`
    Extends(TypeSignature),
    /// `-T`
    Super(TypeSignature),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    /// Absent when the bound is an interface (`T::Ljava/lang/Runnable;`).
    pub class_bound: Option<TypeSignature>,
    pub interface_bounds: Vec<TypeSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    pub return_type: TypeSignature,
    pub throws: Vec<TypeSignature>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    fn error(&self) -> RemapError {
        RemapError::descriptor(self.input)
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish<T>(self, value: T) -> Result<T> {
        if self.pos == self.input.len() {
            Ok(value)
        } else {
            Err(self.error())
        }
    }

    /// Reads up to (not including) the first byte in `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        let mut params = Vec::new();
        if !self.eat(b'<') {
            return Ok(params);
        }
        while !self.eat(b'>') {
            let name = self.identifier(b":;<>./[")?;
            self.expect(b':')?;
            let class_bound = match self.peek() {
                Some(b'L' | b'T' | b'[') => Some(self.reference_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.eat(b':') {
                interface_bounds.push(self.reference_type()?);
            }
            params.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
        }
        if params.is_empty() {
            return Err(self.error());
        }
        Ok(params)
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let mut args = Vec::new();
        if !self.eat(b'<') {
            return Ok(args);
        }
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Extends(self.reference_type()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Super(self.reference_type()?)
                }
                _ => TypeArgument::Exact(self.reference_type()?),
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(args)
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L')?;
        let name = self.identifier(b".;<>[:")?;
        let type_arguments = self.type_arguments()?;
        let mut inner = Vec::new();
        while self.eat(b'.') {
            let name = self.identifier(b".;<>[:/")?;
            let type_arguments = self.type_arguments()?;
            inner.push(SimpleClassTypeSignature {
                name,
                type_arguments,
            });
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature {
            name,
            type_arguments,
            inner,
        })
    }

    fn reference_type(&mut self) -> Result<TypeSignature> {
        match self.peek() {
            Some(b'L') => Ok(TypeSignature::Class(self.class_type()?)),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier(b";<>./[:")?;
                self.expect(b';')?;
                Ok(TypeSignature::TypeVariable(name))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(TypeSignature::Array(Box::new(self.java_type(false)?)))
            }
            _ => Err(self.error()),
        }
    }

    fn java_type(&mut self, allow_void: bool) -> Result<TypeSignature> {
        match self.peek() {
            Some(b @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z')) => {
                self.pos += 1;
                Ok(TypeSignature::Base(char::from(b)))
            }
            Some(b'V') if allow_void => {
                self.pos += 1;
                Ok(TypeSignature::Base('V'))
            }
            _ => self.reference_type(),
        }
    }
}

impl ClassSignature {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let type_parameters = parser.type_parameters()?;
        let superclass = parser.class_type()?;
        let mut interfaces = Vec::new();
        while parser.peek().is_some() {
            interfaces.push(parser.class_type()?);
        }
        parser.finish(ClassSignature {
            type_parameters,
            superclass,
            interfaces,
        })
    }
}

impl MethodSignature {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let type_parameters = parser.type_parameters()?;
        parser.expect(b'(')?;
        let mut parameters = Vec::new();
        while !parser.eat(b')') {
            parameters.push(parser.java_type(false)?);
        }
        let return_type = parser.java_type(true)?;
        let mut throws = Vec::new();
        while parser.eat(b'^') {
            match parser.reference_type()? {
                TypeSignature::Array(_) => return Err(parser.error()),
                thrown => throws.push(thrown),
            }
        }
        parser.finish(MethodSignature {
            type_parameters,
            parameters,
            return_type,
            throws,
        })
    }
}

impl TypeSignature {
    /// Parses a field signature (a reference type signature).
    pub fn parse_field(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let ty = parser.reference_type()?;
        parser.finish(ty)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn write_type_arguments(f: &mut fmt::Formatter<'_>, args: &[TypeArgument]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for arg in args {
        match arg {
            TypeArgument::Any => f.write_str("*")?,
            TypeArgument::Exact(ty) => write!(f, "{ty}")?,
            TypeArgument::Extends(ty) => write!(f, "+{ty}")?,
            TypeArgument::Super(ty) => write!(f, "-{ty}")?,
        }
    }
    f.write_str(">")
}

fn write_type_parameters(f: &mut fmt::Formatter<'_>, params: &[TypeParameter]) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for param in params {
        write!(f, "{}:", param.name)?;
        if let Some(bound) = &param.class_bound {
            write!(f, "{bound}")?;
        }
        for bound in &param.interface_bounds {
            write!(f, ":{bound}")?;
        }
    }
    f.write_str(">")
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Base(c) => write!(f, "{c}"),
            TypeSignature::Array(inner) => write!(f, "[{inner}"),
            TypeSignature::Class(class) => write!(f, "{class}"),
            TypeSignature::TypeVariable(name) => write!(f, "T{name};"),
        }
    }
}

impl fmt::Display for ClassTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.name)?;
        write_type_arguments(f, &self.type_arguments)?;
        for segment in &self.inner {
            write!(f, ".{}", segment.name)?;
            write_type_arguments(f, &segment.type_arguments)?;
        }
        f.write_str(";")
    }
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        write!(f, "{}", self.superclass)?;
        for interface in &self.interfaces {
            write!(f, "{interface}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        f.write_str("(")?;
        for param in &self.parameters {
            write!(f, "{param}")?;
        }
        write!(f, "){}", self.return_type)?;
        for thrown in &self.throws {
            write!(f, "^{thrown}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Renaming
// ---------------------------------------------------------------------------

impl ClassTypeSignature {
    pub fn map_classes<F>(&mut self, map: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        map_arguments(&mut self.type_arguments, map);
        let mut binary_name = self.name.clone();
        let mut mapped_outer = map(&self.name).unwrap_or_else(|| self.name.clone());
        for segment in &mut self.inner {
            map_arguments(&mut segment.type_arguments, map);
            binary_name = format!("{binary_name}${}", segment.name);
            let mapped = map(&binary_name).unwrap_or_else(|| binary_name.clone());
            let simple = mapped
                .strip_prefix(mapped_outer.as_str())
                .and_then(|rest| rest.strip_prefix('$'))
                .or_else(|| mapped.rsplit_once('$').map(|(_, simple)| simple))
                .unwrap_or(mapped.as_str());
            segment.name = simple.to_string();
            mapped_outer = mapped;
        }
        if let Some(mapped) = map(&self.name) {
            self.name = mapped;
        }
    }
}

fn map_arguments<F>(args: &mut [TypeArgument], map: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for arg in args {
        match arg {
            TypeArgument::Any => {}
            TypeArgument::Exact(ty) | TypeArgument::Extends(ty) | TypeArgument::Super(ty) => {
                ty.map_classes(map)
            }
        }
    }
}

impl TypeSignature {
    pub fn map_classes<F>(&mut self, map: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            TypeSignature::Base(_) | TypeSignature::TypeVariable(_) => {}
            TypeSignature::Array(inner) => inner.map_classes(map),
            TypeSignature::Class(class) => class.map_classes(map),
        }
    }
}

fn map_type_parameters<F>(params: &mut [TypeParameter], map: &F)
where
    F: Fn(&str) -> Option<String>,
{
    for param in params {
        if let Some(bound) = &mut param.class_bound {
            bound.map_classes(map);
        }
        for bound in &mut param.interface_bounds {
            bound.map_classes(map);
        }
    }
}

impl ClassSignature {
    pub fn map_classes<F>(&mut self, map: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        map_type_parameters(&mut self.type_parameters, map);
        self.superclass.map_classes(map);
        for interface in &mut self.interfaces {
            interface.map_classes(map);
        }
    }
}

impl MethodSignature {
    pub fn map_classes<F>(&mut self, map: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        map_type_parameters(&mut self.type_parameters, map);
        for param in &mut self.parameters {
            param.map_classes(map);
        }
        self.return_type.map_classes(map);
        for thrown in &mut self.throws {
            thrown.map_classes(map);
        }
    }
}

/// Which signature grammar applies to a `Signature` attribute.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignatureKind {
    Class,
    Method,
    Field,
}

/// Parses `signature` with the grammar for `kind`, renames its classes and
/// renders it again.
pub fn remap_signature<F>(signature: &str, kind: SignatureKind, map: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(match kind {
        SignatureKind::Class => {
            let mut parsed = ClassSignature::parse(signature)?;
            parsed.map_classes(map);
            parsed.to_string()
        }
        SignatureKind::Method => {
            let mut parsed = MethodSignature::parse(signature)?;
            parsed.map_classes(map);
            parsed.to_string()
        }
        SignatureKind::Field => {
            let mut parsed = TypeSignature::parse_field(signature)?;
            parsed.map_classes(map);
            parsed.to_string()
        }
    })
}
