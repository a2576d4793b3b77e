use crate::{Expr, SourceLocation, Stmt};
use std::path::PathBuf;

/// One parsed and resolved source file.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub types: Vec<TypeDecl>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceFile {
            path: path.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }
}

/// A reference to a host-language type as written in source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeRef {
    Named(String),
    Array(Box<TypeRef>),
    Pointer(Box<TypeRef>),
    /// An implicitly typed local (`var`).
    Inferred,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn array_of(name: impl Into<String>) -> Self {
        TypeRef::Array(Box::new(TypeRef::named(name)))
    }

    /// The name of a plain named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// The element type of an array type.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Named(name) if name == "void" || name == "Void")
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Array(element) => write!(f, "{element}[]"),
            TypeRef::Pointer(element) => write!(f, "{element}*"),
            TypeRef::Inferred => f.write_str("var"),
        }
    }
}

/// Declaration modifiers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Internal,
    Static,
    Const,
    Readonly,
    Abstract,
    Sealed,
    Partial,
    Unsafe,
    Virtual,
    Override,
    Extern,
    New,
}

impl Modifier {
    pub const fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Internal => "internal",
            Modifier::Static => "static",
            Modifier::Const => "const",
            Modifier::Readonly => "readonly",
            Modifier::Abstract => "abstract",
            Modifier::Sealed => "sealed",
            Modifier::Partial => "partial",
            Modifier::Unsafe => "unsafe",
            Modifier::Virtual => "virtual",
            Modifier::Override => "override",
            Modifier::Extern => "extern",
            Modifier::New => "new",
        }
    }
}

/// An attribute applied to a declaration, as written.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub arguments: Vec<AttributeArgument>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            arguments: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    pub fn with_argument(mut self, value: Expr) -> Self {
        self.arguments.push(AttributeArgument { name: None, value });
        self
    }

    pub fn with_named_argument(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.arguments.push(AttributeArgument {
            name: Some(name.into()),
            value,
        });
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeArgument {
    pub name: Option<String>,
    pub value: Expr,
}

/// A class or struct declaration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub documentation: Vec<String>,
    pub modifiers: Vec<Modifier>,
    pub base_types: Vec<TypeRef>,
    pub attributes: Vec<Attribute>,
    pub type_parameters: Vec<String>,
    pub members: Vec<Member>,
    pub location: SourceLocation,
}

impl TypeDecl {
    /// A new public class declaration.
    pub fn new(name: impl Into<String>) -> Self {
        TypeDecl {
            name: name.into(),
            modifiers: vec![Modifier::Public],
            ..Default::default()
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_types.push(TypeRef::named(base));
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn with_documentation(mut self, line: impl Into<String>) -> Self {
        self.documentation.push(line.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<Member>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }
}

/// A member of a type declaration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Other(OtherMember),
}

impl From<FieldDecl> for Member {
    fn from(value: FieldDecl) -> Self {
        Member::Field(value)
    }
}

impl From<MethodDecl> for Member {
    fn from(value: MethodDecl) -> Self {
        Member::Method(value)
    }
}

impl From<OtherMember> for Member {
    fn from(value: OtherMember) -> Self {
        Member::Other(value)
    }
}

/// Members that only matter to the compiler as something to reject.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemberKind {
    Property,
    Event,
    Indexer,
    Operator,
    Constructor,
    NestedType,
}

impl MemberKind {
    pub const fn description(&self) -> &'static str {
        match self {
            MemberKind::Property => "property",
            MemberKind::Event => "event",
            MemberKind::Indexer => "indexer",
            MemberKind::Operator => "operator",
            MemberKind::Constructor => "constructor",
            MemberKind::NestedType => "nested type",
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OtherMember {
    pub kind: MemberKind,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl OtherMember {
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        OtherMember {
            kind,
            name: name.into(),
            location: SourceLocation::default(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Vec<Modifier>,
    pub attributes: Vec<Attribute>,
    pub initializer: Option<Expr>,
    pub documentation: Vec<String>,
    pub location: SourceLocation,
}

impl Default for FieldDecl {
    fn default() -> Self {
        FieldDecl {
            name: String::new(),
            ty: TypeRef::Inferred,
            modifiers: Vec::new(),
            attributes: Vec::new(),
            initializer: None,
            documentation: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldDecl {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_initializer(mut self, value: Expr) -> Self {
        self.initializer = Some(value);
        self
    }

    pub fn with_documentation(mut self, line: impl Into<String>) -> Self {
        self.documentation.push(line.into());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }
}

/// How an argument is passed to a parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ParamModifier {
    #[default]
    None,
    Out,
    Ref,
    In,
    Params,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifier: ParamModifier,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Vec<Attribute>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ParamDecl {
            name: name.into(),
            ty: TypeRef::named(ty),
            modifier: ParamModifier::None,
            attributes: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    pub fn out(mut self) -> Self {
        self.modifier = ParamModifier::Out;
        self
    }

    pub fn with_modifier(mut self, modifier: ParamModifier) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub attributes: Vec<Attribute>,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParamDecl>,
    pub return_type: TypeRef,
    pub body: Option<Vec<Stmt>>,
    pub documentation: Vec<String>,
    pub location: SourceLocation,
}

impl Default for MethodDecl {
    fn default() -> Self {
        MethodDecl {
            name: String::new(),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: TypeRef::named("void"),
            body: None,
            documentation: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

impl MethodDecl {
    /// A new `void` method with an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        MethodDecl {
            name: name.into(),
            body: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_parameter(mut self, parameter: ParamDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn returning(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }
}
