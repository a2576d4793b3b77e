use crate::{
    Attribute, BinaryOp, Expr, ExprKind, FieldDecl, Literal, MethodDecl, ParamDecl,
    SourceLocation, TypeDecl, TypeRef, UnaryOp,
};
use std::fmt::{Display, Formatter};

/// A compile-time constant value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(value) => Some(*value as f64),
            ConstValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Bool(value) => write!(f, "{value}"),
            ConstValue::Int(value) => write!(f, "{value}"),
            ConstValue::Float(value) => write!(f, "{value:?}"),
            ConstValue::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// A resolved method signature.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodRef {
    pub declaring_type: String,
    pub name: String,
    pub parameter_types: Vec<String>,
    pub is_static: bool,
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// The symbol a name or member access resolved to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbol {
    /// A field of the declaring effect.
    Field { name: String },
    Local { name: String },
    Parameter { name: String },
    Method(MethodRef),
    Property {
        declaring_type: String,
        name: String,
        is_static: bool,
    },
    Type { name: String },
}

/// An attribute with its canonical name and constant arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAttribute {
    /// The attribute name without namespace qualification or `Attribute` suffix.
    pub name: String,
    pub arguments: Vec<ResolvedArgument>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedArgument {
    pub name: Option<String>,
    /// `None` if the argument was not a compile-time constant.
    pub value: Option<ConstValue>,
}

impl ResolvedAttribute {
    /// The positional argument at `index`.
    pub fn positional(&self, index: usize) -> Option<&ResolvedArgument> {
        self.arguments
            .iter()
            .filter(|argument| argument.name.is_none())
            .nth(index)
    }

    pub fn named(&self, name: &str) -> Option<&ResolvedArgument> {
        self.arguments
            .iter()
            .find(|argument| argument.name.as_deref() == Some(name))
    }
}

/// A declaration that can carry attributes.
pub trait Declaration {
    fn declared_name(&self) -> &str;
    fn attributes(&self) -> &[Attribute];
    fn location(&self) -> SourceLocation;
}

macro_rules! impl_declaration {
    ($($ty:ty),*) => {
        $(impl Declaration for $ty {
            fn declared_name(&self) -> &str {
                &self.name
            }

            fn attributes(&self) -> &[Attribute] {
                &self.attributes
            }

            fn location(&self) -> SourceLocation {
                self.location
            }
        })*
    };
}

impl_declaration!(TypeDecl, FieldDecl, MethodDecl, ParamDecl);

/// The symbol resolution oracle of the host-language front end.
///
/// Implementations must be reentrant; effects and shader methods may be compiled in parallel
/// against the same resolver.
pub trait SymbolResolver: Sync {
    /// Resolve the static type of an expression.
    fn resolve_type(&self, expr: &Expr) -> Option<TypeRef>;

    /// Resolve the symbol an expression refers to. For invocations, this is the invoked method.
    fn resolve_symbol(&self, expr: &Expr) -> Option<Symbol>;

    /// Get the value of an expression if it is a compile-time constant.
    fn constant_value(&self, expr: &Expr) -> Option<ConstValue>;

    fn is_constant(&self, expr: &Expr) -> bool {
        self.constant_value(expr).is_some()
    }

    /// Get the resolved attributes of a declaration.
    fn attributes_of(&self, decl: &dyn Declaration) -> Vec<ResolvedAttribute>;
}

/// A resolver that answers from the [`Annotation`](crate::Annotation)s of the tree.
///
/// Missing annotations are filled in where the tree alone is enough: literal types, constant
/// folding over literals, `nameof`, and invocation targets whose receiver and arguments
/// are typed.
#[derive(Debug, Default, Copy, Clone)]
pub struct AnnotatedResolver;

impl AnnotatedResolver {
    fn infer_method(&self, callee: &Expr, arguments: &[crate::Argument]) -> Option<Symbol> {
        let ExprKind::MemberAccess { target, member } = &callee.unparenthesized().kind else {
            return None;
        };

        let (declaring_type, is_static) = match self.resolve_symbol(target) {
            Some(Symbol::Type { name }) => (name, true),
            _ => (self.resolve_type(target)?.to_string(), false),
        };

        let parameter_types = arguments
            .iter()
            .map(|argument| self.resolve_type(&argument.value).map(|ty| ty.to_string()))
            .collect::<Option<Vec<_>>>()?;

        Some(Symbol::Method(MethodRef {
            declaring_type,
            name: member.clone(),
            parameter_types,
            is_static,
        }))
    }

    fn fold(&self, expr: &Expr) -> Option<ConstValue> {
        if let Some(constant) = &expr.annotation.constant {
            return Some(constant.clone());
        }

        match &expr.kind {
            ExprKind::Literal(literal) => Some(match literal {
                Literal::Bool(value) => ConstValue::Bool(*value),
                Literal::Int(value) => ConstValue::Int(*value),
                Literal::Float(value) => ConstValue::Float(*value),
                Literal::String(value) => ConstValue::String(value.clone()),
            }),
            ExprKind::Parenthesized(inner) => self.fold(inner),
            ExprKind::Unary { op, operand } => {
                let value = self.fold(operand)?;
                match (op, value) {
                    (UnaryOp::Plus, value @ (ConstValue::Int(_) | ConstValue::Float(_))) => {
                        Some(value)
                    }
                    (UnaryOp::Neg, ConstValue::Int(value)) => value.checked_neg().map(ConstValue::Int),
                    (UnaryOp::Neg, ConstValue::Float(value)) => Some(ConstValue::Float(-value)),
                    (UnaryOp::Not, ConstValue::Bool(value)) => Some(ConstValue::Bool(!value)),
                    (UnaryOp::BitNot, ConstValue::Int(value)) => Some(ConstValue::Int(!value)),
                    _ => None,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                fold_binary(*op, self.fold(lhs)?, self.fold(rhs)?)
            }
            ExprKind::Cast { ty, operand } => {
                let value = self.fold(operand)?;
                match (ty.name()?, value) {
                    ("int" | "Int32", ConstValue::Float(value)) => {
                        Some(ConstValue::Int(value.trunc() as i64))
                    }
                    ("float" | "Single", ConstValue::Int(value)) => {
                        Some(ConstValue::Float(value as f64))
                    }
                    (_, value) => Some(value),
                }
            }
            ExprKind::Invocation { callee, arguments } => match (&callee.kind, &arguments[..]) {
                (ExprKind::Identifier(name), [argument]) if name == "nameof" => {
                    match &argument.value.unparenthesized().kind {
                        ExprKind::Identifier(name) => Some(ConstValue::String(name.clone())),
                        ExprKind::MemberAccess { member, .. } => {
                            Some(ConstValue::String(member.clone()))
                        }
                        _ => None,
                    }
                }
                _ => None,
            },
            _ => None,
        }
    }
}

fn fold_binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use ConstValue::*;
    match (lhs, rhs) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Int),
            BinaryOp::Sub => a.checked_sub(b).map(Int),
            BinaryOp::Mul => a.checked_mul(b).map(Int),
            BinaryOp::Div => a.checked_div(b).map(Int),
            BinaryOp::Rem => a.checked_rem(b).map(Int),
            BinaryOp::BitAnd => Some(Int(a & b)),
            BinaryOp::BitOr => Some(Int(a | b)),
            BinaryOp::BitXor => Some(Int(a ^ b)),
            BinaryOp::Shl => u32::try_from(b).ok().and_then(|b| a.checked_shl(b)).map(Int),
            BinaryOp::Shr => u32::try_from(b).ok().and_then(|b| a.checked_shr(b)).map(Int),
            BinaryOp::Less => Some(Bool(a < b)),
            BinaryOp::LessEq => Some(Bool(a <= b)),
            BinaryOp::Greater => Some(Bool(a > b)),
            BinaryOp::GreaterEq => Some(Bool(a >= b)),
            BinaryOp::Eq => Some(Bool(a == b)),
            BinaryOp::NotEq => Some(Bool(a != b)),
            _ => None,
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::And => Some(Bool(a && b)),
            BinaryOp::Or => Some(Bool(a || b)),
            BinaryOp::Eq => Some(Bool(a == b)),
            BinaryOp::NotEq => Some(Bool(a != b)),
            _ => None,
        },
        (lhs @ (Int(_) | Float(_)), rhs @ (Int(_) | Float(_))) => {
            let a = lhs.as_float()?;
            let b = rhs.as_float()?;
            match op {
                BinaryOp::Add => Some(Float(a + b)),
                BinaryOp::Sub => Some(Float(a - b)),
                BinaryOp::Mul => Some(Float(a * b)),
                BinaryOp::Div => Some(Float(a / b)),
                BinaryOp::Less => Some(Bool(a < b)),
                BinaryOp::LessEq => Some(Bool(a <= b)),
                BinaryOp::Greater => Some(Bool(a > b)),
                BinaryOp::GreaterEq => Some(Bool(a >= b)),
                _ => None,
            }
        }
        _ => None,
    }
}

impl SymbolResolver for AnnotatedResolver {
    fn resolve_type(&self, expr: &Expr) -> Option<TypeRef> {
        if let Some(ty) = &expr.annotation.ty {
            return Some(ty.clone());
        }

        match &expr.kind {
            ExprKind::Literal(Literal::Bool(_)) => Some(TypeRef::named("bool")),
            ExprKind::Literal(Literal::Int(_)) => Some(TypeRef::named("int")),
            ExprKind::Literal(Literal::Float(_)) => Some(TypeRef::named("float")),
            ExprKind::Literal(Literal::String(_)) => Some(TypeRef::named("string")),
            ExprKind::Parenthesized(inner) => self.resolve_type(inner),
            ExprKind::ObjectCreation { ty, .. } | ExprKind::Cast { ty, .. } => Some(ty.clone()),
            _ => None,
        }
    }

    fn resolve_symbol(&self, expr: &Expr) -> Option<Symbol> {
        if let Some(symbol) = &expr.annotation.symbol {
            return Some(symbol.clone());
        }

        match &expr.kind {
            ExprKind::Invocation { callee, arguments } => self.infer_method(callee, arguments),
            _ => None,
        }
    }

    fn constant_value(&self, expr: &Expr) -> Option<ConstValue> {
        self.fold(expr)
    }

    fn attributes_of(&self, decl: &dyn Declaration) -> Vec<ResolvedAttribute> {
        decl.attributes()
            .iter()
            .map(|attribute| {
                let name = attribute
                    .name
                    .rsplit('.')
                    .next()
                    .unwrap_or(&attribute.name);
                let name = match name.strip_suffix("Attribute") {
                    Some(stripped) if !stripped.is_empty() => stripped,
                    _ => name,
                };

                ResolvedAttribute {
                    name: name.to_string(),
                    arguments: attribute
                        .arguments
                        .iter()
                        .map(|argument| ResolvedArgument {
                            name: argument.name.clone(),
                            value: self.constant_value(&argument.value),
                        })
                        .collect(),
                    location: attribute.location,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::*;

    #[test]
    fn folds_negative_index() {
        let resolver = AnnotatedResolver;
        let expr = Expr::unary(UnaryOp::Neg, Expr::int(1));
        assert_eq!(resolver.constant_value(&expr), Some(ConstValue::Int(-1)));

        let expr = Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2));
        assert_eq!(resolver.constant_value(&expr), Some(ConstValue::Int(3)));
        assert!(!resolver.is_constant(&Expr::ident("x")));
    }

    #[test]
    fn folds_nameof() {
        let resolver = AnnotatedResolver;
        let expr = Expr::call(Expr::ident("nameof"), vec![Expr::ident("VertexMain")]);
        assert_eq!(
            resolver.constant_value(&expr),
            Some(ConstValue::String("VertexMain".into()))
        );
    }

    #[test]
    fn canonicalizes_attribute_names() {
        let resolver = AnnotatedResolver;
        let field = FieldDecl::new("Tint", TypeRef::named("Vector4"))
            .with_attribute(Attribute::new("Effects.ConstantAttribute").with_argument(Expr::string("Material")));
        let attributes = resolver.attributes_of(&field);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].name, "Constant");
        assert_eq!(
            attributes[0].positional(0).and_then(|a| a.value.clone()),
            Some(ConstValue::String("Material".into()))
        );
    }

    #[test]
    fn infers_static_invocation() {
        let resolver = AnnotatedResolver;
        let expr = Expr::call(
            Expr::member(Expr::type_name("MathF"), "Sin"),
            vec![Expr::float(1.0)],
        );
        assert_eq!(
            resolver.resolve_symbol(&expr),
            Some(Symbol::Method(MethodRef {
                declaring_type: "MathF".into(),
                name: "Sin".into(),
                parameter_types: vec!["float".into()],
                is_static: true,
            }))
        );
    }

    #[test]
    fn untyped_arguments_do_not_resolve() {
        let resolver = AnnotatedResolver;
        let expr = Expr::call(
            Expr::member(Expr::type_name("MathF"), "Sin"),
            vec![Expr::ident("x")],
        );
        assert_eq!(resolver.resolve_symbol(&expr), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn tree_survives_json() {
        let file = SourceFile::new("Basic.cs").with_type(
            TypeDecl::new("Basic")
                .with_base("Effect")
                .with_member(FieldDecl::new("Pi", TypeRef::named("float")).with_initializer(Expr::float(2.5))),
        );
        let json = serde_json::to_string(&file).unwrap();
        let back: SourceFile = serde_json::from_str(&json).unwrap();
        assert_eq!(file, back);
    }
}
