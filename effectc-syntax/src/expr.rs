use crate::{ConstValue, ParamModifier, SourceLocation, Stmt, Symbol, TypeRef};

/// Resolution results attached to an expression by the front end.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    pub ty: Option<TypeRef>,
    pub symbol: Option<Symbol>,
    pub constant: Option<ConstValue>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotation: Annotation,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifier: ParamModifier,
    pub value: Expr,
}

impl From<Expr> for Argument {
    fn from(value: Expr) -> Self {
        Argument {
            name: None,
            modifier: ParamModifier::None,
            value,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eq,
    NotEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    NullCoalesce,
}

impl BinaryOp {
    pub const fn token(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::NullCoalesce => "??",
        }
    }

    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
                | BinaryOp::Eq
                | BinaryOp::NotEq
        )
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub const fn token(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        }
    }

    pub const fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }

    /// Whether the operator writes to its operand.
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    NullCoalesce,
}

impl AssignOp {
    pub const fn token(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::NullCoalesce => "??=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub const fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
            AssignOp::BitAnd => Some(BinaryOp::BitAnd),
            AssignOp::BitOr => Some(BinaryOp::BitOr),
            AssignOp::BitXor => Some(BinaryOp::BitXor),
            AssignOp::Shl => Some(BinaryOp::Shl),
            AssignOp::Shr => Some(BinaryOp::Shr),
            AssignOp::NullCoalesce => Some(BinaryOp::NullCoalesce),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum QueryClauseKind {
    From,
    Where,
    Select,
    OrderBy,
    GroupBy,
    Join,
    Let,
    Into,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct QueryClause {
    pub kind: QueryClauseKind,
    pub value: Expr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    MemberAccess {
        target: Box<Expr>,
        member: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Invocation {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
    },
    ObjectCreation {
        ty: TypeRef,
        arguments: Vec<Argument>,
        initializer: Option<Vec<Expr>>,
    },
    ArrayCreation {
        element: TypeRef,
        size: Option<Box<Expr>>,
        initializer: Option<Vec<Expr>>,
    },
    /// A bare `{ a, b, c }` initializer.
    ArrayInitializer(Vec<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Assignment {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        operand: Box<Expr>,
    },
    Parenthesized(Box<Expr>),

    // The expressions below are part of the host language but never part of a shader.
    This,
    Base,
    Null,
    AnonymousObject(Vec<(String, Expr)>),
    Lambda {
        parameters: Vec<String>,
        body: Vec<Stmt>,
    },
    AnonymousMethod {
        parameters: Vec<String>,
        body: Vec<Stmt>,
    },
    PointerMemberAccess {
        target: Box<Expr>,
        member: String,
    },
    AddressOf(Box<Expr>),
    Dereference(Box<Expr>),
    SizeOf(TypeRef),
    TypeOf(TypeRef),
    Default(Option<TypeRef>),
    As {
        operand: Box<Expr>,
        ty: TypeRef,
    },
    Is {
        operand: Box<Expr>,
        ty: TypeRef,
    },
    Query(Vec<QueryClause>),
    Await(Box<Expr>),
    Checked(Box<Expr>),
    Unchecked(Box<Expr>),
    StackAlloc {
        element: TypeRef,
        size: Box<Expr>,
    },
    InterpolatedString(Vec<Expr>),
    Throw(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            location: SourceLocation::default(),
            annotation: Annotation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }

    /// Annotate the resolved type of this expression.
    pub fn typed(mut self, ty: impl Into<String>) -> Self {
        self.annotation.ty = Some(TypeRef::named(ty));
        self
    }

    /// Annotate the resolved symbol of this expression.
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.annotation.symbol = Some(symbol);
        self
    }

    /// Annotate the compile-time constant value of this expression.
    pub fn with_constant(mut self, value: ConstValue) -> Self {
        self.annotation.constant = Some(value);
        self
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Identifier(name.into()))
    }

    /// A reference to a type, for static member access.
    pub fn type_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Expr::new(ExprKind::Identifier(name.clone())).with_symbol(Symbol::Type { name })
    }

    pub fn float(value: f64) -> Self {
        Expr::new(ExprKind::Literal(Literal::Float(value)))
    }

    pub fn int(value: i64) -> Self {
        Expr::new(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn bool(value: bool) -> Self {
        Expr::new(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::Literal(Literal::String(value.into())))
    }

    pub fn member(target: Expr, member: impl Into<String>) -> Self {
        Expr::new(ExprKind::MemberAccess {
            target: Box::new(target),
            member: member.into(),
        })
    }

    pub fn index(target: Expr, index: Expr) -> Self {
        Expr::new(ExprKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Invocation {
            callee: Box::new(callee),
            arguments: arguments.into_iter().map(Argument::from).collect(),
        })
    }

    pub fn new_object(ty: impl Into<String>, arguments: Vec<Expr>) -> Self {
        Expr::new(ExprKind::ObjectCreation {
            ty: TypeRef::named(ty),
            arguments: arguments.into_iter().map(Argument::from).collect(),
            initializer: None,
        })
    }

    pub fn new_array(element: impl Into<String>, values: Vec<Expr>) -> Self {
        Expr::new(ExprKind::ArrayCreation {
            element: TypeRef::named(element),
            size: None,
            initializer: Some(values),
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::compound_assign(AssignOp::Assign, target, value)
    }

    pub fn compound_assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        Expr::new(ExprKind::Assignment {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::new(ExprKind::Parenthesized(Box::new(inner)))
    }

    pub fn cast(ty: impl Into<String>, operand: Expr) -> Self {
        Expr::new(ExprKind::Cast {
            ty: TypeRef::named(ty),
            operand: Box::new(operand),
        })
    }

    pub fn conditional(condition: Expr, then_value: Expr, else_value: Expr) -> Self {
        Expr::new(ExprKind::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        })
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        match &self.kind {
            ExprKind::Parenthesized(inner) => inner.unparenthesized(),
            _ => self,
        }
    }

    /// The identifier at the root of an access path like `a.b[1].c`.
    pub fn root_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            ExprKind::MemberAccess { target, .. } | ExprKind::Index { target, .. } => {
                target.root_identifier()
            }
            ExprKind::Parenthesized(inner) => inner.root_identifier(),
            _ => None,
        }
    }
}
