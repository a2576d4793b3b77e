use crate::{Expr, SourceLocation, TypeRef};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

/// A local variable declaration, possibly declaring several variables of the same type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclaration {
    pub ty: TypeRef,
    pub declarators: Vec<VariableDeclarator>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expr>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchSection {
    pub labels: Vec<Option<Expr>>,
    pub body: Vec<Stmt>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub ty: Option<TypeRef>,
    pub body: Vec<Stmt>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Empty,
    Expression(Expr),
    Declaration(VariableDeclaration),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        initializers: Vec<Stmt>,
        condition: Option<Expr>,
        increments: Vec<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,

    // The statements below are part of the host language but never part of a shader.
    Foreach {
        ty: TypeRef,
        name: String,
        collection: Expr,
        body: Box<Stmt>,
    },
    Switch {
        value: Expr,
        sections: Vec<SwitchSection>,
    },
    Checked(Vec<Stmt>),
    Unchecked(Vec<Stmt>),
    Unsafe(Vec<Stmt>),
    Fixed {
        declaration: VariableDeclaration,
        body: Box<Stmt>,
    },
    Lock {
        value: Expr,
        body: Box<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Option<Expr>),
    Using {
        resource: Box<Stmt>,
        body: Box<Stmt>,
    },
    Goto(String),
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Yield(Option<Expr>),
    LocalFunction {
        name: String,
        body: Vec<Stmt>,
    },
    Preprocessor(String),
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            location: SourceLocation::default(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation::new(line, column);
        self
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::new(StmtKind::Expression(expr))
    }

    pub fn block(statements: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Block(statements))
    }

    /// Declare a single local variable.
    pub fn local(ty: TypeRef, name: impl Into<String>, initializer: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Declaration(VariableDeclaration {
            ty,
            declarators: vec![VariableDeclarator {
                name: name.into(),
                initializer,
                location: SourceLocation::default(),
            }],
        }))
    }

    pub fn if_then(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Stmt::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Stmt::new(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn for_loop(
        initializers: Vec<Stmt>,
        condition: Option<Expr>,
        increments: Vec<Expr>,
        body: Stmt,
    ) -> Self {
        Stmt::new(StmtKind::For {
            initializers,
            condition,
            increments,
            body: Box::new(body),
        })
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Return(value))
    }
}
