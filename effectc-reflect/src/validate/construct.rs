use effectc_syntax::{
    Argument, AssignOp, BinaryOp, ExprKind, Literal, ParamModifier, StmtKind,
};

/// A host-language construct that is never allowed in a shader body.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConstructKind {
    PreprocessorDirective,
    CheckedBlock,
    UncheckedBlock,
    UnsafeBlock,
    Fixed,
    Lock,
    Try,
    Throw,
    Using,
    Goto,
    Label,
    Switch,
    Foreach,
    Yield,
    LocalFunction,
    This,
    Base,
    Null,
    AnonymousType,
    Lambda,
    AnonymousMethod,
    ArrayCreation,
    ArrayInitializer,
    ObjectInitializer,
    PointerMemberAccess,
    AddressOf,
    Dereference,
    SizeOf,
    TypeOf,
    Default,
    As,
    Is,
    Query,
    Await,
    CheckedExpression,
    UncheckedExpression,
    StackAlloc,
    InterpolatedString,
    ThrowExpression,
    StringLiteral,
    NullCoalescing,
    NamedArgument,
    ReferenceArgument,
}

impl ConstructKind {
    /// The name used in `unsupported feature` diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            ConstructKind::PreprocessorDirective => "preprocessor directive",
            ConstructKind::CheckedBlock => "checked",
            ConstructKind::UncheckedBlock => "unchecked",
            ConstructKind::UnsafeBlock => "unsafe",
            ConstructKind::Fixed => "fixed",
            ConstructKind::Lock => "lock",
            ConstructKind::Try => "try",
            ConstructKind::Throw => "throw",
            ConstructKind::Using => "using",
            ConstructKind::Goto => "goto",
            ConstructKind::Label => "label",
            ConstructKind::Switch => "switch",
            ConstructKind::Foreach => "foreach",
            ConstructKind::Yield => "yield",
            ConstructKind::LocalFunction => "local function",
            ConstructKind::This => "this",
            ConstructKind::Base => "base",
            ConstructKind::Null => "null",
            ConstructKind::AnonymousType => "anonymous type",
            ConstructKind::Lambda => "lambda",
            ConstructKind::AnonymousMethod => "anonymous method",
            ConstructKind::ArrayCreation => "array creation",
            ConstructKind::ArrayInitializer => "array initializer",
            ConstructKind::ObjectInitializer => "object initializer",
            ConstructKind::PointerMemberAccess => "pointer member access",
            ConstructKind::AddressOf => "address-of",
            ConstructKind::Dereference => "dereference",
            ConstructKind::SizeOf => "sizeof",
            ConstructKind::TypeOf => "typeof",
            ConstructKind::Default => "default",
            ConstructKind::As => "as",
            ConstructKind::Is => "is",
            ConstructKind::Query => "query expression",
            ConstructKind::Await => "await",
            ConstructKind::CheckedExpression => "checked expression",
            ConstructKind::UncheckedExpression => "unchecked expression",
            ConstructKind::StackAlloc => "stackalloc",
            ConstructKind::InterpolatedString => "interpolated string",
            ConstructKind::ThrowExpression => "throw expression",
            ConstructKind::StringLiteral => "string literal",
            ConstructKind::NullCoalescing => "null-coalescing operator",
            ConstructKind::NamedArgument => "named argument",
            ConstructKind::ReferenceArgument => "ref argument",
        }
    }

    pub fn of_stmt(kind: &StmtKind) -> Option<ConstructKind> {
        Some(match kind {
            StmtKind::Preprocessor(_) => ConstructKind::PreprocessorDirective,
            StmtKind::Checked(_) => ConstructKind::CheckedBlock,
            StmtKind::Unchecked(_) => ConstructKind::UncheckedBlock,
            StmtKind::Unsafe(_) => ConstructKind::UnsafeBlock,
            StmtKind::Fixed { .. } => ConstructKind::Fixed,
            StmtKind::Lock { .. } => ConstructKind::Lock,
            StmtKind::Try { .. } => ConstructKind::Try,
            StmtKind::Throw(_) => ConstructKind::Throw,
            StmtKind::Using { .. } => ConstructKind::Using,
            StmtKind::Goto(_) => ConstructKind::Goto,
            StmtKind::Labeled { .. } => ConstructKind::Label,
            StmtKind::Switch { .. } => ConstructKind::Switch,
            StmtKind::Foreach { .. } => ConstructKind::Foreach,
            StmtKind::Yield(_) => ConstructKind::Yield,
            StmtKind::LocalFunction { .. } => ConstructKind::LocalFunction,
            StmtKind::Block(_)
            | StmtKind::Empty
            | StmtKind::Expression(_)
            | StmtKind::Declaration(_)
            | StmtKind::If { .. }
            | StmtKind::While { .. }
            | StmtKind::DoWhile { .. }
            | StmtKind::For { .. }
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue => return None,
        })
    }

    /// The construct an expression node is, looking only at the node itself.
    pub fn of_expr(kind: &ExprKind) -> Option<ConstructKind> {
        Some(match kind {
            ExprKind::This => ConstructKind::This,
            ExprKind::Base => ConstructKind::Base,
            ExprKind::Null => ConstructKind::Null,
            ExprKind::AnonymousObject(_) => ConstructKind::AnonymousType,
            ExprKind::Lambda { .. } => ConstructKind::Lambda,
            ExprKind::AnonymousMethod { .. } => ConstructKind::AnonymousMethod,
            ExprKind::ArrayCreation { .. } => ConstructKind::ArrayCreation,
            ExprKind::ArrayInitializer(_) => ConstructKind::ArrayInitializer,
            ExprKind::ObjectCreation {
                initializer: Some(_),
                ..
            } => ConstructKind::ObjectInitializer,
            ExprKind::PointerMemberAccess { .. } => ConstructKind::PointerMemberAccess,
            ExprKind::AddressOf(_) => ConstructKind::AddressOf,
            ExprKind::Dereference(_) => ConstructKind::Dereference,
            ExprKind::SizeOf(_) => ConstructKind::SizeOf,
            ExprKind::TypeOf(_) => ConstructKind::TypeOf,
            ExprKind::Default(_) => ConstructKind::Default,
            ExprKind::As { .. } => ConstructKind::As,
            ExprKind::Is { .. } => ConstructKind::Is,
            ExprKind::Query(_) => ConstructKind::Query,
            ExprKind::Await(_) => ConstructKind::Await,
            ExprKind::Checked(_) => ConstructKind::CheckedExpression,
            ExprKind::Unchecked(_) => ConstructKind::UncheckedExpression,
            ExprKind::StackAlloc { .. } => ConstructKind::StackAlloc,
            ExprKind::InterpolatedString(_) => ConstructKind::InterpolatedString,
            ExprKind::Throw(_) => ConstructKind::ThrowExpression,
            ExprKind::Literal(Literal::String(_)) => ConstructKind::StringLiteral,
            ExprKind::Binary {
                op: BinaryOp::NullCoalesce,
                ..
            }
            | ExprKind::Assignment {
                op: AssignOp::NullCoalesce,
                ..
            } => ConstructKind::NullCoalescing,
            _ => return None,
        })
    }

    pub fn of_argument(argument: &Argument) -> Option<ConstructKind> {
        if argument.name.is_some() {
            Some(ConstructKind::NamedArgument)
        } else if argument.modifier != ParamModifier::None {
            Some(ConstructKind::ReferenceArgument)
        } else {
            None
        }
    }
}
