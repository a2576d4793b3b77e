use super::{ConstructKind, Context};
use crate::intrinsics::Intrinsic;
use crate::reflect::builder::data_type;
use crate::reflect::{ParameterDirection, ShaderMethod};
use crate::scope::{is_known_type, static_property, swizzle, Binding, Scope};
use crate::RESERVED_PREFIX;
use effectc_common::map::FastHashSet;
use effectc_common::{DataType, ShaderType};
use effectc_syntax::{
    Argument, Expr, ExprKind, SourceLocation, Stmt, StmtKind, TypeRef, VariableDeclaration,
};
use std::str::FromStr;

/// Check the body of one shader method against the shader subset.
pub(super) fn check_body(cx: &Context, method: &ShaderMethod) {
    let mut checker = BodyChecker {
        cx,
        method,
        scope: Scope::new(cx.effect, method, cx.resolver),
        member_names: cx.member_names(),
    };
    checker.check_stmts(&method.body);
}

struct BodyChecker<'a> {
    cx: &'a Context<'a>,
    method: &'a ShaderMethod,
    scope: Scope<'a>,
    member_names: FastHashSet<&'a str>,
}

impl BodyChecker<'_> {
    fn error(&self, location: SourceLocation, message: String) {
        self.cx.error(location, message)
    }

    fn unsupported(&self, location: SourceLocation, construct: ConstructKind) {
        self.error(location, format!("unsupported feature: {}", construct.name()))
    }

    fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        if let Some(construct) = ConstructKind::of_stmt(&stmt.kind) {
            self.unsupported(stmt.location, construct);
            return;
        }

        match &stmt.kind {
            StmtKind::Block(stmts) => self.check_stmts(stmts),
            StmtKind::Expression(expr) => self.check_expr(expr),
            StmtKind::Declaration(declaration) => {
                self.check_declaration(declaration, stmt.location)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
                self.check_expr(condition);
                self.check_stmt(body);
            }
            StmtKind::For {
                initializers,
                condition,
                increments,
                body,
            } => {
                self.check_stmts(initializers);
                if let Some(condition) = condition {
                    self.check_expr(condition);
                }
                for increment in increments {
                    self.check_expr(increment);
                }
                self.check_stmt(body);
            }
            StmtKind::Return(Some(value)) => {
                self.error(
                    stmt.location,
                    format!("shader method '{}' cannot return a value", self.method.name),
                );
                self.check_expr(value);
            }
            _ => {}
        }
    }

    fn check_declaration(&mut self, declaration: &VariableDeclaration, location: SourceLocation) {
        for declarator in &declaration.declarators {
            let location = if declarator.location == SourceLocation::default() {
                location
            } else {
                declarator.location
            };

            if let Some(initializer) = &declarator.initializer {
                self.check_expr(initializer);
            }

            let ty = match (&declaration.ty, &declarator.initializer) {
                (TypeRef::Inferred, Some(initializer)) => self.scope.type_of(initializer),
                (ty, _) => data_type(ty),
            };
            if !ty.is_value_type() {
                let spelled = match &declaration.ty {
                    TypeRef::Inferred => ty.to_string(),
                    declared => declared.to_string(),
                };
                self.error(
                    location,
                    format!(
                        "local variable '{}' has unsupported type '{}'",
                        declarator.name, spelled
                    ),
                );
            }

            self.check_local_name(&declarator.name, location);
            self.scope.declare(&declarator.name, ty);
        }
    }

    fn check_local_name(&self, name: &str, location: SourceLocation) {
        if name.starts_with(RESERVED_PREFIX) {
            self.error(
                location,
                format!("identifier '{name}' uses the reserved prefix {RESERVED_PREFIX}"),
            );
        }
        if self.member_names.contains(name) {
            self.error(
                location,
                format!("local variable '{name}' shadows effect member '{name}'"),
            );
        } else if self.method.parameter(name).is_some() {
            self.error(
                location,
                format!("local variable '{name}' shadows parameter '{name}'"),
            );
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        if let Some(construct) = ConstructKind::of_expr(&expr.kind) {
            self.unsupported(expr.location, construct);
            return;
        }

        match &expr.kind {
            ExprKind::Identifier(name) => {
                if self.scope.lookup(name).is_none() && !is_known_type(name) {
                    self.error(
                        expr.location,
                        format!(
                            "'{}' is not accessible from shader method '{}'",
                            name, self.method.name
                        ),
                    );
                }
            }
            ExprKind::MemberAccess { target, member } => {
                self.check_member_access(target, member, expr.location)
            }
            ExprKind::Index { target, index } => {
                self.check_expr(target);
                self.check_expr(index);
                self.check_bounds(target, index, expr.location);
            }
            ExprKind::Invocation { callee, arguments } => {
                self.check_invocation(expr, callee, arguments)
            }
            ExprKind::ObjectCreation { ty, arguments, .. } => {
                self.check_construction(ty, arguments, expr.location)
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            ExprKind::Unary { op, operand } => {
                self.check_expr(operand);
                if op.is_mutating() {
                    self.check_assignable(operand);
                }
            }
            ExprKind::Assignment { target, value, .. } => {
                self.check_expr(target);
                self.check_expr(value);
                self.check_assignable(target);
            }
            ExprKind::Conditional {
                condition,
                then_value,
                else_value,
            } => {
                self.check_expr(condition);
                self.check_expr(then_value);
                self.check_expr(else_value);
            }
            ExprKind::Cast { ty, operand } => {
                if !data_type(ty).is_value_type() {
                    self.error(expr.location, format!("cast to '{ty}' is not supported"));
                }
                self.check_expr(operand);
            }
            ExprKind::Parenthesized(inner) => self.check_expr(inner),
            _ => {}
        }
    }

    fn check_member_access(&mut self, target: &Expr, member: &str, location: SourceLocation) {
        if let Some(receiver) = self.scope.static_receiver(target) {
            let ty = DataType::from_str(&receiver).unwrap_or_default();
            if static_property(ty, member).is_none() {
                self.error(
                    location,
                    format!("static member '{receiver}.{member}' is not supported in shaders"),
                );
            }
            return;
        }

        self.check_expr(target);
        if let Some(literal) = self.scope.array_literal(target) {
            self.error(
                location,
                format!(
                    "'{member}' is not a member of array literal '{}' usable in shaders",
                    literal.name
                ),
            );
            return;
        }
        let ty = self.scope.type_of(target);
        if swizzle(member, ty).is_none() {
            self.error(
                location,
                format!("'{member}' is not a member of {ty} usable in shaders"),
            );
        }
    }

    fn check_bounds(&self, target: &Expr, index: &Expr, location: SourceLocation) {
        let Some(value) = self
            .cx
            .resolver
            .constant_value(index)
            .and_then(|value| value.as_int())
        else {
            return;
        };

        if value < 0 {
            self.error(location, format!("negative index {value}"));
            return;
        }

        if let Some(literal) = self.scope.array_literal(target) {
            let len = literal.len().unwrap_or_default();
            if value as usize >= len {
                self.error(
                    location,
                    format!(
                        "index {value} is out of range for {} with {len} elements",
                        literal.name
                    ),
                );
            }
            return;
        }

        let ty = self.scope.type_of(target);
        if let Some(bound) = ty.index_bound() {
            if value >= i64::from(bound) {
                self.error(
                    location,
                    format!("index {value} is out of range for {ty} with {bound} components"),
                );
            }
        }
    }

    fn check_arguments(&mut self, arguments: &[Argument]) {
        for argument in arguments {
            if let Some(construct) = ConstructKind::of_argument(argument) {
                self.unsupported(argument.value.location, construct);
            }
            self.check_expr(&argument.value);
        }
    }

    fn check_invocation(&mut self, expr: &Expr, callee: &Expr, arguments: &[Argument]) {
        self.check_arguments(arguments);

        let Some(call) = self.scope.call(expr) else {
            let name = match &callee.unparenthesized().kind {
                ExprKind::Identifier(name) => name.as_str(),
                _ => "<expression>",
            };
            self.error(
                expr.location,
                format!("invocation of unsupported method '{name}'"),
            );
            return;
        };

        if let Some(receiver) = call.receiver {
            self.check_expr(receiver);
        }
        match call.intrinsic {
            Intrinsic::Unknown => self.error(
                expr.location,
                format!("invocation of unsupported method '{}'", call.method),
            ),
            Intrinsic::SampleTexture
                if call
                    .receiver
                    .is_some_and(|receiver| self.scope.texture(receiver).is_none()) =>
            {
                self.error(
                    expr.location,
                    format!(
                        "'{}' can only be called on a texture of the effect",
                        call.method
                    ),
                )
            }
            intrinsic if intrinsic.is_fragment_only() && self.method.stage == ShaderType::Vertex => {
                self.error(
                    expr.location,
                    format!(
                        "'{}' is only available in fragment shaders, '{}' is a vertex shader",
                        call.method, self.method.name
                    ),
                )
            }
            _ => {}
        }
    }

    fn check_construction(&mut self, ty: &TypeRef, arguments: &[Argument], location: SourceLocation) {
        self.check_arguments(arguments);

        let data = data_type(ty);
        let expected = match data {
            DataType::Matrix => 16,
            DataType::Vector2 | DataType::Vector3 | DataType::Vector4 => {
                data.component_count().unwrap_or_default()
            }
            _ => {
                self.error(
                    location,
                    format!("construction of '{ty}' is not supported in shaders"),
                );
                return;
            }
        };

        let components: Option<Vec<u32>> = arguments
            .iter()
            .map(|argument| components(self.scope.type_of(&argument.value)))
            .collect();
        let Some(components) = components else {
            return;
        };

        let splat = data.is_vector() && components == [1];
        let total: u32 = components.iter().sum();
        if !components.is_empty() && !splat && total != expected {
            self.error(
                location,
                format!("constructor of {data} expects {expected} components, found {total}"),
            );
        }
    }

    fn check_assignable(&self, target: &Expr) {
        let Some(root) = target.root_identifier() else {
            return;
        };

        let message = match self.scope.lookup(root) {
            Some(Binding::Constant(_)) => format!("cannot assign to shader constant '{root}'"),
            Some(Binding::Literal(_)) => format!("cannot assign to shader literal '{root}'"),
            Some(Binding::Texture(_)) => format!("cannot assign to texture '{root}'"),
            Some(Binding::Parameter(parameter))
                if parameter.direction == ParameterDirection::Input =>
            {
                format!(
                    "cannot assign to input parameter '{root}' of '{}'",
                    self.method.name
                )
            }
            _ => return,
        };
        self.error(target.location, message);
    }
}

/// The number of float components a constructor argument contributes.
fn components(ty: DataType) -> Option<u32> {
    match ty {
        DataType::Int => Some(1),
        ty => ty.component_count(),
    }
}
