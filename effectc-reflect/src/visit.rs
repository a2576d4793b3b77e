use effectc_syntax::{Expr, ExprKind, Stmt, StmtKind};

/// Call `f` for every expression reachable through the shader subset of the statements,
/// outer expressions before their operands.
///
/// Statements and expressions outside of the subset are not descended into.
pub(crate) fn for_each_expr<'a>(stmts: &'a [Stmt], f: &mut impl FnMut(&'a Expr)) {
    for stmt in stmts {
        walk_stmt(stmt, f);
    }
}

fn walk_stmt<'a>(stmt: &'a Stmt, f: &mut impl FnMut(&'a Expr)) {
    match &stmt.kind {
        StmtKind::Block(stmts) => for_each_expr(stmts, f),
        StmtKind::Expression(expr) => walk_expr(expr, f),
        StmtKind::Declaration(decl) => {
            for declarator in &decl.declarators {
                if let Some(init) = &declarator.initializer {
                    walk_expr(init, f);
                }
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            walk_expr(condition, f);
            walk_stmt(then_branch, f);
            if let Some(else_branch) = else_branch {
                walk_stmt(else_branch, f);
            }
        }
        StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
            walk_expr(condition, f);
            walk_stmt(body, f);
        }
        StmtKind::For {
            initializers,
            condition,
            increments,
            body,
        } => {
            for_each_expr(initializers, f);
            if let Some(condition) = condition {
                walk_expr(condition, f);
            }
            for increment in increments {
                walk_expr(increment, f);
            }
            walk_stmt(body, f);
        }
        StmtKind::Return(Some(value)) => walk_expr(value, f),
        _ => {}
    }
}

pub(crate) fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::MemberAccess { target, .. } => walk_expr(target, f),
        ExprKind::Index { target, index } => {
            walk_expr(target, f);
            walk_expr(index, f);
        }
        ExprKind::Invocation { callee, arguments } => {
            walk_expr(callee, f);
            for argument in arguments {
                walk_expr(&argument.value, f);
            }
        }
        ExprKind::ObjectCreation { arguments, .. } => {
            for argument in arguments {
                walk_expr(&argument.value, f);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, f);
            walk_expr(rhs, f);
        }
        ExprKind::Assignment { target, value, .. } => {
            walk_expr(target, f);
            walk_expr(value, f);
        }
        ExprKind::Conditional {
            condition,
            then_value,
            else_value,
        } => {
            walk_expr(condition, f);
            walk_expr(then_value, f);
            walk_expr(else_value, f);
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::Cast { operand, .. }
        | ExprKind::Parenthesized(operand) => walk_expr(operand, f),
        _ => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use effectc_syntax::{BinaryOp, TypeRef};

    #[test]
    fn visits_nested_identifiers() {
        let body = vec![
            Stmt::local(
                TypeRef::named("float"),
                "x",
                Some(Expr::binary(BinaryOp::Mul, Expr::ident("a"), Expr::ident("b"))),
            ),
            Stmt::if_then(
                Expr::ident("c"),
                Stmt::block(vec![Stmt::expr(Expr::assign(Expr::ident("x"), Expr::ident("d")))]),
                None,
            ),
        ];

        let mut names = Vec::new();
        for_each_expr(&body, &mut |expr| {
            if let ExprKind::Identifier(name) = &expr.kind {
                names.push(name.as_str());
            }
        });
        assert_eq!(names, vec!["a", "b", "c", "x", "d"]);
    }
}
