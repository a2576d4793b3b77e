use crate::error::ShaderCompileError;
use crate::intrinsics::Intrinsic;
use crate::reflect::builder::data_type;
use crate::reflect::{
    ConstantBuffer, EffectClass, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture,
};
use crate::scope::{static_property, swizzle, Binding, Scope};
use crate::validate::ConstructKind;
use effectc_common::{DataType, ShaderType};
use effectc_syntax::{
    BinaryOp, Expr, ExprKind, Literal, Stmt, StmtKind, SymbolResolver, TypeRef,
    VariableDeclaration,
};
use std::fmt::Write;
use std::str::FromStr;

const INDENT: &str = "    ";

/// A rendered expression.
#[derive(Debug, Clone)]
pub(crate) struct Operand {
    pub text: String,
    /// The text needs parentheses to be used as an operand.
    pub compound: bool,
}

impl Operand {
    pub fn atom(text: String) -> Self {
        Operand {
            text,
            compound: false,
        }
    }

    pub fn compound(text: String) -> Self {
        Operand {
            text,
            compound: true,
        }
    }

    pub fn wrapped(&self) -> String {
        if self.compound {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// The rendered initializer of a shader literal.
pub(crate) enum LiteralValue {
    Single(String),
    Array(Vec<String>),
}

/// The hooks through which a target language shapes the shared shader walk.
pub(crate) trait ShaderBackend {
    fn type_name(&self, ty: DataType) -> Result<&'static str, ShaderCompileError>;

    /// A reference to a stage input or output inside the entry point.
    fn parameter(&self, method: &ShaderMethod, parameter: &ShaderParameter) -> String;

    /// A call of an intrinsic from a shader of the given stage. For instance methods the
    /// receiver is the first operand. Texture receivers are the bare texture name.
    fn intrinsic(
        &self,
        stage: ShaderType,
        intrinsic: Intrinsic,
        operands: &[Operand],
    ) -> Result<String, ShaderCompileError>;

    /// `lhs * rhs` where one of the operands is a matrix.
    fn multiply(&self, lhs: &Operand, rhs: &Operand) -> Operand;

    /// `lhs % rhs` over floating point operands.
    fn modulo(&self, lhs: &Operand, rhs: &Operand) -> Operand;

    fn constructor(&self, ty: DataType, arguments: &[String]) -> Result<String, ShaderCompileError>;

    fn cast(&self, ty: DataType, operand: &Operand) -> Result<String, ShaderCompileError>;

    fn return_statement(&self) -> &'static str;

    fn write_header(&mut self, out: &mut String, method: &ShaderMethod) -> Result<(), ShaderCompileError>;

    fn write_literal(
        &mut self,
        out: &mut String,
        literal: &ShaderLiteral,
        value: &LiteralValue,
    ) -> Result<(), ShaderCompileError>;

    fn write_constant_buffer(
        &mut self,
        out: &mut String,
        buffer: &ConstantBuffer,
    ) -> Result<(), ShaderCompileError>;

    fn write_texture(&mut self, out: &mut String, texture: &ShaderTexture) -> Result<(), ShaderCompileError>;

    fn write_stage_interface(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError>;

    fn write_entry_point_begin(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError>;

    /// Close the entry point. `returns` is set if the body already ends with a return.
    fn write_entry_point_end(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
        returns: bool,
    ) -> Result<(), ShaderCompileError>;
}

pub(crate) fn float_literal(value: f64) -> String {
    format!("{value:?}")
}

/// Walks one shader method and writes a complete translation unit through a backend.
///
/// Output is written in a single pass in the order header, literals, constant buffers,
/// textures, stage interface and entry point.
pub(crate) struct ShaderWriter<'a, B> {
    backend: B,
    effect: &'a EffectClass,
    method: &'a ShaderMethod,
    scope: Scope<'a>,
    out: String,
    indent: usize,
}

impl<'a, B: ShaderBackend> ShaderWriter<'a, B> {
    pub fn new(
        backend: B,
        effect: &'a EffectClass,
        method: &'a ShaderMethod,
        resolver: &'a dyn SymbolResolver,
    ) -> Self {
        ShaderWriter {
            backend,
            effect,
            method,
            scope: Scope::new(effect, method, resolver),
            out: String::new(),
            indent: 0,
        }
    }

    pub fn write(mut self) -> Result<(String, B), ShaderCompileError> {
        let effect = self.effect;
        let method = self.method;

        self.backend.write_header(&mut self.out, method)?;

        for literal in &effect.literals {
            let value = self.literal_value(literal)?;
            self.backend.write_literal(&mut self.out, literal, &value)?;
        }
        if !effect.literals.is_empty() {
            self.out.push('\n');
        }

        for buffer in &effect.constant_buffers {
            self.backend.write_constant_buffer(&mut self.out, buffer)?;
        }

        for texture in &effect.textures {
            self.backend.write_texture(&mut self.out, texture)?;
        }
        if !effect.textures.is_empty() {
            self.out.push('\n');
        }

        self.backend.write_stage_interface(&mut self.out, method)?;
        self.backend.write_entry_point_begin(&mut self.out, method)?;
        self.indent = 1;
        for stmt in &method.body {
            self.write_stmt(stmt)?;
        }
        let returns = matches!(
            method.body.last().map(|stmt| &stmt.kind),
            Some(StmtKind::Return(_))
        );
        self.backend
            .write_entry_point_end(&mut self.out, method, returns)?;

        Ok((self.out, self.backend))
    }

    fn literal_value(&self, literal: &ShaderLiteral) -> Result<LiteralValue, ShaderCompileError> {
        match literal.elements() {
            Some(values) => Ok(LiteralValue::Array(
                values
                    .iter()
                    .map(|value| self.expr(value).map(|operand| operand.text))
                    .collect::<Result<_, _>>()?,
            )),
            None => Ok(LiteralValue::Single(self.expr(&literal.value)?.text)),
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Write a statement as a braced block.
    fn write_block(&mut self, stmt: &Stmt) -> Result<(), ShaderCompileError> {
        self.line("{");
        self.indent += 1;
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.write_stmt(stmt)?;
                }
            }
            _ => self.write_stmt(stmt)?,
        }
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    fn write_stmt(&mut self, stmt: &Stmt) -> Result<(), ShaderCompileError> {
        if let Some(construct) = ConstructKind::of_stmt(&stmt.kind) {
            return Err(ShaderCompileError::UnsupportedConstruct(construct.name()));
        }

        match &stmt.kind {
            StmtKind::Block(_) => self.write_block(stmt)?,
            StmtKind::Empty => {}
            StmtKind::Expression(expr) => {
                let text = self.expr(expr)?.text;
                self.line(&format!("{text};"));
            }
            StmtKind::Declaration(declaration) => {
                for declarator in &declaration.declarators {
                    let ty = self.local_type(&declaration.ty, declarator.initializer.as_ref());
                    let type_name = self.backend.type_name(ty)?;
                    let text = match &declarator.initializer {
                        Some(init) => {
                            let init = self.expr(init)?.text;
                            format!("{type_name} {} = {init};", declarator.name)
                        }
                        None => format!("{type_name} {};", declarator.name),
                    };
                    self.scope.declare(&declarator.name, ty);
                    self.line(&text);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.expr(condition)?.text;
                self.line(&format!("if ({condition})"));
                self.write_block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.line("else");
                    self.write_block(else_branch)?;
                }
            }
            StmtKind::While { condition, body } => {
                let condition = self.expr(condition)?.text;
                self.line(&format!("while ({condition})"));
                self.write_block(body)?;
            }
            StmtKind::DoWhile { body, condition } => {
                self.line("do");
                self.write_block(body)?;
                let condition = self.expr(condition)?.text;
                self.line(&format!("while ({condition});"));
            }
            StmtKind::For {
                initializers,
                condition,
                increments,
                body,
            } => {
                let mut parts = Vec::new();
                for init in initializers {
                    parts.push(match &init.kind {
                        StmtKind::Declaration(declaration) => self.inline_declaration(declaration)?,
                        StmtKind::Expression(expr) => self.expr(expr)?.text,
                        _ => return Err(ShaderCompileError::UnsupportedConstruct("for initializer")),
                    });
                }
                let condition = match condition {
                    Some(condition) => self.expr(condition)?.text,
                    None => String::new(),
                };
                let increments = increments
                    .iter()
                    .map(|increment| self.expr(increment).map(|operand| operand.text))
                    .collect::<Result<Vec<_>, _>>()?;

                self.line(&format!(
                    "for ({}; {}; {})",
                    parts.join(", "),
                    condition,
                    increments.join(", ")
                ));
                self.write_block(body)?;
            }
            StmtKind::Return(None) => {
                let text = self.backend.return_statement();
                self.line(text);
            }
            StmtKind::Return(Some(_)) => {
                return Err(ShaderCompileError::UnsupportedConstruct("return value"))
            }
            StmtKind::Break => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
            _ => return Err(ShaderCompileError::UnsupportedConstruct("statement")),
        }
        Ok(())
    }

    fn local_type(&self, ty: &TypeRef, initializer: Option<&Expr>) -> DataType {
        match (ty, initializer) {
            (TypeRef::Inferred, Some(initializer)) => self.scope.type_of(initializer),
            (ty, _) => data_type(ty),
        }
    }

    /// A declaration inside a `for` header, declaring all variables with one type.
    fn inline_declaration(
        &mut self,
        declaration: &VariableDeclaration,
    ) -> Result<String, ShaderCompileError> {
        let first = declaration.declarators.first().and_then(|d| d.initializer.as_ref());
        let ty = self.local_type(&declaration.ty, first);
        let type_name = self.backend.type_name(ty)?;

        let mut declarators = Vec::new();
        for declarator in &declaration.declarators {
            declarators.push(match &declarator.initializer {
                Some(init) => format!("{} = {}", declarator.name, self.expr(init)?.text),
                None => declarator.name.clone(),
            });
            self.scope.declare(&declarator.name, ty);
        }
        Ok(format!("{type_name} {}", declarators.join(", ")))
    }

    fn expr(&self, expr: &Expr) -> Result<Operand, ShaderCompileError> {
        if let Some(construct) = ConstructKind::of_expr(&expr.kind) {
            return Err(ShaderCompileError::UnsupportedConstruct(construct.name()));
        }

        Ok(match &expr.kind {
            ExprKind::Literal(literal) => Operand::atom(match literal {
                Literal::Bool(value) => value.to_string(),
                Literal::Int(value) => value.to_string(),
                Literal::Float(value) => float_literal(*value),
                Literal::String(_) => {
                    return Err(ShaderCompileError::UnsupportedConstruct("string literal"))
                }
            }),
            ExprKind::Identifier(name) => Operand::atom(self.identifier(name)?),
            ExprKind::MemberAccess { target, member } => self.member_access(target, member)?,
            ExprKind::Index { target, index } => {
                let target = self.expr(target)?;
                let index = self.expr(index)?;
                Operand::atom(format!("{}[{}]", target.wrapped(), index.text))
            }
            ExprKind::Invocation { .. } => self.invocation(expr)?,
            ExprKind::ObjectCreation { ty, arguments, .. } => {
                let ty = data_type(ty);
                if !ty.is_vector() && !ty.is_matrix() {
                    return Err(ShaderCompileError::UnknownType(ty.to_string()));
                }
                let arguments = arguments
                    .iter()
                    .map(|argument| self.expr(&argument.value).map(|operand| operand.text))
                    .collect::<Result<Vec<_>, _>>()?;
                Operand::atom(self.backend.constructor(ty, &arguments)?)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.scope.type_of(lhs);
                let rhs_ty = self.scope.type_of(rhs);
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                self.binary(*op, lhs_ty, rhs_ty, &lhs, &rhs)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.expr(operand)?;
                if op.is_postfix() {
                    Operand::atom(format!("{}{}", operand.wrapped(), op.token()))
                } else if operand.text.starts_with(['-', '+']) {
                    Operand::atom(format!("{}({})", op.token(), operand.text))
                } else {
                    Operand::atom(format!("{}{}", op.token(), operand.wrapped()))
                }
            }
            ExprKind::Assignment { op, target, value } => {
                let target_ty = self.scope.type_of(target);
                let value_ty = self.scope.type_of(value);
                let target = self.expr(target)?;
                let value = self.expr(value)?;
                match op.binary_op() {
                    Some(binary) if is_lowered(binary, target_ty, value_ty) => {
                        let expanded = self.binary(binary, target_ty, value_ty, &target, &value);
                        Operand::compound(format!("{} = {}", target.text, expanded.text))
                    }
                    _ => Operand::compound(format!(
                        "{} {} {}",
                        target.text,
                        op.token(),
                        value.text
                    )),
                }
            }
            ExprKind::Conditional {
                condition,
                then_value,
                else_value,
            } => Operand::compound(format!(
                "{} ? {} : {}",
                self.expr(condition)?.wrapped(),
                self.expr(then_value)?.wrapped(),
                self.expr(else_value)?.wrapped()
            )),
            ExprKind::Cast { ty, operand } => {
                let ty = data_type(ty);
                let operand = self.expr(operand)?;
                Operand::atom(self.backend.cast(ty, &operand)?)
            }
            ExprKind::Parenthesized(inner) => {
                Operand::atom(format!("({})", self.expr(inner)?.text))
            }
            _ => return Err(ShaderCompileError::UnsupportedConstruct("expression")),
        })
    }

    /// Lower a binary operator. Matrix products and float remainders go through the backend,
    /// which may spell them as function calls.
    fn binary(
        &self,
        op: BinaryOp,
        lhs_ty: DataType,
        rhs_ty: DataType,
        lhs: &Operand,
        rhs: &Operand,
    ) -> Operand {
        if is_lowered(op, lhs_ty, rhs_ty) {
            return match op {
                BinaryOp::Mul => self.backend.multiply(lhs, rhs),
                _ => self.backend.modulo(lhs, rhs),
            };
        }
        Operand::compound(format!(
            "{} {} {}",
            lhs.wrapped(),
            op.token(),
            rhs.wrapped()
        ))
    }

    fn identifier(&self, name: &str) -> Result<String, ShaderCompileError> {
        match self.scope.lookup(name) {
            Some(Binding::Parameter(parameter)) => {
                Ok(self.backend.parameter(self.method, parameter))
            }
            Some(_) => Ok(name.to_string()),
            None => Err(ShaderCompileError::UnknownIdentifier(name.to_string())),
        }
    }

    fn member_access(&self, target: &Expr, member: &str) -> Result<Operand, ShaderCompileError> {
        if let Some(receiver) = self.scope.static_receiver(target) {
            let ty = DataType::from_str(&receiver).unwrap_or_default();
            let values = static_property(ty, member)
                .ok_or(ShaderCompileError::UnsupportedConstruct("static member"))?;
            let arguments: Vec<String> = values.into_iter().map(float_literal).collect();
            return Ok(Operand::atom(self.backend.constructor(ty, &arguments)?));
        }

        let ty = self.scope.type_of(target);
        let swizzle = swizzle(member, ty)
            .ok_or(ShaderCompileError::UnsupportedConstruct("member access"))?;
        let target = self.expr(target)?;
        Ok(Operand::atom(format!("{}.{}", target.wrapped(), swizzle)))
    }

    fn invocation(&self, expr: &Expr) -> Result<Operand, ShaderCompileError> {
        let call = self
            .scope
            .call(expr)
            .ok_or(ShaderCompileError::UnsupportedConstruct("invocation"))?;
        if call.intrinsic == Intrinsic::Unknown {
            return Err(ShaderCompileError::UnresolvedInvocation(
                call.method.to_string(),
            ));
        }

        let mut operands = Vec::with_capacity(call.arguments.len() + 1);
        match call.receiver {
            Some(receiver) if call.intrinsic == Intrinsic::SampleTexture => {
                let texture = self
                    .scope
                    .texture(receiver)
                    .ok_or(ShaderCompileError::UnsupportedConstruct("texture receiver"))?;
                operands.push(Operand::atom(texture.name.clone()));
            }
            Some(receiver) => operands.push(self.expr(receiver)?),
            None => {}
        }
        for argument in call.arguments {
            operands.push(self.expr(&argument.value)?);
        }
        Ok(Operand::atom(self.backend.intrinsic(
            self.method.stage,
            call.intrinsic,
            &operands,
        )?))
    }
}

/// Whether a binary operator is spelled by the backend rather than as an infix operator.
fn is_lowered(op: BinaryOp, lhs: DataType, rhs: DataType) -> bool {
    let is_float = |ty: DataType| ty == DataType::Float || ty.is_vector();
    match op {
        BinaryOp::Mul => lhs.is_matrix() || rhs.is_matrix(),
        BinaryOp::Rem => is_float(lhs) || is_float(rhs),
        _ => false,
    }
}

/// Append `text` to `out`, indented by `level` steps.
pub(crate) fn write_line(out: &mut String, level: usize, text: impl std::fmt::Display) -> std::fmt::Result {
    for _ in 0..level {
        out.push_str(INDENT);
    }
    writeln!(out, "{text}")
}
