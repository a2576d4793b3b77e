use crate::intrinsics::{self, Intrinsic};
use crate::reflect::builder::data_type;
use crate::reflect::{EffectClass, ShaderLiteral, ShaderMethod, ShaderParameter, ShaderTexture};
use effectc_common::DataType;
use effectc_syntax::{
    Argument, BinaryOp, Expr, ExprKind, Literal, MethodRef, Symbol, SymbolResolver, UnaryOp,
};
use rustc_hash::FxHashMap;
use std::str::FromStr;

/// What an identifier in a shader body refers to.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Binding<'a> {
    Local(DataType),
    Parameter(&'a ShaderParameter),
    Constant(DataType),
    Literal(&'a ShaderLiteral),
    Texture(DataType),
}

impl Binding<'_> {
    pub fn data_type(&self) -> DataType {
        match self {
            Binding::Local(ty) | Binding::Constant(ty) | Binding::Texture(ty) => *ty,
            Binding::Parameter(parameter) => parameter.ty,
            Binding::Literal(literal) if literal.is_array() => DataType::Unknown,
            Binding::Literal(literal) => literal.ty,
        }
    }
}

/// A resolved method invocation.
pub(crate) struct Call<'e> {
    pub method: MethodRef,
    pub intrinsic: Intrinsic,
    /// The receiver of an instance method.
    pub receiver: Option<&'e Expr>,
    pub arguments: &'e [Argument],
}

/// Name and type resolution inside the body of one shader method.
///
/// Locals live in one flat map. Shadowing is rejected by validation, so a name always
/// refers to one thing within a method.
pub(crate) struct Scope<'a> {
    effect: &'a EffectClass,
    method: &'a ShaderMethod,
    resolver: &'a dyn SymbolResolver,
    locals: FxHashMap<String, DataType>,
}

impl<'a> Scope<'a> {
    pub fn new(
        effect: &'a EffectClass,
        method: &'a ShaderMethod,
        resolver: &'a dyn SymbolResolver,
    ) -> Self {
        Scope {
            effect,
            method,
            resolver,
            locals: FxHashMap::default(),
        }
    }

    pub fn declare(&mut self, name: &str, ty: DataType) {
        self.locals.insert(name.to_string(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<Binding<'a>> {
        if let Some(ty) = self.locals.get(name) {
            return Some(Binding::Local(*ty));
        }
        if let Some(parameter) = self.method.parameter(name) {
            return Some(Binding::Parameter(parameter));
        }
        if let Some((_, constant)) = self.effect.constant(name) {
            return Some(Binding::Constant(constant.ty));
        }
        if let Some(literal) = self.effect.literal(name) {
            return Some(Binding::Literal(literal));
        }
        self.effect
            .texture(name)
            .map(|texture| Binding::Texture(texture.ty))
    }

    /// The array literal an expression names, if any.
    pub fn array_literal(&self, expr: &Expr) -> Option<&'a ShaderLiteral> {
        match &expr.unparenthesized().kind {
            ExprKind::Identifier(name) => match self.lookup(name) {
                Some(Binding::Literal(literal)) if literal.is_array() => Some(literal),
                _ => None,
            },
            _ => None,
        }
    }

    /// The effect texture an expression names directly, if any.
    pub fn texture(&self, expr: &Expr) -> Option<&'a ShaderTexture> {
        match &expr.unparenthesized().kind {
            ExprKind::Identifier(name) => match self.lookup(name) {
                Some(Binding::Texture(_)) => self.effect.texture(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// The type name of an expression used as the receiver of a static member.
    pub fn static_receiver(&self, expr: &Expr) -> Option<String> {
        if let Some(Symbol::Type { name }) = self.resolver.resolve_symbol(expr) {
            return Some(name);
        }
        match &expr.kind {
            ExprKind::Identifier(name) if self.lookup(name).is_none() && is_known_type(name) => {
                Some(name.clone())
            }
            _ => None,
        }
    }

    /// The shader type of an expression, `Unknown` if it has none.
    pub fn type_of(&self, expr: &Expr) -> DataType {
        if let Some(ty) = self.resolver.resolve_type(expr) {
            let ty = data_type(&ty);
            if ty != DataType::Unknown {
                return ty;
            }
        }

        match &expr.kind {
            ExprKind::Literal(Literal::Bool(_)) => DataType::Bool,
            ExprKind::Literal(Literal::Int(_)) => DataType::Int,
            ExprKind::Literal(Literal::Float(_)) => DataType::Float,
            ExprKind::Identifier(name) => self
                .lookup(name)
                .map(|binding| binding.data_type())
                .unwrap_or_default(),
            ExprKind::MemberAccess { target, member } => {
                if let Some(receiver) = self.static_receiver(target) {
                    let ty = DataType::from_str(&receiver).unwrap_or_default();
                    return match static_property(ty, member) {
                        Some(_) => ty,
                        None => DataType::Unknown,
                    };
                }
                let ty = self.type_of(target);
                swizzle(member, ty)
                    .map(|components| DataType::vector_of(components.len() as u32))
                    .unwrap_or_default()
            }
            ExprKind::Index { target, .. } => match self.array_literal(target) {
                Some(literal) => literal.ty,
                None => self.type_of(target).element_type(),
            },
            ExprKind::Invocation { .. } => match self.call(expr) {
                Some(call) => {
                    let mut operands = Vec::new();
                    if let Some(receiver) = call.receiver {
                        operands.push(self.type_of(receiver));
                    }
                    operands.extend(call.arguments.iter().map(|a| self.type_of(&a.value)));
                    call.intrinsic.return_type(&operands)
                }
                None => DataType::Unknown,
            },
            ExprKind::ObjectCreation { ty, .. } | ExprKind::Cast { ty, .. } => data_type(ty),
            ExprKind::Binary { op, lhs, rhs } => {
                binary_type(*op, self.type_of(lhs), self.type_of(rhs))
            }
            ExprKind::Unary {
                op: UnaryOp::Not, ..
            } => DataType::Bool,
            ExprKind::Unary { operand, .. } => self.type_of(operand),
            ExprKind::Assignment { target, .. } => self.type_of(target),
            ExprKind::Conditional { then_value, .. } => self.type_of(then_value),
            ExprKind::Parenthesized(inner) => self.type_of(inner),
            _ => DataType::Unknown,
        }
    }

    /// Resolve an invocation of a member method.
    ///
    /// The resolver is asked first. Without an answer the target is inferred from the
    /// receiver and the argument types.
    pub fn call<'e>(&self, expr: &'e Expr) -> Option<Call<'e>> {
        let ExprKind::Invocation { callee, arguments } = &expr.kind else {
            return None;
        };
        let ExprKind::MemberAccess { target, member } = &callee.unparenthesized().kind else {
            return None;
        };

        let method = match self.resolver.resolve_symbol(expr) {
            Some(Symbol::Method(method)) => method,
            _ => {
                let (declaring_type, is_static) = match self.static_receiver(target) {
                    Some(name) => (name, true),
                    None => (self.type_of(target).host_name().to_string(), false),
                };
                MethodRef {
                    declaring_type,
                    name: member.clone(),
                    parameter_types: arguments
                        .iter()
                        .map(|a| self.type_of(&a.value).host_name().to_string())
                        .collect(),
                    is_static,
                }
            }
        };

        Some(Call {
            intrinsic: intrinsics::resolve(&method),
            receiver: (!method.is_static).then_some(&**target),
            method,
            arguments,
        })
    }
}

/// Whether a name refers to a type with static members usable in shaders.
pub(crate) fn is_known_type(name: &str) -> bool {
    let name = intrinsics::canonical_type_name(name);
    intrinsics::signatures()
        .iter()
        .any(|signature| signature.declaring_type == name)
}

pub(crate) fn binary_type(op: BinaryOp, lhs: DataType, rhs: DataType) -> DataType {
    if op.is_comparison() || op.is_logical() {
        return DataType::Bool;
    }
    match (op, lhs, rhs) {
        (BinaryOp::Mul, DataType::Matrix, DataType::Matrix) => DataType::Matrix,
        (BinaryOp::Mul, DataType::Matrix, DataType::Vector4)
        | (BinaryOp::Mul, DataType::Vector4, DataType::Matrix) => DataType::Vector4,
        _ if lhs.is_vector() || lhs.is_matrix() => lhs,
        _ if rhs.is_vector() || rhs.is_matrix() => rhs,
        _ if lhs == DataType::Float || rhs == DataType::Float => DataType::Float,
        _ => lhs,
    }
}

/// The lowercase swizzle a member access on a vector spells, if it is one.
pub(crate) fn swizzle(member: &str, ty: DataType) -> Option<String> {
    let count = ty.is_vector().then(|| ty.component_count()).flatten()?;
    if member.is_empty() || member.len() > 4 {
        return None;
    }

    member
        .chars()
        .map(|c| {
            let index = match c {
                'X' => 0,
                'Y' => 1,
                'Z' => 2,
                'W' => 3,
                _ => return None,
            };
            (index < count).then(|| c.to_ascii_lowercase())
        })
        .collect()
}

/// The component values of a static vector or matrix property like `Vector3.UnitY`.
pub(crate) fn static_property(ty: DataType, member: &str) -> Option<Vec<f64>> {
    if ty.is_matrix() {
        return (member == "Identity").then(|| {
            (0..16)
                .map(|i| if i % 5 == 0 { 1.0 } else { 0.0 })
                .collect()
        });
    }

    let count = ty.is_vector().then(|| ty.component_count()).flatten()? as usize;
    let unit = |axis: usize| {
        (axis < count).then(|| (0..count).map(|i| if i == axis { 1.0 } else { 0.0 }).collect())
    };
    match member {
        "Zero" => Some(vec![0.0; count]),
        "One" => Some(vec![1.0; count]),
        "UnitX" => unit(0),
        "UnitY" => unit(1),
        "UnitZ" => unit(2),
        "UnitW" => unit(3),
        _ => None,
    }
}
