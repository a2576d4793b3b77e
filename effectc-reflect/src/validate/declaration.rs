use super::Context;
use crate::reflect::builder::{
    data_type, derives_from_effect, find_attribute, unqualified, EFFECT_ATTRIBUTE, EFFECT_BASE,
};
use crate::reflect::{ParameterDirection, ShaderMethod, CAMERA_BUFFER, VIEWPORT_BUFFER};
use crate::scope::{is_known_type, static_property};
use crate::RESERVED_PREFIX;
use effectc_common::map::FastHashSet;
use effectc_common::{DataSemantics, DataType, ShaderType};
use effectc_syntax::{
    ConstValue, Expr, ExprKind, Member, Modifier, ParamModifier, SourceLocation, Symbol, UnaryOp,
};
use std::str::FromStr;

/// Rules on the effect declaration itself.
pub(super) fn check_declaration(cx: &Context) {
    let decl = cx.decl;
    let attributed = find_attribute(&cx.resolver.attributes_of(decl), EFFECT_ATTRIBUTE).is_some();
    if attributed && derives_from_effect(decl) {
        cx.error(
            decl.location,
            format!(
                "effect '{}' must either derive from {} or carry the [{}] attribute, not both",
                decl.name, EFFECT_BASE, EFFECT_ATTRIBUTE
            ),
        );
    }

    if decl.modifiers != [Modifier::Public] {
        cx.error(
            decl.location,
            format!("effect '{}' must be declared with only the public modifier", decl.name),
        );
    }

    if !decl.type_parameters.is_empty() {
        cx.error(decl.location, format!("effect '{}' cannot be generic", decl.name));
    }

    for base in &decl.base_types {
        if base.name().map(unqualified) != Some(EFFECT_BASE) {
            cx.error(
                decl.location,
                format!("effect '{}' cannot inherit from '{}'", decl.name, base),
            );
        }
    }

    for member in &decl.members {
        if let Member::Other(other) = member {
            cx.error(
                other.location,
                format!(
                    "effect '{}' cannot declare {} '{}'",
                    decl.name,
                    other.kind.description(),
                    other.name
                ),
            );
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_prefix(cx: &Context, name: &str, location: SourceLocation) {
    if name.starts_with(RESERVED_PREFIX) {
        cx.error(
            location,
            format!("identifier '{name}' uses the reserved prefix {RESERVED_PREFIX}"),
        );
    }
}

/// Reserved prefixes, shadowing and constant buffer names.
pub(super) fn check_names(cx: &Context) {
    let decl = cx.decl;
    check_prefix(cx, &decl.name, decl.location);

    let member_names = cx.member_names();
    for field in decl.fields() {
        check_prefix(cx, &field.name, field.location);
    }

    for method in decl.methods() {
        check_prefix(cx, &method.name, method.location);
        if cx.effect.method(&method.name).is_none() {
            continue;
        }
        for parameter in &method.parameters {
            check_prefix(cx, &parameter.name, parameter.location);
            if member_names.contains(parameter.name.as_str()) {
                cx.error(
                    parameter.location,
                    format!(
                        "parameter '{}' of '{}' shadows effect member '{}'",
                        parameter.name, method.name, parameter.name
                    ),
                );
            }
        }
    }

    let system_constants: FastHashSet<&str> = cx
        .effect
        .constant_buffers
        .iter()
        .filter(|b| b.shared)
        .flat_map(|b| b.constants.iter().map(|c| c.name.as_str()))
        .collect();

    for buffer in cx.effect.user_buffers() {
        let location = buffer
            .constants
            .first()
            .map(|c| c.location)
            .unwrap_or(decl.location);

        if buffer.name == CAMERA_BUFFER || buffer.name == VIEWPORT_BUFFER {
            cx.error(
                location,
                format!("constant buffer name '{}' is reserved", buffer.name),
            );
        } else if !is_identifier(&buffer.name) {
            cx.error(
                location,
                format!("constant buffer name '{}' is not a valid identifier", buffer.name),
            );
        } else if buffer.name.starts_with(RESERVED_PREFIX) {
            check_prefix(cx, &buffer.name, location);
        } else if member_names.contains(buffer.name.as_str()) {
            cx.error(
                location,
                format!(
                    "constant buffer name '{}' collides with effect member '{}'",
                    buffer.name, buffer.name
                ),
            );
        }

        for constant in &buffer.constants {
            if system_constants.contains(constant.name.as_str()) {
                cx.error(
                    constant.location,
                    format!("constant '{}' collides with a system constant", constant.name),
                );
            }
        }
    }
}

/// Literal types must be known and literal values compile-time constants.
pub(super) fn check_literals(cx: &Context) {
    for literal in &cx.effect.literals {
        if !literal.ty.is_value_type() {
            let declared = cx
                .decl
                .fields()
                .find(|f| f.name == literal.name)
                .map(|f| f.ty.to_string())
                .unwrap_or_default();
            cx.error(
                literal.location,
                format!("literal '{}' has unsupported type '{}'", literal.name, declared),
            );
            continue;
        }

        if let Some(ConstValue::String(_)) = cx.resolver.constant_value(&literal.value) {
            cx.error(
                literal.location,
                format!("literal '{}' cannot be a string", literal.name),
            );
            continue;
        }

        let constant = match literal.elements() {
            Some(values) => values.iter().all(|value| is_constant_value(cx, value)),
            None => is_constant_value(cx, &literal.value),
        };
        if !constant {
            cx.error(
                literal.location,
                format!(
                    "initializer of literal '{}' is not a compile-time constant",
                    literal.name
                ),
            );
        }
    }
}

/// A scalar constant, a vector or matrix constructed from constants or a static property.
fn is_constant_value(cx: &Context, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Parenthesized(inner) => is_constant_value(cx, inner),
        ExprKind::ObjectCreation {
            ty,
            arguments,
            initializer: None,
        } => {
            let ty = data_type(ty);
            (ty.is_vector() || ty.is_matrix())
                && arguments
                    .iter()
                    .all(|argument| is_constant_value(cx, &argument.value))
        }
        ExprKind::MemberAccess { target, member } => static_type(cx, target)
            .is_some_and(|ty| static_property(ty, member).is_some()),
        ExprKind::Unary {
            op: UnaryOp::Neg | UnaryOp::Plus,
            operand,
        } if !cx.resolver.is_constant(expr) => is_constant_value(cx, operand),
        _ => matches!(
            cx.resolver.constant_value(expr),
            Some(ConstValue::Bool(_) | ConstValue::Int(_) | ConstValue::Float(_))
        ),
    }
}

fn static_type(cx: &Context, expr: &Expr) -> Option<DataType> {
    let name = match cx.resolver.resolve_symbol(expr) {
        Some(Symbol::Type { name }) => name,
        _ => match &expr.kind {
            ExprKind::Identifier(name) if is_known_type(name) => name.clone(),
            _ => return None,
        },
    };
    Some(DataType::from_str(&name).unwrap_or_default())
}

/// Shape of shader methods: signatures, stage outputs and semantics.
pub(super) fn check_methods(cx: &Context) {
    for decl in cx.decl.methods() {
        let Some(method) = cx.effect.method(&decl.name) else {
            continue;
        };

        if !decl.return_type.is_void() {
            cx.error(
                decl.location,
                format!("shader method '{}' must return void", decl.name),
            );
        }
        if !decl.type_parameters.is_empty() {
            cx.error(
                decl.location,
                format!("shader method '{}' cannot be generic", decl.name),
            );
        }
        for parameter in &decl.parameters {
            let modifier = match parameter.modifier {
                ParamModifier::Ref => "ref",
                ParamModifier::In => "in",
                ParamModifier::Params => "params",
                ParamModifier::None | ParamModifier::Out => continue,
            };
            cx.error(
                parameter.location,
                format!(
                    "parameter '{}' of '{}' cannot be declared {}",
                    parameter.name, decl.name, modifier
                ),
            );
        }

        match method.stage {
            ShaderType::Vertex => check_vertex_outputs(cx, method),
            ShaderType::Fragment => check_fragment_outputs(cx, method),
        }
        check_duplicate_semantics(cx, method, ParameterDirection::Input);
        check_duplicate_semantics(cx, method, ParameterDirection::Output);
    }
}

fn check_vertex_outputs(cx: &Context, method: &ShaderMethod) {
    match method
        .outputs()
        .find(|p| p.semantics == DataSemantics::Position)
    {
        None => cx.error(
            method.location,
            format!("vertex shader '{}' must output a Position", method.name),
        ),
        Some(position) if position.ty != DataType::Vector4 => cx.error(
            position.location,
            format!(
                "position output '{}' of vertex shader '{}' must be a Vector4",
                position.name, method.name
            ),
        ),
        Some(_) => {}
    }
}

fn check_fragment_outputs(cx: &Context, method: &ShaderMethod) {
    if !method.outputs().any(|p| p.semantics.is_color()) {
        cx.error(
            method.location,
            format!("fragment shader '{}' must output at least one color", method.name),
        );
    }
    for output in method.outputs().filter(|p| !p.semantics.is_color()) {
        cx.error(
            output.location,
            format!(
                "fragment shader '{}' output '{}' uses non-color semantics {}",
                method.name, output.name, output.semantics
            ),
        );
    }
}

fn check_duplicate_semantics(cx: &Context, method: &ShaderMethod, direction: ParameterDirection) {
    let mut seen = FastHashSet::default();
    let noun = match direction {
        ParameterDirection::Input => "input",
        ParameterDirection::Output => "output",
    };

    for parameter in method.parameters.iter().filter(|p| p.direction == direction) {
        if !seen.insert(parameter.semantics) {
            cx.error(
                parameter.location,
                format!(
                    "semantics {} is used by more than one {} of '{}'",
                    parameter.semantics, noun, method.name
                ),
            );
        }
    }
}

/// Warnings for declarations that are accepted but have no effect.
pub(super) fn check_usage(cx: &Context) {
    for (_, constant) in cx
        .effect
        .user_buffers()
        .flat_map(|b| b.constants.iter().map(move |c| (b, c)))
    {
        let initialized = cx
            .decl
            .fields()
            .any(|f| f.name == constant.name && f.initializer.is_some());
        if initialized {
            cx.warning(
                constant.location,
                format!(
                    "initializer of constant '{}' is ignored, constant values are supplied at runtime",
                    constant.name
                ),
            );
        }
    }

    for method in &cx.effect.methods {
        let used = cx
            .effect
            .techniques
            .iter()
            .any(|t| t.vertex == method.name || t.fragment == method.name);
        if !used {
            cx.warning(
                method.location,
                format!("shader method '{}' is not used by any technique", method.name),
            );
        }
    }
}

