use crate::diagnostics::{DiagnosticSink, ErrorCounter};
use crate::error::EffectBuildError;
use crate::reflect::{
    BindingStage, ConstantBuffer, EffectClass, ParameterDirection, ShaderConstant, ShaderLiteral,
    ShaderMethod, ShaderParameter, ShaderTexture, Technique, CAMERA_BUFFER, DEFAULT_BUFFER,
    FIRST_USER_SLOT, VIEWPORT_BUFFER,
};
use crate::visit::for_each_expr;
use effectc_common::map::FastHashSet;
use effectc_common::{DataSemantics, DataType, ShaderType};
use effectc_syntax::{
    Expr, ExprKind, FieldDecl, MethodDecl, ParamDecl, ParamModifier, ResolvedAttribute,
    SourceLocation, SymbolResolver, TypeDecl, TypeRef,
};
use log::debug;
use std::str::FromStr;

pub(crate) const EFFECT_BASE: &str = "Effect";
pub(crate) const EFFECT_ATTRIBUTE: &str = "Effect";
pub(crate) const CONSTANT_ATTRIBUTE: &str = "Constant";
pub(crate) const TECHNIQUE_TYPE: &str = "Technique";

pub(crate) fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

pub(crate) fn find_attribute<'r>(
    attributes: &'r [ResolvedAttribute],
    name: &str,
) -> Option<&'r ResolvedAttribute> {
    attributes.iter().find(|attribute| attribute.name == name)
}

/// The shader type of a declared type, `Unknown` for arrays and pointers.
pub(crate) fn data_type(ty: &TypeRef) -> DataType {
    ty.name()
        .map(|name| DataType::from_str(name).unwrap_or_default())
        .unwrap_or_default()
}

pub(crate) fn is_technique_field(field: &FieldDecl) -> bool {
    field
        .ty
        .name()
        .is_some_and(|name| unqualified(name) == TECHNIQUE_TYPE)
}

pub(crate) fn derives_from_effect(decl: &TypeDecl) -> bool {
    decl.base_types
        .iter()
        .any(|base| base.name().is_some_and(|name| unqualified(name) == EFFECT_BASE))
}

/// Whether the declaration is an effect, by base type or attribute.
pub fn is_effect_candidate(decl: &TypeDecl, resolver: &dyn SymbolResolver) -> bool {
    derives_from_effect(decl)
        || find_attribute(&resolver.attributes_of(decl), EFFECT_ATTRIBUTE).is_some()
}

/// The shader stage a method is tagged with, if it is tagged with exactly one.
pub(crate) fn shader_stage(attributes: &[ResolvedAttribute]) -> Option<Result<ShaderType, ()>> {
    let vertex = find_attribute(attributes, ShaderType::Vertex.attribute_name()).is_some();
    let fragment = find_attribute(attributes, ShaderType::Fragment.attribute_name()).is_some();
    match (vertex, fragment) {
        (false, false) => None,
        (true, false) => Some(Ok(ShaderType::Vertex)),
        (false, true) => Some(Ok(ShaderType::Fragment)),
        (true, true) => Some(Err(())),
    }
}

/// Build the model of an effect declaration.
///
/// Structural problems (malformed parameters, techniques referencing unknown methods, missing
/// stages) are reported to the sink and fail the build. Everything else is left to the
/// validator.
pub fn build_effect(
    decl: &TypeDecl,
    resolver: &dyn SymbolResolver,
    sink: &dyn DiagnosticSink,
) -> Result<EffectClass, EffectBuildError> {
    if !is_effect_candidate(decl, resolver) {
        return Err(EffectBuildError::NotAnEffect(decl.name.clone()));
    }

    let counter = ErrorCounter::new(sink);
    let builder = EffectBuilder {
        decl,
        resolver,
        sink: &counter,
    };

    let (literals, textures) = builder.scan_fields();
    let methods = builder.scan_methods();
    let constant_buffers = merge_buffers(system_buffers(), builder.scan_constants());
    let techniques = builder.scan_techniques(&methods);
    builder.check_invariants(&methods, &techniques);

    if counter.errors() > 0 {
        return Err(EffectBuildError::Structural {
            name: decl.name.clone(),
            count: counter.errors(),
        });
    }

    let mut effect = EffectClass {
        name: decl.name.clone(),
        namespace: decl.namespace.clone(),
        documentation: decl.documentation.clone(),
        constant_buffers,
        methods,
        literals,
        textures,
        techniques,
        location: decl.location,
    };
    assign_stage_masks(&mut effect);

    debug!(
        "effect {}: {} constant buffers, {} textures, {} literals, {} shader methods, {} techniques",
        effect.name,
        effect.constant_buffers.len(),
        effect.textures.len(),
        effect.literals.len(),
        effect.methods.len(),
        effect.techniques.len()
    );
    for buffer in &effect.constant_buffers {
        debug!("effect {}: buffer {} at slot {}", effect.name, buffer.name, buffer.slot);
    }

    Ok(effect)
}

struct EffectBuilder<'a> {
    decl: &'a TypeDecl,
    resolver: &'a dyn SymbolResolver,
    sink: &'a ErrorCounter<'a>,
}

impl EffectBuilder<'_> {
    fn error(&self, location: SourceLocation, message: String) {
        self.sink.error(location, message)
    }

    fn is_constant_field(&self, field: &FieldDecl) -> bool {
        find_attribute(&self.resolver.attributes_of(field), CONSTANT_ATTRIBUTE).is_some()
    }

    /// Collect literals and textures. Texture slots are assigned in declaration order.
    fn scan_fields(&self) -> (Vec<ShaderLiteral>, Vec<ShaderTexture>) {
        let mut literals = Vec::new();
        let mut textures = Vec::new();

        for field in self.decl.fields() {
            if self.is_constant_field(field) || is_technique_field(field) {
                continue;
            }

            let ty = match &field.ty {
                TypeRef::Array(element) => data_type(element),
                ty => data_type(ty),
            };

            if ty.is_texture() && !matches!(field.ty, TypeRef::Array(_)) {
                textures.push(ShaderTexture {
                    name: field.name.clone(),
                    ty,
                    slot: textures.len() as u32,
                    stage_mask: BindingStage::NONE,
                    location: field.location,
                });
            } else if let Some(value) = &field.initializer {
                literals.push(ShaderLiteral {
                    name: field.name.clone(),
                    ty,
                    value: value.clone(),
                    location: field.location,
                });
            }
        }

        (literals, textures)
    }

    fn scan_methods(&self) -> Vec<ShaderMethod> {
        let mut methods: Vec<ShaderMethod> = Vec::new();

        for method in self.decl.methods() {
            let stage = match shader_stage(&self.resolver.attributes_of(method)) {
                None => continue,
                Some(Ok(stage)) => stage,
                Some(Err(())) => {
                    self.error(
                        method.location,
                        format!(
                            "method '{}' cannot be both a vertex and a fragment shader",
                            method.name
                        ),
                    );
                    continue;
                }
            };

            if methods.iter().any(|m| m.name == method.name) {
                self.error(
                    method.location,
                    format!("shader method '{}' is declared more than once", method.name),
                );
                continue;
            }

            let body = match &method.body {
                Some(body) => body.clone(),
                None => {
                    self.error(
                        method.location,
                        format!("shader method '{}' has no body", method.name),
                    );
                    Vec::new()
                }
            };

            let parameters = method
                .parameters
                .iter()
                .filter_map(|parameter| self.scan_parameter(method, parameter))
                .collect();

            methods.push(ShaderMethod {
                name: method.name.clone(),
                stage,
                parameters,
                body,
                location: method.location,
            });
        }

        methods
    }

    fn scan_parameter(&self, method: &MethodDecl, parameter: &ParamDecl) -> Option<ShaderParameter> {
        let direction = if parameter.modifier == ParamModifier::Out {
            ParameterDirection::Output
        } else {
            ParameterDirection::Input
        };

        if let TypeRef::Array(_) = parameter.ty {
            self.error(
                parameter.location,
                format!(
                    "parameter '{}' of '{}' cannot be an array",
                    parameter.name, method.name
                ),
            );
            return None;
        }

        let ty = data_type(&parameter.ty);
        if !ty.is_parameter_type() {
            self.error(
                parameter.location,
                format!(
                    "parameter '{}' of '{}' has unsupported type '{}', stage parameters must be float, Vector2, Vector3 or Vector4",
                    parameter.name, method.name, parameter.ty
                ),
            );
            return None;
        }

        let attributes = self.resolver.attributes_of(parameter);
        let semantics: Vec<&ResolvedAttribute> = attributes
            .iter()
            .filter(|attribute| DataSemantics::is_attribute_name(&attribute.name))
            .collect();
        let [attribute] = semantics[..] else {
            self.error(
                parameter.location,
                format!(
                    "parameter '{}' of '{}' must have exactly one semantics attribute",
                    parameter.name, method.name
                ),
            );
            return None;
        };

        let index = match attribute.positional(0) {
            None => 0,
            Some(argument) => match argument.value.as_ref().and_then(|v| v.as_int()) {
                Some(index) => index,
                None => {
                    self.error(
                        attribute.location,
                        format!(
                            "semantics index of parameter '{}' must be a constant integer",
                            parameter.name
                        ),
                    );
                    return None;
                }
            },
        };

        let semantics = u32::try_from(index)
            .ok()
            .and_then(|index| DataSemantics::from_attribute(&attribute.name, index));
        let Some(semantics) = semantics else {
            self.error(
                attribute.location,
                format!(
                    "semantics {}({}) of parameter '{}' is out of range, the index must be 0{}",
                    attribute.name,
                    index,
                    parameter.name,
                    match attribute.name.as_str() {
                        "Position" | "Normal" => String::new(),
                        _ => format!(" to {}", DataSemantics::MAX_INDEX),
                    }
                ),
            );
            return None;
        };

        Some(ShaderParameter {
            name: parameter.name.clone(),
            ty,
            semantics,
            direction,
            location: parameter.location,
        })
    }

    /// Group attributed constants into buffers by buffer name, assigning slots in order of
    /// first appearance.
    fn scan_constants(&self) -> Vec<ConstantBuffer> {
        let mut buffers: Vec<ConstantBuffer> = Vec::new();

        for field in self.decl.fields() {
            let attributes = self.resolver.attributes_of(field);
            let Some(attribute) = find_attribute(&attributes, CONSTANT_ATTRIBUTE) else {
                continue;
            };

            let buffer_name = match attribute.named("Buffer").or_else(|| attribute.positional(0)) {
                None => DEFAULT_BUFFER,
                Some(argument) => match argument.value.as_ref().and_then(|v| v.as_str()) {
                    Some(name) => name,
                    None => {
                        self.error(
                            attribute.location,
                            format!(
                                "buffer name of constant '{}' must be a constant string",
                                field.name
                            ),
                        );
                        continue;
                    }
                },
            };

            let ty = data_type(&field.ty);
            if !ty.is_value_type() {
                self.error(
                    field.location,
                    format!("constant '{}' has unsupported type '{}'", field.name, field.ty),
                );
                continue;
            }

            let constant = ShaderConstant {
                name: field.name.clone(),
                ty,
                documentation: field.documentation.clone(),
                location: field.location,
            };

            match buffers.iter_mut().find(|b| b.name == buffer_name) {
                Some(buffer) => buffer.constants.push(constant),
                None => buffers.push(ConstantBuffer {
                    name: buffer_name.to_string(),
                    slot: 0,
                    shared: false,
                    constants: vec![constant],
                    stage_mask: BindingStage::NONE,
                }),
            }
        }

        for (slot, buffer) in (FIRST_USER_SLOT..).zip(buffers.iter_mut()) {
            buffer.slot = slot;
        }
        buffers
    }

    fn scan_techniques(&self, methods: &[ShaderMethod]) -> Vec<Technique> {
        let mut techniques = Vec::new();

        for field in self.decl.fields().filter(|f| is_technique_field(f)) {
            let Some([vertex, fragment]) = self.technique_arguments(field) else {
                self.error(
                    field.location,
                    format!(
                        "technique '{}' must be initialized with new Technique(vertexShader, fragmentShader)",
                        field.name
                    ),
                );
                continue;
            };

            let vertex_ok = self.check_technique_method(field, &vertex, ShaderType::Vertex, methods);
            let fragment_ok =
                self.check_technique_method(field, &fragment, ShaderType::Fragment, methods);
            if vertex_ok && fragment_ok {
                techniques.push(Technique {
                    name: field.name.clone(),
                    vertex,
                    fragment,
                    location: field.location,
                });
            }
        }

        techniques
    }

    fn technique_arguments(&self, field: &FieldDecl) -> Option<[String; 2]> {
        let ExprKind::ObjectCreation { arguments, .. } = &field.initializer.as_ref()?.unparenthesized().kind
        else {
            return None;
        };
        let [vertex, fragment] = &arguments[..] else {
            return None;
        };

        let name_of = |expr: &Expr| {
            self.resolver
                .constant_value(expr)
                .and_then(|value| value.as_str().map(String::from))
        };
        Some([name_of(&vertex.value)?, name_of(&fragment.value)?])
    }

    fn check_technique_method(
        &self,
        field: &FieldDecl,
        name: &str,
        stage: ShaderType,
        methods: &[ShaderMethod],
    ) -> bool {
        match methods.iter().find(|m| m.name == name) {
            None => {
                self.error(
                    field.location,
                    format!(
                        "technique '{}' references unknown shader method '{}'",
                        field.name, name
                    ),
                );
                false
            }
            Some(method) if method.stage != stage => {
                self.error(
                    field.location,
                    format!(
                        "technique '{}' expects a {} shader but '{}' is a {} shader",
                        field.name, stage, name, method.stage
                    ),
                );
                false
            }
            Some(_) => true,
        }
    }

    fn check_invariants(&self, methods: &[ShaderMethod], techniques: &[Technique]) {
        for stage in [ShaderType::Vertex, ShaderType::Fragment] {
            if !methods.iter().any(|m| m.stage == stage) {
                self.error(
                    self.decl.location,
                    format!(
                        "effect '{}' must declare at least one {} shader",
                        self.decl.name, stage
                    ),
                );
            }
        }

        // A technique may have failed to build, in which case that error is enough.
        let declared = self.decl.fields().any(is_technique_field);
        if techniques.is_empty() && !declared {
            self.error(
                self.decl.location,
                format!("effect '{}' must declare at least one technique", self.decl.name),
            );
        }
    }
}

fn system_buffers() -> Vec<ConstantBuffer> {
    let constant = |name: &str, ty| ShaderConstant {
        name: name.to_string(),
        ty,
        documentation: Vec::new(),
        location: SourceLocation::default(),
    };

    vec![
        ConstantBuffer {
            name: CAMERA_BUFFER.to_string(),
            slot: 0,
            shared: true,
            constants: vec![
                constant("View", DataType::Matrix),
                constant("Projection", DataType::Matrix),
                constant("ViewProjection", DataType::Matrix),
            ],
            stage_mask: BindingStage::NONE,
        },
        ConstantBuffer {
            name: VIEWPORT_BUFFER.to_string(),
            slot: 1,
            shared: true,
            constants: vec![constant("ViewportSize", DataType::Vector2)],
            stage_mask: BindingStage::NONE,
        },
    ]
}

fn merge_buffers(system: Vec<ConstantBuffer>, user: Vec<ConstantBuffer>) -> Vec<ConstantBuffer> {
    let mut buffers = system;
    buffers.extend(user);
    buffers.sort_by_key(|buffer| buffer.slot);
    buffers
}

/// Mark every buffer and texture with the stages that reference it.
fn assign_stage_masks(effect: &mut EffectClass) {
    for method in &effect.methods {
        let mut referenced = FastHashSet::default();
        for_each_expr(&method.body, &mut |expr| {
            if let ExprKind::Identifier(name) = &expr.kind {
                referenced.insert(name.as_str());
            }
        });

        let stage = BindingStage::from(method.stage);
        for buffer in &mut effect.constant_buffers {
            if buffer.constants.iter().any(|c| referenced.contains(c.name.as_str())) {
                buffer.stage_mask |= stage;
            }
        }
        for texture in &mut effect.textures {
            if referenced.contains(texture.name.as_str()) {
                texture.stage_mask |= stage;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::DiagnosticList;
    use effectc_syntax::{AnnotatedResolver, Attribute, Stmt};

    fn minimal() -> TypeDecl {
        TypeDecl::new("Basic")
            .with_base("Effect")
            .with_member(
                MethodDecl::new("VertexMain")
                    .with_attribute(Attribute::new("VertexShader"))
                    .with_parameter(ParamDecl::new("position", "Vector4").with_attribute(Attribute::new("Position")))
                    .with_parameter(
                        ParamDecl::new("outPosition", "Vector4")
                            .out()
                            .with_attribute(Attribute::new("Position")),
                    )
                    .with_body(vec![Stmt::expr(Expr::assign(
                        Expr::ident("outPosition"),
                        Expr::ident("position"),
                    ))]),
            )
            .with_member(
                MethodDecl::new("FragmentMain")
                    .with_attribute(Attribute::new("FragmentShader"))
                    .with_parameter(
                        ParamDecl::new("color", "Vector4")
                            .out()
                            .with_attribute(Attribute::new("Color")),
                    ),
            )
            .with_member(FieldDecl::new("Default", TypeRef::named("Technique")).with_initializer(
                Expr::new_object(
                    "Technique",
                    vec![
                        Expr::call(Expr::ident("nameof"), vec![Expr::ident("VertexMain")]),
                        Expr::call(Expr::ident("nameof"), vec![Expr::ident("FragmentMain")]),
                    ],
                ),
            ))
    }

    fn constant(name: &str, ty: &str, buffer: Option<&str>) -> FieldDecl {
        let mut attribute = Attribute::new("Constant");
        if let Some(buffer) = buffer {
            attribute = attribute.with_argument(Expr::string(buffer));
        }
        FieldDecl::new(name, TypeRef::named(ty)).with_attribute(attribute)
    }

    #[test]
    fn builds_minimal_effect() {
        let diagnostics = DiagnosticList::new();
        let effect = build_effect(&minimal(), &AnnotatedResolver, &diagnostics).unwrap();
        assert!(diagnostics.is_empty());

        let buffers: Vec<_> = effect
            .constant_buffers
            .iter()
            .map(|b| (b.name.as_str(), b.slot, b.shared))
            .collect();
        assert_eq!(buffers, vec![("Camera", 0, true), ("Viewport", 1, true)]);
        assert_eq!(effect.techniques[0].vertex, "VertexMain");
        assert_eq!(effect.techniques[0].fragment, "FragmentMain");

        let vertex = effect.method("VertexMain").unwrap();
        assert_eq!(vertex.inputs().count(), 1);
        assert_eq!(vertex.outputs().next().unwrap().semantics, DataSemantics::Position);
    }

    #[test]
    fn groups_constants_by_buffer() {
        let decl = minimal()
            .with_member(constant("Tint", "Vector4", Some("Material")))
            .with_member(constant("Time", "float", None))
            .with_member(constant("Gloss", "float", Some("Material")));
        let diagnostics = DiagnosticList::new();
        let effect = build_effect(&decl, &AnnotatedResolver, &diagnostics).unwrap();

        let material = effect.constant_buffer("Material").unwrap();
        assert_eq!(material.slot, 2);
        let names: Vec<_> = material.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Tint", "Gloss"]);
        assert_eq!(effect.constant_buffer(DEFAULT_BUFFER).unwrap().slot, 3);

        let slots: Vec<_> = effect.constant_buffers.iter().map(|b| b.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }

    #[test]
    fn named_buffer_argument() {
        let decl = minimal().with_member(
            FieldDecl::new("Exposure", TypeRef::named("float")).with_attribute(
                Attribute::new("ConstantAttribute").with_named_argument("Buffer", Expr::string("Tonemap")),
            ),
        );
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();
        assert!(effect.constant("Exposure").is_some_and(|(b, _)| b.name == "Tonemap"));
    }

    #[test]
    fn texture_slots_follow_declaration_order() {
        let decl = minimal()
            .with_member(FieldDecl::new("Albedo", TypeRef::named("Texture2D")))
            .with_member(FieldDecl::new("Scale", TypeRef::named("float")).with_initializer(Expr::float(2.0)))
            .with_member(FieldDecl::new("Sky", TypeRef::named("TextureCube")));
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();

        let textures: Vec<_> = effect.textures.iter().map(|t| (t.name.as_str(), t.slot)).collect();
        assert_eq!(textures, vec![("Albedo", 0), ("Sky", 1)]);
        assert_eq!(effect.literal("Scale").unwrap().ty, DataType::Float);
    }

    #[test]
    fn stage_masks() {
        let decl = minimal()
            .with_member(FieldDecl::new("Albedo", TypeRef::named("Texture2D")))
            .with_member(
                MethodDecl::new("Textured")
                    .with_attribute(Attribute::new("FragmentShader"))
                    .with_body(vec![Stmt::expr(Expr::ident("Albedo")), Stmt::expr(Expr::ident("View"))]),
            );
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();
        assert_eq!(effect.texture("Albedo").unwrap().stage_mask, BindingStage::FRAGMENT);
        assert_eq!(effect.constant_buffer("Camera").unwrap().stage_mask, BindingStage::FRAGMENT);
        assert_eq!(effect.constant_buffer("Viewport").unwrap().stage_mask, BindingStage::NONE);
    }

    #[test]
    fn structural_errors_fail_the_build() {
        let decl = minimal().with_member(
            FieldDecl::new("Broken", TypeRef::named("Technique")).with_initializer(Expr::new_object(
                "Technique",
                vec![Expr::string("FragmentMain"), Expr::string("Missing")],
            )),
        );
        let diagnostics = DiagnosticList::new();
        let result = build_effect(&decl, &AnnotatedResolver, &diagnostics);
        assert!(matches!(result, Err(EffectBuildError::Structural { count: 2, .. })));

        let messages: Vec<_> = diagnostics.into_vec().into_iter().map(|d| d.message).collect();
        assert!(messages[0].contains("expects a vertex shader but 'FragmentMain' is a fragment shader"));
        assert!(messages[1].contains("unknown shader method 'Missing'"));
    }

    #[test]
    fn rejects_out_of_range_semantics() {
        let decl = minimal().with_member(
            MethodDecl::new("Extra")
                .with_attribute(Attribute::new("FragmentShader"))
                .with_parameter(
                    ParamDecl::new("uv", "Vector2")
                        .with_attribute(Attribute::new("TexCoord").with_argument(Expr::int(4))),
                ),
        );
        let diagnostics = DiagnosticList::new();
        assert!(build_effect(&decl, &AnnotatedResolver, &diagnostics).is_err());
        assert!(diagnostics.snapshot()[0].message.contains("TexCoord(4)"));
    }

    #[test]
    fn not_an_effect() {
        let decl = TypeDecl::new("Helper");
        assert!(matches!(
            build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()),
            Err(EffectBuildError::NotAnEffect(_))
        ));
    }
}
