use crate::back::targets::GLSL;
use crate::back::writer::{write_line, LiteralValue, Operand, ShaderBackend, ShaderWriter};
use crate::back::{CompileShader, CrossCompiler, ShaderCompilerOutput};
use crate::error::ShaderCompileError;
use crate::intrinsics::Intrinsic;
use crate::reflect::{
    BufferPacking, ConstantBuffer, ParameterDirection, ShaderLiteral, ShaderMethod,
    ShaderParameter, ShaderTexture,
};
use effectc_common::{DataSemantics, DataType, ShaderType};
use log::debug;
use std::fmt::Write;

/// The GLSL version to emit.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlslVersion {
    /// GLSL 3.30 core.
    #[default]
    Glsl330,
    /// GLSL 4.10 core.
    Glsl410,
    /// GLSL 4.20 core. Binding layout qualifiers are available from this version on.
    Glsl420,
    /// GLSL 4.50 core.
    Glsl450,
}

impl GlslVersion {
    /// The number in the `#version` directive.
    pub const fn number(&self) -> u32 {
        match self {
            GlslVersion::Glsl330 => 330,
            GlslVersion::Glsl410 => 410,
            GlslVersion::Glsl420 => 420,
            GlslVersion::Glsl450 => 450,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            330 => Some(GlslVersion::Glsl330),
            410 => Some(GlslVersion::Glsl410),
            420 => Some(GlslVersion::Glsl420),
            450 => Some(GlslVersion::Glsl450),
            _ => None,
        }
    }

    /// Whether `layout(binding = N)` may be written in the source.
    pub const fn supports_binding(&self) -> bool {
        self.number() >= 420
    }
}

/// The context for a GLSL compilation.
///
/// Versions without binding qualifiers leave the binding of samplers and uniform blocks
/// to the runtime. The expected slots are reported here by name.
#[derive(Debug, Clone, Default)]
pub struct GlslContext {
    pub version: GlslVersion,
    /// Sampler uniforms and the texture unit they must be bound to.
    pub sampler_bindings: Vec<(String, u32)>,
    /// Uniform blocks and the binding point they must be bound to.
    pub uniform_block_bindings: Vec<(String, u32)>,
}

impl CompileShader<GLSL> for CrossCompiler<'_> {
    type Options = GlslVersion;
    type Context = GlslContext;

    fn compile(
        &self,
        method: &str,
        version: Self::Options,
    ) -> Result<ShaderCompilerOutput<String, GlslContext>, ShaderCompileError> {
        let method = self.method(method)?;
        let backend = GlslBackend {
            context: GlslContext {
                version,
                ..Default::default()
            },
        };
        let (source, backend) =
            ShaderWriter::new(backend, self.effect, method, self.resolver).write()?;
        debug!(
            "compiled {} shader {}.{} to GLSL {}, {} bytes",
            method.stage,
            self.effect.name,
            method.name,
            version.number(),
            source.len()
        );

        Ok(ShaderCompilerOutput {
            stage: method.stage,
            source,
            context: backend.context,
        })
    }
}

struct GlslBackend {
    context: GlslContext,
}

impl GlslBackend {
    fn binding_prefix(&self, slot: u32) -> String {
        if self.context.version.supports_binding() {
            format!("layout(binding = {slot}) ")
        } else {
            String::new()
        }
    }
}

/// The global a stage parameter is bound to, or `None` for built-in variables.
fn varying_name(stage: ShaderType, parameter: &ShaderParameter) -> Option<String> {
    let semantics = parameter.semantics.glsl_name();
    match (stage, parameter.direction) {
        (ShaderType::Vertex, ParameterDirection::Input) => Some(format!("a_{semantics}")),
        (ShaderType::Fragment, ParameterDirection::Output) => Some(format!("o_{semantics}")),
        _ if parameter.semantics == DataSemantics::Position => None,
        _ => Some(format!("v_{semantics}")),
    }
}

impl ShaderBackend for GlslBackend {
    fn type_name(&self, ty: DataType) -> Result<&'static str, ShaderCompileError> {
        Ok(match ty {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vector2 => "vec2",
            DataType::Vector3 => "vec3",
            DataType::Vector4 => "vec4",
            DataType::Matrix => "mat4",
            DataType::Texture2D => "sampler2D",
            DataType::TextureCube => "samplerCube",
            DataType::Unknown => return Err(ShaderCompileError::UnknownType(ty.to_string())),
        })
    }

    fn parameter(&self, method: &ShaderMethod, parameter: &ShaderParameter) -> String {
        match varying_name(method.stage, parameter) {
            Some(name) => name,
            None if method.stage == ShaderType::Vertex => "gl_Position".to_string(),
            None => "gl_FragCoord".to_string(),
        }
    }

    fn intrinsic(
        &self,
        stage: ShaderType,
        intrinsic: Intrinsic,
        operands: &[Operand],
    ) -> Result<String, ShaderCompileError> {
        let arguments: Vec<&str> = operands.iter().map(|o| o.text.as_str()).collect();
        match (intrinsic, arguments.as_slice()) {
            (Intrinsic::Unknown, _) | (Intrinsic::SampleTexture, [] | [_]) => Err(
                ShaderCompileError::UnresolvedInvocation(intrinsic.glsl_name().to_string()),
            ),
            (intrinsic, _) if intrinsic.is_fragment_only() && stage == ShaderType::Vertex => Err(
                ShaderCompileError::UnsupportedConstruct("derivative in a vertex shader"),
            ),
            (Intrinsic::SampleTexture, [texture, coords]) if stage == ShaderType::Vertex => {
                Ok(format!("textureLod({texture}, {coords}, 0.0)"))
            }
            (Intrinsic::Saturate, [value]) => Ok(format!("clamp({value}, 0.0, 1.0)")),
            (intrinsic, arguments) => {
                Ok(format!("{}({})", intrinsic.glsl_name(), arguments.join(", ")))
            }
        }
    }

    /// GLSL matrices are column major, so the operands of a row vector product are swapped.
    fn multiply(&self, lhs: &Operand, rhs: &Operand) -> Operand {
        Operand::compound(format!("{} * {}", rhs.wrapped(), lhs.wrapped()))
    }

    fn modulo(&self, lhs: &Operand, rhs: &Operand) -> Operand {
        Operand::atom(format!("mod({}, {})", lhs.text, rhs.text))
    }

    fn constructor(&self, ty: DataType, arguments: &[String]) -> Result<String, ShaderCompileError> {
        let name = self.type_name(ty)?;
        Ok(match arguments {
            [] => format!("{name}(0.0)"),
            arguments => format!("{name}({})", arguments.join(", ")),
        })
    }

    fn cast(&self, ty: DataType, operand: &Operand) -> Result<String, ShaderCompileError> {
        Ok(format!("{}({})", self.type_name(ty)?, operand.text))
    }

    fn return_statement(&self) -> &'static str {
        "return;"
    }

    fn write_header(&mut self, out: &mut String, _method: &ShaderMethod) -> Result<(), ShaderCompileError> {
        writeln!(out, "#version {} core", self.context.version.number())?;
        writeln!(out)?;
        Ok(())
    }

    fn write_literal(
        &mut self,
        out: &mut String,
        literal: &ShaderLiteral,
        value: &LiteralValue,
    ) -> Result<(), ShaderCompileError> {
        let ty = self.type_name(literal.ty)?;
        match value {
            LiteralValue::Single(value) => writeln!(out, "const {ty} {} = {value};", literal.name)?,
            LiteralValue::Array(values) => writeln!(
                out,
                "const {ty} {}[{len}] = {ty}[{len}]({});",
                literal.name,
                values.join(", "),
                len = values.len()
            )?,
        }
        Ok(())
    }

    fn write_constant_buffer(
        &mut self,
        out: &mut String,
        buffer: &ConstantBuffer,
    ) -> Result<(), ShaderCompileError> {
        let layout = buffer.layout(BufferPacking::Std140);
        let binding = if self.context.version.supports_binding() {
            format!(", binding = {}", buffer.slot)
        } else {
            self.context
                .uniform_block_bindings
                .push((buffer.name.clone(), buffer.slot));
            String::new()
        };

        writeln!(
            out,
            "const int {}_SIZE = {};",
            buffer.name.to_uppercase(),
            layout.size
        )?;
        writeln!(
            out,
            "layout(std140, column_major{binding}) uniform {} // {} bytes",
            buffer.name, layout.size
        )?;
        writeln!(out, "{{")?;
        for member in &layout.members {
            write_line(
                out,
                1,
                format_args!(
                    "{} {}; // offset {}",
                    self.type_name(member.ty)?,
                    member.name,
                    member.offset
                ),
            )?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
        Ok(())
    }

    fn write_texture(&mut self, out: &mut String, texture: &ShaderTexture) -> Result<(), ShaderCompileError> {
        if !self.context.version.supports_binding() {
            self.context
                .sampler_bindings
                .push((texture.name.clone(), texture.slot));
        }
        writeln!(
            out,
            "{}uniform {} {};",
            self.binding_prefix(texture.slot),
            self.type_name(texture.ty)?,
            texture.name
        )?;
        Ok(())
    }

    fn write_stage_interface(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError> {
        let located = match method.stage {
            ShaderType::Vertex => ParameterDirection::Input,
            ShaderType::Fragment => ParameterDirection::Output,
        };

        let mut location = 0;
        for parameter in &method.parameters {
            let Some(name) = varying_name(method.stage, parameter) else {
                continue;
            };
            let ty = self.type_name(parameter.ty)?;
            let qualifier = match parameter.direction {
                ParameterDirection::Input => "in",
                ParameterDirection::Output => "out",
            };
            if parameter.direction == located {
                writeln!(out, "layout(location = {location}) {qualifier} {ty} {name};")?;
                location += 1;
            } else {
                writeln!(out, "{qualifier} {ty} {name};")?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_entry_point_begin(
        &mut self,
        out: &mut String,
        _method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError> {
        writeln!(out, "void main()")?;
        writeln!(out, "{{")?;
        Ok(())
    }

    fn write_entry_point_end(
        &mut self,
        out: &mut String,
        _method: &ShaderMethod,
        _returns: bool,
    ) -> Result<(), ShaderCompileError> {
        writeln!(out, "}}")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::DiagnosticList;
    use crate::fixture;
    use crate::reflect::build_effect;
    use effectc_syntax::{AnnotatedResolver, Expr, Stmt, TypeDecl, TypeRef};

    fn compile(
        decl: TypeDecl,
        method: &str,
        version: GlslVersion,
    ) -> ShaderCompilerOutput<String, GlslContext> {
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();
        let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);
        CompileShader::<GLSL>::compile(&compiler, method, version).unwrap()
    }

    fn sampling_effect() -> TypeDecl {
        let sample = |receiver: Expr| {
            Expr::call(Expr::member(receiver, "Sample"), vec![Expr::new_object("Vector2", vec![])])
        };
        fixture::textured()
            .with_member(fixture::vertex_shader("Displace").with_body(vec![
                Stmt::local(TypeRef::named("Vector4"), "texel", Some(sample(Expr::ident("Albedo")))),
                Stmt::expr(Expr::assign(Expr::ident("outPosition"), Expr::ident("position"))),
            ]))
            .with_member(fixture::fragment_shader("Tinted").with_body(vec![Stmt::expr(
                Expr::assign(Expr::ident("color"), sample(Expr::paren(Expr::ident("Albedo")))),
            )]))
    }

    #[test]
    fn vertex_shaders_sample_level_zero() {
        let source = compile(sampling_effect(), "Displace", GlslVersion::default()).source;
        assert!(source.contains("    vec4 texel = textureLod(Albedo, vec2(0.0), 0.0);\n"));

        let source = compile(sampling_effect(), "Tinted", GlslVersion::default()).source;
        assert!(source.contains("    o_color0 = texture(Albedo, vec2(0.0));\n"));
    }

    #[test]
    fn vertex_shader() {
        let output = compile(fixture::textured(), "VertexMain", GlslVersion::default());
        let source = output.source;

        assert!(source.starts_with("#version 330 core\n\n"));
        assert!(source.contains("const float Scale = 2.0;"));
        assert!(source.contains("const float Weights[3] = float[3](0.25, 0.5, 0.25);"));
        assert!(source.contains(
            "const int CAMERA_SIZE = 192;\nlayout(std140, column_major) uniform Camera // 192 bytes"
        ));
        assert!(source.contains("    mat4 ViewProjection; // offset 128\n"));
        assert!(source.contains("uniform sampler2D Albedo;"));
        assert!(source.contains("layout(location = 0) in vec4 a_position;"));
        assert!(source.contains("layout(location = 1) in vec2 a_texcoord0;"));
        assert!(source.contains("\nout vec2 v_texcoord0;"));
        assert!(!source.contains("v_position"));
        assert!(source.contains("    gl_Position = ViewProjection * (World * a_position);\n"));
        assert!(source.contains("    v_texcoord0 = a_texcoord0 * Scale;\n"));
        assert!(source.ends_with("void main()\n{\n    gl_Position = ViewProjection * (World * a_position);\n    v_texcoord0 = a_texcoord0 * Scale;\n}\n"));
    }

    #[test]
    fn fragment_shader() {
        let source = compile(fixture::textured(), "FragmentMain", GlslVersion::default()).source;
        assert!(source.contains("\nin vec2 v_texcoord0;"));
        assert!(source.contains("layout(location = 0) out vec4 o_color0;"));
        assert!(source.contains("    vec4 texel = texture(Albedo, v_texcoord0);\n"));
        assert!(source.contains("    o_color0 = (texel * Tint) * Weights[1];\n"));
    }

    #[test]
    fn bindings_are_reported_without_layout_qualifiers() {
        let output = compile(fixture::textured(), "FragmentMain", GlslVersion::Glsl330);
        assert_eq!(
            output.context.sampler_bindings,
            vec![("Albedo".to_string(), 0)]
        );
        let blocks: Vec<_> = output
            .context
            .uniform_block_bindings
            .iter()
            .map(|(name, slot)| (name.as_str(), *slot))
            .collect();
        assert_eq!(
            blocks,
            vec![("Camera", 0), ("Viewport", 1), ("Constants", 2), ("Material", 3)]
        );
        assert!(!output.source.contains("binding"));
    }

    #[test]
    fn bindings_are_written_from_420() {
        let output = compile(fixture::textured(), "FragmentMain", GlslVersion::Glsl450);
        assert!(output.source.starts_with("#version 450 core\n"));
        assert!(output.source.contains("layout(binding = 0) uniform sampler2D Albedo;"));
        assert!(output
            .source
            .contains("layout(std140, column_major, binding = 3) uniform Material // 16 bytes"));
        assert!(output.context.sampler_bindings.is_empty());
        assert!(output.context.uniform_block_bindings.is_empty());
    }

    #[test]
    fn static_properties_become_constructors() {
        let source = compile(fixture::basic(), "FragmentMain", GlslVersion::default()).source;
        assert!(source.contains("    o_color0 = vec4(1.0, 1.0, 1.0, 1.0);\n"));
    }

    #[test]
    fn version_numbers() {
        for version in [
            GlslVersion::Glsl330,
            GlslVersion::Glsl410,
            GlslVersion::Glsl420,
            GlslVersion::Glsl450,
        ] {
            assert_eq!(GlslVersion::from_number(version.number()), Some(version));
        }
        assert_eq!(GlslVersion::from_number(300), None);
        assert!(!GlslVersion::Glsl410.supports_binding());
    }
}
