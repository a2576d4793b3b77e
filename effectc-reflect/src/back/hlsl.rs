use crate::back::targets::HLSL;
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

/// The context for an HLSL compilation.
#[derive(Debug, Clone)]
pub struct HlslContext {
    /// The Shader Model 5 profile to compile the source with.
    pub profile: &'static str,
    /// The name of the entry point function.
    pub entry_point: String,
}

impl CompileShader<HLSL> for CrossCompiler<'_> {
    type Options = Option<()>;
    type Context = HlslContext;

    fn compile(
        &self,
        method: &str,
        _options: Self::Options,
    ) -> Result<ShaderCompilerOutput<String, HlslContext>, ShaderCompileError> {
        let method = self.method(method)?;
        let (source, _) =
            ShaderWriter::new(HlslBackend, self.effect, method, self.resolver).write()?;
        debug!(
            "compiled {} shader {}.{} to HLSL, {} bytes",
            method.stage,
            self.effect.name,
            method.name,
            source.len()
        );

        Ok(ShaderCompilerOutput {
            stage: method.stage,
            source,
            context: HlslContext {
                profile: match method.stage {
                    ShaderType::Vertex => "vs_5_0",
                    ShaderType::Fragment => "ps_5_0",
                },
                entry_point: method.name.clone(),
            },
        })
    }
}

const INPUT: &str = "fx_input";
const OUTPUT: &str = "fx_output";

fn sampler_name(texture: &str) -> String {
    format!("fx_sampler_{texture}")
}

fn struct_name(method: &ShaderMethod, direction: ParameterDirection) -> String {
    match direction {
        ParameterDirection::Input => format!("fx_{}_Input", method.name),
        ParameterDirection::Output => format!("fx_{}_Output", method.name),
    }
}

struct HlslBackend;

impl HlslBackend {
    /// The semantic a stage parameter is bound to.
    ///
    /// Vertex position outputs and fragment position inputs are the `SV_Position` system
    /// value. Fragment outputs are render targets in declaration order.
    fn semantic(method: &ShaderMethod, parameter: &ShaderParameter) -> String {
        match (method.stage, parameter.direction) {
            (ShaderType::Fragment, ParameterDirection::Output) => {
                let target = method
                    .outputs()
                    .position(|p| p.name == parameter.name)
                    .unwrap_or_default();
                format!("SV_Target{target}")
            }
            (ShaderType::Vertex, ParameterDirection::Output)
            | (ShaderType::Fragment, ParameterDirection::Input)
                if parameter.semantics == DataSemantics::Position =>
            {
                "SV_Position".to_string()
            }
            _ => parameter.semantics.hlsl_name().to_string(),
        }
    }
}

impl ShaderBackend for HlslBackend {
    fn type_name(&self, ty: DataType) -> Result<&'static str, ShaderCompileError> {
        Ok(match ty {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vector2 => "float2",
            DataType::Vector3 => "float3",
            DataType::Vector4 => "float4",
            DataType::Matrix => "float4x4",
            DataType::Texture2D => "Texture2D",
            DataType::TextureCube => "TextureCube",
            DataType::Unknown => return Err(ShaderCompileError::UnknownType(ty.to_string())),
        })
    }

    fn parameter(&self, _method: &ShaderMethod, parameter: &ShaderParameter) -> String {
        match parameter.direction {
            ParameterDirection::Input => format!("{INPUT}.{}", parameter.name),
            ParameterDirection::Output => format!("{OUTPUT}.{}", parameter.name),
        }
    }

    fn intrinsic(
        &self,
        stage: ShaderType,
        intrinsic: Intrinsic,
        operands: &[Operand],
    ) -> Result<String, ShaderCompileError> {
        match (intrinsic, operands) {
            (Intrinsic::Unknown, _) => Err(ShaderCompileError::UnresolvedInvocation(
                intrinsic.hlsl_name().to_string(),
            )),
            (intrinsic, _) if intrinsic.is_fragment_only() && stage == ShaderType::Vertex => Err(
                ShaderCompileError::UnsupportedConstruct("derivative in a vertex shader"),
            ),
            // Vertex shaders have no derivatives and read level 0.
            (Intrinsic::SampleTexture, [texture, coords]) if stage == ShaderType::Vertex => {
                Ok(format!(
                    "{}.SampleLevel({}, {}, 0)",
                    texture.text,
                    sampler_name(&texture.text),
                    coords.text
                ))
            }
            (Intrinsic::SampleTexture, [texture, coords]) => Ok(format!(
                "{}.Sample({}, {})",
                texture.text,
                sampler_name(&texture.text),
                coords.text
            )),
            (Intrinsic::SampleTexture, _) => Err(ShaderCompileError::UnresolvedInvocation(
                intrinsic.hlsl_name().to_string(),
            )),
            (intrinsic, operands) => {
                let arguments: Vec<&str> = operands.iter().map(|o| o.text.as_str()).collect();
                Ok(format!("{}({})", intrinsic.hlsl_name(), arguments.join(", ")))
            }
        }
    }

    fn multiply(&self, lhs: &Operand, rhs: &Operand) -> Operand {
        Operand::atom(format!("mul({}, {})", lhs.text, rhs.text))
    }

    fn modulo(&self, lhs: &Operand, rhs: &Operand) -> Operand {
        Operand::compound(format!("{} % {}", lhs.wrapped(), rhs.wrapped()))
    }

    fn constructor(&self, ty: DataType, arguments: &[String]) -> Result<String, ShaderCompileError> {
        let name = self.type_name(ty)?;
        Ok(match arguments {
            [] => format!("(({name})0)"),
            [value] if ty.is_vector() => format!("(({name})({value}))"),
            arguments => format!("{name}({})", arguments.join(", ")),
        })
    }

    fn cast(&self, ty: DataType, operand: &Operand) -> Result<String, ShaderCompileError> {
        Ok(format!("(({}){})", self.type_name(ty)?, operand.wrapped()))
    }

    fn return_statement(&self) -> &'static str {
        "return fx_output;"
    }

    fn write_header(&mut self, _out: &mut String, _method: &ShaderMethod) -> Result<(), ShaderCompileError> {
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
            LiteralValue::Single(value) => {
                writeln!(out, "static const {ty} {} = {value};", literal.name)?
            }
            LiteralValue::Array(values) => writeln!(
                out,
                "static const {ty} {}[{}] = {{ {} }};",
                literal.name,
                values.len(),
                values.join(", ")
            )?,
        }
        Ok(())
    }

    fn write_constant_buffer(
        &mut self,
        out: &mut String,
        buffer: &ConstantBuffer,
    ) -> Result<(), ShaderCompileError> {
        let layout = buffer.layout(BufferPacking::Hlsl);
        writeln!(
            out,
            "#define {}_SIZE {}",
            buffer.name.to_uppercase(),
            layout.size
        )?;
        writeln!(
            out,
            "cbuffer {} : register(b{}) // {} bytes",
            buffer.name, buffer.slot, layout.size
        )?;
        writeln!(out, "{{")?;
        for member in &layout.members {
            let majorness = if member.ty.is_matrix() { "row_major " } else { "" };
            write_line(
                out,
                1,
                format_args!(
                    "{majorness}{} {}; // offset {}",
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
        writeln!(
            out,
            "{} {} : register(t{});",
            self.type_name(texture.ty)?,
            texture.name,
            texture.slot
        )?;
        writeln!(
            out,
            "SamplerState {} : register(s{});",
            sampler_name(&texture.name),
            texture.slot
        )?;
        Ok(())
    }

    fn write_stage_interface(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError> {
        for direction in [ParameterDirection::Input, ParameterDirection::Output] {
            writeln!(out, "struct {}", struct_name(method, direction))?;
            writeln!(out, "{{")?;
            for parameter in method.parameters.iter().filter(|p| p.direction == direction) {
                write_line(
                    out,
                    1,
                    format_args!(
                        "{} {} : {};",
                        self.type_name(parameter.ty)?,
                        parameter.name,
                        Self::semantic(method, parameter)
                    ),
                )?;
            }
            writeln!(out, "}};")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_entry_point_begin(
        &mut self,
        out: &mut String,
        method: &ShaderMethod,
    ) -> Result<(), ShaderCompileError> {
        let input = struct_name(method, ParameterDirection::Input);
        let output = struct_name(method, ParameterDirection::Output);
        writeln!(out, "{output} {}({input} {INPUT})", method.name)?;
        writeln!(out, "{{")?;
        write_line(out, 1, format_args!("{output} {OUTPUT} = ({output})0;"))?;
        Ok(())
    }

    fn write_entry_point_end(
        &mut self,
        out: &mut String,
        _method: &ShaderMethod,
        returns: bool,
    ) -> Result<(), ShaderCompileError> {
        if !returns {
            write_line(out, 1, self.return_statement())?;
        }
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

    fn compile(decl: TypeDecl, method: &str) -> ShaderCompilerOutput<String, HlslContext> {
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();
        let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);
        CompileShader::<HLSL>::compile(&compiler, method, None).unwrap()
    }

    #[test]
    fn vertex_shader() {
        let output = compile(fixture::textured(), "VertexMain");
        assert_eq!(output.context.profile, "vs_5_0");
        assert_eq!(output.context.entry_point, "VertexMain");

        let source = output.source;
        assert!(source.contains("static const float Scale = 2.0;"));
        assert!(source.contains("static const float Weights[3] = { 0.25, 0.5, 0.25 };"));
        assert!(source.contains("#define CAMERA_SIZE 192\ncbuffer Camera : register(b0) // 192 bytes"));
        assert!(source.contains("    row_major float4x4 View; // offset 0\n"));
        assert!(source.contains("cbuffer Viewport : register(b1) // 16 bytes"));
        assert!(source.contains("cbuffer Constants : register(b2) // 64 bytes"));
        assert!(source.contains("cbuffer Material : register(b3) // 16 bytes"));
        assert!(source.contains("Texture2D Albedo : register(t0);\nSamplerState fx_sampler_Albedo : register(s0);"));
        assert!(source.contains("    float4 position : POSITION;\n    float2 uv : TEXCOORD0;\n"));
        assert!(source.contains("    float4 outPosition : SV_Position;\n    float2 outUv : TEXCOORD0;\n"));
        assert!(source.contains("fx_VertexMain_Output VertexMain(fx_VertexMain_Input fx_input)\n{"));
        assert!(source.contains(
            "    fx_output.outPosition = mul(mul(fx_input.position, World), ViewProjection);\n"
        ));
        assert!(source.contains("    fx_output.outUv = fx_input.uv * Scale;\n"));
        assert!(source.ends_with("    return fx_output;\n}\n"));
    }

    #[test]
    fn fragment_shader() {
        let output = compile(fixture::textured(), "FragmentMain");
        assert_eq!(output.context.profile, "ps_5_0");

        let source = output.source;
        assert!(source.contains("    float4 color : SV_Target0;\n"));
        assert!(source.contains("    float4 texel = Albedo.Sample(fx_sampler_Albedo, fx_input.uv);\n"));
        assert!(source.contains("    fx_output.color = (texel * Tint) * Weights[1];\n"));
    }

    #[test]
    fn static_properties_become_constructors() {
        let source = compile(fixture::basic(), "FragmentMain").source;
        assert!(source.contains("fx_output.color = float4(1.0, 1.0, 1.0, 1.0);"));
    }

    #[test]
    fn compilation_is_deterministic() {
        let first = compile(fixture::textured(), "FragmentMain").source;
        let second = compile(fixture::textured(), "FragmentMain").source;
        assert_eq!(first, second);
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
        let source = compile(sampling_effect(), "Displace").source;
        assert!(source.contains(
            "    float4 texel = Albedo.SampleLevel(fx_sampler_Albedo, ((float2)0), 0);\n"
        ));
    }

    #[test]
    fn sampler_follows_texture_name() {
        let source = compile(sampling_effect(), "Tinted").source;
        assert!(source.contains("    fx_output.color = Albedo.Sample(fx_sampler_Albedo, ((float2)0));\n"));
    }

    #[test]
    fn unknown_method() {
        let decl = fixture::basic();
        let effect = build_effect(&decl, &AnnotatedResolver, &DiagnosticList::new()).unwrap();
        let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);
        assert!(matches!(
            CompileShader::<HLSL>::compile(&compiler, "Missing", None),
            Err(ShaderCompileError::UnknownMethod(_))
        ));
    }
}
