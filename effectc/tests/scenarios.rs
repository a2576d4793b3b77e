use effectc::common::{DataSemantics, DataType, ShaderType, VertexElementFormat};
use effectc::pack::{EffectPackager, PackOptions, ShaderAsset, VertexElement};
use effectc::reflect::diagnostics::{Diagnostic, DiagnosticList, Severity};
use effectc::reflect::glsl::GlslVersion;
use effectc::reflect::targets::{GLSL, HLSL};
use effectc::reflect::{
    build_effect, validate_effect, CompileShader, CrossCompiler, EffectClass, FIRST_USER_SLOT,
};
use effectc::syntax::{
    AnnotatedResolver, Attribute, BinaryOp, Expr, FieldDecl, MethodDecl, ParamDecl, SourceFile,
    Stmt, StmtKind, TypeDecl, TypeRef,
};
use std::path::PathBuf;

fn output_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("effectc-scenario-{}-{name}", std::process::id()))
}

fn technique(vertex: &str, fragment: &str) -> FieldDecl {
    FieldDecl::new("Default", TypeRef::named("Technique")).with_initializer(Expr::new_object(
        "Technique",
        vec![
            Expr::call(Expr::ident("nameof"), vec![Expr::ident(vertex)]),
            Expr::call(Expr::ident("nameof"), vec![Expr::ident(fragment)]),
        ],
    ))
}

fn vertex_main(body: Vec<Stmt>) -> MethodDecl {
    MethodDecl::new("VertexMain")
        .with_attribute(Attribute::new("VertexShader"))
        .with_parameter(ParamDecl::new("position", "Vector4").with_attribute(Attribute::new("Position")))
        .with_parameter(
            ParamDecl::new("outPosition", "Vector4")
                .out()
                .with_attribute(Attribute::new("Position")),
        )
        .with_body(
            std::iter::once(Stmt::expr(Expr::assign(
                Expr::ident("outPosition"),
                Expr::ident("position"),
            )))
            .chain(body)
            .collect(),
        )
}

fn fragment_main(body: Vec<Stmt>) -> MethodDecl {
    MethodDecl::new("FragmentMain")
        .with_attribute(Attribute::new("FragmentShader"))
        .with_parameter(
            ParamDecl::new("color", "Vector4")
                .out()
                .with_attribute(Attribute::new("Color")),
        )
        .with_body(
            std::iter::once(Stmt::expr(Expr::assign(
                Expr::ident("color"),
                Expr::member(Expr::type_name("Vector4"), "One"),
            )))
            .chain(body)
            .collect(),
        )
}

fn minimal(name: &str) -> TypeDecl {
    TypeDecl::new(name)
        .with_base("Effect")
        .with_member(vertex_main(vec![]))
        .with_member(fragment_main(vec![]))
        .with_member(technique("VertexMain", "FragmentMain"))
}

fn constant(name: &str, ty: &str, buffer: &str) -> FieldDecl {
    FieldDecl::new(name, TypeRef::named(ty))
        .with_attribute(Attribute::new("Constant").with_argument(Expr::string(buffer)))
}

fn build(decl: &TypeDecl) -> (Option<EffectClass>, Vec<Diagnostic>) {
    let diagnostics = DiagnosticList::new();
    let effect = match build_effect(decl, &AnnotatedResolver, &diagnostics) {
        Ok(effect) if validate_effect(decl, &effect, &AnnotatedResolver, &diagnostics) => {
            Some(effect)
        }
        _ => None,
    };
    (effect, diagnostics.into_vec())
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn minimal_effect_packs_with_system_buffers_only() -> anyhow::Result<()> {
    let decl = minimal("Minimal");
    let (effect, diagnostics) = build(&decl);
    assert!(effect.is_some());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let dir = output_dir("minimal");
    let file = SourceFile::new("Minimal.cs").with_type(decl);
    let packager = EffectPackager::new(PackOptions {
        output_dir: dir.clone(),
        ..Default::default()
    });
    let sink = DiagnosticList::new();
    let report = packager.pack_file(&file, &AnnotatedResolver, &sink)?;
    assert!(sink.is_empty());
    assert_eq!(report.packed.len(), 1);

    let packed = &report.packed[0];
    let buffers: Vec<_> = packed
        .wrapper
        .buffers
        .iter()
        .map(|b| (b.name.as_str(), b.slot, b.shared))
        .collect();
    assert_eq!(buffers, vec![("Camera", 0, true), ("Viewport", 1, true)]);
    assert!(packed.wrapper.textures.is_empty());

    let vertex = std::fs::read(dir.join("Minimal_VertexMain.vs.bin"))?;
    let vertex = ShaderAsset::from_bytes(&vertex, ShaderType::Vertex)?;
    assert_eq!(
        vertex.inputs,
        vec![VertexElement {
            format: VertexElementFormat::Vector4,
            semantics: DataSemantics::Position,
        }]
    );
    assert!(vertex.hlsl.contains("cbuffer Camera : register(b0)"));
    assert!(vertex.glsl.contains("uniform Viewport"));
    assert!(!vertex.hlsl.contains("register(b2)"));

    let fragment = std::fs::read(dir.join("Minimal_FragmentMain.fs.bin"))?;
    let fragment = ShaderAsset::from_bytes(&fragment, ShaderType::Fragment)?;
    assert!(fragment.inputs.is_empty());
    assert_eq!(&fragment, &packed.shaders[1].asset);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn foreach_fails_validation_and_is_not_packed() -> anyhow::Result<()> {
    let foreach = Stmt::new(StmtKind::Foreach {
        ty: TypeRef::named("float"),
        name: "x".into(),
        collection: Expr::ident("position"),
        body: Box::new(Stmt::block(vec![])),
    });
    let decl = TypeDecl::new("Looping")
        .with_base("Effect")
        .with_member(vertex_main(vec![foreach]))
        .with_member(fragment_main(vec![]))
        .with_member(technique("VertexMain", "FragmentMain"));

    let (effect, diagnostics) = build(&decl);
    assert!(effect.is_none());
    assert!(errors(&diagnostics).contains(&"unsupported feature: foreach"));

    let dir = output_dir("foreach");
    let packager = EffectPackager::new(PackOptions {
        output_dir: dir.clone(),
        ..Default::default()
    });
    let sink = DiagnosticList::new();
    let report = packager.pack_file(
        &SourceFile::new("Looping.cs").with_type(decl),
        &AnnotatedResolver,
        &sink,
    )?;
    assert!(report.packed.is_empty());
    assert_eq!(report.skipped, vec!["Looping".to_string()]);
    assert!(sink.has_errors());
    assert!(!dir.join("Looping_VertexMain.vs.bin").exists());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn fragment_output_with_normal_semantics() {
    let decl = TypeDecl::new("Normals")
        .with_base("Effect")
        .with_member(vertex_main(vec![]))
        .with_member(
            fragment_main(vec![]).with_parameter(
                ParamDecl::new("normal", "Vector3")
                    .out()
                    .with_attribute(Attribute::new("Normal")),
            ),
        )
        .with_member(technique("VertexMain", "FragmentMain"));

    let (effect, diagnostics) = build(&decl);
    assert!(effect.is_none());
    let errors = errors(&diagnostics);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'normal'"));
    assert!(errors[0].contains("Normal"));
}

#[test]
fn constants_with_one_buffer_name_share_a_buffer() {
    let decl = minimal("Shared")
        .with_member(constant("Tint", "Vector4", "Material"))
        .with_member(constant("Gloss", "float", "Material"));

    let (effect, diagnostics) = build(&decl);
    let effect = effect.unwrap();
    assert!(errors(&diagnostics).is_empty());

    let material: Vec<_> = effect
        .constant_buffers
        .iter()
        .filter(|buffer| buffer.name == "Material")
        .collect();
    assert_eq!(material.len(), 1);
    assert_eq!(material[0].slot, FIRST_USER_SLOT);
    let members: Vec<_> = material[0]
        .constants
        .iter()
        .map(|c| (c.name.as_str(), c.ty))
        .collect();
    assert_eq!(members, vec![("Tint", DataType::Vector4), ("Gloss", DataType::Float)]);
}

#[test]
fn unsupported_invocation() {
    let call = Stmt::expr(Expr::call(
        Expr::member(Expr::type_name("Console"), "WriteLine"),
        vec![Expr::float(1.0)],
    ));
    let decl = TypeDecl::new("Printing")
        .with_base("Effect")
        .with_member(vertex_main(vec![]))
        .with_member(fragment_main(vec![call]))
        .with_member(technique("VertexMain", "FragmentMain"));

    let (effect, diagnostics) = build(&decl);
    assert!(effect.is_none());
    assert!(errors(&diagnostics)
        .iter()
        .any(|e| e.starts_with("invocation of unsupported method")));
}

#[test]
fn user_buffer_slots_follow_first_use() {
    let decl = minimal("Buffers")
        .with_member(constant("A", "float", "Second"))
        .with_member(constant("B", "float", "First"))
        .with_member(constant("C", "float", "Second"))
        .with_member(FieldDecl::new("D", TypeRef::named("float")).with_attribute(Attribute::new("Constant")));

    let (effect, _) = build(&decl);
    let effect = effect.unwrap();
    let user: Vec<_> = effect
        .user_buffers()
        .map(|b| (b.name.as_str(), b.slot))
        .collect();
    assert_eq!(user, vec![("Second", 2), ("First", 3), ("Constants", 4)]);
    assert!(user.iter().all(|(_, slot)| *slot > 1));
}

#[test]
fn texture_slots_and_samplers() -> anyhow::Result<()> {
    let sample = |texture: &str| {
        Expr::call(
            Expr::member(Expr::ident(texture), "Sample"),
            vec![Expr::new_object("Vector2", vec![Expr::float(0.5), Expr::float(0.5)])],
        )
    };
    let body = vec![Stmt::expr(Expr::assign(
        Expr::ident("color"),
        Expr::binary(BinaryOp::Mul, sample("Base"), sample("Detail")),
    ))];
    let decl = TypeDecl::new("Textures")
        .with_base("Effect")
        .with_member(FieldDecl::new("Base", TypeRef::named("Texture2D")))
        .with_member(FieldDecl::new("Detail", TypeRef::named("Texture2D")))
        .with_member(vertex_main(vec![]))
        .with_member(fragment_main(body))
        .with_member(technique("VertexMain", "FragmentMain"));

    let (effect, diagnostics) = build(&decl);
    assert!(errors(&diagnostics).is_empty(), "{diagnostics:?}");
    let effect = effect.unwrap();
    let slots: Vec<_> = effect.textures.iter().map(|t| (t.name.as_str(), t.slot)).collect();
    assert_eq!(slots, vec![("Base", 0), ("Detail", 1)]);

    let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);
    let hlsl = CompileShader::<HLSL>::compile(&compiler, "FragmentMain", None)?.source;
    assert_eq!(hlsl.matches("SamplerState ").count(), 2);
    assert!(hlsl.contains("SamplerState fx_sampler_Base : register(s0);"));
    assert!(hlsl.contains("SamplerState fx_sampler_Detail : register(s1);"));
    assert!(hlsl.contains("Base.Sample(fx_sampler_Base, float2(0.5, 0.5))"));

    let glsl = CompileShader::<GLSL>::compile(&compiler, "FragmentMain", GlslVersion::Glsl330)?;
    assert!(glsl.source.contains("texture(Detail, vec2(0.5, 0.5))"));
    assert_eq!(
        glsl.context.sampler_bindings,
        vec![("Base".to_string(), 0), ("Detail".to_string(), 1)]
    );
    Ok(())
}

#[test]
fn vertex_layout_round_trips() -> anyhow::Result<()> {
    let vertex = MethodDecl::new("VertexMain")
        .with_attribute(Attribute::new("VertexShader"))
        .with_parameter(ParamDecl::new("position", "Vector4").with_attribute(Attribute::new("Position")))
        .with_parameter(ParamDecl::new("normal", "Vector3").with_attribute(Attribute::new("Normal")))
        .with_parameter(
            ParamDecl::new("shade", "float").with_attribute(Attribute::new("Color").with_argument(Expr::int(1))),
        )
        .with_parameter(
            ParamDecl::new("uv", "Vector2").with_attribute(Attribute::new("TexCoord").with_argument(Expr::int(2))),
        )
        .with_parameter(
            ParamDecl::new("outPosition", "Vector4")
                .out()
                .with_attribute(Attribute::new("Position")),
        )
        .with_body(vec![Stmt::expr(Expr::assign(
            Expr::ident("outPosition"),
            Expr::ident("position"),
        ))]);
    let decl = TypeDecl::new("Layout")
        .with_base("Effect")
        .with_member(vertex)
        .with_member(fragment_main(vec![]))
        .with_member(technique("VertexMain", "FragmentMain"));

    let dir = output_dir("layout");
    let packager = EffectPackager::new(PackOptions {
        output_dir: dir.clone(),
        parallel: false,
        ..Default::default()
    });
    let sink = DiagnosticList::new();
    let report = packager.pack_file(&SourceFile::new("Layout.cs").with_type(decl), &AnnotatedResolver, &sink)?;
    assert!(!sink.has_errors(), "{:?}", sink.snapshot());

    let path = &report.packed[0].shaders[0].path;
    let asset = ShaderAsset::from_bytes(&std::fs::read(path)?, ShaderType::Vertex)?;
    let layout: Vec<_> = asset
        .inputs
        .iter()
        .map(|element| (element.format, element.semantics))
        .collect();
    assert_eq!(
        layout,
        vec![
            (VertexElementFormat::Vector4, DataSemantics::Position),
            (VertexElementFormat::Vector3, DataSemantics::Normal),
            (VertexElementFormat::Single, DataSemantics::Color1),
            (VertexElementFormat::Vector2, DataSemantics::TexCoord2),
        ]
    );

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn compilation_is_idempotent() -> anyhow::Result<()> {
    let decl = minimal("Twice").with_member(constant("Tint", "Vector4", "Material"));
    let (effect, _) = build(&decl);
    let effect = effect.unwrap();
    let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);

    for method in ["VertexMain", "FragmentMain"] {
        let first = CompileShader::<HLSL>::compile(&compiler, method, None)?.source;
        let second = CompileShader::<HLSL>::compile(&compiler, method, None)?.source;
        assert_eq!(first, second);

        let first = CompileShader::<GLSL>::compile(&compiler, method, GlslVersion::Glsl450)?.source;
        let second = CompileShader::<GLSL>::compile(&compiler, method, GlslVersion::Glsl450)?.source;
        assert_eq!(first, second);
    }
    Ok(())
}

#[test]
fn index_at_component_count_is_rejected() {
    let index = |i: i64| {
        let local = Stmt::local(
            TypeRef::named("Vector3"),
            "v",
            Some(Expr::member(Expr::type_name("Vector3"), "One")),
        );
        let read = Stmt::local(
            TypeRef::named("float"),
            "x",
            Some(Expr::index(Expr::ident("v"), Expr::int(i))),
        );
        TypeDecl::new("Indexing")
            .with_base("Effect")
            .with_member(vertex_main(vec![]))
            .with_member(fragment_main(vec![local, read]))
            .with_member(technique("VertexMain", "FragmentMain"))
    };

    let (effect, diagnostics) = build(&index(2));
    assert!(effect.is_some(), "{diagnostics:?}");

    let (effect, diagnostics) = build(&index(3));
    assert!(effect.is_none());
    assert_eq!(
        errors(&diagnostics),
        vec!["index 3 is out of range for Vector3 with 3 components"]
    );
}

#[test]
fn trees_load_from_json() -> anyhow::Result<()> {
    let file = SourceFile::new("Minimal.cs").with_type(minimal("Minimal"));
    let json = serde_json::to_string(&file)?;
    let loaded: SourceFile = serde_json::from_str(&json)?;

    let (effect, diagnostics) = build(&loaded.types[0]);
    assert!(effect.is_some());
    assert!(diagnostics.is_empty());
    Ok(())
}
