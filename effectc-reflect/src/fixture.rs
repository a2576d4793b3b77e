//! Effect declarations shared by the unit tests.

use effectc_syntax::{
    Attribute, BinaryOp, Expr, FieldDecl, MethodDecl, ParamDecl, Stmt, TypeDecl, TypeRef,
};

pub(crate) fn semantics(name: &str) -> Attribute {
    Attribute::new(name)
}

pub(crate) fn technique(name: &str, vertex: &str, fragment: &str) -> FieldDecl {
    FieldDecl::new(name, TypeRef::named("Technique")).with_initializer(Expr::new_object(
        "Technique",
        vec![
            Expr::call(Expr::ident("nameof"), vec![Expr::ident(vertex)]),
            Expr::call(Expr::ident("nameof"), vec![Expr::ident(fragment)]),
        ],
    ))
}

pub(crate) fn constant(name: &str, ty: &str, buffer: Option<&str>) -> FieldDecl {
    let mut attribute = Attribute::new("Constant");
    if let Some(buffer) = buffer {
        attribute = attribute.with_argument(Expr::string(buffer));
    }
    FieldDecl::new(name, TypeRef::named(ty)).with_attribute(attribute)
}

pub(crate) fn vertex_shader(name: &str) -> MethodDecl {
    MethodDecl::new(name)
        .with_attribute(Attribute::new("VertexShader"))
        .with_parameter(ParamDecl::new("position", "Vector4").with_attribute(semantics("Position")))
        .with_parameter(
            ParamDecl::new("outPosition", "Vector4")
                .out()
                .with_attribute(semantics("Position")),
        )
        .with_body(vec![Stmt::expr(Expr::assign(
            Expr::ident("outPosition"),
            Expr::ident("position"),
        ))])
}

pub(crate) fn fragment_shader(name: &str) -> MethodDecl {
    MethodDecl::new(name)
        .with_attribute(Attribute::new("FragmentShader"))
        .with_parameter(
            ParamDecl::new("color", "Vector4")
                .out()
                .with_attribute(semantics("Color")),
        )
        .with_body(vec![Stmt::expr(Expr::assign(
            Expr::ident("color"),
            Expr::member(Expr::type_name("Vector4"), "One"),
        ))])
}

/// Position in, position out, a constant color.
pub(crate) fn basic() -> TypeDecl {
    TypeDecl::new("Basic")
        .with_base("Effect")
        .with_member(vertex_shader("VertexMain"))
        .with_member(fragment_shader("FragmentMain"))
        .with_member(technique("Default", "VertexMain", "FragmentMain"))
}

/// An effect with user constants, a literal array and a sampled texture.
pub(crate) fn textured() -> TypeDecl {
    let vertex = MethodDecl::new("VertexMain")
        .with_attribute(Attribute::new("VertexShader"))
        .with_parameter(ParamDecl::new("position", "Vector4").with_attribute(semantics("Position")))
        .with_parameter(ParamDecl::new("uv", "Vector2").with_attribute(semantics("TexCoord")))
        .with_parameter(
            ParamDecl::new("outPosition", "Vector4")
                .out()
                .with_attribute(semantics("Position")),
        )
        .with_parameter(
            ParamDecl::new("outUv", "Vector2")
                .out()
                .with_attribute(semantics("TexCoord")),
        )
        .with_body(vec![
            Stmt::expr(Expr::assign(
                Expr::ident("outPosition"),
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::binary(BinaryOp::Mul, Expr::ident("position"), Expr::ident("World")),
                    Expr::ident("ViewProjection"),
                ),
            )),
            Stmt::expr(Expr::assign(
                Expr::ident("outUv"),
                Expr::binary(BinaryOp::Mul, Expr::ident("uv"), Expr::ident("Scale")),
            )),
        ]);

    let fragment = MethodDecl::new("FragmentMain")
        .with_attribute(Attribute::new("FragmentShader"))
        .with_parameter(ParamDecl::new("uv", "Vector2").with_attribute(semantics("TexCoord")))
        .with_parameter(
            ParamDecl::new("color", "Vector4")
                .out()
                .with_attribute(semantics("Color")),
        )
        .with_body(vec![
            Stmt::local(
                TypeRef::named("Vector4"),
                "texel",
                Some(Expr::call(
                    Expr::member(Expr::ident("Albedo"), "Sample"),
                    vec![Expr::ident("uv")],
                )),
            ),
            Stmt::expr(Expr::assign(
                Expr::ident("color"),
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::binary(BinaryOp::Mul, Expr::ident("texel"), Expr::ident("Tint")),
                    Expr::index(Expr::ident("Weights"), Expr::int(1)),
                ),
            )),
        ]);

    TypeDecl::new("Textured")
        .with_base("Effect")
        .with_member(constant("World", "Matrix4x4", None))
        .with_member(constant("Tint", "Vector4", Some("Material")))
        .with_member(FieldDecl::new("Scale", TypeRef::named("float")).with_initializer(Expr::float(2.0)))
        .with_member(
            FieldDecl::new("Weights", TypeRef::array_of("float")).with_initializer(Expr::new_array(
                "float",
                vec![Expr::float(0.25), Expr::float(0.5), Expr::float(0.25)],
            )),
        )
        .with_member(FieldDecl::new("Albedo", TypeRef::named("Texture2D")))
        .with_member(vertex)
        .with_member(fragment)
        .with_member(technique("Default", "VertexMain", "FragmentMain"))
}
