use effectc_common::DataType;
use effectc_syntax::MethodRef;
use std::str::FromStr;

/// A shader built-in that a host-language method call maps to.
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Intrinsic {
    /// The invocation has no shader equivalent.
    #[default]
    Unknown,
    SampleTexture,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sqrt,
    InverseSqrt,
    Exp,
    Log,
    Pow,
    Floor,
    Ceiling,
    Frac,
    Min,
    Max,
    Clamp,
    Saturate,
    Step,
    Lerp,
    SmoothStep,
    Ddx,
    Ddy,
    Dot,
    Cross,
    Distance,
    Length,
    Normalize,
    Reflect,
    Transpose,
}

impl Intrinsic {
    /// The HLSL function name.
    pub const fn hlsl_name(&self) -> &'static str {
        match self {
            Intrinsic::Unknown => "<unknown>",
            Intrinsic::SampleTexture => "Sample",
            Intrinsic::Abs => "abs",
            Intrinsic::Sin => "sin",
            Intrinsic::Cos => "cos",
            Intrinsic::Tan => "tan",
            Intrinsic::Asin => "asin",
            Intrinsic::Acos => "acos",
            Intrinsic::Atan => "atan",
            Intrinsic::Atan2 => "atan2",
            Intrinsic::Sqrt => "sqrt",
            Intrinsic::InverseSqrt => "rsqrt",
            Intrinsic::Exp => "exp",
            Intrinsic::Log => "log",
            Intrinsic::Pow => "pow",
            Intrinsic::Floor => "floor",
            Intrinsic::Ceiling => "ceil",
            Intrinsic::Frac => "frac",
            Intrinsic::Min => "min",
            Intrinsic::Max => "max",
            Intrinsic::Clamp => "clamp",
            Intrinsic::Saturate => "saturate",
            Intrinsic::Step => "step",
            Intrinsic::Lerp => "lerp",
            Intrinsic::SmoothStep => "smoothstep",
            Intrinsic::Ddx => "ddx",
            Intrinsic::Ddy => "ddy",
            Intrinsic::Dot => "dot",
            Intrinsic::Cross => "cross",
            Intrinsic::Distance => "distance",
            Intrinsic::Length => "length",
            Intrinsic::Normalize => "normalize",
            Intrinsic::Reflect => "reflect",
            Intrinsic::Transpose => "transpose",
        }
    }

    /// The GLSL function name.
    ///
    /// `Saturate` has no GLSL function and is lowered to `clamp` by the backend.
    pub const fn glsl_name(&self) -> &'static str {
        match self {
            Intrinsic::SampleTexture => "texture",
            Intrinsic::Atan2 => "atan",
            Intrinsic::InverseSqrt => "inversesqrt",
            Intrinsic::Frac => "fract",
            Intrinsic::Lerp => "mix",
            Intrinsic::Saturate => "clamp",
            Intrinsic::Ddx => "dFdx",
            Intrinsic::Ddy => "dFdy",
            other => other.hlsl_name(),
        }
    }

    /// Screen-space derivatives only exist in fragment shaders.
    pub const fn is_fragment_only(&self) -> bool {
        matches!(self, Intrinsic::Ddx | Intrinsic::Ddy)
    }

    /// The type of the result, given the types of the receiver (for instance methods) and
    /// arguments in order.
    pub fn return_type(&self, operands: &[DataType]) -> DataType {
        match self {
            Intrinsic::Unknown => DataType::Unknown,
            Intrinsic::SampleTexture => DataType::Vector4,
            Intrinsic::Dot | Intrinsic::Distance | Intrinsic::Length => DataType::Float,
            Intrinsic::Cross => DataType::Vector3,
            Intrinsic::Transpose => DataType::Matrix,
            _ => match operands.first().copied().unwrap_or_default() {
                DataType::Int => DataType::Float,
                ty => ty,
            },
        }
    }
}

/// One overload in the intrinsic table.
#[derive(Debug)]
pub struct IntrinsicSignature {
    pub declaring_type: &'static str,
    pub name: &'static str,
    pub is_static: bool,
    pub parameters: &'static [DataType],
    pub intrinsic: Intrinsic,
}

const fn method(
    declaring_type: &'static str,
    name: &'static str,
    parameters: &'static [DataType],
    intrinsic: Intrinsic,
) -> IntrinsicSignature {
    IntrinsicSignature {
        declaring_type,
        name,
        is_static: true,
        parameters,
        intrinsic,
    }
}

const fn instance(
    declaring_type: &'static str,
    name: &'static str,
    parameters: &'static [DataType],
    intrinsic: Intrinsic,
) -> IntrinsicSignature {
    IntrinsicSignature {
        declaring_type,
        name,
        is_static: false,
        parameters,
        intrinsic,
    }
}

const F: DataType = DataType::Float;
const V2: DataType = DataType::Vector2;
const V3: DataType = DataType::Vector3;
const V4: DataType = DataType::Vector4;
const M: DataType = DataType::Matrix;

static INTRINSICS: &[IntrinsicSignature] = &[
    instance("Texture2D", "Sample", &[V2], Intrinsic::SampleTexture),
    instance("TextureCube", "Sample", &[V3], Intrinsic::SampleTexture),
    method("MathF", "Abs", &[F], Intrinsic::Abs),
    method("MathF", "Sin", &[F], Intrinsic::Sin),
    method("MathF", "Cos", &[F], Intrinsic::Cos),
    method("MathF", "Tan", &[F], Intrinsic::Tan),
    method("MathF", "Asin", &[F], Intrinsic::Asin),
    method("MathF", "Acos", &[F], Intrinsic::Acos),
    method("MathF", "Atan", &[F], Intrinsic::Atan),
    method("MathF", "Sqrt", &[F], Intrinsic::Sqrt),
    method("MathF", "Exp", &[F], Intrinsic::Exp),
    method("MathF", "Log", &[F], Intrinsic::Log),
    method("MathF", "Floor", &[F], Intrinsic::Floor),
    method("MathF", "Ceiling", &[F], Intrinsic::Ceiling),
    method("MathF", "Atan2", &[F, F], Intrinsic::Atan2),
    method("MathF", "Pow", &[F, F], Intrinsic::Pow),
    method("MathF", "Min", &[F, F], Intrinsic::Min),
    method("MathF", "Max", &[F, F], Intrinsic::Max),
    method("MathF", "Clamp", &[F, F, F], Intrinsic::Clamp),
    method("ShaderMath", "Rsqrt", &[F], Intrinsic::InverseSqrt),
    method("ShaderMath", "Frac", &[F], Intrinsic::Frac),
    method("ShaderMath", "Saturate", &[F], Intrinsic::Saturate),
    method("ShaderMath", "Ddx", &[F], Intrinsic::Ddx),
    method("ShaderMath", "Ddy", &[F], Intrinsic::Ddy),
    method("ShaderMath", "Step", &[F, F], Intrinsic::Step),
    method("ShaderMath", "Lerp", &[F, F, F], Intrinsic::Lerp),
    method("ShaderMath", "SmoothStep", &[F, F, F], Intrinsic::SmoothStep),
    method("Vector2", "Dot", &[V2, V2], Intrinsic::Dot),
    method("Vector2", "Distance", &[V2, V2], Intrinsic::Distance),
    method("Vector2", "Min", &[V2, V2], Intrinsic::Min),
    method("Vector2", "Max", &[V2, V2], Intrinsic::Max),
    method("Vector2", "Reflect", &[V2, V2], Intrinsic::Reflect),
    method("Vector2", "Normalize", &[V2], Intrinsic::Normalize),
    method("Vector2", "Lerp", &[V2, V2, F], Intrinsic::Lerp),
    method("Vector2", "Clamp", &[V2, V2, V2], Intrinsic::Clamp),
    instance("Vector2", "Length", &[], Intrinsic::Length),
    method("Vector3", "Dot", &[V3, V3], Intrinsic::Dot),
    method("Vector3", "Distance", &[V3, V3], Intrinsic::Distance),
    method("Vector3", "Min", &[V3, V3], Intrinsic::Min),
    method("Vector3", "Max", &[V3, V3], Intrinsic::Max),
    method("Vector3", "Reflect", &[V3, V3], Intrinsic::Reflect),
    method("Vector3", "Cross", &[V3, V3], Intrinsic::Cross),
    method("Vector3", "Normalize", &[V3], Intrinsic::Normalize),
    method("Vector3", "Lerp", &[V3, V3, F], Intrinsic::Lerp),
    method("Vector3", "Clamp", &[V3, V3, V3], Intrinsic::Clamp),
    instance("Vector3", "Length", &[], Intrinsic::Length),
    method("Vector4", "Dot", &[V4, V4], Intrinsic::Dot),
    method("Vector4", "Distance", &[V4, V4], Intrinsic::Distance),
    method("Vector4", "Min", &[V4, V4], Intrinsic::Min),
    method("Vector4", "Max", &[V4, V4], Intrinsic::Max),
    method("Vector4", "Normalize", &[V4], Intrinsic::Normalize),
    method("Vector4", "Lerp", &[V4, V4, F], Intrinsic::Lerp),
    method("Vector4", "Clamp", &[V4, V4, V4], Intrinsic::Clamp),
    instance("Vector4", "Length", &[], Intrinsic::Length),
    method("Matrix", "Transpose", &[M], Intrinsic::Transpose),
];

/// Every overload in the intrinsic table.
pub fn signatures() -> &'static [IntrinsicSignature] {
    INTRINSICS
}

/// The canonical form of a host type name: unqualified, with aliases of shader types folded
/// to their canonical spelling.
pub fn canonical_type_name(name: &str) -> &str {
    let unqualified = name.rsplit('.').next().unwrap_or(name);
    match DataType::from_str(unqualified) {
        Ok(DataType::Unknown) | Err(_) => unqualified,
        Ok(ty) => ty.host_name(),
    }
}

/// Resolve an invocation target to its intrinsic.
///
/// Overloads are filtered by declaring type, then name, then parameter count, then the
/// exact canonical parameter types. If no overload matches exactly, `int` parameters are
/// widened to `float` and the lookup is repeated, matching the implicit conversion of the
/// host language.
pub fn resolve(method: &MethodRef) -> Intrinsic {
    let declaring_type = canonical_type_name(&method.declaring_type);
    let parameters: Vec<DataType> = method
        .parameter_types
        .iter()
        .map(|ty| DataType::from_str(ty).unwrap_or_default())
        .collect();

    let candidates = || {
        INTRINSICS
            .iter()
            .filter(|sig| sig.declaring_type == declaring_type)
            .filter(|sig| sig.name == method.name)
            .filter(|sig| sig.parameters.len() == parameters.len())
            .filter(|sig| sig.is_static == method.is_static)
    };

    let exact = candidates().find(|sig| sig.parameters == parameters.as_slice());
    let widened = || {
        candidates().find(|sig| {
            sig.parameters
                .iter()
                .zip(&parameters)
                .all(|(expected, given)| {
                    expected == given || (*expected == DataType::Float && *given == DataType::Int)
                })
        })
    };
    exact
        .or_else(widened)
        .map_or(Intrinsic::Unknown, |sig| sig.intrinsic)
}

#[cfg(test)]
mod test {
    use super::*;

    fn method_ref(ty: &str, name: &str, params: &[&str], is_static: bool) -> MethodRef {
        MethodRef {
            declaring_type: ty.to_string(),
            name: name.to_string(),
            parameter_types: params.iter().map(|p| p.to_string()).collect(),
            is_static,
        }
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(
            resolve(&method_ref("System.MathF", "Sqrt", &["Single"], true)),
            Intrinsic::Sqrt
        );
        assert_eq!(
            resolve(&method_ref("System.Numerics.Matrix4x4", "Transpose", &["Matrix4x4"], true)),
            Intrinsic::Transpose
        );
        assert_eq!(
            resolve(&method_ref("Texture2D", "Sample", &["Vector2"], false)),
            Intrinsic::SampleTexture
        );
    }

    #[test]
    fn rejects_mismatched_overloads() {
        // wrong arity
        assert_eq!(resolve(&method_ref("MathF", "Sin", &["float", "float"], true)), Intrinsic::Unknown);
        // wrong parameter type
        assert_eq!(resolve(&method_ref("MathF", "Sin", &["double"], true)), Intrinsic::Unknown);
        // no Reflect on Vector4
        assert_eq!(
            resolve(&method_ref("Vector4", "Reflect", &["Vector4", "Vector4"], true)),
            Intrinsic::Unknown
        );
        // instance call of a static method
        assert_eq!(resolve(&method_ref("Vector3", "Normalize", &["Vector3"], false)), Intrinsic::Unknown);
        assert_eq!(resolve(&method_ref("Console", "WriteLine", &["string"], true)), Intrinsic::Unknown);
    }

    #[test]
    fn widens_int_arguments() {
        assert_eq!(resolve(&method_ref("MathF", "Pow", &["float", "int"], true)), Intrinsic::Pow);
        assert_eq!(
            resolve(&method_ref("Vector3", "Lerp", &["Vector3", "Vector3", "Int32"], true)),
            Intrinsic::Lerp
        );
        assert_eq!(resolve(&method_ref("Vector2", "Normalize", &["int"], true)), Intrinsic::Unknown);
        assert_eq!(Intrinsic::Abs.return_type(&[DataType::Int]), DataType::Float);
    }

    #[test]
    fn table_has_no_ambiguous_overloads() {
        for (i, a) in signatures().iter().enumerate() {
            for b in &signatures()[i + 1..] {
                assert!(
                    !(a.declaring_type == b.declaring_type
                        && a.name == b.name
                        && a.is_static == b.is_static
                        && a.parameters == b.parameters),
                    "duplicate overload {}.{}",
                    a.declaring_type,
                    a.name
                );
            }
        }
    }

    #[test]
    fn glsl_renames() {
        assert_eq!(Intrinsic::Atan2.glsl_name(), "atan");
        assert_eq!(Intrinsic::InverseSqrt.glsl_name(), "inversesqrt");
        assert_eq!(Intrinsic::Lerp.glsl_name(), "mix");
        assert_eq!(Intrinsic::Sin.glsl_name(), "sin");
    }
}
