use bitflags::bitflags;
use effectc_common::{DataSemantics, DataType, ShaderType};
use effectc_syntax::{Expr, ExprKind, SourceLocation, Stmt};

pub(crate) mod builder;
mod layout;

pub use builder::{build_effect, is_effect_candidate};
pub use layout::{BufferLayout, BufferPacking, MemberLayout};

/// Name of the implicit camera constant buffer.
pub const CAMERA_BUFFER: &str = "Camera";
/// Name of the implicit viewport constant buffer.
pub const VIEWPORT_BUFFER: &str = "Viewport";
/// The buffer user constants are grouped into when no buffer name is given.
pub const DEFAULT_BUFFER: &str = "Constants";
/// The first slot available to user constant buffers.
pub const FIRST_USER_SLOT: u32 = 2;

bitflags! {
    /// The shader stages a binding is referenced from.
    pub struct BindingStage: u8 {
        const NONE = 0b00000000;
        const VERTEX = 0b00000001;
        const FRAGMENT = 0b00000010;
    }
}

impl From<ShaderType> for BindingStage {
    fn from(value: ShaderType) -> Self {
        match value {
            ShaderType::Vertex => BindingStage::VERTEX,
            ShaderType::Fragment => BindingStage::FRAGMENT,
        }
    }
}

#[inline(always)]
/// Give a size aligned to 16 byte boundary
pub(crate) const fn align_uniform_size(size: u32) -> u32 {
    (size + 0xf) & !0xf
}

/// The model of one effect declaration.
#[derive(Debug, Clone)]
pub struct EffectClass {
    pub name: String,
    pub namespace: Option<String>,
    pub documentation: Vec<String>,
    /// Constant buffers, sorted by slot.
    pub constant_buffers: Vec<ConstantBuffer>,
    pub methods: Vec<ShaderMethod>,
    pub literals: Vec<ShaderLiteral>,
    pub textures: Vec<ShaderTexture>,
    pub techniques: Vec<Technique>,
    pub location: SourceLocation,
}

impl EffectClass {
    pub fn method(&self, name: &str) -> Option<&ShaderMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn methods_of(&self, stage: ShaderType) -> impl Iterator<Item = &ShaderMethod> {
        self.methods.iter().filter(move |m| m.stage == stage)
    }

    pub fn literal(&self, name: &str) -> Option<&ShaderLiteral> {
        self.literals.iter().find(|l| l.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&ShaderTexture> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub fn technique(&self, name: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.name == name)
    }

    pub fn constant_buffer(&self, name: &str) -> Option<&ConstantBuffer> {
        self.constant_buffers.iter().find(|b| b.name == name)
    }

    /// Find a shader constant and the buffer it belongs to.
    pub fn constant(&self, name: &str) -> Option<(&ConstantBuffer, &ShaderConstant)> {
        self.constant_buffers.iter().find_map(|buffer| {
            buffer
                .constants
                .iter()
                .find(|c| c.name == name)
                .map(|constant| (buffer, constant))
        })
    }

    /// User constant buffers, in slot order.
    pub fn user_buffers(&self) -> impl Iterator<Item = &ConstantBuffer> {
        self.constant_buffers.iter().filter(|b| !b.shared)
    }

    /// The vertex and fragment methods of a technique.
    pub fn technique_methods(&self, technique: &Technique) -> Option<(&ShaderMethod, &ShaderMethod)> {
        Some((self.method(&technique.vertex)?, self.method(&technique.fragment)?))
    }
}

/// A named, slotted group of shader constants.
#[derive(Debug, Clone)]
pub struct ConstantBuffer {
    pub name: String,
    pub slot: u32,
    /// Whether the buffer is provided by the engine rather than the effect.
    pub shared: bool,
    pub constants: Vec<ShaderConstant>,
    pub stage_mask: BindingStage,
}

impl ConstantBuffer {
    pub fn layout(&self, packing: BufferPacking) -> BufferLayout {
        BufferLayout::compute(&self.constants, packing)
    }

    pub fn size(&self, packing: BufferPacking) -> u32 {
        self.layout(packing).size
    }
}

/// A constant supplied by the application at runtime.
#[derive(Debug, Clone)]
pub struct ShaderConstant {
    pub name: String,
    pub ty: DataType,
    pub documentation: Vec<String>,
    pub location: SourceLocation,
}

/// A compile-time constant baked into the shader source.
#[derive(Debug, Clone)]
pub struct ShaderLiteral {
    pub name: String,
    /// The type of the literal, or of its elements for array literals.
    pub ty: DataType,
    pub value: Expr,
    pub location: SourceLocation,
}

impl ShaderLiteral {
    /// The element values of an array literal.
    pub fn elements(&self) -> Option<&[Expr]> {
        match &self.value.unparenthesized().kind {
            ExprKind::ArrayCreation {
                initializer: Some(values),
                ..
            }
            | ExprKind::ArrayInitializer(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        self.elements().is_some()
    }

    /// The number of elements of an array literal.
    pub fn len(&self) -> Option<usize> {
        self.elements().map(|values| values.len())
    }
}

#[derive(Debug, Clone)]
pub struct ShaderTexture {
    pub name: String,
    pub ty: DataType,
    /// The texture slot. The companion sampler is bound at the same slot.
    pub slot: u32,
    pub stage_mask: BindingStage,
    pub location: SourceLocation,
}

/// Whether a parameter is a stage input or output.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParameterDirection {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub struct ShaderParameter {
    pub name: String,
    pub ty: DataType,
    pub semantics: DataSemantics,
    pub direction: ParameterDirection,
    pub location: SourceLocation,
}

/// A method tagged as a vertex or fragment shader.
#[derive(Debug, Clone)]
pub struct ShaderMethod {
    pub name: String,
    pub stage: ShaderType,
    pub parameters: Vec<ShaderParameter>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

impl ShaderMethod {
    pub fn inputs(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction == ParameterDirection::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction == ParameterDirection::Output)
    }

    pub fn parameter(&self, name: &str) -> Option<&ShaderParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A named pairing of a vertex and a fragment shader method.
#[derive(Debug, Clone)]
pub struct Technique {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    pub location: SourceLocation,
}
