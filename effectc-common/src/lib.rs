//! Common types shared by the effectc crates.
//!
//! This crate holds the closed enumerations that the rest of the compiler maps host-language
//! types and attributes onto: [`DataType`], [`DataSemantics`], [`ShaderType`] and
//! [`VertexElementFormat`].

/// Hash map aliases.
pub mod map;

mod data_type;
mod semantics;

pub use data_type::DataType;
pub use semantics::DataSemantics;

use std::fmt::{Display, Formatter};

/// The stage a shader method runs in.
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ShaderType {
    Vertex = 0,
    Fragment = 1,
}

impl ShaderType {
    /// The attribute name that tags a method as this stage.
    pub const fn attribute_name(&self) -> &'static str {
        match self {
            ShaderType::Vertex => "VertexShader",
            ShaderType::Fragment => "FragmentShader",
        }
    }

    /// Short stage suffix used in asset file names.
    pub const fn file_suffix(&self) -> &'static str {
        match self {
            ShaderType::Vertex => "vs",
            ShaderType::Fragment => "fs",
        }
    }
}

impl Display for ShaderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderType::Vertex => f.write_str("vertex"),
            ShaderType::Fragment => f.write_str("fragment"),
        }
    }
}

/// The format of one element of a vertex input layout.
///
/// The discriminant is the byte written into packaged vertex shader assets.
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VertexElementFormat {
    Single = 0,
    Vector2 = 1,
    Vector3 = 2,
    Vector4 = 3,
}

impl VertexElementFormat {
    /// Get the element format for a shader parameter type, if it can be a vertex input.
    pub const fn from_data_type(ty: DataType) -> Option<Self> {
        match ty {
            DataType::Float => Some(Self::Single),
            DataType::Vector2 => Some(Self::Vector2),
            DataType::Vector3 => Some(Self::Vector3),
            DataType::Vector4 => Some(Self::Vector4),
            _ => None,
        }
    }

    /// Get the element format from its packaged byte value.
    pub const fn from_repr(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Single),
            1 => Some(Self::Vector2),
            2 => Some(Self::Vector3),
            3 => Some(Self::Vector4),
            _ => None,
        }
    }

    pub const fn data_type(&self) -> DataType {
        match self {
            VertexElementFormat::Single => DataType::Float,
            VertexElementFormat::Vector2 => DataType::Vector2,
            VertexElementFormat::Vector3 => DataType::Vector3,
            VertexElementFormat::Vector4 => DataType::Vector4,
        }
    }
}
