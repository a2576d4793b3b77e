use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The closed set of types a shader can work with.
///
/// Host-language types that have no shader equivalent map to [`DataType::Unknown`], which is
/// never silently coerced into anything else.
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    #[default]
    Unknown = 0,
    Bool,
    Int,
    Float,
    Vector2,
    Vector3,
    Vector4,
    Matrix,
    Texture2D,
    TextureCube,
}

impl DataType {
    /// The number of elements an indexer can address on this type.
    ///
    /// Vectors index their components, a matrix indexes its four rows.
    pub const fn index_bound(&self) -> Option<u32> {
        match self {
            DataType::Vector2 => Some(2),
            DataType::Vector3 => Some(3),
            DataType::Vector4 => Some(4),
            DataType::Matrix => Some(4),
            _ => None,
        }
    }

    /// The type produced by indexing into a value of this type.
    pub const fn element_type(&self) -> DataType {
        match self {
            DataType::Vector2 | DataType::Vector3 | DataType::Vector4 => DataType::Float,
            DataType::Matrix => DataType::Vector4,
            _ => DataType::Unknown,
        }
    }

    /// The number of float components of a vector type.
    pub const fn component_count(&self) -> Option<u32> {
        match self {
            DataType::Float => Some(1),
            DataType::Vector2 => Some(2),
            DataType::Vector3 => Some(3),
            DataType::Vector4 => Some(4),
            _ => None,
        }
    }

    /// The float vector type with the given number of components.
    pub const fn vector_of(components: u32) -> DataType {
        match components {
            1 => DataType::Float,
            2 => DataType::Vector2,
            3 => DataType::Vector3,
            4 => DataType::Vector4,
            _ => DataType::Unknown,
        }
    }

    pub const fn is_vector(&self) -> bool {
        matches!(self, DataType::Vector2 | DataType::Vector3 | DataType::Vector4)
    }

    pub const fn is_matrix(&self) -> bool {
        matches!(self, DataType::Matrix)
    }

    pub const fn is_texture(&self) -> bool {
        matches!(self, DataType::Texture2D | DataType::TextureCube)
    }

    pub const fn is_scalar(&self) -> bool {
        matches!(self, DataType::Bool | DataType::Int | DataType::Float)
    }

    /// Whether the type can be the type of a shader constant or literal.
    pub const fn is_value_type(&self) -> bool {
        !matches!(
            self,
            DataType::Unknown | DataType::Texture2D | DataType::TextureCube
        )
    }

    /// Whether the type can be the type of a shader stage input or output.
    pub const fn is_parameter_type(&self) -> bool {
        matches!(
            self,
            DataType::Float | DataType::Vector2 | DataType::Vector3 | DataType::Vector4
        )
    }

    /// The unpadded size of a value of this type in bytes.
    pub const fn size(&self) -> u32 {
        match self {
            DataType::Bool | DataType::Int | DataType::Float => 4,
            DataType::Vector2 => 8,
            DataType::Vector3 => 12,
            DataType::Vector4 => 16,
            DataType::Matrix => 64,
            DataType::Unknown | DataType::Texture2D | DataType::TextureCube => 0,
        }
    }

    /// The canonical host-language name of the type.
    pub const fn host_name(&self) -> &'static str {
        match self {
            DataType::Unknown => "<unknown>",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Vector2 => "Vector2",
            DataType::Vector3 => "Vector3",
            DataType::Vector4 => "Vector4",
            DataType::Matrix => "Matrix",
            DataType::Texture2D => "Texture2D",
            DataType::TextureCube => "TextureCube",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.host_name())
    }
}

impl FromStr for DataType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Fully qualified names resolve the same as their short forms.
        let s = s.rsplit('.').next().unwrap_or(s);
        Ok(match s {
            "bool" | "Boolean" => Self::Bool,
            "int" | "Int32" => Self::Int,
            "float" | "Single" => Self::Float,
            "Vector2" => Self::Vector2,
            "Vector3" => Self::Vector3,
            "Vector4" => Self::Vector4,
            "Matrix" | "Matrix4x4" => Self::Matrix,
            "Texture2D" => Self::Texture2D,
            "TextureCube" => Self::TextureCube,
            _ => Self::Unknown,
        })
    }
}
