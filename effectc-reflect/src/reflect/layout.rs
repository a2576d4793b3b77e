use crate::reflect::{align_uniform_size, ShaderConstant};
use effectc_common::DataType;

/// The packing rules a constant buffer is laid out with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BufferPacking {
    /// HLSL `cbuffer` packing. Members may not straddle a 16-byte register and matrices
    /// start a new register.
    Hlsl,
    /// GLSL `std140` uniform block layout.
    Std140,
}

impl BufferPacking {
    /// The offset a member of the given type is placed at, after `offset` bytes of members.
    fn place(&self, offset: u32, ty: DataType) -> u32 {
        match self {
            BufferPacking::Hlsl => {
                let straddles = (offset % 16) + ty.size() > 16;
                if ty.is_matrix() || straddles {
                    align_uniform_size(offset)
                } else {
                    offset
                }
            }
            BufferPacking::Std140 => {
                let alignment = match ty {
                    DataType::Vector2 => 8,
                    DataType::Vector3 | DataType::Vector4 | DataType::Matrix => 16,
                    _ => 4,
                };
                (offset + alignment - 1) / alignment * alignment
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MemberLayout {
    pub name: String,
    pub ty: DataType,
    pub offset: u32,
    pub size: u32,
}

/// The offsets of the members of a constant buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BufferLayout {
    pub members: Vec<MemberLayout>,
    /// The size of the buffer, rounded up to 16 bytes.
    pub size: u32,
}

impl BufferLayout {
    pub(crate) fn compute(constants: &[ShaderConstant], packing: BufferPacking) -> BufferLayout {
        let mut offset = 0;
        let mut members = Vec::with_capacity(constants.len());
        for constant in constants {
            let start = packing.place(offset, constant.ty);
            let size = constant.ty.size();
            members.push(MemberLayout {
                name: constant.name.clone(),
                ty: constant.ty,
                offset: start,
                size,
            });
            offset = start + size;
        }

        BufferLayout {
            members,
            size: align_uniform_size(offset),
        }
    }
}
