//! The model handed to host-language wrapper generators.
//!
//! Generating the wrapper source is left to the implementor of [`WrapperGenerator`]. The
//! model carries everything a wrapper needs to upload constants, bind textures and select
//! techniques.

use effectc_common::DataType;
use effectc_reflect::reflect::{BindingStage, BufferPacking, EffectClass};

/// The stages a binding is used in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageUsage {
    pub vertex: bool,
    pub fragment: bool,
}

impl From<BindingStage> for StageUsage {
    fn from(value: BindingStage) -> Self {
        StageUsage {
            vertex: value.contains(BindingStage::VERTEX),
            fragment: value.contains(BindingStage::FRAGMENT),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapperConstant {
    pub name: String,
    pub ty: DataType,
    /// Byte offset in the HLSL packing of the buffer.
    pub offset: u32,
    /// Byte offset in the std140 layout of the GLSL uniform block.
    pub glsl_offset: u32,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapperBuffer {
    pub name: String,
    pub slot: u32,
    /// Size in bytes in the HLSL packing.
    pub size: u32,
    /// Size in bytes in the std140 layout.
    pub glsl_size: u32,
    /// Whether the buffer is one of the system buffers shared between all effects.
    pub shared: bool,
    pub members: Vec<WrapperConstant>,
    pub stages: StageUsage,
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapperTexture {
    pub name: String,
    pub slot: u32,
    pub ty: DataType,
    pub stages: StageUsage,
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapperTechnique {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
}

/// Everything a host-language wrapper for one effect is generated from.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapperModel {
    pub name: String,
    pub namespace: Option<String>,
    pub documentation: Vec<String>,
    pub buffers: Vec<WrapperBuffer>,
    pub textures: Vec<WrapperTexture>,
    pub techniques: Vec<WrapperTechnique>,
}

impl WrapperModel {
    pub fn from_effect(effect: &EffectClass) -> Self {
        let buffers = effect
            .constant_buffers
            .iter()
            .map(|buffer| {
                let layout = buffer.layout(BufferPacking::Hlsl);
                let std140 = buffer.layout(BufferPacking::Std140);
                let members = layout
                    .members
                    .into_iter()
                    .zip(&std140.members)
                    .zip(&buffer.constants)
                    .map(|((member, glsl), constant)| WrapperConstant {
                        name: member.name,
                        ty: member.ty,
                        offset: member.offset,
                        glsl_offset: glsl.offset,
                        documentation: constant.documentation.clone(),
                    })
                    .collect();
                WrapperBuffer {
                    name: buffer.name.clone(),
                    slot: buffer.slot,
                    size: layout.size,
                    glsl_size: std140.size,
                    shared: buffer.shared,
                    members,
                    stages: buffer.stage_mask.into(),
                }
            })
            .collect();

        let textures = effect
            .textures
            .iter()
            .map(|texture| WrapperTexture {
                name: texture.name.clone(),
                slot: texture.slot,
                ty: texture.ty,
                stages: texture.stage_mask.into(),
            })
            .collect();

        let techniques = effect
            .techniques
            .iter()
            .map(|technique| WrapperTechnique {
                name: technique.name.clone(),
                vertex: technique.vertex.clone(),
                fragment: technique.fragment.clone(),
            })
            .collect();

        WrapperModel {
            name: effect.name.clone(),
            namespace: effect.namespace.clone(),
            documentation: effect.documentation.clone(),
            buffers,
            textures,
            techniques,
        }
    }

    pub fn buffer(&self, name: &str) -> Option<&WrapperBuffer> {
        self.buffers.iter().find(|buffer| buffer.name == name)
    }
}

/// Generates the host-language wrapper of a packed effect.
///
/// The packager calls the generator once per successfully packed effect. Effects of one file
/// may be packed in parallel.
pub trait WrapperGenerator: Sync {
    fn generate(&self, model: &WrapperModel) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
