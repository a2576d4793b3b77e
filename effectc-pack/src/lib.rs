//! Shader asset packaging for effectc.
//!
//! [`EffectPackager`] takes every effect of a source file through model building, validation
//! and cross-compilation, and writes one [`ShaderAsset`] per shader method. Effects with errors
//! are skipped, the rest of the file is still packed.

pub mod asset;
pub mod error;
pub mod wrapper;

mod packager;

pub use asset::{asset_file_name, ShaderAsset, VertexElement};
pub use error::PackError;
pub use packager::{
    compile_method, CompiledShader, EffectPackager, PackOptions, PackReport, PackedEffect,
    PackedShader,
};
pub use wrapper::{WrapperGenerator, WrapperModel};
