use effectc_reflect::error::{EffectBuildError, ShaderCompileError};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for packaging effects.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PackError {
    /// An asset could not be written.
    #[error("failed to write {0}")]
    Io(PathBuf, #[source] std::io::Error),
    /// A backend rejected a validated effect.
    #[error("shader compilation failed")]
    Compile(#[from] ShaderCompileError),
    /// The effect model could not be built.
    #[error("effect model could not be built")]
    Build(#[from] EffectBuildError),
    /// The wrapper generator failed for an effect.
    #[error("wrapper generation failed for effect '{effect}'")]
    Wrapper {
        effect: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A vertex input has no vertex element format.
    #[error("input '{parameter}' of '{method}' has no vertex element format")]
    VertexInput { method: String, parameter: String },
    /// A count or length does not fit its field in the asset format.
    #[error("{0} does not fit the asset format")]
    Overflow(&'static str),
    /// An asset ended before all of its fields were read.
    #[error("unexpected end of asset")]
    UnexpectedEof,
    /// An asset contains an unknown semantics value.
    #[error("invalid semantics value {0}")]
    InvalidSemantics(u8),
    /// An asset contains an unknown vertex element format.
    #[error("invalid vertex element format {0}")]
    InvalidFormat(u8),
    /// A source block of an asset is not valid UTF-8.
    #[error("shader source is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
