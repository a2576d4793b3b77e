use thiserror::Error;

/// Error type for building the effect model.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EffectBuildError {
    /// The declaration neither derives from `Effect` nor carries the `[Effect]` attribute.
    #[error("'{0}' is not an effect declaration")]
    NotAnEffect(String),
    /// Structural errors were reported while building the model.
    #[error("effect '{name}' has {count} structural error(s)")]
    Structural { name: String, count: usize },
}

/// Error type for shader compilation.
///
/// The validator rejects everything a backend can not express, so any of these indicate
/// that a construct slipped past validation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ShaderCompileError {
    /// A construct outside of the shader subset reached a backend.
    #[error("unsupported construct '{0}' reached the backend")]
    UnsupportedConstruct(&'static str),
    /// An invocation did not resolve to an intrinsic.
    #[error("invocation of '{0}' does not resolve to an intrinsic")]
    UnresolvedInvocation(String),
    /// A type has no shader representation.
    #[error("type '{0}' has no shader representation")]
    UnknownType(String),
    /// An identifier did not resolve to anything in scope.
    #[error("identifier '{0}' does not resolve")]
    UnknownIdentifier(String),
    /// The requested shader method is not part of the effect.
    #[error("effect has no shader method '{0}'")]
    UnknownMethod(String),
    /// Error when writing to the output buffer.
    #[error("formatting error")]
    Format(#[from] std::fmt::Error),
}
