//! Effect reflection and cross-compilation for effectc.
//!
//! Turning an effect declaration into shader source happens in three steps.
//!
//! 1. [`reflect::build_effect`] walks the declaration and builds the [`EffectClass`](reflect::EffectClass)
//!    model of its constant buffers, textures, literals, shader methods and techniques.
//! 2. [`validate::validate_effect`] runs every validation rule over the declaration and the model,
//!    reporting problems to a [`DiagnosticSink`](diagnostics::DiagnosticSink).
//! 3. A [`CrossCompiler`](back::CrossCompiler) compiles each shader method of a validated effect
//!    with one of the [output targets](back::targets).
//!
//! ```ignore
//! let effect = build_effect(&decl, &resolver, &diagnostics)?;
//! if validate_effect(&decl, &effect, &resolver, &diagnostics) {
//!     let compiler = CrossCompiler::new(&effect, &resolver);
//!     let hlsl = CompileShader::<HLSL>::compile(&compiler, "VertexMain", None)?;
//! }
//! ```

/// Shader codegen backends.
pub mod back;
/// Diagnostics reported while building and validating effects.
pub mod diagnostics;
/// Error types.
pub mod error;
/// The closed intrinsic table.
pub mod intrinsics;
/// The effect model.
pub mod reflect;
/// Validation rules over effect declarations.
pub mod validate;

#[cfg(test)]
mod fixture;
mod scope;
mod visit;

/// The prefix reserved for identifiers synthesized by the backends.
pub const RESERVED_PREFIX: &str = "fx_";
