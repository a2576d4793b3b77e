/// GLSL codegen.
pub mod glsl;
/// HLSL codegen.
pub mod hlsl;
pub mod targets;

mod writer;

use crate::back::targets::OutputTarget;
use crate::error::ShaderCompileError;
use crate::reflect::{EffectClass, ShaderMethod};
use effectc_common::ShaderType;
use effectc_syntax::SymbolResolver;
use std::fmt::Debug;

/// The output of the shader compiler for one shader method.
#[derive(Debug)]
pub struct ShaderCompilerOutput<T, Context = ()> {
    /// The stage of the compiled method.
    pub stage: ShaderType,
    /// The output of the compiler.
    pub source: T,
    /// Additional context information for the runtime to bind the shader.
    pub context: Context,
}

/// A trait for objects that can be compiled into a shader.
pub trait CompileShader<T: OutputTarget> {
    /// Options provided to the compiler.
    type Options;
    /// Additional context returned by the compiler after compilation.
    type Context;

    /// Consume the object and return the compiled output of the shader.
    ///
    /// Errors are backend invariant violations. A validated effect never produces one.
    fn compile(
        &self,
        method: &str,
        options: Self::Options,
    ) -> Result<ShaderCompilerOutput<T::Output, Self::Context>, ShaderCompileError>;
}

/// Compiles the shader methods of a validated effect to any of the output targets.
///
/// Compilation only reads the effect and the resolver, so one compiler can serve several
/// targets concurrently.
#[derive(Copy, Clone)]
pub struct CrossCompiler<'a> {
    effect: &'a EffectClass,
    resolver: &'a dyn SymbolResolver,
}

impl<'a> CrossCompiler<'a> {
    pub fn new(effect: &'a EffectClass, resolver: &'a dyn SymbolResolver) -> Self {
        CrossCompiler { effect, resolver }
    }

    pub fn effect(&self) -> &'a EffectClass {
        self.effect
    }

    fn method(&self, name: &str) -> Result<&'a ShaderMethod, ShaderCompileError> {
        self.effect
            .method(name)
            .ok_or_else(|| ShaderCompileError::UnknownMethod(name.to_string()))
    }
}

impl Debug for CrossCompiler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossCompiler")
            .field("effect", &self.effect.name)
            .finish_non_exhaustive()
    }
}
