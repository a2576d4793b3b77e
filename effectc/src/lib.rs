#![forbid(missing_docs)]
//! Cross-compilation of effect declarations to HLSL and GLSL.
//!
//! An effect is a host-language class that bundles a vertex shader, a fragment shader, the
//! constants and textures they use, and the techniques pairing them. effectc takes the
//! resolved syntax tree of such a class, checks that every shader method stays inside the
//! subset that can be expressed in a shading language, and writes HLSL and GLSL source for
//! each shader method into a binary asset a runtime loads.
//!
//! ## Usage
//! The input is a [`SourceFile`](crate::syntax::SourceFile) with symbols already resolved, and a
//! [`SymbolResolver`](crate::syntax::SymbolResolver) answering questions about it. Parsing
//! source text is not part of effectc.
//!
//! The simplest entry point is the [`EffectPackager`](crate::pack::EffectPackager), which builds,
//! validates, compiles and writes every effect of a file. The individual steps are available
//! from the [`reflect`](crate::reflect) module.
//!
//! | **Target** | **Output**                         | **Options**          |
//! |------------|------------------------------------|----------------------|
//! | HLSL       | Shader Model 5 (`vs_5_0`/`ps_5_0`) | none                 |
//! | GLSL       | `#version 330 core` and later      | `GlslVersion`        |

/// Data types, semantics and shader stages shared by every part of effectc.
pub mod common {
    pub use effectc_common::*;
}

/// The resolved syntax tree effectc consumes and the resolver oracle that annotates it.
pub mod syntax {
    pub use effectc_syntax::*;
}

#[cfg(feature = "reflect")]
/// Building, validating and cross-compiling effects.
///
/// ```ignore
/// use effectc::reflect::{build_effect, validate_effect, CompileShader, CrossCompiler};
/// use effectc::reflect::targets::HLSL;
///
/// let diagnostics = DiagnosticList::new();
/// let effect = build_effect(&decl, &resolver, &diagnostics)?;
/// if validate_effect(&decl, &effect, &resolver, &diagnostics) {
///     let compiler = CrossCompiler::new(&effect, &resolver);
///     let output = CompileShader::<HLSL>::compile(&compiler, "VertexMain", None)?;
/// }
/// ```
pub mod reflect {
    pub use effectc_reflect::back::{CompileShader, CrossCompiler, ShaderCompilerOutput};
    pub use effectc_reflect::reflect::*;
    pub use effectc_reflect::validate::{validate_effect, ConstructKind};

    /// Shader compiler targets.
    pub mod targets {
        pub use effectc_reflect::back::targets::{OutputTarget, GLSL, HLSL};
    }

    /// HLSL specific options and context.
    pub mod hlsl {
        pub use effectc_reflect::back::hlsl::HlslContext;
    }

    /// GLSL specific options and context.
    pub mod glsl {
        pub use effectc_reflect::back::glsl::{GlslContext, GlslVersion};
    }

    /// Diagnostics reported for problems in effect source.
    pub mod diagnostics {
        pub use effectc_reflect::diagnostics::*;
    }

    /// Error types.
    pub mod error {
        pub use effectc_reflect::error::*;
    }

    /// The closed table of shader intrinsics host-language calls resolve to.
    pub mod intrinsics {
        pub use effectc_reflect::intrinsics::*;
    }
}

#[cfg(feature = "pack")]
/// Packaging compiled effects into shader assets.
pub mod pack {
    pub use effectc_pack::*;
}
