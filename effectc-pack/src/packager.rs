use crate::asset::{asset_file_name, ShaderAsset, VertexElement};
use crate::error::PackError;
use crate::wrapper::{WrapperGenerator, WrapperModel};
use effectc_common::ShaderType;
use effectc_reflect::back::glsl::GlslVersion;
use effectc_reflect::back::targets::{GLSL, HLSL};
use effectc_reflect::back::{CompileShader, CrossCompiler};
use effectc_reflect::diagnostics::{DiagnosticList, DiagnosticSink};
use effectc_reflect::error::EffectBuildError;
use effectc_reflect::reflect::{build_effect, is_effect_candidate, EffectClass, ShaderMethod};
use effectc_reflect::validate::validate_effect;
use effectc_syntax::{SourceFile, SymbolResolver, TypeDecl};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;

/// Options for packing effects.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PackOptions {
    /// The directory assets are written to. Created if it does not exist.
    pub output_dir: PathBuf,
    pub glsl_version: GlslVersion,
    /// Pack the effects of one file in parallel.
    pub parallel: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            output_dir: PathBuf::from("."),
            glsl_version: GlslVersion::default(),
            parallel: true,
        }
    }
}

/// A packed shader method.
#[derive(Debug, Clone)]
pub struct PackedShader {
    pub method: String,
    pub path: PathBuf,
    pub asset: ShaderAsset,
}

/// A packed effect.
#[derive(Debug, Clone)]
pub struct PackedEffect {
    pub name: String,
    pub shaders: Vec<PackedShader>,
    pub wrapper: WrapperModel,
}

/// The outcome of packing one source file.
#[derive(Debug, Default)]
pub struct PackReport {
    pub packed: Vec<PackedEffect>,
    /// Effects that were not packed because of errors in their source.
    pub skipped: Vec<String>,
}

/// A compiled, not yet written, shader method.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub method: String,
    pub asset: ShaderAsset,
}

/// Compile one shader method with both backends.
pub fn compile_method(
    effect: &EffectClass,
    method: &ShaderMethod,
    resolver: &dyn SymbolResolver,
    glsl_version: GlslVersion,
) -> Result<CompiledShader, PackError> {
    let compiler = CrossCompiler::new(effect, resolver);
    let (hlsl, glsl) = rayon::join(
        || CompileShader::<HLSL>::compile(&compiler, &method.name, None),
        || CompileShader::<GLSL>::compile(&compiler, &method.name, glsl_version),
    );

    let inputs = match method.stage {
        ShaderType::Vertex => VertexElement::layout_of(method)?,
        ShaderType::Fragment => Vec::new(),
    };

    Ok(CompiledShader {
        method: method.name.clone(),
        asset: ShaderAsset {
            stage: method.stage,
            inputs,
            hlsl: hlsl?.source,
            glsl: glsl?.source,
        },
    })
}

enum Outcome {
    NotAnEffect,
    Skipped(String),
    Packed(PackedEffect),
}

/// Drives the build, validate, compile and write steps over the effects of a source file.
pub struct EffectPackager<'a> {
    options: PackOptions,
    wrapper: Option<&'a dyn WrapperGenerator>,
}

impl<'a> EffectPackager<'a> {
    pub fn new(options: PackOptions) -> Self {
        EffectPackager {
            options,
            wrapper: None,
        }
    }

    /// Invoke a wrapper generator for every packed effect.
    pub fn with_wrapper_generator(mut self, generator: &'a dyn WrapperGenerator) -> Self {
        self.wrapper = Some(generator);
        self
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Pack every effect declared in a file.
    ///
    /// Effects are independent: one effect with errors does not stop the others from being
    /// packed. Diagnostics are reported to `sink` grouped by effect, in declaration order.
    pub fn pack_file(
        &self,
        file: &SourceFile,
        resolver: &dyn SymbolResolver,
        sink: &dyn DiagnosticSink,
    ) -> Result<PackReport, PackError> {
        info!("packing {}", file.path.display());
        std::fs::create_dir_all(&self.options.output_dir)
            .map_err(|e| PackError::Io(self.options.output_dir.clone(), e))?;

        let pack = |decl: &TypeDecl| {
            let diagnostics = DiagnosticList::new();
            let outcome = self.pack_effect(decl, resolver, &diagnostics);
            (diagnostics, outcome)
        };
        let results: Vec<(DiagnosticList, Result<Outcome, PackError>)> = if self.options.parallel {
            file.types.par_iter().map(pack).collect()
        } else {
            file.types.iter().map(pack).collect()
        };

        let mut report = PackReport::default();
        for (diagnostics, outcome) in results {
            diagnostics.forward_to(sink);
            match outcome? {
                Outcome::NotAnEffect => {}
                Outcome::Skipped(name) => report.skipped.push(name),
                Outcome::Packed(effect) => report.packed.push(effect),
            }
        }

        info!(
            "{}: packed {} effect(s), skipped {}",
            file.path.display(),
            report.packed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn pack_effect(
        &self,
        decl: &TypeDecl,
        resolver: &dyn SymbolResolver,
        sink: &dyn DiagnosticSink,
    ) -> Result<Outcome, PackError> {
        if !is_effect_candidate(decl, resolver) {
            debug!("{} is not an effect", decl.name);
            return Ok(Outcome::NotAnEffect);
        }

        let effect = match build_effect(decl, resolver, sink) {
            Ok(effect) => effect,
            Err(error @ EffectBuildError::Structural { .. }) => {
                warn!("skipping effect {}: {error}", decl.name);
                return Ok(Outcome::Skipped(decl.name.clone()));
            }
            Err(error) => return Err(error.into()),
        };

        if !validate_effect(decl, &effect, resolver, sink) {
            warn!("skipping effect {}: validation failed", effect.name);
            return Ok(Outcome::Skipped(effect.name));
        }

        let mut shaders = Vec::with_capacity(effect.methods.len());
        for method in &effect.methods {
            let compiled = compile_method(&effect, method, resolver, self.options.glsl_version)?;
            let path = self.options.output_dir.join(asset_file_name(
                &effect.name,
                &method.name,
                method.stage,
            ));
            compiled.asset.write(&path)?;
            debug!("wrote {}", path.display());
            shaders.push(PackedShader {
                method: compiled.method,
                path,
                asset: compiled.asset,
            });
        }

        let wrapper = WrapperModel::from_effect(&effect);
        if let Some(generator) = self.wrapper {
            generator
                .generate(&wrapper)
                .map_err(|source| PackError::Wrapper {
                    effect: effect.name.clone(),
                    source,
                })?;
        }

        info!("packed effect {}, {} shader(s)", effect.name, shaders.len());
        Ok(Outcome::Packed(PackedEffect {
            name: effect.name,
            shaders,
            wrapper,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use effectc_syntax::{
        AnnotatedResolver, Attribute, Expr, FieldDecl, MethodDecl, ParamDecl, Stmt, TypeRef,
    };
    use std::sync::Mutex;

    fn output_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("effectc-pack-{}-{name}", std::process::id()))
    }

    fn effect(name: &str) -> TypeDecl {
        TypeDecl::new(name)
            .with_base("Effect")
            .with_member(
                MethodDecl::new("VertexMain")
                    .with_attribute(Attribute::new("VertexShader"))
                    .with_parameter(
                        ParamDecl::new("position", "Vector4").with_attribute(Attribute::new("Position")),
                    )
                    .with_parameter(
                        ParamDecl::new("outPosition", "Vector4")
                            .out()
                            .with_attribute(Attribute::new("Position")),
                    )
                    .with_body(vec![Stmt::expr(Expr::assign(
                        Expr::ident("outPosition"),
                        Expr::ident("position"),
                    ))]),
            )
            .with_member(
                MethodDecl::new("FragmentMain")
                    .with_attribute(Attribute::new("FragmentShader"))
                    .with_parameter(
                        ParamDecl::new("color", "Vector4")
                            .out()
                            .with_attribute(Attribute::new("Color")),
                    )
                    .with_body(vec![]),
            )
            .with_member(FieldDecl::new("Default", TypeRef::named("Technique")).with_initializer(
                Expr::new_object(
                    "Technique",
                    vec![
                        Expr::call(Expr::ident("nameof"), vec![Expr::ident("VertexMain")]),
                        Expr::call(Expr::ident("nameof"), vec![Expr::ident("FragmentMain")]),
                    ],
                ),
            ))
    }

    fn broken(name: &str) -> TypeDecl {
        effect(name).with_member(
            MethodDecl::new("Unused")
                .with_attribute(Attribute::new("FragmentShader"))
                .with_parameter(
                    ParamDecl::new("normal", "Vector4")
                        .out()
                        .with_attribute(Attribute::new("Normal")),
                )
                .with_body(vec![]),
        )
    }

    #[derive(Default)]
    struct Recorder {
        models: Mutex<Vec<String>>,
    }

    impl WrapperGenerator for Recorder {
        fn generate(
            &self,
            model: &WrapperModel,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.models.lock().unwrap().push(model.name.clone());
            Ok(())
        }
    }

    #[test]
    fn packs_independent_effects() -> anyhow::Result<()> {
        let dir = output_dir("independent");
        let mut file = SourceFile::new("Effects.cs");
        file.types = vec![effect("First"), broken("Broken"), effect("Second")];

        let recorder = Recorder::default();
        let packager = EffectPackager::new(PackOptions {
            output_dir: dir.clone(),
            ..Default::default()
        })
        .with_wrapper_generator(&recorder);

        let diagnostics = DiagnosticList::new();
        let report = packager.pack_file(&file, &AnnotatedResolver, &diagnostics)?;

        let packed: Vec<_> = report.packed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(packed, vec!["First", "Second"]);
        assert_eq!(report.skipped, vec!["Broken".to_string()]);
        assert!(diagnostics.has_errors());

        assert!(dir.join("First_VertexMain.vs.bin").exists());
        assert!(dir.join("Second_FragmentMain.fs.bin").exists());
        assert!(!dir.join("Broken_VertexMain.vs.bin").exists());

        let mut generated = recorder.models.lock().unwrap().clone();
        generated.sort();
        assert_eq!(generated, vec!["First".to_string(), "Second".to_string()]);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn serial_and_parallel_agree() -> anyhow::Result<()> {
        let mut file = SourceFile::new("Effects.cs");
        file.types = vec![effect("A"), broken("B"), effect("C")];

        let mut outputs = Vec::new();
        for parallel in [false, true] {
            let dir = output_dir(if parallel { "parallel" } else { "serial" });
            let packager = EffectPackager::new(PackOptions {
                output_dir: dir.clone(),
                parallel,
                ..Default::default()
            });
            let diagnostics = DiagnosticList::new();
            let report = packager.pack_file(&file, &AnnotatedResolver, &diagnostics)?;
            let assets: Vec<_> = report
                .packed
                .iter()
                .flat_map(|effect| effect.shaders.iter().map(|shader| shader.asset.clone()))
                .collect();
            outputs.push((assets, diagnostics.into_vec()));
            std::fs::remove_dir_all(&dir)?;
        }

        assert_eq!(outputs[0], outputs[1]);
        Ok(())
    }

    #[test]
    fn non_effect_types_are_ignored() -> anyhow::Result<()> {
        let dir = output_dir("ignored");
        let mut file = SourceFile::new("Helpers.cs");
        file.types = vec![TypeDecl::new("Helpers")];

        let packager = EffectPackager::new(PackOptions {
            output_dir: dir.clone(),
            ..Default::default()
        });
        let diagnostics = DiagnosticList::new();
        let report = packager.pack_file(&file, &AnnotatedResolver, &diagnostics)?;
        assert!(report.packed.is_empty());
        assert!(report.skipped.is_empty());
        assert!(diagnostics.is_empty());

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
