use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use effectc::pack::{EffectPackager, PackOptions, WrapperModel};
use effectc::reflect::diagnostics::DiagnosticList;
use effectc::reflect::glsl::GlslVersion;
use effectc::reflect::targets::{GLSL, HLSL};
use effectc::reflect::{build_effect, validate_effect, CompileShader, CrossCompiler};
use effectc::syntax::{AnnotatedResolver, SourceFile, TypeDecl};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every effect in a resolved syntax tree and print the diagnostics.
    Validate {
        /// The path to the resolved syntax tree, as JSON.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Transpile one shader method of an effect to the given format.
    Transpile {
        /// The path to the resolved syntax tree, as JSON.
        #[arg(short, long)]
        input: PathBuf,
        /// The name of the effect.
        #[arg(short, long)]
        effect: String,
        /// The name of the shader method.
        #[arg(short, long)]
        method: String,
        /// The output format.
        #[arg(value_enum, short, long)]
        format: TranspileFormat,
        /// The GLSL version to emit, for example 330 or 450.
        #[arg(short, long)]
        version: Option<u32>,
    },
    /// Print the wrapper model of an effect as JSON.
    Reflect {
        /// The path to the resolved syntax tree, as JSON.
        #[arg(short, long)]
        input: PathBuf,
        /// The name of the effect.
        #[arg(short, long)]
        effect: String,
    },
    /// Pack every effect in a resolved syntax tree into shader assets.
    Pack {
        /// The path to the resolved syntax tree, as JSON.
        #[arg(short, long)]
        input: PathBuf,
        /// The directory to write assets to. Overrides the configuration file.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// A JSON file with packing options.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Pack effects one after another.
        #[arg(long)]
        serial: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TranspileFormat {
    #[clap(name = "hlsl")]
    HLSL,
    #[clap(name = "glsl")]
    GLSL,
}

fn load_tree(path: &Path) -> anyhow::Result<SourceFile> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn find_effect<'a>(file: &'a SourceFile, name: &str) -> anyhow::Result<&'a TypeDecl> {
    file.types
        .iter()
        .find(|decl| decl.name == name)
        .ok_or_else(|| anyhow!("no type named '{name}' in {}", file.path.display()))
}

/// Print diagnostics to stderr. Returns the number of errors.
fn print_diagnostics(file: &SourceFile, diagnostics: &DiagnosticList) -> usize {
    for diagnostic in diagnostics.snapshot() {
        eprintln!("{}:{diagnostic}", file.path.display());
    }
    diagnostics.error_count()
}

pub fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    match args.command {
        Commands::Validate { input } => {
            let file = load_tree(&input)?;
            let diagnostics = DiagnosticList::new();
            for decl in &file.types {
                if let Ok(effect) = build_effect(decl, &AnnotatedResolver, &diagnostics) {
                    validate_effect(decl, &effect, &AnnotatedResolver, &diagnostics);
                }
            }

            let errors = print_diagnostics(&file, &diagnostics);
            if errors > 0 {
                bail!("validation failed with {errors} error(s)");
            }
        }
        Commands::Transpile {
            input,
            effect,
            method,
            format,
            version,
        } => {
            let file = load_tree(&input)?;
            let decl = find_effect(&file, &effect)?;

            let diagnostics = DiagnosticList::new();
            let effect = build_effect(decl, &AnnotatedResolver, &diagnostics);
            let valid = match &effect {
                Ok(effect) => validate_effect(decl, effect, &AnnotatedResolver, &diagnostics),
                Err(_) => false,
            };
            print_diagnostics(&file, &diagnostics);
            let effect = effect?;
            if !valid {
                bail!("effect '{}' is not valid", effect.name);
            }

            let compiler = CrossCompiler::new(&effect, &AnnotatedResolver);
            let output = match format {
                TranspileFormat::HLSL => {
                    CompileShader::<HLSL>::compile(&compiler, &method, None)?.source
                }
                TranspileFormat::GLSL => {
                    let version = match version {
                        None => GlslVersion::default(),
                        Some(number) => GlslVersion::from_number(number)
                            .ok_or_else(|| anyhow!("unsupported GLSL version {number}"))?,
                    };
                    let output = CompileShader::<GLSL>::compile(&compiler, &method, version)?;
                    for (name, unit) in &output.context.sampler_bindings {
                        eprintln!("sampler {name} -> texture unit {unit}");
                    }
                    for (name, binding) in &output.context.uniform_block_bindings {
                        eprintln!("uniform block {name} -> binding {binding}");
                    }
                    output.source
                }
            };

            print!("{output}")
        }
        Commands::Reflect { input, effect } => {
            let file = load_tree(&input)?;
            let decl = find_effect(&file, &effect)?;
            let diagnostics = DiagnosticList::new();
            let effect = build_effect(decl, &AnnotatedResolver, &diagnostics);
            print_diagnostics(&file, &diagnostics);

            let model = WrapperModel::from_effect(&effect?);
            print!("{}", serde_json::to_string_pretty(&model)?);
        }
        Commands::Pack {
            input,
            out,
            config,
            serial,
        } => {
            let file = load_tree(&input)?;
            let mut options: PackOptions = match config {
                Some(config) => serde_json::from_reader(std::fs::File::open(config)?)?,
                None => PackOptions::default(),
            };
            if let Some(out) = out {
                options.output_dir = out;
            }
            if serial {
                options.parallel = false;
            }

            let diagnostics = DiagnosticList::new();
            let report =
                EffectPackager::new(options).pack_file(&file, &AnnotatedResolver, &diagnostics)?;
            print_diagnostics(&file, &diagnostics);

            for effect in &report.packed {
                for shader in &effect.shaders {
                    println!("{}", shader.path.display());
                }
            }
            if !report.skipped.is_empty() {
                bail!(
                    "{} effect(s) were not packed: {}",
                    report.skipped.len(),
                    report.skipped.join(", ")
                );
            }
        }
    }

    Ok(())
}
