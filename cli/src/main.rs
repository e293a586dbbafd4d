use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mapirops_compiler::error::MrError;
use mapirops_compiler::types::MrFile;
use mapirops_compiler::utils::caret_excerpt;
use mapirops_compiler::{parse_source, DefaultArmPolicy, Generator, GeneratorOptions};

#[derive(Parser)]
#[command(name = "mrc")]
#[command(about = "Compile MR specifications into C push/pull code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a `.h`/`.c` pair for every specification in an `.mr` file
    Gen {
        /// Input `.mr` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the directory of the input file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// File whose contents replace the default license banner
        #[arg(short, long)]
        license: Option<PathBuf>,

        /// Header included by generated source files
        #[arg(long, default_value = "libmapirops.h")]
        runtime_include: String,

        /// Fail on union discriminants matching no declared arm
        #[arg(long)]
        strict_unions: bool,
    },

    /// Print the parsed structure of an `.mr` file as JSON
    Dump {
        /// Input `.mr` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print an `.mr` file in canonical form
    Fmt {
        /// Input `.mr` file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("[ERROR]: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some outputs could not be produced.
fn run(command: &Commands) -> Result<bool, MrError> {
    match command {
        Commands::Gen { input, output_dir, license, runtime_include, strict_unions } => {
            let file = load(input)?;

            let mut options = GeneratorOptions {
                runtime_include: runtime_include.clone(),
                ..GeneratorOptions::default()
            };
            if let Some(path) = license {
                options.license = fs::read_to_string(path)?;
            }
            if *strict_unions {
                options.default_arm = DefaultArmPolicy::Reject;
            }

            let out_dir = match output_dir {
                Some(dir) => dir.clone(),
                None => input_dir(input),
            };

            let generator = Generator::new(out_dir, options);
            let mut all_ok = true;
            for report in generator.write_all(&file) {
                for outcome in [&report.header, &report.source] {
                    match outcome {
                        Ok(path) => println!("Generating {}", path.display()),
                        Err(e) => eprintln!("[ERROR]: specification {}: {}", report.name, e),
                    }
                }
                all_ok &= report.is_ok();
            }
            Ok(all_ok)
        }

        Commands::Dump { input } => {
            let file = load(input)?;
            let json = serde_json::to_string_pretty(&file)
                .map_err(|e| MrError::GenerateError(format!("Cannot serialize AST: {}", e)))?;
            println!("{}", json);
            Ok(true)
        }

        Commands::Fmt { input } => {
            let file = load(input)?;
            print!("{}", file);
            Ok(true)
        }
    }
}

/// Read and parse `input`, echoing the failing line for syntax errors.
fn load(input: &Path) -> Result<MrFile, MrError> {
    let text = fs::read_to_string(input).map_err(MrError::Io)?;
    parse_source(&text).inspect_err(|e| {
        if let Some((line, column)) = e.position() {
            eprintln!("{}", caret_excerpt(&text, line, column));
        }
    })
}

fn input_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
