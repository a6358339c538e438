use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the image pipeline workspace",
    long_about = "A unified CLI for building the image handler, deploying the\n\
                  pipeline, and running CI checks in the image pipeline workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the image_processor handler binary for the Lambda target
    LambdaBuild(BuildArgs),
    /// Build the handler, then provision every resource and publish the site
    Deploy {
        #[command(flatten)]
        build: BuildArgs,
        /// Extra arguments forwarded to the deploy binary (after `--`)
        #[arg(last = true)]
        deploy_args: Vec<String>,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Compilation target triple for the handler binary
    #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
    target: String,
    /// Build profile used for the handler binary
    #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
    profile: BuildProfile,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Cross-compile the handler binary
    Lambda,
    /// Run check + lambda
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

/// Returns the path of the built handler, ready to be passed as `--artifact`.
fn build_lambda_handler(args: &BuildArgs) -> PathBuf {
    ensure_rust_target_installed(&args.target);
    ensure_c_linker_available(&args.target);

    step("Build image_processor handler");

    let mut cargo_args = vec![
        "build",
        "-p",
        "image_pipeline_aws",
        "--target",
        &args.target,
        "--bin",
        "image_processor",
    ];
    if let Some(flag) = args.profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    let artifact = Path::new("target")
        .join(&args.target)
        .join(args.profile.dir_name())
        .join(binary_name("image_processor", &args.target));
    if !artifact.exists() {
        panic!("expected handler binary at '{}'", artifact.display());
    }
    eprintln!("\nBuilt handler:\n- {}", artifact.display());
    artifact
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- lambda-build`"
        );
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let env_override_keys = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];

    for key in env_override_keys {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if !candidate.is_empty() && tool_works(candidate) {
                return;
            }
        }
    }

    let canonical = "x86_64-linux-gnu-gcc";
    if tool_works(canonical) {
        return;
    }

    panic!(
        "missing C cross-linker for target `{target}`. install `{canonical}` (or set CC_x86_64_unknown_linux_gnu) before running `cargo run -p xtask -- lambda-build`."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test image_pipeline_core");
    run_cargo(&["test", "-p", "image_pipeline_core"]);

    step("Test image_pipeline_aws");
    run_cargo(&["test", "-p", "image_pipeline_aws"]);
}

fn ci_lambda() {
    build_lambda_handler(&BuildArgs {
        target: "x86_64-unknown-linux-gnu".to_string(),
        profile: BuildProfile::Release,
    });
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::LambdaBuild(args) => {
            build_lambda_handler(&args);
        }
        Commands::Deploy { build, deploy_args } => {
            let artifact = build_lambda_handler(&build);
            let artifact = artifact.to_string_lossy();

            step("Deploy image pipeline");
            let mut cargo_args = vec![
                "run",
                "-p",
                "image_pipeline_aws",
                "--bin",
                "deploy",
                "--",
                "--artifact",
                artifact.as_ref(),
            ];
            cargo_args.extend(deploy_args.iter().map(String::as_str));
            run_cargo(&cargo_args);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Lambda => ci_lambda(),
                CiJob::All => {
                    ci_check();
                    ci_lambda();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
