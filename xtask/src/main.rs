use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for cubefield")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and docs in order
    Check,
    /// Check formatting
    Fmt,
    /// Lint every target with warnings denied
    Clippy,
    /// Run the workspace test suite
    Test {
        /// Only test this package
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Build rustdoc for the workspace
    Doc,
}

/// A cargo invocation with a label for progress output.
struct Step {
    label: &'static str,
    args: Vec<String>,
}

impl Step {
    fn new(label: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn run(&self) -> Result<()> {
        println!("==> {} (cargo {})", self.label, self.args.join(" "));
        let status = Command::new("cargo").args(&self.args).status()?;
        if !status.success() {
            anyhow::bail!("{} failed ({status})", self.label);
        }
        Ok(())
    }
}

fn fmt() -> Step {
    Step::new("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Step {
    Step::new(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test(package: Option<&str>) -> Step {
    match package {
        Some(package) => Step::new("test", &["test", "-p", package]),
        None => Step::new("test", &["test", "--workspace"]),
    }
}

fn doc() -> Step {
    Step::new("doc", &["doc", "--workspace", "--no-deps"])
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let steps = match cli.command {
        Commands::Check => vec![fmt(), clippy(), test(None), doc()],
        Commands::Fmt => vec![fmt()],
        Commands::Clippy => vec![clippy()],
        Commands::Test { package } => vec![test(package.as_deref())],
        Commands::Doc => vec![doc()],
    };

    for step in &steps {
        step.run()?;
    }
    println!("==> {} step(s) passed", steps.len());

    Ok(())
}
