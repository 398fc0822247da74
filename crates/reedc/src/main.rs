use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use reed_backend_wat::WatCodegen;
use reed_codegen::CodeGenerator;
use reed_frontend::parse_and_annotate;

#[derive(Parser, Debug)]
#[command(name = "reedc")]
#[command(about = "Reed compiler", long_about = None)]
struct Cli {
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[arg(short, long, value_name = "FILE", default_value = "out.wat")]
    out: PathBuf,

    /// Module-scope name exported as the entry function.
    #[arg(long, value_name = "NAME", default_value = "main")]
    export: String,

    /// Also assemble the output with the external `wat2wasm` tool.
    #[arg(long)]
    wasm: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let program = parse_and_annotate(&src)?;
    log::debug!(
        "parsed {} imports, {} declarations",
        program.imports.len(),
        program.decls.len()
    );

    let mut gen = WatCodegen::new(cli.export.as_str());
    let text = gen.generate(&program)?;
    fs::write(&cli.out, &text)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    println!("Wrote {}", cli.out.display());

    if cli.wasm {
        let wasm_path = cli.out.with_extension("wasm");
        let status = Command::new("wat2wasm")
            .arg(&cli.out)
            .arg("-o")
            .arg(&wasm_path)
            .status()
            .context("failed to run wat2wasm (is it installed?)")?;
        if !status.success() {
            bail!("wat2wasm exited with {status}");
        }
        println!("Wrote {}", wasm_path.display());
    }
    Ok(())
}
