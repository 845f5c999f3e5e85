//! Minimal CLI: schema in, C++ header out.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::codegen::{CodeGen, Options};
use crate::compile;
use crate::guard;

/// generate C++ data types and Avro codecs from an Avro schema
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// set namespace for generated code
    #[arg(short, long)]
    namespace: Option<String>,

    /// prefix for include headers, - for none
    #[arg(short = 'p', long, default_value = "avro")]
    include_prefix: String,

    /// do not generate typedefs for unions in records
    #[arg(short = 'U', long)]
    no_union_typedef: bool,

    /// input schema file (stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// output header file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let schema_text = match &self.input {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read schema file {}", path.display()))?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read schema from stdin")?;
                buf
            }
        };
        let schema = compile::compile_schema(&schema_text)
            .context("failed to parse or compile schema")?;

        let schema_file = match &self.input {
            Some(path) => path.to_string_lossy().into_owned(),
            None => "stdin".to_string(),
        };
        // guard identity prefers the output target; for stdout fall back
        // to the schema file so the token is still deterministic
        let header_file = match (&self.output, &self.input) {
            (Some(output), _) => output.to_string_lossy().into_owned(),
            (None, Some(input)) => input.to_string_lossy().into_owned(),
            (None, None) => "stdin".to_string(),
        };
        let reused_guard = self
            .output
            .as_ref()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .as_deref()
            .and_then(guard::read_guard);

        let options = Options {
            namespace: self.namespace.clone(),
            include_prefix: normalize_include_prefix(&self.include_prefix),
            no_union_typedef: self.no_union_typedef,
            schema_file,
            header_file,
            guard: reused_guard,
        };
        let header = CodeGen::new(&schema, options).generate();

        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create output directory {}", parent.display())
                    })?;
                }
                std::fs::write(path, &header)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            None => print!("{header}"),
        }
        Ok(())
    }
}

fn normalize_include_prefix(prefix: &str) -> String {
    if prefix == "-" || prefix.is_empty() {
        String::new()
    } else if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

// ------------------------------- Tests ------------------------------------ //
