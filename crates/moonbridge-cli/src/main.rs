//! moonbridge - run a Lua chunk and print what it returns

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use moonbridge::{Lua, LuaConfig, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "moonbridge",
    version,
    about = "Run a Lua chunk and print every value it returns"
)]
struct Cli {
    /// Lua source file to run
    #[arg(value_name = "FILE", conflicts_with = "code")]
    file: Option<PathBuf>,

    /// Run this code instead of a file
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    code: Option<String>,

    /// Reject reads of undefined globals and writes of undeclared ones
    #[arg(long)]
    strict: bool,

    /// Append a pattern to package.path (repeatable)
    #[arg(long = "path", value_name = "PATTERN")]
    paths: Vec<String>,

    /// Append a pattern to package.cpath (repeatable)
    #[arg(long = "cpath", value_name = "PATTERN")]
    cpaths: Vec<String>,

    /// Maximum table nesting when converting values
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Print results as JSON, one per line
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> LuaConfig {
    let mut config = LuaConfig::from_env();
    if cli.strict {
        config = config.strict();
    }
    for pattern in &cli.paths {
        config = config.with_package_path(pattern.clone());
    }
    for pattern in &cli.cpaths {
        config = config.with_package_cpath(pattern.clone());
    }
    if let Some(depth) = cli.max_depth {
        config = config.with_max_depth(depth);
    }
    config
}

fn print_value(value: &Value, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(value).context("Failed to render result as JSON")?;
        println!("{}", line);
    } else {
        println!("{:?}", value);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut lua = Lua::with_config(build_config(&cli)).context("Failed to create Lua state")?;

    let results = match (&cli.code, &cli.file) {
        (Some(code), _) => lua.exec(code).context("Failed to run code")?,
        (None, Some(path)) => {
            let base = lua.stack_size();
            lua.load_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            lua.run()
                .with_context(|| format!("Failed to run {}", path.display()))?;
            let mut results = Vec::new();
            while lua.stack_size() > base {
                results.push(lua.pop().context("Failed to convert result")?);
            }
            results.reverse();
            results
        }
        (None, None) => bail!("nothing to run: pass a FILE or -e CODE"),
    };

    debug!(count = results.len(), "chunk returned");
    for value in &results {
        print_value(value, cli.json)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_build_config() {
        let cli = Cli::parse_from([
            "moonbridge",
            "-e",
            "return 1",
            "--strict",
            "--path",
            "./?.lua",
            "--max-depth",
            "8",
        ]);
        let config = build_config(&cli);
        assert!(config.strict_read);
        assert!(config.strict_write);
        assert!(config.package_paths.iter().any(|p| p == "./?.lua"));
        assert_eq!(config.marshal.max_depth, 8);
    }

    #[test]
    fn test_file_and_code_conflict() {
        let parsed = Cli::try_parse_from(["moonbridge", "-e", "return 1", "script.lua"]);
        assert!(parsed.is_err());
    }
}
