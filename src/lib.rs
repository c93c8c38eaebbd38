// src/lib.rs

pub mod args;
pub mod cli;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resolve;

use anyhow::{Context, Result};

use crate::cli::{CliArgs, CliCommand};
use crate::env::ExpandOptions;
use crate::exec::{Command, ExecutionResult, Pipeline};
use crate::resolve::ResolveOptions;

/// High-level entry point used by `main.rs`.
///
/// Dispatches one CLI subcommand and returns the process exit code to use:
/// the child's exit code for `run`/`pipe`, zero for the query commands.
pub fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        CliCommand::Run {
            command,
            quiet,
            json,
        } => {
            let line = command.join(" ");
            let cmd = Command::parse(&line);
            let result = if quiet {
                cmd.quiet()
            } else if json {
                cmd.output()
            } else {
                cmd.run()
            };
            let result = result.map_err(|err| anyhow::Error::new(err.error))?;
            if json {
                print_json(&result)?;
            }
            Ok(result.code)
        }

        CliCommand::Pipe { stages, json } => {
            let mut pipeline = Pipeline::new();
            for stage in &stages {
                pipeline = pipeline.pipe_str(stage);
            }
            let result = if json {
                pipeline.output()
            } else {
                pipeline.run()
            };
            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    for cause in &err.causes {
                        tracing::error!(error = %cause, "pipeline stage failed");
                    }
                    anyhow::bail!("{err}");
                }
            };
            if json {
                print_json(&result)?;
            }
            Ok(result.code)
        }

        CliCommand::Which {
            name,
            cached,
            prepend_paths,
        } => {
            let opts = ResolveOptions {
                use_cache: cached,
                prepend_paths,
            };
            let path = resolve::resolve(&name, &opts)?;
            println!("{}", path.display());
            Ok(0)
        }

        CliCommand::Expand {
            template,
            positional,
        } => {
            let opts = ExpandOptions {
                allow_positional_args: positional,
            };
            let expanded = env::expand_with(&template, &mut env::ProcessEnv, &opts)?;
            println!("{expanded}");
            Ok(0)
        }

        CliCommand::Split { command } => {
            for token in args::split(&command) {
                println!("{token}");
            }
            Ok(0)
        }
    }
}

fn print_json(result: &ExecutionResult) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(result).context("serializing execution result")?;
    println!("{rendered}");
    Ok(())
}
