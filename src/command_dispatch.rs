//! Purpose: Hold top-level CLI command dispatch for `kvpgen`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Successful commands print exactly one JSON document on stdout.

use super::*;

use kvpgen::api::{RunSummary, generate_to_files};

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "kvpgen", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Config(args) => {
            let config = args.generator.resolve()?;
            let value = serde_json::to_value(&config).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode config")
                    .with_source(err)
            })?;
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::Generate(args) => {
            let config = args.generator.resolve()?;
            tracing::info!(
                valid = config.valid_count,
                invalid = config.invalid_count,
                workers = config.workers,
                "generating fixtures"
            );
            let summary = generate_to_files(&config, &args.input_out, &args.expected_out)?;
            emit_json(generate_json(&summary, &args));
            Ok(RunOutcome::ok())
        }
    }
}

fn generate_json(summary: &RunSummary, args: &GenerateArgs) -> Value {
    let input = &summary.input;
    json!({
        "seed": summary.seed,
        "generated_at": now_rfc3339(),
        "valid": {
            "requested": summary.valid_requested,
            "generated": summary.valid_entries,
            "workers": summary.valid_workers,
        },
        "invalid": {
            "requested": summary.invalid_requested,
            "generated": summary.invalid_entries,
            "workers": summary.invalid_workers,
        },
        "input": {
            "path": args.input_out.display().to_string(),
            "bytes": input.bytes,
            "records": input.records,
            "noise_runs": input.noise_runs,
            "quoted_keys": input.quoted_keys,
            "quoted_values": input.quoted_values,
            "padded_keys": input.padded_keys,
            "padded_values": input.padded_values,
        },
        "expected": {
            "path": args.expected_out.display().to_string(),
            "bytes": summary.expected_bytes,
            "entries": summary.valid_entries,
        },
    })
}
