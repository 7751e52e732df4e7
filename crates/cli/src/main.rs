// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quintet_cli::commands::{export, genesis, replay, timeline, verify};
use quintet_kernel::config::DEFAULT_INCIDENT_TAIL;

#[derive(Parser)]
#[command(name = "quintet")]
#[command(about = "Quintet ledger audit CLI - replay, verify and export deterministic ledger logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON genesis description and initialize a data directory
    Genesis {
        /// Genesis description (JSON)
        spec_path: String,

        /// Directory receiving genesis.bin and events.jsonl
        #[arg(long, short, default_value = ".")]
        dir: PathBuf,
    },
    /// Replay an event log from genesis and report the resulting state hash
    Replay {
        genesis_path: String,
        log_path: String,

        /// Stop after this log entry
        #[arg(long, short)]
        until: Option<u64>,

        /// Fail unless the resulting state hash equals this one (hex)
        #[arg(long)]
        expect: Option<String>,
    },
    /// Replay the full log, checking every recorded outcome and hash
    Verify {
        genesis_path: String,
        log_path: String,
    },
    /// List the recorded entries of an event log
    Timeline {
        log_path: String,
    },
    /// Replay the log and write the audit artifact
    Export {
        genesis_path: String,
        log_path: String,

        #[arg(long, short, default_value = "audit.json")]
        out: PathBuf,

        /// Number of trailing incident records to include
        #[arg(long, default_value_t = DEFAULT_INCIDENT_TAIL)]
        tail: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    quintet_node::telemetry::init_telemetry();

    match cli.command {
        Commands::Genesis { spec_path, dir } => genesis::run(&spec_path, &dir).map(|_| ()),
        Commands::Replay {
            genesis_path,
            log_path,
            until,
            expect,
        } => replay::run(&genesis_path, &log_path, until, expect).map(|_| ()),
        Commands::Verify { genesis_path, log_path } => verify::run(&genesis_path, &log_path).map(|_| ()),
        Commands::Timeline { log_path } => timeline::run(&log_path).map(|_| ()),
        Commands::Export {
            genesis_path,
            log_path,
            out,
            tail,
        } => export::run(&genesis_path, &log_path, &out, tail).map(|_| ()),
    }
}
