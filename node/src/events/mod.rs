// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event-sourced persistence: the log on disk is the source of truth.

pub mod event_commit;
pub mod event_log;
pub mod event_proof;
pub mod event_replay;

pub use event_commit::{CommitError, EventCommitter};
pub use event_log::{EventLogError, EventLogWriter};
pub use event_proof::{compute_event_log_hash, export_audit_artifact, generate_proof, EventProof, ProofError};
pub use event_replay::{read_event_log, recover_from_event_log, LogContents, Recovered, ReplayError};
