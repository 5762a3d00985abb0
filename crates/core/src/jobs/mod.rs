//! Asynchronous download job orchestration.
//!
//! Jobs are held in memory only. Each accepted job gets a [`JobRecord`] in
//! the [`JobRegistry`], a worker process supervised by [`ProcessSupervisor`],
//! and a bounded [`LogBuffer`] that pollers read with sequence-number cursors.

pub mod command;
pub mod log_buffer;
pub mod record;
pub mod registry;
pub mod service;
pub mod supervisor;

pub use command::{WorkerCommand, WorkerCommandBuilder, YtDlpCommand};
pub use log_buffer::{LogBuffer, LogSlice, LogSource};
pub use record::{JobId, JobOutcome, JobRecord, JobSnapshot, JobStatus};
pub use registry::{JobCounts, JobRegistry};
pub use service::{JobPoll, JobService};
pub use supervisor::ProcessSupervisor;
