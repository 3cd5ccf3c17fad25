//! partflash-core - Partition-aware provisioning and coredump retrieval
//!
//! This crate holds everything partflash decides on its own: partition table
//! lookup, capacity planning, deterministic artifact selection and the two
//! orchestrators that sequence the external tools. It never spawns a process
//! or opens a serial port itself; those collaborators are reached through the
//! traits in [`tools`] and [`port`].
//!
//! # Example
//!
//! ```ignore
//! use partflash_core::pipeline::{ProvisionRequest, Provisioner};
//!
//! let report = Provisioner::new(&packager, &writer).run(&request, &mut observer)?;
//! println!("{} bytes of {} used", report.plan.aligned_size, report.plan.partition_size);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifact;
pub mod capacity;
pub mod error;
pub mod partition;
pub mod pipeline;
pub mod port;
pub mod tools;
pub mod walk;

pub use error::{Error, Outcome, Result, RunFailure, Stage, ToolFailure};
