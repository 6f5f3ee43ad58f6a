//! Background worker: claims queued jobs and regenerates annotation
//! request queues.

pub mod config;
pub mod datafile;
pub mod generate;
pub mod runner;
