//! Background sync plumbing: the job queue and per-item locks

pub mod locks;
pub mod worker;

pub use locks::ItemLocks;
pub use worker::{SyncHandle, SyncJob, SyncTrigger, SyncWorker};
