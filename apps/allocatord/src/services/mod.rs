// [apps/allocatord/src/services/mod.rs]
//! Las tareas periodicas del daemon (spec §4), cada una un modulo propio,
//! mas el supervisor que las programa (spec §4.G).

pub mod allocator;
pub mod epoch;
pub mod power_controller;
pub mod quota_manager;
pub mod scheduler;

pub use allocator::Allocator;
pub use epoch::{destroy_job as destroy_live_job, ExpirySweep, Tombstone};
pub use power_controller::PowerController;
pub use quota_manager::QuotaManager;
pub use scheduler::Scheduler;
