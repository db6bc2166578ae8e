mod memory;
mod models;
mod sqlite_shift_store;
mod trait_def;

pub use memory::MemoryShiftStore;
pub use models::{
    Application, ApplicationStatus, Shift, ShiftChanges, ShiftDraft, ShiftStatus,
    WorkerApplication,
};
pub use sqlite_shift_store::SqliteShiftStore;
pub use trait_def::ShiftStore;
