//! ShiftStore trait definition.
//!
//! The authoritative record store for shifts and applications. It owns the
//! strong guarantees: the (shift, worker) uniqueness constraint, the atomic
//! delete cascade, and the atomic accept transition. The proximity index is
//! derived from it and can always be rebuilt.

use anyhow::Result;

use super::models::{
    Application, ApplicationStatus, Shift, ShiftChanges, ShiftDraft, ShiftStatus,
    WorkerApplication,
};

pub trait ShiftStore: Send + Sync {
    /// Inserts a new shift with status OPEN, assigning id and timestamp.
    fn create_shift(&self, draft: ShiftDraft) -> Result<Shift>;

    /// Returns Ok(None) if the shift does not exist.
    fn get_shift(&self, shift_id: i64) -> Result<Option<Shift>>;

    /// All shifts posted by an owner, newest first.
    fn get_shifts_by_owner(&self, owner_id: i64) -> Result<Vec<Shift>>;

    /// All OPEN shifts; used to rebuild the proximity index.
    fn get_open_shifts(&self) -> Result<Vec<Shift>>;

    /// Full replacement of the shift's mutable fields. Status is untouched.
    /// Returns the updated shift, or Ok(None) if it does not exist.
    fn update_shift(&self, shift_id: i64, changes: &ShiftChanges) -> Result<Option<Shift>>;

    fn update_shift_status(&self, shift_id: i64, status: ShiftStatus) -> Result<()>;

    /// Deletes the shift and all its applications in one transaction.
    /// Returns false if the shift does not exist.
    fn delete_shift(&self, shift_id: i64) -> Result<bool>;

    /// Inserts a PENDING application. Returns Ok(None) if this worker already
    /// applied to this shift (unique constraint, not check-then-insert).
    fn create_application(&self, shift_id: i64, worker_id: i64) -> Result<Option<Application>>;

    /// Returns Ok(None) if the application does not exist.
    fn get_application(&self, application_id: i64) -> Result<Option<Application>>;

    /// A worker's applications joined with shift title and pay, newest first.
    fn get_applications_by_worker(&self, worker_id: i64) -> Result<Vec<WorkerApplication>>;

    /// All applications for a shift, oldest first.
    fn get_applications_by_shift(&self, shift_id: i64) -> Result<Vec<Application>>;

    fn update_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<()>;

    /// Accepting is a single transaction: application goes ACCEPTED and the
    /// parent shift goes FILLED, or neither does.
    fn accept_application(&self, application_id: i64, shift_id: i64) -> Result<()>;

    /// Returns false if the application does not exist.
    fn delete_application(&self, application_id: i64) -> Result<bool>;
}
