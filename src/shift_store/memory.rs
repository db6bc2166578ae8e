//! In-memory ShiftStore, used by unit tests and as a reference semantics
//! for the sqlite implementation.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use super::models::{
    Application, ApplicationStatus, Shift, ShiftChanges, ShiftDraft, ShiftStatus,
    WorkerApplication,
};
use super::trait_def::ShiftStore;

#[derive(Default)]
struct Inner {
    shifts: Vec<Shift>,
    applications: Vec<Application>,
    next_shift_id: i64,
    next_application_id: i64,
}

#[derive(Default)]
pub struct MemoryShiftStore {
    inner: Mutex<Inner>,
    /// When set, every write fails. Lets tests exercise the
    /// authoritative-write-is-fatal path.
    fail_writes: AtomicBool,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Store is unavailable");
        }
        Ok(())
    }
}

impl ShiftStore for MemoryShiftStore {
    fn create_shift(&self, draft: ShiftDraft) -> Result<Shift> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_shift_id += 1;
        let shift = Shift {
            id: inner.next_shift_id,
            owner_id: draft.owner_id,
            title: draft.title,
            description: draft.description,
            pay_rate: draft.pay_rate,
            lat: draft.lat,
            lng: draft.lng,
            status: ShiftStatus::Open,
            created: now(),
        };
        inner.shifts.push(shift.clone());
        Ok(shift)
    }

    fn get_shift(&self, shift_id: i64) -> Result<Option<Shift>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.shifts.iter().find(|s| s.id == shift_id).cloned())
    }

    fn get_shifts_by_owner(&self, owner_id: i64) -> Result<Vec<Shift>> {
        let inner = self.inner.lock().unwrap();
        let mut shifts: Vec<Shift> = inner
            .shifts
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        shifts.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(shifts)
    }

    fn get_open_shifts(&self) -> Result<Vec<Shift>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .shifts
            .iter()
            .filter(|s| s.status == ShiftStatus::Open)
            .cloned()
            .collect())
    }

    fn update_shift(&self, shift_id: i64, changes: &ShiftChanges) -> Result<Option<Shift>> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        match inner.shifts.iter_mut().find(|s| s.id == shift_id) {
            None => Ok(None),
            Some(shift) => {
                shift.title = changes.title.clone();
                shift.description = changes.description.clone();
                shift.pay_rate = changes.pay_rate;
                shift.lat = changes.lat;
                shift.lng = changes.lng;
                Ok(Some(shift.clone()))
            }
        }
    }

    fn update_shift_status(&self, shift_id: i64, status: ShiftStatus) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(shift) = inner.shifts.iter_mut().find(|s| s.id == shift_id) {
            shift.status = status;
        }
        Ok(())
    }

    fn delete_shift(&self, shift_id: i64) -> Result<bool> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let existed = inner.shifts.iter().any(|s| s.id == shift_id);
        inner.shifts.retain(|s| s.id != shift_id);
        inner.applications.retain(|a| a.shift_id != shift_id);
        Ok(existed)
    }

    fn create_application(&self, shift_id: i64, worker_id: i64) -> Result<Option<Application>> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner
            .applications
            .iter()
            .any(|a| a.shift_id == shift_id && a.worker_id == worker_id);
        if duplicate {
            return Ok(None);
        }
        inner.next_application_id += 1;
        let application = Application {
            id: inner.next_application_id,
            shift_id,
            worker_id,
            status: ApplicationStatus::Pending,
            created: now(),
        };
        inner.applications.push(application.clone());
        Ok(Some(application))
    }

    fn get_application(&self, application_id: i64) -> Result<Option<Application>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .cloned())
    }

    fn get_applications_by_worker(&self, worker_id: i64) -> Result<Vec<WorkerApplication>> {
        let inner = self.inner.lock().unwrap();
        let mut applications: Vec<WorkerApplication> = inner
            .applications
            .iter()
            .filter(|a| a.worker_id == worker_id)
            .filter_map(|a| {
                let shift = inner.shifts.iter().find(|s| s.id == a.shift_id)?;
                Some(WorkerApplication {
                    id: a.id,
                    shift_id: a.shift_id,
                    worker_id: a.worker_id,
                    status: a.status,
                    created: a.created,
                    shift_title: shift.title.clone(),
                    shift_pay_rate: shift.pay_rate,
                })
            })
            .collect();
        applications.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(applications)
    }

    fn get_applications_by_shift(&self, shift_id: i64) -> Result<Vec<Application>> {
        let inner = self.inner.lock().unwrap();
        let mut applications: Vec<Application> = inner
            .applications
            .iter()
            .filter(|a| a.shift_id == shift_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(applications)
    }

    fn update_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(application) = inner
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
        {
            application.status = status;
        }
        Ok(())
    }

    fn accept_application(&self, application_id: i64, shift_id: i64) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(application) = inner
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
        {
            application.status = ApplicationStatus::Accepted;
        }
        if let Some(shift) = inner.shifts.iter_mut().find(|s| s.id == shift_id) {
            shift.status = ShiftStatus::Filled;
        }
        Ok(())
    }

    fn delete_application(&self, application_id: i64) -> Result<bool> {
        self.check_writable()?;
        let mut inner = self.inner.lock().unwrap();
        let existed = inner.applications.iter().any(|a| a.id == application_id);
        inner.applications.retain(|a| a.id != application_id);
        Ok(existed)
    }
}
