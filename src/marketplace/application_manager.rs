use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::geo_index::GeoIndex;
use crate::shift_store::{
    Application, ApplicationStatus, ShiftStatus, ShiftStore, WorkerApplication,
};
use crate::user::UserStore;

use super::error::MarketplaceError;
use super::events::{EventSink, MarketplaceEvent};
use super::guard::{authorize, Action, Caller};

/// Owner-facing applicant row: the application plus the worker's identity,
/// looked up from the user store. Identity fields are absent if the worker
/// account no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftApplicant {
    pub id: i64,
    pub shift_id: i64,
    pub worker_id: i64,
    pub status: ApplicationStatus,
    pub created: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_email: Option<String>,
}

/// Application lifecycle: apply, decide, withdraw, and the two listings.
pub struct ApplicationManager {
    store: Arc<dyn ShiftStore>,
    user_store: Arc<dyn UserStore>,
    geo_index: Arc<dyn GeoIndex>,
    event_sink: Arc<dyn EventSink>,
}

impl ApplicationManager {
    pub fn new(
        store: Arc<dyn ShiftStore>,
        user_store: Arc<dyn UserStore>,
        geo_index: Arc<dyn GeoIndex>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            user_store,
            geo_index,
            event_sink,
        }
    }

    pub fn apply(
        &self,
        caller: &Caller,
        shift_id: i64,
    ) -> Result<Application, MarketplaceError> {
        authorize(caller, &Action::Apply)?;
        let shift = self
            .store
            .get_shift(shift_id)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;
        if shift.status != ShiftStatus::Open {
            return Err(MarketplaceError::Conflict(
                "Shift is no longer available".to_string(),
            ));
        }

        // Duplicate (shift, worker) pairs are caught by the store's unique
        // constraint, not by a lookup that could race.
        let application = self
            .store
            .create_application(shift_id, caller.user_id)?
            .ok_or_else(|| {
                MarketplaceError::Conflict("Already applied to this shift".to_string())
            })?;

        self.event_sink
            .publish(MarketplaceEvent::ApplicationCreated {
                shift_id: application.shift_id,
                worker_id: application.worker_id,
                status: application.status,
            });
        Ok(application)
    }

    pub fn decide(
        &self,
        caller: &Caller,
        application_id: i64,
        new_status: ApplicationStatus,
    ) -> Result<(), MarketplaceError> {
        if !new_status.is_terminal() {
            return Err(MarketplaceError::Validation(
                "Status must be ACCEPTED or REJECTED".to_string(),
            ));
        }
        let application = self
            .store
            .get_application(application_id)?
            .ok_or(MarketplaceError::NotFound("Application"))?;
        let shift = self
            .store
            .get_shift(application.shift_id)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;
        authorize(
            caller,
            &Action::DecideApplication {
                shift_owner_id: shift.owner_id,
            },
        )?;
        if application.status != ApplicationStatus::Pending {
            return Err(MarketplaceError::Conflict(
                "Application has already been decided".to_string(),
            ));
        }

        match new_status {
            ApplicationStatus::Accepted => {
                // One transaction: application -> ACCEPTED, shift -> FILLED.
                // Sibling pending applications stay pending.
                self.store.accept_application(application.id, shift.id)?;
                if let Err(err) = self.geo_index.remove(shift.id) {
                    warn!(
                        "Failed to remove filled shift {} from index: {:#}",
                        shift.id, err
                    );
                }
            }
            ApplicationStatus::Rejected => {
                self.store
                    .update_application_status(application.id, ApplicationStatus::Rejected)?;
            }
            ApplicationStatus::Pending => unreachable!("terminal statuses only"),
        }

        self.event_sink
            .publish(MarketplaceEvent::ApplicationStatusUpdated {
                application_id: application.id,
                new_status,
                updated_by: caller.user_id,
            });
        Ok(())
    }

    pub fn withdraw(
        &self,
        caller: &Caller,
        application_id: i64,
    ) -> Result<(), MarketplaceError> {
        let application = self
            .store
            .get_application(application_id)?
            .ok_or(MarketplaceError::NotFound("Application"))?;
        authorize(
            caller,
            &Action::WithdrawApplication {
                applicant_id: application.worker_id,
            },
        )?;
        if application.status != ApplicationStatus::Pending {
            return Err(MarketplaceError::Conflict(
                "Only pending applications can be withdrawn".to_string(),
            ));
        }
        if !self.store.delete_application(application_id)? {
            return Err(MarketplaceError::NotFound("Application"));
        }
        Ok(())
    }

    pub fn applications_for_worker(
        &self,
        caller: &Caller,
    ) -> Result<Vec<WorkerApplication>, MarketplaceError> {
        Ok(self.store.get_applications_by_worker(caller.user_id)?)
    }

    pub fn applicants_for_shift(
        &self,
        caller: &Caller,
        shift_id: i64,
    ) -> Result<Vec<ShiftApplicant>, MarketplaceError> {
        let shift = self
            .store
            .get_shift(shift_id)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;
        authorize(
            caller,
            &Action::ListShiftApplications {
                owner_id: shift.owner_id,
            },
        )?;

        let applications = self.store.get_applications_by_shift(shift_id)?;
        let mut applicants = Vec::with_capacity(applications.len());
        for application in applications {
            let worker = self.user_store.get_user_by_id(application.worker_id)?;
            applicants.push(ShiftApplicant {
                id: application.id,
                shift_id: application.shift_id,
                worker_id: application.worker_id,
                status: application.status,
                created: application.created,
                worker_name: worker.as_ref().map(|u| u.full_name.clone()),
                worker_email: worker.map(|u| u.email),
            });
        }
        Ok(applicants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_index::HaversineGeoIndex;
    use crate::marketplace::test_support::RecordingEventSink;
    use crate::marketplace::{NoOpEventSink, ShiftManager};
    use crate::shift_store::{MemoryShiftStore, ShiftDraft};
    use crate::user::{NewUser, SqliteUserStore, UserRole};
    use std::path::Path;
    use tempfile::TempDir;

    fn worker(user_id: i64) -> Caller {
        Caller {
            user_id,
            role: UserRole::Worker,
        }
    }

    fn business(user_id: i64) -> Caller {
        Caller {
            user_id,
            role: UserRole::Business,
        }
    }

    struct Fixture {
        store: Arc<MemoryShiftStore>,
        geo_index: Arc<HaversineGeoIndex>,
        sink: Arc<RecordingEventSink>,
        shifts: ShiftManager,
        applications: ApplicationManager,
        _tmp_dir: TempDir,
    }

    fn fixture() -> Fixture {
        let tmp_dir = TempDir::new().unwrap();
        let user_store =
            Arc::new(SqliteUserStore::new(&tmp_dir.path().join("users.db")).unwrap());
        fixture_with_users(tmp_dir, user_store)
    }

    fn fixture_with_users(tmp_dir: TempDir, user_store: Arc<SqliteUserStore>) -> Fixture {
        let store = Arc::new(MemoryShiftStore::new());
        let geo_index = Arc::new(HaversineGeoIndex::new());
        let sink = Arc::new(RecordingEventSink::default());
        let shifts = ShiftManager::new(store.clone(), geo_index.clone(), Arc::new(NoOpEventSink));
        let applications = ApplicationManager::new(
            store.clone(),
            user_store,
            geo_index.clone(),
            sink.clone(),
        );
        Fixture {
            store,
            geo_index,
            sink,
            shifts,
            applications,
            _tmp_dir: tmp_dir,
        }
    }

    fn open_shift(f: &Fixture, owner_id: i64) -> i64 {
        f.shifts
            .create_shift(
                &business(owner_id),
                ShiftDraft {
                    owner_id: 0,
                    title: "Barista at Canggu Coffee".to_string(),
                    description: None,
                    pay_rate: 75000.0,
                    lat: -8.6478,
                    lng: 115.1385,
                },
            )
            .unwrap()
            .id
    }

    fn register_worker(path: &Path, email: &str, name: &str) -> i64 {
        let store = SqliteUserStore::new(path).unwrap();
        store
            .create_user(
                NewUser {
                    email: email.to_string(),
                    full_name: name.to_string(),
                    role: UserRole::Worker,
                },
                "password",
            )
            .unwrap()
            .unwrap()
            .id
    }

    #[test]
    fn apply_creates_a_pending_application() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);

        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        assert_eq!(application.shift_id, shift_id);
        assert_eq!(application.worker_id, 7);
        assert_eq!(application.status, ApplicationStatus::Pending);
        let events = f.sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "application_created");
    }

    #[test]
    fn applying_twice_is_a_conflict() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);

        f.applications.apply(&worker(7), shift_id).unwrap();
        let err = f.applications.apply(&worker(7), shift_id).unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn applying_to_a_filled_shift_is_a_conflict() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();
        f.applications
            .decide(&business(42), application.id, ApplicationStatus::Accepted)
            .unwrap();

        let err = f.applications.apply(&worker(8), shift_id).unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn applying_to_a_missing_shift_is_not_found() {
        let f = fixture();
        let err = f.applications.apply(&worker(7), 999).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn accept_fills_the_shift_and_evicts_it_from_the_index() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        f.applications
            .decide(&business(42), application.id, ApplicationStatus::Accepted)
            .unwrap();

        let shift = f.store.get_shift(shift_id).unwrap().unwrap();
        assert_eq!(shift.status, ShiftStatus::Filled);
        let application = f.store.get_application(application.id).unwrap().unwrap();
        assert_eq!(application.status, ApplicationStatus::Accepted);
        assert!(f
            .geo_index
            .search_within_radius(-8.64, 115.13, 10.0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn accept_leaves_sibling_applications_pending() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let first = f.applications.apply(&worker(7), shift_id).unwrap();
        let second = f.applications.apply(&worker(8), shift_id).unwrap();

        f.applications
            .decide(&business(42), first.id, ApplicationStatus::Accepted)
            .unwrap();

        let sibling = f.store.get_application(second.id).unwrap().unwrap();
        assert_eq!(sibling.status, ApplicationStatus::Pending);
    }

    #[test]
    fn reject_keeps_the_shift_open() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        f.applications
            .decide(&business(42), application.id, ApplicationStatus::Rejected)
            .unwrap();

        let shift = f.store.get_shift(shift_id).unwrap().unwrap();
        assert_eq!(shift.status, ShiftStatus::Open);
        let application = f.store.get_application(application.id).unwrap().unwrap();
        assert_eq!(application.status, ApplicationStatus::Rejected);
    }

    #[test]
    fn deciding_requires_terminal_status() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        let err = f
            .applications
            .decide(&business(42), application.id, ApplicationStatus::Pending)
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn re_deciding_is_a_conflict() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();
        f.applications
            .decide(&business(42), application.id, ApplicationStatus::Rejected)
            .unwrap();

        let err = f
            .applications
            .decide(&business(42), application.id, ApplicationStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn deciding_as_a_non_owner_is_unauthorized() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        let err = f
            .applications
            .decide(&business(43), application.id, ApplicationStatus::Accepted)
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    #[test]
    fn withdraw_deletes_a_pending_application() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        f.applications.withdraw(&worker(7), application.id).unwrap();
        assert!(f.store.get_application(application.id).unwrap().is_none());
    }

    #[test]
    fn withdraw_after_decision_is_a_conflict() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();
        f.applications
            .decide(&business(42), application.id, ApplicationStatus::Rejected)
            .unwrap();

        let err = f.applications.withdraw(&worker(7), application.id).unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn withdraw_by_another_worker_is_unauthorized() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        let application = f.applications.apply(&worker(7), shift_id).unwrap();

        let err = f.applications.withdraw(&worker(8), application.id).unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    #[test]
    fn worker_listing_carries_shift_details() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        f.applications.apply(&worker(7), shift_id).unwrap();

        let listing = f.applications.applications_for_worker(&worker(7)).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].shift_title, "Barista at Canggu Coffee");
        assert_eq!(listing[0].shift_pay_rate, 75000.0);
    }

    #[test]
    fn applicant_listing_carries_worker_identity() {
        let tmp_dir = TempDir::new().unwrap();
        let db_path = tmp_dir.path().join("users.db");
        let worker_id = register_worker(&db_path, "made@example.com", "Made Wirawan");
        let user_store = Arc::new(SqliteUserStore::new(&db_path).unwrap());
        let f = fixture_with_users(tmp_dir, user_store);

        let shift_id = open_shift(&f, 42);
        f.applications.apply(&worker(worker_id), shift_id).unwrap();

        let applicants = f
            .applications
            .applicants_for_shift(&business(42), shift_id)
            .unwrap();
        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0].worker_id, worker_id);
        assert_eq!(applicants[0].worker_name.as_deref(), Some("Made Wirawan"));
        assert_eq!(
            applicants[0].worker_email.as_deref(),
            Some("made@example.com")
        );
    }

    #[test]
    fn applicant_listing_by_stranger_is_unauthorized() {
        let f = fixture();
        let shift_id = open_shift(&f, 42);
        f.applications.apply(&worker(7), shift_id).unwrap();

        let err = f
            .applications
            .applicants_for_shift(&business(43), shift_id)
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");

        // Admin may list any shift's applicants.
        let admin = Caller {
            user_id: 1,
            role: UserRole::Admin,
        };
        let applicants = f.applications.applicants_for_shift(&admin, shift_id).unwrap();
        assert_eq!(applicants.len(), 1);
    }
}
