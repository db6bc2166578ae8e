//! The authorization guard.
//!
//! Every mutation path asks this one function; nothing else in the crate
//! makes a permission decision. The function is pure: callers fetch whatever
//! ownership facts an [Action] needs before asking.

use crate::user::UserRole;

use super::error::MarketplaceError;

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub role: UserRole,
}

/// Everything the guard can be asked about, with the ownership facts each
/// decision needs baked into the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateShift,
    UpdateShift { owner_id: i64 },
    DeleteShift { owner_id: i64 },
    ReadNearby,
    Apply,
    DecideApplication { shift_owner_id: i64 },
    WithdrawApplication { applicant_id: i64 },
    ListShiftApplications { owner_id: i64 },
}

/// Allows or denies an action. Denial carries no detail about the target,
/// so handlers can answer 403 without confirming the resource exists.
pub fn authorize(caller: &Caller, action: &Action) -> Result<(), MarketplaceError> {
    let allowed = match *action {
        Action::CreateShift => {
            matches!(caller.role, UserRole::Business | UserRole::Admin)
        }
        // Admin deliberately does not bypass shift mutation: only the
        // owning business account may edit or delete a shift.
        Action::UpdateShift { owner_id } | Action::DeleteShift { owner_id } => {
            caller.role == UserRole::Business && caller.user_id == owner_id
        }
        Action::ReadNearby => true,
        Action::Apply => caller.role == UserRole::Worker,
        Action::DecideApplication { shift_owner_id } => {
            matches!(caller.role, UserRole::Business | UserRole::Admin)
                && caller.user_id == shift_owner_id
        }
        Action::WithdrawApplication { applicant_id } => {
            caller.role == UserRole::Worker && caller.user_id == applicant_id
        }
        Action::ListShiftApplications { owner_id } => {
            caller.role == UserRole::Admin || caller.user_id == owner_id
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(MarketplaceError::Unauthorized)
    }
}
