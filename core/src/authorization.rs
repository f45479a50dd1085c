//! Authorization guard.

use crate::error::{ReservationError, Result};
use crate::types::{Actor, MemberId, Reservation};

/// Allows the reservation's owner and admins.
///
/// # Errors
///
/// Returns `ReservationError::NotAllowed` for anyone else.
pub fn authorize(actor: &Actor, reservation: &Reservation) -> Result<()> {
    authorize_member(actor, reservation.member_id)
}

/// Allows `member_id` itself and admins.
///
/// # Errors
///
/// Returns `ReservationError::NotAllowed` for anyone else.
pub fn authorize_member(actor: &Actor, member_id: MemberId) -> Result<()> {
    if actor.is_admin() || actor.id == member_id {
        Ok(())
    } else {
        Err(ReservationError::NotAllowed)
    }
}

/// Allows admins only.
///
/// # Errors
///
/// Returns `ReservationError::AdminRequired` for non-admins.
pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ReservationError::AdminRequired)
    }
}
