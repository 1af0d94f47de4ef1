//! Server-side authorization decisions.

use common::{HotelId, UserId};

use crate::error::{BookingError, Result};

/// Result of resolving a hotel's owner through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerLookup {
    Owner(UserId),
    NotFound,
}

/// Allows a hotel's bookings to be listed only by its owner.
pub fn authorize_hotel_access(
    hotel_id: HotelId,
    lookup: OwnerLookup,
    caller: UserId,
) -> Result<()> {
    match lookup {
        OwnerLookup::NotFound => Err(BookingError::HotelNotFound(hotel_id)),
        OwnerLookup::Owner(owner) if owner == caller => Ok(()),
        OwnerLookup::Owner(_) => Err(BookingError::ForbiddenAccess),
    }
}

/// Allows a user's bookings to be listed only by that user.
pub fn authorize_user_access(requested: UserId, caller: UserId) -> Result<()> {
    if requested == caller {
        Ok(())
    } else {
        Err(BookingError::ForbiddenAccess)
    }
}
