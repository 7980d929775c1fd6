//! State transitions for bookings, payments and maintenance requests.
//!
//! Everything here is pure: the store gathers the rows under its lock or
//! transaction, asks for a plan, and writes the plan back in the same unit
//! of work.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::database::models::{
    Boarder, Booking, BookingStatus, MaintenanceRequest, MaintenanceStatus, Payment, PaymentStatus, Room,
    RoomStatus,
};
use crate::database::DatabaseError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Room {0} is under maintenance")]
    RoomUnavailable(String),

    #[error("Room {0} is fully booked for the requested dates")]
    RoomFull(String),

    #[error("Boarder {0} already occupies another room")]
    BoarderHasRoom(String),
}

impl From<LifecycleError> for DatabaseError {
    fn from(err: LifecycleError) -> Self {
        DatabaseError::Conflict(err.to_string())
    }
}

/// Rows a booking transition depends on.
#[derive(Debug)]
pub struct BookingSnapshot<'a> {
    pub booking: &'a Booking,
    pub room: &'a Room,
    pub boarder: &'a Boarder,
    /// Other confirmed/active bookings of the same room
    pub holding: &'a [Booking],
    /// Boarders assigned to the room, not counting this booking's boarder
    pub occupants: i64,
}

/// Rows to write back. `None` means unchanged.
#[derive(Debug, Clone)]
pub struct BookingPlan {
    pub booking: Booking,
    pub boarder: Option<Boarder>,
    pub room: Option<Room>,
}

pub fn plan_booking_transition(
    snapshot: BookingSnapshot<'_>,
    target: BookingStatus,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<BookingPlan, LifecycleError> {
    let BookingSnapshot {
        booking,
        room,
        boarder,
        holding,
        occupants,
    } = snapshot;

    if !booking.status.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition {
            entity: "booking",
            from: booking.status.to_string(),
            to: target.to_string(),
        });
    }

    let mut plan = BookingPlan {
        booking: Booking {
            status: target,
            updated_at: now,
            ..booking.clone()
        },
        boarder: None,
        room: None,
    };

    match target {
        BookingStatus::Confirmed => {
            if !room.is_bookable() {
                return Err(LifecycleError::RoomUnavailable(room.room_number.clone()));
            }
            let overlapping = holding
                .iter()
                .filter(|other| other.id != booking.id && other.status.holds_room() && other.overlaps(booking))
                .count() as i64;
            if overlapping >= i64::from(room.capacity) {
                return Err(LifecycleError::RoomFull(room.room_number.clone()));
            }
        }
        BookingStatus::Active => {
            if !room.is_bookable() {
                return Err(LifecycleError::RoomUnavailable(room.room_number.clone()));
            }
            if matches!(boarder.room_id, Some(current) if current != room.id) {
                return Err(LifecycleError::BoarderHasRoom(boarder.name.clone()));
            }
            if occupants >= i64::from(room.capacity) {
                return Err(LifecycleError::RoomFull(room.room_number.clone()));
            }

            plan.boarder = Some(Boarder {
                room_id: Some(room.id),
                is_active: true,
                move_in_date: Some(booking.start_date),
                move_out_date: None,
                updated_at: now,
                ..boarder.clone()
            });

            if occupants + 1 >= i64::from(room.capacity) && room.status == RoomStatus::Available {
                plan.room = Some(Room {
                    status: RoomStatus::Occupied,
                    updated_at: now,
                    ..room.clone()
                });
            }
        }
        BookingStatus::Completed => {
            if boarder.room_id == Some(room.id) {
                let move_out = booking.end_date.unwrap_or(today);
                let move_out = boarder.move_in_date.map_or(move_out, |move_in| move_out.max(move_in));
                plan.boarder = Some(Boarder {
                    room_id: None,
                    is_active: false,
                    move_out_date: Some(move_out),
                    updated_at: now,
                    ..boarder.clone()
                });
            }
            if room.status == RoomStatus::Occupied {
                plan.room = Some(Room {
                    status: RoomStatus::Available,
                    updated_at: now,
                    ..room.clone()
                });
            }
        }
        BookingStatus::Cancelled | BookingStatus::Pending => {}
    }

    Ok(plan)
}

pub fn plan_payment_transition(
    payment: &Payment,
    target: PaymentStatus,
    paid_date: Option<NaiveDate>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Payment, LifecycleError> {
    if !payment.status.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition {
            entity: "payment",
            from: payment.status.to_string(),
            to: target.to_string(),
        });
    }

    let paid_date = match target {
        PaymentStatus::Paid => Some(paid_date.unwrap_or(today)),
        _ => payment.paid_date,
    };

    Ok(Payment {
        status: target,
        paid_date,
        updated_at: now,
        ..payment.clone()
    })
}

pub fn plan_maintenance_transition(
    request: &MaintenanceRequest,
    target: MaintenanceStatus,
    now: DateTime<Utc>,
) -> Result<MaintenanceRequest, LifecycleError> {
    if !request.status.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition {
            entity: "maintenance request",
            from: request.status.to_string(),
            to: target.to_string(),
        });
    }

    let completed_at = match target {
        MaintenanceStatus::Completed => Some(now),
        _ => request.completed_at,
    };

    Ok(MaintenanceRequest {
        status: target,
        completed_at,
        updated_at: now,
        ..request.clone()
    })
}
