use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::{
    Boarder, Booking, BookingStatus, MaintenancePriority, MaintenanceRequest, Payment, PaymentStatus, Room,
    RoomStatus,
};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoomCounts {
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub maintenance: i64,
    pub beds: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PaymentTotals {
    pub pending: i64,
    pub overdue: i64,
    pub paid: i64,
    pub outstanding_amount: Decimal,
    pub collected_amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MaintenanceCounts {
    pub open: i64,
    pub urgent: i64,
}

/// Landlord dashboard figures for one tenant
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub rooms: RoomCounts,
    /// Assigned boarders over total beds, 0..=1 with two decimals
    pub occupancy_rate: Decimal,
    pub active_boarders: i64,
    pub pending_bookings: i64,
    pub payments: PaymentTotals,
    pub maintenance: MaintenanceCounts,
}

impl DashboardSummary {
    pub fn compute(
        rooms: &[Room],
        boarders: &[Boarder],
        bookings: &[Booking],
        payments: &[Payment],
        maintenance: &[MaintenanceRequest],
    ) -> Self {
        let mut summary = DashboardSummary::default();

        for room in rooms {
            summary.rooms.total += 1;
            summary.rooms.beds += i64::from(room.capacity);
            match room.status {
                RoomStatus::Available => summary.rooms.available += 1,
                RoomStatus::Occupied => summary.rooms.occupied += 1,
                RoomStatus::Maintenance => summary.rooms.maintenance += 1,
            }
        }

        summary.active_boarders = boarders.iter().filter(|b| b.is_active).count() as i64;
        let assigned = boarders.iter().filter(|b| b.room_id.is_some()).count() as i64;
        if summary.rooms.beds > 0 {
            summary.occupancy_rate = (Decimal::from(assigned) / Decimal::from(summary.rooms.beds)).round_dp(2);
        }

        summary.pending_bookings = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .count() as i64;

        for payment in payments {
            match payment.status {
                PaymentStatus::Pending => summary.payments.pending += 1,
                PaymentStatus::Overdue => summary.payments.overdue += 1,
                PaymentStatus::Paid => {
                    summary.payments.paid += 1;
                    summary.payments.collected_amount =
                        summary.payments.collected_amount.saturating_add(payment.amount);
                }
                PaymentStatus::Cancelled => {}
            }
            if payment.status.is_outstanding() {
                summary.payments.outstanding_amount =
                    summary.payments.outstanding_amount.saturating_add(payment.amount);
            }
        }

        for request in maintenance.iter().filter(|m| m.status.is_open()) {
            summary.maintenance.open += 1;
            if request.priority == MaintenancePriority::Urgent {
                summary.maintenance.urgent += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{MaintenanceStatus, PaymentType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn empty_tenant_has_zero_occupancy() {
        let summary = DashboardSummary::compute(&[], &[], &[], &[], &[]);
        assert_eq!(summary.occupancy_rate, Decimal::ZERO);
        assert_eq!(summary.rooms.total, 0);
    }

    #[test]
    fn totals_payments_and_occupancy() {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            property_id: Uuid::new_v4(),
            room_number: "1".to_string(),
            floor: 1,
            capacity: 4,
            monthly_rate: Decimal::new(3000, 0),
            amenities: vec![],
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        let boarder = Boarder {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            user_id: None,
            room_id: Some(room.id),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            emergency_contact: None,
            is_active: true,
            move_in_date: None,
            move_out_date: None,
            created_at: now,
            updated_at: now,
        };
        let payment = |status, cents| Payment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            boarder_id: boarder.id,
            amount: Decimal::new(cents, 2),
            payment_type: PaymentType::Rent,
            status,
            due_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            paid_date: None,
            description: None,
            created_at: now,
            updated_at: now,
        };
        let payments = vec![
            payment(PaymentStatus::Pending, 100_00),
            payment(PaymentStatus::Overdue, 50_50),
            payment(PaymentStatus::Paid, 300_00),
            payment(PaymentStatus::Cancelled, 999_00),
        ];
        let urgent = MaintenanceRequest {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            room_id: room.id,
            boarder_id: None,
            title: "No water".to_string(),
            description: "Pipes".to_string(),
            priority: MaintenancePriority::Urgent,
            status: MaintenanceStatus::InProgress,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let summary = DashboardSummary::compute(
            std::slice::from_ref(&room),
            std::slice::from_ref(&boarder),
            &[],
            &payments,
            std::slice::from_ref(&urgent),
        );

        assert_eq!(summary.rooms.beds, 4);
        assert_eq!(summary.occupancy_rate, Decimal::new(25, 2));
        assert_eq!(summary.payments.outstanding_amount, Decimal::new(150_50, 2));
        assert_eq!(summary.payments.collected_amount, Decimal::new(300_00, 2));
        assert_eq!(summary.payments.pending, 1);
        assert_eq!(summary.maintenance.urgent, 1);
    }

    #[test]
    fn payment_totals_saturate() {
        let now = Utc::now();
        let huge = Payment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            boarder_id: Uuid::new_v4(),
            amount: Decimal::MAX,
            payment_type: PaymentType::Rent,
            status: PaymentStatus::Paid,
            due_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            paid_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            description: None,
            created_at: now,
            updated_at: now,
        };
        let payments = vec![
            huge.clone(),
            huge.clone(),
            Payment {
                status: PaymentStatus::Pending,
                ..huge.clone()
            },
            Payment {
                status: PaymentStatus::Overdue,
                ..huge
            },
        ];

        let summary = DashboardSummary::compute(&[], &[], &[], &payments, &[]);
        assert_eq!(summary.payments.collected_amount, Decimal::MAX);
        assert_eq!(summary.payments.outstanding_amount, Decimal::MAX);
        assert_eq!(summary.payments.paid, 2);
    }
}
