pub mod lifecycle;
pub mod summary;

pub use lifecycle::{
    plan_booking_transition, plan_maintenance_transition, plan_payment_transition, BookingPlan, BookingSnapshot,
    LifecycleError,
};
pub use summary::DashboardSummary;
