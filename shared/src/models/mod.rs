//! Domain models shared across the workspace

mod complaint;
mod order;
mod payment;
mod table;

pub use complaint::{Complaint, ComplaintStatus};
pub use order::{
    CustomerInfo, DiscountKind, DiscountRecord, ItemStatus, Order, OrderItem, OrderStatus,
    OrderType, PaymentMethod, PaymentStatus, SplitBreakdown,
};
pub use payment::PaymentEntry;
pub use table::{DiningTable, SessionStatus, TableSession, TableStatus};
