use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use festa_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     --------------------------------------------------------

/// The lifecycle state of an order. Stored in the database as TEXT using the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum OrderStatusType {
    /// The order has been created and no deposit has been confirmed yet.
    Pending,
    /// The deposit payment has been confirmed by the payment gateway.
    Paid,
    /// The provider has committed to the order.
    Accepted,
    /// The provider has started work on the order.
    InProgress,
    /// The order has been fulfilled. Terminal.
    Completed,
    /// The buyer has withdrawn the order. Terminal.
    Cancelled,
    /// The provider or an admin has declined the order. Terminal.
    Rejected,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Accepted => write!(f, "Accepted"),
            OrderStatusType::InProgress => write!(f, "InProgress"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Rejected => write!(f, "Rejected"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Accepted" => Ok(Self::Accepted),
            "InProgress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentType       --------------------------------------------------------

/// What a ledger entry represents: money coming in (a deposit) or going back out (a refund).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum PaymentType {
    Deposit,
    Refund,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Deposit => write!(f, "Deposit"),
            PaymentType::Refund => write!(f, "Refund"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(Self::Deposit),
            "Refund" => Ok(Self::Refund),
            s => Err(ConversionError(format!("Invalid payment type: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      --------------------------------------------------------

/// The settlement state of a ledger entry.
///
/// Legal transitions are `Pending → Success`, `Pending → Failed` and `Success → Refunded`. Every
/// other change is rejected by the storage layer, which is what makes webhook replays harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     GatewayKind       --------------------------------------------------------

/// Which payment processor a ledger entry went through. Paymob is the only one wired up today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum GatewayKind {
    Paymob,
}

impl Default for GatewayKind {
    fn default() -> Self {
        Self::Paymob
    }
}

impl Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayKind::Paymob => write!(f, "Paymob"),
        }
    }
}

impl FromStr for GatewayKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paymob" => Ok(Self::Paymob),
            s => Err(ConversionError(format!("Invalid payment gateway: {s}"))),
        }
    }
}

//--------------------------------------        Role           --------------------------------------------------------

/// The resolved role of the identity attached to a request. Also used to attribute terminal order
/// transitions (`rejected_by`, `completed_by`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Buyer,
    Provider,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Buyer => write!(f, "buyer"),
            Role::Provider => write!(f, "provider"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "buyer" => Ok(Self::Buyer),
            "provider" => Ok(Self::Provider),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        Actor          --------------------------------------------------------

/// The identity acting on a request: a resolved user id plus its role. The upstream auth layer
/// produces this; the engine re-checks resource ownership against it on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn buyer(id: i64) -> Self {
        Self::new(id, Role::Buyer)
    }

    pub fn provider(id: i64) -> Self {
        Self::new(id, Role::Provider)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.role, self.id)
    }
}

//--------------------------------------        Order          --------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub provider_id: i64,
    pub package_id: i64,
    pub status: OrderStatusType,
    /// The package price at the time it was last read from the catalog.
    pub total_amount: Money,
    /// 10% of the total, computed when the buyer requests a deposit. Zero before that.
    pub deposit_amount: Money,
    /// What remains payable after the deposit. Equal to the total before any deposit.
    pub remaining_amount: Money,
    pub event_date: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Role>,
    pub rejected_by_id: Option<i64>,
    pub completed_by: Option<Role>,
    pub completed_by_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True when the actor is the buyer that placed this order.
    pub fn is_buyer(&self, actor: &Actor) -> bool {
        actor.role == Role::Buyer && actor.id == self.buyer_id
    }

    /// True when the actor is the provider this order was placed with.
    pub fn is_provider(&self, actor: &Actor) -> bool {
        actor.role == Role::Provider && actor.id == self.provider_id
    }

    /// Owners and admins may read an order; everyone else gets `Forbidden`.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.is_buyer(actor) || self.is_provider(actor)
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order #{} ({}): buyer {}, provider {}, package {}, total {}",
            self.id, self.status, self.buyer_id, self.provider_id, self.package_id, self.total_amount
        )
    }
}

//--------------------------------------       NewOrder        --------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub provider_id: i64,
    /// The catalog package being booked. The order total is read from the catalog, never the client.
    pub package_id: i64,
    pub event_date: NaiveDate,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn new(buyer_id: i64, provider_id: i64, package_id: i64, event_date: NaiveDate) -> Self {
        Self {
            buyer_id,
            provider_id,
            package_id,
            event_date,
            latitude: None,
            longitude: None,
            address: None,
            notes: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64, address: String) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self.address = Some(address);
        self
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }
}

//--------------------------------------       Payment         --------------------------------------------------------

/// One entry in the payment ledger. A row is a single financial attempt against an order and is
/// never re-purposed: a failed deposit and its retry are two rows, a refund is its own row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub gateway: GatewayKind,
    pub amount: Money,
    /// Gateway-side transaction id. Only known once the gateway has reported an outcome.
    pub gateway_txn_id: Option<String>,
    /// Gateway-side order id, used to correlate webhook callbacks with this attempt.
    pub gateway_order_id: Option<String>,
    /// Serialized request payload kept for audit.
    pub request_data: Option<String>,
    /// Serialized gateway response kept for audit.
    pub response_data: Option<String>,
    /// Failure reason, or the flag on a refund row whose gateway call needs manual follow-up.
    pub error_message: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Payment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} for order #{} ({})", self.payment_type, self.amount, self.order_id, self.status)
    }
}

//--------------------------------------      NewPayment       --------------------------------------------------------

/// The fields a caller supplies when a new ledger row is written. The storage layer decides the
/// initial status: deposit attempts start `Pending`, refund rows are written `Refunded` outright.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub payment_type: PaymentType,
    pub gateway: GatewayKind,
    pub amount: Money,
    pub gateway_txn_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub request_data: Option<String>,
    pub response_data: Option<String>,
    pub error_message: Option<String>,
}

impl NewPayment {
    pub fn deposit(order_id: i64, amount: Money) -> Self {
        Self::new(order_id, PaymentType::Deposit, amount)
    }

    pub fn refund(order_id: i64, amount: Money) -> Self {
        Self::new(order_id, PaymentType::Refund, amount)
    }

    fn new(order_id: i64, payment_type: PaymentType, amount: Money) -> Self {
        Self {
            order_id,
            payment_type,
            gateway: GatewayKind::default(),
            amount,
            gateway_txn_id: None,
            gateway_order_id: None,
            request_data: None,
            response_data: None,
            error_message: None,
        }
    }

    pub fn with_gateway_txn_id(mut self, txn_id: String) -> Self {
        self.gateway_txn_id = Some(txn_id);
        self
    }

    pub fn with_gateway_order_id(mut self, order_id: String) -> Self {
        self.gateway_order_id = Some(order_id);
        self
    }

    pub fn with_request_data(mut self, data: String) -> Self {
        self.request_data = Some(data);
        self
    }

    pub fn with_response_data(mut self, data: String) -> Self {
        self.response_data = Some(data);
        self
    }

    pub fn with_error_message(mut self, message: String) -> Self {
        self.error_message = Some(message);
        self
    }
}

//--------------------------------------       Package         --------------------------------------------------------

/// A catalog entry. The engine only ever reads these; catalog management lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}
