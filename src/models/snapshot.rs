//! Workflow snapshot as returned by `GET /shipments/{id}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known status codes reported by the fulfillment workflow.
///
/// Snapshots carry the status as a raw string so that codes added by the
/// engine later still decode; use [`WorkflowStatus::from_code`] to classify.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Order accepted, awaiting validation and payment.
    OrderReceived,
    /// Payment settled.
    PaymentReceived,
    /// Stock being allocated in a warehouse.
    WarehouseAllocation,
    /// Goods packed and ready for pickup.
    Packaged,
    /// Carrier picked up the shipment.
    TransportStarted,
    /// Shipment moving between hubs.
    InTransit,
    /// Held at customs.
    CustomsClearance,
    /// Out for last-mile delivery.
    LocalDelivery,
    /// Handed over to the recipient.
    Delivered,
    /// Withdrawn by an operator or by the engine.
    Canceled,
}

impl WorkflowStatus {
    /// Every known status in fulfillment order.
    pub const ALL: [Self; 10] = [
        Self::OrderReceived,
        Self::PaymentReceived,
        Self::WarehouseAllocation,
        Self::Packaged,
        Self::TransportStarted,
        Self::InTransit,
        Self::CustomsClearance,
        Self::LocalDelivery,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Wire representation of the status.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::OrderReceived => "ORDER_RECEIVED",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::WarehouseAllocation => "WAREHOUSE_ALLOCATION",
            Self::Packaged => "PACKAGED",
            Self::TransportStarted => "TRANSPORT_STARTED",
            Self::InTransit => "IN_TRANSIT",
            Self::CustomsClearance => "CUSTOMS_CLEARANCE",
            Self::LocalDelivery => "LOCAL_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Classify a raw status code. `CANCELLED` is accepted as a spelling of
    /// [`WorkflowStatus::Canceled`].
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        if code == "CANCELLED" {
            return Some(Self::Canceled);
        }
        Self::ALL.into_iter().find(|status| status.code() == code)
    }
}

/// One cost/time-impact triple attached to a resolution option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnhancedOption {
    /// Choice label, identical to an entry of `resolution_options`.
    pub option: String,
    /// Cost of taking this option, in the engine's currency.
    #[serde(default)]
    pub cost: Option<f64>,
    /// Free-form time impact, e.g. `"+2 days"`.
    #[serde(default)]
    pub time_impact: Option<String>,
}

/// Pending decision descriptor (`current_error`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDescriptor {
    /// Stable cause code.
    pub reason: String,
    /// Human-readable description.
    #[serde(default)]
    pub details: String,
    /// Ordered choice labels; empty means the descriptor is informational.
    #[serde(default)]
    pub resolution_options: Vec<String>,
    /// Labels enriched with cost and time impact.
    #[serde(default)]
    pub enhanced_options: Option<Vec<EnhancedOption>>,
    /// Estimated ETA impact as reported by the engine.
    #[serde(default)]
    pub eta_impact: Option<Value>,
    /// Scenario-specific hints such as remaining backup capacity.
    #[serde(flatten)]
    pub hints: Map<String, Value>,
}

impl ErrorDescriptor {
    /// Whether the descriptor asks for an operator decision.
    #[must_use]
    pub fn requires_decision(&self) -> bool {
        !self.resolution_options.is_empty()
    }

    /// Enhanced data for `label`, if the engine supplied any.
    #[must_use]
    pub fn enhanced_for(&self, label: &str) -> Option<&EnhancedOption> {
        self.enhanced_options
            .as_deref()?
            .iter()
            .find(|candidate| candidate.option == label)
    }
}

/// Delivery estimate update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryUpdate {
    /// `ON_TIME`, `DELAYED`, ...
    pub status: String,
    /// Current estimate.
    #[serde(default)]
    pub estimated_delivery_date: Option<String>,
    /// Estimate before the delay.
    #[serde(default)]
    pub original_eta: Option<String>,
    /// Revised estimate after a delay.
    #[serde(default)]
    pub new_eta: Option<String>,
    /// Cause code of the delay.
    #[serde(default)]
    pub delay_reason: Option<String>,
    /// Outstanding issue descriptions.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl DeliveryUpdate {
    /// The most recent ETA the update carries.
    #[must_use]
    pub fn effective_eta(&self) -> Option<&str> {
        self.new_eta
            .as_deref()
            .or(self.estimated_delivery_date.as_deref())
    }

    /// Whether the update reports a delay.
    #[must_use]
    pub fn is_delayed(&self) -> bool {
        self.status.eq_ignore_ascii_case("DELAYED")
    }
}

/// Terminal cost/time report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentSummary {
    /// Total cost incurred by the operator's decisions.
    #[serde(default)]
    pub total_cost: Option<f64>,
    /// Hours saved compared to the default resolution path.
    #[serde(default)]
    pub time_saved_hours: Option<f64>,
    /// Whether the downstream production line had to stop.
    #[serde(default)]
    pub production_line_stopped: Option<bool>,
    /// Any further figures the engine reports.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShipmentSummary {
    /// One-line human rendering of the summary.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(cost) = self.total_cost {
            parts.push(format!("total cost ${cost:.2}"));
        }
        if let Some(hours) = self.time_saved_hours {
            parts.push(format!("time saved {hours:.1}h"));
        }
        if let Some(stopped) = self.production_line_stopped {
            parts.push(if stopped {
                "production line stopped".to_owned()
            } else {
                "production line kept running".to_owned()
            });
        }
        if parts.is_empty() {
            "no figures reported".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// Full remote state as of one fetch. Never mutated after decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSnapshot {
    /// Raw status code.
    pub status: String,
    /// Pending decision, present only while the workflow is blocked.
    #[serde(default)]
    pub current_error: Option<ErrorDescriptor>,
    /// Latest delivery estimate.
    #[serde(default)]
    pub delivery_update: Option<DeliveryUpdate>,
    /// Terminal-only cost/time report.
    #[serde(default)]
    pub summary: Option<ShipmentSummary>,
    /// Whether the engine has paused the workflow.
    #[serde(default)]
    pub is_paused: bool,
}

impl WorkflowSnapshot {
    /// Snapshot with only a status set.
    #[must_use]
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            current_error: None,
            delivery_update: None,
            summary: None,
            is_paused: false,
        }
    }

    /// Attach a pending decision descriptor.
    #[must_use]
    pub fn with_error(mut self, error: ErrorDescriptor) -> Self {
        self.current_error = Some(error);
        self
    }
}
