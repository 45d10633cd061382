//! Status code to progress step mapping.

use serde::{Deserialize, Serialize};

use crate::models::snapshot::WorkflowStatus;

/// Display names of the fulfillment stages, in order.
pub const STAGES: [&str; 7] = [
    "Order Received",
    "Payment",
    "Warehouse",
    "Transport",
    "Customs",
    "Local Delivery",
    "Delivered",
];

/// Position of the workflow on the stage track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    /// Index into [`STAGES`].
    Stage(usize),
    /// Withdrawn; off the track entirely.
    Cancelled,
}

impl ProgressStep {
    /// Display name of the step.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Stage(index) => STAGES.get(index).copied().unwrap_or("Unknown"),
            Self::Cancelled => "Cancelled",
        }
    }
}

/// How a terminal status ends the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Shipment delivered.
    Delivered,
    /// Shipment withdrawn.
    Cancelled,
    /// Engine-imposed deadline passed; critical halt.
    Halted,
}

/// Result of mapping one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMapping {
    /// Known status. `step` is `None` when the status leaves the displayed
    /// step untouched (critical halt).
    Known {
        /// Step to display.
        step: Option<ProgressStep>,
        /// Set when polling must stop after this snapshot.
        terminal: Option<Terminal>,
    },
    /// Status absent from the table.
    Unknown,
}

/// Fixed table from status codes to progress steps.
#[derive(Debug, Clone)]
pub struct ProgressMapper {
    critical_halt_status: String,
}

impl ProgressMapper {
    /// Mapper recognizing `critical_halt_status` as the halt code.
    #[must_use]
    pub fn new(critical_halt_status: impl Into<String>) -> Self {
        Self {
            critical_halt_status: critical_halt_status.into(),
        }
    }

    /// Code that signals a critical halt.
    #[must_use]
    pub fn critical_halt_status(&self) -> &str {
        &self.critical_halt_status
    }

    /// Map a raw status code.
    #[must_use]
    pub fn map_status(&self, code: &str) -> StatusMapping {
        if code == self.critical_halt_status {
            return StatusMapping::Known {
                step: None,
                terminal: Some(Terminal::Halted),
            };
        }

        let Some(status) = WorkflowStatus::from_code(code) else {
            return StatusMapping::Unknown;
        };

        let stage = |index| StatusMapping::Known {
            step: Some(ProgressStep::Stage(index)),
            terminal: None,
        };

        match status {
            WorkflowStatus::OrderReceived => stage(0),
            WorkflowStatus::PaymentReceived => stage(1),
            WorkflowStatus::WarehouseAllocation | WorkflowStatus::Packaged => stage(2),
            WorkflowStatus::TransportStarted | WorkflowStatus::InTransit => stage(3),
            WorkflowStatus::CustomsClearance => stage(4),
            WorkflowStatus::LocalDelivery => stage(5),
            WorkflowStatus::Delivered => StatusMapping::Known {
                step: Some(ProgressStep::Stage(6)),
                terminal: Some(Terminal::Delivered),
            },
            WorkflowStatus::Canceled => StatusMapping::Known {
                step: Some(ProgressStep::Cancelled),
                terminal: Some(Terminal::Cancelled),
            },
        }
    }
}
