//! Canonical command tokens understood by the workflow engine.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Backend-recognized identifier for an operator decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandToken {
    /// Escalate a payment problem to technical support.
    SendToTechSupport,
    /// Run payment verification again.
    RetryPayment,
    /// Continue once the payment system recovers.
    ResumeWhenReady,
    /// Withdraw the order.
    CancelOrder,
    /// Accept a changed price.
    AcceptNewPrice,
    /// Replace unavailable items.
    UpdateOrder,
    /// Change the ordered quantity.
    AdjustQuantity,
    /// Allocate stock from another warehouse.
    AllocateDifferent,
    /// Hold until stock is replenished.
    WaitForStock,
    /// Notify customers and refund them.
    NoticeCustomersRefund,
    /// Hold until the weather clears.
    WaitOutWeather,
    /// Send the shipment along another route.
    RerouteShipment,
    /// Supply missing customs paperwork.
    ProvideDocumentation,
    /// Pay for expedited customs processing.
    PayExpeditedFee,
    /// Accept the announced delay.
    AcceptDelay,
    /// Send the shipment back to the sender.
    ReturnShipment,
    /// Agree a new delivery slot with the recipient.
    ScheduleNewTime,
    /// Leave the parcel at a safe location.
    LeaveSafeLocation,
    /// Bring the parcel back to the local depot.
    ReturnToDepot,
    /// Take no action.
    DoNothing,
    /// Inform affected customers.
    InformCustomers,
    /// Rearrange downstream logistics.
    RearrangeLogistics,
    /// Let the automated agent keep monitoring.
    AiMonitorAndWait,
    /// Hand the case to a human operator.
    HandOverToHitl,
    /// Wait for a transport problem to clear.
    WaitForResolution,
    /// Upgrade to a premium transport service.
    ExpediteService,
    /// Notify every party and adjust schedules.
    NotifyAllParties,
    /// Continue on the current schedule.
    NoActionNeeded,
}

impl CommandToken {
    /// Every canonical token.
    pub const ALL: [Self; 28] = [
        Self::SendToTechSupport,
        Self::RetryPayment,
        Self::ResumeWhenReady,
        Self::CancelOrder,
        Self::AcceptNewPrice,
        Self::UpdateOrder,
        Self::AdjustQuantity,
        Self::AllocateDifferent,
        Self::WaitForStock,
        Self::NoticeCustomersRefund,
        Self::WaitOutWeather,
        Self::RerouteShipment,
        Self::ProvideDocumentation,
        Self::PayExpeditedFee,
        Self::AcceptDelay,
        Self::ReturnShipment,
        Self::ScheduleNewTime,
        Self::LeaveSafeLocation,
        Self::ReturnToDepot,
        Self::DoNothing,
        Self::InformCustomers,
        Self::RearrangeLogistics,
        Self::AiMonitorAndWait,
        Self::HandOverToHitl,
        Self::WaitForResolution,
        Self::ExpediteService,
        Self::NotifyAllParties,
        Self::NoActionNeeded,
    ];

    /// Wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendToTechSupport => "SEND_TO_TECH_SUPPORT",
            Self::RetryPayment => "RETRY_PAYMENT",
            Self::ResumeWhenReady => "RESUME_WHEN_READY",
            Self::CancelOrder => "CANCEL_ORDER",
            Self::AcceptNewPrice => "ACCEPT_NEW_PRICE",
            Self::UpdateOrder => "UPDATE_ORDER",
            Self::AdjustQuantity => "ADJUST_QUANTITY",
            Self::AllocateDifferent => "ALLOCATE_DIFFERENT",
            Self::WaitForStock => "WAIT_FOR_STOCK",
            Self::NoticeCustomersRefund => "NOTICE_CUSTOMERS_REFUND",
            Self::WaitOutWeather => "WAIT_OUT_WEATHER",
            Self::RerouteShipment => "REROUTE_SHIPMENT",
            Self::ProvideDocumentation => "PROVIDE_DOCUMENTATION",
            Self::PayExpeditedFee => "PAY_EXPEDITED_FEE",
            Self::AcceptDelay => "ACCEPT_DELAY",
            Self::ReturnShipment => "RETURN_SHIPMENT",
            Self::ScheduleNewTime => "SCHEDULE_NEW_TIME",
            Self::LeaveSafeLocation => "LEAVE_SAFE_LOCATION",
            Self::ReturnToDepot => "RETURN_TO_DEPOT",
            Self::DoNothing => "DO_NOTHING",
            Self::InformCustomers => "INFORM_CUSTOMERS",
            Self::RearrangeLogistics => "REARRANGE_LOGISTICS",
            Self::AiMonitorAndWait => "AI_MONITOR_AND_WAIT",
            Self::HandOverToHitl => "HAND_OVER_TO_HITL",
            Self::WaitForResolution => "WAIT_FOR_RESOLUTION",
            Self::ExpediteService => "EXPEDITE_SERVICE",
            Self::NotifyAllParties => "NOTIFY_ALL_PARTIES",
            Self::NoActionNeeded => "NO_ACTION_NEEDED",
        }
    }

    /// Terminal tokens withdraw the instance instead of resuming it.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CancelOrder | Self::ReturnShipment)
    }
}

impl Display for CommandToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
