//! Human-readable choice label to canonical command translation.
//!
//! [`CHOICE_TABLE`] is the single mapping for every label the engine offers.
//! Lookups that miss fail with [`AppError::UnknownChoice`]; there is no
//! fallback command.

use crate::models::command::CommandToken;
use crate::{AppError, Result};

/// Every label offered in `resolution_options` / `enhanced_options`.
pub const CHOICE_TABLE: &[(&str, CommandToken)] = &[
    // Payment
    ("Send to tech support", CommandToken::SendToTechSupport),
    ("Retry payment", CommandToken::RetryPayment),
    ("Resume when system is ready", CommandToken::ResumeWhenReady),
    ("Cancel order", CommandToken::CancelOrder),
    // Order validation
    ("Update order with available items", CommandToken::UpdateOrder),
    ("Accept new price", CommandToken::AcceptNewPrice),
    ("Adjust quantity", CommandToken::AdjustQuantity),
    // Warehouse
    ("Allocate from a different warehouse", CommandToken::AllocateDifferent),
    ("Wait for stock", CommandToken::WaitForStock),
    ("Notify customers and refund", CommandToken::NoticeCustomersRefund),
    // Transport
    ("Wait for resolution", CommandToken::WaitForResolution),
    ("Wait out the weather", CommandToken::WaitOutWeather),
    ("Reroute shipment", CommandToken::RerouteShipment),
    ("Expedite with premium service", CommandToken::ExpediteService),
    ("Cancel delivery", CommandToken::CancelOrder),
    // Customs
    ("Provide additional documentation", CommandToken::ProvideDocumentation),
    ("Pay expedited processing fee", CommandToken::PayExpeditedFee),
    ("Accept delay", CommandToken::AcceptDelay),
    ("Return shipment", CommandToken::ReturnShipment),
    // Last mile
    ("Schedule a new delivery time", CommandToken::ScheduleNewTime),
    ("Leave at a safe location", CommandToken::LeaveSafeLocation),
    ("Return to depot", CommandToken::ReturnToDepot),
    // Delays and supply disruptions
    ("Notify all parties and adjust schedules", CommandToken::NotifyAllParties),
    ("No immediate action needed", CommandToken::NoActionNeeded),
    ("Do nothing", CommandToken::DoNothing),
    ("Inform customers", CommandToken::InformCustomers),
    ("Rearrange logistics", CommandToken::RearrangeLogistics),
    ("Let AI monitor and wait", CommandToken::AiMonitorAndWait),
    ("Hand over to a human operator", CommandToken::HandOverToHitl),
];

/// Translate an offered label into its canonical command.
///
/// Matching ignores surrounding whitespace and ASCII case. A canonical token
/// name such as `RETRY_PAYMENT` translates to itself.
///
/// # Errors
///
/// Returns [`AppError::UnknownChoice`] if the label has no mapping.
pub fn translate(label: &str) -> Result<CommandToken> {
    let needle = label.trim();
    CHOICE_TABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(needle))
        .map(|(_, token)| *token)
        .or_else(|| {
            CommandToken::ALL
                .into_iter()
                .find(|token| token.as_str() == needle)
        })
        .ok_or_else(|| AppError::UnknownChoice(needle.to_owned()))
}

/// Labels that translate to `token`.
#[must_use]
pub fn labels_for(token: CommandToken) -> Vec<&'static str> {
    CHOICE_TABLE
        .iter()
        .filter(|(_, candidate)| *candidate == token)
        .map(|(label, _)| *label)
        .collect()
}
