//! Unit tests for choice label translation.

use shipment_watch::models::command::CommandToken;
use shipment_watch::reconcile::translator::{labels_for, translate, CHOICE_TABLE};
use shipment_watch::AppError;

#[test]
fn offered_labels_translate_to_their_tokens() {
    let cases = [
        ("Retry payment", CommandToken::RetryPayment),
        ("Wait out the weather", CommandToken::WaitOutWeather),
        ("Pay expedited processing fee", CommandToken::PayExpeditedFee),
        ("Let AI monitor and wait", CommandToken::AiMonitorAndWait),
        ("Hand over to a human operator", CommandToken::HandOverToHitl),
        ("Expedite with premium service", CommandToken::ExpediteService),
    ];
    for (label, token) in cases {
        assert_eq!(translate(label).unwrap(), token, "label {label:?}");
    }
}

#[test]
fn matching_ignores_case_and_padding() {
    assert_eq!(
        translate("  reroute SHIPMENT ").unwrap(),
        CommandToken::RerouteShipment
    );
}

#[test]
fn canonical_token_names_are_accepted() {
    assert_eq!(
        translate("NOTIFY_ALL_PARTIES").unwrap(),
        CommandToken::NotifyAllParties
    );
}

#[test]
fn unknown_label_fails_without_fallback() {
    let err = translate("Teleport the parcel").unwrap_err();
    assert!(
        matches!(err, AppError::UnknownChoice(ref label) if label == "Teleport the parcel"),
        "got {err:?}"
    );
    assert!(matches!(translate(""), Err(AppError::UnknownChoice(_))));
}

#[test]
fn cancel_labels_map_to_a_terminal_token() {
    assert!(translate("Cancel order").unwrap().is_terminal());
    assert!(translate("Cancel delivery").unwrap().is_terminal());
    assert!(translate("Return shipment").unwrap().is_terminal());
    assert!(!translate("Return to depot").unwrap().is_terminal());
}

#[test]
fn labels_for_lists_every_alias() {
    let labels = labels_for(CommandToken::CancelOrder);
    assert!(labels.contains(&"Cancel order"));
    assert!(labels.contains(&"Cancel delivery"));
}

#[test]
fn table_covers_every_token() {
    for token in CommandToken::ALL {
        assert!(
            CHOICE_TABLE.iter().any(|(_, candidate)| *candidate == token),
            "{token} has no label"
        );
    }
}
