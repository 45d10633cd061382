//! Unit tests for the status-to-progress mapping.

use shipment_watch::reconcile::progress::{
    ProgressMapper, ProgressStep, StatusMapping, Terminal, STAGES,
};

fn mapper() -> ProgressMapper {
    ProgressMapper::new("CRITICAL_HALT")
}

fn stage(index: usize) -> StatusMapping {
    StatusMapping::Known {
        step: Some(ProgressStep::Stage(index)),
        terminal: None,
    }
}

#[test]
fn statuses_map_onto_the_stage_track() {
    let mapper = mapper();
    assert_eq!(mapper.map_status("ORDER_RECEIVED"), stage(0));
    assert_eq!(mapper.map_status("PAYMENT_RECEIVED"), stage(1));
    assert_eq!(mapper.map_status("WAREHOUSE_ALLOCATION"), stage(2));
    assert_eq!(mapper.map_status("PACKAGED"), stage(2));
    assert_eq!(mapper.map_status("TRANSPORT_STARTED"), stage(3));
    assert_eq!(mapper.map_status("IN_TRANSIT"), stage(3));
    assert_eq!(mapper.map_status("CUSTOMS_CLEARANCE"), stage(4));
    assert_eq!(mapper.map_status("LOCAL_DELIVERY"), stage(5));
}

#[test]
fn delivered_is_the_last_stage_and_terminal() {
    assert_eq!(
        mapper().map_status("DELIVERED"),
        StatusMapping::Known {
            step: Some(ProgressStep::Stage(STAGES.len() - 1)),
            terminal: Some(Terminal::Delivered),
        }
    );
}

#[test]
fn both_cancel_spellings_leave_the_track() {
    let expected = StatusMapping::Known {
        step: Some(ProgressStep::Cancelled),
        terminal: Some(Terminal::Cancelled),
    };
    assert_eq!(mapper().map_status("CANCELED"), expected);
    assert_eq!(mapper().map_status("CANCELLED"), expected);
}

#[test]
fn critical_halt_keeps_the_step_and_stops() {
    assert_eq!(
        mapper().map_status("CRITICAL_HALT"),
        StatusMapping::Known {
            step: None,
            terminal: Some(Terminal::Halted),
        }
    );
}

#[test]
fn halt_code_is_configurable() {
    let mapper = ProgressMapper::new("DEADLINE_EXCEEDED");
    assert_eq!(mapper.critical_halt_status(), "DEADLINE_EXCEEDED");
    assert_eq!(mapper.map_status("CRITICAL_HALT"), StatusMapping::Unknown);
    assert!(matches!(
        mapper.map_status("DEADLINE_EXCEEDED"),
        StatusMapping::Known {
            terminal: Some(Terminal::Halted),
            ..
        }
    ));
}

#[test]
fn unknown_and_empty_codes_are_unknown() {
    assert_eq!(mapper().map_status("TELEPORTED"), StatusMapping::Unknown);
    assert_eq!(mapper().map_status(""), StatusMapping::Unknown);
    assert_eq!(mapper().map_status("packaged"), StatusMapping::Unknown);
}

#[test]
fn out_of_range_stage_has_a_fallback_label() {
    assert_eq!(ProgressStep::Stage(42).label(), "Unknown");
    assert_eq!(ProgressStep::Stage(3).label(), "Transport");
}
