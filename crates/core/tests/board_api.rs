mod common;

use common::*;
use electro_bench_core::component::KindSpec;
use electro_bench_core::netlist::ElementKind;
use electro_bench_core::{Board, BoardError, BoardLayout, CircuitError, MnaSolver};

#[test]
fn unknown_identifiers_fail_loudly() {
    let mut board = standard_board();
    assert_eq!(board.remove_cable("nope"), Err(BoardError::UnknownCable("nope".into())));
    assert_eq!(
        board.place_cable("c1", "battery.v", "nowhere", false),
        Err(BoardError::UnknownPort("nowhere".into()))
    );
    assert_eq!(board.get_voltage("nowhere"), Err(BoardError::UnknownPort("nowhere".into())));
    assert!(matches!(board.component("ghost"), Err(BoardError::UnknownComponent(_))));
    assert!(matches!(board.set_connected("ghost", false), Err(BoardError::UnknownComponent(_))));
}

#[test]
fn duplicate_cable_ids_are_rejected() {
    let mut board = standard_board();
    board.place_cable("c1", "battery.v", "bulb1.a", false).unwrap();
    assert_eq!(
        board.place_cable("c1", "bulb1.b", "battery.g", false),
        Err(BoardError::DuplicateCable("c1".into()))
    );
    board.remove_cable("c1").unwrap();
    board.place_cable("c1", "bulb1.b", "battery.g", false).unwrap();
}

#[test]
fn cable_ids_cannot_shadow_component_elements() {
    let mut board = standard_board();
    for id in ["bulb1", "battery.sense", "relay.coil"] {
        assert_eq!(
            board.place_cable(id, "battery.v", "bulb1.a", false),
            Err(BoardError::DuplicateComponent(id.into()))
        );
    }
    board.place_cable("bulb1x", "battery.v", "bulb1.a", false).unwrap();
    board.place_cable("c2", "bulb1.b", "battery.g", false).unwrap();
    board.solve_circuit().unwrap();
    approx::assert_abs_diff_eq!(volts(&board, "bulb1.a"), 12.0, epsilon = 0.02);
}

#[test]
fn typed_access_checks_the_kind() {
    let mut board = standard_board();
    assert_eq!(
        board.relay("battery").map(|_| ()),
        Err(BoardError::KindMismatch { name: "battery".into(), expected: "relay" })
    );
    assert!(matches!(board.set_connected("relay", false), Err(BoardError::KindMismatch { .. })));
    assert!(matches!(board.set_wiper("bulb1", 3.0), Err(BoardError::KindMismatch { .. })));
    assert!(board.lightbulb("bulb1").is_ok());
    assert!(board.component("c9").is_err());
}

#[test]
fn supply_voltage_is_validated() {
    let mut board = standard_board();
    assert_eq!(
        board.set_board_voltage(f64::NAN).map_err(|e| matches!(e, BoardError::Circuit(CircuitError::InvalidVoltage(_)))),
        Err(true)
    );
    board.set_board_voltage(6.0).unwrap();
    assert_eq!(board.board_voltage(), 6.0);
    assert_eq!(board.supply_voltage(), 6.0);
    assert!(Board::new(BoardLayout::standard().with_board_voltage(f64::INFINITY), MnaSolver::default()).is_err());
}

#[test]
fn layout_errors_surface_from_new() {
    let layout = BoardLayout::new()
        .component("battery", KindSpec::Battery)
        .component("battery", KindSpec::Diode);
    assert!(matches!(Board::new(layout, MnaSolver::default()), Err(BoardError::DuplicateComponent(_))));

    let layout = BoardLayout::new().add("r1", KindSpec::Resistor(10.0), &["n1"]);
    assert!(matches!(
        Board::new(layout, MnaSolver::default()),
        Err(BoardError::ArityMismatch { expected: 2, actual: 1, .. })
    ));

    let layout = BoardLayout::new().component("r1", KindSpec::Resistor(0.0));
    assert_eq!(
        Board::new(layout, MnaSolver::default()).err(),
        Some(BoardError::Circuit(CircuitError::InvalidResistance(0.0)))
    );
}

#[test]
fn shared_ports_join_components() {
    let layout = BoardLayout::new()
        .add("battery", KindSpec::Battery, &["plus", "minus", "sense"])
        .add("r1", KindSpec::Resistor(10.0), &["plus", "mid"])
        .add("r2", KindSpec::Resistor(30.0), &["mid", "minus"])
        .with_board_voltage(8.0);
    let mut board = Board::new(layout, MnaSolver::default()).unwrap();
    assert_eq!(board.port_ids().count(), 4);
    board.solve_circuit().unwrap();
    approx::assert_abs_diff_eq!(volts(&board, "mid"), 6.0, epsilon = 1e-3);
}

#[test]
fn faulty_cable_adds_resistance() {
    let mut board = standard_board();
    board.place_cable("bad", "battery.v", "bulb1.a", true).unwrap();
    board.place_cable("c2", "bulb1.b", "battery.g", false).unwrap();
    let netlist = board.get_circuit();
    match netlist.element("bad").map(|e| &e.kind) {
        Some(ElementKind::Resistor { ohms, .. }) => assert_eq!(*ohms, board.config().faulty_cable_resistance),
        other => panic!("expected a resistor, got {other:?}"),
    }
    board.solve_circuit().unwrap();
    approx::assert_abs_diff_eq!(volts(&board, "bulb1.a"), 12.0 * 6.0 / 26.0, epsilon = 0.01);
}

#[test]
fn reset_clears_traversal_state() {
    let mut board = standard_board();
    wire(&mut board, &[("c1", "battery.v", "bulb1.a"), ("c2", "bulb1.b", "battery.g")]);
    board.get_circuit();
    assert!(board.port("bulb1.a").unwrap().connected);
    board.reset();
    assert!(board.graph().ports().iter().all(|p| !p.connected));
    assert!(board.graph().components().all(|(_, c)| c.pending_updates() == 0));
}
