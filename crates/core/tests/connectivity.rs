mod common;

use approx::assert_abs_diff_eq;
use common::*;
use electro_bench_core::components::MultimeterMode;
use electro_bench_core::connectivity::{ConnectivityAnalyzer, Pass};
use electro_bench_core::{Board, MnaSolver};
use proptest::prelude::*;

#[test]
fn unpowered_board_only_solves_the_battery() {
    let mut board = standard_board();
    board.solve_circuit().unwrap();
    assert_abs_diff_eq!(volts(&board, "battery.v"), 12.0, epsilon = 1e-9);
    assert_eq!(volts(&board, "battery.g"), 0.0);
    for port in board.graph().ports().iter().filter(|p| !p.id.starts_with("battery.")) {
        assert!(port.voltage.is_nan(), "{} should be undefined", port.id);
        assert!(!port.connected);
    }
}

#[test]
fn dead_branch_is_excluded() {
    let mut board = standard_board();
    wire(
        &mut board,
        &[
            ("c1", "battery.v", "bulb1.a"),
            ("c2", "bulb1.b", "battery.g"),
            ("c3", "battery.v", "bulb2.a"),
        ],
    );
    board.solve_circuit().unwrap();
    assert!(!volts(&board, "bulb1.a").is_nan());
    assert!(volts(&board, "bulb2.a").is_nan());
    assert!(volts(&board, "bulb2.b").is_nan());
    let netlist = board.get_circuit();
    assert!(netlist.element("c3").is_none());
    assert!(!netlist.mentions("bulb2.a"));
    assert!(netlist.mentions("bulb1.a"));
}

#[test]
fn parallel_branches_are_both_live() {
    let mut board = standard_board();
    wire(
        &mut board,
        &[
            ("c1", "battery.v", "bulb1.a"),
            ("c2", "bulb1.b", "battery.g"),
            ("c3", "battery.v", "bulb2.a"),
            ("c4", "bulb2.b", "battery.g"),
        ],
    );
    board.solve_circuit().unwrap();
    let (a, b) = (board.readings("bulb1").unwrap(), board.readings("bulb2").unwrap());
    assert_abs_diff_eq!(a.current, b.current, epsilon = 1e-9);
    assert!(a.current > 1.0);
}

#[test]
fn potentiometer_ends_only_meet_through_the_wiper() {
    let mut board = standard_board();
    wire(&mut board, &[("c1", "battery.v", "pot.g"), ("c2", "pot.i", "battery.g")]);
    board.set_wiper("pot", 25.0).unwrap();
    board.solve_circuit().unwrap();
    assert!(board.port("pot.h").unwrap().connected);
    assert_abs_diff_eq!(volts(&board, "pot.h"), 3.0, epsilon = 0.01);

    let graph = board.graph();
    let g = graph.port_id("pot.g").unwrap();
    let i = graph.port_id("pot.i").unwrap();
    let h = graph.port_id("pot.h").unwrap();
    assert!(!graph.opposite_ports(g).contains(&i));
    assert!(graph.opposite_ports(h).contains(&g));
    assert!(graph.opposite_ports(h).contains(&i));
}

#[test]
fn flasher_cathode_and_signal_are_not_adjacent() {
    let mut board = standard_board();
    wire(&mut board, &[("c1", "battery.v", "flasher.cathode"), ("c2", "flasher.signal", "battery.g")]);
    board.solve_circuit().unwrap();
    // cathode -> anode -> signal is the only route.
    assert!(board.port("flasher.anode").unwrap().connected);
    let graph = board.graph();
    let cathode = graph.port_id("flasher.cathode").unwrap();
    let signal = graph.port_id("flasher.signal").unwrap();
    assert!(!graph.opposite_ports(cathode).contains(&signal));
}

#[test]
fn ohmmeter_seeds_its_own_pass() {
    let mut board = standard_board();
    wire(&mut board, &[("p1", "multimeter.v", "motor.a"), ("p2", "motor.b", "multimeter.g")]);
    board.set_multimeter_mode("multimeter", MultimeterMode::Resistance).unwrap();
    board.solve_circuit().unwrap();
    assert!(board.port("motor.a").unwrap().connected);
    assert!(!board.port("multimeter.a").unwrap().connected);
    assert_abs_diff_eq!(board.readings("multimeter").unwrap().resistance, 2.0, epsilon = 1e-3);

    board.set_multimeter_mode("multimeter", MultimeterMode::Off).unwrap();
    board.solve_circuit().unwrap();
    assert!(!board.port("motor.a").unwrap().connected);
    assert!(volts(&board, "motor.a").is_nan());
}

#[test]
fn passes_do_not_share_flags() {
    let mut board = standard_board();
    wire(&mut board, &[("c1", "battery.v", "bulb1.a"), ("c2", "bulb1.b", "battery.g")]);
    let graph = board.graph();
    let v = graph.port_id("battery.v").unwrap();
    let g = graph.port_id("battery.g").unwrap();
    let meter_v = graph.port_id("multimeter.v").unwrap();
    let meter_g = graph.port_id("multimeter.g").unwrap();

    let main = Pass::run(graph, v, g);
    let meter = Pass::run(graph, meter_v, meter_g);
    assert!(main.is_clean() && meter.is_clean());
    assert_eq!(main.connected_ports().count(), 4);
    // No route from the meter probes: nothing is marked, least of all the main path.
    assert!(meter.connected_ports().all(|p| p == meter_g));

    let mut graph = graph.clone();
    assert_eq!(ConnectivityAnalyzer::analyze(&mut graph, &[(v, g)]), 4);
    assert_eq!(ConnectivityAnalyzer::analyze(&mut graph, &[]), 0);
}

fn pool() -> Vec<&'static str> {
    vec!["battery.v", "battery.g", "r1.a", "r1.b", "r2.a", "r2.b", "r3.a", "r3.b"]
}

fn cable_set() -> impl Strategy<Value = Vec<(usize, usize)>> {
    let n = pool().len();
    prop::collection::vec((0..n, 0..n).prop_filter("distinct ports", |(a, b)| a != b), 0..=7)
}

fn resistor_board(cables: &[(usize, usize)]) -> Board<MnaSolver> {
    let mut board = Board::new(resistor_layout(), MnaSolver::default()).unwrap();
    let ports = pool();
    for (i, (a, b)) in cables.iter().enumerate() {
        board.place_cable(&format!("w{i}"), ports[*a], ports[*b], false).unwrap();
    }
    board
}

fn snapshot(board: &Board<MnaSolver>) -> Vec<(String, u64, bool)> {
    board
        .graph()
        .ports()
        .iter()
        .map(|p| (p.id.clone(), p.voltage.to_bits(), p.connected))
        .collect()
}

proptest! {

#[test]
fn prop_unreachable_ports_read_nan(cables in cable_set()) {
    let mut board = resistor_board(&cables);
    board.solve_circuit().unwrap();
    for port in board.graph().ports().iter().filter(|p| !p.id.starts_with("battery.")) {
        prop_assert_eq!(port.voltage.is_nan(), !port.connected, "port {}", port.id);
    }
}

#[test]
fn prop_place_then_remove_restores_state(cables in cable_set(), extra in (0usize..8, 0usize..8)) {
    prop_assume!(extra.0 != extra.1);
    let ports = pool();
    let mut board = resistor_board(&cables);
    board.reset_battery(12.0).unwrap();
    board.solve_circuit().unwrap();
    let before = snapshot(&board);

    board.place_cable("extra", ports[extra.0], ports[extra.1], false).unwrap();
    board.reset_battery(12.0).unwrap();
    board.solve_circuit().unwrap();
    board.remove_cable("extra").unwrap();
    board.reset_battery(12.0).unwrap();
    board.solve_circuit().unwrap();

    prop_assert_eq!(snapshot(&board), before);
}

}
