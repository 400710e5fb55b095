use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use electro_bench_core::components::MultimeterMode;
use electro_bench_core::{Board, BoardError, BoardLayout, MnaSolver};
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid cable `{0}`, expected ID:PORT_A:PORT_B[:faulty]")]
    Cable(String),
    #[error("invalid number `{0}`")]
    Number(String),
    #[error("unknown multimeter mode `{0}` (off, voltage, current, resistance)")]
    Mode(String),
    #[error(transparent)]
    Board(#[from] BoardError),
}

fn cli() -> Command {
    Command::new("electro-bench")
        .version(env!("CARGO_PKG_VERSION"))
        .about("DC solver for the automotive training board")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log solver activity (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("solve")
                .about("Wire the standard board and print the solved state")
                .arg(Arg::new("board-voltage").long("board-voltage").default_value("12"))
                .arg(
                    Arg::new("cable")
                        .long("cable")
                        .action(ArgAction::Append)
                        .help("ID:PORT_A:PORT_B, append :faulty for a faulty cable"),
                )
                .arg(
                    Arg::new("open")
                        .long("open")
                        .action(ArgAction::Append)
                        .help("Disconnect a switch, fuse, bulb or motor"),
                )
                .arg(Arg::new("multimeter").long("multimeter").help("off, voltage, current or resistance"))
                .arg(Arg::new("wiper").long("wiper").help("Potentiometer wiper position in ohms"))
                .arg(Arg::new("flasher-on").long("flasher-on").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("ports").about("List the port ids of the standard board"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let level = match matches.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let result = match matches.subcommand() {
        Some(("solve", sub)) => solve(sub),
        Some(("ports", _)) => ports(),
        _ => unreachable!("subcommand_required"),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn number(value: &str) -> Result<f64, CliError> {
    value.parse().map_err(|_| CliError::Number(value.to_string()))
}

fn mode(value: &str) -> Result<MultimeterMode, CliError> {
    match value {
        "off" => Ok(MultimeterMode::Off),
        "voltage" | "dcv" => Ok(MultimeterMode::DcVoltage),
        "current" | "dca" => Ok(MultimeterMode::DcCurrent),
        "resistance" | "ohm" => Ok(MultimeterMode::Resistance),
        other => Err(CliError::Mode(other.to_string())),
    }
}

fn ports() -> Result<(), CliError> {
    let board = Board::new(BoardLayout::standard(), MnaSolver::default())?;
    for id in board.port_ids() {
        println!("{id}");
    }
    Ok(())
}

fn solve(args: &ArgMatches) -> Result<(), CliError> {
    let voltage = args.get_one::<String>("board-voltage").map_or(Ok(12.0), |v| number(v))?;
    let layout = BoardLayout::standard().with_board_voltage(voltage);
    let mut board = Board::new(layout, MnaSolver::default())?;

    for spec in args.get_many::<String>("cable").into_iter().flatten() {
        let parts: Vec<&str> = spec.split(':').collect();
        let is_faulty = match parts.get(3) {
            None => false,
            Some(&"faulty") => true,
            Some(_) => return Err(CliError::Cable(spec.clone())),
        };
        match parts.as_slice() {
            [id, a, b, ..] if parts.len() <= 4 => {
                board.place_cable(id, a, b, is_faulty)?;
            }
            _ => return Err(CliError::Cable(spec.clone())),
        }
    }
    for name in args.get_many::<String>("open").into_iter().flatten() {
        board.set_connected(name, false)?;
    }
    if let Some(value) = args.get_one::<String>("multimeter") {
        board.set_multimeter_mode("multimeter", mode(value)?)?;
    }
    if let Some(value) = args.get_one::<String>("wiper") {
        board.set_wiper("pot", number(value)?)?;
    }
    board.set_flasher_signal("flasher", args.get_flag("flasher-on"))?;

    board.solve_circuit()?;

    println!("solves: {}", board.solve_count());
    println!();
    println!("{:<20} {:>12}", "port", "voltage");
    for port in board.graph().ports().iter().filter(|p| p.has_voltage()) {
        println!("{:<20} {:>12.6}", port.id, port.voltage);
    }
    println!();
    println!("{:<20} {:<18} {:>12} {:>12} {:>14}", "component", "kind", "voltage", "current", "resistance");
    for (_, component) in board.graph().components() {
        let r = component.readings;
        println!(
            "{:<20} {:<18} {:>12.6} {:>12.6} {:>14.6}",
            component.name,
            component.kind.kind_name(),
            r.voltage,
            r.current,
            r.resistance
        );
    }
    let battery = board.battery("battery")?;
    if battery.is_shorted {
        println!("\nbattery is shorted");
    }
    if board.relay("relay")?.is_actuated() {
        println!("relay is actuated");
    }
    Ok(())
}
