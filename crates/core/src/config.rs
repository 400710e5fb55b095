use crate::netlist::DiodeParams;

/// Electrical constants shared by every component model on a board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Cables, closed switches and closed relay contacts.
    pub wire_resistance: f64,
    pub faulty_cable_resistance: f64,

    pub battery_sense_resistance: f64,
    /// Terminal voltage below which the battery counts as shorted.
    pub battery_short_tolerance: f64,
    pub battery_max_current: f64,

    pub fuse_resistance: f64,
    pub defective_fuse_resistance: f64,

    pub lightbulb_min_resistance: f64,

    pub relay_coil_resistance: f64,
    pub relay_threshold_high: f64,
    pub relay_threshold_low: f64,

    pub diode: DiodeParams,
    pub diode_display_resistance: f64,

    pub flasher_capacitance: f64,
    pub flasher_closed_resistance: f64,
    pub flasher_open_resistance: f64,

    pub multimeter_input_impedance: f64,
    pub multimeter_shunt_resistance: f64,
    pub multimeter_blown_resistance: f64,
    pub multimeter_fuse_current: f64,
    pub ohmmeter_source_voltage: f64,
    pub ohmmeter_series_resistance: f64,
    /// Readings above this collapse to [`crate::components::multimeter::OPEN_CIRCUIT`].
    pub ohmmeter_max_resistance: f64,

    /// Dispatches one `solve_circuit` call may run, cascaded re-solves
    /// included. Requests beyond it stay queued for the next call.
    pub max_cascade: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            wire_resistance: 1e-6,
            faulty_cable_resistance: 20.0,

            battery_sense_resistance: 1e-3,
            battery_short_tolerance: 0.1,
            battery_max_current: 40.0,

            fuse_resistance: 3.0 / 32.0,
            defective_fuse_resistance: 93.0,

            lightbulb_min_resistance: 0.1,

            relay_coil_resistance: 80.0,
            relay_threshold_high: 0.1,
            relay_threshold_low: 0.05,

            diode: DiodeParams::default(),
            diode_display_resistance: 1.0,

            flasher_capacitance: 1e-3,
            flasher_closed_resistance: 1e-3,
            flasher_open_resistance: 1e9,

            multimeter_input_impedance: 10e6,
            multimeter_shunt_resistance: 0.01,
            multimeter_blown_resistance: 1e9,
            multimeter_fuse_current: 10.0,
            ohmmeter_source_voltage: 0.01,
            ohmmeter_series_resistance: 0.01,
            ohmmeter_max_resistance: 20e6,

            max_cascade: 64,
        }
    }
}
