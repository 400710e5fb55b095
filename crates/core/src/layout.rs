use crate::component::KindSpec;
use crate::config::BoardConfig;
use crate::errors::CircuitError;
use crate::units::Resistance;

/// One fixed component of a board.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub name: String,
    pub kind: KindSpec,
    /// Port ids in terminal order. `None` means `<name>.<terminal>`.
    pub ports: Option<Vec<String>>,
}

impl ComponentSpec {
    pub fn port_ids(&self, terminals: &[&str]) -> Vec<String> {
        match &self.ports {
            Some(ports) => ports.clone(),
            None => terminals.iter().map(|t| format!("{}.{t}", self.name)).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), CircuitError> {
        match self.kind {
            KindSpec::Resistor(ohms) | KindSpec::Motor(ohms) => {
                Resistance::new(ohms)?;
            }
            KindSpec::Lightbulb { base_resistance, .. } => {
                Resistance::new(base_resistance)?;
            }
            KindSpec::Potentiometer { total, wiper } => {
                Resistance::new(total)?;
                if !wiper.is_finite() {
                    return Err(CircuitError::InvalidResistance(wiper));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Fixed component set of a board plus its electrical constants.
///
/// Port ids are created the first time a component names them, so two
/// components sharing a port simply list the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub config: BoardConfig,
    pub board_voltage: f64,
    pub components: Vec<ComponentSpec>,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self { config: BoardConfig::default(), board_voltage: 12.0, components: Vec::new() }
    }
}

impl BoardLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BoardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_board_voltage(mut self, voltage: f64) -> Self {
        self.board_voltage = voltage;
        self
    }

    /// Adds a component with its default `<name>.<terminal>` ports.
    pub fn component(mut self, name: &str, kind: KindSpec) -> Self {
        self.components.push(ComponentSpec { name: name.to_string(), kind, ports: None });
        self
    }

    /// Adds a component wired to explicit port ids.
    pub fn add(mut self, name: &str, kind: KindSpec, ports: &[&str]) -> Self {
        self.components.push(ComponentSpec {
            name: name.to_string(),
            kind,
            ports: Some(ports.iter().map(|p| p.to_string()).collect()),
        });
        self
    }

    /// The training board: every component model once, each on its own ports.
    /// Circuits are built entirely from cables.
    pub fn standard() -> Self {
        let bulb = KindSpec::Lightbulb { base_resistance: 6.0, coefficient: 0.25, reference_voltage: 12.0 };
        Self::new()
            .component("battery", KindSpec::Battery)
            .component("fuse", KindSpec::Fuse { defective: false })
            .component("switch", KindSpec::Switch { closed: true })
            .component("bulb1", bulb.clone())
            .component("bulb2", bulb)
            .component("motor", KindSpec::Motor(2.0))
            .component("diode", KindSpec::Diode)
            .component("pot", KindSpec::Potentiometer { total: 100.0, wiper: 50.0 })
            .component("relay", KindSpec::Relay)
            .component("flasher", KindSpec::ElectronicFlasher)
            .component("multimeter", KindSpec::Multimeter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Relay;

    #[test]
    fn default_ports_are_name_dot_terminal() {
        let layout = BoardLayout::standard();
        let relay = layout.components.iter().find(|c| c.name == "relay").unwrap();
        assert_eq!(
            relay.port_ids(Relay::TERMINALS),
            ["relay.85", "relay.86", "relay.87", "relay.87A", "relay.30"]
        );
    }

    #[test]
    fn explicit_ports_are_kept() {
        let layout = BoardLayout::new().add("r1", KindSpec::Resistor(10.0), &["n1", "n2"]);
        assert_eq!(layout.components[0].port_ids(&["a", "b"]), ["n1", "n2"]);
    }

    #[test]
    fn rejects_non_physical_values() {
        let layout = BoardLayout::new()
            .component("r1", KindSpec::Resistor(-5.0))
            .component("pot", KindSpec::Potentiometer { total: 100.0, wiper: f64::NAN });
        assert_eq!(layout.components[0].validate(), Err(CircuitError::InvalidResistance(-5.0)));
        assert!(layout.components[1].validate().is_err());
        assert!(BoardLayout::standard().components.iter().all(|c| c.validate().is_ok()));
    }
}
