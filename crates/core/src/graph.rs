use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::component::{AfterRecompute, Component, ComponentId, ComponentKind};
use crate::errors::BoardError;
use crate::netlist::Netlist;
use crate::port::{Port, PortId};

/// Port arena plus component slots.
///
/// Fixed components are inserted once, in layout order, and live as long as
/// the graph. Cables come and go; their slots are emptied on removal and never
/// reused, so a stale [`ComponentId`] can never alias a newer cable.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    ports: Vec<Port>,
    port_index: HashMap<String, PortId>,
    slots: Vec<Option<Component>>,
    fixed: Vec<ComponentId>,
    names: HashMap<String, ComponentId>,
    cables: BTreeMap<String, ComponentId>,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing port with this id, or creates it.
    pub fn add_port(&mut self, id: &str) -> PortId {
        if let Some(idx) = self.port_index.get(id) {
            return *idx;
        }
        let idx = PortId(self.ports.len());
        self.ports.push(Port::new(id));
        self.port_index.insert(id.to_string(), idx);
        idx
    }

    pub fn port_id(&self, id: &str) -> Result<PortId, BoardError> {
        self.port_index.get(id).copied().ok_or_else(|| BoardError::UnknownPort(id.to_string()))
    }

    pub fn port(&self, idx: PortId) -> &Port {
        &self.ports[idx.0]
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn add_component(
        &mut self,
        name: &str,
        kind: ComponentKind,
        ports: Vec<PortId>,
    ) -> Result<ComponentId, BoardError> {
        if self.names.contains_key(name) {
            return Err(BoardError::DuplicateComponent(name.to_string()));
        }
        let idx = self.insert(name, kind, ports)?;
        self.names.insert(name.to_string(), idx);
        self.fixed.push(idx);
        Ok(idx)
    }

    pub fn add_cable(
        &mut self,
        id: &str,
        kind: ComponentKind,
        a: PortId,
        b: PortId,
    ) -> Result<ComponentId, BoardError> {
        if self.cables.contains_key(id) {
            return Err(BoardError::DuplicateCable(id.to_string()));
        }
        if self.owns_element_name(id) {
            return Err(BoardError::DuplicateComponent(id.to_string()));
        }
        let idx = self.insert(id, kind, vec![a, b])?;
        self.cables.insert(id.to_string(), idx);
        Ok(idx)
    }

    /// Whether a fixed component emits, or may emit, a netlist element
    /// called `id`: its own name or `<name>.<anything>`.
    fn owns_element_name(&self, id: &str) -> bool {
        self.names
            .keys()
            .any(|name| id.strip_prefix(name.as_str()).is_some_and(|rest| rest.is_empty() || rest.starts_with('.')))
    }

    pub fn remove_cable(&mut self, id: &str) -> Result<Component, BoardError> {
        let idx = self.cables.remove(id).ok_or_else(|| BoardError::UnknownCable(id.to_string()))?;
        let cable = self.slots[idx.0].take().ok_or_else(|| BoardError::UnknownCable(id.to_string()))?;
        for port in &cable.ports {
            self.ports[port.0].terminators.remove(&idx);
        }
        Ok(cable)
    }

    fn insert(&mut self, name: &str, kind: ComponentKind, ports: Vec<PortId>) -> Result<ComponentId, BoardError> {
        if ports.len() != kind.arity() {
            return Err(BoardError::ArityMismatch {
                name: name.to_string(),
                expected: kind.arity(),
                actual: ports.len(),
            });
        }
        let idx = ComponentId(self.slots.len());
        for port in &ports {
            self.ports[port.0].terminators.insert(idx);
        }
        self.slots.push(Some(Component::new(name, kind, ports)));
        Ok(idx)
    }

    pub fn component(&self, idx: ComponentId) -> Option<&Component> {
        self.slots.get(idx.0).and_then(Option::as_ref)
    }

    pub fn component_mut(&mut self, idx: ComponentId) -> Option<&mut Component> {
        self.slots.get_mut(idx.0).and_then(Option::as_mut)
    }

    pub fn component_id(&self, name: &str) -> Result<ComponentId, BoardError> {
        self.names.get(name).copied().ok_or_else(|| BoardError::UnknownComponent(name.to_string()))
    }

    /// Component by layout name or cable id.
    pub fn named(&self, name: &str) -> Result<&Component, BoardError> {
        let idx = match self.names.get(name) {
            Some(idx) => *idx,
            None => self.cable_id(name).map_err(|_| BoardError::UnknownComponent(name.to_string()))?,
        };
        self.component(idx).ok_or_else(|| BoardError::UnknownComponent(name.to_string()))
    }

    pub fn voltage(&self, id: &str) -> Result<f64, BoardError> {
        Ok(self.port(self.port_id(id)?).voltage)
    }

    pub fn cable_id(&self, id: &str) -> Result<ComponentId, BoardError> {
        self.cables.get(id).copied().ok_or_else(|| BoardError::UnknownCable(id.to_string()))
    }

    /// Fixed components in layout order, then cables ordered by id.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.fixed
            .iter()
            .chain(self.cables.values())
            .filter_map(|&idx| self.component(idx).map(|c| (idx, c)))
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.slots.iter_mut().flatten()
    }

    /// Ports directly adjacent to `idx` through any terminating component, in
    /// that component's current state.
    pub fn opposite_ports(&self, idx: PortId) -> Vec<PortId> {
        let mut out = Vec::new();
        for component in self.ports[idx.0].terminators.iter().filter_map(|&c| self.component(c)) {
            for port in component.opposite_ports(idx) {
                if !out.contains(&port) {
                    out.push(port);
                }
            }
        }
        out
    }

    pub fn reset_connectivity(&mut self) {
        for port in self.ports.iter_mut() {
            port.connected = false;
        }
    }

    pub fn mark_connected(&mut self, idx: PortId) {
        self.ports[idx.0].connected = true;
    }

    pub fn reset_debounce(&mut self) {
        for component in self.slots.iter_mut().flatten() {
            component.reset_debounce();
        }
    }

    /// Silently forgets every voltage. No notifications are raised.
    pub fn clear_voltages(&mut self) {
        for port in self.ports.iter_mut() {
            port.voltage = f64::NAN;
        }
    }

    pub fn build_netlist(&self) -> Netlist {
        let mut netlist = Netlist::new();
        for (_, component) in self.components() {
            component.contribute(&self.ports, &mut netlist);
        }
        netlist
    }

    /// Stores a solver result and notifies every terminating component.
    /// Returns the components that completed their debounce and recomputed.
    pub fn write_voltage(&mut self, idx: PortId, voltage: f64) -> Vec<(ComponentId, AfterRecompute)> {
        trace!(port = %self.ports[idx.0].id, voltage, "port voltage");
        self.ports[idx.0].voltage = voltage;
        let terminators: Vec<ComponentId> = self.ports[idx.0].terminators.iter().copied().collect();
        let mut recomputed = Vec::new();
        for c in terminators {
            if let Some(component) = self.slots[c.0].as_mut() {
                if let Some(after) = component.port_updated(idx, &self.ports) {
                    recomputed.push((c, after));
                }
            }
        }
        recomputed
    }
}
