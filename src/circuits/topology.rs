//! Circuit topology: an arena of components, pins, and nodes.
//!
//! Ownership is strictly one-way. The [`Circuit`] owns three flat arenas and
//! every cross-reference is an integer id: pins name their owning component
//! and (at most) one node, nodes list their attached pins. Adding a component
//! allocates a fresh node per pin; [`Circuit::connect`] merges nodes, leaving
//! empty husks that analysis skips.

use crate::errors::{CircuitError, Result};
use crate::math::{C, Scalar};

use super::component::Component;

/// Handle to a component in the circuit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

/// Handle to a pin in the circuit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(pub(crate) usize);

/// Handle to an electrical node in the circuit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl ComponentId {
    /// Position in the circuit's component list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl NodeId {
    /// Position in the circuit's node list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A terminal of a component. Belongs to exactly one component and references
/// at most one node; a pin with no node is invalid for analysis.
#[derive(Debug, Clone)]
pub struct Pin {
    name: String,
    component: ComponentId,
    node: Option<NodeId>,
}

impl Pin {
    /// Pin name as declared by the component kind.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning component.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Node this pin is attached to, if any.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

/// A unique electrical potential. Voltage is mutated only by the solver.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    voltage: C,
    pins: Vec<PinId>,
}

impl Node {
    /// Node name (`n0`, `n1`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Solved voltage phasor from the most recent analysis.
    #[must_use]
    pub fn voltage(&self) -> C {
        self.voltage
    }

    /// Pins attached to this node. Empty for husks left behind by merges.
    #[must_use]
    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }
}

/// Owning container for a circuit's components, pins, and nodes.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    components: Vec<Component>,
    pins: Vec<Pin>,
    nodes: Vec<Node>,
    ground: Option<NodeId>,
}

impl Circuit {
    /// Creates an empty circuit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component, allocating one pin and one fresh node per
    /// declared pin name.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Topology`] when the component's pin list does
    /// not match its kind's declared pin count.
    pub fn add_component(&mut self, component: Component) -> Result<ComponentId> {
        let declared = component.kind().pin_count();
        if component.pin_names().len() != declared {
            return Err(CircuitError::Topology(format!(
                "component {} declares {declared} pins but carries {}",
                component.name(),
                component.pin_names().len()
            )));
        }

        let id = ComponentId(self.components.len());
        for pin_name in component.pin_names() {
            let pin_id = PinId(self.pins.len());
            let node_id = NodeId(self.nodes.len());
            self.pins.push(Pin {
                name: pin_name.clone(),
                component: id,
                node: Some(node_id),
            });
            self.nodes.push(Node {
                name: format!("n{}", node_id.0),
                voltage: C::default(),
                pins: vec![pin_id],
            });
        }
        self.components.push(component);
        Ok(id)
    }

    /// Handle to the `index`-th pin of `component`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range for the component's pin list.
    #[must_use]
    pub fn pin(&self, component: ComponentId, index: usize) -> PinId {
        let count = self.components[component.0].pin_names().len();
        assert!(
            index < count,
            "pin index {index} out of range for {} ({count} pins)",
            self.components[component.0].name()
        );
        // Pins are allocated contiguously per component in add order.
        let mut offset = 0;
        for c in &self.components[..component.0] {
            offset += c.pin_names().len();
        }
        PinId(offset + index)
    }

    /// Node the given pin is attached to.
    #[must_use]
    pub fn node_of(&self, pin: PinId) -> Option<NodeId> {
        self.pins[pin.0].node
    }

    /// Electrically joins two pins by merging their nodes. Returns the
    /// surviving node.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Topology`] if either pin has no node.
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<NodeId> {
        let node_a = self.pins[a.0]
            .node
            .ok_or_else(|| CircuitError::Topology(format!("pin {} is unconnected", a.0)))?;
        let node_b = self.pins[b.0]
            .node
            .ok_or_else(|| CircuitError::Topology(format!("pin {} is unconnected", b.0)))?;
        if node_a == node_b {
            return Ok(node_a);
        }

        // Move every pin of node_b onto node_a; node_b becomes a husk.
        let moved = std::mem::take(&mut self.nodes[node_b.0].pins);
        for pin_id in &moved {
            self.pins[pin_id.0].node = Some(node_a);
        }
        self.nodes[node_a.0].pins.extend(moved);

        if self.ground == Some(node_b) {
            self.ground = Some(node_a);
        }
        Ok(node_a)
    }

    /// Attaches `pin` to an existing node, merging the pin's current node
    /// into it. The target node survives.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Topology`] if the pin has no node.
    pub fn attach(&mut self, pin: PinId, node: NodeId) -> Result<NodeId> {
        let current = self.pins[pin.0]
            .node
            .ok_or_else(|| CircuitError::Topology(format!("pin {} is unconnected", pin.0)))?;
        if current == node {
            return Ok(node);
        }
        let moved = std::mem::take(&mut self.nodes[current.0].pins);
        for pin_id in &moved {
            self.pins[pin_id.0].node = Some(node);
        }
        self.nodes[node.0].pins.extend(moved);
        if self.ground == Some(current) {
            self.ground = Some(node);
        }
        Ok(node)
    }

    /// Designates the reference node. Its voltage is fixed at zero and it is
    /// excluded from the MNA unknowns.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Topology`] when the node is a husk left behind
    /// by a merge.
    pub fn set_ground(&mut self, node: NodeId) -> Result<()> {
        if self.nodes[node.0].pins.is_empty() {
            return Err(CircuitError::Topology(format!(
                "node {} has no pins and cannot be ground",
                self.nodes[node.0].name
            )));
        }
        self.ground = Some(node);
        self.nodes[node.0].voltage = C::default();
        Ok(())
    }

    /// The designated ground node, if any.
    #[must_use]
    pub fn ground(&self) -> Option<NodeId> {
        self.ground
    }

    /// All components in insertion order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Shared access to one component.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    /// Exclusive access to one component (e.g. to retune a parameter between
    /// optimizer fitness evaluations).
    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.0]
    }

    /// Finds a component by name.
    #[must_use]
    pub fn component_by_name(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name() == name)
            .map(ComponentId)
    }

    /// Ids of all ideal voltage sources, in insertion order.
    #[must_use]
    pub fn voltage_sources(&self) -> Vec<ComponentId> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind().is_voltage_source())
            .map(|(i, _)| ComponentId(i))
            .collect()
    }

    /// Solved voltage of a node.
    #[must_use]
    pub fn node_voltage(&self, node: NodeId) -> C {
        self.nodes[node.0].voltage
    }

    /// Voltages of all live nodes in id order (ground reads as zero).
    #[must_use]
    pub fn node_voltages(&self) -> Vec<C> {
        self.nodes
            .iter()
            .filter(|n| !n.pins.is_empty())
            .map(|n| n.voltage)
            .collect()
    }

    /// Live (non-husk) nodes in id order.
    #[must_use]
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.pins.is_empty())
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Shared access to one node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn set_node_voltage(&mut self, node: NodeId, voltage: C) {
        self.nodes[node.0].voltage = voltage;
    }

    pub(crate) fn pin_ids_of(&self, component: ComponentId) -> Vec<PinId> {
        let mut offset = 0;
        for c in &self.components[..component.0] {
            offset += c.pin_names().len();
        }
        (0..self.components[component.0].pin_names().len())
            .map(|i| PinId(offset + i))
            .collect()
    }

    /// Writes the solved node voltages back into every component's pin
    /// snapshot so the terminal operations see fresh potentials.
    pub(crate) fn refresh_component_voltages(&mut self, frequency: Scalar) {
        for idx in 0..self.components.len() {
            let id = ComponentId(idx);
            let voltages: Vec<C> = self
                .pin_ids_of(id)
                .iter()
                .map(|p| {
                    self.pins[p.0]
                        .node
                        .map(|n| self.nodes[n.0].voltage)
                        .unwrap_or_default()
                })
                .collect();
            self.components[idx].set_pin_voltages(&voltages, frequency);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::component::ComponentKind;

    #[test]
    fn adding_a_component_allocates_one_node_per_pin() {
        let mut circuit = Circuit::new();
        let r = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        assert_eq!(circuit.components().len(), 1);
        assert_eq!(circuit.live_nodes().len(), 2);
        assert!(circuit.node_of(circuit.pin(r, 0)).is_some());
        assert!(circuit.node_of(circuit.pin(r, 1)).is_some());
    }

    #[test]
    fn connect_merges_nodes_and_leaves_a_husk() {
        let mut circuit = Circuit::new();
        let r1 = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let r2 = circuit
            .add_component(Component::resistor("R2", 2.0e3))
            .unwrap();
        let joined = circuit
            .connect(circuit.pin(r1, 1), circuit.pin(r2, 0))
            .unwrap();
        assert_eq!(circuit.live_nodes().len(), 3);
        assert_eq!(circuit.node(joined).pins().len(), 2);
        assert_eq!(circuit.node_of(circuit.pin(r2, 0)), Some(joined));
    }

    #[test]
    fn pin_count_mismatch_is_a_topology_error() {
        let mut bad = Component::new("X1", ComponentKind::Resistor);
        bad.pin_names.push("extra".into());
        let mut circuit = Circuit::new();
        let err = circuit.add_component(bad).unwrap_err();
        assert!(matches!(err, CircuitError::Topology(_)));
    }

    #[test]
    fn ground_follows_a_merge() {
        let mut circuit = Circuit::new();
        let r1 = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let r2 = circuit
            .add_component(Component::resistor("R2", 2.0e3))
            .unwrap();
        let gnd = circuit.node_of(circuit.pin(r2, 1)).unwrap();
        circuit.set_ground(gnd).unwrap();
        circuit
            .connect(circuit.pin(r1, 1), circuit.pin(r2, 1))
            .unwrap();
        // The surviving node keeps the ground designation.
        let merged = circuit.node_of(circuit.pin(r1, 1)).unwrap();
        assert_eq!(circuit.ground(), Some(merged));
    }

    #[test]
    fn husk_cannot_become_ground() {
        let mut circuit = Circuit::new();
        let r1 = circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let r2 = circuit
            .add_component(Component::resistor("R2", 2.0e3))
            .unwrap();
        let husk = circuit.node_of(circuit.pin(r2, 0)).unwrap();
        circuit
            .connect(circuit.pin(r1, 1), circuit.pin(r2, 0))
            .unwrap();
        assert!(circuit.set_ground(husk).is_err());
    }

    #[test]
    fn component_lookup_by_name() {
        let mut circuit = Circuit::new();
        circuit
            .add_component(Component::resistor("R1", 1.0e3))
            .unwrap();
        let found = circuit.component_by_name("R1").unwrap();
        assert_eq!(circuit.component(found).name(), "R1");
        assert!(circuit.component_by_name("R9").is_none());
    }
}
