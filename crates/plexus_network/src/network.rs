// SPDX-License-Identifier: MIT OR Apache-2.0
//! The processor network: processors, data-flow connections and property links.
//!
//! The network is an arena. It exclusively owns every processor (and through
//! them every port and property); connections and links only hold handles.
//! Removing a processor drops every connection and link that refers to it in
//! the same call, so no handle can outlive its target.

use crate::connection::{Connection, ConnectionId};
use crate::error::{ConnectError, CycleError, LinkError, PropertyError};
use crate::invalidation::InvalidationLevel;
use crate::link::{LinkEvaluator, LinkId, PropertyLink};
use crate::port::{Port, PortRef};
use crate::processor::{Processor, ProcessorId};
use crate::property::{Property, PropertyRef, PropertyValue};
use crate::runtime::Runtime;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// A network of processors
pub struct Network {
    runtime: Arc<Runtime>,
    processors: IndexMap<ProcessorId, Processor>,
    connections: IndexMap<ConnectionId, Connection>,
    links: IndexMap<LinkId, PropertyLink>,
}

impl Network {
    /// Create a new empty network
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            processors: IndexMap::new(),
            connections: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Registries this network resolves types against
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    // ========================================================================
    // Processors
    // ========================================================================

    /// Create a processor from its class identifier and add it.
    ///
    /// Returns `None` if the identifier is not registered.
    pub fn create_processor(&mut self, class_identifier: &str) -> Option<ProcessorId> {
        let Some(processor) = self.runtime.create_processor(class_identifier) else {
            tracing::warn!("Unknown processor type '{class_identifier}'");
            return None;
        };
        Some(self.add_processor(processor))
    }

    /// Add a processor.
    ///
    /// If its identifier is already used by another processor, a numeric
    /// suffix is appended to keep identifiers unique.
    pub fn add_processor(&mut self, mut processor: Processor) -> ProcessorId {
        let unique = self.unique_identifier(&processor.identifier, None);
        if unique != processor.identifier {
            tracing::debug!("Processor '{}' renamed to '{unique}'", processor.identifier);
            processor.identifier = unique;
        }

        let id = processor.id;
        tracing::debug!(
            "Added processor '{}' ({})",
            processor.identifier,
            processor.class_identifier
        );
        self.processors.insert(id, processor);
        id
    }

    /// Rename a processor. Returns the identifier actually assigned.
    pub fn rename_processor(&mut self, id: ProcessorId, identifier: &str) -> Option<String> {
        if !self.processors.contains_key(&id) {
            return None;
        }
        let unique = self.unique_identifier(identifier, Some(id));
        let processor = self.processors.get_mut(&id)?;
        processor.identifier = unique.clone();
        Some(unique)
    }

    /// Remove a processor together with its connections and links.
    ///
    /// Processors that lost an input are invalidated.
    pub fn remove_processor(&mut self, id: ProcessorId) -> Option<Processor> {
        if !self.processors.contains_key(&id) {
            return None;
        }

        let consumers: Vec<ProcessorId> = self
            .connections
            .values()
            .filter(|c| c.outport.processor == id && c.inport.processor != id)
            .map(|c| c.inport.processor)
            .collect();

        self.connections.retain(|_, c| !c.involves_processor(id));
        self.links.retain(|_, l| !l.involves_processor(id));
        let processor = self.processors.shift_remove(&id)?;

        tracing::debug!("Removed processor '{}'", processor.identifier);
        for consumer in consumers {
            self.invalidate(consumer, InvalidationLevel::InvalidOutput);
        }
        Some(processor)
    }

    /// Get a processor by ID
    pub fn processor(&self, id: ProcessorId) -> Option<&Processor> {
        self.processors.get(&id)
    }

    /// Get a processor by its instance identifier
    pub fn processor_by_identifier(&self, identifier: &str) -> Option<&Processor> {
        self.processors.values().find(|p| p.identifier == identifier)
    }

    /// Get all processors, in insertion order
    pub fn processors(&self) -> impl Iterator<Item = &Processor> {
        self.processors.values()
    }

    /// Get all processor IDs
    pub fn processor_ids(&self) -> impl Iterator<Item = ProcessorId> + '_ {
        self.processors.keys().copied()
    }

    /// Get the number of processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    fn unique_identifier(&self, base: &str, exclude: Option<ProcessorId>) -> String {
        let taken = |name: &str| {
            self.processors
                .values()
                .any(|p| Some(p.id) != exclude && p.identifier == name)
        };

        if !taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base} {n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Get a port by handle
    pub fn port(&self, port: &PortRef) -> Option<&Port> {
        self.processors.get(&port.processor)?.port(&port.identifier)
    }

    fn resolve_port(&self, port: &PortRef) -> Result<&Port, ConnectError> {
        let processor = self
            .processors
            .get(&port.processor)
            .ok_or(ConnectError::ProcessorNotFound(port.processor))?;
        processor
            .port(&port.identifier)
            .ok_or_else(|| ConnectError::PortNotFound(port.clone()))
    }

    /// Connect two ports, given in either order.
    ///
    /// One port must be an outport and the other an inport of a different
    /// processor. The consuming processor is invalidated on success; on
    /// failure nothing changes.
    pub fn connect(&mut self, a: &PortRef, b: &PortRef) -> Result<ConnectionId, ConnectError> {
        let port_a = self.resolve_port(a)?;
        let port_b = self.resolve_port(b)?;

        if port_a.direction == port_b.direction {
            return Err(ConnectError::SameDirection);
        }

        let (outport, inport, out_port, in_port) = if port_a.is_outport() {
            (a, b, port_a, port_b)
        } else {
            (b, a, port_b, port_a)
        };

        if outport.processor == inport.processor {
            return Err(ConnectError::SelfConnection);
        }

        if !in_port.data_type.accepts(&out_port.data_type) {
            return Err(ConnectError::IncompatibleTypes {
                outport: out_port.data_type.clone(),
                inport: in_port.data_type.clone(),
            });
        }

        let single_producer = !in_port.multi_connect;
        if self.connections.values().any(|c| c.joins(outport, inport))
            || (single_producer && self.connections.values().any(|c| &c.inport == inport))
        {
            return Err(ConnectError::AlreadyConnected(inport.clone()));
        }

        let connection = Connection::new(outport.clone(), inport.clone());
        let id = connection.id;
        tracing::debug!("Connected {outport} -> {inport}");
        self.connections.insert(id, connection);
        self.invalidate(inport.processor, InvalidationLevel::InvalidOutput);
        Ok(id)
    }

    /// Remove the connection between two ports, given in either order.
    ///
    /// Returns `false` if there was no such connection.
    pub fn disconnect(&mut self, a: &PortRef, b: &PortRef) -> bool {
        let Some(id) = self
            .connections
            .values()
            .find(|c| c.joins(a, b))
            .map(|c| c.id)
        else {
            return false;
        };
        self.remove_connection(id).is_some()
    }

    /// Remove a connection by ID, invalidating its consumer
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&id)?;
        tracing::debug!("Disconnected {} -> {}", connection.outport, connection.inport);
        self.invalidate(connection.inport.processor, InvalidationLevel::InvalidOutput);
        Some(connection)
    }

    /// Whether two ports are connected, in either order
    pub fn is_connected(&self, a: &PortRef, b: &PortRef) -> bool {
        self.connections.values().any(|c| c.joins(a, b))
    }

    /// Ports connected to `port`
    pub fn connected_ports(&self, port: &PortRef) -> Vec<&PortRef> {
        self.connections
            .values()
            .filter_map(|c| c.peer_of(port))
            .collect()
    }

    /// Get a connection by ID
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Raise `id` to at least `level` and propagate downstream.
    ///
    /// A processor already at or above the requested level stops the walk,
    /// which makes the call idempotent and guarantees termination on cyclic
    /// networks. Returns the number of processors whose level was raised.
    pub fn invalidate(&mut self, id: ProcessorId, level: InvalidationLevel) -> usize {
        if !level.is_invalid() {
            return 0;
        }

        let mut raised = 0;
        let mut pending = vec![(id, level)];
        while let Some((current, level)) = pending.pop() {
            let Some(processor) = self.processors.get_mut(&current) else {
                continue;
            };
            if !processor.raise_invalidation(level) {
                continue;
            }
            tracing::trace!("Invalidated '{}' to {level}", processor.identifier);
            raised += 1;

            let downstream = level.downstream();
            pending.extend(
                self.connections
                    .values()
                    .filter(|c| c.outport.processor == current)
                    .map(|c| (c.inport.processor, downstream)),
            );
        }

        if raised > 0 {
            tracing::debug!("Invalidation reached {raised} processor(s)");
        }
        raised
    }

    /// Mark a processor as recomputed
    pub fn set_valid(&mut self, id: ProcessorId) -> bool {
        let Some(processor) = self.processors.get_mut(&id) else {
            return false;
        };
        processor.reset_invalidation();
        true
    }

    /// Invalid processors in dependency order.
    ///
    /// Falls back to insertion order when the network contains a cycle.
    pub fn invalid_processors(&self) -> Vec<ProcessorId> {
        let order = self
            .topological_order()
            .unwrap_or_else(|_| self.processors.keys().copied().collect());
        order
            .into_iter()
            .filter(|id| self.processors.get(id).is_some_and(|p| !p.is_valid()))
            .collect()
    }

    /// Get processors in topological order (producers before consumers)
    pub fn topological_order(&self) -> Result<Vec<ProcessorId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for id in self.processors.keys() {
            if !visited.contains(id) {
                self.visit(*id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        id: ProcessorId,
        visited: &mut HashSet<ProcessorId>,
        temp_mark: &mut HashSet<ProcessorId>,
        order: &mut Vec<ProcessorId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&id) {
            return Err(CycleError);
        }
        if visited.contains(&id) {
            return Ok(());
        }

        temp_mark.insert(id);

        // Producers first
        for connection in self.connections.values() {
            if connection.inport.processor == id {
                self.visit(connection.outport.processor, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&id);
        visited.insert(id);
        order.push(id);

        Ok(())
    }

    // ========================================================================
    // Properties and links
    // ========================================================================

    /// Get a property by handle
    pub fn property(&self, property: &PropertyRef) -> Option<&Property> {
        self.processors
            .get(&property.processor)?
            .property(&property.identifier)
    }

    fn property_mut(&mut self, property: &PropertyRef) -> Option<&mut Property> {
        self.processors
            .get_mut(&property.processor)?
            .property_mut(&property.identifier)
    }

    /// Write a property value.
    ///
    /// If the value changed, the owning processor is invalidated at the
    /// property's level and the value is pushed along outgoing links.
    pub fn set_property_value(
        &mut self,
        property: &PropertyRef,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        let target = self
            .property_mut(property)
            .ok_or_else(|| PropertyError::PropertyNotFound(property.clone()))?;

        if !target.set_value(value)? {
            return Ok(());
        }

        let level = target.invalidation_level;
        self.invalidate(property.processor, level);
        self.propagate_links(property);
        Ok(())
    }

    /// Push a changed property breadth-first along links.
    ///
    /// Each property is written at most once per propagation, and the walk
    /// stops where a destination does not change, so link cycles terminate.
    /// Where two link paths converge, the destination keeps the value of the
    /// shorter path; the longer one is not applied on top of it.
    fn propagate_links(&mut self, origin: &PropertyRef) {
        let mut visited = HashSet::from([origin.clone()]);
        let mut queue = VecDeque::from([origin.clone()]);

        while let Some(source) = queue.pop_front() {
            let destinations: Vec<PropertyRef> = self
                .links
                .values()
                .filter(|l| l.source == source)
                .map(|l| l.destination.clone())
                .collect();

            for destination in destinations {
                if !visited.insert(destination.clone()) {
                    continue;
                }
                if self.apply_link(&source, &destination) {
                    queue.push_back(destination);
                }
            }
        }
    }

    /// Evaluate a single link. Returns `true` if the destination changed.
    fn apply_link(&mut self, source: &PropertyRef, destination: &PropertyRef) -> bool {
        let Some(src) = self.property(source).cloned() else {
            return false;
        };

        let runtime = Arc::clone(&self.runtime);
        let evaluator = LinkEvaluator::new(runtime.converters());
        let Some(dst) = self.property_mut(destination) else {
            return false;
        };

        if !evaluator.evaluate(&src, dst) {
            return false;
        }

        let level = dst.invalidation_level;
        tracing::trace!("Link {source} -> {destination} wrote {}", dst.value());
        self.invalidate(destination.processor, level);
        true
    }

    /// Evaluate the link from `src` to `dst` once, without further propagation.
    ///
    /// Returns `Ok(true)` if `dst` changed. A missing converter is not an
    /// error; the destination is simply left untouched.
    pub fn evaluate_link(
        &mut self,
        src: &PropertyRef,
        dst: &PropertyRef,
    ) -> Result<bool, LinkError> {
        if self.property(src).is_none() {
            return Err(LinkError::PropertyNotFound(src.clone()));
        }
        if self.property(dst).is_none() {
            return Err(LinkError::PropertyNotFound(dst.clone()));
        }
        Ok(self.apply_link(src, dst))
    }

    /// Whether `src` can be linked into `dst`
    pub fn can_link(&self, src: &PropertyRef, dst: &PropertyRef) -> bool {
        if src == dst {
            return false;
        }
        match (self.property(src), self.property(dst)) {
            (Some(s), Some(d)) => LinkEvaluator::new(self.runtime.converters()).can_link(s, d),
            _ => false,
        }
    }

    /// Create a directional link from `src` to `dst`.
    ///
    /// Fails if no converter exists for the property types.
    pub fn create_link(
        &mut self,
        src: &PropertyRef,
        dst: &PropertyRef,
    ) -> Result<LinkId, LinkError> {
        if src == dst {
            return Err(LinkError::SameProperty);
        }
        let source = self
            .property(src)
            .ok_or_else(|| LinkError::PropertyNotFound(src.clone()))?;
        let destination = self
            .property(dst)
            .ok_or_else(|| LinkError::PropertyNotFound(dst.clone()))?;

        let (from, to) = (source.property_type(), destination.property_type());
        if !self.runtime.converters().can_convert(from, to) {
            return Err(LinkError::NoConverter { from, to });
        }

        if self
            .links
            .values()
            .any(|l| &l.source == src && &l.destination == dst)
        {
            return Err(LinkError::AlreadyLinked(src.clone(), dst.clone()));
        }

        let link = PropertyLink::new(src.clone(), dst.clone());
        let id = link.id;
        tracing::debug!("Linked {src} -> {dst}");
        self.links.insert(id, link);
        Ok(id)
    }

    /// Link two properties in both directions.
    ///
    /// Each direction is created independently; one failing does not prevent
    /// the other.
    pub fn create_bidirectional_link(
        &mut self,
        a: &PropertyRef,
        b: &PropertyRef,
    ) -> [Result<LinkId, LinkError>; 2] {
        let forward = self.create_link(a, b);
        let backward = self.create_link(b, a);
        [forward, backward]
    }

    /// Remove the link from `src` to `dst`. Returns `false` if there was none.
    pub fn unlink(&mut self, src: &PropertyRef, dst: &PropertyRef) -> bool {
        let before = self.links.len();
        self.links
            .retain(|_, l| !(&l.source == src && &l.destination == dst));
        self.links.len() != before
    }

    /// Remove a link by ID
    pub fn remove_link(&mut self, id: LinkId) -> Option<PropertyLink> {
        self.links.shift_remove(&id)
    }

    /// Get a link by ID
    pub fn link(&self, id: LinkId) -> Option<&PropertyLink> {
        self.links.get(&id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &PropertyLink> {
        self.links.values()
    }

    /// Links leaving a property
    pub fn links_from<'a>(
        &'a self,
        property: &'a PropertyRef,
    ) -> impl Iterator<Item = &'a PropertyLink> + 'a {
        self.links.values().filter(move |l| &l.source == property)
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Replace a property, possibly with one of a different type.
    ///
    /// Links whose type pair no longer has a converter are removed. The owning
    /// processor is invalidated at the new property's level.
    pub fn replace_property(
        &mut self,
        property: &PropertyRef,
        mut replacement: Property,
    ) -> Result<Property, PropertyError> {
        let processor = self
            .processors
            .get_mut(&property.processor)
            .ok_or_else(|| PropertyError::PropertyNotFound(property.clone()))?;
        if processor.property(&property.identifier).is_none() {
            return Err(PropertyError::PropertyNotFound(property.clone()));
        }

        replacement.identifier = property.identifier.clone();
        let level = replacement.invalidation_level;
        let previous = processor
            .replace_property(replacement)
            .ok_or_else(|| PropertyError::PropertyNotFound(property.clone()))?;

        self.prune_links();
        self.invalidate(property.processor, level);
        Ok(previous)
    }

    /// Drop links that reference missing properties or have no converter.
    ///
    /// Returns the number of links removed.
    pub fn prune_links(&mut self) -> usize {
        let stale: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| !self.can_link(&l.source, &l.destination))
            .map(|l| l.id)
            .collect();

        for id in &stale {
            if let Some(link) = self.links.shift_remove(id) {
                tracing::warn!(
                    "Removed link {} -> {}: properties can no longer be linked",
                    link.source,
                    link.destination
                );
            }
        }
        stale.len()
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("processors", &self.processors.len())
            .field("connections", &self.connections.len())
            .field("links", &self.links.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::DataType;
    use crate::processor::{ProcessorCategory, ProcessorTemplate};

    const SOURCE: &str = "test.source";
    const FILTER: &str = "test.filter";
    const SINK: &str = "test.sink";

    fn runtime() -> Arc<Runtime> {
        let mut runtime = Runtime::new();
        crate::converter::register_builtin_converters(runtime.converters_mut());
        runtime
            .register_processor(
                ProcessorTemplate::new(SOURCE, "Source", ProcessorCategory::Source)
                    .with_port(Port::outport("outport", DataType::Volume))
                    .with_property(Property::new("int", "Int", PropertyValue::Int(1)))
                    .with_property(Property::new("enabled", "Enabled", PropertyValue::Bool(true))),
            )
            .unwrap();
        runtime
            .register_processor(
                ProcessorTemplate::new(FILTER, "Filter", ProcessorCategory::Filter)
                    .with_port(Port::inport("inport", DataType::Volume))
                    .with_port(Port::outport("outport", DataType::Volume))
                    .with_property(Property::new("float", "Float", PropertyValue::Float(0.0)))
                    .with_property(
                        Property::new("resample", "Resample", PropertyValue::Double(1.0))
                            .with_invalidation_level(InvalidationLevel::InvalidResample),
                    ),
            )
            .unwrap();
        runtime
            .register_processor(
                ProcessorTemplate::new(SINK, "Sink", ProcessorCategory::Sink)
                    .with_port(Port::inport("inport", DataType::Any))
                    .with_port(Port::inport("volumes", DataType::Volume).multi_input())
                    .with_port(Port::inport("images", DataType::Image))
                    .with_property(Property::new("color", "Color", PropertyValue::Vec4([0.0; 4])))
                    .with_property(Property::new(
                        "label",
                        "Label",
                        PropertyValue::String(String::new()),
                    )),
            )
            .unwrap();
        runtime.into_shared()
    }

    fn port(id: ProcessorId, name: &str) -> PortRef {
        PortRef::new(id, name)
    }

    fn prop(id: ProcessorId, name: &str) -> PropertyRef {
        PropertyRef::new(id, name)
    }

    fn levels(network: &Network) -> Vec<InvalidationLevel> {
        network.processors().map(Processor::invalidation_level).collect()
    }

    fn reset(network: &mut Network) {
        let ids: Vec<_> = network.processor_ids().collect();
        for id in ids {
            network.set_valid(id);
        }
    }

    /// A -> B -> C, plus a back edge C -> A when `cyclic`
    fn chain(cyclic: bool) -> (Network, [ProcessorId; 3]) {
        let mut network = Network::new(runtime());
        let a = network.create_processor(FILTER).unwrap();
        let b = network.create_processor(FILTER).unwrap();
        let c = network.create_processor(FILTER).unwrap();
        network.connect(&port(a, "outport"), &port(b, "inport")).unwrap();
        network.connect(&port(b, "outport"), &port(c, "inport")).unwrap();
        if cyclic {
            network.connect(&port(c, "outport"), &port(a, "inport")).unwrap();
        }
        reset(&mut network);
        (network, [a, b, c])
    }

    #[test]
    fn test_create_processor() {
        let mut network = Network::new(runtime());
        let id = network.create_processor(SOURCE).unwrap();
        assert_eq!(network.processor(id).unwrap().class_identifier.as_str(), SOURCE);
        assert!(network.create_processor("test.unknown").is_none());
        assert_eq!(network.processor_count(), 1);
    }

    #[test]
    fn test_identifiers_made_unique() {
        let mut network = Network::new(runtime());
        let a = network.create_processor(SOURCE).unwrap();
        let b = network.create_processor(SOURCE).unwrap();
        assert_eq!(network.processor(a).unwrap().identifier, "Source");
        assert_eq!(network.processor(b).unwrap().identifier, "Source 2");

        assert_eq!(network.rename_processor(b, "Source").as_deref(), Some("Source 2"));
        assert_eq!(network.rename_processor(b, "Reader").as_deref(), Some("Reader"));
        assert!(network.processor_by_identifier("Reader").is_some());
    }

    #[test]
    fn test_connect_in_either_order() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();

        network.connect(&port(f, "inport"), &port(s, "outport")).unwrap();
        assert!(network.is_connected(&port(s, "outport"), &port(f, "inport")));
        assert_eq!(network.connected_ports(&port(s, "outport")), vec![&port(f, "inport")]);
        assert_eq!(network.connected_ports(&port(f, "inport")), vec![&port(s, "outport")]);
    }

    #[test]
    fn test_connect_rejections_leave_no_state() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let s2 = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        let k = network.create_processor(SINK).unwrap();

        assert!(matches!(
            network.connect(&port(s, "outport"), &port(k, "images")),
            Err(ConnectError::IncompatibleTypes {
                outport: DataType::Volume,
                inport: DataType::Image
            })
        ));
        assert!(matches!(
            network.connect(&port(s, "outport"), &port(s2, "outport")),
            Err(ConnectError::SameDirection)
        ));
        assert!(matches!(
            network.connect(&port(f, "outport"), &port(f, "inport")),
            Err(ConnectError::SelfConnection)
        ));
        assert!(matches!(
            network.connect(&port(s, "missing"), &port(f, "inport")),
            Err(ConnectError::PortNotFound(_))
        ));
        assert!(matches!(
            network.connect(&port(ProcessorId::new(), "outport"), &port(f, "inport")),
            Err(ConnectError::ProcessorNotFound(_))
        ));
        assert_eq!(network.connection_count(), 0);
        assert!(levels(&network).iter().all(|l| !l.is_invalid()));
    }

    #[test]
    fn test_single_producer_inport() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let s2 = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();

        network.connect(&port(s, "outport"), &port(f, "inport")).unwrap();
        assert!(matches!(
            network.connect(&port(s2, "outport"), &port(f, "inport")),
            Err(ConnectError::AlreadyConnected(p)) if p == port(f, "inport")
        ));
        assert!(matches!(
            network.connect(&port(s, "outport"), &port(f, "inport")),
            Err(ConnectError::AlreadyConnected(_))
        ));
        assert_eq!(network.connection_count(), 1);
    }

    #[test]
    fn test_multi_input_and_any() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let s2 = network.create_processor(SOURCE).unwrap();
        let k = network.create_processor(SINK).unwrap();

        // Any accepts a volume, but only from one producer
        network.connect(&port(s, "outport"), &port(k, "inport")).unwrap();
        assert!(network.connect(&port(s2, "outport"), &port(k, "inport")).is_err());

        network.connect(&port(s, "outport"), &port(k, "volumes")).unwrap();
        network.connect(&port(s2, "outport"), &port(k, "volumes")).unwrap();
        assert_eq!(network.connected_ports(&port(k, "volumes")).len(), 2);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        network.connect(&port(s, "outport"), &port(f, "inport")).unwrap();
        network.set_valid(f);

        assert!(network.disconnect(&port(f, "inport"), &port(s, "outport")));
        assert_eq!(
            network.processor(f).unwrap().invalidation_level(),
            InvalidationLevel::InvalidOutput
        );
        assert!(!network.disconnect(&port(s, "outport"), &port(f, "inport")));
        assert!(network.connected_ports(&port(s, "outport")).is_empty());
    }

    #[test]
    fn test_connect_invalidates_consumer_only() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        network.connect(&port(s, "outport"), &port(f, "inport")).unwrap();
        assert!(network.processor(s).unwrap().is_valid());
        assert!(!network.processor(f).unwrap().is_valid());
    }

    #[test]
    fn test_invalidation_reaches_chain() {
        let (mut network, [a, b, c]) = chain(false);
        assert_eq!(network.invalidate(a, InvalidationLevel::InvalidOutput), 3);
        for id in [b, c] {
            let level = network.processor(id).unwrap().invalidation_level();
            assert!(level >= InvalidationLevel::InvalidOutput);
        }
    }

    #[test]
    fn test_invalidation_terminates_on_cycle() {
        let (mut network, [a, b, c]) = chain(true);
        assert_eq!(network.invalidate(a, InvalidationLevel::InvalidOutput), 3);
        for id in [a, b, c] {
            assert_eq!(
                network.processor(id).unwrap().invalidation_level(),
                InvalidationLevel::InvalidOutput
            );
        }
    }

    #[test]
    fn test_invalidation_is_idempotent() {
        let (mut network, [a, b, _]) = chain(true);
        network.invalidate(b, InvalidationLevel::InvalidResample);
        let before = levels(&network);

        assert_eq!(network.invalidate(b, InvalidationLevel::InvalidResample), 0);
        assert_eq!(network.invalidate(b, InvalidationLevel::InvalidOutput), 0);
        assert_eq!(network.invalidate(a, InvalidationLevel::Valid), 0);
        assert_eq!(levels(&network), before);
    }

    #[test]
    fn test_resample_maps_to_output_downstream() {
        let (mut network, [a, b, c]) = chain(false);
        network.invalidate(a, InvalidationLevel::InvalidResample);
        assert_eq!(
            network.processor(a).unwrap().invalidation_level(),
            InvalidationLevel::InvalidResample
        );
        assert_eq!(
            network.processor(b).unwrap().invalidation_level(),
            InvalidationLevel::InvalidOutput
        );
        assert_eq!(
            network.processor(c).unwrap().invalidation_level(),
            InvalidationLevel::InvalidOutput
        );

        // Raising an already invalid node still walks on if its level grows
        network.invalidate(b, InvalidationLevel::InvalidResample);
        assert_eq!(
            network.processor(b).unwrap().invalidation_level(),
            InvalidationLevel::InvalidResample
        );
    }

    #[test]
    fn test_diamond_visits_each_once() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let l = network.create_processor(FILTER).unwrap();
        let r = network.create_processor(FILTER).unwrap();
        let k = network.create_processor(SINK).unwrap();
        network.connect(&port(s, "outport"), &port(l, "inport")).unwrap();
        network.connect(&port(s, "outport"), &port(r, "inport")).unwrap();
        network.connect(&port(l, "outport"), &port(k, "volumes")).unwrap();
        network.connect(&port(r, "outport"), &port(k, "volumes")).unwrap();
        reset(&mut network);

        assert_eq!(network.invalidate(s, InvalidationLevel::InvalidOutput), 4);
        assert_eq!(network.invalid_processors().first(), Some(&s));
        assert_eq!(network.invalid_processors().last(), Some(&k));
    }

    #[test]
    fn test_invalid_processors_in_dependency_order() {
        let (mut network, [a, b, c]) = chain(false);
        network.invalidate(a, InvalidationLevel::InvalidOutput);
        assert_eq!(network.invalid_processors(), vec![a, b, c]);

        network.set_valid(a);
        assert_eq!(network.invalid_processors(), vec![b, c]);
    }

    #[test]
    fn test_topological_order_detects_cycle() {
        let (network, _) = chain(true);
        assert!(network.topological_order().is_err());
        let (network, ids) = chain(false);
        assert_eq!(network.topological_order().unwrap(), ids.to_vec());
    }

    #[test]
    fn test_remove_processor_cascades() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        network.connect(&port(s, "outport"), &port(f, "inport")).unwrap();
        network.create_link(&prop(s, "int"), &prop(f, "float")).unwrap();
        network.create_link(&prop(f, "float"), &prop(s, "int")).unwrap();
        network.set_valid(f);

        let removed = network.remove_processor(s).unwrap();
        assert_eq!(removed.id, s);
        assert_eq!(network.connection_count(), 0);
        assert_eq!(network.link_count(), 0);
        assert!(network.connected_ports(&port(f, "inport")).is_empty());
        assert!(!network.processor(f).unwrap().is_valid());
        assert!(network.remove_processor(s).is_none());
    }

    #[test]
    fn test_property_write_invalidates_owner_and_downstream() {
        let (mut network, [a, b, c]) = chain(false);
        network
            .set_property_value(&prop(b, "resample"), PropertyValue::Double(2.0))
            .unwrap();
        assert!(network.processor(a).unwrap().is_valid());
        assert_eq!(
            network.processor(b).unwrap().invalidation_level(),
            InvalidationLevel::InvalidResample
        );
        assert_eq!(
            network.processor(c).unwrap().invalidation_level(),
            InvalidationLevel::InvalidOutput
        );
    }

    #[test]
    fn test_unchanged_write_is_silent() {
        let (mut network, [a, ..]) = chain(false);
        network.set_property_value(&prop(a, "float"), PropertyValue::Float(0.0)).unwrap();
        assert!(network.processor(a).unwrap().is_valid());
    }

    #[test]
    fn test_property_write_errors() {
        let (mut network, [a, ..]) = chain(false);
        assert!(matches!(
            network.set_property_value(&prop(a, "float"), PropertyValue::Int(1)),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            network.set_property_value(&prop(a, "missing"), PropertyValue::Int(1)),
            Err(PropertyError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn test_link_requires_converter() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let k = network.create_processor(SINK).unwrap();

        assert!(!network.can_link(&prop(s, "enabled"), &prop(k, "color")));
        assert!(matches!(
            network.create_link(&prop(s, "enabled"), &prop(k, "color")),
            Err(LinkError::NoConverter { .. })
        ));
        assert_eq!(network.link_count(), 0);

        // Evaluating anyway leaves the destination untouched
        assert!(!network.evaluate_link(&prop(s, "enabled"), &prop(k, "color")).unwrap());
        assert_eq!(
            network.property(&prop(k, "color")).unwrap().value(),
            &PropertyValue::Vec4([0.0; 4])
        );
    }

    #[test]
    fn test_link_creation_errors() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();

        assert!(matches!(
            network.create_link(&prop(s, "int"), &prop(s, "int")),
            Err(LinkError::SameProperty)
        ));
        assert!(matches!(
            network.create_link(&prop(s, "nope"), &prop(f, "float")),
            Err(LinkError::PropertyNotFound(_))
        ));
        network.create_link(&prop(s, "int"), &prop(f, "float")).unwrap();
        assert!(matches!(
            network.create_link(&prop(s, "int"), &prop(f, "float")),
            Err(LinkError::AlreadyLinked(..))
        ));
        assert!(matches!(
            network.evaluate_link(&prop(s, "nope"), &prop(f, "float")),
            Err(LinkError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn test_link_propagates_converted_value() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        network.create_link(&prop(s, "int"), &prop(f, "float")).unwrap();

        network.set_property_value(&prop(s, "int"), PropertyValue::Int(5)).unwrap();
        assert_eq!(
            network.property(&prop(f, "float")).unwrap().value(),
            &PropertyValue::Float(5.0)
        );
        assert_eq!(
            network.processor(f).unwrap().invalidation_level(),
            InvalidationLevel::InvalidOutput
        );

        // Converging: evaluating again does not change anything
        reset(&mut network);
        assert!(!network.evaluate_link(&prop(s, "int"), &prop(f, "float")).unwrap());
        assert!(network.processor(f).unwrap().is_valid());
    }

    #[test]
    fn test_bidirectional_link_terminates() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        let [forward, backward] =
            network.create_bidirectional_link(&prop(s, "int"), &prop(f, "float"));
        assert!(forward.is_ok() && backward.is_ok());

        network.set_property_value(&prop(f, "float"), PropertyValue::Float(2.6)).unwrap();
        assert_eq!(network.property(&prop(s, "int")).unwrap().value(), &PropertyValue::Int(3));
        // The origin is not overwritten by the round trip
        assert_eq!(
            network.property(&prop(f, "float")).unwrap().value(),
            &PropertyValue::Float(2.6)
        );
    }

    #[test]
    fn test_bidirectional_link_directions_independent() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let k = network.create_processor(SINK).unwrap();

        // Any type formats into a string, but a string never parses into a vector
        let [forward, backward] =
            network.create_bidirectional_link(&prop(k, "color"), &prop(k, "label"));
        assert!(forward.is_ok());
        assert!(matches!(backward, Err(LinkError::NoConverter { .. })));
        assert_eq!(network.link_count(), 1);

        // Widening one way, registered narrowing the other
        let [forward, backward] =
            network.create_bidirectional_link(&prop(s, "enabled"), &prop(s, "int"));
        assert!(forward.is_ok() && backward.is_ok());

        network
            .set_property_value(&prop(k, "color"), PropertyValue::Vec4([1.0, 0.5, 0.0, 1.0]))
            .unwrap();
        assert_eq!(
            network.property(&prop(k, "label")).unwrap().value(),
            &PropertyValue::String("(1, 0.5, 0, 1)".to_string())
        );
    }

    #[test]
    fn test_unlink_stops_propagation() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        let k = network.create_processor(SINK).unwrap();
        let to_float = network.create_link(&prop(s, "int"), &prop(f, "float")).unwrap();
        network.create_link(&prop(s, "int"), &prop(k, "label")).unwrap();

        let source = prop(s, "int");
        assert_eq!(network.links_from(&source).count(), 2);
        assert_eq!(network.link(to_float).unwrap().destination, prop(f, "float"));

        assert!(network.unlink(&prop(s, "int"), &prop(k, "label")));
        assert!(!network.unlink(&prop(s, "int"), &prop(k, "label")));
        assert!(network.remove_link(to_float).is_some());
        assert!(network.remove_link(to_float).is_none());
        assert!(network.link(to_float).is_none());
        assert_eq!(network.link_count(), 0);

        reset(&mut network);
        network.set_property_value(&source, PropertyValue::Int(7)).unwrap();
        assert_eq!(
            network.property(&prop(f, "float")).unwrap().value(),
            &PropertyValue::Float(0.0)
        );
        assert_eq!(
            network.property(&prop(k, "label")).unwrap().value(),
            &PropertyValue::String(String::new())
        );
        assert!(network.processor(f).unwrap().is_valid());
        assert!(network.processor(k).unwrap().is_valid());
    }

    #[test]
    fn test_link_diamond_keeps_direct_value() {
        // A -> B -> C and A -> C, where going through B loses precision
        let mut network = Network::new(runtime());
        let a = network.create_processor(SOURCE).unwrap();
        let b = network.create_processor(FILTER).unwrap();
        let c = network.create_processor(FILTER).unwrap();
        network.create_link(&prop(b, "float"), &prop(c, "resample")).unwrap();
        network.create_link(&prop(a, "int"), &prop(b, "float")).unwrap();
        network.create_link(&prop(a, "int"), &prop(c, "resample")).unwrap();

        network
            .set_property_value(&prop(a, "int"), PropertyValue::Int(16_777_217))
            .unwrap();
        assert_eq!(
            network.property(&prop(b, "float")).unwrap().value(),
            &PropertyValue::Float(16_777_216.0)
        );
        assert_eq!(
            network.property(&prop(c, "resample")).unwrap().value(),
            &PropertyValue::Double(16_777_217.0)
        );
    }

    #[test]
    fn test_replace_property_prunes_unconvertible_links() {
        let mut network = Network::new(runtime());
        let s = network.create_processor(SOURCE).unwrap();
        let f = network.create_processor(FILTER).unwrap();
        network.create_link(&prop(s, "int"), &prop(f, "float")).unwrap();

        let previous = network
            .replace_property(
                &prop(f, "float"),
                Property::new("x", "Color", PropertyValue::Vec3([0.0; 3])),
            )
            .unwrap();
        assert_eq!(previous.value(), &PropertyValue::Float(0.0));
        assert_eq!(network.link_count(), 0);
        assert!(network.property(&prop(f, "float")).is_some());

        // The degraded pair is a no-op on evaluation
        assert!(!network.evaluate_link(&prop(s, "int"), &prop(f, "float")).unwrap());
    }
}
