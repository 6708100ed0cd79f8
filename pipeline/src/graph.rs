use glam::Vec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use common::id_type;
use common::normalize_string::NormalizeString;

id_type!(PipelineId);
id_type!(ComponentId);
id_type!(ConnectionId);

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ComponentKind {
    #[default]
    Input,
    Model,
    DataProcessor,
    Logic,
    Output,
    Connector,
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PortDataType {
    Text,
    Json,
    #[default]
    Any,
}

/// A named, typed connection point on a component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: PortDataType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl Port {
    pub fn new(id: &str, name: &str, data_type: PortDataType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub subtype: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, serde_json::Value>,
    pub position: Vec2,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Port>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Port>,
}

impl Default for Component {
    fn default() -> Self {
        Component {
            id: ComponentId::unique(),
            kind: ComponentKind::default(),
            subtype: String::new(),
            name: String::new(),
            config: HashMap::new(),
            position: Vec2::ZERO,
            inputs: vec![],
            outputs: vec![],
        }
    }
}

impl Component {
    pub fn input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|port| port.id == port_id)
    }
    pub fn output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|port| port.id == port_id)
    }
}

/// Reference to a specific port on a specific component.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub component_id: ComponentId,
    pub port_id: String,
}

impl PortRef {
    pub fn new(component_id: ComponentId, port_id: &str) -> Self {
        Self {
            component_id,
            port_id: port_id.to_string(),
        }
    }
}

/// A directed link from one component's output port to another component's
/// input port.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub source_id: ComponentId,
    pub source_port: String,
    pub target_id: ComponentId,
    pub target_port: String,
}

impl Connection {
    pub fn links(&self, source: &PortRef, target: &PortRef) -> bool {
        self.source_id == source.component_id
            && self.source_port == source.port_id
            && self.target_id == target.component_id
            && self.target_port == target.port_id
    }
}

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Cannot connect a component to itself")]
    SelfConnection,
    #[error("Connection already exists")]
    Duplicate,
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),
    #[error("Component {component_id} has no port named {port_id}")]
    UnknownPort {
        component_id: ComponentId,
        port_id: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline {
            id: PipelineId::unique(),
            name: String::new(),
            description: None,
            components: vec![],
            connections: vec![],
        }
    }
}

impl Pipeline {
    pub fn named(name: &str) -> Self {
        Pipeline {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn components(&self) -> &[Component] {
        self.components.as_slice()
    }
    pub fn connections(&self) -> &[Connection] {
        self.connections.as_slice()
    }

    pub fn add_component(&mut self, component: Component) {
        match self.components.iter().position(|c| c.id == component.id) {
            Some(index) => self.components[index] = component,
            None => self.components.push(component),
        }
    }

    /// Removes a component and every connection incident to it.
    /// Returns the cascaded connections so callers can record them.
    pub fn remove_component(&mut self, id: ComponentId) -> Vec<Connection> {
        assert!(!id.is_nil());

        self.components.retain(|component| component.id != id);

        let (removed, kept): (Vec<Connection>, Vec<Connection>) = self
            .connections
            .drain(..)
            .partition(|connection| connection.source_id == id || connection.target_id == id);
        self.connections = kept;
        removed
    }

    pub fn component_by_id(&self, id: ComponentId) -> Option<&Component> {
        assert!(!id.is_nil());
        self.components.iter().find(|component| component.id == id)
    }
    pub fn component_by_id_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        assert!(!id.is_nil());
        self.components
            .iter_mut()
            .find(|component| component.id == id)
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.name == name)
    }

    pub fn connection_by_id(&self, id: ConnectionId) -> Option<&Connection> {
        assert!(!id.is_nil());
        self.connections
            .iter()
            .find(|connection| connection.id == id)
    }

    pub fn component_index_by_id(&self) -> HashMap<ComponentId, usize> {
        let mut map = HashMap::with_capacity(self.components.len());
        for (index, component) in self.components.iter().enumerate() {
            let prev = map.insert(component.id, index);
            assert!(
                prev.is_none(),
                "Duplicate component id detected: {:?}",
                component.id
            );
        }
        map
    }

    /// Validates and appends a new connection from an output port to an
    /// input port. The edge list is left untouched on rejection.
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> Result<ConnectionId, ConnectError> {
        if source.component_id == target.component_id {
            return Err(ConnectError::SelfConnection);
        }

        let source_component = self
            .component_by_id(source.component_id)
            .ok_or(ConnectError::UnknownComponent(source.component_id))?;
        source_component
            .output(&source.port_id)
            .ok_or_else(|| ConnectError::UnknownPort {
                component_id: source.component_id,
                port_id: source.port_id.clone(),
            })?;

        let target_component = self
            .component_by_id(target.component_id)
            .ok_or(ConnectError::UnknownComponent(target.component_id))?;
        target_component
            .input(&target.port_id)
            .ok_or_else(|| ConnectError::UnknownPort {
                component_id: target.component_id,
                port_id: target.port_id.clone(),
            })?;

        if self
            .connections
            .iter()
            .any(|connection| connection.links(&source, &target))
        {
            return Err(ConnectError::Duplicate);
        }

        let connection = Connection {
            id: ConnectionId::unique(),
            source_id: source.component_id,
            source_port: source.port_id,
            target_id: target.component_id,
            target_port: target.port_id,
        };
        let id = connection.id;
        self.connections.push(connection);
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self
            .connections
            .iter()
            .position(|connection| connection.id == id)?;
        Some(self.connections.remove(index))
    }

    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(&self)
            .expect("Failed to serialize pipeline to YAML")
            .normalize()
    }
    pub fn serialize(&self, format: common::FileFormat) -> String {
        common::serialize(self, format)
    }
    pub fn deserialize(serialized: &str, format: common::FileFormat) -> anyhow::Result<Pipeline> {
        let pipeline: Pipeline = common::deserialize(serialized, format)?;

        pipeline.validate()?;

        Ok(pipeline)
    }
    pub fn from_yaml_file(path: &str) -> anyhow::Result<Pipeline> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Pipeline> {
        let pipeline: Pipeline = serde_yml::from_str(yaml)?;

        pipeline.validate()?;

        Ok(pipeline)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.id.is_nil() {
            return Err(anyhow::Error::msg("Pipeline has invalid id"));
        }

        let index = {
            let mut map = HashMap::with_capacity(self.components.len());
            for (i, component) in self.components.iter().enumerate() {
                if component.id.is_nil() {
                    return Err(anyhow::Error::msg("Component has invalid id"));
                }
                if !component.position.is_finite() {
                    return Err(anyhow::Error::msg("Component position must be finite"));
                }
                if map.insert(component.id, i).is_some() {
                    return Err(anyhow::Error::msg("Duplicate component id detected"));
                }
            }
            map
        };

        for connection in self.connections.iter() {
            if connection.source_id == connection.target_id {
                return Err(anyhow::Error::msg("Connection forms a self-loop"));
            }

            let source = index
                .get(&connection.source_id)
                .map(|&i| &self.components[i])
                .ok_or_else(|| anyhow::Error::msg("Connection source component not found"))?;
            if source.output(&connection.source_port).is_none() {
                return Err(anyhow::Error::msg("Connection source port not found"));
            }

            let target = index
                .get(&connection.target_id)
                .map(|&i| &self.components[i])
                .ok_or_else(|| anyhow::Error::msg("Connection target component not found"))?;
            if target.input(&connection.target_port).is_none() {
                return Err(anyhow::Error::msg("Connection target port not found"));
            }
        }

        for (i, a) in self.connections.iter().enumerate() {
            for b in self.connections.iter().skip(i + 1) {
                if a.source_id == b.source_id
                    && a.source_port == b.source_port
                    && a.target_id == b.target_id
                    && a.target_port == b.target_port
                {
                    return Err(anyhow::Error::msg("Duplicate connection detected"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn source_component(name: &str) -> Component {
        Component {
            name: name.to_string(),
            kind: ComponentKind::Input,
            subtype: "text".to_string(),
            outputs: vec![Port::new("out", "Output", PortDataType::Text)],
            ..Default::default()
        }
    }

    fn sink_component(name: &str) -> Component {
        Component {
            name: name.to_string(),
            kind: ComponentKind::Output,
            subtype: "json".to_string(),
            inputs: vec![Port::new("in", "Input", PortDataType::Any).required()],
            ..Default::default()
        }
    }

    fn linked_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::named("test");
        let a = source_component("a");
        let b = sink_component("b");
        let a_id = a.id;
        let b_id = b.id;
        pipeline.add_component(a);
        pipeline.add_component(b);
        pipeline
            .connect(PortRef::new(a_id, "out"), PortRef::new(b_id, "in"))
            .unwrap();
        pipeline
    }

    #[test]
    fn two_click_connect_scenario() {
        let mut pipeline = Pipeline::named("scenario");
        let a = source_component("A");
        let b = sink_component("B");
        let a_id = a.id;
        let b_id = b.id;
        pipeline.add_component(a);
        pipeline.add_component(b);

        pipeline
            .connect(PortRef::new(a_id, "out"), PortRef::new(b_id, "in"))
            .unwrap();
        assert_eq!(pipeline.connections().len(), 1);
        assert_eq!(pipeline.connections()[0].source_id, a_id);
        assert_eq!(pipeline.connections()[0].target_id, b_id);

        pipeline.remove_component(a_id);
        assert_eq!(pipeline.connections().len(), 0);
        assert_eq!(pipeline.components().len(), 1);
        assert_eq!(pipeline.components()[0].id, b_id);
    }

    #[test]
    fn remove_component_cascades_connections() {
        let mut pipeline = linked_pipeline();
        let b_id = pipeline.component_by_name("b").unwrap().id;

        let removed = pipeline.remove_component(b_id);

        assert_eq!(removed.len(), 1);
        assert!(pipeline.component_by_name("b").is_none());
        for connection in pipeline.connections() {
            assert_ne!(connection.source_id, b_id);
            assert_ne!(connection.target_id, b_id);
        }
    }

    #[test]
    fn self_connection_rejected() {
        let mut pipeline = Pipeline::named("test");
        let mut component = source_component("a");
        component
            .inputs
            .push(Port::new("in", "Input", PortDataType::Any));
        let id = component.id;
        pipeline.add_component(component);

        let result = pipeline.connect(PortRef::new(id, "out"), PortRef::new(id, "in"));
        assert_eq!(result, Err(ConnectError::SelfConnection));
        assert!(pipeline.connections().is_empty());
    }

    #[test]
    fn duplicate_connection_rejected() {
        let mut pipeline = linked_pipeline();
        let a_id = pipeline.component_by_name("a").unwrap().id;
        let b_id = pipeline.component_by_name("b").unwrap().id;

        let result = pipeline.connect(PortRef::new(a_id, "out"), PortRef::new(b_id, "in"));
        assert_eq!(result, Err(ConnectError::Duplicate));
        assert_eq!(pipeline.connections().len(), 1);
    }

    #[test]
    fn unknown_port_rejected() {
        let mut pipeline = linked_pipeline();
        let a_id = pipeline.component_by_name("a").unwrap().id;
        let b_id = pipeline.component_by_name("b").unwrap().id;

        let result = pipeline.connect(PortRef::new(a_id, "missing"), PortRef::new(b_id, "in"));
        assert!(matches!(result, Err(ConnectError::UnknownPort { .. })));

        let result = pipeline.connect(
            PortRef::new(ComponentId::unique(), "out"),
            PortRef::new(b_id, "in"),
        );
        assert!(matches!(result, Err(ConnectError::UnknownComponent(_))));
        assert_eq!(pipeline.connections().len(), 1);
    }

    #[test]
    fn add_component_replaces_on_same_id() {
        let mut pipeline = Pipeline::named("test");
        let mut component = source_component("first");
        let id = component.id;
        pipeline.add_component(component.clone());

        component.name = "second".to_string();
        pipeline.add_component(component);

        assert_eq!(pipeline.components().len(), 1);
        assert_eq!(pipeline.component_by_id(id).unwrap().name, "second");
    }

    #[test]
    fn yaml_round_trip() -> anyhow::Result<()> {
        let mut pipeline = linked_pipeline();
        pipeline
            .component_by_id_mut(pipeline.components()[0].id)
            .unwrap()
            .position = vec2(120.0, 40.0);

        let yaml = pipeline.to_yaml();
        let restored = Pipeline::from_yaml(&yaml)?;

        assert_eq!(restored.components().len(), 2);
        assert_eq!(restored.connections().len(), 1);
        assert_eq!(restored.components()[0].position, vec2(120.0, 40.0));
        Ok(())
    }

    #[test]
    fn json_format_round_trip() -> anyhow::Result<()> {
        let pipeline = linked_pipeline();

        let json = pipeline.serialize(common::FileFormat::Json);
        let restored = Pipeline::deserialize(&json, common::FileFormat::Json)?;

        assert_eq!(restored.id, pipeline.id);
        assert_eq!(restored.connections().len(), 1);
        Ok(())
    }

    #[test]
    fn validate_rejects_dangling_connection() {
        let mut pipeline = linked_pipeline();
        // Forcibly orphan the connection, bypassing remove_component's cascade.
        pipeline.components.remove(0);
        assert!(pipeline.validate().is_err());
    }
}
