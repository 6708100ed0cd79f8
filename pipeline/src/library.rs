use glam::Vec2;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::graph::{Component, ComponentId, ComponentKind, Port, PortDataType};

/// Components added from the palette spawn at a fixed canvas position and are
/// then dragged into place.
pub const SPAWN_POSITION: Vec2 = Vec2::new(100.0, 100.0);

/// A palette entry that stamps out fresh components.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTemplate {
    pub kind: ComponentKind,
    pub subtype: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Port>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Port>,
}

impl ComponentTemplate {
    pub fn instantiate(&self) -> Component {
        Component {
            id: ComponentId::unique(),
            kind: self.kind,
            subtype: self.subtype.clone(),
            name: self.name.clone(),
            config: self.config.clone(),
            position: SPAWN_POSITION,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ComponentLibrary {
    templates: Vec<ComponentTemplate>,
}

impl ComponentLibrary {
    pub fn templates(&self) -> &[ComponentTemplate] {
        self.templates.as_slice()
    }

    pub fn template(&self, index: usize) -> Option<&ComponentTemplate> {
        self.templates.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&ComponentTemplate> {
        self.templates.iter().find(|template| template.name == name)
    }

    pub fn add(&mut self, template: ComponentTemplate) {
        self.templates.push(template);
    }

    /// The built-in palette of the pipeline builder.
    pub fn standard() -> Self {
        let mut library = ComponentLibrary::default();

        library.add(ComponentTemplate {
            kind: ComponentKind::Input,
            subtype: "text".to_string(),
            name: "Text Input".to_string(),
            config: config([("placeholder", json!("Enter text"))]),
            inputs: vec![],
            outputs: vec![Port::new("output", "Output", PortDataType::Text)],
        });

        library.add(ComponentTemplate {
            kind: ComponentKind::Model,
            subtype: "classification".to_string(),
            name: "Text Classifier".to_string(),
            config: config([
                ("modelId", json!("model-bert-base")),
                ("maxLength", json!(512)),
            ]),
            inputs: vec![Port::new("input", "Input", PortDataType::Text).required()],
            outputs: vec![Port::new("output", "Output", PortDataType::Json)],
        });

        library.add(ComponentTemplate {
            kind: ComponentKind::Model,
            subtype: "generation".to_string(),
            name: "Text Generator".to_string(),
            config: config([
                ("modelId", json!("model-gpt")),
                ("temperature", json!(0.7)),
                ("maxTokens", json!(100)),
            ]),
            inputs: vec![Port::new("input", "Prompt", PortDataType::Text).required()],
            outputs: vec![Port::new("output", "Generated Text", PortDataType::Text)],
        });

        library.add(ComponentTemplate {
            kind: ComponentKind::DataProcessor,
            subtype: "transformer".to_string(),
            name: "Text Transformer".to_string(),
            config: config([("operations", json!(["toLowerCase", "trim"]))]),
            inputs: vec![Port::new("input", "Input", PortDataType::Text).required()],
            outputs: vec![Port::new("output", "Output", PortDataType::Text)],
        });

        library.add(ComponentTemplate {
            kind: ComponentKind::Output,
            subtype: "json".to_string(),
            name: "JSON Output".to_string(),
            config: HashMap::new(),
            inputs: vec![Port::new("input", "Input", PortDataType::Any).required()],
            outputs: vec![],
        });

        library
    }
}

fn config<const N: usize>(
    entries: [(&str, serde_json::Value); N],
) -> HashMap<String, serde_json::Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn standard_palette_has_five_entries() {
        let library = ComponentLibrary::standard();
        assert_eq!(library.templates().len(), 5);
        assert!(library.by_name("Text Classifier").is_some());
        assert!(library.by_name("JSON Output").is_some());
    }

    #[test]
    fn instantiate_produces_unique_components() {
        let library = ComponentLibrary::standard();
        let template = library.by_name("Text Input").unwrap();

        let a = template.instantiate();
        let b = template.instantiate();

        assert_ne!(a.id, b.id);
        assert_eq!(a.position, vec2(100.0, 100.0));
        assert_eq!(a.outputs.len(), 1);
        assert!(a.inputs.is_empty());
        assert_eq!(a.config.get("placeholder"), Some(&json!("Enter text")));
    }

    #[test]
    fn classifier_input_is_required() {
        let library = ComponentLibrary::standard();
        let classifier = library.by_name("Text Classifier").unwrap().instantiate();
        assert!(classifier.input("input").unwrap().required);
        assert_eq!(
            classifier.output("output").unwrap().data_type,
            PortDataType::Json
        );
    }
}
