//! Tool, resource, prompt and custom method registries
//!
//! Entries keep registration order. Registering an existing name replaces
//! the entry in place, so listings stay stable across re-registration.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{ Prompt, Resource, ServerCapabilities, Tool };

use super::handlers::{ Handler, MethodHandler };
use super::uri_template::UriTemplate;

/// A tool and its handler
#[derive(Clone)]
pub struct RegisteredTool {
    pub tool: Tool,
    pub handler: Handler,
}

/// A resource pattern and its handler
#[derive(Clone)]
pub struct RegisteredResource {
    pub resource: Resource,
    pub template: UriTemplate,
    pub handler: Handler,
}

/// A prompt and its handler
#[derive(Clone)]
pub struct RegisteredPrompt {
    pub prompt: Prompt,
    pub handler: Handler,
}

/// All registries of a server, guarded together by one lock
#[derive(Default)]
pub struct Registries {
    tools: Vec<RegisteredTool>,
    resources: Vec<RegisteredResource>,
    prompts: Vec<RegisteredPrompt>,
    methods: HashMap<String, MethodHandler>,
}

/// Insert or replace in place, keyed by `key`
fn upsert<T>(entries: &mut Vec<T>, entry: T, key: impl Fn(&T) -> &str) {
    let position = entries.iter().position(|existing| key(existing) == key(&entry));
    match position {
        Some(index) => {
            entries[index] = entry;
        }
        None => entries.push(entry),
    }
}

impl Registries {
    pub fn insert_tool(&mut self, tool: Tool, handler: Handler) {
        upsert(&mut self.tools, RegisteredTool { tool, handler }, |entry| entry.tool.name.as_str());
    }

    pub fn insert_resource(&mut self, resource: Resource, handler: Handler) {
        let template = UriTemplate::parse(&resource.uri);
        if !template.is_static() {
            debug!("Resource pattern {} binds {:?}", template.pattern(), template.param_names());
        }
        upsert(&mut self.resources, RegisteredResource { resource, template, handler }, |entry| {
            entry.template.pattern()
        });
    }

    pub fn insert_prompt(&mut self, prompt: Prompt, handler: Handler) {
        upsert(&mut self.prompts, RegisteredPrompt { prompt, handler }, |entry| entry.prompt.name.as_str());
    }

    pub fn insert_method(&mut self, name: String, handler: MethodHandler) {
        self.methods.insert(name, handler);
    }

    pub fn tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|entry| entry.tool.name == name)
    }

    pub fn prompt(&self, name: &str) -> Option<&RegisteredPrompt> {
        self.prompts.iter().find(|entry| entry.prompt.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodHandler> {
        self.methods.get(name)
    }

    /// First resource whose pattern matches `uri`, with its captures
    pub fn match_resource(&self, uri: &str) -> Option<(&RegisteredResource, Vec<String>)> {
        self.resources
            .iter()
            .find_map(|entry| entry.template.matches(uri).map(|captures| (entry, captures)))
    }

    /// Capabilities derived from which registries are non-empty
    pub fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::derive(
            !self.tools.is_empty(),
            !self.resources.is_empty(),
            !self.prompts.is_empty()
        )
    }

    /// Tools as advertised by `tools/list`
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|entry| entry.tool.with_defaults())
            .collect()
    }

    /// Resources as advertised by `resources/list`
    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources
            .iter()
            .map(|entry| {
                let mut resource = entry.resource.clone();
                if resource.description.is_none() {
                    resource.description = Some(format!("Resource: {}", resource.uri));
                }
                resource
            })
            .collect()
    }

    /// Prompts as advertised by `prompts/list`
    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts
            .iter()
            .map(|entry| {
                let mut prompt = entry.prompt.clone();
                if prompt.description.is_none() {
                    prompt.description = Some(format!("Prompt: {}", prompt.name));
                }
                prompt
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{ Value, json };
    use std::sync::Arc;

    fn constant(value: Value) -> Handler {
        Arc::new(move |_: Vec<Value>| -> anyhow::Result<Value> { Ok(value.clone()) })
    }

    #[test]
    fn test_empty_registries_advertise_nothing() {
        assert!(Registries::default().capabilities().is_empty());
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let mut registries = Registries::default();
        registries.insert_tool(Tool::new("a"), constant(json!(1)));
        registries.insert_tool(Tool::new("b"), constant(json!(2)));
        registries.insert_tool(Tool::new("a").with_description("second"), constant(json!(3)));

        let names: Vec<String> = registries
            .list_tools()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let entry = registries.tool("a").unwrap();
        assert_eq!(entry.tool.description.as_deref(), Some("second"));
        assert_eq!((entry.handler)(vec![]).unwrap(), json!(3));
    }

    #[test]
    fn test_first_matching_resource_wins() {
        let mut registries = Registries::default();
        registries.insert_resource(Resource::new("test://static"), constant(json!("static")));
        registries.insert_resource(Resource::new("test://{id}"), constant(json!("dynamic")));

        let (entry, captures) = registries.match_resource("test://static").unwrap();
        assert_eq!(entry.resource.uri, "test://static");
        assert!(captures.is_empty());

        let (entry, captures) = registries.match_resource("test://123").unwrap();
        assert_eq!(entry.resource.uri, "test://{id}");
        assert_eq!(captures, vec!["123"]);

        assert!(registries.match_resource("x://y").is_none());
    }

    #[test]
    fn test_reregistered_resource_pattern_replaces_in_place() {
        let mut registries = Registries::default();
        registries.insert_resource(Resource::new("test://{id}"), constant(json!("first")));
        registries.insert_resource(Resource::new("test://static"), constant(json!("static")));
        registries.insert_resource(Resource::new("test://{id}"), constant(json!("second")));

        let uris: Vec<String> = registries
            .list_resources()
            .into_iter()
            .map(|resource| resource.uri)
            .collect();
        assert_eq!(uris, vec!["test://{id}", "test://static"]);

        let (entry, _) = registries.match_resource("test://7").unwrap();
        assert_eq!((entry.handler)(vec![]).unwrap(), json!("second"));
    }

    #[test]
    fn test_listing_fills_default_descriptions() {
        let mut registries = Registries::default();
        registries.insert_resource(Resource::new("test://{id}"), constant(json!(null)));
        registries.insert_prompt(Prompt::new("greeting"), constant(json!(null)));

        let resources = registries.list_resources();
        assert_eq!(resources[0].description.as_deref(), Some("Resource: test://{id}"));
        assert_eq!(resources[0].name, "test://{id}");

        let prompts = registries.list_prompts();
        assert_eq!(prompts[0].description.as_deref(), Some("Prompt: greeting"));

        assert_eq!(registries.capabilities(), ServerCapabilities::derive(false, true, true));
    }
}
