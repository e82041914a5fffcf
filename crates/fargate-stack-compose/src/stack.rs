//! Stacks and the app that owns them.

use fargate_stack_common::error::Result;
use fargate_stack_common::types::Tags;

use crate::declaration::{Declaration, ResourceId, ResourceSpec};
use crate::graph::DeclarationGraph;

/// Account and region a stack deploys to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEnvironment {
    /// Target account id.
    pub account: String,
    /// Target region.
    pub region: String,
}

/// A named declaration graph bound to one account and region.
#[derive(Debug)]
pub struct Stack {
    id: String,
    environment: StackEnvironment,
    description: String,
    graph: DeclarationGraph,
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new(id: impl Into<String>, environment: StackEnvironment) -> Self {
        let id = id.into();
        Self {
            description: format!("{id} web application stack"),
            id,
            environment,
            graph: DeclarationGraph::new(),
        }
    }

    /// Stack identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Target account and region.
    #[must_use]
    pub const fn environment(&self) -> &StackEnvironment {
        &self.environment
    }

    /// Human-readable description rendered into the manifest.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The declaration graph.
    #[must_use]
    pub const fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    /// Id of a direct child of this stack.
    #[must_use]
    pub fn child(&self, name: &str) -> ResourceId {
        ResourceId::new(format!("{}/{name}", self.id))
    }

    /// Declares a direct child of this stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the spec references an
    /// undeclared id.
    pub fn declare(&mut self, name: &str, spec: ResourceSpec) -> Result<ResourceId> {
        let id = self.child(name);
        self.graph.declare(id, spec)
    }

    /// Returns the declaration with the given id.
    #[must_use]
    pub fn get(&self, id: &ResourceId) -> Option<&Declaration> {
        self.graph.get(id)
    }

    fn apply_tags(&mut self, tags: &Tags) {
        self.graph.apply_tags(tags);
    }
}

/// Root of the declaration tree.
#[derive(Debug, Default)]
pub struct App {
    stacks: Vec<Stack>,
}

impl App {
    /// Creates an app without stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stack.
    pub fn add_stack(&mut self, stack: Stack) {
        self.stacks.push(stack);
    }

    /// Stacks in insertion order.
    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Returns the stack with the given id.
    #[must_use]
    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Applies every tag to every taggable declaration of every stack.
    pub fn apply_tags(&mut self, tags: &Tags) {
        tracing::debug!(count = tags.len(), "applying global tags");
        for stack in &mut self.stacks {
            stack.apply_tags(tags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{IpProtocol, ResourceKind, VpcSpec};

    fn env() -> StackEnvironment {
        StackEnvironment {
            account: "000000000000".into(),
            region: "eu-central-1".into(),
        }
    }

    fn vpc() -> ResourceSpec {
        ResourceSpec::Vpc(VpcSpec {
            max_azs: 2,
            nat_gateways: None,
            ip_protocol: IpProtocol::DualStack,
        })
    }

    #[test]
    fn child_ids_are_namespaced_by_stack() {
        let stack = Stack::new("DemoTodo", env());
        assert_eq!(stack.child("Vpc").as_str(), "DemoTodo/Vpc");
    }

    #[test]
    fn app_tags_reach_every_stack() {
        let mut app = App::new();
        for id in ["One", "Two"] {
            let mut stack = Stack::new(id, env());
            let _ = stack.declare("Vpc", vpc()).expect("vpc");
            app.add_stack(stack);
        }
        let mut tags = Tags::new();
        let _ = tags.insert("Environment".into(), "dev".into());
        app.apply_tags(&tags);

        for stack in app.stacks() {
            let vpc = stack
                .graph()
                .of_kind(ResourceKind::Vpc)
                .next()
                .expect("vpc");
            assert_eq!(vpc.tags, tags);
        }
        assert!(app.stack("Two").is_some());
        assert!(app.stack("Three").is_none());
    }
}
