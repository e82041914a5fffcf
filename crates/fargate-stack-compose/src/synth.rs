//! Rendering stacks into declaration manifests.
//!
//! A manifest lists every declaration under its logical id with its type,
//! properties, dependencies, tags and removal policy. References inside
//! properties are already rendered as `Ref` / `Fn::GetAtt` objects.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fargate_stack_common::constants::APP_NAME;
use fargate_stack_common::error::{Result, StackError};
use fargate_stack_common::types::Tags;
use serde::Serialize;

use crate::stack::{App, Stack};

/// Manifest serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(StackError::Config {
                message: format!("unknown output format \"{other}\", expected json or yaml"),
            }),
        }
    }
}

/// Rendered manifest of one stack.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    /// Stack description.
    pub description: String,
    /// Target account and region.
    pub environment: TemplateEnvironment,
    /// Declarations keyed by logical id.
    pub resources: BTreeMap<String, TemplateResource>,
}

/// Account and region in a rendered manifest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateEnvironment {
    /// Target account id.
    pub account: String,
    /// Target region.
    pub region: String,
}

/// One rendered declaration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    /// Declaration type name.
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Construct path the declaration was created at.
    pub path: String,
    /// Desired-state properties.
    pub properties: serde_json::Value,
    /// Logical ids this declaration depends on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Tags applied to the resource.
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    /// Deletion policy for stateful resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_policy: Option<String>,
}

/// Renders one stack into a manifest.
///
/// # Errors
///
/// Returns an error if the graph has a cycle or properties fail to serialize.
pub fn render_stack(stack: &Stack) -> Result<Template> {
    let graph = stack.graph();
    let mut resources = BTreeMap::new();
    for declaration in graph.resolve_order()? {
        let resource = TemplateResource {
            resource_type: declaration.kind().type_name().to_string(),
            path: declaration.id.to_string(),
            properties: serde_json::to_value(&declaration.spec)?,
            depends_on: graph
                .dependencies(&declaration.id)
                .into_iter()
                .map(crate::declaration::ResourceId::logical_id)
                .collect(),
            tags: declaration.tags.clone(),
            removal_policy: declaration
                .removal_policy()
                .map(|policy| policy.deletion_policy().to_string()),
        };
        if resources
            .insert(declaration.id.logical_id(), resource)
            .is_some()
        {
            return Err(StackError::DuplicateDeclaration {
                id: declaration.id.logical_id(),
            });
        }
    }
    Ok(Template {
        description: stack.description().to_string(),
        environment: TemplateEnvironment {
            account: stack.environment().account.clone(),
            region: stack.environment().region.clone(),
        },
        resources,
    })
}

/// Serializes a manifest in the given format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_string(template: &Template, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(template)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(template)?),
    }
}

/// Index of the manifests written by [`write_assembly`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyManifest {
    /// Producer name.
    pub producer: String,
    /// One entry per stack.
    pub stacks: Vec<AssemblyStack>,
}

/// One stack in an [`AssemblyManifest`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyStack {
    /// Stack id.
    pub id: String,
    /// Manifest file name, relative to the output directory.
    pub template_file: String,
    /// Target account id.
    pub account: String,
    /// Target region.
    pub region: String,
    /// Number of declarations.
    pub resource_count: usize,
}

/// Writes one manifest per stack plus a `manifest.json` index into `dir`.
///
/// Returns the paths written, index last.
///
/// # Errors
///
/// Returns an error if rendering fails or a file cannot be written.
pub fn write_assembly(app: &App, dir: &Path, format: OutputFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| StackError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::new();
    let mut stacks = Vec::new();
    for stack in app.stacks() {
        let template = render_stack(stack)?;
        let file_name = format!("{}.template.{}", stack.id(), format.extension());
        let path = dir.join(&file_name);
        write_file(&path, &to_string(&template, format)?)?;
        tracing::info!(stack = %stack.id(), path = %path.display(), "wrote manifest");

        stacks.push(AssemblyStack {
            id: stack.id().to_string(),
            template_file: file_name,
            account: stack.environment().account.clone(),
            region: stack.environment().region.clone(),
            resource_count: template.resources.len(),
        });
        written.push(path);
    }

    let index = AssemblyManifest {
        producer: APP_NAME.to_string(),
        stacks,
    };
    let index_path = dir.join("manifest.json");
    write_file(&index_path, &serde_json::to_string_pretty(&index)?)?;
    written.push(index_path);
    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| StackError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
