//! Filesystem effects: `TouchFile` and `ListFiles`.

use std::{
    fs::OpenOptions,
    path::PathBuf,
    time::SystemTime,
};

use anyhow::{Context as _, anyhow};
use effectflow_types::{Value, ValueMap};
use tracing::warn;

use crate::{
    context::Context,
    effect::{ConfigurableEffect, Effect, EffectId},
    workflow::bindings::EffectArgs,
};

/// Creates each path if missing and bumps its modification time.
#[derive(Debug, Clone)]
pub struct TouchFile {
    id: EffectId,
    paths: Vec<PathBuf>,
}

impl TouchFile {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Effect for TouchFile {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        for path in &self.paths {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            file.set_modified(SystemTime::now())
                .with_context(|| format!("failed to update modification time of {}", path.display()))?;
        }
        Ok(context.clone())
    }
}

impl ConfigurableEffect for TouchFile {
    const CLASS: &'static str = "TouchFile";

    /// `path` is a single path or a list of paths.
    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        let paths = match args.require("path")? {
            Value::String(path) => vec![PathBuf::from(path)],
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow!("'path' entries must be strings, found {}", item.type_name()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            other => return Err(anyhow!("'path' must be a string or a list of strings, found {}", other.type_name())),
        };
        Ok(Self {
            id: args.id().clone(),
            paths,
        })
    }
}

/// Expands a glob pattern and stores the matches as `{files: [...]}` under the effect id.
#[derive(Debug, Clone)]
pub struct ListFiles {
    id: EffectId,
    pattern: String,
}

impl Effect for ListFiles {
    fn id(&self) -> &EffectId {
        &self.id
    }

    fn execute(&self, context: &Context) -> anyhow::Result<Context> {
        let entries = glob::glob(&self.pattern).with_context(|| format!("invalid glob pattern '{}'", self.pattern))?;
        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => files.push(Value::from(path.display().to_string())),
                Err(error) => warn!(effect = %self.id, error = %error, "skipping unreadable glob entry"),
            }
        }

        let mut listing = ValueMap::new();
        listing.insert("files".to_string(), Value::Sequence(files));
        Ok(context.insert(self.id.as_str(), listing))
    }
}

impl ConfigurableEffect for ListFiles {
    const CLASS: &'static str = "ListFiles";

    fn from_args(args: EffectArgs) -> anyhow::Result<Self> {
        Ok(Self {
            pattern: args.require_str("path")?.to_string(),
            id: args.id().clone(),
        })
    }
}
