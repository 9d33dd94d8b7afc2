//! Install orchestration: resolve, discover, dedup, then drive plugman.

use std::fs;
use std::path::{Path, PathBuf};

use crate::plugin::command::{ActionRequest, InstallLocation};
use crate::plugin::error::{PluginError, Result};
use crate::plugin::lock::RootLock;
use crate::plugin::resolver::PathResolver;
use crate::plugin::scanner::find_units;
use crate::plugin::tool::PluginTool;

pub struct PluginInstaller<T> {
    tool: T,
    resolver: PathResolver,
    descriptor: String,
}

impl<T: PluginTool> PluginInstaller<T> {
    pub fn new(tool: T, descriptor: impl Into<String>) -> Self {
        let ctx = tool.context();
        let resolver = PathResolver::new(&ctx.global_root, &ctx.local_root);
        Self {
            tool,
            resolver,
            descriptor: descriptor.into(),
        }
    }

    /// Install every plugin unit found under `reference`.
    ///
    /// Both roots stay locked from discovery through the last install step, so
    /// the dedup decision sees the same layout the installs write into.
    pub fn install(&self, reference: &str) -> Result<()> {
        let root = self.resolver.resolve(reference)?;

        let _global = RootLock::acquire(&self.tool.context().global_root)?;
        let _local = RootLock::acquire(&self.tool.context().local_root)?;
        let requests = self.plan_units(root)?;

        for request in &requests {
            if let (Some(plugin), Some(location)) = (request.plugin(), request.location()) {
                tracing::info!("installing {} ({location:?})", plugin.display());
            }
            self.execute(request)?;
        }
        Ok(())
    }

    /// Work out the install steps for `reference` without running anything.
    pub fn plan_install(&self, reference: &str) -> Result<Vec<ActionRequest>> {
        let root = self.resolver.resolve(reference)?;
        self.plan_units(root)
    }

    /// Units already inside the global cache skip the global step, units
    /// already inside the project skip the local one.
    fn plan_units(&self, root: PathBuf) -> Result<Vec<ActionRequest>> {
        let units = find_units(&root, &self.descriptor);
        if units.is_empty() {
            return Err(PluginError::NoPluginUnits {
                root,
                descriptor: self.descriptor.clone(),
            });
        }

        let ctx = self.tool.context();
        let mut requests = Vec::new();
        for unit in units {
            let unit = normalize(&unit);
            if !is_within(&unit, &ctx.global_root) {
                requests.push(ActionRequest::install(&unit, InstallLocation::Global));
            } else {
                tracing::debug!("{} already fetched globally", unit.display());
            }
            if !is_within(&unit, &ctx.local_root) {
                requests.push(ActionRequest::install(&unit, InstallLocation::Local));
            } else {
                tracing::debug!("{} already installed locally", unit.display());
            }
        }
        Ok(requests)
    }

    pub fn uninstall(&self, plugin: &str) -> Result<()> {
        let _local = RootLock::acquire(&self.tool.context().local_root)?;
        self.execute(&ActionRequest::uninstall(plugin))
    }

    /// Uninstall each named plugin from the project; `purge` also drops the local copy.
    pub fn remove_installed(&self, names: &[String], purge: bool) -> Result<()> {
        if names.is_empty() {
            return Err(PluginError::NothingToRemove);
        }

        let local_root = &self.tool.context().local_root;
        if let Some(missing) = names.iter().find(|name| !local_root.join(name).exists()) {
            return Err(PluginError::UnresolvedReference(missing.clone()));
        }

        for name in names {
            self.uninstall(name)?;
            if purge {
                self.remove(name)?;
            }
        }
        Ok(())
    }

    pub fn fetch(&self, plugin: &str, location: Option<InstallLocation>) -> Result<()> {
        let _lock = RootLock::acquire(self.tool.context().root(location.unwrap_or_default()))?;
        self.execute(&ActionRequest::fetch(plugin, location))
    }

    pub fn remove(&self, plugin: &str) -> Result<()> {
        let _local = RootLock::acquire(&self.tool.context().local_root)?;
        self.execute(&ActionRequest::remove(plugin))
    }

    pub fn prepare(&self) -> Result<()> {
        let _local = RootLock::acquire(&self.tool.context().local_root)?;
        self.execute(&ActionRequest::prepare())
    }

    /// Names of the plugins installed in the project, read straight off disk.
    pub fn list(&self) -> Result<Vec<String>> {
        let local_root = &self.tool.context().local_root;
        if !local_root.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = fs::read_dir(local_root)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Ask plugman for its own listing.
    pub fn list_via_tool(&self) -> Result<()> {
        self.execute(&ActionRequest::list())
    }

    fn execute(&self, request: &ActionRequest) -> Result<()> {
        let output = self.tool.run(request).inspect_err(|err| {
            if let PluginError::ToolTimeout { stdout, stderr, .. } = err {
                echo_streams(stdout, stderr);
            }
        })?;
        echo_streams(&output.stdout, &output.stderr);

        if output.status.success() {
            Ok(())
        } else {
            tracing::error!("plugman --{} failed: {}", request.action(), output.status);
            Err(PluginError::ToolFailed {
                action: request.action(),
                status: output.status,
            })
        }
    }
}

fn echo_streams(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        print!("{stdout}");
    }
    if !stderr.is_empty() {
        eprint!("{stderr}");
    }
}

/// Component-wise containment; both sides canonicalized when they exist.
fn is_within(path: &Path, root: &Path) -> bool {
    let path = normalize(path);
    let root = normalize(root);
    path.starts_with(&root)
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
