//! Argument vectors for plugman invocations.
//!
//! Each [`ActionRequest`] is an immutable description of one tool call. The
//! argument list is rebuilt from scratch by [`ActionRequest::args`], so no
//! fragment of one request can leak into the next.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Lifecycle actions understood by plugman.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Uninstall,
    Fetch,
    Remove,
    Prepare,
    List,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Uninstall => "uninstall",
            Action::Fetch => "fetch",
            Action::Remove => "remove",
            Action::Prepare => "prepare",
            Action::List => "list",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a plugin gets installed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallLocation {
    /// Shared fetch cache used by every project.
    Global,
    /// The project's own plugins directory.
    #[default]
    Local,
}

/// Fixed values every invocation draws from.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub platform: String,
    pub project_root: PathBuf,
    pub global_root: PathBuf,
    pub local_root: PathBuf,
}

impl ToolContext {
    pub fn root(&self, location: InstallLocation) -> &Path {
        match location {
            InstallLocation::Global => &self.global_root,
            InstallLocation::Local => &self.local_root,
        }
    }
}

/// One plugman invocation.
///
/// Constructors enforce which fields each action carries: `install` always has
/// a plugin and a location, `list` has neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    action: Action,
    plugin: Option<PathBuf>,
    location: Option<InstallLocation>,
}

impl ActionRequest {
    pub fn install(plugin: impl Into<PathBuf>, location: InstallLocation) -> Self {
        Self {
            action: Action::Install,
            plugin: Some(plugin.into()),
            location: Some(location),
        }
    }

    pub fn uninstall(plugin: impl Into<PathBuf>) -> Self {
        Self {
            action: Action::Uninstall,
            plugin: Some(plugin.into()),
            location: None,
        }
    }

    pub fn fetch(plugin: impl Into<PathBuf>, location: Option<InstallLocation>) -> Self {
        Self {
            action: Action::Fetch,
            plugin: Some(plugin.into()),
            location,
        }
    }

    pub fn remove(plugin: impl Into<PathBuf>) -> Self {
        Self {
            action: Action::Remove,
            plugin: Some(plugin.into()),
            location: None,
        }
    }

    pub fn prepare() -> Self {
        Self {
            action: Action::Prepare,
            plugin: None,
            location: None,
        }
    }

    pub fn list() -> Self {
        Self {
            action: Action::List,
            plugin: None,
            location: None,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn plugin(&self) -> Option<&Path> {
        self.plugin.as_deref()
    }

    pub fn location(&self) -> Option<InstallLocation> {
        self.location
    }

    /// Compose the argument vector in the fixed fragment order for this action.
    pub fn args(&self, ctx: &ToolContext) -> Vec<OsString> {
        let mut args = ArgList::default();

        match self.action {
            Action::Install => args
                .platform(ctx)
                .project(ctx)
                .plugin(self.plugin.as_deref())
                .plugins_dir(ctx, self.location),
            Action::Uninstall => args
                .action(self.action)
                .platform(ctx)
                .project(ctx)
                .plugin(self.plugin.as_deref())
                .plugins_dir(ctx, self.location),
            Action::Fetch | Action::Remove => args
                .action(self.action)
                .plugin(self.plugin.as_deref())
                .plugins_dir(ctx, self.location),
            Action::Prepare => args
                .action(self.action)
                .platform(ctx)
                .project(ctx)
                .plugins_dir(ctx, self.location),
            Action::List => args.action(self.action),
        };

        args.0
    }
}

#[derive(Default)]
struct ArgList(Vec<OsString>);

impl ArgList {
    fn action(&mut self, action: Action) -> &mut Self {
        self.0.push(format!("--{action}").into());
        self
    }

    fn platform(&mut self, ctx: &ToolContext) -> &mut Self {
        self.0.push("--platform".into());
        self.0.push(ctx.platform.clone().into());
        self
    }

    fn project(&mut self, ctx: &ToolContext) -> &mut Self {
        self.0.push("--project".into());
        self.0.push(ctx.project_root.clone().into_os_string());
        self
    }

    fn plugin(&mut self, plugin: Option<&Path>) -> &mut Self {
        if let Some(plugin) = plugin {
            self.0.push("--plugin".into());
            self.0.push(strip_trailing_separator(plugin).into_os_string());
        }
        self
    }

    fn plugins_dir(&mut self, ctx: &ToolContext, location: Option<InstallLocation>) -> &mut Self {
        self.0.push("--plugins_dir".into());
        self.0
            .push(ctx.root(location.unwrap_or_default()).as_os_str().to_owned());
        self
    }
}

/// plugman mishandles `foo/bar/`. Only trailing separators are dropped; a bare
/// root is kept, and non-UTF-8 paths pass through untouched.
fn strip_trailing_separator(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => match text.trim_end_matches(std::path::is_separator) {
            "" => path.to_path_buf(),
            trimmed => PathBuf::from(trimmed),
        },
        None => path.to_path_buf(),
    }
}
