use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::ConfigError;

/// How the inserted import refers to the logger module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStyle {
    /// A fixed, root-relative specifier such as `@/utils/logger`.
    Alias,
    /// A specifier computed from the file's depth below the source root.
    Relative,
}

/// What to do with a file that needs the logger import but has no import to anchor it to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAnchorPolicy {
    /// Substitute the call sites anyway. The file then calls a binding it does not import.
    #[default]
    Substitute,
    /// Leave the file untouched.
    Skip,
}

/// How a relative import is spelled for a file directly in the source root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootPrefix {
    /// `./lib/utils/logger`, which module resolvers accept as relative.
    #[default]
    Dot,
    /// `lib/utils/logger`, with no prefix at all.
    Bare,
}

/// Everything the rewriter needs to decide about a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    /// File names that are never rewritten (the logger itself, the entry file).
    pub exclusion_filenames: BTreeSet<String>,
    pub import_style: ImportStyle,
    /// Specifier used in alias mode, and always recognised as an existing import.
    pub module_alias_path: String,
    /// Location of the logger module below the source root, without extension.
    pub logger_module: String,
    /// The console-like object whose calls are replaced.
    pub target_object: String,
    pub callee_names: BTreeSet<String>,
    pub logger_binding_name: String,
    /// Absolute file paths are made relative to this before computing import depth.
    pub source_root: Option<PathBuf>,
    pub missing_anchor: MissingAnchorPolicy,
    /// Relative mode only.
    pub root_prefix: RootPrefix,
}

/// A rewrite configuration plus the file extensions a run considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub rewrite: RewriteConfig,
    pub extensions: BTreeSet<String>,
}

/// Built-in configurations for the two layouts this tool was written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Browser app: `@/utils/logger` alias, `.ts` and `.tsx` sources.
    #[default]
    Frontend,
    /// API server: relative imports of `lib/utils/logger`, `.ts` sources.
    Backend,
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl Preset {
    pub fn run_config(self) -> RunConfig {
        match self {
            Preset::Frontend => RunConfig {
                rewrite: RewriteConfig {
                    exclusion_filenames: set_of(&["logger.ts", "main.tsx"]),
                    import_style: ImportStyle::Alias,
                    module_alias_path: "@/utils/logger".to_owned(),
                    logger_module: "utils/logger".to_owned(),
                    ..RewriteConfig::default()
                },
                extensions: set_of(&["ts", "tsx"]),
            },
            Preset::Backend => RunConfig {
                rewrite: RewriteConfig {
                    exclusion_filenames: set_of(&["logger.ts"]),
                    import_style: ImportStyle::Relative,
                    module_alias_path: "@/lib/utils/logger".to_owned(),
                    logger_module: "lib/utils/logger".to_owned(),
                    ..RewriteConfig::default()
                },
                extensions: set_of(&["ts"]),
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(Preset::Frontend),
            "backend" => Ok(Preset::Backend),
            other => Err(ConfigError::Invalid(format!(
                "unknown preset `{other}`, expected `frontend` or `backend`"
            ))),
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            exclusion_filenames: BTreeSet::new(),
            import_style: ImportStyle::Alias,
            module_alias_path: "@/utils/logger".to_owned(),
            logger_module: "lib/utils/logger".to_owned(),
            target_object: "console".to_owned(),
            callee_names: set_of(&["log", "error", "warn", "debug"]),
            logger_binding_name: "logger".to_owned(),
            source_root: None,
            missing_anchor: MissingAnchorPolicy::default(),
            root_prefix: RootPrefix::default(),
        }
    }
}

/// ASCII JavaScript identifiers: letters, digits, `_` and `$`, not starting with a digit.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl RewriteConfig {
    /// Checks the invariants the rewriter relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.callee_names.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one callee name is required".to_owned(),
            ));
        }
        let identifiers = self
            .callee_names
            .iter()
            .chain([&self.target_object, &self.logger_binding_name]);
        for name in identifiers {
            if !is_identifier(name) {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` is not a plain identifier"
                )));
            }
        }
        if self.target_object == self.logger_binding_name {
            return Err(ConfigError::Invalid(format!(
                "the logger binding cannot be the target object `{}`",
                self.target_object
            )));
        }
        if self.module_alias_path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "the module alias path is empty".to_owned(),
            ));
        }
        let logger_module = self.logger_module.trim_matches('/');
        if logger_module.is_empty() || logger_module.split('/').any(|s| s.is_empty() || s == "..")
        {
            return Err(ConfigError::Invalid(format!(
                "`{}` is not a usable logger module path",
                self.logger_module
            )));
        }
        Ok(())
    }
}

/// On-disk shape of a configuration file. Every key falls back to the preset.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    preset: Option<Preset>,
    exclusion_filenames: Option<BTreeSet<String>>,
    import_style: Option<ImportStyle>,
    module_alias_path: Option<String>,
    logger_module: Option<String>,
    target_object: Option<String>,
    callee_names: Option<BTreeSet<String>>,
    logger_binding_name: Option<String>,
    missing_anchor: Option<MissingAnchorPolicy>,
    root_prefix: Option<RootPrefix>,
    extensions: Option<BTreeSet<String>>,
}

impl RunConfig {
    /// Parses a TOML configuration; `preset` applies when the file does not name one.
    pub fn from_toml_str(contents: &str, preset: Preset) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        let RunConfig {
            mut rewrite,
            mut extensions,
        } = file.preset.unwrap_or(preset).run_config();

        if let Some(v) = file.exclusion_filenames {
            rewrite.exclusion_filenames = v;
        }
        if let Some(v) = file.import_style {
            rewrite.import_style = v;
        }
        if let Some(v) = file.module_alias_path {
            rewrite.module_alias_path = v;
        }
        if let Some(v) = file.logger_module {
            rewrite.logger_module = v;
        }
        if let Some(v) = file.target_object {
            rewrite.target_object = v;
        }
        if let Some(v) = file.callee_names {
            rewrite.callee_names = v;
        }
        if let Some(v) = file.logger_binding_name {
            rewrite.logger_binding_name = v;
        }
        if let Some(v) = file.missing_anchor {
            rewrite.missing_anchor = v;
        }
        if let Some(v) = file.root_prefix {
            rewrite.root_prefix = v;
        }
        if let Some(v) = file.extensions {
            extensions = v
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_owned())
                .collect();
        }

        rewrite.validate()?;
        if extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one file extension is required".to_owned(),
            ));
        }
        Ok(RunConfig {
            rewrite,
            extensions,
        })
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path, preset: Preset) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, preset)
    }
}
