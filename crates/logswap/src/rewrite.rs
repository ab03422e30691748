use std::path::Path;

use tracing::{debug, warn};
use tracing_attributes::instrument;

use crate::{
    calls::CallPattern,
    config::{ImportStyle, MissingAnchorPolicy, RewriteConfig},
    error::{ConfigError, RewriteError},
    imports::{
        LoggerModuleMatcher, import_line, insert_after_line, insert_at, last_import_block_end,
        last_import_line, relative_logger_path, scan_imports,
    },
};

/// The new contents of a rewritten file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// The import line added to the file, if one was needed and an anchor was found.
    pub inserted_import: Option<String>,
    /// Number of call sites moved from the console object to the logger.
    pub substitutions: usize,
}

/// Outcome of processing one file.
#[derive(Debug)]
pub enum RewriteDecision {
    Unchanged,
    Rewritten(Rewrite),
    Failed(RewriteError),
}

impl RewriteDecision {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, RewriteDecision::Unchanged)
    }

    /// The rewritten text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RewriteDecision::Rewritten(rewrite) => Some(&rewrite.text),
            _ => None,
        }
    }
}

/// Rewrites console calls into logger calls, one file at a time.
///
/// Holds only the immutable configuration and its compiled patterns, so a single instance serves
/// a whole run.
#[derive(Debug, Clone)]
pub struct Rewriter {
    config: RewriteConfig,
    console_calls: CallPattern,
    logger_calls: CallPattern,
    logger_module: LoggerModuleMatcher,
}

impl Rewriter {
    pub fn new(config: RewriteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            console_calls: CallPattern::console_calls(&config)?,
            logger_calls: CallPattern::logger_calls(&config)?,
            logger_module: LoggerModuleMatcher::new(&config)?,
            config,
        })
    }

    /// Whether the file's name is one of the configured exclusions.
    pub fn is_excluded(&self, file_path: &Path) -> bool {
        file_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config.exclusion_filenames.contains(name))
    }

    pub fn has_logger_import(&self, text: &str) -> bool {
        scan_imports(text, &self.logger_module)
            .iter()
            .any(|import| import.is_logger)
    }

    /// `file_path` relative to the source root.
    fn root_relative<'a>(&self, file_path: &'a Path) -> Result<&'a Path, RewriteError> {
        match &self.config.source_root {
            Some(root) if file_path.is_absolute() || file_path.starts_with(root) => file_path
                .strip_prefix(root)
                .map_err(|_| RewriteError::OutsideSourceRoot {
                    path: file_path.to_path_buf(),
                    root: root.clone(),
                }),
            _ => Ok(file_path),
        }
    }

    /// Adds the logger import at the anchor the import style calls for.
    ///
    /// Returns `None` when the text has no import statement to anchor to.
    fn insert_import(
        &self,
        text: &str,
        file_path: &Path,
    ) -> Result<Option<(String, String)>, RewriteError> {
        let binding = &self.config.logger_binding_name;
        match self.config.import_style {
            ImportStyle::Alias => Ok(last_import_line(text).map(|index| {
                let line = import_line(binding, &self.config.module_alias_path);
                (insert_after_line(text, index, &line), line)
            })),
            ImportStyle::Relative => {
                let Some(offset) = last_import_block_end(text) else {
                    return Ok(None);
                };
                let module_path = relative_logger_path(
                    self.root_relative(file_path)?,
                    &self.config.logger_module,
                    self.config.root_prefix,
                )?;
                let line = import_line(binding, &module_path);
                Ok(Some((insert_at(text, offset, &line), line)))
            }
        }
    }

    /// Moves every console call in `text` to the logger, importing it when needed.
    ///
    /// Applying this to its own output yields [`RewriteDecision::Unchanged`].
    #[instrument(level = "debug", skip_all, fields(file = %file_path.display()))]
    pub fn rewrite(&self, text: &str, file_path: &Path) -> RewriteDecision {
        if self.is_excluded(file_path) {
            debug!("excluded by name");
            return RewriteDecision::Unchanged;
        }
        if !self.console_calls.is_present(text) {
            return RewriteDecision::Unchanged;
        }

        let mut inserted_import = None;
        let mut current = None;
        if self.has_logger_import(text) {
            debug!("logger already imported");
        } else {
            match self.insert_import(text, file_path) {
                Ok(Some((new_text, line))) => {
                    current = Some(new_text);
                    inserted_import = Some(line);
                }
                Ok(None) => match self.config.missing_anchor {
                    MissingAnchorPolicy::Substitute => {
                        warn!("no import to anchor the logger import to, substituting anyway");
                    }
                    MissingAnchorPolicy::Skip => {
                        warn!("no import to anchor the logger import to, skipping");
                        return RewriteDecision::Unchanged;
                    }
                },
                Err(e) => return RewriteDecision::Failed(e),
            }
        }

        let (new_text, substitutions) = self
            .console_calls
            .substitute(current.as_deref().unwrap_or(text));
        if new_text == text {
            return RewriteDecision::Unchanged;
        }
        debug!(substitutions, inserted = inserted_import.is_some(), "rewritten");
        RewriteDecision::Rewritten(Rewrite {
            text: new_text,
            inserted_import,
            substitutions,
        })
    }

    /// Adds the missing logger import to a file that already calls the logger.
    ///
    /// Used after a migration left files calling the logger without importing it.
    #[instrument(level = "debug", skip_all, fields(file = %file_path.display()))]
    pub fn repair_imports(&self, text: &str, file_path: &Path) -> RewriteDecision {
        if self.is_excluded(file_path) {
            debug!("excluded by name");
            return RewriteDecision::Unchanged;
        }
        if !self.logger_calls.is_present(text) || self.has_logger_import(text) {
            return RewriteDecision::Unchanged;
        }
        match self.insert_import(text, file_path) {
            Ok(Some((new_text, line))) => RewriteDecision::Rewritten(Rewrite {
                text: new_text,
                inserted_import: Some(line),
                substitutions: 0,
            }),
            Ok(None) => {
                warn!("logger is used but there is no import statement to anchor its import to");
                RewriteDecision::Unchanged
            }
            Err(e) => RewriteDecision::Failed(e),
        }
    }
}

/// One-shot form of [`Rewriter::rewrite`].
pub fn rewrite(text: &str, file_path: &Path, config: &RewriteConfig) -> RewriteDecision {
    match Rewriter::new(config.clone()) {
        Ok(rewriter) => rewriter.rewrite(text, file_path),
        Err(e) => RewriteDecision::Failed(e.into()),
    }
}
