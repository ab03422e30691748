//! Text-level recognition of ES module `import` statements.
//!
//! Nothing here parses the language: statements are found with line and pattern heuristics, so
//! imports inside comments or string literals are treated like real ones.

use std::{
    path::{Component, Path},
    sync::OnceLock,
};

use itertools::Itertools;
use regex::Regex;

use crate::{
    config::{ImportStyle, RewriteConfig, RootPrefix},
    error::{ConfigError, RewriteError},
};

/// One `import <bindings> from '<path>'` statement found in a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub raw: String,
    /// Byte offset of the start of the statement's line content.
    pub start: usize,
    /// Byte offset just past the statement, including its `;` when present.
    pub end: usize,
    pub module_path: String,
    /// Whether `module_path` refers to the logger module.
    pub is_logger: bool,
}

fn import_from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^[ \t]*import\b[^;'"]*?\bfrom\s*(?:'([^'\n]*)'|"([^"\n]*)")[ \t]*;?"#,
        )
        .expect("Invalid import statement regex pattern")
    })
}

fn import_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(import[^;]+;)\r?\n").expect("Invalid import block regex pattern")
    })
}

/// Decides whether a module specifier names the logger module.
#[derive(Debug, Clone)]
pub struct LoggerModuleMatcher {
    alias: String,
    relative: Option<Regex>,
}

impl LoggerModuleMatcher {
    /// In alias mode only the alias is recognised. In relative mode the alias is recognised too,
    /// along with any `./` or `../` spelling that ends in the logger module or one of its
    /// trailing parts of at least two segments (`../utils/logger`, `../../lib/utils/logger`).
    /// With [`RootPrefix::Bare`] the unprefixed logger module is recognised as well.
    pub fn new(config: &RewriteConfig) -> Result<Self, ConfigError> {
        let relative = match config.import_style {
            ImportStyle::Alias => None,
            ImportStyle::Relative => {
                let segments: Vec<&str> =
                    config.logger_module.trim_matches('/').split('/').collect();
                let shortest = segments.len().min(2);
                let tails = (0..=segments.len() - shortest)
                    .map(|skip| segments[skip..].iter().map(|s| regex::escape(s)).join("/"))
                    .join("|");
                let bare = match config.root_prefix {
                    RootPrefix::Dot => String::new(),
                    RootPrefix::Bare => {
                        format!("|^{}$", regex::escape(config.logger_module.trim_matches('/')))
                    }
                };
                Some(Regex::new(&format!(r"^(?:\./|(?:\.\./)+)(?:{tails})${bare}"))?)
            }
        };
        Ok(Self {
            alias: config.module_alias_path.clone(),
            relative,
        })
    }

    pub fn matches(&self, module_path: &str) -> bool {
        module_path == self.alias
            || self
                .relative
                .as_ref()
                .is_some_and(|re| re.is_match(module_path))
    }
}

/// Lists every `import ... from '...'` statement in `text`, in order.
pub fn scan_imports(text: &str, matcher: &LoggerModuleMatcher) -> Vec<ImportStatement> {
    import_from_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let module_path = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let raw = whole.as_str().trim_start();
            Some(ImportStatement {
                raw: raw.to_owned(),
                start: whole.end() - raw.len(),
                end: whole.end(),
                module_path: module_path.to_owned(),
                is_logger: matcher.matches(module_path),
            })
        })
        .collect()
}

fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix("import") else {
        return false;
    };
    rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '*') && rest.contains("from")
}

/// Index of the last line that starts with `import` and mentions `from`.
pub fn last_import_line(text: &str) -> Option<usize> {
    text.split('\n')
        .enumerate()
        .filter(|(_, line)| is_import_line(line))
        .map(|(index, _)| index)
        .last()
}

/// Byte offset just past the `;` of the last `import ...;` statement that ends a run of
/// imports, i.e. is followed by a newline and a line that does not start with `import`.
pub fn last_import_block_end(text: &str) -> Option<usize> {
    let re = import_block_re();
    let mut pos = 0;
    let mut last = None;
    while let Some(caps) = re.captures_at(text, pos) {
        let (Some(whole), Some(statement)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if text[whole.end()..].starts_with("import") {
            // `import` is ASCII, so one byte further is still a char boundary.
            pos = whole.start() + 1;
        } else {
            last = Some(statement.end());
            pos = whole.end();
        }
    }
    last
}

/// Inserts `line` as a new line right after line number `index`.
pub fn insert_after_line(text: &str, index: usize, line: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let crlf = lines.get(index).is_some_and(|l| l.ends_with('\r'));
    let inserted = if crlf {
        format!("{line}\r")
    } else {
        line.to_owned()
    };
    lines.insert((index + 1).min(lines.len()), &inserted);
    lines.join("\n")
}

/// Inserts `line` on its own line starting at byte `offset`, which must end a line's content.
pub fn insert_at(text: &str, offset: usize, line: &str) -> String {
    let (head, tail) = text.split_at(offset);
    let newline = if tail.starts_with("\r\n") { "\r\n" } else { "\n" };
    format!("{head}{newline}{line}{tail}")
}

/// The import specifier for `logger_module` as seen from `relative_file`.
///
/// `relative_file` is relative to the source root; each directory between the root and the file
/// adds one `../`. A file directly in the root gets the prefix `root_prefix` asks for.
pub fn relative_logger_path(
    relative_file: &Path,
    logger_module: &str,
    root_prefix: RootPrefix,
) -> Result<String, RewriteError> {
    let unsupported = || RewriteError::UnsupportedPath {
        path: relative_file.to_path_buf(),
    };
    let mut segments = 0usize;
    for component in relative_file.components() {
        match component {
            Component::Normal(_) => segments += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsupported());
            }
        }
    }
    let depth = segments.checked_sub(1).ok_or_else(unsupported)?;
    let prefix = match (depth, root_prefix) {
        (0, RootPrefix::Dot) => "./".to_owned(),
        _ => "../".repeat(depth),
    };
    Ok(format!("{prefix}{}", logger_module.trim_matches('/')))
}

/// Renders the named import of the logger binding.
pub fn import_line(binding: &str, module_path: &str) -> String {
    format!("import {{ {binding} }} from '{module_path}';")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use pretty_assertions::assert_eq;

    fn alias_matcher() -> LoggerModuleMatcher {
        LoggerModuleMatcher::new(&Preset::Frontend.run_config().rewrite).unwrap()
    }

    fn relative_matcher() -> LoggerModuleMatcher {
        LoggerModuleMatcher::new(&Preset::Backend.run_config().rewrite).unwrap()
    }

    #[test]
    fn scans_single_and_double_quoted_imports() {
        let text = "import A from 'a';\n  import { b, c } from \"./b\"\nconst x = 1;\n";
        let imports = scan_imports(text, &alias_matcher());
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].raw, "import A from 'a';");
        assert_eq!(imports[0].start, 0);
        assert_eq!(imports[0].end, 18);
        assert_eq!(imports[1].module_path, "./b");
        assert_eq!(&text[imports[1].start..imports[1].end], "import { b, c } from \"./b\"");
    }

    #[test]
    fn scans_bindings_spanning_lines() {
        let text = "import {\n  logger,\n  format,\n} from '@/utils/logger';\n";
        let imports = scan_imports(text, &alias_matcher());
        assert_eq!(imports.len(), 1);
        assert!(imports[0].is_logger);
    }

    #[test]
    fn side_effect_imports_are_ignored() {
        assert!(scan_imports("import './styles.css';\n", &alias_matcher()).is_empty());
    }

    #[test]
    fn alias_mode_recognises_only_the_alias() {
        let matcher = alias_matcher();
        assert!(matcher.matches("@/utils/logger"));
        assert!(!matcher.matches("../utils/logger"));
        assert!(!matcher.matches("@/utils/loggers"));
    }

    #[test]
    fn relative_mode_recognises_plausible_spellings() {
        let matcher = relative_matcher();
        for path in [
            "@/lib/utils/logger",
            "../lib/utils/logger",
            "../../lib/utils/logger",
            "../utils/logger",
            "./utils/logger",
            "./lib/utils/logger",
        ] {
            assert!(matcher.matches(path), "{path}");
        }
        for path in ["lib/utils/logger", "../logger", "../utils/loggerx", "winston"] {
            assert!(!matcher.matches(path), "{path}");
        }
    }

    #[test]
    fn last_import_line_skips_non_imports() {
        let text = "// header\nimport A from 'a';\nimport B from 'b';\n\nconst importantValue = from;\n";
        assert_eq!(last_import_line(text), Some(2));
        assert_eq!(last_import_line("import './side-effect';\n"), None);
        assert_eq!(last_import_line(""), None);
    }

    #[test]
    fn import_block_end_is_after_the_last_run() {
        let text = "import A from 'a';\nimport B from 'b';\nconsole.log(A, B);\n";
        let end = last_import_block_end(text).unwrap();
        assert_eq!(&text[..end], "import A from 'a';\nimport B from 'b';");
    }

    #[test]
    fn import_block_end_uses_the_last_block() {
        let text = "import A from 'a';\nconst a = 1;\nimport B from 'b';\nfoo();\n";
        let end = last_import_block_end(text).unwrap();
        assert_eq!(&text[end..], "\nfoo();\n");
    }

    #[test]
    fn import_block_needs_a_following_line() {
        assert_eq!(last_import_block_end("import A from 'a';"), None);
        assert_eq!(last_import_block_end("const a = 1;\n"), None);
    }

    #[test]
    fn insert_after_line_keeps_crlf() {
        let text = "import A from 'a';\r\nfoo();\r\n";
        assert_eq!(
            insert_after_line(text, 0, "import B from 'b';"),
            "import A from 'a';\r\nimport B from 'b';\r\nfoo();\r\n"
        );
    }

    #[test]
    fn insert_at_adds_its_own_line() {
        let text = "import A from 'a';\nfoo();\n";
        assert_eq!(
            insert_at(text, 18, "import B from 'b';"),
            "import A from 'a';\nimport B from 'b';\nfoo();\n"
        );
    }

    #[test]
    fn relative_path_follows_depth() {
        let module = "lib/utils/logger";
        let path = |file: &str| relative_logger_path(Path::new(file), module, RootPrefix::Dot);
        assert_eq!(path("routes/users.ts").unwrap(), "../lib/utils/logger");
        assert_eq!(path("app/api/users/route.ts").unwrap(), "../../../lib/utils/logger");
        assert_eq!(path("middleware.ts").unwrap(), "./lib/utils/logger");
    }

    #[test]
    fn bare_root_prefix_only_changes_root_files() {
        let path = |file: &str| {
            relative_logger_path(Path::new(file), "lib/utils/logger", RootPrefix::Bare)
        };
        assert_eq!(path("middleware.ts").unwrap(), "lib/utils/logger");
        assert_eq!(path("./routes/users.ts").unwrap(), "../lib/utils/logger");
    }

    #[test]
    fn bare_root_prefix_recognises_the_unprefixed_module() {
        let mut config = Preset::Backend.run_config().rewrite;
        config.root_prefix = RootPrefix::Bare;
        let matcher = LoggerModuleMatcher::new(&config).unwrap();
        assert!(matcher.matches("lib/utils/logger"));
        assert!(matcher.matches("../lib/utils/logger"));
        assert!(!matcher.matches("utils/logger"));
    }

    #[test]
    fn relative_path_rejects_escaping_paths() {
        for file in ["../x.ts", "", "/abs/x.ts"] {
            let result = relative_logger_path(Path::new(file), "lib/utils/logger", RootPrefix::Dot);
            assert!(result.is_err(), "{file}");
        }
    }

    #[test]
    fn renders_named_import() {
        assert_eq!(
            import_line("logger", "@/utils/logger"),
            "import { logger } from '@/utils/logger';"
        );
    }
}
