//! Matching and substitution of `<object>.<method>` call sites.

use std::collections::BTreeSet;

use itertools::Itertools;
use regex::Regex;

use crate::{config::RewriteConfig, error::ConfigError};

/// Characters that can continue a JavaScript identifier.
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// One matched call site: the byte range of `<object>.<method>` and the method name.
struct CallSite<'t> {
    start: usize,
    end: usize,
    method: &'t str,
}

/// Whole-word matcher for `<object>.<method>` where `<method>` is one of a fixed set.
///
/// `consoleLogger.log`, `$console.log` and `console.logger` never match `console.log`.
#[derive(Debug, Clone)]
pub struct CallPattern {
    regex: Regex,
    replacement_object: String,
}

impl CallPattern {
    pub fn new(
        object: &str,
        methods: &BTreeSet<String>,
        replacement_object: &str,
    ) -> Result<Self, ConfigError> {
        if methods.is_empty() {
            return Err(ConfigError::Invalid(
                "a call pattern needs at least one method".to_owned(),
            ));
        }
        // `\b` treats `$` as a boundary, so identifier edges are checked by hand. Longer
        // methods go first so `logError` is tried before `log`.
        let alternatives = methods
            .iter()
            .sorted_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
            .map(|m| regex::escape(m))
            .join("|");
        let regex = Regex::new(&format!(r"{}\.({alternatives})", regex::escape(object)))?;
        Ok(Self {
            regex,
            replacement_object: replacement_object.to_owned(),
        })
    }

    /// Console calls that should be redirected to the logger.
    pub fn console_calls(config: &RewriteConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.target_object,
            &config.callee_names,
            &config.logger_binding_name,
        )
    }

    /// Calls already made through the logger binding.
    pub fn logger_calls(config: &RewriteConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.logger_binding_name,
            &config.callee_names,
            &config.logger_binding_name,
        )
    }

    fn call_sites<'t>(&self, text: &'t str) -> Vec<CallSite<'t>> {
        let mut sites = Vec::new();
        let mut pos = 0;
        while let Some(caps) = self.regex.captures_at(text, pos) {
            let (Some(whole), Some(method)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let glued_before = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(is_identifier_char);
            let glued_after = text[whole.end()..]
                .chars()
                .next()
                .is_some_and(is_identifier_char);
            if glued_before || glued_after {
                let step = text[whole.start()..].chars().next().map_or(1, char::len_utf8);
                pos = whole.start() + step;
            } else {
                sites.push(CallSite {
                    start: whole.start(),
                    end: whole.end(),
                    method: method.as_str(),
                });
                pos = whole.end();
            }
        }
        sites
    }

    pub fn is_present(&self, text: &str) -> bool {
        !self.call_sites(text).is_empty()
    }

    pub fn count(&self, text: &str) -> usize {
        self.call_sites(text).len()
    }

    /// Replaces the object of every matching call, keeping the method and arguments.
    ///
    /// Returns the new text and the number of call sites replaced.
    pub fn substitute(&self, text: &str) -> (String, usize) {
        let sites = self.call_sites(text);
        let mut new_text = String::with_capacity(text.len());
        let mut copied = 0;
        for site in &sites {
            new_text.push_str(&text[copied..site.start]);
            new_text.push_str(&self.replacement_object);
            new_text.push('.');
            new_text.push_str(site.method);
            copied = site.end;
        }
        new_text.push_str(&text[copied..]);
        (new_text, sites.len())
    }
}
