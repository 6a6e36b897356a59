//! Ignore-rule loading and evaluation.
//!
//! Rules come from two places: scoped `.cairnignore` blobs staged in the
//! index (each governing its own directory and everything below it) and
//! the absolute list in `<control-dir>/info/exclude`. Within a list the
//! last matching rule wins; scopes are consulted nearest-first.

use std::collections::HashMap;

use glob::Pattern;

use crate::error::CairnError;
use crate::index::Index;
use crate::object::Object;
use crate::repo::Repository;
use crate::store::ObjectStore;

/// Per-directory ignore file name.
pub const IGNORE_FILE: &str = ".cairnignore";

/// One parsed rule: a pattern and whether a match means "ignored"
/// (`false` for `!`-negated rules).
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: Pattern,
    pub ignored: bool,
}

/// All rules that apply to a repository.
#[derive(Debug, Default)]
pub struct IgnoreRules {
    /// Unscoped lists, in evaluation order.
    pub absolute: Vec<Vec<IgnoreRule>>,
    /// Directory -> rules from that directory's ignore file.
    pub scoped: HashMap<String, Vec<IgnoreRule>>,
}

/// Parse one line. Blank lines and `#` comments carry no rule; `!` negates;
/// a leading `\` escapes a literal `!` or `#`.
fn parse_line(line: &str) -> Result<Option<IgnoreRule>, CairnError> {
    let line = line.trim();

    let (raw, ignored) = match line.chars().next() {
        None | Some('#') => return Ok(None),
        Some('!') => (&line[1..], false),
        Some('\\') => (&line[1..], true),
        _ => (line, true),
    };

    let pattern = Pattern::new(raw)
        .map_err(|e| CairnError::InvalidInput(format!("bad ignore pattern '{}': {}", raw, e)))?;
    Ok(Some(IgnoreRule { pattern, ignored }))
}

fn parse_lines(content: &str) -> Result<Vec<IgnoreRule>, CairnError> {
    let mut rules = Vec::new();
    for line in content.lines() {
        if let Some(rule) = parse_line(line)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Collect the rules in effect: `info/exclude`, then every ignore file
/// staged in the index, keyed by its directory.
pub fn read_rules(
    repo: &Repository,
    store: &ObjectStore,
    index: &Index,
) -> Result<IgnoreRules, CairnError> {
    let mut rules = IgnoreRules::default();

    let exclude = repo.ctrl_path("info/exclude");
    if exclude.is_file() {
        rules
            .absolute
            .push(parse_lines(&std::fs::read_to_string(exclude)?)?);
    }

    for entry in &index.entries {
        if entry.name == IGNORE_FILE || entry.name.ends_with(&format!("/{}", IGNORE_FILE)) {
            let dir = entry
                .name
                .rfind('/')
                .map(|i| &entry.name[..i])
                .unwrap_or("")
                .to_string();
            let blob = match store.read(&entry.sha)? {
                Object::Blob(data) => data,
                other => {
                    return Err(CairnError::Malformed(format!(
                        "staged {} is a {}, not a blob",
                        entry.name,
                        other.kind()
                    )))
                }
            };
            let content = String::from_utf8(blob).map_err(|_| {
                CairnError::Malformed(format!("staged {} is not UTF-8", entry.name))
            })?;
            rules.scoped.insert(dir, parse_lines(&content)?);
        }
    }

    Ok(rules)
}

/// Last matching rule in a list decides; no match leaves the question open.
fn match_list(rules: &[IgnoreRule], path: &str) -> Option<bool> {
    let mut result = None;
    for rule in rules {
        if rule.pattern.matches(path) {
            result = Some(rule.ignored);
        }
    }
    result
}

/// Is the repo-relative `path` ignored?
///
/// Scoped lists are walked from the path's own directory upward; the first
/// scope with an opinion wins. Absolute lists settle anything left over.
pub fn check_ignore(rules: &IgnoreRules, path: &str) -> bool {
    let mut dir = path.rfind('/').map(|i| &path[..i]).unwrap_or("");
    loop {
        if let Some(list) = rules.scoped.get(dir) {
            if let Some(verdict) = match_list(list, path) {
                return verdict;
            }
        }
        if dir.is_empty() {
            break;
        }
        dir = dir.rfind('/').map(|i| &dir[..i]).unwrap_or("");
    }

    for list in &rules.absolute {
        if let Some(verdict) = match_list(list, path) {
            return verdict;
        }
    }
    false
}
