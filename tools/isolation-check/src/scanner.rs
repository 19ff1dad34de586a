//! # Import Scanner
//!
//! Static extraction of module references from Rust sources. Nothing is
//! compiled or executed: each file is stripped of comments and literals,
//! then two passes collect paths.
//!
//! 1. `use` declarations, including `pub use` and brace trees
//!    (`crate::modules::{a::x, b::{self, y}}` expands to three paths).
//! 2. Inline qualified paths such as `crate::modules::b::service::run()`.
//!
//! A path addresses a module when it starts with one of the configured
//! prefixes, or when a `self`/`super` chain climbs back to the modules
//! root. A file that imports the root itself (`use crate::modules;`,
//! `use crate::modules as m;`) or globs it (`use crate::modules::*;`,
//! `use super::*;` from a top-level module) reaches modules by shorter
//! names, so those names are resolved too.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, trace};

use crate::config::CheckerConfig;
use crate::error::CheckError;

/// A source file and the module path it defines, relative to the root.
///
/// `modules/search/mod.rs` is `[search]`, `modules/search/index.rs` is
/// `[search, index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module_path: Vec<String>,
}

/// A reference that resolves under the modules root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Path as written, after brace expansion
    pub import_path: String,
    /// Segments relative to the modules root; the first names the module
    pub target: Vec<String>,
    pub file: PathBuf,
    pub line: usize,
}

impl Reference {
    pub fn target_module(&self) -> &str {
        self.target.first().map_or("", String::as_str)
    }

    /// Segment below the target module, e.g. `events`.
    pub fn target_submodule(&self) -> Option<&str> {
        self.target.get(1).map(String::as_str)
    }
}

/// One module's sources and everything they reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    pub name: String,
    pub files: Vec<SourceFile>,
    pub references: Vec<Reference>,
}

/// One path brought in by a `use` tree and the name it was renamed to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UseItem {
    path: String,
    alias: Option<String>,
}

/// How one file reaches the modules root without a prefix.
#[derive(Debug)]
struct RootScope<'a> {
    aliases: BTreeSet<String>,
    glob: bool,
    known: &'a BTreeSet<String>,
}

impl<'a> RootScope<'a> {
    fn new(known: &'a BTreeSet<String>) -> Self {
        Self {
            aliases: BTreeSet::new(),
            glob: false,
            known,
        }
    }

    /// Note a `use` that resolved to `target` relative to the root.
    fn record(&mut self, item: &UseItem, target: &[String]) {
        match target {
            [] => {
                let name = item
                    .alias
                    .as_deref()
                    .or_else(|| item.path.rsplit("::").next())
                    .unwrap_or_default();
                if !matches!(name, "" | "_" | "self" | "super" | "crate") {
                    self.aliases.insert(name.to_string());
                }
            }
            [only] if only == "*" => self.glob = true,
            _ => {}
        }
    }

    /// `m::quality::x` through an alias, or `quality::x` through a glob.
    fn resolve(&self, path: &str) -> Option<Vec<String>> {
        let (first, rest) = path.split_once("::")?;
        if self.aliases.contains(first) {
            return Some(rest.split("::").map(String::from).collect());
        }
        (self.glob && self.known.contains(first))
            .then(|| path.split("::").map(String::from).collect())
    }
}

/// Compiled patterns plus the prefixes they resolve against.
#[derive(Debug)]
pub struct Scanner {
    use_decl: Regex,
    qualified_path: Regex,
    rename: Regex,
    prefixes: Vec<String>,
}

impl Scanner {
    /// # Errors
    ///
    /// [`CheckError::Pattern`] if a scanning pattern fails to compile.
    pub fn new(config: &CheckerConfig) -> Result<Self, CheckError> {
        let mut prefixes = config.module_prefixes.clone();
        // Longest first so `crate::modules::` wins over `crate::`.
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Ok(Self {
            use_decl: Regex::new(r"\buse\s+([^;]+);")?,
            qualified_path: Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)+")?,
            rename: Regex::new(r"\s+as\s+([A-Za-z_][A-Za-z0-9_]*)")?,
            prefixes,
        })
    }

    /// Scan every module under `root`.
    ///
    /// # Errors
    ///
    /// [`CheckError::RootNotFound`], [`CheckError::NotADirectory`], or
    /// [`CheckError::Io`] for an unreadable directory or file.
    pub fn scan(&self, root: &Path) -> Result<Vec<ScannedModule>, CheckError> {
        let modules = discover_modules(root)?;
        let known: BTreeSet<String> = modules.keys().cloned().collect();
        let mut scanned = Vec::with_capacity(modules.len());

        for (name, files) in modules {
            let mut references = Vec::new();
            for file in &files {
                let source =
                    fs::read_to_string(&file.path).map_err(|e| CheckError::io(&file.path, e))?;
                references.extend(self.scan_source(&source, file, &known));
            }
            debug!(
                module = %name,
                files = files.len(),
                references = references.len(),
                "Module scanned"
            );
            scanned.push(ScannedModule {
                name,
                files,
                references,
            });
        }

        Ok(scanned)
    }

    /// References in one file's source text.
    ///
    /// `known` holds the module names under the root; a glob import of the
    /// root makes bare `<known>::…` paths references.
    pub fn scan_source(
        &self,
        source: &str,
        file: &SourceFile,
        known: &BTreeSet<String>,
    ) -> Vec<Reference> {
        let mut text = strip_source(source);
        let mut scope = RootScope::new(known);

        let mut imports = Vec::new();
        let mut spans = Vec::new();
        for decl in self.use_decl.captures_iter(&text) {
            let (Some(whole), Some(tree)) = (decl.get(0), decl.get(1)) else {
                continue;
            };
            let line = line_at(&text, whole.start());
            for item in self.expand_use_items(tree.as_str()) {
                let target = self
                    .root_relative(&item.path, &file.module_path)
                    .or_else(|| scope.resolve(&item.path));
                if let Some(target) = &target {
                    scope.record(&item, target);
                }
                imports.push((item.path, line));
            }
            spans.push(whole.range());
        }

        let mut references: Vec<Reference> = imports
            .into_iter()
            .filter_map(|(path, line)| self.reference(path, file, line, &scope))
            .collect();

        // Blank the declarations so their paths are not counted twice.
        for span in spans.into_iter().rev() {
            let blank: String = text[span.clone()]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' })
                .collect();
            text.replace_range(span, &blank);
        }

        for found in self.qualified_path.find_iter(&text) {
            let line = line_at(&text, found.start());
            if let Some(reference) = self.reference(found.as_str().to_string(), file, line, &scope)
            {
                references.push(reference);
            }
        }

        trace!(file = %file.path.display(), references = references.len(), "File scanned");
        references
    }

    /// Expand a `use` tree into the full paths it imports.
    pub fn expand_use_tree(&self, tree: &str) -> Vec<String> {
        self.expand_use_items(tree)
            .into_iter()
            .map(|item| item.path)
            .collect()
    }

    fn expand_use_items(&self, tree: &str) -> Vec<UseItem> {
        // `x as y` becomes `x@y` so the rename survives whitespace removal.
        let marked = self.rename.replace_all(tree, "@$1");
        let compact: String = marked.chars().filter(|c| !c.is_whitespace()).collect();
        let mut items = Vec::new();
        expand_into("", compact.trim_start_matches("::"), &mut items);
        items
    }

    /// Segments relative to the modules root, if `path` addresses a module
    /// below it.
    pub fn resolve(&self, path: &str, base: &[String]) -> Option<Vec<String>> {
        self.root_relative(path, base)
            .filter(|target| !target.is_empty())
    }

    /// Like [`Scanner::resolve`], but the root itself resolves to `[]`.
    fn root_relative(&self, path: &str, base: &[String]) -> Option<Vec<String>> {
        let segments: Vec<&str> = path.split("::").collect();
        match segments.first() {
            Some(&"self" | &"super") => {
                let mut current = base.to_vec();
                let mut rest = segments.as_slice();
                while let Some((first, tail)) = rest.split_first() {
                    match *first {
                        "self" => {}
                        "super" => {
                            current.pop()?;
                        }
                        _ => break,
                    }
                    rest = tail;
                }
                current.extend(rest.iter().map(|s| (*s).to_string()));
                Some(current)
            }
            _ => self.prefixes.iter().find_map(|prefix| {
                let root = prefix.trim_end_matches("::");
                if !root.is_empty() && path == root {
                    return Some(Vec::new());
                }
                let rest = path.strip_prefix(prefix.as_str())?;
                (!rest.is_empty()).then(|| rest.split("::").map(String::from).collect())
            }),
        }
    }

    fn reference(
        &self,
        import_path: String,
        file: &SourceFile,
        line: usize,
        scope: &RootScope<'_>,
    ) -> Option<Reference> {
        let target = self
            .resolve(&import_path, &file.module_path)
            .or_else(|| scope.resolve(&import_path))
            .filter(|target| target.first().is_some_and(|module| module != "*"))?;
        Some(Reference {
            import_path,
            target,
            file: file.path.clone(),
            line,
        })
    }
}

fn expand_into(prefix: &str, tree: &str, out: &mut Vec<UseItem>) {
    let Some(open) = tree.find('{') else {
        let (leaf, alias) = match tree.split_once('@') {
            Some((leaf, alias)) => (leaf, Some(alias.to_string())),
            None => (tree, None),
        };
        let path = if leaf == "self" {
            prefix.trim_end_matches("::").to_string()
        } else {
            format!("{prefix}{leaf}")
        };
        if !path.is_empty() {
            out.push(UseItem { path, alias });
        }
        return;
    };
    let Some(close) = tree.rfind('}') else {
        return;
    };
    if close < open {
        return;
    }

    let nested = format!("{prefix}{}", &tree[..open]);
    for item in split_top_level(&tree[open + 1..close]) {
        if !item.is_empty() {
            expand_into(&nested, item, out);
        }
    }
}

/// Split on commas that are not inside braces.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items
}

fn line_at(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Replace comments, string literals and char literals with spaces.
///
/// Newlines are kept so line numbers still match the original file.
pub fn strip_source(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                out.push(' ');
                i += 1;
            }
        } else if c == '/' && next == Some('*') {
            i = skip_block_comment(&chars, i, &mut out);
        } else if c == '"' {
            i = skip_string(&chars, i, &mut out);
        } else if let Some(hashes) = raw_string_hashes(&chars, i) {
            i = skip_raw_string(&chars, i, hashes, &mut out);
        } else if c == '\'' {
            i = skip_char_literal(&chars, i, &mut out);
        } else {
            out.push(c);
            i += 1;
        }
    }

    out
}

fn blank(out: &mut String, c: char) {
    out.push(if c == '\n' { '\n' } else { ' ' });
}

fn skip_block_comment(chars: &[char], mut i: usize, out: &mut String) -> usize {
    let mut depth = 0usize;
    while i < chars.len() {
        if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
            depth += 1;
            out.push_str("  ");
            i += 2;
        } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            depth -= 1;
            out.push_str("  ");
            i += 2;
            if depth == 0 {
                break;
            }
        } else {
            blank(out, chars[i]);
            i += 1;
        }
    }
    i
}

fn skip_string(chars: &[char], mut i: usize, out: &mut String) -> usize {
    out.push(' ');
    i += 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.push(' ');
                i += 1;
                if let Some(&escaped) = chars.get(i) {
                    blank(out, escaped);
                    i += 1;
                }
            }
            '"' => {
                out.push(' ');
                return i + 1;
            }
            c => {
                blank(out, c);
                i += 1;
            }
        }
    }
    i
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `Some(n)` if a raw string with `n` hashes starts at `i` (`r"`, `r#"`, `br"`).
fn raw_string_hashes(chars: &[char], i: usize) -> Option<usize> {
    if chars[i] != 'r' {
        return None;
    }
    let standalone = match i.checked_sub(1).map(|p| chars[p]) {
        None => true,
        Some('b') => i
            .checked_sub(2)
            .map_or(true, |p| !is_ident_char(chars[p])),
        Some(prev) => !is_ident_char(prev),
    };
    if !standalone {
        return None;
    }
    let hashes = chars[i + 1..].iter().take_while(|c| **c == '#').count();
    (chars.get(i + 1 + hashes) == Some(&'"')).then_some(hashes)
}

fn skip_raw_string(chars: &[char], mut i: usize, hashes: usize, out: &mut String) -> usize {
    let body = i + hashes + 2;
    while i < body {
        out.push(' ');
        i += 1;
    }
    while i < chars.len() {
        if chars[i] == '"'
            && chars[i + 1..].iter().take(hashes).filter(|c| **c == '#').count() == hashes
        {
            for _ in 0..=hashes {
                out.push(' ');
            }
            return i + hashes + 1;
        }
        blank(out, chars[i]);
        i += 1;
    }
    i
}

/// Char literals are blanked; lifetimes and labels pass through.
fn skip_char_literal(chars: &[char], i: usize, out: &mut String) -> usize {
    if chars.get(i + 1) == Some(&'\\') {
        // Escaped literal: '\n', '\'', '\u{1F600}'
        let mut j = i + 3;
        while j < chars.len() && chars[j] != '\'' {
            j += 1;
        }
        for _ in i..=j.min(chars.len() - 1) {
            out.push(' ');
        }
        return j + 1;
    }
    if chars.get(i + 2) == Some(&'\'') {
        out.push_str("   ");
        return i + 3;
    }
    out.push('\'');
    i + 1
}

/// Find the modules under `root`.
///
/// Every subdirectory is a module, and so is every `<name>.rs` file other
/// than `mod.rs` and `lib.rs`. A `<name>.rs` file next to a `<name>/`
/// directory belongs to the same module.
///
/// # Errors
///
/// [`CheckError::RootNotFound`], [`CheckError::NotADirectory`] or
/// [`CheckError::Io`].
pub fn discover_modules(root: &Path) -> Result<BTreeMap<String, Vec<SourceFile>>, CheckError> {
    if !root.exists() {
        return Err(CheckError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CheckError::NotADirectory(root.to_path_buf()));
    }

    let mut modules: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for path in sorted_entries(root)? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            let files = modules.entry(name.clone()).or_default();
            collect_sources(&path, &[name], files)?;
        } else if let Some(stem) = rust_stem(&path) {
            if stem == "mod" || stem == "lib" {
                continue;
            }
            modules.entry(stem.clone()).or_default().push(SourceFile {
                path,
                module_path: vec![stem],
            });
        }
    }

    Ok(modules)
}

fn collect_sources(
    dir: &Path,
    module_path: &[String],
    files: &mut Vec<SourceFile>,
) -> Result<(), CheckError> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let mut nested = module_path.to_vec();
            nested.push(name.to_string());
            collect_sources(&path, &nested, files)?;
        } else if let Some(stem) = rust_stem(&path) {
            let mut file_path = module_path.to_vec();
            if stem != "mod" && stem != "lib" {
                file_path.push(stem);
            }
            files.push(SourceFile {
                path,
                module_path: file_path,
            });
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let entries = fs::read_dir(dir).map_err(|e| CheckError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(|e| CheckError::io(dir, e))?.path());
    }
    paths.sort();
    Ok(paths)
}

fn rust_stem(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str()).map(String::from)
}
