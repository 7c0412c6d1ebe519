//! Compilation settings for the declaration front-end
//!
//! Settings come from command-line flags and, optionally, from the matching
//! entry of a `compile_commands.json`. They are passed through unchanged;
//! the bundled header parser only consumes the macro definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::ConfigError;

/// One `-D NAME[=VALUE]` or `-U NAME` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroDirective {
    Define { name: String, value: Option<String> },
    Undefine(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileConfig {
    pub include_dirs: Vec<PathBuf>,
    /// `-D` and `-U` flags, in command-line order
    pub macro_directives: Vec<MacroDirective>,
    /// Language standard, e.g. `c++17`
    pub standard: Option<String>,
    /// `-fXX` features, stored without the `-f`
    pub features: Vec<String>,
    pub gnu_extensions: bool,
    pub msvc_extensions: bool,
    pub msvc_compatibility: bool,
}

impl CompileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `NAME` or `NAME=VALUE` definition
    pub fn define(&mut self, definition: &str) {
        let directive = match definition.split_once('=') {
            Some((name, value)) => MacroDirective::Define {
                name: name.trim().to_string(),
                value: Some(value.to_string()),
            },
            None => MacroDirective::Define {
                name: definition.trim().to_string(),
                value: None,
            },
        };
        self.macro_directives.push(directive);
    }

    pub fn undefine(&mut self, name: &str) {
        self.macro_directives
            .push(MacroDirective::Undefine(name.trim().to_string()));
    }

    /// Apply one compiler flag; returns false for flags that carry no
    /// setting we track. `next` supplies the argument of split flags
    /// such as `-I dir`.
    pub fn apply_flag(
        &mut self,
        flag: &str,
        next: &mut dyn Iterator<Item = String>,
        base_dir: &Path,
    ) -> bool {
        let mut take = |inline: &str| -> Option<String> {
            if inline.is_empty() {
                next.next()
            } else {
                Some(inline.to_string())
            }
        };

        if let Some(rest) = flag.strip_prefix("-I") {
            if let Some(dir) = take(rest) {
                self.include_dirs.push(base_dir.join(dir));
            }
        } else if let Some(rest) = flag.strip_prefix("-D") {
            if let Some(definition) = take(rest) {
                self.define(&definition);
            }
        } else if let Some(rest) = flag.strip_prefix("-U") {
            if let Some(name) = take(rest) {
                self.undefine(&name);
            }
        } else if let Some(std) = flag.strip_prefix("-std=") {
            if std.starts_with("gnu") {
                self.gnu_extensions = true;
            }
            self.standard = Some(std.replacen("gnu", "c", 1));
        } else if flag == "-fms-extensions" {
            self.msvc_extensions = true;
        } else if flag == "-fms-compatibility" {
            self.msvc_compatibility = true;
        } else if let Some(feature) = flag.strip_prefix("-f") {
            self.features.push(feature.to_string());
        } else {
            return false;
        }
        true
    }

    /// Append settings from `other`; later definitions win
    pub fn merge(&mut self, other: CompileConfig) {
        self.include_dirs.extend(other.include_dirs);
        self.macro_directives.extend(other.macro_directives);
        if other.standard.is_some() {
            self.standard = other.standard;
        }
        self.features.extend(other.features);
        self.gnu_extensions |= other.gnu_extensions;
        self.msvc_extensions |= other.msvc_extensions;
        self.msvc_compatibility |= other.msvc_compatibility;
    }

    /// Object-like macros in effect after applying every directive in order.
    ///
    /// Bare `-D NAME` defines `NAME` as `1`. Function-like definitions
    /// (`NAME(x)=...`) cannot be substituted at token level and are dropped.
    pub fn macros(&self) -> BTreeMap<String, String> {
        let mut macros = BTreeMap::new();
        for directive in &self.macro_directives {
            match directive {
                MacroDirective::Define { name, .. } if name.contains('(') => {
                    debug!("ignoring function-like macro {}", name);
                }
                MacroDirective::Define { name, value } => {
                    macros.insert(name.clone(), value.clone().unwrap_or_else(|| "1".to_string()));
                }
                MacroDirective::Undefine(name) => {
                    macros.remove(name);
                }
            }
        }
        macros
    }

    /// Render back to compiler flags
    pub fn to_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if let Some(std) = &self.standard {
            let std = if self.gnu_extensions {
                std.replacen("c++", "gnu++", 1)
            } else {
                std.clone()
            };
            flags.push(format!("-std={}", std));
        }
        for dir in &self.include_dirs {
            flags.push(format!("-I{}", dir.display()));
        }
        for directive in &self.macro_directives {
            flags.push(match directive {
                MacroDirective::Define {
                    name,
                    value: Some(value),
                } => format!("-D{}={}", name, value),
                MacroDirective::Define { name, value: None } => format!("-D{}", name),
                MacroDirective::Undefine(name) => format!("-U{}", name),
            });
        }
        for feature in &self.features {
            flags.push(format!("-f{}", feature));
        }
        if self.msvc_extensions {
            flags.push("-fms-extensions".to_string());
        }
        if self.msvc_compatibility {
            flags.push("-fms-compatibility".to_string());
        }
        flags
    }

    /// Read the entry for `file` from `<database_dir>/compile_commands.json`.
    ///
    /// With `database_file` set, that file's entry is used regardless of
    /// which file is being parsed.
    pub fn from_database(
        database_dir: &Path,
        file: &Path,
        database_file: Option<&Path>,
    ) -> Result<CompileConfig, ConfigError> {
        let path = database_dir.join("compile_commands.json");
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let entries: Vec<CompileCommand> =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.clone(),
                source,
            })?;

        let wanted = database_file.unwrap_or(file);
        let entry = entries
            .iter()
            .find(|entry| entry.matches(wanted))
            .ok_or_else(|| ConfigError::NoEntry {
                file: wanted.display().to_string(),
            })?;

        debug!("using compilation database entry for {}", entry.file);
        let base_dir = PathBuf::from(&entry.directory);
        let mut args = entry.arguments().into_iter().skip(1);
        let mut config = CompileConfig::new();
        while let Some(arg) = args.next() {
            config.apply_flag(&arg, &mut args, &base_dir);
        }
        Ok(config)
    }
}

/// One entry of `compile_commands.json`
#[derive(Debug, Deserialize)]
struct CompileCommand {
    directory: String,
    file: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<String>>,
}

impl CompileCommand {
    fn matches(&self, wanted: &Path) -> bool {
        let entry_path = Path::new(&self.directory).join(&self.file);
        if entry_path == wanted || Path::new(&self.file) == wanted {
            return true;
        }
        match (entry_path.canonicalize(), wanted.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => wanted.is_relative() && entry_path.ends_with(wanted),
        }
    }

    fn arguments(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command(command),
            (None, None) => Vec::new(),
        }
    }
}

/// Split a shell command line, honoring quotes and backslash escapes
fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', q) if q != Some('\'') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    in_arg = true;
                }
            }
            ('"' | '\'', None) => {
                quote = Some(c);
                in_arg = true;
            }
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (c, _) => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}
