//! Source-level shader preprocessor.
//!
//! Handles the two directives the GLSL compiler cannot resolve on its own:
//!
//! - `#version ...` is used as an anchor: the requested defines are inserted
//!   right after it, followed by a `#line` reset so diagnostics keep the
//!   original line numbers.
//! - `#include <file>` is replaced by the (recursively preprocessed) contents
//!   of `<file>`, resolved against the shader root, wrapped in `#line`
//!   markers.
//!
//! `#line <n> <id>` uses the second argument as a source-string id: `0` for
//! the top-level file, `1` for included files. The marker that closes an
//! include carries the includer's id, so returning from a nested include
//! emits `#line <n> 1` rather than `#line <n> 0`.

use crate::error::{Result, ShaderError};
use crate::text_utils::{
    basename, begins_with, file_modified_time, identity, join, read_file_to_string, split,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const VERSION_DIRECTIVE: &str = "#version ";
pub const INCLUDE_DIRECTIVE: &str = "#include ";

const ROOT_SOURCE_ID: u32 = 0;
const INCLUDED_SOURCE_ID: u32 = 1;

/// Output of [`Preprocessor::preprocess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedSource {
    /// Final source text handed to the compiler.
    pub text: String,
    /// Every file read to produce `text`: the top-level file first, then
    /// includes in the order they were first encountered.
    pub files: Vec<PathBuf>,
    /// Modification time of each file in `files`, taken before it was read.
    /// An edit saved while preprocessing is therefore newer than the
    /// recorded time.
    pub mod_times: HashMap<PathBuf, SystemTime>,
}

/// Resolves includes and injects defines. Pure text; no GPU calls.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    root: PathBuf,
}

impl Preprocessor {
    /// Create a preprocessor resolving `#include` arguments against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Preprocess the file at `path`, injecting `defines` (in order) after
    /// its `#version` line.
    pub fn preprocess(&self, path: &Path, defines: &[String]) -> Result<PreprocessedSource> {
        let mut chain = Vec::new();
        let mut out = PreprocessedSource {
            text: String::new(),
            files: Vec::new(),
            mod_times: HashMap::new(),
        };
        out.text = self.process_file(path, defines, ROOT_SOURCE_ID, &mut chain, &mut out)?;
        Ok(out)
    }

    fn process_file(
        &self,
        path: &Path,
        defines: &[String],
        source_id: u32,
        chain: &mut Vec<PathBuf>,
        out: &mut PreprocessedSource,
    ) -> Result<String> {
        let mtime = file_modified_time(path).unwrap_or(UNIX_EPOCH);
        let source = read_file_to_string(path)?.replace("\r\n", "\n");

        chain.push(identity(path));
        if !out.files.iter().any(|f| f == path) {
            out.files.push(path.to_path_buf());
            out.mod_times.insert(path.to_path_buf(), mtime);
        }

        let mut lines = split(&source, "\n");
        for (index, line) in lines.iter_mut().enumerate() {
            let line_num = index + 1;

            if !defines.is_empty() && begins_with(line, VERSION_DIRECTIVE) {
                let mut expanded = std::mem::take(line);
                expanded.push('\n');
                for define in defines {
                    expanded.push_str("#define ");
                    expanded.push_str(define);
                    expanded.push('\n');
                }
                expanded.push_str(&format!("#line {} {}", line_num + 1, source_id));
                *line = expanded;
            } else if begins_with(line, INCLUDE_DIRECTIVE) {
                let include_path = self.resolve_include(path, line_num, line, chain)?;
                let body = self.process_file(
                    &include_path,
                    &[],
                    INCLUDED_SOURCE_ID,
                    chain,
                    out,
                )?;
                *line = format!(
                    "#line 1 {INCLUDED_SOURCE_ID}\n{body}\n#line {} {}",
                    line_num + 1,
                    source_id
                );
            }
        }

        chain.pop();
        Ok(join(&lines, "\n"))
    }

    fn resolve_include(
        &self,
        includer: &Path,
        line_num: usize,
        line: &str,
        chain: &[PathBuf],
    ) -> Result<PathBuf> {
        let parse_error = |message: String| ShaderError::Parse {
            path: includer.to_path_buf(),
            line: line_num,
            message,
        };

        let args: Vec<&str> = line[INCLUDE_DIRECTIVE.len()..].split_whitespace().collect();
        let [name] = args.as_slice() else {
            return Err(parse_error(format!(
                "#include expects exactly one file argument, found {}",
                args.len()
            )));
        };

        shadecache_config::validate_shader_name(name).map_err(|e| parse_error(e.to_string()))?;

        let include_path = self.root.join(name);
        let include_identity = identity(&include_path);
        if chain.contains(&include_identity) {
            let cycle: Vec<String> = chain
                .iter()
                .chain(std::iter::once(&include_identity))
                .map(|p| basename(p))
                .collect();
            return Err(parse_error(format!("include cycle: {}", cycle.join(" -> "))));
        }

        Ok(include_path)
    }
}
