use crate::ast::{ExportStmt, PrefixKind, PreambleStmt, RawBlock, RawPipeline, RawTask};
use crate::error::ParseError;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use trestle_expand::Location;

fn extend_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^extend\s+(.+)$"))
}

fn use_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^use\s+(.+?)(?:\s+as\s+(\w[\w\d_]*))?$"))
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^prefix\s+(file|dir)(\s+.+?)?\s*$"))
}

fn var_assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^(\w[\w\d_]*)\s*=(.+)$"))
}

fn var_del_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^unset\s+(\w[\w\d_]*)$"))
}

fn task_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^(\w[\w\d_]*)\s*:(.*)$"))
}

fn valid_dep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^\w[\w\d_]*(\.\w[\w\d_]*)?$"))
}

fn outer_indent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^(\s+)\S"))
}

fn property_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex_or_unreachable(r"^#\s*(\w[\w\d_]*)\s*:\s*(.*)$"))
}

fn regex_or_unreachable(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| unreachable!("invalid static regex {pattern}: {e}"))
}

/// Parse a pipeline file from disk.
pub fn parse_pipeline_file(path: &Path) -> Result<RawPipeline, ParseError> {
    let canonical = path.to_path_buf();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ParseError::Io(Location::new(canonical.clone(), 0), e))?;
    parse_pipeline_str(&canonical, &text)
}

/// Parse pipeline text already in memory, attributing diagnostics to `source`.
pub fn parse_pipeline_str(source: &Path, text: &str) -> Result<RawPipeline, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut p = Parser {
        source: source.to_path_buf(),
        lines,
    };
    p.parse()
}

struct Parser<'a> {
    source: PathBuf,
    lines: Vec<&'a str>,
}

impl<'a> Parser<'a> {
    fn loc(&self, lineno: usize) -> Location {
        // internal linenos are 0-indexed; diagnostics are 1-based.
        Location::new(self.source.clone(), lineno + 1)
    }

    fn parse(&mut self) -> Result<RawPipeline, ParseError> {
        let (mut lineno, statements) = self.parse_preamble()?;
        let tasks = self.parse_tasks(&mut lineno)?;
        Ok(RawPipeline {
            source: self.source.clone(),
            statements,
            tasks,
        })
    }

    fn parse_preamble(&self) -> Result<(usize, Vec<PreambleStmt>), ParseError> {
        let mut statements = Vec::new();
        let mut lineno = 0usize;
        let mut in_comment_block = false;

        while lineno < self.lines.len() {
            let raw = self.lines[lineno];
            let cur_line = raw.trim();

            if in_comment_block {
                if cur_line.starts_with("###") {
                    in_comment_block = false;
                }
            } else if cur_line.starts_with("###") {
                in_comment_block = true;
            } else if let Some(caps) = extend_re().captures(cur_line) {
                let fname = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
                statements.push(PreambleStmt::Extend {
                    path: fname,
                    loc: self.loc(lineno),
                });
            } else if let Some(caps) = var_assign_re().captures(cur_line) {
                let name = caps.get(1).unwrap().as_str().to_string();
                let value = caps.get(2).unwrap().as_str().to_string();
                statements.push(PreambleStmt::VariableAssignment {
                    name,
                    value,
                    loc: self.loc(lineno),
                });
            } else if let Some(caps) = var_del_re().captures(cur_line) {
                let name = caps.get(1).unwrap().as_str().to_string();
                statements.push(PreambleStmt::DeleteVariable {
                    name,
                    loc: self.loc(lineno),
                });
            } else if let Some(caps) = use_re().captures(cur_line) {
                let path = caps.get(1).unwrap().as_str().to_string();
                let alias = caps.get(2).map(|m| m.as_str().to_string());
                statements.push(PreambleStmt::Use {
                    path,
                    alias,
                    loc: self.loc(lineno),
                });
            } else if let Some(caps) = prefix_re().captures(cur_line) {
                let kind = if &caps[1] == "file" {
                    PrefixKind::File
                } else {
                    PrefixKind::Dir
                };
                let value = caps.get(2).map(|m| m.as_str().trim().to_string()).filter(|s| !s.is_empty());
                statements.push(PreambleStmt::Prefix {
                    kind,
                    value,
                    loc: self.loc(lineno),
                });
            } else if cur_line.is_empty() || cur_line.starts_with('#') {
                // skipped
            } else {
                break;
            }

            lineno += 1;
        }

        Ok((lineno, statements))
    }

    fn parse_tasks(&mut self, lineno: &mut usize) -> Result<Vec<RawTask>, ParseError> {
        let mut tasks = Vec::new();
        let mut in_comment_block = false;
        let mut pending_comments: Vec<String> = Vec::new();

        while *lineno < self.lines.len() {
            let cur_line = self.lines[*lineno].trim_end();

            if in_comment_block {
                *lineno += 1;
                if cur_line.starts_with("###") {
                    in_comment_block = false;
                }
                continue;
            }

            if cur_line.starts_with("###") {
                *lineno += 1;
                in_comment_block = true;
                pending_comments.clear();
                continue;
            }

            if cur_line.trim().is_empty() {
                *lineno += 1;
                pending_comments.clear();
                continue;
            }

            if cur_line.trim_start().starts_with('#') {
                pending_comments.push(cur_line.trim_start().to_string());
                *lineno += 1;
                continue;
            }

            if let Some(caps) = task_re().captures(cur_line) {
                let task_name = caps.get(1).unwrap().as_str().to_string();
                let dep_str = caps.get(2).unwrap().as_str().to_string();
                let properties = properties_from_comments(&pending_comments);
                pending_comments.clear();

                let task = self.parse_task(task_name, &dep_str, *lineno, properties, lineno)?;
                tasks.push(task);
            } else {
                return Err(ParseError::ExpectedTaskDefinition(
                    self.loc(*lineno),
                    cur_line.to_string(),
                ));
            }
        }

        Ok(tasks)
    }

    fn parse_task(
        &self,
        task_name: String,
        dep_str: &str,
        start_lineno: usize,
        properties: BTreeMap<String, String>,
        lineno: &mut usize,
    ) -> Result<RawTask, ParseError> {
        let dep_str = dep_str.split('#').next().unwrap_or("").trim();
        let mut dep_names = Vec::new();
        for dep in dep_str.split_whitespace() {
            if !valid_dep_re().is_match(dep) {
                return Err(ParseError::InvalidDependency(
                    self.loc(start_lineno),
                    dep.to_string(),
                ));
            }
            dep_names.push(dep.to_string());
        }

        *lineno += 1;

        let mut blocks = Vec::new();
        let indent_seq = match find_indentation_match(&self.lines, *lineno, outer_indent_re()) {
            Some(caps) => caps,
            None => {
                return Ok(RawTask {
                    name: task_name,
                    dep_names,
                    blocks,
                    properties,
                    loc: self.loc(start_lineno),
                })
            }
        };

        let code_re = Regex::new(&format!(r"^{}code\.(\w+):(.*)$", regex::escape(&indent_seq)))
            .unwrap_or_else(|e| unreachable!("invalid dynamic regex: {e}"));
        let export_re = Regex::new(&format!(r"^{}export:(.*)$", regex::escape(&indent_seq)))
            .unwrap_or_else(|e| unreachable!("invalid dynamic regex: {e}"));

        let mut in_comment_block = false;

        while *lineno < self.lines.len() {
            let cur_line = self.lines[*lineno].trim_end_matches(['\r']);

            if in_comment_block {
                if !cur_line.starts_with(indent_seq.as_str()) {
                    return Err(ParseError::UnindentedCommentLine(self.loc(*lineno)));
                }
                *lineno += 1;
                if cur_line == format!("{indent_seq}###") {
                    in_comment_block = false;
                }
                continue;
            }

            if cur_line.starts_with(&format!("{indent_seq}###")) {
                in_comment_block = true;
                *lineno += 1;
                continue;
            }

            if cur_line.starts_with(&format!("{indent_seq}#")) || cur_line.trim().is_empty() {
                *lineno += 1;
                continue;
            }

            if let Some(caps) = code_re.captures(cur_line) {
                let lang = caps.get(1).unwrap().as_str().to_string();
                let arg_str = caps.get(2).unwrap().as_str().to_string();
                let block_lineno = *lineno;
                let (next_lineno, content, content_linenos) =
                    read_block_content(&self.lines, *lineno + 1, &indent_seq);
                *lineno = next_lineno;
                blocks.push(RawBlock::Code {
                    lang,
                    arg_str,
                    content,
                    content_linenos,
                    loc: self.loc(block_lineno),
                });
            } else if let Some(caps) = export_re.captures(cur_line) {
                let arg_str = caps.get(1).unwrap().as_str().trim().to_string();
                let export_lineno = *lineno;
                if !arg_str.is_empty() {
                    return Err(ParseError::ExportBlockHasArgString(self.loc(*lineno)));
                }

                let (next_lineno, content, content_linenos) =
                    read_block_content(&self.lines, *lineno + 1, &indent_seq);

                let mut statements = Vec::new();
                for (ln, line) in content_linenos.iter().zip(content.iter()) {
                    let line = line.trim_end();
                    if let Some(caps) = var_assign_re().captures(line) {
                        statements.push(ExportStmt::Assign {
                            name: caps.get(1).unwrap().as_str().to_string(),
                            value: caps.get(2).unwrap().as_str().to_string(),
                            loc: self.loc(*ln),
                        });
                    } else if let Some(caps) = var_del_re().captures(line) {
                        statements.push(ExportStmt::Delete {
                            name: caps.get(1).unwrap().as_str().to_string(),
                            loc: self.loc(*ln),
                        });
                    } else if line.is_empty() {
                        // skipped
                    } else {
                        return Err(ParseError::ExpectedVariableAssignment(
                            self.loc(*ln),
                            line.to_string(),
                        ));
                    }
                }

                blocks.push(RawBlock::Export {
                    statements,
                    loc: self.loc(export_lineno),
                });
                *lineno = next_lineno;
            } else {
                break;
            }
        }

        Ok(RawTask {
            name: task_name,
            dep_names,
            blocks,
            properties,
            loc: self.loc(start_lineno),
        })
    }
}

fn properties_from_comments(lines: &[String]) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    for line in lines {
        if let Some(caps) = property_comment_re().captures(line) {
            props.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    props
}

/// Find the first non-blank line at or after `lineno` and test it against `pattern`, returning
/// the matched indent string (capture group 1) if it matched.
fn find_indentation_match(lines: &[&str], mut lineno: usize, pattern: &Regex) -> Option<String> {
    while lineno < lines.len() {
        if lines[lineno].trim().is_empty() {
            lineno += 1;
        } else {
            return pattern
                .captures(lines[lineno])
                .map(|c| c.get(1).unwrap().as_str().to_string());
        }
    }
    None
}

/// Read block content: lines indented at least one step deeper than `indent_seq`. Returns the
/// line number just past the block, the dedented content lines, and their original line numbers.
fn read_block_content(
    lines: &[&str],
    lineno: usize,
    indent_seq: &str,
) -> (usize, Vec<String>, Vec<usize>) {
    let inner_pattern = Regex::new(&format!(r"^({}\s+)\S", regex::escape(indent_seq)))
        .unwrap_or_else(|e| unreachable!("invalid dynamic regex: {e}"));

    let inner_indent_seq = match find_indentation_match(lines, lineno, &inner_pattern) {
        Some(seq) => seq,
        None => return (lineno, Vec::new(), Vec::new()),
    };

    let mut last_lineno = lineno;
    let mut content_lines = Vec::new();
    let mut content_linenos = Vec::new();

    while last_lineno < lines.len() {
        let line = lines[last_lineno];
        if line.starts_with(inner_indent_seq.as_str()) {
            content_lines.push(line.to_string());
            content_linenos.push(last_lineno);
        } else if line.trim().is_empty() {
            content_lines.push(inner_indent_seq.clone());
            content_linenos.push(last_lineno);
        } else {
            break;
        }
        last_lineno += 1;
    }

    let il = inner_indent_seq.len();
    let content = content_lines
        .into_iter()
        .map(|l| l.get(il..).unwrap_or("").trim_end().to_string())
        .collect();

    (last_lineno, content, content_linenos)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
