use crate::context::{total_context, AliasResolver, Context, PIPELINE_PREFIX_VAR};
use crate::error::ExpandError;
use crate::Location;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

const SUPPORTED_ESCAPABLE: [char; 2] = ['$', '\\'];

fn variable_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)|^(\{(?:\w+\.)?\w+?\})")
            .unwrap_or_else(|e| unreachable!("invalid static regex: {e}"))
    })
}

/// Expand `$VAR`, `${VAR}`, `${ALIAS.VAR}`, `$PLN(...)`, `$(...)` and `\$`/`\\` escapes in a
/// single line of pipeline text.
pub fn expand(
    text: &str,
    context: &Context,
    cwd: &Path,
    pipelines: &dyn AliasResolver,
    loc: &Location,
) -> Result<String, ExpandError> {
    let (out, _) = expand_impl(text, context, cwd, pipelines, loc, false)?;
    Ok(out)
}

/// Like [`expand`], but stops at the first unescaped `)` instead of raising on it — used to
/// expand a function call's argument text while the caller still owns the trailing `)`.
/// Returns the expanded text together with the character offset of that `)`.
pub fn expand_nested(
    text: &str,
    context: &Context,
    cwd: &Path,
    pipelines: &dyn AliasResolver,
    loc: &Location,
) -> Result<(String, usize), ExpandError> {
    expand_impl(text, context, cwd, pipelines, loc, true)
}

fn expand_impl(
    text: &str,
    context: &Context,
    cwd: &Path,
    pipelines: &dyn AliasResolver,
    loc: &Location,
    nested: bool,
) -> Result<(String, usize), ExpandError> {
    let mut x: Vec<char> = text.chars().collect();
    let mut cpos: usize = 0;

    while cpos < x.len() {
        match x[cpos] {
            '\\' => {
                if cpos == x.len() - 1 {
                    return Err(ExpandError::UnterminatedEscape(loc.clone()));
                }
                let c = x[cpos + 1];
                if !SUPPORTED_ESCAPABLE.contains(&c) {
                    return Err(ExpandError::IllegalEscape {
                        loc: loc.clone(),
                        ch: c,
                    });
                }
                x.splice(cpos..cpos + 2, [c]);
                cpos += 1;
            }
            '$' => {
                if cpos == x.len() - 1 {
                    return Err(ExpandError::IncompleteVariableReference(loc.clone()));
                }

                let rest: String = x[(cpos + 1)..].iter().collect();
                let varname = match variable_pattern().captures(&rest) {
                    None => {
                        if x[cpos + 1] == '(' {
                            String::new()
                        } else {
                            return Err(ExpandError::InvalidVariableReference(loc.clone()));
                        }
                    }
                    Some(caps) => {
                        if let Some(bare) = caps.get(1) {
                            bare.as_str().to_string()
                        } else {
                            let curly = caps
                                .get(2)
                                .unwrap_or_else(|| unreachable!("alternation matched"))
                                .as_str();
                            let stripped = curly[1..curly.len() - 1].to_string();
                            let curly_len = curly.chars().count();
                            let stripped_chars: Vec<char> = stripped.chars().collect();
                            x.splice((cpos + 1)..(cpos + 1 + curly_len), stripped_chars);
                            stripped
                        }
                    }
                };

                let varname_len = varname.chars().count();
                let fxn_paren_pos = cpos + 1 + varname_len;
                let is_fxn_call =
                    fxn_paren_pos < x.len().saturating_sub(1) && x.get(fxn_paren_pos) == Some(&'(');

                if is_fxn_call {
                    if varname != "" && varname != "PLN" {
                        return Err(ExpandError::UnknownBuiltinFunction {
                            loc: loc.clone(),
                            name: varname,
                        });
                    }

                    let fxn_argstart_pos = fxn_paren_pos + 1;
                    let arg_text: String = x[fxn_argstart_pos..].iter().collect();
                    let (expanded_tail, eofxn_rel) =
                        expand_impl(&arg_text, context, cwd, pipelines, loc, true)?;

                    x.truncate(fxn_argstart_pos);
                    x.extend(expanded_tail.chars());
                    let eofxn = fxn_argstart_pos + eofxn_rel;

                    let args_str: String = x[fxn_argstart_pos..eofxn].iter().collect();
                    let args: Vec<String> =
                        args_str.split(',').map(|s| s.trim().to_string()).collect();

                    let ret_val = if varname.is_empty() {
                        run_shell_capture(&args_str, context, cwd, loc)?
                    } else {
                        pln_function(&args, context, pipelines, loc)?
                    };

                    let pre_fxn: Vec<char> = x[..cpos].to_vec();
                    let post_fxn: Vec<char> = x[(eofxn + 1)..].to_vec();
                    let ret_chars: Vec<char> = ret_val.chars().collect();
                    let new_cpos = pre_fxn.len() + ret_chars.len();
                    x = pre_fxn
                        .into_iter()
                        .chain(ret_chars)
                        .chain(post_fxn)
                        .collect();
                    cpos = new_cpos;
                } else {
                    let (alias, bare_name) = match varname.find('.') {
                        Some(dot) => (Some(varname[..dot].to_string()), varname[dot + 1..].to_string()),
                        None => (None, varname.clone()),
                    };

                    let replacement = match alias {
                        Some(alias) => pipelines.context_var(&alias, &bare_name).ok_or_else(|| {
                            ExpandError::UnknownAlias {
                                loc: loc.clone(),
                                alias: alias.clone(),
                            }
                        })?,
                        None => context.get(&bare_name).cloned().ok_or_else(|| {
                            ExpandError::UnknownVariable {
                                loc: loc.clone(),
                                name: bare_name.clone(),
                            }
                        })?,
                    };

                    let pre_var: Vec<char> = x[..cpos].to_vec();
                    let post_var: Vec<char> = x[(cpos + 1 + varname_len)..].to_vec();
                    let rep_chars: Vec<char> = replacement.chars().collect();
                    let new_cpos = pre_var.len() + rep_chars.len();
                    x = pre_var.into_iter().chain(rep_chars).chain(post_var).collect();
                    cpos = new_cpos;
                }
            }
            ')' if nested => {
                return Ok((x.into_iter().collect(), cpos));
            }
            _ => {
                cpos += 1;
            }
        }
    }

    if nested {
        return Err(ExpandError::UnterminatedFunctionCall(loc.clone()));
    }

    Ok((x.into_iter().collect(), cpos))
}

fn pln_function(
    args: &[String],
    context: &Context,
    pipelines: &dyn AliasResolver,
    loc: &Location,
) -> Result<String, ExpandError> {
    match args.len() {
        1 => {
            let prefix = context.get(PIPELINE_PREFIX_VAR).cloned().ok_or_else(|| {
                ExpandError::UnknownVariable {
                    loc: loc.clone(),
                    name: PIPELINE_PREFIX_VAR.to_string(),
                }
            })?;
            Ok(format!("{}{}", prefix, args[0]))
        }
        2 => {
            let alias = &args[0];
            let prefix = pipelines.prefix(alias).ok_or_else(|| ExpandError::UnknownAlias {
                loc: loc.clone(),
                alias: alias.clone(),
            })?;
            Ok(format!("{}{}", prefix, args[1]))
        }
        _ => Err(ExpandError::TooManyArguments {
            loc: loc.clone(),
            function: "PLN",
        }),
    }
}

fn run_shell_capture(
    cmd: &str,
    context: &Context,
    cwd: &Path,
    loc: &Location,
) -> Result<String, ExpandError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(cwd)
        .env_clear()
        .envs(total_context(context))
        .output()
        .map_err(|e| ExpandError::ShellCallFailed {
            loc: loc.clone(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ExpandError::ShellCallNonZero {
            loc: loc.clone(),
            status: output.status.code().unwrap_or(-1),
        });
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    if text.contains('\n') {
        return Err(ExpandError::ShellCallMultilineOutput { loc: loc.clone() });
    }
    Ok(text)
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
