//! Placeholder expansion in step tokens

use crate::error::{NoxideError, Result};
use crate::session::ParsedArgs;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid placeholder pattern")
});

/// Values a token may refer to
pub struct Vars<'a> {
    pub args: &'a ParsedArgs,
    pub python: Option<&'a str>,
    pub envdir: Option<&'a Path>,
}

impl Vars<'_> {
    fn lookup(&self, name: &str, token: &str) -> Result<String> {
        match name {
            "posargs" => Ok(shell_words::join(self.args.passthrough())),
            "python" => Ok(self.python.unwrap_or_default().to_string()),
            "envdir" => self
                .envdir
                .map(|dir| dir.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    NoxideError::argument(format!(
                        "{{envdir}} used in '{token}' but the session has no environment"
                    ))
                }),
            option => self.args.value(option).map(str::to_string).ok_or_else(|| {
                NoxideError::argument(format!("unknown placeholder {{{option}}} in '{token}'"))
            }),
        }
    }
}

/// Expand one token
pub fn expand_token(token: &str, vars: &Vars<'_>) -> Result<String> {
    let mut expanded = String::with_capacity(token.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(token) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        expanded.push_str(&token[last..whole.start()]);
        expanded.push_str(&vars.lookup(name.as_str(), token)?);
        last = whole.end();
    }
    expanded.push_str(&token[last..]);
    Ok(expanded)
}

/// Expand a token list; a token that is exactly `{posargs}` splices in the pass-through list
pub fn expand_tokens(tokens: &[String], vars: &Vars<'_>) -> Result<Vec<String>> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token == "{posargs}" {
            expanded.extend(vars.args.passthrough().iter().cloned());
        } else {
            expanded.push(expand_token(token, vars)?);
        }
    }
    Ok(expanded)
}
