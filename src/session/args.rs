//! Argument router
//!
//! Splits the trailing arguments given to a session into declared options
//! and the pass-through list forwarded verbatim to external tools.

use crate::error::{NoxideError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a session interprets its trailing arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ArgPolicy {
    /// Everything is pass-through; sessions may only test for token membership
    #[default]
    Transparent,
    /// Declared options are consumed, the remainder is passed through
    Structured {
        /// Keep unknown flags as pass-through instead of rejecting them
        #[serde(default)]
        pass_unknown: bool,
        #[serde(default)]
        options: Vec<OptionSpec>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Boolean flag, set when present
    Switch,
    /// Takes exactly one value
    Value,
}

/// One declared session option
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    pub name: String,
    /// Long flag without dashes; defaults to the name when no short flag is given
    pub long: Option<String>,
    pub short: Option<char>,
    pub kind: OptionKind,
    pub default: Option<String>,
}

impl OptionSpec {
    pub fn switch(name: &str) -> Self {
        Self {
            name: name.to_string(),
            long: None,
            short: None,
            kind: OptionKind::Switch,
            default: None,
        }
    }

    pub fn value(name: &str) -> Self {
        Self {
            kind: OptionKind::Value,
            ..Self::switch(name)
        }
    }

    pub fn with_long(mut self, long: &str) -> Self {
        self.long = Some(long.to_string());
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    fn long_flag(&self) -> Option<String> {
        match (&self.long, self.short) {
            (Some(long), _) => Some(long.clone()),
            (None, None) => Some(self.name.replace('_', "-")),
            (None, Some(_)) => None,
        }
    }

    fn display_flag(&self) -> String {
        match (self.long_flag(), self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => self.name.clone(),
        }
    }
}

/// Result of routing a session's trailing arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: BTreeMap<String, String>,
    switches: BTreeSet<String>,
    passthrough: Vec<String>,
}

impl ParsedArgs {
    /// Raw membership test on the pass-through list
    pub fn contains(&self, token: &str) -> bool {
        self.passthrough.iter().any(|arg| arg == token)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }

    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    pub fn extend_passthrough(&mut self, extra: impl IntoIterator<Item = String>) {
        self.passthrough.extend(extra);
    }
}

/// Route `raw` according to `policy`
pub fn route(policy: &ArgPolicy, raw: &[String]) -> Result<ParsedArgs> {
    match policy {
        ArgPolicy::Transparent => Ok(ParsedArgs {
            passthrough: raw.to_vec(),
            ..ParsedArgs::default()
        }),
        ArgPolicy::Structured {
            pass_unknown,
            options,
        } => parse_structured(options, *pass_unknown, raw),
    }
}

fn parse_structured(options: &[OptionSpec], pass_unknown: bool, raw: &[String]) -> Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    for option in options {
        if let (OptionKind::Value, Some(default)) = (option.kind, &option.default) {
            parsed.values.insert(option.name.clone(), default.clone());
        }
    }

    let mut tokens = raw.iter();
    while let Some(token) = tokens.next() {
        if token == "--" {
            parsed.passthrough.extend(tokens.by_ref().cloned());
            break;
        }

        let matched = if let Some(long) = token.strip_prefix("--") {
            let (flag, inline) = match long.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (long, None),
            };
            find_long(options, flag)?.map(|o| (o, inline))
        } else if let Some(short) = short_flag(token) {
            let rest = &token[1 + short.len_utf8()..];
            options
                .iter()
                .find(|o| o.short == Some(short))
                .and_then(|o| match o.kind {
                    OptionKind::Value if !rest.is_empty() => {
                        Some((o, Some(rest.strip_prefix('=').unwrap_or(rest).to_string())))
                    }
                    _ if rest.is_empty() => Some((o, None)),
                    // Clustered short switches are not supported
                    _ => None,
                })
        } else {
            parsed.passthrough.push(token.clone());
            continue;
        };

        let Some((option, inline)) = matched else {
            if pass_unknown {
                parsed.passthrough.push(token.clone());
                continue;
            }
            return Err(NoxideError::argument(format!(
                "unrecognized arguments: {token}"
            )));
        };

        match option.kind {
            OptionKind::Switch => {
                if inline.is_some() {
                    return Err(NoxideError::argument(format!(
                        "{} does not take a value",
                        option.display_flag()
                    )));
                }
                parsed.switches.insert(option.name.clone());
            }
            OptionKind::Value => {
                let value = match inline {
                    Some(value) => value,
                    None => match tokens.next() {
                        Some(next) if !looks_like_flag(next) => next.clone(),
                        _ => {
                            return Err(NoxideError::argument(format!(
                                "{} expects one argument",
                                option.display_flag()
                            )))
                        }
                    },
                };
                parsed.values.insert(option.name.clone(), value);
            }
        }
    }

    Ok(parsed)
}

/// Exact long flag, or the single option it is an unambiguous prefix of
fn find_long<'a>(options: &'a [OptionSpec], flag: &str) -> Result<Option<&'a OptionSpec>> {
    if let Some(exact) = options
        .iter()
        .find(|o| o.long_flag().as_deref() == Some(flag))
    {
        return Ok(Some(exact));
    }
    if flag.is_empty() {
        return Ok(None);
    }

    let candidates: Vec<&OptionSpec> = options
        .iter()
        .filter(|o| o.long_flag().is_some_and(|long| long.starts_with(flag)))
        .collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(only)),
        many => Err(NoxideError::argument(format!(
            "ambiguous option: --{flag} could match {}",
            many.iter()
                .map(|o| o.display_flag())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn short_flag(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) if c != '-' => Some(c),
        _ => None,
    }
}

fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1
}
