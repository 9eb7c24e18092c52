use crate::platform::{Platform, PlatformSelector};
use crate::session::ParsedArgs;
use serde::Deserialize;
use std::collections::HashMap;

/// One step of a declarative session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(default)]
    pub when: Option<Condition>,
    /// Overlay for this step's command only
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Extra overlay entries for this step on matching platforms
    #[serde(default)]
    pub platform_env: Vec<PlatformEnv>,
    /// Capture output instead of streaming it
    #[serde(default)]
    pub silent: bool,
}

impl Step {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            when: None,
            env: HashMap::new(),
            platform_env: Vec::new(),
            silent: false,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.when = Some(condition);
        self
    }

    /// The step's own overlay on the given platform
    pub fn command_env(&self, platform: Platform) -> HashMap<String, String> {
        let mut env = self.env.clone();
        for entry in &self.platform_env {
            if entry.platform.matches(platform) {
                env.extend(entry.env.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        env
    }

    pub fn applies(&self, args: &ParsedArgs, platform: Platform) -> bool {
        self.when
            .as_ref()
            .map_or(true, |condition| condition.evaluate(args, platform))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformEnv {
    pub platform: PlatformSelector,
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Install(Vec<String>),
    Run(Vec<String>),
    Chdir(String),
    SetEnv(HashMap<String, String>),
    AppendPosargs(Vec<String>),
    /// Abort the run with a message
    Error(String),
    /// End the session successfully
    Stop(bool),
}

impl StepAction {
    pub fn kind(&self) -> &'static str {
        match self {
            StepAction::Install(_) => "install",
            StepAction::Run(_) => "run",
            StepAction::Chdir(_) => "chdir",
            StepAction::SetEnv(_) => "set_env",
            StepAction::AppendPosargs(_) => "append_posargs",
            StepAction::Error(_) => "error",
            StepAction::Stop(_) => "stop",
        }
    }
}

/// Mutually exclusive session options, rejected before any step runs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conflict {
    pub when: Condition,
    pub message: String,
}

/// Guard on a step; every field present must hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    /// Pass-through arguments contain this token
    pub flag: Option<String>,
    pub no_flag: Option<String>,
    pub platform: Option<PlatformSelector>,
    /// Structured option compared by `equals` / `not_equals`
    pub option: Option<String>,
    pub equals: Option<String>,
    pub not_equals: Option<String>,
    /// Structured switch is set
    pub switch: Option<String>,
    pub no_switch: Option<String>,
}

impl Condition {
    pub fn evaluate(&self, args: &ParsedArgs, platform: Platform) -> bool {
        if let Some(flag) = &self.flag {
            if !args.contains(flag) {
                return false;
            }
        }
        if let Some(flag) = &self.no_flag {
            if args.contains(flag) {
                return false;
            }
        }
        if let Some(selector) = &self.platform {
            if !selector.matches(platform) {
                return false;
            }
        }
        if let Some(option) = &self.option {
            let value = args.value(option);
            if let Some(expected) = &self.equals {
                if value != Some(expected.as_str()) {
                    return false;
                }
            }
            if let Some(unexpected) = &self.not_equals {
                if value == Some(unexpected.as_str()) {
                    return false;
                }
            }
        }
        if let Some(switch) = &self.switch {
            if !args.switch(switch) {
                return false;
            }
        }
        if let Some(switch) = &self.no_switch {
            if args.switch(switch) {
                return false;
            }
        }
        true
    }

    /// Structured option and switch names this condition reads
    pub fn referenced_options(&self) -> impl Iterator<Item = &str> {
        [&self.option, &self.switch, &self.no_switch]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.option.is_none() && (self.equals.is_some() || self.not_equals.is_some()) {
            return Err("`equals`/`not_equals` need an `option` to compare".to_string());
        }
        if self.option.is_some() && self.equals.is_none() && self.not_equals.is_none() {
            return Err("`option` needs `equals` or `not_equals`".to_string());
        }
        Ok(())
    }
}
