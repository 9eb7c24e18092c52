use super::interpolate::{expand_token, expand_tokens, Vars};
use super::step::{Conflict, Step, StepAction};
use crate::error::{NoxideError, Result};
use crate::session::{route, ArgPolicy, ParsedArgs, SessionBody, SessionContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace};

/// A session body that interprets steps from the session file
#[derive(Debug, Clone)]
pub struct DeclarativeSession {
    pub args: ArgPolicy,
    pub env: HashMap<String, String>,
    pub conflicts: Vec<Conflict>,
    pub steps: Vec<Step>,
}

impl DeclarativeSession {
    pub fn new(args: ArgPolicy, steps: Vec<Step>) -> Self {
        Self {
            args,
            env: HashMap::new(),
            conflicts: Vec::new(),
            steps,
        }
    }

    pub fn with_conflicts(mut self, conflicts: Vec<Conflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

fn vars<'a>(args: &'a ParsedArgs, ctx: &'a dyn SessionContext) -> Vars<'a> {
    Vars {
        args,
        python: ctx.python(),
        envdir: ctx.env_root(),
    }
}

fn expand_env(
    env: &HashMap<String, String>,
    args: &ParsedArgs,
    ctx: &dyn SessionContext,
) -> Result<HashMap<String, String>> {
    let vars = vars(args, ctx);
    env.iter()
        .map(|(key, value)| Ok((key.clone(), expand_token(value, &vars)?)))
        .collect()
}

#[async_trait]
impl SessionBody for DeclarativeSession {
    async fn run(&self, ctx: &mut dyn SessionContext) -> Result<()> {
        let mut args = route(&self.args, ctx.posargs())?;
        if let Some(conflict) = self
            .conflicts
            .iter()
            .find(|conflict| conflict.when.evaluate(&args, ctx.platform()))
        {
            return Err(NoxideError::argument(conflict.message.clone()));
        }
        let session_env = expand_env(&self.env, &args, &*ctx)?;
        ctx.env_mut().extend(session_env);

        for (index, step) in self.steps.iter().enumerate() {
            if !step.applies(&args, ctx.platform()) {
                trace!(
                    "{}: skipping step {} ({}), condition not met",
                    ctx.name(),
                    index + 1,
                    step.action.kind()
                );
                continue;
            }

            let step_env = expand_env(&step.command_env(ctx.platform()), &args, &*ctx)?;
            match &step.action {
                StepAction::Install(specs) => {
                    let specs = expand_tokens(specs, &vars(&args, &*ctx))?;
                    ctx.install(&specs, &step_env).await?;
                }
                StepAction::Run(argv) => {
                    let argv = expand_tokens(argv, &vars(&args, &*ctx))?;
                    ctx.run(&argv, &step_env, step.silent).await?;
                }
                StepAction::Chdir(dir) => {
                    let dir = expand_token(dir, &vars(&args, &*ctx))?;
                    ctx.chdir(Path::new(&dir))?;
                }
                StepAction::SetEnv(env) => {
                    let env = expand_env(env, &args, &*ctx)?;
                    ctx.env_mut().extend(env);
                }
                StepAction::AppendPosargs(extra) => {
                    let extra = expand_tokens(extra, &vars(&args, &*ctx))?;
                    args.extend_passthrough(extra);
                }
                StepAction::Error(message) => {
                    let message = expand_token(message, &vars(&args, &*ctx))?;
                    return Err(ctx.error(&message));
                }
                StepAction::Stop(true) => {
                    debug!("{}: stopping after step {}", ctx.name(), index + 1);
                    return Ok(());
                }
                StepAction::Stop(false) => {}
            }
        }
        Ok(())
    }
}
