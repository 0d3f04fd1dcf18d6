//! Command grammar accepted from the chat front end.
//!
//! ```text
//! [verbose ][noop ]cut ami for ENV-DEP-PLAY[ from ami-ID | from ENV-DEP-PLAY][ with k=v ...]
//! show ENV-DEP
//! show ENV-DEP-PLAY
//! show DEP ami-ID
//! help
//! ```

use crate::{is_word, CoreError, Edp, Result};

pub const ACTION_BUILD: &str = "ami.build";
pub const ACTION_SHOW: &str = "fleet.show";

pub const HELP_TEXT: &str = "\
show <env>-<dep>: list the active plays in a cluster
show <env>-<dep>-<play>: show the instances of a play
show <dep> <ami-id>: show the tags of an image
[verbose] [noop] cut ami for <env>-<dep>-<play> [from <ami-id>] [with k=v ...]: build from the blessed or a given image
[verbose] [noop] cut ami for <env>-<dep>-<play> from <env>-<dep>-<play> [with k=v ...]: build from another cluster's versions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ShowPlays {
        environment: String,
        deployment: String,
    },
    ShowEdp(Edp),
    ShowImage {
        deployment: String,
        image_id: String,
    },
    CutImage(CutRequest),
}

/// Where the versions of a new image come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    Blessed,
    Image(String),
    Edp(Edp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutRequest {
    pub destination: Edp,
    pub source: BuildSource,
    /// Raw `key=value` tokens, validated when applied.
    pub overrides: Vec<String>,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Command {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(CoreError::InvalidCommand("empty command".to_string())),
            ["help"] => Ok(Command::Help),
            ["show", target] => parse_show_target(target),
            ["show", deployment, image_id] if is_word(deployment) && is_image_id(image_id) => {
                Ok(Command::ShowImage {
                    deployment: deployment.to_string(),
                    image_id: image_id.to_string(),
                })
            }
            _ => parse_cut(&tokens).map(Command::CutImage),
        }
    }

    /// Permission required to run the command, if any.
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Command::Help => None,
            Command::ShowPlays { .. } | Command::ShowEdp(_) | Command::ShowImage { .. } => {
                Some(ACTION_SHOW)
            }
            Command::CutImage(_) => Some(ACTION_BUILD),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::ShowPlays { .. } => "show_plays",
            Command::ShowEdp(_) => "show_edp",
            Command::ShowImage { .. } => "show_image",
            Command::CutImage(_) => "cut_ami",
        }
    }
}

pub fn is_image_id(token: &str) -> bool {
    token
        .strip_prefix("ami-")
        .map(is_word)
        .unwrap_or(false)
}

fn parse_show_target(target: &str) -> Result<Command> {
    let parts: Vec<&str> = target.split('-').collect();
    match parts.as_slice() {
        [env, dep] if is_word(env) && is_word(dep) => Ok(Command::ShowPlays {
            environment: env.to_string(),
            deployment: dep.to_string(),
        }),
        [_, _, _] => Ok(Command::ShowEdp(target.parse()?)),
        _ => Err(CoreError::InvalidCommand(format!(
            "cannot show '{target}': expected <env>-<dep> or <env>-<dep>-<play>"
        ))),
    }
}

fn parse_cut(tokens: &[&str]) -> Result<CutRequest> {
    let mut dry_run = false;
    let mut verbose = false;
    let mut rest = tokens;

    while let Some((first, tail)) = rest.split_first() {
        match *first {
            "noop" if !dry_run => dry_run = true,
            "verbose" if !verbose => verbose = true,
            _ => break,
        }
        rest = tail;
    }

    let (destination, mut rest) = match rest {
        ["cut", "ami", "for", edp, tail @ ..] => (edp.parse::<Edp>()?, tail),
        _ => {
            return Err(CoreError::InvalidCommand(format!(
                "unrecognized command '{}'",
                tokens.join(" ")
            )))
        }
    };

    let mut source = BuildSource::Blessed;
    if let ["from", origin, tail @ ..] = rest {
        source = if is_image_id(origin) {
            BuildSource::Image(origin.to_string())
        } else {
            BuildSource::Edp(origin.parse()?)
        };
        rest = tail;
    }

    let overrides = match rest {
        [] => Vec::new(),
        ["with", tail @ ..] => tail.iter().map(|t| t.to_string()).collect(),
        [unexpected, ..] => {
            return Err(CoreError::InvalidCommand(format!(
                "unexpected '{unexpected}', expected 'from' or 'with'"
            )))
        }
    };

    Ok(CutRequest {
        destination,
        source,
        overrides,
        dry_run,
        verbose,
    })
}
