//! Transport scripts for `stepclip simulate`.
//!
//! A script is a comma- or whitespace-separated list of actions:
//! `step`, `back`, `stop`, `play[:MS]`, `goto:N`, `rate:R`, `loop:on|off`,
//! `duration:MS`.

use stepclip_common::error::{StepclipError, StepclipResult};

/// One scripted transport action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Step,
    Back,
    Stop,
    /// Start playback and let `ms` of native time pass.
    Play { ms: f64 },
    Goto(i64),
    Rate(f64),
    Looping(bool),
    FrameDuration(f64),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step => write!(f, "step"),
            Self::Back => write!(f, "back"),
            Self::Stop => write!(f, "stop"),
            Self::Play { ms } => write!(f, "play:{ms}"),
            Self::Goto(n) => write!(f, "goto:{n}"),
            Self::Rate(r) => write!(f, "rate:{r}"),
            Self::Looping(on) => write!(f, "loop:{}", if *on { "on" } else { "off" }),
            Self::FrameDuration(ms) => write!(f, "duration:{ms}"),
        }
    }
}

/// Parse a script into actions.
pub fn parse_script(script: &str) -> StepclipResult<Vec<Action>> {
    script
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_action)
        .collect()
}

fn parse_action(token: &str) -> StepclipResult<Action> {
    let (name, arg) = match token.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (token, None),
    };

    let action = match (name.to_ascii_lowercase().as_str(), arg) {
        ("step", None) => Action::Step,
        ("back", None) => Action::Back,
        ("stop", None) => Action::Stop,
        ("play", None) => Action::Play { ms: 0.0 },
        ("play", Some(ms)) => Action::Play {
            ms: parse_number(token, ms)?,
        },
        ("goto" | "seek", Some(n)) => Action::Goto(n.parse().map_err(|_| {
            StepclipError::script(format!("'{token}': expected an integer step"))
        })?),
        ("rate", Some(r)) => Action::Rate(parse_number(token, r)?),
        ("loop", Some(flag)) => Action::Looping(match flag.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => true,
            "off" | "false" | "0" => false,
            _ => {
                return Err(StepclipError::script(format!(
                    "'{token}': expected on or off"
                )))
            }
        }),
        ("duration", Some(ms)) => Action::FrameDuration(parse_number(token, ms)?),
        _ => {
            return Err(StepclipError::script(format!(
                "unknown action '{token}'"
            )))
        }
    };

    if let Action::Play { ms } = action {
        if ms < 0.0 {
            return Err(StepclipError::script(format!(
                "'{token}': play time must be >= 0"
            )));
        }
    }

    Ok(action)
}

fn parse_number(token: &str, raw: &str) -> StepclipResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StepclipError::script(format!("'{token}': expected a number")))
}
