use log::{debug, warn};

use crate::errors::InteractionError;
use crate::models::{CountryFilter, Metric};
use crate::state::AppState;

/// A UI event, as written in a `play` script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    GoTo(u32),
    Metric(String),
    Country(String),
    Year(i32),
    Hover { id: String, x: f64, y: f64 },
    Leave(String),
}

impl Command {
    /// Parses one script line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, InteractionError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let unknown = || InteractionError::UnknownCommand {
            line: line.to_string(),
        };
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb.to_ascii_lowercase().as_str() {
            "next" if rest.is_empty() => Command::Next,
            "goto" => Command::GoTo(rest.parse().map_err(|_| unknown())?),
            "metric" if !rest.is_empty() => Command::Metric(rest.to_string()),
            "country" if !rest.is_empty() => Command::Country(rest.to_string()),
            "year" => Command::Year(rest.parse().map_err(|_| unknown())?),
            "hover" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [id, x, y] = parts.as_slice() else {
                    return Err(unknown());
                };
                Command::Hover {
                    id: id.to_string(),
                    x: x.parse().map_err(|_| unknown())?,
                    y: y.parse().map_err(|_| unknown())?,
                }
            }
            "leave" if !rest.is_empty() => Command::Leave(rest.to_string()),
            _ => return Err(unknown()),
        };
        Ok(Some(command))
    }
}

/// Applies `command` through the matching state transition.
///
/// Returns whether the rendered surface changed, either by a redraw or by the
/// tooltip appearing or disappearing.
pub fn dispatch(state: &mut AppState, command: &Command) -> Result<bool, InteractionError> {
    let before = state.surface().redraws();
    match command {
        Command::Next => {
            state.advance_scene()?;
        }
        Command::GoTo(scene) => {
            state.go_to_scene(*scene)?;
        }
        Command::Metric(name) => {
            let metric = Metric::parse(name)
                .ok_or_else(|| InteractionError::UnknownMetric { name: name.clone() })?;
            state.set_metric(metric)?;
        }
        Command::Country(name) => {
            let filter = if name.eq_ignore_ascii_case("all") {
                CountryFilter::All
            } else {
                CountryFilter::Only(name.clone())
            };
            state.set_country(filter)?;
        }
        Command::Year(year) => {
            let applied = state.set_year(*year)?;
            if applied != *year {
                debug!("Year {year} clamped to {applied}");
            }
        }
        Command::Hover { id, x, y } => {
            state.pointer_enter(id, *x, *y)?;
            return Ok(true);
        }
        Command::Leave(id) => return Ok(state.pointer_leave(id)),
    }
    Ok(state.surface().redraws() > before)
}

/// Runs a whole script, logging and skipping commands that are rejected.
///
/// `on_change` sees the state after every command that changed the surface.
pub fn run_script(
    state: &mut AppState,
    script: &str,
    mut on_change: impl FnMut(&AppState),
) -> Vec<InteractionError> {
    let mut rejected = Vec::new();
    for (number, line) in script.lines().enumerate() {
        let outcome = Command::parse(line).and_then(|command| match command {
            Some(command) => dispatch(state, &command),
            None => Ok(false),
        });
        match outcome {
            Ok(true) => on_change(state),
            Ok(false) => {}
            Err(err) => {
                warn!("Line {}: {err}", number + 1);
                rejected.push(err);
            }
        }
    }
    rejected
}
