//! Normalization of the matcher argument.
//!
//! A caller describes what to measure in one of a few shapes: a bare action,
//! or a tuple of an action followed by an optional reset action and optional
//! options. [`MatcherParams::try_from`] is the only place these shapes are
//! told apart; everything downstream works with the canonical record.

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BoxError, Error, Result};

type ActionFn = dyn FnMut() -> BoxFuture<'static, Result<(), BoxError>> + Send;

/// A zero-argument async callable: the action under test or a reset action.
pub struct Action(Box<ActionFn>);

impl Action {
    pub fn new<F, Fut>(mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self(Box::new(move || Box::pin(f())))
    }

    pub async fn run(&mut self) -> Result<(), BoxError> {
        (self.0)().await
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Function]")
    }
}

/// One element of the tuple form of [`MatcherArg`].
#[derive(Debug)]
pub enum ArgValue {
    Callable(Action),
    /// Plain data. Objects (and `null`) are options; anything else is invalid.
    Data(Value),
}

impl From<Action> for ArgValue {
    fn from(action: Action) -> Self {
        ArgValue::Callable(action)
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        ArgValue::Data(value)
    }
}

impl From<MatcherOptions> for ArgValue {
    fn from(options: MatcherOptions) -> Self {
        // a struct of plain fields always serializes
        ArgValue::Data(serde_json::to_value(options).unwrap_or(Value::Null))
    }
}

/// The argument handed to the matcher, before normalization.
#[derive(Debug)]
pub enum MatcherArg {
    /// `action`
    Action(Action),
    /// `[action, reset?, options?]` or `[action, options]`
    Tuple(Vec<ArgValue>),
}

impl MatcherArg {
    pub fn action<F, Fut>(f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        MatcherArg::Action(Action::new(f))
    }

    pub fn tuple<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ArgValue>,
    {
        MatcherArg::Tuple(items.into_iter().map(Into::into).collect())
    }
}

/// Options controlling a single assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherOptions {
    /// How many trials to run. Zero trials leave every average `NaN`.
    pub repeats: u32,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self { repeats: 1 }
    }
}

impl MatcherOptions {
    /// Shallow-merges the keys of `overrides` over the defaults.
    ///
    /// Keys the caller leaves out keep their default; unknown keys are
    /// ignored. `overrides` must be an object or `null`.
    pub fn merged(overrides: &Value) -> Result<Self, String> {
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => return Err("default options are not an object".to_string()),
        };
        match overrides {
            Value::Null => {}
            Value::Object(map) => {
                merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            other => return Err(format!("options must be an object, got {other}")),
        }
        serde_json::from_value(Value::Object(merged)).map_err(|e| e.to_string())
    }
}

/// The canonical record every matcher argument normalizes to.
#[derive(Debug)]
pub struct MatcherParams {
    pub action: Action,
    pub reset: Option<Action>,
    pub options: MatcherOptions,
}

impl TryFrom<MatcherArg> for MatcherParams {
    type Error = Error;

    fn try_from(arg: MatcherArg) -> Result<Self> {
        let items = match arg {
            MatcherArg::Action(action) => {
                return Ok(Self {
                    action,
                    reset: None,
                    options: MatcherOptions::default(),
                });
            }
            MatcherArg::Tuple(items) => items,
        };
        let rendered = render_tuple(&items);
        if items.len() > 3 {
            return Err(Error::InvalidParameters(rendered));
        }

        let mut items = items.into_iter();
        let action = match items.next() {
            Some(ArgValue::Callable(action)) => action,
            _ => return Err(Error::InvalidParameters(rendered)),
        };

        let (reset, options) = match (items.next(), items.next()) {
            (None, None) => (None, Value::Null),
            (Some(ArgValue::Callable(reset)), None) => (Some(reset), Value::Null),
            (Some(ArgValue::Callable(reset)), Some(ArgValue::Data(options))) => {
                (Some(reset), options)
            }
            (Some(ArgValue::Data(options)), None) => (None, options),
            _ => return Err(Error::InvalidParameters(rendered)),
        };

        let options = MatcherOptions::merged(&options).map_err(|reason| {
            tracing::debug!("Rejecting matcher options: {reason}");
            Error::InvalidParameters(rendered)
        })?;

        Ok(Self {
            action,
            reset,
            options,
        })
    }
}

fn render_tuple(items: &[ArgValue]) -> String {
    let inner: Vec<String> = items
        .iter()
        .map(|item| match item {
            ArgValue::Callable(_) => "[Function]".to_string(),
            ArgValue::Data(value) => value.to_string(),
        })
        .collect();
    format!("[{}]", inner.join(", "))
}
