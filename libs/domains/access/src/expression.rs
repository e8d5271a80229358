use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single parsed access-control predicate.
///
/// The expression language is intentionally minimal: a wildcard plus four
/// attribute predicates. Multiple rules on the same (event, mode) are a
/// union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessExpression {
    /// `*` — any authenticated user.
    Wildcard,
    /// `person:<handle>` — a specific ranger handle.
    Person(String),
    /// `position:<name>` — anyone holding the position.
    Position(String),
    /// `team:<name>` — anyone on the team.
    Team(String),
    /// `onduty:<position>` — anyone currently on duty in the position.
    OnDuty(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionParseError {
    #[error("unrecognized access expression: '{0}'")]
    Unrecognized(String),
    #[error("access expression '{0}' has an empty argument")]
    EmptyArgument(String),
}

impl FromStr for AccessExpression {
    type Err = ExpressionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(AccessExpression::Wildcard);
        }
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| ExpressionParseError::Unrecognized(s.to_string()))?;
        if arg.is_empty() {
            return Err(ExpressionParseError::EmptyArgument(s.to_string()));
        }
        match kind {
            "person" => Ok(AccessExpression::Person(arg.to_string())),
            "position" => Ok(AccessExpression::Position(arg.to_string())),
            "team" => Ok(AccessExpression::Team(arg.to_string())),
            "onduty" => Ok(AccessExpression::OnDuty(arg.to_string())),
            _ => Err(ExpressionParseError::Unrecognized(s.to_string())),
        }
    }
}

impl fmt::Display for AccessExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessExpression::Wildcard => write!(f, "*"),
            AccessExpression::Person(h) => write!(f, "person:{}", h),
            AccessExpression::Position(p) => write!(f, "position:{}", p),
            AccessExpression::Team(t) => write!(f, "team:{}", t),
            AccessExpression::OnDuty(p) => write!(f, "onduty:{}", p),
        }
    }
}

/// When a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    /// The rule always applies.
    Always,
    /// The rule applies only while the subject is on site.
    OnSite,
}

impl FromStr for Validity {
    type Err = ExpressionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Validity::Always),
            "onsite" => Ok(Validity::OnSite),
            other => Err(ExpressionParseError::Unrecognized(other.to_string())),
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Always => write!(f, "always"),
            Validity::OnSite => write!(f, "onsite"),
        }
    }
}

/// The permission bundle a matching rule grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
    Report,
    ReadStays,
    WriteStays,
}

impl FromStr for AccessMode {
    type Err = ExpressionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(AccessMode::Read),
            "write" => Ok(AccessMode::Write),
            "report" => Ok(AccessMode::Report),
            "read_stays" => Ok(AccessMode::ReadStays),
            "write_stays" => Ok(AccessMode::WriteStays),
            other => Err(ExpressionParseError::Unrecognized(other.to_string())),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::Report => "report",
            AccessMode::ReadStays => "read_stays",
            AccessMode::WriteStays => "write_stays",
        };
        write!(f, "{}", s)
    }
}

/// One stored access rule for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub expression: AccessExpression,
    pub mode: AccessMode,
    pub validity: Validity,
}
