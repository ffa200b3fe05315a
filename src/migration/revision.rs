//! Revision identifiers and ranges
//!
//! Parses the revision arguments accepted by the migrate operations and
//! resolves them against an ordered list of revision ids.
//!
//! Positions are expressed as "number of revisions applied": `0` is the
//! empty schema (`base`) and `len` is the newest revision (`head`).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static REVISION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").expect("revision id pattern"));

/// Errors raised while parsing or resolving revision arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionError {
    #[error("Invalid revision '{input}': {reason}")]
    Invalid { input: String, reason: String },

    #[error("Can't locate revision identified by '{id}'")]
    Unknown { id: String },

    #[error("Multiple revisions start with '{prefix}': {}", .candidates.join(", "))]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("Relative revision {target} didn't produce {steps} migrations")]
    OutOfRange { target: String, steps: i64 },
}

impl RevisionError {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        RevisionError::Invalid {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A revision argument such as `head`, `-1`, `head:-2` or `2024-05-01-1200`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionTarget {
    /// The newest revision in the script directory
    Head,
    /// Before the first revision
    Base,
    /// The revision currently applied to the database
    Current,
    /// Steps relative to the current revision
    Relative(i64),
    /// Steps relative to the head revision
    HeadRelative(i64),
    /// A full revision id or a unique prefix of one
    Id(String),
}

impl RevisionTarget {
    /// Whether resolving this target needs the applied state of the database
    pub fn needs_current(&self) -> bool {
        matches!(self, RevisionTarget::Current | RevisionTarget::Relative(_))
    }

    /// Resolve the target to a position in `ids`
    ///
    /// `current` is the position of the revision applied to the database.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S], current: usize) -> Result<usize, RevisionError> {
        let len = ids.len();
        match self {
            RevisionTarget::Head => Ok(len),
            RevisionTarget::Base => Ok(0),
            RevisionTarget::Current => Ok(current.min(len)),
            RevisionTarget::Relative(steps) => offset(self, current, *steps, len),
            RevisionTarget::HeadRelative(steps) => offset(self, len, *steps, len),
            RevisionTarget::Id(id) => find_id(ids, id).map(|index| index + 1),
        }
    }
}

fn offset(target: &RevisionTarget, from: usize, steps: i64, len: usize) -> Result<usize, RevisionError> {
    (from as i64)
        .checked_add(steps)
        .filter(|position| (0..=len as i64).contains(position))
        .map(|position| position as usize)
        .ok_or_else(|| RevisionError::OutOfRange {
            target: target.to_string(),
            steps: steps.saturating_abs(),
        })
}

/// Find the index of `id` in `ids`, accepting a unique prefix
///
/// Ids are compared with and without dashes, so `20240501` matches
/// `2024-05-01-120000`.
pub fn find_id<S: AsRef<str>>(ids: &[S], id: &str) -> Result<usize, RevisionError> {
    let wanted = id.replace('-', "");
    if let Some(index) = ids
        .iter()
        .position(|candidate| candidate.as_ref() == id || candidate.as_ref().replace('-', "") == wanted)
    {
        return Ok(index);
    }

    let matches: Vec<usize> = ids
        .iter()
        .enumerate()
        .filter(|(_, candidate)| {
            candidate.as_ref().starts_with(id) || candidate.as_ref().replace('-', "").starts_with(&wanted)
        })
        .map(|(index, _)| index)
        .collect();

    match matches.as_slice() {
        [] => Err(RevisionError::Unknown { id: id.to_string() }),
        [index] => Ok(*index),
        _ => Err(RevisionError::Ambiguous {
            prefix: id.to_string(),
            candidates: matches.iter().map(|&i| ids[i].as_ref().to_string()).collect(),
        }),
    }
}

fn parse_steps(input: &str, digits: &str, negative: bool) -> Result<i64, RevisionError> {
    let steps: i64 = digits
        .parse()
        .map_err(|_| RevisionError::invalid(input, "relative step must be a number"))?;
    if steps == 0 {
        return Err(RevisionError::invalid(input, "relative step cannot be zero"));
    }
    Ok(if negative { -steps } else { steps })
}

fn parse_signed(input: &str, value: &str) -> Result<Option<i64>, RevisionError> {
    if let Some(digits) = value.strip_prefix('-') {
        return parse_steps(input, digits, true).map(Some);
    }
    if let Some(digits) = value.strip_prefix('+') {
        return parse_steps(input, digits, false).map(Some);
    }
    Ok(None)
}

impl FromStr for RevisionTarget {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(RevisionError::invalid(s, "revision cannot be empty"));
        }

        match input {
            "head" | "heads" => return Ok(RevisionTarget::Head),
            "base" => return Ok(RevisionTarget::Base),
            "current" => return Ok(RevisionTarget::Current),
            _ => {}
        }

        if let Some(rest) = input.strip_prefix("head:") {
            return match parse_signed(input, rest)? {
                Some(steps) => Ok(RevisionTarget::HeadRelative(steps)),
                None => Err(RevisionError::invalid(input, "expected head:-N or head:+N")),
            };
        }

        if let Some(steps) = parse_signed(input, input)? {
            return Ok(RevisionTarget::Relative(steps));
        }

        if REVISION_ID.is_match(input) {
            return Ok(RevisionTarget::Id(input.to_string()));
        }

        Err(RevisionError::invalid(
            input,
            "expected head, base, current, -N, +N, head:-N or a revision id",
        ))
    }
}

impl fmt::Display for RevisionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionTarget::Head => write!(f, "head"),
            RevisionTarget::Base => write!(f, "base"),
            RevisionTarget::Current => write!(f, "current"),
            RevisionTarget::Relative(steps) => write!(f, "{:+}", steps),
            RevisionTarget::HeadRelative(steps) => write!(f, "head:{:+}", steps),
            RevisionTarget::Id(id) => write!(f, "{}", id),
        }
    }
}

/// A `[start]:[end]` revision range used by `history`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevisionRange {
    pub start: Option<RevisionTarget>,
    pub end: Option<RevisionTarget>,
}

impl RevisionRange {
    /// Resolve the range to a half-open slice of revision indices
    ///
    /// Both bounds are inclusive: `rev:` lists `rev` and everything newer.
    pub fn resolve<S: AsRef<str>>(
        &self,
        ids: &[S],
        current: usize,
    ) -> Result<std::ops::Range<usize>, RevisionError> {
        let start = match &self.start {
            Some(target) => target.resolve(ids, current)?.saturating_sub(1),
            None => 0,
        };
        let end = match &self.end {
            Some(target) => target.resolve(ids, current)?,
            None => ids.len(),
        };
        Ok(start.min(end)..end.max(start))
    }

    /// Whether either bound needs the applied state of the database
    pub fn needs_current(&self) -> bool {
        self.start.as_ref().is_some_and(RevisionTarget::needs_current)
            || self.end.as_ref().is_some_and(RevisionTarget::needs_current)
    }
}

/// Split `start:end` at the first colon where both sides parse
///
/// `head:-1` contains a colon itself, so `head:-1:head` is tried at every
/// colon. Empty sides become `None`. The first error is kept for reporting.
fn split_bounds(input: &str) -> Result<(Option<RevisionTarget>, Option<RevisionTarget>), RevisionError> {
    let bound = |value: &str| -> Result<Option<RevisionTarget>, RevisionError> {
        if value.trim().is_empty() {
            Ok(None)
        } else {
            value.parse().map(Some)
        }
    };

    let mut first_error = None;
    for (index, _) in input.match_indices(':') {
        match (bound(&input[..index]), bound(&input[index + 1..])) {
            (Ok(start), Ok(end)) => return Ok((start, end)),
            (Err(err), _) | (_, Err(err)) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error
        .unwrap_or_else(|| RevisionError::invalid(input, "range must be in the form [start]:[end]")))
}

impl FromStr for RevisionRange {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = split_bounds(s)?;
        Ok(Self { start, end })
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = &self.start {
            write!(f, "{}", start)?;
        }
        write!(f, ":")?;
        if let Some(end) = &self.end {
            write!(f, "{}", end)?;
        }
        Ok(())
    }
}

/// Destination of `upgrade`, `downgrade` and `stamp`, optionally `start:end`
///
/// A starting revision only makes sense offline (`--sql`), where there is no
/// database to read the applied revision from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTarget {
    pub start: Option<RevisionTarget>,
    pub end: RevisionTarget,
}

impl MigrationTarget {
    pub fn needs_current(&self) -> bool {
        self.start.as_ref().is_some_and(RevisionTarget::needs_current) || self.end.needs_current()
    }
}

impl From<RevisionTarget> for MigrationTarget {
    fn from(end: RevisionTarget) -> Self {
        Self { start: None, end }
    }
}

impl FromStr for MigrationTarget {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let whole = match s.parse::<RevisionTarget>() {
            Ok(end) => return Ok(end.into()),
            Err(err) => err,
        };
        if !s.contains(':') {
            return Err(whole);
        }
        match split_bounds(s)? {
            (start, Some(end)) => Ok(Self { start, end }),
            (_, None) => Err(RevisionError::invalid(s, "a destination revision is required after ':'")),
        }
    }
}

impl fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = &self.start {
            write!(f, "{}:", start)?;
        }
        write!(f, "{}", self.end)
    }
}

/// Check a user supplied revision id (`--rev-id`)
///
/// Ids become the leading component of a script directory name, so they
/// cannot contain underscores.
pub fn validate_revision_id(id: &str) -> Result<String, String> {
    let id = id.trim();
    if !REVISION_ID.is_match(id) {
        return Err(format!(
            "Revision id must contain only letters, digits and dashes, got: '{}'",
            id
        ));
    }
    if matches!(id, "head" | "heads" | "base" | "current") {
        return Err(format!("'{}' is a reserved revision name", id));
    }
    Ok(id.to_string())
}
