//! Metric Path Patterns
//!
//! Compiles a user-authored, pipe-delimited metric path into the two things a
//! controller query needs:
//!
//! - a *generalized* path, where every regex-like segment is replaced by the
//!   controller wildcard `*`, so one API call returns a superset of series;
//! - one [`SegmentMatcher`] per segment, used to prune that superset back down
//!   to the series the user actually asked for.
//!
//! # Example
//!
//! ```
//! use appd_datasource::query::compile;
//!
//! let compiled = compile("Overall Application Performance|web-.*|Calls per Minute").unwrap();
//! assert_eq!(compiled.generalized_path(), "Overall Application Performance|*|Calls per Minute");
//! assert!(compiled.matches_path("Overall Application Performance|Web-01|Calls per Minute"));
//! assert!(!compiled.matches_path("Overall Application Performance|db-01|Calls per Minute"));
//! ```

use regex::{Regex, RegexBuilder};

use crate::query::error::PatternError;

/// Delimiter between metric path segments
pub const PATH_DELIMITER: char = '|';

/// Segment the controller expands itself
pub const WILDCARD: &str = "*";

/// Characters that mark a segment as a client-side regular expression.
/// Parentheses are not among them: `Average Response Time (ms)` is a literal.
const PATTERN_CHARS: &[char] = &['^', '[', ']', '\\', '{', '}', '$', '?', '*', '.'];

/// Bounds on the cost of user-supplied pattern segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternLimits {
    /// Maximum length of a single regex-like segment, in characters
    pub max_segment_len: usize,
    /// Maximum compiled program size of a single segment regex, in bytes
    pub regex_size_limit: usize,
}

impl Default for PatternLimits {
    fn default() -> Self {
        Self {
            max_segment_len: 256,
            regex_size_limit: 1024 * 1024,
        }
    }
}

/// Per-segment filter applied to concrete paths returned by the controller
#[derive(Debug, Clone)]
pub enum SegmentMatcher {
    /// Position already pinned by the generalized path (literal or `*`)
    Any,
    /// Case-insensitive, unanchored regular expression from the original segment
    Pattern(Regex),
}

impl SegmentMatcher {
    /// Check a single concrete segment
    pub fn accepts(&self, segment: &str) -> bool {
        match self {
            SegmentMatcher::Any => true,
            SegmentMatcher::Pattern(re) => re.is_match(segment),
        }
    }

    /// Whether this matcher filters anything at all
    pub fn is_any(&self) -> bool {
        matches!(self, SegmentMatcher::Any)
    }
}

/// Immutable result of compiling a metric path pattern.
///
/// `original`, `generalized` and `matchers` always have the same length.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    original: Vec<String>,
    generalized: Vec<String>,
    matchers: Vec<SegmentMatcher>,
    /// Last segment is a bare `*`; the controller returns leaves below it
    open_ended: bool,
}

impl CompiledPattern {
    /// The path to send to the controller
    pub fn generalized_path(&self) -> String {
        self.generalized.join(&PATH_DELIMITER.to_string())
    }

    /// Generalized segments, in order
    pub fn generalized_segments(&self) -> &[String] {
        &self.generalized
    }

    /// Segments of the pattern as the user wrote them
    pub fn original_segments(&self) -> &[String] {
        &self.original
    }

    /// Per-segment matchers, aligned with the segments
    pub fn matchers(&self) -> &[SegmentMatcher] {
        &self.matchers
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// True if any position needs client-side filtering
    pub fn has_patterns(&self) -> bool {
        self.matchers.iter().any(|m| !m.is_any())
    }

    /// True if the pattern ends in a bare `*`
    pub fn is_open_ended(&self) -> bool {
        self.open_ended
    }

    /// Check already-split concrete segments.
    ///
    /// Same rule as [`matches`], except that a trailing bare `*` also accepts
    /// paths that continue below it.
    pub fn matches(&self, concrete: &[&str]) -> bool {
        if self.open_ended && concrete.len() > self.matchers.len() {
            return matches(&concrete[..self.matchers.len()], &self.matchers);
        }
        matches(concrete, &self.matchers)
    }

    /// Split a concrete path on the delimiter and check it
    pub fn matches_path(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split(PATH_DELIMITER).collect();
        self.matches(&segments)
    }
}

/// Compile a pattern with the default [`PatternLimits`]
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    compile_with(pattern, &PatternLimits::default())
}

/// Compile a pattern, rejecting regex-like segments beyond `limits`
pub fn compile_with(
    pattern: &str,
    limits: &PatternLimits,
) -> Result<CompiledPattern, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }

    let original: Vec<String> = pattern.split(PATH_DELIMITER).map(str::to_string).collect();
    let mut generalized = Vec::with_capacity(original.len());
    let mut matchers = Vec::with_capacity(original.len());

    for (index, segment) in original.iter().enumerate() {
        if is_pattern_segment(segment) {
            generalized.push(WILDCARD.to_string());
            matchers.push(SegmentMatcher::Pattern(build_segment_regex(
                index, segment, limits,
            )?));
        } else {
            generalized.push(segment.clone());
            matchers.push(SegmentMatcher::Any);
        }
    }

    let open_ended = original.last().map(String::as_str) == Some(WILDCARD);

    Ok(CompiledPattern {
        original,
        generalized,
        matchers,
        open_ended,
    })
}

/// True if the segment must be filtered client-side. A bare `*` is expanded by
/// the controller and is not one.
pub fn is_pattern_segment(segment: &str) -> bool {
    segment != WILDCARD && segment.contains(PATTERN_CHARS)
}

fn build_segment_regex(
    index: usize,
    segment: &str,
    limits: &PatternLimits,
) -> Result<Regex, PatternError> {
    let len = segment.chars().count();
    if len > limits.max_segment_len {
        return Err(PatternError::SegmentTooLong {
            index,
            len,
            max: limits.max_segment_len,
        });
    }

    RegexBuilder::new(segment)
        .case_insensitive(true)
        .size_limit(limits.regex_size_limit)
        .build()
        .map_err(|e| PatternError::InvalidSegment {
            index,
            segment: segment.to_string(),
            reason: e.to_string(),
        })
}

/// Check concrete path segments against positional matchers.
///
/// A different segment count never matches.
pub fn matches(concrete: &[&str], matchers: &[SegmentMatcher]) -> bool {
    concrete.len() == matchers.len()
        && concrete
            .iter()
            .zip(matchers)
            .all(|(segment, matcher)| matcher.accepts(segment))
}
