//! Projection (constraint expression) parsing.
//!
//! A projection clause names a variable and optionally narrows it with one
//! hyperslab per leading dimension:
//!
//! ```text
//! temp              whole variable
//! temp[3]           index 3 of the first dimension      (3:1:3)
//! temp[0:9]         indices 0..=9                        (0:1:9)
//! temp[0:2:9][4]    every other index of 0..=9, then 4
//! ```
//!
//! Only the longest well-formed prefix of a clause is used, so `temp[1]junk`
//! selects `temp[1]` and `temp[x]` selects all of `temp`. Clauses with no
//! usable prefix are dropped rather than failing the request. Ignored text is
//! kept so callers can report it.

use std::fmt;

use crate::errors::{DapError, DapResult};
use crate::model::{Diagnostic, Diagnostics};

/// A strided range `start..=end` of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperslab {
    pub start: usize,
    pub stride: usize,
    pub end: usize,
}

impl Hyperslab {
    /// Create a hyperslab. Callers must ensure `stride > 0` and `end >= start`.
    pub fn new(start: usize, stride: usize, end: usize) -> Self {
        Self { start, stride, end }
    }

    /// A single index, `[n]`.
    pub fn index(n: usize) -> Self {
        Self::new(n, 1, n)
    }

    /// Number of selected indices: `ceil((end + 1 - start) / stride)`.
    pub fn size(&self) -> usize {
        (self.end + 1 - self.start).div_ceil(self.stride)
    }

    /// Limit the range to a dimension of `len` elements.
    pub fn clamp(&self, len: usize) -> DimSlice {
        if self.start >= len {
            return DimSlice {
                start: self.start,
                stride: self.stride,
                count: 0,
            };
        }
        let end = self.end.min(len - 1);
        DimSlice {
            start: self.start,
            stride: self.stride,
            count: (end + 1 - self.start).div_ceil(self.stride),
        }
    }
}

impl fmt::Display for Hyperslab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}:{}]", self.start, self.stride, self.end)
    }
}

/// Concrete selection along one dimension: `count` indices starting at
/// `start`, `stride` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimSlice {
    pub start: usize,
    pub stride: usize,
    pub count: usize,
}

impl DimSlice {
    /// The whole of a dimension of `len` elements.
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            stride: 1,
            count: len,
        }
    }

    /// Index of the last selected element, if any.
    pub fn last(&self) -> Option<usize> {
        self.count
            .checked_sub(1)
            .map(|n| self.start + n * self.stride)
    }

    /// Source index of the `i`th selected element.
    pub fn index(&self, i: usize) -> usize {
        self.start + i * self.stride
    }
}

/// A parsed projection clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Whole variable.
    Identity { id: String },
    /// Variable narrowed by hyperslabs over its leading dimensions.
    Hyperslabs { id: String, hyperslabs: Vec<Hyperslab> },
}

impl Projection {
    /// Parse one clause. Returns `None` when the clause does not start with
    /// an identifier or carries an empty or reversed hyperslab.
    ///
    /// Text after the longest well-formed prefix is ignored, see
    /// [`Projection::parse_prefix`].
    pub fn parse(clause: &str) -> Option<Projection> {
        Projection::parse_prefix(clause).map(|(projection, _)| projection)
    }

    /// Parse the longest well-formed prefix of `clause`: the identifier, then
    /// as many `[..]` groups as are well formed. Returns the projection and
    /// the text left over after it.
    ///
    /// ```text
    /// temp[1]junk     temp[1:1:1], "junk" left over
    /// temp[x]         temp,        "[x]" left over
    /// ```
    pub fn parse_prefix(clause: &str) -> Option<(Projection, &str)> {
        let id_len = identifier_len(clause)?;
        let (id, mut rest) = clause.split_at(id_len);

        let mut hyperslabs = Vec::new();
        while let Some((bounds, tail)) = next_group(rest) {
            hyperslabs.push(hyperslab_from(bounds)?);
            rest = tail;
        }

        let id = id.to_string();
        let projection = if hyperslabs.is_empty() {
            Projection::Identity { id }
        } else {
            Projection::Hyperslabs { id, hyperslabs }
        };
        Some((projection, rest))
    }

    /// Name of the projected variable.
    pub fn id(&self) -> &str {
        match self {
            Projection::Identity { id } | Projection::Hyperslabs { id, .. } => id,
        }
    }

    /// Hyperslabs of this projection; empty for an identity projection.
    pub fn hyperslabs(&self) -> &[Hyperslab] {
        match self {
            Projection::Identity { .. } => &[],
            Projection::Hyperslabs { hyperslabs, .. } => hyperslabs,
        }
    }

    /// Per-dimension selection for an array with `declared` dimension sizes.
    ///
    /// Leading dimensions covered by a hyperslab are clamped to the declared
    /// size; trailing dimensions are selected whole.
    pub fn bound_slices(&self, declared: &[usize]) -> DapResult<Vec<DimSlice>> {
        let hyperslabs = self.hyperslabs();
        if hyperslabs.len() > declared.len() {
            return Err(DapError::InvalidRequest(format!(
                "{} has {} dimensions but {} hyperslabs were given",
                self.id(),
                declared.len(),
                hyperslabs.len()
            )));
        }

        Ok(declared
            .iter()
            .enumerate()
            .map(|(i, &len)| match hyperslabs.get(i) {
                Some(h) => h.clamp(len),
                None => DimSlice::full(len),
            })
            .collect())
    }

    /// Effective per-dimension sizes for an array with `declared` sizes.
    pub fn effective_shape(&self, declared: &[usize]) -> DapResult<Vec<usize>> {
        Ok(self
            .bound_slices(declared)?
            .iter()
            .map(|s| s.count)
            .collect())
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())?;
        for h in self.hyperslabs() {
            write!(f, "{}", h)?;
        }
        Ok(())
    }
}

/// Length of the identifier at the start of `s`: one of `[A-Za-z_%.]`
/// followed by any of `[A-Za-z0-9_%./]`.
fn identifier_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || matches!(c, '_' | '%' | '.') => {}
        _ => return None,
    }
    let len = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '%' | '.' | '/')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some(len)
}

/// Split a leading `[n]`, `[n:m]` or `[n:s:m]` group off `s`. Returns the
/// group's numbers and the rest of `s`, or `None` when `s` does not start
/// with such a group.
fn next_group(s: &str) -> Option<(Vec<usize>, &str)> {
    let inner = s.strip_prefix('[')?;
    let close = inner.find(']')?;
    let parts: Vec<usize> = inner[..close]
        .split(':')
        .map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                p.parse().ok()
            }
        })
        .collect::<Option<_>>()?;

    if parts.len() > 3 {
        return None;
    }
    Some((parts, &inner[close + 1..]))
}

/// Hyperslab of a well-formed group. `None` for a zero stride or a range
/// that ends before it starts.
fn hyperslab_from(bounds: Vec<usize>) -> Option<Hyperslab> {
    let (start, stride, end) = match bounds.as_slice() {
        [n] => (*n, 1, *n),
        [n, m] => (*n, 1, *m),
        [n, s, m] => (*n, *s, *m),
        _ => return None,
    };

    if stride == 0 || end < start {
        return None;
    }
    Some(Hyperslab::new(start, stride, end))
}

/// Projections requested by one query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSet {
    /// Parsed clauses in request order.
    pub projections: Vec<Projection>,
    /// Decoded clauses that did not parse, and text ignored after the
    /// parsed prefix of a clause.
    pub dropped: Vec<String>,
}

impl ProjectionSet {
    /// Parse the projection list of a raw (still percent-encoded) query string.
    ///
    /// The query is split on `&`; segments containing `=` are request
    /// parameters rather than projection lists. Each comma-separated clause is
    /// percent-decoded on its own, so an encoded comma stays inside its clause.
    pub fn from_query(query: &str) -> Self {
        let mut set = ProjectionSet::default();

        for segment in query.split('&').filter(|s| !s.contains('=')) {
            for raw in segment.split(',').filter(|c| !c.is_empty()) {
                let clause = match urlencoding::decode(raw) {
                    Ok(decoded) => decoded.into_owned(),
                    Err(_) => {
                        tracing::debug!("Dropping undecodable projection clause {:?}", raw);
                        set.dropped.push(raw.to_string());
                        continue;
                    }
                };

                match Projection::parse_prefix(&clause) {
                    Some((projection, rest)) => {
                        if !rest.is_empty() {
                            tracing::debug!(
                                "Ignoring {:?} after projection {}",
                                rest,
                                projection
                            );
                            set.dropped.push(rest.to_string());
                        }
                        set.projections.push(projection);
                    }
                    None => {
                        tracing::debug!("Dropping malformed projection clause {:?}", clause);
                        set.dropped.push(clause);
                    }
                }
            }
        }

        set
    }

    /// The dropped text as diagnostics.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            warnings: self
                .dropped
                .iter()
                .cloned()
                .map(Diagnostic::DroppedClause)
                .collect(),
        }
    }

    /// True when no projection was requested.
    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}
