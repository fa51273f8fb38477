use crate::RangeError;

/// A requested byte range before it is checked against a file size.
///
/// `end` is inclusive; `None` means "to end of file". A missing start
/// is treated as 0 (suffix-from-end ranges are not supported).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

/// A range resolved against a concrete artifact size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

impl ResolvedRange {
    /// Number of bytes spanned (`end` is inclusive).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this range.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.size)
    }
}

/// Parses a `bytes=start-end` header value.
pub fn parse_range(header: &str) -> Result<RangeSpec, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let rest = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start_s, end_s) = rest.split_once('-').ok_or_else(malformed)?;

    let start = if start_s.trim().is_empty() {
        0
    } else {
        start_s.trim().parse().map_err(|_| malformed())?
    };
    let end = if end_s.trim().is_empty() {
        None
    } else {
        Some(end_s.trim().parse().map_err(|_| malformed())?)
    };

    Ok(RangeSpec { start, end })
}

impl RangeSpec {
    /// Validates the range against `size`, clamping the end to the last
    /// byte of the artifact.
    pub fn resolve(self, size: u64) -> Result<ResolvedRange, RangeError> {
        if size == 0 {
            return Err(RangeError::Unsatisfiable { size });
        }
        let end = self.end.map_or(size - 1, |e| e.min(size - 1));
        if self.start >= size || self.start > end {
            return Err(RangeError::Unsatisfiable { size });
        }
        Ok(ResolvedRange {
            start: self.start,
            end,
            size,
        })
    }
}
