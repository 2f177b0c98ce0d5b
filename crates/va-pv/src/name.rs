//! Structured PV names.

use core::fmt;

/// A canonical `DEVICE:AREA:UNIT:ATTRIBUTE` PV name.
///
/// The attribute may itself contain colons (`Image:ArrayData`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PvName<'a> {
    base: &'a str,
    pub device_class: &'a str,
    pub area: &'a str,
    pub unit: &'a str,
    pub attribute: &'a str,
}

impl<'a> PvName<'a> {
    /// Parse a canonical name. `None` if it has fewer than four segments or
    /// any segment is empty.
    pub fn parse(pv: &'a str) -> Option<Self> {
        let mut parts = pv.splitn(4, ':');
        let device_class = parts.next()?;
        let area = parts.next()?;
        let unit = parts.next()?;
        let attribute = parts.next()?;
        if [device_class, area, unit, attribute]
            .iter()
            .any(|s| s.is_empty())
        {
            return None;
        }
        let base_len = device_class.len() + area.len() + unit.len() + 2;
        Some(Self {
            base: &pv[..base_len],
            device_class,
            area,
            unit,
            attribute,
        })
    }

    /// The `DEVICE:AREA:UNIT` control name.
    pub fn base(&self) -> &'a str {
        self.base
    }
}

impl fmt::Display for PvName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.base, self.attribute)
    }
}

/// Every `(prefix, rest)` split of `pv` at a colon, longest prefix first.
/// Both halves are non-empty.
pub fn prefixes(pv: &str) -> impl Iterator<Item = (&str, &str)> {
    pv.rmatch_indices(':')
        .map(move |(i, _)| (&pv[..i], &pv[i + 1..]))
        .filter(|(base, attr)| !base.is_empty() && !attr.is_empty())
}
