//! Control-name mapping table.
//!
//! Rows of `(control system name, element name)` loaded once at start-up.
//! A control name may bind several elements (paired devices); writes go to
//! all of them, reads use the first.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PvError, PvResult};
use crate::name::{PvName, prefixes};

const CONTROL_COLUMN: &str = "Control System Name";
const ELEMENT_COLUMN: &str = "Element";

/// Immutable control name → element names table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlNameMap {
    table: HashMap<String, Vec<String>>,
}

impl ControlNameMap {
    /// Build from `(control name, element name)` pairs. Element names are
    /// lower-cased; repeated control names accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut table: HashMap<String, Vec<String>> = HashMap::new();
        for (control, element) in pairs {
            let element = element.as_ref().to_lowercase();
            let targets = table.entry(control.into()).or_default();
            if !targets.contains(&element) {
                targets.push(element);
            }
        }
        Self { table }
    }

    /// Load a CSV file with `Control System Name` and `Element` columns.
    pub fn load_csv(path: &Path) -> PvResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text)
    }

    /// Parse CSV text. Other columns are ignored, fields may be quoted, and
    /// rows with an empty control name or element are skipped.
    pub fn from_csv_str(text: &str) -> PvResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(PvError::Mapping {
            line: 1,
            what: "empty file".to_string(),
        })?;
        let header = split_csv_line(header);
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PvError::Mapping {
                    line: 1,
                    what: format!("missing column '{name}'"),
                })
        };
        let control_col = column(CONTROL_COLUMN)?;
        let element_col = column(ELEMENT_COLUMN)?;

        let mut pairs = Vec::new();
        for (index, line) in lines {
            let fields = split_csv_line(line);
            let (Some(control), Some(element)) = (fields.get(control_col), fields.get(element_col))
            else {
                return Err(PvError::Mapping {
                    line: index + 1,
                    what: format!("expected at least {} fields", control_col.max(element_col) + 1),
                });
            };
            if control.is_empty() || element.is_empty() {
                continue;
            }
            pairs.push((control.clone(), element.clone()));
        }
        Ok(Self::from_pairs(pairs))
    }

    /// Element names bound to `control`, in table order.
    pub fn resolve(&self, control: &str) -> PvResult<&[String]> {
        self.table
            .get(control)
            .map(Vec::as_slice)
            .ok_or_else(|| PvError::InvalidControlName {
                name: control.to_string(),
            })
    }

    pub fn contains(&self, control: &str) -> bool {
        self.table.contains_key(control)
    }

    /// Split a PV name into `(control name, attribute)`.
    ///
    /// The canonical `DEVICE:AREA:UNIT` base is used when it is mapped.
    /// Otherwise the longest mapped prefix ending at a colon wins, which
    /// covers short control names such as `q1` in `q1:BCTRL`.
    pub fn split<'a>(&self, pv: &'a str) -> PvResult<(&'a str, &'a str)> {
        if let Some(name) = PvName::parse(pv) {
            if self.contains(name.base()) {
                return Ok((name.base(), name.attribute));
            }
        }
        prefixes(pv)
            .find(|(base, _)| self.contains(base))
            .ok_or_else(|| PvError::InvalidControlName {
                name: PvName::parse(pv)
                    .map(|n| n.base().to_string())
                    .unwrap_or_else(|| pv.to_string()),
            })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Split one CSV line. Double quotes group commas; `""` inside quotes is a
/// literal quote. Unquoted fields are trimmed.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => {
                quoted = !quoted;
                was_quoted = true;
            }
            ',' if !quoted => {
                fields.push(finish_field(&mut field, was_quoted));
                was_quoted = false;
            }
            _ => field.push(c),
        }
    }
    fields.push(finish_field(&mut field, was_quoted));
    fields
}

fn finish_field(field: &mut String, was_quoted: bool) -> String {
    let value = std::mem::take(field);
    if was_quoted {
        value
    } else {
        value.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Element,Control System Name,Area
QM01,QUAD:DIAG0:190,DIAG0
QM01B,QUAD:DIAG0:190,DIAG0
\"XC, 178\",XCOR:DIAG0:178,DIAG0
OTRDG02,OTRS:DIAG0:420,DIAG0
,BPMS:DIAG0:999,DIAG0
";

    #[test]
    fn csv_columns_found_by_header() {
        let map = ControlNameMap::from_csv_str(CSV).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.resolve("QUAD:DIAG0:190").unwrap(), ["qm01", "qm01b"]);
        assert_eq!(map.resolve("XCOR:DIAG0:178").unwrap(), ["xc, 178"]);
        assert!(!map.contains("BPMS:DIAG0:999"));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = ControlNameMap::from_csv_str("Element,Device\nq1,Q1\n").unwrap_err();
        assert!(err.to_string().contains(CONTROL_COLUMN));
        assert!(ControlNameMap::from_csv_str("").is_err());
    }

    #[test]
    fn unknown_control_name() {
        let map = ControlNameMap::from_pairs([("q1", "Q1")]);
        assert!(matches!(
            map.resolve("q2"),
            Err(PvError::InvalidControlName { .. })
        ));
    }

    #[test]
    fn split_prefers_canonical_base() {
        let map = ControlNameMap::from_pairs([
            ("OTRS:DIAG0:420", "otr"),
            ("q1", "q1"),
            ("BEAM:SHUTTER", "unused"),
        ]);
        assert_eq!(
            map.split("OTRS:DIAG0:420:Image:ArrayData").unwrap(),
            ("OTRS:DIAG0:420", "Image:ArrayData")
        );
        assert_eq!(map.split("q1:BCTRL").unwrap(), ("q1", "BCTRL"));
        assert_eq!(
            map.split("BEAM:SHUTTER:STATE").unwrap(),
            ("BEAM:SHUTTER", "STATE")
        );

        match map.split("QUAD:DIAG0:190:BCTRL") {
            Err(PvError::InvalidControlName { name }) => assert_eq!(name, "QUAD:DIAG0:190"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(map.split("q1").is_err());
    }

    #[test]
    fn quoted_fields() {
        assert_eq!(
            split_csv_line(r#" a ,"b,c","say ""hi""""#),
            vec!["a", "b,c", r#"say "hi""#]
        );
    }
}
