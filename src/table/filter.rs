//! # Exclusion rules
//!
//! A [`RuleSet`] attaches one [`FilterRule`] to each ruled column. A row is dropped
//! as soon as the rule of any of its columns fires; rows no rule fires on are kept.
//!
//! Within a rule every present clause yields one boolean:
//!
//! - `equals`: the value is one of the listed values
//! - `not_equals`: the value is one of the listed values as well (literal membership)
//! - `contains`: the value contains one of the listed substrings
//! - `regex`: one of the patterns matches somewhere in the value
//! - `empty`: `true` asks for a blank or `"0"` value, `false` for anything else
//!
//! [`Mode::Or`] fires when any clause holds and [`Mode::And`] when all of them do.
//! Values are compared by their trimmed text, see [`comparison_value`].
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Row;
use crate::table::column::ColumnRef;
use crate::table::header::HeaderInfo;
use crate::table::TableError;
use regex::Regex;
use serde::Deserialize;
use serde::Deserializer;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

/// Errors raised while building rules
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid regex '{pattern}' in rule for column '{column}': {source}")]
    InvalidPattern {
        column: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid rule configuration: {0}")]
    InvalidConfig(String),
}

/// How the clauses of one rule combine
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Or,
    And,
}

impl Mode {
    /// Parses `or`/`and` in any case; anything else falls back to `Or`.
    pub fn parse(text: &str) -> Mode {
        match text.trim().to_ascii_lowercase().as_str() {
            "or" => Mode::Or,
            "and" => Mode::And,
            _ => {
                warn!(mode = text, "unknown rule mode, using 'or'");
                Mode::Or
            }
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Mode::parse(&text))
    }
}

/// The clauses of a rule before its patterns are compiled
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSpec {
    pub equals: Vec<String>,
    pub not_equals: Vec<String>,
    pub contains: Vec<String>,
    pub regex: Vec<String>,
    pub empty: Option<bool>,
    pub mode: Mode,
}

impl RuleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.equals.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn not_equals<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.not_equals.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn contains<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.contains.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn regex<I: IntoIterator<Item = S>, S: Into<String>>(mut self, patterns: I) -> Self {
        self.regex.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = Some(empty);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// A compiled rule for one column
#[derive(Clone, Debug)]
pub struct FilterRule {
    equals: Vec<String>,
    not_equals: Vec<String>,
    contains: Vec<String>,
    regex: Vec<Regex>,
    empty: Option<bool>,
    mode: Mode,
}

impl FilterRule {
    /// Compiles the patterns of `spec`; `column` only labels errors and logs.
    pub fn compile(column: &ColumnRef, spec: RuleSpec) -> Result<FilterRule, RuleError> {
        let regex = spec
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                    column: column.to_string(),
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rule = FilterRule {
            equals: spec.equals,
            not_equals: spec.not_equals,
            contains: spec.contains,
            regex,
            empty: spec.empty,
            mode: spec.mode,
        };
        if rule.mode == Mode::And && rule.clause_count() == 0 {
            warn!(column = %column, "rule in 'and' mode has no clauses and drops every row reaching its column");
        }
        Ok(rule)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn clause_count(&self) -> usize {
        [
            !self.equals.is_empty(),
            !self.not_equals.is_empty(),
            !self.contains.is_empty(),
            !self.regex.is_empty(),
            self.empty.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Evaluates the present clauses against a comparison value and combines them by mode.
    pub fn matches(&self, value: &str) -> bool {
        let mut checks = Vec::with_capacity(5);
        if !self.equals.is_empty() {
            checks.push(self.equals.iter().any(|candidate| candidate == value));
        }
        if !self.not_equals.is_empty() {
            checks.push(self.not_equals.iter().any(|candidate| candidate == value));
        }
        if !self.contains.is_empty() {
            checks.push(self.contains.iter().any(|part| value.contains(part.as_str())));
        }
        if !self.regex.is_empty() {
            checks.push(self.regex.iter().any(|pattern| pattern.is_match(value)));
        }
        if let Some(empty) = self.empty {
            let is_empty = value.is_empty() || value == "0";
            checks.push(is_empty == empty);
        }

        match self.mode {
            Mode::Or => checks.iter().any(|check| *check),
            Mode::And => checks.iter().all(|check| *check),
        }
    }
}

/// Text a cell is compared by: `""` for blanks, otherwise the trimmed display text.
pub fn comparison_value(value: &CellValue) -> String {
    match value.as_text() {
        Some(text) => text.trim().to_owned(),
        None => value.to_string().trim().to_owned(),
    }
}

/// One entry of a rules file: the column plus its clauses
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub column: ColumnRef,
    #[serde(default)]
    pub equals: Vec<String>,
    #[serde(default)]
    pub not_equals: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
    #[serde(default)]
    pub empty: Option<bool>,
    #[serde(default)]
    pub mode: Mode,
}

impl RuleEntry {
    pub fn into_parts(self) -> (ColumnRef, RuleSpec) {
        let spec = RuleSpec {
            equals: self.equals,
            not_equals: self.not_equals,
            contains: self.contains,
            regex: self.regex,
            empty: self.empty,
            mode: self.mode,
        };
        (self.column, spec)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesDocument {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

/// Ordered rules keyed by column reference
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<(ColumnRef, FilterRule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and appends a rule
    pub fn add<C: Into<ColumnRef>>(&mut self, column: C, spec: RuleSpec) -> Result<&mut Self, RuleError> {
        let column = column.into();
        let rule = FilterRule::compile(&column, spec)?;
        self.rules.push((column, rule));
        Ok(self)
    }

    /// Builder form of [`RuleSet::add`]
    pub fn with_rule<C: Into<ColumnRef>>(mut self, column: C, spec: RuleSpec) -> Result<Self, RuleError> {
        self.add(column, spec)?;
        Ok(self)
    }

    pub fn from_entries<I: IntoIterator<Item = RuleEntry>>(entries: I) -> Result<RuleSet, RuleError> {
        let mut rules = RuleSet::new();
        for entry in entries {
            let (column, spec) = entry.into_parts();
            rules.add(column, spec)?;
        }
        Ok(rules)
    }

    /// Parses a TOML document made of `[[rules]]` tables
    pub fn from_toml_str(text: &str) -> Result<RuleSet, RuleError> {
        let document: RulesDocument = toml::from_str(text).map_err(|error| RuleError::InvalidConfig(error.to_string()))?;
        RuleSet::from_entries(document.rules)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnRef, &FilterRule)> {
        self.rules.iter().map(|(column, rule)| (column, rule))
    }

    /// Resolves column references to indexes. A rule landing on an index that is
    /// already ruled replaces the earlier rule in its position.
    pub fn resolve(&self, header: &HeaderInfo) -> Result<Vec<(usize, &FilterRule)>, TableError> {
        let mut resolved: Vec<(usize, &FilterRule)> = Vec::with_capacity(self.rules.len());
        for (column, rule) in &self.rules {
            let index = column.resolve(header)?;
            match resolved.iter_mut().find(|(existing, _)| *existing == index) {
                Some(slot) => slot.1 = rule,
                None => resolved.push((index, rule)),
            }
        }
        Ok(resolved)
    }

    /// Resolves against `header` and filters `rows`
    pub fn apply(&self, rows: &[Row], header: &HeaderInfo) -> Result<Vec<Row>, TableError> {
        Ok(filter_rows(rows, &self.resolve(header)?))
    }
}

/// Keeps the rows no rule fires on.
///
/// Columns are checked in rule order and a row is dropped at the first firing
/// rule. Rows too short to reach a ruled column skip that rule.
pub fn filter_rows(rows: &[Row], rules: &[(usize, &FilterRule)]) -> Vec<Row> {
    let kept: Vec<Row> = rows
        .iter()
        .filter(|row| {
            !rules.iter().any(|(index, rule)| {
                row.get(*index)
                    .map(|value| rule.matches(&comparison_value(value)))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect();
    debug!(rows = rows.len(), kept = kept.len(), rules = rules.len(), "filtered rows");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(values: &[&str]) -> Row {
        values.iter().map(|value| CellValue::from(*value)).collect()
    }

    fn header() -> HeaderInfo {
        HeaderInfo::new(1, vec!["Name".to_owned(), "Status".to_owned()])
    }

    fn apply(rows: &[Row], rules: RuleSet) -> Vec<Row> {
        rules.apply(rows, &header()).unwrap()
    }

    #[test]
    fn drops_rows_with_listed_status() {
        let rows = vec![row(&["A", "Done"]), row(&["B", "Open"]), row(&["", ""])];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().equals(["Open"])).unwrap();
        let rules = rules.with_rule("Name", RuleSpec::new().empty(true)).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["A", "Done"])]);
    }

    #[test]
    fn equals_alone_keeps_blank_rows() {
        let rows = vec![row(&["A", "Done"]), row(&["B", "Open"]), row(&["", ""])];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().equals(["Open"])).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["A", "Done"]), row(&["", ""])]);
    }

    #[test]
    fn contains_matches_substrings() {
        let rows = vec![row(&["X_NO_1"]), row(&["X_OK"])];
        let rules = RuleSet::new().with_rule("Name", RuleSpec::new().contains(["_NO"])).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["X_OK"])]);
    }

    #[test]
    fn empty_ruleset_is_identity() {
        let rows = vec![row(&["A", "Done"]), row(&[]), row(&["", "0"])];
        assert_eq!(apply(&rows, RuleSet::new()), rows);
    }

    #[test]
    fn and_of_exclusive_clauses_never_drops() {
        let rows = vec![row(&["A", ""]), row(&["B", "A"]), row(&["C", "0"]), row(&["D", "x"])];
        let spec = RuleSpec::new().equals(["A"]).empty(true).mode(Mode::And);
        let rules = RuleSet::new().with_rule("Status", spec).unwrap();
        assert_eq!(apply(&rows, rules), rows);
    }

    #[test]
    fn and_requires_every_clause() {
        let rows = vec![row(&["A", "VIP-1"]), row(&["B", "VIP"]), row(&["C", "regular-1"])];
        let spec = RuleSpec::new().contains(["VIP"]).regex([r"\d$"]).mode(Mode::And);
        let rules = RuleSet::new().with_rule(1usize, spec).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["B", "VIP"]), row(&["C", "regular-1"])]);
    }

    #[test]
    fn not_equals_is_literal_membership() {
        let rows = vec![row(&["A", "X"]), row(&["B", "Y"])];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().not_equals(["X"])).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["B", "Y"])]);
    }

    #[test]
    fn empty_clause_treats_zero_as_blank() {
        let rows = vec![
            vec![CellValue::from("a"), CellValue::Number(0.0)],
            vec![CellValue::from("b"), CellValue::Empty],
            vec![CellValue::from("c"), CellValue::from("  ")],
            vec![CellValue::from("d"), CellValue::Number(3.0)],
        ];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().empty(true)).unwrap();
        assert_eq!(apply(&rows, rules), vec![rows[3].clone()]);

        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().empty(false)).unwrap();
        assert_eq!(apply(&rows, rules), rows[..3].to_vec());
    }

    #[test]
    fn regex_searches_anywhere() {
        let rows = vec![row(&["A", "ticket 2024-17"]), row(&["B", "none"])];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().regex([r"\d{4}-\d+"])).unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["B", "none"])]);
    }

    #[test]
    fn short_rows_skip_the_rule() {
        let rows = vec![row(&["A"]), row(&["B", "Open"])];
        let rules = RuleSet::new().with_rule("Status", RuleSpec::new().empty(true)).unwrap();
        let rules = rules.with_rule(5usize, RuleSpec::new().mode(Mode::And)).unwrap();
        assert_eq!(apply(&rows, rules), rows);
    }

    #[test]
    fn rows_matching_several_rules_are_dropped_once() {
        let rows = vec![row(&["A", "Open"]), row(&["B", "Done"]), row(&["A", "Done"])];
        let rules = RuleSet::new()
            .with_rule("Name", RuleSpec::new().equals(["A"]))
            .unwrap()
            .with_rule("Status", RuleSpec::new().equals(["Open"]))
            .unwrap();
        assert_eq!(apply(&rows, rules), vec![row(&["B", "Done"])]);
    }

    #[test]
    fn later_rule_for_same_column_replaces_earlier() {
        let rules = RuleSet::new()
            .with_rule("Status", RuleSpec::new().equals(["Open"]))
            .unwrap()
            .with_rule("Name", RuleSpec::new().equals(["Z"]))
            .unwrap()
            .with_rule(1usize, RuleSpec::new().equals(["Done"]))
            .unwrap();
        let resolved = rules.resolve(&header()).unwrap();
        assert_eq!(resolved.iter().map(|(index, _)| *index).collect::<Vec<_>>(), vec![1, 0]);

        let rows = vec![row(&["A", "Open"]), row(&["B", "Done"])];
        assert_eq!(apply(&rows, rules), vec![row(&["A", "Open"])]);
    }

    #[test]
    fn unknown_columns_fail_resolution() {
        let rules = RuleSet::new().with_rule("Owner", RuleSpec::new().equals(["x"])).unwrap();
        assert!(matches!(
            rules.apply(&[], &header()),
            Err(TableError::ColumnNotFound { column, .. }) if column == "Owner"
        ));
    }

    #[test]
    fn comparison_values_are_trimmed_display_text() {
        assert_eq!(comparison_value(&CellValue::Empty), "");
        assert_eq!(comparison_value(&CellValue::from("  Open ")), "Open");
        assert_eq!(comparison_value(&CellValue::from("   ")), "");
        assert_eq!(comparison_value(&CellValue::Number(5.0)), "5");
        assert_eq!(comparison_value(&CellValue::Bool(false)), "FALSE");
    }

    #[test]
    fn bad_patterns_fail_at_build_time() {
        let error = RuleSet::new().with_rule("Status", RuleSpec::new().regex(["("])).unwrap_err();
        assert!(matches!(
            &error,
            RuleError::InvalidPattern { column, pattern, .. } if column == "Status" && pattern == "("
        ));
    }

    #[test]
    fn rules_parse_from_toml() {
        let rules = RuleSet::from_toml_str(
            r#"
            [[rules]]
            column = "Status"
            equals = ["Open", "Draft"]

            [[rules]]
            column = 0
            empty = true
            contains = ["tmp"]
            mode = "AND"
            "#,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        let (column, rule) = rules.iter().nth(1).unwrap();
        assert_eq!(column, &ColumnRef::Index(0));
        assert_eq!(rule.mode(), Mode::And);
    }

    #[test]
    fn unknown_rule_keys_are_rejected() {
        let error = RuleSet::from_toml_str("[[rules]]\ncolumn = \"Status\"\nequal = [\"Open\"]\n").unwrap_err();
        assert!(matches!(error, RuleError::InvalidConfig(message) if message.contains("equal")));
    }

    #[test]
    fn unknown_mode_falls_back_to_or() {
        assert_eq!(Mode::parse("xor"), Mode::Or);
        assert_eq!(Mode::parse(" And "), Mode::And);
    }
}
