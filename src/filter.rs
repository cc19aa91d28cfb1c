use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::types::Value;

use crate::error::CkwError;

/// Vendor columns an operator may filter on.
pub const FILTERABLE_COLUMNS: &[&str] = &[
    "id",
    "business_name",
    "category",
    "service",
    "contact_name",
    "phone",
    "email",
    "website",
    "notes",
    "keywords",
    "ckw_manual_extra",
    "computed_keywords",
    "ckw_version",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Contains,
}

impl FilterOp {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::LtEq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::GtEq),
            "~" => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Contains => "~",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: String,
}

impl Predicate {
    fn sql_fragment(&self) -> String {
        match self.op {
            FilterOp::Contains => format!("\"{}\" LIKE ? ESCAPE '\\'", self.column),
            op => format!("\"{}\" {} ?", self.column, op.as_str()),
        }
    }

    fn bound_value(&self) -> Value {
        match self.op {
            FilterOp::Contains => Value::Text(format!("%{}%", escape_like(&self.value))),
            _ if self.column == "id" => self
                .value
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(self.value.clone())),
            _ => Value::Text(self.value.clone()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, self.op.as_str(), self.value)
    }
}

/// AND-ed predicates narrowing the unlocked vendor selection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordFilter {
    pub predicates: Vec<Predicate>,
}

impl RecordFilter {
    pub fn parse_all(inputs: &[String]) -> Result<Self> {
        let parser = PredicateParser::new()?;
        let predicates = inputs
            .iter()
            .filter(|input| !input.trim().is_empty())
            .map(|input| parser.parse(input))
            .collect::<Result<Vec<Predicate>, CkwError>>()?;
        Ok(Self { predicates })
    }

    pub fn describe(&self) -> Vec<String> {
        self.predicates.iter().map(ToString::to_string).collect()
    }

    /// SQL conditions joined with AND plus their bound values, checked against
    /// the columns the table actually has.
    pub fn to_sql(
        &self,
        available_columns: &HashSet<String>,
    ) -> Result<(String, Vec<Value>), CkwError> {
        let mut clauses = Vec::with_capacity(self.predicates.len());
        let mut values = Vec::with_capacity(self.predicates.len());

        for predicate in &self.predicates {
            if !available_columns.contains(predicate.column) {
                return Err(CkwError::UnknownColumn {
                    column: predicate.column.to_string(),
                });
            }
            clauses.push(predicate.sql_fragment());
            values.push(predicate.bound_value());
        }

        Ok((clauses.join(" AND "), values))
    }
}

struct PredicateParser {
    pattern: Regex,
}

impl PredicateParser {
    fn new() -> Result<Self> {
        let pattern = Regex::new(
            r"^\s*(?P<column>[A-Za-z_][A-Za-z0-9_]*)\s*(?P<op>!=|<=|>=|=|<|>|~)\s*(?P<value>.*?)\s*$",
        )
        .context("failed to compile filter predicate regex")?;
        Ok(Self { pattern })
    }

    fn parse(&self, input: &str) -> Result<Predicate, CkwError> {
        let invalid = |reason: &str| CkwError::InvalidFilter {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let captures = self
            .pattern
            .captures(input)
            .ok_or_else(|| invalid("expected <column><op><value>, e.g. category=plumbing"))?;

        let requested = captures["column"].to_ascii_lowercase();
        let column = FILTERABLE_COLUMNS
            .iter()
            .copied()
            .find(|candidate| *candidate == requested)
            .ok_or_else(|| invalid("column is not filterable"))?;
        let op = FilterOp::parse(&captures["op"]).ok_or_else(|| invalid("unsupported operator"))?;

        Ok(Predicate {
            column,
            op,
            value: unquote(&captures["value"]).to_string(),
        })
    }
}

fn unquote(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    raw
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_columns() -> HashSet<String> {
        FILTERABLE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn parse(inputs: &[&str]) -> Result<RecordFilter> {
        let owned = inputs.iter().map(|s| s.to_string()).collect::<Vec<String>>();
        RecordFilter::parse_all(&owned)
    }

    #[test]
    fn parses_operators_and_trims_whitespace() {
        let filter = parse(&["  Category = plumbing ", "id>=10", "website~rio", "phone!=''"])
            .expect("filters should parse");

        assert_eq!(
            filter.predicates,
            vec![
                Predicate {
                    column: "category",
                    op: FilterOp::Eq,
                    value: "plumbing".to_string(),
                },
                Predicate {
                    column: "id",
                    op: FilterOp::GtEq,
                    value: "10".to_string(),
                },
                Predicate {
                    column: "website",
                    op: FilterOp::Contains,
                    value: "rio".to_string(),
                },
                Predicate {
                    column: "phone",
                    op: FilterOp::NotEq,
                    value: String::new(),
                },
            ]
        );
        assert_eq!(
            filter.describe(),
            vec!["category=plumbing", "id>=10", "website~rio", "phone!="]
        );
    }

    #[test]
    fn blank_inputs_are_ignored() {
        let filter = parse(&["", "   "]).expect("blank filters should parse");
        assert!(filter.predicates.is_empty());
    }

    #[test]
    fn rejects_unknown_columns_and_malformed_input() {
        for input in ["ckw_locked=1", "password=x", "category", "1=1", "category plumbing"] {
            let err = parse(&[input]).expect_err("filter should be rejected");
            assert!(
                matches!(
                    err.downcast_ref::<CkwError>(),
                    Some(CkwError::InvalidFilter { .. })
                ),
                "unexpected error for {input:?}: {err}"
            );
        }
    }

    #[test]
    fn to_sql_binds_values_instead_of_splicing_them() {
        let filter = parse(&["category=x' OR 1=1 --", "id<100", "business_name~50%_off"])
            .expect("filters should parse");

        let (sql, values) = filter.to_sql(&all_columns()).expect("sql should build");

        assert_eq!(
            sql,
            "\"category\" = ? AND \"id\" < ? AND \"business_name\" LIKE ? ESCAPE '\\'"
        );
        assert_eq!(
            values,
            vec![
                Value::Text("x' OR 1=1 --".to_string()),
                Value::Integer(100),
                Value::Text("%50\\%\\_off%".to_string()),
            ]
        );
    }

    #[test]
    fn to_sql_rejects_columns_missing_from_table() {
        let filter = parse(&["keywords~roof"]).expect("filter should parse");
        let columns = ["id", "business_name"]
            .iter()
            .map(|c| c.to_string())
            .collect::<HashSet<String>>();

        let err = filter.to_sql(&columns).expect_err("missing column should fail");
        assert!(matches!(err, CkwError::UnknownColumn { column } if column == "keywords"));
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let filter = parse(&["contact_name=\"Ana Cruz\""]).expect("filter should parse");
        assert_eq!(filter.predicates[0].value, "Ana Cruz");
    }
}
