//! Query-by-predicate and raw command descriptions.
//!
//! # Invariants
//! - Column names are compile-time constants; only values are bound.
//! - Rendered SQL uses positional `?` placeholders in bind order.

use crate::db::UNICODE_LOWER_FN;
use rusqlite::types::Value;

/// Predicate over one entity table.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(&'static str, Value),
    /// Unicode case-insensitive substring match.
    ContainsIgnoreCase(&'static str, String),
    All(Vec<Filter>),
    Any(Vec<Filter>),
}

impl Filter {
    pub fn text(column: &'static str, value: &str) -> Self {
        Self::Eq(column, Value::Text(value.to_string()))
    }

    pub fn int(column: &'static str, value: i64) -> Self {
        Self::Eq(column, Value::Integer(value))
    }

    pub fn flag(column: &'static str, value: bool) -> Self {
        Self::Eq(column, Value::Integer(i64::from(value)))
    }

    pub fn contains_ignore_case(column: &'static str, value: &str) -> Self {
        Self::ContainsIgnoreCase(column, value.to_string())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::All(mut filters) => {
                filters.push(other);
                Self::All(filters)
            }
            first => Self::All(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Any(mut filters) => {
                filters.push(other);
                Self::Any(filters)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    fn render(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::Eq(column, value) => {
                sql.push_str(column);
                sql.push_str(" = ?");
                binds.push(value.clone());
            }
            Self::ContainsIgnoreCase(column, needle) => {
                sql.push_str(&format!(
                    "instr({UNICODE_LOWER_FN}({column}), {UNICODE_LOWER_FN}(?)) > 0"
                ));
                binds.push(Value::Text(needle.clone()));
            }
            Self::All(filters) => render_group(filters, " AND ", "1 = 1", sql, binds),
            Self::Any(filters) => render_group(filters, " OR ", "1 = 0", sql, binds),
        }
    }
}

fn render_group(
    filters: &[Filter],
    separator: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<Value>,
) {
    if filters.is_empty() {
        sql.push_str(empty);
        return;
    }

    sql.push('(');
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            sql.push_str(separator);
        }
        filter.render(sql, binds);
    }
    sql.push(')');
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Filter, ordering and limit for one entity query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Option<Filter>,
    order_by: Vec<(&'static str, Direction)>,
    limit: Option<u32>,
}

impl Query {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order_by.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders ` WHERE ...` (or nothing) and its bind values.
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        if let Some(filter) = self.filter.as_ref() {
            sql.push_str(" WHERE ");
            filter.render(&mut sql, &mut binds);
        }
        (sql, binds)
    }

    /// Renders the full clause tail: filter, ordering and limit.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let (mut sql, mut binds) = self.where_clause();

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| match direction {
                    Direction::Asc => format!("{column} ASC"),
                    Direction::Desc => format!("{column} DESC"),
                })
                .collect();
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
        }

        (sql, binds)
    }
}

/// Parameterized raw SQL for dialect-specific escape hatches.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommand {
    pub text: String,
    pub params: Vec<Value>,
}

impl RawCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: Value) -> Self {
        self.params.push(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Filter, Query};
    use rusqlite::types::Value;

    #[test]
    fn empty_query_renders_nothing() {
        let (sql, binds) = Query::all().to_sql();
        assert!(sql.is_empty());
        assert!(binds.is_empty());
    }

    #[test]
    fn nested_filters_render_in_bind_order() {
        let query = Query::filter(
            Filter::text("username", "bob")
                .or(Filter::text("email", "bob@example.com"))
                .and(Filter::flag("is_activated", true)),
        )
        .order_by("username", Direction::Desc)
        .limit(1);

        let (sql, binds) = query.to_sql();
        assert_eq!(
            sql,
            " WHERE ((username = ? OR email = ?) AND is_activated = ?) ORDER BY username DESC LIMIT ?"
        );
        assert_eq!(
            binds,
            vec![
                Value::Text("bob".to_string()),
                Value::Text("bob@example.com".to_string()),
                Value::Integer(1),
                Value::Integer(1),
            ]
        );
    }

    #[test]
    fn contains_ignore_case_lowers_both_sides() {
        let (sql, _) = Query::filter(Filter::contains_ignore_case("tags", "Tag1")).where_clause();
        assert_eq!(
            sql,
            " WHERE instr(unicode_lower(tags), unicode_lower(?)) > 0"
        );
    }
}
