//! Listing filter: optional clauses folded into one conjunctive predicate
//!
//! Each present clause becomes `<column> <op> $n` with the value bound as a
//! parameter. No clause means no WHERE at all, so every user matches.

use sqlx::{Postgres, QueryBuilder};

use crate::models::UserId;

/// Filter for the user listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    id: Option<UserId>,
    name_contains: Option<String>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match exactly one user id.
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    /// Match first names containing `term` anywhere. An empty term is ignored.
    pub fn with_name_containing(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.name_contains = (!term.is_empty()).then_some(term);
        self
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn name_contains(&self) -> Option<&str> {
        self.name_contains.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name_contains.is_none()
    }

    /// Evaluate the predicate against an in-memory user.
    ///
    /// Matching is case-sensitive, like `LIKE` under Postgres.
    pub fn matches(&self, id: UserId, firstname: Option<&str>) -> bool {
        let id_ok = self.id.map_or(true, |wanted| wanted == id);
        let name_ok = match &self.name_contains {
            None => true,
            Some(term) => firstname.is_some_and(|name| name.contains(term.as_str())),
        };
        id_ok && name_ok
    }

    /// Append ` WHERE ...` to a query selecting from `users u`.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut separator = " WHERE ";

        if let Some(id) = self.id {
            builder.push(separator).push("u.id = ").push_bind(id);
            separator = " AND ";
        }

        if let Some(term) = &self.name_contains {
            builder
                .push(separator)
                .push("u.firstname LIKE ")
                .push_bind(contains_pattern(term));
        }
    }
}

/// Wrap `term` in `%...%`, escaping LIKE wildcards so the term matches
/// literally. Postgres uses backslash as the default LIKE escape.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
