//! Query builder for the record store.
//!
//! A [`Select`] is a declarative description of one table read:
//! equality/null filters, a single order-by, an optional limit, and
//! embedded relations. The REST backend renders it to URL parameters;
//! the in-memory backend interprets it directly, so both stores answer
//! a query the same way.

/// Sort direction for an ordered select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Row filter supported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Column equals the given value.
    Eq(String, String),
    /// Column is null.
    IsNull(String),
}

/// An embedded relation pulled alongside the base row.
///
/// Rendered as `alias:table(*)` in the select list. `via` names the
/// foreign-key column on the base table so non-HTTP stores can perform
/// the same join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub alias: String,
    pub table: String,
    pub via: String,
}

impl Embed {
    pub fn new(
        alias: impl Into<String>,
        table: impl Into<String>,
        via: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
            via: via.into(),
        }
    }
}

/// A filtered select against one table.
#[derive(Debug, Clone)]
pub struct Select {
    pub table: String,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Pull a related row alongside each base row.
    pub fn embed(
        mut self,
        alias: impl Into<String>,
        table: impl Into<String>,
        via: impl Into<String>,
    ) -> Self {
        self.embeds.push(Embed::new(alias, table, via));
        self
    }

    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    /// Keep rows where `column` is null.
    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull(column.into()));
        self
    }

    /// Order results by one column.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the query as store URL parameters.
    pub(crate) fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), select_list(&self.embeds))];
        for filter in &self.filters {
            match filter {
                Filter::Eq(column, value) => {
                    params.push((column.clone(), format!("eq.{}", value)));
                }
                Filter::IsNull(column) => {
                    params.push((column.clone(), "is.null".to_string()));
                }
            }
        }
        if let Some((column, direction)) = &self.order {
            params.push(("order".to_string(), format!("{}.{}", column, direction.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Render a select list: all base columns plus each embed as
/// `alias:table(*)`.
pub(crate) fn select_list(embeds: &[Embed]) -> String {
    let mut parts = vec!["*".to_string()];
    for embed in embeds {
        parts.push(format!("{}:{}(*)", embed.alias, embed.table));
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_select_renders_star() {
        let params = Select::new("dealers").to_params();
        assert_eq!(params, vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_filters_order_and_limit_render() {
        let params = Select::new("price_chart_items")
            .eq("chart_id", "pc-1")
            .is_null("expiry_date")
            .order_by("effective_date", Direction::Desc)
            .limit(10)
            .to_params();

        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("chart_id".to_string(), "eq.pc-1".to_string()),
                ("expiry_date".to_string(), "is.null".to_string()),
                ("order".to_string(), "effective_date.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_embed_renders_in_select_list() {
        let query = Select::new("price_chart_items").embed("product", "products", "product_id");
        let params = query.to_params();
        assert_eq!(params[0].1, "*,product:products(*)");
    }
}
