//! Text-level SQL helpers used by the dialects.
//!
//! Every function here is whitespace tolerant and idempotent on its own
//! output where that makes sense (trimming, splitting).

lazy_static::lazy_static! {
    static ref QUERY_PREFIX: regex::Regex =
        regex::Regex::new(r"(?i)\A\(?\s*(select|show|with)\b").expect("valid query prefix regex");
    static ref ORDER_DIRECTION: regex::Regex = regex::Regex::new(
        r"(?i)^(.*?)\s+((?:asc|desc)(?:\s+nulls\s+(?:first|last))?|nulls\s+(?:first|last))$"
    )
    .expect("valid order direction regex");
    static ref ORDER_BY_KEYWORD: regex::Regex =
        regex::Regex::new(r"(?i)\border\s+by\b").expect("valid order by regex");
}

/// How a statement should be sent to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Produces rows.
    Query,
    /// Produces an update count.
    Update,
    /// Let the driver decide.
    Auto,
}

/// `SELECT`/`SHOW`/`WITH`, optionally behind an opening parenthesis, is a query.
pub fn classify_statement(sql: &str) -> StatementKind {
    if QUERY_PREFIX.is_match(sql.trim()) {
        StatementKind::Query
    } else {
        StatementKind::Update
    }
}

/// Trims whitespace and trailing statement terminators.
pub fn strip_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Target table of an `INSERT INTO <table> ...` statement, unquoted.
pub fn insert_table_name(sql: &str) -> Option<String> {
    let mut tokens = sql.split_whitespace();
    let verb = tokens.next()?;
    let into = tokens.next()?;
    if !verb.eq_ignore_ascii_case("insert") || !into.eq_ignore_ascii_case("into") {
        return None;
    }
    let target = tokens.next()?;
    let target = target.split('(').next().unwrap_or(target);
    let name: String = target.chars().filter(|c| *c != '"').collect();
    Some(name).filter(|n| !n.is_empty())
}

/// Splits on `separator` outside parentheses and quotes.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut in_quote: Option<char> = None;
    let mut start = 0usize;

    for (idx, ch) in text.char_indices() {
        match (in_quote, ch) {
            (Some(q), c) if c == q => in_quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => in_quote = Some(ch),
            (None, '(') => depth = depth.saturating_add(1),
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Copy of `sql` with everything inside parentheses, quotes and bracketed
/// identifiers blanked out, so keyword searches only see the outer statement.
pub fn top_level_text(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut depth = 0u32;
    let mut closing: Option<char> = None;

    for ch in sql.chars() {
        let hidden = match (closing, ch) {
            (Some(c), _) if ch == c => {
                closing = None;
                true
            }
            (Some(_), _) => true,
            (None, '\'') | (None, '"') => {
                closing = Some(ch);
                true
            }
            (None, '[') => {
                closing = Some(']');
                true
            }
            (None, '(') => {
                depth = depth.saturating_add(1);
                false
            }
            (None, ')') => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth > 0,
        };
        out.push(if hidden { ' ' } else { ch });
    }
    out
}

/// True when the outer statement, not a subquery or window, has `ORDER BY`.
pub fn has_top_level_order_by(sql: &str) -> bool {
    ORDER_BY_KEYWORD.is_match(&top_level_text(sql))
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub expression: String,
    /// `ASC`, `DESC`, with optional `NULLS FIRST|LAST`, as written.
    pub direction: Option<String>,
}

impl OrderTerm {
    pub fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        match ORDER_DIRECTION.captures(term) {
            Some(caps) if !caps[1].trim().is_empty() => Some(Self {
                expression: caps[1].trim().to_string(),
                direction: Some(caps[2].to_string()),
            }),
            _ => Some(Self {
                expression: term.to_string(),
                direction: None,
            }),
        }
    }
}

impl std::fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.direction {
            Some(dir) => write!(f, "{} {}", self.expression, dir),
            None => f.write_str(&self.expression),
        }
    }
}

/// Parsed `ORDER BY` clause body (without the keywords).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderBy {
    pub terms: Vec<OrderTerm>,
}

impl OrderBy {
    pub fn parse(clause: &str) -> Self {
        let clause = clause.trim();
        let body = match clause.get(..8) {
            Some(prefix) if prefix.eq_ignore_ascii_case("order by") => &clause[8..],
            _ => clause,
        };
        Self {
            terms: split_top_level(body, ',')
                .into_iter()
                .filter_map(OrderTerm::parse)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_statement() {
        assert_eq!(classify_statement("  select * from t"), StatementKind::Query);
        assert_eq!(classify_statement("(SELECT 1 FROM dual)"), StatementKind::Query);
        assert_eq!(classify_statement("( select 1 from dual)"), StatementKind::Query);
        assert_eq!(classify_statement("SHOW tables"), StatementKind::Query);
        assert_eq!(classify_statement("update t set a = 1"), StatementKind::Update);
        assert_eq!(classify_statement("selection_proc()"), StatementKind::Update);
        assert_eq!(classify_statement(""), StatementKind::Update);
    }

    #[test]
    fn test_strip_statement() {
        assert_eq!(strip_statement("  SELECT 1 ; ;\n"), "SELECT 1");
        assert_eq!(strip_statement(strip_statement("SELECT 1;")), "SELECT 1");
    }

    #[test]
    fn test_insert_table_name() {
        assert_eq!(
            insert_table_name("INSERT INTO people (id, name) VALUES (?, 'x')").as_deref(),
            Some("people")
        );
        assert_eq!(
            insert_table_name("insert into \"PEOPLE\"(id) values (?)").as_deref(),
            Some("PEOPLE")
        );
        assert_eq!(
            insert_table_name("insert   into\n scott.people values (?)").as_deref(),
            Some("scott.people")
        );
        assert_eq!(insert_table_name("UPDATE people SET a = 1"), None);
        assert_eq!(insert_table_name("INSERT INTO"), None);
    }

    #[test]
    fn test_split_top_level_ignores_nested_commas() {
        let parts = split_top_level("a, NVL(b, 'x,y') desc, c", ',');
        assert_eq!(parts, vec!["a", " NVL(b, 'x,y') desc", " c"]);
    }

    #[test]
    fn test_top_level_order_by() {
        assert!(has_top_level_order_by("SELECT * FROM t ORDER BY id"));
        assert!(has_top_level_order_by("select a from (select a from t order by a) x order\nby a"));
        assert!(!has_top_level_order_by(
            "SELECT id, ROW_NUMBER() OVER (ORDER BY x) rn FROM t"
        ));
        assert!(!has_top_level_order_by("SELECT * FROM (SELECT * FROM t ORDER BY id) x"));
        assert!(!has_top_level_order_by("SELECT 'order by' AS label FROM t"));
        assert!(!has_top_level_order_by("SELECT [order by] FROM t"));
        assert!(!has_top_level_order_by("SELECT * FROM border_bytes"));
    }

    #[test]
    fn test_top_level_text_keeps_length_and_outer_text() {
        let sql = "SELECT f(a, 'x') FROM t";
        let masked = top_level_text(sql);
        assert_eq!(masked.chars().count(), sql.chars().count());
        assert!(masked.starts_with("SELECT f("));
        assert!(masked.ends_with(") FROM t"));
        assert!(!masked.contains('x'));
    }

    #[test]
    fn test_order_by_parse() {
        let order = OrderBy::parse("ORDER BY t.created_at DESC, NVL(t.name, 'z') asc nulls last, id");
        assert_eq!(order.terms.len(), 3);
        assert_eq!(order.terms[0].expression, "t.created_at");
        assert_eq!(order.terms[0].direction.as_deref(), Some("DESC"));
        assert_eq!(order.terms[1].expression, "NVL(t.name, 'z')");
        assert_eq!(order.terms[1].direction.as_deref(), Some("asc nulls last"));
        assert_eq!(order.terms[2].direction, None);
        assert_eq!(order.terms[1].to_string(), "NVL(t.name, 'z') asc nulls last");
    }

    #[test]
    fn test_order_by_blank() {
        assert!(OrderBy::parse("  ").is_empty());
        assert!(OrderBy::parse(" , ,").is_empty());
    }

    #[test]
    fn test_order_term_bare_keyword_is_expression() {
        let term = OrderTerm::parse("desc").expect("term");
        assert_eq!(term.expression, "desc");
        assert_eq!(term.direction, None);
    }
}
