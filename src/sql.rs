const READ_PREFIXES: [&str; 3] = ["SELECT", "SHOW", "DESC"];

/// Returns `true` when `sql` is routed to the query endpoint.
///
/// Case-insensitive prefix match on `SELECT`, `SHOW` or `DESC` after leading
/// whitespace; everything else is a write.
pub fn is_select(sql: &str) -> bool {
    let sql = sql.trim_start();
    READ_PREFIXES.iter().any(|prefix| {
        sql.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Best-effort table label for a read statement: the token after `FROM`.
///
/// Tokens are split on single whitespace characters, so repeated separators
/// yield empty tokens. Joins and subqueries produce whatever follows the first
/// `FROM`, which may be empty or meaningless.
pub fn extract_table_name(sql: &str) -> String {
    if !is_select(sql) {
        return String::new();
    }

    let mut tokens = sql.split(char::is_whitespace);
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("FROM") {
            return tokens
                .next()
                .map(|name| name.trim_matches(['`', '\'']).trim().to_owned())
                .unwrap_or_default();
        }
    }

    String::new()
}
