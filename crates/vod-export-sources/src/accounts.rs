use regex::Regex;
use tracing::info;
use vod_export_models::Account;

/// Parse an account selector string: comma-separated names or SQL
/// LIKE-style patterns. Empty input means "all accounts".
pub fn parse_patterns(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect();
    if parts.is_empty() {
        vec!["%".to_string()]
    } else {
        parts
    }
}

/// Return true if `name` matches any pattern. A standalone "%" matches
/// everything; otherwise '%' matches any run of characters and '_' exactly
/// one, like SQL LIKE. Matching is case-sensitive.
pub fn matches_any(name: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }
    if patterns.iter().any(|p| p == "%") {
        return true;
    }
    patterns
        .iter()
        .any(|pattern| like_to_regex(pattern).is_match(name))
}

fn like_to_regex(pattern: &str) -> Regex {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    // The expression is built from escaped literals plus .* and ., so
    // compilation cannot fail.
    Regex::new(&expr).unwrap_or_else(|_| Regex::new("^$").unwrap())
}

/// Filter discovered accounts down to those matching the configured
/// patterns, preserving discovery order.
pub fn filter_accounts(accounts: Vec<Account>, patterns: &[String]) -> Vec<Account> {
    let selected: Vec<Account> = accounts
        .into_iter()
        .filter(|acc| matches_any(&acc.name, patterns))
        .collect();

    info!(
        "Selected {} account(s) matching patterns {:?}",
        selected.len(),
        patterns
    );
    for acc in &selected {
        info!(" - {} (id={})", acc.display_name(), acc.id);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u64, name: &str) -> Account {
        Account {
            id,
            name: name.to_string(),
            server_url: None,
        }
    }

    #[test]
    fn test_parse_patterns() {
        assert_eq!(parse_patterns(""), vec!["%"]);
        assert_eq!(parse_patterns("  "), vec!["%"]);
        assert_eq!(parse_patterns("Acme"), vec!["Acme"]);
        assert_eq!(
            parse_patterns("Strong 8K, MyXC ,"),
            vec!["Strong 8K", "MyXC"]
        );
    }

    #[test]
    fn test_wildcard_semantics() {
        let all = vec!["%".to_string()];
        assert!(matches_any("anything", &all));

        let exact = vec!["Acme".to_string()];
        assert!(matches_any("Acme", &exact));
        assert!(!matches_any("Acme 2", &exact));

        let prefix = vec!["Strong%".to_string()];
        assert!(matches_any("Strong 8K", &prefix));
        assert!(!matches_any("8K Strong", &prefix));

        let contains = vec!["%8K%".to_string()];
        assert!(matches_any("Strong 8K HD", &contains));

        let suffix = vec!["%8K".to_string()];
        assert!(matches_any("Strong 8K", &suffix));
        assert!(!matches_any("8K Strong", &suffix));

        let single = vec!["Acme_".to_string()];
        assert!(matches_any("Acme1", &single));
        assert!(!matches_any("Acme12", &single));
    }

    #[test]
    fn test_pattern_special_chars_are_literal() {
        let pat = vec!["A(B)+C%".to_string()];
        assert!(matches_any("A(B)+C extra", &pat));
        assert!(!matches_any("ABBC extra", &pat));
    }

    #[test]
    fn test_filter_accounts() {
        let accounts = vec![account(1, "Strong 8K"), account(2, "Other")];
        let filtered = filter_accounts(accounts, &["Strong%".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }
}
