//! Name inflection for collections: type name -> table name -> URL path segment.

/// Convert a single identifier from CamelCase to snake_case.
/// e.g. "UserTeamLink" -> "user_team_link", "Severity" -> "severity"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Plural form of a lower-case English word, covering the regular rules.
/// e.g. "severity" -> "severities", "impact" -> "impacts", "box" -> "boxes"
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_lowercase();
    if let Some(stem) = lower.strip_suffix('y') {
        let before = stem.chars().last();
        if before.map(|c| !"aeiou".contains(c)).unwrap_or(false) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Table name for a type name: snake_case with the last word pluralized.
/// e.g. "Severity" -> "severities", "UserTeamLink" -> "user_team_links"
pub fn tableize(type_name: &str) -> String {
    let snake = to_snake_case(type_name);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(&snake),
    }
}

/// Underscores to dashes, for URL path segments.
pub fn dasherize(s: &str) -> String {
    s.replace('_', "-")
}

/// Singular snake form used in operation ids ("get_severity").
pub fn underscore(type_name: &str) -> String {
    to_snake_case(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_words() {
        assert_eq!(to_snake_case("Severity"), "severity");
        assert_eq!(to_snake_case("UserTeamLink"), "user_team_link");
        assert_eq!(to_snake_case("HTTPLog"), "http_log");
    }

    #[test]
    fn tableize_pluralizes_last_word() {
        assert_eq!(tableize("Severity"), "severities");
        assert_eq!(tableize("Likelihood"), "likelihoods");
        assert_eq!(tableize("Detection"), "detections");
        assert_eq!(tableize("Impact"), "impacts");
        assert_eq!(tableize("Cause"), "causes");
        assert_eq!(tableize("Day"), "days");
        assert_eq!(tableize("ProjectTeamLink"), "project_team_links");
        assert_eq!(tableize("Address"), "addresses");
    }

    #[test]
    fn dasherize_replaces_underscores() {
        assert_eq!(dasherize("user_team_links"), "user-team-links");
        assert_eq!(dasherize("severities"), "severities");
    }
}
