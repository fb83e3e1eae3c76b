use regex::Regex;
use std::sync::LazyLock;

const MAX_SUGGESTIONS: usize = 5;
const ACTION_WORDS: &[&str] = &[
    "try",
    "test",
    "check",
    "scan",
    "analyze",
    "investigate",
    "exploit",
];

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("static regex"));

/// Pulls up to five actionable items out of a reply: bullet and numbered
/// list entries first, otherwise sentences that mention an action word.
pub fn extract_suggestions(response: &str) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();

    for line in response.lines().map(str::trim) {
        if let Some(rest) = line
            .strip_prefix('•')
            .or_else(|| line.strip_prefix('-'))
            .or_else(|| line.strip_prefix('*'))
        {
            suggestions.push(rest.trim().to_string());
        } else if let Some(prefix) = NUMBERED.find(line) {
            suggestions.push(line[prefix.end()..].to_string());
        }
    }

    if suggestions.is_empty() {
        for sentence in response.split(['.', '!', '?']).map(str::trim) {
            let lower = sentence.to_lowercase();
            if sentence.chars().count() > 20 && ACTION_WORDS.iter().any(|w| lower.contains(w)) {
                suggestions.push(sentence.to_string());
            }
        }
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_and_numbers_are_stripped() {
        let reply = "Findings:\n• Port 22 exposes OpenSSH 7.2\n- Check for CVE-2016-6210\n* Rotate keys\n3. Run a vuln scan\n12.Enumerate vhosts";
        assert_eq!(
            extract_suggestions(reply),
            vec![
                "Port 22 exposes OpenSSH 7.2",
                "Check for CVE-2016-6210",
                "Rotate keys",
                "Run a vuln scan",
                "Enumerate vhosts"
            ]
        );
    }

    #[test]
    fn falls_back_to_action_sentences() {
        let reply = "The host looks hardened. You should investigate the admin panel further! \
                     Try default credentials on the login page? Nice.";
        assert_eq!(
            extract_suggestions(reply),
            vec![
                "You should investigate the admin panel further",
                "Try default credentials on the login page"
            ]
        );
    }

    #[test]
    fn capped_at_five() {
        let reply = (1..=8).map(|i| format!("- item {}\n", i)).collect::<String>();
        assert_eq!(extract_suggestions(&reply).len(), 5);
    }

    #[test]
    fn plain_prose_yields_nothing() {
        assert!(extract_suggestions("All good here. Nothing of note.").is_empty());
    }
}
