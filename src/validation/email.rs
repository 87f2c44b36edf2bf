//! Email format checks and domain typo detection.

use regex::Regex;

/// Addresses longer than this are rejected.
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL_PATTERN: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").unwrap());

/// Known misspellings and their intended domain.
const DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmial.com", "gmail.com"),
    ("gmil.com", "gmail.com"),
    ("gmail.co", "gmail.com"),
    ("yaho.com", "yahoo.com"),
    ("yahoo.co", "yahoo.com"),
    ("hotnail.com", "hotmail.com"),
    ("hotmial.com", "hotmail.com"),
    ("outlok.com", "outlook.com"),
    ("outlook.co", "outlook.com"),
    ("iclod.com", "icloud.com"),
    ("icloud.co", "icloud.com"),
];

/// Domains accepted as-is and used as edit-distance targets.
const COMMON_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "icloud.com",
    "aol.com",
    "protonmail.com",
    "live.com",
    "msn.com",
    "larkinsrestaurants.com",
];

pub fn is_valid_email_format(email: &str) -> bool {
    EMAIL_PATTERN.is_match(&email.trim().to_lowercase())
}

/// Suggest a corrected address when the domain looks like a typo of a common
/// provider. Returns `None` when no correction applies.
pub fn suggest_email_domain_fix(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    if let Some((_, fixed)) = DOMAIN_TYPOS.iter().find(|(typo, _)| *typo == domain) {
        return Some(format!("{local}@{fixed}"));
    }

    if COMMON_DOMAINS.contains(&domain) {
        return None;
    }

    closest_common_domain(domain).map(|fixed| format!("{local}@{fixed}"))
}

fn closest_common_domain(domain: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for &candidate in COMMON_DOMAINS {
        let distance = levenshtein(domain, candidate);
        // First candidate wins ties.
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }

    let (candidate, distance) = best?;
    let len_diff = domain.chars().count().abs_diff(candidate.chars().count());
    match distance {
        0 | 1 => Some(candidate),
        2 if len_diff <= 1 => Some(candidate),
        _ => None,
    }
}

/// Classic edit distance with unit insert, delete and substitute costs.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
