//! Password strength policy.
//!
//! A password is accepted when it is at least [`MIN_LEN`] characters long,
//! consists only of ASCII letters, ASCII digits and [`SPECIAL_CHARS`], and
//! contains at least one of each class.

/// Minimum accepted password length.
pub const MIN_LEN: usize = 8;

/// The special characters a password may (and must) draw from.
pub const SPECIAL_CHARS: [char; 7] = ['@', '$', '!', '%', '*', '?', '&'];

/// Returns `true` if `candidate` satisfies the policy. Never panics.
pub fn validate_password(candidate: &str) -> bool {
    if candidate.trim().is_empty() {
        return false;
    }

    let (mut lower, mut upper, mut digit, mut special) = (false, false, false, false);
    let mut len = 0usize;
    for c in candidate.chars() {
        match c {
            'a'..='z' => lower = true,
            'A'..='Z' => upper = true,
            '0'..='9' => digit = true,
            c if SPECIAL_CHARS.contains(&c) => special = true,
            _ => return false,
        }
        len += 1;
    }

    len >= MIN_LEN && lower && upper && digit && special
}
