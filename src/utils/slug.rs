//! URL slug generation and validation.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum slug length in characters.
pub const MAX_SLUG_LENGTH: usize = 80;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        _ => return None,
    };
    Some(folded)
}

/// Converts arbitrary text into a URL slug.
///
/// Lowercases, folds common accented Latin letters to ASCII, collapses every
/// other run of characters into a single `-`, and trims to [`MAX_SLUG_LENGTH`].
/// Returns an empty string when the input has no alphanumeric content.
///
/// # Examples
///
/// ```
/// use stem_cms::utils::slug::slugify;
///
/// assert_eq!(slugify("Robotics Summer Camp 2026!"), "robotics-summer-camp-2026");
/// assert_eq!(slugify("Énergie & Climat"), "energie-climat");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let piece = if c.is_ascii_alphanumeric() {
            Some(c.to_string())
        } else {
            fold(c).map(str::to_string)
        };

        match piece {
            Some(p) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(&p);
            }
            None => pending_dash = true,
        }

        if slug.len() >= MAX_SLUG_LENGTH {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    slug.trim_end_matches('-').to_string()
}

/// Whether `s` is a well-formed slug (lowercase words joined by single dashes).
pub fn is_valid_slug(s: &str) -> bool {
    s.len() <= MAX_SLUG_LENGTH && SLUG_REGEX.is_match(s)
}

/// Returns the `n`-th candidate for a slug that is already taken.
///
/// `n = 1` is the base slug itself; later candidates get `-2`, `-3`, ...
/// appended while staying within [`MAX_SLUG_LENGTH`].
pub fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        return base.to_string();
    }

    let suffix = format!("-{n}");
    let keep = MAX_SLUG_LENGTH.saturating_sub(suffix.len()).min(base.len());
    format!("{}{}", base[..keep].trim_end_matches('-'), suffix)
}
