//! Display-name collision resolution.
//!
//! A new upload never takes over the name of an active file. When the
//! desired name is taken (case-insensitively) the resolver appends the next
//! free ` (N)` suffix between stem and extension:
//!
//! ```text
//! a.txt            -> a.txt          (no collision)
//! a.txt            -> a (1).txt      (a.txt active)
//! a.txt            -> a (4).txt      (a.txt, a (3).txt active)
//! ```
//!
//! Only names built from the same stem and extension count towards the
//! suffix; `ab (7).txt` or `a (7).pdf` never influence `a.txt`.

#[cfg(test)]
mod props;

/// Longest display name accepted, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 255;

/// Splits a name into stem and extension.
///
/// The extension runs from the last `.` to the end, dot included. A leading
/// dot does not start an extension, so `.env` is all stem.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Resolves `desired` against the display names of all active records.
///
/// Returns `desired` unchanged when no active name equals it
/// case-insensitively. Otherwise returns `stem (maxN+1)extension`, where
/// `maxN` is the largest suffix among active names of the form
/// `stem (N)extension` (0 when only the bare name exists).
///
/// When `maxN` is `u64::MAX` the smallest unused suffix is taken instead.
///
/// The result never collides with an active name: every colliding name was
/// part of the scan, and the chosen suffix is absent from it.
pub fn resolve_display_name<'a, I>(desired: &str, active: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let (stem, ext) = split_extension(desired);
    let wanted = desired.to_lowercase();
    let prefix = format!("{} (", stem.to_lowercase());
    let suffix = format!("){}", ext.to_lowercase());

    let mut taken = false;
    let mut used: Vec<u64> = Vec::new();

    for name in active {
        let lower = name.to_lowercase();
        if lower == wanted {
            taken = true;
        } else if let Some(n) = parse_suffix(&lower, &prefix, &suffix) {
            used.push(n);
        }
    }

    if !taken {
        return desired.to_string();
    }

    let max_n = used.iter().copied().max().unwrap_or(0);
    let n = max_n
        .checked_add(1)
        .unwrap_or_else(|| smallest_unused(&mut used));
    format!("{stem} ({n}){ext}")
}

/// Smallest positive integer missing from `used`.
fn smallest_unused(used: &mut [u64]) -> u64 {
    used.sort_unstable();
    let mut candidate = 1;
    for &n in used.iter() {
        if n == candidate {
            candidate += 1;
        } else if n > candidate {
            break;
        }
    }
    candidate
}

/// Extracts `N` from `{prefix}N{suffix}`, where `N` is a positive integer.
fn parse_suffix(name: &str, prefix: &str, suffix: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().filter(|n| *n > 0)
}

/// Normalizes a client-claimed file name into a display name.
///
/// Keeps the last path segment, drops control characters and trims
/// surrounding whitespace. Returns `None` when nothing usable is left.
#[must_use]
pub fn sanitize_display_name(raw: &str) -> Option<String> {
    let last_segment = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = last_segment
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_CHARS)
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        None
    } else {
        Some(trimmed.to_string())
    }
}
