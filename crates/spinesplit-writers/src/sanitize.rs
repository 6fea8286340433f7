//! `sanitize`: turn an arbitrary component name into a valid target
//! identifier (alnum and `_` only).

/// Replace every non-alphanumeric, non-underscore byte with `_`, and prefix
/// with `_` if the result would otherwise start with a digit (not a valid
/// identifier lead character on most targets).
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return out;
    }
    if out.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_non_identifier_characters() {
        assert_eq!(sanitize("P_sub0_1"), "P_sub0_1");
        assert_eq!(sanitize("P.sub0-1"), "P_sub0_1");
        assert_eq!(sanitize("P sub 0"), "P_sub_0");
    }

    #[test]
    fn prefixes_leading_digit() {
        assert_eq!(sanitize("0_sub1"), "_0_sub1");
    }

    #[test]
    fn empty_name_stays_empty() {
        assert_eq!(sanitize(""), "");
    }
}
