use crate::defs::ModifierRecord;
use crate::stats::StatBlock;

/// Builds a variant name.
///
/// Prefixes are space-joined before the base name. The first suffix follows the
/// base name as written; later suffixes are joined with `" and "` after dropping
/// their own leading `"of "`, giving `"Imp of Blight and Embers"`.
pub fn compose_name(prefixes: &[&str], base: &str, suffixes: &[&str]) -> String {
    let mut name = String::new();
    for prefix in prefixes {
        name.push_str(prefix);
        name.push(' ');
    }
    name.push_str(base);

    for (index, suffix) in suffixes.iter().enumerate() {
        if index == 0 {
            name.push(' ');
            name.push_str(suffix);
        } else {
            name.push_str(" and ");
            name.push_str(strip_of(suffix));
        }
    }
    name
}

fn strip_of(suffix: &str) -> &str {
    match suffix.get(..3) {
        Some(head) if head.eq_ignore_ascii_case("of ") => &suffix[3..],
        _ => suffix,
    }
}

/// Base stats plus the summed `stat_modifiers` of every modifier. Missing base
/// stats count as 0; no clamping is applied.
pub fn merge_stats<'a>(
    base: &StatBlock,
    modifiers: impl IntoIterator<Item = &'a ModifierRecord>,
) -> StatBlock {
    let mut stats = base.clone();
    for modifier in modifiers {
        stats.apply(&modifier.stat_modifiers);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_prefix_and_suffix() {
        assert_eq!(
            compose_name(&["Brave"], "Imp", &["of Blight"]),
            "Brave Imp of Blight"
        );
    }

    #[test]
    fn multiple_suffixes_join_with_and() {
        assert_eq!(
            compose_name(&[], "Imp", &["of Blight", "of Embers"]),
            "Imp of Blight and Embers"
        );
        assert_eq!(
            compose_name(&["Brave", "Rotten"], "Imp", &["of Blight", "Reborn"]),
            "Brave Rotten Imp of Blight and Reborn"
        );
    }

    #[test]
    fn bare_name_is_unchanged() {
        assert_eq!(compose_name(&[], "Imp", &[]), "Imp");
    }
}
