pub const LABEL_DISPLAY_CHARS: usize = 10;

/// Shortens a label to `max_chars` characters, appending "..." when cut.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let mut chars = label.chars();
    let head = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Picks the next free default label: `base`, then `base1`-style numbering
/// continuing from the highest numeric suffix already in use.
pub fn next_default_label<'a>(
    base: &str,
    separator: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut any_taken = false;
    let mut highest = 0u64;

    for label in existing {
        let Some(rest) = label.strip_prefix(base) else {
            continue;
        };
        any_taken = true;

        let suffix = rest.strip_prefix(separator).unwrap_or(rest);
        if !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit()) {
            highest = highest.max(suffix.parse().unwrap_or(0));
        }
    }

    if any_taken {
        format!("{base}{separator}{}", highest.saturating_add(1))
    } else {
        base.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_are_kept() {
        assert_eq!(truncate_label("Limits", 10), "Limits");
        assert_eq!(truncate_label("0123456789", 10), "0123456789");
    }

    #[test]
    fn long_labels_are_cut_on_char_boundaries() {
        assert_eq!(truncate_label("Integration by parts", 10), "Integratio...");
        assert_eq!(truncate_label("微积分基本定理与应用实例分析", 10), "微积分基本定理与应用...");
    }

    #[test]
    fn first_default_label_is_the_base() {
        assert_eq!(next_default_label("New node", " ", ["Limits", "Series"]), "New node");
    }

    #[test]
    fn default_labels_continue_after_highest_suffix() {
        let existing = ["New node", "New node 4", "New node 2", "Limits"];
        assert_eq!(next_default_label("New node", " ", existing), "New node 5");

        let existing = ["新节点", "新节点3"];
        assert_eq!(next_default_label("新节点", "", existing), "新节点4");
    }

    #[test]
    fn non_numeric_suffixes_count_as_taken() {
        let existing = ["New node draft"];
        assert_eq!(next_default_label("New node", " ", existing), "New node 1");
    }
}
