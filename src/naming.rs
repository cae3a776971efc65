//! Command name normalization.

/// Placeholder capital emitted for a name with a leading underscore.
const LEADING_UNDERSCORE: char = 'X';

/// Convert a snake_case command name into a `CamelCase` dispatch identifier.
///
/// Underscores are dropped and the first character of each underscore-delimited
/// segment is upper-cased. Everything else, digit runs included, is kept
/// verbatim. A leading underscore becomes a leading `X` so the identifier
/// still starts with a capital letter.
///
/// # Examples
///
/// ```
/// use ampframe::naming::normalize_command;
///
/// assert_eq!(normalize_command("list_peer"), "ListPeer");
/// assert_eq!(normalize_command("get_v2_status"), "GetV2Status");
/// assert_eq!(normalize_command("_private"), "XPrivate");
/// ```
#[must_use]
pub fn normalize_command(name: &str) -> String {
    let mut identifier = String::with_capacity(name.len() + 1);
    if name.starts_with('_') {
        identifier.push(LEADING_UNDERSCORE);
    }
    for segment in name.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            identifier.extend(first.to_uppercase());
            identifier.push_str(chars.as_str());
        }
    }
    identifier
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::normalize_command;

    #[rstest]
    #[case("list_peer", "ListPeer")]
    #[case("listpeer", "Listpeer")]
    #[case("ListPeer", "ListPeer")]
    #[case("peer_2", "Peer2")]
    #[case("v2_check", "V2Check")]
    #[case("a__b", "AB")]
    #[case("trailing_", "Trailing")]
    #[case("_ask", "XAsk")]
    #[case("_", "X")]
    #[case("", "")]
    fn normalizes(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(normalize_command(name), expected);
    }
}
