//! Match highlighting for rendered search results

use super::fold;

/// A run of text that either matches the query or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub is_match: bool,
}

impl<'a> Segment<'a> {
    fn plain(text: &'a str) -> Self {
        Self { text, is_match: false }
    }

    fn matched(text: &'a str) -> Self {
        Self { text, is_match: true }
    }
}

/// Split `text` into segments, flagging every case-insensitive occurrence of `query`
///
/// Matches are found left to right and never overlap. Concatenating the
/// segments gives back `text` unchanged. A blank query yields the whole text
/// as one plain segment.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let needle: Vec<char> = fold(query.trim()).chars().collect();

    if needle.is_empty() {
        return if text.is_empty() { Vec::new() } else { vec![Segment::plain(text)] };
    }

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        if let Some(len) = match_len(&text[pos..], &needle) {
            if plain_start < pos {
                segments.push(Segment::plain(&text[plain_start..pos]));
            }
            segments.push(Segment::matched(&text[pos..pos + len]));
            pos += len;
            plain_start = pos;
        } else {
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }
    }

    if plain_start < text.len() {
        segments.push(Segment::plain(&text[plain_start..]));
    }

    segments
}

/// Byte length of the shortest prefix of `rest` whose case fold starts with `needle`
///
/// A character that folds to several chars (`İ` to `i̇`) is highlighted
/// whole even when the needle ends inside its fold.
fn match_len(rest: &str, needle: &[char]) -> Option<usize> {
    let mut matched = 0;

    for (offset, ch) in rest.char_indices() {
        for lower in ch.to_lowercase() {
            if matched == needle.len() {
                break;
            }
            if needle[matched] != lower {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(offset + ch.len_utf8());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|s| if s.is_match { format!("[{}]", s.text) } else { s.text.to_string() })
            .collect()
    }

    #[test]
    fn marks_every_occurrence_case_insensitively() {
        let segments = highlight("Dérivabilité et dérivée", "DÉRIV");
        assert_eq!(render(&segments), "[Dériv]abilité et [dériv]ée");
    }

    #[test]
    fn arabic_text() {
        let segments = highlight("دراسة مفهوم الحقيقة والمعرفة في الفلسفة", "فلسفة");
        assert_eq!(render(&segments), "دراسة مفهوم الحقيقة والمعرفة في ال[فلسفة]");
    }

    #[test]
    fn needle_ending_inside_a_multi_char_fold() {
        // 'İ' folds to "i\u{307}"
        assert_eq!(render(&highlight("İstanbul", "i")), "[İ]stanbul");
        assert_eq!(render(&highlight("İstanbul", "i\u{307}s")), "[İs]tanbul");
        assert!(crate::search::fold("İstanbul").contains('i'));
    }

    #[test]
    fn blank_query_yields_plain_text() {
        assert_eq!(highlight("Primitive", "   "), vec![Segment::plain("Primitive")]);
        assert!(highlight("", "").is_empty());
    }

    #[test]
    fn no_match_yields_plain_text() {
        assert_eq!(highlight("Primitive", "suite"), vec![Segment::plain("Primitive")]);
    }

    #[test]
    fn matches_do_not_overlap() {
        assert_eq!(render(&highlight("aaaa", "aa")), "[aa][aa]");
    }

    #[test]
    fn query_is_trimmed() {
        assert_eq!(render(&highlight("Limite d'une suite", "  suite ")), "Limite d'une [suite]");
    }

    #[test]
    fn segments_rebuild_original() {
        let text = "La Boîte à merveilles, BOÎTE";
        let rebuilt: String = highlight(text, "boîte").iter().map(|s| s.text).collect();
        assert_eq!(rebuilt, text);
    }
}
