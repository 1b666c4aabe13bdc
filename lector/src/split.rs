//! Splitting paragraphs at a literal marker.

use memchr::memmem;

use crate::markup::{Fragment, Node};

/// Default paragraph split marker.
pub const DEFAULT_SPLIT_MARKER: &str = "StartAbsatz";

/// Split `node` at every occurrence of `marker` in its direct text runs.
///
/// Returns one element per segment (occurrences + 1), each with the
/// original tag. The first segment keeps all attributes; later ones get
/// them without `id`, which must stay unique. Child elements stay in their
/// segment. The original tail goes on the last segment. Markers inside child
/// elements are not considered.
pub fn split_on_marker(node: &Node, marker: &str) -> Vec<Node> {
    if marker.is_empty() {
        return vec![node.clone()];
    }

    let mut segments: Vec<Vec<Fragment>> = vec![Vec::new()];
    for fragment in node.content() {
        match fragment {
            Fragment::Text(text) => {
                let mut rest = text.as_str();
                while let Some(index) = memmem::find(rest.as_bytes(), marker.as_bytes()) {
                    push_text(&mut segments, &rest[..index]);
                    segments.push(Vec::new());
                    rest = &rest[index + marker.len()..];
                }
                push_text(&mut segments, rest);
            }
            fragment => {
                if let Some(current) = segments.last_mut() {
                    current.push(fragment);
                }
            }
        }
    }

    let mut siblings: Vec<Node> = segments
        .into_iter()
        .enumerate()
        .map(|(index, fragments)| {
            let attributes = node
                .attributes
                .iter()
                .filter(|(name, _)| index == 0 || name != "id")
                .cloned()
                .collect();
            let mut sibling = Node {
                tag: node.tag.clone(),
                attributes,
                ..Node::default()
            };
            sibling.set_content(fragments);
            sibling
        })
        .collect();
    if let Some(last) = siblings.last_mut() {
        last.tail = node.tail.clone();
    }
    siblings
}

fn push_text(segments: &mut [Vec<Fragment>], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(current) = segments.last_mut() {
        current.push(Fragment::Text(text.to_string()));
    }
}

/// Split every `tag` element below `parent` at `marker`, in place.
///
/// A trailing segment with no content (marker at the very end) is dropped.
/// Returns the number of elements that contained the marker.
pub fn split_paragraphs(parent: &mut Node, tag: &str, marker: &str) -> usize {
    let mut split_count = 0;
    let children = std::mem::take(&mut parent.children);

    for mut child in children {
        split_count += split_paragraphs(&mut child, tag, marker);
        if child.tag != tag {
            parent.children.push(child);
            continue;
        }

        let mut parts = split_on_marker(&child, marker);
        if parts.len() > 1 {
            split_count += 1;
        }
        if parts.len() > 1 && parts.last().is_some_and(Node::has_no_content) {
            if let Some(dropped) = parts.pop() {
                if let Some(last) = parts.last_mut() {
                    last.tail = dropped.tail;
                }
            }
        }
        parent.children.extend(parts);
    }

    split_count
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::sample::Index;

    use super::*;
    use crate::markup::{parse_document, strategies};

    const MARKER: &str = "§§";

    /// Insert `MARKER` into the direct text runs of `root`; returns the count.
    fn insert_markers(root: &mut Node, places: &[(Index, Index)]) -> usize {
        for (run, position) in places {
            let run = run.index(root.children.len() + 1);
            let text = match run {
                0 => &mut root.text,
                n => &mut root.children[n - 1].tail,
            };
            let boundaries: Vec<usize> = text
                .char_indices()
                .map(|(i, _)| i)
                .chain([text.len()])
                .collect();
            text.insert_str(boundaries[position.index(boundaries.len())], MARKER);
        }
        places.len()
    }

    fn split(xml: &str) -> Vec<String> {
        let node = parse_document(xml).unwrap();
        split_on_marker(&node, DEFAULT_SPLIT_MARKER)
            .iter()
            .map(Node::to_markup)
            .collect()
    }

    #[test]
    fn test_split_single_marker() {
        assert_eq!(
            split("<p>Erster StartAbsatz Zweiter</p>"),
            vec!["<p>Erster </p>", "<p> Zweiter</p>"]
        );
    }

    #[test]
    fn test_no_marker_gives_one_element() {
        assert_eq!(split("<p class=\"a\">Text</p>"), vec!["<p class=\"a\">Text</p>"]);
    }

    #[test]
    fn test_id_stays_on_first_segment() {
        assert_eq!(
            split("<p id=\"x\" class=\"a\">a StartAbsatz b StartAbsatz c</p>"),
            vec![
                "<p id=\"x\" class=\"a\">a </p>",
                "<p class=\"a\"> b </p>",
                "<p class=\"a\"> c</p>"
            ]
        );
    }

    #[test]
    fn test_children_stay_in_segment() {
        assert_eq!(
            split("<p><b>x</b> one StartAbsatz two <i>y</i> three</p>"),
            vec!["<p><b>x</b> one </p>", "<p> two <i>y</i> three</p>"]
        );
    }

    #[test]
    fn test_marker_in_tail_text() {
        assert_eq!(
            split("<p>a<b>x</b>StartAbsatzc</p>"),
            vec!["<p>a<b>x</b></p>", "<p>c</p>"]
        );
    }

    #[test]
    fn test_trailing_marker_yields_empty_segment() {
        assert_eq!(split("<p>a StartAbsatz</p>"), vec!["<p>a </p>", "<p />"]);
    }

    #[test]
    fn test_marker_inside_child_is_ignored() {
        assert_eq!(
            split("<p>a <b>StartAbsatz</b> c</p>"),
            vec!["<p>a <b>StartAbsatz</b> c</p>"]
        );
    }

    #[test]
    fn test_split_paragraphs_in_document() {
        let mut root = parse_document(
            "<article><p>a StartAbsatz b</p>\n<div><p>c StartAbsatz</p></div></article>",
        )
        .unwrap();
        let count = split_paragraphs(&mut root, "p", DEFAULT_SPLIT_MARKER);
        assert_eq!(count, 2);
        assert_eq!(
            root.to_markup(),
            "<article><p>a </p><p> b</p>\n<div><p>c </p></div></article>"
        );
    }

    #[test]
    fn test_split_paragraphs_keeps_tail_when_dropping_empty_segment() {
        let mut root = parse_document("<a><p>x StartAbsatz</p> tail</a>").unwrap();
        split_paragraphs(&mut root, "p", DEFAULT_SPLIT_MARKER);
        assert_eq!(root.to_markup(), "<a><p>x </p> tail</a>");
    }

    proptest! {
        #[test]
        fn prop_markers_give_one_more_sibling(
            mut root in strategies::document(),
            places in prop::collection::vec(any::<(Index, Index)>(), 0..6),
        ) {
            let markers = insert_markers(&mut root, &places);
            prop_assert_eq!(split_on_marker(&root, MARKER).len(), markers + 1);
        }

        #[test]
        fn prop_siblings_concatenate_to_unmarked_content(
            original in strategies::document(),
            places in prop::collection::vec(any::<(Index, Index)>(), 0..6),
        ) {
            let mut marked = original.clone();
            insert_markers(&mut marked, &places);

            let siblings = split_on_marker(&marked, MARKER);
            let mut rebuilt = Node::new(original.tag.clone());
            rebuilt.set_content(siblings.iter().flat_map(Node::content));
            prop_assert_eq!(rebuilt, original);
        }

        #[test]
        fn prop_no_marker_is_identity(root in strategies::document()) {
            prop_assert_eq!(split_on_marker(&root, MARKER), vec![root]);
        }
    }

    #[test]
    fn test_split_paragraphs_without_markers_is_identity() {
        let xml = "<a><p>x</p><p>y <b>z</b></p></a>";
        let mut root = parse_document(xml).unwrap();
        assert_eq!(split_paragraphs(&mut root, "p", DEFAULT_SPLIT_MARKER), 0);
        assert_eq!(root.to_markup(), xml);
    }
}
