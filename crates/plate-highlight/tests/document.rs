use std::sync::Arc;

use plate_highlight::{
    AttrValue, Document, Editor, Node, NodeSchema, Path, Position, Range, Selection, TextNode,
};

fn doc() -> Document {
    Document::new(vec![
        Node::element(
            "paragraph",
            vec![
                Node::text("ab"),
                Node::void("mention"),
                TextNode::new("cd").with_attr("highlight", "yellow").into(),
            ],
        ),
        Node::element("blockquote", vec![Node::paragraph("quoted")]),
    ])
}

#[test]
fn text_blocks_are_found_through_containers() {
    let doc = doc();
    let paths: Vec<Path> = doc.text_blocks().into_iter().map(|b| b.path).collect();
    assert_eq!(paths, vec![vec![0], vec![1, 0]]);
    assert!(doc.block(&[1]).is_none());
}

#[test]
fn spans_count_void_leaves_as_one() {
    let doc = doc();
    let block = doc.block(&[0]).unwrap();
    let spans: Vec<(usize, usize)> = block.spans().iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 2), (2, 3), (3, 5)]);
    assert_eq!(block.inline_len(), 5);
}

#[test]
fn covered_spans_clip_to_range_across_blocks() {
    let doc = doc();
    let range = Range::new(Position::new(vec![0], 1), Position::new(vec![1, 0], 3));
    let spans: Vec<(Path, usize, usize)> = doc
        .covered_spans(&range)
        .into_iter()
        .map(|s| (s.block_path, s.start, s.end))
        .collect();
    assert_eq!(
        spans,
        vec![
            (vec![0], 1, 2),
            (vec![0], 2, 3),
            (vec![0], 3, 5),
            (vec![1, 0], 0, 3),
        ]
    );
}

#[test]
fn caret_attribute_prefers_text_before_caret() {
    let doc = doc();
    assert_eq!(
        doc.attribute_at_caret(&[0], 4, "highlight"),
        Some(&AttrValue::from("yellow"))
    );
    assert_eq!(doc.attribute_at_caret(&[0], 1, "highlight"), None);
    assert_eq!(doc.attribute_at_caret(&[0], 3, "highlight"), None);
}

#[test]
fn editor_normalizes_equal_leaves_and_keeps_one_leaf() {
    let doc = Document::new(vec![
        Node::element(
            "paragraph",
            vec![
                Node::text("a"),
                Node::text(""),
                Node::text("b"),
                TextNode::new("c").with_attr("highlight", "green").into(),
            ],
        ),
        Node::paragraph(""),
    ]);
    let selection = Selection::collapsed(Position::new(vec![0], 0));
    let editor = Editor::new(doc, selection, Arc::new(NodeSchema::core()));

    assert_eq!(
        editor.doc().children,
        vec![
            Node::element(
                "paragraph",
                vec![
                    Node::text("ab"),
                    TextNode::new("c").with_attr("highlight", "green").into(),
                ],
            ),
            Node::paragraph(""),
        ]
    );
}

#[test]
fn positions_order_by_block_then_offset() {
    let a = Position::new(vec![0], 5);
    let b = Position::new(vec![1], 0);
    let c = Position::new(vec![1, 0], 0);
    assert!(a < b);
    assert!(b < c);
    assert!(Position::new(vec![1], 2) < Position::new(vec![1], 3));
}

#[test]
fn range_orders_its_endpoints() {
    let range = Range::new(Position::new(vec![0], 4), Position::new(vec![0], 1));
    assert_eq!(range.start.offset, 1);
    assert_eq!(range.end.offset, 4);
    assert!(range.contains(&Position::new(vec![0], 2)));
    assert!(!range.contains(&Position::new(vec![1], 0)));
}

#[test]
fn collapsed_covers_empty_and_single_caret() {
    assert!(Selection::default().is_collapsed());
    assert!(Selection::collapsed(Position::new(vec![0], 3)).is_collapsed());
    assert!(!Selection::single(Range::in_block(vec![0], 0, 2)).is_collapsed());

    let two_carets = Selection::from_ranges([
        Range::collapsed(Position::new(vec![0], 1)),
        Range::collapsed(Position::new(vec![0], 2)),
    ]);
    assert!(!two_carets.is_collapsed());
}

#[test]
fn between_tracks_direction() {
    let sel = Selection::between(Position::new(vec![0], 4), Position::new(vec![0], 1));
    assert!(sel.is_backward());
    assert_eq!(sel.ranges()[0], Range::in_block(vec![0], 1, 4));
}

#[test]
fn selection_attribute_is_uniform_or_none() {
    let doc = Document::new(vec![Node::element(
        "paragraph",
        vec![
            TextNode::new("aa").with_attr("highlight", "yellow").into(),
            TextNode::new("bb").with_attr("highlight", "green").into(),
        ],
    )]);

    let first = Selection::single(Range::in_block(vec![0], 0, 2));
    assert_eq!(
        first.attribute(&doc, "highlight"),
        Some(&AttrValue::from("yellow"))
    );
    assert_eq!(
        doc.attribute_in_ranges(first.ranges(), "highlight"),
        Some(&AttrValue::from("yellow"))
    );

    let mixed = Selection::single(Range::in_block(vec![0], 1, 3));
    assert_eq!(mixed.attribute(&doc, "highlight"), None);

    let caret = Selection::collapsed(Position::new(vec![0], 3));
    assert_eq!(
        caret.attribute(&doc, "highlight"),
        Some(&AttrValue::from("green"))
    );
}
