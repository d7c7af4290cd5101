//! Structural edit primitives: ranged removal, unit deletion with block
//! merging, insertion, block split policies and character formatting.

use pretty_assertions::assert_eq;
use textloom_engine::selection::edit;
use textloom_engine::{
    DocumentTree, ElementKind, HeadingTag, Point, PointKind, RangeSelection, Selection,
    TextFormat, TextFormatKind,
};

fn two_paragraphs(a: &str, b: &str) -> (DocumentTree, [textloom_engine::NodeKey; 4]) {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let p1 = tree.create_paragraph();
    let t1 = tree.create_text(a);
    let p2 = tree.create_paragraph();
    let t2 = tree.create_text(b);
    tree.append(root, p1).unwrap();
    tree.append(p1, t1).unwrap();
    tree.append(root, p2).unwrap();
    tree.append(p2, t2).unwrap();
    (tree, [p1, t1, p2, t2])
}

#[test]
fn ranged_removal_within_one_text_node_collapses_to_start() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("hello world", "x");
    let mut sel = RangeSelection::new(Point::text(t1, 2), Point::text(t1, 8));
    edit::remove_ranged_content(&mut tree, &mut sel);
    assert_eq!(tree.text_content(p1), "herld");
    assert!(sel.is_collapsed());
    assert_eq!(sel.anchor, Point::text(t1, 2));
}

#[test]
fn ranged_removal_across_blocks_merges_the_remainder() {
    let (mut tree, [p1, t1, p2, t2]) = two_paragraphs("hello", "world");
    let mut sel = RangeSelection::new(Point::text(t1, 2), Point::text(t2, 3));
    edit::remove_ranged_content(&mut tree, &mut sel);
    assert_eq!(tree.text_content(tree.root()), "held");
    assert!(!tree.contains(p2));
    assert_eq!(tree.parent(t2), Some(p1));
    assert!(sel.is_collapsed());
    assert_eq!(sel.anchor, Point::text(t1, 2));
}

#[test]
fn backward_ranges_remove_the_same_span() {
    let (mut tree, [_, t1, _, t2]) = two_paragraphs("hello", "world");
    // Focus before anchor: a backward drag.
    let mut sel = RangeSelection::new(Point::text(t2, 3), Point::text(t1, 2));
    assert!(sel.is_backward(&tree));
    edit::remove_ranged_content(&mut tree, &mut sel);
    assert_eq!(tree.text_content(tree.root()), "held");
}

#[test]
fn delete_character_consumes_one_grapheme_backward() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("héllo", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 3));
    let replacement = edit::delete_character(&mut tree, &mut sel, true);
    assert!(replacement.is_none());
    assert_eq!(tree.text_content(p1), "hllo");
    assert_eq!(sel.anchor, Point::text(t1, 1));
}

#[test]
fn delete_character_at_block_front_merges_into_previous_block() {
    let (mut tree, [p1, t1, p2, t2]) = two_paragraphs("ab", "cd");
    let mut sel = RangeSelection::collapsed(Point::text(t2, 0));
    let replacement = edit::delete_character(&mut tree, &mut sel, true);
    assert!(replacement.is_none());
    assert!(!tree.contains(p2));
    assert_eq!(tree.children(p1), &[t1, t2]);
    assert_eq!(tree.text_content(p1), "abcd");
    // Caret at the join: canonically the start of the moved text.
    assert_eq!(sel.anchor, Point::text(t2, 0));
}

#[test]
fn forward_delete_at_block_end_consumes_empty_mergeable_neighbor() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let p1 = tree.create_paragraph();
    let t1 = tree.create_text("ab");
    let quote = tree.create_quote();
    tree.append(root, p1).unwrap();
    tree.append(p1, t1).unwrap();
    tree.append(root, quote).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(t1, 2));
    let replacement = edit::delete_character(&mut tree, &mut sel, false);
    assert!(replacement.is_none());
    assert!(!tree.contains(quote));
    assert_eq!(tree.text_content(root), "ab");
    assert_eq!(sel.anchor, Point::text(t1, 2));
}

#[test]
fn delete_toward_block_decorator_selects_it_whole() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let p1 = tree.create_paragraph();
    let t1 = tree.create_text("ab");
    let decorator = tree.create_decorator(false, false);
    tree.append(root, p1).unwrap();
    tree.append(p1, t1).unwrap();
    tree.append(root, decorator).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(t1, 2));
    let replacement = edit::delete_character(&mut tree, &mut sel, false);
    match replacement {
        Some(Selection::Node(nodes)) => assert_eq!(nodes.keys(), &[decorator]),
        other => panic!("expected a whole-node selection, got {other:?}"),
    }
    // Nothing was removed yet; deleting the selected node is step two.
    assert!(tree.contains(decorator));
}

#[test]
fn inline_decorator_is_removed_directly() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let p1 = tree.create_paragraph();
    let t1 = tree.create_text("ab");
    let emoji = tree.create_decorator(true, false);
    tree.append(root, p1).unwrap();
    tree.append(p1, t1).unwrap();
    tree.append(p1, emoji).unwrap();

    let mut sel = RangeSelection::collapsed(Point::element(p1, 2));
    let replacement = edit::delete_character(&mut tree, &mut sel, true);
    assert!(replacement.is_none());
    assert!(!tree.contains(emoji));
    assert_eq!(tree.children(p1), &[t1]);
}

#[test]
fn collapse_at_start_of_empty_heading_becomes_paragraph() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let heading = tree.create_heading(HeadingTag::H1);
    tree.append(root, heading).unwrap();

    let mut sel = RangeSelection::collapsed(Point::element(heading, 0));
    let replacement = edit::delete_character(&mut tree, &mut sel, true);
    assert!(replacement.is_none());
    assert!(!tree.contains(heading));
    let new_block = tree.children(root)[0];
    assert_eq!(tree.node(new_block).element().kind(), ElementKind::Paragraph);
    assert_eq!(sel.anchor, Point::element(new_block, 0));
}

#[test]
fn collapse_at_start_of_quote_rehomes_children_under_paragraph() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let quote = tree.create_quote();
    let text = tree.create_text("quoted");
    tree.append(root, quote).unwrap();
    tree.append(quote, text).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(text, 0));
    let replacement = edit::delete_character(&mut tree, &mut sel, true);
    assert!(replacement.is_none());
    assert!(!tree.contains(quote));
    let new_block = tree.children(root)[0];
    assert_eq!(tree.node(new_block).element().kind(), ElementKind::Paragraph);
    assert_eq!(tree.children(new_block), &[text]);
    assert_eq!(sel.anchor, Point::text(text, 0));
}

#[test]
fn delete_word_takes_the_previous_word() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("hello brave world", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 11));
    edit::delete_word(&mut tree, &mut sel, true);
    assert_eq!(tree.text_content(p1), "hello  world");
    assert_eq!(sel.anchor, Point::text(t1, 6));

    // With trailing whitespace before the caret, the space goes too.
    let mut sel = RangeSelection::collapsed(Point::text(t1, 7));
    edit::delete_word(&mut tree, &mut sel, true);
    assert_eq!(tree.text_content(p1), " world");
}

#[test]
fn delete_word_forward_takes_the_next_word() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("hello brave world", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 5));
    edit::delete_word(&mut tree, &mut sel, false);
    assert_eq!(tree.text_content(p1), "hello world");
    assert_eq!(sel.anchor, Point::text(t1, 5));
}

#[test]
fn delete_line_stops_at_the_line_break_then_consumes_it() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let p = tree.create_paragraph();
    let first = tree.create_text("abc");
    let brk = tree.create_line_break();
    let second = tree.create_text("def");
    tree.append(root, p).unwrap();
    tree.append(p, first).unwrap();
    tree.append(p, brk).unwrap();
    tree.append(p, second).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(second, 3));
    edit::delete_line(&mut tree, &mut sel, true);
    assert_eq!(tree.text_content(p), "abc\n");
    assert!(tree.contains(brk));

    edit::delete_line(&mut tree, &mut sel, true);
    assert_eq!(tree.text_content(p), "abc");
    assert!(!tree.contains(brk));
}

#[test]
fn insert_text_splices_at_the_caret() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("held", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 2));
    edit::insert_text(&mut tree, &mut sel, "llo wor");
    assert_eq!(tree.text_content(p1), "hello world");
    assert_eq!(sel.anchor, Point::text(t1, 9));
}

#[test]
fn insert_text_with_pending_format_creates_a_styled_node() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("ab", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 1));
    sel.format = TextFormat::NONE.with(TextFormatKind::Bold);
    edit::insert_text(&mut tree, &mut sel, "X");

    assert_eq!(tree.text_content(p1), "aXb");
    let children = tree.children(p1).to_vec();
    assert_eq!(children.len(), 3);
    let styled = children[1];
    assert!(tree.node(styled).text().format().has(TextFormatKind::Bold));
    assert_eq!(sel.anchor, Point::text(styled, 1));
}

#[test]
fn insert_line_break_splits_the_text_node() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("ab", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 1));
    edit::insert_line_break(&mut tree, &mut sel, false);
    assert_eq!(tree.text_content(p1), "a\nb");
    // Caret at the start of the right half.
    assert_eq!(sel.anchor.kind, PointKind::Text);
    assert_eq!(sel.anchor.offset, 0);
    assert_eq!(tree.text_content(sel.anchor.key), "b");
}

#[test]
fn insert_tab_lands_the_caret_after_the_marker() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("ab", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 2));
    edit::insert_tab(&mut tree, &mut sel);
    assert_eq!(tree.text_content(p1), "ab\t");
    assert_eq!(sel.anchor, Point::element(p1, 2));
}

#[test]
fn insert_paragraph_on_heading_start_replaces_and_moves_content() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let heading = tree.create_heading(HeadingTag::H2);
    let title = tree.create_text("Title");
    tree.append(root, heading).unwrap();
    tree.append(heading, title).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(title, 0));
    let new_block = edit::insert_paragraph(&mut tree, &mut sel).unwrap();

    let children = tree.children(root).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(
        tree.node(children[0]).element().kind(),
        ElementKind::Paragraph
    );
    assert!(tree.is_empty_element(children[0]));
    assert_eq!(children[1], new_block);
    assert_eq!(
        tree.node(new_block).element().kind(),
        ElementKind::Heading(HeadingTag::H2)
    );
    assert_eq!(tree.children(new_block), &[title]);
    // Caret ends in the new block.
    assert_eq!(sel.anchor, Point::text(title, 0));

    insta::assert_snapshot!(tree.dump(), @r#"
root
  p
  h2
    text "Title"
"#);
}

#[test]
fn insert_paragraph_at_heading_end_continues_as_paragraph() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let heading = tree.create_heading(HeadingTag::H3);
    let title = tree.create_text("Title");
    tree.append(root, heading).unwrap();
    tree.append(heading, title).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(title, 5));
    let new_block = edit::insert_paragraph(&mut tree, &mut sel).unwrap();

    assert_eq!(
        tree.node(new_block).element().kind(),
        ElementKind::Paragraph
    );
    assert_eq!(tree.children(root), &[heading, new_block]);
    assert_eq!(tree.text_content(heading), "Title");
    assert_eq!(sel.anchor, Point::element(new_block, 0));
}

#[test]
fn insert_paragraph_mid_heading_continues_the_heading() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let heading = tree.create_heading(HeadingTag::H2);
    let title = tree.create_text("AB");
    tree.append(root, heading).unwrap();
    tree.append(heading, title).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(title, 1));
    let new_block = edit::insert_paragraph(&mut tree, &mut sel).unwrap();

    assert_eq!(
        tree.node(new_block).element().kind(),
        ElementKind::Heading(HeadingTag::H2)
    );
    assert_eq!(tree.text_content(heading), "A");
    assert_eq!(tree.text_content(new_block), "B");
}

#[test]
fn insert_paragraph_after_quote_continues_as_paragraph() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let quote = tree.create_quote();
    let text = tree.create_text("quoted");
    tree.append(root, quote).unwrap();
    tree.append(quote, text).unwrap();

    let mut sel = RangeSelection::collapsed(Point::text(text, 6));
    let new_block = edit::insert_paragraph(&mut tree, &mut sel).unwrap();
    assert_eq!(
        tree.node(new_block).element().kind(),
        ElementKind::Paragraph
    );
    assert_eq!(tree.text_content(quote), "quoted");
}

#[test]
fn format_text_splits_partially_covered_nodes() {
    let (mut tree, [p1, t1, ..]) = two_paragraphs("hello world", "x");
    let mut sel = RangeSelection::new(Point::text(t1, 0), Point::text(t1, 5));
    edit::format_text(&mut tree, &mut sel, TextFormatKind::Bold);

    let children = tree.children(p1).to_vec();
    assert_eq!(children.len(), 2);
    assert!(tree.node(children[0]).text().format().has(TextFormatKind::Bold));
    assert!(!tree.node(children[1]).text().format().has(TextFormatKind::Bold));
    assert_eq!(tree.text_content(children[0]), "hello");
    assert!(sel.has_format(&tree, TextFormatKind::Bold));

    // Toggling again over the same span clears it.
    edit::format_text(&mut tree, &mut sel, TextFormatKind::Bold);
    let first = tree.children(p1)[0];
    assert!(!tree.node(first).text().format().has(TextFormatKind::Bold));
}

#[test]
fn format_text_spanning_blocks_covers_both_sides() {
    let (mut tree, [_, t1, _, t2]) = two_paragraphs("hello", "world");
    let mut sel = RangeSelection::new(Point::text(t1, 3), Point::text(t2, 2));
    edit::format_text(&mut tree, &mut sel, TextFormatKind::Italic);

    let t1_parent = tree.parent(t1).unwrap();
    let right_of_t1 = tree.children(t1_parent)[1];
    assert!(!tree.node(t1).text().format().has(TextFormatKind::Italic));
    assert!(
        tree.node(right_of_t1)
            .text()
            .format()
            .has(TextFormatKind::Italic)
    );
    let t2_parent = tree.parent(t2).unwrap();
    let left_of_t2 = tree.children(t2_parent)[0];
    assert!(tree.node(left_of_t2).text().format().has(TextFormatKind::Italic));
    assert_eq!(tree.text_content(left_of_t2), "wo");
}

#[test]
fn collapsed_toggle_only_touches_the_pending_format() {
    let (mut tree, [_, t1, ..]) = two_paragraphs("hello", "x");
    let mut sel = RangeSelection::collapsed(Point::text(t1, 2));
    edit::format_text(&mut tree, &mut sel, TextFormatKind::Uppercase);
    assert!(sel.format.has(TextFormatKind::Uppercase));
    assert!(!tree.node(t1).text().format().has(TextFormatKind::Uppercase));

    // Case transforms stay mutually exclusive on the pending mask.
    edit::format_text(&mut tree, &mut sel, TextFormatKind::Capitalize);
    assert!(sel.format.has(TextFormatKind::Capitalize));
    assert!(!sel.format.has(TextFormatKind::Uppercase));
}

#[test]
fn delete_nodes_leaves_a_caret_near_the_removal() {
    let (mut tree, [p1, _, p2, _]) = two_paragraphs("ab", "cd");
    let mut nodes = textloom_engine::NodeSelection::new();
    nodes.add(p2);
    let next = edit::delete_nodes(&mut tree, &nodes);
    assert!(!tree.contains(p2));
    match next {
        Selection::Range(range) => {
            assert!(range.is_collapsed());
            range.anchor.assert_valid(&tree);
        }
        other => panic!("expected a caret, got {other:?}"),
    }
    assert_eq!(tree.children(tree.root()), &[p1]);
}
