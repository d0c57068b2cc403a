use std::sync::Arc;

use grove_xpath::axis::Axis;
use grove_xpath::context::ExecutionContext;
use grove_xpath::eval::Evaluator;
use grove_xpath::expr::{Expr, ExprFactory, KindTest, NodeTest};
use grove_xpath::model::QName;
use grove_xpath::tree::{Document, NodeId};
use grove_xpath::value::Value;
use rstest::rstest;

/// <lib>
///   <book year="2001"><title>A</title></book>
///   <book year="2010"><title>B</title><!--note--></book>
///   <journal xmlns:j="urn:j"><j:title>C</j:title></journal>
///   <?render fast?>
/// </lib>
struct Fixture {
    doc: Arc<Document>,
    lib: NodeId,
    books: [NodeId; 2],
    titles: [NodeId; 2],
    journal: NodeId,
    jtitle: NodeId,
    comment: NodeId,
    pi: NodeId,
}

fn fixture() -> Fixture {
    let mut doc = Document::new();
    let root = doc.document_node();
    let lib = doc.create_element("lib");
    doc.append_child(root, lib).unwrap();

    let mut books = Vec::new();
    let mut titles = Vec::new();
    for (year, title) in [("2001", "A"), ("2010", "B")] {
        let book = doc.create_element("book");
        doc.append_child(lib, book).unwrap();
        let attr = doc.create_attribute("year", year);
        doc.set_attribute(book, attr).unwrap();
        let t = doc.create_element("title");
        doc.append_child(book, t).unwrap();
        let text = doc.create_text(title);
        doc.append_child(t, text).unwrap();
        books.push(book);
        titles.push(t);
    }
    let comment = doc.create_comment("note");
    doc.append_child(books[1], comment).unwrap();

    let journal = doc.create_element("journal");
    doc.append_child(lib, journal).unwrap();
    let jtitle = doc.create_element_ns(Some("j"), "title", "urn:j");
    doc.append_child(journal, jtitle).unwrap();
    let jtext = doc.create_text("C");
    doc.append_child(jtitle, jtext).unwrap();

    let pi = doc.create_pi("render", "fast");
    doc.append_child(lib, pi).unwrap();

    Fixture {
        doc: Arc::new(doc),
        lib,
        books: [books[0], books[1]],
        titles: [titles[0], titles[1]],
        journal,
        jtitle,
        comment,
        pi,
    }
}

fn eval_nodes(expr: &Expr, ctx: &mut ExecutionContext) -> Vec<NodeId> {
    match Evaluator::new().evaluate(expr, ctx).unwrap() {
        Value::Nodes(ns) => ns.iter().collect(),
        other => panic!("node-set expected, got {}", other.kind_name()),
    }
}

#[rstest]
fn absolute_child_steps() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "lib")));
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "book")));
    let expr = path.into_expr();

    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    assert_eq!(eval_nodes(&expr, &mut ctx), fx.books.to_vec());
}

#[rstest]
fn descendant_name_test_merges_across_origins() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "title")));
    let expr = path.into_expr();

    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    // The no-namespace name test does not select j:title.
    assert_eq!(eval_nodes(&expr, &mut ctx), fx.titles.to_vec());
}

#[rstest]
fn namespaced_and_wildcard_name_tests() {
    let fx = fixture();
    let f = ExprFactory::new();

    let mut by_ns = f.create_path_expr(true);
    by_ns.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    by_ns.add_step(f.create_step_expr(Axis::Child, f.create_name_test(Some("urn:j"), "title")));
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    assert_eq!(eval_nodes(&by_ns.into_expr(), &mut ctx), vec![fx.jtitle]);

    // ns:* — everything in urn:j.
    let mut ns_wild = f.create_path_expr(true);
    ns_wild.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    ns_wild.add_step(f.create_step_expr(Axis::Child, f.create_name_test(Some("urn:j"), "*")));
    assert_eq!(eval_nodes(&ns_wild.into_expr(), &mut ctx), vec![fx.jtitle]);

    // *:title — titles in any namespace.
    let mut local_wild = f.create_path_expr(true);
    local_wild.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    local_wild.add_step(f.create_step_expr(Axis::Child, f.create_local_wildcard_test("title")));
    assert_eq!(
        eval_nodes(&local_wild.into_expr(), &mut ctx),
        vec![fx.titles[0], fx.titles[1], fx.jtitle]
    );
}

#[rstest]
fn attribute_axis_uses_attribute_principal_kind() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(false);
    path.add_step(f.create_step_expr(Axis::Attribute, f.create_name_test(None, "year")));
    let expr = path.into_expr();

    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    ctx.set_current_node(Some(fx.books[0]));
    let attrs = eval_nodes(&expr, &mut ctx);
    assert_eq!(attrs.len(), 1);
    assert_eq!(fx.doc.value(attrs[0]), Some("2001"));
}

#[rstest]
fn kind_tests_select_comments_and_pis() {
    let fx = fixture();
    let f = ExprFactory::new();

    let mut comments = f.create_path_expr(true);
    comments.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    comments.add_step(f.create_step_expr(Axis::Child, f.create_kind_test(KindTest::Comment)));
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    assert_eq!(eval_nodes(&comments.into_expr(), &mut ctx), vec![fx.comment]);

    let mut pis = f.create_path_expr(true);
    pis.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    pis.add_step(f.create_step_expr(
        Axis::Child,
        f.create_kind_test(KindTest::ProcessingInstruction(Some("render".into()))),
    ));
    assert_eq!(eval_nodes(&pis.into_expr(), &mut ctx), vec![fx.pi]);

    let mut other_pi = f.create_path_expr(true);
    other_pi.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(KindTest::AnyKind),
    ));
    other_pi.add_step(f.create_step_expr(
        Axis::Child,
        f.create_kind_test(KindTest::ProcessingInstruction(Some("skip".into()))),
    ));
    assert!(eval_nodes(&other_pi.into_expr(), &mut ctx).is_empty());
}

#[rstest]
fn positional_predicates_count_in_axis_order() {
    let fx = fixture();
    let f = ExprFactory::new();

    // /lib/book[2]
    let mut second = f.create_path_expr(true);
    second.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "lib")));
    let mut step = f.create_step_expr(Axis::Child, f.create_name_test(None, "book"));
    step.add_predicate(f.create_integer_literal(2));
    second.add_step(step);
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    assert_eq!(eval_nodes(&second.into_expr(), &mut ctx), vec![fx.books[1]]);

    // ancestor::*[1] from a title is its book, not the outermost element.
    let mut nearest = f.create_path_expr(false);
    let mut anc = f.create_step_expr(Axis::Ancestor, f.create_name_test(None, "*"));
    anc.add_predicate(f.create_integer_literal(1));
    nearest.add_step(anc);
    ctx.set_current_node(Some(fx.titles[1]));
    assert_eq!(eval_nodes(&nearest.into_expr(), &mut ctx), vec![fx.books[1]]);
}

#[rstest]
fn position_counts_in_axis_order_on_reverse_axes() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));

    // ancestor::*[position()] is a tautology: position() equals the counting
    // index for every candidate, so every ancestor element survives.
    let mut all = f.create_path_expr(false);
    let mut step = f.create_step_expr(Axis::Ancestor, f.create_name_test(None, "*"));
    step.add_predicate(f.create_function_call(QName::local("position"), vec![]));
    all.add_step(step);
    ctx.set_current_node(Some(fx.titles[1]));
    assert_eq!(
        eval_nodes(&all.into_expr(), &mut ctx),
        vec![fx.lib, fx.books[1]]
    );

    // Same tautology on preceding-sibling.
    let mut sibs = f.create_path_expr(false);
    let mut step = f.create_step_expr(
        Axis::PrecedingSibling,
        f.create_kind_test(KindTest::AnyKind),
    );
    step.add_predicate(f.create_function_call(QName::local("position"), vec![]));
    sibs.add_step(step);
    ctx.set_current_node(Some(fx.journal));
    assert_eq!(eval_nodes(&sibs.into_expr(), &mut ctx), fx.books.to_vec());

    // The threaded position is predicate-scoped; it does not leak out.
    assert_eq!(ctx.context_position(), None);
}

#[rstest]
fn boolean_predicates_filter() {
    let fx = fixture();
    let f = ExprFactory::new();

    // /lib/book[attribute::year] keeps both; journal has no year.
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "lib")));
    let mut step = f.create_step_expr(Axis::Child, f.create_name_test(None, "*"));
    let mut pred_path = f.create_path_expr(false);
    pred_path.add_step(f.create_step_expr(Axis::Attribute, f.create_name_test(None, "year")));
    step.add_predicate(pred_path.into_expr());
    path.add_step(step);

    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    assert_eq!(eval_nodes(&path.into_expr(), &mut ctx), fx.books.to_vec());
}

#[rstest]
fn sibling_and_following_axes() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));

    let mut fs = f.create_path_expr(false);
    fs.add_step(f.create_step_expr(
        Axis::FollowingSibling,
        f.create_kind_test(KindTest::AnyKind),
    ));
    ctx.set_current_node(Some(fx.books[0]));
    assert_eq!(
        eval_nodes(&fs.into_expr(), &mut ctx),
        vec![fx.books[1], fx.journal, fx.pi]
    );

    let mut ps = f.create_path_expr(false);
    ps.add_step(f.create_step_expr(
        Axis::PrecedingSibling,
        f.create_kind_test(KindTest::AnyKind),
    ));
    ctx.set_current_node(Some(fx.journal));
    // Merged back into document order after traversal.
    assert_eq!(eval_nodes(&ps.into_expr(), &mut ctx), fx.books.to_vec());

    let mut following = f.create_path_expr(false);
    following.add_step(f.create_step_expr(
        Axis::Following,
        f.create_name_test(None, "title"),
    ));
    ctx.set_current_node(Some(fx.titles[0]));
    assert_eq!(eval_nodes(&following.into_expr(), &mut ctx), vec![fx.titles[1]]);

    let mut preceding = f.create_path_expr(false);
    preceding.add_step(f.create_step_expr(
        Axis::Preceding,
        f.create_name_test(None, "book"),
    ));
    ctx.set_current_node(Some(fx.journal));
    assert_eq!(eval_nodes(&preceding.into_expr(), &mut ctx), fx.books.to_vec());
}

#[rstest]
fn parent_and_self_axes() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));

    let mut parent = f.create_path_expr(false);
    parent.add_step(f.create_step_expr(Axis::Parent, f.create_kind_test(KindTest::AnyKind)));
    ctx.set_current_node(Some(fx.titles[0]));
    assert_eq!(eval_nodes(&parent.into_expr(), &mut ctx), vec![fx.books[0]]);

    let mut selfs = f.create_path_expr(false);
    selfs.add_step(f.create_step_expr(Axis::SelfAxis, f.create_name_test(None, "lib")));
    ctx.set_current_node(Some(fx.lib));
    assert_eq!(eval_nodes(&selfs.into_expr(), &mut ctx), vec![fx.lib]);

    // Name test misses: self is a book, not a lib.
    ctx.set_current_node(Some(fx.books[0]));
    let mut miss = f.create_path_expr(false);
    miss.add_step(f.create_step_expr(Axis::SelfAxis, f.create_name_test(None, "lib")));
    assert!(eval_nodes(&miss.into_expr(), &mut ctx).is_empty());
}

#[rstest]
fn relative_path_without_current_node_fails() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(false);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "*")));
    let mut ctx = ExecutionContext::new(fx.doc);
    assert!(Evaluator::new().evaluate(&path.into_expr(), &mut ctx).is_err());
}

#[rstest]
fn current_node_restored_after_path() {
    let fx = fixture();
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(false);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "*")));
    let expr = path.into_expr();
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    ctx.set_current_node(Some(fx.lib));
    let _ = eval_nodes(&expr, &mut ctx);
    assert_eq!(ctx.current_node(), Some(fx.lib));
    assert!(ctx.current_context_node_list().is_none());
    assert!(ctx.current_axis_cursor().is_none());
}

#[rstest]
fn name_test_ignores_non_principal_kinds() {
    let fx = fixture();
    let f = ExprFactory::new();
    // child::* under book[1] selects only the title element, not the comment.
    let mut path = f.create_path_expr(false);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "*")));
    let mut ctx = ExecutionContext::new(Arc::clone(&fx.doc));
    ctx.set_current_node(Some(fx.books[1]));
    assert_eq!(eval_nodes(&path.into_expr(), &mut ctx), vec![fx.titles[1]]);
}

#[rstest]
fn node_test_behavior_is_checked_structurally() {
    // NodeTest construction via the factory covers the wildcard forms.
    let f = ExprFactory::new();
    assert!(matches!(
        f.create_name_test(None, "*"),
        NodeTest::Name(grove_xpath::expr::NameTest::Any)
    ));
    assert!(matches!(
        f.create_name_test(Some("urn:x"), "*"),
        NodeTest::Name(grove_xpath::expr::NameTest::NsWildcard(_))
    ));
    assert!(matches!(
        f.create_name_test(Some("urn:x"), "item"),
        NodeTest::Name(grove_xpath::expr::NameTest::Name(_))
    ));
    assert!(matches!(
        f.create_name_test(None, "item"),
        NodeTest::Name(grove_xpath::expr::NameTest::Name(QName {
            ns_uri: None,
            ..
        }))
    ));
}
