use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use grove_xpath::axis::Axis;
use grove_xpath::context::ExecutionContext;
use grove_xpath::eval::Evaluator;
use grove_xpath::expr::ExprFactory;
use grove_xpath::nodeset::NodeSet;
use grove_xpath::tree::{Document, NodeId};
use std::sync::Arc;

/// A balanced tree: `width` sections, each with `width` items.
fn build_document(width: usize) -> (Arc<Document>, Vec<NodeId>) {
    let mut doc = Document::new();
    let root = doc.document_node();
    let top = doc.create_element("root");
    doc.append_child(root, top).expect("append failure");
    let mut leaves = Vec::new();
    for s in 0..width {
        let section = doc.create_element("section");
        doc.append_child(top, section).expect("append failure");
        let attr = doc.create_attribute("name", format!("s{s}"));
        doc.set_attribute(section, attr).expect("attr failure");
        for i in 0..width {
            let item = doc.create_element("item");
            doc.append_child(section, item).expect("append failure");
            let text = doc.create_text(format!("{i}"));
            doc.append_child(item, text).expect("append failure");
            leaves.push(item);
        }
    }
    (Arc::new(doc), leaves)
}

fn benchmark_ordered_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("nodeset/add_node_in_order");
    for width in [8usize, 32, 64] {
        let (doc, leaves) = build_document(width);
        group.bench_with_input(BenchmarkId::from_parameter(width * width), &width, |b, _| {
            b.iter(|| {
                let mut set = NodeSet::new();
                // Reverse insertion is the worst case for ordered placement.
                for &leaf in leaves.iter().rev() {
                    set.add_node_in_order(black_box(leaf), &doc)
                        .expect("insert failure");
                }
                black_box(set);
            })
        });
    }
    group.finish();
}

fn benchmark_union_merge(c: &mut Criterion) {
    let (doc, leaves) = build_document(64);
    let mut evens = NodeSet::new();
    let mut odds = NodeSet::new();
    for (i, &leaf) in leaves.iter().enumerate() {
        let target = if i % 2 == 0 { &mut evens } else { &mut odds };
        target.add_node_in_order(leaf, &doc).expect("insert failure");
    }
    c.bench_function("nodeset/union_merge", |b| {
        b.iter(|| {
            let merged = evens.union(black_box(&odds), &doc).expect("merge failure");
            black_box(merged);
        })
    });
}

fn benchmark_descendant_path(c: &mut Criterion) {
    let (doc, _) = build_document(32);
    let f = ExprFactory::new();
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(
        Axis::DescendantOrSelf,
        f.create_kind_test(grove_xpath::expr::KindTest::AnyKind),
    ));
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "item")));
    let expr = path.into_expr();
    let evaluator = Evaluator::new();

    c.bench_function("evaluator/descendant_items", |b| {
        b.iter(|| {
            let mut ctx = ExecutionContext::new(Arc::clone(&doc));
            let out = evaluator
                .evaluate(black_box(&expr), &mut ctx)
                .expect("evaluation failure");
            black_box(out);
        })
    });
}

criterion_group!(
    benches,
    benchmark_ordered_insert,
    benchmark_union_merge,
    benchmark_descendant_path
);
criterion_main!(benches);
