use grove_xpath::nodeset::NodeSet;
use grove_xpath::tree::{Document, NodeId};
use rstest::rstest;

/// A flat document with `n` element children under the document element.
fn flat_doc(n: usize) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let root = doc.document_node();
    let top = doc.create_element("top");
    doc.append_child(root, top).unwrap();
    let mut kids = Vec::with_capacity(n);
    for i in 0..n {
        let e = doc.create_element(format!("e{i}"));
        doc.append_child(top, e).unwrap();
        kids.push(e);
    }
    (doc, kids)
}

fn ranks(set: &NodeSet, doc: &Document) -> Vec<u32> {
    set.iter().map(|n| doc.rank(n).unwrap()).collect()
}

#[rstest]
fn insertion_keeps_document_order() {
    let (doc, kids) = flat_doc(5);
    let mut set = NodeSet::new();
    // Insert out of order.
    for &i in &[3usize, 0, 4, 1, 2] {
        assert!(set.add_node_in_order(kids[i], &doc).unwrap());
    }
    let r = ranks(&set, &doc);
    assert!(r.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(set.first(), Some(kids[0]));
}

#[rstest]
fn insertion_is_idempotent() {
    let (doc, kids) = flat_doc(3);
    let mut set = NodeSet::new();
    assert!(set.add_node_in_order(kids[1], &doc).unwrap());
    assert!(!set.add_node_in_order(kids[1], &doc).unwrap());
    assert_eq!(set.len(), 1);
}

#[rstest]
fn unranked_nodes_are_rejected() {
    let mut doc = Document::new();
    let orphan = doc.create_element("orphan");
    let mut set = NodeSet::new();
    assert!(set.add_node_in_order(orphan, &doc).is_err());
}

#[rstest]
fn binary_search_path_matches_linear_path() {
    // More than the linear-scan cutoff to reach the binary-search branch.
    let (doc, kids) = flat_doc(40);
    let mut set = NodeSet::new();
    for &k in kids.iter().rev() {
        set.add_node_in_order(k, &doc).unwrap();
    }
    // Duplicates still detected at this size.
    assert!(!set.add_node_in_order(kids[20], &doc).unwrap());
    assert_eq!(set.len(), 40);
    let r = ranks(&set, &doc);
    assert!(r.windows(2).all(|w| w[0] < w[1]));
}

#[rstest]
fn union_is_commutative_and_dedups() {
    let (doc, kids) = flat_doc(6);
    let mut a = NodeSet::new();
    let mut b = NodeSet::new();
    for &k in &[kids[0], kids[2], kids[4]] {
        a.add_node_in_order(k, &doc).unwrap();
    }
    for &k in &[kids[2], kids[3], kids[5]] {
        b.add_node_in_order(k, &doc).unwrap();
    }
    let ab = a.union(&b, &doc).unwrap();
    let ba = b.union(&a, &doc).unwrap();
    assert_eq!(ab, ba);
    assert_eq!(ab.len(), 5);
    let r = ranks(&ab, &doc);
    assert!(r.windows(2).all(|w| w[0] < w[1]));
}

#[rstest]
fn intersect_and_except() {
    let (doc, kids) = flat_doc(6);
    let mut a = NodeSet::new();
    let mut b = NodeSet::new();
    for &k in &kids[0..4] {
        a.add_node_in_order(k, &doc).unwrap();
    }
    for &k in &kids[2..6] {
        b.add_node_in_order(k, &doc).unwrap();
    }
    let both = a.intersect(&b, &doc).unwrap();
    assert_eq!(both.as_slice(), &kids[2..4]);
    let only_a = a.except(&b, &doc).unwrap();
    assert_eq!(only_a.as_slice(), &kids[0..2]);
    let only_b = b.except(&a, &doc).unwrap();
    assert_eq!(only_b.as_slice(), &kids[4..6]);
}

#[rstest]
fn empty_set_edges() {
    let (doc, kids) = flat_doc(2);
    let empty = NodeSet::new();
    let mut a = NodeSet::new();
    a.add_node_in_order(kids[0], &doc).unwrap();

    assert_eq!(a.union(&empty, &doc).unwrap(), a);
    assert!(a.intersect(&empty, &doc).unwrap().is_empty());
    assert_eq!(a.except(&empty, &doc).unwrap(), a);
    assert!(empty.except(&a, &doc).unwrap().is_empty());
    assert_eq!(empty.first(), None);
}

#[rstest]
fn position_and_contains() {
    let (doc, kids) = flat_doc(4);
    let mut set = NodeSet::new();
    for &k in &kids {
        set.add_node_in_order(k, &doc).unwrap();
    }
    assert_eq!(set.position_of(kids[2]), Some(2));
    assert!(set.contains(kids[3]));
    assert_eq!(set.get(1), Some(kids[1]));
    assert_eq!(set.get(9), None);
}
