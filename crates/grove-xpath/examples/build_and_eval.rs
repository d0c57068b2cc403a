//! Build a small document, then run a few expressions against it.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;
use grove_xpath::axis::Axis;
use grove_xpath::context::{ExecutionContextBuilder, IdResolver};
use grove_xpath::eval::Evaluator;
use grove_xpath::expr::ExprFactory;
use grove_xpath::model::QName;
use grove_xpath::tree::{Document, NodeId};
use grove_xpath::value::Value;

struct MapResolver {
    ids: HashMap<CompactString, NodeId>,
}

impl IdResolver for MapResolver {
    fn element_by_id(&self, token: &str, _doc: &Document) -> Option<NodeId> {
        self.ids.get(token).copied()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // <catalog>
    //   <entry id="rust">Systems</entry>
    //   <entry id="xml">Markup</entry>
    // </catalog>
    let mut doc = Document::new();
    let root = doc.document_node();
    let catalog = doc.create_element("catalog");
    doc.append_child(root, catalog)?;
    let mut ids = HashMap::new();
    for (id, body) in [("rust", "Systems"), ("xml", "Markup")] {
        let entry = doc.create_element("entry");
        doc.append_child(catalog, entry)?;
        let attr = doc.create_attribute("id", id);
        doc.set_attribute(entry, attr)?;
        let text = doc.create_text(body);
        doc.append_child(entry, text)?;
        ids.insert(CompactString::from(id), entry);
    }
    let doc = Arc::new(doc);

    let mut ctx = ExecutionContextBuilder::new(Arc::clone(&doc))
        .with_id_resolver(Arc::new(MapResolver { ids }))
        .build();
    let evaluator = Evaluator::new();
    let f = ExprFactory::new();

    // /catalog/entry
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "catalog")));
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "entry")));
    let entries = evaluator.evaluate(&path.into_expr(), &mut ctx)?;
    if let Value::Nodes(ns) = &entries {
        for node in ns.iter() {
            println!("entry: {}", doc.string_value(node));
        }
    }

    // count(/catalog/entry)
    let mut path = f.create_path_expr(true);
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "catalog")));
    path.add_step(f.create_step_expr(Axis::Child, f.create_name_test(None, "entry")));
    let count = f.create_function_call(QName::local("count"), vec![path.into_expr()]);
    println!("count: {:?}", evaluator.evaluate(&count, &mut ctx)?);

    // id("xml rust") comes back in document order.
    let by_id = f.create_function_call(
        QName::local("id"),
        vec![f.create_string_literal("xml rust")],
    );
    if let Value::Nodes(ns) = evaluator.evaluate(&by_id, &mut ctx)? {
        for node in ns.iter() {
            println!("id hit: {}", doc.string_value(node));
        }
    }

    Ok(())
}
