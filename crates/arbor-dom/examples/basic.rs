//! Example: Basic usage of arbor DOM
//!
//! Run with `RUST_LOG=arbor_dom=debug` to see the structural edits.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_dom::{Config, DomTree, MutationObserverInit};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = DomTree::with_config(Config::default());
    println!("arbor DOM v{}", arbor_dom::VERSION);

    let doc = tree.create_document();
    let note = tree.create_element(doc, "note");
    tree.append_child(doc, note)?;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let observer = tree.create_mutation_observer(move |_, records, _| {
        for record in records {
            log.borrow_mut().push(format!("{:?} on {:?}", record.mutation_type, record.target));
        }
        Ok(())
    });
    tree.observe(
        observer,
        note,
        MutationObserverInit {
            child_list: true,
            attributes: Some(true),
            character_data: Some(true),
            subtree: true,
            ..Default::default()
        },
    )?;

    let body = tree.create_text_node(doc, "Hello, world");
    tree.append_child(note, body)?;
    tree.set_attribute(note, "lang", "en")?;

    // Keep a live range on "world" across the split
    let range = tree.create_range(doc);
    tree.set_start(range, body, 7)?;
    tree.set_end(range, body, 12)?;
    let tail = tree.split_text(body, 5)?;

    let r = tree.range(range).ok_or_else(|| anyhow::anyhow!("range detached"))?;
    println!(
        "range now {:?}:{} .. {:?}:{} (tail node {:?})",
        r.start_container(),
        r.start_offset(),
        r.end_container(),
        r.end_offset(),
        tail
    );

    let delivered = tree.perform_microtask_checkpoint();
    println!("ran {} microtask(s)", delivered);
    for line in seen.borrow().iter() {
        println!("  {}", line);
    }

    println!("text content: {:?}", tree.text_content(note));
    Ok(())
}
