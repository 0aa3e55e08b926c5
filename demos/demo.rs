use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::FmtSubscriber;

use treepath::{FindResult, Node, Path, Result};


fn child(parent: &Node, label: &str, value: Option<&str>) -> Node {
	let node = Node::make_tree(Some(label), value, parent);
	parent.push_child(node.clone());
	node
}

/// A little /etc/hosts-like configuration tree:
///
/// files/etc/hosts/1/{ipaddr, canonical}
/// files/etc/hosts/2/{ipaddr, canonical}
fn build_tree() -> Node {
	let root = Node::root();
	let files = child(&root, "files", None);
	let etc = child(&files, "etc", None);
	let hosts = child(&etc, "hosts", None);

	let one = child(&hosts, "1", None);
	child(&one, "ipaddr", Some("127.0.0.1"));
	child(&one, "canonical", Some("localhost"));

	let two = child(&hosts, "2", None);
	child(&two, "ipaddr", Some("192.168.0.1"));
	child(&two, "canonical", Some("gateway"));

	root
}

pub fn main() -> Result<()> {
	let subscriber = FmtSubscriber::builder()
		.with_max_level(Level::TRACE)
		.with_file(false)
		.with_line_number(true)
		.finish();

	set_global_default(subscriber).expect("setting default subscriber failed");

	let root = build_tree();

	// Enumerate every host entry.
	let mut entries = Path::parse(&root, "/files/etc/hosts/*")?;
	let mut cur = entries.first();
	while let Some(node) = cur {
		println!("entry {:?}", node.label());
		cur = entries.next();
	}

	// Find the canonical name of the gateway entry.
	let mut gateway = Path::parse(
		&root,
		"/files/etc/hosts/*[ipaddr = \"192.168.0.1\"]/canonical",
	)?;
	match gateway.find_one() {
		FindResult::One(node) => println!("gateway canonical = {:?}", node.value()),
		other => println!("gateway lookup: {:?}", other),
	}

	// Position-based selection.
	let mut last_entry = Path::parse(&root, "/files/etc/hosts/*[position() = last()]")?;
	println!("last entry: {:?}", last_entry.first());

	// Grow the tree along a path that does not exist yet.
	let mut alias = Path::parse(&root, "/files/etc/hosts/2/alias")?;
	let created = alias.expand_tree().expect("expand failed");
	created.set_value(Some("gw"));
	println!("created {:?}", created);

	Ok(())
}
