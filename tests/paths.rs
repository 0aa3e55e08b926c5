// End-to-end checks of the public surface: parse, enumerate, match
// uniquely and expand, against a small fixed tree.

use treepath::{ErrorCode, ExpandError, FindResult, Node, Path};


fn child(parent: &Node, label: &str, value: Option<&str>) -> Node {
	let node = Node::make_tree(Some(label), value, parent);
	parent.push_child(node.clone());
	node
}

/// root ── a(=1){ b(=x), b(=y) }, a(=2){ c(=x) }
fn sample_tree() -> Node {
	let root = Node::root();
	let a1 = child(&root, "a", Some("1"));
	child(&a1, "b", Some("x"));
	child(&a1, "b", Some("y"));
	let a2 = child(&root, "a", Some("2"));
	child(&a2, "c", Some("x"));
	root
}

fn all_values(root: &Node, txt: &str) -> Vec<Option<String>> {
	let mut path = Path::parse(root, txt).unwrap();
	let mut values = Vec::new();
	let mut cur = path.first();
	while let Some(node) = cur {
		values.push(node.value());
		cur = path.next();
	}
	values
}

fn some(v: &str) -> Option<String> {
	Some(v.to_string())
}


#[test]
fn select_all_children_by_name() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "/a"), vec![some("1"), some("2")]);
}

#[test]
fn filter_by_child_existence() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "/a[b]"), vec![some("1")]);
}

#[test]
fn filter_by_position() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "/a[2]"), vec![some("2")]);
}

#[test]
fn filter_by_own_value() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "/a/b[. = \"y\"]"), vec![some("y")]);
}

#[test]
fn double_slash_finds_deep_nodes() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "//c"), vec![some("x")]);
}

#[test]
fn last_works_as_a_predicate_but_not_top_level() {
	let root = sample_tree();

	let err = Path::parse(&root, "last() + 1 = 3").unwrap_err();
	assert_eq!(err.code, ErrorCode::Type);

	assert_eq!(all_values(&root, "/a[last() + 1 = 3]"), vec![some("1"), some("2")]);
}

#[test]
fn enumeration_is_stable() {
	let root = sample_tree();
	let mut path = Path::parse(&root, "//b").unwrap();

	let first = path.first().unwrap();
	let second = path.next().unwrap();
	assert_eq!(path.next(), None);

	assert_eq!(path.first(), Some(first.clone()));
	assert_eq!(path.next(), Some(second));
	assert_eq!(path.first(), Some(first));
}

#[test]
fn find_one_distinguishes_cardinality() {
	let root = sample_tree();

	assert_eq!(
		Path::parse(&root, "/a").unwrap().find_one(),
		FindResult::Multiple
	);
	assert_eq!(
		Path::parse(&root, "/q").unwrap().find_one(),
		FindResult::NoMatch
	);
	match Path::parse(&root, "/a[1]").unwrap().find_one() {
		FindResult::One(node) => assert_eq!(node.value(), some("1")),
		other => panic!("expected one match, got {:?}", other),
	}
}

#[test]
fn parse_errors_carry_code_and_offset() {
	let root = Node::root();

	for (txt, code) in [
		("1 +", ErrorCode::Name),
		("'unterminated", ErrorCode::Delim),
		("a[", ErrorCode::Pred),
		("foo()", ErrorCode::Name),
		("last(1)", ErrorCode::Delim),
		("a + \"s\"", ErrorCode::Type),
		("a]", ErrorCode::Paren),
	] {
		let err = Path::parse(&root, txt).unwrap_err();
		assert_eq!(err.code, code, "for {:?}", txt);
		assert!(err.pos <= txt.len());
		assert!(!err.code.message().is_empty());
	}
}

#[test]
fn expand_creates_only_whats_missing() {
	let root = sample_tree();

	// Exact match: nothing created.
	let a2_children = root.children()[1].children().len();
	let mut exact = Path::parse(&root, "/a[2]/c").unwrap();
	let c = exact.expand_tree().unwrap();
	assert_eq!(c.value(), some("x"));
	assert_eq!(root.children()[1].children().len(), a2_children);

	// Suffix below the unique prefix gets created.
	let mut fresh = Path::parse(&root, "/a[2]/c/alias/name").unwrap();
	let leaf = fresh.expand_tree().unwrap();
	assert_eq!(leaf.label(), Some("name"));
	assert_eq!(leaf.parent().label(), Some("alias"));
	assert_eq!(leaf.parent().parent(), c);
}

#[test]
fn failed_expansion_leaves_no_trace() {
	let root = sample_tree();
	let a1 = root.first_child().unwrap();
	let before = a1.children().len();

	let mut path = Path::parse(&root, "/a[1]/zz/descendant::w").unwrap();
	assert!(matches!(path.expand_tree(), Err(ExpandError::IllegalStep)));
	assert_eq!(a1.children().len(), before);

	let mut ambiguous = Path::parse(&root, "/a/b/new").unwrap();
	assert!(matches!(
		ambiguous.expand_tree(),
		Err(ExpandError::MultipleMatches)
	));
	assert_eq!(a1.children().len(), before);
}

#[test]
fn escaped_names_round_trip() {
	let root = Node::root();
	child(&root, "weird/label", Some("v"));

	assert_eq!(all_values(&root, r"/weird\/label"), vec![some("v")]);
}

#[test]
fn numeric_node_names_need_an_explicit_step() {
	let root = Node::root();
	child(&root, "42", Some("answer"));

	// '42' alone is the number 42, which is not a location path.
	assert_eq!(
		Path::parse(&root, "42").unwrap_err().code,
		ErrorCode::Type
	);
	assert_eq!(all_values(&root, "./42"), vec![some("answer")]);
	assert_eq!(all_values(&root, "child::42"), vec![some("answer")]);
}

#[test]
fn wildcards_match_any_name() {
	let root = sample_tree();
	assert_eq!(all_values(&root, "/*/*").len(), 3);
}
