//! Tests for the in-memory tag tree

use nbt_tree::{Error, NbtValue, Tag, TagKind};

fn sample() -> Tag {
    let root = Tag::named_compound("root");
    root.add(Tag::named("byte", 7u8)).unwrap();
    root.add(Tag::named("int", 42)).unwrap();
    root.add(Tag::named("text", "hello")).unwrap();
    let list = Tag::named_list("list", Some(TagKind::Short));
    list.add(Tag::new(1i16)).unwrap();
    list.add(Tag::new(2i16)).unwrap();
    root.add(list).unwrap();
    let inner = Tag::named_compound("inner");
    inner.add(Tag::named("longs", vec![1i64, 2, 3])).unwrap();
    root.add(inner).unwrap();
    root
}

#[test]
fn test_add_sets_parent() {
    let root = Tag::named_compound("root");
    let child = Tag::named("x", 3);
    root.add(child.clone()).unwrap();
    let stored = root.get("x").unwrap().unwrap();
    assert!(stored.parent().unwrap().ptr_eq(&root));
    assert_eq!(stored.int_value().unwrap(), 3);
}

#[test]
fn test_add_parented_tag_fails_and_leaves_both_unchanged() {
    let first = Tag::named_compound("a");
    let second = Tag::named_compound("b");
    first.add(Tag::named("x", 1)).unwrap();
    let child = first.get("x").unwrap().unwrap();

    let err = second.add(child.clone()).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 0);
    assert!(child.parent().unwrap().ptr_eq(&first));
}

#[test]
fn test_compound_rejects_duplicate_names() {
    let root = Tag::named_compound("root");
    root.add(Tag::named("x", 1)).unwrap();
    let err = root.add(Tag::named("x", 2)).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
    assert_eq!(root.count(), 1);
    assert_eq!(root.get("x").unwrap().unwrap().int_value().unwrap(), 1);
}

#[test]
fn test_compound_rejects_unnamed_tags() {
    let root = Tag::compound();
    assert!(matches!(root.add(Tag::new(1)), Err(Error::Argument(_))));
}

#[test]
fn test_list_homogeneity() {
    let list = Tag::list(None);
    list.add(Tag::new(1)).unwrap();
    let err = list.add(Tag::new("")).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
    assert_eq!(list.list_kind().unwrap(), Some(TagKind::Int));
    assert_eq!(list.count(), 1);
}

#[test]
fn test_list_rejects_named_tags() {
    let list = Tag::list(Some(TagKind::Int));
    assert!(list.add(Tag::named("x", 1)).is_err());
    assert!(list.is_empty());
}

#[test]
fn test_end_typed_empty_list_adopts_first_kind() {
    let list = Tag::named_list("l", Some(TagKind::End));
    list.add(Tag::new(1.5f32)).unwrap();
    assert_eq!(list.list_kind().unwrap(), Some(TagKind::Float));
}

#[test]
fn test_self_containment_rejected() {
    let compound = Tag::named_compound("c");
    compound.add(Tag::named("probe", 0)).unwrap();
    let same = compound.get("probe").unwrap().unwrap().parent().unwrap();
    assert!(same.ptr_eq(&compound));
    assert!(matches!(compound.add(same), Err(Error::Argument(_))));
    assert_eq!(compound.count(), 1);

    let list = Tag::list(None);
    list.add(Tag::new(1)).unwrap();
    let same = list.get(0).unwrap().unwrap().parent().unwrap();
    assert!(matches!(list.add(same), Err(Error::Argument(_))));
    assert_eq!(list.count(), 1);
}

#[test]
fn test_ancestor_cannot_move_below_descendant() {
    let root = Tag::named_compound("root");
    let child = Tag::named_compound("child");
    root.add(child).unwrap();
    let child = root.get("child").unwrap().unwrap();
    let grandchild = Tag::named_compound("grandchild");
    child.add(grandchild).unwrap();
    let grandchild = child.get("grandchild").unwrap().unwrap();

    let root_again = child.parent().unwrap();
    let err = grandchild.add(root_again).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
    assert_eq!(grandchild.count(), 0);
}

#[test]
fn test_indexer_mismatch_is_invalid_operation() {
    let root = sample();
    assert!(matches!(root.get(0), Err(Error::InvalidOperation(_))));
    let list = root.get("list").unwrap().unwrap();
    assert!(matches!(list.get("x"), Err(Error::InvalidOperation(_))));
    assert!(matches!(list.get(5), Err(Error::Argument(_))));
    let int = root.get("int").unwrap().unwrap();
    assert!(matches!(int.get(0), Err(Error::InvalidOperation(_))));
}

#[test]
fn test_set_replaces_and_detaches() {
    let root = Tag::named_compound("root");
    root.add(Tag::named("x", 1)).unwrap();
    let old = root.get("x").unwrap().unwrap();
    root.set("x", Tag::named("x", 2)).unwrap();
    assert!(old.parent().is_none());
    assert_eq!(root.get("x").unwrap().unwrap().int_value().unwrap(), 2);

    assert!(matches!(
        root.set("y", Tag::named("z", 3)),
        Err(Error::Argument(_))
    ));
}

#[test]
fn test_list_set_checks_kind() {
    let list = Tag::list(Some(TagKind::Int));
    list.add(Tag::new(1)).unwrap();
    assert!(list.set(0, Tag::new("no")).is_err());
    list.set(0, Tag::new(9)).unwrap();
    assert_eq!(list.get(0).unwrap().unwrap().int_value().unwrap(), 9);
}

#[test]
fn test_rename_rekeys_compound() {
    let root = Tag::named_compound("root");
    root.add(Tag::named("a", 1)).unwrap();
    root.add(Tag::named("b", 2)).unwrap();
    let a = root.get("a").unwrap().unwrap();

    assert!(matches!(a.set_name(Some("b")), Err(Error::Argument(_))));
    assert!(matches!(a.set_name(None), Err(Error::Argument(_))));

    a.set_name(Some("c")).unwrap();
    assert!(!root.contains("a").unwrap());
    assert!(root.get("c").unwrap().unwrap().ptr_eq(&a));
}

#[test]
fn test_remove_and_clear_detach_children() {
    let root = sample();
    let int = root.get("int").unwrap().unwrap();
    let removed = root.remove("int").unwrap().unwrap();
    assert!(removed.ptr_eq(&int));
    assert!(int.parent().is_none());
    assert!(root.remove("int").unwrap().is_none());

    let list = root.get("list").unwrap().unwrap();
    let first = list.get(0).unwrap().unwrap();
    assert!(list.remove_tag(&first).unwrap());
    assert_eq!(list.count(), 1);

    list.clear().unwrap();
    assert!(list.is_empty());
    assert_eq!(list.list_kind().unwrap(), Some(TagKind::Short));
}

#[test]
fn test_list_insert_and_index_of() {
    let list = Tag::list(Some(TagKind::Int));
    list.add(Tag::new(1)).unwrap();
    list.add(Tag::new(3)).unwrap();
    list.insert(1, Tag::new(2)).unwrap();
    let values: Vec<i32> = list
        .children()
        .iter()
        .map(|tag| tag.int_value().unwrap())
        .collect();
    assert_eq!(values, [1, 2, 3]);

    let second = list.get(1).unwrap().unwrap();
    assert_eq!(list.index_of(&second).unwrap(), Some(1));
    assert!(list.insert(9, Tag::new(4)).is_err());
    let removed = list.remove_at(0).unwrap();
    assert_eq!(removed.int_value().unwrap(), 1);
}

#[test]
fn test_set_list_kind_on_non_empty_list() {
    let list = Tag::list(None);
    list.add(Tag::new(1)).unwrap();
    assert!(list.set_list_kind(Some(TagKind::Long)).is_err());
    list.set_list_kind(Some(TagKind::Int)).unwrap();
    list.clear().unwrap();
    list.set_list_kind(None).unwrap();
    assert_eq!(list.list_kind().unwrap(), None);
}

#[test]
fn test_typed_accessors_widen() {
    let byte = Tag::new(200u8);
    assert_eq!(byte.byte_value().unwrap(), 200);
    assert_eq!(byte.int_value().unwrap(), 200);
    assert_eq!(byte.double_value().unwrap(), 200.0);
    assert_eq!(byte.string_value().unwrap(), "200");

    let long = Tag::new(5i64);
    assert!(matches!(
        long.int_value(),
        Err(Error::InvalidCast { from: TagKind::Long, .. })
    ));
    assert_eq!(long.float_value().unwrap(), 5.0);

    let text = Tag::new("abc");
    assert!(text.int_value().is_err());
    assert_eq!(text.string_value().unwrap(), "abc");

    let compound = Tag::compound();
    assert!(matches!(
        compound.int_value(),
        Err(Error::InvalidCast { from: TagKind::Compound, .. })
    ));
}

#[test]
fn test_set_value_keeps_kind() {
    let tag = Tag::named("x", 1);
    tag.set_value(5).unwrap();
    assert_eq!(tag.int_value().unwrap(), 5);
    assert!(matches!(tag.set_value("five"), Err(Error::Argument(_))));
    assert_eq!(tag.value(), Some(NbtValue::Int(5)));
}

#[test]
fn test_empty_tags() {
    assert!(matches!(Tag::empty(TagKind::End), Err(Error::Argument(_))));
    assert_eq!(Tag::empty(TagKind::Int).unwrap().int_value().unwrap(), 0);
    assert_eq!(Tag::empty(TagKind::String).unwrap().string_value().unwrap(), "");
    assert!(Tag::empty(TagKind::LongArray).unwrap().long_array().unwrap().is_empty());
    assert_eq!(Tag::empty(TagKind::List).unwrap().list_kind().unwrap(), None);
    assert_eq!(Tag::empty(TagKind::Compound).unwrap().count(), 0);
}

#[test]
fn test_array_counts() {
    assert_eq!(Tag::new(vec![1u8, 2, 3]).count(), 3);
    assert_eq!(Tag::new(vec![1i32, 2]).count(), 2);
    assert_eq!(Tag::new(vec![1i64]).count(), 1);
    assert_eq!(Tag::new(1).count(), 0);
}

#[test]
fn test_clone_is_deep_and_detached() {
    let root = sample();
    let inner = root.get("inner").unwrap().unwrap();
    let copy = inner.clone();
    assert!(copy.parent().is_none());
    assert_eq!(copy, inner);
    assert!(!copy.ptr_eq(&inner));

    let copied_child = copy.get("longs").unwrap().unwrap();
    assert!(copied_child.parent().unwrap().ptr_eq(&copy));
    copied_child.set_value(vec![9i64]).unwrap();
    assert_eq!(
        inner.get("longs").unwrap().unwrap().long_array().unwrap(),
        [1, 2, 3]
    );
    assert_ne!(copy, inner);
}

#[test]
fn test_equality_is_structural() {
    assert_eq!(sample(), sample());
    let other = sample();
    other.get("int").unwrap().unwrap().set_value(43).unwrap();
    assert_ne!(sample(), other);
    assert_ne!(Tag::named("a", 1), Tag::named("b", 1));
}

#[test]
fn test_path() {
    let root = sample();
    let short = root.get("list").unwrap().unwrap().get(1).unwrap().unwrap();
    assert_eq!(short.path(), "root.list[1]");
    let longs = root.get("inner").unwrap().unwrap().get("longs").unwrap().unwrap();
    assert_eq!(longs.path(), "root.inner.longs");
    assert_eq!(Tag::new(1).path(), "");
}

#[test]
fn test_names_and_contains() {
    let root = sample();
    let mut names = root.names().unwrap();
    names.sort();
    assert_eq!(names, ["byte", "inner", "int", "list", "text"]);
    assert!(root.contains("text").unwrap());
    assert!(root.get("list").unwrap().unwrap().contains("x").is_err());
}

#[test]
fn test_display() {
    let root = Tag::named_compound("root");
    root.add(Tag::named("x", 3)).unwrap();
    let list = Tag::named_list("l", Some(TagKind::String));
    list.add(Tag::new("a")).unwrap();
    root.add(list).unwrap();

    let expected = "TAG_Compound(\"root\"): 2 entries {\n  \
                    TAG_List(\"l\"): 1 entries of TAG_String {\n    \
                    TAG_String: \"a\"\n  \
                    }\n  \
                    TAG_Int(\"x\"): 3\n\
                    }";
    assert_eq!(root.to_string(), expected);
    assert!(root.to_string_indented("\t").contains("\n\tTAG_Int(\"x\"): 3"));
}

#[test]
fn test_add_all_stops_at_first_failure() {
    let root = Tag::named_compound("root");
    let result = root.add_all([Tag::named("a", 1), Tag::new(2), Tag::named("c", 3)]);
    assert!(result.is_err());
    assert_eq!(root.count(), 1);
}
