//! Tests for the streaming reader

use nbt_tree::{Endianness, Error, NbtReader, NbtValue, NbtWriter, ReaderState, Tag, TagKind};

/// root { a: Int 1, list: [Int 10, Int 20], c: { d: "x" }, e: Long 5 }
fn document() -> Vec<u8> {
    let mut w = NbtWriter::new(Vec::new(), "root").unwrap();
    w.write_int(Some("a"), 1).unwrap();
    w.begin_list(Some("list"), TagKind::Int, 2).unwrap();
    w.write_int(None, 10).unwrap();
    w.write_int(None, 20).unwrap();
    w.end_list().unwrap();
    w.begin_compound(Some("c")).unwrap();
    w.write_string(Some("d"), "x").unwrap();
    w.end_compound().unwrap();
    w.write_long(Some("e"), 5).unwrap();
    w.end_compound().unwrap();
    w.finish().unwrap();
    w.into_inner()
}

#[test]
fn test_walk_in_document_order() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert_eq!(r.state(), ReaderState::Fresh);

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_kind(), Some(TagKind::Compound));
    assert_eq!(r.tag_name(), Some("root"));
    assert_eq!(r.root_name(), Some("root"));
    assert_eq!(r.depth(), 1);
    assert_eq!(r.parent_kind(), None);
    assert_eq!(r.state(), ReaderState::Positioned);

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("a"));
    assert_eq!(r.tag_kind(), Some(TagKind::Int));
    assert_eq!(r.depth(), 2);
    assert_eq!(r.parent_name(), Some("root"));
    assert_eq!(r.parent_kind(), Some(TagKind::Compound));
    assert!(r.has_value());
    assert!(!r.is_list_element());

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("list"));
    assert!(r.is_list());
    assert!(r.has_length());
    assert_eq!(r.list_kind(), Some(TagKind::Int));
    assert_eq!(r.tag_length(), 2);

    assert!(r.read_to_following(None).unwrap());
    assert!(r.is_list_element());
    assert!(!r.has_name());
    assert_eq!(r.list_index(), Some(0));
    assert_eq!(r.depth(), 3);
    assert_eq!(r.parent_name(), Some("list"));
    assert_eq!(r.parent_tag_length(), 2);

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.list_index(), Some(1));
    assert_eq!(r.read_value_as::<i32>().unwrap(), 20);

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("c"));
    assert!(r.is_compound());
    assert_eq!(r.depth(), 2);

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("d"));
    assert_eq!(r.depth(), 3);
    assert_eq!(r.parent_name(), Some("c"));

    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("e"));
    assert_eq!(r.depth(), 2);

    assert!(!r.read_to_following(None).unwrap());
    assert!(r.is_at_stream_end());
    assert_eq!(r.state(), ReaderState::AtEndOfStream);
    assert_eq!(r.tags_read(), 8);
    assert_eq!(r.position() as usize, bytes.len());
    assert!(!r.read_to_following(None).unwrap());
}

#[test]
fn test_read_to_following_by_name() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("d")).unwrap());
    assert_eq!(r.read_value().unwrap(), NbtValue::String("x".into()));
    assert!(!r.read_to_following(Some("missing")).unwrap());
    assert!(r.is_at_stream_end());
}

#[test]
fn test_end_tags_reported_when_not_skipped() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    r.set_skip_end_tags(false);
    assert!(!r.skip_end_tags());
    let mut kinds = Vec::new();
    while r.read_to_following(None).unwrap() {
        kinds.push(r.tag_kind().unwrap());
    }
    assert_eq!(
        kinds,
        [
            TagKind::Compound,
            TagKind::Int,
            TagKind::List,
            TagKind::Int,
            TagKind::Int,
            TagKind::Compound,
            TagKind::String,
            TagKind::End,
            TagKind::Long,
            TagKind::End,
        ]
    );
}

#[test]
fn test_read_to_descendant() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_descendant("d").unwrap());
    assert_eq!(r.parent_name(), Some("c"));

    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("c")).unwrap());
    assert!(!r.read_to_descendant("e").unwrap());
    assert!(!r.is_at_stream_end());
    assert_eq!(r.tag_kind(), Some(TagKind::End));
    assert_eq!(r.tag_name(), None);
    // The search stopped at the end of "c"; the walk resumes after it.
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("e"));

    // Only containers have descendants.
    assert!(!r.read_to_descendant("anything").unwrap());
}

#[test]
fn test_read_to_next_sibling() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_next_sibling(None).unwrap());
    assert_eq!(r.tag_name(), Some("root"));

    assert!(r.read_to_following(Some("a")).unwrap());
    assert!(r.read_to_next_sibling(None).unwrap());
    assert_eq!(r.tag_name(), Some("list"));

    assert!(r.read_to_next_sibling(Some("e")).unwrap());
    assert_eq!(r.tag_name(), Some("e"));
    assert_eq!(r.depth(), 2);

    assert!(!r.read_to_next_sibling(None).unwrap());
    assert!(!r.is_at_stream_end());
    assert!(!r.read_to_following(None).unwrap());
    assert!(r.is_at_stream_end());
}

#[test]
fn test_next_sibling_inside_list() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.list_index(), Some(0));
    assert!(r.read_to_next_sibling(None).unwrap());
    assert_eq!(r.list_index(), Some(1));
    assert_eq!(r.read_value_as::<i64>().unwrap(), 20);
    assert!(!r.read_to_next_sibling(None).unwrap());
}

#[test]
fn test_skip_counts_tags() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    assert_eq!(r.skip().unwrap(), 3);
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("c"));
    assert_eq!(r.skip().unwrap(), 2);
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("e"));
    assert_eq!(r.skip().unwrap(), 1);
    assert!(!r.read_to_following(None).unwrap());
    assert_eq!(r.tags_read(), 8);
}

#[test]
fn test_skip_root_from_fresh_reader() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert_eq!(r.skip().unwrap(), 8);
    assert!(r.is_at_stream_end());
    assert_eq!(r.skip().unwrap(), 0);
}

#[test]
fn test_read_as_tag() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("c")).unwrap());
    let c = r.read_as_tag().unwrap();
    assert_eq!(c.name().as_deref(), Some("c"));
    assert!(c.parent().is_none());
    assert_eq!(c.get("d").unwrap().unwrap().string_value().unwrap(), "x");

    // Reading a tag moves on to the one after it.
    assert_eq!(r.tag_name(), Some("e"));
    let e = r.read_as_tag().unwrap();
    assert_eq!(e, Tag::named("e", 5i64));
    assert!(r.is_at_stream_end());
}

#[test]
fn test_read_as_tag_walks_siblings() {
    let mut w = NbtWriter::new(Vec::new(), "root").unwrap();
    w.write_int(Some("a"), 1).unwrap();
    w.write_int(Some("b"), 2).unwrap();
    w.begin_compound(Some("c")).unwrap();
    w.end_compound().unwrap();
    w.begin_compound(Some("d")).unwrap();
    w.write_byte(Some("inner"), 7).unwrap();
    w.end_compound().unwrap();
    w.end_compound().unwrap();
    let bytes = w.into_inner();

    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("a")).unwrap());
    assert_eq!(r.read_as_tag().unwrap(), Tag::named("a", 1));
    assert_eq!(r.read_as_tag().unwrap(), Tag::named("b", 2));

    let c = r.read_as_tag().unwrap();
    assert_eq!(c.name().as_deref(), Some("c"));
    assert_eq!(c.count(), 0);
    let d = r.read_as_tag().unwrap();
    assert_eq!(d.name().as_deref(), Some("d"));
    assert_eq!(d.get("inner").unwrap().unwrap().byte_value().unwrap(), 7);

    assert!(r.is_at_stream_end());
    assert!(matches!(r.read_as_tag(), Err(Error::EndOfStream)));
}

#[test]
fn test_read_as_tag_walks_list_elements() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.read_as_tag().unwrap(), Tag::new(10));
    assert_eq!(r.list_index(), Some(1));
    assert_eq!(r.read_as_tag().unwrap(), Tag::new(20));
    // The list is done; the next tag is its sibling.
    assert_eq!(r.tag_name(), Some("c"));
}

#[test]
fn test_reading_past_the_end_keeps_the_reader_usable() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    r.read_as_tag().unwrap();
    assert_eq!(r.state(), ReaderState::AtEndOfStream);

    assert!(matches!(r.read_as_tag(), Err(Error::EndOfStream)));
    assert!(matches!(r.read_list_as_array::<i32>(), Err(Error::EndOfStream)));
    assert_eq!(r.state(), ReaderState::AtEndOfStream);
    assert!(r.is_at_stream_end());
    assert!(!r.is_in_error_state());
    assert!(!r.read_to_following(None).unwrap());
    assert_eq!(r.skip().unwrap(), 0);
}

#[test]
fn test_read_as_tag_whole_document() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    let root = r.read_as_tag().unwrap();
    assert_eq!(root.name().as_deref(), Some("root"));
    assert_eq!(root.count(), 4);
    let list = root.get("list").unwrap().unwrap();
    assert_eq!(list.get(1).unwrap().unwrap().int_value().unwrap(), 20);
    assert_eq!(r.tags_read(), 8);

    assert!(r.is_at_stream_end());
    assert!(matches!(r.read_as_tag(), Err(Error::EndOfStream)));
}

#[test]
fn test_read_as_tag_list_and_element() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    assert!(r.read_to_following(None).unwrap());
    let first = r.read_as_tag().unwrap();
    assert_eq!(first, Tag::new(10));
    assert_eq!(r.list_index(), Some(1));

    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    let list = r.read_as_tag().unwrap();
    assert_eq!(list.list_kind().unwrap(), Some(TagKind::Int));
    assert_eq!(list.count(), 2);
    assert_eq!(r.tag_name(), Some("c"));
    assert!(r.is_compound());
}

#[test]
fn test_selector_prunes_read_as_tag() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    r.set_selector(|tag: &Tag| tag.name().as_deref() != Some("list"));
    let root = r.read_as_tag().unwrap();
    assert!(!root.contains("list").unwrap());
    assert_eq!(root.get("e").unwrap().unwrap().long_value().unwrap(), 5);
    assert_eq!(root.count(), 3);
}

#[test]
fn test_value_is_read_once_unless_cached() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("a")).unwrap());
    assert_eq!(r.read_value().unwrap(), NbtValue::Int(1));
    assert!(matches!(r.read_value(), Err(Error::InvalidOperation(_))));
    // A misuse error does not poison the reader.
    assert!(r.read_to_following(None).unwrap());

    let mut r = NbtReader::new(&bytes[..]);
    r.set_cache_tag_values(true);
    assert!(r.read_to_following(Some("e")).unwrap());
    assert_eq!(r.read_value_as::<i64>().unwrap(), 5);
    assert_eq!(r.read_value_as::<i64>().unwrap(), 5);
    assert_eq!(r.read_value_as::<String>().unwrap(), "5");
}

#[test]
fn test_read_value_on_container_is_invalid() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("c")).unwrap());
    assert!(matches!(r.read_value(), Err(Error::InvalidOperation(_))));
    assert!(!r.is_in_error_state());
}

#[test]
fn test_read_value_as_checks_kind_first() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("a")).unwrap());
    assert!(matches!(
        r.read_value_as::<u8>(),
        Err(Error::InvalidCast { from: TagKind::Int, .. })
    ));
    assert_eq!(r.read_value_as::<i64>().unwrap(), 1);
}

#[test]
fn test_read_list_as_array() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("list")).unwrap());
    assert_eq!(r.read_list_as_array::<i64>().unwrap(), [10, 20]);
    assert_eq!(r.list_index(), Some(1));
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_name(), Some("c"));
}

#[test]
fn test_read_list_as_array_rejections() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("a")).unwrap());
    assert!(matches!(
        r.read_list_as_array::<i32>(),
        Err(Error::InvalidOperation(_))
    ));

    assert!(r.read_to_following(Some("list")).unwrap());
    assert!(matches!(
        r.read_list_as_array::<u8>(),
        Err(Error::InvalidCast { from: TagKind::Int, .. })
    ));
    assert_eq!(r.read_list_as_array::<String>().unwrap(), ["10", "20"]);

    let mut w = NbtWriter::new(Vec::new(), "").unwrap();
    w.begin_list(Some("nested"), TagKind::Compound, 1).unwrap();
    w.begin_compound(None).unwrap();
    w.end_compound().unwrap();
    w.end_list().unwrap();
    w.end_compound().unwrap();
    let bytes = w.into_inner();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(Some("nested")).unwrap());
    assert!(matches!(
        r.read_list_as_array::<i32>(),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn test_tag_start_offset() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(None).unwrap());
    assert_eq!(r.tag_start_offset(), 0);
    assert!(r.read_to_following(None).unwrap());
    // 0x0A, name length, "root"
    assert_eq!(r.tag_start_offset(), 7);
    assert_eq!(bytes[7], TagKind::Int as u8);
}

#[test]
fn test_format_error_is_sticky() {
    let mut bytes = vec![0x0A, 0x00, 0x01, b'r'];
    bytes.extend_from_slice(&[0x03, 0x00, 0x01, b'a', 0, 0, 0, 1]);
    bytes.push(0x20);
    // Well-formed trailing bytes must not revive the reader.
    bytes.extend_from_slice(&[0x01, 0x00, 0x01, b'b', 5, 0x00]);

    let mut r = NbtReader::new(&bytes[..]);
    assert!(r.read_to_following(None).unwrap());
    assert!(r.read_to_following(None).unwrap());
    assert!(matches!(
        r.read_to_following(None),
        Err(Error::InvalidTagType(0x20))
    ));
    assert!(r.is_in_error_state());
    assert_eq!(r.state(), ReaderState::Errored);

    assert!(matches!(r.read_to_following(None), Err(Error::InvalidReaderState)));
    assert!(matches!(r.read_to_next_sibling(None), Err(Error::InvalidReaderState)));
    assert!(matches!(r.read_to_descendant("b"), Err(Error::InvalidReaderState)));
    assert!(matches!(r.skip(), Err(Error::InvalidReaderState)));
    assert!(matches!(r.read_value(), Err(Error::InvalidReaderState)));
    assert!(matches!(r.read_value_as::<i32>(), Err(Error::InvalidReaderState)));
    assert!(matches!(r.read_as_tag(), Err(Error::InvalidReaderState)));
}

#[test]
fn test_truncated_stream_is_sticky() {
    let bytes = document();
    let mut r = NbtReader::new(&bytes[..bytes.len() - 6]);
    let error = loop {
        match r.read_to_following(None) {
            Ok(true) => continue,
            Ok(false) => panic!("truncated stream ended cleanly"),
            Err(error) => break error,
        }
    };
    assert!(matches!(error, Error::EndOfStream));
    assert!(matches!(r.read_to_following(None), Err(Error::InvalidReaderState)));
}

#[test]
fn test_non_compound_root_is_a_format_error() {
    let bytes = [0x02, 0x00, 0x01, b'f', 0x00];
    let mut r = NbtReader::new(&bytes[..]);
    let error = r.read_to_following(None).unwrap_err();
    assert!(error.is_format_error());
    assert!(r.is_in_error_state());
}

#[test]
fn test_little_endian() {
    let mut w = NbtWriter::with_endianness(Vec::new(), "le", Endianness::Little).unwrap();
    w.write_int(Some("v"), 0x0102_0304).unwrap();
    w.end_compound().unwrap();
    let bytes = w.into_inner();
    assert_eq!(&bytes[9..13], &[0x04, 0x03, 0x02, 0x01]);

    let mut r = NbtReader::with_endianness(&bytes[..], Endianness::Little);
    assert_eq!(r.endianness(), Endianness::Little);
    assert!(r.read_to_following(Some("v")).unwrap());
    assert_eq!(r.read_value_as::<i32>().unwrap(), 0x0102_0304);
}
