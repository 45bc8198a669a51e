//! Tests for loading and saving whole documents

use std::io::Cursor;

use nbt_tree::{Compression, Endianness, Error, NbtFile, NbtWriter, Tag, TagKind};

fn level() -> Tag {
    let root = Tag::named_compound("Level");
    root.add(Tag::named("longTest", 9_223_372_036_854_775_807i64))
        .unwrap();
    root.add(Tag::named("shortTest", 32767i16)).unwrap();
    root.add(Tag::named("stringTest", "HELLO WORLD THIS IS A TEST STRING ÅÄÖ!"))
        .unwrap();
    root.add(Tag::named("floatTest", 0.498_231_47f32)).unwrap();
    root.add(Tag::named("intTest", 2_147_483_647)).unwrap();
    let ham = Tag::named_compound("ham");
    ham.add(Tag::named("name", "Hampus")).unwrap();
    ham.add(Tag::named("value", 0.75f32)).unwrap();
    let egg = Tag::named_compound("egg");
    egg.add(Tag::named("name", "Eggbert")).unwrap();
    egg.add(Tag::named("value", 0.5f32)).unwrap();
    let nested = Tag::named_compound("nested compound test");
    nested.add(ham).unwrap();
    nested.add(egg).unwrap();
    root.add(nested).unwrap();
    let longs = Tag::named_list("listTest (long)", Some(TagKind::Long));
    for value in 11..16i64 {
        longs.add(Tag::new(value)).unwrap();
    }
    root.add(longs).unwrap();
    root.add(Tag::named("byteTest", 127u8)).unwrap();
    let bytes: Vec<u8> = (0..1000u32).map(|n| ((n * n * 255 + n * 7) % 100) as u8).collect();
    root.add(Tag::named(
        "byteArrayTest (the first 1000 values of (n*n*255+n*7)%100, starting with n=0 (0, 62, 34, 16, 8, ...))",
        bytes,
    ))
    .unwrap();
    root.add(Tag::named("doubleTest", 0.493_128_713_218_231_5f64))
        .unwrap();
    root
}

fn check_level(root: &Tag) {
    assert_eq!(root.name().as_deref(), Some("Level"));
    assert_eq!(root.count(), 10);
    assert_eq!(
        root.get("longTest").unwrap().unwrap().long_value().unwrap(),
        i64::MAX
    );
    assert_eq!(
        root.get("stringTest").unwrap().unwrap().string_value().unwrap(),
        "HELLO WORLD THIS IS A TEST STRING ÅÄÖ!"
    );
    let egg = root
        .get("nested compound test")
        .unwrap()
        .unwrap()
        .get("egg")
        .unwrap()
        .unwrap();
    assert_eq!(egg.get("value").unwrap().unwrap().float_value().unwrap(), 0.5);
    let longs = root.get("listTest (long)").unwrap().unwrap();
    assert_eq!(longs.count(), 5);
    assert_eq!(longs.get(4).unwrap().unwrap().long_value().unwrap(), 15);
}

#[test]
fn test_round_trip_every_compression() {
    let dir = tempfile::tempdir().unwrap();
    for compression in [Compression::None, Compression::GZip, Compression::ZLib] {
        let path = dir.path().join(format!("level-{compression:?}.nbt"));
        let mut file = NbtFile::with_root(level()).unwrap();
        let written = file.save_to_file(&path, compression).unwrap();
        assert_eq!(file.file_name(), Some(path.as_path()));
        assert_eq!(file.compression(), compression);

        let mut loaded = NbtFile::new();
        let read = loaded
            .load_from_file(&path, Compression::AutoDetect, None)
            .unwrap();
        assert_eq!(read, written);
        assert_eq!(loaded.compression(), compression);
        check_level(&loaded.root());
        assert_eq!(loaded.root(), file.root());
    }
}

#[test]
fn test_unbuffered_file_auto_detects_by_seeking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.nbt");
    NbtFile::with_root(level())
        .unwrap()
        .save_to_file(&path, Compression::GZip)
        .unwrap();

    let mut loaded = NbtFile::new();
    loaded.set_buffer_size(0);
    loaded
        .load_from_file(&path, Compression::AutoDetect, None)
        .unwrap();
    assert_eq!(loaded.compression(), Compression::GZip);
    check_level(&loaded.root());
}

#[test]
fn test_unbuffered_stream_cannot_auto_detect() {
    let bytes = NbtFile::with_root(level())
        .unwrap()
        .save_to_buffer(Compression::ZLib)
        .unwrap();

    let mut loaded = NbtFile::new();
    loaded.set_buffer_size(0);
    let error = loaded
        .load_from_reader(Cursor::new(&bytes), Compression::AutoDetect, None)
        .unwrap_err();
    assert!(matches!(error, Error::InvalidOperation(_)));
    loaded
        .load_from_reader(Cursor::new(&bytes), Compression::ZLib, None)
        .unwrap();
    check_level(&loaded.root());
}

#[test]
fn test_save_rejects_auto_detect() {
    let mut file = NbtFile::with_root(level()).unwrap();
    assert!(matches!(
        file.save_to_buffer(Compression::AutoDetect),
        Err(Error::Argument(_))
    ));
}

#[test]
fn test_unknown_first_byte_is_a_format_error() {
    let mut file = NbtFile::new();
    let error = file
        .load_from_buffer(&[0x42, 0x00], Compression::AutoDetect, None)
        .unwrap_err();
    assert!(error.is_format_error());
}

#[test]
fn test_saved_bytes_are_canonical() {
    let root = Tag::named_compound("hello world");
    root.add(Tag::named("name", "Bananrama")).unwrap();
    let mut file = NbtFile::with_root(root).unwrap();
    let bytes = file.save_to_buffer(Compression::None).unwrap();

    let mut expected = vec![0x0A, 0x00, 0x0B];
    expected.extend_from_slice(b"hello world");
    expected.extend_from_slice(&[0x08, 0x00, 0x04]);
    expected.extend_from_slice(b"name");
    expected.extend_from_slice(&[0x00, 0x09]);
    expected.extend_from_slice(b"Bananrama");
    expected.push(0x00);
    assert_eq!(bytes, expected);
}

#[test]
fn test_selector_prunes_load() {
    let bytes = NbtFile::with_root(level())
        .unwrap()
        .save_to_buffer(Compression::None)
        .unwrap();
    let skip_nested = |tag: &Tag| tag.name().as_deref() != Some("nested compound test");
    let skip_egg = |tag: &Tag| tag.name().as_deref() != Some("egg");

    let mut file = NbtFile::new();
    let read = file
        .load_from_buffer(&bytes, Compression::None, Some(&skip_nested))
        .unwrap();
    assert_eq!(read as usize, bytes.len());
    assert_eq!(file.root().count(), 9);
    assert!(!file.root().contains("nested compound test").unwrap());

    file.load_from_buffer(&bytes, Compression::None, Some(&skip_egg))
        .unwrap();
    let nested = file.root().get("nested compound test").unwrap().unwrap();
    assert_eq!(nested.names().unwrap(), ["ham"]);
}

#[test]
fn test_read_root_tag_name() {
    let mut file = NbtFile::with_root(level()).unwrap();
    let zlib = file.save_to_buffer(Compression::ZLib).unwrap();
    assert_eq!(
        NbtFile::read_root_tag_name_from_buffer(&zlib, Compression::AutoDetect, Endianness::Big)
            .unwrap(),
        "Level"
    );
    assert_eq!(
        NbtFile::read_root_tag_name_from_reader(
            Cursor::new(&zlib),
            Compression::ZLib,
            Endianness::Big,
            0
        )
        .unwrap(),
        "Level"
    );
    assert!(matches!(
        NbtFile::read_root_tag_name_from_reader(
            Cursor::new(&zlib),
            Compression::AutoDetect,
            Endianness::Big,
            0
        ),
        Err(Error::InvalidOperation(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.dat");
    file.save_to_file(&path, Compression::GZip).unwrap();
    for buffer_size in [0, 16] {
        let name = NbtFile::read_root_tag_name(
            &path,
            Compression::AutoDetect,
            Endianness::Big,
            buffer_size,
        )
        .unwrap();
        assert_eq!(name, "Level");
    }
}

#[test]
fn test_set_root_validation() {
    let mut file = NbtFile::new();
    assert!(matches!(
        file.set_root(Tag::named("x", 1)),
        Err(Error::Argument(_))
    ));
    assert!(matches!(file.set_root(Tag::compound()), Err(Error::Argument(_))));

    let outer = Tag::named_compound("outer");
    let inner = Tag::named_compound("inner");
    outer.add(inner).unwrap();
    let inner = outer.get("inner").unwrap().unwrap();
    assert!(matches!(file.set_root(inner), Err(Error::Argument(_))));

    file.set_root(outer.clone()).unwrap();
    assert_eq!(file.root(), outer);
}

#[test]
fn test_root_handle_is_live() {
    let mut file = NbtFile::new();
    file.root().add(Tag::named("added", 5)).unwrap();
    let bytes = file.save_to_buffer(Compression::None).unwrap();

    let mut loaded = NbtFile::new();
    loaded.load_from_buffer(&bytes, Compression::None, None).unwrap();
    assert_eq!(loaded.root().name().as_deref(), Some(""));
    assert_eq!(
        loaded.root().get("added").unwrap().unwrap().int_value().unwrap(),
        5
    );
}

#[test]
fn test_little_endian_documents() {
    let mut file = NbtFile::with_root(level()).unwrap();
    file.set_endianness(Endianness::Little);
    let bytes = file.save_to_buffer(Compression::None).unwrap();
    assert_eq!(&bytes[..3], &[0x0A, 0x05, 0x00]);

    let mut little = NbtFile::new();
    little.set_endianness(Endianness::Little);
    little.load_from_buffer(&bytes, Compression::None, None).unwrap();
    check_level(&little.root());
}

#[test]
fn test_streamed_document_loads() {
    let mut writer = NbtWriter::new(Vec::new(), "stream").unwrap();
    writer.begin_list(Some("matrix"), TagKind::List, 2).unwrap();
    for row in 0..2 {
        writer.begin_list(None, TagKind::Int, 3).unwrap();
        for column in 0..3 {
            writer.write_int(None, row * 3 + column).unwrap();
        }
        writer.end_list().unwrap();
    }
    writer.end_list().unwrap();
    writer.end_compound().unwrap();
    writer.finish().unwrap();

    let mut file = NbtFile::new();
    file.load_from_buffer(&writer.into_inner(), Compression::AutoDetect, None)
        .unwrap();
    let matrix = file.root().get("matrix").unwrap().unwrap();
    assert_eq!(matrix.list_kind().unwrap(), Some(TagKind::List));
    let row = matrix.get(1).unwrap().unwrap();
    assert_eq!(row.get(2).unwrap().unwrap().int_value().unwrap(), 5);
    assert_eq!(row.path(), "stream.matrix[1]");
}

#[test]
fn test_truncated_documents_fail() {
    let bytes = NbtFile::with_root(level())
        .unwrap()
        .save_to_buffer(Compression::None)
        .unwrap();
    let mut file = NbtFile::new();
    let error = file
        .load_from_buffer(&bytes[..bytes.len() / 2], Compression::None, None)
        .unwrap_err();
    assert!(matches!(error, Error::EndOfStream));
}

#[test]
fn test_display_delegates_to_root() {
    let root = Tag::named_compound("r");
    root.add(Tag::named("a", 1)).unwrap();
    let file = NbtFile::with_root(root.clone()).unwrap();
    assert_eq!(file.to_string(), root.to_string());
}

#[test]
fn test_single_int_round_trip() {
    let root = Tag::named_compound("root");
    root.add(Tag::named("x", 3)).unwrap();
    let bytes = NbtFile::with_root(root)
        .unwrap()
        .save_to_buffer(Compression::GZip)
        .unwrap();

    let mut file = NbtFile::new();
    file.load_from_buffer(&bytes, Compression::AutoDetect, None)
        .unwrap();
    assert_eq!(file.root().count(), 1);
    assert_eq!(file.root().get("x").unwrap().unwrap().int_value().unwrap(), 3);
}

#[test]
fn test_empty_end_list_round_trip() {
    let root = Tag::named_compound("root");
    root.add(Tag::named_list("l", Some(TagKind::End))).unwrap();
    let bytes = NbtFile::with_root(root)
        .unwrap()
        .save_to_buffer(Compression::None)
        .unwrap();
    assert_eq!(
        &bytes[7..16],
        &[0x09, 0x00, 0x01, b'l', 0x00, 0x00, 0x00, 0x00, 0x00]
    );

    let mut file = NbtFile::new();
    file.load_from_buffer(&bytes, Compression::None, None).unwrap();
    let list = file.root().get("l").unwrap().unwrap();
    assert_eq!(list.count(), 0);
    assert_eq!(list.list_kind().unwrap(), Some(TagKind::End));
}

#[test]
fn test_unset_empty_list_cannot_be_saved() {
    let root = Tag::named_compound("root");
    root.add(Tag::named_list("l", None)).unwrap();
    let error = NbtFile::with_root(root)
        .unwrap()
        .save_to_buffer(Compression::None)
        .unwrap_err();
    assert!(error.is_format_error());
}

#[test]
fn test_non_compound_root_is_rejected() {
    let bytes = [0x02, 0x00, 0x01, b'f', 0x00];
    let mut file = NbtFile::new();
    let error = file
        .load_from_buffer(&bytes, Compression::None, None)
        .unwrap_err();
    assert!(error.is_format_error());
    assert!(
        NbtFile::read_root_tag_name_from_buffer(&bytes, Compression::None, Endianness::Big)
            .unwrap_err()
            .is_format_error()
    );
}
