use std::io::Cursor;

use nbt_tree::{Compression, Endianness, NbtFile, NbtReader};

/// Loads `data` as a raw document in both byte orders and writes back
/// whatever parses.
pub fn test_file(data: &[u8]) {
    for endianness in [Endianness::Big, Endianness::Little] {
        let mut file = NbtFile::new();
        file.set_endianness(endianness);
        if file.load_from_buffer(data, Compression::None, None).is_err() {
            continue;
        }
        let _ = file.to_string();
        // Lossily decoded strings can outgrow the u16 length prefix.
        if let Ok(bytes) = file.save_to_buffer(Compression::None) {
            let mut again = NbtFile::new();
            again.set_endianness(endianness);
            again
                .load_from_buffer(&bytes, Compression::None, None)
                .unwrap();
            let rewritten = again.save_to_buffer(Compression::None).unwrap();
            assert_eq!(rewritten.len(), bytes.len());
        }
    }
    let mut file = NbtFile::new();
    let _ = file.load_from_buffer(data, Compression::AutoDetect, None);
    let _ = NbtFile::read_root_tag_name_from_buffer(data, Compression::AutoDetect, Endianness::Big);
}

/// Walks `data` with the streaming reader, materializing every third
/// container and skipping the rest.
pub fn test_reader(data: &[u8]) {
    let mut reader = NbtReader::new(Cursor::new(data));
    let mut seen = 0u32;
    loop {
        match reader.read_to_following(None) {
            Ok(true) => {}
            Ok(false) | Err(_) => break,
        }
        seen += 1;
        let result = if reader.is_compound() || reader.is_list() {
            if seen % 3 == 0 {
                reader.read_as_tag().map(|_| ())
            } else {
                reader.skip().map(|_| ())
            }
        } else if reader.has_value() {
            reader.read_value().map(|_| ())
        } else {
            Ok(())
        };
        if result.is_err() {
            break;
        }
    }
}

/// Runs every target over one input.
pub fn test_all(data: &[u8]) {
    test_file(data);
    test_reader(data);
}
