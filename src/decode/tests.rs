use super::*;
use crate::arena::ArenaConfig;
use crate::constants::MAX_DEPTH;

fn decode_err(input: &[u8]) -> BencodeError {
    let mut arena = Arena::new();
    arena.decode(input).unwrap_err()
}

#[test]
fn test_decode_integer() {
    let mut arena = Arena::new();
    for (input, expected) in [
        (&b"i42e"[..], 42),
        (&b"i-42e"[..], -42),
        (&b"i0e"[..], 0),
        (&b"i9223372036854775807e"[..], i64::MAX),
        (&b"i-9223372036854775808e"[..], i64::MIN),
    ] {
        let id = arena.decode(input).unwrap();
        let item = arena.item(id).unwrap();
        assert_eq!(item.as_integer(), Some(expected));
        assert_eq!(item.encoded_len(), input.len());
    }
}

#[test]
fn test_decode_integer_invalid() {
    for input in [
        &b"i-0e"[..],
        &b"i03e"[..],
        &b"i-03e"[..],
        &b"ie"[..],
        &b"i-e"[..],
        &b"i00e"[..],
    ] {
        assert!(
            matches!(decode_err(input), BencodeError::InvalidInteger(_)),
            "{:?}",
            String::from_utf8_lossy(input)
        );
    }
    assert!(matches!(
        decode_err(b"i4x2e"),
        BencodeError::UnexpectedChar('x')
    ));
}

#[test]
fn test_decode_integer_overflow() {
    assert!(matches!(
        decode_err(b"i9223372036854775808e"),
        BencodeError::InvalidInteger(_)
    ));
    assert!(matches!(
        decode_err(b"i-9223372036854775809e"),
        BencodeError::InvalidInteger(_)
    ));
    assert!(matches!(
        decode_err(b"i99999999999999999999999e"),
        BencodeError::InvalidInteger(_)
    ));
}

#[test]
fn test_decode_bytes_borrow_input() {
    let input = b"4:spam".to_vec();
    let mut arena = Arena::new();
    let id = arena.decode(&input).unwrap();
    let item = arena.item(id).unwrap();

    assert_eq!(item.as_bytes(), Some(&b"spam"[..]));
    assert!(item.is_borrowed());
    assert_eq!(item.as_bytes().unwrap().as_ptr(), input[2..].as_ptr());
}

#[test]
fn test_decode_empty_and_binary_strings() {
    let mut arena = Arena::new();
    let empty = arena.decode(b"0:").unwrap();
    assert_eq!(arena.item(empty).unwrap().as_bytes(), Some(&b""[..]));

    let binary = arena.decode(b"3:\x00\xffe").unwrap();
    assert_eq!(
        arena.item(binary).unwrap().as_bytes(),
        Some(&b"\x00\xffe"[..])
    );
}

#[test]
fn test_decode_string_length_with_leading_zeros() {
    let mut arena = Arena::new();
    let id = arena.decode(b"04:spam").unwrap();
    let item = arena.item(id).unwrap();
    assert_eq!(item.as_str(), Some("spam"));
    assert_eq!(item.encoded_len(), 7);
}

#[test]
fn test_decode_string_invalid() {
    assert!(matches!(decode_err(b"3:ab"), BencodeError::UnexpectedEof));
    assert!(matches!(decode_err(b"3"), BencodeError::UnexpectedEof));
    assert!(matches!(
        decode_err(b"3x:abc"),
        BencodeError::UnexpectedChar('x')
    ));
    assert!(matches!(
        decode_err(b"99999999999999999999999:a"),
        BencodeError::InvalidStringLength
    ));
}

#[test]
fn test_decode_list() {
    let mut arena = Arena::new();
    let id = arena.decode(b"l4:spami42ee").unwrap();
    let list = arena.item(id).unwrap();

    assert_eq!(list.kind(), ItemKind::List);
    assert_eq!(list.len(), 2);
    let mut children = list.children();
    assert_eq!(children.next().unwrap().as_str(), Some("spam"));
    assert_eq!(children.next().unwrap().as_integer(), Some(42));
    assert!(children.next().is_none());
}

#[test]
fn test_decode_dict() {
    let mut arena = Arena::new();
    let id = arena.decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
    let dict = arena.item(id).unwrap();

    assert_eq!(dict.kind(), ItemKind::Dictionary);
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get_str(b"cow"), Some("moo"));
    assert_eq!(dict.get_str(b"spam"), Some("eggs"));
    assert!(dict.get(b"moo").is_none());
    assert_eq!(dict.encoded_len(), 24);
}

#[test]
fn test_decode_nested() {
    let mut arena = Arena::new();
    let id = arena
        .decode(b"d4:infod6:lengthi1024e4:name8:file.txte8:announce3:urle")
        .unwrap();
    let root = arena.item(id).unwrap();

    let info = root.get_expect(b"info", ItemKind::Dictionary).unwrap();
    assert_eq!(info.get_integer(b"length", 0), 1024);
    assert_eq!(info.get_str(b"name"), Some("file.txt"));
    assert_eq!(info.parent().unwrap().id(), id);
    assert_eq!(root.get_str(b"announce"), Some("url"));
}

#[test]
fn test_decode_keeps_unsorted_duplicate_keys() {
    let mut arena = Arena::new();
    let id = arena.decode(b"d1:bi1e1:ai2e1:bi3ee").unwrap();
    let dict = arena.item(id).unwrap();

    let keys: Vec<_> = dict.pairs().map(|(k, _)| k.as_str().unwrap()).collect();
    assert_eq!(keys, vec!["b", "a", "b"]);
    assert_eq!(dict.get_integer(b"b", 0), 1);
    assert!(arena.is_indexed(id));
}

#[test]
fn test_duplicate_keys_without_index() {
    let config = ArenaConfig::default().with_hash_index_max_pairs(1);
    let mut arena = Arena::with_config(config);
    let id = arena.decode(b"d1:ki1e1:ki2ee").unwrap();

    assert!(!arena.is_indexed(id));
    assert_eq!(arena.item(id).unwrap().get_integer(b"k", 0), 1);
}

#[test]
fn test_decode_non_string_key() {
    assert!(matches!(decode_err(b"di1ei2ee"), BencodeError::NonStringKey));
    assert!(matches!(decode_err(b"dl1:ae1:be"), BencodeError::NonStringKey));
}

#[test]
fn test_decode_truncated_container() {
    assert!(matches!(decode_err(b"d3:cow"), BencodeError::UnexpectedEof));
    assert!(matches!(decode_err(b"l4:spam"), BencodeError::UnexpectedEof));
    assert!(matches!(
        decode_err(b"d3:cowe"),
        BencodeError::UnexpectedChar('e')
    ));
}

#[test]
fn test_decode_unexpected_char() {
    assert!(matches!(decode_err(b"x"), BencodeError::UnexpectedChar('x')));
    assert!(matches!(decode_err(b"-1"), BencodeError::UnexpectedChar('-')));
    assert!(matches!(decode_err(b""), BencodeError::UnexpectedEof));

    let mut arena = Arena::new();
    let empty = arena.decode(b"le").unwrap();
    assert!(arena.item(empty).unwrap().is_empty());
}

#[test]
fn test_decode_trailing_bytes() {
    let input = b"i42eabc";
    let mut arena = Arena::new();
    let id = arena.decode(input).unwrap();
    assert_eq!(arena.decoded_len(id), Some(4));

    assert!(matches!(
        arena.decode_exact(input),
        Err(BencodeError::TrailingData)
    ));
    assert!(arena.decode_exact(b"i42e").is_ok());
}

#[test]
fn test_decode_expect_kind() {
    let mut arena = Arena::new();
    assert!(arena.decode_expect(b"de", ItemKind::Dictionary).is_ok());

    match arena.decode_expect(b"le", ItemKind::Dictionary) {
        Err(BencodeError::UnexpectedType { expected, found }) => {
            assert_eq!(expected, ItemKind::Dictionary);
            assert_eq!(found, ItemKind::List);
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_decode_depth_limit() {
    let nested = |depth: usize| {
        let mut input = vec![b'l'; depth];
        input.extend(std::iter::repeat(b'e').take(depth));
        input
    };

    let config = ArenaConfig::default().with_max_depth(4);
    let ok = nested(5);
    let too_deep = nested(6);

    let mut arena = Arena::with_config(config.clone());
    assert!(arena.decode(&ok).is_ok());

    let mut arena = Arena::with_config(config);
    assert!(matches!(
        arena.decode(&too_deep),
        Err(BencodeError::NestingTooDeep)
    ));
}

#[test]
fn test_decode_default_depth_limit() {
    let mut input = vec![b'l'; 1000];
    input.extend(std::iter::repeat(b'e').take(1000));

    let mut arena = Arena::new();
    assert!(matches!(
        arena.decode(&input),
        Err(BencodeError::NestingTooDeep)
    ));
}

#[test]
fn test_deep_built_tree_needs_larger_depth_limit() {
    let depth = MAX_DEPTH + 6;
    let mut builder = Arena::new();
    let root = builder.list();
    let mut inner = root;
    for _ in 1..depth {
        inner = builder.list_add_list(inner);
    }
    builder.list_add_integer(inner, 1);
    let encoded = builder.collapse(root.unwrap()).unwrap().to_vec();

    let mut arena = Arena::new();
    assert!(matches!(
        arena.decode(&encoded),
        Err(BencodeError::NestingTooDeep)
    ));

    let config = ArenaConfig::default().with_max_depth(depth);
    let mut arena = Arena::with_config(config);
    let root = arena.decode(&encoded).unwrap();
    assert_eq!(arena.collapse(root).unwrap(), &encoded[..]);
}

#[test]
fn test_decode_allocation_failure() {
    let config = ArenaConfig::default().with_byte_limit(0);
    let mut arena = Arena::with_config(config);
    assert!(matches!(
        arena.decode(b"l4:spame"),
        Err(BencodeError::AllocationFailed)
    ));
    assert!(arena.is_failed());
}

#[test]
fn test_decode_many_documents_into_one_arena() {
    let mut arena = Arena::new();
    let a = arena.decode(b"i1e").unwrap();
    let b = arena.decode(b"3:two").unwrap();

    assert_eq!(arena.item(a).unwrap().as_integer(), Some(1));
    assert_eq!(arena.item(b).unwrap().as_str(), Some("two"));
}

#[test]
fn test_validate() {
    assert_eq!(validate(b"i42e"), Validity::Complete(4));
    assert_eq!(validate(b"d3:cow3:mooe"), Validity::Complete(12));
    assert_eq!(validate(b"l4:spami42eeXYZ"), Validity::Complete(12));
    assert_eq!(validate(b"0:"), Validity::Complete(2));
    assert_eq!(validate(b""), Validity::Incomplete);
    assert_eq!(validate(b"3:ab"), Validity::Incomplete);
    assert_eq!(validate(b"i42"), Validity::Incomplete);
    assert_eq!(validate(b"i-"), Validity::Incomplete);
    assert_eq!(validate(b"i03e"), Validity::Invalid);
    assert_eq!(validate(b"i-0e"), Validity::Invalid);
    assert_eq!(validate(b"i-0"), Validity::Invalid);
    assert_eq!(validate(b"di1ei2ee"), Validity::Invalid);
    assert_eq!(validate(b"x"), Validity::Invalid);
    assert_eq!(validate(b"i99999999999999999999e"), Validity::Invalid);
}

#[test]
fn test_validate_truncations_are_incomplete() {
    let input = b"d4:infod6:lengthi-1024e4:name8:file.txte4:listli0e0:lee";
    assert_eq!(validate(input), Validity::Complete(input.len()));

    for end in 0..input.len() {
        assert_eq!(
            validate(&input[..end]),
            Validity::Incomplete,
            "prefix of length {end}"
        );
    }
}

#[test]
fn test_validate_matches_decode() {
    for input in [
        &b"i42e"[..],
        &b"l4:spami42ee"[..],
        &b"d3:cow3:mooe"[..],
        &b"i03e"[..],
        &b"3:ab"[..],
        &b"dle"[..],
        &b"d1:a"[..],
    ] {
        let mut arena = Arena::new();
        let decoded = arena.decode(input);
        match validate(input) {
            Validity::Complete(n) => {
                assert_eq!(arena.decoded_len(decoded.unwrap()), Some(n));
            }
            Validity::Incomplete => assert!(decoded.unwrap_err().is_incomplete()),
            Validity::Invalid => {
                let err = decoded.unwrap_err();
                assert!(!err.is_incomplete(), "{err}");
            }
        }
    }
}

#[test]
fn test_validate_depth() {
    assert_eq!(validate_with_depth(b"llee", 1), Validity::Complete(4));
    assert_eq!(validate_with_depth(b"llleee", 1), Validity::Invalid);
    assert_eq!(validate_with_depth(b"lll", 1), Validity::Invalid);
    assert!(validate(b"i1e").is_complete());
    assert_eq!(validate(b"i1e").consumed(), Some(3));
    assert_eq!(validate(b"i1").consumed(), None);
}
