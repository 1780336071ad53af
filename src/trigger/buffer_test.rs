use super::*;

fn typed(buffer: &mut TypedBuffer, text: &str) {
    for c in text.chars() {
        buffer.push(c);
    }
}

#[test]
fn test_push_and_contents() {
    let mut buffer = TypedBuffer::default();
    typed(&mut buffer, "otb");
    assert_eq!(buffer.contents(), "otb");
    assert_eq!(buffer.len(), 3);
    assert!(!buffer.is_empty());
}

#[test]
fn test_oldest_characters_dropped_at_capacity() {
    let mut buffer = TypedBuffer::default();
    typed(&mut buffer, &"a".repeat(DEFAULT_BUFFER_CAPACITY));
    typed(&mut buffer, "xyz");

    assert_eq!(buffer.len(), DEFAULT_BUFFER_CAPACITY);
    assert!(buffer.contents().ends_with("xyz"));
    assert_eq!(buffer.contents().chars().filter(|c| *c == 'a').count(), DEFAULT_BUFFER_CAPACITY - 3);
}

#[test]
fn test_trigger_longer_than_capacity_cannot_match() {
    let mut buffer = TypedBuffer::with_capacity(5);
    typed(&mut buffer, "abcdefg");
    assert_eq!(buffer.contents(), "cdefg");
    assert!(!buffer.ends_with("abcdefg"));
}

#[test]
fn test_ends_with() {
    let mut buffer = TypedBuffer::default();
    assert!(!buffer.ends_with("//"));
    typed(&mut buffer, "a/");
    assert!(!buffer.ends_with("//"));
    buffer.push('/');
    assert!(buffer.ends_with("//"));
    assert!(buffer.ends_with(""));
}

#[test]
fn test_trimmed_and_clear() {
    let mut buffer = TypedBuffer::default();
    typed(&mut buffer, " otb\t");
    assert_eq!(buffer.trimmed(), "otb");

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_tiny_capacity_still_fits_search_prefix() {
    let mut buffer = TypedBuffer::with_capacity(0);
    typed(&mut buffer, "x//");
    assert!(buffer.ends_with("//"));
}
