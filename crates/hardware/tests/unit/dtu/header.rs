//! Message Header Tests.

use dtusim_core::dtu::MessageHeader;
use pretty_assertions::assert_eq;

#[test]
fn frame_prefixes_payload() {
    let frame = MessageHeader::new(1, 2, 3).frame(&[0xAA, 0xBB, 0xCC]);
    assert_eq!(frame, vec![1, 2, 3, 0, 0xAA, 0xBB, 0xCC]);
}

#[test]
fn header_decodes_from_frame_start() {
    let frame = MessageHeader::new(7, 4, 300).frame(&[0; 300]);
    assert_eq!(
        MessageHeader::from_bytes(&frame),
        Some(MessageHeader::new(7, 4, 300))
    );
}

#[test]
fn bare_header_is_a_valid_frame() {
    let bytes = MessageHeader::new(0, 1, 0).to_bytes();
    assert_eq!(MessageHeader::from_bytes(&bytes), Some(MessageHeader::new(0, 1, 0)));
    assert_eq!(bytes.len(), MessageHeader::SIZE);
}

#[test]
fn truncated_frame_has_no_header() {
    assert_eq!(MessageHeader::from_bytes(&[]), None);
    assert_eq!(MessageHeader::from_bytes(&[1, 2]), None);
}
