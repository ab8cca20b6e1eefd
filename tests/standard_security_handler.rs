use pdf_standard_security::encryption::{self, SecurityLevel, ValidationOutcome};
use pdf_standard_security::{Dictionary, Document, Object, Permissions, Stream, StringFormat};

fn document_with_id(id: &[u8]) -> Document {
    let mut doc = Document::new();
    doc.trailer.set("ID", Object::Array(vec![Object::string_literal(id.to_vec())]));
    doc
}

#[test]
fn r2_round_trip_rejects_bad_password_and_accepts_good_one() {
    // S3 - R2 round trip.
    let doc = document_with_id(b"0123456789ABCDEF");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Rc4_40, b"abc", b"abc", Permissions::all()).unwrap();

    let mut encrypted = document_with_id(b"0123456789ABCDEF");
    encrypted.trailer.set("Encrypt", Object::Dictionary(state.encode()));

    assert!(matches!(encryption::validate(&encrypted, b"abc").unwrap(), ValidationOutcome::OwnerPassword(_)));
    assert!(matches!(encryption::validate(&encrypted, b"not-abc").unwrap(), ValidationOutcome::Invalid));
}

#[test]
fn r3_strong_user_value_padding_tail_is_zeroed() {
    // S4 - R3 round trip: first 16 bytes of U are deterministic, last 16 are zero padding.
    let doc = document_with_id(b"0123456789ABCDEF");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Rc4_128, b"abc", b"abc", Permissions::all()).unwrap();

    let dict = state.encode();
    let user_value = dict.get(b"U").unwrap().as_str().unwrap();
    assert_eq!(user_value.len(), 32);
    assert_eq!(&user_value[16..], &[0u8; 16]);
}

#[test]
fn aes_object_ciphertext_is_iv_plus_one_padded_block() {
    // S5 - R4/AES object: a 3-byte string encrypts to 32 bytes (16-byte IV + one padded block).
    let doc = document_with_id(b"0123456789ABCDEF");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Aes_128, b"secret", b"secret", Permissions::all()).unwrap();

    let mut doc = document_with_id(b"0123456789ABCDEF");
    // Force a specific object id by inserting several objects ahead of the one under test.
    for _ in 0..6 {
        doc.add_object(Object::Null);
    }
    let id = doc.add_object(Object::string_literal(b"abc".to_vec()));
    assert_eq!(id.0, 7);

    encryption::encrypt_document(&mut doc, &state).unwrap();
    let ciphertext = doc.get_object(id).unwrap().as_str().unwrap();
    assert_eq!(ciphertext.len(), 32);

    encryption::decrypt_document(&mut doc, &state).unwrap();
    assert_eq!(doc.get_object(id).unwrap().as_str().unwrap(), b"abc");
}

#[test]
fn wrong_password_rejected_good_password_validates_as_user() {
    // S6.
    let doc = document_with_id(b"0123456789ABCDEF");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Aes_128, b"good", b"owner-secret", Permissions::all()).unwrap();

    let mut encrypted = document_with_id(b"0123456789ABCDEF");
    encrypted.trailer.set("Encrypt", Object::Dictionary(state.encode()));

    assert!(matches!(encryption::validate(&encrypted, b"bad").unwrap(), ValidationOutcome::Invalid));
    assert!(matches!(encryption::validate(&encrypted, b"good").unwrap(), ValidationOutcome::UserPassword(_)));
    assert!(matches!(encryption::validate(&encrypted, b"owner-secret").unwrap(), ValidationOutcome::OwnerPassword(_)));
}

#[test]
fn document_round_trip_is_byte_identical_after_decrypt() {
    // Testable property 6: a full document (nested dictionaries, arrays, streams, strings)
    // survives an encrypt/decrypt round trip unchanged.
    let doc = document_with_id(b"ROUNDTRIP0123456");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Aes_128, b"pw", b"pw", Permissions::all()).unwrap();

    let mut doc = document_with_id(b"ROUNDTRIP0123456");

    let mut annot = Dictionary::new();
    annot.set("Contents", Object::string_literal(b"a nested annotation string".to_vec()));
    let mut page = Dictionary::new();
    page.set("Annots", Object::Array(vec![Object::Dictionary(annot)]));
    let page_id = doc.add_object(Object::Dictionary(page));

    let stream_id = doc.add_object(Stream::new(Dictionary::new(), b"uncompressed content stream bytes".to_vec()));
    let empty_string_id = doc.add_object(Object::String(Vec::new(), StringFormat::Literal));

    encryption::encrypt_document(&mut doc, &state).unwrap();
    encryption::decrypt_document(&mut doc, &state).unwrap();

    let roundtripped_page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let annots = roundtripped_page.get(b"Annots").unwrap();
    let Object::Array(items) = annots else { panic!("Annots must stay an array") };
    let annot = items[0].as_dict().unwrap();
    assert_eq!(annot.get(b"Contents").unwrap().as_str().unwrap(), b"a nested annotation string");

    assert_eq!(
        doc.get_object(stream_id).unwrap().as_stream().unwrap().content,
        b"uncompressed content stream bytes"
    );
    assert_eq!(doc.get_object(empty_string_id).unwrap().as_str().unwrap(), &[] as &[u8]);
}

#[test]
fn xref_stream_content_is_never_touched_by_a_round_trip() {
    // Testable property 7: the XRef exemption holds even across a full encrypt+decrypt cycle.
    let doc = document_with_id(b"0123456789ABCDEF");
    let state = encryption::prepare_encryption(&doc, SecurityLevel::Aes_128, b"pw", b"pw", Permissions::all()).unwrap();

    let mut doc = document_with_id(b"0123456789ABCDEF");
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XRef".to_vec()));
    let xref_id = doc.add_object(Stream::new(dict, b"raw xref table bytes".to_vec()));

    encryption::encrypt_document(&mut doc, &state).unwrap();
    encryption::decrypt_document(&mut doc, &state).unwrap();

    assert_eq!(doc.get_object(xref_id).unwrap().as_stream().unwrap().content, b"raw xref table bytes");
}
