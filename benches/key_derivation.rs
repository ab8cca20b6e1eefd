#![feature(test)]
extern crate test;
use test::Bencher;

extern crate pdf_standard_security;
use pdf_standard_security::{Document, Object, Permissions, SecurityLevel};

#[bench]
fn bench_prepare_encryption_aes_128(b: &mut Bencher) {
    let mut doc = Document::new();
    doc.trailer.set(
        "ID",
        Object::Array(vec![Object::string_literal(b"0123456789ABCDEF".to_vec())]),
    );

    b.iter(|| {
        pdf_standard_security::encryption::prepare_encryption(
            &doc,
            SecurityLevel::Aes_128,
            b"user-password",
            b"owner-password",
            Permissions::all(),
        )
        .unwrap()
    });
}

#[bench]
fn bench_validate_user_password(b: &mut Bencher) {
    let mut doc = Document::new();
    doc.trailer.set(
        "ID",
        Object::Array(vec![Object::string_literal(b"0123456789ABCDEF".to_vec())]),
    );
    let state = pdf_standard_security::encryption::prepare_encryption(
        &doc,
        SecurityLevel::Rc4_128,
        b"user-password",
        b"owner-password",
        Permissions::all(),
    )
    .unwrap();
    doc.trailer.set("Encrypt", Object::Dictionary(state.encode()));

    b.iter(|| pdf_standard_security::encryption::validate(&doc, b"user-password").unwrap());
}
