use std::collections::BTreeMap;

use crate::object::{Dictionary, Object, ObjectId};

/// An in-memory PDF object graph, parser- and writer-free.
///
/// Real document assembly (xref tables, incremental updates, page trees) is out of this crate's
/// scope; this just holds enough structure for [`crate::encryption`] to walk and transform.
pub struct Document {
    /// The version of the PDF specification the document claims to conform to.
    pub version: String,

    /// The trailer dictionary; carries `/ID` and, once encrypted, `/Encrypt`.
    pub trailer: Dictionary,

    /// The indirect objects that make up the document.
    pub objects: BTreeMap<ObjectId, Object>,

    max_id: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            version: "1.4".to_string(),
            trailer: Dictionary::new(),
            objects: BTreeMap::new(),
            max_id: 0,
        }
    }

    pub fn with_version<S: Into<String>>(version: S) -> Self {
        Document {
            version: version.into(),
            ..Self::new()
        }
    }

    /// Reserves and returns the next object id, generation 0.
    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    /// Adds an object under a freshly reserved id and returns it.
    pub fn add_object<O: Into<Object>>(&mut self, object: O) -> ObjectId {
        let id = self.new_object_id();
        self.objects.insert(id, object.into());
        id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// The document's `/ID` first element, if the trailer has one set (required for every
    /// encryption profile's per-object key derivation).
    pub fn file_id(&self) -> Option<&[u8]> {
        match self.trailer.get(b"ID").ok()? {
            Object::Array(items) => items.first()?.as_str().ok(),
            Object::String(bytes, _) => Some(bytes),
            _ => None,
        }
    }

    /// Resolves the trailer's `/Encrypt` entry to its dictionary, dereferencing an indirect
    /// object if the trailer points to one instead of embedding it directly.
    pub fn get_encrypted(&self) -> crate::error::Result<&Dictionary> {
        use crate::error::DecryptionError;
        match self.trailer.get(b"Encrypt")? {
            Object::Dictionary(dict) => Ok(dict),
            Object::Reference(id) => self
                .get_object(*id)
                .ok_or_else(|| DecryptionError::MissingField("Encrypt".to_string()))?
                .as_dict(),
            _ => Err(DecryptionError::WrongFieldType("Encrypt").into()),
        }
    }

    /// The object id of the trailer's `/Encrypt` entry, if it is an indirect reference. The
    /// traversal driver excludes this object from encryption/decryption: its fields *are* the
    /// key material and must be written in plain form.
    pub fn encrypt_object_id(&self) -> Option<ObjectId> {
        match self.trailer.get(b"Encrypt").ok()? {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.trailer.has(b"Encrypt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn new_object_id_increments_from_one() {
        let mut doc = Document::new();
        assert_eq!(doc.new_object_id(), (1, 0));
        assert_eq!(doc.new_object_id(), (2, 0));
    }

    #[test]
    fn add_object_is_retrievable() {
        let mut doc = Document::new();
        let id = doc.add_object(Object::Integer(42));
        assert_eq!(doc.get_object(id), Some(&Object::Integer(42)));
    }

    #[test]
    fn file_id_reads_first_array_element() {
        let mut doc = Document::new();
        doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::string_literal(b"first-id".to_vec()),
                Object::string_literal(b"second-id".to_vec()),
            ]),
        );
        assert_eq!(doc.file_id(), Some(&b"first-id"[..]));
    }

    #[test]
    fn file_id_missing_is_none() {
        let doc = Document::new();
        assert_eq!(doc.file_id(), None);
    }
}
