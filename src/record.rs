//! Conversion between JSON records and stored documents.
//!
//! Stored documents carry a database identifier (`_id`) whose native type is
//! not plain JSON. Responses render every document as relaxed JSON with the
//! identifier replaced by its string form.

use mongodb::bson::{self, Bson, Document};
use serde_json::{Map, Value};

/// Name of the identifier field assigned by the database
pub const ID_FIELD: &str = "_id";

/// Render an identifier as a string.
///
/// Object ids become their 24-character hex form and strings pass through.
/// Numbers use their decimal text; anything else falls back to compact JSON.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(n) => n.to_string(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// Convert a stored document into a JSON object with a string `_id`.
pub fn document_to_json(mut document: Document) -> Value {
    let id = document.remove(ID_FIELD);

    let mut object = Map::with_capacity(document.len() + 1);
    if let Some(id) = id {
        object.insert(ID_FIELD.to_string(), Value::String(id_to_string(&id)));
    }
    for (key, value) in document {
        object.insert(key, value.into_relaxed_extjson());
    }
    Value::Object(object)
}

/// Encode a JSON object as a document ready for insertion.
pub fn json_to_document(object: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    bson::to_document(object)
}
