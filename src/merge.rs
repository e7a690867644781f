//! Laying edited settings over an existing document.

use serde_json::Value;

/// Apply `edits` to `document` in place.
///
/// The document editor builds `edits` as a nested object from the edited
/// keys, so only the leaves named there change; sibling keys, and whatever
/// the editor didn't touch, survive. A null edit leaves the document value
/// alone, matching the editors' "null changes nothing" rule. Lists are
/// replaced as a whole.
///
/// ```
/// use serde_json::json;
/// use config_cascade::merge::apply_edits;
///
/// let mut document = json!({"db": {"host": "localhost", "port": 5432}});
/// apply_edits(&mut document, json!({"db": {"port": 6432}}));
/// assert_eq!(document, json!({"db": {"host": "localhost", "port": 6432}}));
/// ```
pub fn apply_edits(document: &mut Value, edits: Value) {
    match (document, edits) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(edits)) => {
            for (key, edit) in edits {
                match target.get_mut(&key) {
                    Some(slot) => apply_edits(slot, edit),
                    None if !edit.is_null() => {
                        target.insert(key, edit);
                    }
                    None => {}
                }
            }
        }
        (slot, edit) => *slot = edit,
    }
}
