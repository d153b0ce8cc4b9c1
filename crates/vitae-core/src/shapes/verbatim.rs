//! Record values the typed attributes cannot hold.
//!
//! Fabric records carry `null` for unset attributes and sometimes values of a
//! type the engine does not model (`"fontWeight": "600"`). Such keys load as
//! the attribute's default and are written back as found, as long as the
//! attribute still holds the value it loaded as.

use super::SceneObject;
use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Values kept from the record an object was loaded from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verbatim {
    /// The `type` tag as written, when it was an alias.
    tag: Option<String>,
    /// Attribute key to (value it loaded as, value as written).
    values: BTreeMap<String, (Value, Value)>,
}

impl Verbatim {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.values.is_empty()
    }

    /// The value a key was written with, if it was kept aside on load.
    pub fn written(&self, key: &str) -> Option<&Value> {
        self.values.get(key).map(|(_, written)| written)
    }

    pub(crate) fn forget(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn restore(&self, fields: &mut Map<String, Value>) {
        for (key, (loaded_as, written)) in &self.values {
            if fields.get(key).unwrap_or(&Value::Null) == loaded_as {
                fields.insert(key.clone(), written.clone());
            }
        }
        if let Some(tag) = &self.tag {
            fields.insert("type".to_string(), Value::String(tag.clone()));
        }
    }
}

/// Whether `value` deserializes as attribute `key` of a `tag` record.
fn fits(tag: &Value, key: &str, value: &Value) -> bool {
    let mut single = Map::new();
    single.insert("type".to_string(), tag.clone());
    single.insert(key.to_string(), value.clone());
    SceneObject::deserialize(&Value::Object(single)).is_ok()
}

impl SceneObject {
    fn from_record(record: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(mut fields) = record else {
            return SceneObject::deserialize(record);
        };
        let tag = fields.get("type").cloned();

        let mut held = Map::new();
        let nulls: Vec<String> = fields
            .iter()
            .filter(|(key, value)| key.as_str() != "type" && value.is_null())
            .map(|(key, _)| key.clone())
            .collect();
        for key in nulls {
            fields.remove(&key);
            held.insert(key, Value::Null);
        }

        let record = Value::Object(fields);
        let mut object = match SceneObject::deserialize(&record) {
            Ok(object) => object,
            Err(e) => {
                let (Some(tag), Value::Object(mut fields)) = (tag.as_ref(), record) else {
                    return Err(e);
                };
                let misfits: Vec<String> = fields
                    .iter()
                    .filter(|(key, value)| key.as_str() != "type" && !fits(tag, key, value))
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in misfits {
                    if let Some(value) = fields.remove(&key) {
                        held.insert(key, value);
                    }
                }
                SceneObject::deserialize(Value::Object(fields))?
            }
        };

        let mut verbatim = Verbatim {
            tag: match tag {
                Some(Value::String(tag)) if tag != object.kind().tag() => Some(tag),
                _ => None,
            },
            values: BTreeMap::new(),
        };
        if !held.is_empty() {
            let typed = SceneObject::serialize(&object, serde_json::value::Serializer)?;
            for (key, written) in held {
                let loaded_as = typed.get(&key).cloned().unwrap_or(Value::Null);
                verbatim.values.insert(key, (loaded_as, written));
            }
        }
        object.common_mut().verbatim = verbatim;
        Ok(object)
    }
}

impl Serialize for SceneObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let verbatim = &self.common().verbatim;
        if verbatim.is_empty() {
            return SceneObject::serialize(self, serializer);
        }
        let mut value =
            SceneObject::serialize(self, serde_json::value::Serializer).map_err(S::Error::custom)?;
        if let Value::Object(fields) = &mut value {
            verbatim.restore(fields);
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SceneObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        SceneObject::from_record(record).map_err(D::Error::custom)
    }
}
