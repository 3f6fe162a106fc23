use crate::directory::DirectoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// attributeSyntax of distinguished-name valued attributes.
pub const DN_SYNTAX: &str = "2.5.5.1";

/// systemFlags bit marking an attribute as constructed by the server.
pub const FLAG_ATTR_IS_CONSTRUCTED: i64 = 0x4;

/// Schema object as persisted on disk, one document per canonical name.
///
/// Field names are the lower-cased directory attribute names. Values are kept
/// in their directory string form; [`SchemaRecord`] is derived from this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectclass: Vec<String>,
    pub ldapdisplayname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributesyntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omsyntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issinglevalued: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rangelower: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rangeupper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systemflags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdnattid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclassof: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowedattributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systemonly: Option<String>,
}

impl SchemaObject {
    /// Build the persisted form of a directory entry.
    ///
    /// Returns `None` when the entry carries no display name, since the name is
    /// both the lookup key and the file name.
    pub fn from_entry(entry: &DirectoryEntry) -> Option<Self> {
        let name = entry.display_name()?.trim();
        if name.is_empty() {
            return None;
        }
        let first = |attr: &str| entry.first(attr).map(str::to_string);
        Some(Self {
            objectclass: entry.all("objectclass").to_vec(),
            ldapdisplayname: name.to_string(),
            attributesyntax: first("attributesyntax"),
            omsyntax: first("omsyntax"),
            issinglevalued: first("issinglevalued"),
            rangelower: first("rangelower"),
            rangeupper: first("rangeupper"),
            systemflags: first("systemflags"),
            rdnattid: first("rdnattid"),
            subclassof: first("subclassof"),
            allowedattributes: entry.all("allowedattributes").to_vec(),
            systemonly: first("systemonly"),
        })
    }

    /// Canonical (lower-cased) name.
    pub fn canonical_name(&self) -> String {
        self.ldapdisplayname.to_lowercase()
    }

    fn has_object_class(&self, class: &str) -> bool {
        self.objectclass.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    fn is_class(&self) -> bool {
        if self.has_object_class("classSchema") {
            return true;
        }
        if self.has_object_class("attributeSchema") {
            return false;
        }
        self.subclassof.is_some() && self.attributesyntax.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    pub syntax: String,
    pub sub_syntax: Option<String>,
    pub single_valued: bool,
    pub constructed: bool,
    pub range_lower: Option<i64>,
    pub range_upper: Option<i64>,
}

impl AttributeSchema {
    /// Whether values are distinguished names that point at other objects.
    pub fn resolvable(&self) -> bool {
        self.syntax == DN_SYNTAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchema {
    pub rdn_attribute: Option<String>,
    pub superclass: Option<String>,
    pub allowed_attributes: BTreeSet<String>,
    pub system_only: bool,
}

impl ClassSchema {
    pub fn allows(&self, attribute: &str) -> bool {
        self.allowed_attributes.contains(&attribute.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Attribute(AttributeSchema),
    Class(ClassSchema),
}

/// Structural metadata for one attribute or class, keyed by canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    pub name: String,
    pub kind: SchemaKind,
}

impl SchemaRecord {
    pub fn as_attribute(&self) -> Option<&AttributeSchema> {
        match &self.kind {
            SchemaKind::Attribute(attr) => Some(attr),
            SchemaKind::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassSchema> {
        match &self.kind {
            SchemaKind::Class(class) => Some(class),
            SchemaKind::Attribute(_) => None,
        }
    }
}

impl From<&SchemaObject> for SchemaRecord {
    fn from(object: &SchemaObject) -> Self {
        let kind = if object.is_class() {
            SchemaKind::Class(ClassSchema {
                rdn_attribute: object.rdnattid.clone(),
                superclass: object.subclassof.clone(),
                allowed_attributes: object
                    .allowedattributes
                    .iter()
                    .map(|a| a.to_lowercase())
                    .collect(),
                system_only: parse_flag(object.systemonly.as_deref()),
            })
        } else {
            let flags = parse_int(object.systemflags.as_deref()).unwrap_or(0);
            SchemaKind::Attribute(AttributeSchema {
                syntax: object.attributesyntax.clone().unwrap_or_default(),
                sub_syntax: object.omsyntax.clone(),
                single_valued: parse_flag(object.issinglevalued.as_deref()),
                constructed: flags & FLAG_ATTR_IS_CONSTRUCTED != 0,
                range_lower: parse_int(object.rangelower.as_deref()),
                range_upper: parse_int(object.rangeupper.as_deref()),
            })
        };
        Self {
            name: object.canonical_name(),
            kind,
        }
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("TRUE"))
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// Written last by a successful build; its presence means "ready".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessMarker {
    pub built_at: DateTime<Utc>,
    pub attributes: usize,
    pub classes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute_object(name: &str, syntax: &str) -> SchemaObject {
        SchemaObject {
            objectclass: vec!["top".into(), "attributeSchema".into()],
            ldapdisplayname: name.into(),
            attributesyntax: Some(syntax.into()),
            omsyntax: Some("64".into()),
            issinglevalued: Some("TRUE".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_attribute_record_is_lowercased() {
        let record = SchemaRecord::from(&attribute_object("sAMAccountName", "2.5.5.12"));
        assert_eq!(record.name, "samaccountname");
        let attr = record.as_attribute().unwrap();
        assert!(attr.single_valued);
        assert!(!attr.constructed);
        assert!(!attr.resolvable());
    }

    #[test]
    fn test_constructed_flag_from_system_flags() {
        let mut object = attribute_object("tokenGroups", "2.5.5.17");
        object.systemflags = Some("134217748".into());
        let record = SchemaRecord::from(&object);
        assert!(record.as_attribute().unwrap().constructed);

        object.systemflags = Some("16".into());
        let record = SchemaRecord::from(&object);
        assert!(!record.as_attribute().unwrap().constructed);
    }

    #[test]
    fn test_dn_syntax_is_resolvable() {
        let record = SchemaRecord::from(&attribute_object("manager", DN_SYNTAX));
        assert!(record.as_attribute().unwrap().resolvable());
    }

    #[test]
    fn test_range_bounds_parsed() {
        let mut object = attribute_object("cn", "2.5.5.12");
        object.rangelower = Some("1".into());
        object.rangeupper = Some("64".into());
        let attr = SchemaRecord::from(&object).as_attribute().cloned().unwrap();
        assert_eq!(attr.range_lower, Some(1));
        assert_eq!(attr.range_upper, Some(64));
    }

    #[test]
    fn test_class_record() {
        let object = SchemaObject {
            objectclass: vec!["top".into(), "classSchema".into()],
            ldapdisplayname: "User".into(),
            rdnattid: Some("cn".into()),
            subclassof: Some("organizationalPerson".into()),
            allowedattributes: vec!["sAMAccountName".into(), "memberOf".into()],
            systemonly: Some("FALSE".into()),
            ..Default::default()
        };
        let record = SchemaRecord::from(&object);
        assert_eq!(record.name, "user");
        let class = record.as_class().unwrap();
        assert!(class.allows("SAMACCOUNTNAME"));
        assert!(!class.allows("unicodePwd"));
        assert!(!class.system_only);
        assert!(record.as_attribute().is_none());
    }

    #[test]
    fn test_missing_fields_are_omitted_on_disk() {
        let json = serde_json::to_value(attribute_object("cn", "2.5.5.12")).unwrap();
        let map = json.as_object().unwrap();
        assert!(map.contains_key("issinglevalued"));
        assert!(!map.contains_key("rangelower"));
        assert!(!map.contains_key("allowedattributes"));
    }
}
