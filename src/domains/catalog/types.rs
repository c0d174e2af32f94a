/// Declared field type, reduced to the kinds the exporter treats differently
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Compound address; its components are queried as separate fields
    Address,
    /// Compound geolocation
    Location,
    /// Large binary payload delivered base64-encoded
    Base64,
    /// Any other type, kept by its API name
    Plain(String),
}

impl FieldType {
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "address" => FieldType::Address,
            "location" => FieldType::Location,
            "base64" => FieldType::Base64,
            other => FieldType::Plain(other.to_string()),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, FieldType::Address | FieldType::Location)
    }
}

/// Describe metadata for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub reference_to: Vec<String>,
    pub relationship_name: Option<String>,
    pub id_lookup: bool,
    pub name_pointing: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            reference_to: Vec::new(),
            relationship_name: None,
            id_lookup: false,
            name_pointing: false,
        }
    }

    /// Plain field of type `string`
    pub fn plain(name: &str) -> Self {
        Self::new(name, FieldType::Plain("string".to_string()))
    }

    /// Single-target lookup with a relationship name
    pub fn lookup(name: &str, target: &str, relationship_name: &str) -> Self {
        Self {
            reference_to: vec![target.to_string()],
            relationship_name: Some(relationship_name.to_string()),
            ..Self::new(name, FieldType::Plain("reference".to_string()))
        }
    }

    pub fn with_id_lookup(mut self) -> Self {
        self.id_lookup = true;
        self
    }

    pub fn with_name_pointing(mut self) -> Self {
        self.name_pointing = true;
        self
    }

    /// The target object and relationship name, when this field references
    /// exactly one object type through a named relationship.
    pub fn single_relationship(&self) -> Option<(&str, &str)> {
        match (self.reference_to.as_slice(), self.relationship_name.as_deref()) {
            ([target], Some(relationship)) if !relationship.is_empty() => {
                Some((target.as_str(), relationship))
            }
            _ => None,
        }
    }

    /// Whether a relationship onto this field's object surfaces this field.
    pub fn surfaces_through_relationship(&self) -> bool {
        self.id_lookup || self.name_pointing
    }
}

/// Entry of the global describe: every object type the session can see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub name: String,
    pub queryable: bool,
    pub createable: bool,
}

impl ObjectSummary {
    pub fn new(name: &str, queryable: bool, createable: bool) -> Self {
        Self {
            name: name.to_string(),
            queryable,
            createable,
        }
    }
}

/// Full describe metadata for one object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub queryable: bool,
    pub createable: bool,
}

impl ObjectDescriptor {
    pub fn new(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            queryable: true,
            createable: true,
        }
    }

    pub fn summary(&self) -> ObjectSummary {
        ObjectSummary::new(&self.name, self.queryable, self.createable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(FieldType::from_api_name("address"), FieldType::Address);
        assert_eq!(FieldType::from_api_name("location"), FieldType::Location);
        assert_eq!(FieldType::from_api_name("base64"), FieldType::Base64);
        assert_eq!(
            FieldType::from_api_name("datetime"),
            FieldType::Plain("datetime".to_string())
        );
        assert!(FieldType::Address.is_compound());
        assert!(!FieldType::Base64.is_compound());
    }

    #[test]
    fn test_single_relationship() {
        let parent = FieldDescriptor::lookup("ParentId", "Account", "Parent");
        assert_eq!(parent.single_relationship(), Some(("Account", "Parent")));

        let mut polymorphic = FieldDescriptor::lookup("WhoId", "Contact", "Who");
        polymorphic.reference_to.push("Lead".to_string());
        assert_eq!(polymorphic.single_relationship(), None);

        let unnamed = FieldDescriptor::lookup("MasterId", "Account", "");
        assert_eq!(unnamed.single_relationship(), None);

        assert_eq!(FieldDescriptor::plain("Name").single_relationship(), None);
    }
}
