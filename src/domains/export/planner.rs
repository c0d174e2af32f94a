use log::warn;

use crate::domains::catalog::{FieldType, ObjectDescriptor, SchemaCatalog};
use crate::domains::export::types::{ColumnPlan, TimestampField};

/// Lookups onto this object are never expanded into relationship columns
const GENERIC_USER_OBJECT: &str = "User";

/// Work out which columns to select for `descriptor`.
///
/// Fields are visited in declaration order. Compound address and location
/// fields are dropped, base64 fields go to the blob list and everything else
/// becomes a column. A lookup with a single, non-User target and a
/// relationship name is followed by one `Relationship.Field` column per
/// id-lookup or name field of the target, inlined right after the lookup.
pub fn plan(descriptor: &ObjectDescriptor, catalog: &SchemaCatalog) -> ColumnPlan {
    let mut plan = ColumnPlan::new(&descriptor.name);

    for field in &descriptor.fields {
        if field.field_type.is_compound() {
            continue;
        }
        if field.field_type == FieldType::Base64 {
            plan.blob_fields.push(field.name.clone());
            continue;
        }

        plan.columns.push(field.name.clone());

        match field.single_relationship() {
            Some((target, relationship)) if target != GENERIC_USER_OBJECT => {
                let Some(referenced) = catalog.lookup(target) else {
                    warn!(
                        "referenced object not described: {} (via {}.{})",
                        target, descriptor.name, field.name
                    );
                    plan.unresolved_references.push(target.to_string());
                    continue;
                };
                plan.columns.extend(
                    referenced
                        .fields
                        .iter()
                        .filter(|f| f.surfaces_through_relationship())
                        .map(|f| format!("{}.{}", relationship, f.name)),
                );
            }
            _ => {
                if let Some(timestamp) = TimestampField::from_field_name(&field.name) {
                    plan.note_timestamp(timestamp);
                }
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::catalog::FieldDescriptor;

    fn account() -> ObjectDescriptor {
        ObjectDescriptor::new(
            "Account",
            vec![
                FieldDescriptor::plain("Id"),
                FieldDescriptor::plain("Name").with_name_pointing(),
                FieldDescriptor::lookup("OwnerId", "User", "Owner"),
                FieldDescriptor::lookup("ParentId", "Account", "Parent"),
            ],
        )
    }

    #[test]
    fn test_account_relationship_scenario() {
        let catalog = SchemaCatalog::from_descriptors(vec![
            account(),
            ObjectDescriptor::new(
                "User",
                vec![FieldDescriptor::plain("Username").with_id_lookup()],
            ),
        ]);

        let plan = plan(&account(), &catalog);

        assert_eq!(plan.columns, vec!["Id", "Name", "OwnerId", "ParentId", "Parent.Name"]);
        assert!(plan.blob_fields.is_empty());
        assert!(plan.unresolved_references.is_empty());
    }

    #[test]
    fn test_relationship_columns_follow_target_declaration_order() {
        let contact = ObjectDescriptor::new(
            "Contact",
            vec![
                FieldDescriptor::plain("Id").with_id_lookup(),
                FieldDescriptor::lookup("AccountId", "Account", "Account"),
                FieldDescriptor::plain("Email"),
                FieldDescriptor::plain("LastModifiedDate"),
            ],
        );
        let target = ObjectDescriptor::new(
            "Account",
            vec![
                FieldDescriptor::plain("Id").with_id_lookup(),
                FieldDescriptor::plain("Description"),
                FieldDescriptor::plain("AccountNumber").with_id_lookup(),
                FieldDescriptor::plain("Name").with_name_pointing(),
            ],
        );
        let catalog = SchemaCatalog::from_descriptors(vec![contact.clone(), target]);

        let plan = plan(&contact, &catalog);

        assert_eq!(
            plan.columns,
            vec![
                "Id",
                "AccountId",
                "Account.Id",
                "Account.AccountNumber",
                "Account.Name",
                "Email",
                "LastModifiedDate",
            ]
        );
        assert_eq!(plan.timestamp_field, Some(TimestampField::LastModifiedDate));
    }

    #[test]
    fn test_compound_and_blob_fields() {
        let attachment = ObjectDescriptor::new(
            "Attachment",
            vec![
                FieldDescriptor::plain("Id"),
                FieldDescriptor::new("BillingAddress", FieldType::Address),
                FieldDescriptor::new("Body", FieldType::Base64),
                FieldDescriptor::new("Geo__c", FieldType::Location),
                FieldDescriptor::plain("Name"),
            ],
        );

        let plan = plan(&attachment, &SchemaCatalog::default());

        assert_eq!(plan.columns, vec!["Id", "Name"]);
        assert_eq!(plan.blob_fields, vec!["Body"]);
    }

    #[test]
    fn test_missing_target_keeps_local_column() {
        let order = ObjectDescriptor::new(
            "Order__c",
            vec![
                FieldDescriptor::plain("Id"),
                FieldDescriptor::lookup("Shop__c", "Shop__c", "Shop__r"),
                FieldDescriptor::plain("CreatedDate"),
            ],
        );

        let plan = plan(&order, &SchemaCatalog::default());

        assert_eq!(plan.columns, vec!["Id", "Shop__c", "CreatedDate"]);
        assert_eq!(plan.unresolved_references, vec!["Shop__c"]);
        assert_eq!(plan.timestamp_field, Some(TimestampField::CreatedDate));
    }

    #[test]
    fn test_polymorphic_lookup_is_not_expanded() {
        let mut who = FieldDescriptor::lookup("WhoId", "Contact", "Who");
        who.reference_to.push("Lead".to_string());
        let task = ObjectDescriptor::new("Task", vec![FieldDescriptor::plain("Id"), who]);
        let catalog = SchemaCatalog::from_descriptors(vec![ObjectDescriptor::new(
            "Contact",
            vec![FieldDescriptor::plain("Name").with_name_pointing()],
        )]);

        let plan = plan(&task, &catalog);

        assert_eq!(plan.columns, vec!["Id", "WhoId"]);
    }

    #[test]
    fn test_timestamp_priority_ignores_declaration_order() {
        let object = ObjectDescriptor::new(
            "Case",
            vec![
                FieldDescriptor::plain("CreatedDate"),
                FieldDescriptor::plain("LastModifiedDate"),
                FieldDescriptor::plain("SystemModstamp"),
            ],
        );
        let plan = plan(&object, &SchemaCatalog::default());
        assert_eq!(plan.timestamp_field, Some(TimestampField::SystemModstamp));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let catalog = SchemaCatalog::from_descriptors(vec![account()]);
        assert_eq!(plan(&account(), &catalog), plan(&account(), &catalog));
    }
}
