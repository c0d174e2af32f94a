use std::collections::HashMap;

use log::{debug, info};

use crate::domains::catalog::types::{ObjectDescriptor, ObjectSummary};
use crate::errors::SessionResult;
use crate::session::Session;

/// Maximum number of object types per describe call
pub const DESCRIBE_BATCH_SIZE: usize = 100;

/// Describe metadata for every object type, indexed by lowercase name.
/// Built once before any export and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    describes: HashMap<String, ObjectDescriptor>,
}

impl SchemaCatalog {
    /// Describe every summarised object type in batches of [`DESCRIBE_BATCH_SIZE`].
    pub async fn build<S: Session + ?Sized>(
        session: &S,
        summaries: &[ObjectSummary],
    ) -> SessionResult<Self> {
        let mut catalog = Self::default();

        for (batch_no, batch) in summaries.chunks(DESCRIBE_BATCH_SIZE).enumerate() {
            let names: Vec<String> = batch.iter().map(|s| s.name.clone()).collect();
            debug!("Describing batch {} ({} objects)", batch_no + 1, names.len());

            for descriptor in session.describe_sobjects(&names).await? {
                catalog.insert(descriptor);
            }
        }

        info!("Described {} object types", catalog.len());
        Ok(catalog)
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ObjectDescriptor>) -> Self {
        let mut catalog = Self::default();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        catalog
    }

    fn insert(&mut self, descriptor: ObjectDescriptor) {
        self.describes.insert(descriptor.name.to_lowercase(), descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&ObjectDescriptor> {
        self.describes.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.describes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.describes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::catalog::types::FieldDescriptor;
    use crate::session::mock::MockSession;

    fn objects(count: usize) -> Vec<ObjectDescriptor> {
        (0..count)
            .map(|i| {
                ObjectDescriptor::new(
                    &format!("Object{}__c", i),
                    vec![FieldDescriptor::plain("Id")],
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_build_describes_in_batches_of_100() {
        let session = MockSession::new(objects(250));
        let summaries = session.summaries();

        let catalog = SchemaCatalog::build(&session, &summaries).await.unwrap();

        assert_eq!(catalog.len(), 250);
        assert_eq!(session.describe_batch_sizes(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let session = MockSession::new(objects(3));
        let catalog = SchemaCatalog::build(&session, &session.summaries()).await.unwrap();

        assert!(catalog.lookup("object1__c").is_some());
        assert!(catalog.lookup("OBJECT2__C").is_some());
        assert!(catalog.lookup("Object3__c").is_none());
    }

    #[tokio::test]
    async fn test_describe_failure_is_returned() {
        let session = MockSession::new(objects(3)).fail_describe("INVALID_SESSION_ID");
        let result = SchemaCatalog::build(&session, &session.summaries()).await;
        assert!(result.is_err());
    }
}
