use crate::commands::{count, Out};
use crate::model::Resource;
use crate::resources::{ResourceCatalog, ResourceQuery};
use crate::Result;

/// Lists learning resources matching `query`. A missing or broken resources file gives an empty
/// list, not an error.
pub async fn list_resources(
    catalog: &ResourceCatalog,
    query: ResourceQuery,
) -> Result<Out<Vec<Resource>>> {
    let resources = catalog.list(&query).await;
    Ok(Out::new(
        format!("Found {}", count(resources.len(), "resource", "resources")),
        resources,
    ))
}
