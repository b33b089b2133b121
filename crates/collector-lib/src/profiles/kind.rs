//! Provider-specific profile extraction

use serde_json::Value;
use tracing::{debug, warn};

use super::flatten::flatten;
use crate::error::{CollectorError, Result};
use crate::models::{ProfileRow, RecordType, ResourceTarget};
use crate::remote::ProfileClient;

/// Database server flavour; both expose configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerFlavor {
    MySql,
    MySqlFlexible,
}

/// Resource kinds with a registered profile extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    DatabaseServer(ServerFlavor),
    ManagedDatabase,
    StorageAccount,
}

impl ProfileKind {
    pub const SUPPORTED_PROVIDERS: [&'static str; 4] = [
        "Microsoft.DBforMySQL/servers",
        "Microsoft.DBforMySQL/flexibleServers",
        "Microsoft.Sql/servers",
        "Microsoft.Storage/storageAccounts",
    ];

    /// Resolve the extractor for a provider id
    pub fn from_provider(provider: &str) -> Result<Self> {
        match provider {
            "Microsoft.DBforMySQL/servers" => Ok(Self::DatabaseServer(ServerFlavor::MySql)),
            "Microsoft.DBforMySQL/flexibleServers" => {
                Ok(Self::DatabaseServer(ServerFlavor::MySqlFlexible))
            }
            "Microsoft.Sql/servers" => Ok(Self::ManagedDatabase),
            "Microsoft.Storage/storageAccounts" => Ok(Self::StorageAccount),
            other => Err(CollectorError::UnsupportedProvider(other.to_string())),
        }
    }

    /// api-version used for every call made on behalf of this kind
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::DatabaseServer(ServerFlavor::MySql) => "2017-12-01",
            Self::DatabaseServer(ServerFlavor::MySqlFlexible) => "2021-05-01",
            Self::ManagedDatabase => "2021-11-01",
            Self::StorageAccount => "2023-01-01",
        }
    }

    /// Fetch and flatten everything this kind knows about one resource
    pub async fn extract(
        &self,
        client: &dyn ProfileClient,
        target: &ResourceTarget<'_>,
    ) -> Result<Vec<ProfileRow>> {
        debug!(kind = ?self, resource_id = %target.resource_id(), "Extracting profile");
        match self {
            Self::DatabaseServer(_) => extract_database_server(client, target).await,
            Self::ManagedDatabase => extract_managed_database(client, target).await,
            Self::StorageAccount => extract_storage_account(client, target).await,
        }
    }
}

fn property_rows(target: &ResourceTarget<'_>, record: &Value, prefix: &[&str]) -> Vec<ProfileRow> {
    flatten(record, prefix)
        .into_iter()
        .map(|(name, value)| ProfileRow::new(target, RecordType::Property, name, value.to_string(), None))
        .collect()
}

async fn extract_database_server(
    client: &dyn ProfileClient,
    target: &ResourceTarget<'_>,
) -> Result<Vec<ProfileRow>> {
    let server_path = format!("{}/{}", target.provider, target.resource_name);
    let server = client.get(target.resource_group, &server_path).await?;
    let mut rows = property_rows(target, &server, &[]);

    let configs_path = format!("{}/configurations", server_path);
    let mut parameters: Vec<Parameter> = client
        .list(target.resource_group, &configs_path)
        .await?
        .iter()
        .map(Parameter::from_value)
        .collect();
    parameters.sort_by(|a, b| a.name.cmp(&b.name));

    rows.extend(parameters.into_iter().map(|p| {
        ProfileRow::new(target, RecordType::Parameter, p.name, p.value, p.description)
    }));
    Ok(rows)
}

async fn extract_managed_database(
    client: &dyn ProfileClient,
    target: &ResourceTarget<'_>,
) -> Result<Vec<ProfileRow>> {
    let (server, database) = split_server_database(target.resource_name)?;
    let path = format!("{}/{}/databases/{}", target.provider, server, database);
    let record = client.get(target.resource_group, &path).await?;
    Ok(property_rows(target, &record, &[]))
}

async fn extract_storage_account(
    client: &dyn ProfileClient,
    target: &ResourceTarget<'_>,
) -> Result<Vec<ProfileRow>> {
    let account_path = format!("{}/{}", target.provider, target.resource_name);
    let account = client.get(target.resource_group, &account_path).await?;
    let mut rows = property_rows(target, &account, &["account"]);

    let sub_resources = [
        ("container", "blobServices/default/containers"),
        ("fileshare", "fileServices/default/shares"),
    ];
    for (label, collection) in sub_resources {
        let path = format!("{}/{}", account_path, collection);
        for item in client.list(target.resource_group, &path).await? {
            match item.get("name").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => {
                    rows.extend(property_rows(target, &item, &[label, name]));
                }
                _ => warn!(
                    resource_id = %target.resource_id(),
                    collection = %collection,
                    "Skipping unnamed sub-resource"
                ),
            }
        }
    }
    Ok(rows)
}

/// `server/database` -> (server, database); first and last segments
fn split_server_database(resource_name: &str) -> Result<(&str, &str)> {
    let mut segments = resource_name.split('/');
    let server = segments.next().unwrap_or_default();
    let database = segments.last().unwrap_or(server);
    if server.is_empty() || database.is_empty() || server == resource_name {
        return Err(CollectorError::config(format!(
            "managed database resource `{}` must be named `server/database`",
            resource_name
        )));
    }
    Ok((server, database))
}

/// Server configuration parameter
struct Parameter {
    name: String,
    value: String,
    description: Option<String>,
}

impl Parameter {
    fn from_value(item: &Value) -> Self {
        let properties = item.get("properties");
        let field = |key: &str| properties.and_then(|p| p.get(key));

        Self {
            name: item
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            value: match field("value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
            description: field("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
