use crate::aws::load_sdk_config;
use crate::config::{AwsConfig, MetadataStoreConfig};
use crate::metadata::attributes::{columns, from_item, key_item, to_item, Item};
use crate::metadata::error::MetadataError;
use crate::metadata::models::{FlagUpdate, ImageRecord, RecordFilter, RecordKey};
use crate::metadata::store::MetadataStore;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, error, info};

/// A DynamoDB implementation of the MetadataStore trait.
///
/// The table is keyed by `category` (partition, S) and `updateTime` (sort, N).
#[derive(Clone)]
pub struct DynamoMetadataStore {
    client: Client,
    table: String,
}

impl DynamoMetadataStore {
    /// Create a store with its own SDK configuration
    #[allow(dead_code)]
    pub async fn new(
        aws: &AwsConfig,
        config: &MetadataStoreConfig,
    ) -> Result<Self, MetadataError> {
        if config.table.is_empty() {
            return Err(MetadataError::ConfigurationError(
                "metadata_store.table must not be empty".to_string(),
            ));
        }

        let sdk_config = load_sdk_config(aws).await;
        Ok(Self::from_sdk_config(&sdk_config, config))
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, config: &MetadataStoreConfig) -> Self {
        let mut client_builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(endpoint) = &config.endpoint {
            info!("Setting custom DynamoDB endpoint: {}", endpoint);
            client_builder = client_builder.endpoint_url(endpoint);
        }

        info!("Created DynamoDB metadata store for table {}", config.table);

        Self {
            client: Client::from_conf(client_builder.build()),
            table: config.table.clone(),
        }
    }

    /// Fetch one page of a category query
    async fn query_page(
        &self,
        category: &str,
        filter: RecordFilter,
        start_key: Option<Item>,
    ) -> Result<(Vec<Item>, Option<Item>), MetadataError> {
        let mut request = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#category = :category")
            .expression_attribute_names("#category", columns::CATEGORY)
            .expression_attribute_values(":category", AttributeValue::S(category.to_string()))
            .scan_index_forward(false)
            .set_exclusive_start_key(start_key);

        let mut conditions = Vec::new();
        if !filter.include_removed {
            // Items written without the column count as live
            conditions.push("(attribute_not_exists(#removed) OR #removed = :removed)");
            request = request
                .expression_attribute_names("#removed", columns::REMOVED)
                .expression_attribute_values(":removed", AttributeValue::Bool(false));
        }
        if let Some(featured) = filter.featured {
            conditions.push("#featured = :featured");
            request = request
                .expression_attribute_names("#featured", columns::FEATURED)
                .expression_attribute_values(":featured", AttributeValue::Bool(featured));
        }
        if !conditions.is_empty() {
            request = request.filter_expression(conditions.join(" AND "));
        }

        let output = request.send().await.map_err(|e| {
            error!("Failed to query category {}: {}", category, DisplayErrorContext(&e));
            MetadataError::ReadError(format!(
                "query of category {} failed: {}",
                category,
                DisplayErrorContext(&e)
            ))
        })?;

        Ok((
            output.items().to_vec(),
            output.last_evaluated_key().cloned(),
        ))
    }
}

/// Build `SET` clauses for the flags an update touches
fn update_expression(update: &FlagUpdate) -> Option<(String, Vec<(&'static str, AttributeValue)>)> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(featured) = update.featured {
        clauses.push("#featured = :featured");
        values.push((":featured", AttributeValue::Bool(featured)));
    }
    if let Some(removed) = update.removed {
        clauses.push("#removed = :removed");
        values.push((":removed", AttributeValue::Bool(removed)));
    }

    if clauses.is_empty() {
        None
    } else {
        Some((format!("SET {}", clauses.join(", ")), values))
    }
}

#[async_trait]
impl MetadataStore for DynamoMetadataStore {
    async fn get_record(&self, key: &RecordKey) -> Result<Option<ImageRecord>, MetadataError> {
        debug!("Fetching record {}", key);

        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(key_item(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                MetadataError::ReadError(format!(
                    "get of {} failed: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        output.item().map(from_item).transpose()
    }

    async fn put_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        debug!("Writing record {}", record.key());

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(record)))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to write record {}: {}", record.key(), DisplayErrorContext(&e));
                MetadataError::WriteError(format!(
                    "put of {} failed: {}",
                    record.key(),
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn create_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        debug!("Creating record {}", record.key());

        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(record)))
            .condition_expression("attribute_not_exists(#category)")
            .expression_attribute_names("#category", columns::CATEGORY)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(MetadataError::ConditionFailed(record.key().to_string()))
            }
            Err(e) => {
                error!("Failed to create record {}: {}", record.key(), DisplayErrorContext(&e));
                Err(MetadataError::WriteError(format!(
                    "create of {} failed: {}",
                    record.key(),
                    DisplayErrorContext(&e)
                )))
            }
        }
    }

    async fn update_flags(
        &self,
        key: &RecordKey,
        update: FlagUpdate,
    ) -> Result<(), MetadataError> {
        let Some((expression, values)) = update_expression(&update) else {
            return Err(MetadataError::WriteError(format!(
                "update of {} changes no flags",
                key
            )));
        };

        let mut condition = "attribute_exists(#category)".to_string();
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(key_item(key)))
            .update_expression(expression)
            .expression_attribute_names("#category", columns::CATEGORY);

        if update.featured.is_some() || update.expect_featured.is_some() {
            request = request.expression_attribute_names("#featured", columns::FEATURED);
        }
        if update.removed.is_some() {
            request = request.expression_attribute_names("#removed", columns::REMOVED);
        }
        for (placeholder, value) in values {
            request = request.expression_attribute_values(placeholder, value);
        }
        if let Some(expected) = update.expect_featured {
            condition.push_str(" AND #featured = :expected");
            request = request.expression_attribute_values(":expected", AttributeValue::Bool(expected));
        }

        debug!("Updating flags of {} ({})", key, condition);

        match request.condition_expression(condition).send().await {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(MetadataError::ConditionFailed(key.to_string()))
            }
            Err(e) => {
                error!("Failed to update record {}: {}", key, DisplayErrorContext(&e));
                Err(MetadataError::WriteError(format!(
                    "update of {} failed: {}",
                    key,
                    DisplayErrorContext(&e)
                )))
            }
        }
    }

    async fn query_category(
        &self,
        category: &str,
        filter: RecordFilter,
    ) -> Result<Vec<ImageRecord>, MetadataError> {
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let (items, last_key) = self.query_page(category, filter, start_key).await?;
            for item in &items {
                records.push(from_item(item)?);
            }

            match last_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(
            "Query of category {} returned {} records",
            category,
            records.len()
        );
        Ok(records)
    }
}
