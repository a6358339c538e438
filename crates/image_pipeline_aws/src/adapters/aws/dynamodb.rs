use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use serde_dynamo::Item;

use super::block_on;
use super::errors::classify;
use crate::adapters::provider::TableApi;
use crate::adapters::record_store::RecordStore;
use crate::runtime::contract::ImageRecord;
use crate::runtime::error::{idempotent, CreateOutcome, ProviderError};

#[derive(Debug, Clone)]
pub struct DynamoTables {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoTables {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

impl TableApi for DynamoTables {
    fn create_table(
        &self,
        name: &str,
        partition_key: &str,
    ) -> Result<CreateOutcome, ProviderError> {
        let key = KeySchemaElement::builder()
            .attribute_name(partition_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|error| ProviderError::other("CreateTable", error.to_string()))?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(partition_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|error| ProviderError::other("CreateTable", error.to_string()))?;

        let client = self.client.clone();
        let result = block_on(async move {
            client
                .create_table()
                .table_name(name)
                .key_schema(key)
                .attribute_definitions(attribute)
                .billing_mode(BillingMode::PayPerRequest)
                .send()
                .await
        });

        idempotent(
            result
                .map(|_| ())
                .map_err(|error| classify("CreateTable", error)),
        )
    }

    fn table_active(&self, name: &str) -> Result<bool, ProviderError> {
        let client = self.client.clone();
        let output = block_on(async move { client.describe_table().table_name(name).send().await })
            .map_err(|error| classify("DescribeTable", error))?;
        Ok(output
            .table()
            .and_then(|table| table.table_status())
            .is_some_and(|status| *status == TableStatus::Active))
    }
}

#[derive(Debug, Clone)]
pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoRecordStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

impl RecordStore for DynamoRecordStore {
    fn put_record(&self, record: &ImageRecord) -> Result<(), ProviderError> {
        let item: Item = serde_dynamo::to_item(record)
            .map_err(|error| ProviderError::other("PutItem", error.to_string()))?;

        let client = self.client.clone();
        let table = self.table.clone();
        block_on(async move {
            client
                .put_item()
                .table_name(table)
                .set_item(Some(item.into()))
                .send()
                .await
        })
        .map(|_| ())
        .map_err(|error| classify("PutItem", error))
    }
}
