//! Table lifecycle tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use localddb_core::DynamoDBConfig;

    use crate::Emulator;

    #[test]
    fn test_should_create_table_in_creating_state() {
        let emu = Emulator::new();
        let body = emu.ok(
            "CreateTable",
            json!({
                "TableName": "users",
                "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 3},
            }),
        );
        let desc = &body["TableDescription"];
        assert_eq!(desc["TableStatus"], "CREATING");
        assert_eq!(desc["TableName"], "users");
        assert_eq!(desc["ItemCount"], 0);
        assert_eq!(desc["TableSizeBytes"], 0);
        assert_eq!(
            desc["TableArn"],
            "arn:aws:dynamodb:us-east-1:000000000000:table/users"
        );
        assert_eq!(
            desc["ProvisionedThroughput"],
            json!({"NumberOfDecreasesToday": 0, "ReadCapacityUnits": 5, "WriteCapacityUnits": 3})
        );
        assert!(desc["CreationDateTime"].as_f64().is_some());

        assert_eq!(emu.describe("users")["TableStatus"], "CREATING");
        emu.settle();
        assert_eq!(emu.describe("users")["TableStatus"], "ACTIVE");
    }

    #[test]
    fn test_should_activate_indexes_with_the_table() {
        let emu = Emulator::new();
        emu.range_table("events");
        let desc = emu.describe("events");
        assert_eq!(desc["TableStatus"], "ACTIVE");
        assert_eq!(desc["GlobalSecondaryIndexes"][0]["IndexStatus"], "ACTIVE");
        assert_eq!(
            desc["GlobalSecondaryIndexes"][0]["IndexArn"],
            "arn:aws:dynamodb:us-east-1:000000000000:table/events/index/byD"
        );
        assert_eq!(desc["LocalSecondaryIndexes"][0]["IndexName"], "byC");
    }

    #[test]
    fn test_should_reject_existing_table_name() {
        let emu = Emulator::new();
        emu.hash_table("dup", "S");
        let (kind, message) = emu.err(
            "CreateTable",
            json!({
                "TableName": "dup",
                "AttributeDefinitions": [{"AttributeName": "a", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        assert_eq!(kind, "ResourceInUseException");
        assert_eq!(message, "Table already exists: dup");
    }

    #[test]
    fn test_should_enforce_table_count_limit() {
        let emu = Emulator::with_config(DynamoDBConfig {
            max_tables: 1,
            ..DynamoDBConfig::default()
        });
        emu.hash_table("one", "S");
        let (kind, message) = emu.err(
            "CreateTable",
            json!({
                "TableName": "two",
                "AttributeDefinitions": [{"AttributeName": "a", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        assert_eq!(kind, "LimitExceededException");
        assert_eq!(
            message,
            "Subscriber limit exceeded: Tables are limited to 1 per account"
        );
    }

    #[test]
    fn test_should_report_missing_table() {
        let emu = Emulator::new();
        let (kind, message) = emu.err("DescribeTable", json!({"TableName": "nope"}));
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(message, "Requested resource not found: Table: nope not found");
        let (_, message) = emu.err("DeleteTable", json!({"TableName": "nope"}));
        assert_eq!(message, "Requested resource not found: Table: nope not found");
    }

    #[test]
    fn test_should_page_through_table_names() {
        let emu = Emulator::new();
        for name in ["ccc", "aaa", "bbb", "ddd"] {
            emu.hash_table(name, "S");
        }
        let page = emu.ok("ListTables", json!({"Limit": 2}));
        assert_eq!(
            page,
            json!({"TableNames": ["aaa", "bbb"], "LastEvaluatedTableName": "bbb"})
        );
        let page = emu.ok(
            "ListTables",
            json!({"Limit": 2, "ExclusiveStartTableName": "bbb"}),
        );
        assert_eq!(page, json!({"TableNames": ["ccc", "ddd"]}));
        let page = emu.ok("ListTables", json!({"ExclusiveStartTableName": "b"}));
        assert_eq!(page, json!({"TableNames": ["bbb", "ccc", "ddd"]}));
    }

    #[test]
    fn test_should_stamp_increase_and_keep_old_units_while_updating() {
        let emu = Emulator::new();
        emu.hash_table("tp", "S");
        let now = emu.describe("tp")["CreationDateTime"].as_f64().unwrap() + 1.0;

        let body = emu.ok(
            "UpdateTable",
            json!({
                "TableName": "tp",
                "ProvisionedThroughput": {"ReadCapacityUnits": 3, "WriteCapacityUnits": 2},
            }),
        );
        let desc = &body["TableDescription"];
        assert_eq!(desc["TableStatus"], "UPDATING");
        let throughput = &desc["ProvisionedThroughput"];
        assert_eq!(throughput["ReadCapacityUnits"], 2);
        assert_eq!(throughput["LastIncreaseDateTime"].as_f64(), Some(now));
        assert!(throughput.get("LastDecreaseDateTime").is_none());

        let (kind, message) = emu.err(
            "UpdateTable",
            json!({
                "TableName": "tp",
                "ProvisionedThroughput": {"ReadCapacityUnits": 4, "WriteCapacityUnits": 2},
            }),
        );
        assert_eq!(kind, "ResourceInUseException");
        assert_eq!(
            message,
            "Attempt to change a resource which is still in use: Table is being updated: tp"
        );

        emu.settle();
        let desc = emu.describe("tp");
        assert_eq!(desc["TableStatus"], "ACTIVE");
        assert_eq!(desc["ProvisionedThroughput"]["ReadCapacityUnits"], 3);
        assert_eq!(desc["ProvisionedThroughput"]["NumberOfDecreasesToday"], 0);
    }

    #[test]
    fn test_should_count_decrease_once_update_completes() {
        let emu = Emulator::new();
        emu.hash_table("dec", "S");
        let body = emu.ok(
            "UpdateTable",
            json!({
                "TableName": "dec",
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 2},
            }),
        );
        let throughput = &body["TableDescription"]["ProvisionedThroughput"];
        assert_eq!(throughput["NumberOfDecreasesToday"], 0);
        assert!(throughput["LastDecreaseDateTime"].as_f64().is_some());
        assert!(throughput.get("LastIncreaseDateTime").is_none());

        emu.settle();
        let desc = emu.describe("dec");
        assert_eq!(desc["ProvisionedThroughput"]["NumberOfDecreasesToday"], 1);
        assert_eq!(desc["ProvisionedThroughput"]["ReadCapacityUnits"], 1);
    }

    #[test]
    fn test_should_refuse_unchanged_throughput() {
        let emu = Emulator::new();
        emu.hash_table("same", "S");
        let (kind, message) = emu.err(
            "UpdateTable",
            json!({
                "TableName": "same",
                "ProvisionedThroughput": {"ReadCapacityUnits": 2, "WriteCapacityUnits": 2},
            }),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(
            message,
            "The provisioned throughput for the table will not change. The requested value \
             equals the current value. Current ReadCapacityUnits provisioned for the table: 2. \
             Requested ReadCapacityUnits: 2. Current WriteCapacityUnits provisioned for the \
             table: 2. Requested WriteCapacityUnits: 2. Refer to the Amazon DynamoDB Developer \
             Guide for current limits and how to request higher limits."
        );
    }

    #[test]
    fn test_should_update_global_index_throughput() {
        let emu = Emulator::new();
        emu.range_table("gsi");
        let body = emu.ok(
            "UpdateTable",
            json!({
                "TableName": "gsi",
                "GlobalSecondaryIndexUpdates": [{"Update": {
                    "IndexName": "byD",
                    "ProvisionedThroughput": {"ReadCapacityUnits": 4, "WriteCapacityUnits": 4},
                }}],
            }),
        );
        let index = &body["TableDescription"]["GlobalSecondaryIndexes"][0];
        assert_eq!(index["IndexStatus"], "UPDATING");
        assert_eq!(index["ProvisionedThroughput"]["ReadCapacityUnits"], 1);

        emu.settle();
        let index = &emu.describe("gsi")["GlobalSecondaryIndexes"][0];
        assert_eq!(index["IndexStatus"], "ACTIVE");
        assert_eq!(index["ProvisionedThroughput"]["ReadCapacityUnits"], 4);

        let (kind, message) = emu.err(
            "UpdateTable",
            json!({
                "TableName": "gsi",
                "GlobalSecondaryIndexUpdates": [{"Update": {
                    "IndexName": "missing",
                    "ProvisionedThroughput": {"ReadCapacityUnits": 4, "WriteCapacityUnits": 4},
                }}],
            }),
        );
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(message, "Requested resource not found: Index: missing not found");
    }

    #[test]
    fn test_should_delete_table_after_delay() {
        let emu = Emulator::new();
        emu.hash_table("gone", "S");
        let body = emu.ok("DeleteTable", json!({"TableName": "gone"}));
        assert_eq!(body["TableDescription"]["TableStatus"], "DELETING");

        let (_, message) = emu.err("DeleteTable", json!({"TableName": "gone"}));
        assert_eq!(
            message,
            "Attempt to change a resource which is still in use: Table is being deleted: gone"
        );
        let (kind, message) = emu.err(
            "GetItem",
            json!({"TableName": "gone", "Key": {"a": {"S": "x"}}}),
        );
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(message, "Requested resource not found");

        emu.settle();
        let (kind, _) = emu.err("DescribeTable", json!({"TableName": "gone"}));
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(emu.ok("ListTables", json!({})), json!({"TableNames": []}));
    }

    #[test]
    fn test_should_not_let_old_transitions_touch_recreated_table() {
        let emu = Emulator::new();
        emu.hash_table("again", "S");
        emu.ok("DeleteTable", json!({"TableName": "again"}));
        emu.settle();
        emu.ok(
            "CreateTable",
            json!({
                "TableName": "again",
                "AttributeDefinitions": [{"AttributeName": "a", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        assert_eq!(emu.describe("again")["TableStatus"], "CREATING");
        emu.settle();
        assert_eq!(emu.describe("again")["TableStatus"], "ACTIVE");
    }
}
