//! Request validation tests at the action boundary.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use localddb_core::handle_raw_action;

    use crate::Emulator;

    #[test]
    fn test_should_answer_unknown_operation_without_message() {
        let emu = Emulator::new();
        let response = emu.request("Scan", json!({"TableName": "abc"}));
        assert_eq!(response.status, http::StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"__type": "com.amazon.coral.service#UnknownOperationException"})
        );
    }

    #[test]
    fn test_should_reject_bodies_that_are_not_json_objects() {
        let emu = Emulator::new();
        for body in [json!("text"), json!(1), json!(null)] {
            let (kind, message) = emu.err("ListTables", body);
            assert_eq!(kind, "SerializationException");
            assert_eq!(message, "Unexpected value type in payload");
        }
        let (_, message) = emu.err("ListTables", json!([]));
        assert_eq!(message, "Start of list found where not expected");
        let response = handle_raw_action(&emu.provider, "ListTables", b"{\"Limit\":");
        assert_eq!(
            response.body["__type"],
            "com.amazon.coral.service#SerializationException"
        );
    }

    #[test]
    fn test_should_report_type_errors_before_constraints() {
        let emu = Emulator::new();
        let (kind, message) = emu.err(
            "ListTables",
            json!({"Limit": "ten", "ExclusiveStartTableName": "x"}),
        );
        assert_eq!(kind, "SerializationException");
        assert_eq!(
            message,
            "class java.lang.String can not be converted to an Integer"
        );

        let (kind, message) = emu.err(
            "PutItem",
            json!({"TableName": "t", "Item": {"a": {"B": "abc"}}}),
        );
        assert_eq!(kind, "SerializationException");
        assert_eq!(
            message,
            "'abc' can not be converted to a Blob: \
             Base64 encoded length is expected a multiple of 4 bytes but found: 3"
        );
    }

    #[test]
    fn test_should_report_missing_table_name_first() {
        let emu = Emulator::new();
        let (kind, message) = emu.err("DescribeTable", json!({}));
        assert_eq!(kind, "ValidationException");
        assert_eq!(
            message,
            "The paramater 'TableName' is required but was not present in the request"
        );
        let long = "x".repeat(256);
        let (_, message) = emu.err("DeleteTable", json!({"TableName": long}));
        assert_eq!(
            message,
            "TableName must be at least 3 characters long and at most 255 characters long"
        );
    }

    #[test]
    fn test_should_aggregate_constraint_violations_in_member_order() {
        let emu = Emulator::new();
        let (kind, message) = emu.err(
            "CreateTable",
            json!({
                "TableName": "bad name",
                "KeySchema": [],
                "ProvisionedThroughput": {"ReadCapacityUnits": 0},
            }),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(
            message,
            "5 validation errors detected: \
             Value null at 'attributeDefinitions' failed to satisfy constraint: \
             Member must not be null; \
             Value 'bad name' at 'tableName' failed to satisfy constraint: \
             Member must satisfy regular expression pattern: [a-zA-Z0-9_.-]+; \
             Value '[]' at 'keySchema' failed to satisfy constraint: \
             Member must have length greater than or equal to 1; \
             Value null at 'provisionedThroughput.writeCapacityUnits' failed to satisfy \
             constraint: Member must not be null; \
             Value '0' at 'provisionedThroughput.readCapacityUnits' failed to satisfy \
             constraint: Member must have value greater than or equal to 1"
        );
    }

    #[test]
    fn test_should_validate_table_definitions() {
        let emu = Emulator::new();
        let (_, message) = emu.err(
            "CreateTable",
            json!({
                "TableName": "extra",
                "AttributeDefinitions": [
                    {"AttributeName": "a", "AttributeType": "S"},
                    {"AttributeName": "b", "AttributeType": "S"},
                ],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Number of attributes in KeySchema \
             does not exactly match number of attributes defined in AttributeDefinitions"
        );

        let (_, message) = emu.err(
            "CreateTable",
            json!({
                "TableName": "lsi",
                "AttributeDefinitions": [
                    {"AttributeName": "a", "AttributeType": "S"},
                    {"AttributeName": "c", "AttributeType": "S"},
                ],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "LocalSecondaryIndexes": [{
                    "IndexName": "byC",
                    "KeySchema": [
                        {"AttributeName": "a", "KeyType": "HASH"},
                        {"AttributeName": "c", "KeyType": "RANGE"},
                    ],
                    "Projection": {"ProjectionType": "ALL"},
                }],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Table KeySchema does not have a \
             range key, which is required when specifying a LocalSecondaryIndex"
        );
        assert_eq!(emu.ok("ListTables", json!({})), json!({"TableNames": []}));
    }

    #[test]
    fn test_should_validate_attribute_values() {
        let emu = Emulator::new();
        emu.hash_table("vals", "S");
        let cases = [
            (
                json!({"a": {"S": "k"}, "e": {}}),
                "Supplied AttributeValue is empty, must contain exactly one of the supported datatypes",
            ),
            (
                json!({"a": {"S": "k"}, "e": {"S": ""}}),
                "One or more parameter values were invalid: \
                 An AttributeValue may not contain an empty string.",
            ),
            (
                json!({"a": {"S": "k"}, "e": {"NS": ["1", "1.0"]}}),
                "Input collection contains duplicates",
            ),
            (
                json!({"a": {"S": "k"}, "e": {"N": "1e126"}}),
                "Number overflow. Attempting to store a number with magnitude larger than \
                 supported range",
            ),
            (
                json!({"a": {"S": "k"}, "e": {"N": "abc"}}),
                "The parameter cannot be converted to a numeric value: abc",
            ),
        ];
        for (item, expected) in cases {
            let (kind, message) = emu.err("PutItem", json!({"TableName": "vals", "Item": item}));
            assert_eq!(kind, "ValidationException");
            assert_eq!(message, expected);
        }
    }

    #[test]
    fn test_should_bound_list_tables_limit() {
        let emu = Emulator::new();
        let (_, message) = emu.err("ListTables", json!({"Limit": 101}));
        assert_eq!(
            message,
            "1 validation error detected: Value '101' at 'limit' failed to satisfy constraint: \
             Member must have value less than or equal to 100"
        );
    }

    #[test]
    fn test_should_report_capacity_beyond_long_range_as_out_of_bounds() {
        let emu = Emulator::new();
        for huge in [json!(1e20), json!(18_446_744_073_709_551_615_u64)] {
            let (kind, message) = emu.err(
                "CreateTable",
                json!({
                    "TableName": "huge",
                    "AttributeDefinitions": [{"AttributeName": "a", "AttributeType": "S"}],
                    "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                    "ProvisionedThroughput": {"ReadCapacityUnits": huge, "WriteCapacityUnits": 1},
                }),
            );
            assert_eq!(kind, "ValidationException");
            assert_eq!(
                message,
                "Given value 9223372036854775807 for ReadCapacityUnits is out of bounds"
            );
        }

        let (kind, message) = emu.err("ListTables", json!({"Limit": 1e20}));
        assert_eq!(kind, "ValidationException");
        assert!(
            message.ends_with("Member must have value less than or equal to 100"),
            "{message}"
        );
        assert_eq!(emu.ok("ListTables", json!({})), json!({"TableNames": []}));
    }

    #[test]
    fn test_should_require_some_update() {
        let emu = Emulator::new();
        emu.hash_table("noop", "S");
        for body in [
            json!({"TableName": "noop"}),
            json!({"TableName": "noop", "GlobalSecondaryIndexUpdates": [{}]}),
            json!({"TableName": "noop", "GlobalSecondaryIndexUpdates": [
                {"Delete": {"IndexName": "gone"}},
            ]}),
        ] {
            let (kind, message) = emu.err("UpdateTable", body);
            assert_eq!(kind, "ValidationException");
            assert_eq!(
                message,
                "At least one of ProvisionedThroughput or GlobalSecondaryIndexUpdates is required"
            );
        }
        assert_eq!(emu.describe("noop")["TableStatus"], "ACTIVE");
    }
}
