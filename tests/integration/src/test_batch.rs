//! Batch read and write tests.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use localddb_core::DynamoDBConfig;

    use crate::Emulator;

    fn keys(prefix: &str, count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| json!({"a": {"S": format!("{prefix}{i}")}}))
            .collect()
    }

    fn put_item(emu: &Emulator, table: &str, key: &str, payload: usize) {
        emu.ok(
            "PutItem",
            json!({"TableName": table, "Item": {"a": {"S": key}, "p": {"S": "x".repeat(payload)}}}),
        );
    }

    #[test]
    fn test_should_get_items_from_several_tables() {
        let emu = Emulator::new();
        emu.hash_table("left", "S");
        emu.hash_table("right", "S");
        put_item(&emu, "left", "l1", 3);
        put_item(&emu, "right", "r1", 3);
        put_item(&emu, "right", "r2", 3);

        let body = emu.ok(
            "BatchGetItem",
            json!({
                "RequestItems": {
                    "left": {"Keys": [{"a": {"S": "l1"}}, {"a": {"S": "nope"}}]},
                    "right": {
                        "Keys": [{"a": {"S": "r1"}}, {"a": {"S": "r2"}}],
                        "ConsistentRead": true,
                        "AttributesToGet": ["a"],
                    },
                },
                "ReturnConsumedCapacity": "TOTAL",
            }),
        );
        assert_eq!(body["Responses"]["left"].as_array().map(Vec::len), Some(1));
        let mut right: Vec<Value> = body["Responses"]["right"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        right.sort_by_key(|item| item["a"]["S"].as_str().unwrap_or_default().to_owned());
        assert_eq!(right, vec![json!({"a": {"S": "r1"}}), json!({"a": {"S": "r2"}})]);
        assert_eq!(body["UnprocessedKeys"], json!({}));
        assert_eq!(
            body["ConsumedCapacity"],
            json!([
                {"CapacityUnits": 1.0, "TableName": "left"},
                {"CapacityUnits": 2.0, "TableName": "right"},
            ])
        );
    }

    #[test]
    fn test_should_answer_every_table_even_without_hits() {
        let emu = Emulator::new();
        emu.hash_table("empty", "S");
        let body = emu.ok(
            "BatchGetItem",
            json!({"RequestItems": {"empty": {"Keys": [{"a": {"S": "x"}}]}}}),
        );
        assert_eq!(body, json!({"Responses": {"empty": []}, "UnprocessedKeys": {}}));
    }

    #[test]
    fn test_should_return_keys_beyond_the_read_budget() {
        let emu = Emulator::with_config(DynamoDBConfig {
            batch_get_budget: 100,
            ..DynamoDBConfig::default()
        });
        emu.hash_table("budget", "S");
        for key in ["k0", "k1", "k2"] {
            put_item(&emu, "budget", key, 40);
        }
        let body = emu.ok(
            "BatchGetItem",
            json!({"RequestItems": {"budget": {
                "Keys": keys("k", 3),
                "ConsistentRead": false,
            }}}),
        );
        assert_eq!(body["Responses"]["budget"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            body["UnprocessedKeys"],
            json!({"budget": {"Keys": [{"a": {"S": "k2"}}], "ConsistentRead": false}})
        );
    }

    #[test]
    fn test_should_always_process_the_first_key() {
        let emu = Emulator::with_config(DynamoDBConfig {
            batch_get_budget: 10,
            ..DynamoDBConfig::default()
        });
        emu.hash_table("first", "S");
        put_item(&emu, "first", "k0", 100);
        let body = emu.ok(
            "BatchGetItem",
            json!({"RequestItems": {"first": {"Keys": keys("k", 1)}}}),
        );
        assert_eq!(body["Responses"]["first"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["UnprocessedKeys"], json!({}));
    }

    #[test]
    fn test_should_limit_keys_across_tables() {
        let emu = Emulator::new();
        emu.hash_table("one", "S");
        emu.hash_table("two", "S");
        let body = emu.ok(
            "BatchGetItem",
            json!({"RequestItems": {
                "one": {"Keys": keys("a", 50)},
                "two": {"Keys": keys("b", 50)},
            }}),
        );
        assert_eq!(body["Responses"]["one"], json!([]));

        let (kind, message) = emu.err(
            "BatchGetItem",
            json!({"RequestItems": {
                "one": {"Keys": keys("a", 50)},
                "two": {"Keys": keys("b", 51)},
            }}),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(message, "Too many items requested for the BatchGetItem call");

        let (_, message) = emu.err(
            "BatchGetItem",
            json!({"RequestItems": {"one": {"Keys": keys("a", 101)}}}),
        );
        assert!(message.starts_with("1 validation error detected: "), "{message}");
        assert!(
            message.ends_with("Member must have length less than or equal to 100"),
            "{message}"
        );
    }

    #[test]
    fn test_should_reject_empty_request_items() {
        let emu = Emulator::new();
        let (kind, message) = emu.err("BatchGetItem", json!({"RequestItems": {}}));
        assert_eq!(kind, "ValidationException");
        assert_eq!(
            message,
            "1 validation error detected: Value '{}' at 'requestItems' failed to satisfy \
             constraint: Member must have length greater than or equal to 1"
        );
        let (_, message) = emu.err("BatchWriteItem", json!({"RequestItems": {}}));
        assert!(message.contains("'requestItems'"), "{message}");
    }

    #[test]
    fn test_should_reject_duplicate_batch_get_keys() {
        let emu = Emulator::new();
        emu.hash_table("dups", "S");
        let (kind, message) = emu.err(
            "BatchGetItem",
            json!({"RequestItems": {"dups": {"Keys": [{"a": {"S": "x"}}, {"a": {"S": "x"}}]}}}),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(message, "Provided list of item keys contains duplicates");
    }

    #[test]
    fn test_should_report_unknown_batch_table() {
        let emu = Emulator::new();
        emu.hash_table("known", "S");
        let (kind, message) = emu.err(
            "BatchGetItem",
            json!({"RequestItems": {
                "known": {"Keys": keys("a", 1)},
                "unknown": {"Keys": keys("a", 1)},
            }}),
        );
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(message, "Requested resource not found");
    }

    #[test]
    fn test_should_put_and_delete_in_one_batch() {
        let emu = Emulator::new();
        emu.hash_table("bw", "S");
        put_item(&emu, "bw", "old", 3);

        let body = emu.ok(
            "BatchWriteItem",
            json!({
                "RequestItems": {"bw": [
                    {"PutRequest": {"Item": {"a": {"S": "new"}, "n": {"N": "1.50"}}}},
                    {"DeleteRequest": {"Key": {"a": {"S": "old"}}}},
                    {"DeleteRequest": {"Key": {"a": {"S": "never"}}}},
                ]},
                "ReturnConsumedCapacity": "TOTAL",
            }),
        );
        assert_eq!(
            body,
            json!({
                "UnprocessedItems": {},
                "ConsumedCapacity": [{"CapacityUnits": 3.0, "TableName": "bw"}],
            })
        );

        let got = emu.ok("GetItem", json!({"TableName": "bw", "Key": {"a": {"S": "new"}}}));
        assert_eq!(got["Item"]["n"], json!({"N": "1.5"}));
        let gone = emu.ok("GetItem", json!({"TableName": "bw", "Key": {"a": {"S": "old"}}}));
        assert_eq!(gone, json!({}));
    }

    #[test]
    fn test_should_leave_tables_untouched_when_a_key_is_invalid() {
        let emu = Emulator::new();
        emu.hash_table("atomic", "S");
        let (kind, message) = emu.err(
            "BatchWriteItem",
            json!({"RequestItems": {"atomic": [
                {"PutRequest": {"Item": {"a": {"S": "fine"}}}},
                {"PutRequest": {"Item": {"b": {"S": "keyless"}}}},
            ]}}),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(
            message,
            "One or more parameter values were invalid: Missing the key a in the item"
        );
        let got = emu.ok(
            "GetItem",
            json!({"TableName": "atomic", "Key": {"a": {"S": "fine"}}}),
        );
        assert_eq!(got, json!({}));
    }

    #[test]
    fn test_should_reject_duplicate_write_keys() {
        let emu = Emulator::new();
        emu.hash_table("twice", "S");
        let (_, message) = emu.err(
            "BatchWriteItem",
            json!({"RequestItems": {"twice": [
                {"PutRequest": {"Item": {"a": {"S": "k"}}}},
                {"DeleteRequest": {"Key": {"a": {"S": "k"}}}},
            ]}}),
        );
        assert_eq!(message, "Provided list of item keys contains duplicates");
    }

    #[test]
    fn test_should_require_exactly_one_write_kind() {
        let emu = Emulator::new();
        emu.hash_table("kinds", "S");
        for request in [
            json!({}),
            json!({
                "PutRequest": {"Item": {"a": {"S": "k"}}},
                "DeleteRequest": {"Key": {"a": {"S": "k"}}},
            }),
        ] {
            let (kind, message) = emu.err(
                "BatchWriteItem",
                json!({"RequestItems": {"kinds": [request]}}),
            );
            assert_eq!(kind, "ValidationException");
            assert_eq!(
                message,
                "Supplied AttributeValue has more than one datatypes set, \
                 must contain exactly one of the supported datatypes"
            );
        }
    }

    #[test]
    fn test_should_limit_write_requests_across_tables() {
        let emu = Emulator::new();
        emu.hash_table("w1", "S");
        emu.hash_table("w2", "S");
        let puts = |prefix: &str, count: usize| -> Vec<Value> {
            keys(prefix, count)
                .into_iter()
                .map(|key| json!({"PutRequest": {"Item": key}}))
                .collect()
        };
        let (_, message) = emu.err(
            "BatchWriteItem",
            json!({"RequestItems": {"w1": puts("a", 20), "w2": puts("b", 6)}}),
        );
        assert_eq!(message, "Too many items requested for the BatchWriteItem call");
        emu.ok(
            "BatchWriteItem",
            json!({"RequestItems": {"w1": puts("a", 20), "w2": puts("b", 5)}}),
        );
        assert_eq!(emu.describe("w1")["ItemCount"], 20);
    }

    #[test]
    fn test_should_return_writes_beyond_the_write_budget() {
        let emu = Emulator::with_config(DynamoDBConfig {
            batch_write_budget: 100,
            ..DynamoDBConfig::default()
        });
        emu.hash_table("wb", "S");
        let requests: Vec<Value> = (0..3)
            .map(|i| {
                json!({"PutRequest": {"Item": {
                    "a": {"S": format!("k{i}")},
                    "p": {"S": "x".repeat(40)},
                }}})
            })
            .collect();
        let body = emu.ok(
            "BatchWriteItem",
            json!({"RequestItems": {"wb": requests.clone()}}),
        );
        assert_eq!(body["UnprocessedItems"], json!({"wb": [requests[2].clone()]}));
        assert_eq!(emu.describe("wb")["ItemCount"], 2);
    }
}
