//! Single-item operation tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Emulator;

    #[test]
    fn test_should_return_attributes_in_written_order() {
        let emu = Emulator::new();
        emu.hash_table("ordered", "S");
        let names = ["zeta", "a", "mid", "beta", "omega"];
        let mut item = serde_json::Map::new();
        for name in names {
            item.insert(name.to_owned(), json!({"S": name}));
        }
        item.insert("nested".to_owned(), json!({"M": {"y": {"N": "1"}, "x": {"N": "2"}}}));
        emu.ok("PutItem", json!({"TableName": "ordered", "Item": item}));

        let body = emu.ok(
            "GetItem",
            json!({"TableName": "ordered", "Key": {"a": {"S": "a"}}}),
        );
        let got = body["Item"].as_object().cloned().unwrap_or_default();
        let keys: Vec<&str> = got.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "a", "mid", "beta", "omega", "nested"]);
        let nested: Vec<&str> = got["nested"]["M"]
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(nested, vec!["y", "x"]);
    }

    #[test]
    fn test_should_round_trip_item_with_every_type() {
        let emu = Emulator::new();
        emu.hash_table("all", "S");
        let item = json!({
            "a": {"S": "key"},
            "n": {"N": "-12.50"},
            "b": {"B": "AQID"},
            "ss": {"SS": ["x", "y"]},
            "ns": {"NS": ["1", "2e1"]},
            "bs": {"BS": ["AQ==", "Ag=="]},
            "t": {"BOOL": true},
            "z": {"NULL": true},
            "l": {"L": [{"S": "in"}, {"N": "0.0"}]},
            "m": {"M": {"deep": {"M": {"x": {"N": "100"}}}}},
        });
        emu.ok("PutItem", json!({"TableName": "all", "Item": item}));

        let body = emu.ok("GetItem", json!({"TableName": "all", "Key": {"a": {"S": "key"}}}));
        assert_eq!(
            body["Item"],
            json!({
                "a": {"S": "key"},
                "n": {"N": "-12.5"},
                "b": {"B": "AQID"},
                "ss": {"SS": ["x", "y"]},
                "ns": {"NS": ["1", "20"]},
                "bs": {"BS": ["AQ==", "Ag=="]},
                "t": {"BOOL": true},
                "z": {"NULL": true},
                "l": {"L": [{"S": "in"}, {"N": "0"}]},
                "m": {"M": {"deep": {"M": {"x": {"N": "100"}}}}},
            })
        );
    }

    #[test]
    fn test_should_address_numeric_keys_by_value() {
        let emu = Emulator::new();
        emu.hash_table("nums", "N");
        emu.ok(
            "PutItem",
            json!({"TableName": "nums", "Item": {"a": {"N": "10e-1"}, "v": {"S": "one"}}}),
        );
        let body = emu.ok("GetItem", json!({"TableName": "nums", "Key": {"a": {"N": "1.000"}}}));
        assert_eq!(body["Item"]["v"], json!({"S": "one"}));
        assert_eq!(body["Item"]["a"], json!({"N": "1"}));
    }

    #[test]
    fn test_should_return_old_item_only_when_asked() {
        let emu = Emulator::new();
        emu.hash_table("old", "S");
        let put = |v: &str, rv: &str| {
            emu.ok(
                "PutItem",
                json!({
                    "TableName": "old",
                    "Item": {"a": {"S": "k"}, "v": {"S": v}},
                    "ReturnValues": rv,
                }),
            )
        };
        assert_eq!(put("1", "ALL_OLD"), json!({}));
        assert_eq!(put("2", "NONE"), json!({}));
        assert_eq!(
            put("3", "ALL_OLD"),
            json!({"Attributes": {"a": {"S": "k"}, "v": {"S": "2"}}})
        );

        let body = emu.ok(
            "DeleteItem",
            json!({"TableName": "old", "Key": {"a": {"S": "k"}}, "ReturnValues": "ALL_OLD"}),
        );
        assert_eq!(body, json!({"Attributes": {"a": {"S": "k"}, "v": {"S": "3"}}}));
        let body = emu.ok(
            "DeleteItem",
            json!({"TableName": "old", "Key": {"a": {"S": "k"}}, "ReturnValues": "ALL_OLD"}),
        );
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_should_reject_unsupported_return_values() {
        let emu = Emulator::new();
        emu.hash_table("rv", "S");
        let (kind, message) = emu.err(
            "PutItem",
            json!({"TableName": "rv", "Item": {"a": {"S": "k"}}, "ReturnValues": "ALL_NEW"}),
        );
        assert_eq!(kind, "ValidationException");
        assert_eq!(message, "ReturnValues can only be ALL_OLD or NONE");
    }

    #[test]
    fn test_should_reject_keys_that_do_not_match_schema() {
        let emu = Emulator::new();
        emu.range_table("keys");
        for key in [
            json!({"a": {"S": "x"}}),
            json!({"a": {"S": "x"}, "b": {"S": "1"}}),
            json!({"a": {"S": "x"}, "b": {"N": "1"}, "c": {"S": "extra"}}),
        ] {
            let (kind, message) = emu.err("GetItem", json!({"TableName": "keys", "Key": key}));
            assert_eq!(kind, "ValidationException");
            assert_eq!(message, "The provided key element does not match the schema");
        }
    }

    #[test]
    fn test_should_validate_item_key_attributes() {
        let emu = Emulator::new();
        emu.range_table("items");
        let (_, message) = emu.err(
            "PutItem",
            json!({"TableName": "items", "Item": {"a": {"S": "x"}}}),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Missing the key b in the item"
        );
        let (_, message) = emu.err(
            "PutItem",
            json!({"TableName": "items", "Item": {"a": {"S": "x"}, "b": {"S": "1"}}}),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Type mismatch for key b expected: N actual: S"
        );
        let (_, message) = emu.err(
            "PutItem",
            json!({"TableName": "items", "Item": {
                "a": {"S": "x"}, "b": {"N": "1"}, "d": {"N": "5"},
            }}),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Type mismatch for Index Key d Expected: S Actual: N IndexName: byD"
        );
    }

    #[test]
    fn test_should_reject_oversized_items() {
        let emu = Emulator::new();
        emu.hash_table("big", "S");
        let (_, message) = emu.err(
            "PutItem",
            json!({"TableName": "big", "Item": {
                "a": {"S": "k"},
                "payload": {"S": "x".repeat(400 * 1024)},
            }}),
        );
        assert_eq!(message, "Item size has exceeded the maximum allowed size");
    }

    #[test]
    fn test_should_charge_reads_by_size_and_consistency() {
        let emu = Emulator::new();
        emu.hash_table("cap", "S");
        emu.ok(
            "PutItem",
            json!({"TableName": "cap", "Item": {"a": {"S": "small"}}}),
        );
        emu.ok(
            "PutItem",
            json!({"TableName": "cap", "Item": {"a": {"S": "large"}, "p": {"S": "x".repeat(5000)}}}),
        );
        let units = |key: &str, consistent: bool| {
            emu.ok(
                "GetItem",
                json!({
                    "TableName": "cap",
                    "Key": {"a": {"S": key}},
                    "ConsistentRead": consistent,
                    "ReturnConsumedCapacity": "TOTAL",
                }),
            )["ConsumedCapacity"]["CapacityUnits"]
                .as_f64()
        };
        assert_eq!(units("small", false), Some(0.5));
        assert_eq!(units("small", true), Some(1.0));
        assert_eq!(units("missing", false), Some(0.5));
        assert_eq!(units("large", false), Some(1.0));
        assert_eq!(units("large", true), Some(2.0));
    }

    #[test]
    fn test_should_report_table_capacity_for_indexes_mode() {
        let emu = Emulator::new();
        emu.hash_table("idx", "S");
        let body = emu.ok(
            "PutItem",
            json!({
                "TableName": "idx",
                "Item": {"a": {"S": "k"}},
                "ReturnConsumedCapacity": "INDEXES",
            }),
        );
        assert_eq!(
            body,
            json!({"ConsumedCapacity": {
                "CapacityUnits": 1.0,
                "TableName": "idx",
                "Table": {"CapacityUnits": 1.0},
            }})
        );
        let body = emu.ok(
            "PutItem",
            json!({
                "TableName": "idx",
                "Item": {"a": {"S": "k"}},
                "ReturnConsumedCapacity": "NONE",
            }),
        );
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_should_project_attributes_to_get() {
        let emu = Emulator::new();
        emu.hash_table("proj", "S");
        emu.ok(
            "PutItem",
            json!({"TableName": "proj", "Item": {"a": {"S": "k"}, "x": {"N": "1"}, "y": {"N": "2"}}}),
        );
        let body = emu.ok(
            "GetItem",
            json!({"TableName": "proj", "Key": {"a": {"S": "k"}}, "AttributesToGet": ["y", "nope"]}),
        );
        assert_eq!(body, json!({"Item": {"y": {"N": "2"}}}));

        let (_, message) = emu.err(
            "GetItem",
            json!({"TableName": "proj", "Key": {"a": {"S": "k"}}, "AttributesToGet": ["y", "y"]}),
        );
        assert_eq!(
            message,
            "One or more parameter values were invalid: Duplicate value in attribute name: y"
        );
    }

    #[test]
    fn test_should_track_item_count_and_size() {
        let emu = Emulator::new();
        emu.hash_table("stats", "S");
        emu.ok(
            "PutItem",
            json!({"TableName": "stats", "Item": {"a": {"S": "k1"}, "v": {"S": "abc"}}}),
        );
        emu.ok(
            "PutItem",
            json!({"TableName": "stats", "Item": {"a": {"S": "k2"}}}),
        );
        let desc = emu.describe("stats");
        assert_eq!(desc["ItemCount"], 2);
        // (1 + 2) + (1 + 3) + (1 + 2)
        assert_eq!(desc["TableSizeBytes"], 10);
    }

    #[test]
    fn test_should_hide_tables_that_are_still_creating() {
        let emu = Emulator::new();
        emu.ok(
            "CreateTable",
            json!({
                "TableName": "young",
                "AttributeDefinitions": [{"AttributeName": "a", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "a", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            }),
        );
        let (kind, message) = emu.err(
            "PutItem",
            json!({"TableName": "young", "Item": {"a": {"S": "k"}}}),
        );
        assert_eq!(kind, "ResourceNotFoundException");
        assert_eq!(message, "Requested resource not found");
    }
}
