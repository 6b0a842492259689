//! Supported actions.

use std::fmt;

/// An action name the emulator answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DynamoDBOperation {
    CreateTable,
    DeleteTable,
    DescribeTable,
    ListTables,
    UpdateTable,
    PutItem,
    GetItem,
    DeleteItem,
    BatchGetItem,
    BatchWriteItem,
}

const ACTIONS: [(DynamoDBOperation, &str); 10] = [
    (DynamoDBOperation::CreateTable, "CreateTable"),
    (DynamoDBOperation::DeleteTable, "DeleteTable"),
    (DynamoDBOperation::DescribeTable, "DescribeTable"),
    (DynamoDBOperation::ListTables, "ListTables"),
    (DynamoDBOperation::UpdateTable, "UpdateTable"),
    (DynamoDBOperation::PutItem, "PutItem"),
    (DynamoDBOperation::GetItem, "GetItem"),
    (DynamoDBOperation::DeleteItem, "DeleteItem"),
    (DynamoDBOperation::BatchGetItem, "BatchGetItem"),
    (DynamoDBOperation::BatchWriteItem, "BatchWriteItem"),
];

impl DynamoDBOperation {
    /// Look up an action by its exact, case-sensitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ACTIONS
            .iter()
            .find_map(|&(op, action)| (action == name).then_some(op))
    }

    /// The action name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        ACTIONS
            .iter()
            .find_map(|&(op, action)| (op == self).then_some(action))
            .unwrap_or_default()
    }
}

impl fmt::Display for DynamoDBOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
