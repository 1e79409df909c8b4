pub mod alias;
pub mod expense;
pub mod schema;

// Re-export only the types we actually use
pub use alias::{
    Alias, AliasFilters, AliasKind, AliasListResponse, CreateAliasRequest, DeleteAliasResponse,
};
pub use expense::{
    CreateExpenseResponse, ExpenseFilters, ExpenseInput, ExpenseListResponse, ExpensePatch,
    ExpenseRow, UpdateExpenseRequest,
};
pub use schema::{
    CreateFieldRequest, DeleteFieldQuery, FieldDefinition, FieldType, SchemaResponse,
    SchemaVersion, UpdateFieldRequest,
};
