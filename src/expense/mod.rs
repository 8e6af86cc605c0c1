//! Expense management.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the database functions for storing and querying expenses
//! - The scope that decides whether users share one expense list
//! - View handlers and endpoints for listing, recording, editing and deleting expenses

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod delete_page;
mod edit_endpoint;
mod edit_page;
mod form;
mod list_page;
mod scope;

pub use core::{
    Expense, ExpenseFilter, NewExpense, create_expense, create_expense_table, query_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use create_page::get_create_expense_page;
pub use delete_endpoint::delete_expense_endpoint;
pub use delete_page::get_delete_expense_page;
pub use edit_endpoint::update_expense_endpoint;
pub use edit_page::get_edit_expense_page;
pub use list_page::get_expenses_page;
pub use scope::ExpenseScope;
