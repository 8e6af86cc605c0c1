use time::Date;

use crate::expense::Expense;

/// An unsaved expense with a placeholder title and no owner.
pub(crate) fn test_expense(amount: f64, category: &str, date: Date) -> Expense {
    Expense {
        id: 0,
        title: "test".to_owned(),
        amount,
        category: category.to_owned(),
        date,
        user_id: None,
    }
}
