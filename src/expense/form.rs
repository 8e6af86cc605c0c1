//! The form fields shared by the create and edit expense pages, and the
//! parsing of the submitted form data.

use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    Error,
    expense::NewExpense,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The values to prefill the expense form with.
pub struct ExpenseFormDefaults<'a> {
    pub title: Option<&'a str>,
    pub amount: Option<f64>,
    pub category: Option<&'a str>,
    pub date: Date,
    pub autofocus_title: bool,
}

pub fn expense_form_fields(defaults: &ExpenseFormDefaults<'_>, categories: &[String]) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{amount:.2}"));

    html! {
        div
        {
            label
                for="title"
                class=(FORM_LABEL_STYLE)
            {
                "Title"
            }

            input
                name="title"
                id="title"
                type="text"
                placeholder="Lunch"
                required
                value=[defaults.title]
                autofocus[defaults.autofocus_title]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="amount"
                class=(FORM_LABEL_STYLE)
            {
                "Amount"
            }

            // w-full needed to ensure input takes the full width when prefilled with a value
            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    required
                    value=[amount_str.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label
                for="category"
                class=(FORM_LABEL_STYLE)
            {
                "Category"
            }

            input
                name="category"
                id="category"
                type="text"
                list="category-options"
                placeholder="Food"
                required
                value=[defaults.category]
                class=(FORM_TEXT_INPUT_STYLE);

            datalist id="category-options"
            {
                @for category in categories {
                    option value=(category) {}
                }
            }
        }

        div
        {
            label
                for="date"
                class=(FORM_LABEL_STYLE)
            {
                "Date"
            }

            input
                name="date"
                id="date"
                type="date"
                value=(defaults.date)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// The form data for creating or updating an expense.
///
/// Every field is optional so that missing and empty fields are reported with
/// the same message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// The date as "YYYY-MM-DD".
    #[serde(default)]
    pub date: Option<String>,
}

impl ExpenseForm {
    /// Validate the form, using `fallback_date` when the date is missing or
    /// cannot be parsed.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::MissingExpenseFields] if the title, amount or category is empty,
    /// - [Error::InvalidAmount] if the amount is not a finite number that is
    ///   zero or greater.
    pub fn validate(self, fallback_date: Date) -> Result<NewExpense, Error> {
        let non_empty = |field: Option<String>| {
            field
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
        };

        let (Some(title), Some(raw_amount), Some(category)) = (
            non_empty(self.title),
            non_empty(self.amount),
            non_empty(self.category),
        ) else {
            return Err(Error::MissingExpenseFields);
        };

        let amount = match raw_amount.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
            _ => return Err(Error::InvalidAmount(raw_amount)),
        };

        let date = self
            .date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(fallback_date);

        Ok(NewExpense {
            title,
            amount,
            category,
            date,
        })
    }
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod form_tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{Error, expense::NewExpense};

    use super::{ExpenseForm, ExpenseFormDefaults, expense_form_fields};

    fn form(title: &str, amount: &str, category: &str, date: Option<&str>) -> ExpenseForm {
        ExpenseForm {
            title: Some(title.to_owned()),
            amount: Some(amount.to_owned()),
            category: Some(category.to_owned()),
            date: date.map(str::to_owned),
        }
    }

    #[test]
    fn validate_trims_fields() {
        let got = form("  Lunch ", " 250.5 ", " Food ", Some("2025-10-04"))
            .validate(date!(2025 - 10 - 19))
            .unwrap();

        assert_eq!(
            got,
            NewExpense {
                title: "Lunch".to_owned(),
                amount: 250.5,
                category: "Food".to_owned(),
                date: date!(2025 - 10 - 04),
            }
        );
    }

    #[test]
    fn validate_rejects_empty_required_fields() {
        let cases = [
            form("", "1", "Food", None),
            form("Lunch", "  ", "Food", None),
            form("Lunch", "1", "", None),
            ExpenseForm::default(),
        ];

        for case in cases {
            assert_eq!(
                case.validate(date!(2025 - 10 - 19)),
                Err(Error::MissingExpenseFields)
            );
        }
    }

    #[test]
    fn validate_rejects_bad_amounts() {
        for amount in ["abc", "-1", "NaN", "inf"] {
            assert_eq!(
                form("Lunch", amount, "Food", None).validate(date!(2025 - 10 - 19)),
                Err(Error::InvalidAmount(amount.to_owned())),
                "amount {amount} should be rejected"
            );
        }
    }

    #[test]
    fn validate_accepts_zero_amount() {
        let got = form("Freebie", "0", "Food", None)
            .validate(date!(2025 - 10 - 19))
            .unwrap();

        assert_eq!(got.amount, 0.0);
    }

    #[test]
    fn validate_falls_back_to_given_date() {
        for date_text in [None, Some(""), Some("04/10/2025"), Some("2025-02-30")] {
            let got = form("Lunch", "1", "Food", date_text)
                .validate(date!(2025 - 10 - 19))
                .unwrap();

            assert_eq!(got.date, date!(2025 - 10 - 19), "date {date_text:?}");
        }
    }

    #[test]
    fn fields_render_categories_as_suggestions() {
        let categories = vec!["Bills".to_owned(), "Food".to_owned()];
        let markup = expense_form_fields(
            &ExpenseFormDefaults {
                title: Some("Lunch"),
                amount: Some(12.5),
                category: Some("Food"),
                date: date!(2025 - 10 - 04),
                autofocus_title: false,
            },
            &categories,
        );
        let html = Html::parse_fragment(&markup.into_string());

        let options = html
            .select(&Selector::parse("datalist#category-options option").unwrap())
            .filter_map(|option| option.value().attr("value"))
            .collect::<Vec<_>>();
        assert_eq!(options, vec!["Bills", "Food"]);

        let amount = html
            .select(&Selector::parse("input[name='amount']").unwrap())
            .next()
            .unwrap();
        assert_eq!(amount.value().attr("value"), Some("12.50"));

        let date = html
            .select(&Selector::parse("input[name='date']").unwrap())
            .next()
            .unwrap();
        assert_eq!(date.value().attr("value"), Some("2025-10-04"));
    }
}
