use engine::{Category, Expense, ExpenseKind};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::buttons::{self, ButtonAction};

pub(crate) fn render_saved_notice(expense: &Expense) -> String {
    format!(
        "💾 Saved\nAmount: {:.2}\nDescription: {}\nType: {}\nCategory: {}\nDate: {}",
        expense.amount,
        expense.description,
        expense.kind.map(ExpenseKind::as_str).unwrap_or("Not specified"),
        expense.category.map(Category::as_str).unwrap_or("Not specified"),
        expense.date,
    )
}

pub(crate) fn notice_keyboard(chat_id: i64, message_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🗑️ Delete",
            buttons::encode(&ButtonAction::Delete {
                chat_id,
                message_id,
            }),
        )],
        vec![
            InlineKeyboardButton::callback(
                "🏷️ Edit Category",
                buttons::encode(&ButtonAction::EditCategory {
                    chat_id,
                    message_id,
                    value: None,
                }),
            ),
            InlineKeyboardButton::callback(
                "🧩 Edit Type",
                buttons::encode(&ButtonAction::EditType {
                    chat_id,
                    message_id,
                    value: None,
                }),
            ),
        ],
    ])
}

pub(crate) fn render_countdown(remaining: u64) -> String {
    format!("Deleted. Tap to restore ({remaining}s).")
}

pub(crate) fn restore_keyboard(chat_id: i64, message_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "↩️ Restore",
        buttons::encode(&ButtonAction::Restore {
            chat_id,
            message_id,
        }),
    )]])
}

pub(crate) fn category_picker(chat_id: i64, message_id: i32) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = Category::ALL
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .map(|category| {
                    InlineKeyboardButton::callback(
                        category.as_str(),
                        buttons::encode(&ButtonAction::EditCategory {
                            chat_id,
                            message_id,
                            value: Some(category.as_str().to_string()),
                        }),
                    )
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn type_picker(chat_id: i64, message_id: i32) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = ExpenseKind::ALL
        .iter()
        .map(|kind| {
            InlineKeyboardButton::callback(
                kind.as_str(),
                buttons::encode(&ButtonAction::EditType {
                    chat_id,
                    message_id,
                    value: Some(kind.as_str().to_string()),
                }),
            )
        })
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}

pub(crate) fn format_recent_expenses(expenses: &[Expense]) -> String {
    let mut text = String::from("Recent expenses:\n");
    for (idx, expense) in expenses.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} • {:.2} • {}{}{}",
            idx + 1,
            expense.date,
            expense.amount,
            expense.description,
            expense
                .category
                .map(|c| format!(" • {}", c.as_str()))
                .unwrap_or_default(),
            expense
                .kind
                .map(|k| format!(" • {}", k.as_str()))
                .unwrap_or_default(),
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn expense() -> Expense {
        Expense {
            msg_id: 1,
            chat_id: 10,
            user_id: 100,
            amount: 12.5,
            description: "groceries".to_string(),
            kind: Some(ExpenseKind::Need),
            category: Some(Category::Food),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn saved_notice_lists_all_fields() {
        let text = render_saved_notice(&expense());
        assert!(text.contains("Amount: 12.50"));
        assert!(text.contains("Description: groceries"));
        assert!(text.contains("Type: need"));
        assert!(text.contains("Category: food"));
        assert!(text.contains("Date: 2024-06-03"));
    }

    #[test]
    fn saved_notice_marks_missing_fields() {
        let mut bare = expense();
        bare.kind = None;
        bare.category = None;
        let text = render_saved_notice(&bare);
        assert!(text.contains("Type: Not specified"));
        assert!(text.contains("Category: Not specified"));
    }

    #[test]
    fn countdown_counts_seconds() {
        assert_eq!(render_countdown(30), "Deleted. Tap to restore (30s).");
    }

    #[test]
    fn category_picker_covers_the_whole_set() {
        let keyboard = category_picker(10, 1);
        let buttons: usize = keyboard.inline_keyboard.iter().map(Vec::len).sum();
        assert_eq!(buttons, Category::ALL.len());
    }
}
