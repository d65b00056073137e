use sha2::{Digest, Sha256};

use crate::parse::MealRecord;

/// `{date}-{slot}`, e.g. `2024-08-13-Almoço Vegano`. One key per calendar event.
pub fn identity_key(meal: &MealRecord) -> String {
    format!("{}-{}", meal.date.format("%Y-%m-%d"), meal.slot.name())
}

/// Hex SHA-256 over every field, newline-terminated, in declaration order.
pub fn content_hash(meal: &MealRecord) -> String {
    let date = meal.date.format("%Y-%m-%d").to_string();
    let fields: [&str; 7] = [
        date.as_str(),
        meal.slot.name(),
        &meal.main_course,
        &meal.side_dish,
        &meal.salad,
        &meal.dessert,
        &meal.juice,
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

pub fn hash_meal(meal: &MealRecord) -> (String, String) {
    (identity_key(meal), content_hash(meal))
}
