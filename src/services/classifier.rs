//! Keyword heuristics that sort task titles into domain kinds.
//!
//! The match is intentionally crude: lowercase substring search over a fixed
//! keyword list, first hit wins in the order food, reading, gym, shopping.

use crate::api::TaskKind;

const FOOD_KEYWORDS: &[&str] = &[
    "breakfast", "lunch", "dinner", "meal", "cook", "eat", "desayuno", "comida", "almuerzo",
    "cena", "comer", "cocinar",
];

const READING_KEYWORDS: &[&str] = &[
    "read", "book", "chapter", "leer", "libro", "capitulo", "capítulo",
];

const GYM_KEYWORDS: &[&str] = &[
    "gym", "workout", "train", "exercise", "interval", "hiit", "entrenar", "ejercicio",
    "gimnasio",
];

const SHOPPING_KEYWORDS: &[&str] = &[
    "buy", "shop", "groceries", "supermarket", "comprar", "compras", "super", "mercado",
];

fn matches_any(title: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| title.contains(k))
}

/// Derive the task kind from its title.
pub fn classify_title(title: &str) -> TaskKind {
    let title = title.to_lowercase();
    if matches_any(&title, FOOD_KEYWORDS) {
        TaskKind::Food
    } else if matches_any(&title, READING_KEYWORDS) {
        TaskKind::Reading
    } else if matches_any(&title, GYM_KEYWORDS) {
        TaskKind::Gym
    } else if matches_any(&title, SHOPPING_KEYWORDS) {
        TaskKind::Shopping
    } else {
        TaskKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_food_titles() {
        assert_eq!(classify_title("Cook dinner for friends"), TaskKind::Food);
        assert_eq!(classify_title("preparar la cena"), TaskKind::Food);
    }

    #[test]
    fn classifies_reading_titles() {
        assert_eq!(classify_title("Read chapter 4"), TaskKind::Reading);
        assert_eq!(classify_title("Terminar el libro"), TaskKind::Reading);
    }

    #[test]
    fn classifies_gym_titles() {
        assert_eq!(classify_title("HIIT workout"), TaskKind::Gym);
        assert_eq!(classify_title("ir al gimnasio"), TaskKind::Gym);
    }

    #[test]
    fn classifies_shopping_titles() {
        assert_eq!(classify_title("Buy milk and eggs"), TaskKind::Shopping);
        assert_eq!(classify_title("compras de la semana"), TaskKind::Shopping);
    }

    #[test]
    fn falls_back_to_plain() {
        assert_eq!(classify_title("Call the dentist"), TaskKind::Plain);
        assert_eq!(classify_title(""), TaskKind::Plain);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_title("BUY BATTERIES"), TaskKind::Shopping);
    }

    #[test]
    fn food_wins_over_shopping() {
        // "buy" and "dinner" both match; food is checked first.
        assert_eq!(classify_title("buy dinner ingredients"), TaskKind::Food);
    }
}
