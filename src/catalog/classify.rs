use crate::catalog::model::Category;

/// Keyword table in priority order. The first category with a whole-word
/// hit wins.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Produce,
        &[
            "apple", "avocado", "banana", "berry", "broccoli", "cabbage", "capsicum", "carrot",
            "cucumber", "garlic", "grape", "kale", "lemon", "lettuce", "lime", "mango",
            "mushroom", "onion", "orange", "potato", "pumpkin", "spinach", "strawberry",
            "tomato", "zucchini",
        ],
    ),
    (
        Category::Meat,
        &[
            "bacon", "beef", "chicken", "fish", "ham", "lamb", "mince", "pork", "prawn",
            "salmon", "sausage", "steak", "tuna", "turkey",
        ],
    ),
    (
        Category::Dairy,
        &[
            "butter", "cheese", "cream", "egg", "milk", "yoghurt", "yogurt",
        ],
    ),
    (
        Category::Pantry,
        &[
            "bean", "cereal", "flour", "honey", "lentil", "noodle", "oats", "oil", "pasta",
            "rice", "sauce", "spaghetti", "stock", "sugar",
        ],
    ),
    (
        Category::Freezer,
        &["frozen", "ice", "peas", "chips", "nugget"],
    ),
    (
        Category::Bakery,
        &[
            "bagel", "bread", "bun", "croissant", "loaf", "muffin", "roll", "tortilla", "wrap",
        ],
    ),
    (
        Category::Drinks,
        &[
            "beer", "coffee", "coke", "cola", "juice", "soda", "tea", "water", "wine",
        ],
    ),
];

/// Map a product name to a category by whole-word keyword match.
pub fn classify(name: &str) -> Category {
    let lowered = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&lowered, k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Whole-word occurrence of `word` in `haystack`, allowing a single
/// trailing plural `s`. Both sides are expected lower-cased.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(start, matched)| {
        let end = start + matched.len();
        let left_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphabetic());

        let mut rest = haystack[end..].chars();
        let right_ok = match rest.next() {
            None => true,
            Some('s') => rest.next().is_none_or(|c| !c.is_alphabetic()),
            Some(c) => !c.is_alphabetic(),
        };
        left_ok && right_ok
    })
}
