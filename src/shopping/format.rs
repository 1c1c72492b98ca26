use crate::shopping::dtos::Ingredient;

pub const DEFAULT_EMOJI: &str = "🛒";

/// Substring → emoji, checked in order. Compound names come before the
/// words they contain.
const EMOJI_TABLE: &[(&str, &str)] = &[
    ("sweet potato", "🍠"),
    ("peanut butter", "🥜"),
    ("olive oil", "🫒"),
    ("soy sauce", "🍶"),
    ("hot sauce", "🌶️"),
    ("eggplant", "🍆"),
    ("pineapple", "🍍"),
    ("watermelon", "🍉"),
    ("strawberry", "🍓"),
    ("blueberry", "🫐"),
    ("chickpea", "🫘"),
    ("chicken", "🍗"),
    ("beef", "🥩"),
    ("steak", "🥩"),
    ("pork", "🥓"),
    ("turkey", "🦃"),
    ("salmon", "🐟"),
    ("shrimp", "🦐"),
    ("prawn", "🦐"),
    ("fish", "🐟"),
    ("egg", "🥚"),
    ("rice", "🍚"),
    ("pasta", "🍝"),
    ("spaghetti", "🍝"),
    ("noodle", "🍜"),
    ("bread", "🍞"),
    ("tortilla", "🌯"),
    ("wrap", "🌯"),
    ("cheese", "🧀"),
    ("cheddar", "🧀"),
    ("mozzarella", "🧀"),
    ("feta", "🧀"),
    ("parmesan", "🧀"),
    ("milk", "🥛"),
    ("yogurt", "🥛"),
    ("yoghurt", "🥛"),
    ("butter", "🧈"),
    ("cream", "🥛"),
    ("onion", "🧅"),
    ("garlic", "🧄"),
    ("tomato", "🍅"),
    ("capsicum", "🫑"),
    ("pepper", "🫑"),
    ("cucumber", "🥒"),
    ("lettuce", "🥬"),
    ("spinach", "🥬"),
    ("kale", "🥬"),
    ("cabbage", "🥬"),
    ("broccoli", "🥦"),
    ("carrot", "🥕"),
    ("potato", "🥔"),
    ("corn", "🌽"),
    ("avocado", "🥑"),
    ("mushroom", "🍄"),
    ("olive", "🫒"),
    ("lemon", "🍋"),
    ("lime", "🍋"),
    ("apple", "🍎"),
    ("banana", "🍌"),
    ("orange", "🍊"),
    ("berr", "🫐"),
    ("grape", "🍇"),
    ("coconut", "🥥"),
    ("kiwi", "🥝"),
    ("mango", "🥭"),
    ("peach", "🍑"),
    ("cherry", "🍒"),
    ("oil", "🫒"),
    ("vinegar", "🍶"),
    ("sugar", "🧂"),
    ("salt", "🧂"),
    ("chilli", "🌶️"),
    ("chili", "🌶️"),
    ("sriracha", "🌶️"),
    ("spice", "🌶️"),
    ("cilantro", "🌿"),
    ("coriander", "🌿"),
    ("parsley", "🌿"),
    ("basil", "🌿"),
    ("rosemary", "🌿"),
    ("thyme", "🌿"),
    ("oregano", "🌿"),
    ("herb", "🌿"),
    ("seaweed", "🌿"),
    ("honey", "🍯"),
    ("almond", "🥜"),
    ("nut", "🥜"),
    ("sesame", "🌱"),
    ("seed", "🌱"),
    ("asparagus", "🌱"),
    ("chocolate", "🍫"),
    ("coffee", "☕"),
    ("tea", "🍵"),
    ("juice", "🧃"),
    ("water", "💧"),
    ("wine", "🍷"),
    ("beer", "🍺"),
    ("soda", "🥤"),
    ("mayo", "🥄"),
    ("ketchup", "🍅"),
    ("mustard", "🌭"),
    ("tahini", "🥣"),
    ("quinoa", "🌾"),
    ("oats", "🌾"),
    ("flour", "🌾"),
    ("bean", "🫘"),
    ("lentil", "🫘"),
    ("tofu", "🧊"),
    ("edamame", "🫛"),
    ("ginger", "🫚"),
    ("cinnamon", "🧂"),
    ("cumin", "🧂"),
    ("paprika", "🧂"),
];

pub fn emoji_for(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    EMOJI_TABLE
        .iter()
        .find(|(key, _)| lowered.contains(*key))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

/// Whole amounts print without decimals, others with one.
pub fn format_amount(amount: f64, unit: &str) -> String {
    if amount.fract() == 0.0 {
        format!("{}{}", amount as i64, unit)
    } else {
        format!("{:.1}{}", amount, unit)
    }
}

/// `"🍗 Chicken: 640g (2 meals)"`, or the meal name when there is just one.
pub fn reminder_title(ingredient: &Ingredient) -> String {
    let mut title = format!(
        "{} {}: {}",
        emoji_for(&ingredient.name),
        ingredient.name,
        format_amount(ingredient.amount, &ingredient.unit)
    );
    match ingredient.meals.as_slice() {
        [] => {}
        [meal] => title.push_str(&format!(" ({})", meal)),
        meals => title.push_str(&format!(" ({} meals)", meals.len())),
    }
    title
}
