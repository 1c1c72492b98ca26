pub mod locator;
pub mod price;
pub mod special;

pub use locator::{Locator, Strategy, element_text, first_price, first_text};
pub use price::{PriceBounds, PricePattern, extract_price, parse_amount};
pub use special::{Badge, SpecialOutcome, detect_special, find_badge};
