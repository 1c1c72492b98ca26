use std::collections::BTreeMap;

use crate::catalog::model::{Category, PlaceholderPrice, StoreTarget, TrackedProduct};
use crate::prices::model::Store;

struct Builtin {
    id: &'static str,
    name: &'static str,
    category: Category,
    coles_url: &'static str,
    woolworths_url: &'static str,
    /// (price, special) for Coles then Woolworths.
    placeholder: [(f64, bool); 2],
}

const BUILTIN: &[Builtin] = &[
    Builtin {
        id: "coke-zero",
        name: "Coke Zero 10 Pack",
        category: Category::Drinks,
        coles_url: "https://www.coles.com.au/product/coca-cola-zero-sugar-soft-drink-multipack-cans-10x375ml-7502850",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/669379/coca-cola-zero-sugar-soft-drink-multipack-cans",
        placeholder: [(11.00, true), (11.00, false)],
    },
    Builtin {
        id: "eggs",
        name: "Free Range Eggs 12pk",
        category: Category::Dairy,
        coles_url: "https://www.coles.com.au/product/coles-free-range-eggs-12-pack-700g-7609829",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/731079/cage-free-eggs-12-pack",
        placeholder: [(5.50, false), (5.90, false)],
    },
    Builtin {
        id: "milk",
        name: "Full Cream Milk 2L",
        category: Category::Dairy,
        coles_url: "https://www.coles.com.au/product/coles-full-cream-milk-2l-72717",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/134593/woolworths-full-cream-milk",
        placeholder: [(3.50, false), (3.50, true)],
    },
    Builtin {
        id: "bread",
        name: "White Bread",
        category: Category::Bakery,
        coles_url: "https://www.coles.com.au/product/coles-white-sandwich-bread-700g-72725",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/743223/woolworths-white-sandwich-bread",
        placeholder: [(2.50, false), (2.50, false)],
    },
    Builtin {
        id: "bananas",
        name: "Bananas (per kg)",
        category: Category::Produce,
        coles_url: "https://www.coles.com.au/product/fresh-bananas-approx-180g-each-317465",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/133211/bananas",
        placeholder: [(3.90, true), (3.50, false)],
    },
    Builtin {
        id: "chicken-breast",
        name: "Chicken Breast (per kg)",
        category: Category::Meat,
        coles_url: "https://www.coles.com.au/product/coles-chicken-breast-fillet-approx-500g-220617",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/721121/woolworths-chicken-breast-fillet",
        placeholder: [(12.00, true), (13.50, false)],
    },
    Builtin {
        id: "pasta",
        name: "Spaghetti Pasta 500g",
        category: Category::Pantry,
        coles_url: "https://www.coles.com.au/product/coles-spaghetti-500g-72711",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/723538/woolworths-spaghetti-pasta",
        placeholder: [(1.40, false), (1.40, true)],
    },
    Builtin {
        id: "yogurt",
        name: "Greek Yogurt",
        category: Category::Dairy,
        coles_url: "https://www.coles.com.au/product/chobani-fit-high-protein-greek-yoghurt-850g-5433123",
        woolworths_url: "https://www.woolworths.com.au/shop/productdetails/666530/chobani-fit-high-protein-greek-yoghurt",
        placeholder: [(6.50, false), (6.50, false)],
    },
];

pub(crate) fn builtin_products() -> Vec<TrackedProduct> {
    BUILTIN
        .iter()
        .map(|b| {
            let targets = BTreeMap::from([
                (Store::Coles, StoreTarget::Url(b.coles_url.to_string())),
                (Store::Woolworths, StoreTarget::Url(b.woolworths_url.to_string())),
            ]);
            let placeholder = Store::ALL
                .into_iter()
                .zip(b.placeholder)
                .map(|(store, (price, special))| (store, PlaceholderPrice { price, special }))
                .collect();
            TrackedProduct {
                id: b.id.to_string(),
                name: b.name.to_string(),
                category: b.category,
                targets,
                placeholder,
            }
        })
        .collect()
}
