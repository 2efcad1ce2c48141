//! Spending taxonomy and deterministic categorization.
//!
//! The taxonomy mirrors the issuer's "Spend Categories" column so a category
//! hint printed on a statement can be taken as-is. Descriptions without a hint
//! fall back to keyword rules.

use serde::{Deserialize, Serialize};

/// Closed set of spending categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "Restaurants")]
    Restaurants,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Retail and Grocery")]
    RetailAndGrocery,
    #[serde(rename = "Home and Office Improvement")]
    HomeAndOffice,
    #[serde(rename = "Hotel, Entertainment and Recreation")]
    HotelAndEntertainment,
    #[serde(rename = "Health and Education")]
    HealthAndEducation,
    #[serde(rename = "Personal and Household Expenses")]
    PersonalAndHousehold,
    #[serde(rename = "Professional and Financial Services")]
    ProfessionalAndFinancial,
    #[serde(rename = "Foreign Currency Transactions")]
    ForeignCurrency,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Restaurants,
        Category::Transportation,
        Category::RetailAndGrocery,
        Category::HomeAndOffice,
        Category::HotelAndEntertainment,
        Category::HealthAndEducation,
        Category::PersonalAndHousehold,
        Category::ProfessionalAndFinancial,
        Category::ForeignCurrency,
    ];

    /// Used when neither the hint nor the description identifies a category.
    pub const DEFAULT: Category = Category::PersonalAndHousehold;

    /// Canonical label, exactly as statements print it.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Restaurants => "Restaurants",
            Category::Transportation => "Transportation",
            Category::RetailAndGrocery => "Retail and Grocery",
            Category::HomeAndOffice => "Home and Office Improvement",
            Category::HotelAndEntertainment => "Hotel, Entertainment and Recreation",
            Category::HealthAndEducation => "Health and Education",
            Category::PersonalAndHousehold => "Personal and Household Expenses",
            Category::ProfessionalAndFinancial => "Professional and Financial Services",
            Category::ForeignCurrency => "Foreign Currency Transactions",
        }
    }

    /// Exact (case-insensitive) label lookup.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// All categories ordered by label length, longest first.
    ///
    /// Suffix and substring matching must try longer labels first so that a
    /// shorter label never shadows a longer one that contains it.
    pub fn by_label_length() -> Vec<Category> {
        let mut all = Category::ALL.to_vec();
        all.sort_by(|a, b| b.label().len().cmp(&a.label().len()));
        all
    }

    /// Description keywords, matched case-insensitively as substrings.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Restaurants => &[
                "starbucks",
                "tim hortons",
                "mcdonald",
                "pizza",
                "restaurant",
                "cafe",
                "coffee",
                "doordash",
                "skipthedishes",
                "uber eats",
                "a&w",
                "subway",
                "wendy",
                "burger",
                "sushi",
            ],
            Category::Transportation => &[
                "lyft",
                "uber",
                "transit",
                "taxi",
                "parking",
                "petro",
                "shell",
                "westjet",
                "air canada",
            ],
            Category::RetailAndGrocery => &[
                "superstore",
                "walmart",
                "wal-mart",
                "costco",
                "dollarama",
                "safeway",
                "sobeys",
                "no frills",
                "winners",
                "grocery",
                "amazon",
                "amzn",
                "staples",
                "sephora",
            ],
            Category::HomeAndOffice => &[
                "home depot",
                "ikea",
                "rona",
                "lowe's",
                "canadian tire",
                "stokes",
            ],
            Category::HotelAndEntertainment => &[
                "hotel",
                "airbnb",
                "netflix",
                "spotify",
                "cineplex",
                "ticketmaster",
            ],
            Category::HealthAndEducation => &[
                "pharmacy",
                "shoppers drug",
                "dental",
                "clinic",
                "university",
                "college",
            ],
            Category::ProfessionalAndFinancial => &[
                "insurance",
                "registry",
                "service charge",
                "interest charge",
                "annual fee",
            ],
            Category::PersonalAndHousehold | Category::ForeignCurrency => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a statement category hint and a description onto the taxonomy.
///
/// Priority: hint containing a canonical label > description keywords >
/// `Category::DEFAULT`. Never fails.
pub fn categorize(hint: &str, description: &str) -> Category {
    let hint = hint.trim();
    if hint.len() > 2 {
        let hint = hint.to_lowercase();
        if let Some(cat) = Category::by_label_length()
            .into_iter()
            .find(|c| hint.contains(&c.label().to_lowercase()))
        {
            return cat;
        }
    }

    let desc = description.to_lowercase();
    for cat in Category::ALL {
        if cat.keywords().iter().any(|kw| desc.contains(kw)) {
            return cat;
        }
    }

    Category::DEFAULT
}
