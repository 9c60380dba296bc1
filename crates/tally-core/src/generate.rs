//! Sample dataset generator
//!
//! Produces plausible personal transactions (housing, food, transport,
//! leisure, subscriptions and income) with a running balance, for demos and
//! for exercising the dashboard without real bank data.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Dataset, Transaction};

struct CategorySpec {
    name: &'static str,
    /// Inclusive amount range (negative for expenses)
    range: (f64, f64),
    subcategories: &'static [(&'static str, &'static [&'static str])],
}

const CATALOG: &[CategorySpec] = &[
    CategorySpec {
        name: "Housing",
        range: (-1200.0, -400.0),
        subcategories: &[
            ("Rent", &["Apartment Rent", "Deposit"]),
            ("Utilities", &["Electricity", "Water", "Gas", "Internet"]),
            ("Maintenance", &["Repairs", "Cleaning", "Furniture"]),
        ],
    },
    CategorySpec {
        name: "Food",
        range: (-500.0, -20.0),
        subcategories: &[
            ("Supermarket", &["Mercadona", "Carrefour", "Lidl", "Dia"]),
            ("Restaurants", &["Restaurant", "Bar", "Cafe"]),
            ("Takeaway", &["Glovo", "Uber Eats", "Just Eat"]),
        ],
    },
    CategorySpec {
        name: "Transport",
        range: (-200.0, -10.0),
        subcategories: &[
            ("Public", &["Metro", "Bus", "Taxi"]),
            ("Private", &["Gas", "Parking", "Car Maintenance"]),
        ],
    },
    CategorySpec {
        name: "Leisure",
        range: (-300.0, -15.0),
        subcategories: &[
            ("Entertainment", &["Cinema", "Theater", "Concerts"]),
            ("Sports", &["Gym", "Sports Equipment"]),
            ("Travel", &["Flights", "Hotel", "Activities"]),
        ],
    },
    CategorySpec {
        name: "Subscriptions",
        range: (-50.0, -5.0),
        subcategories: &[
            ("Streaming", &["Netflix", "Spotify", "HBO"]),
            ("Software", &["Adobe", "Microsoft", "iCloud"]),
        ],
    },
    CategorySpec {
        name: "Income",
        range: (1000.0, 3000.0),
        subcategories: &[
            ("Salary", &["Salary", "Bonus"]),
            ("Other", &["Refund", "Gift", "Reimbursement"]),
        ],
    },
];

/// Generator for a fake transaction history
pub struct SampleGenerator {
    start: NaiveDate,
    end: NaiveDate,
    initial_balance: f64,
    /// Inclusive bounds on transactions per day
    per_day: (u32, u32),
    seed: Option<u64>,
}

impl SampleGenerator {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            initial_balance: 5000.0,
            per_day: (1, 5),
            seed: None,
        }
    }

    /// Use a fixed seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_initial_balance(mut self, balance: f64) -> Self {
        self.initial_balance = balance;
        self
    }

    pub fn with_per_day(mut self, min: u32, max: u32) -> Self {
        self.per_day = (min, max);
        self
    }

    pub fn generate(&self) -> Result<Dataset> {
        if self.start > self.end {
            return Err(Error::InvalidData(format!(
                "Start date {} is after end date {}",
                self.start, self.end
            )));
        }
        let (min_per_day, max_per_day) = self.per_day;
        if min_per_day > max_per_day || max_per_day == 0 {
            return Err(Error::InvalidData(format!(
                "Invalid transactions per day: {}..={}",
                min_per_day, max_per_day
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut transactions = Vec::new();
        let mut balance = self.initial_balance;
        let mut date = self.start;

        while date <= self.end {
            let count = rng.gen_range(min_per_day..=max_per_day);

            for _ in 0..count {
                let category = &CATALOG[rng.gen_range(0..CATALOG.len())];
                let (subcategory, concepts) =
                    category.subcategories[rng.gen_range(0..category.subcategories.len())];
                let concept = concepts[rng.gen_range(0..concepts.len())];

                let (min, max) = category.range;
                let amount = round_cents(rng.gen_range(min..=max));
                balance = round_cents(balance + amount);

                transactions.push(Transaction {
                    id: 0,
                    date,
                    description: concept.to_string(),
                    category: category.name.to_string(),
                    subcategory: subcategory.to_string(),
                    amount,
                    balance,
                });
            }

            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        debug!(
            "Generated {} transactions from {} to {}",
            transactions.len(),
            self.start,
            self.end
        );
        Dataset::from_transactions(transactions)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
