//! Shared builders and doubles for domain unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::ListingRepository;
use crate::domain::{
    Listing, ListingDetails, ListingId, Seller, SellerType, Specifications, UserId,
};
use crate::outbound::memory::InMemoryListingRepository;

/// Fixed instant most tests start from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture timestamp"))
}

/// Valid listing with a fresh id; `customise` adjusts fields before return.
pub fn listing_fixture(customise: impl FnOnce(&mut Listing)) -> Listing {
    let mut listing = Listing {
        id: ListingId::random(),
        details: ListingDetails {
            title: "2019 Volkswagen Polo GT".to_owned(),
            brand: "Volkswagen".to_owned(),
            model: "Polo".to_owned(),
            year: 2019,
            price: 650_000,
            old_price: None,
            kilometers: 41_000,
            fuel_type: "Petrol".to_owned(),
            transmission: "Automatic".to_owned(),
            body_type: "Hatchback".to_owned(),
            owners: 1,
            location: "Bengaluru".to_owned(),
            description: "Well maintained.".to_owned(),
            features: vec!["Cruise control".to_owned()],
            specifications: Specifications {
                engine: "999 cc".to_owned(),
                seating_capacity: 5,
                ..Specifications::default()
            },
            is_new: false,
            is_featured: false,
            is_reduced: false,
        },
        seller: Seller {
            user_id: UserId::random(),
            seller_type: SellerType::Individual,
            name: "Arjun".to_owned(),
            contact: "arjun@example.com".to_owned(),
        },
        images: Vec::new(),
        created_at: epoch(),
        updated_at: epoch(),
        revision: 1,
    };
    customise(&mut listing);
    listing
}

/// Insert listings into an in-memory repository.
pub async fn seed(repo: &InMemoryListingRepository, listings: impl IntoIterator<Item = Listing>) {
    for listing in listings {
        repo.insert(&listing)
            .await
            .unwrap_or_else(|err| panic!("seed listing: {err}"));
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance_millis(&self, millis: i64) {
        *self.lock_clock() += TimeDelta::milliseconds(millis);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}
