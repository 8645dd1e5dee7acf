use rust_decimal::Decimal;
use sandhai_core::{CategoryAttributes, Coordinate, ListingDraft, Place, Seller};
use sqlx::PgPool;

use crate::listings::insert_listing;
use crate::DbError;

struct DemoListing {
    title: &'static str,
    category: &'static str,
    price_rupees: i64,
    at: Option<(f64, f64)>,
    city: &'static str,
    area: &'static str,
    seller: &'static str,
    phone: &'static str,
    condition: Option<&'static str>,
    brand: Option<&'static str>,
}

const DEMO: &[DemoListing] = &[
    DemoListing {
        title: "Samsung Galaxy M14, 6GB/128GB",
        category: "electronics",
        price_rupees: 8_500,
        at: Some((13.0418, 80.2341)),
        city: "Chennai",
        area: "T. Nagar",
        seller: "Karthik",
        phone: "+91 98400 11223",
        condition: Some("used"),
        brand: Some("Samsung"),
    },
    DemoListing {
        title: "Teak wood dining table, 6 seater",
        category: "furniture",
        price_rupees: 18_000,
        at: Some((13.0012, 80.2565)),
        city: "Chennai",
        area: "Adyar",
        seller: "Lakshmi",
        phone: "+91 94440 55678",
        condition: Some("used"),
        brand: None,
    },
    DemoListing {
        title: "Hero Sprint cycle, 26 inch",
        category: "vehicles",
        price_rupees: 4_200,
        at: Some((12.9249, 80.1000)),
        city: "Chennai",
        area: "Tambaram",
        seller: "Ravi",
        phone: "9884012345",
        condition: Some("used"),
        brand: Some("Hero"),
    },
    DemoListing {
        title: "Kanchipuram silk saree",
        category: "fashion",
        price_rupees: 12_500,
        at: Some((12.8342, 79.7036)),
        city: "Kanchipuram",
        area: "Gandhi Road",
        seller: "Meena",
        phone: "+91 97910 33445",
        condition: Some("new"),
        brand: None,
    },
    DemoListing {
        title: "Wet grinder, 2 litre",
        category: "appliances",
        price_rupees: 3_000,
        at: Some((11.0168, 76.9558)),
        city: "Coimbatore",
        area: "RS Puram",
        seller: "Senthil",
        phone: "+91 90030 77889",
        condition: Some("used"),
        brand: Some("Butterfly"),
    },
    DemoListing {
        title: "School textbooks, class 10 state board",
        category: "books",
        price_rupees: 600,
        at: None,
        city: "Chennai",
        area: "Velachery",
        seller: "Divya",
        phone: "+91 99620 44556",
        condition: Some("used"),
        brand: None,
    },
];

/// Sample listings around Chennai, plus a few far away and one without a
/// coordinate, for trying the feed locally.
#[must_use]
pub fn demo_listings() -> Vec<ListingDraft> {
    DEMO.iter()
        .map(|demo| ListingDraft {
            title: demo.title.to_string(),
            description: format!("{} in {}, {}.", demo.title, demo.area, demo.city),
            category: demo.category.to_string(),
            price: Decimal::new(demo.price_rupees, 0),
            images: Vec::new(),
            coordinate: demo.at.and_then(|(lat, lng)| Coordinate::new(lat, lng)),
            place: Place {
                city: Some(demo.city.to_string()),
                area: Some(demo.area.to_string()),
            },
            seller: Seller {
                name: demo.seller.to_string(),
                phone: demo.phone.to_string(),
                alt_phone: None,
                email: None,
            },
            attributes: CategoryAttributes {
                condition: demo.condition.map(str::to_string),
                brand: demo.brand.map(str::to_string),
                size: None,
                material: None,
            },
        })
        .collect()
}

/// Insert the demo listings into an empty table.
///
/// Returns the number of listings inserted; `0` if the table already had rows.
/// All inserts run in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_listings(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "listings table not empty, skipping demo seed");
        return Ok(0);
    }

    let drafts = demo_listings();
    for draft in &drafts {
        insert_listing(&mut *tx, draft).await?;
    }
    tx.commit().await?;

    tracing::info!(count = drafts.len(), "seeded demo listings");
    Ok(drafts.len())
}
