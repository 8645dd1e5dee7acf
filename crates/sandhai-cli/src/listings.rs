use sandhai_core::{Listing, ListingQuery, ListingRepository, RepositoryError};
use sandhai_db::PgListingRepository;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) async fn run_list(
    pool: PgPool,
    category: Option<String>,
    limit: i64,
) -> anyhow::Result<()> {
    let repo = PgListingRepository::new(pool);
    let mut query = ListingQuery::default().limit(limit);
    if let Some(category) = category {
        query = query.category(category);
    }

    let listings = repo.fetch_all(&query).await?;
    if listings.is_empty() {
        println!("no listings found; run `db seed` to add demo data");
        return Ok(());
    }

    println!("{:<38}{:<14}{:>12}  TITLE", "ID", "CATEGORY", "PRICE");
    for listing in &listings {
        println!(
            "{:<38}{:<14}{:>12}  {}",
            listing.id, listing.category, listing.price, listing.title
        );
    }
    Ok(())
}

pub(crate) async fn run_show(pool: PgPool, id: Uuid) -> anyhow::Result<()> {
    let repo = PgListingRepository::new(pool);
    match repo.fetch_by_id(id).await {
        Ok(listing) => {
            for line in detail_lines(&listing) {
                println!("{line}");
            }
            Ok(())
        }
        Err(RepositoryError::NotFound) => anyhow::bail!("no listing with id {id}"),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn detail_lines(listing: &Listing) -> Vec<String> {
    let mut lines = vec![
        listing.title.clone(),
        format!("  price:    Rs {}", listing.price),
        format!("  category: {}", listing.category),
    ];
    let place = [listing.place.area.as_deref(), listing.place.city.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    if !place.is_empty() {
        lines.push(format!("  place:    {place}"));
    }
    if let Some(coordinate) = listing.coordinate {
        lines.push(format!("  at:       {coordinate}"));
    }
    for (name, value) in listing.attributes.present() {
        lines.push(format!("  {name}: {value}"));
    }
    lines.push(format!(
        "  seller:   {} ({})",
        listing.seller.name, listing.seller.phone
    ));
    if let Some(alt) = &listing.seller.alt_phone {
        lines.push(format!("  alt phone: {alt}"));
    }
    if let Some(email) = &listing.seller.email {
        lines.push(format!("  email:    {email}"));
    }
    lines.push(format!(
        "  posted:   {}",
        listing.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if !listing.description.is_empty() {
        lines.push(String::new());
        lines.push(listing.description.clone());
    }
    lines
}
