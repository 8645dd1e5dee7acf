use sandhai_core::AppConfig;
use sqlx::PgPool;

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = sandhai_db::PoolConfig::from_app_config(config);
    Ok(sandhai_db::connect_pool(&config.database_url, pool_config).await?)
}

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    sandhai_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = sandhai_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

pub(crate) async fn run_seed(pool: &PgPool) -> anyhow::Result<()> {
    sandhai_db::run_migrations(pool).await?;
    let inserted = sandhai_db::seed_demo_listings(pool).await?;
    if inserted == 0 {
        println!("listings table already has rows; nothing seeded");
    } else {
        println!("seeded {inserted} demo listing(s)");
    }
    Ok(())
}
