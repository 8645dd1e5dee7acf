//! `location` subcommands and the store wiring shared with `feed`.

use anyhow::Context;
use clap::Subcommand;
use sandhai_core::{Coordinate, FeedSettings, UserLocation};
use sandhai_feed::location::{IpLocator, JsonFilePersistence, NominatimGeocoder, Sensor};
use sandhai_feed::{LocationEvent, LocationStore, StoreSettings};

use crate::SensorArgs;

pub(crate) type CliStore = LocationStore<Sensor, NominatimGeocoder, JsonFilePersistence>;

#[derive(Debug, Subcommand)]
pub enum LocationCommands {
    /// Show the saved location, detecting one if nothing is saved
    Show {
        #[command(flatten)]
        sensor: SensorArgs,
    },
    /// Detect the location again and save it
    Detect {
        #[command(flatten)]
        sensor: SensorArgs,
    },
    /// Save a city and area typed by hand (no distance ranking)
    Set {
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        area: String,
    },
    /// Forget the saved location
    Reset,
}

pub(crate) fn sensor_from_args(
    args: &SensorArgs,
    settings: &FeedSettings,
) -> anyhow::Result<Sensor> {
    if args.no_sensor {
        return Ok(Sensor::Disabled);
    }
    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng)
            .map(Sensor::Fixed)
            .with_context(|| format!("coordinate out of range: {lat}, {lng}")),
        _ => Ok(Sensor::Ip(IpLocator::new(
            &settings.ip_locator_url,
            settings.http_timeout_secs,
            &settings.http_user_agent,
        )?)),
    }
}

pub(crate) fn build_store(settings: &FeedSettings, args: &SensorArgs) -> anyhow::Result<CliStore> {
    let geocoder = NominatimGeocoder::new(
        &settings.geocoder_url,
        settings.http_timeout_secs,
        &settings.http_user_agent,
    )?;
    Ok(LocationStore::new(
        sensor_from_args(args, settings)?,
        geocoder,
        JsonFilePersistence::new(&settings.location_path),
        StoreSettings::from_feed_settings(settings),
    ))
}

pub(crate) fn describe(location: &UserLocation) -> String {
    let coordinate = location
        .coordinate()
        .map_or_else(|| "no coordinate".to_string(), |c| c.to_string());
    format!(
        "{} [{}] ({coordinate})",
        location.label(),
        location.source()
    )
}

pub(crate) async fn run(settings: &FeedSettings, command: LocationCommands) -> anyhow::Result<()> {
    match command {
        LocationCommands::Show { sensor } => {
            let store = build_store(settings, &sensor)?;
            let mut events = store.subscribe();
            let location = store.resolve().await;
            println!("{}", describe(&location));
            while let Ok(event) = events.try_recv() {
                if event == LocationEvent::ManualInputRequested {
                    println!(
                        "location could not be detected; set one with \
                         `location set --city <CITY> --area <AREA>`"
                    );
                }
            }
        }
        LocationCommands::Detect { sensor } => {
            let store = build_store(settings, &sensor)?;
            let location = store
                .redetect()
                .await
                .context("location detection failed; saved location unchanged")?;
            println!("{}", describe(&location));
        }
        LocationCommands::Set { city, area } => {
            let store = build_store(settings, &SensorArgs::default())?;
            let location = store.set_manual(&city, &area).await;
            println!("{}", describe(&location));
        }
        LocationCommands::Reset => {
            let store = build_store(settings, &SensorArgs::default())?;
            store.reset().await?;
            println!(
                "saved location cleared ({})",
                settings.location_path.display()
            );
        }
    }
    Ok(())
}
