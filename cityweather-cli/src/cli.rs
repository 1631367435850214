use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::Confirm;

use cityweather_core::{
    CardState, CurrentConditions, LocationStore, MAX_SAVED_LOCATIONS, PlaceResolver,
    RefreshCoordinator, SearchSession, WeatherClient,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for your saved cities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a city and show its current weather.
    Search {
        /// City name, e.g. "Halifax".
        city: String,

        /// Save the matched location without asking.
        #[arg(long)]
        save: bool,
    },

    /// Show current weather for every saved location.
    Saved,

    /// Remove a saved location by its exact label.
    Remove {
        /// Label as printed by `saved`, e.g. "Halifax, Nova Scotia, Canada".
        label: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let store = LocationStore::open_default().context("Failed to open saved locations")?;
        let resolver = PlaceResolver::new();
        let weather = WeatherClient::new();

        match self.command {
            Command::Search { city, save } => {
                search(&store, &resolver, &weather, &city, save).await
            }
            Command::Saved => saved(&store, &resolver, &weather).await,
            Command::Remove { label, yes } => remove(&store, &label, yes),
        }
    }
}

async fn search(
    store: &LocationStore,
    resolver: &PlaceResolver,
    weather: &WeatherClient,
    city: &str,
    save: bool,
) -> anyhow::Result<()> {
    let mut session = SearchSession::new(resolver, weather, store);

    let result = match session.search(city).await {
        Ok(result) => result,
        Err(e) => {
            println!("Search failed: {e}");
            return Ok(());
        }
    };

    println!("{}", result.place.display_name);
    println!(
        "Lat: {:.4} | Lon: {:.4}",
        result.place.latitude, result.place.longitude
    );
    print_conditions(&result.conditions, "");

    if !session.can_save() {
        println!("Save disabled: you already saved {MAX_SAVED_LOCATIONS} cities.");
        return Ok(());
    }

    let wants_save = save
        || Confirm::new("Save this location?")
            .with_default(false)
            .prompt()
            .unwrap_or(false);

    if wants_save {
        match session.try_save(&result.place) {
            Ok(()) => println!("Saved!"),
            Err(e) => println!("Cannot save: {e}"),
        }
    }

    Ok(())
}

async fn saved(
    store: &LocationStore,
    resolver: &PlaceResolver,
    weather: &WeatherClient,
) -> anyhow::Result<()> {
    let coordinator = RefreshCoordinator::new(store, resolver, weather);
    let cards = coordinator.refresh_all().await;

    println!(
        "Saved cities: {}/{MAX_SAVED_LOCATIONS} (refreshed {})",
        cards.len(),
        Local::now().format("%H:%M")
    );
    if cards.is_empty() {
        println!("No saved locations yet. Try `cityweather search <city>` and save one.");
        return Ok(());
    }

    for card in &cards {
        println!();
        println!("{}", card.label());
        match card.state() {
            CardState::Ready { place, conditions } => {
                if place.display_name != card.label() {
                    println!("  Matched: {}", place.display_name);
                }
                print_conditions(conditions, "  ");
            }
            CardState::Failed { message } => println!("  Error: {message}"),
            CardState::Loading => println!("  Loading weather..."),
        }
    }

    Ok(())
}

fn remove(store: &LocationStore, label: &str, yes: bool) -> anyhow::Result<()> {
    let confirmed = yes
        || Confirm::new(&format!("Remove {label}?"))
            .with_default(false)
            .prompt()
            .unwrap_or(false);

    if !confirmed {
        println!("Kept {label}.");
        return Ok(());
    }

    store.remove(label)?;
    println!("Removed.");
    Ok(())
}

fn print_conditions(conditions: &CurrentConditions, indent: &str) {
    println!("{indent}Temperature: {:.1}°C", conditions.temperature_c);
    println!(
        "{indent}Wind: {:.1} km/h ({:.0}°)",
        conditions.wind_speed_kmh, conditions.wind_direction_deg
    );
    println!("{indent}Conditions: {}", conditions.condition().description());
    match conditions.observed_at_local() {
        Some(t) => println!("{indent}Observed: {}", t.format("%Y-%m-%d %H:%M")),
        None => println!("{indent}Observed: {}", conditions.observed_at),
    }
}
