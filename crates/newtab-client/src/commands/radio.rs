//! Radio station commands.

use newtab_core::RadioController;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Lists the configured stations, numbered from 1.
pub fn list(config: &ClientConfig) -> ClientResult<()> {
    if config.radio.is_empty() {
        println!("No radio stations configured.");
        return Ok(());
    }
    for (index, station) in config.radio.iter().enumerate() {
        println!("{:>2}. {}  {}", index + 1, station.name, station.url);
    }
    Ok(())
}

/// Picks a station and prints its label and stream URL.
///
/// `number` is 1-based. Without a number or `shuffle` the first station is picked.
pub fn pick(config: &ClientConfig, number: Option<u16>, shuffle: bool) -> ClientResult<()> {
    let mut controller = RadioController::new(config.radio.clone());
    choose(&mut controller, number, shuffle)?;
    controller.play();

    println!("{}", controller.station_display());
    if let Some(station) = controller.current_station() {
        println!("{}", station.url);
    }
    Ok(())
}

fn choose(
    controller: &mut RadioController,
    number: Option<u16>,
    shuffle: bool,
) -> ClientResult<()> {
    if shuffle {
        controller.shuffle()?;
    } else {
        let index = number.map_or(0, |n| usize::from(n).saturating_sub(1));
        controller.select(index)?;
    }
    Ok(())
}
