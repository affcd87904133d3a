mod app;
mod astro;
mod bodies;
mod chart;
mod config;
mod ephemeris;
mod grid;
mod plot;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
