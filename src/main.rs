mod cli;
mod content;
mod critique;
mod gallery;
mod loader;
mod ui;

use clap::Parser;
use std::sync::{Arc, Condvar, Mutex};
use winit::event_loop::EventLoop;

use crate::cli::{default_memory_budget, Cli};
use crate::critique::CritiqueClient;
use crate::gallery::{collect_sources, Gallery};
use crate::loader::{spawn_decode_workers, CacheState, SharedState, UserEvent};
use crate::ui::state::AppState;
use crate::ui::App;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let budget = cli.memory.unwrap_or_else(default_memory_budget);

    let sources = collect_sources(&cli.sources, cli.recursive, cli.follow_links);
    let gallery = Gallery::from_sources(sources, cli.profile_photo.clone());
    if gallery.is_empty() {
        log::error!("No images found.");
        return;
    }
    let slots = Arc::new(gallery.sources());
    log::info!(
        "{} images, cache budget {} MB",
        gallery.len(),
        budget / (1024 * 1024)
    );

    let http = match reqwest::blocking::Client::builder()
        .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Could not create HTTP client: {}", e);
            return;
        }
    };

    let shared: SharedState = Arc::new((
        Mutex::new(CacheState::new(budget, gallery.len(), slots.len())),
        Condvar::new(),
    ));

    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(2, 8);

    let event_loop = match EventLoop::<UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Could not create event loop: {}", e);
            return;
        }
    };
    let proxy = event_loop.create_proxy();

    // Workers start on the grid thumbnails right away.
    spawn_decode_workers(
        Arc::clone(&shared),
        slots,
        http.clone(),
        proxy.clone(),
        num_threads,
    );

    let critic = Arc::new(CritiqueClient::new(http, cli.api_key, cli.model, cli.endpoint));
    let state = AppState::new(gallery, shared, cli.owner, cli.email, critic.is_configured());
    let mut app = App::new(state, critic, proxy);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {}", e);
    }
}
