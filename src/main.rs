use vicoo_galaxy::graph_utils::galaxy::GalaxyStore;
use vicoo_galaxy::gui::frontend::GalaxyApp;
use vicoo_galaxy::persistence::persist;
use vicoo_galaxy::persistence::settings::{AppSettings, Environment};

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("could not read settings, using defaults: {:#}", e);
        AppSettings::default()
    });
    let loaded_state = match persist::load_active(&settings.autosave_dir()) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("could not restore last galaxy: {:#}", e);
            None
        }
    };
    let env = Environment::new(settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 760.0])
            // Keep the side panel and search box usable on small screens
            .with_min_inner_size([720.0, 440.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Vicoo Galaxy",
        options,
        Box::new(move |cc| {
            let app = match loaded_state {
                Some(state) => GalaxyApp::from_state(env, state),
                // No prior state: start from the demo galaxy
                None => GalaxyApp::new(env, GalaxyStore::seeded()),
            };
            app.apply_theme(&cc.egui_ctx);
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    )
}
