use encore::board::EventBoard;
use encore::catalog::display::summary;
use encore::config::env_loader::load_config;
use encore::logging::{setup_logging, shutdown_logging};
use encore::session::IdentityResolution;
use encore::supabase::api::SupabaseAPI;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let loki = setup_logging().await;

    let exit_code = run().await;

    shutdown_logging(loki).await;

    exit_code
}

async fn run() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let api = match SupabaseAPI::new(&config.supabase) {
        Ok(api) => api,
        Err(err) => {
            error!("Could not build the backend client: {}", err);
            return ExitCode::FAILURE;
        }
    };

    info!("Using backend at {}", api.base_url());

    let mut board = EventBoard::new(api, &config.catalog);
    let startup = board.start().await;

    match &startup.identity {
        IdentityResolution::Present(identity) => info!("Signed in as {}", identity.email),
        IdentityResolution::Absent => info!("Browsing as guest"),
        IdentityResolution::Failed(err) => warn!("Could not check the session: {}", err),
    }

    if let Err(err) = startup.loaded {
        error!("Could not load events: {}", err);
        return ExitCode::FAILURE;
    }

    let demo = config.demo_config;

    if let Some(credentials) = &demo.sign_in {
        if board.identity().is_some() {
            info!("Session resumed, skipping the configured sign in");
        } else if let Err(err) = board.sign_in(&credentials.email, &credentials.password).await {
            error!("Sign in failed: {}", err);
            return ExitCode::FAILURE;
        }
    }

    board.set_query(demo.query);
    board.set_category(demo.category);

    if demo.mine_only && !board.toggle_mine_only() {
        warn!("Showing only your events requires signing in");
    }

    let events = board.visible_events();

    info!(
        "Showing {} of {} events",
        events.len(),
        board.store().events().len()
    );

    events
        .iter()
        .for_each(|event| info!("#{} {}", event.id, summary(event)));

    ExitCode::SUCCESS
}
