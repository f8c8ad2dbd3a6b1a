//! Protocol client: reachability, discovery and the interactive command loop.
pub mod api;
pub mod error;
pub mod menu;
pub mod render;
pub mod session;

pub use api::{ToolClient, DISCOVERY_TIMEOUT, INVOCATION_TIMEOUT, LIVENESS_TIMEOUT};
pub use error::ClientError;
pub use menu::{command_loop, ConsolePrompter, MenuChoice, Prompter};
pub use session::{ClientSession, ClientState, RetryPolicy};

/// Where the client connects and how long it waits for the server.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub host: String,
    pub port: u16,
    pub retry: RetryPolicy,
}

/// Full interactive run: wait for the server, show the catalog, then loop on the menu.
pub async fn run_interactive(
    options: &ClientOptions,
    prompter: &mut dyn Prompter,
) -> Result<(), ClientError> {
    render::header();
    let api = ToolClient::new(&options.host, options.port)?;
    let mut session = ClientSession::new(api.base_url(), options.retry);
    render::connecting(api.base_url());

    if let Err(err) = session.wait_until_reachable(&api, render::waiting).await {
        if session.retry_count() > 0 {
            render::wait_exhausted();
        }
        return Err(err);
    }
    if session.retry_count() > 0 {
        render::reachable_after_wait();
    }

    let tools = session.discover(&api).await?;
    render::catalog(&tools);

    command_loop(&mut session, &api, prompter).await?;
    Ok(())
}
