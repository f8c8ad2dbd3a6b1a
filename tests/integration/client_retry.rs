use std::{collections::VecDeque, io, sync::Arc, time::Duration};

use anyhow::Result;
use crontab_explorer::{
    client::{
        command_loop, ClientError, ClientSession, ClientState, Prompter, RetryPolicy, ToolClient,
    },
    server::runtime::{serve, ServerContext, ToolRegistry},
    tools::{register_tool, CheckServerStatus},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::common::{closed_port, CannedHost, TestServer};

/// Replays scripted answers, then reports end of input.
struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        self.prompts.push(message.to_string());
        Ok(self.answers.pop_front())
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        interval: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn client_becomes_ready_once_server_appears() -> Result<()> {
    let port = closed_port().await?;
    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(450)).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let mut registry = ToolRegistry::new();
        register_tool(&mut registry, CheckServerStatus::new(1))
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let ctx = Arc::new(ServerContext::new(registry, Duration::from_secs(2)));
        serve(listener, ctx, server_shutdown).await
    });

    let api = ToolClient::new("127.0.0.1", port)?;
    let mut session = ClientSession::new(api.base_url(), fast_policy(15));
    let mut retries = 0;
    session
        .wait_until_reachable(&api, |_| retries += 1)
        .await?;

    assert!(session.connected());
    assert_eq!(session.state(), ClientState::Reachable);
    assert!(
        (1..=15).contains(&session.retry_count()),
        "retry count {}",
        session.retry_count()
    );
    assert_eq!(retries, session.retry_count());

    let tools = session.discover(&api).await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(session.state(), ClientState::Ready);

    shutdown.cancel();
    server.await??;
    Ok(())
}

#[tokio::test]
async fn client_gives_up_after_budget() -> Result<()> {
    let api = ToolClient::new("127.0.0.1", closed_port().await?)?;
    let mut session = ClientSession::new(api.base_url(), fast_policy(4));
    let err = session
        .wait_until_reachable(&api, |_| {})
        .await
        .expect_err("server never starts");

    match err {
        ClientError::ServerUnreachable { attempts, url } => {
            assert_eq!(attempts, 4);
            assert_eq!(url, api.base_url());
        }
        other => panic!("expected ServerUnreachable, got {other:?}"),
    }
    assert_eq!(session.state(), ClientState::Terminated);
    Ok(())
}

#[tokio::test]
async fn reachable_server_needs_no_retry() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let api = ToolClient::new("127.0.0.1", server.port())?;
    let mut session = ClientSession::new(api.base_url(), fast_policy(15));
    session
        .wait_until_reachable(&api, |attempt| panic!("unexpected retry {attempt}"))
        .await?;
    assert_eq!(session.retry_count(), 0);

    server.stop().await
}

#[tokio::test]
async fn command_loop_runs_menu_actions_in_sequence() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let api = ToolClient::new("127.0.0.1", server.port())?;
    let mut session = ClientSession::new(api.base_url(), fast_policy(1));
    session.wait_until_reachable(&api, |_| {}).await?;
    session.discover(&api).await?;

    let mut prompter = ScriptedPrompter::new(&["", "2", "rotate", "9", "3", "4", "5", "1"]);
    let invocations = command_loop(&mut session, &api, &mut prompter).await?;

    assert_eq!(invocations, 4);
    assert_eq!(session.state(), ClientState::Terminated);
    assert_eq!(
        prompter.answers,
        VecDeque::from(vec!["1".to_string()]),
        "exit stops reading input"
    );
    assert_eq!(
        prompter
            .prompts
            .iter()
            .filter(|prompt| prompt.as_str() == "Enter search term")
            .count(),
        1
    );

    server.stop().await
}

#[tokio::test]
async fn command_loop_ends_at_end_of_input() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let api = ToolClient::new("127.0.0.1", server.port())?;
    let mut session = ClientSession::new(api.base_url(), fast_policy(1));

    let mut prompter = ScriptedPrompter::new(&["4"]);
    let invocations = command_loop(&mut session, &api, &mut prompter).await?;
    assert_eq!(invocations, 1);
    assert_eq!(session.state(), ClientState::Terminated);

    server.stop().await
}
