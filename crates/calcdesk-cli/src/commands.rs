//! Command-line arguments and command implementations for `calcdesk`.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use calcdesk_core::config::BASE_URL_ENV;
use calcdesk_core::models::{CalculationType, CalculationUpdate, RegisterRequest, TokenResponse};
use calcdesk_core::{
    capitalize_first, format_number, parse_number_inputs, ApiClient, ApiError, ClockStyle, Config,
    CredentialStore, Notifier,
};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use tracing::{info, warn};

use crate::terminal;

/// Default history page size
const HISTORY_PAGE_SIZE: u32 = 10;

#[derive(Parser, Debug)]
#[command(name = "calcdesk", version, about = "Command-line client for the calculator service")]
pub struct Cli {
    /// Service address, overriding the config file
    #[arg(long, env = BASE_URL_ENV, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in, using a remembered password when there is one
    Login {
        username: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Log out
    Logout {
        /// Also forget the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// Create an account
    Register,
    /// Show who is logged in
    Status,
    /// Check the service is up
    Health,
    /// Create a calculation, e.g. `calc division "100, 5, 2"`
    Calc(CalculationArgs),
    /// Compute locally without saving
    Preview(CalculationArgs),
    /// List calculations
    List,
    /// Show one calculation
    Show { id: String },
    /// Change the type and/or inputs of a calculation
    Edit {
        id: String,
        #[arg(long = "type")]
        kind: Option<CalculationType>,
        /// Comma-separated numbers
        #[arg(long, allow_hyphen_values = true)]
        inputs: Option<String>,
    },
    /// Delete a calculation
    Delete { id: String },
    /// Show usage statistics
    Stats,
    /// Page through past calculations, newest first
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = HISTORY_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        operation: Option<CalculationType>,
    },
    /// Per-operation statistics, for every type when none is given
    OpStats { operation: Option<CalculationType> },
    /// Change and save client settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct CalculationArgs {
    /// addition, subtraction, multiplication or division
    pub kind: CalculationType,
    /// Comma-separated numbers
    #[arg(allow_hyphen_values = true)]
    pub inputs: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Service address to save
    #[arg(long = "url")]
    pub base_url: Option<String>,
    /// 12 or 24
    #[arg(long, value_parser = parse_clock)]
    pub clock: Option<ClockStyle>,
    /// Seconds before an alert fades
    #[arg(long)]
    pub alert_secs: Option<u64>,
}

fn parse_clock(value: &str) -> Result<ClockStyle, String> {
    match value {
        "12" => Ok(ClockStyle::TwelveHour),
        "24" => Ok(ClockStyle::TwentyFourHour),
        other => Err(format!("invalid clock style {other}: use 12 or 24")),
    }
}

/// Everything a command needs to run.
pub struct App {
    pub client: ApiClient,
    pub notifier: Notifier,
    pub config: Config,
}

pub async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { username, remember } => login(app, username, remember).await,
        Command::Logout { forget } => logout(app, forget),
        Command::Register => register(app).await,
        Command::Status => status(app),
        Command::Health => health(app).await,
        Command::Calc(args) => create(app, args).await,
        Command::Preview(args) => preview(args),
        Command::List => list(app).await,
        Command::Show { id } => show(app, &id).await,
        Command::Edit { id, kind, inputs } => edit(app, &id, kind, inputs).await,
        Command::Delete { id } => delete(app, &id).await,
        Command::Stats => stats(app).await,
        Command::History {
            page,
            page_size,
            operation,
        } => history(app, page, page_size, operation).await,
        Command::OpStats { operation } => operation_stats(app, operation).await,
        Command::Config(args) => configure(args),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

fn parse_inputs(raw: &str) -> Vec<f64> {
    let inputs = parse_number_inputs(raw);
    let segments = raw.split(',').filter(|s| !s.trim().is_empty()).count();
    if inputs.len() < segments {
        warn!(raw, kept = inputs.len(), "Ignored non-numeric inputs");
    }
    inputs
}

/// Guard for commands that need a session; `require_auth` prints the hint.
fn ensure_logged_in(app: &App) -> Result<()> {
    if !app.client.session().require_auth() {
        return Err(ApiError::Unauthenticated.into());
    }
    Ok(())
}

/// Log in with a remembered password if there is one, asking for the
/// password when there is none or the server rejects it.
///
/// Returns the login and the password that worked.
async fn login_with_fallback<F>(
    client: &ApiClient,
    username: &str,
    remembered: Option<String>,
    ask: F,
) -> Result<(TokenResponse, String)>
where
    F: FnOnce() -> Result<String>,
{
    if let Some(password) = remembered {
        match client.login(username, &password).await {
            Ok(token) => return Ok((token, password)),
            Err(ApiError::Unauthorized(reason)) => {
                warn!(username, %reason, "Remembered password rejected");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let password = ask()?;
    let token = client.login(username, &password).await?;
    Ok((token, password))
}

async fn login(app: &App, username: Option<String>, remember: bool) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => prompt("Username")?,
    };

    let remembered = CredentialStore::get_password(&username).unwrap_or_else(|e| {
        warn!(error = %e, "Keychain unavailable");
        None
    });
    if remembered.is_some() {
        info!(username = %username, "Using remembered password");
    }
    let had_remembered = remembered.is_some();

    let (token, password) =
        login_with_fallback(&app.client, &username, remembered, || prompt_password("Password"))
            .await?;

    // A replaced password is kept only if one was remembered before
    if remember || had_remembered {
        CredentialStore::store(&username, &password)?;
    }
    app.notifier
        .show_success(&format!("Welcome back, {}!", token.display_name()));
    Ok(())
}

fn logout(app: &App, forget: bool) -> Result<()> {
    let username = app.client.session().username();
    app.client.logout()?;

    if forget {
        if let Some(username) = username {
            CredentialStore::delete(&username)?;
        }
    }
    app.notifier.show_success("Logged out");
    Ok(())
}

async fn register(app: &App) -> Result<()> {
    let request = RegisterRequest {
        first_name: prompt("First name")?,
        last_name: prompt("Last name")?,
        email: prompt("Email")?,
        username: prompt("Username")?,
        password: prompt_password("Password")?,
        confirm_password: prompt_password("Confirm password")?,
    };

    let user = app.client.register(&request).await?;
    app.notifier.show_success(&format!(
        "Account {} created. Log in with `calcdesk login {}`.",
        user.username, user.username
    ));
    Ok(())
}

fn status(app: &App) -> Result<()> {
    ensure_logged_in(app)?;
    let session = app.client.session();
    println!(
        "Logged in as {} ({})",
        session.username().unwrap_or_else(|| "unknown".to_string()),
        app.client.base_url()
    );
    Ok(())
}

async fn health(app: &App) -> Result<()> {
    let health = app.client.health().await?;
    if health.is_ok() {
        app.notifier
            .show_success(&format!("{} is up", app.client.base_url()));
        Ok(())
    } else {
        bail!("Service reported status {}", health.status)
    }
}

async fn create(app: &App, args: CalculationArgs) -> Result<()> {
    ensure_logged_in(app)?;
    let kind = args.kind;
    let inputs = parse_inputs(&args.inputs);

    let calc = app.client.create_calculation(kind, inputs).await?;
    terminal::print_calculation(&calc, app.config.clock_style);
    app.notifier.show_success(&format!(
        "{} saved: {} = {}",
        capitalize_first(kind.as_str())?,
        kind.expression(&calc.inputs),
        calc.result_display()
    ));
    Ok(())
}

fn preview(args: CalculationArgs) -> Result<()> {
    let inputs = parse_inputs(&args.inputs);
    let result = args.kind.compute(&inputs)?;
    println!("{} = {}", args.kind.expression(&inputs), format_number(result));
    Ok(())
}

async fn list(app: &App) -> Result<()> {
    ensure_logged_in(app)?;
    let calcs = app.client.list_calculations().await?;
    terminal::print_calculation_table(&calcs, app.config.clock_style);
    Ok(())
}

async fn show(app: &App, id: &str) -> Result<()> {
    ensure_logged_in(app)?;
    let calc = app.client.get_calculation(id).await?;
    terminal::print_calculation(&calc, app.config.clock_style);
    Ok(())
}

async fn edit(
    app: &App,
    id: &str,
    kind: Option<CalculationType>,
    inputs: Option<String>,
) -> Result<()> {
    ensure_logged_in(app)?;
    let update = CalculationUpdate {
        kind,
        inputs: inputs.as_deref().map(parse_inputs),
    };
    if update.is_empty() {
        bail!("Nothing to change: pass --type and/or --inputs");
    }

    let calc = app.client.update_calculation(id, &update).await?;
    terminal::print_calculation(&calc, app.config.clock_style);
    app.notifier.show_success("Calculation updated");
    Ok(())
}

async fn delete(app: &App, id: &str) -> Result<()> {
    ensure_logged_in(app)?;
    app.client.delete_calculation(id).await?;
    app.notifier.show_success("Calculation deleted");
    Ok(())
}

async fn stats(app: &App) -> Result<()> {
    ensure_logged_in(app)?;
    let stats = app.client.statistics().await?;
    terminal::print_statistics(&stats);

    if !stats.recent_calculations.is_empty() {
        println!();
        terminal::print_calculation_table(&stats.recent_calculations, app.config.clock_style);
    }
    Ok(())
}

async fn history(
    app: &App,
    page: u32,
    page_size: u32,
    operation: Option<CalculationType>,
) -> Result<()> {
    ensure_logged_in(app)?;
    let history = app.client.history(page, page_size, operation).await?;
    terminal::print_history(&history, app.config.clock_style);
    Ok(())
}

async fn operation_stats(app: &App, operation: Option<CalculationType>) -> Result<()> {
    ensure_logged_in(app)?;
    let operations = match operation {
        Some(op) => vec![op],
        None => CalculationType::ALL.to_vec(),
    };

    let results = join_all(
        operations
            .iter()
            .map(|&op| app.client.operation_statistics(op)),
    )
    .await;

    for (op, result) in operations.iter().zip(results) {
        terminal::print_operation_statistics(op.as_str(), &result?);
    }
    Ok(())
}

/// Update the saved config file. Environment and `--base-url` overrides of
/// the running session are not written back.
fn configure(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(clock) = args.clock {
        config.clock_style = clock;
    }
    if let Some(secs) = args.alert_secs {
        config.alert_timeout_secs = secs;
    }

    config.save()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use calcdesk_core::api::{HttpRequest, HttpResponse, Transport};
    use calcdesk_core::{MemoryStore, Navigator, Session};
    use clap::CommandFactory;
    use reqwest::StatusCode;

    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("calcdesk").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_calc() {
        match parse(&["calc", "Division", "100, 5, 2"]).expect("parse") {
            Command::Calc(args) => {
                assert_eq!(args.kind, CalculationType::Division);
                assert_eq!(args.inputs, "100, 5, 2");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_negative_inputs_are_not_flags() {
        match parse(&["preview", "subtraction", "-3, 2"]).expect("parse") {
            Command::Preview(args) => assert_eq!(args.inputs, "-3, 2"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(parse(&["calc", "--verbose", "addition", "1,2"]).is_err());
        assert!(parse(&["calc", "modulo", "1,2"]).is_err());
    }

    #[test]
    fn test_history_flags() {
        match parse(&["history"]).expect("parse") {
            Command::History {
                page,
                page_size,
                operation,
            } => {
                assert_eq!((page, page_size), (1, HISTORY_PAGE_SIZE));
                assert_eq!(operation, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        match parse(&["history", "--page", "3", "--page-size", "5", "--operation", "addition"])
            .expect("parse")
        {
            Command::History {
                page,
                page_size,
                operation,
            } => {
                assert_eq!((page, page_size), (3, 5));
                assert_eq!(operation, Some(CalculationType::Addition));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_history_flag_without_value_is_rejected() {
        assert!(parse(&["history", "--page"]).is_err());
        assert!(parse(&["history", "--page", "--page-size", "5"]).is_err());
        assert!(parse(&["history", "--page", "two"]).is_err());
    }

    #[test]
    fn test_parse_edit_and_op_stats() {
        match parse(&["edit", "abc", "--type", "multiplication", "--inputs", "-1,4"])
            .expect("parse")
        {
            Command::Edit { id, kind, inputs } => {
                assert_eq!(id, "abc");
                assert_eq!(kind, Some(CalculationType::Multiplication));
                assert_eq!(inputs.as_deref(), Some("-1,4"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(matches!(
            parse(&["op-stats"]).expect("parse"),
            Command::OpStats { operation: None }
        ));
    }

    #[test]
    fn test_parse_config_clock() {
        match parse(&["config", "--clock", "24", "--alert-secs", "8"]).expect("parse") {
            Command::Config(args) => {
                assert_eq!(args.clock, Some(ClockStyle::TwentyFourHour));
                assert_eq!(args.alert_secs, Some(8));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(parse(&["config", "--clock", "13"]).is_err());
    }

    struct ScriptedTransport {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::InvalidResponse("no scripted response".to_string()))
        }
    }

    struct QuietNavigator;

    impl Navigator for QuietNavigator {
        fn redirect(&self, _path: &str) {}
    }

    const TOKEN_JSON: &str = r#"{"access_token": "fresh", "user_id": "u-1", "username": "jdoe"}"#;

    fn client(responses: Vec<HttpResponse>) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        });
        let session = Session::new(Arc::new(MemoryStore::new()), Arc::new(QuietNavigator));
        let client = ApiClient::new(transport.clone(), session, "http://calc.test");
        (client, transport)
    }

    #[tokio::test]
    async fn test_rejected_remembered_password_asks_again() {
        let (client, transport) = client(vec![
            HttpResponse::new(StatusCode::UNAUTHORIZED, r#"{"detail": "Incorrect username or password"}"#),
            HttpResponse::new(StatusCode::OK, TOKEN_JSON),
        ]);

        let (token, password) =
            login_with_fallback(&client, "jdoe", Some("Old-pass1".to_string()), || {
                Ok("New-pass1".to_string())
            })
            .await
            .unwrap();

        assert_eq!(token.access_token, "fresh");
        assert_eq!(password, "New-pass1");
        assert_eq!(transport.requests.lock().unwrap().len(), 2);
        assert_eq!(client.session().token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_accepted_remembered_password_does_not_ask() {
        let (client, _) = client(vec![HttpResponse::new(StatusCode::OK, TOKEN_JSON)]);

        let (_, password) = login_with_fallback(&client, "jdoe", Some("Saved-pass1".to_string()), || {
            panic!("should not prompt")
        })
        .await
        .unwrap();

        assert_eq!(password, "Saved-pass1");
    }

    #[tokio::test]
    async fn test_server_error_with_remembered_password_does_not_ask() {
        let (client, _) = client(vec![HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom")]);

        let result = login_with_fallback(&client, "jdoe", Some("Saved-pass1".to_string()), || {
            panic!("should not prompt")
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::ServerError(_))));
    }
}
