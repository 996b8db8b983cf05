use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use console::style;
use dialoguer::{MultiSelect, Password};
use std::error::Error;
use std::io::{self, IsTerminal};
use std::process;
use tracing_subscriber::EnvFilter;

use gist_sweep::api::GistClient;
use gist_sweep::config::{self, Config};
use gist_sweep::session::GistSession;
use gist_sweep::token_store::TokenStore;
use gist_sweep::util::{confirm_yes, mask_token};
use gist_sweep::view::{self, ViewConfig};
use gist_sweep::{Credentials, GistError};

fn clap<'a, 'b>() -> App<'a, 'b> {
    let yes = Arg::with_name("yes")
        .long("yes")
        .short("y")
        .takes_value(false)
        .help("Skip the confirmation prompt");

    let token = SubCommand::with_name("token")
        .about("Manage the stored GitHub personal access token (needs the `gist` scope)")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("save")
                .about("Save a token, prompting for it when not given")
                .arg(Arg::with_name("token").index(1).help("The token to store")),
        )
        .subcommand(SubCommand::with_name("show").about("Show where the token is stored"))
        .subcommand(SubCommand::with_name("clear").about("Remove the stored token"));

    let list = SubCommand::with_name("list").about("Fetch and print your gists");

    let delete = SubCommand::with_name("delete")
        .about("Delete gists by id, or all of them with --all")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("ids")
                .index(1)
                .multiple(true)
                .required_unless("all")
                .conflicts_with("all")
                .help("Ids of the gists to delete"),
        )
        .arg(
            Arg::with_name("all")
                .long("all")
                .takes_value(false)
                .help("Select every gist"),
        )
        .arg(yes.clone());

    let select = SubCommand::with_name("select")
        .about("Pick gists to delete from an interactive checklist")
        .arg(yes.clone());

    App::new("gist-sweep")
        .about("List, select and bulk-delete your GitHub gists")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::DisableHelpSubcommand)
        .subcommand(token)
        .subcommand(list)
        .subcommand(delete)
        .subcommand(select)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_credentials(config: &Config, store: &TokenStore) -> Credentials {
    match &config.token_override {
        Some(token) => Credentials::new(token),
        None => store.load(),
    }
}

fn token_command(m: &ArgMatches, store: &TokenStore) -> Result<(), Box<dyn Error>> {
    match m.subcommand() {
        ("save", Some(m)) => {
            let token = match m.value_of("token") {
                Some(token) => token.to_string(),
                None => Password::new()
                    .with_prompt("GitHub personal access token")
                    .interact()?,
            };
            store.save(&Credentials::new(&token));
            println!("Token saved to {}", style(store.path().display()).bold());
        }

        ("show", Some(_)) => {
            let creds = store.load();
            if creds.is_empty() {
                println!("No token stored at {}", store.path().display());
            } else {
                println!(
                    "{} (stored at {})",
                    mask_token(creds.token()),
                    store.path().display()
                );
            }
        }

        ("clear", Some(_)) => {
            store.clear();
            println!("Token removed");
        }

        (_, _) => unreachable!("clap requires a token subcommand"),
    }
    Ok(())
}

async fn load_session(
    config: &Config,
    credentials: &Credentials,
) -> Result<GistSession, Box<dyn Error>> {
    let mut session = GistSession::new(GistClient::from_config(config));
    println!("Fetching gists from {}", style(&config.api_base).bold());
    let count = session.fetch_all(credentials).await?;
    println!("Found {} gists\n", count);
    Ok(session)
}

/// Confirm and delete whatever is selected, then print what is left.
async fn delete_selection(
    session: &mut GistSession,
    credentials: &Credentials,
    view_config: &ViewConfig,
    assume_yes: bool,
) -> Result<(), Box<dyn Error>> {
    if session.selected_count() == 0 {
        println!("Nothing selected.");
        return Ok(());
    }

    for gist in session.selected_gists() {
        println!("{}", view::summary_line(gist));
    }

    if assume_yes {
        println!("\n--yes present, skipping confirmation...");
    } else if !confirm_yes(&format!(
        "Going to delete these {} gists ☝️ ",
        session.selected_count()
    ))? {
        println!("Aborted, nothing deleted.");
        return Ok(());
    }

    let before = session.gists().len();
    let result = session.delete_selected(credentials).await;
    let deleted = before - session.gists().len();

    println!("Deleted {} gists\n", style(deleted).bold());
    print!("{}", view::render_list(session, view_config));

    result?;
    Ok(())
}

async fn run(config: &Config, matches: &ArgMatches<'_>) -> Result<(), Box<dyn Error>> {
    let store = TokenStore::from_config(config);
    let view_config = ViewConfig {
        use_color: config.use_color,
    };

    if let ("token", Some(m)) = matches.subcommand() {
        return token_command(m, &store);
    }

    let credentials = resolve_credentials(config, &store);
    if credentials.is_empty() {
        return Err(GistError::MissingToken.into());
    }

    match matches.subcommand() {
        ("list", Some(_)) => {
            let session = load_session(config, &credentials).await?;
            print!("{}", view::render_list(&session, &view_config));
        }

        ("delete", Some(m)) => {
            let mut session = load_session(config, &credentials).await?;
            if m.is_present("all") {
                session.select_all();
            } else {
                let ids = m.values_of("ids").into_iter().flatten();
                for unknown in session.select_ids(ids) {
                    println!("{} no gist with id {}", style("skipping:").yellow(), unknown);
                }
            }
            delete_selection(&mut session, &credentials, &view_config, m.is_present("yes"))
                .await?;
        }

        ("select", Some(m)) => {
            if !io::stdin().is_terminal() {
                return Err("`select` needs an interactive terminal; use `delete` instead".into());
            }
            let mut session = load_session(config, &credentials).await?;
            if session.gists().is_empty() {
                print!("{}", view::render_list(&session, &view_config));
                return Ok(());
            }

            let items: Vec<String> = session.gists().iter().map(view::summary_line).collect();
            let chosen = MultiSelect::new()
                .with_prompt("Select gists to delete (space toggles, enter confirms)")
                .items(&items)
                .interact()?;
            let ids: Vec<String> = chosen
                .into_iter()
                .map(|i| session.gists()[i].id().to_string())
                .collect();
            for id in &ids {
                session.toggle_selection(id);
            }

            delete_selection(&mut session, &credentials, &view_config, m.is_present("yes"))
                .await?;
        }

        (_, _) => unreachable!("clap requires a subcommand"),
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::from_filename(config::ENV_FILE).ok();
    init_tracing();

    let config = Config::from_env();
    if !config.use_color {
        console::set_colors_enabled(false);
    }
    let matches = clap().get_matches();

    if let Err(err) = run(&config, &matches).await {
        eprintln!("{} {}", style("error:").red().bold(), err);
        process::exit(1);
    }
}
