//! `causeway` command: drive the local store from a terminal.
//!
//! Each invocation restores the persisted session, runs one command and
//! prints the result as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tracing::warn;

use causeway_store::Causeway;
use causeway_store::config::StoreSettings;
use causeway_store::domain::ports::{CaptureDenial, DeviceCapture, FixtureDeviceCapture};
use causeway_store::domain::{
    CauseId, NotificationId, PostFilter, PostId, ProfileUpdate, Session, StreamId, StreamSetup,
    User, list_causes,
};
use causeway_store::telemetry;

/// `causeway` command arguments.
#[derive(Debug, Parser)]
#[command(name = "causeway", about = "Local Causeway record store", version)]
struct Cli {
    /// Directory holding the JSON collections. Overrides `CAUSEWAY_DATA_DIR`.
    #[arg(long, value_name = "path", global = true)]
    data_dir: Option<String>,
    /// Keep everything in memory. Overrides `CAUSEWAY_EPHEMERAL`.
    #[arg(long, global = true)]
    ephemeral: bool,
    /// `json` or `pretty`. Overrides `CAUSEWAY_LOG_FORMAT`.
    #[arg(long, value_name = "format", global = true)]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Edit the signed-in user's profile.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
    /// Follow a user by username.
    Follow { username: String },
    /// Unfollow a user by username.
    Unfollow { username: String },
    /// Follow a cause.
    FollowCause { cause: String },
    /// Unfollow a cause.
    UnfollowCause { cause: String },
    /// List the cause catalogue.
    Causes,
    /// Publish a post as the signed-in user.
    Post {
        #[arg(long)]
        content: String,
        #[arg(long, default_value = CauseId::GENERAL)]
        cause: String,
    },
    /// List posts, newest first.
    Feed {
        #[arg(long)]
        cause: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// The signed-in user's home feed.
    Home,
    /// Toggle the signed-in user's like on a post.
    Like { post: String },
    /// Comment on a post.
    Comment { post: String, text: String },
    /// List the signed-in user's notifications.
    Notifications {
        /// Mark this notification as read first.
        #[arg(long, value_name = "id")]
        mark_read: Option<String>,
    },
    /// Start a live stream as the signed-in user.
    GoLive {
        #[arg(long)]
        title: String,
        #[arg(long)]
        cause: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Confirm that camera and microphone may be used.
        #[arg(long)]
        confirm_capture: bool,
    },
    /// End one of the signed-in user's streams.
    EndStream { stream: String },
    /// List live streams.
    Live {
        #[arg(long)]
        cause: Option<String>,
    },
    /// Creator statistics for a user (default: the signed-in user).
    Stats { username: Option<String> },
    /// Check the follow graph; `--repair` heals what it finds.
    Audit {
        #[arg(long)]
        repair: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut settings = StoreSettings::load_from_iter([OsString::from("causeway")])
        .wrap_err("load configuration")?;
    if cli.data_dir.is_some() {
        settings.data_dir.clone_from(&cli.data_dir);
    }
    settings.ephemeral |= cli.ephemeral;
    if cli.log_format.is_some() {
        settings.log_format.clone_from(&cli.log_format);
    }

    let format = settings.log_format()?;
    if let Err(error) = telemetry::init(format) {
        warn!(error = %error, "tracing init failed");
    }

    let capture = capture_for(&cli.command);
    let app = Causeway::from_settings(&settings, capture)?;
    let mut session = app.restore_session()?;
    run(&app, &mut session, cli.command)
}

fn capture_for(command: &Command) -> Arc<dyn DeviceCapture> {
    match command {
        Command::GoLive {
            confirm_capture: false,
            ..
        } => Arc::new(FixtureDeviceCapture::denied(CaptureDenial::PermissionDenied)),
        _ => Arc::new(FixtureDeviceCapture::granted()),
    }
}

fn run(app: &Causeway, session: &mut Session, command: Command) -> Result<()> {
    match command {
        Command::Register {
            username,
            name,
            password,
        } => emit(&app.identity().register(session, &username, &name, &password)?),
        Command::Login { username, password } => {
            emit(&app.identity().login(session, &username, &password)?)
        }
        Command::Logout => {
            app.identity().logout(session)?;
            emit(&serde_json::json!({ "signedOut": true }))
        }
        Command::Whoami => emit(&app.identity().current_session(session)),
        Command::Profile {
            name,
            username,
            bio,
        } => {
            let update = ProfileUpdate {
                name,
                username,
                bio,
                ..ProfileUpdate::default()
            };
            emit(&app.identity().update_profile(session, update)?)
        }
        Command::Follow { username } => {
            let actor = signed_in(session)?;
            let target = user_named(app, &username)?;
            let outcome = app
                .social_graph()
                .follow_user(session, actor.id(), target.id())?;
            emit(&format!("{outcome:?}"))
        }
        Command::Unfollow { username } => {
            let actor = signed_in(session)?;
            let target = user_named(app, &username)?;
            let outcome = app
                .social_graph()
                .unfollow_user(session, actor.id(), target.id())?;
            emit(&format!("{outcome:?}"))
        }
        Command::FollowCause { cause } => {
            let actor = signed_in(session)?;
            emit(&app.social_graph().follow_cause(session, actor.id(), &cause)?)
        }
        Command::UnfollowCause { cause } => {
            let actor = signed_in(session)?;
            emit(&app.social_graph().unfollow_cause(session, actor.id(), &cause)?)
        }
        Command::Causes => emit(&list_causes()),
        Command::Post { content, cause } => {
            let author = signed_in(session)?;
            emit(&app.content().create_post(author.id(), &content, &cause, None)?)
        }
        Command::Feed { cause, author } => {
            let filter = PostFilter {
                cause: cause.map(CauseId::new).transpose()?,
                author_username: author,
            };
            emit(&app.content().list_posts(&filter)?)
        }
        Command::Home => {
            let user = signed_in(session)?;
            emit(&app.content().home_feed(user.id())?)
        }
        Command::Like { post } => {
            let user = signed_in(session)?;
            emit(&app.content().toggle_like(&PostId::new(&post)?, user.id())?)
        }
        Command::Comment { post, text } => {
            let user = signed_in(session)?;
            emit(&app.content().add_comment(&PostId::new(&post)?, user.id(), &text)?)
        }
        Command::Notifications { mark_read } => {
            let user = signed_in(session)?;
            if let Some(id) = mark_read {
                app.notifications()
                    .mark_read(user.id(), &NotificationId::new(&id)?)?;
            }
            emit(&app.notifications().list_notifications(user.id())?)
        }
        Command::GoLive {
            title,
            cause,
            description,
            ..
        } => {
            let host = signed_in(session)?;
            let setup = StreamSetup {
                title,
                description,
                cause,
                thumbnail_url: None,
            };
            emit(&app.live_sessions().start_stream(host.id(), setup)?)
        }
        Command::EndStream { stream } => {
            let host = signed_in(session)?;
            let stream = StreamId::new(&stream)?;
            emit(&app.live_sessions().end_stream(host.id(), &stream)?)
        }
        Command::Live { cause } => {
            let cause = cause.map(CauseId::new).transpose()?;
            emit(&app.live_sessions().list_live(cause.as_ref())?)
        }
        Command::Stats { username } => {
            let user = match username {
                Some(name) => user_named(app, &name)?,
                None => signed_in(session)?,
            };
            emit(&app.content().creator_stats(user.id())?)
        }
        Command::Audit { repair } => {
            let lines: Vec<String> = if repair {
                let report = app.graph_audit().reconcile()?;
                report
                    .violations
                    .iter()
                    .map(|violation| format!("repaired: {violation}"))
                    .collect()
            } else {
                app.graph_audit()
                    .audit()?
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            };
            emit(&lines)
        }
    }
}

fn signed_in(session: &Session) -> Result<User> {
    session
        .active()
        .cloned()
        .ok_or_else(|| eyre!("not signed in; run `causeway login` first"))
}

fn user_named(app: &Causeway, username: &str) -> Result<User> {
    app.identity()
        .find_by_username(username)?
        .ok_or_else(|| eyre!("no user named {username}"))
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
